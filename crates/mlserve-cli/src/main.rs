//! mlserve-demo CLI
//!
//! Runs the demo endpoints as subcommands, or serves them over HTTP.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Command, FromArgMatches};
use colored::Colorize;
use mlserve_cli::{demo_registry, init_logging, render, MlCli};

/// Flags accepted before the subcommand.
#[derive(Args, Debug)]
struct GlobalArgs {
    /// Output machine-readable JSON (no colored output)
    #[arg(long)]
    json: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Options of the `serve` subcommand.
#[cfg(feature = "serve")]
#[derive(Args, Debug)]
struct ServeArgs {
    /// Host to listen on
    #[arg(long, env = mlserve_server::HOST_ENV, default_value = mlserve_server::DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(long, env = mlserve_server::PORT_ENV, default_value_t = mlserve_server::DEFAULT_PORT)]
    port: u16,
}

fn base_command() -> Command {
    let command = Command::new("mlserve-demo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("mlserve demo endpoints, as subcommands or over HTTP")
        .subcommand_required(true)
        .arg_required_else_help(true);
    let command = GlobalArgs::augment_args(command);

    #[cfg(feature = "serve")]
    let command = command.subcommand(ServeArgs::augment_args(
        Command::new("serve").about("Serve every demo endpoint over HTTP"),
    ));

    command
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let logging = init_logging();
    let registry = Arc::new(demo_registry().context("Failed to register demo endpoints")?);
    let cli = MlCli::new(Arc::clone(&registry), base_command())
        .configure()
        .context("Failed to derive subcommands")?;

    let matches = cli.get_matches();
    let globals = GlobalArgs::from_arg_matches(&matches)?;
    if globals.verbose {
        logging
            .set_verbose()
            .context("Failed to raise the log level")?;
    }

    #[cfg(feature = "serve")]
    if let Some(serve_matches) = matches.subcommand_matches("serve") {
        let serve = ServeArgs::from_arg_matches(serve_matches)?;
        let config = mlserve_server::ServerConfig::new(serve.host, serve.port);
        return mlserve_server::run(&config, registry);
    }

    let invocation = match cli.bind(&matches) {
        Ok(Some(invocation)) => invocation,
        Ok(None) => return Ok(ExitCode::from(2)),
        Err(e) => e.exit(),
    };

    let output = invocation.execute()?;
    if globals.json {
        println!("{}", serde_json::to_string_pretty(&output.encode())?);
    } else {
        print!("{}", render(&output, true));
    }

    Ok(ExitCode::SUCCESS)
}
