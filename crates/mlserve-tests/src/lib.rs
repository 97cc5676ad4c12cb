//! mlserve End-to-End Test Infrastructure
//!
//! This crate drives both transports against shared fixtures:
//!
//! - **HTTP**: the axum router, one request at a time via `oneshot`
//! - **CLI**: the derived clap command tree, parsed without exiting
//! - **Properties**: round-trip and range laws over generated schemas
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mlserve-tests
//! ```

pub mod fixtures;
pub mod harness;

pub use fixtures::{fixture_registry, INFERRED_RULE, SCORE_RULE, TITLES_RULE};
pub use harness::{get, post_json, post_raw, send};
