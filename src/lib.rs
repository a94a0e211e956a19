#![forbid(unsafe_code)]
#![deny(unused_must_use, missing_debug_implementations)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Typed Python client generation from OpenAPI documents.
//!
//! [`generate`] turns one OpenAPI 3.x JSON document into a [`GeneratedTree`]:
//! pydantic models, tag API classes, an examples test file and a JSON Patch.
//! [`write_tree`] and [`check_tree`] put that tree on disk or diff it against
//! what is already there.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub mod config;
pub mod error;
pub mod generator;
pub mod openapi;

pub use config::GeneratorConfig;
pub use error::GenError;
pub use generator::{FileDiff, check_tree, generate_from_file, write_tree};
pub use openapi::{GeneratedTree, generate};

/// Install the stderr log subscriber.
pub fn init_tracing() {
    let crate_root = module_path!().to_string();

    // PYGEN_LOG controls log level: "trace", "debug", "info", "warn", "error"
    // or a full tracing filter spec like "openapi_pygen=debug,tera=warn"
    let filter = match std::env::var("PYGEN_LOG") {
        Ok(level) if is_plain_level(&level) => {
            format!("{crate_root}={level},openapi_pygen_cli={level}")
        }
        Ok(spec) => spec,
        Err(_) => format!("{crate_root}=info,openapi_pygen_cli=info"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
