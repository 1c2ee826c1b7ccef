// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the RepoScan CLI.
//!
//! Uses `tracing` with `tracing-subscriber`. Log level is controlled via
//! the `RUST_LOG` environment variable; all tracing output goes to stderr
//! so structured stdout output stays parseable.
//!
//! # Examples
//!
//! ```bash
//! # Debug output for troubleshooting
//! RUST_LOG=reposcan=debug reposcan scan run
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the logging subsystem.
///
/// The default filter keeps the CLI quiet; set `RUST_LOG` to override.
pub fn init_logging() {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("reposcan=warn,octocrab=error"))
        .expect("valid default filter directives");

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
