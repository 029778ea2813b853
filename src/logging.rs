//! Tracing subscriber setup
//!
//! File-based logging with environment-based filtering. Hosts call
//! `init_global` once at startup; tests that care build a scoped
//! subscriber instead.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber writing to the given log file.
///
/// Filtering follows RUST_LOG with an INFO default. Returns `None` if the
/// log file could not be created or a subscriber is already installed.
pub fn init_global(log_file_path: &Path) -> Option<()> {
    let log_file = File::create(log_file_path).ok()?;
    tracing::subscriber::set_global_default(build_subscriber(log_file)).ok()
}

/// Build a file-writing subscriber; shared between production and tests.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer().with_ansi(false).with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
