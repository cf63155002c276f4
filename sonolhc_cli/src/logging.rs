//! Log filter selection for the CLI.

use tracing_subscriber::EnvFilter;

/// Filter directive: `RUST_LOG` when set, else `debug` with `--verbose`, else `info`.
pub fn filter_directive(verbose: bool, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim) {
        Some(directive) if !directive.is_empty() => directive.to_string(),
        _ if verbose => "debug".to_string(),
        _ => "info".to_string(),
    }
}

/// Builds the subscriber filter from the environment.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(verbose, rust_log.as_deref());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose, None)))
}
