//! Tracing setup. Logs go to stderr so piped stdout stays clean; the level
//! follows the verbose/debug flags with `RUST_LOG` as an override.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool, debug: bool) {
    let default_directive = if debug {
        "skitter=debug"
    } else if verbose {
        "skitter=info"
    } else {
        "skitter=error"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // try_init: tests may initialize more than once.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
