use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "revdiff=info";
const VERBOSE_FILTER: &str = "revdiff=debug";

/// Installs the stderr subscriber. `RUST_LOG` takes precedence over the
/// verbosity flag. Stdout is left for the report path.
pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second call (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
