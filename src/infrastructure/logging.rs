use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "near_indexer_functions=info";

/// Builds the filter from the default directive plus any valid `RUST_LOG`
/// directives; unparsable ones are reported and ignored.
pub fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    let mut env_filter = EnvFilter::new(DEFAULT_DIRECTIVE);

    if let Some(rust_log) = rust_log.filter(|s| !s.is_empty()) {
        for directive in rust_log.split(',').filter_map(|s| match s.parse() {
            Ok(directive) => Some(directive),
            Err(err) => {
                eprintln!("Ignoring directive `{}`: {}", s, err);
                None
            }
        }) {
            env_filter = env_filter.add_directive(directive);
        }
    }

    env_filter
}

pub fn init_tracing() {
    let rust_log = std::env::var("RUST_LOG").ok();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();
}
