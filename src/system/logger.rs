use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Preferred filter variable; `RUST_LOG` is the fallback.
const LOG_ENV: &str = "FLASHLOAD_LOG";

/// Connection-level crates stay at `warn` unless a filter asks otherwise.
const DEFAULT_DIRECTIVES: &str = "hyper=warn,hyper_util=warn,reqwest=warn";

/// Logs go to stderr so stdout carries only the report.
pub fn init_logging(verbose: bool, no_color: bool) {
    let configured = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(configured.as_deref(), verbose))
        .with_ansi(!no_color)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

fn log_filter(configured: Option<&str>, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    let fallback = || EnvFilter::new(format!("{},{}", level, DEFAULT_DIRECTIVES));
    configured.map_or_else(fallback, |value| {
        EnvFilter::try_new(value).unwrap_or_else(|_| fallback())
    })
}
