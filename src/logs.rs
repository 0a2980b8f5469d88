use {
    super::*,
    tracing_appender::non_blocking::{NonBlocking, WorkerGuard},
    tracing_subscriber::EnvFilter,
};

const DEFAULT_LEVEL: &str = "info";

/// `RUST_LOG` wins over `level`. The guard flushes buffered lines on drop and
/// must live until exit.
pub(crate) fn init(level: Option<&str>) -> WorkerGuard {
    let (writer, guard) = NonBlocking::new(io::stderr());

    tracing_subscriber::fmt()
        .with_env_filter(filter(env::var("RUST_LOG").ok().as_deref(), level))
        .with_target(false)
        .with_writer(writer)
        .init();

    guard
}

fn filter(rust_log: Option<&str>, level: Option<&str>) -> EnvFilter {
    rust_log
        .or(level)
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
}

#[cfg(test)]
mod tests {
    use {super::*, tracing::level_filters::LevelFilter};

    #[test]
    fn rust_log_wins() {
        assert_eq!(
            filter(Some("debug"), Some("warn")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn level_option() {
        assert_eq!(
            filter(None, Some("warn")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn default_level() {
        assert_eq!(filter(None, None).max_level_hint(), Some(LevelFilter::INFO));
    }
}
