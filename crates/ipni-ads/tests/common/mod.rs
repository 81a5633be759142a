// Shared setup for integration tests.
static INIT: std::sync::Once = std::sync::Once::new();

pub fn init_logs() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("warn".parse().unwrap()),
            )
            .with_test_writer()
            .try_init();
    });
}
