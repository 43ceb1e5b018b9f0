use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Build the JSON subscriber writing to `writer`
pub fn get_subscriber<W>(env_filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'a> tracing_subscriber::fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .json();

    Registry::default().with(env_filter).with(formatting_layer)
}

/// Install structured JSON logging on stdout. Call once, from `main`.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_telemetry() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    get_subscriber(env_filter, std::io::stdout).init();
}
