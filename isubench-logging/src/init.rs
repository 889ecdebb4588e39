use crate::{ADMIN, CONTESTANT};
use anyhow::Result;
use isubench_config::{LogFormat, LogLevel, LoggingConfig};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the contestant (stdout) and admin (stderr) channels from configuration
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<()> {
    let layers: Vec<BoxedLayer> = vec![contestant_layer(), admin_layer(config)];

    // Use try_init to avoid panic if global subscriber already set
    if tracing_subscriber::registry().with(layers).try_init().is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

fn contestant_layer() -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_timer(ChronoLocal::new("%H:%M:%S%.6f".to_string()))
        .with_target(false)
        .with_level(false)
        .with_filter(Targets::new().with_target(CONTESTANT, LevelFilter::TRACE))
        .boxed()
}

fn admin_layer(config: &LoggingConfig) -> BoxedLayer {
    let filter = admin_filter(config.level);

    match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_timer(ChronoLocal::new("%H:%M:%S%.6f".to_string()))
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_filter(filter)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(ChronoLocal::new("%H:%M:%S%.6f".to_string()))
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_filter(filter)
            .boxed(),
    }
}

/// Admin channel filter: the configured level (or `RUST_LOG`), never the contestant target
fn admin_filter(level: LogLevel) -> EnvFilter {
    let base = std::env::var("RUST_LOG")
        .ok()
        .filter(|directives| !directives.trim().is_empty())
        .unwrap_or_else(|| format!("{level},{ADMIN}=info"));

    EnvFilter::try_new(format!("{base},{CONTESTANT}=off"))
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{CONTESTANT}=off")))
}
