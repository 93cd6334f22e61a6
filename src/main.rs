use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wordlookup::{config, console};

#[actix_rt::main]
async fn main() -> miette::Result<()> {
    // Set up logging on stderr so console output stays readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wordlookup=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting word lookup");

    // Load configuration
    let config = config::load_config()?;

    tokio::select! {
        result = console::run(config) => result,
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal, stopping");
            Ok(())
        }
    }
}
