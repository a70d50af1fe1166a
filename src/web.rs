use suiren::app;
use suiren::config::Config;

/// Entry point for the reading practice server
///
/// Reads the runtime configuration from the environment, then starts the
/// HTTP server and blocks until it shuts down.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = Config::from_env();
    app::run(config).await
}
