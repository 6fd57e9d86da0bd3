use kalenda::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting kalenda");

    // Load configuration
    let config = startup::load_config()?;

    // Start the server
    startup::start_server(config).await
}
