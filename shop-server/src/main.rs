use shop_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. .env before anything reads the environment
    let _ = dotenv::dotenv();

    // 2. Configuration and logging
    let config = Config::from_env()?;
    setup_environment(&config);

    tracing::info!(environment = %config.environment, "shop-server starting...");

    // 3. Storage and services
    let state = ServerState::initialize(&config).await?;

    // 4. HTTP server
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
