use companion_bot::{
    commands::CommandRouter,
    completion::OpenAiClient,
    config::BotConfig,
    conversation::ConversationStore,
    health::start_server,
    transport::{ConsoleTransport, Transport},
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env()?;

    info!("🤖 Companion Bot starting");
    info!("📍 Health port: {}", config.port);
    info!(
        history_limit = config.context.history_limit,
        timeout_secs = config.context.completion_timeout.as_secs(),
        model = %config.openai_model,
        "Conversation settings"
    );
    if config.openai_api_key.is_none() {
        warn!("⚠️  OPENAI_API_KEY not set, ask commands will fail");
    }
    // DISCORD_TOKEN is required only so a misconfigured deploy fails at startup
    info!("Platform token loaded, reading messages from the console transport");

    // Health check server runs for the life of the process
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = start_server(port).await {
            error!("Health server stopped: {}", e);
        }
    });

    // Create components
    let store = Arc::new(ConversationStore::new(config.context.clone()));
    let client = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        &config.openai_base_url,
        &config.openai_model,
    ));
    let router = Arc::new(CommandRouter::new(
        config.command_prefix.clone(),
        store,
        client,
    ));
    let transport = Arc::new(ConsoleTransport::console());

    info!("✅ Ready, prefix is {:?}", config.command_prefix);

    let mut in_flight = JoinSet::new();

    while let Some(message) = transport.next_message().await? {
        // reap finished replies
        while in_flight.try_join_next().is_some() {}

        let router = Arc::clone(&router);
        let transport = Arc::clone(&transport);

        in_flight.spawn(async move {
            let Some(reply) = router.handle(&message.user_id, &message.text).await else {
                return;
            };
            if let Err(e) = transport.send(&message, &reply).await {
                error!(user_id = %message.user_id, "Failed to send reply: {}", e);
            }
        });
    }

    info!("Transport closed, waiting for {} pending replies", in_flight.len());
    while in_flight.join_next().await.is_some() {}

    Ok(())
}
