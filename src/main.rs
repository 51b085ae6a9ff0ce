//! # Timetable Bot Main Entry Point
//!
//! Initializes logging, loads configuration, sets up the database,
//! starts the subscription push service and health server, and runs
//! the Telegram bot dispatcher.

use anyhow::Result;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timetable_bot::bot::conversation::Conversation;
use timetable_bot::bot::handlers::BotHandler;
use timetable_bot::bot::keyboards::ReplyKeys;
use timetable_bot::config::Config;
use timetable_bot::database::connection::DatabaseManager;
use timetable_bot::delivery::TelegramSink;
use timetable_bot::directory::RuzClient;
use timetable_bot::services::health::HealthService;
use timetable_bot::services::subscription::SubscriptionService;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timetable_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Timetable Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, Directory: {}, HTTP Port: {}",
        config.database_url, config.directory_base_url, config.http_port
    );

    // Initialize database
    info!("Opening user store...");
    let db_arc = Arc::new(DatabaseManager::open(&config.database_url).await?);
    info!("User store ready");

    // Initialize bot
    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram_bot_token);
    let sink = Arc::new(TelegramSink::new(bot.clone()));
    let directory = Arc::new(RuzClient::new(config.directory_base_url.clone()));
    let conversation = Arc::new(Conversation::new(
        db_arc.pool.clone(),
        directory.clone(),
        sink.clone(),
        Arc::new(ReplyKeys),
    ));
    let handler = BotHandler::new(conversation);
    info!("Telegram bot initialized successfully");

    // Initialize and start the subscription push service
    info!("Initializing subscription service...");
    let mut subscription_service =
        match SubscriptionService::new(db_arc.pool.clone(), directory, sink).await {
            Ok(service) => {
                info!("Subscription service initialized successfully");
                service
            }
            Err(e) => {
                tracing::error!("Failed to create subscription service: {}", e);
                return Err(anyhow::anyhow!("Failed to create subscription service: {}", e));
            }
        };

    if let Err(e) = subscription_service.start().await {
        tracing::error!("Failed to start subscription service: {}", e);
    }

    // Initialize health service
    let health_service = HealthService::new(db_arc.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);

    // Run both the bot and health server concurrently
    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    // Wait for either task to complete (which would indicate shutdown)
    tokio::select! {
        result1 = bot_task => {
            if let Err(e) = result1 {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result2 = health_task => {
            if let Err(e) = result2 {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    // Stop the subscription service on shutdown
    if let Err(e) = subscription_service.stop().await {
        tracing::warn!("Error stopping subscription service: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
