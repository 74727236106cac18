use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_relay::{
    create_router, AppState, Config, ConversationPipeline, FileSessionStore, NatsSpeechClient,
    OpenAiChatClient,
};

/// Spoken conversation relay: audio in, audio reply out
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/voice-relay")]
    config: String,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loaded config: {}", cfg.service.name);

    let store = Arc::new(FileSessionStore::open(cfg.session_directory()?).await?);

    let api_key = OpenAiChatClient::resolve_api_key(cfg.chat.api_key.as_deref())?;
    let chat = Arc::new(OpenAiChatClient::new(
        api_key,
        cfg.chat.base_url.clone(),
        Duration::from_secs(cfg.chat.timeout_secs),
    )?);

    let options = cfg.pipeline_options();
    let speech = Arc::new(
        NatsSpeechClient::connect(&cfg.speech.nats_url, cfg.speech_options(), options.collaborator_timeout)
            .await?,
    );

    info!("Chat model: {}", options.model);

    let pipeline = ConversationPipeline::new(speech.clone(), speech, chat, store, options);
    let app = create_router(AppState::new(pipeline), cfg.service.http.max_upload_bytes);

    let bind = args.bind.unwrap_or(cfg.service.http.bind);
    let port = args.port.unwrap_or(cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind((bind.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", bind, port))?;

    info!("Server is starting on {}:{}", bind, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
