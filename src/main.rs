//! Conversation Gateway server binary.
//!
//! `conversation-gateway` serves HTTP and WebSocket traffic.
//! `conversation-gateway issue-token <subject>` prints an access token and exits.

use std::error::Error;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use conversation_gateway::adapters::{
    EchoReplyGenerator, InMemoryConversationStore, InMemoryMessageStore, JwtTokenService,
    PostgresConversationStore, PostgresMessageStore,
};
use conversation_gateway::config::{AppConfig, ServerConfig};
use conversation_gateway::domain::foundation::SubjectId;
use conversation_gateway::ports::{ConversationStore, MessageStore, TokenIssuer};
use conversation_gateway::server::{self, HttpSettings, Services};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server);

    let token_service = Arc::new(JwtTokenService::new(
        &config.auth.jwt_secret,
        config.auth.access_token_ttl_secs,
        config.auth.leeway_secs,
    ));

    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        if command != "issue-token" {
            return Err(format!("unknown command '{}'", command).into());
        }
        let subject = SubjectId::new(args.next().unwrap_or_default())?;
        println!("{}", token_service.issue_access_token(&subject).await?);
        return Ok(());
    }

    tracing::info!(
        environment = ?config.server.environment,
        "Starting conversation gateway"
    );

    let (conversation_store, message_store) = build_stores(&config).await?;

    let services = Services::new(
        token_service,
        conversation_store,
        message_store,
        Arc::new(EchoReplyGenerator::new(config.streaming.reply_template.clone())?),
    )
    .with_stream_config(config.streaming.to_stream_config());

    let router = server::build_router(&services, &HttpSettings::from_config(&config.server));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Conversation gateway ready");

    server::serve(listener, router, server::shutdown_signal()).await?;

    tracing::info!(
        open_sessions = services.registry.len(),
        "Shutting down"
    );
    Ok(())
}

fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_stores(
    config: &AppConfig,
) -> Result<(Arc<dyn ConversationStore>, Arc<dyn MessageStore>), Box<dyn Error>> {
    match &config.database {
        Some(database) => {
            let pool = database.connect().await?;
            if database.run_migrations {
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Migrations applied");
            }
            tracing::info!(max_connections = database.max_connections, "Using PostgreSQL stores");
            Ok((
                Arc::new(PostgresConversationStore::new(pool.clone())),
                Arc::new(PostgresMessageStore::new(pool)),
            ))
        }
        None => {
            let conversations = InMemoryConversationStore::new();
            let seeded = conversations.create(Some("Default".to_string())).await;
            tracing::warn!(
                conversation_id = %seeded.id,
                "No database configured, using in-memory stores"
            );
            Ok((
                Arc::new(conversations),
                Arc::new(InMemoryMessageStore::new()),
            ))
        }
    }
}
