//! Confide bot entry point.

mod dispatch;
mod health;
mod poll;
mod telegram;
mod ui;

use std::net::SocketAddr;
use std::sync::Arc;

use confide_common::Config;
use confide_core::conversation::InMemorySessionStore;
use confide_core::services::{
    CommentService, CounterSyncService, FollowService, ModerationService, ProfileService,
    ReportService, VoteService,
};
use confide_core::transport::TransportHandle;
use confide_db::repositories::{
    BanRepository, CommentRepository, FollowRepository, ProfileRepository, ReportRepository,
    SubmissionRepository, VoteRepository,
};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dispatch::{Dispatcher, Services};
use poll::Poller;
use telegram::TelegramTransport;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, shutting down...");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confide=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    info!("Starting confide bot...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = confide_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    confide_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize transport
    let telegram = Arc::new(TelegramTransport::new(
        &config.telegram.api_url,
        &config.telegram.token,
    )?);
    let transport: TransportHandle = Arc::clone(&telegram) as TransportHandle;

    // Initialize repositories
    let db = Arc::new(db);
    let submission_repo = SubmissionRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let ban_repo = BanRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));

    // Initialize services
    let profile_service = ProfileService::new(profile_repo);
    let moderation_service = ModerationService::new(
        submission_repo.clone(),
        ban_repo.clone(),
        Arc::clone(&transport),
        config.telegram.admin_group_id,
        config.telegram.channel_id,
    );
    let report_service = ReportService::new(
        report_repo,
        comment_repo.clone(),
        Arc::clone(&transport),
        config.telegram.admin_group_id,
    );
    let sync_service = CounterSyncService::new(
        submission_repo.clone(),
        comment_repo.clone(),
        Arc::clone(&transport),
        config.telegram.channel_id,
    );
    let comment_service = CommentService::new(
        comment_repo.clone(),
        submission_repo.clone(),
        vote_repo.clone(),
        ban_repo.clone(),
        follow_repo.clone(),
        profile_service.clone(),
        report_service.clone(),
        sync_service,
        Arc::clone(&transport),
    );
    let vote_service = VoteService::new(vote_repo, comment_repo, ban_repo);
    let follow_service = FollowService::new(follow_repo, submission_repo);

    // Wire the dispatcher
    let dispatcher = Arc::new(Dispatcher::new(
        Services {
            moderation: moderation_service,
            comments: comment_service,
            votes: vote_service,
            reports: report_service,
            profiles: profile_service,
            follows: follow_service,
        },
        Arc::new(InMemorySessionStore::new()),
        transport,
        config.telegram.admin_group_id,
        config.engagement.report_reasons.clone(),
        config.engagement.page_size,
    ));

    // Serve the health shim
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Health endpoint listening on {}", addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health::router()).await {
            tracing::error!(error = %e, "Health server failed");
        }
    });

    // Poll until shutdown
    let poller = Poller::new(telegram, dispatcher);
    tokio::select! {
        () = poller.run() => {},
        () = shutdown_signal() => {},
    }

    info!("Shutdown complete");
    Ok(())
}
