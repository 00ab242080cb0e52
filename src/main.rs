//! Loan Desk - loan slip administration client
//!
//! Restores (or opens) a session against the backend and prints the
//! dashboard: loan metrics, the first page of loan slips and the latest
//! notifications.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loan_desk::{
    api::{ApiClient, BearerToken},
    config::{AppConfig, LoggingConfig},
    models::{dates::format_display, LoanSlipQuery},
    schemas::LoginForm,
    services::Services,
    session::{AuthContext, FileTokenStore},
    state::{DashboardController, LoanSlipBoard, NotificationFeed, QueryController, RelativeClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.logging);

    tracing::info!("Starting Loan Desk v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Backend: {}", config.api.base_url);

    let bearer = BearerToken::default();
    let client = ApiClient::new(&config.api, bearer.clone())?;
    let services = Services::new(client);

    // Restore the session, falling back to configured credentials
    let store = Arc::new(FileTokenStore::new(&config.session.token_path, config.session.ttl()));
    let mut session = AuthContext::new(services.auth.clone(), store, bearer);
    session.init().await?;

    if !session.is_authenticated() {
        let (Some(username), Some(password)) = (&config.session.username, &config.session.password) else {
            tracing::warn!("Not signed in; set LOANDESK_SESSION__USERNAME and LOANDESK_SESSION__PASSWORD");
            return Ok(());
        };
        session
            .login(&LoginForm::new(username, password))
            .await
            .map_err(|e| anyhow!(e.user_message()))?;
    }

    if let Some(user) = session.user() {
        println!("Signed in as {} ({})", user.username, user.role);
    }

    // Dashboard metrics
    let mut dashboard = DashboardController::new(services.dashboard.clone());
    match dashboard.refresh().await {
        Ok(metrics) => println!(
            "\n{:?}: {} loans, {} borrowing, {} returned, {} overdue",
            dashboard.current(),
            metrics.total,
            metrics.borrowing,
            metrics.returned,
            metrics.overdue
        ),
        Err(e) => tracing::error!("Metrics unavailable: {}", e.user_message()),
    }

    // First page of loan slips
    let controller = QueryController::with_debounce(
        LoanSlipQuery::with_limit(config.list.default_limit),
        config.list.search_debounce(),
    );
    let board = LoanSlipBoard::linked(services.loan_slips.clone(), &controller);
    if let Err(e) = board.load(controller.current()).await {
        tracing::error!("Loan slips unavailable: {}", e.user_message());
    }

    let snapshot = board.snapshot().await;
    println!(
        "\nLoan slips (page {} of {}, {} total)",
        snapshot.query.as_ref().map(|q| q.page).unwrap_or(1),
        snapshot.total_pages(),
        snapshot.total
    );
    for slip in &snapshot.items {
        println!(
            "  #{:<5} {:<30} {:<20} {:<10} {} -> {}",
            slip.id,
            slip.name,
            slip.borrower_name,
            slip.status.label(),
            slip.borrowed_date.map(format_display).unwrap_or_default(),
            slip.returned_date.map(format_display).unwrap_or_default(),
        );
    }

    // Notifications
    let feed = NotificationFeed::with_page_size(services.notifications.clone(), config.notifications.page_size);
    let clock = RelativeClock::start(config.notifications.tick());
    if let Err(e) = feed.refresh_unread_count().await {
        tracing::error!("Unread count unavailable: {}", e.user_message());
    }
    if let Err(e) = feed.load_page(1).await {
        tracing::error!("Notifications unavailable: {}", e.user_message());
    }

    let notifications = feed.snapshot().await;
    println!("\nNotifications ({} unread)", notifications.unread_count);
    for n in &notifications.items {
        println!(
            "  {} {} - {} ({})",
            if n.is_read { " " } else { "*" },
            n.title,
            n.content,
            clock.label(n.created_at)
        );
    }

    Ok(())
}

/// Install the global subscriber; logs go to stderr
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("loan_desk={}", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
