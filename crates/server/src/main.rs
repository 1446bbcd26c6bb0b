//! Grantdesk server entry point.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use grantdesk_api::{middleware::AppState, router as api_router};
use grantdesk_common::Config;
use grantdesk_core::{
    AuditService, AuditSink, BulkRemovalService, DbUserAdmin, EligibilityService,
    EnrollmentService, InviteService, ProfileService, ProjectService, RemoteUserAdmin,
    ReportService, UserAdminGateway,
};
use grantdesk_db::repositories::{
    AuditLogRepository, EnrollmentRepository, InviteCodeRepository, PaymentRepository,
    ProfileRepository, ProjectRepository, ReportRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often abandoned removal sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "grantdesk=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Pick the user administration backend.
///
/// An externally hosted function is used when one is configured; otherwise
/// users are removed in-process.
fn user_admin_gateway(
    config: &Config,
    profile_repo: ProfileRepository,
) -> Result<Arc<dyn UserAdminGateway>, Box<dyn std::error::Error>> {
    if let Some(remote) = RemoteUserAdmin::from_config(&config.user_admin)? {
        info!(endpoint = %remote.endpoint(), "Using remote user administration");
        return Ok(Arc::new(remote));
    }
    info!("Using in-process user administration");
    Ok(Arc::new(DbUserAdmin::new(profile_repo)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    init_tracing(config.logging.json);
    info!("Starting grantdesk server...");

    // Connect to database
    let db = grantdesk_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    grantdesk_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Initialize repositories
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let enrollment_repo = EnrollmentRepository::new(Arc::clone(&db));
    let payment_repo = PaymentRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let project_repo = ProjectRepository::new(Arc::clone(&db));
    let invite_repo = InviteCodeRepository::new(Arc::clone(&db));
    let audit_repo = AuditLogRepository::new(Arc::clone(&db));

    // Initialize services
    let audit_service = AuditService::new(audit_repo);
    let audit_sink: Arc<dyn AuditSink> = Arc::new(audit_service.clone());
    let gateway = user_admin_gateway(&config, profile_repo.clone())?;

    let eligibility_service = EligibilityService::new(
        profile_repo.clone(),
        enrollment_repo.clone(),
        payment_repo.clone(),
        report_repo.clone(),
    );
    let bulk_removal_service = BulkRemovalService::new(
        eligibility_service,
        gateway,
        Arc::clone(&audit_sink),
        &config.removal,
    );

    let state = AppState {
        profile_service: ProfileService::new(profile_repo.clone()),
        bulk_removal_service: bulk_removal_service.clone(),
        audit_service,
        invite_service: InviteService::new(
            invite_repo,
            profile_repo.clone(),
            Arc::clone(&audit_sink),
        ),
        enrollment_service: EnrollmentService::new(
            enrollment_repo.clone(),
            payment_repo,
            profile_repo,
            project_repo.clone(),
        ),
        report_service: ReportService::new(report_repo, enrollment_repo.clone()),
        project_service: ProjectService::new(project_repo, enrollment_repo, audit_sink),
    };

    // Sweep removal sessions that were opened and never finished
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            bulk_removal_service.sessions().cleanup_expired().await;
        }
    });

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            grantdesk_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
