mod analytics;
mod config;
mod db;
mod error;
mod export;
mod notify;
mod routes;
mod scoring;
mod settings;
mod state;
mod storage;
mod templates;
mod themes;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simposio=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let config = Arc::new(config);

    crate::storage::ensure_dirs(&config.upload_folder)?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(pool.as_ref()).await?;

    let state = Arc::new(state::AppState {
        pool,
        config: config.clone(),
        notifier: Arc::new(notify::LogNotifier),
    });

    let app = Router::new()
        .route("/", get(routes::index))
        .route("/api/settings", get(routes::get_settings))
        .route("/api/settings/:key", put(routes::upsert_setting))
        .route("/api/files", post(routes::upload_file))
        .route("/files/:handle", get(routes::download_file))
        .route(
            "/api/submissions",
            get(routes::list_submissions).post(routes::create_submission),
        )
        .route("/api/submissions/status", post(routes::bulk_set_status))
        .route(
            "/api/submissions/:id",
            get(routes::get_submission)
                .put(routes::update_submission)
                .delete(routes::delete_submission),
        )
        .route("/api/submissions/:id/status", patch(routes::set_status))
        .route("/api/submissions/:id/score", get(routes::submission_score))
        .route("/api/submissions/:id/reviews", get(routes::submission_reviews))
        .route("/api/submissions/:id/reviewers", post(routes::assign_reviewers))
        .route(
            "/api/submissions/:id/reviewers/:reviewer_id",
            delete(routes::remove_reviewer),
        )
        .route("/api/reviews/:id/scores", put(routes::submit_scores))
        .route(
            "/api/payments",
            get(routes::list_payments).post(routes::create_payment),
        )
        .route("/api/payments/stats", get(routes::payment_stats))
        .route("/api/payments/:id/verify", post(routes::verify_payment))
        .route("/api/payments/:id/reject", post(routes::reject_payment))
        .route("/api/users", get(routes::list_users).post(routes::create_user))
        .route("/api/users/:id", delete(routes::delete_user))
        .route("/api/users/:id/role", patch(routes::change_role))
        .route(
            "/api/users/:id/toggle-verification",
            post(routes::toggle_verification),
        )
        .route("/api/analytics/overview", get(routes::analytics_overview))
        .route("/api/analytics/timeseries", get(routes::analytics_timeseries))
        .route("/api/export/submissions.csv", get(routes::export_submissions))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Simposio listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
