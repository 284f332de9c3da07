use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use serde_json::json;
use std::sync::Arc;
use tera::Context;

use crate::state::AppState;

/// Public landing page, rendered entirely from the settings store. Every
/// section falls back to its default, so a missing or corrupt setting can
/// never blank the page. Each hit is counted for the visit analytics.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = crate::db::record_visit(state.pool.as_ref()).await {
        tracing::warn!("failed to record visit: {}", e);
    }

    let settings = crate::db::list_settings(state.pool.as_ref())
        .await
        .unwrap_or_default();
    let site = crate::settings::landing_payload(&settings);

    let themes: Vec<_> = crate::themes::catalog()
        .iter()
        .map(|(theme, sub_themes)| json!({ "theme": theme, "sub_themes": sub_themes }))
        .collect();

    let mut ctx = Context::new();
    ctx.insert("site", &site);
    ctx.insert("themes", &themes);
    render_template("index.html", ctx).await
}

async fn render_template(name: &str, ctx: Context) -> Html<String> {
    let tera = crate::templates::get_tera();
    let rendered = tera
        .render(name, &ctx)
        .unwrap_or_else(|_| format!("Template error: {}", name));
    Html(rendered)
}
