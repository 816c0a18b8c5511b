use std::{net::SocketAddr, sync::Arc};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

mod admin;
mod config;
mod turbo;

use admin::DemoPage;
use config::{load_settings, Settings};
use turbo::NegotiateConfig;

const MAX_FORM_BYTES: usize = 64 * 1024;

struct AppState {
    negotiate: NegotiateConfig,
    admin_home: String,
    pages: RwLock<Vec<DemoPage>>,
}

impl AppState {
    fn new(settings: &Settings) -> Self {
        Self {
            negotiate: NegotiateConfig {
                site_title: settings.site_title.clone(),
                frame_url: settings.frame_url.clone(),
                max_body_bytes: settings.max_body_bytes,
            },
            admin_home: settings.admin_home.clone(),
            pages: RwLock::new(admin::seed_pages()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let app = build_router(Arc::new(AppState::new(&settings)));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/admin/", get(admin::dashboard))
        .route("/admin/pages/", get(admin::page_explorer))
        .route(
            "/admin/pages/add/",
            get(admin::add_page_get).post(admin::add_page_post),
        )
        .route("/admin/pages/:id/", get(admin::page_editor))
        .route("/admin/pages/:id/delete/", post(admin::delete_page))
        .route("/admin/settings/", get(admin::settings_page))
        .route("/admin/legacy/", get(admin::legacy_page))
        .route("/admin/reports/pages.csv", get(admin::export_pages))
        .route("/admin/crash/", get(admin::crash))
        .route("/admin/turbo-init/", get(admin::turbo_init))
        .route("/admin/turbo-frame/", get(admin::turbo_frame))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            turbo::turbo_enable,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_FORM_BYTES))
        .with_state(state);

    Router::new().route("/healthz", get(healthz)).merge(admin)
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
