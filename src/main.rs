mod analytics;
mod config;
mod db;
mod domain;
mod postgrest;
mod services;
mod state;
mod time_utils;
mod web;

use crate::config::Config;
use crate::state::{AppState, SharedState};
use axum::{routing::get_service, Router};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;
    tracing::info!(
        "Portal timezone {}, finance proxy {}, CRM embed {}",
        config.timezone,
        if config.quickbooks_proxy_url.is_some() { "enabled" } else { "disabled" },
        if config.crm_dashboard_url.is_some() { "configured" } else { "not configured" },
    );

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    let bind_addr = config.bind_addr.clone();
    let refresh_cron = config.payments_refresh_cron.clone();
    let shared: SharedState = Arc::new(AppState::new(config, http));

    let scheduler = JobScheduler::new().await?;

    // Payments dashboard snapshot; overlapping cycles are skipped by the cache.
    let shared_for_payments = shared.clone();
    scheduler
        .add(Job::new_async(refresh_cron.as_str(), move |_uuid, _l| {
            let state = shared_for_payments.clone();
            Box::pin(async move {
                match state.payments.refresh(&state.rest, state.today()).await {
                    Ok(Some(snapshot)) => {
                        tracing::debug!("Payments snapshot refreshed at {}", snapshot.generated_at);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!("Scheduled payments refresh failed: {}", e);
                    }
                }
            })
        })?)
        .await?;

    scheduler.start().await?;
    tracing::info!("Scheduler started:");
    tracing::info!("  - Payments snapshot: {}", refresh_cron);

    let static_handler = ServeDir::new("static").not_found_service(ServeFile::new("static/index.html"));

    let app = Router::new()
        .merge(web::routes(shared.clone()))
        .nest_service("/static", ServeDir::new("static"))
        .fallback_service(get_service(static_handler))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {bind_addr}");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
