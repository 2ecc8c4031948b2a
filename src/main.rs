mod config;
mod event;
mod routes;
mod services;
mod state;

use config::Config;
use services::registry::RoomRegistry;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let registry = RoomRegistry::new();
    let state = state::AppState::new(registry.clone());

    // Spawn background room reaper (no-op unless an idle TTL is set).
    let _reaper = services::reaper::spawn_reaper_task(registry, config.room_idle_ttl, config.reap_interval);

    let app = routes::app(state);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    tracing::info!(%addr, "collabcanvas listening");
    axum::serve(listener, app).await.expect("server failed");
}
