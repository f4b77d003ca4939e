use dotenv::dotenv;
use sportmeet::app;
use sportmeet::modules::Modules;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "sportmeet=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let modules = Modules::load_from_settings().await?;
    let addr = modules.app.addr;

    info!("Starting server");
    info!("Listening on {addr}");
    axum::Server::bind(&addr)
        .serve(
            app(modules)
                .await
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
    Ok(())
}
