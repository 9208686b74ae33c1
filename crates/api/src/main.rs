use anyhow::Context;

use quill_auth::AuthConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quill_observability::init();

    let config = AuthConfig::from_env().context("loading auth configuration")?;
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = quill_api::app::build_app(&config).context("building application")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
