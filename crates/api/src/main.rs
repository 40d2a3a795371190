use anyhow::Context;

const BIND_ADDR_VAR: &str = "BHVR_BIND_ADDR";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bhvr_observability::init();

    let bind_addr = std::env::var(BIND_ADDR_VAR).unwrap_or_else(|_| {
        tracing::info!("{BIND_ADDR_VAR} not set; using {DEFAULT_BIND_ADDR}");
        DEFAULT_BIND_ADDR.to_string()
    });

    let app = bhvr_api::app::build_app();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
