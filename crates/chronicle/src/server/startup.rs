//! REST server startup

use anyhow::Result;
use axum::serve;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::server::handlers::AppState;
use crate::server::routing::create_router;

/// Bind `addr` and serve until the process receives Ctrl-C
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
  let app = create_router(state).layer(
    ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()),
  );

  let listener = TcpListener::bind(addr).await?;
  tracing::info!(%addr, "chronicle server listening");
  bentley::info!("Server listening on {}", listener.local_addr()?);

  serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
    })
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {e}"))?;

  tracing::info!("chronicle server shut down");
  Ok(())
}
