use std::{net::SocketAddr, time::Duration};

use axum::Router;
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle, Toplevel};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod config;
mod engagement;
mod error;
mod item;
mod provider;
mod routes;
mod search;
mod util;
mod view;

pub use error::{Error, Result};

use crate::{config::Settings, routes::AppState, view::ViewRegistry};

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .init();

  let settings = Settings::from_env()?;
  let views = ViewRegistry::builtin()?;
  info!(
    provider = ?settings.provider,
    engagement = ?settings.engagement,
    views = ?views.names().collect::<Vec<_>>(),
    "starting"
  );

  let app = routes::router(AppState::new(&settings, views));
  let addr = settings.listen_addr();

  Toplevel::new(move |s| async move {
    s.start(SubsystemBuilder::new("http", move |subsys| {
      serve(app, addr, subsys)
    }));
  })
  .catch_signals()
  .handle_shutdown_requests(Duration::from_secs(5))
  .await
  .map_err(|e| Error::Server(e.to_string()))
}

async fn serve(
  app: Router,
  addr: SocketAddr,
  subsys: SubsystemHandle,
) -> Result<()> {
  let server = axum::Server::try_bind(&addr)
    .map_err(|e| Error::Server(format!("failed to bind {addr}: {e}")))?;

  info!("Listening on {}", addr);

  server
    .serve(app.into_make_service())
    .with_graceful_shutdown(subsys.on_shutdown_requested())
    .await
    .map_err(|e| Error::Server(e.to_string()))
}
