use std::sync::Arc;

use axum::{
  body::Bytes,
  extract::{Path, State},
  response::IntoResponse,
  routing::{get, post},
  Json, Router,
};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
  aggregate::Aggregator, config::Settings, item::VideoItem,
  search::TrackSearch, view::ViewRegistry, Result,
};

#[derive(Clone)]
pub struct AppState {
  views: Arc<ViewRegistry>,
  aggregator: Aggregator,
  search: TrackSearch,
}

impl AppState {
  pub fn new(settings: &Settings, views: ViewRegistry) -> Self {
    let provider = settings.build_provider();
    let engagement = settings.engagement.estimator();

    Self {
      views: Arc::new(views),
      aggregator: Aggregator::new(provider.clone(), engagement.clone()),
      search: TrackSearch::new(provider, engagement)
        .with_limit(settings.search_limit),
    }
  }
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/search", post(search))
    .route("/:view", get(view_feed))
    .with_state(state)
}

#[axum::debug_handler]
pub async fn view_feed(
  State(state): State<AppState>,
  Path(name): Path<String>,
) -> Result<Json<Vec<VideoItem>>> {
  let view = state.views.get(&name)?;
  let mut rng = StdRng::from_entropy();

  let set = state
    .aggregator
    .aggregate(&view.terms, &view.plan, &mut rng)
    .await;

  let report = &set.report;
  info!(
    view = %view.name,
    terms = report.terms,
    fetched = report.fetched,
    failed = report.failed,
    abandoned = report.abandoned,
    duplicates = report.duplicates,
    over_capacity = report.over_capacity,
    merged = report.merged,
    "view aggregated"
  );

  Ok(Json(set.items))
}

// Any body is accepted. One without a string or numeric `query` searches
// for nothing and still answers `[]`.
pub async fn search(
  State(state): State<AppState>,
  body: Bytes,
) -> Json<Vec<VideoItem>> {
  let query = query_from_body(&body);
  let mut rng = StdRng::from_entropy();

  let items = state.search.search(&query, &mut rng).await;
  info!(query = %query, count = items.len(), "search served");

  Json(items)
}

fn query_from_body(body: &[u8]) -> String {
  let value: Value = match serde_json::from_slice(body) {
    Ok(value) => value,
    Err(e) => {
      debug!("search body is not json: {e}");
      return String::new();
    }
  };

  match value.get("query") {
    Some(Value::String(query)) => query.clone(),
    Some(Value::Number(n)) => n.to_string(),
    _ => String::new(),
  }
}

async fn health() -> impl IntoResponse {
  "ok".to_owned()
}
