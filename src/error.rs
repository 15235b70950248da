use std::time::Duration;

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("io error: {0}")]
  IO(#[from] std::io::Error),

  #[error("failed to decode provider output: {0}")]
  Json(#[from] serde_json::Error),

  #[error("http request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("provider error: {0}")]
  Provider(String),

  #[error("provider call timed out after {0:?}")]
  Timeout(Duration),

  #[error("unknown view: {0}")]
  UnknownView(String),

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("server error: {0}")]
  Server(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::UnknownView(_) => StatusCode::NOT_FOUND,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, self.to_string()).into_response()
  }
}
