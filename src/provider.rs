mod piped;
mod ytdlp;

#[cfg(test)]
pub mod fake;

use std::time::Duration;

use async_trait::async_trait;

use crate::{item::SearchEntry, Error, Result};

pub use piped::{Piped, PipedInstance};
pub use ytdlp::Ytdlp;

/// An external video search capability.
///
/// Implementations return entries in the platform's own ranking order and
/// perform no filtering. `limit` is an upper bound on the number of entries.
/// `timeout`, when set, should be honoured at the transport level; callers
/// additionally enforce it with [`search_within`].
#[async_trait]
pub trait SearchProvider: Send + Sync {
  async fn search(
    &self,
    term: &str,
    limit: usize,
    timeout: Option<Duration>,
  ) -> Result<Vec<SearchEntry>>;
}

pub async fn search_within(
  provider: &dyn SearchProvider,
  term: &str,
  limit: usize,
  timeout: Option<Duration>,
) -> Result<Vec<SearchEntry>> {
  let search = provider.search(term, limit, timeout);
  match timeout {
    Some(t) => tokio::time::timeout(t, search)
      .await
      .map_err(|_| Error::Timeout(t))?,
    None => search.await,
  }
}
