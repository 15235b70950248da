use std::{sync::Arc, time::Duration};

use rand::RngCore;
use tracing::warn;

use crate::{
  engagement::{self, EngagementEstimator},
  item::{SearchEntry, VideoItem},
  provider::{search_within, SearchProvider},
};

pub const DEFAULT_SEARCH_LIMIT: usize = 100;
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(5);

// titles that usually mean a multi-track upload rather than a single song
const NOT_A_TRACK: [&str; 3] = ["mix", "playlist", "compilation"];

// plain lowercase containment, so no Unicode case-folding equivalents
pub fn looks_like_single_track(entry: &SearchEntry) -> bool {
  let title = entry.title.to_lowercase();
  !NOT_A_TRACK.iter().any(|word| title.contains(word))
}

#[derive(Clone)]
pub struct TrackSearch {
  provider: Arc<dyn SearchProvider>,
  engagement: Option<Arc<dyn EngagementEstimator>>,
  limit: usize,
  timeout: Option<Duration>,
}

impl TrackSearch {
  pub fn new(
    provider: Arc<dyn SearchProvider>,
    engagement: Option<Arc<dyn EngagementEstimator>>,
  ) -> Self {
    Self {
      provider,
      engagement,
      limit: DEFAULT_SEARCH_LIMIT,
      timeout: Some(DEFAULT_SEARCH_TIMEOUT),
    }
  }

  pub fn with_limit(self, limit: usize) -> Self {
    Self {
      limit: limit.max(1),
      ..self
    }
  }

  /// Provider order is preserved; failures yield an empty list.
  pub async fn search<R>(&self, query: &str, rng: &mut R) -> Vec<VideoItem>
  where
    R: RngCore + Send,
  {
    let query = query.trim();
    if query.is_empty() {
      return vec![];
    }

    let entries =
      match search_within(&*self.provider, query, self.limit, self.timeout)
        .await
      {
        Ok(entries) => entries,
        Err(error) => {
          warn!(query, %error, "search failed");
          return vec![];
        }
      };

    entries
      .into_iter()
      .filter(SearchEntry::is_full_length)
      .filter(looks_like_single_track)
      .map(|entry| {
        let engagement =
          engagement::estimate(self.engagement.as_deref(), &entry, &mut *rng);
        VideoItem::from_entry(entry, engagement)
      })
      .collect()
  }
}
