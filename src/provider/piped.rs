use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::{item::SearchEntry, Error, Result};

use super::SearchProvider;

pub const DEFAULT_PIPED_INSTANCE: &str = "pipedapi.kavin.rocks";

// upper bound on result pages fetched for one term
const MAX_PAGES: usize = 5;

#[derive(Clone, Debug)]
pub struct PipedInstance {
  base: String,
}

impl PipedInstance {
  // a bare domain means https
  pub fn new(domain: impl Into<String>) -> Self {
    let domain = domain.into();
    let domain = domain.trim_end_matches('/');
    let base = if domain.contains("://") {
      domain.to_string()
    } else {
      format!("https://{domain}")
    };

    Self { base }
  }

  pub fn search_url(&self, term: &str) -> Result<Url> {
    self.url("search", &[("q", term), ("filter", "videos")])
  }

  pub fn nextpage_url(&self, term: &str, token: &str) -> Result<Url> {
    self.url(
      "nextpage/search",
      &[("nextpage", token), ("q", term), ("filter", "videos")],
    )
  }

  fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
    Url::parse_with_params(&format!("{}/{path}", self.base), params)
      .map_err(|e| Error::Config(format!("bad piped instance: {e}")))
  }
}

impl Default for PipedInstance {
  fn default() -> Self {
    Self::new(DEFAULT_PIPED_INSTANCE)
  }
}

// search through a Piped API instance instead of the platform itself
pub struct Piped {
  instance: PipedInstance,
  client: reqwest::Client,
}

impl Piped {
  pub fn new(instance: PipedInstance) -> Self {
    Self {
      instance,
      client: reqwest::Client::new(),
    }
  }

  async fn fetch(
    &self,
    url: Url,
    timeout: Option<Duration>,
  ) -> Result<PipedSearch> {
    let mut req = self.client.get(url).header("User-Agent", "Mozilla/5.0");
    if let Some(timeout) = timeout {
      req = req.timeout(timeout);
    }

    let page = req
      .send()
      .await?
      .error_for_status()?
      .json::<PipedSearch>()
      .await?;

    Ok(page)
  }
}

#[async_trait]
impl SearchProvider for Piped {
  async fn search(
    &self,
    term: &str,
    limit: usize,
    timeout: Option<Duration>,
  ) -> Result<Vec<SearchEntry>> {
    let mut entries = Vec::new();
    let mut url = self.instance.search_url(term)?;

    for _ in 0..MAX_PAGES {
      let mut page = self.fetch(url, timeout).await?;
      let nextpage = page.nextpage.take();
      let exhausted = page.items.is_empty();
      entries.extend(page.into_entries(limit - entries.len()));

      match nextpage {
        Some(token) if !exhausted && entries.len() < limit => {
          debug!(term, collected = entries.len(), "following piped nextpage");
          url = self.instance.nextpage_url(term, &token)?;
        }
        _ => break,
      }
    }

    Ok(entries)
  }
}

#[derive(Debug, Deserialize)]
struct PipedSearch {
  #[serde(default)]
  items: Vec<PipedItem>,
  nextpage: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedItem {
  url: Option<String>,
  #[serde(rename = "type")]
  kind: Option<String>,
  title: Option<String>,
  uploader_name: Option<String>,
  // -1 for live streams
  duration: Option<i64>,
  // -1 when hidden
  views: Option<i64>,
}

impl PipedSearch {
  fn into_entries(self, limit: usize) -> Vec<SearchEntry> {
    self
      .items
      .into_iter()
      .filter(|item| item.kind.as_deref().map_or(true, |k| k == "stream"))
      .filter_map(PipedItem::into_search_entry)
      .take(limit)
      .collect()
  }
}

impl PipedItem {
  fn into_search_entry(self) -> Option<SearchEntry> {
    let id = video_id_from_url(self.url.as_deref()?)?;

    Some(SearchEntry {
      id,
      title: self.title?,
      duration: self.duration.filter(|d| *d >= 0).map(|d| d as f64),
      channel: self.uploader_name,
      view_count: self.views.and_then(|v| u64::try_from(v).ok()),
      like_count: None,
    })
  }
}

fn video_id_from_url(url: &str) -> Option<String> {
  let id = url.strip_prefix("/watch?v=")?;
  let id = id.split('&').next().unwrap_or_default();
  (!id.is_empty()).then(|| id.to_string())
}
