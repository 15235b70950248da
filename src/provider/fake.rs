use std::{collections::HashMap, sync::Mutex, time::Duration};

use async_trait::async_trait;

use crate::{item::SearchEntry, Error, Result};

use super::SearchProvider;

#[derive(Debug, Clone)]
enum Script {
  Respond(Vec<SearchEntry>),
  Delay(Duration, Vec<SearchEntry>),
  Fail(String),
  Hang,
}

/// Terms without a script answer with an empty batch.
#[derive(Debug, Default)]
pub struct FakeProvider {
  scripts: HashMap<String, Script>,
  calls: Mutex<Vec<(String, usize)>>,
}

impl FakeProvider {
  pub fn respond(mut self, term: &str, entries: Vec<SearchEntry>) -> Self {
    self.scripts.insert(term.into(), Script::Respond(entries));
    self
  }

  pub fn delay(
    mut self,
    term: &str,
    delay: Duration,
    entries: Vec<SearchEntry>,
  ) -> Self {
    self.scripts.insert(term.into(), Script::Delay(delay, entries));
    self
  }

  pub fn fail(mut self, term: &str, reason: &str) -> Self {
    self.scripts.insert(term.into(), Script::Fail(reason.into()));
    self
  }

  pub fn hang(mut self, term: &str) -> Self {
    self.scripts.insert(term.into(), Script::Hang);
    self
  }

  pub fn calls(&self) -> Vec<(String, usize)> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl SearchProvider for FakeProvider {
  async fn search(
    &self,
    term: &str,
    limit: usize,
    _timeout: Option<Duration>,
  ) -> Result<Vec<SearchEntry>> {
    self.calls.lock().unwrap().push((term.to_string(), limit));

    let script = self.scripts.get(term).cloned();
    let entries = match script {
      None => vec![],
      Some(Script::Respond(entries)) => entries,
      Some(Script::Delay(delay, entries)) => {
        tokio::time::sleep(delay).await;
        entries
      }
      Some(Script::Fail(reason)) => return Err(Error::Provider(reason)),
      Some(Script::Hang) => futures::future::pending().await,
    };

    Ok(entries.into_iter().take(limit).collect())
  }
}

pub fn entry(id: &str, title: &str, duration: f64) -> SearchEntry {
  SearchEntry {
    id: id.into(),
    title: title.into(),
    duration: Some(duration),
    channel: Some("Some Channel".into()),
    ..Default::default()
  }
}

/// `count` full-length entries with ids `{prefix}-0`, `{prefix}-1`, ...
pub fn batch(prefix: &str, count: usize) -> Vec<SearchEntry> {
  (0..count)
    .map(|i| {
      let id = format!("{prefix}-{i}");
      let title = format!("{prefix} song {i}");
      entry(&id, &title, 180.0)
    })
    .collect()
}
