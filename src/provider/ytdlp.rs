use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{process::Command, sync::Semaphore};
use tracing::{debug, info};

use crate::{item::SearchEntry, util::redact_proxy, Error, Result};

use super::SearchProvider;

// run yt-dlp command line to search without visiting video pages.
// requires yt-dlp executable to be in PATH.
pub struct Ytdlp {
  // ensure only a limited set of ytdlp processes at a time
  slots: Semaphore,
  proxy: Option<String>,
}

impl Ytdlp {
  pub fn new(concurrency: usize, proxy: Option<String>) -> Self {
    if let Some(proxy) = &proxy {
      info!("yt-dlp using proxy: {}", redact_proxy(proxy));
    }

    Self {
      slots: Semaphore::new(concurrency.max(1)),
      proxy,
    }
  }

  fn command(
    &self,
    term: &str,
    limit: usize,
    timeout: Option<Duration>,
  ) -> Command {
    let mut cmd = Command::new("yt-dlp");
    cmd
      // don't fetch video pages
      .arg("--flat-playlist")
      // emit the output as a single json object instead of jsonl
      .arg("--dump-single-json")
      .arg("--no-warnings");

    if let Some(timeout) = timeout {
      cmd
        .arg("--socket-timeout")
        .arg(timeout.as_secs().max(1).to_string());
    }

    if let Some(proxy) = &self.proxy {
      cmd.arg("--proxy").arg(proxy);
    }

    cmd
      .arg(format!("ytsearch{limit}:{term}"))
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      // abandoned or timed out searches must not leave processes behind
      .kill_on_drop(true);

    cmd
  }
}

#[async_trait]
impl SearchProvider for Ytdlp {
  async fn search(
    &self,
    term: &str,
    limit: usize,
    timeout: Option<Duration>,
  ) -> Result<Vec<SearchEntry>> {
    let mut cmd = self.command(term, limit, timeout);

    let guard = self
      .slots
      .acquire()
      .await
      .map_err(|_| Error::Provider("yt-dlp slots closed".into()))?;
    let output = cmd.output().await?;
    drop(guard);

    detect_error(&output.stderr)?;
    if !output.status.success() {
      return Err(Error::Provider(format!(
        "yt-dlp exited with {}",
        output.status
      )));
    }

    let entries = parse_search_output(&output.stdout)?;
    debug!(term, count = entries.len(), "yt-dlp search finished");
    Ok(entries)
  }
}

#[derive(Debug, Deserialize)]
struct Playlist {
  #[serde(default)]
  entries: Vec<Option<Entry>>,
}

#[derive(Debug, Deserialize)]
struct Entry {
  id: Option<String>,
  title: Option<String>,
  duration: Option<f64>,
  channel: Option<String>,
  view_count: Option<u64>,
  like_count: Option<u64>,
}

impl Entry {
  fn into_search_entry(self) -> Option<SearchEntry> {
    Some(SearchEntry {
      id: self.id.filter(|id| !id.is_empty())?,
      title: self.title?,
      duration: self.duration,
      channel: self.channel,
      view_count: self.view_count,
      like_count: self.like_count,
    })
  }
}

fn parse_search_output(stdout: &[u8]) -> Result<Vec<SearchEntry>> {
  let playlist: Playlist = serde_json::from_slice(stdout)?;

  Ok(
    playlist
      .entries
      .into_iter()
      .flatten()
      .filter_map(Entry::into_search_entry)
      .collect(),
  )
}

fn detect_error(bytes: &[u8]) -> Result<()> {
  let s = String::from_utf8_lossy(bytes);
  if s.contains("ERROR:") {
    Err(Error::Provider(s.trim().to_string()))
  } else {
    Ok(())
  }
}
