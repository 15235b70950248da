use serde::Serialize;

use crate::engagement::Engagement;

// anything this short is treated as a clip rather than a track
pub const MIN_DURATION_SECS: u64 = 60;

pub const UNKNOWN_CHANNEL: &str = "Unknown";

/// A single search hit as reported by a provider, before filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchEntry {
  pub id: String,
  pub title: String,
  pub duration: Option<f64>,
  pub channel: Option<String>,
  pub view_count: Option<u64>,
  pub like_count: Option<u64>,
}

impl SearchEntry {
  pub fn duration_secs(&self) -> u64 {
    self
      .duration
      .filter(|d| d.is_finite() && *d > 0.0)
      .map(|d| d as u64)
      .unwrap_or_default()
  }

  pub fn is_full_length(&self) -> bool {
    self.duration_secs() > MIN_DURATION_SECS
  }
}

/// The wire shape served to the front end.
///
/// `views` and `likes` are only present when an engagement estimator is
/// configured, and may be synthetic. See
/// [`crate::engagement::EngagementEstimator`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoItem {
  pub id: String,
  pub title: String,
  pub duration: u64,
  pub thumbnail: String,
  pub channel: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub views: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub likes: Option<u64>,
}

impl VideoItem {
  pub fn from_entry(entry: SearchEntry, engagement: Engagement) -> Self {
    let duration = entry.duration_secs();
    let thumbnail = thumbnail_url(&entry.id);
    let channel = entry
      .channel
      .filter(|c| !c.is_empty())
      .unwrap_or_else(|| UNKNOWN_CHANNEL.to_string());

    Self {
      id: entry.id,
      title: entry.title,
      duration,
      thumbnail,
      channel,
      views: engagement.views,
      likes: engagement.likes,
    }
  }
}

pub fn thumbnail_url(video_id: &str) -> String {
  format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg")
}
