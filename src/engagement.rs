use std::{ops::RangeInclusive, str::FromStr, sync::Arc};

use rand::{Rng, RngCore};

use crate::{item::SearchEntry, Error};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Engagement {
  pub views: Option<u64>,
  pub likes: Option<u64>,
}

impl Engagement {
  pub fn none() -> Self {
    Self::default()
  }
}

/// Fills the "views"/"likes" fields of a served item. The search listing
/// carries no reliable like counts and only sometimes a view count. Which
/// estimator runs is chosen by the `ENGAGEMENT` setting, and by default none
/// does.
pub trait EngagementEstimator: Send + Sync {
  fn estimate(&self, entry: &SearchEntry, rng: &mut dyn RngCore) -> Engagement;
}

/// Passes through whatever counts the provider reported. These are
/// authoritative but frequently absent.
pub struct ProviderReported;

impl EngagementEstimator for ProviderReported {
  fn estimate(
    &self,
    entry: &SearchEntry,
    _rng: &mut dyn RngCore,
  ) -> Engagement {
    Engagement {
      views: entry.view_count,
      likes: entry.like_count,
    }
  }
}

pub const SYNTHETIC_VIEWS: RangeInclusive<u64> = 100_000..=50_000_000;
pub const SYNTHETIC_LIKES: RangeInclusive<u64> = 1_000..=500_000;

/// Made-up numbers for demo deployments.
///
/// NOT real platform data: every value is drawn uniformly at random per
/// response and has no relation to the video. Never present these as
/// authoritative.
pub struct Synthetic;

impl EngagementEstimator for Synthetic {
  fn estimate(
    &self,
    _entry: &SearchEntry,
    rng: &mut dyn RngCore,
  ) -> Engagement {
    Engagement {
      views: Some(rng.gen_range(SYNTHETIC_VIEWS)),
      likes: Some(rng.gen_range(SYNTHETIC_LIKES)),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngagementMode {
  #[default]
  Off,
  Provider,
  Synthetic,
}

impl EngagementMode {
  pub fn estimator(self) -> Option<Arc<dyn EngagementEstimator>> {
    match self {
      EngagementMode::Off => None,
      EngagementMode::Provider => Some(Arc::new(ProviderReported)),
      EngagementMode::Synthetic => Some(Arc::new(Synthetic)),
    }
  }
}

impl FromStr for EngagementMode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "" | "off" | "none" => Ok(EngagementMode::Off),
      "provider" => Ok(EngagementMode::Provider),
      "synthetic" => Ok(EngagementMode::Synthetic),
      other => Err(Error::Config(format!("unknown engagement mode: {other}"))),
    }
  }
}

/// Runs the optional estimator over one entry.
pub fn estimate(
  estimator: Option<&dyn EngagementEstimator>,
  entry: &SearchEntry,
  rng: &mut dyn RngCore,
) -> Engagement {
  estimator
    .map(|e| e.estimate(entry, rng))
    .unwrap_or_else(Engagement::none)
}
