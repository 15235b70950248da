use std::{collections::HashSet, sync::Arc, time::Duration};

use futures::FutureExt;
use rand::{seq::SliceRandom, RngCore};
use tracing::{debug, warn};

use crate::{
  engagement::{self, EngagementEstimator},
  item::{SearchEntry, VideoItem},
  provider::{search_within, SearchProvider},
  util::fan_out,
  view::FanOutPlan,
  Error,
};

/// What a single term's fetch task produced.
#[derive(Debug)]
pub enum TermOutcome {
  /// full-length entries, already filtered and capped per term
  Fetched {
    term: String,
    entries: Vec<SearchEntry>,
  },
  Failed {
    term: String,
    error: Error,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationReport {
  pub terms: usize,
  pub fetched: usize,
  pub failed: usize,
  /// still running (or queued) when the deadline hit
  pub abandoned: usize,
  pub duplicates: usize,
  /// entries dropped because the result was already full
  pub over_capacity: usize,
  pub merged: usize,
}

#[derive(Debug)]
pub struct AggregatedResultSet {
  pub items: Vec<VideoItem>,
  pub report: AggregationReport,
}

#[derive(Clone)]
pub struct Aggregator {
  provider: Arc<dyn SearchProvider>,
  engagement: Option<Arc<dyn EngagementEstimator>>,
}

impl Aggregator {
  pub fn new(
    provider: Arc<dyn SearchProvider>,
    engagement: Option<Arc<dyn EngagementEstimator>>,
  ) -> Self {
    Self {
      provider,
      engagement,
    }
  }

  /// Searches every term, merges the batches in completion order and
  /// returns them shuffled with `rng`.
  ///
  /// Never fails: terms that error or outlive `plan.deadline` simply
  /// contribute nothing and are tallied in the report.
  pub async fn aggregate<R>(
    &self,
    terms: &[String],
    plan: &FanOutPlan,
    rng: &mut R,
  ) -> AggregatedResultSet
  where
    R: RngCore + Send,
  {
    let jobs: Vec<_> = terms
      .iter()
      .map(|term| {
        fetch_term(
          self.provider.clone(),
          term.clone(),
          plan.per_term_limit,
          plan.per_term_keep.unwrap_or(usize::MAX),
          plan.call_timeout,
        )
        .boxed()
      })
      .collect();

    let mut acc = Accumulator {
      seen: HashSet::new(),
      items: Vec::new(),
      capacity: plan.capacity,
      estimator: self.engagement.as_deref(),
      rng,
      report: AggregationReport {
        terms: terms.len(),
        ..Default::default()
      },
    };

    let summary =
      fan_out(jobs, plan.width, plan.deadline, |outcome: TermOutcome| {
        acc.absorb(outcome)
      })
      .await;

    debug!(completed = summary.completed, "fan-out finished");

    let mut set = acc.finish();
    set.report.abandoned = summary.abandoned;
    set
  }
}

async fn fetch_term(
  provider: Arc<dyn SearchProvider>,
  term: String,
  limit: usize,
  keep: usize,
  timeout: Option<Duration>,
) -> TermOutcome {
  match search_within(&*provider, &term, limit, timeout).await {
    Ok(entries) => {
      let entries = entries
        .into_iter()
        .filter(SearchEntry::is_full_length)
        .take(keep)
        .collect();
      TermOutcome::Fetched { term, entries }
    }
    Err(error) => TermOutcome::Failed { term, error },
  }
}

struct Accumulator<'a, R> {
  seen: HashSet<String>,
  items: Vec<VideoItem>,
  capacity: usize,
  estimator: Option<&'a dyn EngagementEstimator>,
  rng: &'a mut R,
  report: AggregationReport,
}

impl<R: RngCore> Accumulator<'_, R> {
  fn absorb(&mut self, outcome: TermOutcome) {
    match outcome {
      TermOutcome::Fetched { term, entries } => {
        debug!(%term, count = entries.len(), "merging term results");
        self.report.fetched += 1;
        self.merge(entries);
      }
      TermOutcome::Failed { term, error } => {
        warn!(%term, %error, "search term failed");
        self.report.failed += 1;
      }
    }
  }

  fn merge(&mut self, entries: Vec<SearchEntry>) {
    for entry in entries {
      if self.seen.contains(&entry.id) {
        self.report.duplicates += 1;
        continue;
      }
      if self.items.len() >= self.capacity {
        self.report.over_capacity += 1;
        continue;
      }

      let engagement =
        engagement::estimate(self.estimator, &entry, &mut *self.rng);
      self.seen.insert(entry.id.clone());
      self.items.push(VideoItem::from_entry(entry, engagement));
    }
  }

  fn finish(mut self) -> AggregatedResultSet {
    self.items.shuffle(&mut *self.rng);
    self.report.merged = self.items.len();

    AggregatedResultSet {
      items: self.items,
      report: self.report,
    }
  }
}
