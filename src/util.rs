use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::{
  sync::{mpsc, Semaphore},
  time::Instant,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutSummary {
  pub completed: usize,
  pub abandoned: usize,
}

// Runs `jobs` on the tokio runtime with at most `width` of them in flight,
// handing each output to `on_complete` in completion order.
//
// Outputs are only ever handled on the calling task, so `on_complete` may
// freely mutate local state.
//
// When `deadline` elapses the remaining jobs are abandoned: running ones are
// detached and left to finish on their own (their output is dropped), queued
// ones never start. Abandoned jobs are counted in the returned summary.
//
// # Panics
//
// Must be called from within a tokio runtime.
pub async fn fan_out<T>(
  jobs: Vec<BoxFuture<'static, T>>,
  width: usize,
  deadline: Option<Duration>,
  mut on_complete: impl FnMut(T),
) -> FanOutSummary
where
  T: Send + 'static,
{
  let total = jobs.len();
  let slots = Arc::new(Semaphore::new(width.max(1)));
  let (tx, mut rx) = mpsc::unbounded_channel();

  for job in jobs {
    let slots = slots.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
      let Ok(_permit) = slots.acquire_owned().await else {
        return;
      };
      // the collector already gave up while this job was queued
      if tx.is_closed() {
        return;
      }
      tx.send(job.await).ok();
    });
  }
  drop(tx);

  let expires_at = deadline.map(|d| Instant::now() + d);
  let mut completed = 0;

  loop {
    let next = match expires_at {
      Some(at) => match tokio::time::timeout_at(at, rx.recv()).await {
        Ok(next) => next,
        Err(_elapsed) => break,
      },
      None => rx.recv().await,
    };

    match next {
      Some(output) => {
        completed += 1;
        on_complete(output);
      }
      // every job has reported (or panicked)
      None => break,
    }
  }

  FanOutSummary {
    completed,
    abandoned: total - completed,
  }
}

// used to remove cred info from proxy url before printing
static AUTH_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"//[^:/@]+(:[^@]+)?@").unwrap());

pub fn redact_proxy(proxy: &str) -> String {
  AUTH_REGEX.replace(proxy, "//<REDACTED>@").into_owned()
}
