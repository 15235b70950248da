use std::{collections::BTreeMap, time::Duration};

use crate::{Error, Result};

/// How a single aggregation call fans out and merges.
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutPlan {
  /// maximum number of provider calls in flight
  pub width: usize,
  /// result bound passed to the provider for each term
  pub per_term_limit: usize,
  /// maximum number of filtered items one term may contribute
  pub per_term_keep: Option<usize>,
  /// maximum size of the merged result
  pub capacity: usize,
  /// wall-clock budget for the whole fan-out, `None` waits for every term
  pub deadline: Option<Duration>,
  /// budget for each individual provider call
  pub call_timeout: Option<Duration>,
}

impl FanOutPlan {
  pub fn validate(&self) -> Result<()> {
    if self.width == 0 {
      return Err(Error::Config("fan-out width must be at least 1".into()));
    }
    if self.per_term_limit == 0 {
      return Err(Error::Config("per-term limit must be at least 1".into()));
    }
    if self.per_term_keep == Some(0) {
      return Err(Error::Config("per-term keep must be at least 1".into()));
    }
    if self.capacity == 0 {
      return Err(Error::Config("capacity must be at least 1".into()));
    }
    if self.deadline == Some(Duration::ZERO) {
      return Err(Error::Config("deadline must be positive".into()));
    }
    if self.call_timeout == Some(Duration::ZERO) {
      return Err(Error::Config("call timeout must be positive".into()));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
  pub name: String,
  pub terms: Vec<String>,
  pub plan: FanOutPlan,
}

impl View {
  fn new(name: &str, terms: &[&str], plan: FanOutPlan) -> Self {
    Self {
      name: name.to_string(),
      terms: terms.iter().map(|t| t.to_string()).collect(),
      plan,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
  views: BTreeMap<String, View>,
}

impl ViewRegistry {
  pub fn new(views: impl IntoIterator<Item = View>) -> Result<Self> {
    let mut registry = Self::default();
    for view in views {
      view
        .plan
        .validate()
        .map_err(|e| Error::Config(format!("view {}: {e}", view.name)))?;
      if registry.views.contains_key(&view.name) {
        return Err(Error::Config(format!("duplicate view: {}", view.name)));
      }
      registry.views.insert(view.name.clone(), view);
    }
    Ok(registry)
  }

  pub fn builtin() -> Result<Self> {
    Self::new(builtin_views())
  }

  pub fn get(&self, name: &str) -> Result<&View> {
    self
      .views
      .get(name)
      .ok_or_else(|| Error::UnknownView(name.to_string()))
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.views.keys().map(String::as_str)
  }
}

fn music_plan(width: usize, deadline_secs: u64) -> FanOutPlan {
  FanOutPlan {
    width,
    per_term_limit: 80,
    per_term_keep: Some(70),
    capacity: 600,
    deadline: Some(Duration::from_secs(deadline_secs)),
    call_timeout: Some(Duration::from_secs(5)),
  }
}

fn topic_plan(width: usize, per_term_limit: usize) -> FanOutPlan {
  FanOutPlan {
    width,
    per_term_limit,
    per_term_keep: None,
    capacity: 100,
    deadline: None,
    call_timeout: Some(Duration::from_secs(5)),
  }
}

fn builtin_views() -> Vec<View> {
  vec![
    View::new(
      "trending",
      &[
        "trending music 2024",
        "viral songs 2024",
        "top hits 2024",
        "popular music",
        "chart toppers",
        "new music 2024",
        "hot songs",
        "music hits",
        "viral hits",
        "trending now",
      ],
      music_plan(10, 8),
    ),
    View::new(
      "top",
      &[
        "top songs 2024",
        "best music 2024",
        "billboard hot 100",
        "spotify top 50",
        "apple music charts",
        "youtube music trending",
        "global hits",
        "radio hits",
        "chart music",
        "hit songs",
      ],
      music_plan(10, 8),
    ),
    View::new(
      "foryou",
      &[
        "pop music",
        "hip hop hits",
        "rock classics",
        "electronic dance",
        "r&b soul",
        "country music",
        "indie music",
        "latin hits",
        "jazz music",
        "reggae hits",
        "folk music",
        "blues music",
      ],
      music_plan(12, 10),
    ),
    View::new(
      "football",
      &[
        "live football match today",
        "football live stream",
        "premier league live",
        "champions league live",
        "football highlights",
        "live soccer match",
      ],
      topic_plan(3, 30),
    ),
    View::new(
      "wrestling",
      &[
        "wwe highlights",
        "wrestling matches",
        "aew wrestling",
        "wrestling news",
      ],
      topic_plan(2, 25),
    ),
    View::new(
      "movies",
      &[
        "latest movies",
        "movie trailers",
        "hollywood movies",
        "action movies",
      ],
      topic_plan(2, 25),
    ),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builtin_views_are_valid() {
    let registry = ViewRegistry::builtin().unwrap();
    let names: Vec<_> = registry.names().collect();
    assert_eq!(
      names,
      ["football", "foryou", "movies", "top", "trending", "wrestling"]
    );

    let foryou = registry.get("foryou").unwrap();
    assert_eq!(foryou.terms.len(), 12);
    assert_eq!(foryou.plan.width, 12);
    assert_eq!(foryou.plan.capacity, 600);
  }

  #[test]
  fn test_unknown_view() {
    let registry = ViewRegistry::builtin().unwrap();
    assert!(matches!(
      registry.get("polka"),
      Err(Error::UnknownView(name)) if name == "polka"
    ));
  }

  #[test]
  fn test_rejects_invalid_plans() {
    let base = topic_plan(2, 25);
    let invalid = [
      FanOutPlan {
        width: 0,
        ..base.clone()
      },
      FanOutPlan {
        per_term_limit: 0,
        ..base.clone()
      },
      FanOutPlan {
        capacity: 0,
        ..base.clone()
      },
      FanOutPlan {
        deadline: Some(Duration::ZERO),
        ..base.clone()
      },
      FanOutPlan {
        per_term_keep: Some(0),
        ..base.clone()
      },
    ];

    for plan in invalid {
      let view = View::new("broken", &["a"], plan);
      assert!(matches!(ViewRegistry::new([view]), Err(Error::Config(_))));
    }
  }

  #[test]
  fn test_rejects_duplicate_names() {
    let a = View::new("a", &["x"], topic_plan(1, 1));
    let b = View::new("a", &["y"], topic_plan(1, 1));
    assert!(matches!(ViewRegistry::new([a, b]), Err(Error::Config(_))));
  }
}
