use std::{net::SocketAddr, str::FromStr, sync::Arc};

use crate::{
  engagement::EngagementMode,
  provider::{Piped, PipedInstance, SearchProvider, Ytdlp},
  search::DEFAULT_SEARCH_LIMIT,
  Error, Result,
};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_YTDLP_CONCURRENCY: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
  #[default]
  Ytdlp,
  Piped,
}

impl FromStr for ProviderKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "" | "ytdlp" | "yt-dlp" => Ok(ProviderKind::Ytdlp),
      "piped" => Ok(ProviderKind::Piped),
      other => Err(Error::Config(format!("unknown provider: {other}"))),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub port: u16,
  pub provider: ProviderKind,
  pub piped_instance: Option<String>,
  pub ytdlp_concurrency: usize,
  pub ytdlp_proxy: Option<String>,
  pub engagement: EngagementMode,
  pub search_limit: usize,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      port: DEFAULT_PORT,
      provider: ProviderKind::default(),
      piped_instance: None,
      ytdlp_concurrency: DEFAULT_YTDLP_CONCURRENCY,
      ytdlp_proxy: None,
      engagement: EngagementMode::default(),
      search_limit: DEFAULT_SEARCH_LIMIT,
    }
  }
}

impl Settings {
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let defaults = Self::default();
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let port = match var("PORT") {
      Some(port) => port
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid PORT: {port}")))?,
      None => defaults.port,
    };

    let ytdlp_concurrency = match var("YTDLP_CONCURRENCY") {
      Some(n) => match n.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
          return Err(Error::Config(format!("invalid YTDLP_CONCURRENCY: {n}")))
        }
      },
      None => defaults.ytdlp_concurrency,
    };

    let search_limit = match var("SEARCH_LIMIT") {
      Some(n) => match n.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => return Err(Error::Config(format!("invalid SEARCH_LIMIT: {n}"))),
      },
      None => defaults.search_limit,
    };

    Ok(Self {
      port,
      provider: var("PROVIDER")
        .map(|p| p.parse::<ProviderKind>())
        .transpose()?
        .unwrap_or_default(),
      piped_instance: var("PIPED_INSTANCE"),
      ytdlp_concurrency,
      ytdlp_proxy: var("YTDLP_PROXY"),
      engagement: var("ENGAGEMENT")
        .map(|e| e.parse::<EngagementMode>())
        .transpose()?
        .unwrap_or_default(),
      search_limit,
    })
  }

  pub fn listen_addr(&self) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], self.port))
  }

  pub fn build_provider(&self) -> Arc<dyn SearchProvider> {
    match self.provider {
      ProviderKind::Ytdlp => Arc::new(Ytdlp::new(
        self.ytdlp_concurrency,
        self.ytdlp_proxy.clone(),
      )),
      ProviderKind::Piped => {
        let instance = self
          .piped_instance
          .clone()
          .map(PipedInstance::new)
          .unwrap_or_default();
        Arc::new(Piped::new(instance))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
    let vars: HashMap<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    Settings::from_lookup(|key| vars.get(key).cloned())
  }

  #[test]
  fn test_defaults() {
    let settings = settings(&[]).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.listen_addr().to_string(), "0.0.0.0:5000");
    assert_eq!(settings.engagement, EngagementMode::Off);
  }

  #[test]
  fn test_overrides() {
    let settings = settings(&[
      ("PORT", "8080"),
      ("PROVIDER", "piped"),
      ("PIPED_INSTANCE", "piped.example.org"),
      ("YTDLP_CONCURRENCY", "4"),
      ("YTDLP_PROXY", "socks5://127.0.0.1:1080"),
      ("ENGAGEMENT", "synthetic"),
      ("SEARCH_LIMIT", "50"),
    ])
    .unwrap();

    assert_eq!(settings.port, 8080);
    assert_eq!(settings.provider, ProviderKind::Piped);
    assert_eq!(settings.piped_instance.as_deref(), Some("piped.example.org"));
    assert_eq!(settings.ytdlp_concurrency, 4);
    assert_eq!(
      settings.ytdlp_proxy.as_deref(),
      Some("socks5://127.0.0.1:1080")
    );
    assert_eq!(settings.engagement, EngagementMode::Synthetic);
    assert_eq!(settings.search_limit, 50);
  }

  #[test]
  fn test_blank_values_fall_back_to_defaults() {
    let settings = settings(&[("PORT", " "), ("YTDLP_PROXY", "")]).unwrap();
    assert_eq!(settings.port, DEFAULT_PORT);
    assert_eq!(settings.ytdlp_proxy, None);
  }

  #[test]
  fn test_invalid_values() {
    assert!(matches!(settings(&[("PORT", "http")]), Err(Error::Config(_))));
    assert!(matches!(settings(&[("PORT", "70000")]), Err(Error::Config(_))));
    assert!(matches!(
      settings(&[("YTDLP_CONCURRENCY", "0")]),
      Err(Error::Config(_))
    ));
    assert!(matches!(
      settings(&[("PROVIDER", "invidious")]),
      Err(Error::Config(_))
    ));
    assert!(matches!(
      settings(&[("SEARCH_LIMIT", "-1")]),
      Err(Error::Config(_))
    ));
    assert!(matches!(
      settings(&[("ENGAGEMENT", "maybe")]),
      Err(Error::Config(_))
    ));
  }
}
