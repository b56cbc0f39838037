use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::topology::{FileProvider, HttpProvider, TopologyProvider};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopologySource {
    Api(String),
    File(PathBuf),
}

impl TopologySource {
    pub fn open(&self) -> Result<Arc<dyn TopologyProvider>> {
        Ok(match self {
            Self::Api(url) => Arc::new(HttpProvider::new(url)?),
            Self::File(path) => Arc::new(FileProvider::new(path.clone())),
        })
    }
}

/// Timers a topology view runs on. `None` disables the matching poll; a
/// settle override replaces every layout's own settle duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub topology_every: Option<Duration>,
    pub status_every: Option<Duration>,
    pub settle_override: Option<Duration>,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            topology_every: Some(Duration::from_secs(30)),
            status_every: Some(Duration::from_secs(15)),
            settle_override: None,
        }
    }
}

impl RefreshPolicy {
    pub fn from_secs(topology_secs: u64, status_secs: u64, settle_ms: Option<u64>) -> Self {
        let every = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        Self {
            topology_every: every(topology_secs),
            status_every: every(status_secs),
            settle_override: settle_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerConfig {
    pub source: TopologySource,
    pub refresh: RefreshPolicy,
}

impl ViewerConfig {
    /// A topology file wins over the API URL when both are given.
    pub fn new(api_url: Option<String>, topology_file: Option<PathBuf>, refresh: RefreshPolicy) -> Self {
        let source = match (topology_file, api_url) {
            (Some(path), _) => TopologySource::File(path),
            (None, Some(url)) => TopologySource::Api(url),
            (None, None) => TopologySource::Api(DEFAULT_API_URL.to_owned()),
        };
        Self { source, refresh }
    }
}
