use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use super::payload::{LiveDeviceReport, PathRequest, PathResponse, RawTopology, parse_topology};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of topology data and path answers. Calls block and are made from
/// background workers, never from the frame loop.
pub trait TopologyProvider: Send + Sync {
    fn fetch_topology(&self) -> Result<RawTopology>;
    fn fetch_live_status(&self) -> Result<LiveDeviceReport>;
    fn shortest_path(&self, request: &PathRequest) -> Result<PathResponse>;
    fn describe(&self) -> String;
}

pub struct HttpProvider {
    client: Client,
    base_url: String,
}

impl HttpProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/api/{endpoint}", self.base_url);
        self.client
            .get(&url)
            .query(query)
            .send()
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))?
            .json::<T>()
            .with_context(|| format!("invalid JSON from {url}"))
    }
}

impl TopologyProvider for HttpProvider {
    fn fetch_topology(&self) -> Result<RawTopology> {
        self.get_json("topology", &[])
    }

    fn fetch_live_status(&self) -> Result<LiveDeviceReport> {
        self.get_json("mcp/live-devices", &[])
    }

    fn shortest_path(&self, request: &PathRequest) -> Result<PathResponse> {
        self.get_json(
            "shortest-path",
            &[
                ("source", request.source.as_str()),
                ("target", request.target.as_str()),
            ],
        )
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Offline provider reading a topology snapshot from disk.
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TopologyProvider for FileProvider {
    fn fetch_topology(&self) -> Result<RawTopology> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        parse_topology(&raw).with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn fetch_live_status(&self) -> Result<LiveDeviceReport> {
        Ok(LiveDeviceReport::offline())
    }

    fn shortest_path(&self, _request: &PathRequest) -> Result<PathResponse> {
        Err(anyhow!(
            "no path service available for offline topology {}",
            self.path.display()
        ))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
