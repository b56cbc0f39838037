use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawTopology {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<RawNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Vec<RawLink>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawNode {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub loopback: Option<String>,
    #[serde(default, deserialize_with = "name_list")]
    pub interfaces: Vec<String>,
    #[serde(default, deserialize_with = "name_list")]
    pub isis_interfaces: Vec<String>,
    #[serde(default, deserialize_with = "name_list")]
    pub bgp_neighbors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ldp: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mpls: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rsvp: bool,
    #[serde(default, deserialize_with = "vpn_label")]
    pub vpn: Option<String>,
    #[serde(default)]
    pub live_status: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawLink {
    #[serde(default, deserialize_with = "endpoint_id")]
    pub source: String,
    #[serde(default, deserialize_with = "endpoint_id")]
    pub target: String,
    #[serde(default)]
    pub metric: Option<f64>,
    #[serde(default)]
    pub interface: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeviceStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LiveDeviceReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub live_devices: Vec<DeviceStatus>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unreachable: Vec<DeviceStatus>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_source: String,
}

impl LiveDeviceReport {
    pub fn offline() -> Self {
        Self {
            data_source: "offline".to_owned(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathRequest {
    pub source: String,
    pub target: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PathResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_cost: f64,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PathOutcome {
    Found { hops: Vec<String>, total_cost: f64 },
    Failed(String),
}

impl PathResponse {
    pub fn into_outcome(self) -> PathOutcome {
        match self.error {
            Some(error) if !error.trim().is_empty() => PathOutcome::Failed(error),
            _ if self.path.is_empty() => PathOutcome::Failed("no path returned".to_owned()),
            _ => PathOutcome::Found {
                hops: self.path,
                total_cost: self.total_cost,
            },
        }
    }
}

pub fn parse_topology(raw: &str) -> Result<RawTopology> {
    serde_json::from_str(raw).context("invalid topology JSON")
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn endpoint_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(id)) => id,
        Some(Value::Object(object)) => object
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        _ => String::new(),
    })
}

// Entries are either bare names or objects carrying a `name`.
fn name_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(name) => Some(name),
            Value::Object(object) => object
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        })
        .collect())
}

fn vpn_label<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(label)) if !label.trim().is_empty() => Some(label),
        Some(Value::Bool(true)) => Some("VPN".to_owned()),
        Some(Value::Array(items)) if !items.is_empty() => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_payload_decodes_with_defaults() {
        let topology = parse_topology(
            r#"{"nodes":[{"id":"PE1","bgp_neighbors":null,"ldp":null}],"links":null}"#,
        )
        .unwrap();

        assert_eq!(topology.nodes.len(), 1);
        assert!(topology.nodes[0].bgp_neighbors.is_empty());
        assert!(!topology.nodes[0].ldp);
        assert!(topology.links.is_empty());
    }

    #[test]
    fn link_endpoints_accept_strings_and_objects() {
        let topology = parse_topology(
            r#"{"links":[{"source":"PE1","target":{"id":"P1"},"metric":20}]}"#,
        )
        .unwrap();

        assert_eq!(topology.links[0].source, "PE1");
        assert_eq!(topology.links[0].target, "P1");
        assert_eq!(topology.links[0].metric, Some(20.0));
    }

    #[test]
    fn vpn_accepts_labels_and_flags() {
        let topology = parse_topology(
            r#"{"nodes":[{"id":"a","vpn":"CUST-A"},{"id":"b","vpn":true},{"id":"c","vpn":false},{"id":"d","vpn":""}]}"#,
        )
        .unwrap();
        let labels = topology
            .nodes
            .iter()
            .map(|node| node.vpn.as_deref())
            .collect::<Vec<_>>();

        assert_eq!(labels, vec![Some("CUST-A"), Some("VPN"), None, None]);
    }

    #[test]
    fn interface_objects_collapse_to_names() {
        let topology = parse_topology(
            r#"{"nodes":[{"id":"P1","interfaces":["ge-0/0/0",{"name":"ge-0/0/1"},7]}]}"#,
        )
        .unwrap();

        assert_eq!(topology.nodes[0].interfaces, vec!["ge-0/0/0", "ge-0/0/1"]);
    }

    #[test]
    fn path_error_wins_over_path() {
        let response: PathResponse =
            serde_json::from_str(r#"{"path":["A"],"total_cost":3,"error":"unreachable"}"#).unwrap();
        assert_eq!(
            response.into_outcome(),
            PathOutcome::Failed("unreachable".to_owned())
        );

        let response: PathResponse =
            serde_json::from_str(r#"{"path":["A","B"],"total_cost":20,"error":null}"#).unwrap();
        assert_eq!(
            response.into_outcome(),
            PathOutcome::Found {
                hops: vec!["A".to_owned(), "B".to_owned()],
                total_cost: 20.0
            }
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_topology("{nodes:").is_err());
    }
}
