use std::collections::HashMap;

use super::payload::LiveDeviceReport;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Pe,
    P,
    RouteReflector,
    Unknown,
}

impl Role {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Unknown;
        };

        match raw.trim() {
            "PE" | "pe" => Self::Pe,
            "P" | "p" => Self::P,
            "Route Reflector" | "RouteReflector" | "RR" | "rr" => Self::RouteReflector,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pe => "PE",
            Self::P => "P",
            Self::RouteReflector => "Route Reflector",
            Self::Unknown => "Unknown",
        }
    }

    /// Layer index used by the tiered layouts: reflectors on top, PEs at the edge.
    pub fn tier(self) -> usize {
        match self {
            Self::RouteReflector => 0,
            Self::P => 1,
            Self::Pe => 2,
            Self::Unknown => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveStatus {
    Live,
    Unreachable,
    ConfigOnly,
    Unknown,
}

impl LiveStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("live") => Self::Live,
            Some("unreachable") => Self::Unreachable,
            Some("config-only") => Self::ConfigOnly,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Unreachable => "unreachable",
            Self::ConfigOnly => "config-only",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub role: Role,
    pub loopback: Option<String>,
    pub interfaces: Vec<String>,
    pub isis_interfaces: Vec<String>,
    pub bgp_neighbors: Vec<String>,
    pub ldp: bool,
    pub mpls: bool,
    pub rsvp: bool,
    pub vpn: Option<String>,
    pub live_status: LiveStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Physical,
    Bgp,
}

/// Adjacency between two entries of [`TopologyModel::nodes`], stored by index.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub kind: EdgeKind,
    pub metric: Option<f64>,
    pub interface: Option<String>,
}

impl Edge {
    pub fn connects(&self, a: usize, b: usize) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

#[derive(Clone, Debug, Default)]
pub struct TopologyModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub index_by_id: HashMap<String, usize>,
}

impl TopologyModel {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    pub fn edge_count(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|edge| edge.kind == kind).count()
    }

    pub fn find_edge(&self, a: &str, b: &str, kind: EdgeKind) -> Option<&Edge> {
        let (a, b) = (self.index_of(a)?, self.index_of(b)?);
        self.edges
            .iter()
            .find(|edge| edge.kind == kind && edge.connects(a, b))
    }

    pub fn roles(&self) -> Vec<Role> {
        self.nodes.iter().map(|node| node.role).collect()
    }

    /// Merges a live reachability report into the node records in place.
    pub fn apply_live_status(&mut self, report: &LiveDeviceReport) {
        let mut status_by_name = HashMap::new();
        for device in &report.live_devices {
            status_by_name.insert(device.name.as_str(), LiveStatus::parse(device.status.as_deref()));
        }
        for device in &report.unreachable {
            status_by_name.insert(device.name.as_str(), LiveStatus::Unreachable);
        }

        let fallback = if report.data_source == "live" {
            LiveStatus::Unknown
        } else {
            LiveStatus::ConfigOnly
        };

        for node in &mut self.nodes {
            node.live_status = status_by_name
                .get(node.id.as_str())
                .copied()
                .unwrap_or(fallback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::payload::DeviceStatus;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_owned(),
            role: Role::P,
            loopback: None,
            interfaces: Vec::new(),
            isis_interfaces: Vec::new(),
            bgp_neighbors: Vec::new(),
            ldp: false,
            mpls: false,
            rsvp: false,
            vpn: None,
            live_status: LiveStatus::Unknown,
        }
    }

    fn device(name: &str, status: &str) -> DeviceStatus {
        DeviceStatus {
            name: name.to_owned(),
            status: Some(status.to_owned()),
        }
    }

    #[test]
    fn role_parsing_accepts_backend_spellings() {
        assert_eq!(Role::parse(Some("Route Reflector")), Role::RouteReflector);
        assert_eq!(Role::parse(Some("RR")), Role::RouteReflector);
        assert_eq!(Role::parse(Some("PE")), Role::Pe);
        assert_eq!(Role::parse(Some("P")), Role::P);
        assert_eq!(Role::parse(Some("ASBR")), Role::Unknown);
        assert_eq!(Role::parse(None), Role::Unknown);
    }

    #[test]
    fn unknown_role_sits_on_the_middle_tier() {
        assert_eq!(Role::RouteReflector.tier(), 0);
        assert_eq!(Role::P.tier(), 1);
        assert_eq!(Role::Pe.tier(), 2);
        assert_eq!(Role::Unknown.tier(), 1);
    }

    #[test]
    fn live_report_marks_known_devices_and_defaults_the_rest() {
        let mut model = TopologyModel {
            nodes: vec![node("PE1"), node("PE2"), node("P1")],
            ..TopologyModel::default()
        };

        let report = LiveDeviceReport {
            live_devices: vec![device("PE1", "live")],
            unreachable: vec![device("PE2", "live")],
            data_source: "live".to_owned(),
        };
        model.apply_live_status(&report);

        let statuses = model
            .nodes
            .iter()
            .map(|node| node.live_status)
            .collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![LiveStatus::Live, LiveStatus::Unreachable, LiveStatus::Unknown]
        );

        model.apply_live_status(&LiveDeviceReport::offline());
        assert!(model
            .nodes
            .iter()
            .all(|node| node.live_status == LiveStatus::ConfigOnly));
    }
}
