use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use super::model::{Edge, EdgeKind, LiveStatus, Node, Role, TopologyModel};
use super::payload::{RawNode, RawTopology};

const DEFAULT_LINK_METRIC: f64 = 10.0;

/// Builds the canonical node/edge model from a backend payload.
///
/// Never fails: ids are taken exactly as sent and duplicates keep their first
/// occurrence, links that name a missing node are dropped and BGP neighbors
/// that resolve to no known loopback are skipped. The payload is only read; every returned record is
/// an independent copy.
pub fn build_model(raw: &RawTopology) -> TopologyModel {
    let mut nodes = Vec::with_capacity(raw.nodes.len());
    let mut index_by_id = HashMap::with_capacity(raw.nodes.len());

    for raw_node in &raw.nodes {
        let id = raw_node.id.as_str();
        if index_by_id.contains_key(id) {
            warn!("duplicate node id {id:?} in topology payload; keeping first occurrence");
            continue;
        }

        index_by_id.insert(id.to_owned(), nodes.len());
        nodes.push(make_node(id, raw_node));
    }

    let mut edges = collect_physical_edges(raw, &index_by_id);
    edges.extend(collect_bgp_edges(&nodes));

    debug!(
        "built topology model: {} nodes, {} physical edges, {} bgp edges",
        nodes.len(),
        edges.iter().filter(|edge| edge.kind == EdgeKind::Physical).count(),
        edges.iter().filter(|edge| edge.kind == EdgeKind::Bgp).count()
    );

    TopologyModel {
        nodes,
        edges,
        index_by_id,
    }
}

fn make_node(id: &str, raw: &RawNode) -> Node {
    Node {
        id: id.to_owned(),
        role: Role::parse(raw.role.as_deref()),
        loopback: raw
            .loopback
            .as_deref()
            .map(str::trim)
            .filter(|loopback| !loopback.is_empty())
            .map(str::to_owned),
        interfaces: raw.interfaces.clone(),
        isis_interfaces: raw.isis_interfaces.clone(),
        bgp_neighbors: raw.bgp_neighbors.clone(),
        ldp: raw.ldp,
        mpls: raw.mpls,
        rsvp: raw.rsvp,
        vpn: raw.vpn.clone(),
        live_status: LiveStatus::parse(raw.live_status.as_deref()),
    }
}

fn unordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

fn collect_physical_edges(raw: &RawTopology, index_by_id: &HashMap<String, usize>) -> Vec<Edge> {
    let mut seen = HashSet::new();
    let mut edges = Vec::with_capacity(raw.links.len());

    for link in &raw.links {
        let source = index_by_id.get(&link.source).copied();
        let target = index_by_id.get(&link.target).copied();
        let (Some(source), Some(target)) = (source, target) else {
            debug!(
                "dropping link {} -> {}: endpoint not in topology",
                link.source, link.target
            );
            continue;
        };

        if !seen.insert(unordered(source, target)) {
            debug!(
                "dropping duplicate physical link {} -> {}",
                link.source, link.target
            );
            continue;
        }

        edges.push(Edge {
            source,
            target,
            kind: EdgeKind::Physical,
            metric: Some(
                link.metric
                    .filter(|metric| metric.is_finite() && *metric > 0.0)
                    .unwrap_or(DEFAULT_LINK_METRIC),
            ),
            interface: link.interface.clone(),
        });
    }

    edges
}

fn collect_bgp_edges(nodes: &[Node]) -> Vec<Edge> {
    let mut index_by_loopback = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        if let Some(loopback) = &node.loopback {
            index_by_loopback.entry(loopback.as_str()).or_insert(index);
        }
    }

    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for (source, node) in nodes.iter().enumerate() {
        for neighbor in &node.bgp_neighbors {
            let Some(&target) = index_by_loopback.get(neighbor.trim()) else {
                debug!("bgp neighbor {neighbor} of {} is outside the topology", node.id);
                continue;
            };
            if source == target {
                continue;
            }

            if seen.insert(unordered(source, target)) {
                edges.push(Edge {
                    source,
                    target,
                    kind: EdgeKind::Bgp,
                    metric: None,
                    interface: None,
                });
            }
        }
    }

    edges
}
