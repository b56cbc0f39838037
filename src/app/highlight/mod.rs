use std::collections::HashSet;

use crate::topology::TopologyModel;

fn unordered<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Hop list of a computed path with its node and undirected edge membership.
///
/// Only consecutive hops contribute edges; the walk may revisit nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct PathHighlight {
    hops: Vec<String>,
    nodes: HashSet<String>,
    edges: HashSet<(String, String)>,
}

impl PathHighlight {
    pub(in crate::app) fn from_hops(hops: Vec<String>) -> Self {
        let nodes = hops.iter().cloned().collect();
        let edges = hops
            .windows(2)
            .filter_map(|pair| match pair {
                [a, b] if a != b => Some(unordered(a.clone(), b.clone())),
                _ => None,
            })
            .collect();

        Self { hops, nodes, edges }
    }

    pub(in crate::app) fn hops(&self) -> &[String] {
        &self.hops
    }

    pub(in crate::app) fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub(in crate::app) fn contains_edge(&self, a: &str, b: &str) -> bool {
        let (a, b) = unordered(a, b);
        self.edges
            .iter()
            .any(|(first, second)| first == a && second == b)
    }
}

/// Membership of a highlight in index space for one frame of drawing.
#[derive(Debug, Default)]
pub(in crate::app) struct HighlightState {
    nodes: HashSet<usize>,
    edges: HashSet<(usize, usize)>,
}

impl HighlightState {
    pub(in crate::app) fn has_node(&self, index: usize) -> bool {
        self.nodes.contains(&index)
    }

    pub(in crate::app) fn has_edge(&self, source: usize, target: usize) -> bool {
        self.edges.contains(&unordered(source, target))
    }
}

/// Emphasis layered over an already built model. Setting or clearing it
/// never touches the model or the simulation.
#[derive(Debug, Default)]
pub(in crate::app) struct PathOverlay {
    active: Option<PathHighlight>,
}

impl PathOverlay {
    pub(in crate::app) fn set(&mut self, hops: Vec<String>) {
        self.active = Some(PathHighlight::from_hops(hops));
    }

    pub(in crate::app) fn clear(&mut self) {
        self.active = None;
    }

    pub(in crate::app) fn active(&self) -> Option<&PathHighlight> {
        self.active.as_ref()
    }

    /// Projects the highlight onto `model`. Hops missing from the model are
    /// ignored, as are edges between hops that are not consecutive.
    pub(in crate::app) fn resolve(&self, model: &TopologyModel) -> Option<HighlightState> {
        let highlight = self.active.as_ref()?;

        let nodes = highlight
            .hops
            .iter()
            .filter_map(|id| model.index_of(id))
            .collect();
        let edges = model
            .edges
            .iter()
            .filter(|edge| {
                highlight.contains_edge(
                    &model.nodes[edge.source].id,
                    &model.nodes[edge.target].id,
                )
            })
            .map(|edge| unordered(edge.source, edge.target))
            .collect();

        Some(HighlightState { nodes, edges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{EdgeKind, RawLink, RawNode, RawTopology, build_model};

    fn scenario_model() -> TopologyModel {
        let node = |id: &str, role: &str, loopback: Option<&str>, peers: &[&str]| RawNode {
            id: id.to_owned(),
            role: Some(role.to_owned()),
            loopback: loopback.map(str::to_owned),
            bgp_neighbors: peers.iter().map(|peer| (*peer).to_owned()).collect(),
            ..RawNode::default()
        };
        let link = |source: &str, target: &str| RawLink {
            source: source.to_owned(),
            target: target.to_owned(),
            metric: None,
            interface: None,
        };

        build_model(&RawTopology {
            nodes: vec![
                node("RR1", "Route Reflector", None, &[]),
                node("PE1", "PE", Some("1.1.1.1"), &["2.2.2.2"]),
                node("PE2", "PE", Some("2.2.2.2"), &["1.1.1.1"]),
            ],
            links: vec![link("RR1", "PE1"), link("RR1", "PE2")],
        })
    }

    #[test]
    fn membership_follows_consecutive_hops_only() {
        let highlight = PathHighlight::from_hops(vec!["A".into(), "B".into(), "C".into()]);

        assert!(highlight.contains_edge("A", "B"));
        assert!(highlight.contains_edge("C", "B"));
        assert!(!highlight.contains_edge("A", "C"));
        assert!(highlight.contains_node("B"));
        assert!(!highlight.contains_node("D"));
    }

    #[test]
    fn path_through_route_reflector_skips_bgp_shortcut() {
        let model = scenario_model();
        let mut overlay = PathOverlay::default();
        overlay.set(vec!["PE1".into(), "RR1".into(), "PE2".into()]);

        let state = overlay.resolve(&model).unwrap();
        let index = |id: &str| model.index_of(id).unwrap();

        assert!(state.has_edge(index("PE1"), index("RR1")));
        assert!(state.has_edge(index("PE2"), index("RR1")));
        assert!(!state.has_edge(index("PE1"), index("PE2")));
        assert!(model.find_edge("PE1", "PE2", EdgeKind::Bgp).is_some());
        assert!((0..3).all(|node| state.has_node(node)));
    }

    #[test]
    fn clearing_restores_base_styling_without_touching_model() {
        let model = scenario_model();
        let before = model.clone();
        let mut overlay = PathOverlay::default();

        overlay.set(vec!["PE1".into(), "RR1".into()]);
        assert!(overlay.resolve(&model).is_some());
        overlay.clear();

        assert!(overlay.resolve(&model).is_none());
        assert!(overlay.active().is_none());
        assert_eq!(model.nodes, before.nodes);
        assert_eq!(model.edges, before.edges);
    }

    #[test]
    fn unknown_hops_are_ignored() {
        let model = scenario_model();
        let mut overlay = PathOverlay::default();
        overlay.set(vec!["PE1".into(), "GHOST".into(), "PE2".into()]);

        let state = overlay.resolve(&model).unwrap();

        assert!(state.has_node(model.index_of("PE1").unwrap()));
        assert!(state.edges.is_empty());
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        const IDS: [&str; 5] = ["A", "B", "C", "D", "E"];

        fn mesh() -> TopologyModel {
            let links = IDS
                .iter()
                .enumerate()
                .flat_map(|(index, source)| {
                    IDS[index + 1..].iter().map(move |target| RawLink {
                        source: (*source).to_owned(),
                        target: (*target).to_owned(),
                        metric: None,
                        interface: None,
                    })
                })
                .collect();
            build_model(&RawTopology {
                nodes: IDS
                    .iter()
                    .map(|id| RawNode {
                        id: (*id).to_owned(),
                        ..RawNode::default()
                    })
                    .collect(),
                links,
            })
        }

        proptest! {
            #[test]
            fn only_consecutive_hops_are_emphasised(
                hops in prop::collection::vec(prop::sample::select(IDS.to_vec()), 0..8)
            ) {
                let model = mesh();
                let mut overlay = PathOverlay::default();
                overlay.set(hops.iter().map(|hop| (*hop).to_owned()).collect());
                let state = overlay.resolve(&model).unwrap_or_default();

                for edge in &model.edges {
                    let (a, b) = (
                        model.nodes[edge.source].id.as_str(),
                        model.nodes[edge.target].id.as_str(),
                    );
                    let consecutive = hops
                        .windows(2)
                        .any(|pair| (pair[0] == a && pair[1] == b) || (pair[0] == b && pair[1] == a));
                    prop_assert_eq!(state.has_edge(edge.source, edge.target), consecutive);
                }
                for (index, node) in model.nodes.iter().enumerate() {
                    prop_assert_eq!(state.has_node(index), hops.contains(&node.id.as_str()));
                }
            }
        }
    }
}
