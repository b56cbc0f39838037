use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use log::warn;

use crate::topology::{LiveStatus, Node, TopologyModel, TopologyProvider, build_model};
use crate::util::or_dash;

use super::super::fetch::{FetchKind, FetchPayload, FetchQueue, FetchRequest, Generation};
use super::super::graph::NodeDetailSink;
use super::super::render_utils::{role_color, status_color};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn search_text(node: &Node) -> String {
    format!(
        "{} {} {} {}",
        node.id,
        node.role.label(),
        node.loopback.as_deref().unwrap_or_default(),
        node.live_status.label()
    )
}

fn protocols(node: &Node) -> String {
    let flags = [
        ("LDP", node.ldp),
        ("MPLS", node.mpls),
        ("RSVP", node.rsvp),
        ("VPN", node.vpn.is_some()),
    ];
    let enabled = flags
        .iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();
    if enabled.is_empty() {
        "—".to_owned()
    } else {
        enabled.join(" ")
    }
}

fn status_label(status: LiveStatus) -> &'static str {
    match status {
        LiveStatus::Live => "Live",
        LiveStatus::Unreachable => "Down",
        LiveStatus::ConfigOnly => "Config",
        LiveStatus::Unknown => "Unknown",
    }
}

/// Read-only device inventory with fuzzy search. Loads its own copy of the
/// topology and is dropped when the tab is left.
pub(in crate::app) struct DeviceDirectory {
    fetches: FetchQueue,
    generation: Generation,
    requested: bool,
    model: TopologyModel,
    search: String,
    error: Option<String>,
}

impl DeviceDirectory {
    pub(in crate::app) fn new(provider: Arc<dyn TopologyProvider>) -> Self {
        Self {
            fetches: FetchQueue::new(provider),
            generation: Generation::default(),
            requested: false,
            model: TopologyModel::default(),
            search: String::new(),
            error: None,
        }
    }

    fn reload(&mut self) {
        self.requested = true;
        if !self.fetches.is_in_flight(FetchKind::Topology) {
            self.fetches.spawn(self.generation, FetchRequest::Topology);
        }
    }

    fn poll(&mut self) {
        if !self.requested {
            self.reload();
        }

        for reply in self.fetches.drain() {
            if reply.generation != self.generation {
                continue;
            }
            match reply.result {
                Ok(FetchPayload::Topology(raw)) => {
                    self.model = build_model(&raw);
                    self.generation = self.generation.next();
                    self.error = None;
                    self.fetches.spawn(self.generation, FetchRequest::LiveStatus);
                }
                Ok(FetchPayload::LiveStatus(report)) => self.model.apply_live_status(&report),
                Ok(FetchPayload::Path { .. }) => {}
                Err(error) => {
                    warn!("device inventory fetch failed: {error}");
                    self.error = Some(error);
                }
            }
        }
    }

    fn is_fetching(&self) -> bool {
        self.fetches.is_in_flight(FetchKind::Topology)
            || self.fetches.is_in_flight(FetchKind::LiveStatus)
    }

    /// Nodes matching the search box, best match first. An empty query keeps
    /// model order.
    pub(in crate::app) fn filtered(&self) -> Vec<&Node> {
        let query = self.search.trim();
        if query.is_empty() {
            return self.model.nodes.iter().collect();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .model
            .nodes
            .iter()
            .filter_map(|node| {
                fuzzy_match_score(&matcher, &search_text(node), query).map(|score| (score, node))
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, node)| node).collect()
    }

    pub(in crate::app) fn draw(&mut self, ui: &mut Ui, sink: &mut dyn NodeDetailSink) {
        self.poll();
        if self.is_fetching() {
            ui.ctx().request_repaint();
        }

        ui.horizontal(|ui| {
            ui.heading("Devices");
            ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("Search devices")
                    .desired_width(260.0),
            );
            let busy = self.fetches.is_in_flight(FetchKind::Topology);
            if ui.add_enabled(!busy, egui::Button::new("Reload")).clicked() {
                self.reload();
            }
            if busy {
                ui.spinner();
            }
        });
        if let Some(error) = &self.error {
            ui.colored_label(Color32::from_rgb(231, 76, 60), error.as_str());
        }
        ui.separator();

        let rows = self.filtered();
        ui.label(format!("{} of {} devices", rows.len(), self.model.node_count()));

        egui::ScrollArea::vertical()
            .id_salt("device_table_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Grid::new("device_table")
                    .striped(true)
                    .num_columns(8)
                    .show(ui, |ui| {
                        for header in
                            ["Device", "Role", "Loopback", "Interfaces", "IS-IS", "BGP", "Protocols", "Status"]
                        {
                            ui.label(RichText::new(header).strong());
                        }
                        ui.end_row();

                        for node in rows {
                            if ui.link(RichText::new(node.id.as_str()).strong()).clicked() {
                                sink.show_node_detail(node);
                            }
                            ui.colored_label(role_color(node.role), node.role.label());
                            ui.monospace(or_dash(node.loopback.as_deref()));
                            ui.label(node.interfaces.len().to_string());
                            ui.label(node.isis_interfaces.len().to_string());
                            ui.label(node.bgp_neighbors.len().to_string());
                            ui.label(protocols(node));
                            ui.colored_label(
                                status_color(node.live_status),
                                status_label(node.live_status),
                            );
                            ui.end_row();
                        }
                    });
            });
    }
}
