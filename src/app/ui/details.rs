use eframe::egui::{self, RichText, Ui};

use crate::topology::Node;
use crate::util::{or_dash, yes_or_dash};

use super::super::graph::NodeDetailSink;
use super::super::render_utils::role_color;

/// Side panel describing the last clicked device. Holds its own copy of the
/// record so later model rebuilds cannot change what is shown.
#[derive(Debug, Default)]
pub(in crate::app) struct DetailPanel {
    node: Option<Node>,
}

impl NodeDetailSink for DetailPanel {
    fn show_node_detail(&mut self, node: &Node) {
        self.node = Some(node.clone());
    }
}

pub(in crate::app) fn protocol_rows(node: &Node) -> [(&'static str, &str); 4] {
    [
        ("LDP", yes_or_dash(node.ldp)),
        ("MPLS", yes_or_dash(node.mpls)),
        ("VPN", or_dash(node.vpn.as_deref())),
        ("RSVP", yes_or_dash(node.rsvp)),
    ]
}

impl DetailPanel {
    pub(in crate::app) fn is_open(&self) -> bool {
        self.node.is_some()
    }

    pub(in crate::app) fn close(&mut self) {
        self.node = None;
    }

    pub(in crate::app) fn draw(&mut self, ui: &mut Ui) {
        let Some(node) = &self.node else {
            return;
        };
        let mut close = false;

        ui.horizontal(|ui| {
            ui.heading(node.id.as_str());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                close = ui.button("Close").clicked();
            });
        });
        ui.label(RichText::new(node.role.label()).color(role_color(node.role)));
        ui.add_space(6.0);

        ui.label(RichText::new("Identity").strong());
        egui::Grid::new("detail_identity").num_columns(2).show(ui, |ui| {
            ui.label("Loopback");
            ui.monospace(or_dash(node.loopback.as_deref()));
            ui.end_row();
            ui.label("Interfaces");
            ui.label(node.interfaces.len().to_string());
            ui.end_row();
            ui.label("Status");
            ui.label(node.live_status.label());
            ui.end_row();
        });

        if !node.isis_interfaces.is_empty() {
            ui.separator();
            ui.label(RichText::new("IS-IS Interfaces").strong());
            for interface in &node.isis_interfaces {
                ui.monospace(interface.as_str());
            }
        }

        if !node.bgp_neighbors.is_empty() {
            ui.separator();
            ui.label(RichText::new("BGP Neighbors").strong());
            for neighbor in &node.bgp_neighbors {
                ui.monospace(neighbor.as_str());
            }
        }

        ui.separator();
        ui.label(RichText::new("Protocols").strong());
        egui::Grid::new("detail_protocols").num_columns(2).show(ui, |ui| {
            for (name, value) in protocol_rows(node) {
                ui.label(name);
                ui.label(value);
                ui.end_row();
            }
        });

        if close {
            self.close();
        }
    }
}
