use eframe::egui::{self, Color32, RichText, Ui};

use crate::layout::LayoutMode;
use crate::topology::{EdgeKind, Node, PathOutcome};
use crate::util::or_dash;

use super::super::view::{TopologyView, ViewKind};

fn node_option_label(node: &Node) -> String {
    format!("{} ({})", node.id, node.loopback.as_deref().unwrap_or_default())
}

fn path_summary(hops: &[String], total_cost: f64) -> [String; 3] {
    [
        hops.join("  →  "),
        format!("Total IS-IS cost: {total_cost}"),
        format!(
            "Path length: {} hops ({} links)",
            hops.len(),
            hops.len().saturating_sub(1)
        ),
    ]
}

impl TopologyView {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, now: f64) {
        ui.heading("Layout");
        ui.add_space(4.0);
        ui.horizontal_wrapped(|ui| {
            for mode in LayoutMode::ALL {
                if ui
                    .selectable_label(self.layout() == mode, mode.label())
                    .clicked()
                {
                    self.apply_layout(mode, now);
                }
            }
        });

        ui.separator();
        ui.heading("Layers");
        let mut layers = self.layers;
        ui.checkbox(&mut layers.show_physical, "IS-IS links");
        ui.checkbox(&mut layers.show_bgp, "BGP sessions");
        ui.checkbox(&mut layers.show_labels, "Labels");
        self.set_layers(layers);

        ui.separator();
        ui.horizontal(|ui| {
            let reload = ui.add_enabled(!self.is_loading(), egui::Button::new("Reload topology"));
            if reload.clicked() {
                self.request_reload(now);
            }
            if ui.button("Reset view").clicked() {
                self.reset_camera();
            }
        });
        if self.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Fetching topology...");
            });
        }
        if let Some(error) = &self.last_error {
            ui.colored_label(Color32::from_rgb(231, 76, 60), error.as_str());
        }

        ui.separator();
        ui.label(format!("Devices: {}", self.model.node_count()));
        ui.label(format!(
            "Links: {} IS-IS, {} BGP",
            self.model.edge_count(EdgeKind::Physical),
            self.model.edge_count(EdgeKind::Bgp)
        ));
        ui.label(format!("Zoom: {:.0}%", self.camera.zoom * 100.0));

        if self.kind == ViewKind::Path {
            ui.separator();
            self.draw_path_finder(ui);
        }
    }

    fn draw_path_finder(&mut self, ui: &mut Ui) {
        ui.heading("Shortest path");
        ui.add_space(4.0);

        for (salt, label, is_source) in [("path_source", "From", true), ("path_target", "To", false)] {
            let selected = if is_source {
                &mut self.path_query.source
            } else {
                &mut self.path_query.target
            };
            let nodes = &self.model.nodes;
            ui.horizontal(|ui| {
                ui.label(label);
                egui::ComboBox::from_id_salt(salt)
                    .selected_text(or_dash(Some(selected.as_str())).to_owned())
                    .show_ui(ui, |ui| {
                        for node in nodes {
                            ui.selectable_value(selected, node.id.clone(), node_option_label(node));
                        }
                    });
            });
        }

        ui.horizontal(|ui| {
            let ready = !self.is_path_pending() && !self.model.is_empty();
            if ui.add_enabled(ready, egui::Button::new("Find path")).clicked() {
                self.find_path();
            }
            if ui.button("Clear").clicked() {
                self.clear_path();
            }
        });
        if self.is_path_pending() {
            ui.spinner();
        }

        match &self.path_query.outcome {
            Some(PathOutcome::Found { hops, total_cost }) => {
                ui.add_space(6.0);
                ui.label(RichText::new("Shortest Path Found").strong());
                for line in path_summary(hops, *total_cost) {
                    ui.label(line);
                }
            }
            Some(PathOutcome::Failed(error)) => {
                ui.colored_label(Color32::from_rgb(231, 76, 60), error.as_str());
            }
            None => {}
        }
    }
}
