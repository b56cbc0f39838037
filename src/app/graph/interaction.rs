use eframe::egui::{self, Pos2, Rect, Response, Ui, vec2};

use crate::topology::Node;
use crate::util::or_dash;

use super::super::render_utils::{RING_RADIUS, circle_visible};
use super::super::view::TopologyView;

const TOOLTIP_OFFSET: egui::Vec2 = vec2(14.0, -10.0);

/// Receives the full node record when a node is clicked. Implementors only
/// read the record.
pub(in crate::app) trait NodeDetailSink {
    fn show_node_detail(&mut self, node: &Node);
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(in crate::app) struct Tooltip {
    pub(in crate::app) visible: bool,
    pub(in crate::app) text: String,
    pub(in crate::app) anchor: Pos2,
}

#[derive(Debug, Default)]
pub(in crate::app) struct InteractionState {
    pub(in crate::app) hovered: Option<usize>,
    pub(in crate::app) dragging: Option<usize>,
    pub(in crate::app) panning: bool,
    pub(in crate::app) tooltip: Tooltip,
}

pub(in crate::app) fn tooltip_text(node: &Node) -> String {
    format!(
        "{} · {}\nLoopback: {}",
        node.id,
        node.role.label(),
        or_dash(node.loopback.as_deref())
    )
}

impl InteractionState {
    pub(in crate::app) fn hover(&mut self, index: usize, node: &Node, pointer: Pos2) {
        if self.hovered != Some(index) {
            self.hovered = Some(index);
            self.tooltip.text = tooltip_text(node);
        }
        self.tooltip.visible = true;
        self.pointer_moved(pointer);
    }

    pub(in crate::app) fn pointer_moved(&mut self, pointer: Pos2) {
        self.tooltip.anchor = pointer + TOOLTIP_OFFSET;
    }

    pub(in crate::app) fn leave(&mut self) {
        self.hovered = None;
        self.tooltip.visible = false;
    }

    pub(in crate::app) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Topmost node whose ring contains `pointer`.
pub(in crate::app) fn hit_test(
    rect: Rect,
    screen_positions: &[Pos2],
    radius: f32,
    pointer: Pos2,
) -> Option<usize> {
    screen_positions
        .iter()
        .enumerate()
        .filter(|(_, position)| circle_visible(rect, **position, radius))
        .map(|(index, position)| (index, position.distance(pointer)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

impl TopologyView {
    fn screen_positions(&self, rect: Rect) -> Vec<Pos2> {
        self.simulation.as_ref().map_or_else(Vec::new, |simulation| {
            simulation
                .bodies()
                .iter()
                .map(|body| self.camera.world_to_screen(rect, body.position))
                .collect()
        })
    }

    fn node_at(&self, rect: Rect, pointer: Pos2) -> Option<usize> {
        hit_test(
            rect,
            &self.screen_positions(rect),
            RING_RADIUS * self.camera.zoom,
            pointer,
        )
    }

    pub(in crate::app) fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = response.hover_pos().unwrap_or_else(|| rect.center());
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.camera.zoom_at(rect, pointer, factor);
    }

    pub(in crate::app) fn reset_camera(&mut self) {
        self.camera = Default::default();
    }

    pub(in crate::app) fn handle_pointer(
        &mut self,
        rect: Rect,
        response: &Response,
        sink: &mut dyn NodeDetailSink,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            let origin = response.interact_pointer_pos();
            match origin.and_then(|pointer| self.node_at(rect, pointer)) {
                Some(index) => self.begin_drag(index),
                None => self.interaction.panning = true,
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            if self.interaction.dragging.is_some() {
                if let Some(pointer) = response.interact_pointer_pos() {
                    self.drag_to(self.camera.screen_to_world(rect, pointer));
                }
            } else if self.interaction.panning {
                self.camera.pan += response.drag_delta();
            }
        }
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.camera.pan += response.drag_delta();
        }

        if response.drag_stopped() {
            self.end_drag();
            self.interaction.panning = false;
        }

        match response.hover_pos() {
            Some(pointer) => match self.node_at(rect, pointer) {
                Some(index) => {
                    if let Some(node) = self.model.nodes.get(index) {
                        self.interaction.hover(index, node, pointer);
                    }
                }
                None => self.interaction.leave(),
            },
            None => self.interaction.leave(),
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(index) = self.interaction.hovered
        {
            self.show_detail(index, sink);
        }
    }

    pub(in crate::app) fn show_detail(&self, index: usize, sink: &mut dyn NodeDetailSink) {
        if let Some(node) = self.model.nodes.get(index) {
            sink.show_node_detail(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::topology::{LiveStatus, Role};

    fn node(id: &str, loopback: Option<&str>) -> Node {
        Node {
            id: id.to_owned(),
            role: Role::Pe,
            loopback: loopback.map(str::to_owned),
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

    #[test]
    fn tooltip_shows_on_hover_and_hides_on_leave() {
        let mut state = InteractionState::default();
        let pe1 = node("PE1", Some("1.1.1.1"));

        state.hover(0, &pe1, pos2(100.0, 100.0));
        assert!(state.tooltip.visible);
        assert!(state.tooltip.text.contains("PE1"));
        assert!(state.tooltip.text.contains("1.1.1.1"));
        assert_eq!(state.tooltip.anchor, pos2(114.0, 90.0));

        state.leave();
        assert!(!state.tooltip.visible);
        assert_eq!(state.hovered, None);
    }

    #[test]
    fn tooltip_follows_pointer() {
        let mut state = InteractionState::default();
        state.hover(0, &node("P1", None), pos2(0.0, 0.0));
        state.pointer_moved(pos2(50.0, 50.0));

        assert_eq!(state.tooltip.anchor, pos2(64.0, 40.0));
        assert_eq!(state.tooltip.text, "P1 · PE\nLoopback: —");
    }

    #[test]
    fn hit_test_picks_nearest_node_within_radius() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 400.0));
        let positions = [pos2(100.0, 100.0), pos2(120.0, 100.0), pos2(300.0, 300.0)];

        assert_eq!(hit_test(rect, &positions, 18.0, pos2(115.0, 100.0)), Some(1));
        assert_eq!(hit_test(rect, &positions, 18.0, pos2(200.0, 200.0)), None);
    }
}
