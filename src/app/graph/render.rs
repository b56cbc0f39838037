use std::time::Duration;

use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Sense, Shape, Stroke, Ui, vec2};

use crate::topology::{Edge, EdgeKind, Node, Role};

use super::super::render_utils::{
    CORE_RADIUS, EdgeStyle, GLOW_RADIUS, LOOPBACK_LABEL_OFFSET, RING_RADIUS,
    RR_RING_RADIUS, Theme, VPN_BADGE_OFFSET, circle_visible, draw_background, edge_style,
    node_style, role_color, status_color,
};
use super::super::view::{TopologyView, ViewPhase};
use super::interaction::NodeDetailSink;

const IDLE_REPAINT: Duration = Duration::from_millis(250);
const ARROW_LENGTH: f32 = 8.0;
const ARROW_HALF_WIDTH: f32 = 4.0;
const ARROW_STANDOFF: f32 = 30.0;
const EDGE_LABEL_MIN_ZOOM: f32 = 1.5;

fn draw_edge(painter: &Painter, start: Pos2, end: Pos2, style: EdgeStyle, zoom: f32) {
    if style.dashed {
        painter.extend(Shape::dashed_line(&[start, end], style.stroke, 6.0, 4.0));
    } else {
        painter.line_segment([start, end], style.stroke);
    }

    if !style.arrow {
        return;
    }
    let delta = end - start;
    let length = delta.length();
    if length <= ARROW_STANDOFF * zoom + ARROW_LENGTH {
        return;
    }
    let direction = delta / length;
    let normal = vec2(-direction.y, direction.x);
    let tip = end - direction * (ARROW_STANDOFF * zoom);
    let base = tip - direction * ARROW_LENGTH;
    painter.add(Shape::convex_polygon(
        vec![
            tip,
            base + normal * ARROW_HALF_WIDTH,
            base - normal * ARROW_HALF_WIDTH,
        ],
        style.stroke.color,
        Stroke::NONE,
    ));
}

fn draw_edge_label(painter: &Painter, start: Pos2, end: Pos2, edge: &Edge, theme: Theme) {
    let text = match (edge.interface.as_deref(), edge.metric) {
        (Some(interface), Some(metric)) => format!("{interface} ({metric})"),
        (Some(interface), None) => interface.to_owned(),
        (None, Some(metric)) => metric.to_string(),
        (None, None) => return,
    };
    painter.text(
        start + (end - start) * 0.5,
        Align2::CENTER_BOTTOM,
        text,
        FontId::monospace(8.0),
        theme.muted_text(),
    );
}

fn draw_node(
    painter: &Painter,
    node: &Node,
    position: Pos2,
    zoom: f32,
    highlighted: bool,
    show_labels: bool,
    theme: Theme,
) {
    let style = node_style(node.role, highlighted);
    let scale = zoom * style.scale;

    painter.circle_filled(position, GLOW_RADIUS * scale, style.glow);
    painter.circle_filled(position, RING_RADIUS * scale, style.ring_fill);
    painter.circle_stroke(position, RING_RADIUS * scale, style.ring_stroke);
    painter.circle_filled(position, CORE_RADIUS * scale, style.core);

    match node.role {
        Role::RouteReflector => {
            painter.circle_stroke(
                position,
                RR_RING_RADIUS * scale,
                Stroke::new(1.5, role_color(Role::RouteReflector)),
            );
        }
        Role::Pe | Role::P | Role::Unknown => {}
    }

    let status_offset = vec2(RING_RADIUS, -RING_RADIUS) * 0.72 * scale;
    painter.circle_filled(position + status_offset, 3.5, status_color(node.live_status));

    if node.vpn.is_some() {
        painter.text(
            position + vec2(0.0, VPN_BADGE_OFFSET * scale),
            Align2::CENTER_BOTTOM,
            "VPN",
            FontId::proportional(9.0),
            Color32::from_rgb(247, 194, 111),
        );
    }

    if show_labels {
        painter.text(
            position,
            Align2::CENTER_CENTER,
            node.id.as_str(),
            FontId::proportional(11.0),
            theme.text(),
        );
        if let Some(loopback) = node.loopback.as_deref().filter(|value| !value.is_empty()) {
            painter.text(
                position + vec2(0.0, LOOPBACK_LABEL_OFFSET * zoom),
                Align2::CENTER_TOP,
                loopback,
                FontId::monospace(9.0),
                theme.muted_text(),
            );
        }
    }
}

fn draw_tooltip(painter: &Painter, anchor: Pos2, text: &str, theme: Theme) {
    let galley = painter.layout_no_wrap(text.to_owned(), FontId::proportional(12.0), theme.text());
    let frame = egui::Rect::from_min_size(anchor, galley.size()).expand(6.0);
    let fill = match theme {
        Theme::Dark => Color32::from_rgba_unmultiplied(30, 36, 44, 235),
        Theme::Light => Color32::from_rgba_unmultiplied(255, 255, 255, 240),
    };
    painter.rect_filled(frame, 4.0, fill);
    painter.galley(anchor, galley, theme.text());
}

impl TopologyView {
    fn placeholder(&self, painter: &Painter, rect: egui::Rect) {
        let message = match (&self.last_error, self.phase()) {
            (Some(error), ViewPhase::Uninitialized) => format!("Topology unavailable: {error}"),
            (None, ViewPhase::Uninitialized) => "Loading topology...".to_owned(),
            _ => "No devices in topology".to_owned(),
        };
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            message,
            FontId::proportional(15.0),
            self.theme.muted_text(),
        );
    }

    /// Draws the current frame. Positions come straight from the simulation;
    /// the model is only read.
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui, sink: &mut dyn NodeDetailSink) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let now = ui.input(|input| input.time);
        let animating = self.advance(now, rect.size());

        self.handle_zoom(ui, rect, &response);
        self.handle_pointer(rect, &response, sink);

        if animating || self.interaction.dragging.is_some() {
            ui.ctx().request_repaint();
        } else {
            let wait = self
                .next_task_in(now)
                .map_or(IDLE_REPAINT, |secs| IDLE_REPAINT.min(Duration::from_secs_f64(secs)));
            ui.ctx().request_repaint_after(wait);
        }

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.camera, self.theme);

        let Some(simulation) = self.simulation.as_ref() else {
            self.placeholder(&painter, rect);
            return;
        };
        if self.model.is_empty() {
            self.placeholder(&painter, rect);
            return;
        }

        let camera = self.camera;
        let screen = simulation
            .bodies()
            .iter()
            .map(|body| camera.world_to_screen(rect, body.position))
            .collect::<Vec<_>>();
        let highlight = self.overlay.resolve(&self.model).unwrap_or_default();

        for edge in &self.model.edges {
            let shown = match edge.kind {
                EdgeKind::Physical => self.layers.show_physical,
                EdgeKind::Bgp => self.layers.show_bgp,
            };
            if !shown {
                continue;
            }
            let (Some(&start), Some(&end)) = (screen.get(edge.source), screen.get(edge.target))
            else {
                continue;
            };
            let style = edge_style(
                edge.kind,
                edge.metric,
                highlight.has_edge(edge.source, edge.target),
                self.theme,
            );
            draw_edge(&painter, start, end, style, camera.zoom);
            if self.layers.show_labels && camera.zoom >= EDGE_LABEL_MIN_ZOOM {
                draw_edge_label(&painter, start, end, edge, self.theme);
            }
        }

        let cull_radius = (GLOW_RADIUS + LOOPBACK_LABEL_OFFSET) * camera.zoom;
        for (index, node) in self.model.nodes.iter().enumerate() {
            let Some(&position) = screen.get(index) else {
                continue;
            };
            if !circle_visible(rect, position, cull_radius) {
                continue;
            }
            draw_node(
                &painter,
                node,
                position,
                camera.zoom,
                highlight.has_node(index),
                self.layers.show_labels,
                self.theme,
            );
        }

        if self.interaction.tooltip.visible && self.interaction.dragging.is_none() {
            draw_tooltip(
                &painter,
                self.interaction.tooltip.anchor,
                &self.interaction.tooltip.text,
                self.theme,
            );
        }
        if self.interaction.hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }
    }
}
