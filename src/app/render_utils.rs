use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::topology::{EdgeKind, LiveStatus, Role};

pub(super) const MIN_ZOOM: f32 = 0.3;
pub(super) const MAX_ZOOM: f32 = 4.0;

pub(super) const GLOW_RADIUS: f32 = 24.0;
pub(super) const RING_RADIUS: f32 = 18.0;
pub(super) const CORE_RADIUS: f32 = 10.0;
pub(super) const RR_RING_RADIUS: f32 = 26.0;
pub(super) const VPN_BADGE_OFFSET: f32 = -26.0;
pub(super) const LOOPBACK_LABEL_OFFSET: f32 = 30.0;
const HIGHLIGHT_GROWTH: f32 = 1.25;
const DEFAULT_METRIC: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub(super) fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }

    pub(super) fn background(self) -> Color32 {
        match self {
            Self::Dark => Color32::from_rgb(19, 23, 29),
            Self::Light => Color32::from_rgb(244, 246, 249),
        }
    }

    fn grid(self) -> Color32 {
        match self {
            Self::Dark => Color32::from_rgba_unmultiplied(60, 70, 80, 70),
            Self::Light => Color32::from_rgba_unmultiplied(180, 188, 198, 90),
        }
    }

    pub(super) fn text(self) -> Color32 {
        match self {
            Self::Dark => Color32::from_gray(238),
            Self::Light => Color32::from_gray(28),
        }
    }

    pub(super) fn muted_text(self) -> Color32 {
        match self {
            Self::Dark => Color32::from_gray(150),
            Self::Light => Color32::from_gray(105),
        }
    }

    fn physical_link(self) -> Color32 {
        match self {
            Self::Dark => Color32::from_rgba_unmultiplied(120, 132, 148, 190),
            Self::Light => Color32::from_rgba_unmultiplied(120, 128, 140, 200),
        }
    }

    fn bgp_link(self) -> Color32 {
        Color32::from_rgba_unmultiplied(118, 48, 234, 170)
    }
}

pub(super) fn role_color(role: Role) -> Color32 {
    match role {
        Role::Pe => Color32::from_rgb(0x01, 0xA9, 0x82),
        Role::RouteReflector => Color32::from_rgb(0x76, 0x30, 0xEA),
        Role::P => Color32::from_rgb(0x0D, 0x5F, 0xFF),
        Role::Unknown => Color32::from_rgb(0x8A, 0x94, 0xA6),
    }
}

pub(super) fn status_color(status: LiveStatus) -> Color32 {
    match status {
        LiveStatus::Live => Color32::from_rgb(46, 204, 113),
        LiveStatus::Unreachable => Color32::from_rgb(231, 76, 60),
        LiveStatus::ConfigOnly | LiveStatus::Unknown => Color32::from_gray(140),
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (alpha.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Fill and stroke of one node glyph plus its size multiplier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct NodeStyle {
    pub(super) glow: Color32,
    pub(super) ring_fill: Color32,
    pub(super) ring_stroke: Stroke,
    pub(super) core: Color32,
    pub(super) scale: f32,
}

pub(super) fn node_style(role: Role, highlighted: bool) -> NodeStyle {
    let base = role_color(role);
    if highlighted {
        let bright = blend_color(base, Color32::WHITE, 0.25);
        NodeStyle {
            glow: with_alpha(bright, 0.22),
            ring_fill: with_alpha(bright, 0.5),
            ring_stroke: Stroke::new(3.0, bright),
            core: with_alpha(bright, 0.9),
            scale: HIGHLIGHT_GROWTH,
        }
    } else {
        NodeStyle {
            glow: with_alpha(base, 0.08),
            ring_fill: with_alpha(base, 0.2),
            ring_stroke: Stroke::new(2.0, base),
            core: with_alpha(base, 0.6),
            scale: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct EdgeStyle {
    pub(super) stroke: Stroke,
    pub(super) dashed: bool,
    pub(super) arrow: bool,
}

pub(super) fn physical_width(metric: Option<f64>) -> f32 {
    let metric = metric.unwrap_or(DEFAULT_METRIC);
    (4.0 - metric / 50.0).max(1.5) as f32
}

pub(super) fn edge_style(
    kind: EdgeKind,
    metric: Option<f64>,
    highlighted: bool,
    theme: Theme,
) -> EdgeStyle {
    let base = match kind {
        EdgeKind::Physical => EdgeStyle {
            stroke: Stroke::new(physical_width(metric), theme.physical_link()),
            dashed: false,
            arrow: false,
        },
        EdgeKind::Bgp => EdgeStyle {
            stroke: Stroke::new(1.5, theme.bgp_link()),
            dashed: true,
            arrow: true,
        },
    };

    if highlighted {
        EdgeStyle {
            stroke: Stroke::new(base.stroke.width + 2.5, Color32::from_rgb(0x01, 0xD9, 0xA6)),
            ..base
        }
    } else {
        base
    }
}

/// Scene transform. World coordinates are viewport pixels at identity zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Camera {
    pub(super) pan: Vec2,
    pub(super) zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub(super) fn world_to_screen(self, rect: Rect, world: Vec2) -> Pos2 {
        rect.min + self.pan + world * self.zoom
    }

    pub(super) fn screen_to_world(self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.min - self.pan) / self.zoom
    }

    /// Zooms by `factor` keeping the world point under `anchor` fixed.
    pub(super) fn zoom_at(&mut self, rect: Rect, anchor: Pos2, factor: f32) {
        let world = self.screen_to_world(rect, anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - rect.min - world * self.zoom;
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, camera: Camera, theme: Theme) {
    painter.rect_filled(rect, 0.0, theme.background());

    let step = (56.0 * camera.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + camera.pan;
    let stroke = Stroke::new(1.0, theme.grid());

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    #[test]
    fn every_role_has_its_own_color() {
        let colors = [Role::Pe, Role::P, Role::RouteReflector, Role::Unknown].map(role_color);
        for (index, color) in colors.iter().enumerate() {
            assert!(!colors[index + 1..].contains(color));
        }
    }

    #[test]
    fn highlighted_nodes_are_larger_and_brighter() {
        let base = node_style(Role::P, false);
        let emphasized = node_style(Role::P, true);

        assert!(emphasized.scale > base.scale);
        assert!(emphasized.ring_stroke.width > base.ring_stroke.width);
        assert!(emphasized.core.a() > base.core.a());
    }

    #[test]
    fn physical_width_shrinks_with_metric() {
        assert!((physical_width(None) - 3.8).abs() < 1e-5);
        assert_eq!(physical_width(Some(100.0)), 2.0);
        assert_eq!(physical_width(Some(1_000.0)), 1.5);
    }

    #[test]
    fn bgp_edges_are_dashed_and_highlight_widens_stroke() {
        let bgp = edge_style(EdgeKind::Bgp, None, false, Theme::Dark);
        assert!(bgp.dashed && bgp.arrow);

        let physical = edge_style(EdgeKind::Physical, Some(10.0), false, Theme::Dark);
        let highlighted = edge_style(EdgeKind::Physical, Some(10.0), true, Theme::Dark);
        assert!(highlighted.stroke.width > physical.stroke.width);
        assert_ne!(highlighted.stroke.color, physical.stroke.color);
    }

    #[test]
    fn camera_round_trips_and_clamps_zoom() {
        let rect = Rect::from_min_size(pos2(10.0, 20.0), vec2(800.0, 600.0));
        let mut camera = Camera::default();
        let anchor = pos2(300.0, 200.0);
        let world = camera.screen_to_world(rect, anchor);

        camera.zoom_at(rect, anchor, 2.0);
        assert_eq!(camera.zoom, 2.0);
        assert!((camera.world_to_screen(rect, world) - anchor).length() < 1e-3);

        camera.zoom_at(rect, anchor, 100.0);
        assert_eq!(camera.zoom, MAX_ZOOM);
        camera.zoom_at(rect, anchor, 0.0001);
        assert_eq!(camera.zoom, MIN_ZOOM);
    }
}
