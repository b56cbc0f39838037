use eframe::egui::{Vec2, vec2};

use super::quadtree::Quad;

const MIN_DISTANCE_SQ: f32 = 1.0;

/// Spring between two bodies with d3-style bias toward the less connected end.
#[derive(Clone, Copy, Debug)]
pub(super) struct Spring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) rest_length: f32,
    pub(super) stiffness: f32,
    pub(super) bias: f32,
}

/// Small deterministic nudge for bodies that sit exactly on top of each other.
pub(super) fn jiggle(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

pub(super) fn apply_springs(
    springs: &[Spring],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    alpha: f32,
) {
    for spring in springs {
        let (source, target) = (spring.source, spring.target);
        if source == target {
            continue;
        }

        let mut delta =
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        if delta == Vec2::ZERO {
            delta = jiggle(source, target);
        }
        let length = delta.length();
        let scale = (length - spring.rest_length) / length * alpha * spring.stiffness;
        let pull = delta * scale;

        velocities[target] -= pull * spring.bias;
        velocities[source] += pull * (1.0 - spring.bias);
    }
}

fn charge_between(from: Vec2, toward: Vec2, strength: f32, alpha: f32) -> Vec2 {
    let delta = toward - from;
    let distance_sq = delta.length_sq();
    if distance_sq < MIN_DISTANCE_SQ {
        let distance_sq = distance_sq.max(f32::EPSILON).sqrt();
        return delta * (strength * alpha / distance_sq);
    }
    delta * (strength * alpha / distance_sq)
}

/// Many-body charge on one body, approximating distant cells by their
/// barycenter once `side / distance` falls below `theta`.
pub(super) fn accumulate_charge(
    quad: &Quad,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    alpha: f32,
    theta: f32,
    velocity: &mut Vec2,
) {
    if quad.weight <= 0.0 {
        return;
    }

    let point = positions[index];
    if quad.is_leaf() {
        for &other in &quad.members {
            if other == index {
                continue;
            }
            let mut toward = positions[other];
            if toward == point {
                toward += jiggle(index, other);
            }
            *velocity += charge_between(point, toward, strength, alpha);
        }
        return;
    }

    let distance_sq = (quad.barycenter - point).length_sq();
    let side = quad.square.side();
    if distance_sq > 0.0 && side * side < theta * theta * distance_sq {
        *velocity += charge_between(point, quad.barycenter, strength * quad.weight, alpha);
        return;
    }

    for child in quad.children() {
        accumulate_charge(child, index, positions, strength, alpha, theta, velocity);
    }
}

/// Moves every body so the barycenter sits on `center`.
pub(super) fn apply_centering(positions: &mut [Vec2], center: Vec2) {
    if positions.is_empty() {
        return;
    }

    let barycenter =
        positions.iter().fold(Vec2::ZERO, |sum, point| sum + *point) / positions.len() as f32;
    let shift = center - barycenter;
    for position in positions {
        *position += shift;
    }
}

pub(super) struct CollisionPass<'a> {
    pub(super) predicted: &'a [Vec2],
    pub(super) radii: &'a [f32],
    pub(super) reach_sq: f32,
    pub(super) strength: f32,
}

impl CollisionPass<'_> {
    fn resolve_pair(&self, a: usize, b: usize, deltas: &mut [Vec2]) {
        let radius = self.radii[a] + self.radii[b];
        let mut offset = self.predicted[a] - self.predicted[b];
        let distance_sq = offset.length_sq();
        if distance_sq >= radius * radius {
            return;
        }
        if distance_sq == 0.0 {
            offset = jiggle(a, b);
        }

        let distance = offset.length();
        let push = offset * ((radius - distance) / distance * self.strength);
        let (ra, rb) = (self.radii[a] * self.radii[a], self.radii[b] * self.radii[b]);
        let share = rb / (ra + rb).max(f32::EPSILON);
        deltas[a] += push * share;
        deltas[b] -= push * (1.0 - share);
    }

    /// Walks cell pairs, skipping any whose gap exceeds the collision reach.
    pub(super) fn visit(&self, a: &Quad, b: &Quad, same: bool, deltas: &mut [Vec2]) {
        if a.square.gap_sq(b.square) > self.reach_sq {
            return;
        }

        match (a.is_leaf(), b.is_leaf()) {
            (true, true) if same => {
                for (slot, &first) in a.members.iter().enumerate() {
                    for &second in &a.members[slot + 1..] {
                        self.resolve_pair(first, second, deltas);
                    }
                }
            }
            (true, true) => {
                for &first in &a.members {
                    for &second in &b.members {
                        self.resolve_pair(first, second, deltas);
                    }
                }
            }
            _ if same => {
                let children = a.children().collect::<Vec<_>>();
                for (slot, first) in children.iter().enumerate() {
                    self.visit(first, first, true, deltas);
                    for second in &children[slot + 1..] {
                        self.visit(first, second, false, deltas);
                    }
                }
            }
            (false, true) => {
                for child in a.children() {
                    self.visit(child, b, false, deltas);
                }
            }
            (true, false) => {
                for child in b.children() {
                    self.visit(a, child, false, deltas);
                }
            }
            (false, false) => {
                if a.square.half_extent >= b.square.half_extent {
                    for child in a.children() {
                        self.visit(child, b, false, deltas);
                    }
                } else {
                    for child in b.children() {
                        self.visit(a, child, false, deltas);
                    }
                }
            }
        }
    }
}
