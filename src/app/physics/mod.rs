mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};

use crate::topology::{EdgeKind, TopologyModel};
use crate::util::stable_pair;
use forces::{CollisionPass, Spring, accumulate_charge, apply_centering, apply_springs};
use quadtree::Quad;

const PHYSICAL_LINK_DISTANCE: f32 = 120.0;
const BGP_LINK_DISTANCE: f32 = 200.0;
const CHARGE_STRENGTH: f32 = -500.0;
const BARNES_HUT_THETA: f32 = 0.9;
const COLLISION_RADIUS: f32 = 40.0;
const COLLISION_STRENGTH: f32 = 1.0;
const ALPHA_MIN: f32 = 0.001;
const VELOCITY_RETAIN: f32 = 0.6;

pub(in crate::app) const DRAG_ALPHA_TARGET: f32 = 0.3;
pub(in crate::app) const LAYOUT_REHEAT_ALPHA: f32 = 0.3;
pub(in crate::app) const FULL_ALPHA: f32 = 1.0;

/// Kinematic copy of one node. Only the simulation mutates it.
#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct Body {
    pub(in crate::app) position: Vec2,
    pub(in crate::app) velocity: Vec2,
    pub(in crate::app) pin: Option<Vec2>,
}

/// Continuous force layout over the current model.
///
/// Each tick cools `alpha` toward `alpha_target`, applies link, charge,
/// centering and collision forces, then integrates. Ticking is pointless
/// once [`Simulation::is_active`] turns false; any reheat revives it.
pub(in crate::app) struct Simulation {
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    radii: Vec<f32>,
    center: Vec2,
    alpha: f32,
    alpha_target: f32,
    alpha_decay: f32,
    scratch: Scratch,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    predicted: Vec<Vec2>,
    deltas: Vec<Vec2>,
}

impl Simulation {
    pub(in crate::app) fn new(model: &TopologyModel, viewport: Vec2) -> Self {
        let center = viewport * 0.5;
        let spread = viewport.x.min(viewport.y) * 0.35;
        let bodies = model
            .nodes
            .iter()
            .map(|node| {
                let (jx, jy) = stable_pair(&node.id);
                Body {
                    position: center + vec2(jx, jy) * spread,
                    velocity: Vec2::ZERO,
                    pin: None,
                }
            })
            .collect::<Vec<_>>();

        let mut degree = vec![0usize; bodies.len()];
        for edge in &model.edges {
            degree[edge.source] += 1;
            degree[edge.target] += 1;
        }

        let springs = model
            .edges
            .iter()
            .map(|edge| {
                let (source_degree, target_degree) =
                    (degree[edge.source] as f32, degree[edge.target] as f32);
                Spring {
                    source: edge.source,
                    target: edge.target,
                    rest_length: match edge.kind {
                        EdgeKind::Physical => PHYSICAL_LINK_DISTANCE,
                        EdgeKind::Bgp => BGP_LINK_DISTANCE,
                    },
                    stiffness: 1.0 / source_degree.min(target_degree).max(1.0),
                    bias: source_degree / (source_degree + target_degree).max(1.0),
                }
            })
            .collect();

        Self {
            radii: vec![COLLISION_RADIUS; bodies.len()],
            bodies,
            springs,
            center,
            alpha: FULL_ALPHA,
            alpha_target: 0.0,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
            scratch: Scratch::default(),
        }
    }

    pub(in crate::app) fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub(in crate::app) fn position(&self, index: usize) -> Option<Vec2> {
        self.bodies.get(index).map(|body| body.position)
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn is_active(&self) -> bool {
        self.alpha >= ALPHA_MIN || self.alpha_target >= ALPHA_MIN
    }

    pub(in crate::app) fn reheat(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub(in crate::app) fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub(in crate::app) fn stop(&mut self) {
        self.alpha = 0.0;
        self.alpha_target = 0.0;
        for body in &mut self.bodies {
            body.velocity = Vec2::ZERO;
        }
    }

    pub(in crate::app) fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pin = Some(position);
        }
    }

    pub(in crate::app) fn unpin(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pin = None;
        }
    }

    /// Clears every pin except the one held by `keep`.
    pub(in crate::app) fn unpin_all_except(&mut self, keep: Option<usize>) {
        for (index, body) in self.bodies.iter_mut().enumerate() {
            if Some(index) != keep {
                body.pin = None;
            }
        }
    }

    pub(in crate::app) fn pinned_count(&self) -> usize {
        self.bodies.iter().filter(|body| body.pin.is_some()).count()
    }

    /// Advances one frame. Returns whether the simulation is still warm.
    pub(in crate::app) fn tick(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        for body in &self.bodies {
            scratch.positions.push(body.position);
            scratch.velocities.push(body.velocity);
        }
        let positions = &mut scratch.positions;
        let velocities = &mut scratch.velocities;

        apply_springs(&self.springs, positions, velocities, alpha);

        if let Some(quad) = Quad::build(positions) {
            for (index, velocity) in velocities.iter_mut().enumerate() {
                accumulate_charge(
                    &quad,
                    index,
                    positions,
                    CHARGE_STRENGTH,
                    alpha,
                    BARNES_HUT_THETA,
                    velocity,
                );
            }
        }

        apply_centering(positions, self.center);

        scratch.predicted.clear();
        scratch
            .predicted
            .extend(positions.iter().zip(velocities.iter()).map(|(p, v)| *p + *v));
        if let Some(quad) = Quad::build(&scratch.predicted) {
            let reach = self.radii.iter().copied().fold(0.0_f32, f32::max) * 2.0;
            scratch.deltas.clear();
            scratch.deltas.resize(self.bodies.len(), Vec2::ZERO);
            let pass = CollisionPass {
                predicted: &scratch.predicted,
                radii: &self.radii,
                reach_sq: reach * reach,
                strength: COLLISION_STRENGTH,
            };
            pass.visit(&quad, &quad, true, &mut scratch.deltas);
            for (velocity, delta) in velocities.iter_mut().zip(&scratch.deltas) {
                *velocity += *delta;
            }
        }

        for ((body, position), velocity) in self
            .bodies
            .iter_mut()
            .zip(positions.iter())
            .zip(velocities.iter())
        {
            match body.pin {
                Some(pin) => {
                    body.position = pin;
                    body.velocity = Vec2::ZERO;
                }
                None => {
                    body.velocity = *velocity * VELOCITY_RETAIN;
                    body.position = *position + body.velocity;
                }
            }
        }

        self.is_active()
    }
}
