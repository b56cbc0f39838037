use std::f32::consts::TAU;
use std::time::Duration;

use eframe::egui::{Vec2, vec2};

use crate::topology::Role;

pub const FALLBACK_VIEWPORT: Vec2 = vec2(960.0, 600.0);

const CIRCLE_FRACTION: f32 = 0.35;
const TIER_COUNT: usize = 3;
const RING_RADII: [f32; TIER_COUNT] = [60.0, 160.0, 260.0];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutMode {
    #[default]
    Free,
    Circular,
    Hierarchical,
    Radial,
}

impl LayoutMode {
    pub const ALL: [Self; 4] = [Self::Free, Self::Circular, Self::Hierarchical, Self::Radial];

    pub fn label(self) -> &'static str {
        match self {
            Self::Free => "Force",
            Self::Circular => "Circular",
            Self::Hierarchical => "Hierarchical",
            Self::Radial => "Radial",
        }
    }

    /// How long a deterministic layout keeps its pins before the force
    /// simulation takes over again.
    pub fn settle_duration(self) -> Option<Duration> {
        match self {
            Self::Free => None,
            Self::Circular => Some(Duration::from_secs(2)),
            Self::Hierarchical | Self::Radial => Some(Duration::from_secs(3)),
        }
    }
}

/// Replaces a zero or non-finite container dimension with a usable default.
pub fn effective_viewport(measured: Vec2) -> Vec2 {
    let pick = |value: f32, fallback: f32| {
        if value.is_finite() && value >= 1.0 {
            value
        } else {
            fallback
        }
    };
    vec2(
        pick(measured.x, FALLBACK_VIEWPORT.x),
        pick(measured.y, FALLBACK_VIEWPORT.y),
    )
}

/// Target coordinates for a deterministic layout, one per node in model
/// order. `None` for the free force layout.
pub fn layout_targets(mode: LayoutMode, roles: &[Role], viewport: Vec2) -> Option<Vec<Vec2>> {
    let viewport = effective_viewport(viewport);
    match mode {
        LayoutMode::Free => None,
        LayoutMode::Circular => Some(circular(roles.len(), viewport)),
        LayoutMode::Hierarchical => Some(hierarchical(roles, viewport)),
        LayoutMode::Radial => Some(radial(roles, viewport)),
    }
}

pub fn circular(count: usize, viewport: Vec2) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }

    let center = viewport * 0.5;
    let radius = viewport.x.min(viewport.y) * CIRCLE_FRACTION;
    (0..count)
        .map(|index| {
            let angle = TAU * index as f32 / count as f32;
            center + vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

fn tier_members(roles: &[Role]) -> [Vec<usize>; TIER_COUNT] {
    let mut tiers = std::array::from_fn::<_, TIER_COUNT, _>(|_| Vec::new());
    for (index, role) in roles.iter().enumerate() {
        tiers[role.tier().min(TIER_COUNT - 1)].push(index);
    }
    tiers
}

pub fn hierarchical(roles: &[Role], viewport: Vec2) -> Vec<Vec2> {
    let mut positions = vec![Vec2::ZERO; roles.len()];
    for (tier, members) in tier_members(roles).iter().enumerate() {
        let y = viewport.y * (tier as f32 + 1.0) / (TIER_COUNT as f32 + 1.0);
        for (slot, &index) in members.iter().enumerate() {
            let x = viewport.x * (slot as f32 + 1.0) / (members.len() as f32 + 1.0);
            positions[index] = vec2(x, y);
        }
    }
    positions
}

pub fn radial(roles: &[Role], viewport: Vec2) -> Vec<Vec2> {
    let center = viewport * 0.5;
    let mut positions = vec![center; roles.len()];
    for (tier, members) in tier_members(roles).iter().enumerate() {
        let radius = RING_RADII[tier];
        for (slot, &index) in members.iter().enumerate() {
            let angle = TAU * slot as f32 / members.len().max(1) as f32;
            positions[index] = center + vec2(angle.cos(), angle.sin()) * radius;
        }
    }
    positions
}
