use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    pub(super) fn side(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared gap between two squares, zero when they overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        dx * dx + dy * dy
    }

    fn quadrant(self, index: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = vec2(
            if index & 1 == 0 { -quarter } else { quarter },
            if index & 2 == 0 { -quarter } else { quarter },
        );
        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }
}

/// Region quadtree over body positions. Interior cells carry the aggregate
/// body count and barycenter used by the Barnes–Hut charge approximation.
pub(super) struct Quad {
    pub(super) square: Square,
    pub(super) barycenter: Vec2,
    pub(super) weight: f32,
    pub(super) members: Vec<usize>,
    pub(super) children: [Option<Box<Quad>>; 4],
}

impl Quad {
    pub(super) fn build(points: &[Vec2]) -> Option<Self> {
        let square = Square::enclosing(points)?;
        Some(Self::subdivide(square, (0..points.len()).collect(), points, 0))
    }

    fn subdivide(square: Square, members: Vec<usize>, points: &[Vec2], depth: usize) -> Self {
        let weight = members.len() as f32;
        let barycenter = if members.is_empty() {
            square.center
        } else {
            members
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + points[index])
                / weight
        };

        let mut quad = Self {
            square,
            barycenter,
            weight,
            members,
            children: std::array::from_fn(|_| None),
        };
        if depth >= MAX_DEPTH || quad.members.len() <= LEAF_CAPACITY {
            return quad;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &quad.members {
            buckets[square.quadrant_of(points[index])].push(index);
        }
        // Coincident points would otherwise recurse until MAX_DEPTH.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return quad;
        }

        for (index, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                quad.children[index] = Some(Box::new(Self::subdivide(
                    square.quadrant(index),
                    bucket,
                    points,
                    depth + 1,
                )));
            }
        }
        quad.members.clear();
        quad
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &Quad> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}
