use std::collections::BTreeMap;

use squad_tactics_core::{
    planar_distance, PreviewId, PreviewSurface, SpatialQuery, UnitDescriptor, Vec2, Vec3,
};

const EXIT_MARGIN: f32 = 0.01;

/// Axis-aligned box that blocks placement and navigation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    /// Centre of the box.
    pub center: Vec3,
    /// Half of the box size along each axis.
    pub half_extents: Vec3,
}

impl Obstacle {
    /// Creates an obstacle centred at `center`.
    #[must_use]
    pub const fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    fn overlaps(&self, center: Vec3, half_extents: Vec3) -> bool {
        let gap = (self.center - center).abs();
        gap.cmple(self.half_extents + half_extents).all()
    }

    fn covers_planar(&self, point: Vec3) -> bool {
        (self.center.x - point.x).abs() < self.half_extents.x
            && (self.center.z - point.z).abs() < self.half_extents.z
    }

    fn nearest_exit(&self, point: Vec3) -> Vec3 {
        let min = self.center - self.half_extents;
        let max = self.center + self.half_extents;
        let candidates = [
            Vec3::new(min.x - EXIT_MARGIN, point.y, point.z),
            Vec3::new(max.x + EXIT_MARGIN, point.y, point.z),
            Vec3::new(point.x, point.y, min.z - EXIT_MARGIN),
            Vec3::new(point.x, point.y, max.z + EXIT_MARGIN),
        ];
        candidates
            .into_iter()
            .min_by(|a, b| {
                planar_distance(point, *a).total_cmp(&planar_distance(point, *b))
            })
            .unwrap_or(point)
    }
}

/// State of a preview placeholder spawned on the battlefield.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewState {
    /// Card the preview stands in for.
    pub card: String,
    /// Opacity the placeholder is drawn with.
    pub opacity: f32,
    /// Position while visible.
    pub visible_at: Option<Vec3>,
}

/// Flat square battlefield centred on the origin at height zero.
///
/// Pointer coordinates map one-to-one onto the ground plane, as seen from a
/// top-down camera: `(x, y)` lands on `(x, 0, y)`.
#[derive(Clone, Debug)]
pub struct Battlefield {
    half_size: f32,
    obstacles: Vec<Obstacle>,
    previews: BTreeMap<PreviewId, PreviewState>,
    next_preview: u32,
}

impl Battlefield {
    /// Creates an empty battlefield spanning `-half_size..=half_size` on both axes.
    #[must_use]
    pub fn new(half_size: f32) -> Self {
        Self {
            half_size: half_size.abs(),
            obstacles: Vec::new(),
            previews: BTreeMap::new(),
            next_preview: 0,
        }
    }

    /// Adds an obstacle to the battlefield.
    #[must_use]
    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Half of the battlefield's side length.
    #[must_use]
    pub fn half_size(&self) -> f32 {
        self.half_size
    }

    /// Obstacles placed on the battlefield.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Previews that have been spawned and not yet despawned.
    #[must_use]
    pub fn previews(&self) -> &BTreeMap<PreviewId, PreviewState> {
        &self.previews
    }

    fn contains(&self, point: Vec3) -> bool {
        point.x.abs() <= self.half_size && point.z.abs() <= self.half_size
    }

    fn is_navigable(&self, point: Vec3) -> bool {
        self.contains(point)
            && !self
                .obstacles
                .iter()
                .any(|obstacle| obstacle.covers_planar(point))
    }
}

impl SpatialQuery for Battlefield {
    fn raycast_from_pointer(&self, pointer: Vec2) -> Option<Vec3> {
        let point = Vec3::new(pointer.x, 0.0, pointer.y);
        self.contains(point).then_some(point)
    }

    fn query_obstacles_near(&self, center: Vec3, half_extents: Vec3) -> usize {
        self.obstacles
            .iter()
            .filter(|obstacle| obstacle.overlaps(center, half_extents))
            .count()
    }

    fn sample_nearest_navigable_point(&self, position: Vec3, search_radius: f32) -> Option<Vec3> {
        let mut candidate = Vec3::new(
            position.x.clamp(-self.half_size, self.half_size),
            0.0,
            position.z.clamp(-self.half_size, self.half_size),
        );
        if let Some(blocking) = self
            .obstacles
            .iter()
            .find(|obstacle| obstacle.covers_planar(candidate))
        {
            candidate = blocking.nearest_exit(candidate);
        }

        (self.is_navigable(candidate) && planar_distance(position, candidate) <= search_radius)
            .then_some(candidate)
    }
}

impl PreviewSurface for Battlefield {
    fn spawn_preview(&mut self, descriptor: &UnitDescriptor, opacity: f32) -> PreviewId {
        let id = PreviewId::new(self.next_preview);
        self.next_preview = self.next_preview.wrapping_add(1);
        let _ = self.previews.insert(
            id,
            PreviewState {
                card: descriptor.card_name.clone(),
                opacity,
                visible_at: None,
            },
        );
        id
    }

    fn show_preview(&mut self, preview: PreviewId, position: Vec3) {
        if let Some(state) = self.previews.get_mut(&preview) {
            state.visible_at = Some(position);
        }
    }

    fn hide_preview(&mut self, preview: PreviewId) {
        if let Some(state) = self.previews.get_mut(&preview) {
            state.visible_at = None;
        }
    }

    fn despawn_preview(&mut self, preview: PreviewId) {
        let _ = self.previews.remove(&preview);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battlefield() -> Battlefield {
        Battlefield::new(10.0).with_obstacle(Obstacle::new(
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
        ))
    }

    #[test]
    fn raycast_misses_outside_the_bounds() {
        let battlefield = battlefield();
        assert_eq!(
            battlefield.raycast_from_pointer(Vec2::new(2.0, -3.0)),
            Some(Vec3::new(2.0, 0.0, -3.0))
        );
        assert_eq!(battlefield.raycast_from_pointer(Vec2::new(12.0, 0.0)), None);
    }

    #[test]
    fn obstacle_query_counts_overlapping_boxes() {
        let battlefield = battlefield();
        let half = Vec3::splat(0.5);
        assert_eq!(
            battlefield.query_obstacles_near(Vec3::new(2.6, 0.0, 0.0), half),
            1
        );
        assert_eq!(
            battlefield.query_obstacles_near(Vec3::new(2.0, 0.0, 0.0), half),
            0
        );
    }

    #[test]
    fn sampling_pushes_points_out_of_obstacles() {
        let battlefield = battlefield();
        let sampled = battlefield
            .sample_nearest_navigable_point(Vec3::new(3.5, 0.0, 0.2), 2.0)
            .expect("navigable point nearby");
        assert!((sampled.x - 2.99).abs() < 1e-4);
        assert!((sampled.z - 0.2).abs() < 1e-6);
    }

    #[test]
    fn sampling_fails_beyond_the_search_radius() {
        let battlefield = battlefield();
        assert_eq!(
            battlefield.sample_nearest_navigable_point(Vec3::new(14.0, 0.0, 0.0), 2.0),
            None
        );
        assert_eq!(
            battlefield.sample_nearest_navigable_point(Vec3::new(11.0, 0.0, 0.0), 2.0),
            Some(Vec3::new(10.0, 0.0, 0.0))
        );
    }
}
