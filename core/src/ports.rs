//! Capabilities the simulation consumes but never implements itself.
//!
//! Engines and adapters provide these; the world and systems only talk to the
//! traits, so pathfinding, animation playback and scene queries stay opaque.

use std::{fmt, time::Duration};

use glam::{Vec2, Vec3};

use crate::{MoveAttackDirection, PreviewId, UnitDescriptor};

/// Pathfinding agent attached to a unit or a squad anchor.
pub trait NavigationPort: fmt::Debug {
    /// Starts travelling toward `destination`, replacing any previous path.
    fn set_destination(&mut self, destination: Vec3);

    /// Abandons the current path and stops.
    fn reset_path(&mut self);

    /// Velocity in world units per second.
    fn current_velocity(&self) -> Vec3;

    /// Position in world units.
    fn current_position(&self) -> Vec3;

    /// Integrates motion for one tick.
    ///
    /// Engines that move their agents themselves keep the default no-op.
    fn advance(&mut self, _dt: Duration) {}
}

/// Fire-and-forget animation cues for a single unit.
pub trait Presentation: fmt::Debug {
    /// Spawn animation.
    fn play_appear(&mut self);

    /// Standing idle.
    fn play_idle(&mut self);

    /// Plain locomotion.
    fn play_move(&mut self);

    /// Aiming while stationary.
    fn play_attack_idle(&mut self);

    /// A single shot; the aim cue resumes once it finishes.
    fn play_attack_shot(&mut self);

    /// Moving while firing in the given direction relative to the facing.
    fn play_move_attack(&mut self, direction: MoveAttackDirection);

    /// Terminal death animation.
    fn play_death(&mut self);
}

/// Scene queries used while validating placements.
pub trait SpatialQuery {
    /// Casts a ray from the viewpoint through `pointer` onto the placement surface.
    fn raycast_from_pointer(&self, pointer: Vec2) -> Option<Vec3>;

    /// Counts obstacles overlapping the box centred at `center`.
    fn query_obstacles_near(&self, center: Vec3, half_extents: Vec3) -> usize;

    /// Finds the navigable point closest to `position` within `search_radius`.
    fn sample_nearest_navigable_point(&self, position: Vec3, search_radius: f32) -> Option<Vec3>;
}

/// Translucent placeholders shown while a placement is pending.
pub trait PreviewSurface {
    /// Spawns a non-colliding, non-interactive placeholder for `descriptor`.
    ///
    /// The placeholder starts hidden.
    fn spawn_preview(&mut self, descriptor: &UnitDescriptor, opacity: f32) -> PreviewId;

    /// Moves the placeholder to `position` and makes it visible.
    fn show_preview(&mut self, preview: PreviewId, position: Vec3);

    /// Hides the placeholder without releasing it.
    fn hide_preview(&mut self, preview: PreviewId);

    /// Destroys the placeholder and every transient resource cloned for it.
    fn despawn_preview(&mut self, preview: PreviewId);
}

/// Builds the per-unit capabilities wired into units at spawn time.
pub trait UnitFactory: fmt::Debug {
    /// Navigation agent for an individual unit placed at `position`.
    fn unit_navigator(
        &mut self,
        descriptor: &UnitDescriptor,
        position: Vec3,
    ) -> Box<dyn NavigationPort>;

    /// Presentation handle for an individual unit.
    fn unit_presentation(&mut self, descriptor: &UnitDescriptor) -> Box<dyn Presentation>;

    /// Navigation agent that carries a squad anchor placed at `position`.
    fn anchor_navigator(
        &mut self,
        descriptor: &UnitDescriptor,
        position: Vec3,
    ) -> Box<dyn NavigationPort>;
}
