#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Squad Tactics engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and presentation layers to react to deterministically.
//! Capabilities the engine does not own (pathfinding, animation, scene
//! queries) are expressed as the traits in [`ports`].

use std::{sync::Arc, time::Duration};

pub use glam::{Vec2, Vec3};

mod descriptor;
mod health;
pub mod ports;

pub use descriptor::{DescriptorError, UnitClass, UnitDescriptor, UnitRarity};
pub use health::{DamageOutcome, Health, HealthError};
pub use ports::{NavigationPort, Presentation, PreviewSurface, SpatialQuery, UnitFactory};

/// Speed below which a navigation agent is considered stationary.
pub const VELOCITY_EPSILON: f32 = 0.1;

/// Cosine similarity a move direction must exceed to count as aligned with an axis.
pub const MOVE_ATTACK_ALIGNMENT: f32 = 0.7;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Spawns a single unit that does not belong to any squad.
    SpawnUnit {
        /// Descriptor the unit is built from.
        descriptor: Arc<UnitDescriptor>,
        /// Position the unit appears at.
        position: Vec3,
    },
    /// Creates a squad at `anchor` and spawns its members.
    DeploySquad {
        /// Descriptor every member is built from.
        descriptor: Arc<UnitDescriptor>,
        /// Squad anchor that formation offsets are measured from.
        anchor: Vec3,
        /// Offsets of every formation slot relative to the anchor.
        formation: Vec<Vec3>,
        /// Resolved spawn point per filled slot; `None` when no navigable point was found.
        spawn_points: Vec<Option<Vec3>>,
    },
    /// Orders a unit to travel to a destination, dropping any target.
    MoveUnit {
        /// Unit receiving the order.
        unit: UnitId,
        /// Destination in world units.
        destination: Vec3,
    },
    /// Orders a unit to pursue and fire at a target.
    EngageTarget {
        /// Unit receiving the order.
        unit: UnitId,
        /// Unit to attack.
        target: UnitId,
    },
    /// Sends a unit back to its formation slot unless it is busy fighting.
    ReturnToSlot {
        /// Unit receiving the order.
        unit: UnitId,
        /// World position of the unit's slot.
        position: Vec3,
    },
    /// Moves a squad anchor, dragging every slot along with it.
    MoveSquadAnchor {
        /// Squad whose anchor should move.
        squad: SquadId,
        /// Anchor destination in world units.
        destination: Vec3,
    },
    /// Stops a squad anchor where it stands.
    HaltSquadAnchor {
        /// Squad whose anchor should stop.
        squad: SquadId,
    },
    /// Applies damage from an external source.
    DamageUnit {
        /// Unit receiving the damage.
        unit: UnitId,
        /// Damage amount; negative amounts are rejected.
        amount: i32,
    },
    /// Adds a unit to a squad roster, bound to a formation slot.
    EnlistUnit {
        /// Squad receiving the unit.
        squad: SquadId,
        /// Unit joining the roster.
        unit: UnitId,
        /// Formation slot the unit is bound to.
        slot: usize,
    },
    /// Removes a unit from a squad roster.
    DischargeUnit {
        /// Squad losing the unit.
        squad: SquadId,
        /// Unit leaving the roster.
        unit: UnitId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a unit entered the battlefield.
    UnitSpawned {
        /// Identifier allocated to the unit.
        unit: UnitId,
        /// Squad the unit was deployed with, if any.
        squad: Option<SquadId>,
        /// Position the unit appeared at.
        position: Vec3,
    },
    /// Reports damage that a unit survived.
    UnitDamaged {
        /// Unit that took the damage.
        unit: UnitId,
        /// Unit that fired, when the damage came from combat.
        attacker: Option<UnitId>,
        /// Points removed from the unit's health.
        dealt: u32,
        /// Points left afterwards.
        remaining: u32,
    },
    /// Announces a unit's death. Broadcast exactly once per unit.
    UnitDied {
        /// Unit that died.
        unit: UnitId,
        /// Unit that landed the killing shot, when the damage came from combat.
        killer: Option<UnitId>,
        /// Squad the unit was discharged from, if any.
        squad: Option<SquadId>,
    },
    /// Confirms that a dead unit was removed after its grace period.
    UnitDespawned {
        /// Unit that was removed.
        unit: UnitId,
    },
    /// Confirms that a squad finished deploying.
    SquadDeployed {
        /// Identifier allocated to the squad.
        squad: SquadId,
        /// Card name of the deployed descriptor.
        name: String,
        /// Anchor position of the squad.
        anchor: Vec3,
        /// Effect to play at the anchor, if any.
        effect: Option<String>,
        /// Sounds to play at the anchor.
        sounds: Vec<String>,
    },
    /// Warns that a formation slot had no navigable spawn point.
    SlotFallback {
        /// Squad being deployed.
        squad: SquadId,
        /// Index of the unresolved slot.
        slot: usize,
        /// Position the unit was spawned at instead.
        anchor: Vec3,
    },
    /// Confirms that a unit joined a squad roster.
    UnitEnlisted {
        /// Squad that gained the unit.
        squad: SquadId,
        /// Unit that joined.
        unit: UnitId,
        /// Formation slot the unit is bound to.
        slot: usize,
    },
    /// Confirms that a unit left a squad roster without dying.
    UnitDischarged {
        /// Squad that lost the unit.
        squad: SquadId,
        /// Unit that left.
        unit: UnitId,
    },
    /// Reports that a command was refused.
    OrderRejected {
        /// Specific reason the command failed.
        reason: OrderRejection,
    },
}

/// Reasons a command may be refused by the world.
#[derive(Clone, Debug, PartialEq)]
pub enum OrderRejection {
    /// No live registration exists for the unit handle.
    UnknownUnit(UnitId),
    /// The unit is dead and accepts no further orders.
    UnitDead(UnitId),
    /// A unit was asked to attack itself.
    SelfTarget(UnitId),
    /// No squad exists with the identifier.
    UnknownSquad(SquadId),
    /// The slot index exceeds the squad's formation.
    SlotOutOfRange {
        /// Squad addressed by the command.
        squad: SquadId,
        /// Requested slot.
        slot: usize,
    },
    /// Another roster member already holds the slot.
    SlotOccupied {
        /// Squad addressed by the command.
        squad: SquadId,
        /// Requested slot.
        slot: usize,
    },
    /// The unit already belongs to a different squad.
    AlreadyEnlisted {
        /// Unit addressed by the command.
        unit: UnitId,
        /// Squad the unit currently belongs to.
        squad: SquadId,
    },
    /// The damage amount was refused by the unit's health.
    InvalidDamage {
        /// Unit addressed by the command.
        unit: UnitId,
        /// Rejected amount.
        amount: i32,
    },
    /// The descriptor cannot be spawned.
    InvalidDescriptor {
        /// Card name of the descriptor.
        card: String,
    },
}

/// Liveness-checked handle to a combat unit.
///
/// The generation changes whenever a registry slot is reused, so a handle held
/// after its unit despawned never resolves to a different unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    index: u32,
    generation: u32,
}

impl UnitId {
    /// Creates a handle from a registry slot and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Registry slot referenced by the handle.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Unique identifier assigned to a squad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SquadId(u32);

impl SquadId {
    /// Creates a new squad identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle to a placement preview placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewId(u32);

impl PreviewId {
    /// Creates a new preview identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behavioural state of a combat unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UnitState {
    /// Standing still without orders.
    #[default]
    Idle,
    /// Travelling toward a destination.
    Moving,
    /// Pursuing and firing at a target.
    Attacking,
    /// Terminal state after the unit's health ran out.
    Dead,
}

impl UnitState {
    /// Reports whether the unit can still receive orders.
    #[must_use]
    pub const fn is_alive(self) -> bool {
        !matches!(self, Self::Dead)
    }
}

/// Direction of travel relative to the unit's facing while it fires on the move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveAttackDirection {
    /// Advancing toward the target.
    Forward,
    /// Retreating from the target.
    Backward,
    /// Sidestepping to the left.
    StrafeLeft,
    /// Sidestepping to the right.
    StrafeRight,
}

impl MoveAttackDirection {
    /// Buckets a velocity relative to a planar facing.
    ///
    /// Forward is tested first, then backward, right and left. Directions
    /// that align with no axis (steep climbs included) and zero vectors count
    /// as forward.
    #[must_use]
    pub fn classify(facing: Vec3, velocity: Vec3) -> Self {
        let Some(forward) = planar(facing).try_normalize() else {
            return Self::Forward;
        };
        let Some(heading) = velocity.try_normalize() else {
            return Self::Forward;
        };
        let right = Vec3::new(forward.z, 0.0, -forward.x);

        let forward_dot = forward.dot(heading);
        let right_dot = right.dot(heading);

        if forward_dot > MOVE_ATTACK_ALIGNMENT {
            Self::Forward
        } else if forward_dot < -MOVE_ATTACK_ALIGNMENT {
            Self::Backward
        } else if right_dot > MOVE_ATTACK_ALIGNMENT {
            Self::StrafeRight
        } else if right_dot < -MOVE_ATTACK_ALIGNMENT {
            Self::StrafeLeft
        } else {
            Self::Forward
        }
    }
}

/// Projects a vector onto the horizontal plane.
#[must_use]
pub fn planar(vector: Vec3) -> Vec3 {
    Vec3::new(vector.x, 0.0, vector.z)
}

/// Distance between two points ignoring height.
#[must_use]
pub fn planar_distance(from: Vec3, to: Vec3) -> f32 {
    planar(to - from).length()
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Handle of the unit.
    pub id: UnitId,
    /// Squad the unit belongs to, if any.
    pub squad: Option<SquadId>,
    /// Behavioural state.
    pub state: UnitState,
    /// Position reported by the unit's navigation agent.
    pub position: Vec3,
    /// Velocity reported by the unit's navigation agent.
    pub velocity: Vec3,
    /// Planar unit vector the unit faces.
    pub facing: Vec3,
    /// Current target, which may already be stale.
    pub target: Option<UnitId>,
    /// Health of the unit.
    pub health: Health,
}

/// Read-only snapshot describing all registered units.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot captured for `unit`.
    #[must_use]
    pub fn get(&self, unit: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&unit, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Binding between a roster member and its formation slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RosterEntry {
    /// Member of the squad.
    pub unit: UnitId,
    /// Formation slot the member occupies.
    pub slot: usize,
}

/// Immutable representation of a single squad used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct SquadSnapshot {
    /// Identifier of the squad.
    pub id: SquadId,
    /// Card name of the squad's descriptor.
    pub name: String,
    /// Anchor position reported by the squad's navigation agent.
    pub anchor: Vec3,
    /// Slot offsets relative to the anchor.
    pub slots: Vec<Vec3>,
    /// Live members in enlistment order.
    pub roster: Vec<RosterEntry>,
}

impl SquadSnapshot {
    /// World position of the requested slot.
    #[must_use]
    pub fn slot_position(&self, slot: usize) -> Option<Vec3> {
        self.slots.get(slot).map(|offset| self.anchor + *offset)
    }
}

/// Read-only snapshot describing all squads.
#[derive(Clone, Debug, Default)]
pub struct SquadView {
    snapshots: Vec<SquadSnapshot>,
}

impl SquadView {
    /// Creates a new squad view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<SquadSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured squad snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &SquadSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot captured for `squad`.
    #[must_use]
    pub fn get(&self, squad: SquadId) -> Option<&SquadSnapshot> {
        self.snapshots
            .binary_search_by_key(&squad, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<SquadSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_prefers_forward_for_aligned_motion() {
        let facing = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(
            MoveAttackDirection::classify(facing, Vec3::new(0.1, 0.0, 2.0)),
            MoveAttackDirection::Forward
        );
        assert_eq!(
            MoveAttackDirection::classify(facing, Vec3::new(0.0, 0.0, -3.0)),
            MoveAttackDirection::Backward
        );
    }

    #[test]
    fn classify_detects_strafing() {
        let facing = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(
            MoveAttackDirection::classify(facing, Vec3::new(2.0, 0.0, 0.0)),
            MoveAttackDirection::StrafeRight
        );
        assert_eq!(
            MoveAttackDirection::classify(facing, Vec3::new(-2.0, 0.0, 0.1)),
            MoveAttackDirection::StrafeLeft
        );
    }

    #[test]
    fn classify_defaults_to_forward_when_ambiguous() {
        let facing = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(
            MoveAttackDirection::classify(facing, Vec3::new(1.0, 2.0, -1.0)),
            MoveAttackDirection::Forward,
            "climbing motion aligns with no planar axis"
        );
        assert_eq!(
            MoveAttackDirection::classify(facing, Vec3::ZERO),
            MoveAttackDirection::Forward
        );
    }

    #[test]
    fn classify_checks_forward_before_strafing() {
        let facing = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(
            MoveAttackDirection::classify(facing, Vec3::new(1.0, 0.0, 1.0)),
            MoveAttackDirection::Forward
        );
        assert_eq!(
            MoveAttackDirection::classify(facing, Vec3::new(-1.0, 0.0, -1.0)),
            MoveAttackDirection::Backward
        );
    }

    #[test]
    fn planar_distance_ignores_height() {
        let from = Vec3::new(0.0, 10.0, 0.0);
        let to = Vec3::new(3.0, -4.0, 4.0);
        assert!((planar_distance(from, to) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unit_ids_with_different_generations_differ() {
        assert_ne!(UnitId::new(3, 0), UnitId::new(3, 1));
        assert!(UnitId::new(1, 9) < UnitId::new(2, 0));
    }

    #[test]
    fn slot_position_offsets_from_anchor() {
        let snapshot = SquadSnapshot {
            id: SquadId::new(0),
            name: "Riflemen".to_owned(),
            anchor: Vec3::new(10.0, 0.0, 5.0),
            slots: vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)],
            roster: Vec::new(),
        };
        assert_eq!(snapshot.slot_position(1), Some(Vec3::new(11.0, 0.0, 5.0)));
        assert_eq!(snapshot.slot_position(2), None);
    }

    #[test]
    fn unit_view_lookup_uses_sorted_order() {
        let snapshot = |index| UnitSnapshot {
            id: UnitId::new(index, 0),
            squad: None,
            state: UnitState::Idle,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            facing: Vec3::Z,
            target: None,
            health: Health::default(),
        };
        let view = UnitView::from_snapshots(vec![snapshot(4), snapshot(1), snapshot(2)]);

        let order: Vec<u32> = view.iter().map(|unit| unit.id.index()).collect();
        assert_eq!(order, vec![1, 2, 4]);
        assert!(view.get(UnitId::new(2, 0)).is_some());
        assert!(view.get(UnitId::new(3, 0)).is_none());
    }
}
