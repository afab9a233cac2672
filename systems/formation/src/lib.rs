#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that keeps squad members in formation and relays squad orders.

use serde::{Deserialize, Serialize};
use squad_tactics_core::{
    planar_distance, Command, Event, SquadId, SquadSnapshot, SquadView, UnitId, UnitState,
    UnitView, Vec3,
};

/// Planar distance a member may stray from its slot before being called back.
pub const DEFAULT_CORRECTION_THRESHOLD: f32 = 0.5;

/// How a squad keeps its members arranged around the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormationPolicy {
    /// A move order sends each member to the destination plus its slot
    /// offset once; the anchor stays put and nothing is corrected afterwards.
    SnapshotOffsets,
    /// A move order drives the anchor and members are pulled back to their
    /// slots every tick.
    ContinuousCorrection {
        /// Planar distance beyond which a member is ordered back to its slot.
        threshold: f32,
    },
}

impl Default for FormationPolicy {
    fn default() -> Self {
        Self::ContinuousCorrection {
            threshold: DEFAULT_CORRECTION_THRESHOLD,
        }
    }
}

/// Squad-level instruction issued by a player or a script.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SquadOrder {
    /// Relocates the squad.
    Move {
        /// Squad receiving the order.
        squad: SquadId,
        /// Destination of the squad anchor.
        destination: Vec3,
    },
    /// Engages a single target with every live member.
    Attack {
        /// Squad receiving the order.
        squad: SquadId,
        /// Unit to attack.
        target: UnitId,
    },
}

/// Formation system that translates squad orders into per-unit commands.
#[derive(Debug, Default)]
pub struct Formation {
    policy: FormationPolicy,
    engaged: Vec<UnitId>,
}

impl Formation {
    /// Creates a formation system that applies `policy` to every squad.
    #[must_use]
    pub fn new(policy: FormationPolicy) -> Self {
        Self {
            policy,
            engaged: Vec::new(),
        }
    }

    /// Policy the system applies.
    #[must_use]
    pub fn policy(&self) -> FormationPolicy {
        self.policy
    }

    /// Emits commands for the provided orders and, under continuous
    /// correction, for members that drifted from their slots.
    ///
    /// Correction runs once per [`Event::TimeAdvanced`] batch and skips
    /// units that are attacking or were just told to attack.
    pub fn handle(
        &mut self,
        events: &[Event],
        orders: &[SquadOrder],
        squads: &SquadView,
        units: &UnitView,
        out: &mut Vec<Command>,
    ) {
        self.engaged.clear();

        for order in orders {
            match *order {
                SquadOrder::Move { squad, destination } => {
                    self.order_move(squad, destination, squads, units, out);
                }
                SquadOrder::Attack { squad, target } => {
                    self.order_attack(squad, target, squads, units, out);
                }
            }
        }

        let ticked = events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }));
        if let FormationPolicy::ContinuousCorrection { threshold } = self.policy {
            if ticked {
                self.correct_drift(threshold, squads, units, out);
            }
        }
    }

    fn order_move(
        &self,
        squad: SquadId,
        destination: Vec3,
        squads: &SquadView,
        units: &UnitView,
        out: &mut Vec<Command>,
    ) {
        match self.policy {
            FormationPolicy::SnapshotOffsets => {
                let Some(snapshot) = squads.get(squad) else {
                    tracing::debug!(squad = squad.get(), "move order for unknown squad");
                    return;
                };
                for (unit, slot) in live_members(snapshot, units) {
                    let Some(offset) = snapshot.slots.get(slot) else {
                        continue;
                    };
                    out.push(Command::MoveUnit {
                        unit,
                        destination: destination + *offset,
                    });
                }
            }
            FormationPolicy::ContinuousCorrection { .. } => {
                out.push(Command::MoveSquadAnchor { squad, destination });
            }
        }
    }

    fn order_attack(
        &mut self,
        squad: SquadId,
        target: UnitId,
        squads: &SquadView,
        units: &UnitView,
        out: &mut Vec<Command>,
    ) {
        let Some(snapshot) = squads.get(squad) else {
            tracing::debug!(squad = squad.get(), "attack order for unknown squad");
            return;
        };
        if matches!(self.policy, FormationPolicy::ContinuousCorrection { .. }) {
            out.push(Command::HaltSquadAnchor { squad });
        }
        for (unit, _) in live_members(snapshot, units) {
            if unit == target {
                continue;
            }
            out.push(Command::EngageTarget { unit, target });
            self.engaged.push(unit);
        }
    }

    fn correct_drift(
        &self,
        threshold: f32,
        squads: &SquadView,
        units: &UnitView,
        out: &mut Vec<Command>,
    ) {
        for snapshot in squads.iter() {
            for entry in &snapshot.roster {
                let Some(unit) = units.get(entry.unit) else {
                    continue;
                };
                if matches!(unit.state, UnitState::Dead | UnitState::Attacking)
                    || self.engaged.contains(&unit.id)
                {
                    continue;
                }
                let Some(slot_position) = snapshot.slot_position(entry.slot) else {
                    continue;
                };
                if planar_distance(unit.position, slot_position) > threshold {
                    out.push(Command::ReturnToSlot {
                        unit: unit.id,
                        position: slot_position,
                    });
                }
            }
        }
    }
}

fn live_members<'a>(
    snapshot: &'a SquadSnapshot,
    units: &'a UnitView,
) -> impl Iterator<Item = (UnitId, usize)> + 'a {
    snapshot.roster.iter().filter_map(move |entry| {
        units
            .get(entry.unit)
            .filter(|unit| unit.state.is_alive() && !unit.health.is_dead())
            .map(|_| (entry.unit, entry.slot))
    })
}
