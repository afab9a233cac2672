//! Combat unit state machine and the liveness-checked registry that owns units.

use std::{sync::Arc, time::Duration};

use squad_tactics_core::{
    planar, Health, MoveAttackDirection, NavigationPort, Presentation, SquadId, UnitDescriptor,
    UnitId, UnitSnapshot, UnitState, Vec3, VELOCITY_EPSILON,
};

/// Damage a unit decided to deal during its tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Strike {
    pub(crate) target: UnitId,
    pub(crate) amount: i32,
}

/// A single deployed combatant.
#[derive(Debug)]
pub(crate) struct CombatUnit {
    id: UnitId,
    descriptor: Arc<UnitDescriptor>,
    pub(crate) health: Health,
    state: UnitState,
    target: Option<UnitId>,
    next_attack_at: Duration,
    facing: Vec3,
    squad: Option<SquadId>,
    navigator: Box<dyn NavigationPort>,
    presentation: Box<dyn Presentation>,
    despawn_at: Option<Duration>,
}

impl CombatUnit {
    pub(crate) fn new(
        id: UnitId,
        descriptor: Arc<UnitDescriptor>,
        health: Health,
        navigator: Box<dyn NavigationPort>,
        presentation: Box<dyn Presentation>,
    ) -> Self {
        Self {
            id,
            descriptor,
            health,
            state: UnitState::Idle,
            target: None,
            next_attack_at: Duration::ZERO,
            facing: Vec3::Z,
            squad: None,
            navigator,
            presentation,
            despawn_at: None,
        }
    }

    pub(crate) fn id(&self) -> UnitId {
        self.id
    }

    pub(crate) fn state(&self) -> UnitState {
        self.state
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.state.is_alive() && !self.health.is_dead()
    }

    pub(crate) fn target(&self) -> Option<UnitId> {
        self.target
    }

    pub(crate) fn squad(&self) -> Option<SquadId> {
        self.squad
    }

    pub(crate) fn join_squad(&mut self, squad: Option<SquadId>) {
        self.squad = squad;
    }

    pub(crate) fn position(&self) -> Vec3 {
        self.navigator.current_position()
    }

    pub(crate) fn advance_navigation(&mut self, dt: Duration) {
        self.navigator.advance(dt);
    }

    pub(crate) fn appear(&mut self) {
        self.presentation.play_appear();
    }

    pub(crate) fn despawn_due(&self, now: Duration) -> bool {
        self.despawn_at.is_some_and(|at| now >= at)
    }

    /// Travels to `destination`, abandoning any target.
    pub(crate) fn move_to(&mut self, destination: Vec3) {
        if !self.state.is_alive() {
            return;
        }
        self.navigator.set_destination(destination);
        self.state = UnitState::Moving;
        self.target = None;
    }

    /// Starts pursuing `target`, dropping any pending move destination.
    ///
    /// Staleness is checked on the next tick.
    pub(crate) fn engage(&mut self, target: UnitId) {
        if !self.state.is_alive() {
            return;
        }
        self.navigator.reset_path();
        self.target = Some(target);
        self.state = UnitState::Attacking;
    }

    /// Enters the terminal state and schedules removal at `despawn_at`.
    pub(crate) fn die(&mut self, despawn_at: Duration) {
        if !self.state.is_alive() {
            return;
        }
        self.state = UnitState::Dead;
        self.target = None;
        self.navigator.reset_path();
        self.presentation.play_death();
        self.despawn_at = Some(despawn_at);
    }

    /// Runs one tick of the state machine.
    ///
    /// `target_position` is `Some` only when the current target is still
    /// registered and alive.
    pub(crate) fn tick(&mut self, now: Duration, target_position: Option<Vec3>) -> Option<Strike> {
        match self.state {
            UnitState::Idle => {
                self.presentation.play_idle();
                None
            }
            UnitState::Moving => {
                if self.in_motion() {
                    self.presentation.play_move();
                } else {
                    self.state = UnitState::Idle;
                }
                None
            }
            UnitState::Attacking => self.tick_attacking(now, target_position),
            UnitState::Dead => None,
        }
    }

    fn tick_attacking(&mut self, now: Duration, target_position: Option<Vec3>) -> Option<Strike> {
        let (Some(target), Some(target_position)) = (self.target, target_position) else {
            self.state = UnitState::Idle;
            self.target = None;
            return None;
        };

        let to_target = planar(target_position - self.navigator.current_position());
        if let Some(direction) = to_target.try_normalize() {
            self.facing = direction;
        }
        let distance = to_target.length();
        let range = self.descriptor.attack_range;

        if self.in_motion() {
            if distance > range {
                self.navigator.set_destination(target_position);
            }
            let direction =
                MoveAttackDirection::classify(self.facing, self.navigator.current_velocity());
            self.presentation.play_move_attack(direction);
            return None;
        }

        self.navigator.reset_path();

        if distance > range {
            self.navigator.set_destination(target_position);
            return None;
        }

        self.presentation.play_attack_idle();

        let interval = self.descriptor.attack_interval()?;
        if now < self.next_attack_at {
            return None;
        }

        self.presentation.play_attack_shot();
        self.next_attack_at = now.saturating_add(interval);
        Some(Strike {
            target,
            amount: self.descriptor.damage,
        })
    }

    fn in_motion(&self) -> bool {
        self.navigator.current_velocity().length() > VELOCITY_EPSILON
    }

    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            squad: self.squad,
            state: self.state,
            position: self.navigator.current_position(),
            velocity: self.navigator.current_velocity(),
            facing: self.facing,
            target: self.target,
            health: self.health,
        }
    }
}

#[derive(Debug, Default)]
struct RegistrySlot {
    generation: u32,
    unit: Option<CombatUnit>,
}

/// Generational storage that hands out [`UnitId`] handles.
///
/// Removing a unit bumps its slot generation, so stale handles resolve to
/// nothing instead of to whichever unit reuses the slot.
#[derive(Debug, Default)]
pub(crate) struct UnitRegistry {
    slots: Vec<RegistrySlot>,
    free: Vec<u32>,
}

impl UnitRegistry {
    pub(crate) fn insert_with(&mut self, build: impl FnOnce(UnitId) -> CombatUnit) -> UnitId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(RegistrySlot::default());
                u32::try_from(self.slots.len() - 1).unwrap_or(u32::MAX)
            }
        };

        let slot = &mut self.slots[index as usize];
        let id = UnitId::new(index, slot.generation);
        slot.unit = Some(build(id));
        id
    }

    pub(crate) fn get(&self, id: UnitId) -> Option<&CombatUnit> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.unit.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut CombatUnit> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.unit.as_mut())
    }

    pub(crate) fn remove(&mut self, id: UnitId) -> Option<CombatUnit> {
        let slot = self
            .slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())?;
        let unit = slot.unit.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        Some(unit)
    }

    /// Reports whether `id` refers to a registered unit whose health is intact.
    pub(crate) fn is_alive(&self, id: UnitId) -> bool {
        self.get(id).is_some_and(CombatUnit::is_alive)
    }

    /// Handles of every registered unit in ascending order.
    pub(crate) fn ids(&self) -> Vec<UnitId> {
        self.iter().map(CombatUnit::id).collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &CombatUnit> {
        self.slots.iter().filter_map(|slot| slot.unit.as_ref())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut CombatUnit> {
        self.slots.iter_mut().filter_map(|slot| slot.unit.as_mut())
    }
}
