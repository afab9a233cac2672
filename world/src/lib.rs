#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Squad Tactics.
//!
//! The world owns every combat unit and squad. It is mutated exclusively
//! through [`apply`] and observed through the [`query`] module, which keeps
//! the simulation deterministic for a given command sequence.

mod squads;
mod units;

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use squad_tactics_core::{
    Command, DamageOutcome, Event, Health, OrderRejection, SquadId, UnitDescriptor, UnitFactory,
    UnitId, UnitState, Vec3,
};

use crate::{
    squads::{RosterChange, Squad},
    units::{CombatUnit, UnitRegistry},
};

const DEFAULT_DEATH_GRACE: Duration = Duration::from_secs(2);

/// Tunables that shape how the world resolves combat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Delay between a unit's death and its removal from the registry.
    pub death_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            death_grace: DEFAULT_DEATH_GRACE,
        }
    }
}

/// Represents the authoritative Squad Tactics world state.
#[derive(Debug)]
pub struct World {
    config: Config,
    factory: Box<dyn UnitFactory>,
    units: UnitRegistry,
    squads: BTreeMap<SquadId, Squad>,
    next_squad: u32,
    clock: Duration,
}

impl World {
    /// Creates an empty world that builds unit capabilities through `factory`.
    #[must_use]
    pub fn new(factory: Box<dyn UnitFactory>) -> Self {
        Self::with_config(Config::default(), factory)
    }

    /// Creates an empty world with explicit tunables.
    #[must_use]
    pub fn with_config(config: Config, factory: Box<dyn UnitFactory>) -> Self {
        Self {
            config,
            factory,
            units: UnitRegistry::default(),
            squads: BTreeMap::new(),
            next_squad: 0,
            clock: Duration::ZERO,
        }
    }

    fn allocate_squad_id(&mut self) -> SquadId {
        let id = SquadId::new(self.next_squad);
        self.next_squad = self.next_squad.wrapping_add(1);
        id
    }

    fn spawn_unit(
        &mut self,
        descriptor: &Arc<UnitDescriptor>,
        position: Vec3,
    ) -> Result<UnitId, OrderRejection> {
        let health = Health::new(descriptor.max_health).map_err(|_| {
            OrderRejection::InvalidDescriptor {
                card: descriptor.card_name.clone(),
            }
        })?;
        let navigator = self.factory.unit_navigator(descriptor, position);
        let presentation = self.factory.unit_presentation(descriptor);

        let id = self.units.insert_with(|id| {
            CombatUnit::new(id, Arc::clone(descriptor), health, navigator, presentation)
        });
        if let Some(unit) = self.units.get_mut(id) {
            unit.appear();
        }
        tracing::debug!(unit = ?id, card = %descriptor.card_name, "unit spawned");
        Ok(id)
    }

    fn live_unit_mut(&mut self, unit: UnitId) -> Result<&mut CombatUnit, OrderRejection> {
        let combatant = self
            .units
            .get_mut(unit)
            .ok_or(OrderRejection::UnknownUnit(unit))?;
        if combatant.is_alive() {
            Ok(combatant)
        } else {
            Err(OrderRejection::UnitDead(unit))
        }
    }

    fn squad_mut(&mut self, squad: SquadId) -> Result<&mut Squad, OrderRejection> {
        self.squads
            .get_mut(&squad)
            .ok_or(OrderRejection::UnknownSquad(squad))
    }

    fn deploy_squad(
        &mut self,
        descriptor: Arc<UnitDescriptor>,
        anchor: Vec3,
        formation: Vec<Vec3>,
        spawn_points: Vec<Option<Vec3>>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), OrderRejection> {
        check_descriptor(&descriptor)?;

        let squad_id = self.allocate_squad_id();
        let anchor_navigator = self.factory.anchor_navigator(&descriptor, anchor);
        let capacity = usize::try_from(descriptor.squad_size)
            .unwrap_or(usize::MAX)
            .min(formation.len());
        let mut squad = Squad::new(squad_id, Arc::clone(&descriptor), formation, anchor_navigator);

        for (slot, spawn_point) in spawn_points.into_iter().take(capacity).enumerate() {
            let position = match spawn_point {
                Some(position) => position,
                None => {
                    tracing::warn!(
                        squad = squad_id.get(),
                        slot,
                        "no navigable spawn point for formation slot, using the anchor"
                    );
                    out_events.push(Event::SlotFallback {
                        squad: squad_id,
                        slot,
                        anchor,
                    });
                    anchor
                }
            };

            let unit = self.spawn_unit(&descriptor, position)?;
            if let Some(combatant) = self.units.get_mut(unit) {
                combatant.join_squad(Some(squad_id));
            }
            out_events.push(Event::UnitSpawned {
                unit,
                squad: Some(squad_id),
                position,
            });
            if let Ok(RosterChange::Changed) = squad.add_unit(unit, slot) {
                out_events.push(Event::UnitEnlisted {
                    squad: squad_id,
                    unit,
                    slot,
                });
            }
        }

        let _ = self.squads.insert(squad_id, squad);
        tracing::info!(
            squad = squad_id.get(),
            card = %descriptor.card_name,
            "squad deployed"
        );
        out_events.push(Event::SquadDeployed {
            squad: squad_id,
            name: descriptor.card_name.clone(),
            anchor,
            effect: descriptor.deploy_effect.clone(),
            sounds: descriptor.deploy_sounds.clone(),
        });
        Ok(())
    }

    fn damage_unit(
        &mut self,
        target: UnitId,
        amount: i32,
        attacker: Option<UnitId>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), OrderRejection> {
        let despawn_at = self.clock.saturating_add(self.config.death_grace);
        let combatant = self.live_unit_mut(target)?;

        let outcome = combatant
            .health
            .take_damage(amount)
            .map_err(|_| OrderRejection::InvalidDamage {
                unit: target,
                amount,
            })?;

        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Wounded { dealt, remaining } => {
                out_events.push(Event::UnitDamaged {
                    unit: target,
                    attacker,
                    dealt,
                    remaining,
                });
            }
            DamageOutcome::Killed { .. } => {
                combatant.die(despawn_at);
                let squad = combatant.squad();
                if let Some(owner) = squad.and_then(|id| self.squads.get_mut(&id)) {
                    let _ = owner.remove_unit(target);
                }
                tracing::info!(unit = ?target, killer = ?attacker, "unit died");
                out_events.push(Event::UnitDied {
                    unit: target,
                    killer: attacker,
                    squad,
                });
            }
        }
        Ok(())
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        for squad in self.squads.values_mut() {
            squad.advance_anchor(dt);
        }
        for unit in self.units.iter_mut() {
            unit.advance_navigation(dt);
        }

        self.despawn_expired(out_events);

        let now = self.clock;
        for id in self.units.ids() {
            let target_position = self
                .units
                .get(id)
                .and_then(CombatUnit::target)
                .filter(|target| self.units.is_alive(*target))
                .and_then(|target| self.units.get(target))
                .map(CombatUnit::position);

            let Some(strike) = self
                .units
                .get_mut(id)
                .and_then(|unit| unit.tick(now, target_position))
            else {
                continue;
            };

            let outcome = self.damage_unit(strike.target, strike.amount, Some(id), out_events);
            if let Err(reason) = outcome {
                tracing::debug!(unit = ?id, ?reason, "strike had no effect");
            }
        }
    }

    fn despawn_expired(&mut self, out_events: &mut Vec<Event>) {
        let now = self.clock;
        let expired: Vec<UnitId> = self
            .units
            .iter()
            .filter(|unit| unit.despawn_due(now))
            .map(CombatUnit::id)
            .collect();

        for unit in expired {
            if self.units.remove(unit).is_some() {
                tracing::debug!(unit = ?unit, "unit despawned");
                out_events.push(Event::UnitDespawned { unit });
            }
        }
    }

    fn execute(
        &mut self,
        command: Command,
        out_events: &mut Vec<Event>,
    ) -> Result<(), OrderRejection> {
        match command {
            Command::Tick { dt } => self.tick(dt, out_events),
            Command::SpawnUnit {
                descriptor,
                position,
            } => {
                check_descriptor(&descriptor)?;
                let unit = self.spawn_unit(&descriptor, position)?;
                out_events.push(Event::UnitSpawned {
                    unit,
                    squad: None,
                    position,
                });
            }
            Command::DeploySquad {
                descriptor,
                anchor,
                formation,
                spawn_points,
            } => self.deploy_squad(descriptor, anchor, formation, spawn_points, out_events)?,
            Command::MoveUnit { unit, destination } => {
                self.live_unit_mut(unit)?.move_to(destination);
            }
            Command::EngageTarget { unit, target } => {
                if unit == target {
                    return Err(OrderRejection::SelfTarget(unit));
                }
                match self.units.get(target) {
                    None => return Err(OrderRejection::UnknownUnit(target)),
                    Some(combatant) if !combatant.is_alive() => {
                        return Err(OrderRejection::UnitDead(target));
                    }
                    Some(_) => {}
                }
                self.live_unit_mut(unit)?.engage(target);
            }
            Command::ReturnToSlot { unit, position } => {
                let combatant = self.live_unit_mut(unit)?;
                if combatant.state() != UnitState::Attacking {
                    combatant.move_to(position);
                }
            }
            Command::MoveSquadAnchor { squad, destination } => {
                self.squad_mut(squad)?.move_anchor(destination);
            }
            Command::HaltSquadAnchor { squad } => {
                self.squad_mut(squad)?.halt_anchor();
            }
            Command::DamageUnit { unit, amount } => {
                self.damage_unit(unit, amount, None, out_events)?;
            }
            Command::EnlistUnit { squad, unit, slot } => {
                let current = self.live_unit_mut(unit)?.squad();
                if let Some(owner) = current.filter(|owner| *owner != squad) {
                    return Err(OrderRejection::AlreadyEnlisted { unit, squad: owner });
                }
                if self.squad_mut(squad)?.add_unit(unit, slot)? == RosterChange::Changed {
                    self.live_unit_mut(unit)?.join_squad(Some(squad));
                    out_events.push(Event::UnitEnlisted { squad, unit, slot });
                }
            }
            Command::DischargeUnit { squad, unit } => {
                if self.squad_mut(squad)?.remove_unit(unit) == RosterChange::Changed {
                    if let Some(combatant) = self.units.get_mut(unit) {
                        combatant.join_squad(None);
                    }
                    out_events.push(Event::UnitDischarged { squad, unit });
                }
            }
        }
        Ok(())
    }
}

fn check_descriptor(descriptor: &UnitDescriptor) -> Result<(), OrderRejection> {
    let rejection = || OrderRejection::InvalidDescriptor {
        card: descriptor.card_name.clone(),
    };
    if !descriptor.is_spawnable() {
        return Err(rejection());
    }
    descriptor.validate().map_err(|_| rejection())
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands the world cannot honour leave the state untouched and are
/// reported through [`Event::OrderRejected`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if let Err(reason) = world.execute(command, out_events) {
        tracing::debug!(?reason, "command rejected");
        out_events.push(Event::OrderRejected { reason });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Config, World};
    use squad_tactics_core::{SquadId, SquadSnapshot, SquadView, UnitId, UnitSnapshot, UnitView};

    /// Total simulated time elapsed since the world was created.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Tunables the world was created with.
    #[must_use]
    pub fn config(world: &World) -> Config {
        world.config
    }

    /// Captures a read-only view of every registered unit, dead ones included.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(|unit| unit.snapshot()).collect())
    }

    /// Captures a read-only view of every squad.
    #[must_use]
    pub fn squad_view(world: &World) -> SquadView {
        SquadView::from_snapshots(world.squads.values().map(|squad| squad.snapshot()).collect())
    }

    /// Snapshot of a single unit, if the handle is still registered.
    #[must_use]
    pub fn unit(world: &World, unit: UnitId) -> Option<UnitSnapshot> {
        world.units.get(unit).map(|combatant| combatant.snapshot())
    }

    /// Snapshot of a single squad.
    #[must_use]
    pub fn squad(world: &World, squad: SquadId) -> Option<SquadSnapshot> {
        world.squads.get(&squad).map(|owner| owner.snapshot())
    }

    /// Reports whether the handle refers to a registered unit with health left.
    #[must_use]
    pub fn is_alive(world: &World, unit: UnitId) -> bool {
        world.units.is_alive(unit)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use squad_tactics_core::{
        MoveAttackDirection, NavigationPort, Presentation, UnitClass, UnitRarity,
    };

    type CueLog = Rc<RefCell<Vec<&'static str>>>;

    #[derive(Debug)]
    struct TeleportNavigator {
        position: Vec3,
    }

    impl NavigationPort for TeleportNavigator {
        fn set_destination(&mut self, destination: Vec3) {
            self.position = destination;
        }

        fn reset_path(&mut self) {}

        fn current_velocity(&self) -> Vec3 {
            Vec3::ZERO
        }

        fn current_position(&self) -> Vec3 {
            self.position
        }
    }

    #[derive(Debug)]
    struct LoggingPresentation {
        log: CueLog,
    }

    impl Presentation for LoggingPresentation {
        fn play_appear(&mut self) {
            self.log.borrow_mut().push("appear");
        }

        fn play_idle(&mut self) {}

        fn play_move(&mut self) {}

        fn play_attack_idle(&mut self) {}

        fn play_attack_shot(&mut self) {
            self.log.borrow_mut().push("shot");
        }

        fn play_move_attack(&mut self, _direction: MoveAttackDirection) {}

        fn play_death(&mut self) {
            self.log.borrow_mut().push("death");
        }
    }

    #[derive(Debug, Default)]
    struct TestFactory {
        log: CueLog,
    }

    impl UnitFactory for TestFactory {
        fn unit_navigator(
            &mut self,
            _descriptor: &UnitDescriptor,
            position: Vec3,
        ) -> Box<dyn NavigationPort> {
            Box::new(TeleportNavigator { position })
        }

        fn unit_presentation(&mut self, _descriptor: &UnitDescriptor) -> Box<dyn Presentation> {
            Box::new(LoggingPresentation {
                log: Rc::clone(&self.log),
            })
        }

        fn anchor_navigator(
            &mut self,
            _descriptor: &UnitDescriptor,
            position: Vec3,
        ) -> Box<dyn NavigationPort> {
            Box::new(TeleportNavigator { position })
        }
    }

    fn world() -> (World, CueLog) {
        let factory = TestFactory::default();
        let log = Rc::clone(&factory.log);
        (World::new(Box::new(factory)), log)
    }

    fn rifleman(squad_size: u32) -> Arc<UnitDescriptor> {
        Arc::new(UnitDescriptor {
            card_name: "Riflemen".to_owned(),
            unit_name: "Rifleman".to_owned(),
            cost: 3,
            rarity: UnitRarity::Common,
            class: UnitClass::Infantry,
            prototype: Some("rifleman".to_owned()),
            max_health: 100,
            damage: 10,
            attack_range: 5.0,
            attack_rate: 2.0,
            move_speed: 3.0,
            squad_size,
            deploy_time: 0.0,
            deploy_effect: Some("smoke".to_owned()),
            deploy_sounds: vec!["radio".to_owned()],
        })
    }

    fn spawn(world: &mut World, position: Vec3) -> UnitId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnUnit {
                descriptor: rifleman(1),
                position,
            },
            &mut events,
        );
        events
            .iter()
            .find_map(|event| match event {
                Event::UnitSpawned { unit, .. } => Some(*unit),
                _ => None,
            })
            .expect("unit spawned")
    }

    fn tick(world: &mut World, millis: u64) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(millis),
            },
            &mut events,
        );
        events
    }

    fn rejections(events: &[Event]) -> Vec<OrderRejection> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::OrderRejected { reason } => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn spawned_units_play_appear_and_start_idle() {
        let (mut world, log) = world();
        let unit = spawn(&mut world, Vec3::new(1.0, 0.0, 2.0));

        let snapshot = query::unit(&world, unit).expect("snapshot");
        assert_eq!(snapshot.state, UnitState::Idle);
        assert_eq!(snapshot.position, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(snapshot.health.current(), 100);
        assert_eq!(log.borrow().as_slice(), ["appear"]);
    }

    #[test]
    fn stationary_duel_lands_five_hits_in_two_and_a_half_seconds() {
        let (mut world, _) = world();
        let attacker = spawn(&mut world, Vec3::ZERO);
        let target = spawn(&mut world, Vec3::new(3.0, 0.0, 0.0));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::EngageTarget {
                unit: attacker,
                target,
            },
            &mut events,
        );
        assert!(events.is_empty());

        let mut hits = 0;
        for _ in 0..10 {
            hits += tick(&mut world, 250)
                .iter()
                .filter(|event| matches!(event, Event::UnitDamaged { attacker: Some(_), .. }))
                .count();
        }

        assert_eq!(hits, 5);
        let target_health = query::unit(&world, target).expect("target").health;
        assert_eq!(target_health.current(), 50);
        assert_eq!(query::clock(&world), Duration::from_millis(2500));
    }

    #[test]
    fn death_is_announced_once_and_target_dropped_next_tick() {
        let (mut world, log) = world();
        let attacker = spawn(&mut world, Vec3::ZERO);
        let target = spawn(&mut world, Vec3::new(2.0, 0.0, 0.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DamageUnit {
                unit: target,
                amount: 95,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::EngageTarget {
                unit: attacker,
                target,
            },
            &mut events,
        );

        let events = tick(&mut world, 100);
        let deaths: Vec<&Event> = events
            .iter()
            .filter(|event| matches!(event, Event::UnitDied { .. }))
            .collect();
        assert_eq!(
            deaths,
            vec![&Event::UnitDied {
                unit: target,
                killer: Some(attacker),
                squad: None,
            }]
        );
        assert!(!query::is_alive(&world, target));
        assert_eq!(log.borrow().iter().filter(|cue| **cue == "death").count(), 1);

        let events = tick(&mut world, 100);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::UnitDied { .. })));
        let attacker_state = query::unit(&world, attacker).expect("attacker");
        assert_eq!(attacker_state.state, UnitState::Idle);
        assert_eq!(attacker_state.target, None);
    }

    #[test]
    fn dead_units_despawn_after_grace_period() {
        let (mut world, _) = world();
        let unit = spawn(&mut world, Vec3::ZERO);
        let mut events = Vec::new();
        apply(&mut world, Command::DamageUnit { unit, amount: 500 }, &mut events);
        assert!(events.contains(&Event::UnitDied {
            unit,
            killer: None,
            squad: None
        }));

        let events = tick(&mut world, 1900);
        assert!(query::unit(&world, unit).is_some());
        assert!(!events.contains(&Event::UnitDespawned { unit }));

        let events = tick(&mut world, 100);
        assert!(events.contains(&Event::UnitDespawned { unit }));
        assert!(query::unit(&world, unit).is_none());
        assert!(query::unit_view(&world).is_empty());
    }

    #[test]
    fn orders_to_dead_units_are_rejected() {
        let (mut world, _) = world();
        let unit = spawn(&mut world, Vec3::ZERO);
        let other = spawn(&mut world, Vec3::X);
        let mut events = Vec::new();
        apply(&mut world, Command::DamageUnit { unit, amount: 100 }, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::MoveUnit {
                unit,
                destination: Vec3::ONE,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::EngageTarget {
                unit,
                target: other,
            },
            &mut events,
        );
        apply(&mut world, Command::DamageUnit { unit, amount: 5 }, &mut events);

        assert_eq!(
            rejections(&events),
            vec![
                OrderRejection::UnitDead(unit),
                OrderRejection::UnitDead(unit),
                OrderRejection::UnitDead(unit),
            ]
        );
        assert_eq!(
            query::unit(&world, unit).expect("unit").state,
            UnitState::Dead
        );
    }

    #[test]
    fn self_targeting_and_negative_damage_are_rejected() {
        let (mut world, _) = world();
        let unit = spawn(&mut world, Vec3::ZERO);
        let mut events = Vec::new();

        apply(&mut world, Command::EngageTarget { unit, target: unit }, &mut events);
        apply(&mut world, Command::DamageUnit { unit, amount: -10 }, &mut events);

        assert_eq!(
            rejections(&events),
            vec![
                OrderRejection::SelfTarget(unit),
                OrderRejection::InvalidDamage { unit, amount: -10 },
            ]
        );
        assert_eq!(query::unit(&world, unit).expect("unit").health.current(), 100);
    }

    #[test]
    fn zero_damage_broadcasts_nothing() {
        let (mut world, _) = world();
        let unit = spawn(&mut world, Vec3::ZERO);
        let mut events = Vec::new();

        apply(&mut world, Command::DamageUnit { unit, amount: 0 }, &mut events);

        assert!(events.is_empty(), "unexpected events: {events:?}");
        assert_eq!(query::unit(&world, unit).expect("unit").health.current(), 100);
    }

    #[test]
    fn return_to_slot_leaves_attacking_units_alone() {
        let (mut world, _) = world();
        let attacker = spawn(&mut world, Vec3::ZERO);
        let target = spawn(&mut world, Vec3::new(2.0, 0.0, 0.0));
        let idle = spawn(&mut world, Vec3::new(0.0, 0.0, 4.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::EngageTarget {
                unit: attacker,
                target,
            },
            &mut events,
        );

        for unit in [attacker, idle] {
            apply(
                &mut world,
                Command::ReturnToSlot {
                    unit,
                    position: Vec3::new(-8.0, 0.0, 0.0),
                },
                &mut events,
            );
        }

        assert!(rejections(&events).is_empty());
        let attacker = query::unit(&world, attacker).expect("attacker");
        assert_eq!(attacker.state, UnitState::Attacking);
        assert_eq!(attacker.position, Vec3::ZERO);
        let idle = query::unit(&world, idle).expect("idle");
        assert_eq!(idle.state, UnitState::Moving);
        assert_eq!(idle.position, Vec3::new(-8.0, 0.0, 0.0));
    }

    #[test]
    fn deploy_squad_falls_back_to_anchor_for_unresolved_slots() {
        let (mut world, log) = world();
        let anchor = Vec3::new(10.0, 0.0, 10.0);
        let formation = vec![
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DeploySquad {
                descriptor: rifleman(2),
                anchor,
                formation,
                spawn_points: vec![Some(Vec3::new(9.0, 0.0, 10.0)), None],
            },
            &mut events,
        );

        let squad = SquadId::new(0);
        assert!(events.contains(&Event::SlotFallback {
            squad,
            slot: 1,
            anchor
        }));
        assert!(events.contains(&Event::SquadDeployed {
            squad,
            name: "Riflemen".to_owned(),
            anchor,
            effect: Some("smoke".to_owned()),
            sounds: vec!["radio".to_owned()],
        }));

        let snapshot = query::squad(&world, squad).expect("squad");
        assert_eq!(snapshot.roster.len(), 2);
        let positions: Vec<Vec3> = snapshot
            .roster
            .iter()
            .map(|entry| query::unit(&world, entry.unit).expect("member").position)
            .collect();
        assert_eq!(positions, vec![Vec3::new(9.0, 0.0, 10.0), anchor]);
        assert_eq!(log.borrow().iter().filter(|cue| **cue == "appear").count(), 2);
    }

    #[test]
    fn deploy_squad_rejects_descriptors_without_prototype() {
        let (mut world, _) = world();
        let mut descriptor = (*rifleman(1)).clone();
        descriptor.prototype = None;
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::DeploySquad {
                descriptor: Arc::new(descriptor),
                anchor: Vec3::ZERO,
                formation: vec![Vec3::ZERO],
                spawn_points: vec![Some(Vec3::ZERO)],
            },
            &mut events,
        );

        assert_eq!(
            rejections(&events),
            vec![OrderRejection::InvalidDescriptor {
                card: "Riflemen".to_owned()
            }]
        );
        assert!(query::squad_view(&world).into_vec().is_empty());
        assert!(query::unit_view(&world).is_empty());
    }

    #[test]
    fn killed_members_leave_the_roster_but_keep_slots_vacant() {
        let (mut world, _) = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DeploySquad {
                descriptor: rifleman(3),
                anchor: Vec3::ZERO,
                formation: vec![Vec3::X, Vec3::Z, -Vec3::X],
                spawn_points: vec![Some(Vec3::X), Some(Vec3::Z), Some(-Vec3::X)],
            },
            &mut events,
        );
        let squad = SquadId::new(0);
        let victim = query::squad(&world, squad).expect("squad").roster[1].unit;

        events.clear();
        apply(
            &mut world,
            Command::DamageUnit {
                unit: victim,
                amount: 100,
            },
            &mut events,
        );
        assert!(events.contains(&Event::UnitDied {
            unit: victim,
            killer: None,
            squad: Some(squad)
        }));

        let slots: Vec<usize> = query::squad(&world, squad)
            .expect("squad")
            .roster
            .iter()
            .map(|entry| entry.slot)
            .collect();
        assert_eq!(slots, vec![0, 2]);
    }

    #[test]
    fn enlist_and_discharge_are_idempotent() {
        let (mut world, _) = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DeploySquad {
                descriptor: rifleman(1),
                anchor: Vec3::ZERO,
                formation: vec![Vec3::X, -Vec3::X],
                spawn_points: vec![Some(Vec3::X)],
            },
            &mut events,
        );
        let squad = SquadId::new(0);
        let recruit = spawn(&mut world, Vec3::new(5.0, 0.0, 0.0));

        events.clear();
        for _ in 0..2 {
            apply(
                &mut world,
                Command::EnlistUnit {
                    squad,
                    unit: recruit,
                    slot: 1,
                },
                &mut events,
            );
        }
        assert_eq!(
            events,
            vec![Event::UnitEnlisted {
                squad,
                unit: recruit,
                slot: 1
            }]
        );
        assert_eq!(
            query::unit(&world, recruit).expect("recruit").squad,
            Some(squad)
        );

        events.clear();
        for _ in 0..2 {
            apply(
                &mut world,
                Command::DischargeUnit {
                    squad,
                    unit: recruit,
                },
                &mut events,
            );
        }
        assert_eq!(
            events,
            vec![Event::UnitDischarged {
                squad,
                unit: recruit
            }]
        );
        assert_eq!(query::unit(&world, recruit).expect("recruit").squad, None);
    }

    #[test]
    fn unknown_squads_are_rejected() {
        let (mut world, _) = world();
        let mut events = Vec::new();
        let squad = SquadId::new(7);

        apply(&mut world, Command::HaltSquadAnchor { squad }, &mut events);

        assert_eq!(rejections(&events), vec![OrderRejection::UnknownSquad(squad)]);
    }
}
