//! Scripted runs driven by the command-line binary.

use std::{fmt, sync::Arc, time::Duration};

use anyhow::{ensure, Context, Result};
use squad_tactics_core::{Event, SquadId, UnitDescriptor, UnitId, Vec2, Vec3};
use squad_tactics_headless::{Battlefield, Cue, CueLog, Simulation};
use squad_tactics_system_deployment::DeploymentInput;
use squad_tactics_system_formation::SquadOrder;
use squad_tactics_world::{query, World};

use crate::{catalog::Catalog, patrol::PatrolDriver};

/// Queues a deployment of `card` at `pointer` through the placement flow.
fn place(
    simulation: &mut Simulation<Battlefield>,
    card: &Arc<UnitDescriptor>,
    pointer: Vec2,
) -> Result<()> {
    let deployment = simulation.deployment_mut();
    deployment
        .begin_placement(Arc::clone(card))
        .with_context(|| format!("cannot deploy `{}`", card.card_name))?;
    deployment.update_preview(Some(pointer));
    ensure!(
        deployment.confirm(),
        "placement of `{}` at ({}, {}) is blocked",
        card.card_name,
        pointer.x,
        pointer.y
    );
    Ok(())
}

/// Outcome of one side of a skirmish.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SideReport {
    card: String,
    deployed: bool,
    survivors: usize,
    remaining_health: u32,
}

/// Summary printed once a skirmish ends.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SkirmishReport {
    steps: u64,
    elapsed: Duration,
    shots: usize,
    deaths: usize,
    sides: [SideReport; 2],
}

impl SkirmishReport {
    /// Card name of the only side with survivors, if the fight was decided.
    pub(crate) fn winner(&self) -> Option<&str> {
        match (self.sides[0].survivors, self.sides[1].survivors) {
            (0, 0) => None,
            (_, 0) if self.sides[1].deployed => Some(self.sides[0].card.as_str()),
            (0, _) if self.sides[0].deployed => Some(self.sides[1].card.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for SkirmishReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "skirmish ended after {} steps ({:.1}s simulated)",
            self.steps,
            self.elapsed.as_secs_f32()
        )?;
        for side in &self.sides {
            writeln!(
                f,
                "  {:<20} deployed: {:<5} survivors: {:<3} health left: {}",
                side.card, side.deployed, side.survivors, side.remaining_health
            )?;
        }
        writeln!(f, "  shots fired: {}, deaths: {}", self.shots, self.deaths)?;
        match self.winner() {
            Some(card) => write!(f, "  winner: {card}"),
            None => write!(f, "  no winner"),
        }
    }
}

#[derive(Debug)]
struct Side {
    card: Arc<UnitDescriptor>,
    placement: Vec2,
    squad: Option<SquadId>,
    target: Option<UnitId>,
}

impl Side {
    fn new(card: Arc<UnitDescriptor>, placement: Vec2) -> Self {
        Self {
            card,
            placement,
            squad: None,
            target: None,
        }
    }

    fn placement_point(&self) -> Vec3 {
        Vec3::new(self.placement.x, 0.0, self.placement.y)
    }

    fn survivors(&self, world: &World) -> usize {
        self.squad
            .and_then(|squad| query::squad(world, squad))
            .map_or(0, |squad| squad.roster.len())
    }

    fn report(&self, world: &World) -> SideReport {
        let roster = self
            .squad
            .and_then(|squad| query::squad(world, squad))
            .map(|squad| squad.roster)
            .unwrap_or_default();
        let remaining_health = roster
            .iter()
            .filter_map(|entry| query::unit(world, entry.unit))
            .map(|unit| unit.health.current())
            .sum();
        SideReport {
            card: self.card.card_name.clone(),
            deployed: self.squad.is_some(),
            survivors: roster.len(),
            remaining_health,
        }
    }
}

/// Two squads deployed on opposite ends of the battlefield fight until one is wiped out.
#[derive(Debug)]
pub(crate) struct Skirmish {
    simulation: Simulation<Battlefield>,
    cues: CueLog,
    tick: Duration,
    ticks: u32,
    sides: [Side; 2],
    deaths: usize,
}

impl Skirmish {
    /// Queues both deployments.
    pub(crate) fn new(
        catalog: &Catalog,
        blue: Arc<UnitDescriptor>,
        red: Arc<UnitDescriptor>,
    ) -> Result<Self> {
        let half_size = catalog.battlefield_half_size();
        let (mut simulation, cues) =
            Simulation::headless(catalog.settings(), Battlefield::new(half_size));
        let offset = half_size * 0.25;
        let sides = [
            Side::new(blue, Vec2::new(-offset, 0.0)),
            Side::new(red, Vec2::new(offset, 0.0)),
        ];
        for side in &sides {
            place(&mut simulation, &side.card, side.placement)?;
        }

        Ok(Self {
            simulation,
            cues,
            tick: catalog.tick(),
            ticks: catalog.ticks(),
            sides,
            deaths: 0,
        })
    }

    /// Steps the simulation until one side is wiped out or the step budget runs out.
    pub(crate) fn run(mut self) -> SkirmishReport {
        for _ in 0..self.ticks {
            let orders = self.plan_orders();
            let events = self
                .simulation
                .step(self.tick, DeploymentInput::default(), &orders);
            for event in events {
                match event {
                    Event::SquadDeployed { squad, anchor, .. } => {
                        claim_squad(&mut self.sides, *squad, *anchor);
                    }
                    Event::UnitDied { .. } => self.deaths += 1,
                    _ => {}
                }
            }
            if self.is_decided() {
                break;
            }
        }

        let world = self.simulation.world();
        SkirmishReport {
            steps: self.simulation.steps(),
            elapsed: query::clock(world),
            shots: self.cues.count(Cue::AttackShot),
            deaths: self.deaths,
            sides: [self.sides[0].report(world), self.sides[1].report(world)],
        }
    }

    fn is_decided(&self) -> bool {
        let world = self.simulation.world();
        self.sides.iter().all(|side| side.squad.is_some())
            && self.sides.iter().any(|side| side.survivors(world) == 0)
    }

    /// Points each squad at the enemy member closest to its anchor whenever
    /// its previous target is gone.
    fn plan_orders(&mut self) -> Vec<SquadOrder> {
        let world = self.simulation.world();
        let squads = [self.sides[0].squad, self.sides[1].squad];
        let mut orders = Vec::new();
        for (index, side) in self.sides.iter_mut().enumerate() {
            let (Some(own), Some(enemy)) = (squads[index], squads[1 - index]) else {
                continue;
            };
            if side
                .target
                .is_some_and(|target| query::is_alive(world, target))
            {
                continue;
            }

            side.target = nearest_member(world, own, enemy);
            if let Some(target) = side.target {
                orders.push(SquadOrder::Attack { squad: own, target });
            }
        }
        orders
    }
}

fn claim_squad(sides: &mut [Side; 2], squad: SquadId, anchor: Vec3) {
    let unclaimed = sides
        .iter_mut()
        .filter(|side| side.squad.is_none())
        .min_by(|a, b| {
            a.placement_point()
                .distance_squared(anchor)
                .total_cmp(&b.placement_point().distance_squared(anchor))
        });
    if let Some(side) = unclaimed {
        side.squad = Some(squad);
    }
}

fn nearest_member(world: &World, own: SquadId, enemy: SquadId) -> Option<UnitId> {
    let origin = query::squad(world, own)?.anchor;
    query::squad(world, enemy)?
        .roster
        .iter()
        .filter_map(|entry| query::unit(world, entry.unit))
        .min_by(|a, b| {
            a.position
                .distance_squared(origin)
                .total_cmp(&b.position.distance_squared(origin))
        })
        .map(|unit| unit.id)
}

/// Summary printed once a patrol run ends.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PatrolReport {
    card: String,
    steps: u64,
    orders: usize,
    anchor: Option<Vec3>,
}

impl fmt::Display for PatrolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "patrol of `{}` ran {} steps and issued {} move orders",
            self.card, self.steps, self.orders
        )?;
        match self.anchor {
            Some(anchor) => write!(f, "  final anchor: ({:.2}, {:.2})", anchor.x, anchor.z),
            None => write!(f, "  squad never deployed"),
        }
    }
}

/// Deploys one squad at the centre and lets a [`PatrolDriver`] move it around.
pub(crate) fn patrol(
    catalog: &Catalog,
    card: &Arc<UnitDescriptor>,
    seed: u64,
) -> Result<PatrolReport> {
    let battlefield = Battlefield::new(catalog.battlefield_half_size());
    let (mut simulation, _) = Simulation::headless(catalog.settings(), battlefield);
    place(&mut simulation, card, Vec2::ZERO)?;

    let tick = catalog.tick();
    let mut driver: Option<PatrolDriver> = None;
    let mut orders = 0;
    for _ in 0..catalog.ticks() {
        let order = driver
            .as_mut()
            .and_then(|driver| driver.update(tick, simulation.deployment().context()));
        orders += usize::from(order.is_some());
        let events = simulation.step(tick, DeploymentInput::default(), order.as_slice());
        if driver.is_none() {
            driver = events.iter().find_map(|event| match event {
                Event::SquadDeployed { squad, anchor, .. } => {
                    Some(PatrolDriver::new(*squad, *anchor, seed))
                }
                _ => None,
            });
        }
    }

    let world = simulation.world();
    let anchor = query::squad_view(world)
        .iter()
        .next()
        .map(|squad| squad.anchor);
    Ok(PatrolReport {
        card: card.card_name.clone(),
        steps: simulation.steps(),
        orders,
        anchor,
    })
}
