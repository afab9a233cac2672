use std::time::Duration;

use squad_tactics_core::{Command, Event};
use squad_tactics_system_deployment::{
    Config as DeploymentConfig, Deployment, DeploymentContext, DeploymentInput,
};
use squad_tactics_system_formation::{Formation, FormationPolicy, SquadOrder};
use squad_tactics_world::{self as world, query, Config as WorldConfig, World};

use crate::{battlefield::Battlefield, factory::HeadlessFactory, presentation::CueLog};

/// Tunables for every component the driver owns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    /// World tunables.
    pub world: WorldConfig,
    /// Formation policy applied to every squad.
    pub formation: FormationPolicy,
    /// Placement and spawn tunables.
    pub deployment: DeploymentConfig,
}

/// Drives the world and systems in a fixed order once per step.
///
/// A step ticks the world, lets the formation system react to the post-tick
/// unit states, advances the deployment system and finally applies every
/// command the systems emitted.
#[derive(Debug)]
pub struct Simulation<C> {
    world: World,
    formation: Formation,
    deployment: Deployment<C>,
    events: Vec<Event>,
    commands: Vec<Command>,
    steps: u64,
}

impl Simulation<Battlefield> {
    /// Builds a simulation backed by the in-memory ports.
    ///
    /// Returns the cue log every spawned unit records into.
    #[must_use]
    pub fn headless(settings: Settings, battlefield: Battlefield) -> (Self, CueLog) {
        let factory = HeadlessFactory::new();
        let cues = factory.cues();
        let world = World::with_config(settings.world, Box::new(factory));
        let simulation = Self::new(
            world,
            Formation::new(settings.formation),
            Deployment::new(settings.deployment, battlefield),
        );
        (simulation, cues)
    }
}

impl<C: DeploymentContext> Simulation<C> {
    /// Wires pre-built components together.
    #[must_use]
    pub fn new(world: World, formation: Formation, deployment: Deployment<C>) -> Self {
        Self {
            world,
            formation,
            deployment,
            events: Vec::new(),
            commands: Vec::new(),
            steps: 0,
        }
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Formation system.
    #[must_use]
    pub fn formation(&self) -> &Formation {
        &self.formation
    }

    /// Deployment system.
    #[must_use]
    pub fn deployment(&self) -> &Deployment<C> {
        &self.deployment
    }

    /// Mutable deployment system, used to open sessions or drive drag gestures.
    pub fn deployment_mut(&mut self) -> &mut Deployment<C> {
        &mut self.deployment
    }

    /// Number of steps taken so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Commands the systems emitted during the last step.
    #[must_use]
    pub fn last_commands(&self) -> &[Command] {
        &self.commands
    }

    /// Applies a single command outside the step cycle.
    pub fn issue(&mut self, command: Command) -> &[Event] {
        self.events.clear();
        world::apply(&mut self.world, command, &mut self.events);
        &self.events
    }

    /// Advances the simulation by `dt`, returning every event it produced.
    pub fn step(
        &mut self,
        dt: Duration,
        input: DeploymentInput,
        orders: &[SquadOrder],
    ) -> &[Event] {
        self.events.clear();
        self.commands.clear();
        self.steps = self.steps.saturating_add(1);

        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        let squads = query::squad_view(&self.world);
        let units = query::unit_view(&self.world);
        self.formation
            .handle(&self.events, orders, &squads, &units, &mut self.commands);
        self.deployment.handle(&self.events, input, &mut self.commands);

        for command in self.commands.iter().cloned() {
            world::apply(&mut self.world, command, &mut self.events);
        }

        tracing::trace!(
            step = self.steps,
            events = self.events.len(),
            commands = self.commands.len(),
            "simulation step"
        );
        &self.events
    }
}
