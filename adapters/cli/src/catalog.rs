//! Versioned TOML catalog describing deployable units and run settings.

use std::{collections::HashSet, fs, path::Path, sync::Arc, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use squad_tactics_core::{UnitDescriptor, Vec3};
use squad_tactics_headless::Settings;
use squad_tactics_system_deployment::{default_formation, Config as DeploymentConfig};
use squad_tactics_system_formation::FormationPolicy;
use squad_tactics_world::Config as WorldConfig;

const SUPPORTED_CATALOG_VERSION: u32 = 1;
const DEFAULT_TICK_MS: u64 = 50;
const DEFAULT_TICKS: u32 = 1_200;
const DEFAULT_DEATH_GRACE_SECS: f32 = 2.0;
const DEFAULT_BATTLEFIELD_HALF_SIZE: f32 = 40.0;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: u32,
    #[serde(default)]
    simulation: SimulationSection,
    #[serde(default)]
    formation: FormationSection,
    #[serde(default)]
    units: Vec<UnitDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SimulationSection {
    tick_ms: u64,
    ticks: u32,
    death_grace_secs: f32,
    battlefield_half_size: f32,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            ticks: DEFAULT_TICKS,
            death_grace_secs: DEFAULT_DEATH_GRACE_SECS,
            battlefield_half_size: DEFAULT_BATTLEFIELD_HALF_SIZE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FormationSection {
    #[serde(default)]
    policy: FormationPolicy,
    #[serde(default)]
    slots: Option<Vec<[f32; 3]>>,
}

/// Validated catalog contents.
#[derive(Clone, Debug)]
pub(crate) struct Catalog {
    settings: Settings,
    tick: Duration,
    ticks: u32,
    battlefield_half_size: f32,
    units: Vec<Arc<UnitDescriptor>>,
}

impl Catalog {
    /// Reads and validates the catalog stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read unit catalog {}", path.display()))?;
        parse_catalog(&contents)
            .with_context(|| format!("invalid unit catalog {}", path.display()))
    }

    /// Component settings assembled from the catalog.
    pub(crate) fn settings(&self) -> Settings {
        self.settings.clone()
    }

    /// Simulated time covered by one step.
    pub(crate) fn tick(&self) -> Duration {
        self.tick
    }

    /// Number of steps a run lasts.
    pub(crate) fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Half of the square battlefield's side length.
    pub(crate) fn battlefield_half_size(&self) -> f32 {
        self.battlefield_half_size
    }

    /// Descriptors in catalog order.
    pub(crate) fn units(&self) -> &[Arc<UnitDescriptor>] {
        &self.units
    }

    /// Looks up a descriptor by its card name.
    pub(crate) fn unit(&self, card: &str) -> Result<Arc<UnitDescriptor>> {
        self.units
            .iter()
            .find(|descriptor| descriptor.card_name == card)
            .cloned()
            .with_context(|| format!("catalog has no card named `{card}`"))
    }

    /// Overrides the formation policy declared in the file.
    pub(crate) fn set_policy(&mut self, policy: FormationPolicy) -> Result<()> {
        check_policy(policy)?;
        self.settings.formation = policy;
        Ok(())
    }

    /// Overrides the step length declared in the file.
    pub(crate) fn set_tick(&mut self, tick: Duration) {
        self.tick = tick;
    }

    /// Overrides the run length declared in the file.
    pub(crate) fn set_ticks(&mut self, ticks: u32) {
        self.ticks = ticks;
    }
}

/// Parses and validates catalog `contents`.
pub(crate) fn parse_catalog(contents: &str) -> Result<Catalog> {
    let file: CatalogFile =
        toml::from_str(contents).context("failed to parse unit catalog toml contents")?;
    if file.version != SUPPORTED_CATALOG_VERSION {
        bail!(
            "unsupported unit catalog version {}; expected {}",
            file.version,
            SUPPORTED_CATALOG_VERSION
        );
    }

    let simulation = file.simulation;
    ensure!(simulation.tick_ms > 0, "tick_ms must be positive");
    ensure!(
        simulation.battlefield_half_size.is_finite() && simulation.battlefield_half_size > 0.0,
        "battlefield_half_size must be positive, got {}",
        simulation.battlefield_half_size
    );
    let death_grace = Duration::try_from_secs_f32(simulation.death_grace_secs).with_context(
        || {
            format!(
                "death_grace_secs must be a non-negative number, got {}",
                simulation.death_grace_secs
            )
        },
    )?;

    check_policy(file.formation.policy)?;
    let formation = match file.formation.slots {
        Some(slots) => {
            ensure!(!slots.is_empty(), "formation must declare at least one slot");
            slots.into_iter().map(Vec3::from_array).collect()
        }
        None => default_formation(),
    };

    let mut names = HashSet::new();
    let mut units = Vec::with_capacity(file.units.len());
    for descriptor in file.units {
        descriptor
            .validate()
            .with_context(|| format!("unit `{}` failed validation", descriptor.card_name))?;
        if !names.insert(descriptor.card_name.clone()) {
            bail!(
                "unit catalog contains duplicate card `{}`",
                descriptor.card_name
            );
        }
        units.push(Arc::new(descriptor));
    }
    if units.is_empty() {
        bail!("unit catalog declares no units");
    }

    Ok(Catalog {
        settings: Settings {
            world: WorldConfig { death_grace },
            formation: file.formation.policy,
            deployment: DeploymentConfig {
                formation,
                ..DeploymentConfig::default()
            },
        },
        tick: Duration::from_millis(simulation.tick_ms),
        ticks: simulation.ticks,
        battlefield_half_size: simulation.battlefield_half_size,
        units,
    })
}

fn check_policy(policy: FormationPolicy) -> Result<()> {
    if let FormationPolicy::ContinuousCorrection { threshold } = policy {
        ensure!(
            threshold.is_finite() && threshold > 0.0,
            "continuous correction threshold must be positive, got {threshold}"
        );
    }
    Ok(())
}
