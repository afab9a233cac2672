#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs scripted squad battles headlessly.

mod catalog;
mod patrol;
mod scenario;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use squad_tactics_core::UnitDescriptor;
use squad_tactics_system_formation::{FormationPolicy, DEFAULT_CORRECTION_THRESHOLD};
use tracing_subscriber::EnvFilter;

use crate::{
    catalog::Catalog,
    scenario::{patrol, Skirmish},
};

/// Runs scripted squad battles without a renderer.
#[derive(Parser, Debug)]
#[command(name = "squad-tactics")]
#[command(about = "Deploy squads from a unit catalog and let them fight headlessly")]
struct Args {
    /// Unit catalog to load.
    #[arg(long, default_value = "assets/catalog.toml")]
    catalog: PathBuf,

    /// Scripted run to perform.
    #[arg(long, value_enum, default_value_t = ScenarioKind::Skirmish)]
    scenario: ScenarioKind,

    /// Card deployed first; defaults to the first card in the catalog.
    #[arg(long)]
    blue: Option<String>,

    /// Opposing card; defaults to the second card in the catalog.
    #[arg(long)]
    red: Option<String>,

    /// Number of steps to simulate, overriding the catalog.
    #[arg(long)]
    ticks: Option<u32>,

    /// Milliseconds of simulated time per step, overriding the catalog.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Formation policy, overriding the catalog.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Planar distance that triggers a slot correction under the continuous policy.
    #[arg(long, default_value_t = DEFAULT_CORRECTION_THRESHOLD)]
    threshold: f32,

    /// Seed for the patrol driver.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ScenarioKind {
    /// Two squads fight until one is wiped out.
    Skirmish,
    /// A single squad wanders between random points.
    Patrol,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    /// Members move once to their offset around the destination.
    Snapshot,
    /// Members are pulled back to their slots every step.
    Continuous,
}

impl PolicyArg {
    fn into_policy(self, threshold: f32) -> FormationPolicy {
        match self {
            Self::Snapshot => FormationPolicy::SnapshotOffsets,
            Self::Continuous => FormationPolicy::ContinuousCorrection { threshold },
        }
    }
}

/// Entry point for the Squad Tactics command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut catalog = Catalog::load(&args.catalog)?;
    if let Some(policy) = args.policy {
        catalog
            .set_policy(policy.into_policy(args.threshold))
            .context("invalid --policy/--threshold override")?;
    }
    if let Some(tick_ms) = args.tick_ms {
        catalog.set_tick(Duration::from_millis(tick_ms.max(1)));
    }
    if let Some(ticks) = args.ticks {
        catalog.set_ticks(ticks);
    }

    let blue = pick_card(&catalog, args.blue.as_deref(), 0)?;
    tracing::info!(
        scenario = ?args.scenario,
        policy = ?catalog.settings().formation,
        ticks = catalog.ticks(),
        "starting run"
    );
    match args.scenario {
        ScenarioKind::Skirmish => {
            let red = pick_card(&catalog, args.red.as_deref(), 1)?;
            let report = Skirmish::new(&catalog, blue, red)?.run();
            println!("{report}");
        }
        ScenarioKind::Patrol => {
            let report = patrol(&catalog, &blue, args.seed)?;
            println!("{report}");
        }
    }
    Ok(())
}

/// Resolves a card by name, falling back to the catalog entry at `fallback`.
fn pick_card(
    catalog: &Catalog,
    name: Option<&str>,
    fallback: usize,
) -> Result<Arc<UnitDescriptor>> {
    match name {
        Some(name) => catalog.unit(name),
        None => catalog
            .units()
            .get(fallback)
            .or_else(|| catalog.units().first())
            .cloned()
            .context("unit catalog declares no units"),
    }
}
