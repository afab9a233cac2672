//! Immutable unit descriptors loaded from static configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad category a unit belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    /// Soldiers on foot.
    Infantry,
    /// Light wheeled vehicles.
    Vehicle,
    /// Tracked armour.
    Tank,
    /// Static structures that never move.
    Building,
}

/// Card rarity displayed by the selection UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitRarity {
    /// Baseline rarity.
    #[default]
    Common,
    /// Uncommon cards.
    Rare,
    /// Elite cards.
    Elite,
    /// Highest rarity tier.
    Epic,
}

/// Static description of a deployable unit type.
///
/// Descriptors are shared between every unit spawned from them and are never
/// mutated once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    /// Name shown on the deployment card and given to spawned squads.
    pub card_name: String,
    /// Name given to each individual unit.
    pub unit_name: String,
    /// Deployment cost of the card.
    #[serde(default)]
    pub cost: u32,
    /// Rarity tier of the card.
    #[serde(default)]
    pub rarity: UnitRarity,
    /// Category of the unit.
    pub class: UnitClass,
    /// Key of the spawnable prototype; descriptors without one cannot be deployed.
    #[serde(default)]
    pub prototype: Option<String>,
    /// Maximum health of a freshly spawned unit.
    pub max_health: u32,
    /// Damage applied by a single shot.
    pub damage: i32,
    /// Planar distance within which the unit may fire.
    pub attack_range: f32,
    /// Shots per second.
    pub attack_rate: f32,
    /// Travel speed in world units per second. Buildings use zero.
    pub move_speed: f32,
    /// Number of units spawned per deployment.
    #[serde(default = "default_squad_size")]
    pub squad_size: u32,
    /// Seconds between confirming a deployment and the squad appearing.
    pub deploy_time: f32,
    /// Effect key played at the deployment position once the squad spawns.
    #[serde(default)]
    pub deploy_effect: Option<String>,
    /// Sound keys played at the deployment position once the squad spawns.
    #[serde(default)]
    pub deploy_sounds: Vec<String>,
}

const fn default_squad_size() -> u32 {
    1
}

impl UnitDescriptor {
    /// Reports whether the descriptor references a spawnable prototype.
    #[must_use]
    pub fn is_spawnable(&self) -> bool {
        self.prototype.is_some()
    }

    /// Minimum simulated time between two consecutive shots.
    ///
    /// Returns `None` when the unit never fires.
    #[must_use]
    pub fn attack_interval(&self) -> Option<Duration> {
        if !self.attack_rate.is_finite() || self.attack_rate <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(1.0 / f64::from(self.attack_rate)).ok()
    }

    /// Delay between confirming a deployment and the squad spawning.
    #[must_use]
    pub fn deploy_delay(&self) -> Duration {
        Duration::try_from_secs_f32(self.deploy_time).unwrap_or(Duration::ZERO)
    }

    /// Checks the descriptor for values the simulation cannot honour.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.max_health == 0 {
            return Err(DescriptorError::ZeroHealth {
                card: self.card_name.clone(),
            });
        }

        if self.damage < 0 {
            return Err(DescriptorError::NegativeDamage {
                card: self.card_name.clone(),
                damage: self.damage,
            });
        }

        if self.squad_size == 0 {
            return Err(DescriptorError::EmptySquad {
                card: self.card_name.clone(),
            });
        }

        let stats = [
            ("attack_range", self.attack_range),
            ("attack_rate", self.attack_rate),
            ("move_speed", self.move_speed),
            ("deploy_time", self.deploy_time),
        ];
        for (field, value) in stats {
            if !value.is_finite() || value < 0.0 {
                return Err(DescriptorError::InvalidStat {
                    card: self.card_name.clone(),
                    field,
                    value,
                });
            }
        }

        Ok(())
    }
}

/// Reasons a descriptor is refused by [`UnitDescriptor::validate`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DescriptorError {
    /// The descriptor declares no health at all.
    #[error("unit `{card}` declares a zero maximum health")]
    ZeroHealth {
        /// Card name of the offending descriptor.
        card: String,
    },
    /// The descriptor would heal its targets.
    #[error("unit `{card}` declares negative damage {damage}")]
    NegativeDamage {
        /// Card name of the offending descriptor.
        card: String,
        /// Damage value found in the descriptor.
        damage: i32,
    },
    /// The descriptor spawns no units.
    #[error("unit `{card}` declares an empty squad")]
    EmptySquad {
        /// Card name of the offending descriptor.
        card: String,
    },
    /// A numeric stat is negative, infinite or NaN.
    #[error("unit `{card}` field `{field}` must be finite and non-negative, got {value}")]
    InvalidStat {
        /// Card name of the offending descriptor.
        card: String,
        /// Name of the rejected field.
        field: &'static str,
        /// Value found in the descriptor.
        value: f32,
    },
}
