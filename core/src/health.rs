//! Hit point bookkeeping shared by every combat unit.

use thiserror::Error;

/// Current and maximum health of a single unit.
///
/// Health starts uninitialized, is initialized exactly once and afterwards
/// only ever decreases. Reaching zero is reported once through
/// [`DamageOutcome::Killed`]; later damage is ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Health {
    current: u32,
    max: u32,
    initialized: bool,
}

impl Health {
    /// Creates health that is already initialized to `max`.
    pub fn new(max: u32) -> Result<Self, HealthError> {
        let mut health = Self::default();
        health.initialize(max)?;
        Ok(health)
    }

    /// Sets current health to `max`.
    ///
    /// Only the first call succeeds; later calls leave the health untouched.
    pub fn initialize(&mut self, max: u32) -> Result<(), HealthError> {
        if self.initialized {
            return Err(HealthError::AlreadyInitialized);
        }
        if max == 0 {
            return Err(HealthError::ZeroMaximum);
        }

        self.max = max;
        self.current = max;
        self.initialized = true;
        Ok(())
    }

    /// Applies `amount` points of damage.
    ///
    /// Negative amounts are rejected without touching the health; zero
    /// amounts and hits on dead health are ignored.
    pub fn take_damage(&mut self, amount: i32) -> Result<DamageOutcome, HealthError> {
        if !self.initialized {
            return Err(HealthError::Uninitialized);
        }
        let amount = u32::try_from(amount).map_err(|_| HealthError::NegativeDamage(amount))?;

        if amount == 0 || self.current == 0 {
            return Ok(DamageOutcome::Ignored);
        }

        let dealt = amount.min(self.current);
        self.current -= dealt;

        if self.current == 0 {
            Ok(DamageOutcome::Killed { dealt })
        } else {
            Ok(DamageOutcome::Wounded {
                dealt,
                remaining: self.current,
            })
        }
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Hit points at initialization.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Reports whether [`Health::initialize`] has succeeded.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Reports whether the health has been depleted.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.initialized && self.current == 0
    }

    /// Remaining health as a fraction of the maximum, in `0.0..=1.0`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        self.current as f32 / self.max as f32
    }
}

/// Result of a successful [`Health::take_damage`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageOutcome {
    /// The amount was zero or the health was already depleted; nothing changed.
    Ignored,
    /// Damage was applied and the unit survived.
    Wounded {
        /// Points actually removed.
        dealt: u32,
        /// Points left afterwards.
        remaining: u32,
    },
    /// Damage depleted the health. Reported once per lifetime.
    Killed {
        /// Points actually removed.
        dealt: u32,
    },
}

/// Reasons a health operation is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum HealthError {
    /// Health may only be initialized once.
    #[error("health has already been initialized")]
    AlreadyInitialized,
    /// A unit cannot start with zero health.
    #[error("maximum health must be greater than zero")]
    ZeroMaximum,
    /// Damage arrived before initialization.
    #[error("health has not been initialized")]
    Uninitialized,
    /// Damage amounts must not be negative.
    #[error("damage amount {0} is negative")]
    NegativeDamage(i32),
}
