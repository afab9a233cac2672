//! Squad rosters bound to formation slots around a navigable anchor.

use std::{sync::Arc, time::Duration};

use squad_tactics_core::{
    NavigationPort, OrderRejection, RosterEntry, SquadId, SquadSnapshot, UnitDescriptor, UnitId,
    Vec3,
};

#[derive(Debug)]
pub(crate) struct Squad {
    id: SquadId,
    descriptor: Arc<UnitDescriptor>,
    slots: Vec<Vec3>,
    roster: Vec<RosterEntry>,
    anchor: Box<dyn NavigationPort>,
}

/// Outcome of an idempotent roster mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RosterChange {
    Changed,
    Unchanged,
}

impl Squad {
    pub(crate) fn new(
        id: SquadId,
        descriptor: Arc<UnitDescriptor>,
        slots: Vec<Vec3>,
        anchor: Box<dyn NavigationPort>,
    ) -> Self {
        Self {
            id,
            descriptor,
            slots,
            roster: Vec::new(),
            anchor,
        }
    }

    /// Binds `unit` to `slot`. Enlisting a member into its own slot again is a no-op.
    pub(crate) fn add_unit(
        &mut self,
        unit: UnitId,
        slot: usize,
    ) -> Result<RosterChange, OrderRejection> {
        if let Some(existing) = self.roster.iter().find(|entry| entry.unit == unit) {
            if existing.slot == slot {
                return Ok(RosterChange::Unchanged);
            }
            return Err(OrderRejection::AlreadyEnlisted {
                unit,
                squad: self.id,
            });
        }
        if slot >= self.slots.len() {
            return Err(OrderRejection::SlotOutOfRange {
                squad: self.id,
                slot,
            });
        }
        if self.roster.iter().any(|entry| entry.slot == slot) {
            return Err(OrderRejection::SlotOccupied {
                squad: self.id,
                slot,
            });
        }

        self.roster.push(RosterEntry { unit, slot });
        Ok(RosterChange::Changed)
    }

    /// Drops `unit` from the roster, leaving its slot vacant.
    pub(crate) fn remove_unit(&mut self, unit: UnitId) -> RosterChange {
        let before = self.roster.len();
        self.roster.retain(|entry| entry.unit != unit);
        if self.roster.len() == before {
            RosterChange::Unchanged
        } else {
            RosterChange::Changed
        }
    }

    pub(crate) fn move_anchor(&mut self, destination: Vec3) {
        self.anchor.set_destination(destination);
    }

    pub(crate) fn halt_anchor(&mut self) {
        self.anchor.reset_path();
    }

    pub(crate) fn advance_anchor(&mut self, dt: Duration) {
        self.anchor.advance(dt);
    }

    pub(crate) fn snapshot(&self) -> SquadSnapshot {
        SquadSnapshot {
            id: self.id,
            name: self.descriptor.card_name.clone(),
            anchor: self.anchor.current_position(),
            slots: self.slots.clone(),
            roster: self.roster.clone(),
        }
    }
}
