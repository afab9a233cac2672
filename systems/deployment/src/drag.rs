//! Translates a card drag gesture into placement session calls.

use std::sync::Arc;

use squad_tactics_core::UnitDescriptor;

use crate::{Deployment, DeploymentContext, DeploymentError};

/// A card being dragged out of the selection panel.
///
/// Leaving the panel opens a placement session, returning to it cancels the
/// session, and releasing the card confirms or cancels depending on where
/// the pointer was last seen.
#[derive(Clone, Debug)]
pub struct CardDrag {
    descriptor: Arc<UnitDescriptor>,
    placing: bool,
}

impl CardDrag {
    /// Starts dragging the card for `descriptor`.
    #[must_use]
    pub fn begin(descriptor: Arc<UnitDescriptor>) -> Self {
        Self {
            descriptor,
            placing: false,
        }
    }

    /// Reports whether the drag currently drives a placement session.
    #[must_use]
    pub fn is_placing(&self) -> bool {
        self.placing
    }

    /// Updates the gesture with whether the pointer is over the panel.
    pub fn drag<C: DeploymentContext>(
        &mut self,
        over_panel: bool,
        deployment: &mut Deployment<C>,
    ) -> Result<(), DeploymentError> {
        if !over_panel && !self.placing {
            deployment.begin_placement(Arc::clone(&self.descriptor))?;
            self.placing = true;
        } else if over_panel && self.placing {
            self.placing = false;
            deployment.cancel();
        }
        Ok(())
    }

    /// Ends the gesture. Returns whether a deployment was queued.
    pub fn release<C: DeploymentContext>(self, deployment: &mut Deployment<C>) -> bool {
        if self.placing {
            deployment.confirm()
        } else {
            deployment.cancel();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use squad_tactics_core::{Vec2, Vec3};

    use super::*;
    use crate::{
        tests::{descriptor, FakeField},
        Config, DeploymentPhase,
    };

    #[test]
    fn leaving_the_panel_starts_placement_and_returning_cancels() {
        let mut deployment = Deployment::new(Config::default(), FakeField::default());
        let mut drag = CardDrag::begin(descriptor(4, 0.0));

        drag.drag(true, &mut deployment).expect("drag over panel");
        assert_eq!(deployment.phase(), DeploymentPhase::Inactive);

        drag.drag(false, &mut deployment).expect("drag into world");
        drag.drag(false, &mut deployment).expect("drag within world");
        assert!(drag.is_placing());
        assert_eq!(deployment.phase(), DeploymentPhase::Previewing);
        assert!(deployment.context().despawned.is_empty());

        drag.drag(true, &mut deployment).expect("drag back");
        assert!(!drag.is_placing());
        assert_eq!(deployment.phase(), DeploymentPhase::Inactive);
        assert_eq!(deployment.context().despawned.len(), 1);
    }

    #[test]
    fn releasing_in_the_world_confirms() {
        let mut deployment = Deployment::new(Config::default(), FakeField::default());
        let mut drag = CardDrag::begin(descriptor(4, 0.0));
        drag.drag(false, &mut deployment).expect("drag into world");
        deployment.update_preview(Some(Vec2::new(4.0, 4.0)));

        assert!(drag.release(&mut deployment));
        assert_eq!(deployment.pending_deployments(), 1);
        assert!(deployment.context().visible.is_empty());
    }

    #[test]
    fn releasing_over_the_panel_cancels() {
        let mut field = FakeField::default();
        field.obstacles.push(Vec3::ZERO);
        let mut deployment = Deployment::new(Config::default(), field);
        let mut drag = CardDrag::begin(descriptor(4, 0.0));
        drag.drag(false, &mut deployment).expect("drag into world");
        drag.drag(true, &mut deployment).expect("drag back");

        assert!(!drag.release(&mut deployment));
        assert_eq!(deployment.pending_deployments(), 0);
        assert_eq!(deployment.phase(), DeploymentPhase::Inactive);
    }
}
