use squad_tactics_core::{NavigationPort, Presentation, UnitDescriptor, UnitFactory, Vec3};

use crate::{
    navigation::StraightLineNavigator,
    presentation::{CueLog, RecordingPresentation},
};

/// Builds straight-line navigators and recording presentations.
///
/// Presentation handles are numbered in creation order; since the world
/// creates one per spawned unit, actor `n` is the `n`-th unit spawned.
#[derive(Debug, Default)]
pub struct HeadlessFactory {
    cues: CueLog,
    next_actor: usize,
}

impl HeadlessFactory {
    /// Creates a factory with an empty cue log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log shared by every presentation handle the factory created.
    #[must_use]
    pub fn cues(&self) -> CueLog {
        self.cues.clone()
    }
}

impl UnitFactory for HeadlessFactory {
    fn unit_navigator(
        &mut self,
        descriptor: &UnitDescriptor,
        position: Vec3,
    ) -> Box<dyn NavigationPort> {
        Box::new(StraightLineNavigator::new(position, descriptor.move_speed))
    }

    fn unit_presentation(&mut self, _descriptor: &UnitDescriptor) -> Box<dyn Presentation> {
        let actor = self.next_actor;
        self.next_actor += 1;
        Box::new(RecordingPresentation::new(actor, self.cues.clone()))
    }

    fn anchor_navigator(
        &mut self,
        descriptor: &UnitDescriptor,
        position: Vec3,
    ) -> Box<dyn NavigationPort> {
        Box::new(StraightLineNavigator::new(position, descriptor.move_speed))
    }
}
