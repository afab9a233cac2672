use std::{cell::RefCell, rc::Rc};

use squad_tactics_core::{MoveAttackDirection, Presentation};

/// Presentation cue observed by a [`RecordingPresentation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Spawn animation.
    Appear,
    /// Standing idle.
    Idle,
    /// Plain locomotion.
    Move,
    /// Aiming while stationary.
    AttackIdle,
    /// A single shot.
    AttackShot,
    /// Moving while firing.
    MoveAttack(MoveAttackDirection),
    /// Death animation.
    Death,
}

impl Cue {
    fn is_looping(self) -> bool {
        matches!(
            self,
            Self::Idle | Self::Move | Self::AttackIdle | Self::MoveAttack(_)
        )
    }
}

/// Cue played by one actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CueRecord {
    /// Creation index of the presentation handle that played the cue.
    pub actor: usize,
    /// Cue that started playing.
    pub cue: Cue,
}

/// Shared, append-only log of cues played by every actor.
#[derive(Clone, Debug, Default)]
pub struct CueLog {
    records: Rc<RefCell<Vec<CueRecord>>>,
}

impl CueLog {
    /// Copies out every record in play order.
    #[must_use]
    pub fn records(&self) -> Vec<CueRecord> {
        self.records.borrow().clone()
    }

    /// Cues played by a single actor in play order.
    #[must_use]
    pub fn cues_of(&self, actor: usize) -> Vec<Cue> {
        self.records
            .borrow()
            .iter()
            .filter(|record| record.actor == actor)
            .map(|record| record.cue)
            .collect()
    }

    /// Number of times `cue` was played across all actors.
    #[must_use]
    pub fn count(&self, cue: Cue) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|record| record.cue == cue)
            .count()
    }

    fn push(&self, record: CueRecord) {
        self.records.borrow_mut().push(record);
    }
}

/// Presentation handle that records cue transitions into a [`CueLog`].
///
/// Looping cues are only recorded when they replace a different cue, which
/// mirrors how an animation controller ignores requests for the clip that is
/// already playing. One-shot cues are always recorded.
#[derive(Debug)]
pub struct RecordingPresentation {
    actor: usize,
    current: Option<Cue>,
    log: CueLog,
}

impl RecordingPresentation {
    /// Creates a handle that records into `log` under the `actor` index.
    #[must_use]
    pub fn new(actor: usize, log: CueLog) -> Self {
        Self {
            actor,
            current: None,
            log,
        }
    }

    fn play(&mut self, cue: Cue) {
        if cue.is_looping() && self.current == Some(cue) {
            return;
        }
        self.current = Some(cue);
        self.log.push(CueRecord {
            actor: self.actor,
            cue,
        });
    }
}

impl Presentation for RecordingPresentation {
    fn play_appear(&mut self) {
        self.play(Cue::Appear);
    }

    fn play_idle(&mut self) {
        self.play(Cue::Idle);
    }

    fn play_move(&mut self) {
        self.play(Cue::Move);
    }

    fn play_attack_idle(&mut self) {
        self.play(Cue::AttackIdle);
    }

    fn play_attack_shot(&mut self) {
        self.play(Cue::AttackShot);
        // The aim loop resumes once the shot finishes.
        self.current = Some(Cue::AttackIdle);
    }

    fn play_move_attack(&mut self, direction: MoveAttackDirection) {
        self.play(Cue::MoveAttack(direction));
    }

    fn play_death(&mut self) {
        self.play(Cue::Death);
    }
}
