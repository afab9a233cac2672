#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory implementations of the engine ports and a deterministic driver.
//!
//! Everything here runs without a renderer: units walk in straight lines over
//! a flat battlefield and presentation cues are recorded instead of played.

mod battlefield;
mod factory;
mod navigation;
mod presentation;
mod simulation;

pub use battlefield::{Battlefield, Obstacle, PreviewState};
pub use factory::HeadlessFactory;
pub use navigation::StraightLineNavigator;
pub use presentation::{Cue, CueLog, CueRecord, RecordingPresentation};
pub use simulation::{Settings, Simulation};
