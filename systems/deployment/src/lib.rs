#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement preview, validation and deferred squad deployment.
//!
//! The system owns at most one preview session. Every tick it raycasts the
//! pointer onto the battlefield, checks the hit point for obstacles and shows
//! or hides the preview accordingly. Confirmed placements wait out the
//! descriptor's deploy time and are then emitted as
//! [`Command::DeploySquad`] for the world to execute.

mod drag;

use std::{sync::Arc, time::Duration};

use squad_tactics_core::{
    Command, DescriptorError, Event, PreviewId, PreviewSurface, SpatialQuery, UnitDescriptor,
    Vec2, Vec3,
};
use thiserror::Error;

pub use drag::CardDrag;

const DEFAULT_PREVIEW_OPACITY: f32 = 0.5;
const DEFAULT_OBSTACLE_HALF_EXTENT: f32 = 0.5;
const DEFAULT_NAVIGABLE_SEARCH_RADIUS: f32 = 2.0;

/// Scene access the deployment system needs.
pub trait DeploymentContext: SpatialQuery + PreviewSurface {}

impl<T: SpatialQuery + PreviewSurface + ?Sized> DeploymentContext for T {}

/// Tunables for placement validation and spawning.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Opacity applied to preview placeholders.
    pub preview_opacity: f32,
    /// Half extents of the box that must be free of obstacles.
    pub obstacle_half_extents: Vec3,
    /// Radius searched for a navigable point around each formation slot.
    pub navigable_search_radius: f32,
    /// Slot offsets relative to the squad anchor.
    pub formation: Vec<Vec3>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preview_opacity: DEFAULT_PREVIEW_OPACITY,
            obstacle_half_extents: Vec3::splat(DEFAULT_OBSTACLE_HALF_EXTENT),
            navigable_search_radius: DEFAULT_NAVIGABLE_SEARCH_RADIUS,
            formation: default_formation(),
        }
    }
}

/// Four slots arranged in a square around the anchor.
#[must_use]
pub fn default_formation() -> Vec<Vec3> {
    vec![
        Vec3::new(-1.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(-1.0, 0.0, -1.0),
        Vec3::new(1.0, 0.0, -1.0),
    ]
}

/// Reasons a placement request is refused.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DeploymentError {
    /// The descriptor has nothing to spawn.
    #[error("card `{card}` has no spawnable prototype")]
    MissingPrototype {
        /// Card name of the refused descriptor.
        card: String,
    },
    /// The descriptor failed validation.
    #[error(transparent)]
    InvalidDescriptor(#[from] DescriptorError),
}

/// Lifecycle phase of the placement session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeploymentPhase {
    /// No placement is in progress.
    Inactive,
    /// A preview follows the pointer and awaits confirmation.
    Previewing,
}

/// Player input sampled for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeploymentInput {
    /// Pointer position in screen space, if the pointer is available.
    pub pointer: Option<Vec2>,
    /// Requests the current placement be confirmed.
    pub confirm: bool,
    /// Requests the current placement be cancelled.
    pub cancel: bool,
}

#[derive(Debug)]
struct Session {
    descriptor: Arc<UnitDescriptor>,
    preview: PreviewId,
    position: Option<Vec3>,
}

#[derive(Debug)]
struct PendingDeployment {
    descriptor: Arc<UnitDescriptor>,
    anchor: Vec3,
    remaining: Duration,
}

/// Deployment controller driving placement sessions against a scene context.
#[derive(Debug)]
pub struct Deployment<C> {
    config: Config,
    context: C,
    session: Option<Session>,
    pending: Vec<PendingDeployment>,
}

impl<C: DeploymentContext> Deployment<C> {
    /// Creates an inactive deployment controller.
    #[must_use]
    pub fn new(config: Config, context: C) -> Self {
        Self {
            config,
            context,
            session: None,
            pending: Vec::new(),
        }
    }

    /// Scene context used for validation and previews.
    #[must_use]
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable access to the scene context.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Tunables the controller was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current session phase.
    #[must_use]
    pub fn phase(&self) -> DeploymentPhase {
        if self.session.is_some() {
            DeploymentPhase::Previewing
        } else {
            DeploymentPhase::Inactive
        }
    }

    /// Reports whether the last validation found a legal position.
    #[must_use]
    pub fn is_placeable(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.position.is_some())
    }

    /// Preview placeholder of the open session.
    #[must_use]
    pub fn preview(&self) -> Option<PreviewId> {
        self.session.as_ref().map(|session| session.preview)
    }

    /// Number of confirmed deployments still waiting for their delay.
    #[must_use]
    pub fn pending_deployments(&self) -> usize {
        self.pending.len()
    }

    /// Opens a placement session for `descriptor`, replacing any open one.
    pub fn begin_placement(
        &mut self,
        descriptor: Arc<UnitDescriptor>,
    ) -> Result<(), DeploymentError> {
        self.cancel();

        if !descriptor.is_spawnable() {
            return Err(DeploymentError::MissingPrototype {
                card: descriptor.card_name.clone(),
            });
        }
        descriptor.validate()?;

        let preview = self
            .context
            .spawn_preview(&descriptor, self.config.preview_opacity);
        tracing::info!(card = %descriptor.card_name, preview = preview.get(), "placement started");
        self.session = Some(Session {
            descriptor,
            preview,
            position: None,
        });
        Ok(())
    }

    /// Revalidates the open session against the pointer position.
    pub fn update_preview(&mut self, pointer: Option<Vec2>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let hit = pointer.and_then(|pointer| self.context.raycast_from_pointer(pointer));
        let legal = hit.filter(|point| {
            self.context
                .query_obstacles_near(*point, self.config.obstacle_half_extents)
                == 0
        });

        match legal {
            Some(point) => self.context.show_preview(session.preview, point),
            None => self.context.hide_preview(session.preview),
        }
        session.position = legal;
    }

    /// Commits the open session at its last legal position.
    ///
    /// An illegal placement is cancelled instead. Returns whether a
    /// deployment was queued.
    pub fn confirm(&mut self) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let Some(anchor) = session.position else {
            tracing::debug!("confirmed an illegal placement, cancelling");
            self.cancel();
            return false;
        };

        let descriptor = Arc::clone(&session.descriptor);
        let remaining = descriptor.deploy_delay();
        self.end_session();
        tracing::info!(
            card = %descriptor.card_name,
            x = anchor.x,
            z = anchor.z,
            delay = ?remaining,
            "placement confirmed"
        );
        self.pending.push(PendingDeployment {
            descriptor,
            anchor,
            remaining,
        });
        true
    }

    /// Abandons the open session. Does nothing when inactive.
    pub fn cancel(&mut self) {
        if self.session.is_some() {
            tracing::debug!("placement cancelled");
            self.end_session();
        }
    }

    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.context.despawn_preview(session.preview);
        }
    }

    /// Advances deploy timers, revalidates the preview and applies input.
    ///
    /// Deployments whose delay elapsed are emitted before the session is
    /// touched, so a confirmation in this call spawns on a later call at the
    /// earliest.
    pub fn handle(&mut self, events: &[Event], input: DeploymentInput, out: &mut Vec<Command>) {
        let elapsed = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .fold(Duration::ZERO, Duration::saturating_add);
        self.release_due(elapsed, out);

        if self.session.is_some() {
            self.update_preview(input.pointer);
        }

        if input.cancel {
            self.cancel();
        } else if input.confirm {
            let _ = self.confirm();
        }
    }

    fn release_due(&mut self, elapsed: Duration, out: &mut Vec<Command>) {
        for pending in &mut self.pending {
            pending.remaining = pending.remaining.saturating_sub(elapsed);
        }

        let (due, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|pending| pending.remaining.is_zero());
        self.pending = waiting;

        for pending in due {
            out.push(self.deploy_command(pending));
        }
    }

    fn deploy_command(&self, pending: PendingDeployment) -> Command {
        let PendingDeployment {
            descriptor, anchor, ..
        } = pending;
        let count = usize::try_from(descriptor.squad_size)
            .unwrap_or(usize::MAX)
            .min(self.config.formation.len());

        let spawn_points = self
            .config
            .formation
            .iter()
            .take(count)
            .map(|offset| {
                self.context.sample_nearest_navigable_point(
                    anchor + *offset,
                    self.config.navigable_search_radius,
                )
            })
            .collect();

        tracing::debug!(card = %descriptor.card_name, members = count, "deploying squad");
        Command::DeploySquad {
            descriptor,
            anchor,
            formation: self.config.formation.clone(),
            spawn_points,
        }
    }
}
