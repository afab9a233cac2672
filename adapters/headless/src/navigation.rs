use std::time::Duration;

use squad_tactics_core::{NavigationPort, Vec3};

/// Navigation agent that walks straight toward its destination at a fixed speed.
#[derive(Clone, Debug, PartialEq)]
pub struct StraightLineNavigator {
    position: Vec3,
    destination: Option<Vec3>,
    velocity: Vec3,
    speed: f32,
}

impl StraightLineNavigator {
    /// Creates a stationary agent at `position` moving at `speed` units per second.
    #[must_use]
    pub fn new(position: Vec3, speed: f32) -> Self {
        Self {
            position,
            destination: None,
            velocity: Vec3::ZERO,
            speed: speed.max(0.0),
        }
    }

    /// Destination the agent is walking toward.
    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }
}

impl NavigationPort for StraightLineNavigator {
    fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
    }

    fn reset_path(&mut self) {
        self.destination = None;
        self.velocity = Vec3::ZERO;
    }

    fn current_velocity(&self) -> Vec3 {
        self.velocity
    }

    fn current_position(&self) -> Vec3 {
        self.position
    }

    fn advance(&mut self, dt: Duration) {
        let Some(destination) = self.destination else {
            self.velocity = Vec3::ZERO;
            return;
        };

        let offset = destination - self.position;
        let distance = offset.length();
        let step = self.speed * dt.as_secs_f32();
        if step <= 0.0 {
            self.velocity = Vec3::ZERO;
            return;
        }

        if distance <= step {
            self.position = destination;
            self.destination = None;
            self.velocity = Vec3::ZERO;
            return;
        }

        let direction = offset / distance;
        self.position += direction * step;
        self.velocity = direction * self.speed;
    }
}
