//! Scripted driver that keeps a squad wandering around a test area.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use squad_tactics_core::{SpatialQuery, SquadId, Vec3};
use squad_tactics_system_formation::SquadOrder;

const INITIAL_DELAY: Duration = Duration::from_secs(3);
const MIN_INTERVAL_SECS: f32 = 5.0;
const MAX_INTERVAL_SECS: f32 = 10.0;
const TEST_AREA_HALF_EXTENT: f32 = 25.0;
const SAMPLE_RADIUS: f32 = 10.0;

/// Sends a squad to a random navigable point every few seconds.
#[derive(Debug)]
pub(crate) struct PatrolDriver {
    squad: SquadId,
    center: Vec3,
    rng: ChaCha8Rng,
    elapsed: Duration,
    next_order_at: Duration,
}

impl PatrolDriver {
    /// Creates a driver patrolling the test area around `center`.
    pub(crate) fn new(squad: SquadId, center: Vec3, seed: u64) -> Self {
        Self {
            squad,
            center,
            rng: ChaCha8Rng::seed_from_u64(seed),
            elapsed: Duration::ZERO,
            next_order_at: INITIAL_DELAY,
        }
    }

    /// Advances the patrol clock, returning a move order when one is due.
    pub(crate) fn update<S: SpatialQuery>(
        &mut self,
        dt: Duration,
        spatial: &S,
    ) -> Option<SquadOrder> {
        self.elapsed = self.elapsed.saturating_add(dt);
        if self.elapsed < self.next_order_at {
            return None;
        }

        let interval = self.rng.gen_range(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS);
        self.next_order_at = self
            .elapsed
            .saturating_add(Duration::from_secs_f32(interval));

        let wanted = self.center
            + Vec3::new(
                self.rng
                    .gen_range(-TEST_AREA_HALF_EXTENT..=TEST_AREA_HALF_EXTENT),
                0.0,
                self.rng
                    .gen_range(-TEST_AREA_HALF_EXTENT..=TEST_AREA_HALF_EXTENT),
            );
        let Some(destination) = spatial.sample_nearest_navigable_point(wanted, SAMPLE_RADIUS)
        else {
            tracing::warn!(
                squad = self.squad.get(),
                x = wanted.x,
                z = wanted.z,
                "no navigable patrol point near the random destination"
            );
            return None;
        };

        tracing::debug!(
            squad = self.squad.get(),
            x = destination.x,
            z = destination.z,
            "patrol destination chosen"
        );
        Some(SquadOrder::Move {
            squad: self.squad,
            destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use squad_tactics_headless::Battlefield;

    use super::*;

    const STEP: Duration = Duration::from_millis(100);

    fn run(driver: &mut PatrolDriver, battlefield: &Battlefield, steps: u32) -> Vec<(u32, Vec3)> {
        (0..steps)
            .filter_map(|step| match driver.update(STEP, battlefield)? {
                SquadOrder::Move { destination, .. } => Some((step, destination)),
                SquadOrder::Attack { .. } => None,
            })
            .collect()
    }

    #[test]
    fn first_order_waits_for_the_initial_delay() {
        let battlefield = Battlefield::new(40.0);
        let mut driver = PatrolDriver::new(SquadId::new(0), Vec3::ZERO, 7);

        let orders = run(&mut driver, &battlefield, 200);

        let (first, _) = orders.first().copied().expect("patrol issues orders");
        assert_eq!(first, 29, "the thirtieth step reaches three seconds");
        for pair in orders.windows(2) {
            let gap = pair[1].0 - pair[0].0;
            assert!(
                (49..=101).contains(&gap),
                "orders are five to ten seconds apart, got {gap} steps"
            );
        }
    }

    #[test]
    fn destinations_stay_inside_the_test_area() {
        let battlefield = Battlefield::new(40.0);
        let center = Vec3::new(5.0, 0.0, -5.0);
        let mut driver = PatrolDriver::new(SquadId::new(0), center, 11);

        for (_, destination) in run(&mut driver, &battlefield, 1_000) {
            assert!((destination.x - center.x).abs() <= TEST_AREA_HALF_EXTENT);
            assert!((destination.z - center.z).abs() <= TEST_AREA_HALF_EXTENT);
        }
    }

    #[test]
    fn same_seed_replays_the_same_route() {
        let battlefield = Battlefield::new(40.0);
        let mut first = PatrolDriver::new(SquadId::new(0), Vec3::ZERO, 42);
        let mut second = PatrolDriver::new(SquadId::new(0), Vec3::ZERO, 42);

        assert_eq!(
            run(&mut first, &battlefield, 500),
            run(&mut second, &battlefield, 500)
        );
    }

    #[test]
    fn unreachable_area_produces_no_orders() {
        let battlefield = Battlefield::new(1.0);
        let mut driver = PatrolDriver::new(SquadId::new(0), Vec3::new(200.0, 0.0, 0.0), 3);

        assert!(run(&mut driver, &battlefield, 500).is_empty());
    }
}
