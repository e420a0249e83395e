//! Decorative social-proof counters.
//!
//! Purely cosmetic: the viewer count jitters inside a fixed band, the
//! occasional new buyer appears, and the "spots left" figure shrinks slowly
//! towards a hard floor. Each counter moves on its own randomized timer.
//! Nothing here feeds back into the payment flow.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{sleep_until, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Live-viewer band shown on the page.
pub const VIEWER_RANGE: RangeInclusive<u32> = 35..=65;
/// "Spots left" never drops below this.
pub const SPOTS_FLOOR: u32 = 3;

const BUYER_TICK_CHANCE: f64 = 0.3;
const SPOT_TICK_CHANCE: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialProof {
    pub viewers: u32,
    pub buyers: u32,
    pub spots_left: u32,
}

impl SocialProof {
    /// Seed the counters; the viewer count starts somewhere in the band.
    pub fn seed(rng: &mut impl Rng) -> Self {
        Self {
            viewers: rng.gen_range(VIEWER_RANGE),
            buyers: rng.gen_range(18..=30),
            spots_left: 7,
        }
    }

    /// Nudge the viewer count by up to ±3, clamped to the band.
    pub fn tick_viewers(&mut self, rng: &mut impl Rng) {
        let nudged = self.viewers as i32 + rng.gen_range(-3i32..=3);
        self.viewers =
            nudged.clamp(*VIEWER_RANGE.start() as i32, *VIEWER_RANGE.end() as i32) as u32;
    }

    /// Occasionally another buyer appears.
    pub fn tick_buyers(&mut self, rng: &mut impl Rng) {
        if rng.gen_bool(BUYER_TICK_CHANCE) {
            self.buyers += 1;
        }
    }

    /// Occasionally a spot is taken, down to the floor.
    pub fn tick_spots(&mut self, rng: &mut impl Rng) {
        if self.spots_left > SPOTS_FLOOR && rng.gen_bool(SPOT_TICK_CHANCE) {
            self.spots_left -= 1;
        }
    }
}

fn pause(rng: &mut impl Rng, range: RangeInclusive<u64>) -> Instant {
    Instant::now() + Duration::from_secs(rng.gen_range(range))
}

/// Drive the three counters on independent randomized timers until the
/// token is cancelled (the page refresh tears the widgets down).
pub async fn run(mut state: SocialProof, cancel: CancellationToken) {
    let mut rng = StdRng::from_entropy();

    let mut next_viewers = pause(&mut rng, 3..=8);
    let mut next_buyers = pause(&mut rng, 8..=20);
    let mut next_spots = pause(&mut rng, 25..=60);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            () = sleep_until(next_viewers) => {
                state.tick_viewers(&mut rng);
                debug!("{} viewers online", state.viewers);
                next_viewers = pause(&mut rng, 3..=8);
            }
            () = sleep_until(next_buyers) => {
                state.tick_buyers(&mut rng);
                debug!("{} bought today", state.buyers);
                next_buyers = pause(&mut rng, 8..=20);
            }
            () = sleep_until(next_spots) => {
                state.tick_spots(&mut rng);
                debug!("{} spots left", state.spots_left);
                next_spots = pause(&mut rng, 25..=60);
            }
        }
    }
}
