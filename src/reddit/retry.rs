// src/reddit/retry.rs

use super::publish::{Detection, Publisher, Thread};
use rand::Rng;
use std::thread;
use std::time::Duration;

/// Linear backoff: `base * (attempt + 1)`, optionally jittered by -0.5s..1.5s.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base: Duration,
    pub jitter: bool,
}

impl Backoff {
    pub fn delay(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let wait = self.base.as_secs_f64() * f64::from(attempt + 1);
        let jitter = if self.jitter { rng.gen_range(-0.5..1.5) } else { 0.0 };
        Duration::from_secs_f64((wait + jitter).max(0.0))
    }
}

/// Random pause between posts in auto mode, scaled by how much media was posted.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub min_per_item: f64,
    pub max_per_item: f64,
}

impl Pacing {
    pub fn delay(&self, media: usize, rng: &mut impl Rng) -> Duration {
        let lo = self.min_per_item.max(0.0) * media as f64;
        let hi = self.max_per_item.max(0.0) * media as f64;
        let secs = if hi > lo { rng.gen_range(lo..hi) } else { lo };
        Duration::from_secs_f64(secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    Duplicate,
    /// Attempts ran out, or the publisher could not tell; a person has to look.
    Unconfirmed,
}

/// Submits `thread` up to `attempts` times.
///
/// Before each retry the publisher is asked whether the previous attempt
/// landed after all, so a slow success is not posted twice. An
/// `Indeterminate` answer stops retrying for the same reason.
pub fn publish_with_retry(
    publisher: &mut dyn Publisher,
    thread: &Thread,
    attempts: u32,
    backoff: &Backoff,
) -> PublishOutcome {
    let mut rng = rand::thread_rng();
    for attempt in 0..attempts {
        if attempt > 0 {
            match publisher.published(thread) {
                Detection::Detected => {
                    tracing::info!("previous attempt was published after all");
                    return PublishOutcome::Published;
                }
                Detection::Indeterminate => return PublishOutcome::Unconfirmed,
                Detection::NotDetected => {}
            }
            let wait = backoff.delay(attempt, &mut rng);
            tracing::info!(attempt, of = attempts - 1, wait = ?wait, "retrying publish");
            thread::sleep(wait);
        }

        if let Err(e) = publisher.submit(thread) {
            tracing::warn!(attempt, error = %e, "publish attempt failed");
            continue;
        }

        match publisher.duplicate(thread) {
            Detection::Detected => return PublishOutcome::Duplicate,
            Detection::Indeterminate => tracing::debug!("duplicate check inconclusive"),
            Detection::NotDetected => {}
        }

        match publisher.published(thread) {
            Detection::Detected => return PublishOutcome::Published,
            Detection::Indeterminate => return PublishOutcome::Unconfirmed,
            Detection::NotDetected => tracing::warn!(attempt, "publish not verified yet"),
        }
    }
    tracing::warn!(attempts, "publish attempts exhausted");
    PublishOutcome::Unconfirmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::publish::PublishError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;
    use std::io;
    use std::path::PathBuf;

    /// Replays canned answers; records how often `submit` ran.
    #[derive(Default)]
    struct Scripted {
        submits: VecDeque<bool>,
        duplicate: VecDeque<Detection>,
        published: VecDeque<Detection>,
        submitted: u32,
    }

    impl Publisher for Scripted {
        fn submit(&mut self, _thread: &Thread) -> Result<(), PublishError> {
            self.submitted += 1;
            if self.submits.pop_front().unwrap_or(true) {
                Ok(())
            } else {
                Err(PublishError::Io { path: PathBuf::from("x"), source: io::Error::other("boom") })
            }
        }

        fn duplicate(&mut self, _thread: &Thread) -> Detection {
            self.duplicate.pop_front().unwrap_or(Detection::NotDetected)
        }

        fn published(&mut self, _thread: &Thread) -> Detection {
            self.published.pop_front().unwrap_or(Detection::NotDetected)
        }
    }

    fn thread() -> Thread {
        Thread { source_url: "https://r/1".into(), title: "t".into(), batches: Vec::new() }
    }

    const NO_WAIT: Backoff = Backoff { base: Duration::ZERO, jitter: false };

    #[test]
    fn backoff_grows_linearly() {
        let b = Backoff { base: Duration::from_secs(3), jitter: false };
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(b.delay(1, &mut rng), Duration::from_secs(6));
        assert_eq!(b.delay(4, &mut rng), Duration::from_secs(15));
    }

    #[test]
    fn jitter_stays_in_range() {
        let b = Backoff { base: Duration::from_secs(3), jitter: true };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let d = b.delay(1, &mut rng).as_secs_f64();
            assert!((5.5..7.5).contains(&d), "{d}");
        }
    }

    #[test]
    fn pacing_scales_with_media() {
        let p = Pacing { min_per_item: 5.0, max_per_item: 10.0 };
        let mut rng = StdRng::seed_from_u64(1);
        let d = p.delay(3, &mut rng).as_secs_f64();
        assert!((15.0..30.0).contains(&d));
        assert_eq!(p.delay(0, &mut rng), Duration::ZERO);
    }

    #[test]
    fn first_attempt_success() {
        let mut p = Scripted { published: VecDeque::from([Detection::Detected]), ..Default::default() };
        assert_eq!(publish_with_retry(&mut p, &thread(), 5, &NO_WAIT), PublishOutcome::Published);
        assert_eq!(p.submitted, 1);
    }

    #[test]
    fn duplicate_stops_immediately() {
        let mut p = Scripted { duplicate: VecDeque::from([Detection::Detected]), ..Default::default() };
        assert_eq!(publish_with_retry(&mut p, &thread(), 5, &NO_WAIT), PublishOutcome::Duplicate);
        assert_eq!(p.submitted, 1);
    }

    #[test]
    fn late_success_is_not_resubmitted() {
        // attempt 0: not verified; before attempt 1: it landed
        let mut p = Scripted {
            published: VecDeque::from([Detection::NotDetected, Detection::Detected]),
            ..Default::default()
        };
        assert_eq!(publish_with_retry(&mut p, &thread(), 5, &NO_WAIT), PublishOutcome::Published);
        assert_eq!(p.submitted, 1);
    }

    #[test]
    fn failed_submits_are_retried() {
        let mut p = Scripted {
            submits: VecDeque::from([false, false, true]),
            published: VecDeque::from([Detection::NotDetected, Detection::NotDetected, Detection::Detected]),
            ..Default::default()
        };
        assert_eq!(publish_with_retry(&mut p, &thread(), 5, &NO_WAIT), PublishOutcome::Published);
        assert_eq!(p.submitted, 3);
    }

    #[test]
    fn exhaustion_is_unconfirmed() {
        let mut p = Scripted::default();
        assert_eq!(publish_with_retry(&mut p, &thread(), 3, &NO_WAIT), PublishOutcome::Unconfirmed);
        assert_eq!(p.submitted, 3);
    }

    #[test]
    fn indeterminate_escalates_without_retrying() {
        let mut p = Scripted { published: VecDeque::from([Detection::Indeterminate]), ..Default::default() };
        assert_eq!(publish_with_retry(&mut p, &thread(), 5, &NO_WAIT), PublishOutcome::Unconfirmed);
        assert_eq!(p.submitted, 1);
    }
}
