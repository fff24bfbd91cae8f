use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// When the spacing between per-item chains is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacingPolicy {
    /// Next chain may start `interval` after the previous one finished.
    #[default]
    AfterFinish,
    /// Chain starts are spaced `interval` apart regardless of duration.
    BetweenStarts,
}

impl FromStr for PacingPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "after-finish" | "after_finish" => Ok(PacingPolicy::AfterFinish),
            "between-starts" | "between_starts" => Ok(PacingPolicy::BetweenStarts),
            other => Err(anyhow::anyhow!("unknown pacing policy {other:?}")),
        }
    }
}

/// Gate shared by all workers of a run. Waiters queue on the inner mutex, so
/// chain starts are released one at a time.
pub struct Pacer {
    policy: PacingPolicy,
    interval: Duration,
    next_start: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(policy: PacingPolicy, interval: Duration) -> Self {
        Self {
            policy,
            interval,
            next_start: Mutex::new(None),
        }
    }

    /// Wait until a new chain may start.
    pub async fn acquire(&self) {
        let mut next = self.next_start.lock().await;
        if let Some(at) = *next {
            if at > Instant::now() {
                sleep_until(at).await;
            }
        }
        if self.policy == PacingPolicy::BetweenStarts {
            *next = Some(Instant::now() + self.interval);
        }
    }

    /// Record that a chain finished.
    pub async fn finished(&self) {
        if self.policy != PacingPolicy::AfterFinish {
            return;
        }
        let mut next = self.next_start.lock().await;
        let candidate = Instant::now() + self.interval;
        *next = Some(next.map_or(candidate, |at| at.max(candidate)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let pacer = Pacer::new(PacingPolicy::AfterFinish, Duration::from_secs(3));
        let t0 = Instant::now();
        pacer.acquire().await;
        assert_eq!(t0.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn after_finish_waits_from_completion() {
        let pacer = Pacer::new(PacingPolicy::AfterFinish, Duration::from_secs(2));
        let t0 = Instant::now();
        pacer.acquire().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        pacer.finished().await;
        pacer.acquire().await;
        assert_eq!(t0.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn between_starts_ignores_chain_length() {
        let pacer = Pacer::new(PacingPolicy::BetweenStarts, Duration::from_secs(2));
        let t0 = Instant::now();
        pacer.acquire().await;
        pacer.acquire().await;
        pacer.acquire().await;
        assert_eq!(t0.elapsed(), Duration::from_secs(4));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(
            "between-starts".parse::<PacingPolicy>().unwrap(),
            PacingPolicy::BetweenStarts
        );
        assert_eq!(
            "AFTER_FINISH".parse::<PacingPolicy>().unwrap(),
            PacingPolicy::AfterFinish
        );
        assert!("fast".parse::<PacingPolicy>().is_err());
    }
}
