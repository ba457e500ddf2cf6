use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::backend::Subscription;

/// Why a view should re-fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The periodic timer fired
    Timer,
    /// The data service reported a row change
    Changed,
}

/// The two refresh sources of a live view, owned together.
///
/// Dropping this releases both: the interval stops and the subscription's
/// task is aborted. [`RefreshTriggers::stop`] also leaves the realtime
/// channel cleanly.
pub struct RefreshTriggers {
    timer: Interval,
    subscription: Option<Subscription>,
}

impl RefreshTriggers {
    /// Start the timer; the first tick comes one full `period` from now because
    /// the caller performs the initial fetch itself.
    pub fn start(period: Duration, subscription: Option<Subscription>) -> Self {
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { timer, subscription }
    }

    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Wait for the next trigger. A subscription that ends is dropped and
    /// the timer keeps going alone.
    pub async fn next(&mut self) -> Trigger {
        loop {
            let signal = {
                let timer = &mut self.timer;
                let subscription = &mut self.subscription;
                let changed = async move {
                    match subscription.as_mut() {
                        Some(sub) => sub.changed().await,
                        None => std::future::pending::<Option<()>>().await,
                    }
                };

                tokio::select! {
                    _ = timer.tick() => return Trigger::Timer,
                    signal = changed => signal,
                }
            };

            match signal {
                Some(()) => return Trigger::Changed,
                None => {
                    debug!("change feed ended, polling only");
                    self.subscription = None;
                }
            }
        }
    }

    /// Release both triggers, leaving the realtime channel first
    pub async fn stop(mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.unsubscribe().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// Subscription fed by a test channel; the flag flips when its task is dropped.
    fn fake_subscription() -> (mpsc::UnboundedSender<()>, Subscription, Arc<AtomicBool>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let released = Arc::new(AtomicBool::new(false));

        struct SetOnDrop(Arc<AtomicBool>);
        impl Drop for SetOnDrop {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let guard = SetOnDrop(released.clone());
        let task = tokio::spawn(async move {
            let _guard = guard;
            std::future::pending::<()>().await;
        });
        (tx, Subscription::from_parts(rx, None, task), released)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_full_period() {
        let mut triggers = RefreshTriggers::start(Duration::from_secs(30), None);
        let started = Instant::now();
        assert_eq!(triggers.next().await, Trigger::Timer);
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert_eq!(triggers.next().await, Trigger::Timer);
        assert!(started.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_signal_arrives_before_timer() {
        let (tx, sub, _released) = fake_subscription();
        let mut triggers = RefreshTriggers::start(Duration::from_secs(30), Some(sub));
        assert!(triggers.is_live());

        tx.send(()).unwrap();
        let started = Instant::now();
        assert_eq!(triggers.next().await, Trigger::Changed);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_feed_falls_back_to_polling() {
        let (tx, sub, _released) = fake_subscription();
        let mut triggers = RefreshTriggers::start(Duration::from_secs(30), Some(sub));
        drop(tx);

        assert_eq!(triggers.next().await, Trigger::Timer);
        assert!(!triggers.is_live());
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let (_tx, sub, released) = fake_subscription();
        let triggers = RefreshTriggers::start(Duration::from_secs(30), Some(sub));
        tokio::task::yield_now().await;
        assert!(!released.load(Ordering::SeqCst));

        drop(triggers);
        for _ in 0..10 {
            if released.load(Ordering::SeqCst) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(released.load(Ordering::SeqCst));
    }
}
