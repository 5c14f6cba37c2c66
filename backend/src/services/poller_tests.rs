#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::error::{HeatmapError, HeatmapResult};
    use crate::models::{JobRecord, TimelineSnapshot};
    use crate::services::poller::{ChangeEvent, PollOutcome, Poller};
    use crate::services::signature::snapshot_signature;
    use crate::services::source::{FetchError, FetchResult, Fetcher};

    fn snapshot_for(day: u32) -> TimelineSnapshot {
        let date = format!("2024-01-{:02}", day);
        let mut jobs = std::collections::BTreeMap::new();
        jobs.insert(
            "JOB".to_string(),
            JobRecord {
                starting_date: Some(date.clone()),
                ending_date: Some(date),
                ..Default::default()
            },
        );
        TimelineSnapshot::new(jobs)
    }

    struct Step {
        delay: Duration,
        result: Result<TimelineSnapshot, &'static str>,
    }

    fn ok(day: u32, delay_ms: u64) -> Step {
        Step {
            delay: Duration::from_millis(delay_ms),
            result: Ok(snapshot_for(day)),
        }
    }

    fn fail(message: &'static str) -> Step {
        Step {
            delay: Duration::ZERO,
            result: Err(message),
        }
    }

    /// Plays back a fixed script; the last step repeats once the script runs out.
    struct ScriptedFetcher {
        steps: Mutex<VecDeque<Step>>,
        last: Mutex<Option<Step>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                last: Mutex::new(None),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn next_step(&self) -> (Duration, Result<TimelineSnapshot, &'static str>) {
            let popped = self.steps.lock().pop_front();
            let mut last = self.last.lock();
            if let Some(step) = popped {
                *last = Some(Step {
                    delay: step.delay,
                    result: step.result.clone(),
                });
                return (step.delay, step.result);
            }
            match last.as_ref() {
                Some(step) => (step.delay, step.result.clone()),
                None => (Duration::ZERO, Err("empty script")),
            }
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self) -> FetchResult<TimelineSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, result) = self.next_step();
            tokio::time::sleep(delay).await;
            result.map_err(|m| FetchError::Transport(m.to_string()))
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    /// Counts fetches and returns a new snapshot each time.
    struct ChangingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for ChangingFetcher {
        async fn fetch(&self) -> FetchResult<TimelineSnapshot> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(snapshot_for((n % 28) as u32 + 1))
        }

        fn describe(&self) -> String {
            "changing".to_string()
        }
    }

    struct CancelledFetcher;

    #[async_trait]
    impl Fetcher for CancelledFetcher {
        async fn fetch(&self) -> FetchResult<TimelineSnapshot> {
            Err(FetchError::Cancelled)
        }

        fn describe(&self) -> String {
            "cancelled".to_string()
        }
    }

    fn recorder() -> (
        Arc<Mutex<Vec<String>>>,
        impl Fn(ChangeEvent) -> HeatmapResult<()> + Send + Sync + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |event: ChangeEvent| {
            sink.lock().push(event.signature);
            Ok(())
        })
    }

    #[test]
    fn test_zero_interval_rejected() {
        let fetcher = ScriptedFetcher::new(vec![]);
        assert!(Poller::new(fetcher, Duration::ZERO).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_polls_fire_once() {
        let fetcher = ScriptedFetcher::new(vec![ok(1, 0)]);
        let poller = Poller::new(fetcher.clone(), Duration::from_millis(100)).unwrap();
        let (seen, on_change) = recorder();

        assert!(poller.start(on_change));
        tokio::time::sleep(Duration::from_millis(450)).await;
        poller.stop().await;

        assert!(fetcher.calls() >= 4);
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(
            poller.last_signature(),
            Some(snapshot_signature(&snapshot_for(1)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_is_never_applied() {
        // First fetch outlives the interval; the second tick replaces it.
        let fetcher = ScriptedFetcher::new(vec![ok(1, 250), ok(2, 10)]);
        let poller = Poller::new(fetcher.clone(), Duration::from_millis(100)).unwrap();
        let (seen, on_change) = recorder();

        poller.start(on_change);
        tokio::time::sleep(Duration::from_millis(500)).await;
        poller.stop().await;

        let signatures = seen.lock().clone();
        assert_eq!(signatures, vec![snapshot_signature(&snapshot_for(2))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_stop_polling() {
        let fetcher = ScriptedFetcher::new(vec![fail("connection refused"), ok(3, 0)]);
        let poller = Poller::new(fetcher.clone(), Duration::from_millis(50)).unwrap();
        let (seen, on_change) = recorder();

        poller.start(on_change);
        tokio::time::sleep(Duration::from_millis(120)).await;
        poller.stop().await;

        assert!(fetcher.calls() >= 2);
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_callbacks() {
        let fetcher = Arc::new(ChangingFetcher {
            calls: AtomicUsize::new(0),
        });
        let poller = Poller::new(fetcher.clone(), Duration::from_millis(100)).unwrap();
        let (seen, on_change) = recorder();

        poller.start(on_change);
        tokio::time::sleep(Duration::from_millis(250)).await;
        poller.stop().await;
        assert!(!poller.is_running());

        let fired = seen.lock().len();
        let calls = fetcher.calls.load(Ordering::SeqCst);
        assert!(fired >= 2);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(seen.lock().len(), fired);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_ignored() {
        let fetcher = ScriptedFetcher::new(vec![ok(1, 0)]);
        let poller = Poller::new(fetcher, Duration::from_millis(100)).unwrap();

        assert!(poller.start(|_| Ok(())));
        assert!(!poller.start(|_| Ok(())));
        assert!(poller.is_running());

        poller.stop().await;
        assert!(poller.start(|_| Ok(())));
        poller.stop().await;
    }

    #[tokio::test]
    async fn test_poll_once_and_destroy() {
        let fetcher = ScriptedFetcher::new(vec![ok(5, 0)]);
        let poller = Poller::new(fetcher, Duration::from_secs(60)).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let bump = {
            let count = Arc::clone(&count);
            move |_: ChangeEvent| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        };

        assert!(matches!(
            poller.poll_once(&bump).await,
            PollOutcome::Changed { .. }
        ));
        assert_eq!(poller.poll_once(&bump).await, PollOutcome::Unchanged);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        poller.destroy().await;
        assert!(poller.last_signature().is_none());
        assert!(matches!(
            poller.poll_once(&bump).await,
            PollOutcome::Changed { .. }
        ));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_is_not_a_failure() {
        let poller = Poller::new(Arc::new(CancelledFetcher), Duration::from_secs(1)).unwrap();
        let outcome = poller.poll_once(|_| panic!("no callback expected")).await;
        assert_eq!(outcome, PollOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_failed_fetch_reports_message() {
        let fetcher = ScriptedFetcher::new(vec![fail("boom")]);
        let poller = Poller::new(fetcher, Duration::from_secs(1)).unwrap();
        let outcome = poller.poll_once(|_| Ok(())).await;
        assert_eq!(
            outcome,
            PollOutcome::Failed {
                message: "Transport error: boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_rejected_snapshot_is_retried_until_accepted() {
        let fetcher = ScriptedFetcher::new(vec![ok(7, 0)]);
        let poller = Poller::new(fetcher, Duration::from_secs(60)).unwrap();
        let accept = Arc::new(AtomicBool::new(false));
        let delivered = Arc::new(AtomicUsize::new(0));
        let handler = {
            let accept = Arc::clone(&accept);
            let delivered = Arc::clone(&delivered);
            move |_: ChangeEvent| {
                delivered.fetch_add(1, Ordering::SeqCst);
                if accept.load(Ordering::SeqCst) {
                    Ok(())
                } else {
                    Err(HeatmapError::preferences("preferences file is corrupt"))
                }
            }
        };

        let outcome = poller.poll_once(&handler).await;
        assert!(matches!(outcome, PollOutcome::Failed { ref message } if message.contains("corrupt")));
        assert!(poller.last_signature().is_none());

        // Same source data; the handler recovered
        accept.store(true, Ordering::SeqCst);
        let outcome = poller.poll_once(&handler).await;
        assert_eq!(
            outcome,
            PollOutcome::Changed {
                signature: snapshot_signature(&snapshot_for(7))
            }
        );
        assert_eq!(poller.poll_once(&handler).await, PollOutcome::Unchanged);
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
        assert_eq!(poller.last_outcome(), Some(PollOutcome::Unchanged));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_poll_retries_rejected_snapshot() {
        let fetcher = ScriptedFetcher::new(vec![ok(4, 0)]);
        let poller = Poller::new(fetcher, Duration::from_millis(100)).unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));
        let handler = {
            let attempts = Arc::clone(&attempts);
            move |_: ChangeEvent| {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(HeatmapError::invalid_window("window not ready"))
                } else {
                    Ok(())
                }
            }
        };

        poller.start(handler);
        tokio::time::sleep(Duration::from_millis(350)).await;
        poller.stop().await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(
            poller.last_signature(),
            Some(snapshot_signature(&snapshot_for(4)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_reports_cancelled() {
        let fetcher = ScriptedFetcher::new(vec![ok(1, 250), ok(2, 10)]);
        let poller = Poller::new(fetcher, Duration::from_millis(100)).unwrap();
        let (_seen, on_change) = recorder();

        poller.start(on_change);
        tokio::time::sleep(Duration::from_millis(105)).await;
        assert_eq!(poller.last_outcome(), Some(PollOutcome::Cancelled));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            poller.last_outcome(),
            Some(PollOutcome::Changed {
                signature: snapshot_signature(&snapshot_for(2))
            })
        );
        poller.stop().await;
    }
}
