use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::clock::Clock;
use super::engine::{compute_status, AvailabilityStatus};
use super::schedule::WeeklySchedule;

/// Re-evaluates the availability status on a fixed cadence and publishes the
/// latest value to any number of subscribers.
pub struct AvailabilityMonitor {
    sender: Arc<watch::Sender<AvailabilityStatus>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AvailabilityMonitor {
    /// Start polling on the current tokio runtime. The first status is computed
    /// before this returns.
    pub fn spawn<C>(clock: Arc<C>, schedule: WeeklySchedule, interval: Duration) -> Self
    where
        C: Clock + ?Sized + 'static,
    {
        let initial = compute_status(clock.now(), &schedule);
        let (sender, _) = watch::channel(initial);
        let sender = Arc::new(sender);

        let publisher = sender.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let status = compute_status(clock.now(), &schedule);
                publisher.send_if_modified(|current| {
                    if *current == status {
                        return false;
                    }
                    if current.is_open != status.is_open {
                        info!(
                            is_open = status.is_open,
                            message = %status.status_message,
                            "business availability changed"
                        );
                    } else {
                        debug!(message = %status.status_message, "availability message updated");
                    }
                    *current = status;
                    true
                });
            }
        });

        Self {
            sender,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn current(&self) -> AvailabilityStatus {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AvailabilityStatus> {
        self.sender.subscribe()
    }

    /// Stop polling; the last published status stays readable.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.task.lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|task| !task.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for AvailabilityMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
