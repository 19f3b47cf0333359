//! Change-detection notifications over a polled liveness field

use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, warn};
use trait_variant::make;

use crate::{backend::WifiBackend, core::types::LivenessField};

/// Destination of notifications for one subscriber
#[make(Send)]
pub trait NotificationSink: Send + 'static {
    /// Deliver a value, returning `false` once the subscriber is gone
    async fn push(&mut self, value: Vec<u8>) -> bool;

    /// Whether the subscriber has gone away
    fn is_closed(&self) -> bool;
}

/// Sample a liveness field; a failed status query reads as empty
pub async fn sample<B: WifiBackend>(backend: &B, field: LivenessField) -> String {
    match backend.status().await {
        Ok(status) => field.extract(&status),
        Err(e) => {
            warn!("Status query for {:?} failed: {}", field, e);
            String::new()
        }
    }
}

#[derive(Debug, Default)]
struct PollerState {
    /// Bumped on every subscribe/unsubscribe; stale ticks compare against it
    generation: u64,
    last_value: String,
    task: Option<JoinHandle<()>>,
}

/// Periodically samples one liveness field and pushes changes
pub struct NotificationPoller<B: WifiBackend> {
    backend: Arc<B>,
    field: LivenessField,
    period: Duration,
    state: Arc<Mutex<PollerState>>,
}

impl<B: WifiBackend> NotificationPoller<B> {
    pub fn new(backend: Arc<B>, field: LivenessField, period: Duration) -> Self {
        Self {
            backend,
            field,
            period,
            state: Arc::new(Mutex::new(PollerState::default())),
        }
    }

    /// Start polling for a subscriber, replacing any previous one
    pub async fn subscribe<S: NotificationSink>(&self, sink: S) {
        let mut state = self.state.lock().await;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        state.generation += 1;
        state.last_value.clear();
        let generation = state.generation;

        debug!("{:?} subscribed, polling every {:?}", self.field, self.period);
        state.task = Some(tokio::spawn(Self::run(
            self.backend.clone(),
            self.field,
            self.period,
            self.state.clone(),
            generation,
            sink,
        )));
    }

    /// Stop polling and forget the last pushed value
    pub async fn unsubscribe(&self) {
        let mut state = self.state.lock().await;
        Self::stop(&mut state);
        debug!("{:?} unsubscribed", self.field);
    }

    /// Whether a subscriber is currently being polled for
    #[cfg(test)]
    pub(crate) async fn is_polling(&self) -> bool {
        self.state.lock().await.task.is_some()
    }

    fn stop(state: &mut PollerState) {
        state.generation += 1;
        state.last_value.clear();
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }

    async fn run<S: NotificationSink>(
        backend: Arc<B>,
        field: LivenessField,
        period: Duration,
        state: Arc<Mutex<PollerState>>,
        generation: u64,
        mut sink: S,
    ) {
        let mut interval =
            tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if sink.is_closed() {
                Self::finish(&mut *state.lock().await, generation, field);
                return;
            }

            let value = sample(backend.as_ref(), field).await;

            // Held through the push: an unsubscribe either precedes the
            // generation check or waits for the push to complete
            let mut guard = state.lock().await;
            if guard.generation != generation {
                // Unsubscribed while the sample was in flight
                return;
            }
            if guard.last_value == value {
                continue;
            }

            debug!("{:?} changed to {:?}", field, value);
            if !sink.push(value.clone().into_bytes()).await {
                Self::finish(&mut guard, generation, field);
                return;
            }
            guard.last_value = value;
        }
    }

    /// Clear state left by a task whose subscriber went away
    fn finish(state: &mut PollerState, generation: u64, field: LivenessField) {
        if state.generation == generation {
            debug!("{:?} subscriber went away", field);
            state.generation += 1;
            state.last_value.clear();
            state.task = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, MockWifiBackend};
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    const PERIOD: Duration = Duration::from_millis(1000);

    struct ChannelSink(mpsc::UnboundedSender<Vec<u8>>);

    impl NotificationSink for ChannelSink {
        async fn push(&mut self, value: Vec<u8>) -> bool {
            self.0.send(value).is_ok()
        }

        fn is_closed(&self) -> bool {
            self.0.is_closed()
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<String> {
        let mut values = Vec::new();
        while let Ok(value) = rx.try_recv() {
            values.push(String::from_utf8(value).unwrap());
        }
        values
    }

    async fn ticks(n: u32) {
        tokio::time::sleep(PERIOD * n + Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_samples_notify_once() {
        let backend = Arc::new(MockWifiBackend::new());
        backend.set_status(Some("192.168.1.20"), Some("home")).await;
        let poller = NotificationPoller::new(backend.clone(), LivenessField::IpAddress, PERIOD);

        let (tx, mut rx) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        ticks(3).await;

        assert_eq!(drain(&mut rx), vec!["192.168.1.20".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_notifies_new_value() {
        let backend = Arc::new(MockWifiBackend::new());
        backend.set_status(None, Some("home")).await;
        let poller = NotificationPoller::new(backend.clone(), LivenessField::Ssid, PERIOD);

        let (tx, mut rx) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        ticks(1).await;
        assert_eq!(drain(&mut rx), vec!["home".to_string()]);

        backend.set_status(None, Some("office")).await;
        ticks(1).await;
        assert_eq!(drain(&mut rx), vec!["office".to_string()]);

        // Transition to empty is a change too
        backend.set_status(None, None).await;
        ticks(2).await;
        assert_eq!(drain(&mut rx), vec!["".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_poll_before_first_period() {
        let backend = Arc::new(MockWifiBackend::new());
        backend.set_status(Some("10.0.0.2"), None).await;
        let poller = NotificationPoller::new(backend.clone(), LivenessField::IpAddress, PERIOD);

        let (tx, mut rx) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(drain(&mut rx).is_empty());
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failure_reads_as_empty() {
        let backend = Arc::new(MockWifiBackend::new());
        backend.set_status(Some("10.0.0.2"), None).await;
        let poller = NotificationPoller::new(backend.clone(), LivenessField::IpAddress, PERIOD);

        let (tx, mut rx) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        ticks(1).await;
        backend.set_status_failure(true).await;
        ticks(1).await;

        assert_eq!(
            drain(&mut rx),
            vec!["10.0.0.2".to_string(), "".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_stops_polling() {
        let backend = Arc::new(MockWifiBackend::new());
        backend.set_status(Some("10.0.0.2"), None).await;
        let poller = NotificationPoller::new(backend.clone(), LivenessField::IpAddress, PERIOD);

        let (tx, mut rx) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        ticks(1).await;
        poller.unsubscribe().await;
        assert!(!poller.is_polling().await);

        let polls = backend.calls().await.len();
        backend.set_status(Some("10.0.0.3"), None).await;
        ticks(3).await;

        assert_eq!(drain(&mut rx), vec!["10.0.0.2".to_string()]);
        assert_eq!(backend.calls().await.len(), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_discards_sample_in_flight() {
        let backend = Arc::new(MockWifiBackend::new());
        backend.set_status(Some("10.0.0.2"), None).await;
        backend.hold_status().await;
        let poller = NotificationPoller::new(backend.clone(), LivenessField::IpAddress, PERIOD);

        let (tx, mut rx) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        ticks(1).await;
        // First sample is parked inside the status query
        assert_eq!(backend.calls().await, vec![BackendCall::Status]);

        poller.unsubscribe().await;
        backend.release_status().await;
        ticks(2).await;

        assert!(drain(&mut rx).is_empty());
        assert!(poller.state.lock().await.last_value.is_empty());
        assert!(!poller.is_polling().await);
        assert_eq!(backend.calls().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubscribe_discards_previous_sample_in_flight() {
        let backend = Arc::new(MockWifiBackend::new());
        backend.set_status(Some("10.0.0.2"), None).await;
        backend.hold_status().await;
        let poller = NotificationPoller::new(backend.clone(), LivenessField::IpAddress, PERIOD);

        let (tx, mut first) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        ticks(1).await;

        let (tx, mut second) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        backend.release_status().await;
        ticks(1).await;

        assert!(drain(&mut first).is_empty());
        assert_eq!(drain(&mut second), vec!["10.0.0.2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubscribe_starts_from_empty() {
        let backend = Arc::new(MockWifiBackend::new());
        backend.set_status(Some("10.0.0.2"), None).await;
        let poller = NotificationPoller::new(backend.clone(), LivenessField::IpAddress, PERIOD);

        let (tx, mut rx) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        ticks(1).await;
        poller.unsubscribe().await;

        let (tx, mut second) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        ticks(1).await;

        assert_eq!(drain(&mut rx), vec!["10.0.0.2".to_string()]);
        assert_eq!(drain(&mut second), vec!["10.0.0.2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_sink_stops_polling() {
        let backend = Arc::new(MockWifiBackend::new());
        let poller = NotificationPoller::new(backend.clone(), LivenessField::IpAddress, PERIOD);

        let (tx, rx) = mpsc::unbounded_channel();
        poller.subscribe(ChannelSink(tx)).await;
        drop(rx);
        ticks(1).await;

        assert!(!poller.is_polling().await);
        assert!(backend.calls().await.is_empty());
    }
}
