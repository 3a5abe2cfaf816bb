//! Poll loop driving a [`JourneyPort`] on a fixed cadence with a shorter retry delay.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BoardConfig;
use crate::ports::{JourneyPort, PortError};
use crate::timetable::TrainsEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Delays used by the poll loop.
pub struct PollTiming {
    /// Delay before the first fetch.
    pub initial_delay: Duration,
    /// Delay after a successful fetch, and after failures once data was loaded.
    pub update_interval: Duration,
    /// Delay after a failure while nothing has been loaded yet.
    pub retry_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Whether the presenter already holds data.
pub enum SchedulerState {
    /// No fetch has succeeded yet; failures retry quickly.
    #[default]
    AwaitingFirstSuccess,
    /// Data is displayed; failures only make it stale, so keep the normal cadence.
    SteadyState,
}

impl SchedulerState {
    /// State after a successful fetch.
    #[must_use]
    pub fn on_success(self) -> Self {
        Self::SteadyState
    }

    /// Delay before the next fetch given whether the last one succeeded.
    #[must_use]
    pub fn next_delay(self, succeeded: bool, timing: &PollTiming) -> Duration {
        match (succeeded, self) {
            (true, _) | (false, Self::SteadyState) => timing.update_interval,
            (false, Self::AwaitingFirstSuccess) => timing.retry_delay,
        }
    }
}

/// Periodically fetches journeys and sends each successful result to the presenter.
pub struct PollScheduler {
    port: Arc<dyn JourneyPort>,
    events: mpsc::Sender<TrainsEvent>,
}

impl PollScheduler {
    /// Create a scheduler emitting [`TrainsEvent`]s on `events`.
    #[must_use]
    pub fn new(port: Arc<dyn JourneyPort>, events: mpsc::Sender<TrainsEvent>) -> Self {
        Self { port, events }
    }

    /// Validate `config` and spawn the poll loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidConfig`] when the configuration cannot drive a loop.
    pub fn start(self, config: BoardConfig) -> Result<SchedulerHandle, PortError> {
        config.validate()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        info!(
            id = %config.id,
            provider = self.port.name(),
            update_interval_ms = config.update_interval_ms,
            retry_delay_ms = config.retry_delay_ms,
            max_nb_transfers = config.max_nb_transfers,
            "starting poll scheduler"
        );
        if config.debugging {
            info!("debug mode enabled");
        }

        let task = tokio::spawn(poll_loop(self.port, self.events, config, shutdown_rx));

        Ok(SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        })
    }

    /// Wait for the first configuration on `configs` and start with it.
    ///
    /// Configurations arriving afterwards are logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidConfig`] when the channel closes before a
    /// configuration arrives or the configuration is invalid.
    pub async fn start_from(
        self,
        mut configs: mpsc::Receiver<BoardConfig>,
    ) -> Result<SchedulerHandle, PortError> {
        let config = configs.recv().await.ok_or_else(|| {
            PortError::InvalidConfig("configuration channel closed before startup".to_owned())
        })?;
        let handle = self.start(config)?;

        let mut shutdown = handle.shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    next = configs.recv() => match next {
                        Some(ignored) => {
                            debug!(id = %ignored.id, "scheduler already started, ignoring configuration");
                        }
                        None => break,
                    },
                }
            }
        });

        Ok(handle)
    }
}

/// Handle to a running poll loop.
///
/// Dropping the handle stops the loop as well.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop polling. Neither a scheduled nor an in-flight fetch will emit afterwards.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether the poll loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop polling and wait for the loop to exit.
    pub async fn stopped(self) {
        self.stop();
        if let Err(err) = self.task.await {
            warn!(error = %err, "poll loop ended abnormally");
        }
    }
}

async fn poll_loop(
    port: Arc<dyn JourneyPort>,
    events: mpsc::Sender<TrainsEvent>,
    config: BoardConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let timing = config.timing();
    let mut state = SchedulerState::default();
    let mut delay = timing.initial_delay;

    // The next sleep only starts once the previous fetch has finished, so a
    // slow fetch delays the cadence instead of stacking up requests.
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            () = tokio::time::sleep(delay) => {}
        }

        let outcome = match config.query_at(Local::now().naive_local()) {
            Ok(query) => {
                debug!(provider = port.name(), ?query, "fetching journeys");
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    outcome = port.journeys(&query) => outcome,
                }
            }
            Err(err) => Err(err),
        };

        let succeeded = outcome.is_ok();
        match outcome {
            Ok(transports) => {
                debug!(rows = transports.len(), "fetched timetable");
                let event = TrainsEvent {
                    id: config.id.clone(),
                    transports,
                };
                // A full channel must not keep the loop alive past stop().
                let sent = tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    sent = events.send(event) => sent,
                };
                if sent.is_err() {
                    info!("records channel closed");
                    break;
                }
                state = state.on_success();
            }
            Err(err) => {
                warn!(provider = port.name(), error = %err, ?state, "journey fetch failed");
            }
        }

        delay = state.next_delay(succeeded, &timing);
        debug!(delay_ms = delay.as_millis(), "next fetch scheduled");
    }

    info!(id = %config.id, "poll scheduler stopped");
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::model::{JourneyQuery, StationCode, TransportRecord};
    use crate::timetable::Timetable;

    type Outcome = Result<Vec<TransportRecord>, PortError>;

    struct ScriptedPort {
        script: Mutex<VecDeque<Outcome>>,
        calls: Mutex<Vec<Instant>>,
        latency: Duration,
    }

    impl ScriptedPort {
        fn new(script: Vec<Outcome>) -> Arc<Self> {
            Self::slow(script, Duration::ZERO)
        }

        fn slow(script: Vec<Outcome>, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
                latency,
            })
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl JourneyPort for ScriptedPort {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn journeys(&self, _query: &JourneyQuery) -> Outcome {
            self.calls.lock().expect("calls lock").push(Instant::now());
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn server_error() -> Outcome {
        Err(PortError::Api {
            status: 500,
            body: String::from("boom"),
        })
    }

    fn rows(count: usize) -> Outcome {
        Ok(vec![TransportRecord::waiting(); count])
    }

    fn config() -> BoardConfig {
        BoardConfig {
            id: String::from("board"),
            departure_station: Some(StationCode("stop_area:A".into())),
            arrival_station: Some(StationCode("stop_area:B".into())),
            api_key: Some(String::from("key")),
            update_interval_ms: 60_000,
            retry_delay_ms: 10_000,
            initial_load_delay_ms: 0,
            ..BoardConfig::default()
        }
    }

    fn gap(calls: &[Instant], index: usize) -> Duration {
        calls[index].duration_since(calls[index - 1])
    }

    #[test]
    fn next_delay_depends_on_state() {
        let timing = config().timing();
        let waiting = SchedulerState::AwaitingFirstSuccess;
        let steady = waiting.on_success();

        assert_eq!(steady, SchedulerState::SteadyState);
        assert_eq!(waiting.next_delay(false, &timing), timing.retry_delay);
        assert_eq!(waiting.next_delay(true, &timing), timing.update_interval);
        assert_eq!(steady.next_delay(false, &timing), timing.update_interval);
        assert_eq!(steady.next_delay(true, &timing), timing.update_interval);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (tx, _rx) = mpsc::channel(1);
        let mut config = config();
        config.api_key = None;

        let result = PollScheduler::new(ScriptedPort::new(Vec::new()), tx).start(config);
        assert!(matches!(result, Err(PortError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_retries_after_retry_delay() {
        let port = ScriptedPort::new(vec![server_error(), rows(1)]);
        let (tx, mut rx) = mpsc::channel(4);
        let started = Instant::now();

        let handle = PollScheduler::new(Arc::clone(&port) as Arc<dyn JourneyPort>, tx)
            .start(config())
            .expect("valid config");
        let event = rx.recv().await.expect("event after retry");
        assert_eq!(event.transports.len(), 1);

        let calls = port.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], started);
        assert_eq!(gap(&calls, 1), Duration::from_secs(10));
        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_after_success_keeps_update_interval() {
        let port = ScriptedPort::new(vec![rows(2), server_error(), rows(3)]);
        let (tx, mut rx) = mpsc::channel(4);

        let handle = PollScheduler::new(Arc::clone(&port) as Arc<dyn JourneyPort>, tx)
            .start(config())
            .expect("valid config");
        rx.recv().await.expect("first event");
        let second = rx.recv().await.expect("second event");
        assert_eq!(second.transports.len(), 3);

        let calls = port.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(gap(&calls, 1), Duration::from_secs(60));
        assert_eq!(gap(&calls, 2), Duration::from_secs(60));
        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn initial_load_delay_postpones_first_fetch() {
        let port = ScriptedPort::new(vec![rows(1)]);
        let (tx, mut rx) = mpsc::channel(4);
        let mut config = config();
        config.initial_load_delay_ms = 5_000;
        let started = Instant::now();

        let handle = PollScheduler::new(Arc::clone(&port) as Arc<dyn JourneyPort>, tx)
            .start(config)
            .expect("valid config");
        rx.recv().await.expect("first event");

        assert_eq!(port.calls()[0].duration_since(started), Duration::from_secs(5));
        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_do_not_overlap() {
        let port = ScriptedPort::slow(vec![rows(1), rows(1)], Duration::from_secs(90));
        let (tx, mut rx) = mpsc::channel(4);

        let handle = PollScheduler::new(Arc::clone(&port) as Arc<dyn JourneyPort>, tx)
            .start(config())
            .expect("valid config");
        rx.recv().await.expect("first event");
        rx.recv().await.expect("second event");

        let calls = port.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(gap(&calls, 1), Duration::from_secs(150));
        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_scheduled_fetch() {
        let port = ScriptedPort::new(vec![rows(1), rows(1)]);
        let (tx, mut rx) = mpsc::channel(4);

        let handle = PollScheduler::new(Arc::clone(&port) as Arc<dyn JourneyPort>, tx)
            .start(config())
            .expect("valid config");
        rx.recv().await.expect("first event");

        handle.stop();
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(port.calls().len(), 1);
        assert!(handle.is_finished());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_fetch() {
        let port = ScriptedPort::slow(vec![rows(4)], Duration::from_secs(30));
        let (tx, mut rx) = mpsc::channel(4);

        let handle = PollScheduler::new(Arc::clone(&port) as Arc<dyn JourneyPort>, tx)
            .start(config())
            .expect("valid config");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(port.calls().len(), 1);

        handle.stopped().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_send_to_full_channel() {
        let port = ScriptedPort::new(vec![rows(1), rows(2)]);
        let (tx, mut rx) = mpsc::channel(1);

        let handle = PollScheduler::new(Arc::clone(&port) as Arc<dyn JourneyPort>, tx)
            .start(config())
            .expect("valid config");

        // First event fills the channel, the second fetch blocks on send.
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(port.calls().len(), 2);

        let stopped = tokio::time::timeout(Duration::from_secs(600), handle.stopped()).await;
        assert!(stopped.is_ok());

        let first = rx.recv().await.expect("first event");
        assert_eq!(first.transports.len(), 1);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_displayed_rows() {
        let port = ScriptedPort::new(vec![rows(2), server_error(), server_error()]);
        let (tx, mut rx) = mpsc::channel(4);
        let mut timetable = Timetable::new("board");

        let handle = PollScheduler::new(Arc::clone(&port) as Arc<dyn JourneyPort>, tx)
            .start(config())
            .expect("valid config");
        timetable.apply(rx.recv().await.expect("first event"));

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(port.calls().len(), 3);
        while let Ok(event) = rx.try_recv() {
            timetable.apply(event);
        }
        assert_eq!(timetable.transports().len(), 2);
        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn only_first_configuration_is_used() {
        let port = ScriptedPort::new(vec![rows(1)]);
        let (config_tx, config_rx) = mpsc::channel(4);
        let (tx, mut rx) = mpsc::channel(4);

        let mut second = config();
        second.id = String::from("late");
        config_tx.send(config()).await.expect("receiver alive");
        config_tx.send(second).await.expect("receiver alive");

        let handle = PollScheduler::new(Arc::clone(&port) as Arc<dyn JourneyPort>, tx)
            .start_from(config_rx)
            .await
            .expect("valid config");
        let event = rx.recv().await.expect("first event");
        assert_eq!(event.id, "board");
        handle.stopped().await;
    }

    #[tokio::test]
    async fn closed_configuration_channel_fails_startup() {
        let (config_tx, config_rx) = mpsc::channel::<BoardConfig>(1);
        drop(config_tx);
        let (tx, _rx) = mpsc::channel(1);

        let result = PollScheduler::new(ScriptedPort::new(Vec::new()), tx)
            .start_from(config_rx)
            .await;
        assert!(matches!(result, Err(PortError::InvalidConfig(_))));
    }
}
