//! In-memory collector for driving the supervisor in tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentlink::{
    Channel, ChannelState, ConnectionSupervisor, DialTarget, Dialer, Event, EventKind, HostInfo,
    Identity, RegistrationReceipt, SessionConfig, StateSink, SupervisorConfig, TaskDescriptor,
    TaskResult, TaskStream, TelemetrySnapshot, TransportError,
};
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

pub fn session() -> SessionConfig {
    SessionConfig::new(
        "collector.test:5555",
        Identity {
            client_secret: "s3cret".into(),
            client_id: "agent-1".into(),
        },
    )
}

/// Supervisor over `dialer` reporting a constant snapshot, with no subscribers.
pub fn supervisor(dialer: Arc<ScriptedDialer>, cfg: SupervisorConfig) -> ConnectionSupervisor {
    ConnectionSupervisor::builder(session(), dialer)
        .with_config(cfg)
        .with_snapshot_source(Arc::new(|| Some(TelemetrySnapshot::new(b"load=1".to_vec()))))
        .with_subscribers(Vec::new())
        .build()
        .expect("valid session")
}

/// Waits for the next event of `kind`, skipping everything else.
pub async fn next_event(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    loop {
        match rx.recv().await {
            Ok(ev) if ev.kind == kind => return ev,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => panic!("bus closed before {kind:?}"),
        }
    }
}

pub enum DialStep {
    Refuse,
    Connect(Arc<ScriptedChannel>),
}

/// Plays dial outcomes in order; refuses once the script runs out.
pub struct ScriptedDialer {
    steps: Mutex<VecDeque<DialStep>>,
    dials: Mutex<Vec<Instant>>,
}

impl ScriptedDialer {
    pub fn new(steps: Vec<DialStep>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            dials: Mutex::new(Vec::new()),
        })
    }

    pub fn dial_times(&self) -> Vec<Instant> {
        self.dials.lock().expect("dials lock").clone()
    }

    pub fn dial_count(&self) -> usize {
        self.dials.lock().expect("dials lock").len()
    }

    /// Sleeps in small steps until `n` dials have happened.
    pub async fn wait_for_dials(&self, n: usize) {
        while self.dial_count() < n {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn dial(&self, target: &DialTarget) -> Result<Arc<dyn Channel>, TransportError> {
        assert_eq!(target.address, "collector.test:5555");
        self.dials.lock().expect("dials lock").push(Instant::now());
        let step = self.steps.lock().expect("steps lock").pop_front();
        match step {
            Some(DialStep::Connect(channel)) => Ok(channel),
            Some(DialStep::Refuse) | None => Err(TransportError::new("connection refused")),
        }
    }
}

/// Test-side ends of one channel's streams.
pub struct Collector {
    pub tasks: mpsc::UnboundedSender<TaskDescriptor>,
    pub results: mpsc::UnboundedReceiver<TaskResult>,
    pub snapshots: mpsc::UnboundedReceiver<TelemetrySnapshot>,
}

pub struct ScriptedChannel {
    state: Mutex<ChannelState>,
    reject_registration: bool,
    fail_state_on: Option<u32>,
    snapshots: mpsc::UnboundedSender<TelemetrySnapshot>,
    tasks: Mutex<Option<mpsc::UnboundedReceiver<TaskDescriptor>>>,
    results: mpsc::UnboundedSender<TaskResult>,
    closed: AtomicBool,
}

impl ScriptedChannel {
    pub fn healthy() -> (Arc<Self>, Collector) {
        Self::build(false, None)
    }

    /// State stream send number `n` (1-based) fails.
    pub fn failing_state_on(n: u32) -> (Arc<Self>, Collector) {
        Self::build(false, Some(n))
    }

    pub fn rejecting_registration() -> (Arc<Self>, Collector) {
        Self::build(true, None)
    }

    fn build(reject_registration: bool, fail_state_on: Option<u32>) -> (Arc<Self>, Collector) {
        let (snap_tx, snap_rx) = mpsc::unbounded_channel();
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (res_tx, res_rx) = mpsc::unbounded_channel();
        let channel = Arc::new(Self {
            state: Mutex::new(ChannelState::Ready),
            reject_registration,
            fail_state_on,
            snapshots: snap_tx,
            tasks: Mutex::new(Some(task_rx)),
            results: res_tx,
            closed: AtomicBool::new(false),
        });
        let collector = Collector {
            tasks: task_tx,
            results: res_rx,
            snapshots: snap_rx,
        };
        (channel, collector)
    }

    pub fn set_state(&self, state: ChannelState) {
        *self.state.lock().expect("state lock") = state;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    fn state(&self) -> ChannelState {
        *self.state.lock().expect("state lock")
    }

    async fn report_host_info(&self, _host: &HostInfo) -> Result<RegistrationReceipt, TransportError> {
        if self.reject_registration {
            return Err(TransportError::with_code(16, "unauthenticated"));
        }
        Ok(RegistrationReceipt(1_700_000_000))
    }

    async fn open_state_stream(&self) -> Result<Box<dyn StateSink>, TransportError> {
        Ok(Box::new(ScriptedSink {
            tx: self.snapshots.clone(),
            fail_on: self.fail_state_on,
            sent: AtomicU32::new(0),
        }))
    }

    async fn open_task_stream(&self) -> Result<Box<dyn TaskStream>, TransportError> {
        let rx = self
            .tasks
            .lock()
            .expect("tasks lock")
            .take()
            .ok_or_else(|| TransportError::new("task stream already open"))?;
        Ok(Box::new(ScriptedTasks {
            rx,
            results: self.results.clone(),
        }))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct ScriptedSink {
    tx: mpsc::UnboundedSender<TelemetrySnapshot>,
    fail_on: Option<u32>,
    sent: AtomicU32,
}

#[async_trait]
impl StateSink for ScriptedSink {
    async fn send(&mut self, snapshot: TelemetrySnapshot) -> Result<(), TransportError> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(n) == self.fail_on {
            return Err(TransportError::new("broken pipe"));
        }
        let _ = self.tx.send(snapshot);
        Ok(())
    }
}

struct ScriptedTasks {
    rx: mpsc::UnboundedReceiver<TaskDescriptor>,
    results: mpsc::UnboundedSender<TaskResult>,
}

#[async_trait]
impl TaskStream for ScriptedTasks {
    async fn recv(&mut self) -> Result<Option<TaskDescriptor>, TransportError> {
        Ok(self.rx.recv().await)
    }

    async fn send(&mut self, result: TaskResult) -> Result<(), TransportError> {
        self.results
            .send(result)
            .map_err(|_| TransportError::new("collector gone"))
    }
}
