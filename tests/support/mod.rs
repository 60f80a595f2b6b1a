// ABOUTME: Test support utilities.
// ABOUTME: In-memory supervisor, connector, and suspension store fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use fleetvisor::discovery::ServiceDomain;
use fleetvisor::drain::{ConsumerStatus, DrainError, SuspensionStore};
use fleetvisor::supervisor::{
    BulkStatus, Connector, FaultCode, ProcessDescriptor, ProcessState, Signal, SupervisorError,
    SupervisorOps,
};
use fleetvisor::types::DomainName;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Once};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("fleetvisor=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn domain(name: &str) -> ServiceDomain {
    ServiceDomain::new(
        DomainName::new(name).unwrap(),
        format!("/nonexistent/{name}.sock"),
    )
}

/// A call made against a [`FakeSupervisor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Ping,
    List,
    Get(String),
    Start(String, bool),
    Stop(String, bool),
    Signal(String, String),
    StartAll(bool),
    StopAll(bool),
}

#[derive(Default)]
struct FakeState {
    processes: BTreeMap<String, ProcessDescriptor>,
    calls: Vec<Call>,
    ignore_stop: HashSet<String>,
    unkillable: HashSet<String>,
    start_lands_in: HashMap<String, ProcessState>,
    unreachable: bool,
}

/// Supervisor daemon held in memory, keyed by `group:name`.
pub struct FakeSupervisor {
    group: String,
    state: Mutex<FakeState>,
}

impl FakeSupervisor {
    pub fn new(group: &str, processes: &[(&str, ProcessState)]) -> Arc<Self> {
        let mut state = FakeState::default();
        for (name, s) in processes {
            let p = ProcessDescriptor::new(*name, group, *s);
            state.processes.insert(p.api_name(), p);
        }
        Arc::new(Self {
            group: group.to_string(),
            state: Mutex::new(state),
        })
    }

    fn key(&self, name: &str) -> String {
        if name.contains(':') {
            name.to_string()
        } else {
            format!("{}:{name}", self.group)
        }
    }

    /// Stop calls succeed but the process keeps running.
    pub fn ignore_stop(&self, name: &str) {
        let key = self.key(name);
        self.state.lock().ignore_stop.insert(key);
    }

    /// Kill signals are accepted but have no effect.
    pub fn unkillable(&self, name: &str) {
        let key = self.key(name);
        self.state.lock().unkillable.insert(key);
    }

    /// State a process enters when started (default RUNNING).
    pub fn start_lands_in(&self, name: &str, state: ProcessState) {
        let key = self.key(name);
        self.state.lock().start_lands_in.insert(key, state);
    }

    /// Every call fails with a connection error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Change a process state behind the caller's back.
    pub fn set_state(&self, name: &str, state: ProcessState) {
        let key = self.key(name);
        if let Some(p) = self.state.lock().processes.get_mut(&key) {
            p.state = state;
        }
    }

    pub fn state_of(&self, name: &str) -> ProcessState {
        let key = self.key(name);
        self.state
            .lock()
            .processes
            .get(&key)
            .map(|p| p.state)
            .unwrap_or(ProcessState::Unknown)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn starts_of(&self, name: &str) -> usize {
        let key = self.key(name);
        self.count(|c| matches!(c, Call::Start(n, _) if *n == key))
    }

    pub fn stops_of(&self, name: &str) -> usize {
        let key = self.key(name);
        self.count(|c| matches!(c, Call::Stop(n, _) if *n == key))
    }

    fn enter(&self, call: Call) -> Result<parking_lot::MutexGuard<'_, FakeState>, SupervisorError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.unreachable {
            return Err(SupervisorError::connection(
                format!("{}.sock", self.group),
                "connection refused",
            ));
        }
        Ok(state)
    }
}

fn stop_one(state: &mut FakeState, key: &str) -> Result<(), SupervisorError> {
    let ignore = state.ignore_stop.contains(key);
    let p = state
        .processes
        .get_mut(key)
        .ok_or_else(|| SupervisorError::NotFound(key.to_string()))?;
    if p.state.is_stopped() {
        return Err(SupervisorError::NotRunning(key.to_string()));
    }
    if !ignore {
        p.state = ProcessState::Stopped;
    }
    Ok(())
}

fn start_one(state: &mut FakeState, key: &str) -> Result<(), SupervisorError> {
    let target = state
        .start_lands_in
        .get(key)
        .copied()
        .unwrap_or(ProcessState::Running);
    let p = state
        .processes
        .get_mut(key)
        .ok_or_else(|| SupervisorError::NotFound(key.to_string()))?;
    if matches!(p.state, ProcessState::Running | ProcessState::Starting) {
        return Err(SupervisorError::AlreadyStarted(key.to_string()));
    }
    p.state = target;
    Ok(())
}

fn bulk(p: &ProcessDescriptor, result: Result<(), SupervisorError>) -> BulkStatus {
    let status = match &result {
        Ok(()) => FaultCode::Success.code(),
        Err(SupervisorError::NotRunning(_)) => FaultCode::NotRunning.code(),
        Err(SupervisorError::AlreadyStarted(_)) => FaultCode::AlreadyStarted.code(),
        Err(_) => FaultCode::Failed.code(),
    };
    BulkStatus {
        name: p.name.clone(),
        group: p.group.clone(),
        status,
        description: result.err().map(|e| e.to_string()).unwrap_or_else(|| "OK".into()),
    }
}

#[async_trait]
impl SupervisorOps for FakeSupervisor {
    async fn ping(&self) -> Result<(), SupervisorError> {
        self.enter(Call::Ping).map(|_| ())
    }

    async fn list_processes(&self) -> Result<Vec<ProcessDescriptor>, SupervisorError> {
        let state = self.enter(Call::List)?;
        Ok(state.processes.values().cloned().collect())
    }

    async fn get_process(&self, name: &str) -> Result<ProcessDescriptor, SupervisorError> {
        let key = self.key(name);
        let state = self.enter(Call::Get(key.clone()))?;
        state
            .processes
            .get(&key)
            .cloned()
            .ok_or(SupervisorError::NotFound(key))
    }

    async fn start_process(&self, name: &str, wait: bool) -> Result<(), SupervisorError> {
        let key = self.key(name);
        let mut state = self.enter(Call::Start(key.clone(), wait))?;
        start_one(&mut state, &key)
    }

    async fn stop_process(&self, name: &str, wait: bool) -> Result<(), SupervisorError> {
        let key = self.key(name);
        let mut state = self.enter(Call::Stop(key.clone(), wait))?;
        stop_one(&mut state, &key)
    }

    async fn signal_process(&self, name: &str, signal: &Signal) -> Result<(), SupervisorError> {
        let key = self.key(name);
        let mut state = self.enter(Call::Signal(key.clone(), signal.to_string()))?;
        let unkillable = state.unkillable.contains(&key);
        let p = state
            .processes
            .get_mut(&key)
            .ok_or_else(|| SupervisorError::NotFound(key.clone()))?;
        if p.state.is_stopped() {
            return Err(SupervisorError::NotRunning(key));
        }
        if *signal == Signal::kill() && !unkillable {
            p.state = ProcessState::Stopped;
        }
        Ok(())
    }

    async fn start_all(&self, wait: bool) -> Result<Vec<BulkStatus>, SupervisorError> {
        let mut state = self.enter(Call::StartAll(wait))?;
        let keys: Vec<String> = state.processes.keys().cloned().collect();
        let mut out = Vec::new();
        for key in keys {
            let result = start_one(&mut state, &key);
            out.push(bulk(&state.processes[&key], result));
        }
        Ok(out)
    }

    async fn stop_all(&self, wait: bool) -> Result<Vec<BulkStatus>, SupervisorError> {
        let mut state = self.enter(Call::StopAll(wait))?;
        let keys: Vec<String> = state
            .processes
            .iter()
            .filter(|(_, p)| !p.state.is_stopped())
            .map(|(k, _)| k.clone())
            .collect();
        let mut out = Vec::new();
        for key in keys {
            let result = stop_one(&mut state, &key);
            out.push(bulk(&state.processes[&key], result));
        }
        Ok(out)
    }
}

/// Hands out fake supervisors by domain name; unknown domains are unreachable.
#[derive(Default)]
pub struct FakeConnector {
    domains: HashMap<String, Arc<FakeSupervisor>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, domain: &str, supervisor: Arc<FakeSupervisor>) -> Self {
        self.domains.insert(domain.to_string(), supervisor);
        self
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        domain: &ServiceDomain,
    ) -> Result<Arc<dyn SupervisorOps>, SupervisorError> {
        let Some(supervisor) = self.domains.get(domain.name.as_str()) else {
            return Err(SupervisorError::connection(
                domain.socket_path.display().to_string(),
                "no such socket",
            ));
        };
        supervisor.ping().await?;
        Ok(Arc::clone(supervisor) as Arc<dyn SupervisorOps>)
    }
}

/// Suspension store held in memory that records every call.
#[derive(Default)]
pub struct MemoryStore {
    pub flags: Mutex<HashSet<String>>,
    pub consumers: Mutex<Vec<ConsumerStatus>>,
    pub noops: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<&'static str>>,
    /// Clear the flag right after it is set, so verify reads it as absent.
    pub drop_flag: Mutex<bool>,
    pub fail_resume: Mutex<bool>,
    pub fail_consumers: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }
}

#[async_trait]
impl SuspensionStore for MemoryStore {
    async fn set_flag(&self, key: &str) -> Result<(), DrainError> {
        self.calls.lock().push("set_flag");
        if !*self.drop_flag.lock() {
            self.flags.lock().insert(key.to_string());
        }
        Ok(())
    }

    async fn clear_flag(&self, key: &str) -> Result<bool, DrainError> {
        self.calls.lock().push("clear_flag");
        if *self.fail_resume.lock() {
            return Err(DrainError::Unavailable("store offline".to_string()));
        }
        Ok(self.flags.lock().remove(key))
    }

    async fn flag_exists(&self, key: &str) -> Result<bool, DrainError> {
        self.calls.lock().push("flag_exists");
        Ok(self.flags.lock().contains(key))
    }

    async fn consumers(&self) -> Result<Vec<ConsumerStatus>, DrainError> {
        self.calls.lock().push("consumers");
        if *self.fail_consumers.lock() {
            return Err(DrainError::Unavailable("store offline".to_string()));
        }
        Ok(self.consumers.lock().clone())
    }

    async fn enqueue_noop(&self, queue: &str) -> Result<(), DrainError> {
        self.calls.lock().push("enqueue_noop");
        self.noops.lock().push(queue.to_string());
        Ok(())
    }
}
