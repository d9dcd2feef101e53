use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::scenario::parameter::ParameterValue;
use crate::domain::scenario::scenario::Scenario;
use crate::domain::utils::id::{FunctionId, ScopeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    StartJobInstance,
    StopJobInstance,
    StartScenarioInstance,
    StopScenarioInstance,
}

impl FunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::StartJobInstance => "start_job_instance",
            FunctionKind::StopJobInstance => "stop_job_instance",
            FunctionKind::StartScenarioInstance => "start_scenario_instance",
            FunctionKind::StopScenarioInstance => "stop_scenario_instance",
        }
    }
}

/// Returned by every "append function" call of a [`Scenario`].
///
/// A handle can only be obtained for a function that already exists, so
/// waiting on handles can never create a forward reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionHandle {
    scope: ScopeId,
    id: FunctionId,
    kind: FunctionKind,
}

impl FunctionHandle {
    pub(crate) fn new(scope: ScopeId, id: FunctionId, kind: FunctionKind) -> Self {
        Self { scope, id, kind }
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }
}

/// Synchronization target: a function of a scenario, or a function of a scenario
/// embedded one level down through the StartScenarioInstance `host`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionRef {
    scope: ScopeId,
    host: Option<FunctionId>,
    id: FunctionId,
}

impl FunctionRef {
    pub fn local(handle: FunctionHandle) -> Self {
        Self { scope: handle.scope, host: None, id: handle.id }
    }

    pub(crate) fn own(scope: ScopeId, id: FunctionId) -> Self {
        Self { scope, host: None, id }
    }

    /// Only `Scenario::nested_ref` builds these, after checking both ends exist.
    pub(crate) fn nested(scope: ScopeId, host: FunctionId, id: FunctionId) -> Self {
        Self { scope, host: Some(host), id }
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn host(&self) -> Option<FunctionId> {
        self.host
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn is_nested(&self) -> bool {
        self.host.is_some()
    }

    /// The function of the owning scenario this reference gates on.
    pub fn outer_id(&self) -> FunctionId {
        self.host.unwrap_or(self.id)
    }

    pub(crate) fn rescope(&mut self, from: ScopeId, to: ScopeId) {
        if self.scope == from {
            self.scope = to;
        }
    }

    /// Ascending order: a host comes right before the functions nested in it.
    pub fn sort_key(&self) -> (u32, Option<u32>) {
        match self.host {
            Some(host) => (host.value, Some(self.id.value)),
            None => (self.id.value, None),
        }
    }
}

impl From<FunctionHandle> for FunctionRef {
    fn from(handle: FunctionHandle) -> Self {
        FunctionRef::local(handle)
    }
}

impl From<&FunctionHandle> for FunctionRef {
    fn from(handle: &FunctionHandle) -> Self {
        FunctionRef::local(*handle)
    }
}

/// When a function may start, as a precondition for the orchestrator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaitClause {
    finished: Vec<FunctionRef>,
    launched: Vec<FunctionRef>,
    delay: Duration,
}

impl WaitClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start only once `target` reached a terminal state.
    pub fn after_finished(mut self, target: impl Into<FunctionRef>) -> Self {
        push_unique(&mut self.finished, target.into());
        self
    }

    /// Start only once `target` has begun execution.
    pub fn after_launched(mut self, target: impl Into<FunctionRef>) -> Self {
        push_unique(&mut self.launched, target.into());
        self
    }

    pub fn after_all_finished<I, R>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<FunctionRef>,
    {
        for target in targets {
            push_unique(&mut self.finished, target.into());
        }
        self
    }

    pub fn after_all_launched<I, R>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<FunctionRef>,
    {
        for target in targets {
            push_unique(&mut self.launched, target.into());
        }
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn finished(&self) -> &[FunctionRef] {
        &self.finished
    }

    pub fn launched(&self) -> &[FunctionRef] {
        &self.launched
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn references(&self) -> impl Iterator<Item = &FunctionRef> {
        self.finished.iter().chain(self.launched.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.finished.is_empty() && self.launched.is_empty() && self.delay.is_zero()
    }

    pub(crate) fn rescope(&mut self, from: ScopeId, to: ScopeId) {
        self.finished.iter_mut().chain(self.launched.iter_mut()).for_each(|target| target.rescope(from, to));
    }
}

fn push_unique(targets: &mut Vec<FunctionRef>, target: FunctionRef) {
    if !targets.contains(&target) {
        targets.push(target);
    }
}

/// Declared output of a job: where it can be reached.
///
/// Post-processing reads this instead of digging into the job arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEndpoint {
    pub address: ParameterValue,
    pub port: Option<ParameterValue>,
}

impl JobEndpoint {
    pub fn new(address: impl Into<ParameterValue>) -> Self {
        Self { address: address.into(), port: None }
    }

    pub fn with_port(mut self, port: impl Into<ParameterValue>) -> Self {
        self.port = Some(port.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartJobInstance {
    pub entity: String,
    pub job_name: String,
    /// Scheduling hint handed to the job, not a synchronization mechanism.
    pub offset: Duration,
    pub arguments: BTreeMap<String, ParameterValue>,
    pub endpoint: Option<JobEndpoint>,
}

impl StartJobInstance {
    pub fn new(job_name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self { entity: entity.into(), job_name: job_name.into(), offset: Duration::ZERO, arguments: BTreeMap::new(), endpoint: None }
    }

    pub fn with_offset(mut self, offset: Duration) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: JobEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopJobInstance {
    pub targets: Vec<FunctionRef>,
}

#[derive(Debug, Clone)]
pub struct StartScenarioInstance {
    pub scenario: Box<Scenario>,
    /// Values for the embedded scenario's arguments, in the embedding scenario's terms.
    pub arguments: BTreeMap<String, ParameterValue>,
}

impl StartScenarioInstance {
    pub fn new(scenario: Scenario) -> Self {
        Self { scenario: Box::new(scenario), arguments: BTreeMap::new() }
    }

    pub fn bind(mut self, argument: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.arguments.insert(argument.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopScenarioInstance {
    pub target: FunctionRef,
}

#[derive(Debug, Clone)]
pub enum FunctionPayload {
    StartJobInstance(StartJobInstance),
    StopJobInstance(StopJobInstance),
    StartScenarioInstance(StartScenarioInstance),
    StopScenarioInstance(StopScenarioInstance),
}

impl FunctionPayload {
    pub fn kind(&self) -> FunctionKind {
        match self {
            FunctionPayload::StartJobInstance(_) => FunctionKind::StartJobInstance,
            FunctionPayload::StopJobInstance(_) => FunctionKind::StopJobInstance,
            FunctionPayload::StartScenarioInstance(_) => FunctionKind::StartScenarioInstance,
            FunctionPayload::StopScenarioInstance(_) => FunctionKind::StopScenarioInstance,
        }
    }

    /// The embedded scenario of a StartScenarioInstance keeps its own scope; only
    /// values expressed in the owning scenario's terms move.
    pub(crate) fn rescope(&mut self, from: ScopeId, to: ScopeId) {
        match self {
            FunctionPayload::StartJobInstance(job) => {
                job.arguments.values_mut().for_each(|value| value.rescope(from, to));
                if let Some(endpoint) = &mut job.endpoint {
                    endpoint.address.rescope(from, to);
                    if let Some(port) = &mut endpoint.port {
                        port.rescope(from, to);
                    }
                }
            }
            FunctionPayload::StopJobInstance(stop) => stop.targets.iter_mut().for_each(|target| target.rescope(from, to)),
            FunctionPayload::StartScenarioInstance(instance) => instance.arguments.values_mut().for_each(|value| value.rescope(from, to)),
            FunctionPayload::StopScenarioInstance(stop) => stop.target.rescope(from, to),
        }
    }
}

impl From<StartJobInstance> for FunctionPayload {
    fn from(payload: StartJobInstance) -> Self {
        FunctionPayload::StartJobInstance(payload)
    }
}

impl From<StartScenarioInstance> for FunctionPayload {
    fn from(payload: StartScenarioInstance) -> Self {
        FunctionPayload::StartScenarioInstance(payload)
    }
}

/// One schedulable step of a scenario (an "openbach function").
///
/// Only the wait clause may change after creation, through `Scenario::set_wait`.
#[derive(Debug, Clone)]
pub struct OpenbachFunction {
    pub(crate) id: FunctionId,
    pub(crate) payload: FunctionPayload,
    pub(crate) wait: WaitClause,
}

impl OpenbachFunction {
    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn kind(&self) -> FunctionKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &FunctionPayload {
        &self.payload
    }

    pub fn wait(&self) -> &WaitClause {
        &self.wait
    }

    pub(crate) fn rescope(&mut self, from: ScopeId, to: ScopeId) {
        self.wait.rescope(from, to);
        self.payload.rescope(from, to);
    }

    pub fn as_start_job(&self) -> Option<&StartJobInstance> {
        match &self.payload {
            FunctionPayload::StartJobInstance(job) => Some(job),
            _ => None,
        }
    }

    pub fn as_start_scenario(&self) -> Option<&StartScenarioInstance> {
        match &self.payload {
            FunctionPayload::StartScenarioInstance(instance) => Some(instance),
            _ => None,
        }
    }
}
