use std::sync::Arc;

use serde_json::Value;

use crate::domain::job_registry::JobRegistry;
use crate::domain::scenario::function::{
    FunctionHandle, FunctionKind, FunctionPayload, FunctionRef, OpenbachFunction, StartJobInstance, StartScenarioInstance, StopJobInstance,
    StopScenarioInstance, WaitClause,
};
use crate::domain::scenario::parameter::{ArgumentRef, ConstantRef, ParameterTable, ParameterValue, ValueReference};
use crate::domain::scenario::validation;
use crate::domain::utils::id::{FunctionId, IdAllocator, ScopeId};
use crate::error::{Error, Result};

/// A named, declarative graph of openbach functions.
///
/// Scenarios are append-only. Every call that could break an invariant is
/// validated before anything is stored, so a failing call leaves the scenario
/// exactly as it was.
#[derive(Debug)]
pub struct Scenario {
    name: String,
    description: String,
    scope: ScopeId,
    parameters: ParameterTable,
    functions: Vec<OpenbachFunction>,
    allocator: IdAllocator,
    registry: Arc<JobRegistry>,
}

/// A copy is a scenario of its own: it gets a fresh scope, and the references
/// the original held to itself now point into the copy. Handles and parameter
/// refs of one are rejected by the other.
impl Clone for Scenario {
    fn clone(&self) -> Self {
        let scope = ScopeId::new();
        let mut parameters = self.parameters.clone();
        parameters.rescope(scope);

        let functions = self
            .functions
            .iter()
            .map(|function| {
                let mut function = function.clone();
                function.rescope(self.scope, scope);
                function
            })
            .collect();

        Scenario {
            name: self.name.clone(),
            description: self.description.clone(),
            scope,
            parameters,
            functions,
            allocator: self.allocator.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl Scenario {
    pub fn new(name: &str, description: &str) -> Self {
        Self::with_registry(name, description, Arc::new(JobRegistry::permissive()))
    }

    /// Creates a scenario whose job launches are checked against `registry`.
    pub fn with_registry(name: &str, description: &str, registry: Arc<JobRegistry>) -> Self {
        let scope = ScopeId::new();
        Scenario {
            name: name.to_string(),
            description: description.to_string(),
            scope,
            parameters: ParameterTable::new(scope, name),
            functions: Vec::new(),
            allocator: IdAllocator::new(),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn parameters(&self) -> &ParameterTable {
        &self.parameters
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Functions in declaration order, which is also ascending id order.
    pub fn functions(&self) -> &[OpenbachFunction] {
        &self.functions
    }

    pub fn function(&self, id: FunctionId) -> Option<&OpenbachFunction> {
        self.functions.binary_search_by_key(&id, |f| f.id).ok().map(|index| &self.functions[index])
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn add_argument(&mut self, name: &str, description: &str) -> Result<ArgumentRef> {
        self.parameters.add_argument(name, description, None)
    }

    pub fn add_argument_with_default(&mut self, name: &str, description: &str, default: impl Into<Value>) -> Result<ArgumentRef> {
        self.parameters.add_argument(name, description, Some(default.into()))
    }

    pub fn add_constant(&mut self, name: &str, value: impl Into<Value>) -> Result<ConstantRef> {
        self.parameters.add_constant(name, value.into())
    }

    /// Appends a function and returns the handle later functions wait on.
    pub fn add_function(&mut self, payload: impl Into<FunctionPayload>, wait: WaitClause) -> Result<FunctionHandle> {
        let payload = payload.into();

        // Every resolvable reference already exists, so the new function cannot close a cycle.
        for target in wait.references() {
            self.resolve(target)?;
        }
        self.check_payload(&payload)?;

        let id = self.allocator.next_id();
        let kind = payload.kind();
        log::debug!("Scenario '{}': added {} #{}", self.name, kind.as_str(), id);

        self.functions.push(OpenbachFunction { id, payload, wait });
        Ok(FunctionHandle::new(self.scope, id, kind))
    }

    pub fn start_job_instance(&mut self, job: StartJobInstance, wait: WaitClause) -> Result<FunctionHandle> {
        self.add_function(FunctionPayload::StartJobInstance(job), wait)
    }

    pub fn stop_job_instances<I>(&mut self, targets: I, wait: WaitClause) -> Result<FunctionHandle>
    where
        I: IntoIterator<Item = FunctionHandle>,
    {
        let targets = targets.into_iter().map(FunctionRef::from).collect();
        self.add_function(FunctionPayload::StopJobInstance(StopJobInstance { targets }), wait)
    }

    pub fn start_scenario_instance(&mut self, instance: StartScenarioInstance, wait: WaitClause) -> Result<FunctionHandle> {
        self.add_function(FunctionPayload::StartScenarioInstance(instance), wait)
    }

    pub fn stop_scenario_instance(&mut self, target: FunctionHandle, wait: WaitClause) -> Result<FunctionHandle> {
        self.add_function(FunctionPayload::StopScenarioInstance(StopScenarioInstance { target: target.into() }), wait)
    }

    /// Replaces the wait clause of an existing function.
    ///
    /// Unlike `add_function`, the clause may name functions declared later, so
    /// self-waits and cycles are checked here.
    pub fn set_wait(&mut self, handle: FunctionHandle, wait: WaitClause) -> Result<()> {
        self.check_handle(handle)?;
        for target in wait.references() {
            self.resolve(target)?;
            if target.outer_id() == handle.id() {
                return Err(Error::Cycle { scenario: self.name.clone(), id: handle.id(), through: vec![handle.id()] });
            }
        }

        if let Some(through) = validation::find_cycle(&self.functions, Some((handle.id(), &wait))) {
            return Err(Error::Cycle { scenario: self.name.clone(), id: handle.id(), through });
        }

        if let Ok(index) = self.functions.binary_search_by_key(&handle.id(), |f| f.id) {
            self.functions[index].wait = wait;
        }
        Ok(())
    }

    /// Reference to function `inner` of the scenario embedded by `host`.
    pub fn nested_ref(&self, host: FunctionHandle, inner: FunctionId) -> Result<FunctionRef> {
        self.check_handle(host)?;
        let reference = FunctionRef::nested(self.scope, host.id(), inner);
        self.resolve(&reference)?;
        Ok(reference)
    }

    /// Same as [`Scenario::nested_ref`], from a handle minted by the embedded scenario.
    pub fn nested_handle_ref(&self, host: FunctionHandle, inner: FunctionHandle) -> Result<FunctionRef> {
        let embedded = self.embedded_scenario(host)?;
        if inner.scope() != embedded.scope {
            return Err(self.unresolved(format!("function #{} does not belong to scenario '{}'", inner.id(), embedded.name)));
        }
        self.nested_ref(host, inner.id())
    }

    /// The scenario embedded by a StartScenarioInstance of this scenario.
    pub fn embedded_scenario(&self, host: FunctionHandle) -> Result<&Scenario> {
        self.check_handle(host)?;
        self.function(host.id())
            .and_then(|f| f.as_start_scenario())
            .map(|instance| instance.scenario.as_ref())
            .ok_or_else(|| self.kind_mismatch(host.id(), "start_scenario_instance"))
    }

    pub(crate) fn check_handle(&self, handle: FunctionHandle) -> Result<()> {
        if handle.scope() != self.scope {
            return Err(self.unresolved(format!("function #{} belongs to scope {}", handle.id(), handle.scope())));
        }
        if self.function(handle.id()).is_none() {
            return Err(self.unresolved(format!("function #{}", handle.id())));
        }
        Ok(())
    }

    /// Finds the function a reference points at, one level deep for nested references.
    pub(crate) fn resolve(&self, reference: &FunctionRef) -> Result<&OpenbachFunction> {
        if reference.scope() != self.scope {
            return Err(self.unresolved(format!("function #{} belongs to scope {}", reference.id(), reference.scope())));
        }

        match reference.host() {
            None => self.function(reference.id()).ok_or_else(|| self.unresolved(format!("function #{}", reference.id()))),
            Some(host) => {
                let host_function = self.function(host).ok_or_else(|| self.unresolved(format!("host function #{}", host)))?;
                let instance = host_function.as_start_scenario().ok_or_else(|| self.kind_mismatch(host, "start_scenario_instance"))?;
                instance
                    .scenario
                    .function(reference.id())
                    .ok_or_else(|| self.unresolved(format!("function #{} of scenario '{}' hosted by #{}", reference.id(), instance.scenario.name, host)))
            }
        }
    }

    pub(crate) fn check_payload(&self, payload: &FunctionPayload) -> Result<()> {
        match payload {
            FunctionPayload::StartJobInstance(job) => {
                self.registry.validate(job)?;
                for value in job.arguments.values() {
                    self.check_value(value)?;
                }
                if let Some(endpoint) = &job.endpoint {
                    self.check_value(&endpoint.address)?;
                    if let Some(port) = &endpoint.port {
                        self.check_value(port)?;
                    }
                }
                Ok(())
            }
            FunctionPayload::StopJobInstance(stop) => {
                for target in &stop.targets {
                    self.check_stop_target(target, FunctionKind::StartJobInstance)?;
                }
                Ok(())
            }
            FunctionPayload::StartScenarioInstance(instance) => self.check_bindings(instance),
            FunctionPayload::StopScenarioInstance(stop) => self.check_stop_target(&stop.target, FunctionKind::StartScenarioInstance),
        }
    }

    fn check_stop_target(&self, target: &FunctionRef, expected: FunctionKind) -> Result<()> {
        let function = self.resolve(target)?;
        if target.is_nested() || function.kind() != expected {
            return Err(self.kind_mismatch(target.outer_id(), expected.as_str()));
        }
        Ok(())
    }

    /// Every reference inside `value` must point into this scenario.
    pub(crate) fn check_value(&self, value: &ParameterValue) -> Result<()> {
        for reference in value.references() {
            match reference {
                ValueReference::Argument(argument) => {
                    if !self.parameters.resolves_argument(argument) {
                        return Err(self.unresolved(format!("argument '{}'", argument.name())));
                    }
                }
                ValueReference::Constant(constant) => {
                    if self.parameters.constant_value(constant).is_none() {
                        return Err(self.unresolved(format!("constant '{}'", constant.name())));
                    }
                }
                ValueReference::Function(function) => {
                    self.resolve(function)?;
                }
            }
        }
        Ok(())
    }

    /// Bindings of an embedded scenario: complete, known, and expressed in this scenario's terms.
    pub(crate) fn check_bindings(&self, instance: &StartScenarioInstance) -> Result<()> {
        let embedded = &instance.scenario;
        if embedded.scope == self.scope {
            return Err(self.unresolved(format!("scenario '{}' cannot embed itself", embedded.name)));
        }

        if let Some(missing) = embedded.parameters.required_arguments().find(|a| !instance.arguments.contains_key(&a.name)) {
            return Err(Error::MissingArgument { scenario: embedded.name.clone(), argument: missing.name.clone() });
        }

        for (name, value) in &instance.arguments {
            if embedded.parameters.argument(name).is_none() {
                return Err(self.unresolved(format!("argument '{}' of scenario '{}'", name, embedded.name)));
            }
            if value.references().iter().any(|r| matches!(r, ValueReference::Function(_))) {
                return Err(self.unresolved(format!("function reference bound to argument '{}' of scenario '{}'", name, embedded.name)));
            }
            self.check_value(value)?;
        }
        Ok(())
    }

    pub(crate) fn unresolved(&self, target: String) -> Error {
        Error::UnresolvedReference { scenario: self.name.clone(), scope: self.scope, target }
    }

    fn kind_mismatch(&self, id: FunctionId, expected: &'static str) -> Error {
        Error::TargetKindMismatch { scenario: self.name.clone(), id, expected }
    }
}
