use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::api::scenario_dto::{
    ArgumentDto, ConstantDto, FunctionDto, FunctionKindDto, FunctionPayloadDto, ReferenceDto, ScenarioDto, StartJobInstanceDto,
    StartScenarioInstanceDto, StopJobInstanceDto, StopScenarioInstanceDto,
};
use crate::domain::scenario::function::{FunctionKind, FunctionPayload, FunctionRef, OpenbachFunction};
use crate::domain::scenario::parameter::{ArgumentRef, ParameterValue};
use crate::domain::scenario::scenario::Scenario;
use crate::error::Result;

// Helper to map the internal FunctionKind to its DTO
pub fn map_function_kind(kind: FunctionKind) -> FunctionKindDto {
    match kind {
        FunctionKind::StartJobInstance => FunctionKindDto::StartJobInstance,
        FunctionKind::StopJobInstance => FunctionKindDto::StopJobInstance,
        FunctionKind::StartScenarioInstance => FunctionKindDto::StartScenarioInstance,
        FunctionKind::StopScenarioInstance => FunctionKindDto::StopScenarioInstance,
    }
}

impl From<&FunctionRef> for ReferenceDto {
    fn from(reference: &FunctionRef) -> Self {
        match reference.host() {
            Some(host) => ReferenceDto::Nested(host.value, reference.id().value),
            None => ReferenceDto::Local(reference.id().value),
        }
    }
}

fn reference_value(reference: &FunctionRef) -> Value {
    match reference.host() {
        Some(host) => json!([host.value, reference.id().value]),
        None => json!(reference.id().value),
    }
}

/// Resolves a payload value in the terms of `scenario`.
///
/// Constants are inlined, function references become ids, and arguments are
/// handed to `argument`, which decides what an unbound placeholder turns into.
pub(crate) fn resolve_value_with(value: &ParameterValue, scenario: &Scenario, argument: &dyn Fn(&ArgumentRef) -> Result<Value>) -> Result<Value> {
    match value {
        ParameterValue::Literal(literal) => Ok(literal.clone()),
        ParameterValue::Argument(reference) => argument(reference),
        ParameterValue::Constant(reference) => scenario
            .parameters()
            .constant_value(reference)
            .cloned()
            .ok_or_else(|| scenario.unresolved(format!("constant '{}'", reference.name()))),
        ParameterValue::Function(reference) => Ok(reference_value(reference)),
        ParameterValue::List(items) => items.iter().map(|item| resolve_value_with(item, scenario, argument)).collect::<Result<Vec<_>>>().map(Value::Array),
        ParameterValue::Map(entries) => {
            let mut object = serde_json::Map::new();
            for (key, entry) in entries {
                object.insert(key.clone(), resolve_value_with(entry, scenario, argument)?);
            }
            Ok(Value::Object(object))
        }
    }
}

/// Arguments stay placeholders for the orchestrator to fill.
pub(crate) fn resolve_value(value: &ParameterValue, scenario: &Scenario) -> Result<Value> {
    resolve_value_with(value, scenario, &|reference| Ok(Value::String(reference.placeholder())))
}

fn resolve_map(values: &BTreeMap<String, ParameterValue>, scenario: &Scenario) -> Result<BTreeMap<String, Value>> {
    values.iter().map(|(key, value)| Ok((key.clone(), resolve_value(value, scenario)?))).collect()
}

impl Scenario {
    /// Validates the scenario and produces its transport-ready description.
    pub fn to_dto(&self) -> Result<ScenarioDto> {
        self.validate()?;
        let dto = self.build_dto()?;
        log::info!("Scenario '{}' serialized with {} functions.", self.name(), dto.functions.len());
        Ok(dto)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_dto()?)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_dto()?)?)
    }

    fn build_dto(&self) -> Result<ScenarioDto> {
        let arguments = self
            .parameters()
            .arguments()
            .iter()
            .map(|a| ArgumentDto { name: a.name.clone(), description: a.description.clone(), default: a.default.clone() })
            .collect();

        let constants = self.parameters().constants().iter().map(|c| ConstantDto { name: c.name.clone(), value: c.value.clone() }).collect();

        let functions = self.functions().iter().map(|function| self.build_function_dto(function)).collect::<Result<Vec<_>>>()?;

        Ok(ScenarioDto { name: self.name().to_string(), description: self.description().to_string(), arguments, constants, functions })
    }

    fn build_function_dto(&self, function: &OpenbachFunction) -> Result<FunctionDto> {
        let payload = match function.payload() {
            FunctionPayload::StartJobInstance(job) => FunctionPayloadDto::StartJobInstance(StartJobInstanceDto {
                entity_name: job.entity.clone(),
                job_name: job.job_name.clone(),
                offset: job.offset.as_secs_f64(),
                arguments: resolve_map(&job.arguments, self)?,
            }),
            FunctionPayload::StopJobInstance(stop) => {
                FunctionPayloadDto::StopJobInstance(StopJobInstanceDto { openbach_function_ids: stop.targets.iter().map(ReferenceDto::from).collect() })
            }
            FunctionPayload::StartScenarioInstance(instance) => FunctionPayloadDto::StartScenarioInstance(StartScenarioInstanceDto {
                scenario_name: instance.scenario.name().to_string(),
                scenario: Box::new(instance.scenario.build_dto()?),
                // Bindings are expressed in this scenario's terms, not the embedded one's.
                arguments: resolve_map(&instance.arguments, self)?,
            }),
            FunctionPayload::StopScenarioInstance(stop) => {
                FunctionPayloadDto::StopScenarioInstance(StopScenarioInstanceDto { openbach_function_id: ReferenceDto::from(&stop.target) })
            }
        };

        let wait = function.wait();
        Ok(FunctionDto {
            id: function.id().value,
            kind: map_function_kind(function.kind()),
            payload,
            wait_finished: wait.finished().iter().map(ReferenceDto::from).collect(),
            wait_launched: wait.launched().iter().map(ReferenceDto::from).collect(),
            wait_delay: wait.delay().as_secs_f64(),
        })
    }
}
