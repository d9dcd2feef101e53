use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transport-ready description of a scenario, as handed to the controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioDto {
    pub name: String,
    pub description: String,
    pub arguments: Vec<ArgumentDto>,
    pub constants: Vec<ConstantDto>,
    pub functions: Vec<FunctionDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArgumentDto {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConstantDto {
    pub name: String,
    pub value: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKindDto {
    StartJobInstance,
    StopJobInstance,
    StartScenarioInstance,
    StopScenarioInstance,
}

/// `3` for a function of the same scenario, `[host, 3]` for one nested in `host`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReferenceDto {
    Local(u32),
    Nested(u32, u32),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FunctionDto {
    pub id: u32,
    pub kind: FunctionKindDto,
    pub payload: FunctionPayloadDto,
    pub wait_finished: Vec<ReferenceDto>,
    pub wait_launched: Vec<ReferenceDto>,
    /// Seconds.
    pub wait_delay: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FunctionPayloadDto {
    StartJobInstance(StartJobInstanceDto),
    StopJobInstance(StopJobInstanceDto),
    StartScenarioInstance(StartScenarioInstanceDto),
    StopScenarioInstance(StopScenarioInstanceDto),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StartJobInstanceDto {
    pub entity_name: String,
    pub job_name: String,
    /// Seconds.
    pub offset: f64,
    pub arguments: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StopJobInstanceDto {
    pub openbach_function_ids: Vec<ReferenceDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StartScenarioInstanceDto {
    pub scenario_name: String,
    pub scenario: Box<ScenarioDto>,
    pub arguments: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StopScenarioInstanceDto {
    pub openbach_function_id: ReferenceDto,
}
