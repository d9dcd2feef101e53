use std::collections::BTreeMap;

use serde_json::Value;

use crate::api::instance_dto::InstanceStatusDto;
use crate::api::scenario_dto::ScenarioDto;
use crate::error::Result;

pub type InstanceId = u64;

/// The remote side that schedules and runs scenarios.
///
/// The builder only produces descriptions; transport and authentication live
/// in implementations of this trait.
pub trait ScenarioController: std::fmt::Debug + Send + Sync {
    /// Starts an instance of `scenario` with values for its arguments.
    fn submit(&self, scenario: &ScenarioDto, arguments: &BTreeMap<String, Value>) -> Result<InstanceId>;

    fn poll(&self, instance: InstanceId) -> Result<InstanceStatusDto>;
}
