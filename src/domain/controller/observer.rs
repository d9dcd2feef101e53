use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::api::config_dto::ObserverConfigDto;
use crate::api::instance_dto::InstanceStatusDto;
use crate::domain::controller::controller::{InstanceId, ScenarioController};
use crate::domain::scenario::scenario::Scenario;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ObserverConfig {
    pub poll_interval: Duration,
    pub timeout: Option<Duration>,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        ObserverConfig::from(&ObserverConfigDto::default())
    }
}

impl From<&ObserverConfigDto> for ObserverConfig {
    fn from(dto: &ObserverConfigDto) -> Self {
        Self { poll_interval: Duration::from_millis(dto.poll_interval_ms), timeout: dto.timeout_s.map(Duration::from_secs) }
    }
}

/// Submits a built scenario and follows its instance until it ends.
#[derive(Debug, Clone)]
pub struct ScenarioObserver {
    controller: Arc<dyn ScenarioController>,
    config: ObserverConfig,
}

impl ScenarioObserver {
    pub fn new(controller: Arc<dyn ScenarioController>, config: ObserverConfig) -> Self {
        Self { controller, config }
    }

    /// Submits `scenario` once every required argument has a value.
    pub fn launch(&self, scenario: &Scenario, arguments: &BTreeMap<String, Value>) -> Result<InstanceId> {
        if let Some(missing) = scenario.parameters().required_arguments().find(|a| !arguments.contains_key(&a.name)) {
            return Err(Error::MissingArgument { scenario: scenario.name().to_string(), argument: missing.name.clone() });
        }
        if let Some(unknown) = arguments.keys().find(|name| scenario.parameters().argument(name).is_none()) {
            return Err(scenario.unresolved(format!("argument '{}'", unknown)));
        }

        let description = scenario.to_dto()?;
        let instance = self.controller.submit(&description, arguments)?;
        log::info!("Scenario '{}' submitted as instance {}.", scenario.name(), instance);
        Ok(instance)
    }

    /// Polls until the instance reaches a terminal state or the timeout expires.
    pub fn wait(&self, instance: InstanceId) -> Result<InstanceStatusDto> {
        let started = Instant::now();
        loop {
            let status = self.controller.poll(instance)?;
            if status.state.is_terminal() {
                log::info!("Scenario instance {} ended in state {:?}.", instance, status.state);
                return Ok(status);
            }

            if let Some(timeout) = self.config.timeout {
                if started.elapsed() >= timeout {
                    return Err(Error::Timeout { instance, timeout });
                }
            }

            log::debug!("Scenario instance {} is {:?}, polling again.", instance, status.state);
            thread::sleep(self.config.poll_interval);
        }
    }

    pub fn launch_and_wait(&self, scenario: &Scenario, arguments: &BTreeMap<String, Value>) -> Result<InstanceStatusDto> {
        let instance = self.launch(scenario, arguments)?;
        self.wait(instance)
    }
}
