use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::scenario::function::{FunctionHandle, FunctionKind, FunctionRef, JobEndpoint, StartJobInstance};
use crate::domain::scenario::parameter::ParameterValue;
use crate::domain::scenario::scenario::Scenario;
use crate::domain::scenario::serialization::{resolve_value, resolve_value_with};
use crate::error::Result;

/// Endpoint of an extracted job, resolved as far as the build allows.
///
/// Values bound by the embedding scenario are substituted; arguments nobody
/// bound yet stay `$name` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEndpoint {
    pub address: Value,
    pub port: Option<Value>,
}

/// A job launch found by a query, addressed from the queried scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedJob {
    pub reference: FunctionRef,
    pub job_name: String,
    pub entity: String,
    pub endpoint: Option<ResolvedEndpoint>,
}

impl ExtractedJob {
    /// `"<prefix> - <entity> [<address> [<port>]]"`, used as a plot legend.
    pub fn legend(&self, prefix: &str) -> String {
        let mut legend = format!("{} - {}", prefix, self.entity);
        if let Some(endpoint) = &self.endpoint {
            legend.push(' ');
            legend.push_str(&display(&endpoint.address));
            if let Some(port) = &endpoint.port {
                legend.push(' ');
                legend.push_str(&display(port));
            }
        }
        legend
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl Scenario {
    /// Every job launch matching `predicate`, in this scenario and one level into
    /// the scenarios it embeds, in ascending `(id, nested id)` order.
    pub fn extract_job_instances<P>(&self, predicate: P) -> Vec<ExtractedJob>
    where
        P: Fn(&StartJobInstance) -> bool,
    {
        let mut extracted = Vec::new();

        for function in self.functions() {
            if let Some(job) = function.as_start_job().filter(|job| predicate(job)) {
                let endpoint = job.endpoint.as_ref().and_then(|e| resolve_endpoint(job, e, |value| resolve_value(value, self)));
                extracted.push(ExtractedJob {
                    reference: FunctionRef::own(self.scope(), function.id()),
                    job_name: job.job_name.clone(),
                    entity: job.entity.clone(),
                    endpoint,
                });
            }

            if let Some(instance) = function.as_start_scenario() {
                let embedded = instance.scenario.as_ref();
                for inner in embedded.functions() {
                    let Some(job) = inner.as_start_job().filter(|job| predicate(job)) else {
                        continue;
                    };
                    let endpoint = job
                        .endpoint
                        .as_ref()
                        .and_then(|e| resolve_endpoint(job, e, |value| self.resolve_through_binding(value, embedded, &instance.arguments)));
                    extracted.push(ExtractedJob {
                        reference: FunctionRef::nested(self.scope(), function.id(), inner.id()),
                        job_name: job.job_name.clone(),
                        entity: job.entity.clone(),
                        endpoint,
                    });
                }
            }
        }

        extracted.sort_by_key(|job| job.reference.sort_key());
        log::debug!("Scenario '{}': extraction matched {} job instances.", self.name(), extracted.len());
        extracted
    }

    pub fn find_jobs_by_name(&self, job_name: &str) -> Vec<ExtractedJob> {
        self.extract_job_instances(|job| job.job_name == job_name)
    }

    /// Handles of the job launches of this scenario only, e.g. to stop them.
    pub fn job_handles(&self, job_name: &str) -> Vec<FunctionHandle> {
        self.functions()
            .iter()
            .filter(|f| f.as_start_job().is_some_and(|job| job.job_name == job_name))
            .map(|f| FunctionHandle::new(self.scope(), f.id(), FunctionKind::StartJobInstance))
            .collect()
    }

    /// Resolves a value of `embedded` using the bindings its host supplies from this scenario.
    fn resolve_through_binding(&self, value: &ParameterValue, embedded: &Scenario, bindings: &BTreeMap<String, ParameterValue>) -> Result<Value> {
        resolve_value_with(value, embedded, &|argument| match bindings.get(argument.name()) {
            Some(bound) => resolve_value(bound, self),
            None => Ok(embedded
                .parameters()
                .argument(argument.name())
                .and_then(|a| a.default.clone())
                .unwrap_or_else(|| Value::String(argument.placeholder()))),
        })
    }
}

/// A job whose endpoint cannot be resolved is still reported, without endpoint.
fn resolve_endpoint<F>(job: &StartJobInstance, endpoint: &JobEndpoint, resolve: F) -> Option<ResolvedEndpoint>
where
    F: Fn(&ParameterValue) -> Result<Value>,
{
    match try_resolve_endpoint(endpoint, &resolve) {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            log::warn!("Endpoint of job '{}' on '{}' could not be resolved: {}", job.job_name, job.entity, e);
            None
        }
    }
}

fn try_resolve_endpoint<F>(endpoint: &JobEndpoint, resolve: &F) -> Result<ResolvedEndpoint>
where
    F: Fn(&ParameterValue) -> Result<Value>,
{
    let address = resolve(&endpoint.address)?;
    let port = endpoint.port.as_ref().map(|port| resolve(port)).transpose()?;
    Ok(ResolvedEndpoint { address, port })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::utils::id::ScopeId;
    use crate::error::Error;

    fn iperf3() -> StartJobInstance {
        StartJobInstance::new("iperf3", "server")
    }

    #[test]
    fn test_endpoint_with_failing_port_is_dropped() {
        let endpoint = JobEndpoint::new("10.0.0.1").with_port(5201);
        let resolved = resolve_endpoint(&iperf3(), &endpoint, |value| match value {
            ParameterValue::Literal(literal) if literal.is_string() => Ok(literal.clone()),
            _ => Err(Error::UnresolvedReference { scenario: "s".to_string(), scope: ScopeId::new(), target: "port".to_string() }),
        });
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_endpoint_without_port_resolves_address_only() {
        let endpoint = JobEndpoint::new("10.0.0.1");
        let resolved = resolve_endpoint(&iperf3(), &endpoint, |value| match value {
            ParameterValue::Literal(literal) => Ok(literal.clone()),
            _ => Ok(Value::Null),
        });
        assert_eq!(resolved, Some(ResolvedEndpoint { address: json!("10.0.0.1"), port: None }));
    }
}
