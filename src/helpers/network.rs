use crate::domain::scenario::function::{FunctionHandle, JobEndpoint, StartJobInstance, WaitClause};
use crate::domain::scenario::parameter::ParameterValue;
use crate::domain::scenario::scenario::Scenario;
use crate::error::Result;

/// ICMP round trip time towards `destination` during `duration` seconds.
pub fn fping_measure_rtt(
    scenario: &mut Scenario,
    entity: &str,
    destination: impl Into<ParameterValue>,
    duration: impl Into<ParameterValue>,
    wait: WaitClause,
) -> Result<Vec<FunctionHandle>> {
    let destination = destination.into();
    let job = StartJobInstance::new("fping", entity)
        .with_argument("destination_ip", destination.clone())
        .with_argument("duration", duration)
        .with_endpoint(JobEndpoint::new(destination));

    Ok(vec![scenario.start_job_instance(job, wait)?])
}

/// TCP SYN/ACK round trip time towards `destination` during `duration` seconds.
pub fn hping_measure_rtt(
    scenario: &mut Scenario,
    entity: &str,
    destination: impl Into<ParameterValue>,
    duration: impl Into<ParameterValue>,
    wait: WaitClause,
) -> Result<Vec<FunctionHandle>> {
    let destination = destination.into();
    let job = StartJobInstance::new("hping", entity)
        .with_argument("destination_ip", destination.clone())
        .with_argument("duration", duration)
        .with_endpoint(JobEndpoint::new(destination));

    Ok(vec![scenario.start_job_instance(job, wait)?])
}
