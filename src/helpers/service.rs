use std::time::Duration;

use crate::domain::scenario::function::{FunctionHandle, JobEndpoint, StartJobInstance, WaitClause};
use crate::domain::scenario::parameter::ParameterValue;
use crate::domain::scenario::scenario::Scenario;
use crate::error::Result;

/// Delay between a VoIP receiver start and its sender.
const VOIP_SOURCE_DELAY: Duration = Duration::from_secs(5);

pub fn apache2(scenario: &mut Scenario, entity: &str, wait: WaitClause) -> Result<Vec<FunctionHandle>> {
    Ok(vec![scenario.start_job_instance(StartJobInstance::new("apache2", entity), wait)?])
}

/// A VoIP call between two entities.
#[derive(Debug, Clone)]
pub struct VoipCall {
    pub source_ip: ParameterValue,
    pub destination_ip: ParameterValue,
    pub port: ParameterValue,
    pub codec: ParameterValue,
    pub duration: ParameterValue,
}

/// Starts the receiver on `destination` then the sender on `source`.
///
/// Returns the receiver then the sender handle.
pub fn voip_qoe(scenario: &mut Scenario, source: &str, destination: &str, call: VoipCall, wait: WaitClause) -> Result<Vec<FunctionHandle>> {
    let receiver = StartJobInstance::new("voip_qoe_dest", destination).with_argument("starting_port", call.port.clone());
    let receiver = scenario.start_job_instance(receiver, wait)?;

    let sender = StartJobInstance::new("voip_qoe_src", source)
        .with_argument("src_addr", call.source_ip)
        .with_argument("dest_addr", call.destination_ip.clone())
        .with_argument("codec", call.codec)
        .with_argument("duration", call.duration)
        .with_argument("starting_port", call.port.clone())
        .with_endpoint(JobEndpoint::new(call.destination_ip).with_port(call.port));
    let sender = scenario.start_job_instance(sender, WaitClause::new().after_launched(receiver).with_delay(VOIP_SOURCE_DELAY))?;

    Ok(vec![receiver, sender])
}

pub fn web_browsing_qoe(
    scenario: &mut Scenario,
    entity: &str,
    nb_runs: impl Into<ParameterValue>,
    nb_parallel_runs: impl Into<ParameterValue>,
    duration: impl Into<ParameterValue>,
    wait: WaitClause,
) -> Result<Vec<FunctionHandle>> {
    let job = StartJobInstance::new("web_browsing_qoe", entity)
        .with_argument("nb_runs", nb_runs)
        .with_argument("nb_parallel_runs", nb_parallel_runs)
        .with_argument("duration", duration);

    Ok(vec![scenario.start_job_instance(job, wait)?])
}

/// DASH video server, also serving plain HTTP.
pub fn dash_player_server(scenario: &mut Scenario, entity: &str, wait: WaitClause) -> Result<Vec<FunctionHandle>> {
    Ok(vec![scenario.start_job_instance(StartJobInstance::new("dash player&server", entity), wait)?])
}

pub fn dash_client(
    scenario: &mut Scenario,
    entity: &str,
    server_ip: impl Into<ParameterValue>,
    protocol: impl Into<ParameterValue>,
    tornado_port: impl Into<ParameterValue>,
    duration: impl Into<ParameterValue>,
    wait: WaitClause,
) -> Result<Vec<FunctionHandle>> {
    let server_ip = server_ip.into();
    let job = StartJobInstance::new("dash client", entity)
        .with_argument("dst_ip", server_ip.clone())
        .with_argument("protocol", protocol)
        .with_argument("tornado_port", tornado_port)
        .with_argument("duration", duration)
        .with_endpoint(JobEndpoint::new(server_ip));

    Ok(vec![scenario.start_job_instance(job, wait)?])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::job_registry::JobRegistry;
    use crate::domain::scenario::function::FunctionRef;

    #[test]
    fn test_voip_sender_follows_receiver() {
        let mut scenario = Scenario::with_registry("voip", "", Arc::new(JobRegistry::builtin(true)));
        let call = VoipCall {
            source_ip: "10.0.0.1".into(),
            destination_ip: "10.0.0.2".into(),
            port: 8010.into(),
            codec: "G.711.1".into(),
            duration: 30.into(),
        };
        let handles = voip_qoe(&mut scenario, "src", "dst", call, WaitClause::new()).unwrap();

        let sender = scenario.function(handles[1].id()).unwrap();
        assert_eq!(sender.wait().launched(), &[FunctionRef::from(handles[0])]);
        assert_eq!(scenario.find_jobs_by_name("voip_qoe_src")[0].legend("voip"), "voip - src 10.0.0.2 8010");
    }

    #[test]
    fn test_servers_have_no_arguments() {
        let mut scenario = Scenario::with_registry("servers", "", Arc::new(JobRegistry::builtin(true)));
        apache2(&mut scenario, "web", WaitClause::new()).unwrap();
        dash_player_server(&mut scenario, "video", WaitClause::new()).unwrap();
        assert_eq!(scenario.len(), 2);
    }
}
