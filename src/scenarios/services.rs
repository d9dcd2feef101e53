//! One sub-scenario per kind of traffic of a dependency file.
//!
//! Each sub-scenario takes the addresses and duration of its traffic as
//! arguments; [`instance_for`] binds them from the record.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::job_registry::JobRegistry;
use crate::domain::scenario::function::{StartScenarioInstance, WaitClause};
use crate::domain::scenario::scenario::Scenario;
use crate::error::Result;
use crate::helpers::service::{VoipCall, dash_client, voip_qoe, web_browsing_qoe};
use crate::helpers::transport::{Iperf3Flow, iperf3_send_file_tcp};
use crate::loader::dependency_file::{TrafficParameters, TrafficRecord};

const STOP_DELAY: Duration = Duration::from_secs(5);

/// Sub-scenario of `record`, with its arguments bound.
pub fn instance_for(registry: Arc<JobRegistry>, record: &TrafficRecord) -> Result<StartScenarioInstance> {
    let destination_ip = record.destination_ip.as_str();
    let instance = match &record.parameters {
        TrafficParameters::DataTransfer { port, size, tos, mtu } => {
            StartScenarioInstance::new(data_transfer(registry, record, size, *tos, *mtu)?).bind("dest_ip", destination_ip).bind("port", *port)
        }
        TrafficParameters::Voip { port, codec } => StartScenarioInstance::new(voip(registry, record, codec)?).bind("dest_ip", destination_ip).bind("port", *port),
        TrafficParameters::WebBrowsing { nb_runs, nb_parallel_runs } => StartScenarioInstance::new(web_browsing(registry, record, *nb_runs, *nb_parallel_runs)?),
        TrafficParameters::Dash { protocol, tornado_port } => StartScenarioInstance::new(video_dash(registry, record, protocol, *tornado_port)?),
    };

    Ok(instance.bind("duration", record.duration))
}

pub fn data_transfer(registry: Arc<JobRegistry>, record: &TrafficRecord, size: &str, tos: u32, mtu: u32) -> Result<Scenario> {
    let mut scenario = Scenario::with_registry("service_data_transfer", "Transfers a file over TCP with iperf3.", registry);
    let dest_ip = scenario.add_argument("dest_ip", "Address the iperf3 server binds to")?;
    let port = scenario.add_argument("port", "Port of the iperf3 server")?;
    scenario.add_argument("duration", "Upper bound of the transfer duration")?;

    let flow = Iperf3Flow { port: port.into(), transmitted_size: size.into(), tos: tos.into(), mss: mtu.into() };
    iperf3_send_file_tcp(&mut scenario, &record.source, &record.destination, &dest_ip, flow, WaitClause::new())?;
    Ok(scenario)
}

pub fn voip(registry: Arc<JobRegistry>, record: &TrafficRecord, codec: &str) -> Result<Scenario> {
    let mut scenario = Scenario::with_registry("service_voip", "Runs one VoIP call and measures its quality.", registry);
    let dest_ip = scenario.add_argument("dest_ip", "Address of the call receiver")?;
    let port = scenario.add_argument("port", "First port used by the call")?;
    let duration = scenario.add_argument("duration", "Duration of the call")?;

    let call = VoipCall {
        source_ip: record.source_ip.as_str().into(),
        destination_ip: dest_ip.into(),
        port: port.into(),
        codec: codec.into(),
        duration: duration.into(),
    };
    let handles = voip_qoe(&mut scenario, &record.source, &record.destination, call, WaitClause::new())?;
    if let [receiver, sender] = handles[..] {
        scenario.stop_job_instances([receiver], WaitClause::new().after_finished(sender).with_delay(STOP_DELAY))?;
    }
    Ok(scenario)
}

pub fn web_browsing(registry: Arc<JobRegistry>, record: &TrafficRecord, nb_runs: u32, nb_parallel_runs: u32) -> Result<Scenario> {
    let mut scenario = Scenario::with_registry("service_web_browsing", "Browses web pages and measures their load time.", registry);
    let duration = scenario.add_argument("duration", "Duration of the browsing session")?;

    web_browsing_qoe(&mut scenario, &record.destination, nb_runs, nb_parallel_runs, &duration, WaitClause::new())?;
    Ok(scenario)
}

pub fn video_dash(registry: Arc<JobRegistry>, record: &TrafficRecord, protocol: &str, tornado_port: u16) -> Result<Scenario> {
    let mut scenario = Scenario::with_registry("service_video_dash", "Streams a DASH video from the player server.", registry);
    let duration = scenario.add_argument("duration", "Duration of the video session")?;

    dash_client(&mut scenario, &record.destination, record.source_ip.as_str(), protocol, tornado_port, &duration, WaitClause::new())?;
    Ok(scenario)
}
