use std::time::Duration;

use crate::domain::scenario::function::{FunctionHandle, JobEndpoint, StartJobInstance, WaitClause};
use crate::domain::scenario::parameter::ParameterValue;
use crate::domain::scenario::scenario::Scenario;
use crate::error::Result;

/// Delay between an iperf3 server start and its client.
const CLIENT_DELAY: Duration = Duration::from_secs(2);

/// One iperf3 TCP flow: how much is sent and how packets are marked.
#[derive(Debug, Clone)]
pub struct Iperf3Flow {
    pub port: ParameterValue,
    pub transmitted_size: ParameterValue,
    pub tos: ParameterValue,
    pub mss: ParameterValue,
}

/// Starts an iperf3 server bound to `bind`, exiting after its first client.
pub fn iperf3_server(
    scenario: &mut Scenario,
    entity: &str,
    bind: impl Into<ParameterValue>,
    port: impl Into<ParameterValue>,
    wait: WaitClause,
) -> Result<Vec<FunctionHandle>> {
    let bind = bind.into();
    let port = port.into();
    let job = StartJobInstance::new("iperf3", entity)
        .with_argument("port", port.clone())
        .with_argument("num_flows", 1)
        .with_argument("server", ParameterValue::map([("bind", bind.clone()), ("exit", true.into())]))
        .with_endpoint(JobEndpoint::new(bind).with_port(port));

    Ok(vec![scenario.start_job_instance(job, wait)?])
}

/// Sends one TCP flow from `client_entity` to a fresh server on `server_entity`.
///
/// Returns the server then the client handle.
pub fn iperf3_send_file_tcp(
    scenario: &mut Scenario,
    client_entity: &str,
    server_entity: &str,
    server_ip: impl Into<ParameterValue>,
    flow: Iperf3Flow,
    wait: WaitClause,
) -> Result<Vec<FunctionHandle>> {
    let server_ip = server_ip.into();
    let server = iperf3_server(scenario, server_entity, server_ip.clone(), flow.port.clone(), wait)?;

    let client_configuration = ParameterValue::map([
        ("server_ip", server_ip),
        ("transmitted_size", flow.transmitted_size),
        ("tos", flow.tos),
        ("mss", flow.mss),
    ]);
    let job = StartJobInstance::new("iperf3", client_entity)
        .with_argument("port", flow.port)
        .with_argument("num_flows", 1)
        .with_argument("client", client_configuration);
    let client = scenario.start_job_instance(job, WaitClause::new().after_all_launched(server.clone()).with_delay(CLIENT_DELAY))?;

    Ok(server.into_iter().chain([client]).collect())
}

/// Kernel TCP settings applied by `tcp_conf_linux`.
#[derive(Debug, Clone, PartialEq)]
pub struct TcpConfiguration {
    pub congestion_control: String,
    /// Only meaningful with CUBIC.
    pub hystart: u32,
    pub slow_start_after_idle: u32,
    pub no_metrics_save: u32,
    pub sack: u32,
    pub recovery: u32,
    pub fastopen: u32,
}

impl Default for TcpConfiguration {
    fn default() -> Self {
        Self { congestion_control: "cubic".to_string(), hystart: 0, slow_start_after_idle: 1, no_metrics_save: 1, sack: 0, recovery: 1, fastopen: 1 }
    }
}

pub fn tcp_conf_linux(scenario: &mut Scenario, entity: &str, configuration: &TcpConfiguration, wait: WaitClause) -> Result<Vec<FunctionHandle>> {
    let job = StartJobInstance::new("tcp_conf_linux", entity);
    let job = if configuration.congestion_control.eq_ignore_ascii_case("cubic") {
        job.with_argument("CUBIC", ParameterValue::map([("hystart", configuration.hystart)]))
    } else {
        job.with_argument("other", ParameterValue::map([("congestion_control_name", configuration.congestion_control.as_str())]))
    };
    let job = job
        .with_argument("tcp_slow_start_after_idle", configuration.slow_start_after_idle)
        .with_argument("tcp_no_metrics_save", configuration.no_metrics_save)
        .with_argument("tcp_sack", configuration.sack)
        .with_argument("tcp_recovery", configuration.recovery)
        .with_argument("tcp_fastopen", configuration.fastopen);

    Ok(vec![scenario.start_job_instance(job, wait)?])
}
