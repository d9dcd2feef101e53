use std::sync::Arc;
use std::time::Duration;

use crate::domain::job_registry::JobRegistry;
use crate::domain::scenario::composition::ExplicitIdComposer;
use crate::domain::scenario::extraction::ExtractedJob;
use crate::domain::scenario::function::{FunctionHandle, FunctionRef, StartJobInstance, WaitClause};
use crate::domain::scenario::scenario::Scenario;
use crate::error::Result;
use crate::helpers::postprocessing::{Plot, cdf_on_same_graph, time_series_on_same_graph};
use crate::helpers::service::{apache2, dash_player_server};
use crate::loader::dependency_file::{TrafficKind, TrafficRecord};
use crate::scenarios::services;

pub const SCENARIO_NAME: &str = "service_traffic_mix";

const DESCRIPTION: &str = "Launches the traffics described by a dependency file, then post-processes the generated data.";

/// Extra delay of independent traffics, letting the servers come up.
const SERVER_WARMUP: Duration = Duration::from_secs(5);
const STOP_DELAY: Duration = Duration::from_secs(5);
const POST_PROCESSING_DELAY: Duration = Duration::from_secs(2);
const CDF_BINS: u32 = 100;

/// What gets plotted for one kind of traffic.
struct TrafficPlot {
    prefix: &'static str,
    statistic: &'static str,
    label: &'static str,
    /// Which job launches carry the statistic.
    selects: fn(&StartJobInstance) -> bool,
    legends: bool,
}

const PLOTS: [TrafficPlot; 4] = [
    TrafficPlot { prefix: "iperf3", statistic: "throughput", label: "Rate (b/s)", selects: is_iperf3_server, legends: true },
    TrafficPlot { prefix: "dash", statistic: "bitrate", label: "Rate (b/s)", selects: is_dash_server, legends: false },
    TrafficPlot { prefix: "web", statistic: "page_load_time", label: "PLT (ms)", selects: is_web_browsing, legends: true },
    TrafficPlot { prefix: "voip", statistic: "instant_mos", label: "MOS", selects: is_voip_source, legends: true },
];

fn is_iperf3_server(job: &StartJobInstance) -> bool {
    job.job_name == "iperf3" && job.arguments.contains_key("server")
}

fn is_dash_server(job: &StartJobInstance) -> bool {
    job.job_name == "dash player&server"
}

fn is_web_browsing(job: &StartJobInstance) -> bool {
    job.job_name == "web_browsing_qoe"
}

fn is_voip_source(job: &StartJobInstance) -> bool {
    job.job_name == "voip_qoe_src"
}

/// Builds the traffic mix of `records`, each line becoming an embedded scenario.
///
/// Servers needed by DASH and web traffics start first, once per source
/// entity. Traffics without dependencies wait for them; the others follow the
/// ids of the file. Servers are stopped after every traffic is done.
pub fn build(registry: Arc<JobRegistry>, records: &[TrafficRecord], post_processing_entity: Option<&str>) -> Result<Scenario> {
    let mut scenario = Scenario::with_registry(SCENARIO_NAME, DESCRIPTION, registry.clone());

    let servers = start_servers(&mut scenario, records)?;
    let server_handles: Vec<FunctionHandle> = servers.iter().map(|(_, handle)| *handle).collect();

    let mut composer = ExplicitIdComposer::new();
    for record in records {
        let wait = if record.has_dependencies() || server_handles.is_empty() {
            WaitClause::new().with_delay(Duration::from_secs(record.delay))
        } else {
            WaitClause::new().after_all_launched(server_handles.iter().copied()).with_delay(Duration::from_secs(record.delay) + SERVER_WARMUP)
        };

        let instance = services::instance_for(registry.clone(), record)?;
        composer.declare(&mut scenario, record.id, &record.wait_launched, &record.wait_finished, wait, instance)?;
    }
    let traffics: Vec<FunctionHandle> = composer.handles().collect();
    log::info!("Scenario '{}': {} traffics composed.", scenario.name(), traffics.len());

    for (entity, server) in &servers {
        log::debug!("Scenario '{}': stopping server on '{}' after every traffic.", scenario.name(), entity);
        scenario.stop_job_instances([*server], WaitClause::new().after_all_finished(traffics.iter().copied()).with_delay(STOP_DELAY))?;
    }

    if let Some(entity) = post_processing_entity {
        post_process(&mut scenario, entity, &traffics)?;
    }

    Ok(scenario)
}

/// One server per source entity, DASH servers first since they also serve HTTP.
fn start_servers(scenario: &mut Scenario, records: &[TrafficRecord]) -> Result<Vec<(String, FunctionHandle)>> {
    let mut servers: Vec<(String, FunctionHandle)> = Vec::new();

    for kind in [TrafficKind::Dash, TrafficKind::WebBrowsing] {
        for record in records.iter().filter(|r| r.kind() == kind) {
            if servers.iter().any(|(entity, _)| *entity == record.source) {
                continue;
            }
            let handles = match kind {
                TrafficKind::Dash => dash_player_server(scenario, &record.source, WaitClause::new())?,
                _ => apache2(scenario, &record.source, WaitClause::new())?,
            };
            servers.extend(handles.into_iter().map(|handle| (record.source.clone(), handle)));
        }
    }
    Ok(servers)
}

fn post_process(scenario: &mut Scenario, entity: &str, traffics: &[FunctionHandle]) -> Result<()> {
    let wait = WaitClause::new().after_all_finished(traffics.iter().copied()).with_delay(POST_PROCESSING_DELAY);

    for plot in &PLOTS {
        let extracted: Vec<ExtractedJob> = scenario.extract_job_instances(plot.selects);
        if extracted.is_empty() {
            continue;
        }

        let jobs: Vec<FunctionRef> = extracted.iter().map(|job| job.reference).collect();
        let legends = if plot.legends { extracted.iter().map(|job| job.legend(plot.prefix)).collect() } else { Vec::new() };

        let time_series = Plot::new(plot.statistic, plot.label, "Rate time series").with_legends(legends.clone());
        time_series_on_same_graph(scenario, entity, &jobs, &time_series, wait.clone())?;

        let cdf = Plot::new(plot.statistic, plot.label, "Rate CDF").with_legends(legends);
        cdf_on_same_graph(scenario, entity, &jobs, CDF_BINS, &cdf, wait.clone())?;
    }
    Ok(())
}
