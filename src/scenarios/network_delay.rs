use std::sync::Arc;
use std::time::Duration;

use crate::domain::job_registry::JobRegistry;
use crate::domain::scenario::function::{FunctionRef, StartScenarioInstance, WaitClause};
use crate::domain::scenario::scenario::Scenario;
use crate::error::Result;
use crate::helpers::network::{fping_measure_rtt, hping_measure_rtt};
use crate::helpers::postprocessing::{Plot, cdf_on_same_graph, time_series_on_same_graph};

pub const SCENARIO_NAME: &str = "network_delay";

const DESCRIPTION: &str = "Compares the RTT measured by fping (ICMP) and hping (TCP SYN/ACK), \
then plots the time series and the CDF of both measurements.";

const POST_PROCESSING_DELAY: Duration = Duration::from_secs(2);
const CDF_BINS: u32 = 100;

/// Both measurements run at the same time.
pub fn delay_simultaneous(registry: Arc<JobRegistry>, client: &str) -> Result<Scenario> {
    let mut scenario = Scenario::with_registry(
        "network_delay_simultaneous",
        "Network delay measurement: two RTT measurements simultaneously",
        registry,
    );
    let ip_dst = scenario.add_argument("ip_dst", "Target of the pings and server IP address")?;
    let duration = scenario.add_argument("duration", "The duration of fping/hping tests")?;

    fping_measure_rtt(&mut scenario, client, &ip_dst, &duration, WaitClause::new())?;
    hping_measure_rtt(&mut scenario, client, &ip_dst, &duration, WaitClause::new())?;
    Ok(scenario)
}

/// hping starts once fping is done.
pub fn delay_sequential(registry: Arc<JobRegistry>, client: &str) -> Result<Scenario> {
    let mut scenario = Scenario::with_registry(
        "network_delay_sequential",
        "Network delay measurement: two RTT measurements one after the other",
        registry,
    );
    let ip_dst = scenario.add_argument("ip_dst", "Target of the pings and server IP address")?;
    let duration = scenario.add_argument("duration", "The duration of each fping/hping test")?;

    let fping = fping_measure_rtt(&mut scenario, client, &ip_dst, &duration, WaitClause::new())?;
    hping_measure_rtt(&mut scenario, client, &ip_dst, &duration, WaitClause::new().after_all_finished(fping))?;
    Ok(scenario)
}

/// Embeds the delay measurement and, when an entity is given, plots its results.
pub fn build(
    registry: Arc<JobRegistry>,
    client: &str,
    ip_dst: &str,
    duration: u64,
    simultaneous: bool,
    post_processing_entity: Option<&str>,
) -> Result<Scenario> {
    let metrology = if simultaneous { delay_simultaneous(registry.clone(), client)? } else { delay_sequential(registry.clone(), client)? };

    let mut scenario = Scenario::with_registry(SCENARIO_NAME, DESCRIPTION, registry);
    let instance = StartScenarioInstance::new(metrology).bind("ip_dst", ip_dst).bind("duration", duration);
    let start_metrology = scenario.start_scenario_instance(instance, WaitClause::new())?;

    if let Some(entity) = post_processing_entity {
        let jobs: Vec<FunctionRef> =
            scenario.extract_job_instances(|job| job.job_name == "fping" || job.job_name == "hping").into_iter().map(|job| job.reference).collect();
        let wait = WaitClause::new().after_finished(start_metrology).with_delay(POST_PROCESSING_DELAY);

        time_series_on_same_graph(&mut scenario, entity, &jobs, &Plot::new("rtt", "RTT delay (ms)", "Comparison of measured RTTs"), wait.clone())?;
        cdf_on_same_graph(&mut scenario, entity, &jobs, CDF_BINS, &Plot::new("rtt", "RTT delay (ms)", "CDF of RTT delay measurements"), wait)?;
    }

    log::info!("Scenario '{}' built with {} functions.", scenario.name(), scenario.len());
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_chains_measurements() {
        let scenario = delay_sequential(Arc::new(JobRegistry::builtin(true)), "client").unwrap();
        let hping = &scenario.functions()[1];
        assert_eq!(hping.wait().finished().len(), 1);
        assert_eq!(scenario.parameters().required_arguments().count(), 2);
    }

    #[test]
    fn test_post_processing_reads_nested_jobs() {
        let scenario = build(Arc::new(JobRegistry::builtin(true)), "client", "10.0.0.1", 30, true, Some("collector")).unwrap();
        assert_eq!(scenario.len(), 3);

        let plotted = scenario.find_jobs_by_name("fping");
        assert_eq!(plotted.len(), 1);
        assert!(plotted[0].reference.is_nested());
        assert_eq!(plotted[0].legend("fping"), "fping - client 10.0.0.1");
    }
}
