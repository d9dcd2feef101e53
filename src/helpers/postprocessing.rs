use crate::domain::scenario::function::{FunctionHandle, FunctionRef, StartJobInstance, WaitClause};
use crate::domain::scenario::parameter::ParameterValue;
use crate::domain::scenario::scenario::Scenario;
use crate::error::Result;

/// A single figure drawn from the statistics of several job instances.
#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    pub statistic: String,
    pub label: String,
    pub title: String,
    /// One per job, or empty to let the job pick defaults.
    pub legends: Vec<String>,
}

impl Plot {
    pub fn new(statistic: &str, label: &str, title: &str) -> Self {
        Self { statistic: statistic.to_string(), label: label.to_string(), title: title.to_string(), legends: Vec::new() }
    }

    pub fn with_legends(mut self, legends: Vec<String>) -> Self {
        self.legends = legends;
        self
    }

    fn apply(&self, job: StartJobInstance, jobs: &[FunctionRef]) -> StartJobInstance {
        // Post-processing jobs take one entry per figure, each a list per curve set.
        let figure = |value: &str| ParameterValue::list([ParameterValue::list([value])]);
        let job = job
            .with_argument("jobs", ParameterValue::list([ParameterValue::list(jobs.iter().copied())]))
            .with_argument("statistics", figure(&self.statistic))
            .with_argument("label", figure(&self.label))
            .with_argument("title", figure(&self.title));

        if self.legends.is_empty() {
            job
        } else {
            job.with_argument("legend", ParameterValue::list([ParameterValue::list(self.legends.iter().map(String::as_str))]))
        }
    }
}

pub fn time_series_on_same_graph(scenario: &mut Scenario, entity: &str, jobs: &[FunctionRef], plot: &Plot, wait: WaitClause) -> Result<Vec<FunctionHandle>> {
    let job = plot.apply(StartJobInstance::new("time_series", entity), jobs);
    Ok(vec![scenario.start_job_instance(job, wait)?])
}

pub fn cdf_on_same_graph(scenario: &mut Scenario, entity: &str, jobs: &[FunctionRef], bins: u32, plot: &Plot, wait: WaitClause) -> Result<Vec<FunctionHandle>> {
    histogram(scenario, entity, jobs, bins, plot, true, wait)
}

pub fn pdf_on_same_graph(scenario: &mut Scenario, entity: &str, jobs: &[FunctionRef], bins: u32, plot: &Plot, wait: WaitClause) -> Result<Vec<FunctionHandle>> {
    histogram(scenario, entity, jobs, bins, plot, false, wait)
}

fn histogram(scenario: &mut Scenario, entity: &str, jobs: &[FunctionRef], bins: u32, plot: &Plot, cumulative: bool, wait: WaitClause) -> Result<Vec<FunctionHandle>> {
    let job = plot.apply(StartJobInstance::new("histogram", entity), jobs).with_argument("bins", bins).with_argument("cumulative", cumulative);
    Ok(vec![scenario.start_job_instance(job, wait)?])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::scenario_dto::FunctionPayloadDto;
    use crate::helpers::network::fping_measure_rtt;

    #[test]
    fn test_cdf_reads_the_given_jobs() {
        let mut scenario = Scenario::new("pp", "");
        let first = fping_measure_rtt(&mut scenario, "client", "10.0.0.1", 5, WaitClause::new()).unwrap();
        let second = fping_measure_rtt(&mut scenario, "client", "10.0.0.2", 5, WaitClause::new()).unwrap();
        let jobs: Vec<FunctionRef> = first.iter().chain(&second).map(FunctionRef::from).collect();

        let plot = Plot::new("rtt", "RTT delay (ms)", "CDF").with_legends(vec!["a".to_string(), "b".to_string()]);
        cdf_on_same_graph(&mut scenario, "collector", &jobs, 100, &plot, WaitClause::new().after_all_finished(jobs.clone())).unwrap();

        let dto = scenario.to_dto().unwrap();
        let FunctionPayloadDto::StartJobInstance(histogram) = &dto.functions[2].payload else {
            panic!("expected a job launch");
        };
        assert_eq!(histogram.arguments["jobs"], json!([[0, 1]]));
        assert_eq!(histogram.arguments["statistics"], json!([["rtt"]]));
        assert_eq!(histogram.arguments["legend"], json!([["a", "b"]]));
        assert_eq!(histogram.arguments["cumulative"], json!(true));
    }

    #[test]
    fn test_pdf_is_a_non_cumulative_histogram() {
        let mut scenario = Scenario::new("pp", "");
        let rtt = fping_measure_rtt(&mut scenario, "client", "10.0.0.1", 5, WaitClause::new()).unwrap();
        let jobs: Vec<FunctionRef> = rtt.iter().map(FunctionRef::from).collect();

        let plot = Plot::new("rtt", "RTT delay (ms)", "PDF");
        let pdf = pdf_on_same_graph(&mut scenario, "collector", &jobs, 50, &plot, WaitClause::new().after_all_finished(jobs.clone())).unwrap();
        assert_eq!(pdf[0].id().value, 1);

        let dto = scenario.to_dto().unwrap();
        let FunctionPayloadDto::StartJobInstance(histogram) = &dto.functions[1].payload else {
            panic!("expected a job launch");
        };
        assert_eq!(histogram.job_name, "histogram");
        assert_eq!(histogram.arguments["bins"], json!(50));
        assert_eq!(histogram.arguments["cumulative"], json!(false));
        assert_eq!(histogram.arguments["title"], json!([["PDF"]]));
        assert!(!histogram.arguments.contains_key("legend"));
    }
}
