use std::collections::{BTreeSet, HashMap};

use crate::api::job_registry_dto::{JobDefinitionDto, JobRegistryDto};
use crate::domain::scenario::function::StartJobInstance;
use crate::error::{Error, Result};

/// Argument keys a job accepts at the top level of its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDefinition {
    pub name: String,
    pub required: BTreeSet<String>,
    pub optional: BTreeSet<String>,
}

impl JobDefinition {
    pub fn new(name: &str, required: &[&str], optional: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            required: required.iter().map(|k| k.to_string()).collect(),
            optional: optional.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn accepts(&self, key: &str) -> bool {
        self.required.contains(key) || self.optional.contains(key)
    }
}

impl From<JobDefinitionDto> for JobDefinition {
    fn from(dto: JobDefinitionDto) -> Self {
        Self { name: dto.name, required: dto.required.into_iter().collect(), optional: dto.optional.into_iter().collect() }
    }
}

/// Job name to definition lookup, handed to a scenario when it is created.
///
/// Unknown jobs are accepted unless the registry is strict, so a scenario can
/// still drive jobs the registry was never told about.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: HashMap<String, JobDefinition>,
    strict: bool,
}

impl JobRegistry {
    pub fn new(strict: bool) -> Self {
        Self { jobs: HashMap::new(), strict }
    }

    /// Accepts every job with any arguments.
    pub fn permissive() -> Self {
        Self::new(false)
    }

    /// Definitions for the jobs driven by the bundled helpers.
    pub fn builtin(strict: bool) -> Self {
        let mut registry = Self::new(strict);
        let definitions = [
            JobDefinition::new("fping", &["destination_ip"], &["count", "interval", "mean", "duration"]),
            JobDefinition::new("hping", &["destination_ip"], &["count", "interval", "mean", "destport", "duration"]),
            JobDefinition::new("iperf3", &[], &["port", "num_flows", "metrics_interval", "server", "client"]),
            JobDefinition::new(
                "tcp_conf_linux",
                &[],
                &["CUBIC", "other", "tcp_slow_start_after_idle", "tcp_no_metrics_save", "tcp_sack", "tcp_recovery", "tcp_fastopen"],
            ),
            JobDefinition::new("voip_qoe_dest", &["starting_port"], &[]),
            JobDefinition::new("voip_qoe_src", &["src_addr", "dest_addr", "codec", "duration"], &["starting_port"]),
            JobDefinition::new("web_browsing_qoe", &["duration"], &["nb_runs", "nb_parallel_runs", "url"]),
            JobDefinition::new("apache2", &[], &[]),
            JobDefinition::new("dash player&server", &[], &[]),
            JobDefinition::new("dash client", &["dst_ip", "protocol", "duration"], &["tornado_port"]),
            JobDefinition::new("time_series", &["jobs", "statistics"], &["label", "title", "legend", "filename", "no_suffix"]),
            JobDefinition::new("histogram", &["jobs", "bins", "statistics"], &["label", "title", "legend", "cumulative", "filename", "no_suffix"]),
        ];
        for definition in definitions {
            registry.register(definition);
        }
        registry
    }

    pub fn register(&mut self, definition: JobDefinition) {
        if self.jobs.insert(definition.name.clone(), definition).is_some() {
            log::debug!("Job definition replaced in registry");
        }
    }

    pub fn get(&self, job_name: &str) -> Option<&JobDefinition> {
        self.jobs.get(job_name)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Checks the argument keys of a job launch against its definition.
    pub fn validate(&self, job: &StartJobInstance) -> Result<()> {
        let Some(definition) = self.get(&job.job_name) else {
            if self.strict {
                return Err(Error::UnknownJob(job.job_name.clone()));
            }
            return Ok(());
        };

        if let Some(missing) = definition.required.iter().find(|key| !job.arguments.contains_key(key.as_str())) {
            return Err(Error::InvalidJobArguments { job: job.job_name.clone(), reason: format!("missing required argument '{}'", missing) });
        }

        if let Some(unknown) = job.arguments.keys().find(|key| !definition.accepts(key)) {
            return Err(Error::InvalidJobArguments { job: job.job_name.clone(), reason: format!("unexpected argument '{}'", unknown) });
        }

        Ok(())
    }
}

impl From<JobRegistryDto> for JobRegistry {
    fn from(dto: JobRegistryDto) -> Self {
        let mut registry = JobRegistry::new(dto.strict);
        for job in dto.jobs {
            registry.register(job.into());
        }
        registry
    }
}
