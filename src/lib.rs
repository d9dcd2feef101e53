use std::sync::Arc;

use crate::api::config_dto::BuilderConfigDto;
use crate::api::job_registry_dto::JobRegistryDto;
use crate::domain::job_registry::JobRegistry;
use crate::domain::scenario::scenario::Scenario;
use crate::error::Result;
use crate::loader::dependency_file::parse_dependency_file;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod helpers;
pub mod loader;
pub mod logger;
pub mod scenarios;

/// Job registry described by `config`: a registry file when one is given, the built-in definitions otherwise.
pub fn load_job_registry(config: &BuilderConfigDto) -> Result<Arc<JobRegistry>> {
    let registry = match &config.job_registry {
        Some(file_path) => {
            let mut dto: JobRegistryDto = parse_json_file::<JobRegistryDto>(file_path)?;
            dto.strict |= config.strict_jobs;
            log::info!("Job registry loaded from '{}' ({} jobs).", file_path, dto.jobs.len());
            JobRegistry::from(dto)
        }
        None => JobRegistry::builtin(config.strict_jobs),
    };
    Ok(Arc::new(registry))
}

/// Reads a traffic dependency file and builds the traffic mix it describes.
///
/// Lines the loader rejects are skipped; the remaining traffics are composed.
pub fn build_traffic_mix(file_path: &str, registry: Arc<JobRegistry>, post_processing_entity: Option<&str>) -> Result<Scenario> {
    let parsed = parse_dependency_file(file_path)?;
    if parsed.records.is_empty() {
        log::warn!("No usable traffic in '{}'.", file_path);
    }

    scenarios::traffic_mix::build(registry, &parsed.records, post_processing_entity)
}
