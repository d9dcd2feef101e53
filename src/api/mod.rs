pub mod config_dto;
pub mod instance_dto;
pub mod job_registry_dto;
pub mod scenario_dto;
