use serde::{Deserialize, Serialize};

/// Builder configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BuilderConfigDto {
    /// Path of a job registry file; the built-in definitions are used when absent.
    #[serde(default)]
    pub job_registry: Option<String>,

    #[serde(default)]
    pub strict_jobs: bool,

    #[serde(default)]
    pub observer: ObserverConfigDto,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ObserverConfigDto {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// No timeout when absent.
    #[serde(default)]
    pub timeout_s: Option<u64>,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for ObserverConfigDto {
    fn default() -> Self {
        Self { poll_interval_ms: default_poll_interval_ms(), timeout_s: None }
    }
}
