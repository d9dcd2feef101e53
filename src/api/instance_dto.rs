use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStateDto {
    Scheduling,
    Running,
    Finished,
    Stopped,
    Error,
}

impl InstanceStateDto {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstanceStateDto::Finished | InstanceStateDto::Stopped | InstanceStateDto::Error)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FunctionStatusDto {
    pub id: u32,
    pub state: InstanceStateDto,
}

/// Answer of the controller to a poll of one scenario instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InstanceStatusDto {
    pub instance_id: u64,
    pub state: InstanceStateDto,
    #[serde(default)]
    pub functions: Vec<FunctionStatusDto>,
}
