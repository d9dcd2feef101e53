pub mod controller;
pub mod job_registry;
pub mod scenario;
pub mod utils;
