pub mod network_delay;
pub mod services;
pub mod traffic_mix;
