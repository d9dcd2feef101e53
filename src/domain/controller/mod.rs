pub mod controller;
pub mod observer;
