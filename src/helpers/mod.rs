//! Shortcuts appending the launches of well-known jobs.
//!
//! Every helper returns the handles of the functions it appended, even when
//! there is a single one, so callers can chain them into wait clauses alike.

pub mod network;
pub mod postprocessing;
pub mod service;
pub mod transport;
