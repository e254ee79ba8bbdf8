//! Application core: measurement pipeline orchestration.
//!
//! All interaction with hardware happens through the **port traits** in
//! [`ports`]; the [`coordinator`] fans measurements out to recorders and
//! the [`service`] drives it together with the keyboard on one tick.

pub mod coordinator;
pub mod ports;
pub mod service;
