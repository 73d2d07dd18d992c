// src/service/mod.rs

//! Backing service control.
//!
//! - [`controller`]: the `ServiceController` trait, the command-driven
//!   production implementation and the no-op used when nothing is configured.
//! - [`probe`]: readiness probes (TCP connect, command, fixed delay).
//! - [`wait`]: the bounded polling loop around a probe.
//! - [`backoff`]: exponential delay schedule for that loop.

pub mod backoff;
pub mod controller;
pub mod probe;
pub mod wait;

pub use backoff::Backoff;
pub use controller::{controller_from_config, CommandService, NoService, ServiceController};
pub use probe::{probe_from_config, CommandProbe, DelayProbe, ReadinessProbe, TcpProbe};
pub use wait::wait_until_ready;
