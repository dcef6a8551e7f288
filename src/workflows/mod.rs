//! Product workflows built on the graph engine
//!
//! - [`admissions`]: supervisor classification routed to four agents
//! - [`classwork`]: the eight-step academic query pipeline
//! - [`placements`]: gate, agent and validator chains for six request types

pub mod admissions;
pub mod classwork;
pub mod placements;
