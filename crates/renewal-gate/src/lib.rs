//! Validation pipeline for work-order renewal feeds.
//!
//! Renewal lines are validated in maintenance groups, the work-order-query
//! (WOQ) feed is normalized from its positional layout, both sides are
//! correlated by order number, and the qualifying subset is exported for the
//! downstream RPA robot.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;
