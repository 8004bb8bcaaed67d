//! BDD step definitions for carline service

pub mod auto_clear_steps;
pub mod error_steps;
pub mod lane_steps;
pub mod workflow_steps;
