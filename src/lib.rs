//! Electoral administration service for a professional licensing council.
//!
//! The heart of the crate is `workflows::disputes`: the stateful engine
//! carrying a conduct complaint or a result contest through admissibility,
//! instruction, judgment, and second instance under statutory deadlines.

pub mod config;
pub mod error;
pub mod infra;
pub mod telemetry;
pub mod workflows;
