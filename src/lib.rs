//! Scholarship portal core: eligibility screening, application ranking, and
//! the review workflows that move applications and documents through their
//! lifecycles.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
