//! Document tracking and cursor analysis.

pub mod context;
pub mod document;
