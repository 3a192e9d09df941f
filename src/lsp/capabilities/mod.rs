//! The three editor operations. Each re-parses the whole document.

pub mod completions;
pub mod diagnostics;
pub mod hover;
