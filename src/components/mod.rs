//! Stateful editor components.

pub mod history;
pub mod mask;
