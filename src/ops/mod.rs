//! Stateless geometry and compositing operations.

pub mod position;
pub mod text;
pub mod watermark;
