//! MangaMark core — watermark geometry/compositing and the mask drawing
//! engine used to scope AI edit requests to a sub-region of an image.
//!
//! The library is synchronous at its surface: pointer events drive the
//! [`components::mask::MaskEditor`] state machine directly, and every render
//! call completes its compositing before returning. Pixel work fans out over
//! rows internally where it pays off; callers never see partial state.

pub mod cli;
pub mod components;
pub mod io;
pub mod logger;
pub mod ops;
pub mod settings;

pub use components::history::HistoryManager;
pub use components::mask::{MaskEditor, MaskTool, StrokeBlend};
pub use ops::position::{
    Dimensions, Margins, Point, PresetPosition, WatermarkBounds, WatermarkPosition,
};
pub use settings::{
    ImageWatermarkConfig, TextWatermarkConfig, WatermarkConfig, WatermarkSettings,
};
