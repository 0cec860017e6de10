//! Common imports for typical client usage.
//!
//! This module intentionally exports the most frequently used types so
//! examples and application code need fewer import lines.
pub use crate::{
    ClientConfig, ClientError, Frame, SessionFailure, SessionStream, SessionUpdate, Slot,
    SlotBoard, StoryboardClient, StoryboardResult,
};
