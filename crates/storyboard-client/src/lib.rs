//! Streaming client for the Aldar Köse storyboard generation service.
//!
//! The service streams NDJSON events (`story`, `frame`, `error`, `complete`)
//! over one HTTP response. This crate reassembles the byte stream into lines,
//! decodes the event protocol, and reconciles a placeholder-backed slot board
//! so a rendering layer always sees the current best-known storyboard, even
//! with out-of-order frames, noisy lines, or a mid-stream failure.
//!
//! # Streaming usage
//!
//! ```no_run
//! use storyboard_client::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let client = StoryboardClient::new(ClientConfig::new("http://localhost:8080"))?;
//! let mut session = client
//!     .start_session("Aldar Köse outwits a greedy bai at the bazaar")
//!     .await?;
//!
//! while let Some(update) = session.next_update().await {
//!     match update {
//!         SessionUpdate::Narrative { text, .. } => println!("{text}"),
//!         SessionUpdate::FramePlaced { position, .. } => println!("frame {position} ready"),
//!         SessionUpdate::Failed { error, .. } => eprintln!("generation failed: {error}"),
//!         _ => {}
//!     }
//! }
//!
//! let result = session.finish().await?;
//! println!("{} frames", result.frames.len());
//! # Ok(())
//! # }
//! ```

/// Slot board: placeholders, reconciliation state machine, final result.
pub mod board;
/// Service client and one-shot generation endpoints.
pub mod client;
/// Client configuration and endpoint URLs.
pub mod config;
/// Public error types used by the client API.
pub mod errors;
/// Wire event model and the lossy line decoder.
pub mod event;
/// PDF export and bulk image download collaborators.
pub mod export;
/// Chunk-to-line reassembly for the NDJSON stream.
pub mod framer;
/// Common imports for typical usage.
pub mod prelude;
/// Streaming session task and its consumer handle.
pub mod session;

pub use board::{
    GENERATION_ERROR_FALLBACK, MAX_FRAME_INDEX, Reconciled, Slot, SlotBoard, StoryboardResult,
};
pub use client::{Health, MIN_PROMPT_CHARS, StoryboardClient};
pub use config::{ClientConfig, DEFAULT_PLACEHOLDER_COUNT};
pub use errors::{ClientError, ServiceError, SessionFailure};
pub use event::{Frame, StreamEvent};
pub use export::{DownloadReport, PdfExport};
pub use framer::LineFramer;
pub use session::{SessionStream, SessionUpdate};
