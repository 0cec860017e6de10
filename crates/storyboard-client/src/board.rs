use tracing::{debug, warn};

use crate::errors::SessionFailure;
use crate::event::{Frame, StreamEvent};

/// Hard cap on frame indices accepted from the stream.
///
/// The protocol does not bound `index`, so a misbehaving service could force
/// unbounded placeholder growth. Indices at or beyond the cap are skipped
/// with a warning instead of appended.
pub const MAX_FRAME_INDEX: usize = 64;

/// Fallback shown when an error event carries no message.
pub const GENERATION_ERROR_FALLBACK: &str = "Generation error";

/// A positional entry in the rendered list.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    /// Not-yet-known frame, shown as a skeleton while generation runs.
    Placeholder { position: usize },
    /// A real frame received from the stream.
    Populated { position: usize, frame: Frame },
}

impl Slot {
    /// Returns the 0-based board position of this slot.
    pub fn position(&self) -> usize {
        match self {
            Self::Placeholder { position } | Self::Populated { position, .. } => *position,
        }
    }

    /// Returns the frame for a populated slot.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Self::Populated { frame, .. } => Some(frame),
            Self::Placeholder { .. } => None,
        }
    }

    /// True once a real frame occupies this slot.
    pub fn is_populated(&self) -> bool {
        matches!(self, Self::Populated { .. })
    }
}

/// Final storyboard snapshot, built once when the stream completes.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoryboardResult {
    /// Frames in board position order.
    pub frames: Vec<Frame>,
    /// Narrative text from the last story event.
    pub narrative: String,
}

/// What a single applied event changed on the board.
#[derive(Clone, Debug, PartialEq)]
pub enum Reconciled {
    /// Narrative arrived; the board may have been trimmed to the announced
    /// length.
    Narrative { text: String },
    /// A frame was placed (placeholder replaced, rewrite, or append) at
    /// `position`.
    Placed { position: usize },
    /// The event referenced an index beyond the cap; nothing changed.
    Skipped { index: usize },
    /// Terminal: trailing and gap placeholders dropped, result snapshotted.
    Completed(StoryboardResult),
}

/// Live ordered list of slots plus the reconciliation state machine.
///
/// Events are applied strictly in arrival order, so the final board state is
/// a deterministic fold over the event sequence. The board does no I/O and is
/// testable without any transport or rendering layer.
#[derive(Clone, Debug)]
pub struct SlotBoard {
    slots: Vec<Slot>,
    narrative: Option<String>,
    target_known: bool,
}

impl SlotBoard {
    /// Provisions `count` placeholder slots ahead of the first byte, giving
    /// immediate visual structure during generation latency.
    pub fn provision(count: usize) -> Self {
        let slots = (0..count)
            .map(|position| Slot::Placeholder { position })
            .collect();
        Self {
            slots,
            narrative: None,
            target_known: false,
        }
    }

    /// Current slots in position order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Current board length (placeholders included).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the board holds no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding a real frame.
    pub fn populated_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_populated()).count()
    }

    /// Narrative from the last story event, if one has arrived.
    pub fn narrative(&self) -> Option<&str> {
        self.narrative.as_deref()
    }

    /// True once a story event has established an authoritative length.
    pub fn target_known(&self) -> bool {
        self.target_known
    }

    /// Applies one decoded event and reports what changed.
    ///
    /// An error event is authoritative failure: it returns `Err` and the
    /// board is left in its last-known partial state so the caller can keep
    /// showing how far generation got.
    pub fn apply(&mut self, event: StreamEvent) -> Result<Reconciled, SessionFailure> {
        match event {
            StreamEvent::Story {
                aldar_story,
                total_frames,
            } => {
                self.narrative = Some(aldar_story.clone());
                // An absent or zero announcement falls back to the
                // provisioned count rather than emptying the board.
                let target = if total_frames == 0 {
                    self.slots.len()
                } else {
                    total_frames
                };
                self.target_known = true;
                if self.slots.len() > target {
                    self.slots.truncate(target);
                }
                // A board shorter than target is a valid transient state;
                // growth happens lazily as frames arrive.
                debug!(target, len = self.slots.len(), "story event reconciled");
                Ok(Reconciled::Narrative { text: aldar_story })
            }
            StreamEvent::Frame { index, frame } => {
                if index >= MAX_FRAME_INDEX {
                    warn!(index, cap = MAX_FRAME_INDEX, "frame index beyond cap, skipping");
                    return Ok(Reconciled::Skipped { index });
                }
                // Gap positions stay placeholders until filled.
                while self.slots.len() < index {
                    let position = self.slots.len();
                    self.slots.push(Slot::Placeholder { position });
                }
                let slot = Slot::Populated {
                    position: index,
                    frame,
                };
                if index < self.slots.len() {
                    // Last write for a given index wins.
                    self.slots[index] = slot;
                } else {
                    self.slots.push(slot);
                }
                debug!(position = index, len = self.slots.len(), "frame placed");
                Ok(Reconciled::Placed { position: index })
            }
            StreamEvent::Error { message } => Err(SessionFailure::Generation {
                message: message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERATION_ERROR_FALLBACK.to_string()),
            }),
            StreamEvent::Complete => Ok(Reconciled::Completed(self.complete())),
        }
    }

    /// Drops every slot still a placeholder, renumbers the survivors, and
    /// snapshots the result. Idempotent: a second call yields the same result.
    fn complete(&mut self) -> StoryboardResult {
        self.slots.retain(Slot::is_populated);
        let mut frames = Vec::with_capacity(self.slots.len());
        for (position, slot) in self.slots.iter_mut().enumerate() {
            if let Slot::Populated {
                position: slot_position,
                frame,
            } = slot
            {
                *slot_position = position;
                frames.push(frame.clone());
            }
        }
        StoryboardResult {
            frames,
            narrative: self.narrative.clone().unwrap_or_default(),
        }
    }
}
