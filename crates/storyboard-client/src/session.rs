use std::pin::Pin;

use futures::StreamExt as _;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::board::{Reconciled, Slot, SlotBoard, StoryboardResult};
use crate::errors::{ClientError, ServiceError, SessionFailure, session_failure_from_service_error};
use crate::event::{Frame, StreamEvent};
use crate::framer::LineFramer;

pub(crate) type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, ServiceError>> + Send + 'static>>;

/// Updates emitted by a streaming generation session, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionUpdate {
    /// First update for every session, sent before the first byte is read.
    Started {
        session_id: uuid::Uuid,
        /// Placeholder slots provisioned ahead of real data.
        placeholders: usize,
    },
    /// Narrative text arrived and any excess placeholders were trimmed.
    Narrative {
        session_id: uuid::Uuid,
        text: String,
    },
    /// A frame was placed at `position` (placeholder replaced or board grown).
    FramePlaced {
        session_id: uuid::Uuid,
        position: usize,
        frame: Frame,
    },
    /// Terminal success event with the finished storyboard.
    Completed {
        session_id: uuid::Uuid,
        result: StoryboardResult,
    },
    /// Terminal failure event.
    Failed {
        session_id: uuid::Uuid,
        error: SessionFailure,
    },
}

/// Handle for one end-to-end streaming generation attempt.
///
/// Use `next_update()` to consume updates as they arrive and `finish()` to
/// obtain the final storyboard after the terminal update. Every session ends
/// with exactly one `Completed` or `Failed` update, on every exit path.
pub struct SessionStream {
    session_id: uuid::Uuid,
    rx: mpsc::Receiver<SessionUpdate>,
    final_rx: oneshot::Receiver<Result<StoryboardResult, ClientError>>,
    saw_terminal: bool,
}

impl SessionStream {
    /// Returns the id of this session.
    pub fn session_id(&self) -> uuid::Uuid {
        self.session_id
    }

    /// Waits for and returns the next session update.
    ///
    /// Returns `None` after the update channel is closed.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        let update = self.rx.recv().await;
        if let Some(SessionUpdate::Completed { .. } | SessionUpdate::Failed { .. }) = &update {
            self.saw_terminal = true;
        }
        update
    }

    /// Drains the stream (if needed) and returns the terminal result.
    ///
    /// Safe to call after consuming updates manually with `next_update()`.
    pub async fn finish(mut self) -> Result<StoryboardResult, ClientError> {
        while !self.saw_terminal {
            match self.rx.recv().await {
                Some(SessionUpdate::Completed { .. } | SessionUpdate::Failed { .. }) => {
                    self.saw_terminal = true;
                }
                Some(_) => {}
                None => break,
            }
        }

        match self.final_rx.await {
            Ok(result) => result,
            Err(_) => Err(ClientError::protocol_msg(
                "session task ended without a final result",
            )),
        }
    }
}

/// Spawns the session task and returns its consumer handle.
pub(crate) fn spawn(
    byte_stream: ByteStream,
    placeholders: usize,
    buffer_capacity: usize,
) -> SessionStream {
    let session_id = uuid::Uuid::new_v4();
    let (tx, rx) = mpsc::channel(buffer_capacity);
    let (final_tx, final_rx) = oneshot::channel();
    tokio::spawn(session_task(
        session_id,
        byte_stream,
        placeholders,
        tx,
        final_tx,
    ));
    SessionStream {
        session_id,
        rx,
        final_rx,
        saw_terminal: false,
    }
}

enum LineOutcome {
    Continue,
    Complete(StoryboardResult),
    Fail(SessionFailure),
    ReceiverGone,
}

async fn session_task(
    session_id: uuid::Uuid,
    mut byte_stream: ByteStream,
    placeholders: usize,
    tx: mpsc::Sender<SessionUpdate>,
    final_tx: oneshot::Sender<Result<StoryboardResult, ClientError>>,
) {
    let mut board = SlotBoard::provision(placeholders);
    debug!(%session_id, placeholders, "session started");
    if !send_update(
        &tx,
        SessionUpdate::Started {
            session_id,
            placeholders,
        },
    )
    .await
    {
        let _ = final_tx.send(Err(ClientError::protocol_msg(
            "session receiver dropped before start",
        )));
        return;
    }

    let mut framer = LineFramer::default();
    let terminal: Result<StoryboardResult, SessionFailure> = 'session: loop {
        match byte_stream.next().await {
            Some(Ok(chunk)) => {
                for line in framer.push_chunk(&chunk) {
                    match apply_line(session_id, &mut board, &line, &tx).await {
                        LineOutcome::Continue => {}
                        // Stop at the first terminal event; remaining
                        // buffered lines are never applied.
                        LineOutcome::Complete(result) => break 'session Ok(result),
                        LineOutcome::Fail(failure) => break 'session Err(failure),
                        LineOutcome::ReceiverGone => {
                            let _ = final_tx.send(Err(ClientError::protocol_msg(
                                "session receiver dropped during updates",
                            )));
                            return;
                        }
                    }
                }
            }
            Some(Err(err)) => break 'session Err(session_failure_from_service_error(&err)),
            None => {
                // No trailing delimiter is required on the final event.
                if let Some(line) = framer.finish() {
                    match apply_line(session_id, &mut board, &line, &tx).await {
                        LineOutcome::Continue => {}
                        LineOutcome::Complete(result) => break 'session Ok(result),
                        LineOutcome::Fail(failure) => break 'session Err(failure),
                        LineOutcome::ReceiverGone => {
                            let _ = final_tx.send(Err(ClientError::protocol_msg(
                                "session receiver dropped during updates",
                            )));
                            return;
                        }
                    }
                }
                break 'session Err(SessionFailure::Protocol {
                    message: "stream ended without a complete event".into(),
                });
            }
        }
    };

    match terminal {
        Ok(result) => {
            debug!(%session_id, frames = result.frames.len(), "session completed");
            let sent = send_update(
                &tx,
                SessionUpdate::Completed {
                    session_id,
                    result: result.clone(),
                },
            )
            .await;
            let _ = final_tx.send(if sent {
                Ok(result)
            } else {
                Err(ClientError::protocol_msg(
                    "session receiver dropped before completion",
                ))
            });
        }
        Err(failure) => {
            debug!(%session_id, %failure, "session failed");
            let _ = send_update(
                &tx,
                SessionUpdate::Failed {
                    session_id,
                    error: failure.clone(),
                },
            )
            .await;
            let _ = final_tx.send(Err(ClientError::SessionFailed(failure)));
        }
    }
}

async fn apply_line(
    session_id: uuid::Uuid,
    board: &mut SlotBoard,
    line: &str,
    tx: &mpsc::Sender<SessionUpdate>,
) -> LineOutcome {
    // Undecodable lines are protocol slack, not errors.
    let Some(event) = StreamEvent::decode(line) else {
        return LineOutcome::Continue;
    };
    match board.apply(event) {
        Ok(Reconciled::Narrative { text }) => {
            if !send_update(tx, SessionUpdate::Narrative { session_id, text }).await {
                return LineOutcome::ReceiverGone;
            }
            LineOutcome::Continue
        }
        Ok(Reconciled::Placed { position }) => {
            if let Some(frame) = board.slots().get(position).and_then(Slot::frame) {
                let update = SessionUpdate::FramePlaced {
                    session_id,
                    position,
                    frame: frame.clone(),
                };
                if !send_update(tx, update).await {
                    return LineOutcome::ReceiverGone;
                }
            }
            LineOutcome::Continue
        }
        Ok(Reconciled::Skipped { .. }) => LineOutcome::Continue,
        Ok(Reconciled::Completed(result)) => LineOutcome::Complete(result),
        Err(failure) => LineOutcome::Fail(failure),
    }
}

async fn send_update(tx: &mpsc::Sender<SessionUpdate>, update: SessionUpdate) -> bool {
    tx.send(update).await.is_ok()
}
