use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbImage;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classify::{Classification, StepClassifier};
use crate::combine::FrameCombiner;
use crate::config::SessionSettings;
use crate::error::SessionError;
use crate::net::frame::{ClientFrame, StatusUpdate};
use crate::net::reader::FrameReader;
use crate::net::writer::StatusWriter;
use crate::progress::{ProgressSnapshot, ProgressTracker};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every tracked counter reached the cap and the final status went out.
    Completed,
    /// The peer went away mid-stream.
    Disconnected,
    /// The client asked to stop.
    ClientClosed,
}

enum Phase {
    AwaitingFrame,
    Buffering(RgbImage),
    Combining,
    Classifying(RgbImage),
    Updating(Option<Classification>),
    Emitting(ProgressSnapshot),
    Terminated(SessionOutcome),
}

/// Drives one client connection from first frame to completion.
///
/// Frames are buffered until a full group is collected, the group is
/// collapsed into one frame, classified, folded into the progress counters,
/// and the resulting status is written back. The loop repeats until the
/// counters saturate, the client shuts down, or the connection drops.
pub struct StreamSession {
    id: Uuid,
    reader: Box<dyn FrameReader>,
    writer: Box<dyn StatusWriter>,
    classifier: Arc<dyn StepClassifier>,
    combiner: FrameCombiner,
    buffer: Vec<RgbImage>,
    tracker: ProgressTracker,
    settings: SessionSettings,
    started_at: DateTime<Utc>,
}

impl StreamSession {
    pub fn new(
        reader: Box<dyn FrameReader>,
        writer: Box<dyn StatusWriter>,
        classifier: Arc<dyn StepClassifier>,
        tracker: ProgressTracker,
        settings: SessionSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reader,
            writer,
            classifier,
            combiner: FrameCombiner::new(settings.combine_method, settings.alpha),
            buffer: Vec::with_capacity(settings.combine_size),
            tracker,
            settings,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn run(mut self) -> Result<SessionOutcome, SessionError> {
        info!("Session {:?} started", self.id);
        let mut phase = Phase::AwaitingFrame;
        loop {
            phase = self.step(phase).await?;
            if let Phase::Terminated(outcome) = phase {
                let elapsed = Utc::now() - self.started_at;
                info!(
                    "Session {:?} ended after {}s: {:?}",
                    self.id,
                    elapsed.num_seconds(),
                    outcome
                );
                return Ok(outcome);
            }
        }
    }

    async fn step(&mut self, phase: Phase) -> Result<Phase, SessionError> {
        match phase {
            Phase::AwaitingFrame => self.await_frame().await,
            Phase::Buffering(image) => Ok(self.buffer_frame(image)),
            Phase::Combining => self.combine_group().map(Phase::Classifying),
            Phase::Classifying(frame) => Ok(Phase::Updating(self.classify(&frame).await)),
            Phase::Updating(result) => Ok(Phase::Emitting(self.apply(result))),
            Phase::Emitting(snapshot) => self.emit(snapshot).await,
            Phase::Terminated(outcome) => Ok(Phase::Terminated(outcome)),
        }
    }

    async fn await_frame(&mut self) -> Result<Phase, SessionError> {
        match self.reader.read().await {
            Ok(ClientFrame::Image { image }) => Ok(Phase::Buffering(image)),
            Ok(ClientFrame::Ping) => {
                debug!("Session {:?} got ping", self.id);
                Ok(Phase::AwaitingFrame)
            }
            Ok(ClientFrame::Shutdown) => Ok(Phase::Terminated(SessionOutcome::ClientClosed)),
            Err(e) if e.is_decode() => {
                // tolerated frame loss: drop the frame, keep the stream
                warn!("Session {:?} dropped an undecodable frame: {}", self.id, e);
                Ok(Phase::AwaitingFrame)
            }
            Err(e) if e.is_disconnect() => {
                debug!("Session {:?} peer disconnected", self.id);
                Ok(Phase::Terminated(SessionOutcome::Disconnected))
            }
            Err(e) => Err(SessionError::Transport(e)),
        }
    }

    fn buffer_frame(&mut self, image: RgbImage) -> Phase {
        if let Some(first) = self.buffer.first() {
            if image.dimensions() != first.dimensions() {
                warn!(
                    "Session {:?} dropped a {}x{} frame from a {}x{} group",
                    self.id,
                    image.width(),
                    image.height(),
                    first.width(),
                    first.height()
                );
                return Phase::AwaitingFrame;
            }
        }
        self.buffer.push(image);
        // partial groups never produce a status
        if self.buffer.len() < self.settings.combine_size {
            Phase::AwaitingFrame
        } else {
            Phase::Combining
        }
    }

    fn combine_group(&mut self) -> Result<RgbImage, SessionError> {
        // the buffer is consumed even if combination fails
        let group = std::mem::take(&mut self.buffer);
        Ok(self.combiner.combine(&group)?)
    }

    async fn classify(&self, frame: &RgbImage) -> Option<Classification> {
        match self.classifier.classify(frame).await {
            Ok(result) => {
                debug!("Session {:?} classified group: {:?}", self.id, result);
                result
            }
            Err(e) => {
                warn!(
                    "Session {:?} classifier unavailable, skipping group: {}",
                    self.id, e
                );
                None
            }
        }
    }

    fn apply(&mut self, result: Option<Classification>) -> ProgressSnapshot {
        self.tracker
            .update(result.as_ref(), self.settings.confidence_threshold)
    }

    async fn emit(&mut self, snapshot: ProgressSnapshot) -> Result<Phase, SessionError> {
        let complete = snapshot.complete;
        let update = StatusUpdate::from(snapshot);
        match self.writer.write(&update).await {
            Ok(()) => {
                if complete {
                    info!("Session {:?} completed all steps", self.id);
                    Ok(Phase::Terminated(SessionOutcome::Completed))
                } else {
                    Ok(Phase::AwaitingFrame)
                }
            }
            Err(e) if e.is_disconnect() => {
                debug!("Session {:?} peer disconnected", self.id);
                Ok(Phase::Terminated(SessionOutcome::Disconnected))
            }
            Err(e) => Err(SessionError::Transport(e)),
        }
    }
}
