use std::sync::Arc;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::unique_face_tracker::{RetainedFace, UniqueFaceTracker};
use crate::recognition::domain::face_embedder::FaceEmbedder;
use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::identity_matcher::{IdentityMatcher, MatchResult};
use crate::report::domain::metadata_record::MetadataRecord;
use crate::report::domain::metadata_recorder::MetadataRecorder;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::UNKNOWN_NAME;
use crate::shared::frame::Frame;
use crate::video::domain::artifact_sink::ArtifactSink;

use super::triage_event::{EventCallback, TriageEvent};

/// Sequential merge point of the pipeline.
///
/// Owns the retained-face list and the record sequence. Frames must be fed
/// in increasing frame order; every retained face yields exactly one record.
pub struct FaceCataloger {
    tracker: UniqueFaceTracker,
    matcher: IdentityMatcher,
    gallery: Gallery,
    embedder: Option<Box<dyn FaceEmbedder>>,
    artifact_sink: Option<Box<dyn ArtifactSink>>,
    recorder: MetadataRecorder,
    on_event: Option<EventCallback>,
}

impl FaceCataloger {
    pub fn new(
        tracker: UniqueFaceTracker,
        matcher: IdentityMatcher,
        gallery: Gallery,
        embedder: Option<Box<dyn FaceEmbedder>>,
        artifact_sink: Option<Box<dyn ArtifactSink>>,
        on_event: Option<EventCallback>,
    ) -> Self {
        Self {
            tracker,
            matcher,
            gallery,
            embedder,
            artifact_sink,
            recorder: MetadataRecorder::new(),
            on_event,
        }
    }

    /// Runs one analyzed frame's clean detections through retention,
    /// identification and persistence. Returns how many faces were retained.
    pub fn catalog(
        &mut self,
        frame: Arc<Frame>,
        timestamp_seconds: f64,
        detections: Vec<Detection>,
    ) -> usize {
        let frame_index = frame.index();
        let mut retained = Vec::new();
        for detection in &detections {
            let Some(face) = self.tracker.observe(detection.bbox, frame_index) else {
                continue;
            };
            log::debug!(
                "Frame {frame_index}: retained face #{} at {}",
                face.saved_index,
                face.bbox
            );

            let identity = self.identify(&frame, &face.bbox);
            let artifact_ref = self.save_artifact(&frame, &face);
            let record = MetadataRecord {
                frame_index,
                timestamp_seconds: detection.timestamp_seconds,
                saved_index: face.saved_index,
                bbox: face.bbox,
                name: identity.name().unwrap_or(UNKNOWN_NAME).to_string(),
                confidence: identity.confidence(),
                artifact_ref,
            };

            self.emit(&TriageEvent::FaceRetained(record.clone()));
            if identity.is_match() {
                log::info!(
                    "Identified {} at frame {frame_index} (confidence {:.2})",
                    record.name,
                    record.confidence.unwrap_or_default()
                );
                self.emit(&TriageEvent::IdentityMatched(record.clone()));
            }
            retained.push(record.clone());
            self.recorder.record(record);
        }

        let count = retained.len();
        if self.on_event.is_some() {
            self.emit(&TriageEvent::FrameAnalyzed {
                frame,
                frame_index,
                timestamp_seconds,
                detections,
                retained,
            });
        }
        count
    }

    fn identify(&self, frame: &Frame, bbox: &BoundingBox) -> MatchResult {
        let Some(embedder) = self.embedder.as_ref() else {
            return MatchResult::NoMatch;
        };
        if self.gallery.is_empty() {
            return MatchResult::NoMatch;
        }
        match embedder.embed(frame, bbox) {
            Ok(Some(embedding)) => self.matcher.best_match(&embedding, &self.gallery),
            Ok(None) => {
                log::debug!("Frame {}: no usable embedding for {bbox}", frame.index());
                MatchResult::NoMatch
            }
            Err(e) => {
                log::warn!("Embedding failed on frame {} for {bbox}: {e}", frame.index());
                MatchResult::NoMatch
            }
        }
    }

    fn save_artifact(&mut self, frame: &Frame, face: &RetainedFace) -> Option<String> {
        let sink = self.artifact_sink.as_mut()?;
        let Some(crop) = frame.crop(&face.bbox) else {
            log::warn!(
                "Face #{} at {} lies outside the frame; no crop saved",
                face.saved_index,
                face.bbox
            );
            return None;
        };
        match sink.save(&crop, face) {
            Ok(reference) => Some(reference),
            Err(e) => {
                log::warn!("Failed to save crop for face #{}: {e}", face.saved_index);
                None
            }
        }
    }

    fn emit(&self, event: &TriageEvent) {
        if let Some(callback) = &self.on_event {
            callback(event);
        }
    }

    pub fn retained(&self) -> &[RetainedFace] {
        self.tracker.retained()
    }

    pub fn records(&self) -> &[MetadataRecord] {
        self.recorder.records()
    }

    pub fn finish(self) -> (Vec<RetainedFace>, Vec<MetadataRecord>) {
        (self.tracker.into_retained(), self.recorder.into_records())
    }
}
