use std::sync::Arc;

use crate::detection::domain::detection::Detection;
use crate::report::domain::metadata_record::MetadataRecord;
use crate::shared::frame::Frame;

/// Notifications emitted while cataloging, in frame order.
#[derive(Clone, Debug, PartialEq)]
pub enum TriageEvent {
    /// A face was accepted as new and recorded.
    FaceRetained(MetadataRecord),
    /// A retained face matched a gallery identity. Always follows the
    /// corresponding `FaceRetained`.
    IdentityMatched(MetadataRecord),
    /// A sampled frame has been fully cataloged. Emitted after that frame's
    /// `FaceRetained`/`IdentityMatched` events.
    ///
    /// `detections` are the frame's boxes after filtering and suppression;
    /// `retained` holds the records created for this frame, a subset of
    /// them by box.
    FrameAnalyzed {
        frame: Arc<Frame>,
        frame_index: usize,
        timestamp_seconds: f64,
        detections: Vec<Detection>,
        retained: Vec<MetadataRecord>,
    },
}

pub type EventCallback = Box<dyn Fn(&TriageEvent) + Send>;
