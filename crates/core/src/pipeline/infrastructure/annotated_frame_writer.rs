use std::path::PathBuf;

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::detection::domain::detection::Detection;
use crate::pipeline::triage_event::{EventCallback, TriageEvent};
use crate::report::domain::metadata_record::MetadataRecord;
use crate::shared::frame::Frame;
use crate::shared::timestamp::format_timestamp;

const HEADER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const RETAINED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const REPEAT_COLOR: Rgb<u8> = Rgb([255, 200, 0]);
const LABEL_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// font8x8 glyphs are 8x8; each is drawn at this many pixels per dot.
const GLYPH_SCALE: u32 = 2;
const CELL: u32 = 8 * GLYPH_SCALE;
const MARGIN: i32 = 10;

/// Event consumer that saves every analyzed frame as a forensic image:
/// frame number and `M:SS` time in the corner, every detection boxed, and
/// faces retained on that frame labelled with name and confidence.
///
/// Files are `<dir>/frame_<NNNNN>.jpg`, keyed by source frame index.
pub struct AnnotatedFrameWriter {
    output_dir: PathBuf,
}

impl AnnotatedFrameWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, frame_index: usize) -> PathBuf {
        self.output_dir.join(format!("frame_{frame_index:05}.jpg"))
    }

    pub fn write(
        &self,
        frame: &Frame,
        timestamp_seconds: f64,
        detections: &[Detection],
        retained: &[MetadataRecord],
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.output_dir)?;
        let img = annotate(frame, timestamp_seconds, detections, retained)?;
        let path = self.path_for(frame.index());
        img.save(&path)?;
        Ok(path)
    }

    /// Writes `FrameAnalyzed` events; other events are ignored. Write
    /// failures are logged and never stop the run.
    pub fn on_event(&self, event: &TriageEvent) {
        let TriageEvent::FrameAnalyzed {
            frame,
            timestamp_seconds,
            detections,
            retained,
            ..
        } = event
        else {
            return;
        };
        if let Err(e) = self.write(frame, *timestamp_seconds, detections, retained) {
            log::warn!("Failed to write annotated frame {}: {e}", frame.index());
        }
    }

    pub fn into_callback(self) -> EventCallback {
        Box::new(move |event: &TriageEvent| self.on_event(event))
    }
}

/// Renders the overlay onto a copy of `frame`.
pub fn annotate(
    frame: &Frame,
    timestamp_seconds: f64,
    detections: &[Detection],
    retained: &[MetadataRecord],
) -> Result<RgbImage, Box<dyn std::error::Error>> {
    if frame.channels() != 3 {
        return Err(format!("Expected an RGB frame, got {} channels", frame.channels()).into());
    }
    let mut img = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or("Failed to create image from frame data")?;

    let line = CELL as i32 + 8;
    draw_text(&mut img, MARGIN, MARGIN, &format!("Frame: {}", frame.index()), HEADER_COLOR);
    draw_text(
        &mut img,
        MARGIN,
        MARGIN + line,
        &format!("Time: {}", format_timestamp(timestamp_seconds)),
        HEADER_COLOR,
    );

    for detection in detections {
        let Some(bbox) = detection.bbox.clamp_to(img.width(), img.height()) else {
            continue;
        };
        let record = retained.iter().find(|r| r.bbox == detection.bbox);
        let color = if record.is_some() {
            RETAINED_COLOR
        } else {
            REPEAT_COLOR
        };
        let rect = Rect::at(bbox.x(), bbox.y()).of_size(bbox.width() as u32, bbox.height() as u32);
        draw_hollow_rect_mut(&mut img, rect, color);

        if let Some(record) = record {
            let label = match record.confidence {
                Some(confidence) => format!("{} ({confidence:.2})", record.name),
                None => record.name.clone(),
            };
            let top = (bbox.y() - CELL as i32 - 4).max(0);
            draw_text(&mut img, bbox.x(), top, &label, color);
        }
    }
    Ok(img)
}

/// Draws `text` on a solid background with its top-left corner at `(x, y)`.
/// Characters without a glyph render as `?`.
fn draw_text(img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return;
    }
    draw_filled_rect_mut(img, Rect::at(x, y).of_size(chars * CELL, CELL), LABEL_BACKGROUND);

    for (i, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or_default();
        let origin_x = x + (i as u32 * CELL) as i32;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8u32 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let dot = Rect::at(
                    origin_x + (col * GLYPH_SCALE) as i32,
                    y + (row as u32 * GLYPH_SCALE) as i32,
                )
                .of_size(GLYPH_SCALE, GLYPH_SCALE);
                draw_filled_rect_mut(img, dot, color);
            }
        }
    }
}
