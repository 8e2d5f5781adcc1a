use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as AvFrame;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

type FrameResult = Result<Frame, Box<dyn std::error::Error>>;

/// [`FrameSource`] backed by libavformat/libavcodec through `ffmpeg-next`.
///
/// Frames are decoded lazily and converted to packed RGB24.
#[derive(Default)]
pub struct FfmpegFrameSource {
    input: Option<Input>,
    stream_index: usize,
}

// Safety: the input context is owned exclusively and only touched by the
// thread currently holding the source.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn frame_rate(stream: &ffmpeg_next::Stream) -> f64 {
    let rate = stream.rate();
    match rate.denominator() {
        0 => 0.0,
        den => f64::from(rate.numerator()) / f64::from(den),
    }
}

fn video_decoder(stream: &ffmpeg_next::Stream) -> Result<ffmpeg_next::decoder::Video, ffmpeg_next::Error> {
    ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
        .decoder()
        .video()
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let input = ffmpeg_next::format::input(path)?;

        let (stream_index, metadata) = {
            let stream = input
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or_else(|| format!("{} has no video stream", path.display()))?;
            let decoder = video_decoder(&stream)?;
            let metadata = VideoMetadata {
                width: decoder.width(),
                height: decoder.height(),
                fps: frame_rate(&stream),
                total_frames: usize::try_from(stream.frames()).unwrap_or(0),
                codec: decoder
                    .codec()
                    .map(|c| c.name().to_string())
                    .unwrap_or_default(),
                source_path: Some(path.to_path_buf()),
            };
            (stream.index(), metadata)
        };

        log::debug!(
            "Opened {} ({} {}x{}, {:.2} fps, ~{} frames)",
            path.display(),
            metadata.codec,
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames
        );
        self.stream_index = stream_index;
        self.input = Some(input);
        Ok(metadata)
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = FrameResult> + '_> {
        let stream_index = self.stream_index;
        let Some(input) = self.input.as_mut() else {
            return Box::new(std::iter::once(Err("frame source is not open".into())));
        };
        match DecodedFrames::new(input, stream_index) {
            Ok(frames) => Box::new(frames),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        if self.input.take().is_some() {
            log::debug!("Closed video input");
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Reading,
    Draining,
    Finished,
}

/// Converts decoded frames of any pixel format to tightly packed RGB24.
struct RgbConverter {
    scaler: scaling::Context,
    width: u32,
    height: u32,
}

impl RgbConverter {
    fn new(decoder: &ffmpeg_next::decoder::Video) -> Result<Self, ffmpeg_next::Error> {
        let (width, height) = (decoder.width(), decoder.height());
        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )?;
        Ok(Self {
            scaler,
            width,
            height,
        })
    }

    fn convert(&mut self, decoded: &AvFrame, index: usize) -> FrameResult {
        let mut rgb = AvFrame::empty();
        self.scaler
            .run(decoded, &mut rgb)
            .map_err(|e| format!("frame {index}: RGB conversion failed: {e}"))?;
        Ok(Frame::new(
            packed_rows(&rgb, self.width as usize * 3, self.height as usize),
            self.width,
            self.height,
            3,
            index,
        ))
    }
}

/// Drops per-row padding from plane 0.
fn packed_rows(frame: &AvFrame, row_bytes: usize, rows: usize) -> Vec<u8> {
    frame
        .data(0)
        .chunks(frame.stride(0))
        .take(rows)
        .flat_map(|row| &row[..row_bytes])
        .copied()
        .collect()
}

/// Pulls packets on demand and yields frames in decode order.
struct DecodedFrames<'a> {
    input: &'a mut Input,
    stream_index: usize,
    decoder: ffmpeg_next::decoder::Video,
    converter: RgbConverter,
    next_index: usize,
    state: DecodeState,
}

impl<'a> DecodedFrames<'a> {
    fn new(input: &'a mut Input, stream_index: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let decoder = {
            let stream = input
                .stream(stream_index)
                .ok_or("video stream missing after open")?;
            video_decoder(&stream)?
        };
        let converter = RgbConverter::new(&decoder)?;
        Ok(Self {
            input,
            stream_index,
            decoder,
            converter,
            next_index: 0,
            state: DecodeState::Reading,
        })
    }

    /// Next frame the decoder already has buffered, if any. Indices advance
    /// even when conversion fails so later frames keep their stream position.
    fn buffered(&mut self) -> Option<FrameResult> {
        let mut decoded = AvFrame::empty();
        self.decoder.receive_frame(&mut decoded).ok()?;
        let index = self.next_index;
        self.next_index += 1;
        Some(self.converter.convert(&decoded, index))
    }

    /// Feeds the next packet of our stream to the decoder; `false` at end
    /// of input.
    fn feed(&mut self) -> bool {
        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            match self.decoder.send_packet(&packet) {
                Ok(()) => return true,
                Err(e) => log::debug!("Dropping undecodable packet: {e}"),
            }
        }
        false
    }
}

impl Iterator for DecodedFrames<'_> {
    type Item = FrameResult;

    fn next(&mut self) -> Option<FrameResult> {
        loop {
            if self.state == DecodeState::Finished {
                return None;
            }
            if let Some(frame) = self.buffered() {
                return Some(frame);
            }
            match self.state {
                DecodeState::Reading => {
                    if !self.feed() {
                        if let Err(e) = self.decoder.send_eof() {
                            log::debug!("Decoder rejected end of stream: {e}");
                        }
                        self.state = DecodeState::Draining;
                    }
                }
                DecodeState::Draining | DecodeState::Finished => {
                    self.state = DecodeState::Finished;
                }
            }
        }
    }
}
