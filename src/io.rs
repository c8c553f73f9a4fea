use std::path::PathBuf;

use anyhow::Context as _;

use crate::{
    error::{GlitchError, GlitchResult},
    frame::{Frame, Rgba8},
    pipeline::{FrameSink, FrameSource, SaveOutcome},
};

/// Deterministic procedural frame source: a color gradient with a bright
/// bar that advances one column per frame. Stands in for the camera in the
/// CLI and in tests.
#[derive(Debug)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    frame_index: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_index: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> GlitchResult<Frame> {
        let (w, h) = (self.width, self.height);
        let mut frame = Frame::new(w, h)?;
        let bar = if w > 0 {
            (self.frame_index % u64::from(w)) as u32
        } else {
            0
        };
        for y in 0..h {
            for x in 0..w {
                let color = if x == bar {
                    Rgba8::opaque(255, 255, 255)
                } else {
                    Rgba8::opaque(
                        (x * 255 / w.max(1)) as u8,
                        (y * 255 / h.max(1)) as u8,
                        90,
                    )
                };
                frame.put(x, y, color);
            }
        }
        self.frame_index += 1;
        Ok(frame)
    }
}

/// File-backed sink: presented frames land as numbered PNGs, stills as
/// `still_*.png`. Still saving can be switched off to model a denied
/// photo-library permission.
#[derive(Debug)]
pub struct PngSink {
    dir: PathBuf,
    presented: u64,
    stills: u64,
    allow_stills: bool,
}

impl PngSink {
    pub fn new(dir: impl Into<PathBuf>, allow_stills: bool) -> Self {
        Self {
            dir: dir.into(),
            presented: 0,
            stills: 0,
            allow_stills,
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    fn write_png(&self, frame: &Frame, name: &str) -> GlitchResult<()> {
        let img = image::RgbaImage::from_raw(
            frame.width(),
            frame.height(),
            frame.data().to_vec(),
        )
        .ok_or_else(|| GlitchError::frame("frame buffer does not match its extent"))?;
        let path = self.dir.join(name);
        img.save(&path)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

impl FrameSink for PngSink {
    fn present(&mut self, frame: &Frame) -> GlitchResult<()> {
        let name = format!("frame_{:05}.png", self.presented);
        self.write_png(frame, &name)?;
        self.presented += 1;
        Ok(())
    }

    fn save_still(&mut self, frame: &Frame) -> GlitchResult<SaveOutcome> {
        if !self.allow_stills {
            return Ok(SaveOutcome::Denied);
        }
        let name = format!("still_{:03}.png", self.stills);
        self.write_png(frame, &name)?;
        self.stills += 1;
        Ok(SaveOutcome::Saved)
    }
}
