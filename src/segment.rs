use crate::{
    color::sat_bright,
    error::GlitchResult,
    frame::Frame,
    shared::Shared,
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    /// Brightness delta (x100) that opens a new run.
    pub brightness_threshold: f32,
    /// Saturation delta (x100) that opens a new run.
    pub saturation_threshold: f32,
    /// How many horizontal bands the frame height is partitioned into; each
    /// band is redrawn from its midpoint scanline. Floored to 1.
    pub row_band_count: u32,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            brightness_threshold: 10.0,
            saturation_threshold: 20.0,
            row_band_count: 60,
        }
    }
}

impl SegmentParams {
    pub fn sanitized(mut self) -> Self {
        self.brightness_threshold = self.brightness_threshold.max(0.0);
        self.saturation_threshold = self.saturation_threshold.max(0.0);
        self.row_band_count = self.row_band_count.max(1);
        self
    }
}

/// Redraws each sampled scanline as piecewise-constant colored runs, split
/// wherever brightness or saturation jumps past its threshold.
#[derive(Debug)]
pub struct SegmentEngine {
    params: Shared<SegmentParams>,
}

impl SegmentEngine {
    pub fn new(params: SegmentParams) -> Self {
        Self {
            params: Shared::new(params.sanitized()),
        }
    }

    pub fn set_params(&self, params: SegmentParams) {
        self.params.store(params.sanitized());
    }

    pub fn params(&self) -> SegmentParams {
        *self.params.load()
    }

    pub fn process(&self, frame: &Frame) -> GlitchResult<Frame> {
        if frame.is_empty() {
            return Ok(frame.clone());
        }
        let p = *self.params.load();
        let (w, h) = (frame.width(), frame.height());
        let bands = p.row_band_count.min(h).max(1);

        let mut out = Frame::new(w, h)?;
        for band in 0..bands {
            let y0 = band * h / bands;
            let y1 = (band + 1) * h / bands;
            let sample_y = (y0 + y1) / 2;

            let splits = scanline_splits(frame, sample_y, &p);
            let mut run_start = 0u32;
            for &split in splits.iter().chain(std::iter::once(&w)) {
                let color = frame.get(run_start, sample_y);
                out.fill_rect(
                    i64::from(run_start),
                    i64::from(y0),
                    i64::from(split),
                    i64::from(y1),
                    color,
                );
                run_start = split;
            }
        }
        Ok(out)
    }
}

/// Interior split x-coordinates for one scanline, in increasing order.
/// x = 0 and x = width are implicit boundaries and never appear here.
pub fn scanline_splits(frame: &Frame, y: u32, params: &SegmentParams) -> Vec<u32> {
    let w = frame.width();
    let mut splits = Vec::new();
    if w == 0 {
        return splits;
    }

    let mut last = sat_bright(frame.get(0, y));
    for x in 1..w {
        let cur = sat_bright(frame.get(x, y));
        let d_bright = (cur.brightness - last.brightness).abs() * 100.0;
        let d_sat = (cur.saturation - last.saturation).abs() * 100.0;
        if d_bright > params.brightness_threshold || d_sat > params.saturation_threshold {
            splits.push(x);
            last = cur;
        }
    }
    splits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Rgba8;

    #[test]
    fn uniform_frame_is_unchanged() {
        let gray = Rgba8::opaque(128, 128, 128);
        let frame = Frame::filled(4, 4, gray).unwrap();
        let engine = SegmentEngine::new(SegmentParams::default());
        let out = engine.process(&frame).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn uniform_scanline_has_no_splits() {
        let frame = Frame::filled(16, 1, Rgba8::opaque(40, 40, 40)).unwrap();
        let splits = scanline_splits(&frame, 0, &SegmentParams::default());
        assert!(splits.is_empty());
    }

    #[test]
    fn single_brightness_step_gives_two_runs() {
        // One brightness jump just past the threshold at x = 5.
        let params = SegmentParams {
            brightness_threshold: 10.0,
            saturation_threshold: 1000.0,
            row_band_count: 1,
        };
        let mut frame = Frame::filled(10, 1, Rgba8::opaque(100, 100, 100)).unwrap();
        // 100/255 -> 128/255 is a delta of ~10.98 x100 units.
        for x in 5..10 {
            frame.put(x, 0, Rgba8::opaque(128, 128, 128));
        }
        let splits = scanline_splits(&frame, 0, &params);
        assert_eq!(splits, vec![5]);

        let engine = SegmentEngine::new(params);
        let out = engine.process(&frame).unwrap();
        for x in 0..5 {
            assert_eq!(out.get(x, 0), Rgba8::opaque(100, 100, 100));
        }
        for x in 5..10 {
            assert_eq!(out.get(x, 0), Rgba8::opaque(128, 128, 128));
        }
    }

    #[test]
    fn below_threshold_step_is_ignored() {
        let params = SegmentParams {
            brightness_threshold: 50.0,
            saturation_threshold: 1000.0,
            row_band_count: 1,
        };
        let mut frame = Frame::filled(8, 1, Rgba8::opaque(100, 100, 100)).unwrap();
        for x in 4..8 {
            frame.put(x, 0, Rgba8::opaque(128, 128, 128));
        }
        let splits = scanline_splits(&frame, 0, &params);
        assert!(splits.is_empty());

        // The whole row takes the leftmost color.
        let engine = SegmentEngine::new(params);
        let out = engine.process(&frame).unwrap();
        for x in 0..8 {
            assert_eq!(out.get(x, 0), Rgba8::opaque(100, 100, 100));
        }
    }

    #[test]
    fn width_one_is_a_single_run() {
        let frame = Frame::filled(1, 6, Rgba8::opaque(9, 9, 9)).unwrap();
        let engine = SegmentEngine::new(SegmentParams {
            row_band_count: 3,
            ..SegmentParams::default()
        });
        let out = engine.process(&frame).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn output_extent_matches_input() {
        let frame = Frame::new(13, 7).unwrap();
        let engine = SegmentEngine::new(SegmentParams::default());
        let out = engine.process(&frame).unwrap();
        assert_eq!((out.width(), out.height()), (13, 7));
    }
}
