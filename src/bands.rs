use std::sync::{Arc, Mutex};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{error::GlitchResult, frame::Frame, shared::Shared};

/// Normalized virtual coordinate space for resolution-independent splits.
pub const VIRT_MIN: f64 = -10.0;
pub const VIRT_MAX: f64 = 10.0;

/// Immutable split layout, published whole on every band-count change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BandLayout {
    pub count: u32,
    /// Interior split positions in virtual space, sorted ascending.
    /// Always exactly count.saturating_sub(1) entries.
    pub splits: Vec<f64>,
    pub border_opacity: f32,
}

/// Partitions the frame into N stable vertical bands, each redrawn from the
/// color of its leftmost represented column.
///
/// Splits are re-randomized only when the requested count changes, so the
/// layout holds still across frames while colors track the live input.
#[derive(Debug)]
pub struct BandPartitioner {
    layout: Shared<BandLayout>,
    rng: Mutex<StdRng>,
}

impl BandPartitioner {
    pub fn new(seed: u64, count: u32, border_opacity: f32) -> Self {
        let p = Self {
            layout: Shared::new(BandLayout {
                count: 0,
                splits: Vec::new(),
                border_opacity: border_opacity.clamp(0.0, 1.0),
            }),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        };
        p.set_count(count);
        p
    }

    pub fn layout(&self) -> Arc<BandLayout> {
        self.layout.load()
    }

    /// Retarget the band count. A changed count draws a fresh sorted split
    /// set; an unchanged count keeps the current layout untouched.
    pub fn set_count(&self, count: u32) {
        let cur = self.layout.load();
        if cur.count == count {
            return;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let mut splits: Vec<f64> = (0..count.saturating_sub(1))
            .map(|_| rng.gen_range(VIRT_MIN..VIRT_MAX))
            .collect();
        drop(rng);
        splits.sort_by(|a, b| a.total_cmp(b));
        tracing::debug!(count, "regenerated band splits");
        self.layout.store(BandLayout {
            count,
            splits,
            border_opacity: cur.border_opacity,
        });
    }

    pub fn set_border_opacity(&self, opacity: f32) {
        let cur = self.layout.load();
        self.layout.store(BandLayout {
            border_opacity: opacity.clamp(0.0, 1.0),
            ..(*cur).clone()
        });
    }

    pub fn process(&self, frame: &Frame) -> GlitchResult<Frame> {
        let layout = self.layout.load();
        if layout.count == 0 || frame.is_empty() {
            return Ok(frame.clone());
        }
        let (w, h) = (frame.width(), frame.height());
        let to_px = |v: f64| -> i64 {
            (((v - VIRT_MIN) / (VIRT_MAX - VIRT_MIN)) * f64::from(w)).floor() as i64
        };

        let mut out = Frame::new(w, h)?;
        let mut left = VIRT_MIN;
        for &right in layout.splits.iter().chain(std::iter::once(&VIRT_MAX)) {
            let x0 = to_px(left);
            let x1 = to_px(right);
            let sample_col = x0.clamp(0, i64::from(w) - 1) as u32;
            for y in 0..h {
                out.fill_run(y, x0, x1, frame.get(sample_col, y));
            }
            left = right;
        }

        if layout.border_opacity > 0.0 {
            let alpha = (layout.border_opacity * 255.0) as u8;
            for &split in &layout.splits {
                let x = to_px(split);
                let col = x.clamp(0, i64::from(w) - 1) as u32;
                for y in 0..h {
                    let stroke = frame.get(col, y).darkened(0.35, alpha);
                    out.fill_run(y, x, x + 1, stroke);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Rgba8;

    fn stripey(w: u32, h: u32) -> Frame {
        let mut f = Frame::new(w, h).unwrap();
        for y in 0..h {
            for x in 0..w {
                f.put(x, y, Rgba8::opaque((x % 256) as u8, (y % 256) as u8, 77));
            }
        }
        f
    }

    #[test]
    fn count_zero_is_pass_through() {
        let p = BandPartitioner::new(7, 0, 0.0);
        let frame = stripey(20, 10);
        let out = p.process(&frame).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn splits_are_sorted_and_sized() {
        let p = BandPartitioner::new(1, 5, 0.0);
        let layout = p.layout();
        assert_eq!(layout.splits.len(), 4);
        assert!(layout.splits.windows(2).all(|s| s[0] <= s[1]));
        assert!(
            layout
                .splits
                .iter()
                .all(|&v| (VIRT_MIN..VIRT_MAX).contains(&v))
        );
    }

    #[test]
    fn layout_is_stable_until_count_changes() {
        let p = BandPartitioner::new(42, 3, 0.0);
        let frame = stripey(100, 100);

        let first = p.layout();
        let a = p.process(&frame).unwrap();
        // re-requesting the same count keeps the exact same splits
        p.set_count(3);
        let b = p.process(&frame).unwrap();
        assert_eq!(*first, *p.layout());
        assert_eq!(a, b);
    }

    #[test]
    fn count_change_regenerates_splits() {
        let p = BandPartitioner::new(42, 4, 0.0);
        let before = p.layout();
        p.set_count(6);
        let after = p.layout();
        assert_eq!(after.splits.len(), 5);
        assert_ne!(before.splits, after.splits);

        // changing back re-rolls rather than restoring the old layout
        p.set_count(4);
        assert_ne!(before.splits, p.layout().splits);
    }

    #[test]
    fn bands_fill_from_leftmost_column() {
        // Count 1 means no interior splits: every row is the color of col 0.
        let p = BandPartitioner::new(3, 1, 0.0);
        let frame = stripey(8, 4);
        let out = p.process(&frame).unwrap();
        for y in 0..4 {
            let want = frame.get(0, y);
            for x in 0..8 {
                assert_eq!(out.get(x, y), want);
            }
        }
    }

    #[test]
    fn output_extent_matches_input() {
        let p = BandPartitioner::new(9, 7, 0.5);
        let frame = stripey(31, 9);
        let out = p.process(&frame).unwrap();
        assert_eq!((out.width(), out.height()), (31, 9));
    }
}
