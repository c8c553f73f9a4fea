use std::sync::{Arc, Mutex};

use kurbo::Rect;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{error::GlitchResult, frame::Frame, shared::Shared};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RegionKind {
    LargeRect,
    SmallRect,
    Slit,
}

/// Pool cardinalities, fixed at compositor creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RegionCounts {
    pub large: usize,
    pub small: usize,
    pub slits: usize,
}

impl Default for RegionCounts {
    fn default() -> Self {
        Self {
            large: 3,
            small: 10,
            slits: 6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub kind: RegionKind,
    pub rect: Rect,
}

/// One published draw pass: every region from all three pools, already in
/// shuffled draw order.
#[derive(Clone, Debug, Default)]
pub struct RegionLayout {
    pub regions: Vec<Region>,
}

/// Size rolled once at pool creation; only the position moves afterwards.
#[derive(Clone, Copy, Debug)]
struct RegionSize {
    kind: RegionKind,
    w: f64,
    h: f64,
}

#[derive(Debug)]
struct Pools {
    sizes: Vec<RegionSize>,
    extent: (u32, u32),
}

/// Composites stretched source-strip samples into a pool of animated
/// rectangles and slits.
///
/// The reshuffle tick is deliberately decoupled from rendering: regions hold
/// still between ticks and jump on each one, per frame the current layout
/// snapshot is just re-rendered against the live input.
#[derive(Debug)]
pub struct RegionCompositor {
    counts: RegionCounts,
    overscan: f64,
    inner: Mutex<Inner>,
    layout: Shared<RegionLayout>,
}

#[derive(Debug)]
struct Inner {
    rng: StdRng,
    pools: Option<Pools>,
}

const SOURCE_STRIP_W: u32 = 2;

impl RegionCompositor {
    pub fn new(seed: u64, counts: RegionCounts, overscan_px: f64) -> Self {
        Self {
            counts,
            overscan: overscan_px.max(0.0),
            inner: Mutex::new(Inner {
                rng: StdRng::seed_from_u64(seed),
                pools: None,
            }),
            layout: Shared::new(RegionLayout::default()),
        }
    }

    pub fn layout(&self) -> Arc<RegionLayout> {
        self.layout.load()
    }

    /// Drop the pools and the published layout. The next frame rebuilds
    /// both from scratch.
    pub fn reset(&self) {
        let mut inner = self.lock_inner();
        inner.pools = None;
        drop(inner);
        self.layout.store(RegionLayout::default());
    }

    /// Re-roll every region's position (size stays fixed) and reshuffle the
    /// combined draw order. No-op until the first frame has sized the pools.
    pub fn tick(&self) {
        let mut inner = self.lock_inner();
        let Some(pools) = inner.pools.take() else {
            tracing::debug!("reshuffle tick before first frame; skipped");
            return;
        };
        let layout = place_and_shuffle(&pools, self.overscan, &mut inner.rng);
        inner.pools = Some(pools);
        drop(inner);
        self.layout.store(layout);
    }

    pub fn process(&self, frame: &Frame) -> GlitchResult<Frame> {
        if frame.is_empty() {
            return Ok(frame.clone());
        }
        self.ensure_pools(frame.width(), frame.height());
        let layout = self.layout.load();

        let (w, h) = (frame.width(), frame.height());
        let mut out = Frame::new(w, h)?;

        // Background: the source's left-edge strip stretched over the full
        // extent.
        let strip_w = SOURCE_STRIP_W.min(w);
        for y in 0..h {
            for x in 0..w {
                let sx = (u64::from(x) * u64::from(strip_w) / u64::from(w)) as u32;
                out.put(x, y, frame.get(sx, y));
            }
        }

        for region in &layout.regions {
            draw_region(&mut out, frame, region);
        }
        Ok(out)
    }

    fn ensure_pools(&self, width: u32, height: u32) {
        let mut inner = self.lock_inner();
        let stale = match &inner.pools {
            Some(p) => p.extent != (width, height),
            None => true,
        };
        if !stale {
            return;
        }

        let mut sizes = Vec::with_capacity(self.counts.large + self.counts.small + self.counts.slits);
        let fh = f64::from(height);
        for _ in 0..self.counts.large {
            sizes.push(RegionSize {
                kind: RegionKind::LargeRect,
                w: roll(&mut inner.rng, 120.0, 1200.0),
                h: roll(&mut inner.rng, 80.0, 600.0),
            });
        }
        for _ in 0..self.counts.small {
            sizes.push(RegionSize {
                kind: RegionKind::SmallRect,
                w: roll(&mut inner.rng, 20.0, 160.0),
                h: roll(&mut inner.rng, 20.0, 160.0),
            });
        }
        for _ in 0..self.counts.slits {
            sizes.push(RegionSize {
                kind: RegionKind::Slit,
                w: roll(&mut inner.rng, 5.0, 30.0),
                h: roll(&mut inner.rng, 200.0_f64.min(fh), fh),
            });
        }

        let pools = Pools {
            sizes,
            extent: (width, height),
        };
        let layout = place_and_shuffle(&pools, self.overscan, &mut inner.rng);
        inner.pools = Some(pools);
        drop(inner);
        self.layout.store(layout);
        tracing::debug!(width, height, "region pools initialized");
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn roll(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    let hi = hi.max(lo + 1.0);
    rng.gen_range(lo..hi)
}

fn place_and_shuffle(pools: &Pools, overscan: f64, rng: &mut StdRng) -> RegionLayout {
    let (w, h) = pools.extent;
    let mut regions: Vec<Region> = pools
        .sizes
        .iter()
        .map(|s| {
            let x = rng.gen_range(-overscan..f64::from(w) + overscan);
            let y = rng.gen_range(-overscan..f64::from(h) + overscan);
            Region {
                kind: s.kind,
                rect: Rect::new(x, y, x + s.w, y + s.h),
            }
        })
        .collect();
    regions.shuffle(rng);
    RegionLayout { regions }
}

/// Stretch a thin vertical source strip (vertically flipped) across the
/// region's destination rect. Degenerate source rects are skipped silently.
fn draw_region(out: &mut Frame, src: &Frame, region: &Region) {
    let (w, h) = (src.width(), src.height());
    let rect = region.rect;
    if rect.width() < 1.0 || rect.height() < 1.0 {
        return;
    }

    let strip_x = rect.x0.floor().clamp(0.0, f64::from(w) - 1.0) as u32;
    let strip_w = SOURCE_STRIP_W.min(w - strip_x);

    // Flip the sample band to the bottom-left origin convention.
    let src_y0 = (f64::from(h) - rect.y1).max(0.0);
    let src_y1 = (f64::from(h) - rect.y0).min(f64::from(h));
    let src_h = src_y1 - src_y0;
    if strip_w == 0 || src_h < 1.0 {
        return;
    }

    let x0 = rect.x0.floor().max(0.0) as i64;
    let x1 = rect.x1.ceil().min(f64::from(out.width())) as i64;
    let y0 = rect.y0.floor().max(0.0) as i64;
    let y1 = rect.y1.ceil().min(f64::from(out.height())) as i64;

    for y in y0..y1 {
        let v = (y as f64 - rect.y0) / rect.height();
        let sy = (src_y0 + v * src_h).floor() as i64;
        for x in x0..x1 {
            let u = (x as f64 - rect.x0) / rect.width();
            let sx = i64::from(strip_x) + (u * f64::from(strip_w)).floor() as i64;
            out.put(x as u32, y as u32, src.get_clamped(sx, sy));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Rgba8;

    fn source(w: u32, h: u32) -> Frame {
        let mut f = Frame::new(w, h).unwrap();
        for y in 0..h {
            for x in 0..w {
                f.put(x, y, Rgba8::opaque((x % 256) as u8, (y % 256) as u8, 123));
            }
        }
        f
    }

    fn kind_counts(layout: &RegionLayout) -> (usize, usize, usize) {
        let mut c = (0, 0, 0);
        for r in &layout.regions {
            match r.kind {
                RegionKind::LargeRect => c.0 += 1,
                RegionKind::SmallRect => c.1 += 1,
                RegionKind::Slit => c.2 += 1,
            }
        }
        c
    }

    #[test]
    fn pool_cardinality_survives_ticks() {
        let counts = RegionCounts {
            large: 3,
            small: 10,
            slits: 6,
        };
        let comp = RegionCompositor::new(11, counts, 200.0);
        let frame = source(64, 48);
        comp.process(&frame).unwrap();
        for _ in 0..25 {
            comp.tick();
            assert_eq!(kind_counts(&comp.layout()), (3, 10, 6));
        }
    }

    #[test]
    fn tick_moves_regions_but_keeps_sizes() {
        let comp = RegionCompositor::new(5, RegionCounts::default(), 200.0);
        comp.process(&source(64, 48)).unwrap();

        let mut before: Vec<(RegionKind, f64, f64)> = comp
            .layout()
            .regions
            .iter()
            .map(|r| (r.kind, r.rect.width(), r.rect.height()))
            .collect();
        comp.tick();
        let mut after: Vec<(RegionKind, f64, f64)> = comp
            .layout()
            .regions
            .iter()
            .map(|r| (r.kind, r.rect.width(), r.rect.height()))
            .collect();

        let key = |t: &(RegionKind, f64, f64)| (format!("{:?}", t.0), t.1.to_bits(), t.2.to_bits());
        before.sort_by_key(key);
        after.sort_by_key(key);
        assert_eq!(before, after);
    }

    #[test]
    fn tick_before_first_frame_is_a_noop() {
        let comp = RegionCompositor::new(5, RegionCounts::default(), 200.0);
        comp.tick();
        assert!(comp.layout().regions.is_empty());
    }

    #[test]
    fn layout_holds_still_between_ticks() {
        let comp = RegionCompositor::new(8, RegionCounts::default(), 100.0);
        let frame = source(40, 30);
        let a = comp.process(&frame).unwrap();
        let b = comp.process(&frame).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn output_extent_matches_input() {
        let comp = RegionCompositor::new(8, RegionCounts::default(), 100.0);
        let out = comp.process(&source(37, 21)).unwrap();
        assert_eq!((out.width(), out.height()), (37, 21));
    }

    #[test]
    fn reset_clears_layout() {
        let comp = RegionCompositor::new(8, RegionCounts::default(), 100.0);
        comp.process(&source(40, 30)).unwrap();
        assert!(!comp.layout().regions.is_empty());
        comp.reset();
        assert!(comp.layout().regions.is_empty());
    }

    #[test]
    fn fully_offscreen_region_is_skipped() {
        let src = source(16, 16);
        let mut out = Frame::new(16, 16).unwrap();
        let snapshot = out.clone();
        draw_region(
            &mut out,
            &src,
            &Region {
                kind: RegionKind::SmallRect,
                rect: Rect::new(-300.0, -300.0, -250.0, -260.0),
            },
        );
        assert_eq!(out, snapshot);
    }
}
