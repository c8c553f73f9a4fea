use crate::{
    blur_cpu::box_blur_rows,
    error::GlitchResult,
    frame::Frame,
    shared::Shared,
};

/// Tunables for the procedural slice-displacement field.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FieldParams {
    /// How many horizontal slices the noise collapses into. Floored to 8.
    pub slice_count: u32,
    /// Smallest horizontal throw, in pixels.
    pub min_span_px: f32,
    /// Largest horizontal throw, in pixels.
    pub max_span_px: f32,
    /// Contrast exponent applied to the band intensity: > 1 skews toward
    /// many small offsets and few large ones.
    pub bias_exp: f32,
    /// Cut all leftward offsets, keeping only positive displacement.
    pub one_direction: bool,
    /// Strength multiplier for the secondary low-frequency band layer;
    /// 0 disables it.
    pub big_slice_count: u32,
    /// Horizontal band drift speed, pixels per second.
    pub drift_px_per_sec: f32,
    /// Noise seed. Fixed per session so bands drift rather than boil.
    pub seed: u64,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            slice_count: 48,
            min_span_px: 4.0,
            max_span_px: 60.0,
            bias_exp: 2.2,
            one_direction: false,
            big_slice_count: 0,
            drift_px_per_sec: 90.0,
            seed: 0x5EED_CA3A,
        }
    }
}

impl FieldParams {
    /// Clamp out-of-range values to the documented safe minimums.
    pub fn sanitized(mut self) -> Self {
        self.slice_count = self.slice_count.max(8);
        self.min_span_px = self.min_span_px.max(0.0);
        self.max_span_px = self.max_span_px.max(self.min_span_px);
        if !self.bias_exp.is_finite() || self.bias_exp <= 0.0 {
            self.bias_exp = 1.0;
        }
        self
    }
}

/// Per-pixel spatial offsets, same extent as the frame they warp.
/// 0.0 in either channel means no displacement. Amplitude is baked fully
/// into the field; the warp applies it at scale 1.
#[derive(Clone, Debug)]
pub struct DisplacementField {
    width: u32,
    height: u32,
    dx: Vec<f32>,
    dy: Vec<f32>,
}

impl DisplacementField {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> (f32, f32) {
        let i = (y as usize) * (self.width as usize) + (x as usize);
        (self.dx[i], self.dy[i])
    }
}

/// Displacement-field synthesizer and warp stage.
///
/// Parameters are published as immutable snapshots so the UI/control domain
/// can retune mid-stream without tearing a frame in flight.
#[derive(Debug)]
pub struct FieldSynth {
    params: Shared<FieldParams>,
}

const BIG_BAND_SPAN_PX: f32 = 9.0;

impl FieldSynth {
    pub fn new(params: FieldParams) -> Self {
        Self {
            params: Shared::new(params.sanitized()),
        }
    }

    pub fn set_params(&self, params: FieldParams) {
        self.params.store(params.sanitized());
    }

    pub fn params(&self) -> FieldParams {
        *self.params.load()
    }

    /// Build the offset field for a frame extent at a moment in time.
    pub fn synthesize(
        &self,
        width: u32,
        height: u32,
        elapsed_secs: f64,
    ) -> GlitchResult<DisplacementField> {
        let p = *self.params.load();
        let len = (width as usize) * (height as usize);

        let amp = 0.5 * (p.min_span_px + p.max_span_px);
        let shift = (elapsed_secs * f64::from(p.drift_px_per_sec)).floor() as i64;

        let mut dx = band_layer(
            width,
            height,
            p.seed,
            band_radius(width, p.slice_count),
            slice_block_h(height, p.slice_count),
            shift,
            p.bias_exp,
            amp,
        )?;

        // Secondary low-frequency layer, summed without re-normalizing;
        // clipping at the warp clamp is part of the look.
        if p.big_slice_count > 0 && len > 0 {
            let big = band_layer(
                width,
                height,
                p.seed.wrapping_add(0xB16_BA2D),
                (width / 6).max(1),
                (height / 6).max(1),
                shift / 2,
                p.bias_exp,
                p.big_slice_count as f32 * BIG_BAND_SPAN_PX,
            )?;
            for (a, b) in dx.iter_mut().zip(big) {
                *a += b;
            }
        }

        if p.one_direction {
            for v in &mut dx {
                *v = v.max(0.0);
            }
        }

        Ok(DisplacementField {
            width,
            height,
            dx,
            dy: vec![0.0; len],
        })
    }

    /// Synthesize the field for this frame and warp the frame through it.
    pub fn process(&self, frame: &Frame, elapsed_secs: f64) -> GlitchResult<Frame> {
        if frame.is_empty() {
            return Ok(frame.clone());
        }
        let field = self.synthesize(frame.width(), frame.height(), elapsed_secs)?;
        warp(frame, &field)
    }
}

/// Blur radius from the slice-density parameter. Density is floored so the
/// divisor can never reach zero.
fn band_radius(width: u32, slice_count: u32) -> u32 {
    (width / (slice_count.max(8) / 2).max(8)).max(40)
}

fn slice_block_h(height: u32, slice_count: u32) -> u32 {
    (height / slice_count.max(8)).max(1)
}

/// One band field: blocky value noise, strong horizontal blur, time shift,
/// contrast exponent, then remap of [0,1] intensity to [-amp, +amp] offsets.
#[allow(clippy::too_many_arguments)]
fn band_layer(
    width: u32,
    height: u32,
    seed: u64,
    radius: u32,
    block_h: u32,
    shift: i64,
    bias_exp: f32,
    amp: f32,
) -> GlitchResult<Vec<f32>> {
    let w = width as usize;
    let h = height as usize;
    let mut noise = vec![0.0f32; w * h];
    for y in 0..h {
        let row_cell = (y as u64) / u64::from(block_h);
        let row = &mut noise[y * w..(y + 1) * w];
        for (x, v) in row.iter_mut().enumerate() {
            let col = (x as i64 + shift).rem_euclid(w.max(1) as i64) as u64;
            *v = hash01(seed, row_cell, col);
        }
    }

    let blurred = box_blur_rows(&noise, width, height, radius)?;

    let max_throw = (width.saturating_sub(1)) as f32;
    Ok(blurred
        .into_iter()
        .map(|t| {
            let t = t.clamp(0.0, 1.0).powf(bias_exp);
            ((t - 0.5) * 2.0 * amp).clamp(-max_throw, max_throw)
        })
        .collect())
}

/// out(x, y) = in(x + dx, y + dy), sampling clamped to the source bounds.
pub fn warp(frame: &Frame, field: &DisplacementField) -> GlitchResult<Frame> {
    let (w, h) = (frame.width(), frame.height());
    let mut out = Frame::new(w, h)?;
    for y in 0..h {
        for x in 0..w {
            let (dx, dy) = field.offset(x, y);
            let sx = i64::from(x) + dx.round() as i64;
            let sy = i64::from(y) + dy.round() as i64;
            out.put(x, y, frame.get_clamped(sx, sy));
        }
    }
    Ok(out)
}

/// splitmix64-style position hash mapped to [0, 1).
#[inline]
fn hash01(seed: u64, a: u64, b: u64) -> f32 {
    let mut z = seed
        .wrapping_add(a.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(b.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 40) as f32 / (1u64 << 24) as f32
}
