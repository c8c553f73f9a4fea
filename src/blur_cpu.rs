use crate::error::{GlitchError, GlitchResult};

/// Horizontal box blur over a single-channel f32 plane, edge-clamped.
///
/// The displacement synthesizer uses radii on the order of the frame width,
/// so this runs as a sliding-window sum: O(width) per row regardless of
/// radius.
pub fn box_blur_rows(src: &[f32], width: u32, height: u32, radius: u32) -> GlitchResult<Vec<f32>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| GlitchError::frame("blur plane size overflow"))?;
    if src.len() != expected_len {
        return Err(GlitchError::frame(
            "box_blur_rows expects src matching width*height",
        ));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let w = width as usize;
    let r = (radius as usize).min(w - 1);
    let window = (2 * r + 1) as f32;
    let mut out = vec![0.0f32; expected_len];

    for y in 0..height as usize {
        let row = &src[y * w..(y + 1) * w];
        let dst = &mut out[y * w..(y + 1) * w];

        // Window centred on x = 0 with the left edge clamped.
        let mut sum = row[0] * (r as f32 + 1.0);
        for &v in &row[1..=r] {
            sum += v;
        }

        for x in 0..w {
            dst[x] = sum / window;
            let enter = row[(x + 1 + r).min(w - 1)];
            let leave = row[x.saturating_sub(r)];
            sum += enter - leave;
        }
    }
    Ok(out)
}
