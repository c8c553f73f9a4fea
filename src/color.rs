use crate::frame::Rgba8;

/// Saturation and brightness of a pixel, both in [0, 1].
///
/// Brightness is the max channel; saturation is (max - min) / max, or 0 for
/// black. Hue is not needed by any transform and is not computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SatBright {
    pub saturation: f32,
    pub brightness: f32,
}

pub fn sat_bright(px: Rgba8) -> SatBright {
    let max = px.r.max(px.g).max(px.b);
    let min = px.r.min(px.g).min(px.b);
    let brightness = f32::from(max) / 255.0;
    let saturation = if max == 0 {
        0.0
    } else {
        f32::from(max - min) / f32::from(max)
    };
    SatBright {
        saturation,
        brightness,
    }
}
