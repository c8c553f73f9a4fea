use crate::error::{GlitchError, GlitchResult};

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Scale r/g/b toward black, leaving alpha as given.
    pub fn darkened(self, factor: f32, a: u8) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            r: (f32::from(self.r) * f) as u8,
            g: (f32::from(self.g) * f) as u8,
            b: (f32::from(self.b) * f) as u8,
            a,
        }
    }
}

/// One raster frame: a width*height grid of RGBA8 pixels.
///
/// Frames are owned by the pipeline stage currently processing them and are
/// never mutated once handed to a reader; every transform allocates its own
/// output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> GlitchResult<Self> {
        let len = pixel_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn filled(width: u32, height: u32, color: Rgba8) -> GlitchResult<Self> {
        let mut f = Self::new(width, height)?;
        for px in f.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
        Ok(f)
    }

    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> GlitchResult<Self> {
        let len = pixel_len(width, height)?;
        if data.len() != len {
            return Err(GlitchError::frame(format!(
                "frame buffer is {} bytes, expected {} for {}x{}",
                data.len(),
                len,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_rgba8(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn idx(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Pixel at (x, y); coordinates are clamped into bounds.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> Rgba8 {
        let x = x.clamp(0, i64::from(self.width) - 1) as u32;
        let y = y.clamp(0, i64::from(self.height) - 1) as u32;
        self.get(x, y)
    }

    /// Pixel at (x, y). Callers must keep coordinates in bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Rgba8 {
        let i = self.idx(x, y);
        Rgba8 {
            r: self.data[i],
            g: self.data[i + 1],
            b: self.data[i + 2],
            a: self.data[i + 3],
        }
    }

    #[inline]
    pub fn put(&mut self, x: u32, y: u32, color: Rgba8) {
        let i = self.idx(x, y);
        self.data[i] = color.r;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.b;
        self.data[i + 3] = color.a;
    }

    /// Fill the horizontal run [x0, x1) on row y. The run is clipped to the
    /// frame; inverted or off-frame runs are a no-op.
    pub fn fill_run(&mut self, y: u32, x0: i64, x1: i64, color: Rgba8) {
        if y >= self.height {
            return;
        }
        let x0 = x0.clamp(0, i64::from(self.width)) as u32;
        let x1 = x1.clamp(0, i64::from(self.width)) as u32;
        if x0 >= x1 {
            return;
        }
        let start = self.idx(x0, y);
        let end = self.idx(x1 - 1, y) + 4;
        for px in self.data[start..end].chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Fill the axis-aligned rect [x0,x1) x [y0,y1), clipped to the frame.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba8) {
        let y0 = y0.clamp(0, i64::from(self.height));
        let y1 = y1.clamp(0, i64::from(self.height));
        for y in y0..y1 {
            self.fill_run(y as u32, x0, x1, color);
        }
    }
}

fn pixel_len(width: u32, height: u32) -> GlitchResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| GlitchError::frame("frame buffer size overflow"))
}
