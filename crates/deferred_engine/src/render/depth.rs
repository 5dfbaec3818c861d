//! CPU-side depth buffer used to tighten tile depth ranges

/// Stored `[0, 1]` depth values, row-major, top row first
#[derive(Debug, Clone, PartialEq)]
pub struct DepthTexture {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthTexture {
    /// Wrap depth values; `None` when the data does not match the size
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize {
            return None;
        }
        Some(Self { width, height, data })
    }

    /// Depth texture cleared to a single value
    pub fn filled(width: u32, height: u32, depth: f32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            data: vec![depth; width as usize * height as usize],
        }
    }

    /// Width in texels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Depth at a texel
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }

    /// Write the depth at a texel
    pub fn set(&mut self, x: u32, y: u32, depth: f32) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = depth;
        }
    }

    /// Texel rectangle `[x0, x1) x [y0, y1)` covered by a pixel rectangle of a
    /// `resolution`-sized screen
    ///
    /// The screen is scaled onto the texture, so a half-resolution depth
    /// buffer still covers every tile. The rectangle is never empty.
    pub fn texel_rect(&self, pixels: [u32; 4], resolution: (u32, u32)) -> [u32; 4] {
        let scale = |value: u32, from: u32, to: u32| -> u32 {
            ((u64::from(value) * u64::from(to)) / u64::from(from.max(1))) as u32
        };
        let x0 = scale(pixels[0], resolution.0, self.width).min(self.width - 1);
        let y0 = scale(pixels[1], resolution.1, self.height).min(self.height - 1);
        let x1 = scale(pixels[2], resolution.0, self.width).clamp(x0 + 1, self.width);
        let y1 = scale(pixels[3], resolution.1, self.height).clamp(y0 + 1, self.height);
        [x0, y0, x1, y1]
    }

    /// Raw minimum and maximum depth inside a pixel rectangle
    pub fn tile_depth_range(&self, pixels: [u32; 4], resolution: (u32, u32)) -> (f32, f32) {
        let [x0, y0, x1, y1] = self.texel_rect(pixels, resolution);
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;

        for y in y0..y1 {
            let row = (y * self.width) as usize;
            for depth in &self.data[row + x0 as usize..row + x1 as usize] {
                min = min.min(*depth);
                max = max.max(*depth);
            }
        }

        (min, max)
    }
}
