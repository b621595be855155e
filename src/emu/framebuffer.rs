use super::{DISPLAY_X, DISPLAY_Y};

pub const FRAMEBUFFER_SIZE: usize = DISPLAY_X * DISPLAY_Y;

/// Display buffer: 64x32 monochrome pixels, one byte (0 or 1) per pixel, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [u8; FRAMEBUFFER_SIZE],
}

impl Framebuffer {
    pub fn new() -> Self {
        Self {
            pixels: [0; FRAMEBUFFER_SIZE],
        }
    }

    /// Returns 0 or 1. Coordinates outside the screen read as 0.
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        if x >= DISPLAY_X || y >= DISPLAY_Y {
            return 0;
        }
        self.pixels[y * DISPLAY_X + x]
    }

    pub fn is_lit(&self, x: usize, y: usize) -> bool {
        self.pixel(x, y) != 0
    }

    pub fn as_bytes(&self) -> &[u8; FRAMEBUFFER_SIZE] {
        &self.pixels
    }

    /// Iterates over the 32 rows of 64 pixels.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks_exact(DISPLAY_X)
    }

    pub(crate) fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Flips the pixel at (x, y). Returns true if the pixel went from lit to dark.
    ///
    /// The caller must pass on-screen coordinates.
    pub(crate) fn flip(&mut self, x: usize, y: usize) -> bool {
        let pixel = &mut self.pixels[y * DISPLAY_X + x];
        *pixel ^= 1;
        *pixel == 0
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&p| if p != 0 { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
