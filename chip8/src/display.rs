//! Monochrome display buffer.
use std::fmt::{self, Write};

use crate::constants::*;

/// Read-only view of the display handed to renderers.
pub type Chip8DisplayBuffer<'a> = &'a [bool; DISPLAY_BUFFER_SIZE];

/// Screen buffer that sprites are drawn to.
///
/// Pixels are stored row major, `x + y * DISPLAY_WIDTH`.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    #[inline]
    pub fn buffer(&self) -> Chip8DisplayBuffer<'_> {
        &self.pixels
    }

    /// Pixel state at the given coordinate, `false` outside the screen.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT && self.pixels[x + y * DISPLAY_WIDTH]
    }

    /// Iterate the screen one row of pixels at a time, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks_exact(DISPLAY_WIDTH)
    }

    /// Whether every pixel is off.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|px| !px)
    }

    /// XOR a sprite onto the screen with its top left corner at `(x, y)`.
    ///
    /// Each byte of `sprite` is one row of 8 pixels, most significant bit
    /// on the left. Pixels that fall outside the display area are
    /// wrapped around to the other side.
    ///
    /// Returns `true` when the drawing erased at least one pixel that
    /// was previously set. This is used for collision detection.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut is_erased = false;

        for (r, row) in sprite.iter().enumerate() {
            for c in 0..SPRITE_WIDTH {
                if (row >> (SPRITE_WIDTH - 1 - c)) & 1 == 0 {
                    continue;
                }

                let d = (x + c) % DISPLAY_WIDTH + ((y + r) % DISPLAY_HEIGHT) * DISPLAY_WIDTH;

                // XOR erases a pixel when both the old and new values are both 1.
                is_erased |= self.pixels[d];
                self.pixels[d] = !self.pixels[d];
            }
        }

        is_erased
    }

    /// Render the buffer as text, `#` for set pixels and `.` for clear ones.
    pub fn dump(&self) -> Result<String, fmt::Error> {
        let mut buf = String::with_capacity(DISPLAY_BUFFER_SIZE + DISPLAY_HEIGHT);

        for row in self.rows() {
            for px in row {
                buf.write_char(if *px { '#' } else { '.' })?;
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.pixels.iter().filter(|px| **px).count();
        f.debug_struct("Framebuffer")
            .field("size", &DISPLAY_SIZE)
            .field("lit", &lit)
            .finish()
    }
}
