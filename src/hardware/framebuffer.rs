//! In-memory 128x64 monochrome frame, for host runs and render tests

use super::display::{DisplayError, Panel, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use embedded_graphics::{pixelcolor::BinaryColor, prelude::*, Pixel};
use std::convert::Infallible;

const W: usize = DISPLAY_WIDTH as usize;
const H: usize = DISPLAY_HEIGHT as usize;

#[derive(Clone)]
pub struct FrameBuffer {
    pixels: [[bool; W]; H],
    flushes: u32,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: [[false; W]; H],
            flushes: 0,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().flatten().filter(|p| **p).count()
    }

    pub fn lit_in(&self, area: std::ops::Range<usize>, rows: std::ops::Range<usize>) -> usize {
        rows.flat_map(|y| area.clone().map(move |x| (x, y)))
            .filter(|(x, y)| self.pixel(*x, *y))
            .count()
    }

    /// How many frames have been pushed to the "panel".
    pub fn flushes(&self) -> u32 {
        self.flushes
    }

    /// ASCII dump, handy when a render test fails.
    pub fn to_ascii(&self) -> String {
        self.pixels
            .iter()
            .map(|row| row.iter().map(|p| if *p { '#' } else { '.' }).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("lit", &self.lit_pixels())
            .field("flushes", &self.flushes)
            .finish()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) {
                if x < W && y < H {
                    self.pixels[y][x] = color.is_on();
                }
            }
        }
        Ok(())
    }
}

impl Panel for FrameBuffer {
    fn clear_panel(&mut self) {
        self.pixels = [[false; W]; H];
    }

    fn flush_panel(&mut self) -> Result<(), DisplayError> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_draw_clips_to_panel() {
        let mut fb = FrameBuffer::new();
        Rectangle::new(Point::new(120, 60), Size::new(20, 20))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.lit_pixels(), 8 * 4);
        assert!(fb.pixel(127, 63));
        assert!(!fb.pixel(128, 63));

        fb.clear_panel();
        assert_eq!(fb.lit_pixels(), 0);
    }
}
