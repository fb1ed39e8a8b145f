/*
 *  display/framebuffer.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  RGB565 off-screen canvas with software rotation onto panel order
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PointsIter, Rectangle};

use crate::config::{DisplayConfig, Rotation};
use crate::display::error::DisplayError;

/// Wire size of one RGB565 pixel
pub const BYTES_PER_PIXEL: usize = 2;

/// Off-screen canvas the face renderer draws into.
///
/// Storage is kept in native panel order (row-major over the panel's own
/// columns and rows) so a flush is a straight copy. Callers address the
/// rotated canvas; `index` maps canvas coordinates onto storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    buf: Vec<Rgb565>,
    native_w: u32,
    native_h: u32,
    rotation: Rotation,
}

impl Framebuffer {
    pub fn new(config: &DisplayConfig) -> Self {
        let (native_w, native_h) = (config.width(), config.height());
        Self {
            buf: vec![Rgb565::BLACK; (native_w * native_h) as usize],
            native_w,
            native_h,
            rotation: config.rotation(),
        }
    }

    /// Canvas width as seen by callers
    pub fn width(&self) -> u32 {
        if self.rotation.swaps_axes() { self.native_h } else { self.native_w }
    }

    /// Canvas height as seen by callers
    pub fn height(&self) -> u32 {
        if self.rotation.swaps_axes() { self.native_w } else { self.native_h }
    }

    pub fn native_size(&self) -> (u32, u32) {
        (self.native_w, self.native_h)
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self, color: Rgb565) {
        self.buf.fill(color);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let (nw, nh) = (self.native_w, self.native_h);
        let (u, v) = match self.rotation {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (nw - 1 - y, x),
            Rotation::Deg180 => (nw - 1 - x, nh - 1 - y),
            Rotation::Deg270 => (y, nh - 1 - x),
        };
        Some((v * nw + u) as usize)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb565) -> Result<(), DisplayError> {
        let i = self.index(x, y).ok_or(DisplayError::OutOfBounds { x, y })?;
        self.buf[i] = color;
        Ok(())
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        self.index(x, y).map(|i| self.buf[i])
    }

    /// Count pixels of a given color (handy in tests)
    pub fn count(&self, color: Rgb565) -> usize {
        self.buf.iter().filter(|&&c| c == color).count()
    }

    /// Pixel stream in panel order, two big-endian bytes per pixel
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.buf.len() * BYTES_PER_PIXEL);
        for pixel in &self.buf {
            bytes.extend_from_slice(&pixel.into_storage().to_be_bytes());
        }
        bytes
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if p.x < 0 || p.y < 0 {
                continue;
            }
            if let Some(i) = self.index(p.x as u32, p.y as u32) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let drawable = area.intersection(&self.bounding_box());
        let Some(last) = drawable.bottom_right() else {
            return Ok(());
        };
        // colors run row-major over the whole area; stop after the last visible row
        let rows = (last.y - area.top_left.y + 1) as usize;
        let take = rows * area.size.width as usize;
        for (Point { x, y }, c) in area.points().zip(colors).take(take) {
            if x < 0 || y < 0 {
                continue;
            }
            if let Some(i) = self.index(x as u32, y as u32) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let drawable = area.intersection(&self.bounding_box());
        let Some(last) = drawable.bottom_right() else {
            return Ok(());
        };
        let (x0, y0) = (drawable.top_left.x as u32, drawable.top_left.y as u32);
        let (x1, y1) = (last.x as u32, last.y as u32);

        if self.rotation == Rotation::Deg0 {
            let w = self.native_w as usize;
            for y in y0..=y1 {
                let start = y as usize * w + x0 as usize;
                self.buf[start..=start + (x1 - x0) as usize].fill(color);
            }
            return Ok(());
        }
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(i) = self.index(x, y) {
                    self.buf[i] = color;
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(color);
        Ok(())
    }
}
