/*
 *  face/renderer.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Paint expressions and text labels into the framebuffer
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
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::debug;

use super::geometry::{self, Shape};
use super::Expression;
use crate::display::Framebuffer;
use crate::draw;

pub const BACKGROUND: Rgb565 = geometry::BLACK;
pub const TEXT_COLOR: Rgb565 = geometry::WHITE;

/// Per-mille to pixel conversion for one canvas size
struct Scale {
    w: i32,
    h: i32,
    short: i32,
}

impl Scale {
    fn of(fb: &Framebuffer) -> Self {
        let (w, h) = (fb.width() as i32, fb.height() as i32);
        Self { w, h, short: w.min(h) }
    }

    fn x(&self, v: i32) -> i32 {
        self.w * v / 1000
    }

    fn y(&self, v: i32) -> i32 {
        self.h * v / 1000
    }

    fn point(&self, x: i32, y: i32) -> Point {
        Point::new(self.x(x), self.y(y))
    }

    /// Radius or stroke length, never thinner than a pixel
    fn len(&self, v: i32) -> u32 {
        (self.short * v / 1000).max(1) as u32
    }
}

fn paint(fb: &mut Framebuffer, scale: &Scale, shape: &Shape) -> Result<(), Infallible> {
    match *shape {
        Shape::Circle { cx, cy, r, color } => {
            draw::draw_filled_circle(fb, scale.point(cx, cy), scale.len(r), color)
        }
        Shape::Line { x0, y0, x1, y1, thickness, color } => draw::draw_line(
            fb,
            scale.point(x0, y0),
            scale.point(x1, y1),
            color,
            scale.len(thickness),
        ),
        Shape::Arc { cx, cy, rx, ry, start, end, thickness, color } => draw::draw_arc(
            fb,
            scale.point(cx, cy),
            Size::new(scale.x(rx).max(1) as u32, scale.y(ry).max(1) as u32),
            start,
            end,
            color,
            scale.len(thickness),
        ),
        Shape::Rect { x, y, w, h, color } => draw::draw_filled_rect(
            fb,
            scale.point(x, y),
            Size::new(scale.x(w).max(1) as u32, scale.y(h).max(1) as u32),
            color,
        ),
        Shape::Polygon { points, color } => {
            let corners: Vec<Point> = points.iter().map(|&(x, y)| scale.point(x, y)).collect();
            draw::draw_polygon(fb, &corners, color)
        }
        Shape::Text { x, y, text, color } => draw::draw_text(fb, scale.point(x, y), text, color),
    }
}

/// Replace the framebuffer contents with the given face.
///
/// Pure function of expression and canvas size: the same inputs always
/// produce the same pixels.
pub fn render(expression: Expression, fb: &mut Framebuffer) {
    fb.clear(BACKGROUND);
    let scale = Scale::of(fb);
    for shape in geometry::shapes(expression) {
        let Ok(()) = paint(fb, &scale, shape);
    }
    debug!("rendered {} on {}x{} canvas", expression, fb.width(), fb.height());
}

/// Replace the framebuffer contents with a single text label whose
/// top-left corner sits at (x, y). Text running off the canvas is clipped.
pub fn render_custom_text(text: &str, x: u32, y: u32, fb: &mut Framebuffer) {
    fb.clear(BACKGROUND);
    let origin = Point::new(x as i32, y as i32);
    let Ok(()) = draw::draw_text(fb, origin, text, TEXT_COLOR);
    debug!("rendered text {:?} at ({}, {})", text, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayConfig, Rotation};
    use crate::face::geometry::{CYAN, RED, YELLOW};

    fn canvas(rotation: Rotation) -> Framebuffer {
        Framebuffer::new(&DisplayConfig::with_geometry(128, 160, rotation).unwrap())
    }

    #[test]
    fn test_render_is_deterministic() {
        for e in Expression::ALL {
            let mut a = canvas(Rotation::Deg90);
            let mut b = canvas(Rotation::Deg90);
            render(e, &mut a);
            render(e, &mut b);
            assert_eq!(a.as_bytes(), b.as_bytes(), "{} differs between renders", e);
        }
    }

    #[test]
    fn test_render_replaces_previous_face() {
        let mut fb = canvas(Rotation::Deg90);
        render(Expression::Angry, &mut fb);
        render(Expression::Happy, &mut fb);

        let mut fresh = canvas(Rotation::Deg90);
        render(Expression::Happy, &mut fresh);
        assert_eq!(fb, fresh);
        assert_eq!(fb.count(RED), 0);
    }

    #[test]
    fn test_expressions_are_distinct() {
        let frames: Vec<Vec<u8>> = Expression::ALL
            .iter()
            .map(|&e| {
                let mut fb = canvas(Rotation::Deg90);
                render(e, &mut fb);
                fb.as_bytes()
            })
            .collect();
        for i in 0..frames.len() {
            for j in (i + 1)..frames.len() {
                assert_ne!(frames[i], frames[j], "{} and {}", Expression::ALL[i], Expression::ALL[j]);
            }
        }
    }

    #[test]
    fn test_happy_layout_landscape() {
        let mut fb = canvas(Rotation::Deg90);
        render(Expression::Happy, &mut fb);
        // 160x128 canvas: eyes at (40, 42) and (120, 42), smile below centre
        assert_eq!(fb.get_pixel(40, 42), Some(CYAN));
        assert_eq!(fb.get_pixel(120, 42), Some(CYAN));
        assert_eq!(fb.get_pixel(80, 99), Some(YELLOW));
        assert_eq!(fb.get_pixel(80, 60), Some(BACKGROUND));
    }

    #[test]
    fn test_render_fits_portrait_too() {
        let mut fb = canvas(Rotation::Deg0);
        render(Expression::Happy, &mut fb);
        // 128x160 canvas: eyes at (32, 53)
        assert_eq!(fb.get_pixel(32, 53), Some(CYAN));
        assert_eq!(fb.get_pixel(96, 53), Some(CYAN));
    }

    #[test]
    fn test_custom_text_clears_face() {
        let mut fb = canvas(Rotation::Deg90);
        render(Expression::Happy, &mut fb);
        render_custom_text("Hello", 10, 50, &mut fb);

        assert_eq!(fb.count(CYAN), 0);
        assert!(fb.count(TEXT_COLOR) > 0);
        // nothing above the label's top edge
        for y in 0..50 {
            for x in 0..fb.width() {
                assert_eq!(fb.get_pixel(x, y), Some(BACKGROUND));
            }
        }
    }

    #[test]
    fn test_custom_text_clips_at_edge() {
        let mut fb = canvas(Rotation::Deg90);
        render_custom_text("a long line that runs off the right edge", 150, 120, &mut fb);
        assert!(fb.count(TEXT_COLOR) > 0);
    }
}
