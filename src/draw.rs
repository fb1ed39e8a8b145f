/*
 *  draw.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Shape primitives over any RGB565 draw target
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

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoFont, MonoTextStyle},
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

/// Font used for every text label on the face
pub const FACE_FONT: &MonoFont<'static> = &FONT_6X10;

/// Arc tessellation step in degrees
const ARC_STEP_DEG: i32 = 6;

pub fn draw_filled_circle<D>(target: &mut D, center: Point, radius: u32, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Circle::with_center(center, radius * 2 + 1)
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(target)
}

/// Straight stroke; a zero thickness draws nothing
pub fn draw_line<D>(
    target: &mut D,
    start: Point,
    end: Point,
    color: Rgb565,
    thickness: u32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    if thickness == 0 {
        return Ok(());
    }
    Line::new(start, end)
        .into_styled(PrimitiveStyle::with_stroke(color, thickness))
        .draw(target)
}

pub fn draw_filled_rect<D>(target: &mut D, top_left: Point, size: Size, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Rectangle::new(top_left, size)
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(target)
}

/// Filled polygon, even-odd rule.
///
/// Scanline fill sampling each row at its integer y; an edge covers rows
/// from its upper end inclusive to its lower end exclusive so shared
/// vertices are not counted twice. Only rows and spans inside the target
/// are visited.
pub fn draw_polygon<D>(target: &mut D, points: &[Point], color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    if points.len() < 3 {
        return Ok(());
    }
    let bounds = target.bounding_box();
    let Some(bottom_right) = bounds.bottom_right() else {
        return Ok(());
    };
    let (left, right) = (i128::from(bounds.top_left.x), i128::from(bottom_right.x));

    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0).max(bounds.top_left.y);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0).min(bottom_right.y);

    let mut crossings: Vec<i128> = Vec::with_capacity(points.len());
    for y in min_y..=max_y {
        crossings.clear();
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            if (a.y <= y && b.y > y) || (b.y <= y && a.y > y) {
                // any i32 vertex pair keeps this product inside i128
                let (ax, ay, bx, by) = (i128::from(a.x), i128::from(a.y), i128::from(b.x), i128::from(b.y));
                crossings.push(ax + (i128::from(y) - ay) * (bx - ax) / (by - ay));
            }
        }
        crossings.sort_unstable();
        for span in crossings.chunks_exact(2) {
            let (x0, x1) = (span[0].max(left), span[1].min(right));
            if x0 > x1 {
                continue;
            }
            // both ends now lie inside the target, so they fit in i32
            let row = Rectangle::new(Point::new(x0 as i32, y), Size::new((x1 - x0 + 1) as u32, 1));
            target.fill_solid(&row, color)?;
        }
    }
    Ok(())
}

/// Elliptical arc centred on `center` with radii `radii`.
///
/// Angles are degrees measured clockwise from 3 o'clock, so 0..180 traces
/// the lower half (a smile) and 180..360 the upper half.
pub fn draw_arc<D>(
    target: &mut D,
    center: Point,
    radii: Size,
    start_deg: i32,
    end_deg: i32,
    color: Rgb565,
    thickness: u32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    if thickness == 0 || end_deg <= start_deg {
        return Ok(());
    }
    let sweep = end_deg - start_deg;
    let segments = (sweep / ARC_STEP_DEG).max(1);
    let (rx, ry) = (radii.width as f32, radii.height as f32);

    let point_at = |i: i32| {
        let theta = (start_deg as f32 + sweep as f32 * i as f32 / segments as f32).to_radians();
        Point::new(
            center.x + (rx * theta.cos()).round() as i32,
            center.y + (ry * theta.sin()).round() as i32,
        )
    };

    let mut previous = point_at(0);
    for i in 1..=segments {
        let next = point_at(i);
        draw_line(target, previous, next, color, thickness)?;
        // round joints so thick strokes don't notch at the bends
        if thickness > 2 {
            draw_filled_circle(target, next, thickness / 2, color)?;
        }
        previous = next;
    }
    Ok(())
}

/// Keep only characters the face font can render
pub fn printable(text: &str) -> String {
    text.chars().filter(|c| (' '..='~').contains(c)).collect()
}

/// Single line of text with its top-left corner at `origin`
pub fn draw_text<D>(target: &mut D, origin: Point, text: &str, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let label = printable(text);
    if label.is_empty() {
        return Ok(());
    }
    Text::with_baseline(&label, origin, MonoTextStyle::new(FACE_FONT, color), Baseline::Top)
        .draw(target)?;
    Ok(())
}
