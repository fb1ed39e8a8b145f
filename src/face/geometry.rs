/*
 *  face/geometry.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Resolution-independent shape tables for every expression
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

//! Every coordinate is in thousandths of the canvas: x-like values of its
//! width, y-like values of its height. Radii and stroke thickness are
//! thousandths of the shorter side so round things stay round after a
//! quarter-turn rotation.

use embedded_graphics::pixelcolor::Rgb565;

use super::Expression;

/// 8-bit-per-channel color folded to RGB565
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

// palette
pub const BLACK: Rgb565 = rgb(0, 0, 0);
pub const WHITE: Rgb565 = rgb(255, 255, 255);
pub const CYAN: Rgb565 = rgb(0, 255, 255);
pub const YELLOW: Rgb565 = rgb(255, 255, 0);
pub const RED: Rgb565 = rgb(255, 0, 0);
pub const SKY: Rgb565 = rgb(100, 100, 255);
pub const ROSE: Rgb565 = rgb(255, 100, 100);
pub const SILVER: Rgb565 = rgb(200, 200, 200);
pub const GRAY: Rgb565 = rgb(150, 150, 150);
pub const DIM: Rgb565 = rgb(100, 100, 100);

/// One primitive of a face, in per-mille canvas units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { cx: i32, cy: i32, r: i32, color: Rgb565 },
    Line { x0: i32, y0: i32, x1: i32, y1: i32, thickness: i32, color: Rgb565 },
    Arc { cx: i32, cy: i32, rx: i32, ry: i32, start: i32, end: i32, thickness: i32, color: Rgb565 },
    Rect { x: i32, y: i32, w: i32, h: i32, color: Rgb565 },
    Polygon { points: &'static [(i32, i32)], color: Rgb565 },
    Text { x: i32, y: i32, text: &'static str, color: Rgb565 },
}

const LEFT_EYE: i32 = 250;
const RIGHT_EYE: i32 = 750;
const EYE_Y: i32 = 333;
const EYE_R: i32 = 83;
const MOUTH_Y: i32 = 700;
const MOUTH_HALF: i32 = 167;
const STROKE: i32 = 25;

const HAPPY: &[Shape] = &[
    Shape::Circle { cx: LEFT_EYE, cy: EYE_Y, r: EYE_R, color: CYAN },
    Shape::Circle { cx: RIGHT_EYE, cy: EYE_Y, r: EYE_R, color: CYAN },
    Shape::Arc { cx: 500, cy: MOUTH_Y, rx: MOUTH_HALF, ry: 83, start: 0, end: 180, thickness: STROKE, color: YELLOW },
];

const SAD: &[Shape] = &[
    Shape::Arc { cx: LEFT_EYE, cy: 395, rx: EYE_R, ry: 62, start: 180, end: 360, thickness: STROKE, color: SKY },
    Shape::Arc { cx: RIGHT_EYE, cy: 395, rx: EYE_R, ry: 62, start: 180, end: 360, thickness: STROKE, color: SKY },
    Shape::Arc { cx: 500, cy: 783, rx: MOUTH_HALF, ry: 83, start: 180, end: 360, thickness: STROKE, color: ROSE },
];

const SURPRISED: &[Shape] = &[
    // raised brows
    Shape::Arc { cx: LEFT_EYE, cy: 208, rx: 100, ry: 42, start: 200, end: 340, thickness: 17, color: SILVER },
    Shape::Arc { cx: RIGHT_EYE, cy: 208, rx: 100, ry: 42, start: 200, end: 340, thickness: 17, color: SILVER },
    Shape::Circle { cx: LEFT_EYE, cy: EYE_Y, r: EYE_R, color: WHITE },
    Shape::Circle { cx: RIGHT_EYE, cy: EYE_Y, r: EYE_R, color: WHITE },
    Shape::Circle { cx: LEFT_EYE, cy: EYE_Y, r: 28, color: BLACK },
    Shape::Circle { cx: RIGHT_EYE, cy: EYE_Y, r: 28, color: BLACK },
    // open "O" mouth
    Shape::Circle { cx: 500, cy: 770, r: 70, color: WHITE },
    Shape::Circle { cx: 500, cy: 770, r: 45, color: BLACK },
];

const SLEEPY: &[Shape] = &[
    Shape::Arc { cx: LEFT_EYE, cy: EYE_Y, rx: EYE_R, ry: 42, start: 0, end: 180, thickness: STROKE, color: SILVER },
    Shape::Arc { cx: RIGHT_EYE, cy: EYE_Y, rx: EYE_R, ry: 42, start: 0, end: 180, thickness: STROKE, color: SILVER },
    Shape::Text { x: 750, y: 125, text: "Z", color: GRAY },
    Shape::Text { x: 812, y: 41, text: "Z", color: DIM },
    Shape::Arc { cx: 500, cy: 742, rx: 125, ry: 42, start: 0, end: 180, thickness: 17, color: SILVER },
];

const LEFT_BROW: &[(i32, i32)] = &[(146, 208), (354, 292), (354, 333), (146, 250)];
const RIGHT_BROW: &[(i32, i32)] = &[(646, 292), (854, 208), (854, 250), (646, 333)];

const ANGRY: &[Shape] = &[
    Shape::Polygon { points: LEFT_BROW, color: RED },
    Shape::Polygon { points: RIGHT_BROW, color: RED },
    Shape::Circle { cx: LEFT_EYE, cy: 417, r: 50, color: RED },
    Shape::Circle { cx: RIGHT_EYE, cy: 417, r: 50, color: RED },
    Shape::Rect { x: 333, y: 717, w: 333, h: 50, color: RED },
];

const NEUTRAL: &[Shape] = &[
    Shape::Circle { cx: LEFT_EYE, cy: EYE_Y, r: EYE_R, color: WHITE },
    Shape::Circle { cx: RIGHT_EYE, cy: EYE_Y, r: EYE_R, color: WHITE },
    Shape::Circle { cx: LEFT_EYE, cy: EYE_Y, r: 42, color: BLACK },
    Shape::Circle { cx: RIGHT_EYE, cy: EYE_Y, r: 42, color: BLACK },
    Shape::Line { x0: 500 - MOUTH_HALF, y0: MOUTH_Y, x1: 500 + MOUTH_HALF, y1: MOUTH_Y, thickness: STROKE, color: SILVER },
];

/// Shapes for an expression, in paint order
pub fn shapes(expression: Expression) -> &'static [Shape] {
    match expression {
        Expression::Happy => HAPPY,
        Expression::Sad => SAD,
        Expression::Surprised => SURPRISED,
        Expression::Sleepy => SLEEPY,
        Expression::Angry => ANGRY,
        Expression::Neutral => NEUTRAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_folding() {
        assert_eq!(rgb(255, 255, 255), Rgb565::new(31, 63, 31));
        assert_eq!(rgb(100, 100, 255), Rgb565::new(12, 25, 31));
    }

    #[test]
    fn test_every_expression_has_shapes() {
        for e in Expression::ALL {
            assert!(!shapes(e).is_empty(), "{} has no shapes", e);
        }
    }

    #[test]
    fn test_tables_stay_on_canvas() {
        let in_range = |v: i32| (0..=1000).contains(&v);
        for e in Expression::ALL {
            for shape in shapes(e) {
                let ok = match *shape {
                    Shape::Circle { cx, cy, .. } => in_range(cx) && in_range(cy),
                    Shape::Line { x0, y0, x1, y1, .. } => [x0, y0, x1, y1].into_iter().all(in_range),
                    Shape::Arc { cx, cy, rx, ry, .. } => {
                        in_range(cx - rx) && in_range(cx + rx) && in_range(cy - ry) && in_range(cy + ry)
                    }
                    Shape::Rect { x, y, w, h, .. } => in_range(x) && in_range(y + h) && in_range(x + w),
                    Shape::Polygon { points, .. } => points.iter().all(|&(x, y)| in_range(x) && in_range(y)),
                    Shape::Text { x, y, .. } => in_range(x) && in_range(y),
                };
                assert!(ok, "{} shape {:?} leaves the canvas", e, shape);
            }
        }
    }
}
