//! Diagnostic drawing hooks.
//!
//! The core never renders anything itself. Callers pass a [`DebugDraw`]
//! implementation into the `debug` methods of the tree, colliders, contacts
//! and world; drawing never mutates simulation state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::bounds::BoundingBox;

/// Straight RGBA color in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebugColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl DebugColor {
    pub const WHITE: DebugColor = DebugColor::rgb(1.0, 1.0, 1.0);
    pub const RED: DebugColor = DebugColor::rgb(1.0, 0.0, 0.0);
    pub const GREEN: DebugColor = DebugColor::rgb(0.0, 1.0, 0.0);
    pub const BLUE: DebugColor = DebugColor::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: DebugColor = DebugColor::rgb(1.0, 1.0, 0.0);
    pub const GRAY: DebugColor = DebugColor::rgb(0.5, 0.5, 0.5);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Immediate-mode drawing context supplied by the host renderer.
pub trait DebugDraw {
    fn draw_line(&mut self, start: Vec2, end: Vec2, color: DebugColor);

    fn draw_point(&mut self, point: Vec2, color: DebugColor);

    fn draw_rect(&mut self, bounds: &BoundingBox, color: DebugColor) {
        let corners = [
            bounds.min,
            Vec2::new(bounds.max.x, bounds.min.y),
            bounds.max,
            Vec2::new(bounds.min.x, bounds.max.y),
        ];
        for i in 0..4 {
            self.draw_line(corners[i], corners[(i + 1) % 4], color);
        }
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, color: DebugColor) {
        const SEGMENTS: usize = 16;
        let step = std::f32::consts::TAU / SEGMENTS as f32;
        let mut previous = center + Vec2::new(radius, 0.0);
        for i in 1..=SEGMENTS {
            let next = center + Vec2::from_angle(step * i as f32) * radius;
            self.draw_line(previous, next, color);
            previous = next;
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDraw;

impl DebugDraw for NoopDraw {
    fn draw_line(&mut self, _start: Vec2, _end: Vec2, _color: DebugColor) {}

    fn draw_point(&mut self, _point: Vec2, _color: DebugColor) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum DebugCommand {
    Line {
        start: Vec2,
        end: Vec2,
        color: DebugColor,
    },
    Point {
        point: Vec2,
        color: DebugColor,
    },
    Rect {
        bounds: BoundingBox,
        color: DebugColor,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: DebugColor,
    },
}

/// Records draw calls so they can be inspected or replayed later.
#[derive(Debug, Default, Clone)]
pub struct DebugRecorder {
    pub commands: Vec<DebugCommand>,
}

impl DebugRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn rects(&self) -> impl Iterator<Item = &BoundingBox> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DebugCommand::Rect { bounds, .. } => Some(bounds),
            _ => None,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DebugCommand::Point { point, .. } => Some(*point),
            _ => None,
        })
    }

    /// Re-issues every recorded command against another context.
    pub fn replay(&self, draw: &mut dyn DebugDraw) {
        for command in &self.commands {
            match *command {
                DebugCommand::Line { start, end, color } => draw.draw_line(start, end, color),
                DebugCommand::Point { point, color } => draw.draw_point(point, color),
                DebugCommand::Rect { bounds, color } => draw.draw_rect(&bounds, color),
                DebugCommand::Circle {
                    center,
                    radius,
                    color,
                } => draw.draw_circle(center, radius, color),
            }
        }
    }
}

impl DebugDraw for DebugRecorder {
    fn draw_line(&mut self, start: Vec2, end: Vec2, color: DebugColor) {
        self.commands.push(DebugCommand::Line { start, end, color });
    }

    fn draw_point(&mut self, point: Vec2, color: DebugColor) {
        self.commands.push(DebugCommand::Point { point, color });
    }

    fn draw_rect(&mut self, bounds: &BoundingBox, color: DebugColor) {
        self.commands.push(DebugCommand::Rect {
            bounds: *bounds,
            color,
        });
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, color: DebugColor) {
        self.commands.push(DebugCommand::Circle {
            center,
            radius,
            color,
        });
    }
}

/// Draws `normal` as a short arrow rooted at `point`.
pub fn draw_normal(draw: &mut dyn DebugDraw, point: Vec2, normal: Vec2, length: f32, color: DebugColor) {
    let tip = point + normal * length;
    draw.draw_line(point, tip, color);
    let back = -normal * (length * 0.25);
    let side = Vec2::new(-normal.y, normal.x) * (length * 0.15);
    draw.draw_line(tip, tip + back + side, color);
    draw.draw_line(tip, tip + back - side, color);
}
