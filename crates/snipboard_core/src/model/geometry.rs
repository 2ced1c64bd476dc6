//! Page-space rectangle helpers for text selections.
//!
//! # Responsibility
//! - Turn raw viewer selection rectangles into the rectangles worth storing.
//! - Convert between viewer zoom levels and the scale-1.0 storage space.
//!
//! # Invariants
//! - Stored rectangles are always in scale-1.0 page coordinates.
//! - Helpers never reorder input they do not merge.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_RECT_WIDTH: f64 = 2.0;
pub const DEFAULT_MIN_RECT_HEIGHT: f64 = 2.0;
pub const DEFAULT_LINE_TOLERANCE: f64 = 5.0;
pub const DEFAULT_GAP_TOLERANCE: f64 = 10.0;

/// Axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Smallest rectangle enclosing all of `rects`, or `None` when empty.
pub fn bounding_box(rects: &[Rect]) -> Option<Rect> {
    let first = rects.first()?;
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.right(), first.bottom());

    for rect in &rects[1..] {
        min_x = min_x.min(rect.x);
        min_y = min_y.min(rect.y);
        max_x = max_x.max(rect.right());
        max_y = max_y.max(rect.bottom());
    }

    Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

/// Drops rectangles smaller than the given size (selection artifacts).
pub fn filter_small(rects: &[Rect], min_width: f64, min_height: f64) -> Vec<Rect> {
    rects
        .iter()
        .copied()
        .filter(|rect| rect.width >= min_width && rect.height >= min_height)
        .collect()
}

/// Merges rectangles that sit on the same text line and touch or nearly touch.
///
/// Rectangles whose `y` lies within `line_tolerance` of a line's first
/// rectangle belong to that line. Within a line, a rectangle starting no
/// further than `gap_tolerance` right of the running rectangle is folded into
/// it. Output is ordered top-to-bottom, then left-to-right.
pub fn merge_adjacent(rects: &[Rect], line_tolerance: f64, gap_tolerance: f64) -> Vec<Rect> {
    let mut sorted = rects.to_vec();
    sorted.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<Rect>> = Vec::new();
    for rect in sorted {
        match lines.last_mut() {
            Some(line) if (rect.y - line[0].y).abs() <= line_tolerance => line.push(rect),
            _ => lines.push(vec![rect]),
        }
    }

    let mut merged = Vec::new();
    for mut line in lines {
        line.sort_by(|a, b| a.x.total_cmp(&b.x));
        let mut current = line[0];
        for next in &line[1..] {
            if next.x <= current.right() + gap_tolerance {
                let right = current.right().max(next.right());
                current.width = right - current.x;
                current.height = current.height.max(next.height);
            } else {
                merged.push(current);
                current = *next;
            }
        }
        merged.push(current);
    }
    merged
}

/// Scales rectangles to the given zoom factor.
pub fn scale(rects: &[Rect], factor: f64) -> Vec<Rect> {
    rects
        .iter()
        .map(|rect| {
            Rect::new(
                rect.x * factor,
                rect.y * factor,
                rect.width * factor,
                rect.height * factor,
            )
        })
        .collect()
}

/// Converts rectangles captured at `current_scale` back to scale 1.0.
///
/// Returns `None` when `current_scale` is zero, negative or not finite.
pub fn normalize(rects: &[Rect], current_scale: f64) -> Option<Vec<Rect>> {
    if !current_scale.is_finite() || current_scale <= 0.0 {
        return None;
    }
    if current_scale == 1.0 {
        return Some(rects.to_vec());
    }
    Some(scale(rects, 1.0 / current_scale))
}

/// Prepares raw selection rectangles for storage with the default tolerances.
///
/// Order: normalize to scale 1.0, drop artifacts, merge per line.
pub fn prepare_selection(rects: &[Rect], current_scale: f64) -> Option<Vec<Rect>> {
    let normalized = normalize(rects, current_scale)?;
    let filtered = filter_small(&normalized, DEFAULT_MIN_RECT_WIDTH, DEFAULT_MIN_RECT_HEIGHT);
    Some(merge_adjacent(
        &filtered,
        DEFAULT_LINE_TOLERANCE,
        DEFAULT_GAP_TOLERANCE,
    ))
}
