//! Geometric primitives for occlusion and containment analysis.
//!
//! The interesting piece is [`RectUnion`]: an exact, incrementally grown
//! disjoint covering of axis-aligned rectangles. It answers "is this rectangle
//! fully covered by everything added so far" without any rasterization, which
//! is what the paint-order analyzer needs to decide whether a node is hidden
//! behind later-painted content.

use serde::{Deserialize, Serialize};

/// Tolerance for edge comparisons. Layout engines report sub-pixel bounds and
/// two rectangles meeting at the "same" edge rarely agree to the last bit.
const EPS: f64 = 1e-6;

/// Axis-aligned rectangle in viewport coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
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

    pub fn area(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.width * self.height
        }
    }

    /// A rectangle with non-positive extent covers nothing.
    pub fn is_empty(&self) -> bool {
        self.width <= EPS || self.height <= EPS
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() - EPS
            && self.right() > other.x + EPS
            && self.y < other.bottom() - EPS
            && self.bottom() > other.y + EPS
    }

    /// Intersection rectangle, or `None` when the two do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let r = Rect::new(x, y, right - x, bottom - y);
        if r.is_empty() { None } else { Some(r) }
    }

    /// Whether `other` lies entirely inside `self` (edges may touch).
    pub fn covers(&self, other: &Rect) -> bool {
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }

    /// Fraction of `self`'s area that falls inside `other`. Returns 0.0 for a
    /// degenerate `self` so malformed bounds never count as contained.
    pub fn overlap_ratio(&self, other: &Rect) -> f64 {
        let own = self.area();
        if own <= 0.0 {
            return 0.0;
        }
        self.intersection(other)
            .map(|i| i.area() / own)
            .unwrap_or(0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// `piece` minus `s`, decomposed into at most four disjoint residual slices:
/// the part above `s`, the part below `s`, and the left/right parts within
/// `s`'s vertical overlap span. Returns `piece` unchanged when the two do not
/// intersect, and nothing when `s` swallows `piece` whole.
fn split_diff(piece: &Rect, s: &Rect) -> Vec<Rect> {
    if !piece.intersects(s) {
        return vec![*piece];
    }
    if s.covers(piece) {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(4);

    // Slice above s.
    if piece.y < s.y - EPS {
        out.push(Rect::new(piece.x, piece.y, piece.width, s.y - piece.y));
    }
    // Slice below s.
    if piece.bottom() > s.bottom() + EPS {
        out.push(Rect::new(
            piece.x,
            s.bottom(),
            piece.width,
            piece.bottom() - s.bottom(),
        ));
    }

    // Left/right slices only span the vertical overlap of piece and s.
    let span_top = piece.y.max(s.y);
    let span_bottom = piece.bottom().min(s.bottom());
    if span_bottom - span_top > EPS {
        if piece.x < s.x - EPS {
            out.push(Rect::new(piece.x, span_top, s.x - piece.x, span_bottom - span_top));
        }
        if piece.right() > s.right() + EPS {
            out.push(Rect::new(
                s.right(),
                span_top,
                piece.right() - s.right(),
                span_bottom - span_top,
            ));
        }
    }

    out.retain(|r| !r.is_empty());
    out
}

/// Incrementally grown union of rectangles kept as disjoint fragments.
///
/// Both operations are exact: `contains` peels a candidate against every
/// member until it either vanishes (fully covered) or a residual survives,
/// and `add` stores only the fragments of the new rectangle that the union
/// did not already cover, so members never overlap.
#[derive(Debug, Clone, Default)]
pub struct RectUnion {
    rects: Vec<Rect>,
}

impl RectUnion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Number of disjoint fragments currently held.
    pub fn fragment_count(&self) -> usize {
        self.rects.len()
    }

    /// Whether `rect` is fully covered by the union.
    pub fn contains(&self, rect: &Rect) -> bool {
        if rect.is_empty() {
            return false;
        }
        let mut stack = vec![*rect];
        for s in &self.rects {
            let mut next = Vec::with_capacity(stack.len());
            for piece in &stack {
                next.extend(split_diff(piece, s));
            }
            stack = next;
            if stack.is_empty() {
                return true;
            }
        }
        stack.is_empty()
    }

    /// Add `rect` to the union. Returns `false` without changing anything when
    /// the rectangle was already fully covered.
    pub fn add(&mut self, rect: Rect) -> bool {
        if rect.is_empty() || self.contains(&rect) {
            return false;
        }
        let mut fragments = vec![rect];
        for s in &self.rects {
            let mut next = Vec::with_capacity(fragments.len());
            for piece in &fragments {
                next.extend(split_diff(piece, s));
            }
            fragments = next;
            if fragments.is_empty() {
                return false;
            }
        }
        self.rects.extend(fragments);
        true
    }
}
