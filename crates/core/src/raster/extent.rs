//! Axis-aligned map extents

use geo::{coord, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in map units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Whether the two extents share a region of positive area
    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Grow the extent by `margin` on every side
    pub fn expanded(&self, margin: f64) -> Extent {
        Extent {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

impl From<(f64, f64, f64, f64)> for Extent {
    fn from((min_x, min_y, max_x, max_y): (f64, f64, f64, f64)) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }
}

impl From<Rect<f64>> for Extent {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        }
    }
}

impl From<Extent> for Rect<f64> {
    fn from(e: Extent) -> Self {
        Rect::new(coord! { x: e.min_x, y: e.min_y }, coord! { x: e.max_x, y: e.max_y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_strict() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Extent::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!a.intersects(&Extent::new(20.0, 20.0, 30.0, 30.0)));
        // Touching edges share no area
        assert!(!a.intersects(&Extent::new(10.0, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn test_expanded() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0).expanded(1.0);
        assert_eq!(a, Extent::new(-1.0, -1.0, 11.0, 11.0));
    }

    #[test]
    fn test_rect_conversion() {
        let a = Extent::new(1.0, 2.0, 3.0, 4.0);
        let rect: Rect<f64> = a.into();
        assert_eq!(Extent::from(rect), a);
    }
}
