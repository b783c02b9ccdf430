//! Depth strata
//!
//! A strictly decreasing sequence of cut points `c0 > c1 > ... > cn` defines
//! `n` strata. Stratum `i` is `(c[i+1], c[i]]`, except the deepest, which is
//! closed at the bottom: `[c[n], c[n-1]]`. Together they partition
//! `[cn, c0]` with no gaps or overlaps. Values outside `[cn, c0]` belong to
//! no stratum.

use bathyzone_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One depth interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStratum {
    pub index: usize,
    pub upper: f64,
    pub lower: f64,
    closed_below: bool,
}

impl DepthStratum {
    pub fn contains(&self, value: f64) -> bool {
        let above_lower = if self.closed_below {
            value >= self.lower
        } else {
            value > self.lower
        };
        above_lower && value <= self.upper
    }
}

impl fmt::Display for DepthStratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.closed_below { '[' } else { '(' };
        write!(f, "{}{}, {}]", open, self.lower, self.upper)
    }
}

/// Ordered depth strata built from a cut sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct DepthStrata {
    cuts: Vec<f64>,
}

impl DepthStrata {
    /// Build strata from a strictly decreasing cut sequence of at least two points
    pub fn new(cuts: Vec<f64>) -> Result<Self> {
        if cuts.len() < 2 {
            return Err(Error::InvalidParameter {
                name: "depth_cuts",
                value: format!("{:?}", cuts),
                reason: "need at least two cut points".into(),
            });
        }
        if cuts.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "depth_cuts",
                value: format!("{:?}", cuts),
                reason: "cut points must be finite".into(),
            });
        }
        if cuts.windows(2).any(|w| w[1] >= w[0]) {
            return Err(Error::InvalidParameter {
                name: "depth_cuts",
                value: format!("{:?}", cuts),
                reason: "cut points must be strictly decreasing".into(),
            });
        }
        Ok(Self { cuts })
    }

    /// Number of strata
    pub fn len(&self) -> usize {
        self.cuts.len() - 1
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cuts(&self) -> &[f64] {
        &self.cuts
    }

    /// Shallowest and deepest bound covered
    pub fn range(&self) -> (f64, f64) {
        (self.cuts[self.cuts.len() - 1], self.cuts[0])
    }

    pub fn stratum(&self, index: usize) -> Option<DepthStratum> {
        (index < self.len()).then(|| DepthStratum {
            index,
            upper: self.cuts[index],
            lower: self.cuts[index + 1],
            closed_below: index + 1 == self.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = DepthStratum> + '_ {
        (0..self.len()).filter_map(|i| self.stratum(i))
    }

    /// Index of the stratum containing `value`, `None` if it is not finite or
    /// lies outside the covered range
    pub fn classify(&self, value: f64) -> Option<usize> {
        let (lowest, highest) = self.range();
        if !value.is_finite() || value > highest || value < lowest {
            return None;
        }
        // Number of cuts at or above the value; stratum i has i+1 of them
        let at_or_above = self.cuts.partition_point(|&c| c >= value);
        Some((at_or_above - 1).min(self.len() - 1))
    }

    /// Display labels, one per stratum
    pub fn labels(&self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl TryFrom<Vec<f64>> for DepthStrata {
    type Error = Error;

    fn try_from(cuts: Vec<f64>) -> Result<Self> {
        Self::new(cuts)
    }
}

impl From<DepthStrata> for Vec<f64> {
    fn from(strata: DepthStrata) -> Self {
        strata.cuts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strata() -> DepthStrata {
        DepthStrata::new(vec![0.0, -50.0, -100.0, -150.0]).unwrap()
    }

    #[test]
    fn test_classify_half_open() {
        let s = strata();
        assert_eq!(s.len(), 3);
        assert_eq!(s.classify(0.0), Some(0));
        assert_eq!(s.classify(-25.0), Some(0));
        assert_eq!(s.classify(-49.999999), Some(0));
        assert_eq!(s.classify(-50.0), Some(1));
        assert_eq!(s.classify(-99.9), Some(1));
        assert_eq!(s.classify(-100.0), Some(2));
        assert_eq!(s.classify(-149.0), Some(2));
        assert_eq!(s.classify(-150.0), Some(2));
        assert_eq!(s.classify(-150.1), None);
        assert_eq!(s.classify(0.1), None);
        assert_eq!(s.classify(f64::NAN), None);
    }

    #[test]
    fn test_classify_agrees_with_contains() {
        let s = strata();
        let mut v = 0.0;
        while v >= -150.0 {
            let hits: Vec<usize> = s.iter().filter(|st| st.contains(v)).map(|st| st.index).collect();
            assert_eq!(hits.len(), 1, "value {} in {:?}", v, hits);
            assert_eq!(s.classify(v), Some(hits[0]));
            v -= 2.5;
        }
    }

    #[test]
    fn test_rejects_bad_cuts() {
        assert!(DepthStrata::new(vec![0.0]).is_err());
        assert!(DepthStrata::new(vec![0.0, -10.0, -10.0]).is_err());
        assert!(DepthStrata::new(vec![-10.0, 0.0]).is_err());
        assert!(DepthStrata::new(vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_labels_and_conversion() {
        let s = strata();
        assert_eq!(s.labels(), vec!["(-50, 0]", "(-100, -50]", "[-150, -100]"]);

        let cuts: Vec<f64> = s.clone().into();
        assert_eq!(DepthStrata::try_from(cuts).unwrap(), s);
        assert!(DepthStrata::try_from(vec![1.0, 2.0]).is_err());
    }
}
