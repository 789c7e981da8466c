use serde::{Deserialize, Serialize};

/// Interval covered by a shape when projected onto an axis ("shadow" on the axis).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub min: f32,
    pub max: f32,
}

impl Projection {
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn overlaps(&self, other: &Projection) -> bool {
        self.max > other.min && other.max > self.min
    }

    /// Signed overlap length; negative when the intervals are disjoint.
    pub fn overlap(&self, other: &Projection) -> f32 {
        self.max.min(other.max) - self.min.max(other.min)
    }

    pub fn combine(&self, other: &Projection) -> Projection {
        Projection {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_signed() {
        let a = Projection::new(0.0, 2.0);
        assert_eq!(a.overlap(&Projection::new(1.5, 3.0)), 0.5);
        assert_eq!(a.overlap(&Projection::new(3.0, 4.0)), -1.0);
        assert!(!a.overlaps(&Projection::new(3.0, 4.0)));
    }
}
