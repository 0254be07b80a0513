//! 5-point face landmarks, carried through the session untouched.
//!
//! The orchestrator never interprets landmark geometry; it is surfaced with
//! each detection so a subscriber can draw overlays on the preview.

/// Landmark order: [left_eye, right_eye, nose, left_mouth, right_mouth].
#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: [(f32, f32); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f32, f32); 5]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f32, f32); 5] {
        &self.points
    }

    /// Arithmetic centroid, a convenient anchor for overlay labels.
    pub fn center(&self) -> (f32, f32) {
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        (sx / 5.0, sy / 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_points_round_trip() {
        let pts = [
            (440.0, 350.0),
            (560.0, 350.0),
            (500.0, 420.0),
            (460.0, 470.0),
            (540.0, 470.0),
        ];
        let lm = FaceLandmarks::new(pts);
        assert_eq!(lm.points(), &pts);
    }

    #[test]
    fn test_center_is_mean_of_points() {
        let lm = FaceLandmarks::new([
            (0.0, 0.0),
            (10.0, 0.0),
            (5.0, 5.0),
            (0.0, 10.0),
            (10.0, 10.0),
        ]);
        let (cx, cy) = lm.center();
        assert_relative_eq!(cx, 5.0);
        assert_relative_eq!(cy, 5.0);
    }
}
