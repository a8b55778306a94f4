use crate::foundation::error::{SparkreelError, SparkreelResult};

/// Number of samples in a baked [`CurveLut`].
pub const CURVE_LUT_RESOLUTION: usize = 256;

/// Authoring-time curve control point.
///
/// `x` is the normalized time fraction of a particle's life in `0..=1`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CurvePoint {
    /// Normalized life fraction, `0..=1`.
    pub x: f64,
    /// Curve value at `x`.
    pub y: f64,
    /// Stable authoring identifier.
    pub id: String,
}

impl CurvePoint {
    /// Build a control point.
    pub fn new(x: f64, y: f64, id: impl Into<String>) -> Self {
        Self {
            x,
            y,
            id: id.into(),
        }
    }
}

/// Fixed-resolution lookup table baked from authored control points.
///
/// Baking sorts the points by `x`, linearly interpolates between neighbors
/// and extends the first/last values to the `[0, 1]` boundaries, so index 0
/// always corresponds to `x = 0` and the last index to `x = 1`. Sampling is
/// a single index lookup; control points are never re-evaluated per frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CurveLut {
    samples: Vec<f64>,
}

impl CurveLut {
    /// Bake control points into a [`CURVE_LUT_RESOLUTION`]-sample table.
    ///
    /// Fails on an empty point list, on `x` outside `[0, 1]` and on
    /// non-finite coordinates. Points sharing an `x` resolve to the later
    /// point in sort order.
    pub fn bake(points: &[CurvePoint]) -> SparkreelResult<Self> {
        if points.is_empty() {
            return Err(SparkreelError::validation(
                "curve baking requires at least one control point",
            ));
        }
        for p in points {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(SparkreelError::validation(format!(
                    "curve point '{}' has non-finite coordinates",
                    p.id
                )));
            }
            if !(0.0..=1.0).contains(&p.x) {
                return Err(SparkreelError::validation(format!(
                    "curve point '{}' has x outside [0, 1]",
                    p.id
                )));
            }
        }

        let mut sorted: Vec<&CurvePoint> = points.iter().collect();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

        let n = CURVE_LUT_RESOLUTION;
        let mut samples = Vec::with_capacity(n);
        for i in 0..n {
            let t = i as f64 / (n - 1) as f64;
            samples.push(eval_at(&sorted, t));
        }
        Ok(Self { samples })
    }

    /// Bake a constant curve. Useful as a neutral default.
    pub fn constant(y: f64) -> Self {
        Self {
            samples: vec![y; CURVE_LUT_RESOLUTION],
        }
    }

    /// Sample the curve at a normalized life fraction.
    ///
    /// O(1): clamps `fraction` to `[0, 1]` and indexes the table. Fraction 0
    /// returns the first control point's value and fraction 1 the last's.
    pub fn sample(&self, fraction: f64) -> f64 {
        let t = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let idx = (t * (self.samples.len() - 1) as f64).round() as usize;
        self.samples[idx]
    }
}

fn eval_at(sorted: &[&CurvePoint], t: f64) -> f64 {
    let first = sorted[0];
    let last = sorted[sorted.len() - 1];
    if t <= first.x {
        return first.y;
    }
    if t >= last.x {
        return last.y;
    }

    // t is strictly inside (first.x, last.x); find the enclosing segment.
    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.x {
            let dx = b.x - a.x;
            if dx <= f64::EPSILON {
                return b.y;
            }
            let u = (t - a.x) / dx;
            return a.y + (b.y - a.y) * u;
        }
    }
    last.y
}

#[cfg(test)]
#[path = "../../tests/unit/model/curve.rs"]
mod tests;
