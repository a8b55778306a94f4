use kurbo::Point;
use rand::Rng;

use crate::foundation::core::Rgba8;
use crate::model::color::ColorDef;
use crate::model::curve::CurveLut;

/// A base magnitude plus a bounded symmetric stochastic spread.
///
/// Sampling draws uniformly from
/// `[value * (1 - variability), value * (1 + variability)]` using the
/// caller-provided random source, so seeded tests are fully deterministic.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PMNumber {
    /// Base magnitude.
    pub value: f64,
    /// Symmetric spread as a fraction of `value`.
    pub variability: f64,
}

impl PMNumber {
    /// A value with no spread.
    pub fn exact(value: f64) -> Self {
        Self {
            value,
            variability: 0.0,
        }
    }

    /// Draw one value from the spread using `rng`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let unit = 2.0 * rng.r#gen::<f64>() - 1.0; // uniform in [-1, 1)
        self.value * (1.0 + self.variability * unit)
    }
}

/// Spawn-region shape of an emitter.
///
/// Serialized with the authoring format's `type` tag, e.g.
/// `{"type": "circle", "x": 0, "y": 0, "radius": 16}`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmitterShape {
    /// All particles spawn at one point.
    Point {
        /// Spawn x.
        x: f64,
        /// Spawn y.
        y: f64,
    },
    /// Uniform distribution over a disc.
    Circle {
        /// Center x.
        x: f64,
        /// Center y.
        y: f64,
        /// Disc radius.
        radius: f64,
    },
    /// Uniform distribution over an axis-aligned rectangle. `(x, y)` is the
    /// top-left corner in canvas coordinates.
    Rectangle {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Rectangle width.
        width: f64,
        /// Rectangle height.
        height: f64,
    },
}

impl EmitterShape {
    /// Draw one spawn position uniformly distributed over the shape.
    pub fn sample_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        match *self {
            Self::Point { x, y } => Point::new(x, y),
            Self::Circle { x, y, radius } => {
                // sqrt keeps the distribution uniform over area, not radius.
                let r = radius * rng.r#gen::<f64>().sqrt();
                let theta = std::f64::consts::TAU * rng.r#gen::<f64>();
                Point::new(x + r * theta.cos(), y + r * theta.sin())
            }
            Self::Rectangle {
                x,
                y,
                width,
                height,
            } => Point::new(
                x + width * rng.r#gen::<f64>(),
                y + height * rng.r#gen::<f64>(),
            ),
        }
    }
}

/// How a sprite is composited onto the frame surface.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Standard source-over compositing.
    #[default]
    Normal,
    /// Saturating additive compositing (glow/fire).
    Additive,
    /// Screen compositing: `out = 1 - (1 - dst)(1 - src)`.
    Screen,
}

/// Baked lifetime curves for one particle type.
///
/// Each curve is sampled at the particle's elapsed life fraction; an absent
/// curve means the attribute is left at its spawned value.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CurveSet {
    /// Opacity multiplier over life.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<CurveLut>,
    /// Radius multiplier over life.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<CurveLut>,
    /// Speed multiplier over life.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<CurveLut>,
}

impl CurveSet {
    /// Opacity multiplier at `fraction`, 1.0 when no curve is set.
    pub fn opacity_at(&self, fraction: f64) -> f64 {
        self.opacity.as_ref().map_or(1.0, |c| c.sample(fraction))
    }

    /// Radius multiplier at `fraction`, 1.0 when no curve is set.
    pub fn scale_at(&self, fraction: f64) -> f64 {
        self.scale.as_ref().map_or(1.0, |c| c.sample(fraction))
    }

    /// Speed multiplier at `fraction`, 1.0 when no curve is set.
    pub fn speed_at(&self, fraction: f64) -> f64 {
        self.speed.as_ref().map_or(1.0, |c| c.sample(fraction))
    }
}

/// Per-particle-type template: initial distributions plus static attributes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParticleParams {
    /// Initial radius distribution, pixels.
    pub radius: PMNumber,
    /// Initial travel direction distribution, radians.
    pub direction_rad: PMNumber,
    /// Initial sprite rotation distribution, radians.
    pub rotation_rad: PMNumber,
    /// Initial speed distribution, pixels per second.
    pub speed: PMNumber,
    /// Lifespan distribution, seconds.
    pub lifespan: PMNumber,
    /// Tint color applied to the sprite.
    pub color: ColorDef,
    /// Base sprite name resolved through the texture cache.
    pub texture: String,
    /// Compositing mode.
    #[serde(default)]
    pub blend: BlendMode,
    /// Baked lifetime curves.
    #[serde(default)]
    pub curves: CurveSet,
}

/// An emitter: spawn shape, emission timing and the particle template.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Emitter {
    /// Spawn-region shape.
    pub shape: EmitterShape,
    /// Emissions per second.
    pub emission_rate: PMNumber,
    /// Particles spawned per emission.
    pub particles_per_emission: PMNumber,
    /// Template for spawned particles.
    pub params: ParticleParams,
}

/// Instantaneous render state of one particle for one frame.
///
/// A new snapshot exists per frame per entity; the export core never mutates
/// one in place.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Particle {
    /// Position in canvas coordinates.
    pub position: Point,
    /// Sprite radius in pixels (the drawn sprite spans `2 * radius`).
    pub radius: f64,
    /// Sprite rotation, radians.
    pub rotation_rad: f64,
    /// Travel direction, radians.
    pub direction_rad: f64,
    /// Speed, pixels per second.
    pub speed: f64,
    /// Remaining life fraction in `0..=1`.
    pub life: f64,
    /// Opacity multiplier in `0..=1`.
    pub opacity: f64,
    /// Tint color.
    pub color: Rgba8,
    /// Base sprite name.
    pub texture: String,
    /// Compositing mode.
    #[serde(default)]
    pub blend: BlendMode,
}

/// An ordered, complete particle snapshot at one time step.
///
/// The export pipeline requires a finite sequence indexed `0..N-1` with no
/// gaps; `index` is presentation order, not wall-clock time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    /// Presentation index.
    pub index: u64,
    /// Particle snapshots for this time step.
    pub particles: Vec<Particle>,
}

#[cfg(test)]
#[path = "../../tests/unit/model/particle.rs"]
mod tests;
