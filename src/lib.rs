//! Sparkreel renders precomputed particle-simulation frames to pixels and
//! encodes them into a downloadable H.264/MP4 video.
//!
//! # Pipeline overview
//!
//! 1. **Load**: sprite assets are decoded once into a [`TextureCache`], which
//!    memoizes color-tinted variants per `(name, color)` key
//! 2. **Draw**: a [`FrameRenderer`] paints each [`Frame`]'s particles onto a
//!    reusable [`Surface`]
//! 3. **Encode**: the export pipeline submits every painted surface to a
//!    [`FrameSink`] with an exact presentation timestamp and keyframe flag
//! 4. **Deliver**: the finalized container bytes are packaged as a
//!    [`VideoArtifact`] (`video/mp4`)
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: all stochastic sampling takes an injected
//!   random source; timestamps are computed per index, never accumulated.
//! - **No hidden globals**: the texture cache is explicitly constructed and
//!   explicitly owned; encode state lives inside the sink for one export.
//! - **Straight-alpha RGBA8** end-to-end: surfaces keep the sprite alpha
//!   silhouette; alpha is flattened only at the encoder boundary.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod encode;
mod export;
mod foundation;
mod model;
mod render;

pub use assets::decode::{BaseTexture, decode_image};
pub use assets::store::{CacheStats, TextureCache};
pub use encode::ffmpeg::{FfmpegSink, is_ffmpeg_on_path};
pub use encode::sink::{FrameSink, RecordingSink, SampleTiming, SinkConfig, sample_timing};
pub use export::pipeline::{
    DEFAULT_BITRATE_BPS, ExportSettings, VideoArtifact, export_to_mp4, export_with_sink,
};
pub use foundation::core::Rgba8;
pub use foundation::error::{SparkreelError, SparkreelResult};
pub use model::color::ColorDef;
pub use model::curve::{CURVE_LUT_RESOLUTION, CurveLut, CurvePoint};
pub use model::particle::{
    BlendMode, CurveSet, Emitter, EmitterShape, Frame, PMNumber, Particle, ParticleParams,
};
pub use render::particles::ParticleRenderer;
pub use render::FrameRenderer;
pub use render::surface::Surface;
