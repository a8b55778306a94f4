use std::sync::Arc;

use kurbo::{Affine, Point, Vec2};

use crate::assets::store::TextureCache;
use crate::foundation::core::Rgba8;
use crate::foundation::error::SparkreelResult;
use crate::foundation::math::mul_div255_u8;
use crate::model::particle::{Frame, Particle};
use crate::render::FrameRenderer;
use crate::render::surface::Surface;

/// Reference [`FrameRenderer`]: tinted-sprite rasterizer.
///
/// Clears the surface to a background color, then draws every particle's
/// tinted sprite centered on the particle position: scaled to its radius,
/// rotated, modulated by its opacity and composited with its blend mode.
/// Particles whose base sprite is not loaded yet are skipped for the frame;
/// that is the cache contract, not an error.
pub struct ParticleRenderer {
    cache: Arc<TextureCache>,
    background: Rgba8,
}

impl ParticleRenderer {
    /// Build a renderer over `cache` clearing to `background` each frame.
    pub fn new(cache: Arc<TextureCache>, background: Rgba8) -> Self {
        Self { cache, background }
    }
}

impl FrameRenderer for ParticleRenderer {
    fn draw_frame(&mut self, surface: &mut Surface, frame: &Frame) -> SparkreelResult<()> {
        surface.clear(self.background);
        for particle in &frame.particles {
            let Some(sprite) = self.cache.tinted_texture(&particle.texture, particle.color)
            else {
                continue;
            };
            draw_sprite(surface, &sprite, particle);
        }
        Ok(())
    }
}

/// Inverse-mapped nearest-neighbor sprite blit.
fn draw_sprite(surface: &mut Surface, sprite: &Surface, particle: &Particle) {
    let side = particle.radius * 2.0;
    if !side.is_finite() || side <= 0.0 {
        return;
    }
    let (sw, sh) = (f64::from(sprite.width()), f64::from(sprite.height()));
    if sw == 0.0 || sh == 0.0 {
        return;
    }

    // Canonical order: translate to position, rotate, scale sprite to the
    // particle box, then center the sprite on its own midpoint.
    let transform = Affine::translate(particle.position.to_vec2())
        * Affine::rotate(particle.rotation_rad)
        * Affine::scale_non_uniform(side / sw, side / sh)
        * Affine::translate(Vec2::new(-sw / 2.0, -sh / 2.0));
    let inverse = transform.inverse();

    let (x0, y0, x1, y1) = dest_bounds(surface, transform, sw, sh);
    let opacity = (particle.opacity.clamp(0.0, 1.0) * 255.0).round() as u16;
    if opacity == 0 {
        return;
    }

    for y in y0..y1 {
        for x in x0..x1 {
            let src = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if src.x < 0.0 || src.x >= sw || src.y < 0.0 || src.y >= sh {
                continue;
            }
            let Some(texel) = sprite.pixel(src.x as u32, src.y as u32) else {
                continue;
            };
            let a = mul_div255_u8(u16::from(texel.a), opacity);
            if a == 0 {
                continue;
            }
            surface.blend_pixel(x, y, Rgba8 { a, ..texel }, particle.blend);
        }
    }
}

/// Axis-aligned destination bounds of the transformed sprite rectangle,
/// clamped to the surface.
fn dest_bounds(surface: &Surface, transform: Affine, sw: f64, sh: f64) -> (u32, u32, u32, u32) {
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(sw, 0.0),
        Point::new(0.0, sh),
        Point::new(sw, sh),
    ];
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for c in corners {
        let p = transform * c;
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let clamp_w = |v: f64| v.clamp(0.0, f64::from(surface.width())) as u32;
    let clamp_h = |v: f64| v.clamp(0.0, f64::from(surface.height())) as u32;
    (
        clamp_w(min_x.floor()),
        clamp_h(min_y.floor()),
        clamp_w(max_x.ceil()),
        clamp_h(max_y.ceil()),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/particles.rs"]
mod tests;
