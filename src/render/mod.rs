pub(crate) mod particles;
pub(crate) mod surface;

use crate::foundation::error::SparkreelResult;
use crate::model::particle::Frame;
use crate::render::surface::Surface;

/// Contract for painting one frame's particles onto a surface.
///
/// Implemented by the embedding application; [`crate::ParticleRenderer`] is
/// the reference implementation. Closures of the matching shape implement it
/// automatically.
pub trait FrameRenderer {
    /// Paint `frame` onto `surface`, overwriting its previous contents.
    ///
    /// A failure here aborts an in-progress export.
    fn draw_frame(&mut self, surface: &mut Surface, frame: &Frame) -> SparkreelResult<()>;
}

impl<F> FrameRenderer for F
where
    F: FnMut(&mut Surface, &Frame) -> SparkreelResult<()>,
{
    fn draw_frame(&mut self, surface: &mut Surface, frame: &Frame) -> SparkreelResult<()> {
        self(surface, frame)
    }
}
