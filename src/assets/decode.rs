use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::SparkreelResult;

/// Decoded base sprite in straight-alpha RGBA8 form.
///
/// Cloning is cheap; the pixel data is shared.
#[derive(Clone, Debug)]
pub struct BaseTexture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major straight-alpha RGBA8.
    pub rgba8: Arc<Vec<u8>>,
}

/// Decode encoded image bytes into a [`BaseTexture`].
///
/// Pixels stay straight-alpha: the tint rule replaces color channels
/// wholesale and keeps the source alpha, so premultiplying here would lose
/// information for nothing.
pub fn decode_image(bytes: &[u8]) -> SparkreelResult<BaseTexture> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(BaseTexture {
        width,
        height,
        rgba8: Arc::new(rgba.into_raw()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
