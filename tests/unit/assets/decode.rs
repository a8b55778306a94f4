use std::io::Cursor;

use super::*;

fn png_bytes(pixels: &[[u8; 4]], width: u32, height: u32) -> Vec<u8> {
    let mut img = image::RgbaImage::new(width, height);
    for (i, px) in img.pixels_mut().enumerate() {
        *px = image::Rgba(pixels[i]);
    }
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn decode_preserves_dimensions_and_straight_alpha() {
    let bytes = png_bytes(
        &[
            [255, 255, 255, 255],
            [200, 100, 50, 128],
            [0, 0, 0, 0],
            [10, 20, 30, 64],
        ],
        2,
        2,
    );
    let tex = decode_image(&bytes).unwrap();
    assert_eq!((tex.width, tex.height), (2, 2));
    // Straight alpha: the color channels of the 50%-alpha pixel are untouched.
    assert_eq!(&tex.rgba8[4..8], &[200, 100, 50, 128]);
    assert_eq!(tex.rgba8.len(), 16);
}

#[test]
fn decode_rejects_garbage_bytes() {
    assert!(decode_image(b"definitely not an image").is_err());
}

#[test]
fn cloning_shares_pixel_storage() {
    let bytes = png_bytes(&[[1, 2, 3, 4]], 1, 1);
    let tex = decode_image(&bytes).unwrap();
    let clone = tex.clone();
    assert!(std::sync::Arc::ptr_eq(&tex.rgba8, &clone.rgba8));
}
