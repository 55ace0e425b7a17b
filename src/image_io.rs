use image::DynamicImage;
use image::GenericImageView;
use webp::Encoder as WebpEncoder;

pub const PREVIEW_WEBP_QUALITY: f32 = 30.0;
pub const PREVIEW_MAX_DIM: u32 = 256;

/// Render a small webp preview thumbnail for the upload grid.
///
/// # Errors
///
/// Returns Err if the image encoding fails
pub fn to_preview_webp(img: &DynamicImage) -> std::io::Result<Vec<u8>> {
    let (w, h) = img.dimensions();
    let preview = if w <= PREVIEW_MAX_DIM && h <= PREVIEW_MAX_DIM {
        img.clone()
    } else {
        img.resize(
            PREVIEW_MAX_DIM,
            PREVIEW_MAX_DIM,
            image::imageops::FilterType::Triangle,
        )
    };
    let mem = WebpEncoder::from_image(&preview)
        .map_err(err_other)?
        .encode(PREVIEW_WEBP_QUALITY);
    Ok(mem.to_vec())
}

fn err_other<E: std::fmt::Display>(e: E) -> std::io::Error {
    std::io::Error::other(e.to_string())
}
