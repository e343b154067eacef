//! Resolution scaling of decoded images

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Result of applying a resolution scale
#[derive(Debug)]
pub enum Resized {
    /// Scale was exactly 1.0; the input is handed back as-is
    Unchanged(RgbImage),

    /// The image was resampled
    Resized {
        image: RgbImage,
        from: (u32, u32),
        to: (u32, u32),
    },

    /// The computed dimensions were unusable, so the original is kept
    Skipped {
        image: RgbImage,
        computed: (i64, i64),
    },
}

impl Resized {
    /// The image to continue the pipeline with
    pub fn into_image(self) -> RgbImage {
        match self {
            Resized::Unchanged(image) => image,
            Resized::Resized { image, .. } => image,
            Resized::Skipped { image, .. } => image,
        }
    }
}

/// Target dimension for one axis: `floor(dim * scale)`
pub fn scaled_dimension(dim: u32, scale: f64) -> i64 {
    (f64::from(dim) * scale).floor() as i64
}

/// Scale `image` by `scale` using Lanczos3 resampling
pub fn resize(image: RgbImage, scale: f64) -> Resized {
    if scale == 1.0 {
        return Resized::Unchanged(image);
    }

    let from = image.dimensions();
    let computed = (scaled_dimension(from.0, scale), scaled_dimension(from.1, scale));

    match (u32::try_from(computed.0), u32::try_from(computed.1)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => {
            let resized = imageops::resize(&image, w, h, FilterType::Lanczos3);
            Resized::Resized {
                image: resized,
                from,
                to: (w, h),
            }
        }
        _ => Resized::Skipped { image, computed },
    }
}
