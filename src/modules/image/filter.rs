use std::io::Cursor;

use image::{
    imageops::{self, FilterType},
    DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage,
};

use crate::api::error::SystemError;

const THUMBNAIL_SIZE: u32 = 100;
const BLUR_SIGMA: f32 = 2.0;
const SEPIA_TINT: [u8; 3] = [255, 240, 192];
const BRIGHTNESS_FACTOR: f32 = 1.5;
const RESIZE_TO: (u32, u32) = (800, 600);
const CROP_BOX: (u32, u32, u32, u32) = (100, 100, 400, 400);

type Transform = fn(DynamicImage) -> DynamicImage;

/// A named image transformation. Names outside the table resolve to `Unknown`, which
/// leaves the image untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Grayscale,
    Blur,
    Thumbnail,
    Sepia,
    Invert,
    Brightness,
    Rotate,
    Resize,
    Flip,
    Crop,
    Unknown,
}

const FILTERS: &[(&str, Filter)] = &[
    ("grayscale", Filter::Grayscale),
    ("blur", Filter::Blur),
    ("thumbnail", Filter::Thumbnail),
    ("sepia", Filter::Sepia),
    ("invert", Filter::Invert),
    ("brightness", Filter::Brightness),
    ("rotate", Filter::Rotate),
    ("resize", Filter::Resize),
    ("flip", Filter::Flip),
    ("crop", Filter::Crop),
];

impl Filter {
    pub fn from_name(name: &str) -> Self {
        FILTERS.iter().find(|(known, _)| *known == name).map(|(_, f)| *f).unwrap_or(Filter::Unknown)
    }

    fn transform(self) -> Option<Transform> {
        let transform: Transform = match self {
            Filter::Grayscale => grayscale,
            Filter::Blur => blur,
            Filter::Thumbnail => thumbnail,
            Filter::Sepia => sepia,
            Filter::Invert => invert,
            Filter::Brightness => brightness,
            Filter::Rotate => rotate,
            Filter::Resize => resize,
            Filter::Flip => flip,
            Filter::Crop => crop,
            Filter::Unknown => return None,
        };
        Some(transform)
    }
}

/// Applies `filter_name` to encoded image bytes and re-encodes the result in the input's
/// format. Unknown filters return the input unchanged.
pub fn apply(input: &[u8], filter_name: &str) -> Result<Vec<u8>, SystemError> {
    let Some(transform) = Filter::from_name(filter_name).transform() else {
        return Ok(input.to_vec());
    };

    let format = image::guess_format(input).map_err(processing_error)?;
    let decoded = image::load_from_memory_with_format(input, format).map_err(processing_error)?;
    let output = transform(decoded);

    let mut buf = Vec::new();
    output.write_to(&mut Cursor::new(&mut buf), format).map_err(processing_error)?;
    Ok(buf)
}

fn processing_error(err: image::ImageError) -> SystemError {
    SystemError::processing(format!("Error processing image: {err}"))
}

fn grayscale(img: DynamicImage) -> DynamicImage {
    DynamicImage::ImageLuma8(img.to_luma8())
}

fn blur(img: DynamicImage) -> DynamicImage {
    img.blur(BLUR_SIGMA)
}

// never upscales
fn thumbnail(img: DynamicImage) -> DynamicImage {
    if img.width() <= THUMBNAIL_SIZE && img.height() <= THUMBNAIL_SIZE {
        return img;
    }
    img.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE)
}

fn sepia(img: DynamicImage) -> DynamicImage {
    let gray = img.to_luma8();
    let tinted = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let l = gray.get_pixel(x, y)[0] as u16;
        Rgb(SEPIA_TINT.map(|t| ((l + t as u16) / 2) as u8))
    });
    DynamicImage::ImageRgb8(tinted)
}

fn invert(mut img: DynamicImage) -> DynamicImage {
    img.invert();
    img
}

fn brightness(img: DynamicImage) -> DynamicImage {
    let scale = |c: &mut u8| *c = (*c as f32 * BRIGHTNESS_FACTOR).round().min(255.0) as u8;

    if img.color().has_alpha() {
        let mut buf = img.to_rgba8();
        for pixel in buf.pixels_mut() {
            pixel.0[..3].iter_mut().for_each(scale);
        }
        DynamicImage::ImageRgba8(buf)
    } else {
        let mut buf = img.to_rgb8();
        for pixel in buf.pixels_mut() {
            pixel.0.iter_mut().for_each(scale);
        }
        DynamicImage::ImageRgb8(buf)
    }
}

/// Places `img` on a blank canvas of the given size with its top-left corner at `(x, y)`.
/// Anything outside the canvas is dropped, uncovered canvas stays zeroed.
fn on_canvas(img: &DynamicImage, width: u32, height: u32, x: i64, y: i64) -> DynamicImage {
    let mut canvas = DynamicImage::new(width, height, img.color());
    imageops::replace(&mut canvas, img, x, y);
    canvas
}

// 90 degrees counter-clockwise around the center, keeping the original canvas size
fn rotate(img: DynamicImage) -> DynamicImage {
    let (width, height) = img.dimensions();
    let rotated = img.rotate270();
    let x = (width as i64 - height as i64) / 2;
    let y = (height as i64 - width as i64) / 2;
    on_canvas(&rotated, width, height, x, y)
}

fn resize(img: DynamicImage) -> DynamicImage {
    img.resize_exact(RESIZE_TO.0, RESIZE_TO.1, FilterType::CatmullRom)
}

fn flip(img: DynamicImage) -> DynamicImage {
    img.fliph()
}

// always the full box size, area past the image edge is zero-filled
fn crop(img: DynamicImage) -> DynamicImage {
    let (left, top, right, bottom) = CROP_BOX;
    on_canvas(&img, right - left, bottom - top, -(left as i64), -(top as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{jpeg_bytes, png_bytes, solid_png};

    fn decode(bytes: &[u8]) -> DynamicImage {
        image::load_from_memory(bytes).unwrap()
    }

    #[test]
    fn test_lookup_table() {
        assert_eq!(Filter::from_name("grayscale"), Filter::Grayscale);
        assert_eq!(Filter::from_name("sepia"), Filter::Sepia);
        assert_eq!(Filter::from_name("foo"), Filter::Unknown);
        assert_eq!(Filter::from_name("Grayscale"), Filter::Unknown);
        assert!(Filter::Unknown.transform().is_none());
    }

    #[test]
    fn test_grayscale_single_channel() {
        let output = apply(&png_bytes(16, 8), "grayscale").unwrap();
        let img = decode(&output);
        assert_eq!(img.color(), image::ColorType::L8);
        for pixel in img.to_rgb8().pixels() {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
        }
    }

    #[test]
    fn test_unknown_filter_passes_bytes_through() {
        let input = png_bytes(16, 8);
        assert_eq!(apply(&input, "foo").unwrap(), input);
    }

    #[test]
    fn test_unknown_filter_ignores_content() {
        assert_eq!(apply(b"not an image", "foo").unwrap(), b"not an image");
    }

    #[test]
    fn test_thumbnail_preserves_aspect_ratio() {
        let img = decode(&apply(&png_bytes(300, 150), "thumbnail").unwrap());
        assert_eq!(img.dimensions(), (100, 50));
    }

    #[test]
    fn test_thumbnail_does_not_upscale() {
        let img = decode(&apply(&png_bytes(40, 20), "thumbnail").unwrap());
        assert_eq!(img.dimensions(), (40, 20));
    }

    #[test]
    fn test_invert() {
        let img = decode(&apply(&solid_png([10, 20, 200]), "invert").unwrap());
        assert_eq!(img.to_rgb8().get_pixel(0, 0).0, [245, 235, 55]);
    }

    #[test]
    fn test_sepia_blends_tint() {
        let img = decode(&apply(&solid_png([0, 0, 0]), "sepia").unwrap());
        assert_eq!(img.color(), image::ColorType::Rgb8);
        assert_eq!(img.to_rgb8().get_pixel(0, 0).0, [127, 120, 96]);
    }

    #[test]
    fn test_brightness_scales_and_clamps() {
        let img = decode(&apply(&solid_png([100, 200, 0]), "brightness").unwrap());
        assert_eq!(img.to_rgb8().get_pixel(0, 0).0, [150, 255, 0]);
    }

    #[test]
    fn test_blur_keeps_dimensions() {
        let img = decode(&apply(&png_bytes(32, 24), "blur").unwrap());
        assert_eq!(img.dimensions(), (32, 24));
    }

    #[test]
    fn test_geometry_filters() {
        assert_eq!(decode(&apply(&png_bytes(30, 20), "rotate").unwrap()).dimensions(), (30, 20));
        assert_eq!(decode(&apply(&png_bytes(30, 20), "resize").unwrap()).dimensions(), (800, 600));
        assert_eq!(decode(&apply(&png_bytes(500, 450), "crop").unwrap()).dimensions(), (300, 300));

        let flipped = decode(&apply(&png_bytes(30, 20), "flip").unwrap()).to_rgb8();
        let original = decode(&png_bytes(30, 20)).to_rgb8();
        assert_eq!(flipped.get_pixel(0, 0), original.get_pixel(29, 0));
    }

    #[test]
    fn test_rotate_square_turns_counter_clockwise() {
        let original = decode(&png_bytes(20, 20)).to_rgb8();
        let rotated = decode(&apply(&png_bytes(20, 20), "rotate").unwrap()).to_rgb8();
        assert_eq!(rotated.dimensions(), (20, 20));
        assert_eq!(rotated.get_pixel(0, 0), original.get_pixel(19, 0));
        assert_eq!(rotated.get_pixel(0, 19), original.get_pixel(0, 0));
    }

    #[test]
    fn test_crop_small_image_is_padded() {
        let img = decode(&apply(&png_bytes(50, 50), "crop").unwrap());
        assert_eq!(img.dimensions(), (300, 300));
        assert!(img.to_rgb8().pixels().all(|p| p.0 == [0, 0, 0]));

        let img = decode(&apply(&jpeg_bytes(50, 50), "crop").unwrap());
        assert_eq!(img.dimensions(), (300, 300));
    }

    #[test]
    fn test_crop_partial_overlap_keeps_pixels() {
        let original = decode(&png_bytes(200, 200)).to_rgb8();
        let cropped = decode(&apply(&png_bytes(200, 200), "crop").unwrap()).to_rgb8();
        assert_eq!(cropped.dimensions(), (300, 300));
        assert_eq!(cropped.get_pixel(0, 0), original.get_pixel(100, 100));
        assert_eq!(cropped.get_pixel(99, 99), original.get_pixel(199, 199));
        assert_eq!(cropped.get_pixel(150, 150).0, [0, 0, 0]);
    }

    #[test]
    fn test_jpeg_stays_jpeg() {
        let output = apply(&jpeg_bytes(24, 24), "grayscale").unwrap();
        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_corrupt_input_is_processing_error() {
        let result = apply(b"\x89PNG\r\n\x1a\ngarbage", "grayscale");
        assert!(matches!(result, Err(SystemError::Processing(_))));
    }
}
