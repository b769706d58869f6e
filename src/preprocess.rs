use image::imageops::FilterType;
use tract_onnx::prelude::tract_ndarray::Array4;

use crate::error::PredictError;

pub const IMAGE_SIZE: usize = 224;
pub const CHANNELS: usize = 3;

/// Turns raw image bytes into the NHWC tensor the model was trained on:
/// bilinear resize to 224x224, batch dimension of 1, pixels scaled to [0,1].
pub fn preprocess(image_bytes: &[u8]) -> Result<Array4<f32>, PredictError> {
    let decoded = image::load_from_memory(image_bytes)?;
    let resized = decoded.resize_exact(IMAGE_SIZE as u32, IMAGE_SIZE as u32, FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let tensor = Array4::from_shape_fn((1, IMAGE_SIZE, IMAGE_SIZE, CHANNELS), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    });
    Ok(tensor)
}
