use crate::error::AppError;
use crate::models::classify_types::PredictionResult;
use crate::services::classifier::model_manager::OnnxModel;
use image::DynamicImage;
use ndarray::Array4;
use ort::value::Value;

const CROP_PCT: f32 = 0.875;

// ImageNet normalization constants
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

pub fn preprocess_image(img: &DynamicImage, crop_size: u32) -> Result<Array4<f32>, AppError> {
    if img.width() == 0 || img.height() == 0 {
        return Err("Cannot classify an empty image".into());
    }

    // Resize shortest edge to ceil(crop_size / crop_pct), then center crop
    let resize_size = (crop_size as f32 / CROP_PCT).ceil() as u32;
    let (w, h) = (img.width(), img.height());
    let (new_w, new_h) = if w < h {
        (resize_size, ((h as f32 / w as f32) * resize_size as f32).round() as u32)
    } else {
        (((w as f32 / h as f32) * resize_size as f32).round() as u32, resize_size)
    };
    let resized = img.resize_exact(new_w, new_h, image::imageops::FilterType::Triangle);

    let crop_x = (new_w.saturating_sub(crop_size)) / 2;
    let crop_y = (new_h.saturating_sub(crop_size)) / 2;
    let cropped = resized.crop_imm(crop_x, crop_y, crop_size, crop_size);
    let rgb = cropped.to_rgb8();

    // HWC bytes -> normalized CHW planes
    let raw = rgb.into_raw();
    let hw = (crop_size * crop_size) as usize;
    let mut data = vec![0f32; 3 * hw];
    for (i, pixel) in raw.chunks_exact(3).enumerate() {
        for c in 0..3 {
            data[c * hw + i] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    Array4::from_shape_vec((1, 3, crop_size as usize, crop_size as usize), data).map_err(|e| AppError {
        message: format!("Failed to create tensor: {}", e),
    })
}

/// Numerically stable softmax. An empty slice stays empty.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let exp_sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / exp_sum).collect()
}

/// Turn raw logits into a full distribution over the vocabulary.
pub fn predictions_from_logits(logits: &[f32], labels: &[String]) -> Result<PredictionResult, AppError> {
    if logits.len() != labels.len() {
        return Err(format!(
            "Model produced {} scores but the vocabulary has {} labels",
            logits.len(),
            labels.len()
        )
        .into());
    }
    PredictionResult::from_probabilities(labels, &softmax(logits))
        .ok_or_else(|| "Model produced no scores".into())
}

pub fn run_inference_with_model(
    model: &mut OnnxModel,
    input: Array4<f32>,
    labels: &[String],
) -> Result<PredictionResult, AppError> {
    let input_name = model.inputs()[0].name().to_string();

    let input_tensor = Value::from_array(input)
        .map_err(|e| AppError { message: format!("Failed to create tensor value: {}", e) })?;

    let outputs = model
        .run(ort::inputs![input_name.as_str() => input_tensor])
        .map_err(|e| AppError {
            message: format!("Inference failed: {}", e),
        })?;

    let output_value = outputs
        .values()
        .next()
        .ok_or_else(|| AppError {
            message: "Model produced no outputs".to_string(),
        })?;

    let (_, data) = output_value
        .try_extract_tensor::<f32>()
        .map_err(|e| AppError {
            message: format!("Failed to extract output tensor: {}", e),
        })?;

    predictions_from_logits(data, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn labels() -> Vec<String> {
        vec!["cat".into(), "dog".into(), "bird".into()]
    }

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[2.0, 1.0, 0.1]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn logits_become_prediction() {
        let result = predictions_from_logits(&[0.5, 3.0, -1.0], &labels()).unwrap();
        assert_eq!(result.label, "dog");
        assert_eq!(result.probabilities.len(), 3);
    }

    #[test]
    fn vocabulary_mismatch_is_an_error() {
        let err = predictions_from_logits(&[0.5, 3.0], &labels()).unwrap_err();
        assert!(err.message.contains("vocabulary"));
    }

    #[test]
    fn preprocess_shapes_and_normalizes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 240, Rgb([255, 0, 0])));
        let tensor = preprocess_image(&img, 224).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        let red = tensor[[0, 0, 100, 100]];
        assert!((red - (1.0 - MEAN[0]) / STD[0]).abs() < 1e-3);
        let green = tensor[[0, 1, 100, 100]];
        assert!((green - (0.0 - MEAN[1]) / STD[1]).abs() < 1e-3);
    }

    #[test]
    fn preprocess_rejects_empty_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(preprocess_image(&img, 224).is_err());
    }
}
