//! YOLO object detector running on ONNX Runtime.
//!
//! Expects an Ultralytics-style export: one `[1, 3, S, S]` float input and a
//! `[1, 4 + classes, anchors]` output (the transposed `[1, anchors, 4 + classes]`
//! layout is accepted too) holding centre/size boxes in letterboxed pixels
//! followed by per-class scores.

use crate::config::ModelConfig;
use crate::constants::model::LETTERBOX_FILL;
use crate::detection::{BoxDetection, Detector};
use crate::error::{Error, Result};
use image::{DynamicImage, Rgb, RgbImage, imageops};
use ort::session::{Session, builder::GraphOptimizationLevel};
use std::path::Path;
use tracing::{debug, info};

/// Upper bound on boxes kept after suppression.
const MAX_DETECTIONS: usize = 300;

/// Box channels preceding the class scores.
const BOX_CHANNELS: usize = 4;

/// Pre/post-processing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloSettings {
    /// Square network input size.
    pub input_size: u32,
    /// Minimum class score.
    pub min_confidence: f32,
    /// Same-class IoU above which the weaker box is dropped.
    pub iou_threshold: f32,
    /// Number of class score channels the model emits.
    pub num_classes: usize,
}

impl From<&ModelConfig> for YoloSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            input_size: config.input_size,
            min_confidence: config.min_confidence,
            iou_threshold: config.iou_threshold,
            num_classes: config.class_names.len().max(1),
        }
    }
}

/// How the original image was placed on the network canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Resize factor applied to the original image.
    pub scale: f32,
    /// Horizontal padding in canvas pixels.
    pub pad_x: f32,
    /// Vertical padding in canvas pixels.
    pub pad_y: f32,
    /// Original image width.
    pub width: u32,
    /// Original image height.
    pub height: u32,
}

impl Letterbox {
    /// Map a canvas-space centre/size box back onto the original image.
    fn unmap(&self, cx: f32, cy: f32, w: f32, h: f32) -> [f32; 4] {
        #[allow(clippy::cast_precision_loss)]
        let (max_x, max_y) = (self.width as f32, self.height as f32);
        let x1 = ((cx - w / 2.0 - self.pad_x) / self.scale).clamp(0.0, max_x);
        let y1 = ((cy - h / 2.0 - self.pad_y) / self.scale).clamp(0.0, max_y);
        let x2 = ((cx + w / 2.0 - self.pad_x) / self.scale).clamp(0.0, max_x);
        let y2 = ((cy + h / 2.0 - self.pad_y) / self.scale).clamp(0.0, max_y);
        [x1, y1, x2, y2]
    }
}

/// Detector backed by an ONNX Runtime session.
pub struct YoloDetector {
    session: Session,
    settings: YoloSettings,
}

impl YoloDetector {
    /// Load model weights. A missing file is a startup error.
    pub fn load(model_path: &Path, settings: YoloSettings) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::ModelFileNotFound {
                path: model_path.to_path_buf(),
            });
        }

        info!("Loading model: {}", model_path.display());

        let session = Session::builder()
            .map_err(build_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(build_error)?
            .commit_from_file(model_path)
            .map_err(build_error)?;

        info!(
            "Model ready: input {}x{}, min_confidence {:.2}, iou {:.2}",
            settings.input_size, settings.input_size, settings.min_confidence, settings.iou_threshold
        );

        Ok(Self { session, settings })
    }
}

impl Detector for YoloDetector {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<BoxDetection>> {
        let settings = self.settings;
        let (input, letterbox) = letterbox(image, settings.input_size);
        let side = settings.input_size as usize;
        let shape = [1, 3, side, side];

        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.into_boxed_slice()))
                .map_err(inference_error)?;

        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(inference_error)?;

        let (output_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(inference_error)?;
        let dims: Vec<usize> = output_shape
            .iter()
            .map(|&d| usize::try_from(d).unwrap_or(0))
            .collect();
        debug!("Model output shape: {:?}", dims);

        decode_predictions(data, &dims, &letterbox, &settings)
    }
}

fn build_error(e: impl std::fmt::Display) -> Error {
    Error::DetectorBuild {
        reason: e.to_string(),
    }
}

fn inference_error(e: impl std::fmt::Display) -> Error {
    Error::Inference {
        reason: e.to_string(),
    }
}

/// Resize with preserved aspect ratio onto a grey square canvas and convert
/// to a normalised NCHW float buffer.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn letterbox(image: &DynamicImage, size: u32) -> (Vec<f32>, Letterbox) {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let scale = (size as f32 / width.max(1) as f32).min(size as f32 / height.max(1) as f32);
    let scaled_w = ((width as f32 * scale).round() as u32).clamp(1, size);
    let scaled_h = ((height as f32 * scale).round() as u32).clamp(1, size);
    let pad_x = (size - scaled_w) / 2;
    let pad_y = (size - scaled_h) / 2;

    let resized = imageops::resize(&rgb, scaled_w, scaled_h, imageops::FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([LETTERBOX_FILL; 3]));
    imageops::overlay(&mut canvas, &resized, i64::from(pad_x), i64::from(pad_y));

    let plane = size as usize * size as usize;
    let mut input = vec![0.0f32; 3 * plane];
    for (i, pixel) in canvas.pixels().enumerate() {
        for c in 0..3 {
            input[c * plane + i] = f32::from(pixel[c]) / 255.0;
        }
    }

    (
        input,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            width,
            height,
        },
    )
}

/// Turn raw model output into boxes on the original image.
///
/// Candidates below the confidence threshold are dropped, the rest go
/// through class-aware non-maximum suppression. Output is sorted by
/// descending confidence.
pub fn decode_predictions(
    output: &[f32],
    dims: &[usize],
    letterbox: &Letterbox,
    settings: &YoloSettings,
) -> Result<Vec<BoxDetection>> {
    let [batch, a, b] = dims else {
        return Err(Error::Inference {
            reason: format!("expected a 3-D output tensor, got shape {dims:?}"),
        });
    };
    let (batch, a, b) = (*batch, *a, *b);

    // The channel axis holds the box plus one score per class.
    let expected = BOX_CHANNELS + settings.num_classes;
    let channels_first = if a == expected {
        true
    } else if b == expected {
        false
    } else {
        return Err(Error::Inference {
            reason: format!(
                "output shape {dims:?} has no axis of {expected} channels for {} classes",
                settings.num_classes
            ),
        });
    };
    let (channels, anchors) = if channels_first { (a, b) } else { (b, a) };

    if batch != 1 || output.len() < channels * anchors {
        return Err(Error::Inference {
            reason: format!(
                "unexpected output shape {dims:?} for {} values",
                output.len()
            ),
        });
    }

    let at = |channel: usize, anchor: usize| {
        if channels_first {
            output[channel * anchors + anchor]
        } else {
            output[anchor * channels + channel]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, confidence) = (BOX_CHANNELS..channels)
            .map(|c| (c - BOX_CHANNELS, at(c, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, current| {
                if current.1 > best.1 { current } else { best }
            });

        if confidence < settings.min_confidence {
            continue;
        }

        let bbox = letterbox.unmap(at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
        candidates.push(BoxDetection {
            confidence,
            class_id,
            bbox,
        });
    }

    debug!(
        "{} candidate boxes above {:.2}",
        candidates.len(),
        settings.min_confidence
    );

    Ok(non_max_suppression(candidates, settings.iou_threshold))
}

/// Greedy per-class suppression, strongest first.
pub fn non_max_suppression(mut candidates: Vec<BoxDetection>, iou_threshold: f32) -> Vec<BoxDetection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<BoxDetection> = Vec::new();
    for candidate in candidates {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && iou(&k.bbox, &candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
            if kept.len() == MAX_DETECTIONS {
                break;
            }
        }
    }
    kept
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes.
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = ix * iy;
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;
    if union <= 0.0 { 0.0 } else { intersection / union }
}
