//! Request handlers

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use engagement_core::{
    classify_bytes, Classifier, ImagePreprocessingError, Prediction, CLASS_NAMES, IMAGE_SIZE,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::{ApiError, Result};
use super::state::ServiceState;

const SERVICE_NAME: &str = "Student Engagement Classification API";
const MODEL_NAME: &str = "Student Engagement Classifier";
const MODEL_DESCRIPTION: &str = "CNN model for classifying student engagement in video classes";

/// Standard alphabet; padding may be present or omitted.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub model_loaded: bool,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub model_name: &'static str,
    pub input_shape: [usize; 3],
    pub output_classes: usize,
    pub class_names: [&'static str; 6],
    pub image_size: [u32; 2],
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    #[serde(flatten)]
    pub prediction: Prediction,
}

/// One entry of a batch response, tagged with its position in the request.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchItem {
    Classified {
        image_index: usize,
        #[serde(flatten)]
        prediction: Prediction,
    },
    Failed {
        image_index: usize,
        error: String,
    },
}

impl BatchItem {
    const fn is_success(&self) -> bool {
        matches!(self, Self::Classified { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub results: Vec<BatchItem>,
    pub total_images: usize,
    pub successful_predictions: usize,
}

// ============================================================================
// Service metadata
// ============================================================================

pub async fn health_check(State(state): State<Arc<ServiceState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        model_loaded: state.model_loaded(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn model_info(State(state): State<Arc<ServiceState>>) -> Result<Json<ModelInfoResponse>> {
    let classifier = state.classifier()?;

    Ok(Json(ModelInfoResponse {
        model_name: MODEL_NAME,
        input_shape: classifier.input_shape(),
        output_classes: CLASS_NAMES.len(),
        class_names: CLASS_NAMES,
        image_size: [IMAGE_SIZE, IMAGE_SIZE],
        description: MODEL_DESCRIPTION,
    }))
}

// ============================================================================
// Inference
// ============================================================================

pub async fn predict(
    State(state): State<Arc<ServiceState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>> {
    let classifier = state.classifier()?;
    let Json(body) = body?;

    let field = body
        .get("image")
        .ok_or_else(|| ApiError::validation("No image data provided"))?;
    let bytes = decode_image_field(field)?;

    let prediction = tokio::task::spawn_blocking(move || classify_bytes(classifier.as_ref(), &bytes))
        .await
        .map_err(|e| ApiError::Inference(e.into()))??;

    info!(
        class = %prediction.predicted_class,
        confidence = prediction.confidence,
        score = prediction.engagement_score,
        "Prediction served"
    );

    Ok(Json(PredictResponse {
        success: true,
        prediction,
    }))
}

pub async fn predict_batch(
    State(state): State<Arc<ServiceState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<BatchResponse>> {
    let classifier = state.classifier()?;
    let Json(mut body) = body?;

    let images = match body.get_mut("images") {
        None => return Err(ApiError::validation("No images data provided")),
        Some(Value::Array(items)) => std::mem::take(items),
        Some(_) => return Err(ApiError::validation("Images must be provided as a list")),
    };
    let total_images = images.len();
    debug!(total_images, "Batch received");

    // Items run strictly in order; one failure, panics included, never aborts the rest
    let results = tokio::task::spawn_blocking(move || {
        images
            .iter()
            .enumerate()
            .map(|(image_index, field)| classify_item(classifier.as_ref(), image_index, field))
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| ApiError::Batch(e.to_string()))?;

    let successful_predictions = results.iter().filter(|r| r.is_success()).count();
    info!(
        total_images,
        successful_predictions, "Batch prediction served"
    );

    Ok(Json(BatchResponse {
        success: true,
        results,
        total_images,
        successful_predictions,
    }))
}

fn classify_item(classifier: &dyn Classifier, image_index: usize, field: &Value) -> BatchItem {
    let outcome =
        decode_image_field(field).and_then(|bytes| classify_isolated(classifier, &bytes));

    match outcome {
        Ok(prediction) => BatchItem::Classified {
            image_index,
            prediction,
        },
        Err(e) => {
            match &e {
                ApiError::Inference(cause) => {
                    warn!(image_index, detail = %format_args!("{cause:#}"), "Batch item failed");
                }
                other => debug!(image_index, error = %other, "Batch item rejected"),
            }
            BatchItem::Failed {
                image_index,
                error: e.to_string(),
            }
        }
    }
}

/// Classifies one batch item, turning a classifier panic into an inference
/// error so the remaining items still run.
fn classify_isolated(classifier: &dyn Classifier, bytes: &[u8]) -> Result<Prediction> {
    panic::catch_unwind(AssertUnwindSafe(|| classify_bytes(classifier, bytes)))
        .map_err(|payload| {
            ApiError::Inference(anyhow::anyhow!(
                "classifier panicked: {}",
                panic_message(payload.as_ref())
            ))
        })?
        .map_err(ApiError::from)
}

pub(super) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Extracts image bytes from a JSON `image` value.
///
/// Accepts plain base64 or a `data:<mime>;base64,` URL. ASCII whitespace
/// (line-wrapped encoders) is ignored.
///
/// # Errors
///
/// Returns a validation error if the value is not a string and a
/// preprocessing error if it is not valid base64.
pub fn decode_image_field(field: &Value) -> Result<Vec<u8>> {
    let text = field
        .as_str()
        .ok_or_else(|| ApiError::validation("Image must be a base64 string"))?;

    let payload = match text.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => text,
    };
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| ImagePreprocessingError::encoding(e).into())
}
