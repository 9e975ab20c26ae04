//! Pairs returned scores with the images they were computed for.

use crate::error::BindError;
use crate::source::ImageItem;
use serde::Serialize;

/// Scores above this are reported as positive.
pub const POSITIVE_THRESHOLD: f64 = 0.5;

/// A batch image paired with the score the service returned for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultItem {
    pub image: ImageItem,
    pub score: f64,
    pub is_positive: bool,
    /// Confidence in the reported class, in percent with one decimal.
    pub confidence_percent: f64,
}

impl ResultItem {
    fn from_score(image: ImageItem, score: f64) -> Self {
        let is_positive = score > POSITIVE_THRESHOLD;
        let confidence = if is_positive { score } else { 1.0 - score };
        Self {
            image,
            score,
            is_positive,
            confidence_percent: round_one_decimal(confidence * 100.0),
        }
    }

    pub fn label(&self) -> &'static str {
        if self.is_positive { "Tumor" } else { "No tumor" }
    }

    pub fn confidence_text(&self) -> String {
        format!("{:.1}%", self.confidence_percent)
    }
}

/// Pair `images[i]` with `scores[i]`.
pub fn bind(images: &[ImageItem], scores: &[f64]) -> Result<Vec<ResultItem>, BindError> {
    if images.len() != scores.len() {
        return Err(BindError {
            images: images.len(),
            scores: scores.len(),
        });
    }
    Ok(images
        .iter()
        .zip(scores)
        .map(|(image, &score)| ResultItem::from_score(image.clone(), score))
        .collect())
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
