//! Image analysis: the classification service contract and the advice
//! shown for a prediction.

pub mod contract;

use serde::Serialize;

pub use contract::{
    AnalysisKind, Classifier, ClassificationRequest, ClassificationResponse, RecordedClassifier,
};

use crate::core::errors::Result;

/// Advice text for a prediction. Thresholds are strict lower bounds.
#[must_use]
pub fn recommendation(kind: AnalysisKind, confidence: f64) -> &'static str {
    match kind {
        AnalysisKind::Retinopathy => {
            if confidence > 0.7 {
                "High likelihood detected. Consult an ophthalmologist immediately."
            } else if confidence > 0.5 {
                "Moderate signs detected. Schedule an eye exam soon."
            } else if confidence > 0.3 {
                "Mild signs detected. Monitor and maintain regular checkups."
            } else {
                "No significant signs detected. Continue regular monitoring."
            }
        }
        AnalysisKind::PinkEye => {
            if confidence > 0.7 {
                "Conjunctivitis detected. Consider seeing an eye care professional."
            } else {
                "No conjunctivitis detected. If symptoms persist, consult a professional."
            }
        }
    }
}

/// A validated prediction together with its advice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Which model produced the prediction.
    pub kind: AnalysisKind,
    /// Predicted class name.
    pub prediction: String,
    /// Probability of the predicted class, in `[0, 1]`.
    pub confidence: f64,
    /// Advice for this confidence band.
    pub recommendation: &'static str,
}

impl AnalysisReport {
    /// Validate `response` against `kind` and attach the matching advice.
    pub fn from_response(kind: AnalysisKind, response: &ClassificationResponse) -> Result<Self> {
        response.validate(kind)?;
        Ok(Self {
            kind,
            prediction: response.prediction.clone(),
            confidence: response.confidence,
            recommendation: recommendation(kind, response.confidence),
        })
    }

    /// Confidence as a whole percentage for display.
    #[must_use]
    pub fn confidence_pct(&self) -> f64 {
        (self.confidence * 1000.0).round() / 10.0
    }
}

/// Classify one image and attach advice.
pub fn analyze(
    classifier: &impl Classifier,
    kind: AnalysisKind,
    request: &ClassificationRequest,
) -> Result<AnalysisReport> {
    let response = classifier.classify(kind, request)?;
    AnalysisReport::from_response(kind, &response)
}
