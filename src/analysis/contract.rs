//! Request/response types of the image classification service.
//!
//! Only the wire contract lives here. Transport is left to whoever
//! implements [`Classifier`].

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SuiteError};

/// Binary classifiers offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    Retinopathy,
    PinkEye,
}

impl AnalysisKind {
    pub const ALL: [Self; 2] = [Self::Retinopathy, Self::PinkEye];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Retinopathy => "retinopathy",
            Self::PinkEye => "pink-eye",
        }
    }

    /// Path of the prediction endpoint, relative to the service root.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Retinopathy => "/api/predict/retinopathy",
            Self::PinkEye => "/api/predict/pinkeye",
        }
    }

    /// Full prediction URL under `service_url`.
    #[must_use]
    pub fn url(self, service_url: &str) -> String {
        format!("{}{}", service_url.trim_end_matches('/'), self.endpoint())
    }

    /// Class names indexed by `class_index`. Index 1 is the positive finding.
    #[must_use]
    pub const fn class_names(self) -> [&'static str; 2] {
        match self {
            Self::Retinopathy => ["No Diabetic Retinopathy", "Diabetic Retinopathy Detected"],
            Self::PinkEye => ["Normal", "Conjunctivitis Detected"],
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AnalysisKind {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "retinopathy" => Ok(Self::Retinopathy),
            "pink-eye" | "pinkeye" => Ok(Self::PinkEye),
            other => Err(SuiteError::NotFound {
                kind: "analysis kind",
                id: other.to_string(),
            }),
        }
    }
}

/// Body of a prediction request: one image as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub image: String,
}

impl ClassificationRequest {
    /// Accepts `data:image/<type>;base64,<payload>` with a non-empty payload.
    pub fn new(image: impl Into<String>) -> Result<Self> {
        let image = image.into();
        let payload = image
            .strip_prefix("data:image/")
            .and_then(|rest| rest.split_once(','))
            .map(|(_, payload)| payload);
        match payload {
            Some(p) if !p.is_empty() => Ok(Self { image }),
            _ => Err(SuiteError::Serialization {
                context: "classification request",
                details: "image must be a data:image/... URL with a payload".to_string(),
            }),
        }
    }
}

/// Prediction returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub prediction: String,
    /// Probability of the predicted class, in `[0, 1]`.
    pub confidence: f64,
    pub class_index: usize,
    pub all_probabilities: BTreeMap<String, f64>,
}

impl ClassificationResponse {
    /// Build a response from the probability of the positive class.
    ///
    /// Ties go to the negative class.
    #[must_use]
    pub fn from_positive_probability(kind: AnalysisKind, probability: f64) -> Self {
        let names = kind.class_names();
        let class_index = usize::from(probability > 0.5);
        let confidence = if class_index == 1 {
            probability
        } else {
            1.0 - probability
        };
        Self {
            prediction: names[class_index].to_string(),
            confidence,
            class_index,
            all_probabilities: BTreeMap::from([
                (names[0].to_string(), 1.0 - probability),
                (names[1].to_string(), probability),
            ]),
        }
    }

    /// Parse and validate a JSON response body.
    pub fn from_json(kind: AnalysisKind, body: &str) -> Result<Self> {
        let response: Self = serde_json::from_str(body)?;
        response.validate(kind)?;
        Ok(response)
    }

    /// Check the response is consistent with `kind`'s class list.
    pub fn validate(&self, kind: AnalysisKind) -> Result<()> {
        let names = kind.class_names();
        let Some(expected) = names.get(self.class_index) else {
            return Err(invalid(format!(
                "class_index {} outside 0..{}",
                self.class_index,
                names.len()
            )));
        };
        if self.prediction != *expected {
            return Err(invalid(format!(
                "prediction {:?} does not name class {}",
                self.prediction, self.class_index
            )));
        }
        if !is_probability(self.confidence) {
            return Err(invalid(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if let Some((name, p)) = self
            .all_probabilities
            .iter()
            .find(|(_, p)| !is_probability(**p))
        {
            return Err(invalid(format!("probability of {name:?} is {p}")));
        }
        Ok(())
    }
}

fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

fn invalid(details: String) -> SuiteError {
    SuiteError::Serialization {
        context: "classification response",
        details,
    }
}

/// Anything that can answer a classification request.
pub trait Classifier {
    fn classify(
        &self,
        kind: AnalysisKind,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResponse>;
}

/// Replays one stored response for every request; used offline and in tests.
#[derive(Debug, Clone)]
pub struct RecordedClassifier {
    response: ClassificationResponse,
}

impl RecordedClassifier {
    #[must_use]
    pub const fn new(response: ClassificationResponse) -> Self {
        Self { response }
    }
}

impl Classifier for RecordedClassifier {
    fn classify(
        &self,
        kind: AnalysisKind,
        _request: &ClassificationRequest,
    ) -> Result<ClassificationResponse> {
        self.response.validate(kind)?;
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_without_double_slash() {
        assert_eq!(
            AnalysisKind::Retinopathy.url("http://localhost:5005/"),
            "http://localhost:5005/api/predict/retinopathy"
        );
        assert_eq!(
            AnalysisKind::PinkEye.url("http://localhost:5005"),
            "http://localhost:5005/api/predict/pinkeye"
        );
    }

    #[test]
    fn kind_parses_both_spellings() {
        assert_eq!("pink-eye".parse::<AnalysisKind>().unwrap(), AnalysisKind::PinkEye);
        assert_eq!("pinkeye".parse::<AnalysisKind>().unwrap(), AnalysisKind::PinkEye);
        assert_eq!("glaucoma".parse::<AnalysisKind>().unwrap_err().code(), "EVS-2001");
    }

    #[test]
    fn request_requires_image_data_url() {
        assert!(ClassificationRequest::new("data:image/png;base64,iVBORw0KGgo=").is_ok());
        assert!(ClassificationRequest::new("data:image/png;base64,").is_err());
        assert!(ClassificationRequest::new("https://example.com/eye.png").is_err());
    }

    #[test]
    fn positive_probability_builds_consistent_response() {
        let r = ClassificationResponse::from_positive_probability(AnalysisKind::Retinopathy, 0.8);
        assert_eq!(r.class_index, 1);
        assert_eq!(r.prediction, "Diabetic Retinopathy Detected");
        assert!((r.confidence - 0.8).abs() < 1e-9);
        r.validate(AnalysisKind::Retinopathy).unwrap();

        let tie = ClassificationResponse::from_positive_probability(AnalysisKind::PinkEye, 0.5);
        assert_eq!(tie.class_index, 0);
        assert_eq!(tie.prediction, "Normal");
    }

    #[test]
    fn parses_service_body() {
        let body = r#"{
            "prediction": "Conjunctivitis Detected",
            "confidence": 0.91,
            "class_index": 1,
            "all_probabilities": {"Normal": 0.09, "Conjunctivitis Detected": 0.91}
        }"#;
        let r = ClassificationResponse::from_json(AnalysisKind::PinkEye, body).unwrap();
        assert_eq!(r.all_probabilities.len(), 2);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut r = ClassificationResponse::from_positive_probability(AnalysisKind::PinkEye, 0.9);
        r.confidence = 1.2;
        assert_eq!(r.validate(AnalysisKind::PinkEye).unwrap_err().code(), "EVS-3001");
        r.confidence = f64::NAN;
        assert!(r.validate(AnalysisKind::PinkEye).is_err());
    }

    #[test]
    fn rejects_response_for_other_kind() {
        let r = ClassificationResponse::from_positive_probability(AnalysisKind::PinkEye, 0.9);
        assert!(r.validate(AnalysisKind::Retinopathy).is_err());
    }

    #[test]
    fn recorded_classifier_replays_response() {
        let stored =
            ClassificationResponse::from_positive_probability(AnalysisKind::Retinopathy, 0.2);
        let classifier = RecordedClassifier::new(stored.clone());
        let request = ClassificationRequest::new("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        let got = classifier
            .classify(AnalysisKind::Retinopathy, &request)
            .unwrap();
        assert_eq!(got, stored);
        assert!(classifier.classify(AnalysisKind::PinkEye, &request).is_err());
    }
}
