use log::{debug, info};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Capability interface for the recruiter/vendor decision. The production
/// implementation scores with a pre-trained statistical model; tests inject
/// a rule-based stub through the same seam.
pub trait RecruiterClassifier: Send {
    fn is_recruiter(&self, text: &str) -> bool;
}

/// The classifier's input: subject, normalized body and sender concatenated
/// into one feature string, matching how the model was trained.
pub fn feature_text(subject: &str, body: &str, sender: &str) -> String {
    format!("{} {} {}", subject, body, sender)
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unable to read model file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse model file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("inconsistent model: {0}")]
    Invalid(String),
}

/// TF-IDF vectorizer plus logistic-regression weights, exported offline from
/// the training pipeline as a single JSON artifact. Scoring reproduces the
/// trained model's decision function: l2-normalized tf-idf features dotted
/// with the coefficients, thresholded at the default decision boundary.
#[derive(Debug, Deserialize)]
pub struct TfidfLogisticModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl TfidfLogisticModel {
    pub fn load(path: &Path) -> Result<TfidfLogisticModel, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let model: TfidfLogisticModel =
            serde_json::from_str(&raw).map_err(|e| ModelError::Parse {
                path: path.display().to_string(),
                source: e,
            })?;

        model.validate()?;
        info!(
            "Loaded classifier model from {} ({} features)",
            path.display(),
            model.vocabulary.len()
        );
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        let n = self.vocabulary.len();
        if n == 0 {
            return Err(ModelError::Invalid("empty vocabulary".to_string()));
        }
        if self.idf.len() != n || self.coefficients.len() != n {
            return Err(ModelError::Invalid(format!(
                "vocabulary has {} terms but idf has {} and coefficients has {}",
                n,
                self.idf.len(),
                self.coefficients.len()
            )));
        }
        if let Some(&index) = self.vocabulary.values().find(|&&i| i >= n) {
            return Err(ModelError::Invalid(format!(
                "vocabulary index {} out of range",
                index
            )));
        }
        Ok(())
    }

    /// Signed distance from the decision boundary; positive means recruiter.
    pub fn decision_value(&self, text: &str) -> f64 {
        // Same tokenization the vectorizer was fitted with: lower-cased
        // word tokens of at least two characters.
        let tokens = match Regex::new(r"\b\w\w+\b") {
            Ok(re) => re,
            Err(_) => return self.intercept,
        };

        let lowered = text.to_lowercase();
        let mut tf: HashMap<usize, f64> = HashMap::new();
        for tok in tokens.find_iter(&lowered) {
            if let Some(&idx) = self.vocabulary.get(tok.as_str()) {
                *tf.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        if tf.is_empty() {
            return self.intercept;
        }

        let norm: f64 = tf
            .iter()
            .map(|(&idx, &count)| {
                let w = count * self.idf[idx];
                w * w
            })
            .sum::<f64>()
            .sqrt();

        let mut score = self.intercept;
        if norm > 0.0 {
            for (&idx, &count) in &tf {
                score += (count * self.idf[idx] / norm) * self.coefficients[idx];
            }
        }

        debug!("Classifier decision value: {:.4}", score);
        score
    }
}

impl RecruiterClassifier for TfidfLogisticModel {
    fn is_recruiter(&self, text: &str) -> bool {
        self.decision_value(text) > 0.0
    }
}
