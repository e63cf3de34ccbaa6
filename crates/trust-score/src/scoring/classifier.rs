use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{FeatureName, FeatureVector};

/// Probability pair produced for the binary fraud task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities {
    pub legitimate: f64,
    pub fraud: f64,
}

/// Opaque pre-trained model seam; implementations must be safe to share across requests.
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, features: &FeatureVector)
        -> Result<ClassProbabilities, ClassifierError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier produced a non-finite score for feature '{0}'")]
    NonFinite(&'static str),
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed model artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Serialized parameters of a standardized logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModelArtifact {
    pub model: String,
    #[serde(default)]
    pub version: Option<String>,
    pub intercept: f64,
    pub features: Vec<FeatureWeight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub name: FeatureName,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
    pub coefficient: f64,
}

fn unit_scale() -> f64 {
    1.0
}

const LOGISTIC_REGRESSION: &str = "logistic_regression";

/// Fraud classifier backed by a logistic regression artifact on disk.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    artifact: LogisticModelArtifact,
}

impl LogisticModel {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelLoadError> {
        let artifact: LogisticModelArtifact = serde_json::from_reader(reader)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: LogisticModelArtifact) -> Result<Self, ModelLoadError> {
        if artifact.model != LOGISTIC_REGRESSION {
            return Err(ModelLoadError::Invalid(format!(
                "unsupported model kind '{}'",
                artifact.model
            )));
        }
        if artifact.features.is_empty() {
            return Err(ModelLoadError::Invalid("no features declared".to_string()));
        }
        if !artifact.intercept.is_finite() {
            return Err(ModelLoadError::Invalid("intercept is not finite".to_string()));
        }

        let mut seen = HashSet::new();
        for weight in &artifact.features {
            let column = weight.name.column();
            if !seen.insert(weight.name) {
                return Err(ModelLoadError::Invalid(format!(
                    "feature '{column}' declared twice"
                )));
            }
            if !(weight.mean.is_finite() && weight.coefficient.is_finite()) {
                return Err(ModelLoadError::Invalid(format!(
                    "feature '{column}' has non-finite parameters"
                )));
            }
            if !weight.scale.is_finite() || weight.scale == 0.0 {
                return Err(ModelLoadError::Invalid(format!(
                    "feature '{column}' has an unusable scale"
                )));
            }
        }

        Ok(Self { artifact })
    }

    pub fn artifact(&self) -> &LogisticModelArtifact {
        &self.artifact
    }
}

impl Classifier for LogisticModel {
    fn predict_proba(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassProbabilities, ClassifierError> {
        let mut logit = self.artifact.intercept;
        for weight in &self.artifact.features {
            let standardized = (features.value(weight.name) - weight.mean) / weight.scale;
            let contribution = weight.coefficient * standardized;
            if !contribution.is_finite() {
                return Err(ClassifierError::NonFinite(weight.name.column()));
            }
            logit += contribution;
        }

        let fraud = sigmoid(logit);
        Ok(ClassProbabilities {
            legitimate: 1.0 - fraud,
            fraud,
        })
    }
}

fn sigmoid(logit: f64) -> f64 {
    if logit >= 0.0 {
        1.0 / (1.0 + (-logit).exp())
    } else {
        let e = logit.exp();
        e / (1.0 + e)
    }
}
