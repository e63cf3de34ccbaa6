use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use super::classifier::{LogisticModel, ModelLoadError};
use super::pipeline::{PipelineOptions, ScoringPipeline};
use super::reference::{ReferenceDataError, ReferenceStore};
use crate::config::ScoringConfig;

/// Fatal conditions that keep the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("model artifact not found at {}; train and export the model first", .path.display())]
    ModelMissing { path: PathBuf },
    #[error("could not load model artifact {}: {source}", .path.display())]
    Model {
        path: PathBuf,
        source: ModelLoadError,
    },
    #[error("policy reference data not found at {}", .path.display())]
    ReferenceDataMissing { path: PathBuf },
    #[error("could not load policy reference data {}: {source}", .path.display())]
    ReferenceData {
        path: PathBuf,
        source: ReferenceDataError,
    },
}

pub fn load_classifier(path: &Path) -> Result<LogisticModel, StartupError> {
    if !path.is_file() {
        return Err(StartupError::ModelMissing {
            path: path.to_path_buf(),
        });
    }

    let model = LogisticModel::from_path(path).map_err(|source| StartupError::Model {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        version = model.artifact().version.as_deref().unwrap_or("unversioned"),
        features = model.artifact().features.len(),
        "fraud model loaded"
    );
    Ok(model)
}

pub fn load_reference_store(path: &Path) -> Result<ReferenceStore, StartupError> {
    if !path.is_file() {
        return Err(StartupError::ReferenceDataMissing {
            path: path.to_path_buf(),
        });
    }

    ReferenceStore::from_path(path).map_err(|source| StartupError::ReferenceData {
        path: path.to_path_buf(),
        source,
    })
}

/// Load both startup artifacts and assemble the pipeline that shares them.
pub fn build_pipeline(
    config: &ScoringConfig,
) -> Result<ScoringPipeline<LogisticModel>, StartupError> {
    let classifier = load_classifier(&config.model_path)?;
    let store = load_reference_store(&config.reference_data_path)?;

    Ok(ScoringPipeline::with_options(
        Arc::new(store),
        Arc::new(classifier),
        PipelineOptions {
            simulated_latency: config.simulated_latency,
        },
    ))
}
