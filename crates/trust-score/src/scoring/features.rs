use chrono::NaiveDate;

use super::domain::{FeatureVector, ValidatedRequest};
use super::pipeline::{InternalError, ScoringError};
use super::reference::ReferenceStore;

const INCIDENT_DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn derive_features(
    request: &ValidatedRequest,
    store: &ReferenceStore,
) -> Result<FeatureVector, ScoringError> {
    let record = store
        .lookup(&request.policy_number)
        .ok_or_else(|| ScoringError::PolicyNotFound(request.policy_number.clone()))?;

    let incident_date = parse_incident_date(&request.incident_date)?;
    let epoch = store.min_bind_date().ok_or(InternalError::MissingEpoch)?;
    let bind_date = record
        .policy_bind_date
        .ok_or_else(|| InternalError::MissingBindDate(record.policy_number.clone()))?;

    Ok(FeatureVector {
        policy_number: request.policy_number.clone(),
        policy_bind_days: days_since(epoch, bind_date),
        incident_days: days_since(epoch, incident_date),
        property_claim: request.property_claim,
        total_claim_amount: request.property_claim,
    })
}

pub(crate) fn parse_incident_date(raw: &str) -> Result<NaiveDate, InternalError> {
    NaiveDate::parse_from_str(raw, INCIDENT_DATE_FORMAT).map_err(|source| {
        InternalError::InvalidIncidentDate {
            raw: raw.to_string(),
            source,
        }
    })
}

/// Whole days from `epoch` to `date`; negative when `date` precedes the epoch.
pub(crate) fn days_since(epoch: NaiveDate, date: NaiveDate) -> i64 {
    date.signed_duration_since(epoch).num_days()
}
