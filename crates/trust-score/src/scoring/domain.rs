use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Identifier wrapper for insurance policies. Lookups compare it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyNumber(pub String);

impl PolicyNumber {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PolicyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Policy metadata loaded from the reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRecord {
    pub policy_number: PolicyNumber,
    /// `None` when the source value could not be parsed as a date.
    pub policy_bind_date: Option<NaiveDate>,
}

/// Raw scoring payload as it arrives on the wire.
///
/// Fields stay untyped until validation so that absent, falsy, and mistyped
/// values can be told apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_claim: Option<Value>,
}

impl ScoringRequest {
    pub fn new(
        policy_number: impl Into<String>,
        incident_date: impl Into<String>,
        property_claim: f64,
    ) -> Self {
        Self {
            policy_number: Some(Value::String(policy_number.into())),
            incident_date: Some(Value::String(incident_date.into())),
            property_claim: Some(json!(property_claim)),
        }
    }
}

/// Request whose mandatory fields are present, truthy, and typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub policy_number: PolicyNumber,
    pub incident_date: String,
    pub property_claim: f64,
}

/// Numeric columns understood by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    PolicyBindDate,
    IncidentDate,
    PropertyClaim,
    TotalClaimAmount,
}

impl FeatureName {
    pub const ALL: [FeatureName; 4] = [
        FeatureName::PolicyBindDate,
        FeatureName::IncidentDate,
        FeatureName::PropertyClaim,
        FeatureName::TotalClaimAmount,
    ];

    pub fn column(self) -> &'static str {
        match self {
            FeatureName::PolicyBindDate => "policy_bind_date",
            FeatureName::IncidentDate => "incident_date",
            FeatureName::PropertyClaim => "property_claim",
            FeatureName::TotalClaimAmount => "total_claim_amount",
        }
    }
}

/// Model input row. Serialized field names and order match the training frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub policy_number: PolicyNumber,
    #[serde(rename = "policy_bind_date")]
    pub policy_bind_days: i64,
    #[serde(rename = "incident_date")]
    pub incident_days: i64,
    pub property_claim: f64,
    pub total_claim_amount: f64,
}

impl FeatureVector {
    pub fn value(&self, feature: FeatureName) -> f64 {
        match feature {
            FeatureName::PolicyBindDate => self.policy_bind_days as f64,
            FeatureName::IncidentDate => self.incident_days as f64,
            FeatureName::PropertyClaim => self.property_claim,
            FeatureName::TotalClaimAmount => self.total_claim_amount,
        }
    }
}

/// Response body for a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub policy_number: PolicyNumber,
    pub trust_score: f64,
    pub incident_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_seconds: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_vector_serializes_in_training_column_order() {
        let features = FeatureVector {
            policy_number: PolicyNumber::new("P-100"),
            policy_bind_days: 0,
            incident_days: 30,
            property_claim: 5000.0,
            total_claim_amount: 5000.0,
        };

        let rendered = serde_json::to_string(&features).expect("serializes");
        assert_eq!(
            rendered,
            r#"{"policy_number":"P-100","policy_bind_date":0,"incident_date":30,"property_claim":5000.0,"total_claim_amount":5000.0}"#
        );
    }

    #[test]
    fn feature_names_match_serialized_columns() {
        for feature in FeatureName::ALL {
            let rendered = serde_json::to_value(feature).expect("serializes");
            assert_eq!(rendered, Value::String(feature.column().to_string()));
        }
    }

    #[test]
    fn missing_request_fields_deserialize_as_none() {
        let request: ScoringRequest =
            serde_json::from_str(r#"{"policy_number": "P-1", "incident_date": null}"#)
                .expect("parses");
        assert_eq!(request.policy_number, Some(Value::String("P-1".to_string())));
        assert!(request.incident_date.is_none());
        assert!(request.property_claim.is_none());
    }
}
