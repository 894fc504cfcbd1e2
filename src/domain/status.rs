use serde::{Deserialize, Serialize};

/// Coarse display category of an upstream charge status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Success,
    Pending,
    Failed,
    Unknown,
}

const SUCCESS_MARKERS: [&str; 2] = ["success", "captured"];
const PENDING_MARKERS: [&str; 2] = ["pending", "processing"];
const FAILURE_MARKERS: [&str; 6] = ["fail", "error", "cancel", "expired", "declined", "rejected"];

impl StatusCategory {
    /// Classifies a gateway status by case-insensitive substring match.
    ///
    /// Success markers win over pending ones, which win over failure ones, so
    /// `AUTHENTICATION_PENDING` is pending and `CANCELLED` is failed. Anything
    /// unmatched is `Unknown`.
    pub fn classify(status: &str) -> Self {
        let status = status.to_ascii_lowercase();
        let has = |markers: &[&str]| markers.iter().any(|m| status.contains(m));

        if has(&SUCCESS_MARKERS) {
            Self::Success
        } else if has(&PENDING_MARKERS) {
            Self::Pending
        } else if has(&FAILURE_MARKERS) {
            Self::Failed
        } else {
            Self::Unknown
        }
    }

    /// Whether no further status change is expected.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// Response of the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub success: bool,
    pub charge_id: String,
    pub status: String,
    pub category: StatusCategory,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
    pub redirect_url: String,
    #[serde(default)]
    pub method: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_canonical_statuses() {
        assert_eq!(StatusCategory::classify("SUCCESSFUL"), StatusCategory::Success);
        assert_eq!(StatusCategory::classify("PENDING"), StatusCategory::Pending);
        assert_eq!(StatusCategory::classify("FAILED"), StatusCategory::Failed);
    }

    #[test]
    fn test_classify_substrings() {
        assert_eq!(StatusCategory::classify("captured"), StatusCategory::Success);
        assert_eq!(
            StatusCategory::classify("AUTHENTICATION_PENDING"),
            StatusCategory::Pending
        );
        assert_eq!(StatusCategory::classify("CANCELLED"), StatusCategory::Failed);
        assert_eq!(StatusCategory::classify("cancelled_by_user"), StatusCategory::Failed);
        assert_eq!(StatusCategory::classify("EXPIRED"), StatusCategory::Failed);
    }

    #[test]
    fn test_classify_unknown_is_not_an_error() {
        assert_eq!(StatusCategory::classify("AUTHORIZED"), StatusCategory::Unknown);
        assert_eq!(StatusCategory::classify(""), StatusCategory::Unknown);
        assert!(!StatusCategory::Unknown.is_final());
    }
}
