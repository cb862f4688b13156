use serde::Serialize;

/// Confidence strictly above this is accepted without alternatives.
pub const ACCEPT_THRESHOLD: f32 = 0.80;
/// Confidence at or above this (and not above [`ACCEPT_THRESHOLD`]) is
/// accepted with the ranked alternatives attached.
pub const REVIEW_THRESHOLD: f32 = 0.60;

pub const MANUAL_VERIFICATION: &str = "MANUAL_VERIFICATION";
pub const ERROR: &str = "ERROR";

/// Why a text was routed to a human instead of being labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualReason {
    /// The top class probability is below [`REVIEW_THRESHOLD`]
    LowConfidence,
    /// Nothing survived normalization
    NoContentAfterNormalization,
}

impl ManualReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::LowConfidence => {
                "Confidence is below the automatic acceptance threshold. Needs manual check."
            }
            Self::NoContentAfterNormalization => {
                "Text has no content after preprocessing. Needs manual check."
            }
        }
    }
}

/// Routing decision for one classified text.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationResult {
    Accepted {
        label: String,
        confidence: f32,
    },
    AcceptedWithAlternatives {
        label: String,
        confidence: f32,
        /// Every class, descending by probability
        ranked_alternatives: Vec<(String, f32)>,
    },
    ManualVerification {
        confidence: f32,
        reason: ManualReason,
    },
    Error {
        message: String,
    },
}

impl ClassificationResult {
    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// The label, `MANUAL_VERIFICATION` or `ERROR`
    pub fn classification(&self) -> &str {
        match self {
            Self::Accepted { label, .. } | Self::AcceptedWithAlternatives { label, .. } => label,
            Self::ManualVerification { .. } => MANUAL_VERIFICATION,
            Self::Error { .. } => ERROR,
        }
    }

    pub fn confidence(&self) -> Option<f32> {
        match self {
            Self::Accepted { confidence, .. }
            | Self::AcceptedWithAlternatives { confidence, .. }
            | Self::ManualVerification { confidence, .. } => Some(*confidence),
            Self::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::ManualVerification { reason, .. } => Some(reason.message()),
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn alternatives(&self) -> Option<&[(String, f32)]> {
        match self {
            Self::AcceptedWithAlternatives {
                ranked_alternatives,
                ..
            } => Some(ranked_alternatives),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn needs_manual_verification(&self) -> bool {
        matches!(self, Self::ManualVerification { .. })
    }

    pub fn to_record(&self) -> ClassificationRecord {
        ClassificationRecord {
            classification_result: self.classification().to_string(),
            confidence: self.confidence(),
            message: self.message().map(str::to_string),
            all_predictions: self.alternatives().map(<[_]>::to_vec),
        }
    }
}

/// Flat record handed to callers (HTTP handlers, the CLI's `--json` output).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRecord {
    pub classification_result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_predictions: Option<Vec<(String, f32)>>,
}

impl From<&ClassificationResult> for ClassificationRecord {
    fn from(result: &ClassificationResult) -> Self {
        result.to_record()
    }
}
