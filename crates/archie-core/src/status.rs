use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// FeatureStatus
// ---------------------------------------------------------------------------

/// Status of a feature as written in its `## Status` block.
///
/// Variant order is the canonical process order, so the derived `Ord` sorts
/// statuses the way reports list them. `Unknown` is the sentinel for files
/// that could not be read or carry no `- Value:` line; `Other` keeps any
/// unrecognized value verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureStatus {
    NotReviewed,
    UnderReview,
    Blocked,
    ReadyForDesign,
    UnderDesign,
    Designed,
    SpecReady,
    Implementing,
    Finished,
    Unknown,
    Other(String),
}

/// Bucket a status falls into for the overview triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

impl FeatureStatus {
    /// The nine well-formed statuses, in process order.
    pub fn all() -> &'static [FeatureStatus] {
        &[
            FeatureStatus::NotReviewed,
            FeatureStatus::UnderReview,
            FeatureStatus::Blocked,
            FeatureStatus::ReadyForDesign,
            FeatureStatus::UnderDesign,
            FeatureStatus::Designed,
            FeatureStatus::SpecReady,
            FeatureStatus::Implementing,
            FeatureStatus::Finished,
        ]
    }

    /// The lifecycle: every canonical status except the `Blocked` side-state.
    pub fn lifecycle() -> impl Iterator<Item = &'static FeatureStatus> {
        Self::all().iter().filter(|s| !s.is_blocked())
    }

    pub fn is_valid(&self) -> bool {
        Self::all().contains(self)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, FeatureStatus::Blocked)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FeatureStatus::NotReviewed => "NOT_REVIEWED",
            FeatureStatus::UnderReview => "UNDER_REVIEW",
            FeatureStatus::Blocked => "BLOCKED",
            FeatureStatus::ReadyForDesign => "READY_FOR_DESIGN",
            FeatureStatus::UnderDesign => "UNDER_DESIGN",
            FeatureStatus::Designed => "DESIGNED",
            FeatureStatus::SpecReady => "SPEC_READY",
            FeatureStatus::Implementing => "IMPLEMENTING",
            FeatureStatus::Finished => "FINISHED",
            FeatureStatus::Unknown => "UNKNOWN",
            FeatureStatus::Other(s) => s,
        }
    }

    /// Human label: underscores become spaces (`SPEC_READY` → `SPEC READY`).
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Progress through the lifecycle, 0–100.
    ///
    /// The position is taken within the lifecycle (the canonical list with
    /// `Blocked` removed), so moving `Blocked` around in `all()` never shifts
    /// the scores. `Blocked`, `Unknown` and unrecognized values score 0.
    pub fn progress(&self) -> u32 {
        let steps = Self::lifecycle().count();
        if steps < 2 {
            return 0;
        }
        match Self::lifecycle().position(|s| s == self) {
            Some(i) => (i * 100 / (steps - 1)) as u32,
            None => 0,
        }
    }

    pub fn bucket(&self) -> Bucket {
        match self {
            FeatureStatus::Blocked => Bucket::Blocked,
            FeatureStatus::Finished => Bucket::Completed,
            FeatureStatus::NotReviewed | FeatureStatus::Unknown => Bucket::NotStarted,
            _ => Bucket::InProgress,
        }
    }
}

impl Default for FeatureStatus {
    fn default() -> Self {
        FeatureStatus::Unknown
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FeatureStatus {
    fn from(s: &str) -> Self {
        match s {
            "NOT_REVIEWED" => FeatureStatus::NotReviewed,
            "UNDER_REVIEW" => FeatureStatus::UnderReview,
            "BLOCKED" => FeatureStatus::Blocked,
            "READY_FOR_DESIGN" => FeatureStatus::ReadyForDesign,
            "UNDER_DESIGN" => FeatureStatus::UnderDesign,
            "DESIGNED" => FeatureStatus::Designed,
            "SPEC_READY" => FeatureStatus::SpecReady,
            "IMPLEMENTING" => FeatureStatus::Implementing,
            "FINISHED" => FeatureStatus::Finished,
            "UNKNOWN" => FeatureStatus::Unknown,
            other => FeatureStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for FeatureStatus {
    fn from(s: String) -> Self {
        FeatureStatus::from(s.as_str())
    }
}

impl From<FeatureStatus> for String {
    fn from(s: FeatureStatus) -> Self {
        s.as_str().to_string()
    }
}

impl Bucket {
    pub fn label(self) -> &'static str {
        match self {
            Bucket::NotStarted => "Not Started",
            Bucket::InProgress => "In Progress",
            Bucket::Completed => "Completed",
            Bucket::Blocked => "Blocked",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order() {
        assert_eq!(FeatureStatus::all().len(), 9);
        assert_eq!(FeatureStatus::all()[2], FeatureStatus::Blocked);
        assert!(FeatureStatus::NotReviewed < FeatureStatus::UnderReview);
        assert!(FeatureStatus::Implementing < FeatureStatus::Finished);
        assert!(FeatureStatus::Finished < FeatureStatus::Unknown);
    }

    #[test]
    fn lifecycle_progress_is_evenly_spread() {
        let scores: Vec<u32> = FeatureStatus::lifecycle().map(|s| s.progress()).collect();
        assert_eq!(scores, vec![0, 14, 28, 42, 57, 71, 85, 100]);
        for (i, status) in FeatureStatus::lifecycle().enumerate() {
            assert_eq!(status.progress(), (i * 100 / 7) as u32, "{status}");
        }
    }

    #[test]
    fn blocked_and_sentinels_score_zero() {
        assert_eq!(FeatureStatus::Blocked.progress(), 0);
        assert_eq!(FeatureStatus::Unknown.progress(), 0);
        assert_eq!(FeatureStatus::from("DONE").progress(), 0);
    }

    #[test]
    fn validity() {
        for status in FeatureStatus::all() {
            assert!(status.is_valid());
        }
        assert!(!FeatureStatus::Unknown.is_valid());
        assert!(!FeatureStatus::from("finished").is_valid());
    }

    #[test]
    fn unrecognized_values_are_kept() {
        let status = FeatureStatus::from("IN_QA");
        assert_eq!(status, FeatureStatus::Other("IN_QA".to_string()));
        assert_eq!(status.as_str(), "IN_QA");
    }

    #[test]
    fn string_roundtrip() {
        for status in FeatureStatus::all() {
            assert_eq!(&FeatureStatus::from(status.as_str()), status);
        }
    }

    #[test]
    fn buckets() {
        assert_eq!(FeatureStatus::NotReviewed.bucket(), Bucket::NotStarted);
        assert_eq!(FeatureStatus::Unknown.bucket(), Bucket::NotStarted);
        assert_eq!(FeatureStatus::Finished.bucket(), Bucket::Completed);
        assert_eq!(FeatureStatus::Blocked.bucket(), Bucket::Blocked);
        assert_eq!(FeatureStatus::SpecReady.bucket(), Bucket::InProgress);
        assert_eq!(FeatureStatus::from("IN_QA").bucket(), Bucket::InProgress);
    }

    #[test]
    fn label_replaces_underscores() {
        assert_eq!(FeatureStatus::ReadyForDesign.label(), "READY FOR DESIGN");
    }
}
