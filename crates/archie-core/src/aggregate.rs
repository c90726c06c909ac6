use crate::status::{Bucket, FeatureStatus};
use crate::Feature;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Days without an update after which a feature counts as stale.
pub const DEFAULT_STALE_DAYS: u32 = 30;

/// Project-wide rollup of feature statuses.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub total_features: usize,
    /// Every canonical status is present, zero or not. `UNKNOWN` and
    /// unrecognized values get a key only when they occur.
    pub status_counts: BTreeMap<FeatureStatus, usize>,
    pub features_by_status: BTreeMap<FeatureStatus, Vec<Feature>>,
    pub blocked_features: Vec<Feature>,
    pub stale_features: Vec<Feature>,
    pub in_progress_count: usize,
    pub completed_count: usize,
    pub not_started_count: usize,
    pub overall_progress: u32,
    pub stale_days: u32,
}

impl Summary {
    /// Aggregate against today's date and the default staleness threshold.
    pub fn aggregate(features: &[Feature]) -> Self {
        Self::aggregate_at(features, Local::now().date_naive(), DEFAULT_STALE_DAYS)
    }

    pub fn aggregate_at(features: &[Feature], today: NaiveDate, stale_days: u32) -> Self {
        let mut summary = Self {
            total_features: features.len(),
            stale_days,
            ..Self::default()
        };
        for status in FeatureStatus::all() {
            summary.status_counts.insert(status.clone(), 0);
            summary.features_by_status.insert(status.clone(), Vec::new());
        }

        let mut progress_sum: u64 = 0;
        for feature in features {
            *summary
                .status_counts
                .entry(feature.status.clone())
                .or_default() += 1;
            summary
                .features_by_status
                .entry(feature.status.clone())
                .or_default()
                .push(feature.clone());

            match feature.status.bucket() {
                Bucket::Blocked => summary.blocked_features.push(feature.clone()),
                Bucket::Completed => summary.completed_count += 1,
                Bucket::NotStarted => summary.not_started_count += 1,
                Bucket::InProgress => summary.in_progress_count += 1,
            }

            progress_sum += u64::from(feature.status.progress());

            if feature.is_stale_on(stale_days, today) {
                summary.stale_features.push(feature.clone());
            }
        }

        if !features.is_empty() {
            summary.overall_progress = (progress_sum / features.len() as u64) as u32;
        }
        summary
    }

    pub fn count(&self, status: &FeatureStatus) -> usize {
        self.status_counts.get(status).copied().unwrap_or(0)
    }

    /// Share of finished features, 0–100.
    pub fn completion_rate(&self) -> usize {
        if self.total_features == 0 {
            return 0;
        }
        self.completed_count * 100 / self.total_features
    }

    /// Short observations about the project, in a fixed order.
    pub fn top_insights(&self) -> Vec<String> {
        let mut insights = Vec::new();

        if self.total_features > 0 {
            let rate = self.completion_rate();
            if rate >= 80 {
                insights.push(format!("Great progress! {rate}% of features are completed"));
            } else if rate >= 50 {
                insights.push(format!("Halfway there! {rate}% of features are completed"));
            } else if rate > 0 {
                insights.push(format!("Getting started: {rate}% of features are completed"));
            }
        }

        if !self.blocked_features.is_empty() {
            insights.push(format!(
                "{} feature(s) are BLOCKED and need attention",
                self.blocked_features.len()
            ));
        }
        if self.in_progress_count > 0 {
            insights.push(format!(
                "{} feature(s) are actively in progress",
                self.in_progress_count
            ));
        }
        if self.not_started_count > 0 {
            insights.push(format!(
                "{} feature(s) are waiting to be reviewed",
                self.not_started_count
            ));
        }
        if !self.stale_features.is_empty() {
            insights.push(format!(
                "{} feature(s) haven't been updated in {}+ days",
                self.stale_features.len(),
                self.stale_days
            ));
        }

        let design_phase = self.count(&FeatureStatus::UnderDesign)
            + self.count(&FeatureStatus::Designed)
            + self.count(&FeatureStatus::SpecReady);
        if design_phase > self.total_features / 2 {
            insights.push("Most features are in design phase - good planning!".to_string());
        }

        insights
    }

    pub fn phase_distribution(&self) -> Vec<(Bucket, usize)> {
        vec![
            (Bucket::NotStarted, self.not_started_count),
            (Bucket::InProgress, self.in_progress_count),
            (Bucket::Completed, self.completed_count),
            (Bucket::Blocked, self.blocked_features.len()),
        ]
    }

    /// Status held by the most features, ignoring `UNKNOWN`. Ties go to the
    /// status earliest in process order. `None` when nothing is counted.
    pub fn most_common_status(&self) -> Option<FeatureStatus> {
        let mut best: Option<(&FeatureStatus, usize)> = None;
        for (status, &count) in &self.status_counts {
            if count == 0 || *status == FeatureStatus::Unknown {
                continue;
            }
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((status, count));
            }
        }
        best.map(|(status, _)| status.clone())
    }
}

/// Features in process order, then by name.
pub fn sort_features_by_status(features: &[Feature]) -> Vec<Feature> {
    let mut sorted = features.to_vec();
    sorted.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.name.cmp(&b.name)));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn feature(name: &str, status: &str) -> Feature {
        Feature::new(name, FeatureStatus::from(status))
    }

    #[test]
    fn empty_project() {
        let s = Summary::aggregate_at(&[], today(), 30);
        assert_eq!(s.total_features, 0);
        assert_eq!(s.overall_progress, 0);
        assert_eq!(s.status_counts.len(), 9);
        assert!(s.status_counts.values().all(|&c| c == 0));
        assert!(s.top_insights().is_empty());
        assert_eq!(s.most_common_status(), None);
    }

    #[test]
    fn counts_cover_every_status_and_sum_to_total() {
        let features = vec![
            feature("a", "FINISHED"),
            feature("b", "BLOCKED"),
            feature("c", "UNKNOWN"),
            feature("d", "IN_QA"),
        ];
        let s = Summary::aggregate_at(&features, today(), 30);
        for status in FeatureStatus::all() {
            assert!(s.status_counts.contains_key(status), "{status}");
        }
        assert_eq!(s.status_counts.values().sum::<usize>(), s.total_features);
        assert_eq!(s.count(&FeatureStatus::from("IN_QA")), 1);
        assert_eq!(s.count(&FeatureStatus::Unknown), 1);
    }

    #[test]
    fn mixed_project_rollup() {
        let mut z = Feature::new("z", FeatureStatus::Unknown);
        z.file_path = "features/z.md".into();
        let features = vec![feature("x", "FINISHED"), feature("y", "IMPLEMENTING"), z];

        let s = Summary::aggregate_at(&features, today(), 30);
        assert_eq!(s.total_features, 3);
        assert_eq!(s.completed_count, 1);
        assert_eq!(s.in_progress_count, 1);
        assert_eq!(s.not_started_count, 1);
        assert_eq!(s.count(&FeatureStatus::Unknown), 1);
        assert_eq!(s.overall_progress, 61);
    }

    #[test]
    fn buckets_are_disjoint() {
        let features = vec![
            feature("a", "NOT_REVIEWED"),
            feature("b", "BLOCKED"),
            feature("c", "DESIGNED"),
            feature("d", "FINISHED"),
            feature("e", "SHIPPED"),
        ];
        let s = Summary::aggregate_at(&features, today(), 30);
        assert_eq!(s.not_started_count, 1);
        assert_eq!(s.blocked_features.len(), 1);
        assert_eq!(s.in_progress_count, 2);
        assert_eq!(s.completed_count, 1);
        let total: usize = s.phase_distribution().iter().map(|(_, n)| n).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn stale_threshold() {
        let mut old = feature("old", "DESIGNED");
        old.last_updated = (today() - Duration::days(31)).format("%Y-%m-%d").to_string();
        let mut edge = feature("edge", "DESIGNED");
        edge.last_updated = (today() - Duration::days(30)).format("%Y-%m-%d").to_string();

        let s = Summary::aggregate_at(&[old, edge], today(), 30);
        let names: Vec<&str> = s.stale_features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["old"]);
        assert!(s
            .top_insights()
            .contains(&"1 feature(s) haven't been updated in 30+ days".to_string()));
    }

    #[test]
    fn insights_in_order() {
        let features = vec![
            feature("a", "FINISHED"),
            feature("b", "BLOCKED"),
            feature("c", "UNDER_DESIGN"),
            feature("d", "NOT_REVIEWED"),
        ];
        let insights = Summary::aggregate_at(&features, today(), 30).top_insights();
        assert_eq!(
            insights,
            vec![
                "Getting started: 25% of features are completed",
                "1 feature(s) are BLOCKED and need attention",
                "1 feature(s) are actively in progress",
                "1 feature(s) are waiting to be reviewed",
            ]
        );
    }

    #[test]
    fn completion_bands() {
        let done = |n: usize, total: usize| -> Vec<Feature> {
            (0..total)
                .map(|i| {
                    feature(
                        &format!("f{i}"),
                        if i < n { "FINISHED" } else { "NOT_REVIEWED" },
                    )
                })
                .collect()
        };
        let first = |fs: Vec<Feature>| Summary::aggregate_at(&fs, today(), 30).top_insights()[0].clone();
        assert!(first(done(4, 5)).starts_with("Great progress! 80%"));
        assert!(first(done(1, 2)).starts_with("Halfway there! 50%"));
        assert!(first(done(0, 2)).starts_with("2 feature(s) are waiting"));
    }

    #[test]
    fn design_phase_majority() {
        let features = vec![
            feature("a", "UNDER_DESIGN"),
            feature("b", "DESIGNED"),
            feature("c", "NOT_REVIEWED"),
        ];
        let insights = Summary::aggregate_at(&features, today(), 30).top_insights();
        assert_eq!(
            insights.last().map(String::as_str),
            Some("Most features are in design phase - good planning!")
        );
    }

    #[test]
    fn most_common_ignores_unknown_and_breaks_ties_by_order() {
        let features = vec![
            feature("a", "UNKNOWN"),
            feature("b", "UNKNOWN"),
            feature("c", "UNKNOWN"),
            feature("d", "DESIGNED"),
            feature("e", "UNDER_REVIEW"),
        ];
        let s = Summary::aggregate_at(&features, today(), 30);
        assert_eq!(s.most_common_status(), Some(FeatureStatus::UnderReview));
    }

    #[test]
    fn sorts_by_process_order_then_name() {
        let features = vec![
            feature("zeta", "FINISHED"),
            feature("beta", "NOT_REVIEWED"),
            feature("alpha", "FINISHED"),
            feature("mystery", "UNKNOWN"),
        ];
        let names: Vec<String> = sort_features_by_status(&features)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["beta", "alpha", "zeta", "mystery"]);
    }
}
