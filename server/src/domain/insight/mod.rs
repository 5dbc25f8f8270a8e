//! Insight generation
//!
//! Turns one unit's scored window into a small set of human-readable
//! observations. Rules are keyed so repeated runs over the same data
//! produce the same set, and the whole set is replaced per run.

use serde_json::json;

use crate::domain::fusion::category::ServiceCategory;
use crate::domain::fusion::extract::RawMetricBag;
use crate::domain::fusion::normalize::DimensionScores;
use crate::domain::fusion::trend::{TrendDirection, TrendSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightSeverity {
    Info,
    Warning,
    Positive,
    Negative,
}

impl InsightSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

/// One generated insight before persistence
#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    /// Stable per-service key, `{service}:{rule}`
    pub key: String,
    pub text: String,
    pub severity: InsightSeverity,
    pub confidence: f64,
    pub metadata: Option<String>,
}

/// Generate insights for one unit's window.
///
/// An empty window yields no insights; stale observations would otherwise
/// survive wholesale replacement forever.
pub fn generate(
    service_name: &str,
    category: ServiceCategory,
    scores: &DimensionScores,
    bag: &RawMetricBag,
    trend: &TrendSummary,
) -> Vec<Insight> {
    if bag.event_count == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut push = |rule: &str, text: String, severity: InsightSeverity, confidence: f64| {
        out.push(Insight {
            key: format!("{service_name}:{rule}"),
            text,
            severity,
            confidence,
            metadata: None,
        });
    };

    match category {
        ServiceCategory::ProjectManagement => {
            let tasks = bag.get("task_count");
            let completed = bag.get("completed_count");
            if tasks > 0.0 {
                let ratio = completed / tasks;
                if ratio > 0.7 {
                    push(
                        "strong-completion",
                        format!(
                            "{:.0}% of tasks in {} were completed this window",
                            ratio * 100.0,
                            service_name
                        ),
                        InsightSeverity::Positive,
                        85.0,
                    );
                } else if ratio < 0.3 && bag.get("backlog_count") > 10.0 {
                    push(
                        "rising-backlog",
                        format!(
                            "Completion rate in {} dropped to {:.0}% with {:.0} open items",
                            service_name,
                            ratio * 100.0,
                            bag.get("backlog_count")
                        ),
                        InsightSeverity::Warning,
                        80.0,
                    );
                }
            }
            if bag.get("overdue_count") > 0.0 {
                push(
                    "overdue-items",
                    format!(
                        "{:.0} items in {} are past their due date",
                        bag.get("overdue_count"),
                        service_name
                    ),
                    InsightSeverity::Negative,
                    90.0,
                );
            }
        }
        ServiceCategory::Communication => {
            let avg_response = bag.get("avg_response_minutes");
            if avg_response > 0.0 && avg_response <= 15.0 {
                push(
                    "fast-replies",
                    format!(
                        "Replies in {} average {:.0} minutes",
                        service_name, avg_response
                    ),
                    InsightSeverity::Positive,
                    80.0,
                );
            } else if avg_response > 120.0 {
                push(
                    "slow-replies",
                    format!(
                        "Replies in {} are taking {:.0} minutes on average",
                        service_name, avg_response
                    ),
                    InsightSeverity::Warning,
                    80.0,
                );
            }
        }
        ServiceCategory::Support => {
            let tickets = bag.get("ticket_count");
            let resolved = bag.get("resolved_count");
            if tickets > 0.0 && resolved / tickets > 0.8 {
                push(
                    "strong-resolution",
                    format!(
                        "{:.0}% of {} tickets were resolved this window",
                        resolved / tickets * 100.0,
                        service_name
                    ),
                    InsightSeverity::Positive,
                    85.0,
                );
            }
            let first_response = bag.get("avg_first_response_minutes");
            if first_response > 240.0 {
                push(
                    "slow-first-response",
                    format!(
                        "First response in {} averages {:.0} minutes",
                        service_name, first_response
                    ),
                    InsightSeverity::Warning,
                    80.0,
                );
            }
            if resolved > 0.0 && bag.get("reopened_count") / resolved > 0.2 {
                push(
                    "frequent-reopens",
                    format!(
                        "{:.0} resolved tickets in {} were reopened",
                        bag.get("reopened_count"),
                        service_name
                    ),
                    InsightSeverity::Negative,
                    75.0,
                );
            }
        }
        ServiceCategory::Engineering => {
            let prs = bag.get("pr_count");
            if prs > 0.0 && bag.get("merged_count") / prs > 0.7 {
                push(
                    "healthy-merge-rate",
                    format!(
                        "{:.0}% of pull requests in {} were merged",
                        bag.get("merged_count") / prs * 100.0,
                        service_name
                    ),
                    InsightSeverity::Positive,
                    80.0,
                );
            }
            if bag.get("build_failure_count") > 10.0 {
                push(
                    "frequent-build-failures",
                    format!(
                        "{:.0} build failures in {} this window",
                        bag.get("build_failure_count"),
                        service_name
                    ),
                    InsightSeverity::Negative,
                    85.0,
                );
            }
        }
        ServiceCategory::Meetings => {
            let minutes = bag.get("total_minutes");
            if minutes > 1800.0 {
                push(
                    "heavy-meeting-load",
                    format!(
                        "{:.0} hours spent in meetings this window",
                        minutes / 60.0
                    ),
                    InsightSeverity::Warning,
                    80.0,
                );
            }
            let meetings = bag.get("meeting_count");
            if meetings > 0.0 && bag.get("declined_count") / meetings > 0.3 {
                push(
                    "frequent-declines",
                    format!(
                        "{:.0} of {:.0} meetings were declined",
                        bag.get("declined_count"),
                        meetings
                    ),
                    InsightSeverity::Info,
                    70.0,
                );
            }
        }
        _ => {}
    }

    // Dimension health applies across categories
    for (dim_name, score) in [
        ("activity", scores.activity),
        ("responsiveness", scores.responsiveness),
    ] {
        if score < 25.0 {
            push(
                &format!("low-{dim_name}"),
                format!(
                    "{} {} score is low at {:.0}",
                    service_name, dim_name, score
                ),
                InsightSeverity::Warning,
                70.0,
            );
        }
    }

    match trend.direction {
        TrendDirection::Up => {
            out.push(Insight {
                key: format!("{service_name}:upward-trend"),
                text: format!(
                    "Activity in {} is up {:.0}% over the previous window",
                    service_name,
                    trend.wow_change_pct.abs()
                ),
                severity: InsightSeverity::Positive,
                confidence: 75.0,
                metadata: Some(
                    json!({ "wow_change_pct": trend.wow_change_pct, "slope": trend.slope })
                        .to_string(),
                ),
            });
        }
        TrendDirection::Down => {
            out.push(Insight {
                key: format!("{service_name}:downward-trend"),
                text: format!(
                    "Activity in {} is down {:.0}% from the previous window",
                    service_name,
                    trend.wow_change_pct.abs()
                ),
                severity: InsightSeverity::Warning,
                confidence: 75.0,
                metadata: Some(
                    json!({ "wow_change_pct": trend.wow_change_pct, "slope": trend.slope })
                        .to_string(),
                ),
            });
        }
        TrendDirection::Stable => {}
    }

    out
}
