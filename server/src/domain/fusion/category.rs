//! Service categories and their scoring profiles
//!
//! Every integration is tagged with a category that decides which raw
//! metrics are extracted from its events and how the four score
//! dimensions are derived from them. Unknown categories fall back to
//! [`ServiceCategory::General`], which only counts events.

use serde::{Deserialize, Serialize};

// ============================================================================
// Category and dimension enums
// ============================================================================

/// Integration category for extraction and scoring dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Communication,
    Meetings,
    ProjectManagement,
    Engineering,
    Documentation,
    Support,
    Design,
    Data,
    Financial,
    Crm,
    #[default]
    General,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Communication => "communication",
            Self::Meetings => "meetings",
            Self::ProjectManagement => "project_management",
            Self::Engineering => "engineering",
            Self::Documentation => "documentation",
            Self::Support => "support",
            Self::Design => "design",
            Self::Data => "data",
            Self::Financial => "financial",
            Self::Crm => "crm",
            Self::General => "general",
        }
    }

    /// Parse a stored category string; anything unrecognized is General.
    pub fn parse(s: &str) -> Self {
        match s {
            "communication" => Self::Communication,
            "meetings" => Self::Meetings,
            "project_management" => Self::ProjectManagement,
            "engineering" => Self::Engineering,
            "documentation" => Self::Documentation,
            "support" => Self::Support,
            "design" => Self::Design,
            "data" => Self::Data,
            "financial" => Self::Financial,
            "crm" => Self::Crm,
            _ => Self::General,
        }
    }

    pub fn all() -> &'static [ServiceCategory] {
        &[
            Self::Communication,
            Self::Meetings,
            Self::ProjectManagement,
            Self::Engineering,
            Self::Documentation,
            Self::Support,
            Self::Design,
            Self::Data,
            Self::Financial,
            Self::Crm,
            Self::General,
        ]
    }
}

/// The four normalized score dimensions carried by every snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Activity,
    Participation,
    Responsiveness,
    Throughput,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Participation => "participation",
            Self::Responsiveness => "responsiveness",
            Self::Throughput => "throughput",
        }
    }

    pub fn all() -> &'static [Dimension] {
        &[
            Self::Activity,
            Self::Participation,
            Self::Responsiveness,
            Self::Throughput,
        ]
    }
}

/// Classification of a normalized metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    #[default]
    Count,
    Average,
    Percentage,
    Trend,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Average => "average",
            Self::Percentage => "percentage",
            Self::Trend => "trend",
        }
    }
}

// ============================================================================
// Scoring profiles
// ============================================================================

/// A canonical raw metric and the metadata keys that map onto it
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

/// How one score dimension is derived from the raw metric bag
#[derive(Debug, Clone, Copy)]
pub enum DimensionRule {
    /// Linear rescale of one metric into 0-100 against (min, max).
    Scaled {
        metric: &'static str,
        min: f64,
        max: f64,
    },
    /// Inverse rescale: lower raw values score higher.
    InverseScaled {
        metric: &'static str,
        min: f64,
        max: f64,
    },
    /// numerator / denominator * 100; a zero denominator is neutral (50).
    Ratio {
        numerator: &'static str,
        denominator: &'static str,
    },
    /// Fixed neutral midpoint; used where a category has no signal.
    Neutral,
}

impl DimensionRule {
    /// Metric classification for the normalized row this rule produces
    pub fn metric_type(&self) -> MetricType {
        match self {
            Self::Scaled { .. } => MetricType::Count,
            Self::InverseScaled { .. } => MetricType::Average,
            Self::Ratio { .. } => MetricType::Percentage,
            Self::Neutral => MetricType::Count,
        }
    }

    /// Raw metric driving this rule, if any
    pub fn source_metric(&self) -> Option<&'static str> {
        match self {
            Self::Scaled { metric, .. } | Self::InverseScaled { metric, .. } => Some(metric),
            Self::Ratio { numerator, .. } => Some(numerator),
            Self::Neutral => None,
        }
    }
}

/// Base contribution weights per dimension, before adaptive adjustment.
/// Each profile's weights sum to 1.
#[derive(Debug, Clone, Copy)]
pub struct DimensionWeights {
    pub activity: f64,
    pub participation: f64,
    pub responsiveness: f64,
    pub throughput: f64,
}

impl DimensionWeights {
    pub const EVEN: Self = Self {
        activity: 0.25,
        participation: 0.25,
        responsiveness: 0.25,
        throughput: 0.25,
    };

    pub fn get(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Activity => self.activity,
            Dimension::Participation => self.participation,
            Dimension::Responsiveness => self.responsiveness,
            Dimension::Throughput => self.throughput,
        }
    }
}

/// Complete extraction and scoring rule set for one category
#[derive(Debug, Clone, Copy)]
pub struct CategoryProfile {
    pub category: ServiceCategory,
    /// Canonical raw metrics with their metadata aliases
    pub metrics: &'static [MetricSpec],
    pub activity: DimensionRule,
    pub participation: DimensionRule,
    pub responsiveness: DimensionRule,
    pub throughput: DimensionRule,
    pub base_weights: DimensionWeights,
}

impl CategoryProfile {
    pub fn rule(&self, dim: Dimension) -> &DimensionRule {
        match dim {
            Dimension::Activity => &self.activity,
            Dimension::Participation => &self.participation,
            Dimension::Responsiveness => &self.responsiveness,
            Dimension::Throughput => &self.throughput,
        }
    }
}

// ============================================================================
// Profile tables
// ============================================================================

const COMMUNICATION_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "message_count",
        aliases: &["messages_sent", "msg_count"],
    },
    MetricSpec {
        name: "active_channels",
        aliases: &["channel_count", "room_count"],
    },
    MetricSpec {
        name: "reply_count",
        aliases: &["replies", "thread_reply_count"],
    },
    MetricSpec {
        name: "mention_count",
        aliases: &["mentions"],
    },
    MetricSpec {
        name: "avg_response_minutes",
        aliases: &["avg_response_time", "avg_reply_minutes"],
    },
];

const MEETINGS_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "meeting_count",
        aliases: &["event_count", "calendar_event_count"],
    },
    MetricSpec {
        name: "total_minutes",
        aliases: &["duration_minutes", "meeting_minutes"],
    },
    MetricSpec {
        name: "participant_count",
        aliases: &["attendee_count"],
    },
    MetricSpec {
        name: "organized_count",
        aliases: &["hosted_count"],
    },
    MetricSpec {
        name: "declined_count",
        aliases: &["declines"],
    },
];

const PROJECT_MANAGEMENT_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "task_count",
        aliases: &["issue_count", "item_count", "card_count"],
    },
    MetricSpec {
        name: "completed_count",
        aliases: &["done_count", "closed_count"],
    },
    MetricSpec {
        name: "overdue_count",
        aliases: &["late_count"],
    },
    MetricSpec {
        name: "backlog_count",
        aliases: &["open_count", "todo_count"],
    },
    MetricSpec {
        name: "comment_count",
        aliases: &["comments"],
    },
];

const ENGINEERING_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "commit_count",
        aliases: &["push_count", "commits"],
    },
    MetricSpec {
        name: "pr_count",
        aliases: &["pull_request_count", "mr_count"],
    },
    MetricSpec {
        name: "review_count",
        aliases: &["reviews"],
    },
    MetricSpec {
        name: "merged_count",
        aliases: &["merge_count"],
    },
    MetricSpec {
        name: "build_failure_count",
        aliases: &["failed_build_count", "ci_failure_count"],
    },
];

const DOCUMENTATION_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "doc_count",
        aliases: &["page_count", "note_count"],
    },
    MetricSpec {
        name: "edit_count",
        aliases: &["revision_count", "edits"],
    },
    MetricSpec {
        name: "comment_count",
        aliases: &["comments"],
    },
    MetricSpec {
        name: "published_count",
        aliases: &["shared_count"],
    },
    MetricSpec {
        name: "stale_doc_count",
        aliases: &["outdated_count"],
    },
];

const SUPPORT_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "ticket_count",
        aliases: &["case_count", "conversation_count"],
    },
    MetricSpec {
        name: "resolved_count",
        aliases: &["closed_count", "solved_count"],
    },
    MetricSpec {
        name: "reopened_count",
        aliases: &["reopens"],
    },
    MetricSpec {
        name: "interaction_count",
        aliases: &["reply_count", "touch_count"],
    },
    MetricSpec {
        name: "avg_first_response_minutes",
        aliases: &["avg_response_time", "first_response_minutes"],
    },
];

const DESIGN_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "file_count",
        aliases: &["design_count", "project_file_count"],
    },
    MetricSpec {
        name: "version_count",
        aliases: &["iteration_count", "revision_count"],
    },
    MetricSpec {
        name: "comment_count",
        aliases: &["comments", "annotation_count"],
    },
    MetricSpec {
        name: "shared_count",
        aliases: &["share_count"],
    },
    MetricSpec {
        name: "prototype_count",
        aliases: &["prototypes"],
    },
];

const DATA_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "query_count",
        aliases: &["queries", "run_count"],
    },
    MetricSpec {
        name: "dashboard_count",
        aliases: &["report_count", "chart_count"],
    },
    MetricSpec {
        name: "failed_query_count",
        aliases: &["query_failure_count"],
    },
    MetricSpec {
        name: "export_count",
        aliases: &["exports", "download_count"],
    },
    MetricSpec {
        name: "alert_count",
        aliases: &["alerts"],
    },
];

const FINANCIAL_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "invoice_count",
        aliases: &["transaction_count", "bill_count"],
    },
    MetricSpec {
        name: "paid_count",
        aliases: &["settled_count"],
    },
    MetricSpec {
        name: "overdue_invoice_count",
        aliases: &["overdue_count"],
    },
    MetricSpec {
        name: "expense_count",
        aliases: &["expenses"],
    },
    MetricSpec {
        name: "report_count",
        aliases: &["statement_count"],
    },
];

const CRM_METRICS: &[MetricSpec] = &[
    MetricSpec {
        name: "contact_count",
        aliases: &["lead_count"],
    },
    MetricSpec {
        name: "deal_count",
        aliases: &["opportunity_count"],
    },
    MetricSpec {
        name: "won_count",
        aliases: &["closed_won_count"],
    },
    MetricSpec {
        name: "touch_count",
        aliases: &["activity_count", "interaction_count"],
    },
    MetricSpec {
        name: "stale_deal_count",
        aliases: &["idle_deal_count"],
    },
];

const GENERAL_METRICS: &[MetricSpec] = &[MetricSpec {
    name: "event_count",
    aliases: &[],
}];

impl ServiceCategory {
    /// Static scoring profile for this category
    pub fn profile(&self) -> CategoryProfile {
        match self {
            Self::Communication => CategoryProfile {
                category: *self,
                metrics: COMMUNICATION_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "message_count",
                    min: 0.0,
                    max: 1000.0,
                },
                participation: DimensionRule::Scaled {
                    metric: "active_channels",
                    min: 0.0,
                    max: 50.0,
                },
                responsiveness: DimensionRule::InverseScaled {
                    metric: "avg_response_minutes",
                    min: 0.0,
                    max: 240.0,
                },
                throughput: DimensionRule::Ratio {
                    numerator: "reply_count",
                    denominator: "message_count",
                },
                base_weights: DimensionWeights {
                    activity: 0.3,
                    participation: 0.3,
                    responsiveness: 0.25,
                    throughput: 0.15,
                },
            },
            Self::Meetings => CategoryProfile {
                category: *self,
                metrics: MEETINGS_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "meeting_count",
                    min: 0.0,
                    max: 40.0,
                },
                participation: DimensionRule::Scaled {
                    metric: "participant_count",
                    min: 0.0,
                    max: 100.0,
                },
                responsiveness: DimensionRule::InverseScaled {
                    metric: "declined_count",
                    min: 0.0,
                    max: 20.0,
                },
                throughput: DimensionRule::Ratio {
                    numerator: "organized_count",
                    denominator: "meeting_count",
                },
                base_weights: DimensionWeights {
                    activity: 0.35,
                    participation: 0.3,
                    responsiveness: 0.2,
                    throughput: 0.15,
                },
            },
            Self::ProjectManagement => CategoryProfile {
                category: *self,
                metrics: PROJECT_MANAGEMENT_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "task_count",
                    min: 0.0,
                    max: 200.0,
                },
                participation: DimensionRule::Scaled {
                    metric: "comment_count",
                    min: 0.0,
                    max: 300.0,
                },
                responsiveness: DimensionRule::InverseScaled {
                    metric: "overdue_count",
                    min: 0.0,
                    max: 50.0,
                },
                throughput: DimensionRule::Ratio {
                    numerator: "completed_count",
                    denominator: "task_count",
                },
                base_weights: DimensionWeights {
                    activity: 0.25,
                    participation: 0.2,
                    responsiveness: 0.25,
                    throughput: 0.3,
                },
            },
            Self::Engineering => CategoryProfile {
                category: *self,
                metrics: ENGINEERING_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "commit_count",
                    min: 0.0,
                    max: 150.0,
                },
                participation: DimensionRule::Scaled {
                    metric: "review_count",
                    min: 0.0,
                    max: 60.0,
                },
                responsiveness: DimensionRule::InverseScaled {
                    metric: "build_failure_count",
                    min: 0.0,
                    max: 25.0,
                },
                throughput: DimensionRule::Ratio {
                    numerator: "merged_count",
                    denominator: "pr_count",
                },
                base_weights: DimensionWeights {
                    activity: 0.3,
                    participation: 0.25,
                    responsiveness: 0.15,
                    throughput: 0.3,
                },
            },
            Self::Documentation => CategoryProfile {
                category: *self,
                metrics: DOCUMENTATION_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "edit_count",
                    min: 0.0,
                    max: 120.0,
                },
                participation: DimensionRule::Scaled {
                    metric: "comment_count",
                    min: 0.0,
                    max: 80.0,
                },
                responsiveness: DimensionRule::InverseScaled {
                    metric: "stale_doc_count",
                    min: 0.0,
                    max: 40.0,
                },
                throughput: DimensionRule::Ratio {
                    numerator: "published_count",
                    denominator: "doc_count",
                },
                base_weights: DimensionWeights {
                    activity: 0.35,
                    participation: 0.25,
                    responsiveness: 0.15,
                    throughput: 0.25,
                },
            },
            Self::Support => CategoryProfile {
                category: *self,
                metrics: SUPPORT_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "ticket_count",
                    min: 0.0,
                    max: 250.0,
                },
                participation: DimensionRule::Scaled {
                    metric: "interaction_count",
                    min: 0.0,
                    max: 400.0,
                },
                responsiveness: DimensionRule::InverseScaled {
                    metric: "avg_first_response_minutes",
                    min: 0.0,
                    max: 480.0,
                },
                throughput: DimensionRule::Ratio {
                    numerator: "resolved_count",
                    denominator: "ticket_count",
                },
                base_weights: DimensionWeights {
                    activity: 0.2,
                    participation: 0.2,
                    responsiveness: 0.3,
                    throughput: 0.3,
                },
            },
            Self::Design => CategoryProfile {
                category: *self,
                metrics: DESIGN_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "version_count",
                    min: 0.0,
                    max: 100.0,
                },
                participation: DimensionRule::Scaled {
                    metric: "comment_count",
                    min: 0.0,
                    max: 150.0,
                },
                responsiveness: DimensionRule::Scaled {
                    metric: "shared_count",
                    min: 0.0,
                    max: 40.0,
                },
                throughput: DimensionRule::Ratio {
                    numerator: "prototype_count",
                    denominator: "file_count",
                },
                base_weights: DimensionWeights {
                    activity: 0.3,
                    participation: 0.3,
                    responsiveness: 0.2,
                    throughput: 0.2,
                },
            },
            Self::Data => CategoryProfile {
                category: *self,
                metrics: DATA_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "query_count",
                    min: 0.0,
                    max: 500.0,
                },
                participation: DimensionRule::Scaled {
                    metric: "dashboard_count",
                    min: 0.0,
                    max: 40.0,
                },
                responsiveness: DimensionRule::InverseScaled {
                    metric: "failed_query_count",
                    min: 0.0,
                    max: 50.0,
                },
                throughput: DimensionRule::Ratio {
                    numerator: "export_count",
                    denominator: "query_count",
                },
                base_weights: DimensionWeights {
                    activity: 0.35,
                    participation: 0.25,
                    responsiveness: 0.25,
                    throughput: 0.15,
                },
            },
            Self::Financial => CategoryProfile {
                category: *self,
                metrics: FINANCIAL_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "invoice_count",
                    min: 0.0,
                    max: 120.0,
                },
                participation: DimensionRule::Scaled {
                    metric: "report_count",
                    min: 0.0,
                    max: 30.0,
                },
                responsiveness: DimensionRule::InverseScaled {
                    metric: "overdue_invoice_count",
                    min: 0.0,
                    max: 25.0,
                },
                throughput: DimensionRule::Ratio {
                    numerator: "paid_count",
                    denominator: "invoice_count",
                },
                base_weights: DimensionWeights {
                    activity: 0.25,
                    participation: 0.15,
                    responsiveness: 0.3,
                    throughput: 0.3,
                },
            },
            Self::Crm => CategoryProfile {
                category: *self,
                metrics: CRM_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "touch_count",
                    min: 0.0,
                    max: 300.0,
                },
                participation: DimensionRule::Scaled {
                    metric: "contact_count",
                    min: 0.0,
                    max: 200.0,
                },
                responsiveness: DimensionRule::InverseScaled {
                    metric: "stale_deal_count",
                    min: 0.0,
                    max: 30.0,
                },
                throughput: DimensionRule::Ratio {
                    numerator: "won_count",
                    denominator: "deal_count",
                },
                base_weights: DimensionWeights {
                    activity: 0.3,
                    participation: 0.25,
                    responsiveness: 0.2,
                    throughput: 0.25,
                },
            },
            Self::General => CategoryProfile {
                category: *self,
                metrics: GENERAL_METRICS,
                activity: DimensionRule::Scaled {
                    metric: "event_count",
                    min: 0.0,
                    max: 100.0,
                },
                participation: DimensionRule::Neutral,
                responsiveness: DimensionRule::Neutral,
                throughput: DimensionRule::Neutral,
                base_weights: DimensionWeights::EVEN,
            },
        }
    }
}
