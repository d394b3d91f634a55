use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::counter::TagCounts;
use crate::ranker::{AggregatedTag, RankedTags};

/// Ranked tag usage for one time window, ready for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStatistics {
    pub total_tags: usize,
    pub total_leads: u64,
    pub tags: Vec<AggregatedTag>,
    pub others_count: u64,
    pub generated_at: DateTime<Utc>,
}

impl TagStatistics {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.others_count == 0
    }
}

pub fn assemble(
    ranked: RankedTags,
    counts: &TagCounts,
    generated_at: DateTime<Utc>,
) -> TagStatistics {
    TagStatistics {
        total_tags: ranked.total_tags,
        total_leads: counts.tagged_leads,
        tags: ranked.top,
        others_count: ranked.others_count,
        generated_at,
    }
}
