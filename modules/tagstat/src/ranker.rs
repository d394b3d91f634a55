use std::collections::HashSet;

use kommo_client::Tag;
use serde::{Deserialize, Serialize};

use crate::counter::TagCounts;

/// A catalog tag joined with its lead count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedTag {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub lead_count: u64,
    pub percentage: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedTags {
    /// Top entries, descending by lead count, ties by ascending id.
    pub top: Vec<AggregatedTag>,
    /// Summed lead counts of every ranked tag past the top cut.
    pub others_count: u64,
    /// Catalog tags with at least one lead.
    pub total_tags: usize,
}

/// `round(count / total * 100)`, half rounded up; 0 when `total` is 0.
/// Each tag is rounded on its own, so a set of percentages need not sum to 100.
pub fn percentage(count: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (count.saturating_mul(200) + total) / (total * 2);
    rounded.min(100) as u8
}

pub fn rank_tags(catalog: &[Tag], counts: &TagCounts, top_n: usize) -> RankedTags {
    let mut seen = HashSet::new();
    let mut ranked: Vec<AggregatedTag> = catalog
        .iter()
        .filter(|tag| seen.insert(tag.id))
        .filter_map(|tag| {
            let lead_count = counts.get(tag.id);
            (lead_count > 0).then(|| AggregatedTag {
                id: tag.id,
                name: tag.name.clone(),
                color: tag.color.clone(),
                lead_count,
                percentage: percentage(lead_count, counts.tagged_leads),
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.lead_count.cmp(&a.lead_count).then(a.id.cmp(&b.id)));

    let total_tags = ranked.len();
    let rest = ranked.split_off(top_n.min(total_tags));
    let others_count = rest.iter().map(|t| t.lead_count).sum();

    RankedTags {
        top: ranked,
        others_count,
        total_tags,
    }
}
