use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// --- Tags ---

/// A lead tag from the account's tag catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Tag reference embedded in a lead. Kommo sends name/color here too, but only
/// the id is authoritative; the catalog owns the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedTag {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

// --- Leads ---

/// A single lead as returned by `GET /api/v4/leads?with=tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(rename = "_embedded", default)]
    pub embedded: LeadEmbedded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadEmbedded {
    #[serde(default)]
    pub tags: Vec<EmbeddedTag>,
}

impl Lead {
    /// Build a lead carrying only ids. Mostly useful for fixtures.
    pub fn with_tags(id: i64, tag_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            id,
            name: None,
            created_at: None,
            embedded: LeadEmbedded {
                tags: tag_ids
                    .into_iter()
                    .map(|id| EmbeddedTag {
                        id,
                        name: None,
                        color: None,
                    })
                    .collect(),
            },
        }
    }

    /// Distinct tag ids attached to this lead.
    pub fn tag_ids(&self) -> BTreeSet<i64> {
        self.embedded.tags.iter().map(|t| t.id).collect()
    }
}

// --- Queries ---

/// `filter[created_at]` bounds, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedAtFilter {
    pub from: i64,
    pub to: i64,
}

/// One page request against the leads endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadsPageQuery {
    pub page: u32,
    pub limit: u32,
    pub created_at: Option<CreatedAtFilter>,
}

impl LeadsPageQuery {
    /// Query-string pairs in the order Kommo documents them.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("with", "tags".to_string()),
            ("limit", self.limit.to_string()),
            ("page", self.page.to_string()),
        ];
        if let Some(range) = self.created_at {
            pairs.push(("filter[created_at][from]", range.from.to_string()));
            pairs.push(("filter[created_at][to]", range.to.to_string()));
        }
        pairs
    }
}

// --- Response envelopes ---

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(rename = "_embedded")]
    pub embedded: Option<TagsEmbedded>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TagsEmbedded {
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LeadsResponse {
    #[serde(rename = "_embedded")]
    pub embedded: Option<LeadsEmbedded>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LeadsEmbedded {
    #[serde(default)]
    pub leads: Vec<Lead>,
}
