use std::collections::HashMap;

use kommo_client::Lead;

/// Distinct-lead counts per tag id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCounts {
    pub per_tag: HashMap<i64, u64>,
    /// Leads carrying at least one tag. Untagged leads are not counted.
    pub tagged_leads: u64,
}

impl TagCounts {
    pub fn get(&self, tag_id: i64) -> u64 {
        self.per_tag.get(&tag_id).copied().unwrap_or(0)
    }
}

/// A lead adds at most 1 to any tag, even if upstream repeats a tag id on it.
pub fn count_tags(leads: &[Lead]) -> TagCounts {
    let mut counts = TagCounts::default();

    for lead in leads {
        let tag_ids = lead.tag_ids();
        if tag_ids.is_empty() {
            continue;
        }
        counts.tagged_leads += 1;
        for id in tag_ids {
            *counts.per_tag.entry(id).or_insert(0) += 1;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_leads_are_not_counted() {
        let leads = vec![
            Lead::with_tags(1, [1]),
            Lead::with_tags(2, []),
            Lead::with_tags(3, [1, 2]),
        ];
        let counts = count_tags(&leads);
        assert_eq!(counts.tagged_leads, 2);
        assert_eq!(counts.get(1), 2);
        assert_eq!(counts.get(2), 1);
        assert_eq!(counts.get(99), 0);
    }

    #[test]
    fn repeated_tag_on_one_lead_counts_once() {
        let counts = count_tags(&[Lead::with_tags(1, [7, 7, 7])]);
        assert_eq!(counts.get(7), 1);
        assert_eq!(counts.tagged_leads, 1);
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(count_tags(&[]), TagCounts::default());
    }
}
