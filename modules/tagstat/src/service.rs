use chrono::{DateTime, Utc};
use kommo_client::{Lead, Tag};
use tracing::{debug, info};

use crate::config::StatsLimits;
use crate::counter::count_tags;
use crate::error::Result;
use crate::fetcher::{fetch_leads, fetch_tag_catalog};
use crate::filter::{FilterParams, LeadFilter};
use crate::ranker::rank_tags;
use crate::source::LeadSource;
use crate::statistics::{assemble, TagStatistics};

/// Stateless entry point for tag statistics. Every call pulls fresh data; no
/// results are cached between calls.
pub struct TagStatsService<S> {
    source: S,
    limits: StatsLimits,
}

impl<S: LeadSource> TagStatsService<S> {
    pub fn new(source: S) -> Self {
        Self::with_limits(source, StatsLimits::default())
    }

    pub fn with_limits(source: S, limits: StatsLimits) -> Self {
        Self { source, limits }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn limits(&self) -> StatsLimits {
        self.limits
    }

    pub async fn compute_statistics(&self, params: &FilterParams) -> Result<TagStatistics> {
        self.compute_statistics_at(params, Utc::now()).await
    }

    /// Same as [`compute_statistics`](Self::compute_statistics) with relative
    /// periods anchored at `now`.
    pub async fn compute_statistics_at(
        &self,
        params: &FilterParams,
        now: DateTime<Utc>,
    ) -> Result<TagStatistics> {
        let filter = LeadFilter::from_params(params);
        let range = filter.range(now);
        debug!(?filter, ?range, lead_type = ?params.lead_type, "Resolved lead filter");

        let (catalog, leads) = tokio::try_join!(
            fetch_tag_catalog(&self.source),
            fetch_leads(
                &self.source,
                self.limits.page_size,
                self.limits.lead_cap,
                range
            )
        )?;

        let counts = count_tags(&leads);
        let ranked = rank_tags(&catalog, &counts, self.limits.top_n);
        let stats = assemble(ranked, &counts, Utc::now());

        info!(
            catalog = catalog.len(),
            leads = leads.len(),
            total_tags = stats.total_tags,
            total_leads = stats.total_leads,
            others_count = stats.others_count,
            "Computed tag statistics"
        );
        Ok(stats)
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        fetch_tag_catalog(&self.source).await
    }

    /// Case-insensitive substring match on tag name. An empty query matches all.
    pub async fn search_tags(&self, query: &str) -> Result<Vec<Tag>> {
        let needle = query.trim().to_lowercase();
        let tags = fetch_tag_catalog(&self.source).await?;
        Ok(tags
            .into_iter()
            .filter(|tag| tag.name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Unfiltered lead pull, capped at `limit` (page granularity).
    pub async fn list_leads(&self, limit: usize) -> Result<Vec<Lead>> {
        fetch_leads(&self.source, self.limits.page_size, limit, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{lead, lead_run, tag, MockCrm};

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let crm = MockCrm::new().with_tags(vec![
            tag(1, "VIP Client"),
            tag(2, "cold"),
            tag(3, "Vipassana"),
        ]);
        let service = TagStatsService::new(crm);

        let hits = service.search_tags("vip").await.unwrap();
        assert_eq!(hits.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);

        let all = service.search_tags("").await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn list_leads_uses_caller_limit_without_filter() {
        let crm = MockCrm::new().with_leads(lead_run(1, 200, &[1]));
        let service = TagStatsService::new(crm);

        let leads = service.list_leads(60).await.unwrap();
        assert_eq!(leads.len(), 100);
        assert!(service.source().page_requests().iter().all(|r| r.range.is_none()));
    }

    #[tokio::test]
    async fn untagged_leads_do_not_enter_denominator() {
        let crm = MockCrm::new()
            .with_tags(vec![tag(1, "VIP")])
            .with_leads(vec![lead(1, &[1]), lead(2, &[]), lead(3, &[]), lead(4, &[1])]);
        let stats = TagStatsService::new(crm)
            .compute_statistics(&FilterParams::default())
            .await
            .unwrap();

        assert_eq!(stats.total_leads, 2);
        assert_eq!(stats.tags[0].percentage, 100);
    }

    #[tokio::test]
    async fn custom_limits_change_top_cut() {
        let crm = MockCrm::new()
            .with_tags(vec![tag(1, "A"), tag(2, "B"), tag(3, "C")])
            .with_leads(vec![lead(1, &[1, 2, 3]), lead(2, &[1, 2]), lead(3, &[1])]);
        let limits = StatsLimits {
            top_n: 1,
            ..StatsLimits::default()
        };
        let stats = TagStatsService::with_limits(crm, limits)
            .compute_statistics(&FilterParams::default())
            .await
            .unwrap();

        assert_eq!(stats.tags.len(), 1);
        assert_eq!(stats.tags[0].id, 1);
        assert_eq!(stats.others_count, 3);
        assert_eq!(stats.total_tags, 3);
    }
}
