// LeadSource: the upstream seam for tag statistics.
//
// KommoClient is the production implementation; tests swap in MockCrm so the
// aggregation runs without network.

use async_trait::async_trait;
use kommo_client::{KommoClient, Lead, LeadsPageQuery, Tag};

use crate::filter::FilterRange;

#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Full catalog of active lead tags.
    async fn tags(&self) -> kommo_client::Result<Vec<Tag>>;

    /// One page of leads (1-based), tags embedded, optionally restricted by
    /// creation time.
    async fn leads_page(
        &self,
        page: u32,
        limit: u32,
        range: Option<FilterRange>,
    ) -> kommo_client::Result<Vec<Lead>>;
}

#[async_trait]
impl LeadSource for KommoClient {
    async fn tags(&self) -> kommo_client::Result<Vec<Tag>> {
        KommoClient::tags(self).await
    }

    async fn leads_page(
        &self,
        page: u32,
        limit: u32,
        range: Option<FilterRange>,
    ) -> kommo_client::Result<Vec<Lead>> {
        let query = LeadsPageQuery {
            page,
            limit,
            created_at: range.map(Into::into),
        };
        KommoClient::leads_page(self, &query).await
    }
}
