// Test double for the CRM.
//
// MockCrm (LeadSource) serves a fixed tag catalog and per-page lead lists,
// records every page request, and can be told to fail. Pages that were never
// registered come back empty, which is how pagination ends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use kommo_client::{KommoError, Lead, Tag};

use crate::config::PAGE_SIZE;
use crate::filter::FilterRange;
use crate::source::LeadSource;

/// One observed `leads_page` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub range: Option<FilterRange>,
}

#[derive(Default)]
pub struct MockCrm {
    catalog: Vec<Tag>,
    pages: HashMap<u32, Vec<Lead>>,
    fail_tags: bool,
    fail_leads_on: Option<u32>,
    requests: Mutex<Vec<PageRequest>>,
    tag_calls: AtomicUsize,
}

impl MockCrm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.catalog = tags;
        self
    }

    pub fn with_page(mut self, page: u32, leads: Vec<Lead>) -> Self {
        self.pages.insert(page, leads);
        self
    }

    /// Split `leads` into pages of the default page size, starting at page 1.
    pub fn with_leads(mut self, leads: Vec<Lead>) -> Self {
        self.pages.clear();
        for (i, chunk) in leads.chunks(PAGE_SIZE as usize).enumerate() {
            self.pages.insert(i as u32 + 1, chunk.to_vec());
        }
        self
    }

    /// Tag catalog calls answer 401.
    pub fn failing_tags(mut self) -> Self {
        self.fail_tags = true;
        self
    }

    /// The given lead page times out.
    pub fn failing_leads_on(mut self, page: u32) -> Self {
        self.fail_leads_on = Some(page);
        self
    }

    pub fn page_requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.page_requests().into_iter().map(|r| r.page).collect()
    }

    pub fn tag_calls(&self) -> usize {
        self.tag_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeadSource for MockCrm {
    async fn tags(&self) -> kommo_client::Result<Vec<Tag>> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_tags {
            return Err(KommoError::Api {
                status: 401,
                message: "Unauthorized".to_string(),
            });
        }
        Ok(self.catalog.clone())
    }

    async fn leads_page(
        &self,
        page: u32,
        limit: u32,
        range: Option<FilterRange>,
    ) -> kommo_client::Result<Vec<Lead>> {
        self.requests
            .lock()
            .unwrap()
            .push(PageRequest { page, limit, range });

        if self.fail_leads_on == Some(page) {
            return Err(KommoError::Network("operation timed out".to_string()));
        }
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

pub fn tag(id: i64, name: &str) -> Tag {
    Tag {
        id,
        name: name.to_string(),
        color: None,
    }
}

pub fn lead(id: i64, tag_ids: &[i64]) -> Lead {
    Lead::with_tags(id, tag_ids.iter().copied())
}

/// `count` leads with consecutive ids from `first_id`, all carrying `tag_ids`.
pub fn lead_run(first_id: i64, count: usize, tag_ids: &[i64]) -> Vec<Lead> {
    (0..count as i64)
        .map(|i| lead(first_id + i, tag_ids))
        .collect()
}
