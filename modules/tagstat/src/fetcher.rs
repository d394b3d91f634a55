//! Catalog and lead retrieval.
//!
//! Lead pages are addressed by page number, so they are pulled strictly in
//! order: whether page `n + 1` exists depends on page `n` coming back full.

use kommo_client::{Lead, Tag};
use tracing::{debug, info};

use crate::error::{Result, TagStatsError};
use crate::filter::FilterRange;
use crate::source::LeadSource;

/// Lazy, finite sequence of lead pages. Ends after the first short page.
pub struct LeadPages<'a, S: ?Sized> {
    source: &'a S,
    page_size: u32,
    range: Option<FilterRange>,
    next_page: u32,
    exhausted: bool,
}

impl<'a, S: LeadSource + ?Sized> LeadPages<'a, S> {
    pub fn new(source: &'a S, page_size: u32, range: Option<FilterRange>) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            range,
            next_page: 1,
            exhausted: false,
        }
    }

    /// Fetch the next page, or `None` once the upstream has run dry.
    pub async fn next_page(&mut self) -> kommo_client::Result<Option<Vec<Lead>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self.next_page;
        let leads = self
            .source
            .leads_page(page, self.page_size, self.range)
            .await?;
        debug!(page, count = leads.len(), "Lead page received");

        self.next_page += 1;
        if leads.len() < self.page_size as usize {
            self.exhausted = true;
        }
        Ok(Some(leads))
    }

    /// Rewind to page 1.
    pub fn restart(&mut self) {
        self.next_page = 1;
        self.exhausted = false;
    }

    /// Number of pages requested since the last restart.
    pub fn pages_requested(&self) -> u32 {
        self.next_page - 1
    }
}

pub async fn fetch_tag_catalog<S: LeadSource + ?Sized>(source: &S) -> Result<Vec<Tag>> {
    let tags = source
        .tags()
        .await
        .map_err(TagStatsError::upstream("fetching tag catalog"))?;
    info!(count = tags.len(), "Fetched tag catalog");
    Ok(tags)
}

/// Drain lead pages until a short page or until at least `cap` leads are held.
/// The cap is checked between pages, so the result may exceed it by up to one
/// page.
pub async fn fetch_leads<S: LeadSource + ?Sized>(
    source: &S,
    page_size: u32,
    cap: usize,
    range: Option<FilterRange>,
) -> Result<Vec<Lead>> {
    let mut pages = LeadPages::new(source, page_size, range);
    let mut leads = Vec::new();

    while leads.len() < cap {
        match pages
            .next_page()
            .await
            .map_err(TagStatsError::upstream("fetching leads"))?
        {
            Some(page) => leads.extend(page),
            None => break,
        }
    }

    info!(
        count = leads.len(),
        pages = pages.pages_requested(),
        "Fetched leads"
    );
    Ok(leads)
}
