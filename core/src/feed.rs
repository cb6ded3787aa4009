//! Paginated item feed.
//!
//! # Design
//! Requests are tagged with a `PageTicket` carrying the page index and the
//! feed generation it was issued under. Only the single in-flight ticket of
//! the current generation may append: a second scroll trigger while a page
//! is loading gets no ticket, and a response that arrives after `refresh`
//! belongs to an older generation and is dropped.

use tracing::{debug, warn};

use crate::client::PAGE_SIZE;
use crate::types::Item;

/// Position within the last loaded page that triggers loading the next one.
pub const PREFETCH_INDEX: usize = 17;

/// Proof that a page fetch was issued by this feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub page: u32,
}

/// What `complete` did with a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedUpdate {
    Appended { page: u32, count: usize },
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct ItemFeed {
    items: Vec<Item>,
    next_page: u32,
    generation: u64,
    in_flight: Option<PageTicket>,
}

impl ItemFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the page the next fetch will request; also the number of
    /// pages loaded so far in this generation.
    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Issue a ticket for the next page, or `None` while one is in flight.
    pub fn begin_fetch(&mut self) -> Option<PageTicket> {
        if let Some(pending) = self.in_flight {
            debug!(page = pending.page, "page fetch already in flight");
            return None;
        }
        let ticket = PageTicket {
            generation: self.generation,
            page: self.next_page,
        };
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    pub fn complete(&mut self, ticket: PageTicket, items: Vec<Item>) -> FeedUpdate {
        if self.in_flight != Some(ticket) {
            warn!(
                page = ticket.page,
                generation = ticket.generation,
                current = self.generation,
                "discarding stale page"
            );
            return FeedUpdate::Stale;
        }
        self.in_flight = None;
        let count = items.len();
        self.items.extend(items);
        self.next_page += 1;
        debug!(page = ticket.page, count, total = self.items.len(), "page appended");
        FeedUpdate::Appended {
            page: ticket.page,
            count,
        }
    }

    /// Release the guard after a failed fetch. Returns false for a stale
    /// ticket, which leaves the feed untouched.
    pub fn fail(&mut self, ticket: PageTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Drop everything and start over from page 0. Any request issued
    /// before this call is now stale.
    pub fn refresh(&mut self) -> PageTicket {
        self.generation += 1;
        self.items.clear();
        self.next_page = 0;
        debug!(generation = self.generation, "feed reset");
        let ticket = PageTicket {
            generation: self.generation,
            page: 0,
        };
        self.in_flight = Some(ticket);
        ticket
    }

    /// True when the row at `index` is the trigger row of the last loaded
    /// page and nothing is loading.
    pub fn should_load_more(&self, index: usize) -> bool {
        if self.in_flight.is_some() || self.next_page == 0 {
            return false;
        }
        let page_size = PAGE_SIZE as usize;
        index % page_size == PREFETCH_INDEX && index / page_size == self.next_page as usize - 1
    }
}
