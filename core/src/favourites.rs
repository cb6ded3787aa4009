//! Client-side favourite bookkeeping.
//!
//! `FavouriteMap` answers "is this item liked, and under which favourite id"
//! for the feed. It is fed by two independent fetches: the favourites list
//! (bulk, via `merge`) and individual create/delete round-trips. The delete
//! endpoint takes the favourite id, so an entry is only useful if it carries
//! one; records without it are never stored.
//!
//! `FavouriteList` is the favourites screen's own collection.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::types::{Favourite, Item};

/// Item identifier → favourite identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavouriteMap {
    entries: HashMap<String, i64>,
}

impl FavouriteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every favourite that has both an item id and a favourite id.
    /// Existing entries for other items are kept. Returns how many records
    /// were applied.
    pub fn merge(&mut self, favourites: &[Favourite]) -> usize {
        let mut applied = 0;
        for favourite in favourites {
            if let (Some(item_id), Some(favourite_id)) = (favourite.image_id.as_deref(), favourite.id) {
                if self.mark_liked(item_id, favourite_id) {
                    applied += 1;
                    continue;
                }
            }
            debug!(favourite_id = ?favourite.id, "skipping favourite without both ids");
        }
        applied
    }

    /// Replace the whole map with what `favourites` says.
    pub fn rebuild(&mut self, favourites: &[Favourite]) -> usize {
        self.entries.clear();
        self.merge(favourites)
    }

    /// Record `item_id` as liked under `favourite_id`. An empty item id is
    /// refused and returns false.
    pub fn mark_liked(&mut self, item_id: &str, favourite_id: i64) -> bool {
        if item_id.is_empty() {
            return false;
        }
        self.entries.insert(item_id.to_string(), favourite_id);
        true
    }

    /// Remove the entry and return the favourite id needed to delete it on
    /// the server. `None` means there is nothing to delete.
    pub fn mark_unliked(&mut self, item_id: &str) -> Option<i64> {
        self.entries.remove(item_id)
    }

    /// Drop whichever item is liked under `favourite_id`, for deletions made
    /// outside this map (the favourites screen). Returns that item's id.
    pub fn remove_favourite(&mut self, favourite_id: i64) -> Option<String> {
        let item_id = self
            .entries
            .iter()
            .find(|(_, id)| **id == favourite_id)
            .map(|(item_id, _)| item_id.clone())?;
        self.entries.remove(&item_id);
        Some(item_id)
    }

    pub fn is_favourite(&self, item_id: &str) -> bool {
        self.entries.contains_key(item_id)
    }

    /// An item without an identifier is never a favourite.
    pub fn is_item_favourite(&self, item: &Item) -> bool {
        item.id.as_deref().is_some_and(|id| self.is_favourite(id))
    }

    pub fn favourite_id(&self, item_id: &str) -> Option<i64> {
        self.entries.get(item_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The favourites screen collection, in server order.
#[derive(Debug, Clone, Default)]
pub struct FavouriteList {
    favourites: Vec<Favourite>,
}

impl FavouriteList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn favourites(&self) -> &[Favourite] {
        &self.favourites
    }

    pub fn len(&self) -> usize {
        self.favourites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favourites.is_empty()
    }

    /// Apply a fetch result. On failure the previous contents stay.
    pub fn reload(&mut self, fetched: Result<Vec<Favourite>, ApiError>) -> Result<usize, ApiError> {
        match fetched {
            Ok(favourites) => {
                self.favourites = favourites;
                Ok(self.favourites.len())
            }
            Err(e) => {
                warn!(error = %e, "favourites reload failed, keeping previous list");
                Err(e)
            }
        }
    }

    /// Remove the entry at `index` and hand back the favourite id to delete.
    /// An entry without a favourite id cannot be deleted and is left alone.
    pub fn remove_at(&mut self, index: usize) -> Option<i64> {
        let favourite_id = self.favourites.get(index)?.id?;
        self.favourites.remove(index);
        Some(favourite_id)
    }
}
