//! Like-toggle state machine over a `FavouriteMap`.
//!
//! # Design
//! A tap flips the toggle immediately and returns the request the host
//! should send. The outcome of that request is fed back through
//! `like_resolved` / `unlike_resolved`, which settle the item or reconcile
//! it according to the configured `ReconcileStrategy`. While a request for
//! an item is outstanding, further taps on it are refused.
//!
//! Per item:
//! `Unliked --tap--> PendingLike --ok--> Liked`
//! `Liked --tap--> PendingUnlike --resolved--> Unliked`
//!
//! A delete answered with 404 means the favourite is already gone, so it
//! settles as unliked whatever the strategy. Deletions made elsewhere (the
//! favourites screen) are carried in with `remove_favourite`.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::favourites::FavouriteMap;
use crate::types::{Favourite, PostResult};

/// What to do when a toggle's request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileStrategy {
    /// Put the toggle back where it was before the tap.
    #[default]
    Revert,
    /// Leave the item unliked and ask the caller to refetch favourites and
    /// `resync`.
    Requery,
    /// Leave a failed like showing as liked without a favourite id. A failed
    /// unlike still ends unliked.
    KeepOptimistic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Unliked,
    PendingLike,
    Liked,
    PendingUnlike,
    /// Shown as liked after a failed create; nothing exists server-side.
    Stranded,
}

impl LikeState {
    /// Whether the toggle renders as liked.
    pub fn shows_liked(self) -> bool {
        matches!(self, LikeState::PendingLike | LikeState::Liked | LikeState::Stranded)
    }
}

/// The request a tap asks the host to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleAction {
    Create { item_id: String },
    Delete { item_id: String, favourite_id: i64 },
    /// The toggle flipped locally; there is nothing to send.
    LocalOnly,
    /// A request for this item is still outstanding; the tap was ignored.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Settled,
    Reverted,
    Stranded,
    RequeryNeeded,
    /// No matching request was outstanding; nothing changed.
    Unexpected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Like,
    Unlike(i64),
}

#[derive(Debug, Clone, Default)]
pub struct LikeSync {
    map: FavouriteMap,
    pending: HashMap<String, Pending>,
    stranded: HashSet<String>,
    strategy: ReconcileStrategy,
}

impl LikeSync {
    pub fn new(strategy: ReconcileStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    pub fn strategy(&self) -> ReconcileStrategy {
        self.strategy
    }

    pub fn map(&self) -> &FavouriteMap {
        &self.map
    }

    /// Fold in a fetched favourites list without dropping local entries.
    pub fn merge(&mut self, favourites: &[Favourite]) -> usize {
        let applied = self.map.merge(favourites);
        let map = &self.map;
        self.stranded.retain(|item_id| !map.is_favourite(item_id));
        applied
    }

    /// Adopt the server's list as the whole truth. Outstanding requests stay
    /// outstanding; stranded likes are dropped.
    pub fn resync(&mut self, favourites: &[Favourite]) -> usize {
        self.stranded.clear();
        self.map.rebuild(favourites)
    }

    /// Forget the item liked under `favourite_id` after it was deleted
    /// outside this toggle. Returns that item's id.
    pub fn remove_favourite(&mut self, favourite_id: i64) -> Option<String> {
        let item_id = self.map.remove_favourite(favourite_id)?;
        debug!(item_id, favourite_id, "favourite removed elsewhere");
        Some(item_id)
    }

    pub fn state(&self, item_id: &str) -> LikeState {
        match self.pending.get(item_id) {
            Some(Pending::Like) => LikeState::PendingLike,
            Some(Pending::Unlike(_)) => LikeState::PendingUnlike,
            None if self.stranded.contains(item_id) => LikeState::Stranded,
            None if self.map.is_favourite(item_id) => LikeState::Liked,
            None => LikeState::Unliked,
        }
    }

    pub fn is_liked(&self, item_id: &str) -> bool {
        self.state(item_id).shows_liked()
    }

    pub fn tap(&mut self, item_id: &str) -> ToggleAction {
        match self.state(item_id) {
            LikeState::PendingLike | LikeState::PendingUnlike => ToggleAction::Busy,
            LikeState::Stranded => {
                self.stranded.remove(item_id);
                ToggleAction::LocalOnly
            }
            LikeState::Liked => match self.map.mark_unliked(item_id) {
                Some(favourite_id) => {
                    self.pending.insert(item_id.to_string(), Pending::Unlike(favourite_id));
                    debug!(item_id, favourite_id, "unlike requested");
                    ToggleAction::Delete {
                        item_id: item_id.to_string(),
                        favourite_id,
                    }
                }
                None => ToggleAction::LocalOnly,
            },
            LikeState::Unliked => {
                self.pending.insert(item_id.to_string(), Pending::Like);
                debug!(item_id, "like requested");
                ToggleAction::Create {
                    item_id: item_id.to_string(),
                }
            }
        }
    }

    /// Feed back the outcome of a `Create`. A success without a favourite id
    /// counts as a failure: the map only holds deletable entries.
    pub fn like_resolved(&mut self, item_id: &str, outcome: &Result<PostResult, ApiError>) -> Resolution {
        if self.pending.get(item_id) != Some(&Pending::Like) {
            warn!(item_id, "like outcome without an outstanding like");
            return Resolution::Unexpected;
        }
        self.pending.remove(item_id);

        match outcome {
            Ok(PostResult {
                id: Some(favourite_id),
                ..
            }) if !item_id.is_empty() => {
                self.map.mark_liked(item_id, *favourite_id);
                Resolution::Settled
            }
            Ok(_) => {
                warn!(item_id, "favourite created without a storable id");
                self.reconcile_like(item_id)
            }
            Err(e) => {
                warn!(item_id, error = %e, "favourite creation failed");
                self.reconcile_like(item_id)
            }
        }
    }

    /// Feed back the outcome of a `Delete`.
    pub fn unlike_resolved(&mut self, item_id: &str, outcome: &Result<(), ApiError>) -> Resolution {
        let Some(Pending::Unlike(favourite_id)) = self.pending.get(item_id).copied() else {
            warn!(item_id, "unlike outcome without an outstanding unlike");
            return Resolution::Unexpected;
        };
        self.pending.remove(item_id);

        match outcome {
            Ok(()) => {
                self.map.mark_unliked(item_id);
                Resolution::Settled
            }
            Err(ApiError::BadStatus { status: 404, .. }) => {
                debug!(item_id, favourite_id, "favourite already deleted");
                self.map.mark_unliked(item_id);
                Resolution::Settled
            }
            Err(e) => {
                warn!(item_id, favourite_id, error = %e, "favourite deletion failed");
                match self.strategy {
                    ReconcileStrategy::Revert => {
                        self.map.mark_liked(item_id, favourite_id);
                        Resolution::Reverted
                    }
                    ReconcileStrategy::Requery => Resolution::RequeryNeeded,
                    ReconcileStrategy::KeepOptimistic => Resolution::Settled,
                }
            }
        }
    }

    fn reconcile_like(&mut self, item_id: &str) -> Resolution {
        match self.strategy {
            ReconcileStrategy::Revert => Resolution::Reverted,
            ReconcileStrategy::Requery => Resolution::RequeryNeeded,
            ReconcileStrategy::KeepOptimistic => {
                self.stranded.insert(item_id.to_string());
                Resolution::Stranded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(id: i64) -> Result<PostResult, ApiError> {
        Ok(PostResult {
            message: Some("SUCCESS".into()),
            id: Some(id),
        })
    }

    fn failed() -> ApiError {
        ApiError::BadStatus {
            status: 500,
            body: String::new(),
        }
    }

    fn fav(id: i64, image_id: &str) -> Favourite {
        Favourite {
            id: Some(id),
            image_id: Some(image_id.into()),
            ..Default::default()
        }
    }

    #[test]
    fn like_round_trip() {
        let mut sync = LikeSync::default();
        assert_eq!(
            sync.tap("d9"),
            ToggleAction::Create {
                item_id: "d9".into()
            }
        );
        assert_eq!(sync.state("d9"), LikeState::PendingLike);
        assert!(sync.is_liked("d9"));

        assert_eq!(sync.like_resolved("d9", &created(42)), Resolution::Settled);
        assert_eq!(sync.state("d9"), LikeState::Liked);
        assert_eq!(sync.map().favourite_id("d9"), Some(42));
    }

    #[test]
    fn unlike_uses_known_favourite_id() {
        let mut sync = LikeSync::default();
        sync.merge(&[fav(5, "d3")]);
        assert_eq!(
            sync.tap("d3"),
            ToggleAction::Delete {
                item_id: "d3".into(),
                favourite_id: 5
            }
        );
        assert!(!sync.is_liked("d3"));
        assert_eq!(sync.unlike_resolved("d3", &Ok(())), Resolution::Settled);
        assert_eq!(sync.state("d3"), LikeState::Unliked);
    }

    #[test]
    fn taps_while_pending_are_refused() {
        let mut sync = LikeSync::default();
        sync.tap("d1");
        assert_eq!(sync.tap("d1"), ToggleAction::Busy);
    }

    #[test]
    fn revert_undoes_failed_like() {
        let mut sync = LikeSync::new(ReconcileStrategy::Revert);
        assert_eq!(sync.strategy(), ReconcileStrategy::Revert);
        sync.tap("d1");
        assert_eq!(sync.like_resolved("d1", &Err(failed())), Resolution::Reverted);
        assert_eq!(sync.state("d1"), LikeState::Unliked);
        assert!(sync.map().is_empty());
    }

    #[test]
    fn revert_restores_failed_unlike() {
        let mut sync = LikeSync::new(ReconcileStrategy::Revert);
        sync.merge(&[fav(5, "d3")]);
        sync.tap("d3");
        assert_eq!(sync.unlike_resolved("d3", &Err(failed())), Resolution::Reverted);
        assert_eq!(sync.state("d3"), LikeState::Liked);
        assert_eq!(sync.map().favourite_id("d3"), Some(5));
    }

    #[test]
    fn delete_of_missing_favourite_settles_unliked() {
        let gone = || ApiError::BadStatus {
            status: 404,
            body: "NO_SUCH_FAVOURITE".into(),
        };
        for strategy in [
            ReconcileStrategy::Revert,
            ReconcileStrategy::Requery,
            ReconcileStrategy::KeepOptimistic,
        ] {
            let mut sync = LikeSync::new(strategy);
            sync.merge(&[fav(5, "d3")]);
            sync.tap("d3");
            assert_eq!(sync.unlike_resolved("d3", &Err(gone())), Resolution::Settled);
            assert_eq!(sync.state("d3"), LikeState::Unliked);
            assert_eq!(
                sync.tap("d3"),
                ToggleAction::Create {
                    item_id: "d3".into()
                }
            );
        }
    }

    #[test]
    fn removal_elsewhere_unlikes_item() {
        let mut sync = LikeSync::default();
        sync.tap("d5");
        sync.like_resolved("d5", &created(7));

        assert_eq!(sync.remove_favourite(7), Some("d5".to_string()));
        assert_eq!(sync.remove_favourite(7), None);
        assert_eq!(sync.state("d5"), LikeState::Unliked);
        // a stale server list without the entry keeps it unliked
        sync.merge(&[]);
        assert!(matches!(sync.tap("d5"), ToggleAction::Create { .. }));
    }

    #[test]
    fn empty_item_id_is_never_liked() {
        let mut sync = LikeSync::default();
        sync.tap("");
        assert_eq!(sync.like_resolved("", &created(4)), Resolution::Reverted);
        assert_eq!(sync.state(""), LikeState::Unliked);
        assert!(sync.map().is_empty());
    }

    #[test]
    fn requery_asks_for_resync() {
        let mut sync = LikeSync::new(ReconcileStrategy::Requery);
        sync.tap("d1");
        assert_eq!(sync.like_resolved("d1", &Err(failed())), Resolution::RequeryNeeded);
        assert_eq!(sync.state("d1"), LikeState::Unliked);

        // the server did record it after all
        sync.resync(&[fav(8, "d1")]);
        assert_eq!(sync.state("d1"), LikeState::Liked);
    }

    #[test]
    fn keep_optimistic_strands_failed_like() {
        let mut sync = LikeSync::new(ReconcileStrategy::KeepOptimistic);
        sync.tap("d1");
        assert_eq!(sync.like_resolved("d1", &Err(failed())), Resolution::Stranded);
        assert_eq!(sync.state("d1"), LikeState::Stranded);
        assert!(sync.is_liked("d1"));
        assert!(!sync.map().is_favourite("d1"));

        assert_eq!(sync.tap("d1"), ToggleAction::LocalOnly);
        assert_eq!(sync.state("d1"), LikeState::Unliked);
    }

    #[test]
    fn keep_optimistic_unlike_ends_unliked() {
        let mut sync = LikeSync::new(ReconcileStrategy::KeepOptimistic);
        sync.merge(&[fav(5, "d3")]);
        sync.tap("d3");
        assert_eq!(sync.unlike_resolved("d3", &Err(failed())), Resolution::Settled);
        assert_eq!(sync.state("d3"), LikeState::Unliked);
    }

    #[test]
    fn created_without_id_is_not_stored() {
        let mut sync = LikeSync::default();
        sync.tap("d1");
        let outcome = Ok(PostResult {
            message: Some("SUCCESS".into()),
            id: None,
        });
        assert_eq!(sync.like_resolved("d1", &outcome), Resolution::Reverted);
        assert!(!sync.map().is_favourite("d1"));
    }

    #[test]
    fn unsolicited_outcomes_are_ignored() {
        let mut sync = LikeSync::default();
        assert_eq!(sync.like_resolved("d1", &created(1)), Resolution::Unexpected);
        assert_eq!(sync.unlike_resolved("d1", &Ok(())), Resolution::Unexpected);
        assert!(sync.map().is_empty());
    }

    #[test]
    fn merge_clears_stranded_items_the_server_knows() {
        let mut sync = LikeSync::new(ReconcileStrategy::KeepOptimistic);
        sync.tap("d1");
        sync.like_resolved("d1", &Err(failed()));
        sync.merge(&[fav(3, "d1")]);
        assert_eq!(sync.state("d1"), LikeState::Liked);
        assert_eq!(sync.tap("d1"), ToggleAction::Delete {
            item_id: "d1".into(),
            favourite_id: 3
        });
    }
}
