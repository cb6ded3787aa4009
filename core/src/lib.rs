//! Client core for the Dog API photo feed.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and owns the client-side
//! state the screens share: the paginated feed, the favourite map and the
//! like toggles.
//!
//! # Design
//! - `DogClient` is stateless; it holds only its `ClientConfig`.
//! - Each operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit. `DogApi` composes them over a `Transport` for
//!   hosts that want one call per operation.
//! - State types (`ItemFeed`, `FavouriteMap`, `LikeSync`, `FavouriteList`)
//!   are plain data mutated through `&mut self`; the host keeps them on its
//!   UI thread.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod favourites;
pub mod feed;
pub mod http;
pub mod multipart;
pub mod sync;
pub mod transport;
pub mod types;

pub use client::{DogClient, PAGE_SIZE};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use favourites::{FavouriteList, FavouriteMap};
pub use feed::{FeedUpdate, ItemFeed, PageTicket};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use sync::{LikeState, LikeSync, ReconcileStrategy, Resolution, ToggleAction};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use transport::{DogApi, Transport};
pub use types::{
    Approval, Breed, CreateFavourite, Favourite, FavouriteImage, Item, MyItem, PostResult,
    UploadResult,
};
