//! Domain DTOs for the Dog API.
//!
//! # Design
//! Every response field is optional: the service omits fields freely and a
//! missing value must not fail the whole page. Unknown fields are ignored.
//! The mock-server crate defines its own copies of these shapes; the
//! integration tests catch drift between the two.

use serde::{Deserialize, Serialize};

/// A single photo returned by the search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub breeds: Option<Vec<Breed>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Breed {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A server-side favourite. `id` is what the delete endpoint takes; the item
/// identifier alone cannot remove it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Favourite {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub sub_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub image: Option<FavouriteImage>,
}

/// The item reference embedded in a favourite.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FavouriteImage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Request payload for creating a favourite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateFavourite {
    pub image_id: String,
    pub sub_id: String,
}

/// Response to a favourite creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostResult {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
}

/// Response to an image upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sub_id: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub pending: Option<i64>,
    #[serde(default)]
    pub approved: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Moderation outcome of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Approved,
    Rejected,
    Unknown,
}

impl UploadResult {
    pub fn approval(&self) -> Approval {
        match self.approved {
            Some(1) => Approval::Approved,
            Some(0) => Approval::Rejected,
            _ => Approval::Unknown,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.approval() == Approval::Approved
    }
}

/// An image this client uploaded, as listed by `GET v1/images`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MyItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sub_id: Option<String>,
}
