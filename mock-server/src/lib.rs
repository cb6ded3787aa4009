use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "mock-key";
pub const CATALOGUE_SIZE: usize = 45;

const ACCOUNT_ID: &str = "mock-account";
const BREEDS: [&str; 4] = ["Affenpinscher", "Akita", "Basenji", "Beagle"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Breed {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub url: String,
    pub breeds: Vec<Breed>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Favourite {
    pub id: i64,
    pub user_id: String,
    pub image_id: String,
    pub sub_id: String,
    pub created_at: String,
    pub image: ImageRef,
}

#[derive(Deserialize)]
pub struct CreateFavourite {
    pub image_id: String,
    pub sub_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MyItem {
    pub id: String,
    pub url: String,
    pub sub_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResult {
    pub id: String,
    pub url: String,
    pub sub_id: String,
    pub original_filename: String,
    pub pending: i64,
    pub approved: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// In-memory account: a fixed photo catalogue plus whatever the client
/// favourited or uploaded.
pub struct Store {
    catalogue: Vec<Item>,
    favourites: Vec<Favourite>,
    uploads: Vec<MyItem>,
    next_favourite_id: i64,
}

impl Store {
    fn seeded() -> Self {
        let catalogue = (1..=CATALOGUE_SIZE)
            .map(|i| {
                let breed = (i - 1) % BREEDS.len();
                Item {
                    id: format!("d{i}"),
                    url: format!("https://cdn2.thedogapi.com/images/d{i}.jpg"),
                    breeds: vec![Breed {
                        id: breed as i64 + 1,
                        name: BREEDS[breed].to_string(),
                    }],
                }
            })
            .collect();
        Self {
            catalogue,
            favourites: Vec::new(),
            uploads: Vec::new(),
            next_favourite_id: 1,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    store: Arc<RwLock<Store>>,
}

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        store: Arc::new(RwLock::new(Store::seeded())),
    };
    Router::new()
        .route("/v1/images/search", get(search_images))
        .route("/v1/images/upload", post(upload_image))
        .route("/v1/images", get(list_uploads))
        .route("/v1/favourites", get(list_favourites).post(create_favourite))
        .route("/v1/favourites/{id}", delete(delete_favourite))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock dog api listening");
    }
    axum::serve(listener, app(api_key)).await
}

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());
    if presented != Some(&*state.api_key) {
        warn!(path = %request.uri().path(), "rejected request without a valid api key");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

async fn search_images(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Item>> {
    let store = state.store.read().await;
    let limit = params.limit.clamp(1, 100);
    let page: Vec<Item> = store
        .catalogue
        .iter()
        .skip(params.page.saturating_mul(limit))
        .take(limit)
        .cloned()
        .collect();
    debug!(page = params.page, limit, returned = page.len(), "search");
    Json(page)
}

async fn list_favourites(State(state): State<AppState>) -> Json<Vec<Favourite>> {
    Json(state.store.read().await.favourites.clone())
}

async fn create_favourite(
    State(state): State<AppState>,
    Json(input): Json<CreateFavourite>,
) -> Result<Json<Message>, (StatusCode, String)> {
    let mut store = state.store.write().await;
    let url = store
        .catalogue
        .iter()
        .map(|item| (&item.id, &item.url))
        .chain(store.uploads.iter().map(|mine| (&mine.id, &mine.url)))
        .find(|(id, _)| **id == input.image_id)
        .map(|(_, url)| url.clone())
        .ok_or((StatusCode::BAD_REQUEST, "INVALID_IMAGE_ID".to_string()))?;

    if store
        .favourites
        .iter()
        .any(|f| f.image_id == input.image_id && f.sub_id == input.sub_id)
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "DUPLICATE_FAVOURITE - favourites are unique for account + image_id + sub_id".to_string(),
        ));
    }

    let id = store.next_favourite_id;
    store.next_favourite_id += 1;
    store.favourites.push(Favourite {
        id,
        user_id: ACCOUNT_ID.to_string(),
        image_id: input.image_id.clone(),
        sub_id: input.sub_id,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        image: ImageRef {
            id: input.image_id,
            url,
        },
    });
    Ok(Json(Message {
        message: "SUCCESS".to_string(),
        id: Some(id),
    }))
}

async fn delete_favourite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Message>, StatusCode> {
    let mut store = state.store.write().await;
    let index = store
        .favourites
        .iter()
        .position(|f| f.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    store.favourites.remove(index);
    Ok(Json(Message {
        message: "SUCCESS".to_string(),
        id: None,
    }))
}

async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResult>), (StatusCode, String)> {
    let bad_request = |e: axum::extract::multipart::MultipartError| (StatusCode::BAD_REQUEST, e.to_string());

    let mut sub_id = None;
    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "sub_id" => sub_id = Some(field.text().await.map_err(bad_request)?),
            "file" => {
                let filename = field.file_name().unwrap_or("upload.jpg").to_string();
                let data = field.bytes().await.map_err(bad_request)?;
                file = Some((filename, data));
            }
            _ => {}
        }
    }

    let (original_filename, data) =
        file.ok_or((StatusCode::BAD_REQUEST, "file is required".to_string()))?;
    if !data.starts_with(&[0xFF, 0xD8]) {
        return Err((StatusCode::BAD_REQUEST, "Classification failed: not a jpeg".to_string()));
    }

    let id = Uuid::new_v4().simple().to_string()[..9].to_string();
    let url = format!("https://cdn2.thedogapi.com/images/{id}.jpg");
    let sub_id = sub_id.unwrap_or_default();
    state.store.write().await.uploads.push(MyItem {
        id: id.clone(),
        url: url.clone(),
        sub_id: sub_id.clone(),
    });
    debug!(%id, bytes = data.len(), "upload stored");

    Ok((
        StatusCode::CREATED,
        Json(UploadResult {
            id,
            url,
            sub_id,
            original_filename,
            pending: 0,
            approved: 1,
        }),
    ))
}

async fn list_uploads(State(state): State<AppState>) -> Json<Vec<MyItem>> {
    Json(state.store.read().await.uploads.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn favourite_serializes_with_snake_case_keys() {
        let fav = Favourite {
            id: 1,
            user_id: "u".to_string(),
            image_id: "d1".to_string(),
            sub_id: "s".to_string(),
            created_at: "2023-02-10T00:00:00.000Z".to_string(),
            image: ImageRef {
                id: "d1".to_string(),
                url: "https://cdn/d1.jpg".to_string(),
            },
        };
        let json = serde_json::to_value(&fav).unwrap();
        assert_eq!(json["image_id"], "d1");
        assert_eq!(json["created_at"], "2023-02-10T00:00:00.000Z");
        assert_eq!(json["image"]["url"], "https://cdn/d1.jpg");
    }

    #[test]
    fn seeded_catalogue_has_sequential_ids() {
        let store = Store::seeded();
        assert_eq!(store.catalogue.len(), CATALOGUE_SIZE);
        assert_eq!(store.catalogue[0].id, "d1");
        assert_eq!(store.catalogue[CATALOGUE_SIZE - 1].id, format!("d{CATALOGUE_SIZE}"));
        assert_eq!(store.catalogue[0].breeds[0].name, "Affenpinscher");
    }

    #[test]
    fn search_params_default_limit() {
        let params: SearchParams = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(params.page, 0);
        assert_eq!(params.limit, 20);
    }

    #[test]
    fn create_favourite_rejects_missing_sub_id() {
        let result: Result<CreateFavourite, _> = serde_json::from_str(r#"{"image_id":"d1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn message_omits_absent_id() {
        let json = serde_json::to_value(Message {
            message: "SUCCESS".to_string(),
            id: None,
        })
        .unwrap();
        assert!(json.get("id").is_none());
    }
}
