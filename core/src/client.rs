//! Stateless HTTP request builder and response parser for the Dog API.
//!
//! # Design
//! `DogClient` holds only its `ClientConfig` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the actual HTTP round-trip, keeping
//! the core deterministic and free of I/O.
//!
//! Every `parse_*` checks the status before decoding: a non-2xx response is
//! `BadStatus` even when its body happens to be valid JSON.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::MultipartForm;
use crate::types::{CreateFavourite, Favourite, Item, MyItem, PostResult, UploadResult};

/// Items per search page. The feed's scroll threshold depends on it.
pub const PAGE_SIZE: u32 = 20;

pub const UPLOAD_FILE_NAME: &str = "a.jpg";

const SEARCH_PATH: &str = "v1/images/search";
const FAVOURITES_PATH: &str = "v1/favourites";
const UPLOAD_PATH: &str = "v1/images/upload";
const MY_UPLOADS_PATH: &str = "v1/images";

/// Synchronous, stateless client for the Dog API.
#[derive(Debug, Clone)]
pub struct DogClient {
    config: ClientConfig,
}

impl DogClient {
    pub fn new(mut config: ClientConfig) -> Self {
        config.base_url = format!("{}/", config.base_url.trim_end_matches('/'));
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build_fetch_items(&self, page: u32) -> Result<HttpRequest, ApiError> {
        let mut url = self.endpoint(SEARCH_PATH)?;
        url.query_pairs_mut()
            .append_pair("mime_type", "jpg")
            .append_pair("format", "json")
            .append_pair("has_breeds", "true")
            .append_pair("order", "RANDOM")
            .append_pair("page", &page.to_string())
            .append_pair("limit", &PAGE_SIZE.to_string());
        debug!(page, "built item search request");
        Ok(self.json_request(HttpMethod::Get, url, None))
    }

    pub fn build_fetch_favourites(&self) -> Result<HttpRequest, ApiError> {
        let url = self.endpoint(FAVOURITES_PATH)?;
        Ok(self.json_request(HttpMethod::Get, url, None))
    }

    pub fn build_create_favourite(&self, item_id: &str) -> Result<HttpRequest, ApiError> {
        if item_id.is_empty() {
            return Err(ApiError::Parsing("empty item id".to_string()));
        }
        let url = self.endpoint(FAVOURITES_PATH)?;
        let payload = CreateFavourite {
            image_id: item_id.to_string(),
            sub_id: self.config.sub_id.clone(),
        };
        let body = serde_json::to_vec(&payload).map_err(|e| ApiError::Parsing(e.to_string()))?;
        debug!(item_id, "built favourite creation request");
        Ok(self.json_request(HttpMethod::Post, url, Some(body)))
    }

    pub fn build_delete_favourite(&self, favourite_id: i64) -> Result<HttpRequest, ApiError> {
        let url = self.endpoint(&format!("{FAVOURITES_PATH}/{favourite_id}"))?;
        debug!(favourite_id, "built favourite deletion request");
        Ok(self.json_request(HttpMethod::Delete, url, None))
    }

    /// Multipart POST carrying the `sub_id` field and the JPEG as `file`.
    pub fn build_upload_image(&self, jpeg: &[u8]) -> Result<HttpRequest, ApiError> {
        if jpeg.is_empty() {
            return Err(ApiError::Parsing("empty image".to_string()));
        }
        let url = self.endpoint(UPLOAD_PATH)?;
        let (content_type, body) = MultipartForm::new()
            .text("sub_id", &self.config.sub_id)
            .file("file", UPLOAD_FILE_NAME, "image/jpeg", jpeg)
            .finish();
        debug!(bytes = jpeg.len(), "built image upload request");
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![
                ("x-api-key".to_string(), self.config.api_key.clone()),
                ("content-type".to_string(), content_type),
            ],
            body: Some(body),
        })
    }

    pub fn build_fetch_my_uploads(&self) -> Result<HttpRequest, ApiError> {
        let url = self.endpoint(MY_UPLOADS_PATH)?;
        Ok(self.json_request(HttpMethod::Get, url, None))
    }

    pub fn parse_fetch_items(&self, response: HttpResponse) -> Result<Vec<Item>, ApiError> {
        decode(response)
    }

    pub fn parse_fetch_favourites(&self, response: HttpResponse) -> Result<Vec<Favourite>, ApiError> {
        decode(response)
    }

    pub fn parse_create_favourite(&self, response: HttpResponse) -> Result<PostResult, ApiError> {
        decode(response)
    }

    /// Any 2xx counts as deleted; the body is ignored.
    pub fn parse_delete_favourite(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_upload_image(&self, response: HttpResponse) -> Result<UploadResult, ApiError> {
        decode(response)
    }

    pub fn parse_fetch_my_uploads(&self, response: HttpResponse) -> Result<Vec<MyItem>, ApiError> {
        decode(response)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = Url::parse(&self.config.base_url).map_err(|e| {
            warn!(base_url = %self.config.base_url, error = %e, "unusable base url");
            ApiError::UrlMissing
        })?;
        if base.cannot_be_a_base() {
            warn!(base_url = %self.config.base_url, "base url cannot carry a path");
            return Err(ApiError::UrlMissing);
        }
        base.join(path).map_err(|_| ApiError::UrlMissing)
    }

    fn json_request(&self, method: HttpMethod, url: Url, body: Option<Vec<u8>>) -> HttpRequest {
        HttpRequest {
            method,
            url: url.into(),
            headers: vec![
                ("x-api-key".to_string(), self.config.api_key.clone()),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }
}

/// Map a non-2xx status to `BadStatus`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    warn!(status = response.status, "non-success response");
    Err(ApiError::BadStatus {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    if response.status == 204 {
        return Err(ApiError::NoContent);
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DogClient {
        DogClient::new(ClientConfig::new("test-key").with_sub_id("tester"))
    }

    #[test]
    fn client_keeps_its_config() {
        let client = client();
        assert_eq!(client.config().api_key, "test-key");
        assert_eq!(client.config().sub_id, "tester");
        assert_eq!(client.config().base_url, crate::config::DEFAULT_BASE_URL);
    }

    #[test]
    fn build_fetch_items_produces_fixed_query() {
        let req = client().build_fetch_items(3).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://api.thedogapi.com/v1/images/search?mime_type=jpg&format=json&has_breeds=true&order=RANDOM&page=3&limit=20"
        );
        assert_eq!(req.header("x-api-key"), Some("test-key"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_fetch_favourites_produces_correct_request() {
        let req = client().build_fetch_favourites().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.thedogapi.com/v1/favourites");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_create_favourite_sends_image_and_sub_id() {
        let req = client().build_create_favourite("d9").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.thedogapi.com/v1/favourites");
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"image_id": "d9", "sub_id": "tester"}));
    }

    #[test]
    fn build_create_favourite_rejects_empty_id() {
        let err = client().build_create_favourite("").unwrap_err();
        assert!(matches!(err, ApiError::Parsing(_)));
    }

    #[test]
    fn build_delete_favourite_targets_favourite_id() {
        let req = client().build_delete_favourite(42).unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "https://api.thedogapi.com/v1/favourites/42");
        assert_eq!(req.header("x-api-key"), Some("test-key"));
    }

    #[test]
    fn build_upload_image_is_multipart() {
        let req = client().build_upload_image(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.thedogapi.com/v1/images/upload");
        let content_type = req.header("content-type").unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));

        let body = req.body.unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("name=\"sub_id\""));
        assert!(text.contains("tester"));
        assert!(text.contains("name=\"file\"; filename=\"a.jpg\""));
        assert!(text.contains("Content-Type: image/jpeg"));
    }

    #[test]
    fn build_upload_image_rejects_empty_bytes() {
        let err = client().build_upload_image(&[]).unwrap_err();
        assert!(matches!(err, ApiError::Parsing(_)));
    }

    #[test]
    fn build_fetch_my_uploads_produces_correct_request() {
        let req = client().build_fetch_my_uploads().unwrap();
        assert_eq!(req.url, "https://api.thedogapi.com/v1/images");
    }

    #[test]
    fn invalid_base_is_url_missing() {
        let client = DogClient::new(ClientConfig::new("k").with_base_url("not a url"));
        let err = client.build_fetch_items(0).unwrap_err();
        assert!(matches!(err, ApiError::UrlMissing));
    }

    #[test]
    fn non_hierarchical_base_is_url_missing() {
        let client = DogClient::new(ClientConfig::new("k").with_base_url("mailto:dogs@example.com"));
        assert!(matches!(client.build_fetch_favourites(), Err(ApiError::UrlMissing)));
    }

    #[test]
    fn base_path_is_preserved() {
        let client = DogClient::new(ClientConfig::new("k").with_base_url("http://localhost:3000/proxy"));
        let req = client.build_fetch_favourites().unwrap();
        assert_eq!(req.url, "http://localhost:3000/proxy/v1/favourites");
    }

    #[test]
    fn parse_fetch_items_success() {
        let response = HttpResponse::new(
            200,
            r#"[{"id":"d1","url":"https://cdn/d1.jpg","breeds":[{"id":1,"name":"Affenpinscher"}]}]"#,
        );
        let items = client().parse_fetch_items(response).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some("d1"));
        assert_eq!(items[0].breeds.as_ref().unwrap()[0].name.as_deref(), Some("Affenpinscher"));
    }

    #[test]
    fn parse_fetch_items_bad_json() {
        let err = client().parse_fetch_items(HttpResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Decoding(_)));
    }

    #[test]
    fn parse_checks_status_before_decoding() {
        let response = HttpResponse::new(401, r#"[]"#);
        let err = client().parse_fetch_favourites(response).unwrap_err();
        assert!(matches!(err, ApiError::BadStatus { status: 401, .. }));
    }

    #[test]
    fn parse_no_content_where_body_expected() {
        let err = client().parse_fetch_my_uploads(HttpResponse::new(204, "")).unwrap_err();
        assert!(matches!(err, ApiError::NoContent));
    }

    #[test]
    fn parse_create_favourite_success() {
        let result = client()
            .parse_create_favourite(HttpResponse::new(200, r#"{"message":"SUCCESS","id":42}"#))
            .unwrap();
        assert_eq!(result.id, Some(42));
        assert_eq!(result.message.as_deref(), Some("SUCCESS"));
    }

    #[test]
    fn parse_delete_favourite_ignores_body() {
        assert!(client().parse_delete_favourite(HttpResponse::new(200, "garbage")).is_ok());
        assert!(client().parse_delete_favourite(HttpResponse::new(204, "")).is_ok());
    }

    #[test]
    fn parse_delete_favourite_reports_failure() {
        let err = client()
            .parse_delete_favourite(HttpResponse::new(400, "INVALID_ACCOUNT"))
            .unwrap_err();
        assert!(matches!(err, ApiError::BadStatus { status: 400, .. }));
    }

    #[test]
    fn parse_upload_image_missing_body_is_decoding() {
        let err = client().parse_upload_image(HttpResponse::new(201, "")).unwrap_err();
        assert!(matches!(err, ApiError::Decoding(_)));
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let client = DogClient::new(ClientConfig::new("k").with_base_url("http://localhost:3000///"));
        let req = client.build_fetch_my_uploads().unwrap();
        assert_eq!(req.url, "http://localhost:3000/v1/images");
    }
}
