//! Executing requests: the seam between the pure client and the network.
//!
//! # Design
//! `Transport` is the only place I/O happens. `DogApi` composes
//! `build_*` → `execute` → `parse_*` for each operation, so a request that
//! fails to build never reaches the transport. `UreqTransport` is the
//! blocking implementation used by Rust hosts and the integration tests;
//! hosts going through the C ABI skip this module and run requests
//! themselves.

use tracing::{debug, warn};

use crate::client::DogClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Favourite, Item, MyItem, PostResult, UploadResult};

/// Executes one HTTP round-trip. Non-2xx statuses are data, not errors:
/// implementations return them as `HttpResponse` and let the client decide.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// A `DogClient` paired with a transport. One call, one request, no retry.
#[derive(Debug, Clone)]
pub struct DogApi<T> {
    client: DogClient,
    transport: T,
}

impl<T: Transport> DogApi<T> {
    pub fn new(client: DogClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &DogClient {
        &self.client
    }

    pub fn fetch_items(&self, page: u32) -> Result<Vec<Item>, ApiError> {
        let request = self.client.build_fetch_items(page)?;
        let response = self.send(request)?;
        self.client.parse_fetch_items(response)
    }

    pub fn fetch_favourites(&self) -> Result<Vec<Favourite>, ApiError> {
        let request = self.client.build_fetch_favourites()?;
        let response = self.send(request)?;
        self.client.parse_fetch_favourites(response)
    }

    pub fn create_favourite(&self, item_id: &str) -> Result<PostResult, ApiError> {
        let request = self.client.build_create_favourite(item_id)?;
        let response = self.send(request)?;
        self.client.parse_create_favourite(response)
    }

    /// Callers wanting the old fire-and-forget behaviour may drop the result.
    pub fn delete_favourite(&self, favourite_id: i64) -> Result<(), ApiError> {
        let request = self.client.build_delete_favourite(favourite_id)?;
        let response = self.send(request)?;
        self.client.parse_delete_favourite(response)
    }

    pub fn upload_image(&self, jpeg: &[u8]) -> Result<UploadResult, ApiError> {
        let request = self.client.build_upload_image(jpeg)?;
        let response = self.send(request)?;
        self.client.parse_upload_image(response)
    }

    pub fn fetch_my_uploads(&self) -> Result<Vec<MyItem>, ApiError> {
        let request = self.client.build_fetch_my_uploads()?;
        let response = self.send(request)?;
        self.client.parse_fetch_my_uploads(response)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method.as_str();
        let url = request.url.clone();
        debug!(method, %url, "sending request");
        match self.transport.execute(request) {
            Ok(response) => {
                debug!(method, %url, status = response.status, "received response");
                Ok(response)
            }
            Err(e) => {
                warn!(method, %url, error = %e, "request did not complete");
                Err(e)
            }
        }
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport over a ureq agent.
    ///
    /// ureq's status-code-as-error behaviour is disabled so 4xx/5xx arrive as
    /// responses and the client maps them to `BadStatus`.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
            let result = match req.method {
                HttpMethod::Get => {
                    let mut builder = self.agent.get(req.url.as_str());
                    for (k, v) in &req.headers {
                        builder = builder.header(k.as_str(), v.as_str());
                    }
                    builder.call()
                }
                HttpMethod::Delete => {
                    let mut builder = self.agent.delete(req.url.as_str());
                    for (k, v) in &req.headers {
                        builder = builder.header(k.as_str(), v.as_str());
                    }
                    builder.call()
                }
                HttpMethod::Post => {
                    let mut builder = self.agent.post(req.url.as_str());
                    for (k, v) in &req.headers {
                        builder = builder.header(k.as_str(), v.as_str());
                    }
                    match req.body {
                        Some(body) => builder.send(body.as_slice()),
                        None => builder.send_empty(),
                    }
                }
            };
            let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
