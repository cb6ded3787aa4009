//! C-ABI wrapper around `doggie-core`.
//!
//! # Overview
//! Exposes request building, response parsing, the favourite map, the
//! paginated feed, the like toggles and the favourites screen rows through `extern "C"` functions so a native host (the iOS
//! app shell, or any language with a C FFI) can drive the client while doing
//! the HTTP itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `dog_build_*` / `dog_parse_*` mirror the core API 1:1. A failed build
//!   returns null and writes the reason to its optional `out_error`; a
//!   failed parse returns an error envelope.
//! - A single `FfiDogResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `dog_*_free` / `dog_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use doggie_core::{ApiError, ClientConfig, DogClient, HttpRequest, HttpResponse, LikeSync, ToggleAction};
use tracing::warn;

use types::*;

/// Borrow a C string argument. Null and invalid UTF-8 both read as `None`.
///
/// # Safety
/// `s` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

fn response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }.to_string_lossy().into_owned()
    };
    HttpResponse::new(resp.status, body)
}

fn build(
    name: &'static str,
    client: *const FfiDogClient,
    out_error: *mut FfiErrorCode,
    op: impl FnOnce(&DogClient) -> Result<HttpRequest, ApiError>,
) -> *mut FfiHttpRequest {
    let (request, code) = catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return (std::ptr::null_mut(), FfiErrorCode::NullArg);
        }
        let client = unsafe { &*client };
        match op(&client.inner) {
            Ok(req) => match FfiHttpRequest::from_core(req) {
                Some(req) => (req, FfiErrorCode::Ok),
                None => {
                    warn!(function = name, "request too large to hand over");
                    (std::ptr::null_mut(), FfiErrorCode::TooLarge)
                }
            },
            Err(e) => {
                warn!(function = name, error = %e, "request build failed");
                (std::ptr::null_mut(), FfiErrorCode::from(&e))
            }
        }
    }))
    .unwrap_or((std::ptr::null_mut(), FfiErrorCode::Panic));
    unsafe { write_code(out_error, code) };
    request
}

fn null_build_arg(out_error: *mut FfiErrorCode) -> *mut FfiHttpRequest {
    unsafe { write_code(out_error, FfiErrorCode::NullArg) };
    std::ptr::null_mut()
}

/// Parse a create or delete outcome for a like toggle. A null response
/// stands for a request that never got an answer.
fn toggle_outcome<T>(
    client: &DogClient,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&DogClient, HttpResponse) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    if response.is_null() {
        return Err(ApiError::Transport("no response".into()));
    }
    parse(client, response_to_core(unsafe { &*response }))
}

fn parse(
    name: &'static str,
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
    op: impl FnOnce(&DogClient, HttpResponse) -> *mut FfiDogResult,
) -> *mut FfiDogResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiDogResult::null_arg("client");
        }
        if response.is_null() {
            return FfiDogResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = response_to_core(unsafe { &*response });
        op(&client.inner, resp)
    }))
    .unwrap_or_else(|_| FfiDogResult::panic(name))
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client. `base_url` and `sub_id` may be null to use the defaults.
///
/// Returns null if `api_key` is null or any argument is empty.
/// The caller must free the returned pointer with `dog_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_client_new(
    api_key: *const c_char,
    base_url: *const c_char,
    sub_id: *const c_char,
) -> *mut FfiDogClient {
    catch_unwind(|| {
        let Some(api_key) = (unsafe { read_str(api_key) }) else {
            return std::ptr::null_mut();
        };
        let mut config = ClientConfig::new(api_key);
        if let Some(base_url) = unsafe { read_str(base_url) } {
            config = config.with_base_url(base_url);
        }
        if let Some(sub_id) = unsafe { read_str(sub_id) } {
            config = config.with_sub_id(sub_id);
        }
        if let Err(e) = config.validate() {
            warn!(error = %e, "rejected client configuration");
            return std::ptr::null_mut();
        }
        Box::into_raw(Box::new(FfiDogClient::new(config)))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `dog_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn dog_client_free(client: *mut FfiDogClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a search request for feed page `page` (0-based).
///
/// Returns null if `client` is null or its base URL is unusable. Every
/// `dog_build_*` function writes `Ok` or the failure reason to `out_error`
/// when it is non-null: `NullArg`, `UrlMissing`, `Parsing` or `TooLarge`.
/// The caller must free the returned pointer with `dog_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_build_fetch_items(
    client: *const FfiDogClient,
    page: u32,
    out_error: *mut FfiErrorCode,
) -> *mut FfiHttpRequest {
    build("dog_build_fetch_items", client, out_error, |c| c.build_fetch_items(page))
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_build_fetch_favourites(
    client: *const FfiDogClient,
    out_error: *mut FfiErrorCode,
) -> *mut FfiHttpRequest {
    build("dog_build_fetch_favourites", client, out_error, |c| c.build_fetch_favourites())
}

/// Returns null with `NullArg` if `item_id` is null or not UTF-8, and with
/// `Parsing` if it is empty.
#[unsafe(no_mangle)]
pub extern "C" fn dog_build_create_favourite(
    client: *const FfiDogClient,
    item_id: *const c_char,
    out_error: *mut FfiErrorCode,
) -> *mut FfiHttpRequest {
    let Some(item_id) = (unsafe { read_str(item_id) }) else {
        return null_build_arg(out_error);
    };
    build("dog_build_create_favourite", client, out_error, |c| {
        c.build_create_favourite(item_id)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_build_delete_favourite(
    client: *const FfiDogClient,
    favourite_id: i64,
    out_error: *mut FfiErrorCode,
) -> *mut FfiHttpRequest {
    build("dog_build_delete_favourite", client, out_error, |c| {
        c.build_delete_favourite(favourite_id)
    })
}

/// Build a multipart upload of `len` JPEG bytes at `data`.
///
/// Returns null with `NullArg` if `data` is null and with `Parsing` if
/// `len` is zero.
#[unsafe(no_mangle)]
pub extern "C" fn dog_build_upload_image(
    client: *const FfiDogClient,
    data: *const u8,
    len: usize,
    out_error: *mut FfiErrorCode,
) -> *mut FfiHttpRequest {
    if data.is_null() {
        return null_build_arg(out_error);
    }
    let jpeg = unsafe { std::slice::from_raw_parts(data, len) };
    build("dog_build_upload_image", client, out_error, |c| c.build_upload_image(jpeg))
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_build_fetch_my_uploads(
    client: *const FfiDogClient,
    out_error: *mut FfiErrorCode,
) -> *mut FfiHttpRequest {
    build("dog_build_fetch_my_uploads", client, out_error, |c| c.build_fetch_my_uploads())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Returns a result with `data_tag = ItemList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn dog_parse_fetch_items(
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    parse("dog_parse_fetch_items", client, response, |c, resp| {
        match c.parse_fetch_items(resp) {
            Ok(items) => FfiDogResult::ok_items(items),
            Err(e) => FfiDogResult::from_error(e),
        }
    })
}

/// Returns a result with `data_tag = FavouriteList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn dog_parse_fetch_favourites(
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    parse("dog_parse_fetch_favourites", client, response, |c, resp| {
        match c.parse_fetch_favourites(resp) {
            Ok(favourites) => FfiDogResult::ok_favourites(favourites),
            Err(e) => FfiDogResult::from_error(e),
        }
    })
}

/// Returns a result with `data_tag = PostResult` on success. Check
/// `has_id` before trusting `id`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_parse_create_favourite(
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    parse("dog_parse_create_favourite", client, response, |c, resp| {
        match c.parse_create_favourite(resp) {
            Ok(result) => FfiDogResult::ok_post_result(result),
            Err(e) => FfiDogResult::from_error(e),
        }
    })
}

/// Any 2xx is success with `data_tag = None`; the body is ignored.
#[unsafe(no_mangle)]
pub extern "C" fn dog_parse_delete_favourite(
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    parse("dog_parse_delete_favourite", client, response, |c, resp| {
        match c.parse_delete_favourite(resp) {
            Ok(()) => FfiDogResult::ok_empty(),
            Err(e) => FfiDogResult::from_error(e),
        }
    })
}

/// Returns a result with `data_tag = UploadResult` on success.
#[unsafe(no_mangle)]
pub extern "C" fn dog_parse_upload_image(
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    parse("dog_parse_upload_image", client, response, |c, resp| {
        match c.parse_upload_image(resp) {
            Ok(result) => FfiDogResult::ok_upload_result(result),
            Err(e) => FfiDogResult::from_error(e),
        }
    })
}

/// Returns a result with `data_tag = MyItemList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn dog_parse_fetch_my_uploads(
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    parse("dog_parse_fetch_my_uploads", client, response, |c, resp| {
        match c.parse_fetch_my_uploads(resp) {
            Ok(mine) => FfiDogResult::ok_my_items(mine),
            Err(e) => FfiDogResult::from_error(e),
        }
    })
}

// ---------------------------------------------------------------------------
// Favourite map
// ---------------------------------------------------------------------------

/// The caller must free the returned pointer with `dog_favourites_free`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_favourites_new() -> *mut FfiFavouriteMap {
    catch_unwind(|| Box::into_raw(Box::<FfiFavouriteMap>::default())).unwrap_or(std::ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_favourites_free(map: *mut FfiFavouriteMap) {
    if !map.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(map) });
        });
    }
}

/// Parse a favourites response and fold it into `map`. Existing entries
/// stay. On success the parsed list is returned as `FavouriteList`; on
/// failure the map is untouched.
#[unsafe(no_mangle)]
pub extern "C" fn dog_favourites_merge(
    map: *mut FfiFavouriteMap,
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    if map.is_null() {
        return FfiDogResult::null_arg("map");
    }
    parse("dog_favourites_merge", client, response, |c, resp| {
        match c.parse_fetch_favourites(resp) {
            Ok(favourites) => {
                let map = unsafe { &mut *map };
                map.inner.merge(&favourites);
                FfiDogResult::ok_favourites(favourites)
            }
            Err(e) => FfiDogResult::from_error(e),
        }
    })
}

/// Returns false if an argument is null or `item_id` is empty.
#[unsafe(no_mangle)]
pub extern "C" fn dog_favourites_mark_liked(
    map: *mut FfiFavouriteMap,
    item_id: *const c_char,
    favourite_id: i64,
) -> bool {
    catch_unwind(|| {
        let Some(item_id) = (unsafe { read_str(item_id) }) else {
            return false;
        };
        if map.is_null() {
            return false;
        }
        unsafe { &mut *map }.inner.mark_liked(item_id, favourite_id)
    })
    .unwrap_or(false)
}

/// Remove `item_id`. Returns true if it was present, writing its favourite
/// id to `out_favourite_id` when that pointer is non-null.
#[unsafe(no_mangle)]
pub extern "C" fn dog_favourites_mark_unliked(
    map: *mut FfiFavouriteMap,
    item_id: *const c_char,
    out_favourite_id: *mut i64,
) -> bool {
    catch_unwind(|| {
        let Some(item_id) = (unsafe { read_str(item_id) }) else {
            return false;
        };
        if map.is_null() {
            return false;
        }
        match unsafe { &mut *map }.inner.mark_unliked(item_id) {
            Some(id) => {
                if !out_favourite_id.is_null() {
                    unsafe { *out_favourite_id = id };
                }
                true
            }
            None => false,
        }
    })
    .unwrap_or(false)
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_favourites_is_favourite(map: *const FfiFavouriteMap, item_id: *const c_char) -> bool {
    catch_unwind(|| {
        let Some(item_id) = (unsafe { read_str(item_id) }) else {
            return false;
        };
        !map.is_null() && unsafe { &*map }.inner.is_favourite(item_id)
    })
    .unwrap_or(false)
}

/// Look up the favourite id for `item_id`. Returns false when absent.
#[unsafe(no_mangle)]
pub extern "C" fn dog_favourites_id(
    map: *const FfiFavouriteMap,
    item_id: *const c_char,
    out_favourite_id: *mut i64,
) -> bool {
    catch_unwind(|| {
        let Some(item_id) = (unsafe { read_str(item_id) }) else {
            return false;
        };
        if map.is_null() || out_favourite_id.is_null() {
            return false;
        }
        match unsafe { &*map }.inner.favourite_id(item_id) {
            Some(id) => {
                unsafe { *out_favourite_id = id };
                true
            }
            None => false,
        }
    })
    .unwrap_or(false)
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_favourites_len(map: *const FfiFavouriteMap) -> u32 {
    if map.is_null() {
        return 0;
    }
    catch_unwind(|| slice_len(unsafe { &*map }.inner.len()).unwrap_or(u32::MAX)).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Item feed
// ---------------------------------------------------------------------------

/// The caller must free the returned pointer with `dog_feed_free`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_feed_new() -> *mut FfiItemFeed {
    catch_unwind(|| Box::into_raw(Box::<FfiItemFeed>::default())).unwrap_or(std::ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_feed_free(feed: *mut FfiItemFeed) {
    if !feed.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(feed) });
        });
    }
}

/// Claim the next page. Returns false, leaving `out_ticket` untouched,
/// while another page is in flight.
#[unsafe(no_mangle)]
pub extern "C" fn dog_feed_begin_fetch(feed: *mut FfiItemFeed, out_ticket: *mut FfiPageTicket) -> bool {
    catch_unwind(|| {
        if feed.is_null() || out_ticket.is_null() {
            return false;
        }
        match unsafe { &mut *feed }.inner.begin_fetch() {
            Some(ticket) => {
                unsafe { *out_ticket = ticket.into() };
                true
            }
            None => false,
        }
    })
    .unwrap_or(false)
}

/// Parse a search response for `ticket` and append it. A parse failure
/// releases the ticket and returns the error; a stale ticket yields a
/// `FeedUpdate` with `stale` set.
#[unsafe(no_mangle)]
pub extern "C" fn dog_feed_complete(
    feed: *mut FfiItemFeed,
    client: *const FfiDogClient,
    ticket: FfiPageTicket,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    if feed.is_null() {
        return FfiDogResult::null_arg("feed");
    }
    parse("dog_feed_complete", client, response, |c, resp| {
        let feed = unsafe { &mut *feed };
        match c.parse_fetch_items(resp) {
            Ok(items) => FfiDogResult::ok_feed_update(feed.inner.complete(ticket.into(), items)),
            Err(e) => {
                feed.inner.fail(ticket.into());
                FfiDogResult::from_error(e)
            }
        }
    })
}

/// Release `ticket` after a transport failure. Returns false for a stale
/// ticket.
#[unsafe(no_mangle)]
pub extern "C" fn dog_feed_fail(feed: *mut FfiItemFeed, ticket: FfiPageTicket) -> bool {
    catch_unwind(|| !feed.is_null() && unsafe { &mut *feed }.inner.fail(ticket.into())).unwrap_or(false)
}

/// Clear the feed and claim page 0 of a new generation.
#[unsafe(no_mangle)]
pub extern "C" fn dog_feed_refresh(feed: *mut FfiItemFeed, out_ticket: *mut FfiPageTicket) -> bool {
    catch_unwind(|| {
        if feed.is_null() || out_ticket.is_null() {
            return false;
        }
        let ticket = unsafe { &mut *feed }.inner.refresh();
        unsafe { *out_ticket = ticket.into() };
        true
    })
    .unwrap_or(false)
}

/// Call as row `index` comes into view.
#[unsafe(no_mangle)]
pub extern "C" fn dog_feed_should_load_more(feed: *const FfiItemFeed, index: u32) -> bool {
    catch_unwind(|| !feed.is_null() && unsafe { &*feed }.inner.should_load_more(index as usize))
        .unwrap_or(false)
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_feed_len(feed: *const FfiItemFeed) -> u32 {
    if feed.is_null() {
        return 0;
    }
    catch_unwind(|| slice_len(unsafe { &*feed }.inner.len()).unwrap_or(u32::MAX)).unwrap_or(0)
}

/// Id of the item at `index`, or null when out of range or absent.
/// Free with `dog_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_feed_item_id(feed: *const FfiItemFeed, index: u32) -> *mut c_char {
    catch_unwind(|| {
        if feed.is_null() {
            return std::ptr::null_mut();
        }
        let item = unsafe { &*feed }.inner.items().get(index as usize);
        c_string_opt(item.and_then(|i| i.id.clone()))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Image URL of the item at `index`, or null. Free with `dog_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_feed_item_url(feed: *const FfiItemFeed, index: u32) -> *mut c_char {
    catch_unwind(|| {
        if feed.is_null() {
            return std::ptr::null_mut();
        }
        let item = unsafe { &*feed }.inner.items().get(index as usize);
        c_string_opt(item.and_then(|i| i.url.clone()))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Like toggles
// ---------------------------------------------------------------------------

/// The caller must free the returned pointer with `dog_likes_free`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_likes_new(strategy: FfiReconcileStrategy) -> *mut FfiLikeSync {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiLikeSync {
            inner: LikeSync::new(strategy.into()),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_likes_free(likes: *mut FfiLikeSync) {
    if !likes.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(likes) });
        });
    }
}

/// Flip the toggle for `item_id`. For `Delete` the favourite id to delete
/// is written to `out_favourite_id` when that pointer is non-null.
#[unsafe(no_mangle)]
pub extern "C" fn dog_likes_tap(
    likes: *mut FfiLikeSync,
    item_id: *const c_char,
    out_favourite_id: *mut i64,
) -> FfiToggleAction {
    catch_unwind(|| {
        let Some(item_id) = (unsafe { read_str(item_id) }) else {
            return FfiToggleAction::Invalid;
        };
        if likes.is_null() {
            return FfiToggleAction::Invalid;
        }
        let action = unsafe { &mut *likes }.inner.tap(item_id);
        if let ToggleAction::Delete { favourite_id, .. } = &action {
            if !out_favourite_id.is_null() {
                unsafe { *out_favourite_id = *favourite_id };
            }
        }
        FfiToggleAction::from(&action)
    })
    .unwrap_or(FfiToggleAction::Invalid)
}

/// Feed back the response to a `Create`. Pass a null `response` when the
/// request failed before any answer arrived.
#[unsafe(no_mangle)]
pub extern "C" fn dog_likes_like_resolved(
    likes: *mut FfiLikeSync,
    client: *const FfiDogClient,
    item_id: *const c_char,
    response: *const FfiHttpResponse,
) -> FfiResolution {
    catch_unwind(|| {
        let Some(item_id) = (unsafe { read_str(item_id) }) else {
            return FfiResolution::Invalid;
        };
        if likes.is_null() || client.is_null() {
            return FfiResolution::Invalid;
        }
        let client = unsafe { &*client };
        let outcome = toggle_outcome(&client.inner, response, |c, resp| c.parse_create_favourite(resp));
        unsafe { &mut *likes }.inner.like_resolved(item_id, &outcome).into()
    })
    .unwrap_or(FfiResolution::Invalid)
}

/// Feed back the response to a `Delete`. A 404 settles the item as
/// unliked. Pass a null `response` when no answer arrived.
#[unsafe(no_mangle)]
pub extern "C" fn dog_likes_unlike_resolved(
    likes: *mut FfiLikeSync,
    client: *const FfiDogClient,
    item_id: *const c_char,
    response: *const FfiHttpResponse,
) -> FfiResolution {
    catch_unwind(|| {
        let Some(item_id) = (unsafe { read_str(item_id) }) else {
            return FfiResolution::Invalid;
        };
        if likes.is_null() || client.is_null() {
            return FfiResolution::Invalid;
        }
        let client = unsafe { &*client };
        let outcome = toggle_outcome(&client.inner, response, |c, resp| c.parse_delete_favourite(resp));
        unsafe { &mut *likes }.inner.unlike_resolved(item_id, &outcome).into()
    })
    .unwrap_or(FfiResolution::Invalid)
}

/// Null arguments read as `Unliked`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_likes_state(likes: *const FfiLikeSync, item_id: *const c_char) -> FfiLikeState {
    catch_unwind(|| {
        let Some(item_id) = (unsafe { read_str(item_id) }) else {
            return FfiLikeState::Unliked;
        };
        if likes.is_null() {
            return FfiLikeState::Unliked;
        }
        unsafe { &*likes }.inner.state(item_id).into()
    })
    .unwrap_or(FfiLikeState::Unliked)
}

/// Whether the toggle for `item_id` renders as liked.
#[unsafe(no_mangle)]
pub extern "C" fn dog_likes_is_liked(likes: *const FfiLikeSync, item_id: *const c_char) -> bool {
    catch_unwind(|| {
        let Some(item_id) = (unsafe { read_str(item_id) }) else {
            return false;
        };
        !likes.is_null() && unsafe { &*likes }.inner.is_liked(item_id)
    })
    .unwrap_or(false)
}

fn likes_apply(
    name: &'static str,
    likes: *mut FfiLikeSync,
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
    apply: fn(&mut LikeSync, &[doggie_core::Favourite]) -> usize,
) -> *mut FfiDogResult {
    if likes.is_null() {
        return FfiDogResult::null_arg("likes");
    }
    parse(name, client, response, |c, resp| match c.parse_fetch_favourites(resp) {
        Ok(favourites) => {
            let likes = unsafe { &mut *likes };
            apply(&mut likes.inner, &favourites);
            FfiDogResult::ok_favourites(favourites)
        }
        Err(e) => FfiDogResult::from_error(e),
    })
}

/// Parse a favourites response and fold it in, keeping local entries.
/// Returns the parsed list as `FavouriteList`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_likes_merge(
    likes: *mut FfiLikeSync,
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    likes_apply("dog_likes_merge", likes, client, response, LikeSync::merge)
}

/// Parse a favourites response and adopt it as the whole truth. Use after
/// a `RequeryNeeded` resolution.
#[unsafe(no_mangle)]
pub extern "C" fn dog_likes_resync(
    likes: *mut FfiLikeSync,
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    likes_apply("dog_likes_resync", likes, client, response, LikeSync::resync)
}

/// Report a favourite deleted from the favourites screen. Returns false
/// when no toggle knew that favourite id.
#[unsafe(no_mangle)]
pub extern "C" fn dog_likes_remove_favourite(likes: *mut FfiLikeSync, favourite_id: i64) -> bool {
    catch_unwind(|| !likes.is_null() && unsafe { &mut *likes }.inner.remove_favourite(favourite_id).is_some())
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Favourites screen rows
// ---------------------------------------------------------------------------

/// The caller must free the returned pointer with `dog_favourite_rows_free`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_favourite_rows_new() -> *mut FfiFavouriteRows {
    catch_unwind(|| Box::into_raw(Box::<FfiFavouriteRows>::default())).unwrap_or(std::ptr::null_mut())
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_favourite_rows_free(rows: *mut FfiFavouriteRows) {
    if !rows.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(rows) });
        });
    }
}

/// Parse a favourites response and replace the rows with it. On failure
/// the previous rows stay and the error is returned. Success carries no
/// payload; read rows through the accessors.
#[unsafe(no_mangle)]
pub extern "C" fn dog_favourite_rows_reload(
    rows: *mut FfiFavouriteRows,
    client: *const FfiDogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiDogResult {
    if rows.is_null() {
        return FfiDogResult::null_arg("rows");
    }
    parse("dog_favourite_rows_reload", client, response, |c, resp| {
        let rows = unsafe { &mut *rows };
        match rows.inner.reload(c.parse_fetch_favourites(resp)) {
            Ok(_) => FfiDogResult::ok_empty(),
            Err(e) => FfiDogResult::from_error(e),
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn dog_favourite_rows_len(rows: *const FfiFavouriteRows) -> u32 {
    if rows.is_null() {
        return 0;
    }
    catch_unwind(|| slice_len(unsafe { &*rows }.inner.len()).unwrap_or(u32::MAX)).unwrap_or(0)
}

/// Remove the row at `index` and write the favourite id to delete. Returns
/// false, leaving the rows alone, when `index` is out of range or the row
/// has no favourite id. Pass the id on to `dog_likes_remove_favourite` once
/// the delete succeeds.
#[unsafe(no_mangle)]
pub extern "C" fn dog_favourite_rows_remove_at(
    rows: *mut FfiFavouriteRows,
    index: u32,
    out_favourite_id: *mut i64,
) -> bool {
    catch_unwind(|| {
        if rows.is_null() || out_favourite_id.is_null() {
            return false;
        }
        match unsafe { &mut *rows }.inner.remove_at(index as usize) {
            Some(id) => {
                unsafe { *out_favourite_id = id };
                true
            }
            None => false,
        }
    })
    .unwrap_or(false)
}

/// Item id of the row at `index`, or null. Free with `dog_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_favourite_rows_image_id(rows: *const FfiFavouriteRows, index: u32) -> *mut c_char {
    catch_unwind(|| {
        if rows.is_null() {
            return std::ptr::null_mut();
        }
        let row = unsafe { &*rows }.inner.favourites().get(index as usize);
        c_string_opt(row.and_then(|f| f.image_id.clone()))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Image URL of the row at `index`, or null. Free with `dog_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn dog_favourite_rows_image_url(rows: *const FfiFavouriteRows, index: u32) -> *mut c_char {
    catch_unwind(|| {
        if rows.is_null() {
            return std::ptr::null_mut();
        }
        let row = unsafe { &*rows }.inner.favourites().get(index as usize);
        c_string_opt(row.and_then(|f| f.image.as_ref().and_then(|i| i.url.clone())))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `dog_build_*` function. Safe to call
/// with null.
#[unsafe(no_mangle)]
pub extern "C" fn dog_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiHttpRequest::free(req) });
}

/// Free a result returned by any function that hands out `FfiDogResult`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn dog_free_result(result: *mut FfiDogResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiDogResult::free(result) });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn dog_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| unsafe { free_c_string(s) });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
