//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String` (null for an absent field), boxed
//! slices handed out as pointer plus length, and tagged enums with explicit
//! discriminants. Conversion functions live here to keep `lib.rs` focused
//! on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use doggie_core::{
    ApiError, Approval, ClientConfig, DogClient, FavouriteList, FavouriteMap, FeedUpdate, HttpMethod,
    HttpRequest, Item, ItemFeed, LikeState, LikeSync, MyItem, PageTicket, PostResult, ReconcileStrategy,
    Resolution, ToggleAction, UploadResult,
};
use tracing::error;

/// Opaque handle to a `DogClient`.
pub struct FfiDogClient {
    pub(crate) inner: DogClient,
}

impl FfiDogClient {
    pub(crate) fn new(config: ClientConfig) -> Self {
        Self {
            inner: DogClient::new(config),
        }
    }
}

/// Opaque handle to the item-id to favourite-id map.
#[derive(Default)]
pub struct FfiFavouriteMap {
    pub(crate) inner: FavouriteMap,
}

/// Opaque handle to a paginated feed.
#[derive(Default)]
pub struct FfiItemFeed {
    pub(crate) inner: ItemFeed,
}

/// Opaque handle to the like toggles of the home screen.
pub struct FfiLikeSync {
    pub(crate) inner: LikeSync,
}

/// Opaque handle to the favourites screen rows.
#[derive(Default)]
pub struct FfiFavouriteRows {
    pub(crate) inner: FavouriteList,
}

// ---------------------------------------------------------------------------
// Owned C data helpers
// ---------------------------------------------------------------------------

/// Interior NULs cannot cross as C strings; such a value becomes empty.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

pub(crate) fn c_string_opt(s: Option<String>) -> *mut c_char {
    s.map_or(std::ptr::null_mut(), c_string)
}

/// # Safety
/// `s` must be null or come from `c_string`.
pub(crate) unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// A length as C sees it, or `None` past `u32::MAX`.
pub(crate) fn slice_len(len: usize) -> Option<u32> {
    u32::try_from(len).ok()
}

/// Convert `items` with `convert` and hand them to C as pointer plus length.
/// Empty vectors become null. The length is checked before anything is
/// converted, so a refused vector allocates nothing C would have to free.
pub(crate) fn into_raw_slice<S, T>(items: Vec<S>, convert: impl FnMut(S) -> T) -> Option<(*mut T, u32)> {
    let len = slice_len(items.len())?;
    if len == 0 {
        return Some((std::ptr::null_mut(), 0));
    }
    let converted: Box<[T]> = items.into_iter().map(convert).collect();
    Some((Box::into_raw(converted) as *mut T, len))
}

/// # Safety
/// `ptr`/`len` must come from `into_raw_slice` and not have been freed.
pub(crate) unsafe fn from_raw_slice<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Delete = 2,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `dog_build_*` functions. The body is raw bytes because uploads
/// are multipart and may contain NULs; `body` is null when there is none.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: u32,
}

impl FfiHttpRequest {
    /// `None` when the body or header list is too long to describe with a
    /// `u32` length.
    pub(crate) fn from_core(req: HttpRequest) -> Option<*mut Self> {
        let body = req.body.unwrap_or_default();
        slice_len(body.len())?;
        let (headers, headers_len) = into_raw_slice(req.headers, |(k, v)| FfiHeader {
            key: c_string(k),
            value: c_string(v),
        })?;
        let (body, body_len) = into_raw_slice(body, |b| b)?;

        Some(Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body,
            body_len,
        })))
    }

    /// # Safety
    /// `req` must come from `from_core` and not have been freed.
    pub(crate) unsafe fn free(req: *mut Self) {
        let req = unsafe { Box::from_raw(req) };
        unsafe {
            free_c_string(req.url);
            for h in from_raw_slice(req.headers, req.headers_len) {
                free_c_string(h.key);
                free_c_string(h.value);
            }
            drop(from_raw_slice(req.body, req.body_len));
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response built by the C caller after executing a request. The
/// FFI layer reads but does not free these fields. A null `body` reads as
/// empty.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

/// A page ticket handed out by `dog_feed_begin_fetch` / `dog_feed_refresh`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FfiPageTicket {
    pub generation: u64,
    pub page: u32,
}

impl From<PageTicket> for FfiPageTicket {
    fn from(t: PageTicket) -> Self {
        Self {
            generation: t.generation,
            page: t.page,
        }
    }
}

impl From<FfiPageTicket> for PageTicket {
    fn from(t: FfiPageTicket) -> Self {
        Self {
            generation: t.generation,
            page: t.page,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiDogResult` and through the `out_error`
/// argument of `dog_build_*`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    UrlMissing = 1,
    Parsing = 2,
    Decoding = 3,
    BadStatus = 4,
    NoContent = 5,
    Transport = 6,
    Panic = 7,
    NullArg = 8,
    /// A payload longer than a `u32` length can describe.
    TooLarge = 9,
}

impl From<&ApiError> for FfiErrorCode {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::UrlMissing => FfiErrorCode::UrlMissing,
            ApiError::Parsing(_) => FfiErrorCode::Parsing,
            ApiError::Decoding(_) => FfiErrorCode::Decoding,
            ApiError::BadStatus { .. } => FfiErrorCode::BadStatus,
            ApiError::NoContent => FfiErrorCode::NoContent,
            ApiError::Transport(_) => FfiErrorCode::Transport,
        }
    }
}

/// Write `code` through an optional out-pointer.
///
/// # Safety
/// `out` must be null or valid for a write.
pub(crate) unsafe fn write_code(out: *mut FfiErrorCode, code: FfiErrorCode) {
    if !out.is_null() {
        unsafe { *out = code };
    }
}

/// Tag that tells `dog_free_result` what `FfiDogResult::data` points to.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    ItemList = 1,
    FavouriteList = 2,
    PostResult = 3,
    UploadResult = 4,
    MyItemList = 5,
    FeedUpdate = 6,
}

/// A feed photo. `breed_name` is the first listed breed, if any.
#[repr(C)]
pub struct FfiItem {
    pub id: *mut c_char,
    pub url: *mut c_char,
    pub breed_name: *mut c_char,
}

impl From<Item> for FfiItem {
    fn from(item: Item) -> Self {
        let breed_name = item
            .breeds
            .and_then(|breeds| breeds.into_iter().find_map(|b| b.name));
        Self {
            id: c_string_opt(item.id),
            url: c_string_opt(item.url),
            breed_name: c_string_opt(breed_name),
        }
    }
}

#[repr(C)]
pub struct FfiItemList {
    pub items: *mut FfiItem,
    pub len: u32,
}

/// A favourite record. `id` is meaningful only when `has_id` is true.
#[repr(C)]
pub struct FfiFavourite {
    pub id: i64,
    pub has_id: bool,
    pub image_id: *mut c_char,
    pub image_url: *mut c_char,
    pub created_at: *mut c_char,
}

impl From<doggie_core::Favourite> for FfiFavourite {
    fn from(f: doggie_core::Favourite) -> Self {
        Self {
            id: f.id.unwrap_or_default(),
            has_id: f.id.is_some(),
            image_id: c_string_opt(f.image_id),
            image_url: c_string_opt(f.image.and_then(|i| i.url)),
            created_at: c_string_opt(f.created_at),
        }
    }
}

#[repr(C)]
pub struct FfiFavouriteList {
    pub items: *mut FfiFavourite,
    pub len: u32,
}

#[repr(C)]
pub struct FfiPostResult {
    pub message: *mut c_char,
    pub id: i64,
    pub has_id: bool,
}

#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiApproval {
    Rejected = 0,
    Approved = 1,
    Unknown = 2,
}

impl From<Approval> for FfiApproval {
    fn from(a: Approval) -> Self {
        match a {
            Approval::Rejected => FfiApproval::Rejected,
            Approval::Approved => FfiApproval::Approved,
            Approval::Unknown => FfiApproval::Unknown,
        }
    }
}

#[repr(C)]
pub struct FfiUploadResult {
    pub id: *mut c_char,
    pub url: *mut c_char,
    pub approval: FfiApproval,
}

#[repr(C)]
pub struct FfiMyItem {
    pub id: *mut c_char,
    pub url: *mut c_char,
}

#[repr(C)]
pub struct FfiMyItemList {
    pub items: *mut FfiMyItem,
    pub len: u32,
}

/// What `dog_feed_complete` did with a page. `page`/`count` are zero when
/// `stale` is true.
#[repr(C)]
pub struct FfiFeedUpdate {
    pub stale: bool,
    pub page: u32,
    pub count: u32,
}

impl From<FeedUpdate> for FfiFeedUpdate {
    fn from(u: FeedUpdate) -> Self {
        match u {
            FeedUpdate::Appended { page, count } => Self {
                stale: false,
                page,
                count: slice_len(count).unwrap_or(u32::MAX),
            },
            FeedUpdate::Stale => Self {
                stale: true,
                page: 0,
                count: 0,
            },
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiReconcileStrategy {
    Revert = 0,
    Requery = 1,
    KeepOptimistic = 2,
}

impl From<FfiReconcileStrategy> for ReconcileStrategy {
    fn from(s: FfiReconcileStrategy) -> Self {
        match s {
            FfiReconcileStrategy::Revert => ReconcileStrategy::Revert,
            FfiReconcileStrategy::Requery => ReconcileStrategy::Requery,
            FfiReconcileStrategy::KeepOptimistic => ReconcileStrategy::KeepOptimistic,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiLikeState {
    Unliked = 0,
    PendingLike = 1,
    Liked = 2,
    PendingUnlike = 3,
    Stranded = 4,
}

impl From<LikeState> for FfiLikeState {
    fn from(s: LikeState) -> Self {
        match s {
            LikeState::Unliked => FfiLikeState::Unliked,
            LikeState::PendingLike => FfiLikeState::PendingLike,
            LikeState::Liked => FfiLikeState::Liked,
            LikeState::PendingUnlike => FfiLikeState::PendingUnlike,
            LikeState::Stranded => FfiLikeState::Stranded,
        }
    }
}

/// What a tap asks the host to send. `Create` means build a create request
/// for the tapped item; `Delete` means delete the favourite id written to
/// the tap's out-pointer. `Invalid` reports a null or unreadable argument.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiToggleAction {
    Create = 0,
    Delete = 1,
    LocalOnly = 2,
    Busy = 3,
    Invalid = 4,
}

impl From<&ToggleAction> for FfiToggleAction {
    fn from(a: &ToggleAction) -> Self {
        match a {
            ToggleAction::Create { .. } => FfiToggleAction::Create,
            ToggleAction::Delete { .. } => FfiToggleAction::Delete,
            ToggleAction::LocalOnly => FfiToggleAction::LocalOnly,
            ToggleAction::Busy => FfiToggleAction::Busy,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiResolution {
    Settled = 0,
    Reverted = 1,
    Stranded = 2,
    RequeryNeeded = 3,
    Unexpected = 4,
    /// A null or unreadable argument; nothing changed.
    Invalid = 5,
}

impl From<Resolution> for FfiResolution {
    fn from(r: Resolution) -> Self {
        match r {
            Resolution::Settled => FfiResolution::Settled,
            Resolution::Reverted => FfiResolution::Reverted,
            Resolution::Stranded => FfiResolution::Stranded,
            Resolution::RequeryNeeded => FfiResolution::RequeryNeeded,
            Resolution::Unexpected => FfiResolution::Unexpected,
        }
    }
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload named by `data_tag`. On failure `data` is null,
/// `error_message` is a C string and `http_status` is set for
/// `BadStatus`/`NoContent`.
#[repr(C)]
pub struct FfiDogResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiDogResult {
    fn ok<T>(data_tag: FfiDataTag, payload: T) -> *mut Self {
        Box::into_raw(Box::new(FfiDogResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data: Box::into_raw(Box::new(payload)) as *mut c_void,
        }))
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiDogResult {
            error_code,
            error_message: c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_empty() -> *mut Self {
        Box::into_raw(Box::new(FfiDogResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_items(items: Vec<Item>) -> *mut Self {
        match into_raw_slice(items, FfiItem::from) {
            Some((items, len)) => Self::ok(FfiDataTag::ItemList, FfiItemList { items, len }),
            None => Self::too_large("item list"),
        }
    }

    pub(crate) fn ok_favourites(favourites: Vec<doggie_core::Favourite>) -> *mut Self {
        match into_raw_slice(favourites, FfiFavourite::from) {
            Some((items, len)) => Self::ok(FfiDataTag::FavouriteList, FfiFavouriteList { items, len }),
            None => Self::too_large("favourite list"),
        }
    }

    pub(crate) fn ok_post_result(result: PostResult) -> *mut Self {
        Self::ok(
            FfiDataTag::PostResult,
            FfiPostResult {
                message: c_string_opt(result.message),
                id: result.id.unwrap_or_default(),
                has_id: result.id.is_some(),
            },
        )
    }

    pub(crate) fn ok_upload_result(result: UploadResult) -> *mut Self {
        let approval = FfiApproval::from(result.approval());
        Self::ok(
            FfiDataTag::UploadResult,
            FfiUploadResult {
                id: c_string_opt(result.id),
                url: c_string_opt(result.url),
                approval,
            },
        )
    }

    pub(crate) fn ok_my_items(mine: Vec<MyItem>) -> *mut Self {
        let converted = into_raw_slice(mine, |m| FfiMyItem {
            id: c_string_opt(m.id),
            url: c_string_opt(m.url),
        });
        match converted {
            Some((items, len)) => Self::ok(FfiDataTag::MyItemList, FfiMyItemList { items, len }),
            None => Self::too_large("upload list"),
        }
    }

    pub(crate) fn ok_feed_update(update: FeedUpdate) -> *mut Self {
        Self::ok(FfiDataTag::FeedUpdate, FfiFeedUpdate::from(update))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        Self::failure(FfiErrorCode::from(&err), err.status().unwrap_or(0), err.to_string())
    }

    pub(crate) fn too_large(what: &str) -> *mut Self {
        Self::failure(FfiErrorCode::TooLarge, 0, format!("{what} too large for a u32 length"))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    pub(crate) fn panic(function: &str) -> *mut Self {
        error!(function, "panic caught at the ffi boundary");
        Self::failure(FfiErrorCode::Panic, 0, format!("panic in {function}"))
    }

    /// # Safety
    /// `result` must come from one of the constructors above and not have
    /// been freed.
    pub(crate) unsafe fn free(result: *mut Self) {
        let result = unsafe { Box::from_raw(result) };
        unsafe { free_c_string(result.error_message) };
        if result.data.is_null() {
            return;
        }
        unsafe {
            match result.data_tag {
                FfiDataTag::None => {}
                FfiDataTag::ItemList => {
                    let list = Box::from_raw(result.data as *mut FfiItemList);
                    for item in from_raw_slice(list.items, list.len) {
                        free_c_string(item.id);
                        free_c_string(item.url);
                        free_c_string(item.breed_name);
                    }
                }
                FfiDataTag::FavouriteList => {
                    let list = Box::from_raw(result.data as *mut FfiFavouriteList);
                    for f in from_raw_slice(list.items, list.len) {
                        free_c_string(f.image_id);
                        free_c_string(f.image_url);
                        free_c_string(f.created_at);
                    }
                }
                FfiDataTag::PostResult => {
                    let post = Box::from_raw(result.data as *mut FfiPostResult);
                    free_c_string(post.message);
                }
                FfiDataTag::UploadResult => {
                    let upload = Box::from_raw(result.data as *mut FfiUploadResult);
                    free_c_string(upload.id);
                    free_c_string(upload.url);
                }
                FfiDataTag::MyItemList => {
                    let list = Box::from_raw(result.data as *mut FfiMyItemList);
                    for m in from_raw_slice(list.items, list.len) {
                        free_c_string(m.id);
                        free_c_string(m.url);
                    }
                }
                FfiDataTag::FeedUpdate => {
                    drop(Box::from_raw(result.data as *mut FfiFeedUpdate));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vec_becomes_null_slice() {
        let (ptr, len) = into_raw_slice(Vec::<u8>::new(), |b| b).unwrap();
        assert!(ptr.is_null());
        assert_eq!(len, 0);
    }

    #[test]
    fn slice_round_trips_through_raw_parts() {
        let (ptr, len) = into_raw_slice(vec![1u8, 2, 3], |b| b * 2).unwrap();
        assert_eq!(len, 3);
        assert_eq!(unsafe { from_raw_slice(ptr, len) }, vec![2, 4, 6]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn lengths_past_u32_are_refused() {
        let too_long = u32::MAX as usize + 1;
        assert_eq!(slice_len(too_long), None);
        assert_eq!(slice_len(u32::MAX as usize), Some(u32::MAX));

        // zero-sized elements, so the oversized vector costs no memory
        let mut converted = 0;
        let refused = into_raw_slice(vec![(); too_long], |u| {
            converted += 1;
            u
        });
        assert!(refused.is_none());
        assert_eq!(converted, 0);
    }

    #[test]
    fn error_codes_follow_api_errors() {
        assert_eq!(FfiErrorCode::from(&ApiError::UrlMissing), FfiErrorCode::UrlMissing);
        assert_eq!(FfiErrorCode::from(&ApiError::Parsing("x".into())), FfiErrorCode::Parsing);
        assert_eq!(
            FfiErrorCode::from(&ApiError::BadStatus {
                status: 404,
                body: String::new()
            }),
            FfiErrorCode::BadStatus
        );
    }

    #[test]
    fn feed_update_carries_count() {
        let update = FfiFeedUpdate::from(FeedUpdate::Appended { page: 1, count: 20 });
        assert_eq!(update.count, 20);
        assert!(!update.stale);
    }
}
