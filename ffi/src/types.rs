//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String` and enums with explicit discriminants.
//! Payloads cross as JSON text so the host can decode them with whatever
//! JSON library the UI layer already uses. Conversion functions live here to
//! keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::sync::RwLock;

use wanfetch_core::{Notifier, RequestClient, RequestError, Resolved, UreqTransport};

/// Opaque handle to a client and the runtime that drives it. C callers
/// receive a pointer to this and pass it back into every FFI function.
pub struct FfiClient {
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) inner: RequestClient<UreqTransport, CallbackNotifier>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Host toast hook. `message` is only valid for the duration of the call.
///
/// Runs on the thread blocked inside `wanfetch_get`/`wanfetch_post`, while
/// the client's runtime is driving that request. It must not call back into
/// the same client: a nested request cannot start on the busy runtime and
/// comes back as `FfiErrorCode::Panic`. Queue the message and return.
pub type ToastCallback = extern "C" fn(message: *const c_char, user_data: *mut c_void);

#[derive(Clone, Copy)]
struct Callback {
    func: ToastCallback,
    user_data: *mut c_void,
}

// The host promises `user_data` may be used from whichever thread issues
// requests.
unsafe impl Send for Callback {}
unsafe impl Sync for Callback {}

/// Forwards notifications to the host callback, or to the log when none is
/// registered.
#[derive(Default)]
pub struct CallbackNotifier {
    slot: RwLock<Option<Callback>>,
}

impl CallbackNotifier {
    pub(crate) fn set(&self, func: Option<ToastCallback>, user_data: *mut c_void) {
        let callback = func.map(|func| Callback { func, user_data });
        match self.slot.write() {
            Ok(mut slot) => *slot = callback,
            Err(poisoned) => *poisoned.into_inner() = callback,
        }
    }
}

impl Notifier for CallbackNotifier {
    fn notify(&self, message: &str) {
        let callback = match self.slot.read() {
            Ok(slot) => *slot,
            Err(poisoned) => *poisoned.into_inner(),
        };
        match callback {
            Some(cb) => {
                let message = to_cstring(message);
                (cb.func)(message.as_ptr(), cb.user_data);
            }
            None => log::warn!("notify: {message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend selector
// ---------------------------------------------------------------------------

/// Envelope shape of the target host.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiBackend {
    Primary = 0,
    Other = 1,
}

impl From<wanfetch_core::Backend> for FfiBackend {
    fn from(b: wanfetch_core::Backend) -> Self {
        match b {
            wanfetch_core::Backend::Primary => FfiBackend::Primary,
            wanfetch_core::Backend::Other => FfiBackend::Other,
        }
    }
}

/// Decode a raw backend value from C. Unknown values are rejected rather
/// than transmuted.
pub(crate) fn backend_from_raw(raw: u32) -> Option<wanfetch_core::Backend> {
    match raw {
        0 => Some(wanfetch_core::Backend::Primary),
        1 => Some(wanfetch_core::Backend::Other),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Which arm of `Resolved` the call ended in.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiOutcome {
    Live = 0,
    Fallback = 1,
    Failed = 2,
}

/// Failure kind. `Ok` for live results.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Timeout = 1,
    HttpStatus = 2,
    Parse = 3,
    Network = 4,
    Rejected = 5,
    InvalidParams = 6,
    NullArg = 7,
    InvalidArg = 8,
    Panic = 9,
}

impl From<&RequestError> for FfiErrorCode {
    fn from(err: &RequestError) -> Self {
        match err {
            RequestError::Timeout { .. } => FfiErrorCode::Timeout,
            RequestError::HttpStatus { .. } => FfiErrorCode::HttpStatus,
            RequestError::Parse(_) => FfiErrorCode::Parse,
            RequestError::Network(_) => FfiErrorCode::Network,
            RequestError::Rejected { .. } => FfiErrorCode::Rejected,
            RequestError::InvalidParams(_) => FfiErrorCode::InvalidParams,
        }
    }
}

/// Result of `wanfetch_get` / `wanfetch_post`.
///
/// `payload_json` is the envelope (live) or fixture (fallback) as JSON text,
/// null when the call failed. `http_status` is set only for
/// `FfiErrorCode::HttpStatus`. The caller frees the whole value with
/// `wanfetch_free_result`.
#[repr(C)]
pub struct FfiFetchResult {
    pub outcome: FfiOutcome,
    pub error_code: FfiErrorCode,
    pub http_status: u16,
    pub error_message: *mut c_char,
    pub payload_json: *mut c_char,
}

impl FfiFetchResult {
    pub(crate) fn from_resolved(resolved: Resolved) -> *mut Self {
        let (outcome, payload, failure) = match resolved {
            Resolved::Live(payload) => (FfiOutcome::Live, Some(payload), None),
            Resolved::Fallback { payload, reason } => {
                (FfiOutcome::Fallback, Some(payload), Some(reason))
            }
            Resolved::Failed(err) => (FfiOutcome::Failed, None, Some(err)),
        };
        let http_status = match &failure {
            Some(RequestError::HttpStatus { status }) => *status,
            _ => 0,
        };
        Box::into_raw(Box::new(FfiFetchResult {
            outcome,
            error_code: failure.as_ref().map_or(FfiErrorCode::Ok, FfiErrorCode::from),
            http_status,
            error_message: failure.map_or(std::ptr::null_mut(), |e| into_raw(&e.to_string())),
            payload_json: payload.map_or(std::ptr::null_mut(), |p| into_raw(&p.to_string())),
        }))
    }

    pub(crate) fn error(code: FfiErrorCode, message: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiFetchResult {
            outcome: FfiOutcome::Failed,
            error_code: code,
            http_status: 0,
            error_message: into_raw(message),
            payload_json: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(message: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, message)
    }
}

/// Interior NULs cannot cross as C strings; they are dropped.
pub(crate) fn to_cstring(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

pub(crate) fn into_raw(s: &str) -> *mut c_char {
    to_cstring(s).into_raw()
}
