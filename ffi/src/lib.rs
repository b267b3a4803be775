//! C-ABI wrapper around `wanfetch-core`.
//!
//! # Overview
//! Lets the mobile UI host issue `get`/`post` calls through `extern "C"`
//! functions. Each client owns a current-thread tokio runtime and blocks the
//! calling thread for the duration of one request (bounded by the configured
//! timeout). Notifications are forwarded to a host callback.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Parameters and payloads cross as JSON text.
//! - A single `FfiFetchResult` conveys live payloads, fallback payloads, and
//!   failures uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `wanfetch_free_*` function to release them.

pub mod types;

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use wanfetch_core::{ClientConfig, FallbackFixture, Params, RequestClient, UreqTransport};

use types::*;

/// Borrow a C string as `&str`. Null and invalid UTF-8 both yield `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn opt_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn params_from_raw(raw: Option<&str>) -> Result<Params, wanfetch_core::RequestError> {
    match raw {
        None => Ok(Params::new()),
        Some(json) if json.trim().is_empty() => Ok(Params::new()),
        Some(json) => Params::from_json_str(json),
    }
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client from a JSON configuration document.
///
/// `config_json` may be null for defaults. `WANFETCH_TIMEOUT_MS` and
/// `WANFETCH_PRIMARY_BASE_URL` in the environment override the document.
/// Returns null if the configuration or the fallback fixture is invalid, the
/// runtime cannot start, or an internal panic occurs.
/// The caller must free the returned pointer with `wanfetch_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn wanfetch_client_new(config_json: *const c_char) -> *mut FfiClient {
    catch_unwind(|| {
        let raw = if config_json.is_null() {
            None
        } else {
            match unsafe { opt_str(config_json) } {
                Some(raw) => Some(raw),
                None => return std::ptr::null_mut(),
            }
        };
        match client_from_config(raw, |key| std::env::var(key).ok()) {
            Some(client) => Box::into_raw(Box::new(client)),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

fn client_from_config<F>(raw: Option<&str>, lookup: F) -> Option<FfiClient>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match raw {
        Some(raw) => ClientConfig::from_json_str(raw),
        None => Ok(ClientConfig::default()),
    }
    .and_then(|config| config.apply_env(lookup));
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("rejected client config: {e}");
            return None;
        }
    };
    let fallback = match FallbackFixture::for_config(&config) {
        Ok(fallback) => fallback,
        Err(e) => {
            log::error!("failed to load fallback fixture: {e}");
            return None;
        }
    };
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("failed to start runtime: {e}");
            return None;
        }
    };
    let transport = UreqTransport::new(config.timeout());
    let inner =
        RequestClient::new(transport, CallbackNotifier::default(), config).with_fallback(fallback);
    Some(FfiClient { runtime, inner })
}

/// Free a client created by `wanfetch_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn wanfetch_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

/// Register (or clear, with a null `callback`) the toast hook.
///
/// Returns false if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn wanfetch_client_set_notifier(
    client: *const FfiClient,
    callback: Option<ToastCallback>,
    user_data: *mut c_void,
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return false;
        }
        let client = unsafe { &*client };
        client.inner.notifier().set(callback, user_data);
        true
    }))
    .unwrap_or(false)
}

/// Classify `url` with the configured primary base address.
///
/// Null arguments classify as `Other`.
#[unsafe(no_mangle)]
pub extern "C" fn wanfetch_backend_for(client: *const FfiClient, url: *const c_char) -> FfiBackend {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiBackend::Other;
        }
        let client = unsafe { &*client };
        match unsafe { opt_str(url) } {
            Some(url) => client.inner.backend_for(url).into(),
            None => FfiBackend::Other,
        }
    }))
    .unwrap_or(FfiBackend::Other)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Issue a GET.
///
/// `backend` is an `FfiBackend` discriminant. `params_json` is a flat JSON
/// object or null; `cookie` may be null for none. Blocks until the call
/// resolves. The caller must free the result with `wanfetch_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn wanfetch_get(
    client: *const FfiClient,
    backend: u32,
    url: *const c_char,
    params_json: *const c_char,
    cookie: *const c_char,
) -> *mut FfiFetchResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiFetchResult::null_arg("client");
        }
        let Some(url) = (unsafe { opt_str(url) }).filter(|u| !u.is_empty()) else {
            return FfiFetchResult::null_arg("url");
        };
        let Some(backend) = backend_from_raw(backend) else {
            return FfiFetchResult::error(FfiErrorCode::InvalidArg, "unknown backend");
        };
        let params = match params_from_raw(unsafe { opt_str(params_json) }) {
            Ok(params) => params,
            Err(e) => return FfiFetchResult::error(FfiErrorCode::InvalidParams, &e.to_string()),
        };
        let cookie = unsafe { opt_str(cookie) }.unwrap_or_default();
        let client = unsafe { &*client };
        let resolved = client
            .runtime
            .block_on(client.inner.get(backend, url, &params, cookie));
        FfiFetchResult::from_resolved(resolved)
    }))
    .unwrap_or_else(|_| FfiFetchResult::panic("panic in wanfetch_get"))
}

/// Issue a multipart POST. Keys starting with `_` are not transmitted.
///
/// Same argument conventions as `wanfetch_get`.
#[unsafe(no_mangle)]
pub extern "C" fn wanfetch_post(
    client: *const FfiClient,
    url: *const c_char,
    params_json: *const c_char,
    cookie: *const c_char,
) -> *mut FfiFetchResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiFetchResult::null_arg("client");
        }
        let Some(url) = (unsafe { opt_str(url) }).filter(|u| !u.is_empty()) else {
            return FfiFetchResult::null_arg("url");
        };
        let params = match params_from_raw(unsafe { opt_str(params_json) }) {
            Ok(params) => params,
            Err(e) => return FfiFetchResult::error(FfiErrorCode::InvalidParams, &e.to_string()),
        };
        let cookie = unsafe { opt_str(cookie) }.unwrap_or_default();
        let client = unsafe { &*client };
        let resolved = client
            .runtime
            .block_on(client.inner.post(url, &params, cookie));
        FfiFetchResult::from_resolved(resolved)
    }))
    .unwrap_or_else(|_| FfiFetchResult::panic("panic in wanfetch_post"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiFetchResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn wanfetch_free_result(result: *mut FfiFetchResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.payload_json.is_null() {
            drop(unsafe { CString::from_raw(result.payload_json) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn wanfetch_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
