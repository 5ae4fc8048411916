//! FFI interface for the crawler host
//!
//! Provides C-compatible functions for resolving course records from HTML.
//! Records are returned as JSON.

use std::ffi::{c_char, CStr, CString};
use std::ptr;
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::document::CoursePage;
use crate::fields::CourseField;
use crate::record::RecordAssembler;

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_course_result
#[repr(C)]
pub struct CourseResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if resolution failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

static ASSEMBLER: OnceLock<Result<RecordAssembler, String>> = OnceLock::new();

// Built from the bundled tables on first use
fn assembler() -> Result<&'static RecordAssembler, &'static str> {
    ASSEMBLER
        .get_or_init(|| RecordAssembler::with_builtin_tables().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(String::as_str)
}

/// Resolve every course field of an HTML page.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `url` - Canonical page URL (null-terminated)
///
/// # Returns
/// CourseResultFFI with either json_ptr set to a serialized CourseRecord
/// (success) or error_ptr set (failure)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `url` must be a valid null-terminated C string
/// - Caller must free the result via `free_course_result`
#[no_mangle]
pub unsafe extern "C" fn resolve_course_record(
    html_ptr: *const c_char,
    html_len: usize,
    url: *const c_char,
) -> CourseResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };
    let url = match read_c_str(url, "URL") {
        Ok(url) => url,
        Err(msg) => return make_error_result(&msg),
    };
    let assembler = match assembler() {
        Ok(a) => a,
        Err(e) => return make_error_result(&format!("Failed to load resolver tables: {}", e)),
    };

    let page = CoursePage::parse(html, url);
    make_json_result(&assembler.assemble(&page))
}

/// Resolve a single course field, e.g. `fees_domestic`.
///
/// # Safety
/// Same as resolve_course_record; `field` must be a valid null-terminated C string
#[no_mangle]
pub unsafe extern "C" fn resolve_course_field(
    html_ptr: *const c_char,
    html_len: usize,
    url: *const c_char,
    field: *const c_char,
) -> CourseResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };
    let url = match read_c_str(url, "URL") {
        Ok(url) => url,
        Err(msg) => return make_error_result(&msg),
    };
    let field: CourseField = match read_c_str(field, "field name") {
        Ok(name) => match name.parse() {
            Ok(field) => field,
            Err(e) => return make_error_result(&e.to_string()),
        },
        Err(msg) => return make_error_result(&msg),
    };
    let assembler = match assembler() {
        Ok(a) => a,
        Err(e) => return make_error_result(&format!("Failed to load resolver tables: {}", e)),
    };

    let page = CoursePage::parse(html, url);
    make_json_result(&assembler.resolve_field(&page, field))
}

/// Free a CourseResultFFI returned by this module
///
/// # Safety
/// - `result` must have been returned by `resolve_course_record` or `resolve_course_field`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_course_result(result: CourseResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

/// Install a stderr log subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
#[no_mangle]
pub extern "C" fn course_parser_init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

unsafe fn read_html<'a>(html_ptr: *const c_char, html_len: usize) -> Result<&'a str, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice).map_err(|_| "Invalid UTF-8 in HTML content")
}

unsafe fn read_c_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("{} is null", what));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| format!("Invalid UTF-8 in {}", what))
}

fn make_json_result<T: serde::Serialize>(value: &T) -> CourseResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => CourseResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> CourseResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    CourseResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
