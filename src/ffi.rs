//! FFI bindings for the Lifeflow engine
//!
//! This module provides C-compatible functions for calling the engine from other
//! languages. All functions take null-terminated C strings and return allocated
//! memory that must be freed by the caller using `lifeflow_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::dates::{parse_date_key, today};
use crate::error::ComputeError;
use crate::pipeline::{recalculate_snapshot, score_entry_json, InsightsProcessor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// NULL means the local calendar date
unsafe fn reference_date(ptr: *const c_char) -> Result<NaiveDate, ComputeError> {
    if ptr.is_null() {
        return Ok(today());
    }
    let key = cstr_to_string(ptr)
        .ok_or_else(|| ComputeError::InvalidDate("date is not valid UTF-8".to_string()))?;
    parse_date_key(&key)
}

fn finish(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute the insights report for a snapshot with default configuration.
///
/// # Safety
/// - `snapshot_json` must be a valid null-terminated C string.
/// - `today` must be a `YYYY-MM-DD` C string, or NULL for the local date.
/// - Returns a newly allocated string that must be freed with `lifeflow_free_string`.
/// - Returns NULL on error; call `lifeflow_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn lifeflow_insights(
    snapshot_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = reference_date(today)
        .and_then(|date| InsightsProcessor::new().process_json(&json_str, date));
    finish(result)
}

/// Re-score every entry of a snapshot and return the updated snapshot JSON.
///
/// # Safety
/// - `snapshot_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `lifeflow_free_string`.
/// - Returns NULL on error; call `lifeflow_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn lifeflow_recalculate(snapshot_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(recalculate_snapshot(&json_str).map(|(json, _)| json))
}

/// Score a single entry against a JSON array of habits.
///
/// # Safety
/// - `entry_json` and `habits_json` must be valid null-terminated C strings.
/// - Returns the score in [0, 10], or -1.0 on error; call
///   `lifeflow_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn lifeflow_health_score(
    entry_json: *const c_char,
    habits_json: *const c_char,
) -> f64 {
    clear_last_error();

    let (Some(entry_str), Some(habits_str)) =
        (cstr_to_string(entry_json), cstr_to_string(habits_json))
    else {
        set_last_error("Invalid JSON string pointer");
        return -1.0;
    };

    match score_entry_json(&entry_str, &habits_str) {
        Ok(score) => score,
        Err(e) => {
            set_last_error(&e.to_string());
            -1.0
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to an InsightsProcessor
pub struct InsightsProcessorHandle {
    processor: InsightsProcessor,
}

/// Create a processor from TOML configuration, or defaults when NULL.
///
/// # Safety
/// - `config_toml` must be a valid null-terminated C string or NULL.
/// - Must be freed with `lifeflow_processor_free`.
/// - Returns NULL on error; call `lifeflow_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn lifeflow_processor_new(
    config_toml: *const c_char,
) -> *mut InsightsProcessorHandle {
    clear_last_error();

    let config = if config_toml.is_null() {
        EngineConfig::default()
    } else {
        let parsed = cstr_to_string(config_toml)
            .ok_or_else(|| ComputeError::ConfigError("config is not valid UTF-8".to_string()))
            .and_then(|s| EngineConfig::from_toml_str(&s));
        match parsed {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(InsightsProcessorHandle {
        processor: InsightsProcessor::with_config(config),
    });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `lifeflow_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn lifeflow_processor_free(processor: *mut InsightsProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Compute the insights report with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `lifeflow_processor_new`.
/// - `snapshot_json` must be a valid null-terminated C string.
/// - `today` must be a `YYYY-MM-DD` C string, or NULL for the local date.
/// - Returns a newly allocated string that must be freed with `lifeflow_free_string`.
/// - Returns NULL on error; call `lifeflow_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn lifeflow_processor_insights(
    processor: *const InsightsProcessorHandle,
    snapshot_json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let json_str = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result =
        reference_date(today).and_then(|date| handle.processor.process_json(&json_str, date));
    finish(result)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Lifeflow functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Lifeflow function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn lifeflow_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Lifeflow function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn lifeflow_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the engine library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn lifeflow_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> CString {
        CString::new(
            r#"{
            "habits": [{"id": "run", "name": "Run", "type": "good", "weight": 8}],
            "entries": [
                {"date": "2024-04-01", "mood": 6, "energy": 3, "sleep": 3,
                 "habitCompletions": [{"habitId": "run", "completed": true}], "healthScore": 9},
                {"date": "2024-04-02", "mood": 7, "energy": 3, "sleep": 3,
                 "habitCompletions": [{"habitId": "run", "completed": true}], "healthScore": 1}
            ]
        }"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        lifeflow_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_insights() {
        unsafe {
            let json = sample_snapshot();
            let today = CString::new("2024-04-02").unwrap();

            let result = take_string(lifeflow_insights(json.as_ptr(), today.as_ptr()));
            let report: serde_json::Value = serde_json::from_str(&result).unwrap();

            assert_eq!(report["generatedFor"], "2024-04-02");
            assert_eq!(report["staleScores"], 1);
            assert_eq!(report["streaks"][0]["currentStreak"], 2);
        }
    }

    #[test]
    fn test_ffi_recalculate() {
        unsafe {
            let json = sample_snapshot();
            let result = take_string(lifeflow_recalculate(json.as_ptr()));
            let snapshot: serde_json::Value = serde_json::from_str(&result).unwrap();

            // (7 + 3 + 3) / 3 + 5 = 9.33
            assert_eq!(snapshot["entries"][1]["healthScore"], 9.3);
        }
    }

    #[test]
    fn test_ffi_health_score() {
        unsafe {
            let entry = CString::new(
                r#"{"date": "2024-04-01", "mood": 5, "energy": 5, "sleep": 5, "habitCompletions": []}"#,
            )
            .unwrap();
            let habits = CString::new("[]").unwrap();

            assert_eq!(lifeflow_health_score(entry.as_ptr(), habits.as_ptr()), 5.0);
            assert_eq!(lifeflow_health_score(ptr::null(), habits.as_ptr()), -1.0);
            assert!(!lifeflow_last_error().is_null());

            let bad = CString::new(
                r#"{"date": "2024-04-01", "mood": 11, "energy": 5, "sleep": 5}"#,
            )
            .unwrap();
            assert_eq!(lifeflow_health_score(bad.as_ptr(), habits.as_ptr()), -1.0);
            let msg = CStr::from_ptr(lifeflow_last_error()).to_str().unwrap();
            assert!(msg.contains("mood"));
        }
    }

    #[test]
    fn test_ffi_processor_with_config() {
        unsafe {
            let config = CString::new("[insights]\nhide_empty_streaks = false\n").unwrap();
            let processor = lifeflow_processor_new(config.as_ptr());
            assert!(!processor.is_null());

            let json = sample_snapshot();
            let result = take_string(lifeflow_processor_insights(
                processor,
                json.as_ptr(),
                ptr::null(),
            ));
            assert!(result.contains("generatedFor"));

            lifeflow_processor_free(processor);

            let bad = CString::new("insights = [").unwrap();
            assert!(lifeflow_processor_new(bad.as_ptr()).is_null());
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = lifeflow_insights(invalid_json.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = lifeflow_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            let json = sample_snapshot();
            let bad_date = CString::new("2024-4-2").unwrap();
            assert!(lifeflow_insights(json.as_ptr(), bad_date.as_ptr()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = lifeflow_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::ENGINE_VERSION);
        }
    }
}
