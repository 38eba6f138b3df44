//! C FFI bindings for roster-core
//!
//! Every function takes and returns UTF-8 C strings. Structured values cross
//! the boundary as JSON in the same shape the JSON store uses.

use roster_core::{FreshRecords, HeroRecord, ReconcileReport};
use serde::Serialize;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

#[derive(Serialize)]
struct ReconcileOutput<'a> {
    records: &'a [HeroRecord],
    report: &'a ReconcileReport,
}

/// Borrow a C string as `&str`, or `None` if null or not UTF-8
unsafe fn borrow_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

fn into_c_string<T: Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => CString::new(json)
            .map(CString::into_raw)
            .unwrap_or(ptr::null_mut()),
        Err(e) => {
            log::error!("failed to serialize FFI result: {}", e);
            ptr::null_mut()
        }
    }
}

/// Decode an investment cell into a JSON array of builds
///
/// # Safety
/// - `cell` must be a valid C string
/// - Returns null on error
/// - Caller must free the returned string with `roster_free_string`
#[no_mangle]
pub unsafe extern "C" fn roster_decode_investment(cell: *const c_char) -> *mut c_char {
    match borrow_str(cell) {
        Some(cell) => into_c_string(&roster_core::decode_investment(cell)),
        None => ptr::null_mut(),
    }
}

/// Join the two tab-separated sheet exports into a JSON object of records
/// by key
///
/// # Safety
/// - `metadata` and `builds` must be valid C strings
/// - Returns null on error
/// - Caller must free the returned string with `roster_free_string`
#[no_mangle]
pub unsafe extern "C" fn roster_assemble(
    metadata: *const c_char,
    builds: *const c_char,
) -> *mut c_char {
    let (Some(metadata), Some(builds)) = (borrow_str(metadata), borrow_str(builds)) else {
        return ptr::null_mut();
    };

    let metadata = roster_core::parse_tsv(metadata, "metadata");
    let builds = roster_core::parse_tsv(builds, "builds");
    into_c_string(&roster_core::assemble_records(&metadata, &builds))
}

/// Reconcile fresh records with the previous roster
///
/// `fresh` is a JSON object of records by key, as returned by
/// `roster_assemble`; `previous` is a JSON array of records. The result is
/// a JSON object with `records` (the next roster) and `report`.
///
/// # Safety
/// - `fresh` and `previous` must be valid C strings
/// - Returns null on error
/// - Caller must free the returned string with `roster_free_string`
#[no_mangle]
pub unsafe extern "C" fn roster_reconcile(
    fresh: *const c_char,
    previous: *const c_char,
) -> *mut c_char {
    let (Some(fresh), Some(previous)) = (borrow_str(fresh), borrow_str(previous)) else {
        return ptr::null_mut();
    };

    let fresh: FreshRecords = match serde_json::from_str(fresh) {
        Ok(records) => records,
        Err(e) => {
            log::error!("invalid fresh records: {}", e);
            return ptr::null_mut();
        }
    };
    let previous: Vec<HeroRecord> = match serde_json::from_str(previous) {
        Ok(records) => records,
        Err(e) => {
            log::error!("invalid previous records: {}", e);
            return ptr::null_mut();
        }
    };

    let result = roster_core::reconcile(&fresh, &previous);
    into_c_string(&ReconcileOutput {
        records: &result.records,
        report: &result.report,
    })
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by a roster_* function or null
#[no_mangle]
pub unsafe extern "C" fn roster_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn take(s: *mut c_char) -> serde_json::Value {
        assert!(!s.is_null());
        let json = CStr::from_ptr(s).to_str().unwrap().to_string();
        roster_free_string(s);
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_decode_investment() {
        let cell = CString::new("20/e30УСК").unwrap();
        let value = unsafe { take(roster_decode_investment(cell.as_ptr())) };

        let builds = value.as_array().unwrap();
        assert_eq!(builds.len(), 2);
        assert_eq!(builds[1]["is_alternative"], true);
        assert_eq!(builds[1]["engraving_level"], 30);
        assert_eq!(builds[1]["engraving_nodes"][0]["translated"], "VEL");
    }

    #[test]
    fn test_null_input() {
        unsafe {
            assert!(roster_decode_investment(ptr::null()).is_null());
            assert!(roster_reconcile(ptr::null(), ptr::null()).is_null());
            roster_free_string(ptr::null_mut());
        }
    }

    #[test]
    fn test_assemble_then_reconcile() {
        let metadata = CString::new("h\nx\tx\tx\tThal\tТал").unwrap();
        let builds = CString::new("h\nx\tx\tx\tТал\tx\t309e60\tx\t\tS").unwrap();

        let fresh = unsafe { roster_assemble(metadata.as_ptr(), builds.as_ptr()) };
        assert!(!fresh.is_null());

        let previous = CString::new("[]").unwrap();
        let value = unsafe { take(roster_reconcile(fresh, previous.as_ptr())) };
        unsafe { roster_free_string(fresh) };

        assert_eq!(value["report"]["created"], 1);
        assert_eq!(value["records"][0]["key"], "Тал");
        assert_eq!(value["records"][0]["localized_name"], "Thal");
        assert_eq!(value["records"][0]["lineage"], "linked");
    }

    #[test]
    fn test_reconcile_rejects_bad_json() {
        let fresh = CString::new("{}").unwrap();
        let previous = CString::new("not json").unwrap();
        assert!(unsafe { roster_reconcile(fresh.as_ptr(), previous.as_ptr()) }.is_null());
    }
}
