// src/utils/filename.rs

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_.]").expect("valid regex"));

/// Makes a string safe as a storage key segment: whitespace runs become `_`,
/// then everything outside `[A-Za-z0-9_.]` is dropped (accents included).
pub fn sanitize(name: &str) -> String {
    let underscored = WHITESPACE.replace_all(name, "_");
    DISALLOWED.replace_all(&underscored, "").into_owned()
}

/// Object key for a newly created exam.
pub fn new_exam_key(course: &str, exam_type: &str, cycle: &str, year: i32, period: &str, millis: i64) -> String {
    let name = format!("{course}_{exam_type}_{cycle}_{year}_{period}_{millis}.pdf");
    format!("pdfs/{}", sanitize(&name))
}

/// Object key for a replacement file attached while editing exam `id`.
pub fn replacement_key(id: i64, millis: i64) -> String {
    format!("pdfs/{id}_{millis}.pdf")
}
