use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

// Compile regexes once at startup for performance
static CREDENTIAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(api_key|secret|password|token)[\s:="'`]+([A-Za-z0-9_\-]{16,})"#)
        .expect("Failed to compile credential regex")
});

static OPAQUE_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9\-_/+=]{40,}\b").expect("Failed to compile opaque token regex")
});

static ERROR_SIGNAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(error|exception|fatal|failed|traceback|critical|panic)\b")
        .expect("Failed to compile error signal regex")
});

/// Mask credential-looking values before the text leaves the process.
///
/// Covers `key=value` style assignments for common secret names and long
/// opaque strings that look like bearer tokens. A safety pass, not a
/// complete redaction solution.
pub fn mask_sensitive(text: &str) -> String {
    let masked = CREDENTIAL_REGEX.replace_all(text, "${1}=\"<MASKED>\"");
    OPAQUE_TOKEN_REGEX
        .replace_all(&masked, "<MASKED_TOKEN>")
        .into_owned()
}

/// Collect the distinct failure keywords present in the text, uppercased
/// and sorted. Runs on the original text, before masking.
pub fn scan_error_signals(text: &str) -> Vec<String> {
    let signals: BTreeSet<String> = ERROR_SIGNAL_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_uppercase())
        .collect();
    signals.into_iter().collect()
}
