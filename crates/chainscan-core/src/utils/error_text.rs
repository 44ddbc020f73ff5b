//! Error text cleanup for the live table.
//!
//! Transport errors carry long, repetitive prefixes (`error sending request for url (...)`)
//! that push the useful part out of a narrow column. Full text is still logged at debug
//! level by the caller; only the displayed string is shortened.

const NOISY_PREFIXES: &[&str] = &[
    "Network error: ",
    "Protocol error: ",
    "Config error: ",
    "RPC error ",
    "error sending request for url",
    "error trying to connect: ",
    "client error (Connect): ",
    "tcp connect error: ",
];

const ELLIPSIS: char = '…';

/// Strips noisy transport prefixes, collapses whitespace and truncates to `max_len` chars.
///
/// Truncation happens on a char boundary and appends `…`, so the result is at most
/// `max_len` characters long. A `max_len` of 0 disables truncation.
#[must_use]
pub fn clean_error(message: &str, max_len: usize) -> String {
    let mut text = message.trim();

    loop {
        let before = text;
        for prefix in NOISY_PREFIXES {
            if let Some(rest) = text.strip_prefix(prefix) {
                text = rest.trim_start();
            }
        }
        // `(http://host/path): ` or `Post "http://...": ` wrappers around the real cause
        if text.starts_with('(') {
            if let Some(end) = text.find("): ") {
                text = text[end + 3..].trim_start();
            }
        }
        if let Some(rest) = text.strip_prefix("Post \"") {
            if let Some(end) = rest.find("\": ") {
                text = rest[end + 3..].trim_start();
            }
        }
        if text == before {
            break;
        }
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_len)
}

fn truncate_chars(text: &str, max_len: usize) -> String {
    if max_len == 0 || text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push(ELLIPSIS);
    out
}
