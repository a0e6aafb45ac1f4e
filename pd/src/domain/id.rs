//! Record ID generation
//!
//! All IDs use the format: `{6-char-hex}-{kind}-{slug}`
//! Example: `019430-msg-hub-to-dao`

/// Generate an ID from a record kind and a human-readable title
pub fn generate_id(kind: &str, title: &str) -> String {
    let uuid = uuid::Uuid::now_v7();
    let simple = uuid.simple().to_string();
    // v7 leads with the timestamp, so take the random tail for uniqueness within a millisecond
    let hex = &simple[simple.len() - 6..];
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", hex, kind)
    } else {
        format!("{}-{}-{}", hex, kind, slug)
    }
}

/// Short hex identifier, used for synthetic commit identifiers
pub fn short_hex(len: usize) -> String {
    let simple = uuid::Uuid::now_v7().simple().to_string();
    let len = len.min(simple.len());
    simple[simple.len() - len..].to_string()
}

/// Slugify a title for use in IDs and repository names
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
