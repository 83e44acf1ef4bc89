//! ID generation utilities for atelier entities.
//!
//! All ids are human-readable strings: top-level entities get a slug plus a
//! random base32 suffix, owned children are numbered off their parent id.

use rand::RngExt;

/// Base32 alphabet (Crockford-style, excludes I, L, O, U to avoid confusion)
const BASE32_ALPHABET: &[u8] = b"0123456789abcdefghjkmnpqrstvwxyz";

/// Generate a random suffix using base32 encoding
pub fn generate_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE32_ALPHABET[rng.random_range(0..32)] as char)
        .collect()
}

/// Normalize a string to be used as a slug
/// - Lowercase
/// - Replace non-alphanumeric with hyphens
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
pub fn normalize_slug(s: &str) -> String {
    let slug: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();

    let mut result = String::new();
    let mut prev_hyphen = true; // skip leading hyphens
    for c in slug.chars() {
        if c == '-' {
            if !prev_hyphen {
                result.push(c);
            }
            prev_hyphen = true;
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Generate a client request ID
/// Format: req-<date>-<suffix>
/// Example: "req-20260827-7f2c"
pub fn generate_request_id() -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let suffix = generate_suffix(4);
    format!("req-{}-{}", date, suffix)
}

/// Generate a project ID from a name
/// Format: <slug>-<suffix>
/// Example: "landing-5h18"
pub fn generate_project_id(name: &str) -> String {
    let slug = normalize_slug(name);
    let suffix = generate_suffix(4);
    if slug.is_empty() {
        format!("project-{}", suffix)
    } else {
        format!("{}-{}", slug, suffix)
    }
}

/// Generate a task ID from a project ID and task number
/// Format: <project_id>-task-<n>
/// Example: "landing-5h18-task-3"
pub fn generate_task_id(project_id: &str, task_number: i64) -> String {
    format!("{}-task-{}", project_id, task_number)
}

/// Generate a checkpoint ID from a parent ID and checkpoint number
/// Format: <parent_id>-cp-<n>
pub fn generate_checkpoint_id(parent_id: &str, checkpoint_number: i64) -> String {
    format!("{}-cp-{}", parent_id, checkpoint_number)
}

/// Generate a chat message ID from a parent ID and message number
/// Format: <parent_id>-msg-<n>
pub fn generate_comment_id(parent_id: &str, comment_number: i64) -> String {
    format!("{}-msg-{}", parent_id, comment_number)
}
