use rand::Rng;

/// Collisions tolerated (`base`, `base-1` .. `base-9`) before a random suffix
pub const MAX_SLUG_PROBES: usize = 10;

const RANDOM_SUFFIX_LEN: usize = 8;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Lowercases and collapses every run of characters outside `[a-z0-9]` to
/// one `-`. Returns `listing` when nothing alphanumeric remains.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        "listing".to_string()
    } else {
        slug
    }
}

/// Base slug of a listing: `slugify(title + "-" + location)`
pub fn base_slug(title: &str, location: &str) -> String {
    slugify(&format!("{}-{}", title, location))
}

/// Candidate for the given probe: 0 is the base itself, n is `base-n`
pub fn numbered_candidate(base: &str, attempt: usize) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

/// `base-<8 random lowercase alphanumerics>`
pub fn random_candidate(base: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..RANDOM_SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    format!("{}-{}", base, suffix)
}
