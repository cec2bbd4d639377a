/// Derive a URL-safe slug from a directory name.
///
/// Lowercases, maps every run of non-alphanumeric characters to a single
/// hyphen, and strips leading/trailing hyphens. The result is the identity
/// key for override metadata, so it must be stable across scans.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
