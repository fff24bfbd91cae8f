/// Catalog slugs arrive with underscores; stored game slugs use hyphens.
pub fn storage_slug(catalog_slug: &str) -> String {
    catalog_slug.trim().replace('_', "-")
}

/// Product pages are keyed by the underscore form of the slug.
pub fn product_page_slug(slug: &str) -> String {
    slug.trim().replace('-', "_")
}

/// Slug for developers, publishers, categories and platforms:
/// lowercased, each whitespace run collapsed to a single hyphen.
pub fn taxonomy_slug(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Truncate on character boundaries, never inside a multi-byte sequence.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}
