//! URL slugs for venue titles

/// Lowercase alphanumeric runs of `title` joined by `-`
pub fn slugify(title: &str) -> String {
    let slug = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "venue".to_string()
    } else {
        slug
    }
}

/// Append a millisecond suffix when the base slug is already taken
pub fn disambiguate(base: String, taken: bool, millis: i64) -> String {
    if taken { format!("{base}-{millis}") } else { base }
}
