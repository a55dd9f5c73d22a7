/// Lowercase ASCII slug with runs of anything else collapsed to `-`.
///
/// ```
/// use domain_backoffice::slug::slugify;
///
/// assert_eq!(slugify("  Summer Sale -- 2024! "), "summer-sale-2024");
/// ```
pub fn slugify(source: &str) -> String {
    let mut slug = String::with_capacity(source.len());
    let mut pending_dash = false;

    for c in source.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// `base` for the first attempt, then `base-2`, `base-3`, ...
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("Hello, World"), "hello-world");
        assert_eq!(slugify("a___b"), "a-b");
        assert_eq!(slugify("--Trim me--"), "trim-me");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn test_candidates() {
        assert_eq!(candidate("summer-sale", 1), "summer-sale");
        assert_eq!(candidate("summer-sale", 2), "summer-sale-2");
        assert_eq!(candidate("summer-sale", 10), "summer-sale-10");
    }
}
