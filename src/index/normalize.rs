//! Name Normalizer
//!
//! Canonicalizes free-text plant names into comparable lookup terms. The
//! same function is used when indexing catalog assets and when resolving
//! manifest records; matching only works because both sides agree on it.

/// Normalize a plant name for consistent matching.
///
/// Steps, in order: lower-case; replace `-` and `_` with spaces; strip any
/// `(...)` substring including the parentheses; drop every character that is
/// not ASCII alphanumeric or whitespace; collapse runs of whitespace and
/// trim. Empty input yields an empty string, never an error.
///
/// The function is idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace(['-', '_'], " ");
    let stripped = strip_parenthesized(&lowered);

    let filtered: String = stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove every complete `(...)` pair and its contents. An unmatched `(`
/// is left in place; the alphanumeric filter in [`normalize`] drops it
/// without discarding the text that follows.
fn strip_parenthesized(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('(') {
        match rest[open..].find(')') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Strip a trailing image file extension from a declared image name, so
/// `aloe-vera-plant.jpg` and a catalog asset published as `aloe-vera-plant`
/// normalize to the same term.
pub fn strip_image_extension(name: &str) -> &str {
    const EXTENSIONS: [&str; 8] = [
        ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".heic", ".heif",
    ];

    let lower = name.to_lowercase();
    for ext in EXTENSIONS {
        if lower.ends_with(ext) {
            return &name[..name.len() - ext.len()];
        }
    }
    name
}

/// Derive the searchable name variations for a catalog asset: the
/// normalized filename, each of its words, every tag and its words, and
/// every metadata value and its words. Order is preserved and duplicates
/// are dropped; length filtering is left to the index.
pub fn name_variations<'a, T, C>(filename: &str, tags: T, context_values: C) -> Vec<String>
where
    T: IntoIterator<Item = &'a str>,
    C: IntoIterator<Item = &'a str>,
{
    let mut variations: Vec<String> = Vec::new();

    let mut push = |variation: String| {
        if !variation.is_empty() && !variations.contains(&variation) {
            variations.push(variation);
        }
    };

    let clean_filename = normalize(strip_image_extension(filename));
    push(clean_filename.clone());
    for word in clean_filename.split_whitespace() {
        push(word.to_string());
    }

    for tag in tags {
        let clean_tag = normalize(tag);
        push(clean_tag.clone());
        for word in clean_tag.split_whitespace() {
            push(word.to_string());
        }
    }

    for value in context_values {
        let clean_value = normalize(value);
        push(clean_value.clone());
        for word in clean_value.split_whitespace() {
            push(word.to_string());
        }
    }

    variations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Aloe-Vera_Plant"), "aloe vera plant");
        assert_eq!(normalize("  Mentha   piperita  "), "mentha piperita");
    }

    #[test]
    fn test_normalize_strips_parenthesized_content() {
        assert_eq!(normalize("Azadirachta indica (Neem)"), "azadirachta indica");
        let result = normalize("Citrus limon (lemon) tree");
        assert!(!result.contains('('));
        assert!(!result.contains(')'));
        assert_eq!(result, "citrus limon tree");
    }

    #[test]
    fn test_normalize_unmatched_paren_keeps_tail() {
        // No closing paren: only the bracket itself is dropped
        assert_eq!(normalize("aloe (vera"), "aloe vera");
    }

    #[test]
    fn test_normalize_drops_special_characters() {
        assert_eq!(normalize("St. John's Wort!"), "st johns wort");
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("(*&^%)"), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let cases = [
            "Aloe-Vera_Plant.jpg",
            "Azadirachta indica (Neem)",
            "  spaced   out  ",
            "",
            "ümlaut-ø",
        ];
        for case in cases {
            let once = normalize(case);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", case);
        }
    }

    #[test]
    fn test_strip_image_extension() {
        assert_eq!(strip_image_extension("aloe-vera-plant.jpg"), "aloe-vera-plant");
        assert_eq!(strip_image_extension("photo.JPEG"), "photo");
        assert_eq!(strip_image_extension("no-extension"), "no-extension");
        assert_eq!(strip_image_extension("archive.tar"), "archive.tar");
    }

    #[test]
    fn test_name_variations_from_filename() {
        let variations = name_variations("aloe-vera-plant.jpg", [], []);
        assert_eq!(variations[0], "aloe vera plant");
        assert!(variations.contains(&"aloe".to_string()));
        assert!(variations.contains(&"vera".to_string()));
        assert!(variations.contains(&"plant".to_string()));
    }

    #[test]
    fn test_name_variations_include_tags_and_context() {
        let variations = name_variations(
            "img_0042.jpg",
            ["Medicinal Herbs", "neem"],
            ["Azadirachta indica"],
        );
        assert!(variations.contains(&"medicinal herbs".to_string()));
        assert!(variations.contains(&"herbs".to_string()));
        assert!(variations.contains(&"neem".to_string()));
        assert!(variations.contains(&"azadirachta indica".to_string()));
        assert!(variations.contains(&"indica".to_string()));
    }

    #[test]
    fn test_name_variations_deduplicated() {
        let variations = name_variations("neem.jpg", ["neem"], ["neem"]);
        let count = variations.iter().filter(|v| *v == "neem").count();
        assert_eq!(count, 1);
    }
}
