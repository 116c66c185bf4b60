use unicode_normalization::UnicodeNormalization;

/// Trim and apply Unicode NFKC so visually equal input compares equal
pub fn normalize(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    text.nfkc().collect::<String>().trim().to_string()
}

/// Comparison key: normalized and lowercased
pub fn fold(text: &str) -> String {
    normalize(text).to_lowercase()
}

/// First character uppercased, the rest lowercased
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalizes_first_letter_only() {
        assert_eq!(capitalize("hELLO"), "Hello");
        assert_eq!(capitalize("élan"), "Élan");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn fold_ignores_case_width_and_padding() {
        assert_eq!(fold("  Perro "), "perro");
        // Fullwidth latin folds to ASCII under NFKC
        assert_eq!(fold("ＣＡＴ"), "cat");
    }
}
