/// A supported language with its display metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1 code: "en", "es", ...
    pub code: &'static str,
    pub display_name: &'static str,
    /// Country code of the flag shown next to the label
    pub flag: &'static str,
}

pub const LANGUAGES: &[Language] = &[
    Language {
        code: "en",
        display_name: "English",
        flag: "GB",
    },
    Language {
        code: "es",
        display_name: "Español",
        flag: "ES",
    },
    Language {
        code: "fr",
        display_name: "Français",
        flag: "FR",
    },
    Language {
        code: "it",
        display_name: "Italiano",
        flag: "IT",
    },
];

impl Language {
    /// Look up a language by code
    pub fn find(code: &str) -> Option<&'static Language> {
        LANGUAGES.iter().find(|l| l.code == code)
    }

    pub fn is_supported(code: &str) -> bool {
        Self::find(code).is_some()
    }

    /// Display label for a code, the code itself when unknown
    pub fn label(code: &str) -> &str {
        Self::find(code).map(|l| l.display_name).unwrap_or(code)
    }

    /// A word can be translated into every language but its own
    pub fn max_translations() -> usize {
        LANGUAGES.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        for (i, a) in LANGUAGES.iter().enumerate() {
            for b in &LANGUAGES[i + 1..] {
                assert_ne!(a.code, b.code);
            }
        }
    }

    #[test]
    fn label_falls_back_to_code() {
        assert_eq!(Language::label("fr"), "Français");
        assert_eq!(Language::label("de"), "de");
        assert_eq!(Language::max_translations(), 3);
    }
}
