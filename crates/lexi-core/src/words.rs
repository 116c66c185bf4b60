use std::cmp::Ordering;

use lexi_store::Snapshot;
use lexi_types::{SortOrder, Word, WordDocument, WordQuery};
use serde_json::Value;

/// Decode a `user_words/{uid}` snapshot
///
/// Entries that do not decode are skipped with a warning.
pub fn words_from_snapshot(snapshot: &Snapshot) -> Vec<Word> {
    let Some(Value::Object(entries)) = snapshot else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|(id, value)| {
            match serde_json::from_value::<WordDocument>(value.clone()) {
                Ok(doc) => Some(Word::from_document(id.clone(), doc)),
                Err(e) => {
                    tracing::warn!("skipping word {id}: {e}");
                    None
                }
            }
        })
        .collect()
}

fn by_headword(a: &Word, b: &Word) -> Ordering {
    a.text
        .to_lowercase()
        .cmp(&b.text.to_lowercase())
        .then_with(|| a.text.cmp(&b.text))
}

pub fn filter_words<'a>(words: &'a [Word], query: &WordQuery) -> Vec<&'a Word> {
    let needle = query.search.trim().to_lowercase();
    let language = query.language.as_deref().filter(|l| !l.is_empty());

    let mut matched: Vec<&Word> = words
        .iter()
        .filter(|w| {
            needle.is_empty()
                || w.text.to_lowercase().contains(&needle)
                || w.translations
                    .iter()
                    .any(|t| t.text.to_lowercase().contains(&needle))
        })
        .filter(|w| language.is_none_or(|l| w.primary_language == l))
        .collect();

    matched.sort_by(|a, b| by_headword(a, b));
    if query.order == SortOrder::Desc {
        matched.reverse();
    }

    matched
}

#[cfg(test)]
mod tests {
    use lexi_types::Translation;
    use serde_json::json;

    use super::*;

    fn sample() -> Vec<Word> {
        vec![
            Word::new("1", "gato", "es", vec![Translation::new("en", "Cat")]),
            Word::new("2", "Dog", "en", vec![Translation::new("es", "Perro")]),
            Word::new("3", "Chat", "fr", vec![Translation::new("en", "Cat")]),
        ]
    }

    fn texts(words: Vec<&Word>) -> Vec<&str> {
        words.into_iter().map(|w| w.text.as_str()).collect()
    }

    #[test]
    fn decodes_and_skips_bad_entries() {
        let snapshot = Some(json!({
            "a": {"word": "Dog", "primaryLanguage": "en", "translations": [{"language": "es", "translation": "Perro"}]},
            "b": {"word": "Cat", "primaryLanguage": "en"},
            "c": {"primaryLanguage": "en"},
        }));

        let words = words_from_snapshot(&snapshot);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].id, "a");
        assert_eq!(words[0].translations[0].text, "Perro");
        assert!(words[1].translations.is_empty());

        assert!(words_from_snapshot(&None).is_empty());
    }

    #[test]
    fn sorts_case_insensitively() {
        let words = sample();
        assert_eq!(
            texts(filter_words(&words, &WordQuery::default())),
            ["Chat", "Dog", "gato"]
        );

        let desc = WordQuery {
            order: SortOrder::Desc,
            ..Default::default()
        };
        assert_eq!(texts(filter_words(&words, &desc)), ["gato", "Dog", "Chat"]);
    }

    #[test]
    fn search_covers_translations() {
        let words = sample();
        let query = WordQuery {
            search: "CAT".into(),
            ..Default::default()
        };
        assert_eq!(texts(filter_words(&words, &query)), ["Chat", "gato"]);

        let query = WordQuery {
            search: "cat".into(),
            language: Some("fr".into()),
            ..Default::default()
        };
        assert_eq!(texts(filter_words(&words, &query)), ["Chat"]);
    }
}
