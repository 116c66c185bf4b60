use std::collections::{BTreeSet, HashSet};

use lexi_types::{DraftTranslation, ErrorKind, LANGUAGES, Language, Translation, Word, WordDocument, WordDraft};

use crate::preprocess::{capitalize, fold, normalize};

/// Every rule a draft failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", joined(.0))]
pub struct ValidationErrors(pub BTreeSet<ErrorKind>);

fn joined(kinds: &BTreeSet<ErrorKind>) -> String {
    kinds
        .iter()
        .map(ErrorKind::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ErrorKind> + '_ {
        self.0.iter().copied()
    }
}

fn selected(code: &Option<String>) -> Option<&str> {
    code.as_deref().filter(|c| !c.trim().is_empty())
}

/// Check a draft against the user's existing words
///
/// All rules are evaluated. `excluding` skips the word being edited in the
/// duplicate check so saving an unchanged word succeeds.
pub fn validate(draft: &WordDraft, existing: &[Word], excluding: Option<&str>) -> BTreeSet<ErrorKind> {
    let mut errors = BTreeSet::new();
    let primary = selected(&draft.primary_language);

    if normalize(&draft.text).is_empty() {
        errors.insert(ErrorKind::EmptyText);
    }

    match primary {
        None => {
            errors.insert(ErrorKind::MissingPrimaryLanguage);
        }
        Some(code) if !Language::is_supported(code) => {
            errors.insert(ErrorKind::UnsupportedLanguage);
        }
        Some(_) => {}
    }

    if draft
        .translations
        .iter()
        .filter_map(|t| selected(&t.language))
        .any(|code| !Language::is_supported(code))
    {
        errors.insert(ErrorKind::UnsupportedLanguage);
    }

    if draft
        .translations
        .iter()
        .any(|t| selected(&t.language).is_none() || normalize(&t.text).is_empty())
    {
        errors.insert(ErrorKind::IncompleteTranslation);
    }

    let mut seen = HashSet::new();
    for language in draft.translations.iter().filter_map(|t| selected(&t.language)) {
        if Some(language) == primary || !seen.insert(language) {
            errors.insert(ErrorKind::DuplicateLanguage);
            break;
        }
    }

    if draft.translations.len() > Language::max_translations() {
        errors.insert(ErrorKind::TooManyTranslations);
    }

    if let Some(primary) = primary {
        let key = fold(&draft.text);
        let duplicate = !key.is_empty()
            && existing.iter().any(|w| {
                Some(w.id.as_str()) != excluding
                    && w.primary_language == primary
                    && fold(&w.text) == key
            });
        if duplicate {
            errors.insert(ErrorKind::DuplicateWord);
        }
    }

    errors
}

/// Validate and produce the document to persist
pub fn accept(
    draft: &WordDraft,
    existing: &[Word],
    excluding: Option<&str>,
) -> Result<WordDocument, ValidationErrors> {
    let errors = validate(draft, existing, excluding);
    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    let translations = draft
        .translations
        .iter()
        .filter_map(|t| {
            let language = selected(&t.language)?;
            Some(Translation::new(language, capitalize(&normalize(&t.text))))
        })
        .collect();

    Ok(WordDocument {
        text: capitalize(&normalize(&draft.text)),
        primary_language: selected(&draft.primary_language)
            .unwrap_or_default()
            .to_string(),
        translations,
    })
}

/// Languages still selectable for translation slot `slot` (or for a new slot)
pub fn remaining_languages(
    primary: Option<&str>,
    translations: &[DraftTranslation],
    slot: Option<usize>,
) -> Vec<&'static Language> {
    let used: HashSet<&str> = translations
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != slot)
        .filter_map(|(_, t)| selected(&t.language))
        .chain(primary)
        .collect();

    LANGUAGES.iter().filter(|l| !used.contains(l.code)).collect()
}

/// Whether the form may offer another translation slot
pub fn can_add_translation(count: usize) -> bool {
    count < Language::max_translations()
}
