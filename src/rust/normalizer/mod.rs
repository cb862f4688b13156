//! Text normalization strategies applied before vectorization.
//!
//! Two implementations share the [`TextNormalizer`] trait:
//! - [`LemmatizingNormalizer`] when a lexicon is available
//! - [`CharacterFilterNormalizer`] as the degraded fallback
//!
//! The strategy is picked once with [`select_normalizer`].

mod filter;
mod lemmatizer;

use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use crate::classifier::ClassifierError;

pub use filter::{clean, CharacterFilterNormalizer};
pub use lemmatizer::{LemmatizingNormalizer, Lexicon, LexiconEntry, PartOfSpeech, Token};

pub trait TextNormalizer: Send + Sync {
    /// Returns space-joined tokens, or an empty string when nothing survives.
    fn normalize(&self, text: &str) -> Result<String, ClassifierError>;

    fn name(&self) -> &str;
}

/// Picks the normalization strategy for this process.
///
/// Falls back to character filtering when no lexicon is configured or it
/// cannot be loaded.
pub fn select_normalizer(lexicon_path: Option<&Path>) -> Arc<dyn TextNormalizer> {
    let Some(path) = lexicon_path else {
        info!("No lexicon configured, using character-filter normalization");
        return Arc::new(CharacterFilterNormalizer);
    };

    match LemmatizingNormalizer::from_file(path) {
        Ok(normalizer) => {
            info!("Using lemmatizing normalization with lexicon {:?}", path);
            Arc::new(normalizer)
        }
        Err(e) => {
            warn!("Lexicon unavailable ({}), falling back to character-filter normalization", e);
            Arc::new(CharacterFilterNormalizer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_select_without_lexicon() {
        assert_eq!(select_normalizer(None).name(), "character-filter");
    }

    #[test]
    fn test_select_with_missing_lexicon_falls_back() {
        let normalizer = select_normalizer(Some(Path::new("/nonexistent/lexicon.json")));
        assert_eq!(normalizer.name(), "character-filter");
        assert_eq!(normalizer.normalize("Salut, Lume!").unwrap(), "salut lume");
    }

    #[test]
    fn test_select_with_lexicon() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stopwords": ["lume"], "entries": {{}}}}"#).unwrap();
        let normalizer = select_normalizer(Some(file.path()));
        assert_eq!(normalizer.name(), "lemmatizing");
        assert_eq!(normalizer.normalize("Salut, Lume!").unwrap(), "salut");
    }
}
