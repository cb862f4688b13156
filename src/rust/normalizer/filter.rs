use super::TextNormalizer;
use crate::classifier::ClassifierError;

/// Letters kept by cleaning besides `a-z`.
const EXTRA_LETTERS: [char; 5] = ['ă', 'â', 'î', 'ș', 'ț'];

fn is_kept(c: char) -> bool {
    c.is_ascii_lowercase() || EXTRA_LETTERS.contains(&c) || c.is_whitespace()
}

/// Lower-cases, drops characters outside the alphabet, collapses whitespace.
pub fn clean(text: &str) -> String {
    let filtered: String = text.to_lowercase().chars().filter(|&c| is_kept(c)).collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Degraded normalizer used when no linguistic model is available.
///
/// Only performs character-class cleaning; tokens are not lemmatized and
/// stopwords are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterFilterNormalizer;

impl TextNormalizer for CharacterFilterNormalizer {
    fn normalize(&self, text: &str) -> Result<String, ClassifierError> {
        Ok(clean(text))
    }

    fn name(&self) -> &str {
        "character-filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_lowercases_and_filters() {
        assert_eq!(clean("Știrea ZILEI: 100% adevărată!"), "știrea zilei adevărată");
        assert_eq!(clean("  multe\t\tspații \n aici  "), "multe spații aici");
    }

    #[test]
    fn test_clean_can_empty_out() {
        assert_eq!(clean("123 !!! ---"), "");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn test_filter_normalizer_never_fails() {
        let normalizer = CharacterFilterNormalizer;
        assert_eq!(normalizer.normalize("Guvernul a DECIS.").unwrap(), "guvernul a decis");
        assert_eq!(normalizer.normalize("???").unwrap(), "");
    }
}
