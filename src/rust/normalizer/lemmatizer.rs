use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use super::filter::clean;
use super::TextNormalizer;
use crate::classifier::ClassifierError;

/// Universal Dependencies part-of-speech tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartOfSpeech {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
}

impl PartOfSpeech {
    /// Adpositions and conjunctions carry no topical signal and are dropped.
    pub fn is_function_word(&self) -> bool {
        matches!(self, Self::Adp | Self::Cconj | Self::Sconj)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LexiconEntry {
    pub lemma: String,
    pub pos: PartOfSpeech,
}

/// One analyzed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub lemma: String,
    pub pos: Option<PartOfSpeech>,
    pub is_stop: bool,
}

impl Token<'_> {
    pub fn is_alpha(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_alphabetic)
    }

    pub fn is_punct(&self) -> bool {
        self.pos == Some(PartOfSpeech::Punct)
            || (!self.text.is_empty() && self.text.chars().all(|c| c.is_ascii_punctuation()))
    }

    fn is_content(&self) -> bool {
        !self.is_stop
            && !self.is_punct()
            && self.is_alpha()
            && !self.pos.is_some_and(|pos| pos.is_function_word())
    }
}

/// Word-form table: surface form to lemma and tag, plus a stopword list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Lexicon {
    #[serde(default)]
    stopwords: HashSet<String>,
    #[serde(default)]
    entries: HashMap<String, LexiconEntry>,
}

impl Lexicon {
    pub fn new(stopwords: HashSet<String>, entries: HashMap<String, LexiconEntry>) -> Self {
        Self { stopwords, entries }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            ClassifierError::ArtifactError(format!("Failed to read lexicon {:?}: {}", path, e))
        })?;
        let lexicon: Lexicon = serde_json::from_slice(&bytes)?;
        info!(
            "Lexicon loaded from {:?}: {} forms, {} stopwords",
            path,
            lexicon.entries.len(),
            lexicon.stopwords.len()
        );
        Ok(lexicon)
    }

    /// Analyzes a single lower-cased token. Unknown forms are their own lemma.
    pub fn analyze<'a>(&self, text: &'a str) -> Token<'a> {
        let entry = self.entries.get(text);
        Token {
            text,
            lemma: entry.map_or_else(|| text.to_string(), |e| e.lemma.clone()),
            pos: entry.map(|e| e.pos),
            is_stop: self.stopwords.contains(text),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Full normalizer: cleaning followed by lemmatization and filtering of
/// stopwords, punctuation, non-alphabetic tokens and function words.
#[derive(Debug, Clone)]
pub struct LemmatizingNormalizer {
    lexicon: Lexicon,
}

impl LemmatizingNormalizer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        Ok(Self::new(Lexicon::from_file(path)?))
    }
}

impl TextNormalizer for LemmatizingNormalizer {
    fn normalize(&self, text: &str) -> Result<String, ClassifierError> {
        let cleaned = clean(text);
        if cleaned.is_empty() {
            return Ok(String::new());
        }

        let lemmas: Vec<String> = cleaned
            .split(' ')
            .map(|t| self.lexicon.analyze(t))
            .filter(Token::is_content)
            .map(|t| t.lemma.to_lowercase())
            .collect();

        Ok(lemmas.join(" "))
    }

    fn name(&self) -> &str {
        "lemmatizing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        let json = r#"{
            "stopwords": ["este", "o", "că"],
            "entries": {
                "guvernul": {"lemma": "guvern", "pos": "NOUN"},
                "a": {"lemma": "avea", "pos": "AUX"},
                "anunțat": {"lemma": "anunța", "pos": "VERB"},
                "în": {"lemma": "în", "pos": "ADP"},
                "și": {"lemma": "și", "pos": "CCONJ"},
                "dacă": {"lemma": "dacă", "pos": "SCONJ"},
                "vaccinurile": {"lemma": "Vaccin", "pos": "NOUN"}
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_lemmatizes_and_drops_function_words() {
        let normalizer = LemmatizingNormalizer::new(lexicon());
        let out = normalizer
            .normalize("Guvernul a anunțat în presă și vaccinurile, dacă este o știre.")
            .unwrap();
        assert_eq!(out, "guvern avea anunța presă vaccin știre");
    }

    #[test]
    fn test_all_stopwords_yield_empty() {
        let normalizer = LemmatizingNormalizer::new(lexicon());
        assert_eq!(normalizer.normalize("Este o, că!").unwrap(), "");
        assert_eq!(normalizer.normalize("2024 ...").unwrap(), "");
    }

    #[test]
    fn test_token_flags() {
        let lexicon = lexicon();
        let token = lexicon.analyze("în");
        assert_eq!(token.pos, Some(PartOfSpeech::Adp));
        assert!(!token.is_content());

        let unknown = lexicon.analyze("necunoscut");
        assert_eq!(unknown.lemma, "necunoscut");
        assert_eq!(unknown.pos, None);
        assert!(unknown.is_content());
    }
}
