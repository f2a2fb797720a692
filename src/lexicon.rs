//! Profanity lexicon: a normalized word and phrase set.

use crate::asr::words::normalize_token;
use crate::error::{BleepError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Trait for profanity lookup.
///
/// Lookup is infallible; the input is already normalized (see
/// [`normalize_token`]).
pub trait Lexicon: Send + Sync {
    /// True when the normalized token (or concatenated phrase) is banned.
    fn contains(&self, normalized: &str) -> bool;

    /// Number of entries, for diagnostics.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Lexicon> Lexicon for Arc<T> {
    fn contains(&self, normalized: &str) -> bool {
        (**self).contains(normalized)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Hash-set lexicon, normalized at load time.
///
/// Multi-word phrases lose their whitespace under normalization, which is
/// exactly the form the adjacent-pair detector probes with.
#[derive(Debug, Clone, Default)]
pub struct SetLexicon {
    entries: HashSet<String>,
}

impl SetLexicon {
    /// Build from raw words or phrases; entries normalizing to nothing are
    /// dropped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = words
            .into_iter()
            .map(|w| normalize_token(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();
        Self { entries }
    }

    /// Load from a text file: one word or phrase per line, `#` comments and
    /// blank lines ignored.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BleepError::LexiconNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }
        let contents = fs::read_to_string(path)?;
        Ok(Self::from_words(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        ))
    }
}

impl Lexicon for SetLexicon {
    fn contains(&self, normalized: &str) -> bool {
        self.entries.contains(normalized)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_words_normalizes() {
        let lexicon = SetLexicon::from_words(["Darn", "HECK!"]);
        assert_eq!(lexicon.len(), 2);
        assert!(lexicon.contains("darn"));
        assert!(lexicon.contains("heck"));
        assert!(!lexicon.contains("Darn")); // lookups use normalized form
    }

    #[test]
    fn test_phrases_concatenate() {
        let lexicon = SetLexicon::from_words(["mother trucker"]);
        assert!(lexicon.contains("mothertrucker"));
        assert!(!lexicon.contains("mother"));
    }

    #[test]
    fn test_empty_entries_dropped() {
        let lexicon = SetLexicon::from_words(["...", "ok"]);
        assert_eq!(lexicon.len(), 1);
        assert!(!lexicon.contains(""));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SetLexicon::load(Path::new("/nonexistent/words.txt"));
        assert!(matches!(result, Err(BleepError::LexiconNotFound { .. })));
    }

    #[test]
    fn test_load_skips_comments_and_blanks() {
        let dir = std::env::temp_dir().join("bleep-lexicon-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("words.txt");
        fs::write(&path, "# banned words\ndarn\n\n  heck  \n# end\n").unwrap();

        let lexicon = SetLexicon::load(&path).unwrap();
        assert_eq!(lexicon.len(), 2);
        assert!(lexicon.contains("darn"));
        assert!(lexicon.contains("heck"));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_trait_object() {
        let lexicon: Box<dyn Lexicon> = Box::new(SetLexicon::from_words(["darn"]));
        assert!(lexicon.contains("darn"));
        assert!(!lexicon.is_empty());
    }
}
