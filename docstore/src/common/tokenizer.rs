use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

/// Breaks text into searchable terms for full-text indexes and searches.
///
/// Indexed values and search terms go through the same tokenizer, so a
/// search for `"#999996"` matches a product named `"Product #999996"`.
pub trait TokenizerProvider: Send + Sync {
    /// Splits `text` into normalized terms with stop words removed.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|term| !term.is_empty())
            .map(|term| term.to_lowercase())
            .filter(|term| !self.is_stop_word(term))
            .collect()
    }

    /// Returns `true` if the lower-cased `term` should not be indexed.
    fn is_stop_word(&self, term: &str) -> bool;
}

/// Type-erased, cheaply cloneable handle to a [TokenizerProvider].
#[derive(Clone)]
pub struct Tokenizer {
    inner: Arc<dyn TokenizerProvider>,
}

impl Tokenizer {
    pub fn new<T: TokenizerProvider + 'static>(inner: T) -> Self {
        Tokenizer {
            inner: Arc::new(inner),
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::new(DefaultTokenizer::default())
    }
}

impl Deref for Tokenizer {
    type Target = Arc<dyn TokenizerProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Splits on every non alphanumeric character and lower-cases the terms.
#[derive(Default, Clone)]
pub struct DefaultTokenizer {
    stop_words: HashSet<String>,
}

impl DefaultTokenizer {
    pub fn with_stop_words<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        DefaultTokenizer {
            stop_words: stop_words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl TokenizerProvider for DefaultTokenizer {
    fn is_stop_word(&self, term: &str) -> bool {
        self.stop_words.contains(term)
    }
}
