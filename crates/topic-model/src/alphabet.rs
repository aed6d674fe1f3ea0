use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Append-only interning table mapping terms to dense ids.
///
/// Shared behind an `Arc` by every corpus and model built over it; interning
/// goes through `&self` so the table can grow while other holders read it.
#[derive(Debug, Default)]
pub struct TermAlphabet {
    inner: RwLock<AlphabetInner>,
}

#[derive(Debug, Default)]
struct AlphabetInner {
    ids: HashMap<String, u32>,
    terms: Vec<String>,
}

impl TermAlphabet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an alphabet from terms listed in id order.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let alphabet = Self::new();
        for term in terms {
            alphabet.intern(term);
        }
        alphabet
    }

    fn read(&self) -> RwLockReadGuard<'_, AlphabetInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, AlphabetInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the id of `term`, assigning the next free id if unseen.
    pub fn intern(&self, term: impl Into<String>) -> u32 {
        let term = term.into();
        if let Some(&id) = self.read().ids.get(&term) {
            return id;
        }
        let mut inner = self.write();
        if let Some(&id) = inner.ids.get(&term) {
            return id;
        }
        let id = inner.terms.len() as u32;
        inner.terms.push(term.clone());
        inner.ids.insert(term, id);
        id
    }

    pub fn lookup(&self, term: &str) -> Option<u32> {
        self.read().ids.get(term).copied()
    }

    pub fn term(&self, id: u32) -> Option<String> {
        self.read().terms.get(id as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all terms in id order.
    pub fn terms(&self) -> Vec<String> {
        self.read().terms.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_intern_is_stable() {
        let alphabet = TermAlphabet::new();
        let a = alphabet.intern("parse");
        let b = alphabet.intern("token");
        assert_eq!(alphabet.intern("parse"), a);
        assert_eq!((a, b), (0, 1));
        assert_eq!(alphabet.term(b).as_deref(), Some("token"));
        assert_eq!(alphabet.lookup("missing"), None);
    }

    #[test]
    fn test_shared_growth_is_visible_to_all_holders() {
        let alphabet = Arc::new(TermAlphabet::new());
        let other = Arc::clone(&alphabet);
        alphabet.intern("fold");
        assert_eq!(other.len(), 1);
        other.intern("unfold");
        assert_eq!(alphabet.terms(), vec!["fold".to_string(), "unfold".to_string()]);
    }

    #[test]
    fn test_from_terms_preserves_order() {
        let alphabet = TermAlphabet::from_terms(["x", "y", "z"]);
        assert_eq!(alphabet.lookup("z"), Some(2));
        assert_eq!(alphabet.len(), 3);
    }
}
