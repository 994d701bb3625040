//! Prefix tree over currency symbols and ISO codes.

use std::collections::HashMap;

#[derive(Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    /// Canonical ISO code if a pattern ends at this node.
    code: Option<String>,
}

/// Token-matching trie: maps currency symbols and ISO codes to their
/// canonical ISO code. Built once per detector, then shared read-only.
#[derive(Default)]
pub struct CurrencyTrie {
    root: TrieNode,
}

impl CurrencyTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pattern (symbol or code) resolving to `code`. The first
    /// insertion of a pattern wins; stores with colliding symbols keep the
    /// earlier currency.
    pub fn insert(&mut self, pattern: &str, code: &str) {
        if pattern.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for c in pattern.chars() {
            node = node.children.entry(c).or_default();
        }
        node.code.get_or_insert_with(|| code.to_string());
    }

    /// Exact lookup of a whole token.
    pub fn get(&self, token: &str) -> Option<&str> {
        let mut node = &self.root;
        for c in token.chars() {
            node = node.children.get(&c)?;
        }
        node.code.as_deref()
    }

    /// Longest prefix of `token` that is a known pattern, with its byte
    /// length.
    pub fn longest_prefix(&self, token: &str) -> Option<(usize, &str)> {
        let mut node = &self.root;
        let mut best = None;
        for (i, c) in token.char_indices() {
            node = match node.children.get(&c) {
                Some(n) => n,
                None => break,
            };
            if let Some(code) = node.code.as_deref() {
                best = Some((i + c.len_utf8(), code));
            }
        }
        best
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CurrencyTrie {
        let mut trie = CurrencyTrie::new();
        trie.insert("€", "EUR");
        trie.insert("EUR", "EUR");
        trie.insert("zł", "PLN");
        trie.insert("PLN", "PLN");
        trie.insert("$", "USD");
        trie
    }

    #[test]
    fn test_exact_lookup() {
        let trie = sample();
        assert_eq!(trie.get("€"), Some("EUR"));
        assert_eq!(trie.get("PLN"), Some("PLN"));
        assert_eq!(trie.get("EU"), None);
        assert_eq!(trie.get("EURO"), None);
    }

    #[test]
    fn test_longest_prefix() {
        let trie = sample();
        assert_eq!(trie.longest_prefix("€5"), Some(("€".len(), "EUR")));
        assert_eq!(trie.longest_prefix("zł100"), Some(("zł".len(), "PLN")));
        assert_eq!(trie.longest_prefix("100zł"), None);
    }

    #[test]
    fn test_first_insert_wins() {
        let mut trie = CurrencyTrie::new();
        trie.insert("kr", "SEK");
        trie.insert("kr", "NOK");
        assert_eq!(trie.get("kr"), Some("SEK"));
    }

    #[test]
    fn test_empty_pattern_ignored() {
        let mut trie = CurrencyTrie::new();
        trie.insert("", "EUR");
        assert!(trie.is_empty());
        assert_eq!(trie.get(""), None);
    }
}
