// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Bijective cookie-name ↔ token mapping

use std::collections::HashMap;

use uuid::Uuid;

/// Maps original cookie names to opaque tokens and back.
///
/// Tokens are hyphen-less UUIDv4 strings: 32 lowercase hex characters,
/// always a valid RFC 6265 cookie name. A name keeps its token for the
/// lifetime of the mapping and no two names share a token.
///
/// Not synchronized; [`Jar`](super::Jar) keeps it behind a mutex.
#[derive(Debug, Default, Clone)]
pub struct NameMapping {
    /// original name -> token
    tokens: HashMap<String, String>,
    /// token -> original name
    names: HashMap<String, String>,
}

impl NameMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for `name`, generating and recording one on first sight
    pub fn token_for(&mut self, name: &str) -> String {
        if let Some(token) = self.tokens.get(name) {
            return token.clone();
        }

        let mut token = new_token();
        while self.names.contains_key(&token) {
            token = new_token();
        }

        self.tokens.insert(name.to_string(), token.clone());
        self.names.insert(token.clone(), name.to_string());
        token
    }

    /// Original name for a token, if it was generated by this mapping
    pub fn original(&self, token: &str) -> Option<&str> {
        self.names.get(token).map(String::as_str)
    }

    /// Token already assigned to `name`, without generating one
    pub fn existing_token(&self, name: &str) -> Option<&str> {
        self.tokens.get(name).map(String::as_str)
    }

    /// Number of mapped names
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if nothing has been mapped yet
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_stable() {
        let mut mapping = NameMapping::new();
        let first = mapping.token_for("bad name");
        let second = mapping.token_for("bad name");

        assert_eq!(first, second);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.original(&first), Some("bad name"));
        assert_eq!(mapping.existing_token("bad name"), Some(first.as_str()));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let mut mapping = NameMapping::new();
        let names = ["a", "b", "with space", "semi;colon", "ünïcode", ""];
        let tokens: Vec<String> = names.iter().map(|n| mapping.token_for(n)).collect();

        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(token.len(), 32);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(mapping.original(token), Some(names[i]));
            for other in &tokens[i + 1..] {
                assert_ne!(token, other);
            }
        }
        assert_eq!(mapping.len(), names.len());
    }

    #[test]
    fn test_unknown_token() {
        let mapping = NameMapping::new();
        assert!(mapping.is_empty());
        assert_eq!(mapping.original("session"), None);
        assert_eq!(mapping.existing_token("session"), None);
    }
}
