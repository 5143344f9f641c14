//! Format registries and token selection
//!
//! A registry is an ordered list of `(token, factory)` pairs. Selection walks
//! the list in order and picks the first token that appears anywhere in the
//! header value, so insertion order decides between tokens that both match.
//!
//! Matching is plain substring containment. `application/json; charset=utf-8`
//! matches "json"; `*/*` and `q=` weights get no special treatment.

pub mod defaults;

pub use defaults::{
    default_decoders, default_encoders, set_default_decoders, set_default_encoders,
    update_default_decoders, update_default_encoders,
};

use std::{fmt, sync::Arc};

use crate::codec::{FormFormat, JsonFormat, MakeDecoder, MakeEncoder, XmlFormat, YamlFormat};

/// Registry of decoder factories, matched against `Content-Type`
pub type DecoderRegistry = Registry<dyn MakeDecoder>;

/// Registry of encoder factories, matched against `Accept`
pub type EncoderRegistry = Registry<dyn MakeEncoder>;

/// Ordered mapping from format token to factory
pub struct Registry<F: ?Sized> {
    entries: Vec<(String, Arc<F>)>,
}

impl<F: ?Sized> Registry<F> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert an already shared factory
    ///
    /// An existing token keeps its position and gets the new factory; the old
    /// one is returned. A new token is appended, so it has the lowest priority.
    pub fn insert_shared(&mut self, token: impl Into<String>, factory: Arc<F>) -> Option<Arc<F>> {
        let token = token.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some((_, slot)) => Some(std::mem::replace(slot, factory)),
            None => {
                self.entries.push((token, factory));
                None
            }
        }
    }

    /// Remove a token, returning its factory
    pub fn remove(&mut self, token: &str) -> Option<Arc<F>> {
        let index = self.entries.iter().position(|(t, _)| t == token)?;
        Some(self.entries.remove(index).1)
    }

    /// Look up the factory for an exact token
    pub fn get(&self, token: &str) -> Option<&Arc<F>> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, factory)| factory)
    }

    /// Check if a token is registered
    pub fn contains(&self, token: &str) -> bool {
        self.get(token).is_some()
    }

    /// Tokens in priority order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    /// `(token, factory)` pairs in priority order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<F>)> {
        self.entries.iter().map(|(t, f)| (t.as_str(), f))
    }

    /// Number of registered tokens
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry has no tokens
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the first token, in registry order, contained in `header`
    ///
    /// # Example
    ///
    /// ```
    /// use tower_negotiate::EncoderRegistry;
    ///
    /// let encoders = EncoderRegistry::default();
    /// let (token, _) = encoders.select("application/json; charset=utf-8").unwrap();
    /// assert_eq!(token, "json");
    ///
    /// // "xml" is registered before "json"
    /// let (token, _) = encoders.select("application/json, application/xml").unwrap();
    /// assert_eq!(token, "xml");
    ///
    /// assert!(encoders.select("text/html").is_none());
    /// ```
    pub fn select(&self, header: &str) -> Option<(&str, &Arc<F>)> {
        self.iter().find(|(token, _)| header.contains(*token))
    }
}

impl Registry<dyn MakeDecoder> {
    /// Register a decoder factory under `token`
    ///
    /// Replaces in place if the token exists, appends otherwise.
    pub fn insert(
        &mut self,
        token: impl Into<String>,
        factory: impl MakeDecoder + 'static,
    ) -> Option<Arc<dyn MakeDecoder>> {
        self.insert_shared(token, Arc::new(factory))
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, token: impl Into<String>, factory: impl MakeDecoder + 'static) -> Self {
        self.insert(token, factory);
        self
    }
}

impl Registry<dyn MakeEncoder> {
    /// Register an encoder factory under `token`
    ///
    /// Replaces in place if the token exists, appends otherwise.
    pub fn insert(
        &mut self,
        token: impl Into<String>,
        factory: impl MakeEncoder + 'static,
    ) -> Option<Arc<dyn MakeEncoder>> {
        self.insert_shared(token, Arc::new(factory))
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, token: impl Into<String>, factory: impl MakeEncoder + 'static) -> Self {
        self.insert(token, factory);
        self
    }
}

/// XML, JSON, YAML, URL-encoded form and multipart form, in that order
impl Default for Registry<dyn MakeDecoder> {
    fn default() -> Self {
        Self::new()
            .with("xml", XmlFormat)
            .with("json", JsonFormat)
            .with("yaml", YamlFormat)
            .with("form-urlencoded", FormFormat::urlencoded())
            .with("multipart/form-data", FormFormat::multipart())
    }
}

/// XML, JSON and YAML, in that order
impl Default for Registry<dyn MakeEncoder> {
    fn default() -> Self {
        Self::new()
            .with("xml", XmlFormat)
            .with("json", JsonFormat)
            .with("yaml", YamlFormat)
    }
}

impl<F: ?Sized> Clone for Registry<F> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Registry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tokens()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_decoder_order() {
        let decoders = DecoderRegistry::default();
        let tokens: Vec<_> = decoders.tokens().collect();
        assert_eq!(
            tokens,
            ["xml", "json", "yaml", "form-urlencoded", "multipart/form-data"]
        );
    }

    #[test]
    fn test_default_encoders_have_no_forms() {
        let encoders = EncoderRegistry::default();
        let tokens: Vec<_> = encoders.tokens().collect();
        assert_eq!(tokens, ["xml", "json", "yaml"]);
        assert!(!encoders.contains("form-urlencoded"));
    }

    #[test]
    fn test_select_first_in_registry_order() {
        let encoders = EncoderRegistry::new()
            .with("json", JsonFormat)
            .with("xml", XmlFormat);

        let (token, _) = encoders.select("application/xml, application/json").unwrap();
        assert_eq!(token, "json");

        let reversed = EncoderRegistry::new()
            .with("xml", XmlFormat)
            .with("json", JsonFormat);
        let (token, _) = reversed.select("application/xml, application/json").unwrap();
        assert_eq!(token, "xml");
    }

    #[test]
    fn test_select_is_substring_only() {
        let decoders = DecoderRegistry::default();

        assert_eq!(decoders.select("text/yaml").unwrap().0, "yaml");
        assert_eq!(
            decoders
                .select("application/x-www-form-urlencoded")
                .unwrap()
                .0,
            "form-urlencoded"
        );
        assert_eq!(
            decoders
                .select("multipart/form-data; boundary=abc")
                .unwrap()
                .0,
            "multipart/form-data"
        );

        // No MIME grammar: wildcards, case and weights are not interpreted
        assert!(decoders.select("*/*").is_none());
        assert!(decoders.select("APPLICATION/JSON").is_none());
        assert!(decoders.select("").is_none());
    }

    #[test]
    fn test_empty_token_matches_everything() {
        let encoders = EncoderRegistry::new().with("", JsonFormat);
        assert_eq!(encoders.select("").unwrap().0, "");
        assert_eq!(encoders.select("text/html").unwrap().0, "");
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut encoders = EncoderRegistry::default();

        let previous = encoders.insert("xml", JsonFormat);
        assert!(previous.is_some());
        assert_eq!(encoders.tokens().collect::<Vec<_>>(), ["xml", "json", "yaml"]);

        assert!(encoders.insert("msgpack", JsonFormat).is_none());
        assert_eq!(encoders.tokens().last(), Some("msgpack"));
        assert_eq!(encoders.len(), 4);
    }

    #[test]
    fn test_remove() {
        let mut decoders = DecoderRegistry::default();
        assert!(decoders.remove("xml").is_some());
        assert!(decoders.remove("xml").is_none());
        assert!(decoders.select("application/xml").is_none());
        assert_eq!(decoders.len(), 4);
        assert!(!decoders.is_empty());
    }

    #[test]
    fn test_debug_lists_tokens() {
        let encoders = EncoderRegistry::default();
        assert_eq!(format!("{encoders:?}"), r#"["xml", "json", "yaml"]"#);
    }
}
