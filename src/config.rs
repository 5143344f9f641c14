//! Negotiator configuration

/// Configuration for a [`Negotiator`](crate::Negotiator)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegotiatorConfig {
    /// Largest request body `bind` will read, in bytes; unlimited when `None`
    pub max_body_size: Option<usize>,
}

impl NegotiatorConfig {
    /// Create a configuration with no body limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request body limit
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = Some(bytes);
        self
    }

    /// Remove the request body limit
    pub fn without_body_limit(mut self) -> Self {
        self.max_body_size = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit() {
        let config = NegotiatorConfig::new().with_max_body_size(1024);
        assert_eq!(config.max_body_size, Some(1024));
        assert_eq!(config.without_body_limit(), NegotiatorConfig::default());
    }
}
