/// SDK-wide configuration, passed explicitly to [`Core`](crate::Core).
///
/// There is no global instance: build the configuration during application
/// startup and hand it to the context that owns it.
#[derive(Debug, Clone, Default)]
pub struct CoreConfig {
    /// Base URL service endpoints are appended to, e.g.
    /// `https://api.example.com`. May stay empty when every operation
    /// overrides [`ServiceCall::base_url`](crate::ServiceCall::base_url);
    /// executing an operation with neither source is a contract violation.
    pub base_url: String,
}

impl CoreConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_base_url() {
        assert_eq!(CoreConfig::default().base_url, "");
    }

    #[test]
    fn new_stores_the_base_url() {
        let config = CoreConfig::new("https://api.example.com");
        assert_eq!(config.base_url, "https://api.example.com");
    }
}
