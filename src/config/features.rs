//! Feature flags for optional functionality.

/// Feature flags controlling which collaborators climarisk talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Skip all external weather and text-generation calls.
    ///
    /// Environment lookups use the fixed city baselines, predictions use the
    /// canned evidence set and explanations come from the canned generator.
    pub offline_mode: bool,
    /// Ask the text generator for a natural-language explanation.
    pub llm_explanations: bool,
    /// Ingest the built-in corpus when the evidence store starts empty.
    pub auto_seed: bool,
}

impl FeatureFlags {
    /// Creates the flags used when no configuration is supplied.
    #[must_use]
    pub const fn core() -> Self {
        Self {
            offline_mode: false,
            llm_explanations: true,
            auto_seed: false,
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::core()
    }
}
