//! Message catalog for user-facing text, backed by a Fluent bundle.

use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::sync::LazyLock;
use tracing::warn;
use unic_langid::LanguageIdentifier;

const EN_MESSAGES: &str = include_str!("../locales/en/main.ftl");

/// Message lookup for the recipe bot
pub struct LocalizationManager {
    bundle: FluentBundle<FluentResource>,
}

impl LocalizationManager {
    /// Create a manager over the built-in English messages
    pub fn new() -> Self {
        Self::from_source(EN_MESSAGES)
    }

    /// Create a manager over an arbitrary FTL source
    pub fn from_source(source: &str) -> Self {
        let locale: LanguageIdentifier = "en".parse().unwrap_or_default();
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        bundle.set_use_isolating(false);

        let resource = match FluentResource::try_new(source.to_string()) {
            Ok(resource) => resource,
            Err((resource, errors)) => {
                warn!(errors = errors.len(), "Message catalog has syntax errors, keeping valid entries");
                resource
            }
        };
        if let Err(errors) = bundle.add_resource(resource) {
            warn!(errors = errors.len(), "Duplicate message ids in catalog");
        }

        Self { bundle }
    }

    /// Get a message, substituting `args` into its placeables
    pub fn get_message(&self, key: &str, args: &[(&str, &str)]) -> String {
        let msg = match self.bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, FluentValue::from(*value));
        }

        let mut errors = vec![];
        let value = self
            .bundle
            .format_pattern(pattern, Some(&fluent_args), &mut errors);
        if !errors.is_empty() {
            warn!(key, errors = errors.len(), "Message formatted with errors");
        }

        value.into_owned()
    }

    pub fn has_message(&self, key: &str) -> bool {
        self.bundle.has_message(key)
    }
}

impl Default for LocalizationManager {
    fn default() -> Self {
        Self::new()
    }
}

static LOCALIZATION_MANAGER: LazyLock<LocalizationManager> = LazyLock::new(LocalizationManager::new);

/// Get the global localization manager
pub fn get_localization_manager() -> &'static LocalizationManager {
    &LOCALIZATION_MANAGER
}

/// Convenience function to get a message
pub fn t(key: &str) -> String {
    get_localization_manager().get_message(key, &[])
}

/// Convenience function to get a message with arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    get_localization_manager().get_message(key, args)
}
