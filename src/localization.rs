use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::LazyLock;
use unic_langid::LanguageIdentifier;

const EN_MESSAGES: &str = include_str!("../locales/en/main.ftl");

/// Localization manager for the bot's user-facing strings
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        // Load English bundle
        let en_locale: LanguageIdentifier = "en".parse()?;
        let bundle = Self::create_bundle(&en_locale, EN_MESSAGES)?;
        bundles.insert("en".to_string(), bundle);

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(
        locale: &LanguageIdentifier,
        source: &str,
    ) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Isolation marks would leak into Markdown sent to Telegram
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid Fluent resource for {locale}: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate Fluent messages for {locale}: {errors:?}"))?;

        Ok(bundle)
    }

    /// Get a localized message
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, &str>>) -> String {
        let Some(bundle) = self.bundles.get("en") else {
            return format!("Missing translation: {}", key);
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut errors = vec![];
        match args {
            Some(args) => {
                let fluent_args = FluentArgs::from_iter(
                    args.iter().map(|(k, v)| (*k, FluentValue::from(*v))),
                );
                bundle
                    .format_pattern(pattern, Some(&fluent_args), &mut errors)
                    .into_owned()
            }
            None => bundle.format_pattern(pattern, None, &mut errors).into_owned(),
        }
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message(key, Some(&args_map))
    }
}

/// Global localization instance
static LOCALIZATION_MANAGER: LazyLock<Option<LocalizationManager>> = LazyLock::new(|| {
    LocalizationManager::new()
        .map_err(|e| tracing::error!(error = %e, "Failed to load localization bundle"))
        .ok()
});

/// Force loading of the global localization manager
pub fn init_localization() -> Result<()> {
    match LOCALIZATION_MANAGER.as_ref() {
        Some(_) => Ok(()),
        None => Err(anyhow!("Localization bundle failed to load")),
    }
}

/// Convenience function to get a localized message
pub fn t(key: &str) -> String {
    match LOCALIZATION_MANAGER.as_ref() {
        Some(manager) => manager.get_message(key, None),
        None => format!("Missing translation: {}", key),
    }
}

/// Convenience function to get a localized message with arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    match LOCALIZATION_MANAGER.as_ref() {
        Some(manager) => manager.get_message_with_args(key, args),
        None => format!("Missing translation: {}", key),
    }
}
