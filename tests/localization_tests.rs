//! # Localization Tests
//!
//! This module contains unit tests for the localization functionality,
//! testing message retrieval and formatting with various edge cases.

use shopbuddy::localization::{init_localization, t, t_args, LocalizationManager};
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        // Create a new localization manager for each test
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message("prompt-nickname", None);
        assert!(!message.is_empty());
        assert!(message.contains("nickname"));
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message("nonexistent-key", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("price", "49.99");
        args.insert("currency", "EUR");

        let message = manager.get_message("product-price", Some(&args));
        assert_eq!(message, "💰 49.99 EUR");
    }

    #[test]
    fn test_arguments_are_not_wrapped_in_isolation_marks() {
        let message = t_args("location-saved", &[("currency", "USD")]);
        assert!(message.contains("in USD."));
        assert!(!message.contains('\u{2068}'));
    }

    #[test]
    fn test_global_helpers() {
        assert!(init_localization().is_ok());
        assert!(!t("search-failed").starts_with("Missing translation"));
        assert!(t_args("products-header", &[("query", "Books")]).contains("*Books*"));
    }

    #[test]
    fn test_every_key_used_by_the_bot_exists() {
        let manager = setup_localization();
        for key in [
            "prompt-location",
            "button-share-location",
            "prompt-nickname",
            "prompt-category",
            "default-nickname",
            "location-saved",
            "products-header",
            "products-none",
            "product-price",
            "search-failed",
            "search-empty",
            "mood-generic",
            "mood-photo-caption",
        ] {
            let message = manager.get_message(key, None);
            assert!(!message.starts_with("Missing"), "missing key {key}");
        }
    }
}
