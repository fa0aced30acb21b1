//! # Localization Tests
//!
//! Message retrieval and formatting, including the keys the bot relies on.

use recipebook::localization::{t, t_args, LocalizationManager};

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        LocalizationManager::new()
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message("help", &[]);
        assert!(!message.is_empty());
        assert!(message.contains("Commands"));
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message("nonexistent-key", &[]);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_arguments_are_substituted_without_isolation_marks() {
        let message = t_args("add-complete", &[("title", "Tiramisu"), ("category", "Desserts")]);

        assert!(message.contains("\"Tiramisu\""));
        assert!(message.contains("\"Desserts\""));
        assert!(!message.contains('\u{2068}'));
    }

    #[test]
    fn test_recipe_card_layout() {
        let card = t_args(
            "recipe-card",
            &[
                ("title", "Tiramisu"),
                ("category", "Desserts"),
                ("likes", "3"),
                ("dislikes", "1"),
                ("ingredients", "mascarpone"),
                ("instructions", "Layer and chill."),
                ("author", "Ann"),
            ],
        );

        let title_at = card.find("Tiramisu");
        let ingredients_at = card.find("mascarpone");
        assert!(title_at < ingredients_at);
        assert!(card.contains("👍 3"));
        assert!(card.contains("Ann"));
    }

    #[test]
    fn test_all_bot_keys_present() {
        let manager = setup_localization();
        let keys = [
            "menu-all-recipes",
            "menu-categories",
            "menu-random",
            "menu-add",
            "menu-search",
            "menu-cancel",
            "menu-home",
            "welcome",
            "help",
            "choose-action",
            "back-home",
            "unknown-input",
            "choose-category",
            "no-categories",
            "all-recipes-title",
            "category-recipes-title",
            "no-recipes",
            "page-indicator",
            "nav-prev",
            "nav-next",
            "nav-categories",
            "category-missing",
            "recipe-missing",
            "recipe-card",
            "rate-like",
            "rate-dislike",
            "random-another",
            "random-empty",
            "rating-applied",
            "rating-changed",
            "rating-reverted",
            "search-prompt",
            "search-results",
            "search-empty",
            "add-start",
            "add-choose-category",
            "add-category-selected",
            "add-category-created",
            "add-enter-title",
            "add-enter-ingredients",
            "add-enter-instructions",
            "add-complete",
            "add-cancelled",
            "add-finish-first",
            "nothing-to-cancel",
            "session-expired",
            "input-empty",
            "input-too-long",
            "error-store-unavailable",
            "error-conflict",
        ];

        for key in keys {
            assert!(manager.has_message(key), "missing message {key}");
        }
    }

    #[test]
    fn test_menu_labels_are_distinct() {
        let labels = [
            t("menu-all-recipes"),
            t("menu-categories"),
            t("menu-random"),
            t("menu-add"),
            t("menu-search"),
            t("menu-cancel"),
            t("menu-home"),
        ];

        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_custom_source() {
        let manager = LocalizationManager::from_source("greet = Hi { $name }!");

        assert_eq!(manager.get_message("greet", &[("name", "Bob")]), "Hi Bob!");
    }
}
