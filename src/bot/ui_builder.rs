//! UI Builder module for creating keyboard specs and formatting messages

use crate::action::ActionToken;
use crate::db::{Category, RecipeCard, RecipeSummary};
use crate::effect::{Button, Keyboard};
use crate::errors::ValidationError;
use crate::localization::{t, t_args};
use crate::pagination::{Page, PageNav};
use crate::rating::RatingValue;

/// Longest label put on an inline button, in characters
pub const MAX_BUTTON_LABEL: usize = 48;

/// Shorten a label to fit on a button without splitting a character
pub fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    let kept: String = label.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Persistent main menu
pub fn main_menu_keyboard() -> Keyboard {
    Keyboard::Menu(vec![
        vec![t("menu-all-recipes"), t("menu-categories")],
        vec![t("menu-random"), t("menu-add")],
        vec![t("menu-search")],
    ])
}

/// Menu shown while a dialogue step waits for text
pub fn cancel_keyboard() -> Keyboard {
    Keyboard::Menu(vec![vec![t("menu-cancel")]])
}

/// Categories two per row, as in the browse and the add flows
pub fn categories_keyboard(categories: &[Category]) -> Keyboard {
    if categories.is_empty() {
        return Keyboard::None;
    }

    let rows = categories
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|category| {
                    Button::new(
                        truncate_label(&category.name, MAX_BUTTON_LABEL),
                        ActionToken::Category(category.id),
                    )
                })
                .collect()
        })
        .collect();

    Keyboard::Inline(rows)
}

/// Heading for a listing page
pub fn page_text(page: &Page, category_name: Option<&str>) -> String {
    let mut text = match category_name {
        Some(category) => t_args("category-recipes-title", &[("category", category)]),
        None => t("all-recipes-title"),
    };

    if page.is_empty() {
        text.push('\n');
        text.push_str(&t("no-recipes"));
    } else if page.total > i64::from(page.page_size) {
        let pages = (page.total + i64::from(page.page_size) - 1) / i64::from(page.page_size);
        text.push('\n');
        text.push_str(&t_args(
            "page-indicator",
            &[
                ("page", &(page.page + 1).to_string()),
                ("pages", &pages.to_string()),
            ],
        ));
    }

    text
}

/// One button per recipe, then navigation, then a way out
pub fn recipes_page_keyboard(page: &Page) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = page
        .items
        .iter()
        .map(|recipe| {
            vec![Button::new(
                truncate_label(&recipe.title, MAX_BUTTON_LABEL),
                ActionToken::Recipe(recipe.id),
            )]
        })
        .collect();

    let mut nav = Vec::new();
    if page.has_prev {
        nav.push(Button::new(
            t("nav-prev"),
            ActionToken::Page {
                nav: PageNav::Prev,
                current: page.page,
                category_id: page.category_id,
            },
        ));
    }
    if page.has_next {
        nav.push(Button::new(
            t("nav-next"),
            ActionToken::Page {
                nav: PageNav::Next,
                current: page.page,
                category_id: page.category_id,
            },
        ));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    if page.category_id.is_some() {
        rows.push(vec![Button::new(t("nav-categories"), ActionToken::Categories)]);
    }
    rows.push(vec![Button::new(t("menu-home"), ActionToken::Home)]);

    Keyboard::Inline(rows)
}

/// Plain-text recipe card; the transport decides on any markup
pub fn recipe_card_text(card: &RecipeCard) -> String {
    let recipe = &card.recipe;
    t_args(
        "recipe-card",
        &[
            ("title", &recipe.title),
            ("category", &card.category_name),
            ("likes", &recipe.likes.to_string()),
            ("dislikes", &recipe.dislikes.to_string()),
            ("ingredients", &recipe.ingredients),
            ("instructions", &recipe.instructions),
            ("author", &card.author_name),
        ],
    )
}

/// Rating buttons under a recipe card
pub fn recipe_card_keyboard(recipe_id: i64) -> Keyboard {
    Keyboard::Inline(vec![
        vec![
            Button::new(
                t("rate-like"),
                ActionToken::Rate {
                    recipe_id,
                    value: RatingValue::Like,
                },
            ),
            Button::new(
                t("rate-dislike"),
                ActionToken::Rate {
                    recipe_id,
                    value: RatingValue::Dislike,
                },
            ),
        ],
        vec![Button::new(t("random-another"), ActionToken::Random)],
        vec![Button::new(t("menu-home"), ActionToken::Home)],
    ])
}

/// Search hits labelled "title (category)"
pub fn search_results_keyboard(results: &[RecipeSummary]) -> Keyboard {
    let rows = results
        .iter()
        .map(|recipe| {
            let label = format!("{} ({})", recipe.title, recipe.category_name);
            vec![Button::new(
                truncate_label(&label, MAX_BUTTON_LABEL),
                ActionToken::Recipe(recipe.id),
            )]
        })
        .collect();

    Keyboard::Inline(rows)
}

/// Re-prompt text for rejected free-text input
pub fn validation_message(err: ValidationError) -> String {
    match err {
        ValidationError::Empty => t("input-empty"),
        ValidationError::TooLong { max } => t_args("input-too-long", &[("max", &max.to_string())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i64, title: &str) -> RecipeSummary {
        RecipeSummary {
            id,
            title: title.to_string(),
            category_id: 1,
            category_name: "Breakfast".to_string(),
        }
    }

    #[test]
    fn test_truncate_label_respects_characters() {
        assert_eq!(truncate_label("Pancakes", 20), "Pancakes");
        assert_eq!(truncate_label("Блины со сметаной", 6), "Блины…");
    }

    #[test]
    fn test_categories_two_per_row() {
        let categories: Vec<Category> = (1..=3)
            .map(|id| Category {
                id,
                name: format!("C{id}"),
            })
            .collect();

        match categories_keyboard(&categories) {
            Keyboard::Inline(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].len(), 2);
                assert_eq!(rows[1][0].token, "cat:3");
            }
            other => panic!("unexpected keyboard {other:?}"),
        }
        assert_eq!(categories_keyboard(&[]), Keyboard::None);
    }

    #[test]
    fn test_page_keyboard_offers_only_valid_navigation() {
        let page = Page {
            items: vec![summary(1, "Omelette")],
            category_id: Some(1),
            page: 0,
            page_size: 5,
            total: 1,
            has_prev: false,
            has_next: false,
        };
        let tokens: Vec<String> = recipes_page_keyboard(&page)
            .tokens()
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(tokens, vec!["rec:1", "categories", "home"]);

        let middle = Page {
            page: 1,
            total: 11,
            has_prev: true,
            has_next: true,
            category_id: None,
            ..page
        };
        let tokens = recipes_page_keyboard(&middle).tokens().join(" ");
        assert!(tokens.contains("prev:1:0"));
        assert!(tokens.contains("next:1:0"));
        assert!(!tokens.contains("categories"));
    }

    #[test]
    fn test_page_text_shows_position_when_paged() {
        let page = Page {
            items: vec![summary(1, "Omelette")],
            category_id: None,
            page: 1,
            page_size: 5,
            total: 6,
            has_prev: true,
            has_next: false,
        };
        assert!(page_text(&page, None).contains("Page 2 of 2"));
        assert!(page_text(&page, Some("Breakfast")).contains("Breakfast"));
    }
}
