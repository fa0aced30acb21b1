//! Recipe creation dialogue module: conversation state and input validation.

use serde::{Deserialize, Serialize};

use crate::db::{Category, NewRecipe, UserId};
use crate::errors::ValidationError;

/// Longest accepted recipe title, in characters
pub const MAX_TITLE_LEN: usize = 255;
/// Longest accepted category name, in characters
pub const MAX_CATEGORY_NAME_LEN: usize = 64;

/// Where a user is in the recipe creation dialogue.
///
/// Each step carries the draft collected so far, so leaving the dialogue
/// (commit, cancel, home, expiry) is just a reset to `Idle`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeDialogueState {
    #[default]
    Idle,
    SelectingCategory,
    EnteringTitle {
        category: Category,
    },
    EnteringIngredients {
        category: Category,
        title: String,
    },
    EnteringInstructions {
        category: Category,
        title: String,
        ingredients: String,
    },
}

/// Discriminant of [`RecipeDialogueState`], handy for logging and tests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialogueStep {
    Idle,
    SelectingCategory,
    EnteringTitle,
    EnteringIngredients,
    EnteringInstructions,
}

impl RecipeDialogueState {
    pub fn step(&self) -> DialogueStep {
        match self {
            RecipeDialogueState::Idle => DialogueStep::Idle,
            RecipeDialogueState::SelectingCategory => DialogueStep::SelectingCategory,
            RecipeDialogueState::EnteringTitle { .. } => DialogueStep::EnteringTitle,
            RecipeDialogueState::EnteringIngredients { .. } => DialogueStep::EnteringIngredients,
            RecipeDialogueState::EnteringInstructions { .. } => DialogueStep::EnteringInstructions,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, RecipeDialogueState::Idle)
    }
}

/// Build the row to insert once the last step is answered
pub fn finish_draft(
    category: &Category,
    title: &str,
    ingredients: &str,
    instructions: &str,
    author_id: UserId,
) -> NewRecipe {
    NewRecipe {
        title: title.to_string(),
        category_id: category.id,
        ingredients: ingredients.to_string(),
        instructions: instructions.to_string(),
        author_id,
    }
}

fn validate_text(input: &str, max_len: Option<usize>) -> Result<String, ValidationError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    if let Some(max) = max_len {
        if trimmed.chars().count() > max {
            return Err(ValidationError::TooLong { max });
        }
    }

    Ok(trimmed.to_string())
}

/// Validates a recipe title input
pub fn validate_recipe_title(title: &str) -> Result<String, ValidationError> {
    validate_text(title, Some(MAX_TITLE_LEN))
}

/// Validates a new category name
pub fn validate_category_name(name: &str) -> Result<String, ValidationError> {
    validate_text(name, Some(MAX_CATEGORY_NAME_LEN))
}

/// Ingredients and instructions are opaque; they only need content
pub fn validate_free_text(text: &str) -> Result<String, ValidationError> {
    validate_text(text, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_title_validation() {
        assert!(validate_recipe_title("Chocolate Chip Cookies").is_ok());
        assert!(validate_recipe_title("  Mom's Lasagna  ").is_ok());

        assert_eq!(validate_recipe_title(""), Err(ValidationError::Empty));
        assert_eq!(validate_recipe_title("   "), Err(ValidationError::Empty));
        assert_eq!(
            validate_recipe_title(&"a".repeat(256)),
            Err(ValidationError::TooLong { max: 255 })
        );
    }

    #[test]
    fn test_title_length_counts_characters_not_bytes() {
        // 255 two-byte characters
        assert!(validate_recipe_title(&"é".repeat(255)).is_ok());
    }

    #[test]
    fn test_recipe_title_trimming() {
        let result = validate_recipe_title("  Test Recipe  ");
        assert_eq!(result.unwrap(), "Test Recipe");
    }

    #[test]
    fn test_category_name_validation() {
        assert_eq!(validate_category_name("  Soups "), Ok("Soups".to_string()));
        assert_eq!(validate_category_name("\n\t"), Err(ValidationError::Empty));
        assert!(validate_category_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_free_text_has_no_length_cap() {
        assert!(validate_free_text(&"flour, ".repeat(2000)).is_ok());
        assert_eq!(validate_free_text(" "), Err(ValidationError::Empty));
    }

    #[test]
    fn test_dialogue_steps() {
        let category = Category {
            id: 4,
            name: "Desserts".to_string(),
        };
        let state = RecipeDialogueState::EnteringIngredients {
            category: category.clone(),
            title: "Tiramisu".to_string(),
        };

        assert_eq!(state.step(), DialogueStep::EnteringIngredients);
        assert!(!state.is_idle());
        assert!(RecipeDialogueState::default().is_idle());
    }
}
