//! Dialogue Manager module for handling recipe creation state transitions
//!
//! Each handler receives the user's current state by mutable reference and
//! only overwrites it once every catalog call it depends on has succeeded. An
//! error returned from here therefore leaves the draft exactly as it was.

use tracing::{debug, info, warn};

use crate::db::{CatalogStore, UserId};
use crate::dialogue::{
    finish_draft, validate_category_name, validate_free_text, validate_recipe_title,
    RecipeDialogueState,
};
use crate::effect::{Effect, Keyboard};
use crate::errors::{CatalogError, CatalogResult};
use crate::localization::{t, t_args};

use super::ui_builder::{cancel_keyboard, categories_keyboard, main_menu_keyboard, validation_message};

/// Category list prompt used when entering and re-entering category selection
async fn category_prompt(store: &CatalogStore, user_id: UserId, lead: Option<String>) -> CatalogResult<Effect> {
    let categories = store.list_categories().await?;
    let text = match lead {
        Some(lead) => format!("{}\n{}", lead, t("add-choose-category")),
        None => t("add-choose-category"),
    };
    Ok(Effect::reply(user_id, text, categories_keyboard(&categories)))
}

/// Start (or restart) the dialogue; any previous draft is replaced
pub async fn start_adding(
    store: &CatalogStore,
    user_id: UserId,
    state: &mut RecipeDialogueState,
) -> CatalogResult<Vec<Effect>> {
    let prompt = category_prompt(store, user_id, None).await?;

    if !state.is_idle() {
        debug!(user_id, previous = ?state.step(), "Replacing unfinished recipe draft");
    }
    *state = RecipeDialogueState::SelectingCategory;

    Ok(vec![
        Effect::reply(user_id, t("add-start"), cancel_keyboard()),
        prompt,
    ])
}

/// Existing category chosen from the inline list
pub async fn handle_category_pick(
    store: &CatalogStore,
    user_id: UserId,
    state: &mut RecipeDialogueState,
    category_id: i64,
) -> CatalogResult<Vec<Effect>> {
    match store.get_category(category_id).await? {
        Some(category) => {
            let text = format!(
                "{}\n{}",
                t_args("add-category-selected", &[("category", &category.name)]),
                t("add-enter-title")
            );
            *state = RecipeDialogueState::EnteringTitle { category };
            Ok(vec![Effect::reply(user_id, text, cancel_keyboard())])
        }
        None => {
            warn!(user_id, category_id, "Stale category picked during recipe creation");
            let prompt = category_prompt(store, user_id, Some(t("category-missing"))).await?;
            Ok(vec![prompt])
        }
    }
}

/// Free text in category selection names a (possibly new) category
pub async fn handle_category_name_input(
    store: &CatalogStore,
    user_id: UserId,
    state: &mut RecipeDialogueState,
    input: &str,
) -> CatalogResult<Vec<Effect>> {
    let name = match validate_category_name(input) {
        Ok(name) => name,
        Err(err) => return Ok(vec![Effect::reply(user_id, validation_message(err), Keyboard::None)]),
    };

    let resolved = store.find_or_create_category(&name).await?;
    let key = if resolved.created {
        "add-category-created"
    } else {
        "add-category-selected"
    };
    let text = format!(
        "{}\n{}",
        t_args(key, &[("category", &resolved.category.name)]),
        t("add-enter-title")
    );

    *state = RecipeDialogueState::EnteringTitle {
        category: resolved.category,
    };
    Ok(vec![Effect::reply(user_id, text, cancel_keyboard())])
}

/// Title step
pub fn handle_title_input(
    user_id: UserId,
    state: &mut RecipeDialogueState,
    input: &str,
) -> Vec<Effect> {
    let RecipeDialogueState::EnteringTitle { category } = state else {
        return reprompt_text_step(user_id, state);
    };

    match validate_recipe_title(input) {
        Ok(title) => {
            *state = RecipeDialogueState::EnteringIngredients {
                category: category.clone(),
                title,
            };
            vec![Effect::reply(user_id, t("add-enter-ingredients"), Keyboard::None)]
        }
        Err(err) => vec![Effect::reply(user_id, validation_message(err), Keyboard::None)],
    }
}

/// Ingredients step
pub fn handle_ingredients_input(
    user_id: UserId,
    state: &mut RecipeDialogueState,
    input: &str,
) -> Vec<Effect> {
    let RecipeDialogueState::EnteringIngredients { category, title } = state else {
        return reprompt_text_step(user_id, state);
    };

    match validate_free_text(input) {
        Ok(ingredients) => {
            *state = RecipeDialogueState::EnteringInstructions {
                category: category.clone(),
                title: title.clone(),
                ingredients,
            };
            vec![Effect::reply(user_id, t("add-enter-instructions"), Keyboard::None)]
        }
        Err(err) => vec![Effect::reply(user_id, validation_message(err), Keyboard::None)],
    }
}

/// Last step: the only place a recipe gets written
pub async fn handle_instructions_input(
    store: &CatalogStore,
    user_id: UserId,
    state: &mut RecipeDialogueState,
    input: &str,
) -> CatalogResult<Vec<Effect>> {
    let RecipeDialogueState::EnteringInstructions {
        category,
        title,
        ingredients,
    } = state
    else {
        return Ok(reprompt_text_step(user_id, state));
    };

    let instructions = match validate_free_text(input) {
        Ok(instructions) => instructions,
        Err(err) => return Ok(vec![Effect::reply(user_id, validation_message(err), Keyboard::None)]),
    };

    let draft = finish_draft(category, title, ingredients, &instructions, user_id);
    match store.create_recipe(&draft).await {
        Ok(recipe_id) => {
            info!(user_id, recipe_id, "Recipe creation dialogue completed");
            let text = t_args(
                "add-complete",
                &[("title", &draft.title), ("category", &category.name)],
            );
            *state = RecipeDialogueState::Idle;
            Ok(vec![Effect::reply(user_id, text, main_menu_keyboard())])
        }
        Err(CatalogError::NotFound { entity: "category", id }) => {
            warn!(user_id, category_id = id, "Draft category vanished before commit");
            let prompt = category_prompt(store, user_id, Some(t("category-missing"))).await?;
            *state = RecipeDialogueState::SelectingCategory;
            Ok(vec![prompt])
        }
        Err(e) => Err(e),
    }
}

/// Drop the draft. `home` also returns to the main menu with its own wording.
pub fn cancel_dialogue(user_id: UserId, state: &mut RecipeDialogueState, home: bool) -> Vec<Effect> {
    if !state.is_idle() {
        info!(user_id, step = ?state.step(), "Recipe creation dialogue cancelled");
    }

    let key = match (home, state.is_idle()) {
        (true, _) => "back-home",
        (false, false) => "add-cancelled",
        (false, true) => "nothing-to-cancel",
    };
    *state = RecipeDialogueState::Idle;

    vec![Effect::reply(user_id, t(key), main_menu_keyboard())]
}

/// Repeat the question for the current step without touching the draft
pub async fn reprompt(
    store: &CatalogStore,
    user_id: UserId,
    state: &RecipeDialogueState,
) -> CatalogResult<Vec<Effect>> {
    match state {
        RecipeDialogueState::SelectingCategory => Ok(vec![category_prompt(store, user_id, None).await?]),
        _ => Ok(reprompt_text_step(user_id, state)),
    }
}

fn reprompt_text_step(user_id: UserId, state: &RecipeDialogueState) -> Vec<Effect> {
    let key = match state {
        RecipeDialogueState::Idle => {
            return vec![Effect::reply(user_id, t("choose-action"), main_menu_keyboard())];
        }
        RecipeDialogueState::SelectingCategory => "add-choose-category",
        RecipeDialogueState::EnteringTitle { .. } => "add-enter-title",
        RecipeDialogueState::EnteringIngredients { .. } => "add-enter-ingredients",
        RecipeDialogueState::EnteringInstructions { .. } => "add-enter-instructions",
    };
    vec![Effect::reply(user_id, t(key), cancel_keyboard())]
}
