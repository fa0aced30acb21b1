//! Conversation engine: turns one inbound action into outbound effects.
//!
//! The engine owns no transport. It locks the acting user's session for the
//! whole action, dispatches on `(dialogue step, action)` and returns the
//! effects to render. Catalog failures become a user-facing message and leave
//! the session as it was before the action.

use tracing::{debug, error, info, warn};

use crate::action::{Action, ActionKind, InboundAction};
use crate::config::EngineConfig;
use crate::db::{CatalogStore, UserId};
use crate::dialogue::{DialogueStep, RecipeDialogueState};
use crate::effect::{Effect, Keyboard};
use crate::errors::{CatalogError, CatalogResult};
use crate::localization::{t, t_args};
use crate::pagination::{list_page, resolve_page, PageNav};
use crate::random_pick::pick_random;
use crate::rating::{apply_rating, RatingOutcome, RatingValue};
use crate::session::SessionRegistry;

use super::dialogue_manager::{
    cancel_dialogue, handle_category_name_input, handle_category_pick, handle_ingredients_input,
    handle_instructions_input, handle_title_input, reprompt, start_adding,
};
use super::ui_builder::{
    categories_keyboard, main_menu_keyboard, page_text, recipe_card_keyboard, recipe_card_text,
    recipes_page_keyboard, search_results_keyboard, validation_message,
};

/// The recipe bot, minus the chat platform
#[derive(Debug)]
pub struct RecipeBotEngine {
    store: CatalogStore,
    sessions: SessionRegistry,
    config: EngineConfig,
}

impl RecipeBotEngine {
    pub fn new(store: CatalogStore, config: EngineConfig) -> Self {
        Self {
            store,
            sessions: SessionRegistry::new(config.session_idle_timeout),
            config,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Process one inbound action for its user.
    ///
    /// Actions from the same user are serialized by the session lock; actions
    /// from different users run concurrently.
    pub async fn handle(&self, inbound: InboundAction) -> Vec<Effect> {
        let user_id = inbound.user_id;
        let from_button = inbound.kind == ActionKind::ButtonPress;
        let action = Action::from_inbound(&inbound);

        let mut slot = self.sessions.lock(user_id).await;
        debug!(user_id, step = ?slot.state.step(), action = ?action, "Handling inbound action");

        let mut effects = Vec::new();
        if slot.expire_if_idle(self.sessions.idle_timeout()) {
            info!(user_id, "Recipe draft expired");
            effects.push(Effect::reply(user_id, t("session-expired"), Keyboard::None));
        }
        slot.touch();

        if let Err(e) = self.store.upsert_user(user_id, &inbound.display_name).await {
            effects.push(failure_effect(user_id, &e));
            return effects;
        }

        match self.dispatch(user_id, &mut slot.state, action, from_button).await {
            Ok(produced) => effects.extend(produced),
            Err(e) => effects.push(failure_effect(user_id, &e)),
        }

        effects
    }

    async fn dispatch(
        &self,
        user_id: UserId,
        state: &mut RecipeDialogueState,
        action: Action,
        from_button: bool,
    ) -> CatalogResult<Vec<Effect>> {
        let store = &self.store;

        match (state.step(), action) {
            (_, Action::Start) => {
                *state = RecipeDialogueState::Idle;
                Ok(vec![Effect::reply(user_id, t("welcome"), main_menu_keyboard())])
            }
            (_, Action::Home) => Ok(cancel_dialogue(user_id, state, true)),
            (_, Action::Cancel) => Ok(cancel_dialogue(user_id, state, false)),
            (_, Action::StartAdd) => start_adding(store, user_id, state).await,

            (DialogueStep::Idle, Action::Help) => {
                Ok(vec![Effect::reply(user_id, t("help"), main_menu_keyboard())])
            }
            (_, Action::Help) => {
                let mut effects = vec![Effect::reply(user_id, t("help"), Keyboard::None)];
                effects.extend(reprompt(store, user_id, state).await?);
                Ok(effects)
            }

            (DialogueStep::SelectingCategory, Action::PickCategory(category_id)) => {
                handle_category_pick(store, user_id, state, category_id).await
            }
            (DialogueStep::SelectingCategory, Action::Text(text)) => {
                handle_category_name_input(store, user_id, state, &text).await
            }
            (DialogueStep::EnteringTitle, Action::Text(text)) => {
                Ok(handle_title_input(user_id, state, &text))
            }
            (DialogueStep::EnteringIngredients, Action::Text(text)) => {
                Ok(handle_ingredients_input(user_id, state, &text))
            }
            (DialogueStep::EnteringInstructions, Action::Text(text)) => {
                handle_instructions_input(store, user_id, state, &text).await
            }

            (DialogueStep::Idle, action) => self.handle_idle(user_id, action, from_button).await,

            (step, action) => {
                debug!(user_id, step = ?step, action = ?action, "Action ignored during recipe creation");
                let mut effects = vec![Effect::reply(user_id, t("add-finish-first"), Keyboard::None)];
                effects.extend(reprompt(store, user_id, state).await?);
                Ok(effects)
            }
        }
    }

    /// Browsing, rating, random and search: everything outside the dialogue
    async fn handle_idle(
        &self,
        user_id: UserId,
        action: Action,
        from_button: bool,
    ) -> CatalogResult<Vec<Effect>> {
        match action {
            Action::ShowCategories => Ok(vec![self.categories_effect(user_id, None, from_button).await?]),
            Action::PickCategory(category_id) => match self.store.get_category(category_id).await? {
                Some(category) => {
                    let effect = self
                        .page_effect(user_id, Some((category.id, category.name.as_str())), 0, true)
                        .await?;
                    Ok(vec![effect])
                }
                None => {
                    let effect = self
                        .categories_effect(user_id, Some(t("category-missing")), true)
                        .await?;
                    Ok(vec![effect])
                }
            },
            Action::ShowAllRecipes => Ok(vec![self.page_effect(user_id, None, 0, from_button).await?]),
            Action::Navigate {
                nav,
                current,
                category_id,
            } => self.navigate(user_id, nav, current, category_id).await,
            Action::OpenRecipe(recipe_id) => match self.store.get_recipe_card(recipe_id).await {
                Ok(card) => Ok(vec![Effect::reply(
                    user_id,
                    recipe_card_text(&card),
                    recipe_card_keyboard(recipe_id),
                )]),
                Err(CatalogError::NotFound { .. }) => {
                    Ok(vec![Effect::reply(user_id, t("recipe-missing"), Keyboard::None)])
                }
                Err(e) => Err(e),
            },
            Action::Rate { recipe_id, value } => self.rate(user_id, recipe_id, value).await,
            Action::Random => self.random(user_id).await,
            Action::StartSearch => Ok(vec![Effect::reply(user_id, t("search-prompt"), Keyboard::None)]),
            Action::Text(query) => self.search(user_id, &query).await,
            other => {
                debug!(user_id, action = ?other, "Unrecognized input");
                Ok(vec![Effect::reply(user_id, t("unknown-input"), main_menu_keyboard())])
            }
        }
    }

    async fn categories_effect(
        &self,
        user_id: UserId,
        lead: Option<String>,
        replace: bool,
    ) -> CatalogResult<Effect> {
        let categories = self.store.list_categories().await?;
        let body = if categories.is_empty() {
            t("no-categories")
        } else {
            t("choose-category")
        };
        let text = match lead {
            Some(lead) => format!("{lead}\n{body}"),
            None => body,
        };

        Ok(build_effect(user_id, text, categories_keyboard(&categories), replace))
    }

    async fn page_effect(
        &self,
        user_id: UserId,
        category: Option<(i64, &str)>,
        page: u32,
        replace: bool,
    ) -> CatalogResult<Effect> {
        let category_id = category.map(|(id, _)| id);
        let mut listed = list_page(&self.store, category_id, page, self.config.page_size).await?;

        // The listing shrank under an old button: land on its last page instead
        if listed.is_empty() && page > 0 && listed.total > 0 {
            let page_size = i64::from(listed.page_size);
            let last = u32::try_from((listed.total - 1) / page_size).unwrap_or(0);
            listed = list_page(&self.store, category_id, last, self.config.page_size).await?;
        }

        let text = page_text(&listed, category.map(|(_, name)| name));
        Ok(build_effect(user_id, text, recipes_page_keyboard(&listed), replace))
    }

    async fn navigate(
        &self,
        user_id: UserId,
        nav: PageNav,
        current: u32,
        category_id: Option<i64>,
    ) -> CatalogResult<Vec<Effect>> {
        let target = resolve_page(current, nav);

        let effect = match category_id {
            None => self.page_effect(user_id, None, target, true).await?,
            Some(category_id) => match self.store.get_category(category_id).await? {
                Some(category) => {
                    self.page_effect(user_id, Some((category.id, category.name.as_str())), target, true)
                        .await?
                }
                None => {
                    self.categories_effect(user_id, Some(t("category-missing")), true)
                        .await?
                }
            },
        };

        Ok(vec![effect])
    }

    async fn rate(
        &self,
        user_id: UserId,
        recipe_id: i64,
        value: RatingValue,
    ) -> CatalogResult<Vec<Effect>> {
        let result = match apply_rating(&self.store, user_id, recipe_id, value).await {
            Ok(result) => result,
            Err(CatalogError::NotFound { .. }) => {
                let missing = t("recipe-missing");
                return Ok(vec![
                    Effect::replace(user_id, missing.clone(), Keyboard::None).with_notice(missing),
                ]);
            }
            Err(e) => return Err(e),
        };

        let notice = match result.outcome {
            RatingOutcome::Applied => t("rating-applied"),
            RatingOutcome::Changed => t("rating-changed"),
            RatingOutcome::Reverted => t("rating-reverted"),
        };

        let effect = match self.store.get_recipe_card(recipe_id).await {
            Ok(card) => Effect::replace(user_id, recipe_card_text(&card), recipe_card_keyboard(recipe_id)),
            Err(CatalogError::NotFound { .. }) => {
                Effect::replace(user_id, t("recipe-missing"), Keyboard::None)
            }
            Err(e) => return Err(e),
        };

        Ok(vec![effect.with_notice(notice)])
    }

    async fn random(&self, user_id: UserId) -> CatalogResult<Vec<Effect>> {
        let Some(recipe) = pick_random(&self.store).await? else {
            return Ok(vec![Effect::reply(user_id, t("random-empty"), main_menu_keyboard())]);
        };

        match self.store.get_recipe_card(recipe.id).await {
            Ok(card) => Ok(vec![Effect::reply(
                user_id,
                recipe_card_text(&card),
                recipe_card_keyboard(recipe.id),
            )]),
            Err(CatalogError::NotFound { .. }) => {
                Ok(vec![Effect::reply(user_id, t("recipe-missing"), Keyboard::None)])
            }
            Err(e) => Err(e),
        }
    }

    async fn search(&self, user_id: UserId, query: &str) -> CatalogResult<Vec<Effect>> {
        let limit = usize::try_from(self.config.search_limit).unwrap_or(usize::MAX);
        let results = match self.store.search_recipes_by_title(query, limit).await {
            Ok(results) => results,
            Err(CatalogError::ValidationFailed(err)) => {
                return Ok(vec![Effect::reply(user_id, validation_message(err), Keyboard::None)]);
            }
            Err(e) => return Err(e),
        };

        if results.is_empty() {
            return Ok(vec![Effect::reply(user_id, t("search-empty"), main_menu_keyboard())]);
        }

        let text = t_args("search-results", &[("query", query.trim())]);
        Ok(vec![Effect::reply(user_id, text, search_results_keyboard(&results))])
    }
}

fn build_effect(user_id: UserId, text: String, keyboard: Keyboard, replace: bool) -> Effect {
    if replace {
        Effect::replace(user_id, text, keyboard)
    } else {
        Effect::reply(user_id, text, keyboard)
    }
}

/// User-facing message for an error that escaped the handlers
fn failure_effect(user_id: UserId, err: &CatalogError) -> Effect {
    if err.is_recoverable() {
        warn!(user_id, error = %err, "Recoverable catalog error reached the engine");
    } else {
        error!(user_id, error = %err, "Catalog store failure");
    }

    let text = match err {
        CatalogError::StoreUnavailable(_) => t("error-store-unavailable"),
        CatalogError::Conflict(_) => t("error-conflict"),
        CatalogError::NotFound { entity: "recipe", .. } => t("recipe-missing"),
        CatalogError::NotFound { .. } => t("error-conflict"),
        CatalogError::ValidationFailed(err) => validation_message(*err),
    };

    Effect::reply(user_id, text, Keyboard::None)
}
