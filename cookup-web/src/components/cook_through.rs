use cookup_core::{RecipeDetail, RecipeSummary};
use yew::prelude::*;

use crate::hooks::{LedgerHandle, ProviderHandle};

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub ledger: LedgerHandle,
    pub provider: ProviderHandle,
    pub recipe: RecipeSummary,
    /// Ingredients and steps already at hand; fetched from the provider when absent.
    #[prop_or_default]
    pub detail: Option<RecipeDetail>,
    pub on_close: Callback<()>,
}

#[derive(Debug, Clone, PartialEq)]
enum DetailState {
    Loading,
    Ready(RecipeDetail),
    Failed(String),
}

/// Record `recipe` as cooked and describe the result for the player.
pub fn finish_cooking(ledger: &LedgerHandle, recipe: &RecipeSummary) -> String {
    match ledger.cook_recipe(recipe) {
        Ok(cooked) => {
            let outcome = &cooked.outcome;
            log::info!(
                "cooked {} (+{} XP, level {})",
                recipe.id,
                outcome.xp_awarded,
                outcome.profile.level
            );
            let mut message = format!(
                "Congrats! You earned +{} XP. Total XP: {}.",
                outcome.xp_awarded, outcome.profile.experience_points
            );
            if outcome.levels_gained > 0 {
                message.push_str(&format!(" Level up! You are now level {}.", outcome.profile.level));
            }
            for achievement in &outcome.unlocked {
                message.push_str(&format!(" Unlocked: {}.", achievement.title));
            }
            message
        }
        Err(err) => {
            log::warn!("cook rejected: {err}");
            err.to_string()
        }
    }
}

#[function_component(CookThrough)]
pub fn cook_through(p: &Props) -> Html {
    let detail = {
        let preloaded = p.detail.clone();
        use_state(move || preloaded.map_or(DetailState::Loading, DetailState::Ready))
    };
    let result = use_state(|| None::<String>);

    {
        let detail = detail.clone();
        let provider = p.provider.clone();
        let preloaded = p.detail.is_some();
        use_effect_with(p.recipe.id, move |id| {
            if !preloaded {
                let id = *id;
                detail.set(DetailState::Loading);
                wasm_bindgen_futures::spawn_local(async move {
                    match provider.detail(id).await {
                        Ok(found) => detail.set(DetailState::Ready(found)),
                        Err(err) => {
                            log::warn!("recipe {id} detail failed: {err}");
                            detail.set(DetailState::Failed(err.to_string()));
                        }
                    }
                });
            }
            || ()
        });
    }

    let on_finish = {
        let ledger = p.ledger.clone();
        let recipe = p.recipe.clone();
        let result = result.clone();
        Callback::from(move |_: MouseEvent| result.set(Some(finish_cooking(&ledger, &recipe))))
    };
    let on_back = {
        let cb = p.on_close.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };

    let body = match &*detail {
        DetailState::Loading => html! { <p class="detail-loading">{ "Loading recipe..." }</p> },
        DetailState::Failed(error) => html! {
            <p class="detail-error" role="alert">{ format!("Recipe details unavailable: {error}") }</p>
        },
        DetailState::Ready(found) => html! {
            <>
                <h3>{ "Ingredients" }</h3>
                <ul class="ingredients">
                    { for found.ingredients.iter().map(|item| html! { <li>{ item.original.clone() }</li> }) }
                </ul>
                <h3>{ "Instructions" }</h3>
                <ol class="steps">
                    { for found.steps.iter().map(|step| html! {
                        <li value={step.number.to_string()}>{ step.step.clone() }</li>
                    }) }
                </ol>
            </>
        },
    };
    let loading = matches!(*detail, DetailState::Loading);

    html! {
        <section class="cook-through" aria-label={format!("Cooking {}", p.recipe.title)}>
            <button id="back-to-recipes-btn" onclick={on_back}>{ "Back to recipes" }</button>
            <h2>{ p.recipe.title.clone() }</h2>
            if let Some(image) = p.recipe.image.clone() {
                <img src={image} alt={p.recipe.title.clone()} />
            }
            { body }
            <button id="finish-cooking-btn" disabled={loading} onclick={on_finish}>
                { if loading { "Loading...".to_string() } else { format!("Finish cooking (+{} XP)", p.recipe.xp_reward().get()) } }
            </button>
            if let Some(message) = (*result).clone() {
                <p class="cook-result" role="status">{ message }</p>
            }
        </section>
    }
}
