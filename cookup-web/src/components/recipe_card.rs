use cookup_core::{Difficulty, RecipeSummary};
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub recipe: RecipeSummary,
    /// Player level the lock is judged against.
    pub level: u32,
    pub on_cook: Callback<RecipeSummary>,
}

const fn difficulty_class(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "difficulty-easy",
        Difficulty::Medium => "difficulty-medium",
        Difficulty::Hard => "difficulty-hard",
        Difficulty::Advanced => "difficulty-advanced",
    }
}

#[function_component(RecipeCard)]
pub fn recipe_card(p: &Props) -> Html {
    let recipe = &p.recipe;
    let difficulty = recipe.difficulty();
    let locked = recipe.is_locked_for(p.level);

    let onclick = {
        let cb = p.on_cook.clone();
        let recipe = recipe.clone();
        Callback::from(move |_: MouseEvent| cb.emit(recipe.clone()))
    };

    html! {
        <article class={classes!("recipe-card", locked.then_some("locked"))}
            data-id={recipe.id.to_string()}>
            if let Some(image) = recipe.image.clone() {
                <img src={image} alt={recipe.title.clone()} loading="lazy" />
            }
            <span class="recipe-xp">{ format!("+{} XP", recipe.xp_reward().get()) }</span>
            if locked {
                <span class="lock-badge">
                    { format!("🔒 Unlocks at level {}", difficulty.unlock_level()) }
                </span>
            }
            <h3>{ recipe.title.clone() }</h3>
            <p class="recipe-desc">{ recipe.description() }</p>
            <div class="recipe-meta">
                <span class="recipe-cuisine">{ recipe.primary_cuisine().to_string() }</span>
                <span class={classes!("difficulty", difficulty_class(difficulty))}>
                    { difficulty.to_string() }
                </span>
                <span class="recipe-time">{ format!("{} min", recipe.ready_in_minutes) }</span>
                <span class="recipe-rating">{ format!("★ {:.1}", recipe.rating()) }</span>
            </div>
            <button class="cook-btn" disabled={locked} {onclick}>{ "Cook this recipe" }</button>
        </article>
    }
}
