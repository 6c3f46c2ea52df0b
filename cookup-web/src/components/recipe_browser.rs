use cookup_core::{CUISINE_FILTERS, RecipeSummary, SearchPage, SearchQuery};
use yew::prelude::*;

use crate::components::recipe_card::RecipeCard;
use crate::hooks::{LedgerHandle, ProviderHandle, use_profile};

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub ledger: LedgerHandle,
    pub provider: ProviderHandle,
    /// Fired when the player picks an unlocked recipe to cook.
    pub on_cook: Callback<RecipeSummary>,
}

/// Results gathered so far for the current search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseState {
    pub recipes: Vec<RecipeSummary>,
    pub total_results: Option<u64>,
    pub loading: bool,
    pub error: Option<String>,
}

impl BrowseState {
    #[must_use]
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// Fold in a fetched page: page 1 replaces, later pages append.
    pub fn absorb(&mut self, page: u32, result: SearchPage) {
        if page <= 1 {
            self.recipes.clear();
        }
        // Offsets shift when the catalog changes between requests.
        for recipe in result.results {
            if !self.recipes.iter().any(|known| known.id == recipe.id) {
                self.recipes.push(recipe);
            }
        }
        self.total_results = result.total_results;
        self.loading = false;
        self.error = None;
    }

    pub fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    #[must_use]
    pub fn can_load_more(&self) -> bool {
        let loaded = u64::try_from(self.recipes.len()).unwrap_or(u64::MAX);
        self.total_results.is_some_and(|total| loaded < total)
    }
}

#[function_component(RecipeBrowser)]
pub fn recipe_browser(p: &Props) -> Html {
    let profile = use_profile(&p.ledger);
    let draft = use_state(String::new);
    let query = use_state(String::new);
    let cuisines = use_state(Vec::<String>::new);
    let unlocked_only = use_state(|| false);
    let page = use_state(|| 1_u32);
    let browse = use_state(BrowseState::loading);

    {
        let browse = browse.clone();
        let provider = p.provider.clone();
        use_effect_with(
            ((*query).clone(), (*cuisines).clone(), *page),
            move |(text, cuisines, page)| {
                let page = *page;
                let request = SearchQuery::page(text.clone(), cuisines.clone(), page);
                let mut next = (*browse).clone();
                next.loading = true;
                browse.set(next.clone());
                wasm_bindgen_futures::spawn_local(async move {
                    match provider.search(&request).await {
                        Ok(result) => next.absorb(page, result),
                        Err(err) => {
                            log::warn!("recipe search failed: {err}");
                            next.fail(err.to_string());
                        }
                    }
                    browse.set(next);
                });
                || ()
            },
        );
    }

    let on_input = {
        let draft = draft.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<web_sys::HtmlInputElement>() {
                draft.set(input.value());
            }
        })
    };
    let on_search = {
        let draft = draft.clone();
        let query = query.clone();
        let page = page.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            query.set(draft.trim().to_string());
            page.set(1);
        })
    };
    let on_unlocked_only = {
        let unlocked_only = unlocked_only.clone();
        Callback::from(move |_: Event| unlocked_only.set(!*unlocked_only))
    };
    let on_load_more = {
        let page = page.clone();
        Callback::from(move |_: MouseEvent| page.set(*page + 1))
    };

    let filter_buttons = CUISINE_FILTERS.iter().map(|(id, label)| {
        let selected = cuisines.iter().any(|c| c == id);
        let onclick = {
            let cuisines = cuisines.clone();
            let page = page.clone();
            let id = (*id).to_string();
            Callback::from(move |_: MouseEvent| {
                let mut next = (*cuisines).clone();
                if let Some(pos) = next.iter().position(|c| *c == id) {
                    next.remove(pos);
                } else {
                    next.push(id.clone());
                }
                cuisines.set(next);
                page.set(1);
            })
        };
        html! {
            <button class={classes!("cuisine-filter", selected.then_some("active"))}
                data-cuisine={*id} aria-pressed={selected.to_string()} {onclick}>
                { *label }
            </button>
        }
    });

    let visible: Vec<&RecipeSummary> = browse
        .recipes
        .iter()
        .filter(|recipe| !*unlocked_only || !recipe.is_locked_for(profile.level))
        .collect();
    let status = if let Some(error) = &browse.error {
        html! { <p class="browse-error" role="alert">{ format!("Recipes could not be loaded: {error}") }</p> }
    } else if browse.loading && browse.recipes.is_empty() {
        html! { <p class="browse-loading">{ "Loading recipes..." }</p> }
    } else if visible.is_empty() {
        html! { <p class="browse-empty">{ "No recipes found." }</p> }
    } else {
        html! {}
    };

    html! {
        <section class="recipe-browser" aria-label="Recipes">
            <h2>{ "Recipes" }</h2>
            <form class="recipe-search" onsubmit={on_search}>
                <input id="recipe-search-input" type="search" placeholder="Search recipes"
                    value={(*draft).clone()} oninput={on_input} />
                <button id="recipe-search-btn" type="submit">{ "Search" }</button>
            </form>
            <div class="cuisine-filters" role="group" aria-label="Cuisine filters">
                { for filter_buttons }
            </div>
            <label class="unlocked-only">
                <input id="unlocked-only" type="checkbox" checked={*unlocked_only}
                    onchange={on_unlocked_only} />
                { "Unlocked only" }
            </label>
            { status }
            <div class="recipe-grid">
                { for visible.into_iter().map(|recipe| html! {
                    <RecipeCard key={recipe.id.to_string()} recipe={recipe.clone()}
                        level={profile.level} on_cook={p.on_cook.clone()} />
                }) }
            </div>
            if browse.can_load_more() {
                <button id="load-more-btn" disabled={browse.loading} onclick={on_load_more}>
                    { if browse.loading { "Loading..." } else { "Load more recipes" } }
                </button>
            }
            if let Some(total) = browse.total_results {
                <p class="browse-count">{ format!("Showing {} of {total}", browse.recipes.len()) }</p>
            }
        </section>
    }
}
