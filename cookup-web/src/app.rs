use cookup_core::{MissionLookup, RecipeSummary};
use yew::prelude::*;

use crate::components::achievement_list::AchievementList;
use crate::components::cook_through::CookThrough;
use crate::components::daily_mission_card::DailyMissionCard;
use crate::components::data_settings::DataSettings;
use crate::components::mastery_tree::MasteryTree;
use crate::components::profile_stats::ProfileStats;
use crate::components::recipe_browser::RecipeBrowser;
use crate::components::xp_progress_bar::XpProgressBar;
use crate::hooks::{LedgerHandle, ProviderHandle, use_ledger};

#[derive(Properties, Clone, PartialEq, Default)]
pub struct Props {
    /// Ledger to mount; defaults to one over the platform storage.
    #[prop_or_default]
    pub ledger: Option<LedgerHandle>,
    /// Recipe source; defaults to the Spoonacular client.
    #[prop_or_default]
    pub provider: Option<ProviderHandle>,
}

#[function_component(App)]
pub fn app(p: &Props) -> Html {
    let ledger = use_ledger(p.ledger.clone());
    let provider = use_memo(p.provider.clone(), |provider| {
        provider.clone().unwrap_or_default()
    });
    let provider = (*provider).clone();
    let cooking = use_state(|| None::<RecipeSummary>);
    let mission = use_state(|| None::<RecipeSummary>);
    let mission_error = use_state(|| None::<AttrValue>);
    let cuisine = {
        let first = ledger
            .catalog()
            .cuisines
            .first()
            .map(|tree| tree.name.clone())
            .unwrap_or_default();
        use_state(move || AttrValue::from(first))
    };

    {
        let mission = mission.clone();
        let mission_error = mission_error.clone();
        use_effect_with((ledger.clone(), provider.clone()), move |(ledger, provider)| {
            load_mission(ledger.clone(), provider.clone(), move |lookup| match lookup {
                MissionLookup::Cached(recipe) | MissionLookup::Fetched(recipe) => {
                    mission.set(Some(recipe));
                }
                MissionLookup::Unavailable { reason } => {
                    log::warn!("daily mission unavailable: {reason}");
                    mission_error.set(Some(AttrValue::from(
                        "Today's mission could not be loaded.",
                    )));
                }
            });
            || ()
        });
    }

    let cuisine_buttons = ledger.catalog().cuisines.iter().map(|tree| {
        let label = tree.name.clone();
        let name = AttrValue::from(label.clone());
        let selected = *cuisine == name;
        let onclick = {
            let cuisine = cuisine.clone();
            let name = name.clone();
            Callback::from(move |_: MouseEvent| cuisine.set(name.clone()))
        };
        html! {
            <button class={classes!("cuisine-tab", selected.then_some("active"))}
                aria-pressed={selected.to_string()} {onclick}>{ label }</button>
        }
    });

    let on_cook = {
        let cooking = cooking.clone();
        Callback::from(move |recipe: RecipeSummary| cooking.set(Some(recipe)))
    };
    let on_close = {
        let cooking = cooking.clone();
        Callback::from(move |()| cooking.set(None))
    };
    let recipes = match (*cooking).clone() {
        Some(recipe) => html! {
            <CookThrough ledger={ledger.clone()} provider={provider.clone()} {recipe} {on_close} />
        },
        None => html! {
            <RecipeBrowser ledger={ledger.clone()} provider={provider.clone()} {on_cook} />
        },
    };

    html! {
        <ContextProvider<LedgerHandle> context={ledger.clone()}>
            <main id="main" class="cookup">
                <header><h1>{ "CookUp Kitchen" }</h1></header>
                <XpProgressBar ledger={ledger.clone()} />
                <DailyMissionCard ledger={ledger.clone()} mission={(*mission).clone()}
                    error={(*mission_error).clone()} />
                { recipes }
                <nav class="cuisine-tabs" aria-label="Cuisines">{ for cuisine_buttons }</nav>
                <MasteryTree ledger={ledger.clone()} cuisine={(*cuisine).clone()} />
                <AchievementList ledger={ledger.clone()} />
                <ProfileStats ledger={ledger.clone()} />
                <DataSettings ledger={ledger.clone()} />
            </main>
        </ContextProvider<LedgerHandle>>
    }
}

#[cfg(target_arch = "wasm32")]
fn load_mission(
    ledger: LedgerHandle,
    provider: ProviderHandle,
    done: impl FnOnce(MissionLookup<RecipeSummary>) + 'static,
) {
    wasm_bindgen_futures::spawn_local(async move {
        done(ledger.daily_mission(&*provider).await);
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn load_mission(
    ledger: LedgerHandle,
    _provider: ProviderHandle,
    done: impl FnOnce(MissionLookup<RecipeSummary>) + 'static,
) {
    // No fetch outside the browser; serve whatever is cached.
    if let Some(recipe) = ledger.daily().cached::<RecipeSummary>() {
        done(MissionLookup::Cached(recipe));
    }
}
