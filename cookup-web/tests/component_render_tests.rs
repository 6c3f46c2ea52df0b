use cookup_core::{
    CUISINE_FILTERS, Counter, FixtureProvider, Ingredient, InstructionStep, LedgerError,
    MemoryBackend, ProgressionLedger, RecipeDetail, RecipeSummary, SearchPage, XpAmount,
};
use cookup_web::app::{self, App};
use cookup_web::components::achievement_list::{self, AchievementList};
use cookup_web::components::cook_through::{self, CookThrough, finish_cooking};
use cookup_web::components::daily_mission_card::{self, DailyMissionCard};
use cookup_web::components::data_settings::{self, DataSettings, import_text};
use cookup_web::components::mastery_tree::{self, MasteryTree};
use cookup_web::components::profile_stats::{self, ProfileStats};
use cookup_web::components::recipe_browser::{self, BrowseState, RecipeBrowser};
use cookup_web::components::recipe_card::{self, RecipeCard};
use cookup_web::components::xp_progress_bar::{self, XpProgressBar};
use cookup_web::hooks::{LedgerHandle, ProviderHandle, use_ledger};
use futures::executor::block_on;
use yew::prelude::*;
use yew::LocalServerRenderer;

fn ledger() -> LedgerHandle {
    LedgerHandle::new(ProgressionLedger::new(Box::new(MemoryBackend::new())))
}

fn provider() -> ProviderHandle {
    ProviderHandle::new(FixtureProvider::new(Vec::new()))
}

fn recipe(id: u64, minutes: u32, cuisine: &str) -> RecipeSummary {
    RecipeSummary {
        id,
        title: format!("Recipe {id}"),
        ready_in_minutes: minutes,
        cuisines: vec![cuisine.into()],
        ..RecipeSummary::default()
    }
}

#[test]
fn xp_bar_shows_level_and_remaining() {
    let ledger = ledger();
    ledger.grant_xp(XpAmount::new(450));
    let html = block_on(
        LocalServerRenderer::<XpProgressBar>::with_props(xp_progress_bar::Props {
            ledger: ledger.clone(),
        })
        .render(),
    );
    assert!(html.contains("Lv 2"), "{html}");
    assert!(html.contains("750 XP to level 3"));
    assert!(html.contains(ledger.level_title()));
}

#[test]
fn achievement_list_marks_unlocks() {
    let ledger = ledger();
    ledger
        .cook_recipe(&RecipeSummary {
            id: 7,
            title: "Omelette".into(),
            ready_in_minutes: 10,
            cuisines: vec!["French".into()],
            ..RecipeSummary::default()
        })
        .unwrap();
    let html = block_on(
        LocalServerRenderer::<AchievementList>::with_props(achievement_list::Props {
            ledger,
        })
        .render(),
    );
    assert!(html.contains("Achievements 2/9"), "{html}");
    assert!(html.contains("badge unlocked"));
    assert!(html.contains("badge locked"));
}

#[test]
fn daily_card_states() {
    let ledger = ledger();
    let loading = block_on(
        LocalServerRenderer::<DailyMissionCard>::with_props(daily_mission_card::Props {
            ledger: ledger.clone(),
            mission: None,
            error: None,
        })
        .render(),
    );
    assert!(loading.contains("Finding today"));
    assert!(loading.contains("complete-mission-btn"));

    let recipe = RecipeSummary {
        id: 3,
        title: "Pad Thai".into(),
        ready_in_minutes: 30,
        cuisines: vec!["Thai".into()],
        summary: Some("<b>Rice noodles</b> with tamarind".into()),
        ..RecipeSummary::default()
    };
    ledger.complete_daily_mission().unwrap();
    let done = block_on(
        LocalServerRenderer::<DailyMissionCard>::with_props(daily_mission_card::Props {
            ledger: ledger.clone(),
            mission: Some(recipe),
            error: None,
        })
        .render(),
    );
    assert!(done.contains("Pad Thai"));
    assert!(done.contains("Rice noodles with tamarind"));
    assert!(done.contains("Completed today"));
    assert!(!done.contains("complete-mission-btn"));

    let failed = block_on(
        LocalServerRenderer::<DailyMissionCard>::with_props(daily_mission_card::Props {
            ledger,
            mission: None,
            error: Some(AttrValue::from("offline")),
        })
        .render(),
    );
    assert!(failed.contains("offline"));
}

#[test]
fn mastery_tree_locks_boss_until_meals_done() {
    let ledger = ledger();
    let render = |ledger: &LedgerHandle| {
        block_on(
            LocalServerRenderer::<MasteryTree>::with_props(mastery_tree::Props {
                ledger: ledger.clone(),
                cuisine: AttrValue::from("Italian"),
            })
            .render(),
        )
    };
    let html = render(&ledger);
    assert!(html.contains("tier boss locked"), "{html}");

    for tier in 0..4 {
        ledger.toggle_mastery_meal("Italian", tier).unwrap();
    }
    let html = render(&ledger);
    assert!(!html.contains("locked"));
    ledger.toggle_mastery_meal("Italian", 4).unwrap();
    assert!(render(&ledger).contains("Cuisine mastered!"));
}

#[test]
fn mastery_tree_reports_unknown_cuisine() {
    let html = block_on(
        LocalServerRenderer::<MasteryTree>::with_props(mastery_tree::Props {
            ledger: ledger(),
            cuisine: AttrValue::from("Martian"),
        })
        .render(),
    );
    assert!(html.contains("Unknown cuisine: Martian"));
}

#[test]
fn app_renders_every_panel() {
    let html = block_on(
        LocalServerRenderer::<App>::with_props(app::Props {
            ledger: Some(ledger()),
            provider: Some(provider()),
        })
        .render(),
    );
    for marker in [
        "CookUp Kitchen",
        "xp-bar",
        "daily-mission",
        "cuisine-tabs",
        "mastery-tree",
        "achievements",
        "recipe-browser",
        "profile-stats",
        "data-settings",
        "reset-progress-btn",
    ] {
        assert!(html.contains(marker), "missing {marker}");
    }
}

#[test]
fn app_mounts_the_ledger_it_is_given() {
    let ledger = ledger();
    ledger.grant_xp(XpAmount::new(450));
    let html = block_on(
        LocalServerRenderer::<App>::with_props(app::Props {
            ledger: Some(ledger),
            provider: Some(provider()),
        })
        .render(),
    );
    assert!(html.contains("Lv 2"), "{html}");
}

#[derive(Properties, Clone, PartialEq)]
struct ReadoutProps {
    preferred: Option<LedgerHandle>,
}

#[function_component(XpReadout)]
fn xp_readout(p: &ReadoutProps) -> Html {
    let ledger = use_ledger(p.preferred.clone());
    html! { <span>{ format!("xp={}", ledger.profile().experience_points) }</span> }
}

#[derive(Properties, Clone, PartialEq)]
struct ScopeProps {
    context: LedgerHandle,
    preferred: Option<LedgerHandle>,
}

#[function_component(LedgerScope)]
fn ledger_scope(p: &ScopeProps) -> Html {
    html! {
        <ContextProvider<LedgerHandle> context={p.context.clone()}>
            <XpReadout preferred={p.preferred.clone()} />
        </ContextProvider<LedgerHandle>>
    }
}

#[test]
fn use_ledger_prefers_prop_then_context() {
    let context = ledger();
    context.grant_xp(XpAmount::new(30));
    let preferred = ledger();
    preferred.grant_xp(XpAmount::new(70));
    let render = |preferred: Option<LedgerHandle>| {
        block_on(
            LocalServerRenderer::<LedgerScope>::with_props(ScopeProps {
                context: context.clone(),
                preferred,
            })
            .render(),
        )
    };
    assert!(render(Some(preferred)).contains("xp=70"));
    assert!(render(None).contains("xp=30"));
}

#[test]
fn recipe_card_locks_above_player_level() {
    let render = |recipe: RecipeSummary, level: u32| {
        block_on(
            LocalServerRenderer::<RecipeCard>::with_props(recipe_card::Props {
                recipe,
                level,
                on_cook: Callback::noop(),
            })
            .render(),
        )
    };
    let mut advanced = recipe(9, 120, "French");
    advanced.spoonacular_score = Some(90.0);
    let html = render(advanced.clone(), 1);
    assert!(html.contains("recipe-card locked"), "{html}");
    assert!(html.contains("Unlocks at level 4"));
    assert!(html.contains("+240 XP"));
    assert!(html.contains("★ 4.5"));
    assert!(html.contains("disabled"));

    let html = render(advanced, 4);
    assert!(!html.contains("Unlocks at level"));
    assert!(!html.contains("disabled"));

    let easy = render(recipe(1, 10, ""), 1);
    assert!(easy.contains("difficulty-easy"));
    assert!(easy.contains("Global"));
}

#[test]
fn recipe_browser_offers_search_filters_and_loading_state() {
    let html = block_on(
        LocalServerRenderer::<RecipeBrowser>::with_props(recipe_browser::Props {
            ledger: ledger(),
            provider: provider(),
            on_cook: Callback::noop(),
        })
        .render(),
    );
    assert!(html.contains("recipe-search-input"));
    assert!(html.contains("Unlocked only"));
    assert!(html.contains("Loading recipes..."));
    assert_eq!(
        html.matches("class=\"cuisine-filter\"").count(),
        CUISINE_FILTERS.len()
    );
    assert!(html.contains("data-cuisine=\"mediterranean\""));
    assert!(!html.contains("load-more-btn"));
}

#[test]
fn browse_state_appends_later_pages() {
    let page = |ids: &[u64], total: u64| SearchPage {
        results: ids.iter().map(|id| recipe(*id, 20, "Thai")).collect(),
        total_results: Some(total),
    };
    let mut state = BrowseState::loading();
    state.absorb(1, page(&[1, 2], 3));
    assert!(!state.loading);
    assert!(state.can_load_more());

    state.absorb(2, page(&[2, 3], 3));
    let ids: Vec<u64> = state.recipes.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(!state.can_load_more());

    state.absorb(1, page(&[7], 1));
    assert_eq!(state.recipes.len(), 1);

    state.fail("offline".into());
    assert_eq!(state.error.as_deref(), Some("offline"));
    assert_eq!(state.recipes.len(), 1);
}

#[test]
fn cook_through_lists_ingredients_and_steps() {
    let detail = RecipeDetail {
        ingredients: vec![Ingredient {
            name: "egg".into(),
            original: "3 large eggs".into(),
        }],
        steps: vec![InstructionStep {
            number: 1,
            step: "Whisk the eggs.".into(),
        }],
    };
    let html = block_on(
        LocalServerRenderer::<CookThrough>::with_props(cook_through::Props {
            ledger: ledger(),
            provider: provider(),
            recipe: recipe(7, 10, "French"),
            detail: Some(detail),
            on_close: Callback::noop(),
        })
        .render(),
    );
    assert!(html.contains("3 large eggs"), "{html}");
    assert!(html.contains("Whisk the eggs."));
    assert!(html.contains("Finish cooking (+20 XP)"));

    let loading = block_on(
        LocalServerRenderer::<CookThrough>::with_props(cook_through::Props {
            ledger: ledger(),
            provider: provider(),
            recipe: recipe(7, 10, "French"),
            detail: None,
            on_close: Callback::noop(),
        })
        .render(),
    );
    assert!(loading.contains("Loading recipe..."));
}

#[test]
fn finishing_a_cook_records_it_in_the_ledger() {
    let ledger = ledger();
    let message = finish_cooking(&ledger, &recipe(7, 10, "French"));
    assert!(message.contains("+120 XP"), "{message}");
    assert!(message.contains("First Flame"));
    assert_eq!(ledger.history().len(), 1);
    assert_eq!(ledger.counters().get(Counter::RecipesCompleted), 1);

    let refused = finish_cooking(&ledger, &recipe(9, 120, "French"));
    assert_eq!(ledger.history().len(), 1);
    assert!(refused.contains("level"), "{refused}");
}

#[test]
fn profile_stats_show_counters_and_history() {
    let ledger = ledger();
    let empty = block_on(
        LocalServerRenderer::<ProfileStats>::with_props(profile_stats::Props {
            ledger: ledger.clone(),
        })
        .render(),
    );
    assert!(empty.contains("Nothing cooked yet."));

    ledger.cook_recipe(&recipe(7, 10, "French")).unwrap();
    ledger.cook_recipe(&recipe(8, 12, "Thai")).unwrap();
    let html = block_on(
        LocalServerRenderer::<ProfileStats>::with_props(profile_stats::Props { ledger })
            .render(),
    );
    assert!(html.contains("Recipes cooked"), "{html}");
    assert!(html.contains("Recipe 7"));
    assert!(html.contains("Recipe 8"));
    assert!(html.contains("Thai"));
    assert!(!html.contains("Nothing cooked yet."));
}

#[test]
fn data_settings_render_and_import_round_trip() {
    let html = block_on(
        LocalServerRenderer::<DataSettings>::with_props(data_settings::Props { ledger: ledger() })
            .render(),
    );
    for marker in ["export-progress-btn", "import-progress-btn", "reset-progress-btn"] {
        assert!(html.contains(marker), "missing {marker}");
    }

    let source = ledger();
    source.cook_recipe(&recipe(7, 10, "French")).unwrap();
    let text = source.export_snapshot().to_json().unwrap();

    let target = ledger();
    let profile = import_text(&target, &format!("\n{text}\n")).unwrap();
    assert_eq!(profile, source.profile());
    assert_eq!(target.history(), source.history());

    let mut tampered: serde_json::Value = serde_json::from_str(&text).unwrap();
    tampered["profile"]["experiencePoints"] = serde_json::json!(99_999);
    let before = target.profile();
    assert!(import_text(&target, &tampered.to_string()).is_err());
    assert!(matches!(
        import_text(&target, "not json"),
        Err(LedgerError::SnapshotDecode(_))
    ));
    assert_eq!(target.profile(), before);
}

#[test]
fn ledger_handles_compare_by_identity() {
    let a = ledger();
    let b = ledger();
    assert!(a == a.clone());
    assert!(a != b);
}
