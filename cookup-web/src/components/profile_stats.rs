use chrono::DateTime;
use cookup_core::Counter;
use yew::prelude::*;

use crate::hooks::{LedgerHandle, use_counters, use_profile};

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub ledger: LedgerHandle,
}

const fn counter_label(counter: Counter) -> &'static str {
    match counter {
        Counter::RecipesCompleted => "Recipes cooked",
        Counter::DailyMissionsCompleted => "Daily missions",
        Counter::UniqueCuisinesCooked => "Cuisines explored",
        Counter::CuisineBossesDefeated => "Bosses defeated",
        Counter::MasteryMealsCompleted => "Mastery meals",
        Counter::BreakfastRecipesCompleted => "Breakfasts cooked",
    }
}

fn cooked_on(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Level, lifetime counters and the recent cook history.
#[function_component(ProfileStats)]
pub fn profile_stats(p: &Props) -> Html {
    let profile = use_profile(&p.ledger);
    // History writes raise the counters topic too.
    let counters = use_counters(&p.ledger);
    let history = p.ledger.history();

    html! {
        <section class="profile-stats" aria-label="Profile">
            <h2>{ "Profile" }</h2>
            <p class="profile-title">
                { format!("Level {} · {}", profile.level, p.ledger.level_title()) }
            </p>
            <dl class="stats">
                <dt>{ "Total XP" }</dt>
                <dd data-stat="xp">{ profile.experience_points.to_string() }</dd>
                { for Counter::ALL.into_iter().map(|counter| html! {
                    <>
                        <dt>{ counter_label(counter) }</dt>
                        <dd data-stat={counter.as_str()}>{ counters.get(counter).to_string() }</dd>
                    </>
                }) }
            </dl>
            <h3>{ "Cooking history" }</h3>
            if history.is_empty() {
                <p class="history-empty">{ "Nothing cooked yet." }</p>
            } else {
                <ol class="history">
                    { for history.iter().map(|entry| html! {
                        <li data-recipe={entry.recipe_id.clone()}>
                            <strong>{ entry.title.clone() }</strong>
                            <span class="history-cuisine">{ entry.cuisine.clone() }</span>
                            <span class="history-xp">{ format!("+{} XP", entry.xp_awarded) }</span>
                            <time>{ cooked_on(entry.cooked_at_ms) }</time>
                        </li>
                    }) }
                </ol>
            }
        </section>
    }
}
