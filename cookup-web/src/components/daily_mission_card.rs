use cookup_core::{RecipeSummary, Topic};
use yew::prelude::*;

use crate::hooks::{LedgerHandle, use_topic_revision};

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub ledger: LedgerHandle,
    /// Today's recipe; `None` while loading or when the provider failed.
    #[prop_or_default]
    pub mission: Option<RecipeSummary>,
    #[prop_or_default]
    pub error: Option<AttrValue>,
}

#[function_component(DailyMissionCard)]
pub fn daily_mission_card(p: &Props) -> Html {
    use_topic_revision(&p.ledger, &[Topic::DailyMissionChanged]);
    let completed = p.ledger.daily_completion().is_completed_today();
    let reward = p.ledger.config().daily_mission_xp;

    let on_complete = {
        let ledger = p.ledger.clone();
        Callback::from(move |_: MouseEvent| match ledger.complete_daily_mission() {
            Ok(Some(outcome)) => log::info!(
                "daily mission complete: +{} XP, level {}",
                outcome.xp_awarded,
                outcome.profile.level
            ),
            Ok(None) => log::debug!("daily mission already done"),
            Err(err) => log::error!("daily mission failed: {err}"),
        })
    };

    let body = match (&p.mission, &p.error) {
        (Some(recipe), _) => html! {
            <div class="mission-recipe">
                if let Some(image) = recipe.image.clone() {
                    <img src={image} alt={recipe.title.clone()} />
                }
                <h3>{ recipe.title.clone() }</h3>
                <span class="mission-meta">
                    { format!("{} · {} min · {}", recipe.primary_cuisine(), recipe.ready_in_minutes, recipe.difficulty()) }
                </span>
                <p>{ recipe.description() }</p>
            </div>
        },
        (None, Some(error)) => html! {
            <p class="mission-error" role="alert">{ error.to_string() }</p>
        },
        (None, None) => html! { <p class="mission-loading">{ "Finding today's mission..." }</p> },
    };

    html! {
        <section class="daily-mission" aria-label="Daily mission">
            <h2>{ "Daily Mission" }</h2>
            { body }
            if completed {
                <p class="mission-done">{ "Completed today. Come back tomorrow!" }</p>
            } else {
                <button id="complete-mission-btn" onclick={on_complete}>
                    { format!("Complete mission (+{reward} XP)") }
                </button>
            }
        </section>
    }
}
