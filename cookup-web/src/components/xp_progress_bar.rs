use yew::prelude::*;

use crate::hooks::{LedgerHandle, use_profile};

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub ledger: LedgerHandle,
}

/// Level badge, title and progress toward the next level.
#[function_component(XpProgressBar)]
pub fn xp_progress_bar(p: &Props) -> Html {
    let profile = use_profile(&p.ledger);
    let curve = &p.ledger.config().level_curve;
    let pct = curve.progress_pct(profile.level, profile.experience_points);
    let title = p.ledger.level_title().to_string();
    let at_cap = profile.level >= curve.max_level;
    let remaining = if at_cap {
        "Max level".to_string()
    } else {
        format!("{} XP to level {}", profile.experience_to_next_level, profile.level + 1)
    };

    html! {
        <section class="xp-bar" aria-label="Experience">
            <span class="xp-level">{ format!("Lv {}", profile.level) }</span>
            <span class="xp-title">{ title }</span>
            <div class="xp-track" role="progressbar" aria-valuemin="0" aria-valuemax="100"
                aria-valuenow={pct.to_string()}>
                <div class="xp-fill" style={format!("width: {pct}%")}></div>
            </div>
            <span class="xp-total">{ format!("{} XP", profile.experience_points) }</span>
            <span class="xp-remaining">{ remaining }</span>
        </section>
    }
}
