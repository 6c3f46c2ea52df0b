use cookup_core::{ACHIEVEMENTS, Topic};
use yew::prelude::*;

use crate::hooks::{LedgerHandle, use_topic_revision};

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub ledger: LedgerHandle,
}

#[function_component(AchievementList)]
pub fn achievement_list(p: &Props) -> Html {
    use_topic_revision(&p.ledger, &[Topic::AchievementsChanged]);
    let unlocked = p.ledger.unlocked_achievements();
    let earned = ACHIEVEMENTS
        .iter()
        .filter(|def| unlocked.contains(def.id))
        .count();

    html! {
        <section class="achievements" aria-label="Achievements">
            <h2>{ format!("Achievements {earned}/{}", ACHIEVEMENTS.len()) }</h2>
            <ul>
                { for ACHIEVEMENTS.iter().map(|def| {
                    let is_unlocked = unlocked.contains(def.id);
                    let class = if is_unlocked { "badge unlocked" } else { "badge locked" };
                    html! {
                        <li class={class} data-id={def.id}>
                            <strong>{ def.title }</strong>
                            <span class="badge-desc">{ def.description }</span>
                            if def.reward_xp > 0 {
                                <span class="badge-xp">{ format!("+{} XP", def.reward_xp) }</span>
                            }
                        </li>
                    }
                }) }
            </ul>
        </section>
    }
}
