use cookup_core::Topic;
use yew::prelude::*;

use crate::hooks::{LedgerHandle, use_topic_revision};

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub ledger: LedgerHandle,
    pub cuisine: AttrValue,
}

/// One cuisine's meal tiers with the boss tier last.
#[function_component(MasteryTree)]
pub fn mastery_tree(p: &Props) -> Html {
    use_topic_revision(&p.ledger, &[Topic::MasteryChanged]);
    let Some(tree) = p.ledger.catalog().cuisine(&p.cuisine) else {
        return html! { <p class="mastery-missing">{ format!("Unknown cuisine: {}", p.cuisine) }</p> };
    };
    let tiers = match p.ledger.mastery().tiers(&p.cuisine) {
        Ok(tiers) => tiers,
        Err(err) => return html! { <p class="mastery-missing">{ err.to_string() }</p> },
    };
    let mastered = tiers.iter().all(|tier| tier.checked);

    let items = tiers.into_iter().enumerate().map(|(index, tier)| {
        let onclick = {
            let ledger = p.ledger.clone();
            let cuisine = p.cuisine.clone();
            Callback::from(move |_: MouseEvent| {
                if let Err(err) = ledger.toggle_mastery_meal(&cuisine, index) {
                    log::warn!("mastery toggle rejected: {err}");
                }
            })
        };
        let class = classes!(
            "tier",
            tier.is_boss.then_some("boss"),
            tier.checked.then_some("checked"),
            tier.locked.then_some("locked"),
        );
        html! {
            <li class={class}>
                <button id={format!("tier-{index}")} aria-pressed={tier.checked.to_string()}
                    disabled={tier.locked} {onclick}>
                    { if tier.checked { "✔ " } else { "○ " } }
                    { tier.name }
                </button>
            </li>
        }
    });

    html! {
        <section class={classes!("mastery-tree", tree.color.clone())}
            aria-label={format!("{} mastery", tree.name)}>
            <h2>{ tree.name.clone() }</h2>
            <p class="boss-name">{ format!("Boss: {}", tree.boss.boss_name) }</p>
            <ol>{ for items }</ol>
            if mastered {
                <p class="mastered">{ "Cuisine mastered!" }</p>
            }
        </section>
    }
}
