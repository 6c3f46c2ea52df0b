use cookup_core::{LedgerError, LedgerSnapshot, Profile};
use yew::prelude::*;

use crate::hooks::LedgerHandle;

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub ledger: LedgerHandle,
}

/// Parse exported text and replace the ledger's progress with it.
///
/// # Errors
/// Malformed JSON, an unsupported version or a digest mismatch; the ledger is
/// left untouched in every case.
pub fn import_text(ledger: &LedgerHandle, text: &str) -> Result<Profile, LedgerError> {
    let snapshot = LedgerSnapshot::from_json(text.trim())?;
    ledger.import_snapshot(&snapshot)
}

#[derive(Debug, Clone, PartialEq)]
enum Notice {
    Info(String),
    Error(String),
}

/// Export, import and reset of the player's saved progress.
#[function_component(DataSettings)]
pub fn data_settings(p: &Props) -> Html {
    let exported = use_state(String::new);
    let pasted = use_state(String::new);
    let notice = use_state(|| None::<Notice>);

    let on_export = {
        let ledger = p.ledger.clone();
        let exported = exported.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| match ledger.export_snapshot().to_json() {
            Ok(json) => {
                exported.set(json);
                notice.set(Some(Notice::Info("Progress exported. Copy the text below.".into())));
            }
            Err(err) => {
                log::error!("export failed: {err}");
                notice.set(Some(Notice::Error(err.to_string())));
            }
        })
    };
    let on_paste = {
        let pasted = pasted.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<web_sys::HtmlTextAreaElement>() {
                pasted.set(input.value());
            }
        })
    };
    let on_import = {
        let ledger = p.ledger.clone();
        let pasted = pasted.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| match import_text(&ledger, &pasted) {
            Ok(profile) => notice.set(Some(Notice::Info(format!(
                "Progress imported: level {}, {} XP.",
                profile.level, profile.experience_points
            )))),
            Err(err) => {
                log::warn!("import rejected: {err}");
                notice.set(Some(Notice::Error(format!("Import failed: {err}"))));
            }
        })
    };
    let on_reset = {
        let ledger = p.ledger.clone();
        let exported = exported.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| {
            ledger.reset();
            exported.set(String::new());
            notice.set(Some(Notice::Info("All progress was reset.".into())));
        })
    };

    let notice_html = match &*notice {
        Some(Notice::Info(text)) => html! { <p class="settings-info" role="status">{ text.clone() }</p> },
        Some(Notice::Error(text)) => html! { <p class="settings-error" role="alert">{ text.clone() }</p> },
        None => html! {},
    };

    html! {
        <section class="data-settings" aria-label="Data">
            <h2>{ "Your data" }</h2>
            { notice_html }
            <div class="export">
                <button id="export-progress-btn" onclick={on_export}>{ "Export progress" }</button>
                <textarea id="export-text" readonly={true} value={(*exported).clone()} />
            </div>
            <div class="import">
                <label for="import-text">{ "Paste an export to restore it" }</label>
                <textarea id="import-text" value={(*pasted).clone()} oninput={on_paste} />
                <button id="import-progress-btn" disabled={pasted.trim().is_empty()}
                    onclick={on_import}>{ "Import progress" }</button>
            </div>
            <button id="reset-progress-btn" class="danger" onclick={on_reset}>
                { "Reset progress" }
            </button>
        </section>
    }
}
