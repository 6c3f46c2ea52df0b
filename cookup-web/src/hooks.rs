use std::ops::Deref;
use std::rc::Rc;

use cookup_core::{
    CompletionCounters, Profile, ProgressionLedger, RecipeProvider, StorageBackend, Subscription,
    Topic,
};
use yew::prelude::*;

use crate::provider::SpoonacularClient;
use crate::storage::open_backend;

pub type WebLedger = ProgressionLedger<Box<dyn StorageBackend>>;

/// Shared handle to the page's ledger, provided through context.
#[derive(Clone)]
pub struct LedgerHandle(Rc<WebLedger>);

impl LedgerHandle {
    #[must_use]
    pub fn new(ledger: WebLedger) -> Self {
        Self(Rc::new(ledger))
    }

    /// Ledger over the platform storage backend.
    #[must_use]
    pub fn open() -> Self {
        Self::new(ProgressionLedger::new(open_backend()))
    }
}

impl PartialEq for LedgerHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for LedgerHandle {
    type Target = WebLedger;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Shared recipe source, compared by identity.
#[derive(Clone)]
pub struct ProviderHandle(Rc<dyn RecipeProvider>);

impl ProviderHandle {
    #[must_use]
    pub fn new(provider: impl RecipeProvider + 'static) -> Self {
        Self(Rc::new(provider))
    }
}

impl Default for ProviderHandle {
    fn default() -> Self {
        Self::new(SpoonacularClient::default())
    }
}

impl PartialEq for ProviderHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ProviderHandle {
    type Target = dyn RecipeProvider;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

/// `preferred` when given, else the ledger from context. A page-local ledger
/// is opened only when neither exists.
#[hook]
pub fn use_ledger(preferred: Option<LedgerHandle>) -> LedgerHandle {
    let context = use_context::<LedgerHandle>();
    let handle = use_memo((preferred, context), |(preferred, context)| {
        preferred
            .clone()
            .or_else(|| context.clone())
            .unwrap_or_else(LedgerHandle::open)
    });
    (*handle).clone()
}

/// Re-render whenever one of `topics` fires; returns how many times it has.
#[hook]
pub fn use_topic_revision(ledger: &LedgerHandle, topics: &'static [Topic]) -> u32 {
    let revision = use_mut_ref(|| 0_u32);
    let trigger = use_force_update();
    {
        let revision = revision.clone();
        use_effect_with(ledger.clone(), move |ledger| {
            let subscriptions: Vec<Subscription> = topics
                .iter()
                .map(|topic| {
                    let revision = revision.clone();
                    let trigger = trigger.clone();
                    ledger.subscribe(*topic, move || {
                        *revision.borrow_mut() += 1;
                        trigger.force_update();
                    })
                })
                .collect();
            move || drop(subscriptions)
        });
    }
    let current = *revision.borrow();
    current
}

#[hook]
pub fn use_profile(ledger: &LedgerHandle) -> Profile {
    use_topic_revision(ledger, &[Topic::ProfileChanged]);
    ledger.profile()
}

#[hook]
pub fn use_counters(ledger: &LedgerHandle) -> CompletionCounters {
    use_topic_revision(ledger, &[Topic::CountersChanged]);
    ledger.counters()
}
