use std::cell::Cell;
use std::rc::Rc;

use cookup_core::{
    AchievementEvaluator, CompletionLedger, Counter, LevelCurve, ManualClock, MasteryCatalog,
    MemoryBackend, MissionLookup, Notifier, ProfileLedger, ProgressionConfig, ProgressionLedger,
    SharedMedium, StorageBackend, Store, Topic, XpAmount,
};
use futures::executor::block_on;
use futures::future::ready;

const NOON: i64 = 1_760_616_000_000;
const DAY_MS: i64 = 24 * 3_600_000;

fn memory_store() -> Store<MemoryBackend> {
    Store::new(MemoryBackend::new(), Notifier::new())
}

fn ledger_on<B: StorageBackend>(backend: B) -> ProgressionLedger<B, Rc<ManualClock>> {
    ProgressionLedger::with_parts(
        backend,
        Rc::new(ManualClock::new(NOON)),
        ProgressionConfig::default(),
        MasteryCatalog::load_from_static(),
    )
}

#[test]
fn fresh_profile_small_reward_keeps_level() {
    let store = memory_store();
    let curve = LevelCurve::default();
    let profiles = ProfileLedger::new(&store, &curve);
    let fresh = profiles.get_profile();
    assert_eq!(fresh.experience_points, 0);
    assert_eq!(fresh.level, 1);
    assert_eq!(fresh.experience_to_next_level, curve.threshold(2));

    let outcome = profiles.apply_reward(XpAmount::new(150));
    assert_eq!(outcome.profile.experience_points, 150);
    assert_eq!(outcome.profile.level, 1);
    assert_eq!(outcome.levels_gained, 0);
    assert_eq!(
        outcome.profile.experience_to_next_level,
        curve.threshold(2) - 150
    );
}

#[test]
fn fifth_daily_mission_unlocks_regular_badge() {
    let store = memory_store();
    let curve = LevelCurve::default();
    let completion = CompletionLedger::new(&store);
    let evaluator = AchievementEvaluator::new(&store);
    let profile = ProfileLedger::new(&store, &curve).get_profile();

    for call in 1..=5_u64 {
        let count = completion
            .increment_counter(Counter::DailyMissionsCompleted)
            .unwrap();
        assert_eq!(count, call);
        let fresh = evaluator.evaluate_all(&profile, &completion.counters());
        let regular = fresh.iter().any(|def| def.id == "mission-regular");
        assert_eq!(regular, call == 5, "unlock on call {call}");
    }
    assert_eq!(completion.get_counter(Counter::DailyMissionsCompleted), 5);
    assert!(evaluator.is_unlocked("mission-regular"));
}

#[test]
fn boss_tier_gating_and_single_defeat() {
    let ledger = ledger_on(MemoryBackend::new());
    for tier in 0..3 {
        ledger.toggle_mastery_meal("Mexican", tier).unwrap();
        let boss = ledger.mastery().tiers("Mexican").unwrap()[4].clone();
        assert!(boss.locked, "boss open after tier {tier}");
    }
    assert!(ledger.toggle_mastery_meal("Mexican", 4).is_err());

    let last = ledger.toggle_mastery_meal("Mexican", 3).unwrap();
    assert!(last.toggle.boss_unlocked);
    assert!(!ledger.mastery().tiers("Mexican").unwrap()[4].locked);

    ledger.toggle_mastery_meal("Mexican", 4).unwrap();
    ledger.toggle_mastery_meal("Mexican", 4).unwrap();
    ledger.toggle_mastery_meal("Mexican", 4).unwrap();
    assert_eq!(ledger.counters().get(Counter::CuisineBossesDefeated), 1);
    assert!(ledger.mastery().is_mastered("Mexican").unwrap());
}

#[test]
fn level_matches_curve_for_any_reward_sequence() {
    let store = memory_store();
    let curve = LevelCurve::default();
    let profiles = ProfileLedger::new(&store, &curve);
    let mut total = 0_u64;
    // Deterministic spread of small and large rewards.
    let mut seed = 0x2545_F491_u64;
    for _ in 0..200 {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let reward = (seed >> 33) % 5_000;
        total += reward;
        let profile = profiles.apply_reward(XpAmount::new(reward)).profile;
        assert_eq!(profile.experience_points, total);
        assert!(curve.threshold(profile.level) <= total);
        if profile.level < curve.max_level {
            assert!(curve.threshold(profile.level + 1) > total);
            assert_eq!(
                profile.experience_to_next_level,
                curve.threshold(profile.level + 1) - total
            );
        }
    }
}

#[test]
fn achievements_never_shrink() {
    let ledger = ledger_on(MemoryBackend::new());
    let mut previous = ledger.unlocked_achievements();
    for step in 0..12_u64 {
        match step % 3 {
            0 => {
                ledger.grant_xp(XpAmount::new(350));
            }
            1 => {
                ledger.complete_daily_mission().unwrap();
                ledger.clock().advance(DAY_MS);
            }
            _ => {
                let tier = usize::try_from(step % 4).unwrap();
                let _ = ledger.toggle_mastery_meal("Indian", tier);
            }
        }
        let now = ledger.unlocked_achievements();
        assert!(previous.is_subset(&now), "step {step} dropped an unlock");
        previous = now;
    }
    let evaluator = AchievementEvaluator::new(ledger.store());
    let profile = ledger.profile();
    let counters = ledger.counters();
    evaluator.evaluate_all(&profile, &counters);
    assert!(evaluator.evaluate_all(&profile, &counters).is_empty());
}

#[test]
fn mission_cache_freshness_window() {
    let ledger = ledger_on(MemoryBackend::new());
    let window = ledger.config().mission_freshness_ms();
    let mission = |name: &str| {
        let name = name.to_string();
        move || ready(Ok::<_, String>(name))
    };

    let fetched = block_on(ledger.daily().get_or_fetch(mission("ramen")));
    assert_eq!(fetched, MissionLookup::Fetched("ramen".to_string()));

    ledger.clock().advance(window - 1);
    let cached = block_on(ledger.daily().get_or_fetch(mission("tacos")));
    assert_eq!(cached, MissionLookup::Cached("ramen".to_string()));

    ledger.clock().advance(2);
    let refreshed = block_on(ledger.daily().get_or_fetch(mission("tacos")));
    assert_eq!(refreshed, MissionLookup::Fetched("tacos".to_string()));
}

#[test]
fn writes_reach_other_tabs_within_one_cycle() {
    let medium = SharedMedium::new();
    let tab_a = ledger_on(medium.open_context());
    let tab_b = ledger_on(medium.open_context());

    let seen = Rc::new(Cell::new(0_u64));
    let sink = Rc::clone(&seen);
    let reader = tab_b.store().backend().clone();
    let _sub = tab_b.subscribe(Topic::ProfileChanged, move || {
        let store = Store::new(reader.clone(), Notifier::new());
        let curve = LevelCurve::default();
        sink.set(ProfileLedger::new(&store, &curve).get_profile().experience_points);
    });

    tab_a.grant_xp(XpAmount::new(275));
    assert_eq!(seen.get(), 275);
    assert_eq!(tab_b.profile().experience_points, 275);
}

#[test]
fn own_writes_do_not_echo_as_external() {
    let medium = SharedMedium::new();
    let tab_a = ledger_on(medium.open_context());
    let _tab_b = ledger_on(medium.open_context());
    let hits = Rc::new(Cell::new(0));
    let sink = Rc::clone(&hits);
    let _sub = tab_a.subscribe(Topic::MasteryChanged, move || sink.set(sink.get() + 1));
    tab_a.toggle_mastery_meal("Japanese", 0).unwrap();
    assert_eq!(hits.get(), 1);
}
