use elemstat::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn definition(id: &str, power: f64) -> ElementDefinition {
    ElementDefinition {
        id: id.into(),
        name: id.to_string(),
        category: ElementCategory::Elemental,
        base: BaseProperties {
            power: Some(power),
            ..Default::default()
        },
    }
}

fn engine() -> ElementEngine {
    let config = EngineConfig {
        elements: vec![definition("fire", 100.0), definition("water", 80.0)],
        interactions: vec![
            InteractionRule::new("water", "fire", InteractionKind::Overcoming),
            InteractionRule::new("fire", "water", InteractionKind::Opposite),
        ],
        ..Default::default()
    };
    ElementEngine::new(config).unwrap()
}

/// With no contributions the bundle is exactly the catalog base values.
#[test]
fn test_base_only_read() {
    let engine = engine();
    let actor = ActorId::new("hero");

    let bundle = engine.element_stats_by_id(&actor, "fire").unwrap();
    assert_eq!(bundle.get(StatKind::Power), 100.0);
    assert_eq!(bundle.get(StatKind::Defense), 0.0);
    // Absent stats read as zero.
    assert_eq!(bundle.get(StatKind::CritDamage), 0.0);
}

/// Base 100 power plus +20 equipment and +5 race sums to 125.
#[test]
fn test_sum_over_base() {
    let engine = engine();
    let actor = ActorId::new("hero");

    engine.contribute("equipment", &actor, "fire", "power", 20.0, 2).unwrap();
    engine.contribute("race", &actor, "fire", "power", 5.0, 1).unwrap();

    let bundle = engine.element_stats_by_id(&actor, "fire").unwrap();
    assert_eq!(bundle.get(StatKind::Power), 125.0);
}

/// Sum is order-insensitive: recording in the reverse order yields the
/// same bundle.
#[test]
fn test_sum_commutes() {
    let forward = engine();
    let backward = engine();
    let actor = ActorId::new("hero");

    forward.contribute("a", &actor, "fire", "power", 20.0, 2).unwrap();
    forward.contribute("b", &actor, "fire", "power", 5.0, 1).unwrap();
    backward.contribute("b", &actor, "fire", "power", 5.0, 1).unwrap();
    backward.contribute("a", &actor, "fire", "power", 20.0, 2).unwrap();

    assert_eq!(
        forward.element_stats_by_id(&actor, "fire").unwrap(),
        backward.element_stats_by_id(&actor, "fire").unwrap()
    );
}

/// First takes the highest priority, ties broken by insertion order.
#[test]
fn test_first_strategy_tie_break() {
    let config = EngineConfig {
        elements: vec![definition("fire", 0.0)],
        strategies: [(StatKind::CritDamage, StrategyKind::First)].into_iter().collect(),
        ..Default::default()
    };
    let engine = ElementEngine::new(config).unwrap();
    let actor = ActorId::new("hero");

    engine.contribute("a", &actor, "fire", "crit_damage", 1.0, 5).unwrap();
    engine.contribute("b", &actor, "fire", "crit_damage", 2.0, 5).unwrap();
    engine.contribute("c", &actor, "fire", "crit_damage", 3.0, 3).unwrap();

    let bundle = engine.element_stats_by_id(&actor, "fire").unwrap();
    // Both priority-5 entries beat the 3; the earlier one wins the tie.
    assert_eq!(bundle.get(StatKind::CritDamage), 1.0);
}

/// Withdrawing what was recorded restores the prior bundle, and doing it
/// again is a no-op.
#[test]
fn test_record_withdraw_round_trip() {
    let engine = engine();
    let actor = ActorId::new("hero");
    let fire = engine.element_index("fire").unwrap();
    let before = engine.element_stats(&actor, fire).unwrap();

    engine.contribute("buff", &actor, "fire", "power", 30.0, 4).unwrap();
    assert_eq!(engine.element_stats(&actor, fire).unwrap().get(StatKind::Power), 130.0);

    let system = SystemId::new("buff");
    assert_eq!(engine.withdraw(&system, &actor, fire, StatKind::Power), 1);
    assert_eq!(engine.element_stats(&actor, fire).unwrap(), before);
    assert_eq!(engine.withdraw(&system, &actor, fire, StatKind::Power), 0);
    assert_eq!(engine.element_stats(&actor, fire).unwrap(), before);
}

/// A mutation makes the very next read observe the new value, regardless
/// of cache TTL.
#[test]
fn test_invalidation_beats_ttl() {
    let engine = engine();
    let actor = ActorId::new("hero");
    let fire = engine.element_index("fire").unwrap();

    assert_eq!(engine.element_stats(&actor, fire).unwrap().get(StatKind::Power), 100.0);
    engine.contribute("buff", &actor, "fire", "power", 50.0, 4).unwrap();
    assert_eq!(engine.element_stats(&actor, fire).unwrap().get(StatKind::Power), 150.0);

    let stats = engine.cache_stats();
    assert!(stats.misses >= 2, "mutation must force a recomputation");
}

/// Repeated reads without mutations hit the cache.
#[test]
fn test_reads_hit_cache() {
    let engine = engine();
    let actor = ActorId::new("hero");
    let fire = engine.element_index("fire").unwrap();

    engine.element_stats(&actor, fire).unwrap();
    engine.element_stats(&actor, fire).unwrap();
    engine.element_stats(&actor, fire).unwrap();

    let stats = engine.cache_stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
}

/// Declared interactions carry their kind's factor; everything else is
/// neutral, and runtime overrides validate before applying.
#[test]
fn test_interaction_factors() {
    let engine = engine();
    let fire = engine.element_index("fire").unwrap();
    let water = engine.element_index("water").unwrap();

    assert_eq!(engine.interaction_factor(water, fire), 1.5);
    assert_eq!(engine.interaction_factor(fire, water), 0.7);
    // Undeclared direction reads neutral.
    assert_eq!(engine.interaction_factor_by_id("fire", "fire").unwrap(), 1.0);

    let err = engine.set_interaction_factor(water, fire, -1.0).unwrap_err();
    assert_eq!(err, ElementError::NegativeFactor { value: -1.0 });
    // The rejected write left the previous factor in place.
    assert_eq!(engine.interaction_factor(water, fire), 1.5);

    engine.set_interaction_factor(water, fire, 2.0).unwrap();
    assert_eq!(engine.interaction_factor(water, fire), 2.0);
}

/// Unknown element and stat names fail at the string boundary.
#[test]
fn test_unknown_names_rejected() {
    let engine = engine();
    let actor = ActorId::new("hero");

    assert!(matches!(
        engine.contribute("x", &actor, "void", "power", 1.0, 1),
        Err(ElementError::UnknownElement { .. })
    ));
    assert!(matches!(
        engine.contribute("x", &actor, "fire", "swagger", 1.0, 1),
        Err(ElementError::UnknownStat { .. })
    ));
    assert!(matches!(
        engine.contribute("x", &actor, "fire", "power", f64::NAN, 1),
        Err(ElementError::NonFiniteValue { .. })
    ));
    assert!(matches!(
        engine.contribute("x", &actor, "fire", "power", 1.0, -1),
        Err(ElementError::NegativePriority { .. })
    ));
}

/// Concurrent records from many threads all land; the final sum loses
/// nothing.
#[test]
fn test_concurrent_records_sum_losslessly() {
    let engine = Arc::new(engine());
    let actor = ActorId::new("hero");
    let threads = 8;
    let per_thread = 50;

    std::thread::scope(|scope| {
        for t in 0..threads {
            let engine = Arc::clone(&engine);
            let actor = actor.clone();
            scope.spawn(move || {
                for i in 0..per_thread {
                    let system = format!("sys-{t}-{i}");
                    engine
                        .contribute(&system, &actor, "fire", "power", 1.0, 1)
                        .unwrap();
                }
            });
        }
    });

    let bundle = engine.element_stats_by_id(&actor, "fire").unwrap();
    assert_eq!(
        bundle.get(StatKind::Power),
        100.0 + (threads * per_thread) as f64
    );
}

/// Change listeners fire once per recomputation that changed values, with
/// the changed stat kinds.
#[test]
fn test_change_listener_fires_on_recompute() {
    let engine = engine();
    let actor = ActorId::new("hero");
    let fired = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&fired);
    engine.subscribe(Box::new(move |event| {
        assert_eq!(event.element.as_str(), "fire");
        assert!(event.changed.contains(&StatKind::Power));
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    engine.element_stats_by_id(&actor, "fire").unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // Cache hit: no recomputation, no event.
    engine.element_stats_by_id(&actor, "fire").unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    engine.contribute("buff", &actor, "fire", "power", 10.0, 3).unwrap();
    engine.element_stats_by_id(&actor, "fire").unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

/// Pull-based contributors replace their footprint wholesale.
#[test]
fn test_apply_contributor_replaces_footprint() {
    struct Cultivation {
        system: SystemId,
        bonus: f64,
    }

    impl ElementContributor for Cultivation {
        fn system_id(&self) -> &SystemId {
            &self.system
        }

        fn priority(&self) -> i64 {
            3
        }

        fn contribute(
            &self,
            _actor: &ActorId,
            _element: ElementIndex,
            _catalog: &ElementCatalog,
        ) -> Vec<(StatKind, f64)> {
            vec![(StatKind::Power, self.bonus), (StatKind::Defense, self.bonus / 2.0)]
        }
    }

    let engine = engine();
    let actor = ActorId::new("hero");
    let fire = engine.element_index("fire").unwrap();
    let mut cultivation = Cultivation {
        system: SystemId::new("cultivation"),
        bonus: 10.0,
    };
    engine.register_system(SystemRegistration::new(cultivation.system.clone(), 3));

    engine.apply_contributor(&cultivation, &actor, fire).unwrap();
    let bundle = engine.element_stats(&actor, fire).unwrap();
    assert_eq!(bundle.get(StatKind::Power), 110.0);
    assert_eq!(bundle.get(StatKind::Defense), 5.0);

    // Re-applying with new state replaces, not stacks.
    cultivation.bonus = 20.0;
    engine.apply_contributor(&cultivation, &actor, fire).unwrap();
    let bundle = engine.element_stats(&actor, fire).unwrap();
    assert_eq!(bundle.get(StatKind::Power), 120.0);
    assert_eq!(bundle.get(StatKind::Defense), 10.0);

    assert!(engine.system(&SystemId::new("cultivation")).is_some());
    assert_eq!(engine.systems().len(), 1);
}

/// A contributor batch with an invalid value is rejected whole: the
/// previous footprint stays in place and nothing partial lands.
#[test]
fn test_apply_contributor_rejects_batch_atomically() {
    struct Status {
        system: SystemId,
        pairs: Vec<(StatKind, f64)>,
    }

    impl ElementContributor for Status {
        fn system_id(&self) -> &SystemId {
            &self.system
        }

        fn priority(&self) -> i64 {
            3
        }

        fn contribute(
            &self,
            _actor: &ActorId,
            _element: ElementIndex,
            _catalog: &ElementCatalog,
        ) -> Vec<(StatKind, f64)> {
            self.pairs.clone()
        }
    }

    let engine = engine();
    let actor = ActorId::new("hero");
    let fire = engine.element_index("fire").unwrap();
    let mut status = Status {
        system: SystemId::new("status"),
        pairs: vec![(StatKind::Power, 10.0), (StatKind::Defense, 5.0)],
    };

    engine.apply_contributor(&status, &actor, fire).unwrap();
    assert_eq!(engine.element_stats(&actor, fire).unwrap().get(StatKind::Power), 110.0);

    status.pairs = vec![(StatKind::Power, 25.0), (StatKind::Defense, f64::NAN)];
    let err = engine.apply_contributor(&status, &actor, fire).unwrap_err();
    assert!(matches!(err, ElementError::NonFiniteValue { .. }));

    // The failed batch changed nothing.
    let bundle = engine.element_stats(&actor, fire).unwrap();
    assert_eq!(bundle.get(StatKind::Power), 110.0);
    assert_eq!(bundle.get(StatKind::Defense), 5.0);
}

/// A listener may subscribe further listeners from inside its callback
/// without deadlocking the dispatch path.
#[test]
fn test_listener_can_subscribe_during_dispatch() {
    let engine = Arc::new(engine());
    let actor = ActorId::new("hero");
    let inner_fired = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&inner_fired);
    let handle = Arc::clone(&engine);
    engine.subscribe(Box::new(move |_| {
        let counter = Arc::clone(&counter);
        handle.subscribe(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }));

    // First recompute: the outer listener runs and adds an inner one.
    engine.element_stats_by_id(&actor, "fire").unwrap();
    assert_eq!(inner_fired.load(Ordering::SeqCst), 0);

    // Second recompute: the inner listener added above now fires.
    engine.contribute("buff", &actor, "fire", "power", 10.0, 3).unwrap();
    engine.element_stats_by_id(&actor, "fire").unwrap();
    assert_eq!(inner_fired.load(Ordering::SeqCst), 1);
}

/// Forgetting an actor drops contributions, cache entries and decay state.
#[test]
fn test_forget_actor() {
    let engine = engine();
    let actor = ActorId::new("hero");
    let fire = engine.element_index("fire").unwrap();

    engine.contribute("buff", &actor, "fire", "power", 30.0, 4).unwrap();
    engine.train(&actor, fire, 25.0, chrono::Utc::now());
    assert_eq!(engine.element_stats(&actor, fire).unwrap().get(StatKind::Power), 130.0);

    engine.forget_actor(&actor);
    assert_eq!(engine.element_stats(&actor, fire).unwrap().get(StatKind::Power), 100.0);
    assert_eq!(engine.mastery(&actor, fire, chrono::Utc::now()), 0.0);
}

/// Interaction reload swaps the matrix atomically.
#[test]
fn test_reload_interactions() {
    let engine = engine();
    let fire = engine.element_index("fire").unwrap();
    let water = engine.element_index("water").unwrap();
    assert_eq!(engine.interaction_factor(water, fire), 1.5);

    engine
        .reload_interactions(&[
            InteractionRule::new("water", "fire", InteractionKind::Special).with_multiplier(3.0)
        ])
        .unwrap();
    assert_eq!(engine.interaction_factor(water, fire), 3.0);
    // Rules absent from the new set reset to neutral.
    assert_eq!(engine.interaction_factor(fire, water), 1.0);
}
