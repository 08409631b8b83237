use std::sync::Arc;

use scoreforge_core::{ConfigurationError, SimpleScore, Value};
use scoreforge_test::{cyclic_schema, Diamond, ShadowChain};

use super::*;

#[test]
fn test_cycle_is_rejected_with_its_path() {
    let error = ShadowGraph::compile(&cyclic_schema()).unwrap_err();
    match error {
        ConfigurationError::CyclicShadowDependency { cycle } => {
            assert_eq!(cycle, "Ping -> Pong -> Ping");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_order_follows_dependencies_not_declarations() {
    let diamond = Diamond::new();
    let graph = ShadowGraph::compile(&diamond.schema).unwrap();
    let names = graph.names();

    assert_eq!(names.len(), 3);
    assert_eq!(names[2], "DListener");
    assert_eq!(graph.owner(diamond.d), Some(2));
    assert_eq!(graph.readers_of(diamond.a).len(), 2);
}

#[test]
fn test_drain_settles_whole_chain_once() {
    let chain = ShadowChain::new();
    let mut solution = chain.empty::<SimpleScore>();
    let entity = solution.insert(chain.entity(0));
    let mut engine = ShadowEngine::new(Arc::new(ShadowGraph::compile(&chain.schema).unwrap()));

    engine.before_variable_changed(solution.store(), entity, chain.x);
    solution
        .store_mut()
        .set(entity, chain.x, Value::text("1"))
        .unwrap();
    let touched = engine.trigger(solution.store_mut()).unwrap();

    assert_eq!(touched, vec![entity]);
    let store = solution.store();
    assert_eq!(store.value(entity, chain.first), &Value::text("1/firstShadow"));
    assert_eq!(
        store.value(entity, chain.third),
        &Value::text("1/firstShadow/secondShadow/thirdShadow")
    );
    assert_eq!(
        chain.log.entries(),
        vec!["FirstShadowListener", "SecondShadowListener", "ThirdShadowListener"]
    );
    assert!(!engine.has_pending());
}

#[test]
fn test_force_trigger_reports_nothing_when_fresh() {
    let chain = ShadowChain::new();
    let mut solution = chain.empty::<SimpleScore>();
    let entity = solution.insert(chain.entity(0));
    let mut engine = ShadowEngine::new(Arc::new(ShadowGraph::compile(&chain.schema).unwrap()));

    engine.after_entity_added(entity);
    engine.trigger(solution.store_mut()).unwrap();
    let touched = engine.force_trigger(solution.store_mut()).unwrap();
    assert!(touched.is_empty());
}
