use openbach_scenario_builder::domain::scenario::composition::ExplicitIdComposer;
use openbach_scenario_builder::domain::scenario::function::{StartJobInstance, WaitClause};
use openbach_scenario_builder::domain::scenario::scenario::Scenario;
use openbach_scenario_builder::error::Error;

fn job(entity: &str) -> StartJobInstance {
    StartJobInstance::new("web_browsing_qoe", entity).with_argument("duration", 10)
}

#[test]
fn test_explicit_ids_map_to_handles() {
    let mut scenario = Scenario::new("mix", "");
    let mut composer = ExplicitIdComposer::new();

    let first = composer.declare(&mut scenario, 3, &[], &[], WaitClause::new(), job("a")).unwrap();
    let second = composer.declare(&mut scenario, 7, &[3], &[], WaitClause::new(), job("b")).unwrap();
    let third = composer.declare(&mut scenario, 9, &[], &[3, 7], WaitClause::new(), job("c")).unwrap();

    assert_eq!(composer.len(), 3);
    assert_eq!(composer.handle(7), Some(second));
    assert_eq!(scenario.function(second.id()).unwrap().wait().launched()[0].id(), first.id());
    assert_eq!(scenario.function(third.id()).unwrap().wait().finished().len(), 2);
    assert!(scenario.validate().is_ok());
}

#[test]
fn test_rejected_declarations_add_nothing() {
    let mut scenario = Scenario::new("mix", "");
    let mut composer = ExplicitIdComposer::new();
    composer.declare(&mut scenario, 2, &[], &[], WaitClause::new(), job("a")).unwrap();

    assert!(matches!(composer.declare(&mut scenario, 2, &[], &[], WaitClause::new(), job("b")), Err(Error::DuplicateId(2))));
    assert!(matches!(composer.declare(&mut scenario, 1, &[2], &[], WaitClause::new(), job("b")), Err(Error::ForwardReference { id: 1, dependency: 2 })));
    assert!(matches!(composer.declare(&mut scenario, 5, &[], &[5], WaitClause::new(), job("b")), Err(Error::ForwardReference { id: 5, dependency: 5 })));
    assert!(matches!(composer.declare(&mut scenario, 6, &[], &[4], WaitClause::new(), job("b")), Err(Error::ForwardReference { id: 6, dependency: 4 })));

    assert_eq!(scenario.len(), 1);
    assert_eq!(composer.len(), 1);
}

#[test]
fn test_builder_failure_does_not_register_the_id() {
    let mut other = Scenario::new("other", "");
    let foreign = other.start_job_instance(job("x"), WaitClause::new()).unwrap();

    let mut scenario = Scenario::new("mix", "");
    let mut composer = ExplicitIdComposer::new();
    let result = composer.declare(&mut scenario, 1, &[], &[], WaitClause::new().after_finished(foreign), job("a"));

    assert!(matches!(result, Err(Error::UnresolvedReference { .. })));
    assert!(composer.handle(1).is_none());
    assert!(composer.declare(&mut scenario, 1, &[], &[], WaitClause::new(), job("a")).is_ok());
}
