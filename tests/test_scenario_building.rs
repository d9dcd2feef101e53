use std::sync::Arc;

use openbach_scenario_builder::{
    api::scenario_dto::{FunctionPayloadDto, ReferenceDto},
    domain::job_registry::JobRegistry,
    domain::scenario::function::{FunctionKind, StartJobInstance, StartScenarioInstance, WaitClause},
    domain::scenario::scenario::Scenario,
    domain::utils::id::FunctionId,
    error::Error,
};
use serde_json::json;

fn fping(target: &str) -> StartJobInstance {
    StartJobInstance::new("fping", "client").with_argument("destination_ip", target)
}

#[test]
fn test_embedded_scenario_end_to_end() {
    let mut inner = Scenario::new("S2", "measures towards a target");
    let target = inner.add_argument("target", "Where to ping").unwrap();
    inner.start_job_instance(StartJobInstance::new("fping", "probe").with_argument("destination_ip", &target), WaitClause::new()).unwrap();

    let mut outer = Scenario::new("S1", "");
    let address = outer.add_constant("address", "10.0.0.1").unwrap();
    let a = outer.start_job_instance(fping("10.0.0.2"), WaitClause::new()).unwrap();
    let b = outer.start_job_instance(StartJobInstance::new("hping", "client").with_argument("destination_ip", "10.0.0.2"), WaitClause::new().after_launched(a)).unwrap();
    let c = outer
        .start_scenario_instance(StartScenarioInstance::new(inner).bind("target", &address), WaitClause::new().after_all_finished([a, b]))
        .unwrap();

    assert_eq!((a.id().value, b.id().value, c.id().value), (0, 1, 2));
    assert_eq!(c.kind(), FunctionKind::StartScenarioInstance);

    let dto = outer.to_dto().unwrap();
    assert_eq!(dto.functions[1].wait_launched, vec![ReferenceDto::Local(0)]);
    assert_eq!(dto.functions[2].wait_finished, vec![ReferenceDto::Local(0), ReferenceDto::Local(1)]);

    let FunctionPayloadDto::StartScenarioInstance(instance) = &dto.functions[2].payload else {
        panic!("expected a scenario launch");
    };
    assert_eq!(instance.scenario_name, "S2");
    assert_eq!(instance.arguments["target"], json!("10.0.0.1"));

    let FunctionPayloadDto::StartJobInstance(probe) = &instance.scenario.functions[0].payload else {
        panic!("expected a job launch");
    };
    assert_eq!(probe.arguments["destination_ip"], json!("$target"));
}

#[test]
fn test_duplicate_parameter_name_is_rejected() {
    let mut scenario = Scenario::new("s", "");
    scenario.add_argument("duration", "").unwrap();

    assert!(matches!(scenario.add_constant("duration", 10), Err(Error::DuplicateName { .. })));
    assert!(matches!(scenario.add_argument("duration", ""), Err(Error::DuplicateName { .. })));
    assert_eq!(scenario.parameters().constants().len(), 0);
}

#[test]
fn test_duplicate_name_after_constant_is_rejected() {
    let mut scenario = Scenario::new("s", "");
    scenario.add_constant("rate", 10).unwrap();

    assert!(matches!(scenario.add_constant("rate", 20), Err(Error::DuplicateName { .. })));
    assert!(matches!(scenario.add_argument("rate", ""), Err(Error::DuplicateName { .. })));
    assert!(matches!(scenario.add_argument_with_default("rate", "", 5), Err(Error::DuplicateName { .. })));

    assert_eq!(scenario.parameters().constants().len(), 1);
    assert!(scenario.parameters().arguments().is_empty());
    let dto = scenario.to_dto().unwrap();
    assert_eq!((dto.constants[0].name.as_str(), &dto.constants[0].value), ("rate", &json!(10)));
}

#[test]
fn test_cloned_scenario_has_its_own_scope() {
    let mut original = Scenario::new("s", "");
    let target = original.add_argument("target", "").unwrap();
    original.add_constant("count", 3).unwrap();
    let first = original.start_job_instance(fping("10.0.0.1"), WaitClause::new()).unwrap();
    original.start_job_instance(StartJobInstance::new("fping", "client").with_argument("destination_ip", &target), WaitClause::new().after_finished(first)).unwrap();

    let mut copy = original.clone();
    assert_ne!(copy.scope(), original.scope());
    assert_eq!(copy.to_json().unwrap(), original.to_json().unwrap());

    // the copy's own references were moved along with it
    let copied_target = copy.parameters().argument_ref("target").unwrap();
    let copied_count = copy.parameters().constant_ref("count").unwrap();
    assert!(copy.parameters().argument_ref("count").is_none());
    let third = copy
        .start_job_instance(
            StartJobInstance::new("fping", "client").with_argument("destination_ip", &copied_target).with_argument("count", &copied_count),
            WaitClause::new(),
        )
        .unwrap();
    assert_eq!(third.id().value, 2);
    copy.stop_job_instances([third], WaitClause::new().after_launched(third)).unwrap();

    // handles and parameter refs of one scenario are foreign to the other
    let diverged = original.start_job_instance(fping("10.0.0.3"), WaitClause::new()).unwrap();
    let foreign_handle = copy.stop_job_instances([diverged], WaitClause::new());
    assert!(matches!(foreign_handle, Err(Error::UnresolvedReference { .. })));
    let foreign_wait = copy.start_job_instance(fping("10.0.0.4"), WaitClause::new().after_finished(first));
    assert!(matches!(foreign_wait, Err(Error::UnresolvedReference { .. })));
    let foreign_argument = copy.start_job_instance(StartJobInstance::new("fping", "client").with_argument("destination_ip", &target), WaitClause::new());
    assert!(matches!(foreign_argument, Err(Error::UnresolvedReference { .. })));
    let original_count = original.parameters().constant_ref("count").unwrap();
    let foreign_constant = copy.start_job_instance(fping("10.0.0.5").with_argument("count", &original_count), WaitClause::new());
    assert!(matches!(foreign_constant, Err(Error::UnresolvedReference { .. })));
    let foreign_in_original = original.stop_job_instances([third], WaitClause::new());
    assert!(matches!(foreign_in_original, Err(Error::UnresolvedReference { .. })));

    assert_eq!(copy.len(), 4);
    assert_eq!(original.len(), 3);
}

#[test]
fn test_scenario_can_embed_a_copy_of_itself() {
    let mut scenario = Scenario::new("s", "");
    scenario.add_argument_with_default("target", "", "10.0.0.1").unwrap();
    let ping = scenario.start_job_instance(fping("10.0.0.1"), WaitClause::new()).unwrap();

    let copy = scenario.clone();
    let sub = scenario.start_scenario_instance(StartScenarioInstance::new(copy).bind("target", "10.0.0.2"), WaitClause::new().after_finished(ping)).unwrap();
    assert_eq!(sub.id().value, 1);
    scenario.validate().unwrap();

    let dto = scenario.to_dto().unwrap();
    let FunctionPayloadDto::StartScenarioInstance(instance) = &dto.functions[1].payload else {
        panic!("expected a scenario launch");
    };
    assert_eq!(instance.scenario.functions.len(), 1);
    assert_eq!(instance.arguments["target"], json!("10.0.0.2"));
}

#[test]
fn test_foreign_handle_leaves_scenario_unchanged() {
    let mut first = Scenario::new("first", "");
    let mut second = Scenario::new("second", "");
    let foreign = second.start_job_instance(fping("10.0.0.1"), WaitClause::new()).unwrap();

    let result = first.start_job_instance(fping("10.0.0.2"), WaitClause::new().after_finished(foreign));
    assert!(matches!(result, Err(Error::UnresolvedReference { .. })));
    assert!(first.is_empty());

    // the failed call did not consume an id
    let next = first.start_job_instance(fping("10.0.0.2"), WaitClause::new()).unwrap();
    assert_eq!(next.id().value, 0);
}

#[test]
fn test_foreign_argument_is_rejected() {
    let mut first = Scenario::new("first", "");
    let mut second = Scenario::new("second", "");
    let foreign = second.add_argument("target", "").unwrap();

    let result = first.start_job_instance(StartJobInstance::new("fping", "client").with_argument("destination_ip", &foreign), WaitClause::new());
    assert!(matches!(result, Err(Error::UnresolvedReference { .. })));
}

#[test]
fn test_stop_targets_must_have_the_right_kind() {
    let mut inner = Scenario::new("inner", "");
    inner.start_job_instance(fping("10.0.0.1"), WaitClause::new()).unwrap();

    let mut scenario = Scenario::new("s", "");
    let job = scenario.start_job_instance(fping("10.0.0.1"), WaitClause::new()).unwrap();
    let sub = scenario.start_scenario_instance(StartScenarioInstance::new(inner), WaitClause::new()).unwrap();

    assert!(matches!(scenario.stop_job_instances([sub], WaitClause::new()), Err(Error::TargetKindMismatch { .. })));
    assert!(matches!(scenario.stop_scenario_instance(job, WaitClause::new()), Err(Error::TargetKindMismatch { .. })));

    scenario.stop_job_instances([job], WaitClause::new().after_finished(sub)).unwrap();
    scenario.stop_scenario_instance(sub, WaitClause::new()).unwrap();
    assert_eq!(scenario.len(), 4);
}

#[test]
fn test_required_embedded_argument_must_be_bound() {
    let mut inner = Scenario::new("inner", "");
    inner.add_argument("target", "").unwrap();
    inner.add_argument_with_default("count", "", 5).unwrap();

    let mut scenario = Scenario::new("outer", "");
    let missing = scenario.start_scenario_instance(StartScenarioInstance::new(inner.clone()).bind("count", 3), WaitClause::new());
    assert!(matches!(missing, Err(Error::MissingArgument { argument, .. }) if argument == "target"));

    let unknown = scenario.start_scenario_instance(StartScenarioInstance::new(inner.clone()).bind("target", "a").bind("size", 1), WaitClause::new());
    assert!(matches!(unknown, Err(Error::UnresolvedReference { .. })));

    scenario.start_scenario_instance(StartScenarioInstance::new(inner).bind("target", "a"), WaitClause::new()).unwrap();
    assert_eq!(scenario.len(), 1);
}

#[test]
fn test_set_wait_rejects_cycles() {
    let mut scenario = Scenario::new("s", "");
    let a = scenario.start_job_instance(fping("10.0.0.1"), WaitClause::new()).unwrap();
    let b = scenario.start_job_instance(fping("10.0.0.2"), WaitClause::new().after_finished(a)).unwrap();
    let c = scenario.start_job_instance(fping("10.0.0.3"), WaitClause::new().after_launched(b)).unwrap();

    assert!(matches!(scenario.set_wait(a, WaitClause::new().after_finished(a)), Err(Error::Cycle { .. })));
    let cycle = scenario.set_wait(a, WaitClause::new().after_finished(c));
    assert!(matches!(cycle, Err(Error::Cycle { id, .. }) if id == FunctionId::new(0)));
    assert!(scenario.functions()[0].wait().is_empty());

    // waiting on a later, independent function is fine
    let d = scenario.start_job_instance(fping("10.0.0.4"), WaitClause::new()).unwrap();
    scenario.set_wait(a, WaitClause::new().after_launched(d)).unwrap();
    assert_eq!(scenario.functions()[0].wait().launched().len(), 1);
    assert!(scenario.validate().is_ok());
}

#[test]
fn test_nested_reference_gates_on_embedded_function() {
    let mut inner = Scenario::new("inner", "");
    let inner_job = inner.start_job_instance(fping("10.0.0.1"), WaitClause::new()).unwrap();

    let mut scenario = Scenario::new("outer", "");
    let host = scenario.start_scenario_instance(StartScenarioInstance::new(inner), WaitClause::new()).unwrap();
    let nested = scenario.nested_handle_ref(host, inner_job).unwrap();
    scenario.start_job_instance(fping("10.0.0.2"), WaitClause::new().after_launched(nested)).unwrap();

    assert!(scenario.nested_ref(host, FunctionId::new(9)).is_err());
    let dto = scenario.to_dto().unwrap();
    assert_eq!(dto.functions[1].wait_launched, vec![ReferenceDto::Nested(0, 0)]);
}

#[test]
fn test_strict_registry_checks_job_arguments() {
    let mut scenario = Scenario::with_registry("s", "", Arc::new(JobRegistry::builtin(true)));

    assert!(matches!(scenario.start_job_instance(StartJobInstance::new("fping", "client"), WaitClause::new()), Err(Error::InvalidJobArguments { .. })));
    assert!(matches!(scenario.start_job_instance(StartJobInstance::new("netflix", "client"), WaitClause::new()), Err(Error::UnknownJob(_))));
    assert!(matches!(
        scenario.start_job_instance(fping("10.0.0.1").with_argument("colour", "red"), WaitClause::new()),
        Err(Error::InvalidJobArguments { .. })
    ));
    assert!(scenario.is_empty());
}
