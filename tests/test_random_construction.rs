use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use openbach_scenario_builder::api::scenario_dto::ReferenceDto;
use openbach_scenario_builder::domain::scenario::function::{FunctionHandle, StartJobInstance, WaitClause};
use openbach_scenario_builder::domain::scenario::scenario::Scenario;

/// Appends `count` jobs, each waiting on a random subset of the previous ones.
fn random_scenario(rng: &mut StdRng, count: usize) -> Scenario {
    let mut scenario = Scenario::new("random", "");
    let mut handles: Vec<FunctionHandle> = Vec::new();

    for index in 0..count {
        let mut wait = WaitClause::new();
        for handle in &handles {
            if rng.random_bool(0.3) {
                wait = if rng.random_bool(0.5) { wait.after_finished(*handle) } else { wait.after_launched(*handle) };
            }
        }
        let job = StartJobInstance::new("fping", format!("entity-{}", index)).with_argument("count", rng.random_range(1..100u32));
        handles.push(scenario.start_job_instance(job, wait).unwrap());
    }
    scenario
}

#[test]
fn test_random_sequences_stay_acyclic_and_ordered() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let count = rng.random_range(1..40usize);
        let scenario = random_scenario(&mut rng, count);

        assert_eq!(scenario.len(), count);
        let dto = scenario.to_dto().unwrap();
        for (position, function) in dto.functions.iter().enumerate() {
            assert_eq!(function.id as usize, position);
            for reference in function.wait_finished.iter().chain(&function.wait_launched) {
                let ReferenceDto::Local(target) = reference else {
                    panic!("unexpected nested reference");
                };
                assert!(*target < function.id);
            }
        }
    }
}

#[test]
fn test_random_rewiring_never_stores_a_cycle() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut scenario = random_scenario(&mut rng, 15);

    for _ in 0..200 {
        let source = rng.random_range(0..scenario.len());
        let target = rng.random_range(0..scenario.len());
        let handles = scenario.job_handles("fping");
        let wait = WaitClause::new().after_finished(handles[target]);

        // Accepted or not, the stored graph must remain valid.
        let _ = scenario.set_wait(handles[source], wait);
        assert!(scenario.validate().is_ok());
    }
}
