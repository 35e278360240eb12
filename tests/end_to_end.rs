//! Full runs on generated instances, through the public API only.

use std::fs;
use std::path::PathBuf;

use u_flowshop::decoder::{decode, Decoder};
use u_flowshop::ga::{Crossover, GaConfig, GaRunner, Selection};
use u_flowshop::io::{read_instance, read_permutation, write_instance, write_permutation};
use u_flowshop::model::{InstanceGenerator, MachineType, Problem};
use u_flowshop::permutation::is_permutation;
use u_flowshop::pso::{PsoConfig, PsoRunner};

fn problem() -> Problem {
    InstanceGenerator::new(2024)
        .with_machine_type(MachineType::Unrelated)
        .with_due_date(150)
        .generate(12, &[2, 3, 2])
        .unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("u-flowshop-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn ga_improves_on_its_seed() {
    let problem = problem();
    let seed = problem.identity_permutation();
    let seed_fitness = decode(&seed, &problem);

    let config = GaConfig::default()
        .with_population_size(30)
        .with_max_generations(80)
        .with_seed(11);
    let result = GaRunner::run_with_seed(&problem, &config, &seed).unwrap();

    assert!(result.best_fitness <= seed_fitness);
    assert!(is_permutation(&result.best.permutation, problem.num_jobs()));
    assert_eq!(decode(&result.best.permutation, &problem), result.best_fitness);
    for w in result.fitness_history.windows(2) {
        assert!(w[1] <= w[0]);
    }
}

#[test]
fn ga_roulette_and_pmx_run() {
    let problem = problem();
    let config = GaConfig::fast()
        .with_selection(Selection::Roulette)
        .with_crossover(Crossover::Pmx)
        .with_max_generations(40)
        .with_seed(3);
    let a = GaRunner::run(&problem, &config).unwrap();
    let b = GaRunner::run(&problem, &config).unwrap();
    assert_eq!(a.best.permutation, b.best.permutation);
    assert_eq!(a.history.len(), 41);
}

#[test]
fn pso_global_best_never_regresses() {
    let problem = problem();
    let config = PsoConfig::default()
        .with_population_size(20)
        .with_generations(40)
        .with_seed(5);
    let result = PsoRunner::run(&problem, &config).unwrap();

    for w in result.fitness_history.windows(2) {
        assert!(w[1] <= w[0]);
    }
    assert_eq!(result.history.len(), 40);
    assert_eq!(decode(&result.best_position, &problem), result.best_fitness);
}

#[test]
fn both_engines_agree_with_a_fresh_decoder() {
    let problem = problem();
    let ga = GaRunner::run(
        &problem,
        &GaConfig::fast().with_max_generations(20).with_seed(1),
    )
    .unwrap();
    let pso = PsoRunner::run(
        &problem,
        &PsoConfig::default()
            .with_population_size(10)
            .with_generations(10)
            .with_seed(1),
    )
    .unwrap();

    let mut decoder = Decoder::new(&problem);
    let ga_outcome = decoder.decode(&ga.best.permutation);
    assert!(ga_outcome.is_complete(problem.num_jobs()));
    assert_eq!(ga_outcome.total_tardiness, ga.best_fitness);
    assert_eq!(decoder.evaluate(&pso.best_position), pso.best_fitness);
}

#[test]
fn files_round_trip_into_a_seeded_run() {
    let dir = scratch_dir("roundtrip");
    let problem = problem();
    let seed = InstanceGenerator::new(9).initial_permutation(problem.num_jobs());

    write_instance(dir.join("I1.txt"), &problem).unwrap();
    write_permutation(dir.join("P1.txt"), &seed).unwrap();

    let loaded = read_instance(dir.join("I1.txt"), 150).unwrap();
    let loaded_seed = read_permutation(dir.join("P1.txt")).unwrap();
    assert_eq!(loaded, problem);
    assert_eq!(loaded_seed, seed);

    let config = PsoConfig::default()
        .with_population_size(8)
        .with_generations(5)
        .with_seed(2);
    let result = PsoRunner::run_with_seed(&loaded, &config, &loaded_seed).unwrap();
    assert!(result.best_fitness <= decode(&seed, &problem));

    fs::remove_dir_all(&dir).ok();
}
