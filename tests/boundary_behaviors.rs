use dva_moo::absorber::AbsorberParams;
use dva_moo::algorithm::RunControl;
use dva_moo::frf::evaluate_frf;
use dva_moo::primary::PrimaryParams;
use dva_moo::random::{MOORandomGenerator, RandomGenerator};
use dva_moo::{Config, Nsga2};
use ndarray::Array1;

/// B1: with a zero-valued absorber, the FRF evaluator returns the
/// unabsorbed primary response and `singular_response` is finite.
#[test]
fn b1_zero_absorber_gives_finite_unabsorbed_response() {
    let primary = PrimaryParams::scenario_s1();
    let absorber = AbsorberParams::zeros();
    let omega = Array1::linspace(0.0, 12000.0, 200);
    let targets = std::array::from_fn(|_| Vec::new());

    let result = evaluate_frf(&primary, &absorber, &omega, &targets).expect("must solve");
    assert!(result.singular_response.is_finite());
}

/// B2: the smallest allowed run (population_size = 4, max_generations = 1)
/// completes and emits a well-formed result.
#[test]
fn b2_minimal_population_and_generations_completes() {
    let mut config = Config::default();
    config.population_size = 4;
    config.max_generations = 1;
    config.validate().expect("minimal config must validate");

    let mut rng = MOORandomGenerator::new_from_seed(Some(0));
    let problem = config.build_problem_config(&mut rng);
    let nsga2 = Nsga2::new(&config, problem);
    let control = RunControl::new(None);

    let result = nsga2.run(1, &control).expect("minimal run should complete");
    assert_eq!(result.per_generation.len(), 1);
    assert_eq!(result.final_population.len(), 4);
}

/// B3: an all-fixed parameter problem degenerates to a single point; HV and
/// IGD+ remain well-defined rather than NaN/panicking.
#[test]
fn b3_all_fixed_bounds_degenerate_to_a_single_point() {
    let mut config = Config::default();
    config.population_size = 8;
    config.max_generations = 3;
    config.problem.bounds = vec![(0.5, 0.5); dva_moo::genetic::NUM_GENES];

    let mut rng = MOORandomGenerator::new_from_seed(Some(0));
    let problem = config.build_problem_config(&mut rng);
    let nsga2 = Nsga2::new(&config, problem);
    let control = RunControl::new(None);

    let result = nsga2.run(2, &control).expect("degenerate run should complete");
    for row in result.final_population.genes.outer_iter() {
        for &gene in row.iter() {
            assert_eq!(gene, 0.5);
        }
    }
    for record in &result.per_generation {
        assert!(!record.hv.is_nan());
        assert!(!record.igd_plus.is_nan() || record.igd_plus.is_infinite());
    }
}
