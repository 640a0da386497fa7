use std::sync::Arc;

use conway::config::MAX_INSTANCES;
use conway::patterns::BLINKER;
use conway::{
    Automaton, ConfigError, GameConfig, GameStart, Grid, InstanceState, LifeError, Registry, SavedSet,
    build_registry,
};

#[tokio::test]
async fn iteration_counters_advance_once_per_step() {
    for count in [1, 7, 64] {
        let registry = Registry::fresh(count, 10, 10, 20).unwrap();
        for _ in 0..5 {
            registry.step_all().await;
        }
        for index in 0..count {
            assert_eq!(registry.get(index).unwrap().iteration, 6, "instance {index} of {count}");
        }
        assert_eq!(registry.max_iteration(), 6);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_registry_steps_uniformly() {
    let registry = Registry::fresh(MAX_INSTANCES, 10, 10, 20).unwrap();
    registry.step_all().await;
    registry.step_all().await;
    let snapshot = registry.snapshot_all().await;
    assert_eq!(snapshot.len(), MAX_INSTANCES);
    assert!(snapshot.iter().all(|state| state.iteration == 3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_steps_match_sequential_steps() {
    let registry = Registry::fresh(32, 12, 12, 35).unwrap();
    let initial = registry.snapshot_all().await;

    for _ in 0..6 {
        registry.step_all().await;
    }

    for (index, state) in initial.iter().enumerate() {
        let mut alone = Automaton::new(12, 12);
        alone.set_grid((*state.grid).clone()).unwrap();
        for _ in 0..6 {
            alone.step();
        }
        assert_eq!(*registry.get(index).unwrap().grid, *alone.current_grid(), "instance {index}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn snapshots_never_see_a_half_stepped_registry() {
    let registry = Arc::new(Registry::fresh(200, 10, 10, 20).unwrap());

    let stepper = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            for _ in 0..25 {
                registry.step_all().await;
            }
        })
    };

    for _ in 0..25 {
        let snapshot = registry.snapshot_all().await;
        let first = snapshot[0].iteration;
        assert!(snapshot.iter().all(|state| state.iteration == first));
        tokio::task::yield_now().await;
    }
    stepper.await.unwrap();
    assert_eq!(registry.max_iteration(), 26);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn point_reads_during_steps_pair_each_grid_with_its_iteration() {
    const STEPS: usize = 30;
    let registry = Arc::new(Registry::fresh(64, 10, 10, 35).unwrap());
    let initial = registry.snapshot_all().await;
    // generations[i][k] is instance i after k steps, i.e. at iteration k + 1
    let generations: Vec<Vec<Grid>> = initial
        .iter()
        .map(|state| {
            std::iter::successors(Some((*state.grid).clone()), |grid| Some(grid.next_generation()))
                .take(STEPS + 1)
                .collect()
        })
        .collect();

    let stepper = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            for _ in 0..STEPS {
                registry.step_all().await;
            }
        })
    };

    let mut reads = 0;
    while !stepper.is_finished() || reads < 256 {
        let index = reads % initial.len();
        let state = registry.get(index).unwrap();
        let steps = (state.iteration - 1) as usize;
        assert_eq!(*state.grid, generations[index][steps], "instance {index} at iteration {}", state.iteration);
        reads += 1;
        tokio::task::yield_now().await;
    }
    stepper.await.unwrap();
    assert_eq!(registry.max_iteration(), STEPS as u64 + 1);
}

#[tokio::test]
async fn point_reads_share_the_grid_without_copying() {
    let registry = Registry::fresh(3, 8, 8, 50).unwrap();
    let before = registry.get(1).unwrap();
    let again = registry.get(1).unwrap();
    assert!(Arc::ptr_eq(&before.grid, &again.grid));

    registry.step_all().await;
    let after = registry.get(1).unwrap();
    assert_eq!(after.iteration, before.iteration + 1);
    assert_eq!(*after.grid, before.grid.next_generation());
    assert!(registry.get(3).is_none());
}

#[tokio::test]
async fn randomize_all_resets_iterations() {
    let registry = Registry::fresh(5, 8, 8, 20).unwrap();
    registry.step_all().await;
    registry.step_all().await;
    registry.randomize_all().await;
    assert_eq!(registry.max_iteration(), 1);
    assert_eq!(registry.len(), 5);
}

#[test]
fn aggregate_counts_every_instance() {
    let registry = Registry::fresh(4, 6, 6, 100).unwrap();
    let aggregate = registry.aggregate();
    assert_eq!(aggregate.total_living_cells, 4 * 36);
    assert_eq!(aggregate.instance_count, 4);
    assert_eq!(aggregate.max_iteration, 1);
}

#[test]
fn too_many_instances_is_a_configuration_error() {
    let err = Registry::fresh(MAX_INSTANCES + 1, 10, 10, 20).unwrap_err();
    assert_eq!(err, ConfigError::InstanceCount { requested: MAX_INSTANCES + 1, max: MAX_INSTANCES });
    assert!(Registry::fresh(0, 10, 10, 20).is_err());
}

#[test]
fn seed_becomes_instance_zero() {
    let seed = BLINKER.stamp(6, 6, 2, 1);
    let registry = Registry::from_seed(4, 6, 6, 20, seed.clone(), 42).unwrap();
    let first = registry.get(0).unwrap();
    assert_eq!(*first.grid, seed);
    assert_eq!(first.iteration, 42);
    assert!((1..4).all(|i| registry.get(i).unwrap().iteration == 1));

    let wrong = Registry::from_seed(4, 6, 6, 20, Grid::new(6, 7), 1).unwrap_err();
    assert!(matches!(wrong, LifeError::DimensionMismatch(_)));
}

#[test]
fn saved_set_is_backfilled_to_capacity() {
    let saved: Vec<InstanceState> = (0..3)
        .map(|i| InstanceState { grid: Arc::new(BLINKER.stamp(6, 6, i, 0)), iteration: 10 + i as u64 })
        .collect();
    let registry = Registry::from_saved_set(10, 6, 6, 20, saved.clone()).unwrap();
    assert_eq!(registry.len(), 10);
    for (index, state) in saved.iter().enumerate() {
        assert_eq!(registry.get(index).as_ref(), Some(state));
    }
    assert!((3..10).all(|i| registry.get(i).unwrap().iteration == 1));

    let overfull = Registry::from_saved_set(2, 6, 6, 20, saved).unwrap_err();
    assert!(matches!(overfull, LifeError::Config(ConfigError::InstanceCount { requested: 3, max: 2 })));
}

#[test]
fn loading_a_save_of_the_wrong_size_does_not_start() {
    let config = GameConfig::parallel(4, 10, 10);
    let single = InstanceState { grid: Arc::new(Grid::new(12, 10)), iteration: 3 };
    let err = build_registry(&config, GameStart::ResumeSingle(single)).unwrap_err();
    assert!(matches!(err, LifeError::DimensionMismatch(m) if m.expected == (10, 10) && m.found == (12, 10)));

    let set = SavedSet { instances: Vec::new(), rows: 10, columns: 11 };
    assert!(matches!(
        build_registry(&config, GameStart::ResumeSet(set)),
        Err(LifeError::DimensionMismatch(_))
    ));

    let registry = build_registry(&config, GameStart::New).unwrap();
    assert_eq!(registry.len(), 4);
    assert_eq!(registry.dimensions(), (10, 10));
}
