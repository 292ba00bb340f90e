use das2_graph::collapse::{slide_mean, CollapseEngine, Recompute};
use das2_graph::config::CollapseConfig;
use das2_graph::data_types::{DataSet, DenseDataSet};
use das2_graph::error::GraphError;
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn cube() -> Arc<dyn DataSet> {
    Arc::new(DenseDataSet::from_fn(vec![4, 3, 5], |ix| {
        (ix[0] * 100 + ix[1] * 10 + ix[2]) as f64
    }))
}

fn brute_force(source: &dyn DataSet, axis: usize, min: usize, max: usize) -> Vec<f64> {
    let shape = source.shape();
    let outer: Vec<usize> = (0..shape.len()).filter(|a| *a != axis).collect();
    let out_shape: Vec<usize> = outer.iter().map(|a| shape[*a]).collect();
    let n: usize = out_shape.iter().product();
    let mut result = Vec::with_capacity(n);
    for flat in 0..n {
        let mut rem = flat;
        let mut index = vec![0; shape.len()];
        for (pos, a) in outer.iter().enumerate().rev() {
            index[*a] = rem % out_shape[pos];
            rem /= out_shape[pos];
        }
        let mut sum = 0.0;
        for k in min..=max {
            index[axis] = k;
            sum += source.value(&index);
        }
        result.push(sum / (max - min + 1) as f64);
    }
    result
}

#[test]
fn test_cube_scenario_windows() {
    let mut engine = CollapseEngine::new(cube(), 2, &CollapseConfig::default()).unwrap();
    assert!(engine.reduced().is_none());

    let reduced = engine.set_window(1, 3).unwrap();
    assert_eq!(reduced.shape(), vec![4, 3]);
    for i in 0..4 {
        for j in 0..3 {
            assert_eq!(reduced.value(&[i, j]), (i * 100 + j * 10 + 2) as f64);
        }
    }
    assert_eq!(engine.last_recompute(), Recompute::Full);

    let reduced = engine.set_window(2, 4).unwrap();
    for i in 0..4 {
        for j in 0..3 {
            let expected = (i * 100 + j * 10 + 3) as f64;
            assert!((reduced.value(&[i, j]) - expected).abs() < 1e-9);
        }
    }
    assert_eq!(engine.last_recompute(), Recompute::Incremental);
}

#[test]
fn test_single_slice_is_exact() {
    let mut engine = CollapseEngine::new(cube(), 2, &CollapseConfig::default()).unwrap();
    engine.set_window(0, 4).unwrap();
    let reduced = engine.set_window(3, 3).unwrap();
    for i in 0..4 {
        for j in 0..3 {
            assert_eq!(reduced.value(&[i, j]), (i * 100 + j * 10 + 3) as f64);
        }
    }
    assert_eq!(engine.last_recompute(), Recompute::Full);
}

#[test]
fn test_non_overlapping_windows_recompute_fully() {
    let mut engine = CollapseEngine::new(cube(), 2, &CollapseConfig::default()).unwrap();
    engine.set_window(0, 1).unwrap();
    let reduced = engine.set_window(3, 4).unwrap();
    assert_eq!(reduced.value(&[1, 2]), 123.5);
    assert_eq!(engine.last_recompute(), Recompute::Full);
}

#[test]
fn test_same_window_is_unchanged_and_clean() {
    let mut engine = CollapseEngine::new(cube(), 2, &CollapseConfig::default()).unwrap();
    engine.set_window(1, 3).unwrap();
    assert!(engine.take_dirty());
    engine.set_window(1, 3).unwrap();
    assert_eq!(engine.last_recompute(), Recompute::Unchanged);
    assert!(!engine.take_dirty());
}

#[test]
fn test_collapse_other_axes() {
    let source = cube();
    for axis in 0..3 {
        let len = source.length(axis);
        let mut engine = CollapseEngine::new(source.clone(), axis, &CollapseConfig::default()).unwrap();
        let reduced = engine.set_window(0, len - 1).unwrap();
        let expected = brute_force(source.as_ref(), axis, 0, len - 1);
        for (a, b) in reduced.values().iter().zip(&expected) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}

#[test]
fn test_rank2_source() {
    let table: Arc<dyn DataSet> = Arc::new(DenseDataSet::from_fn(vec![3, 4], |ix| {
        (ix[0] * 10 + ix[1]) as f64
    }));
    let mut engine = CollapseEngine::new(table, 1, &CollapseConfig::default()).unwrap();
    let reduced = engine.set_window(0, 3).unwrap();
    assert_eq!(reduced.values(), &[1.5, 11.5, 21.5]);
}

#[test]
fn test_invalid_windows_rejected() {
    let mut engine = CollapseEngine::new(cube(), 2, &CollapseConfig::default()).unwrap();
    assert!(matches!(
        engine.set_window(3, 2),
        Err(GraphError::InvalidWindow { min: 3, max: 2, len: 5 })
    ));
    assert!(matches!(
        engine.set_window(0, 5),
        Err(GraphError::InvalidWindow { .. })
    ));
}

#[test]
fn test_bad_axis_and_rank_rejected() {
    assert!(CollapseEngine::new(cube(), 3, &CollapseConfig::default()).is_err());
    let line: Arc<dyn DataSet> = Arc::new(DenseDataSet::rank1(vec![1.0, 2.0]));
    assert!(CollapseEngine::new(line, 0, &CollapseConfig::default()).is_err());
}

#[test]
fn test_refresh_interval_forces_full_recompute() {
    let config = CollapseConfig {
        refresh_interval: 2,
    };
    let source: Arc<dyn DataSet> =
        Arc::new(DenseDataSet::from_fn(vec![2, 50], |ix| (ix[0] + ix[1]) as f64));
    let mut engine = CollapseEngine::new(source, 1, &config).unwrap();
    engine.set_window(0, 10).unwrap();
    engine.set_window(1, 11).unwrap();
    assert_eq!(engine.last_recompute(), Recompute::Incremental);
    engine.set_window(2, 12).unwrap();
    assert_eq!(engine.last_recompute(), Recompute::Incremental);
    engine.set_window(3, 13).unwrap();
    assert_eq!(engine.last_recompute(), Recompute::Full);
}

#[test]
fn test_tags_follow_remaining_axes() {
    let source = DenseDataSet::from_fn(vec![2, 3], |ix| (ix[0] + ix[1]) as f64)
        .with_depend(0, DenseDataSet::rank1(vec![10.0, 20.0]))
        .unwrap()
        .with_depend(1, DenseDataSet::rank1(vec![1.0, 2.0, 3.0]))
        .unwrap();
    let mut engine = CollapseEngine::new(Arc::new(source), 1, &CollapseConfig::default()).unwrap();
    let reduced = engine.set_window(0, 2).unwrap();
    let tags = reduced.depend(0).unwrap();
    assert_eq!(tags.value(&[1]), 20.0);
    assert_eq!(engine.window_range(), Some((1.0, 3.0)));
}

#[test]
fn test_slide_mean_matches_direct_mean() {
    let data = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
    let mean = |a: usize, b: usize| data[a..=b].iter().sum::<f64>() / (b - a + 1) as f64;
    let slid = slide_mean(mean(2, 5), (2, 5), (1, 6), |k| data[k]);
    assert!((slid - mean(1, 6)).abs() < 1e-12);
    let slid = slide_mean(mean(1, 6), (1, 6), (3, 4), |k| data[k]);
    assert!((slid - mean(3, 4)).abs() < 1e-12);
}

proptest! {
    #[test]
    fn prop_incremental_matches_brute_force(
        seed in any::<u64>(),
        axis in 0usize..3,
        moves in proptest::collection::vec((0usize..12, 0usize..12), 1..25),
    ) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let shape = vec![3, 4, 12];
        let values: Vec<f64> = (0..shape.iter().product::<usize>())
            .map(|_| rng.random_range(-1000.0..1000.0))
            .collect();
        let source: Arc<dyn DataSet> = Arc::new(DenseDataSet::new(shape.clone(), values).unwrap());
        let len = shape[axis];
        let mut engine = CollapseEngine::new(source.clone(), axis, &CollapseConfig::default()).unwrap();

        for (a, b) in moves {
            let (min, max) = (a.min(b) % len, a.max(b) % len);
            let (min, max) = (min.min(max), min.max(max));
            let reduced = engine.set_window(min, max).unwrap();
            let expected = brute_force(source.as_ref(), axis, min, max);
            for (got, want) in reduced.values().iter().zip(&expected) {
                let scale = want.abs().max(1.0);
                prop_assert!((got - want).abs() / scale < 1e-9, "{got} vs {want}");
            }
        }
    }
}
