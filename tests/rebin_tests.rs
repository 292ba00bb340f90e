use das2_graph::data_types::{DasAxis, DenseDataSet};
use das2_graph::rebin::{average_table, min_max_series, RebinDescriptor};
use das2_graph::transform::AxisTransform;
use das2_graph::units::Units;
use rand::{Rng, SeedableRng};

#[test]
fn test_descriptor_bins() {
    let dd = RebinDescriptor::new(0.0, 10.0, 10, false).unwrap();
    assert_eq!(dd.bin_of(0.0), Some(0));
    assert_eq!(dd.bin_of(9.99), Some(9));
    assert_eq!(dd.bin_of(10.0), None);
    assert_eq!(dd.bin_of(-0.1), None);
    assert_eq!(dd.bin_of(f64::NAN), None);
    assert_eq!(dd.bin_center(0), 0.5);
}

#[test]
fn test_log_descriptor() {
    let dd = RebinDescriptor::new(1.0, 1000.0, 3, true).unwrap();
    assert_eq!(dd.bin_of(5.0), Some(0));
    assert_eq!(dd.bin_of(50.0), Some(1));
    assert_eq!(dd.bin_of(500.0), Some(2));
    assert_eq!(dd.bin_of(-1.0), None);
    assert!((dd.bin_center(1) - 10f64.powf(1.5)).abs() < 1e-9);
}

#[test]
fn test_descriptor_rejects_bad_geometry() {
    assert!(RebinDescriptor::new(0.0, 10.0, 0, false).is_err());
    assert!(RebinDescriptor::new(10.0, 0.0, 5, false).is_err());
    assert!(RebinDescriptor::new(0.0, 10.0, 5, true).is_err());
}

#[test]
fn test_descriptor_from_transform_has_one_bin_per_pixel() {
    let memento = DasAxis::horizontal(0.0, 50.0, Units::SECONDS).memento(10.0, 110.0);
    let dd = RebinDescriptor::from_transform(&AxisTransform::from_memento(&memento)).unwrap();
    assert_eq!(dd.n_bins, 100);
    assert!((dd.min - 0.0).abs() < 1e-9);
    assert!((dd.max - 50.0).abs() < 1e-9);
}

#[test]
fn test_average_table() {
    // 4 x 2 table averaged onto 2 x 1 bins.
    let table = DenseDataSet::new(vec![4, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, f64::NAN]).unwrap();
    let x = [0.5, 1.5, 2.5, 3.5];
    let y = [0.25, 0.75];
    let ddx = RebinDescriptor::new(0.0, 4.0, 2, false).unwrap();
    let ddy = RebinDescriptor::new(0.0, 1.0, 1, false).unwrap();
    let out = average_table(&table, &x, &y, &ddx, &ddy).unwrap();
    assert_eq!(out.value(0, 0), 2.5);
    // NaN samples do not count.
    assert_eq!(out.value(1, 0), 6.0);
    assert_eq!(out.weights, vec![4.0, 3.0]);
}

#[test]
fn test_average_table_marks_empty_bins() {
    let table = DenseDataSet::new(vec![1, 1], vec![9.0]).unwrap();
    let ddx = RebinDescriptor::new(0.0, 2.0, 2, false).unwrap();
    let ddy = RebinDescriptor::new(0.0, 1.0, 1, false).unwrap();
    let out = average_table(&table, &[0.5], &[0.5], &ddx, &ddy).unwrap();
    assert_eq!(out.value(0, 0), 9.0);
    assert!(out.value(1, 0).is_nan());
}

#[test]
fn test_average_table_shape_mismatch() {
    let table = DenseDataSet::new(vec![2, 2], vec![0.0; 4]).unwrap();
    let dd = RebinDescriptor::new(0.0, 1.0, 1, false).unwrap();
    assert!(average_table(&table, &[0.0], &[0.0, 1.0], &dd, &dd).is_err());
}

#[test]
fn test_min_max_series_keeps_extremes() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let x: Vec<f64> = (0..10_000).map(|i| i as f64 / 100.0).collect();
    let mut y: Vec<f64> = (0..10_000).map(|_| rng.random_range(-1.0..1.0)).collect();
    y[1234] = 50.0;
    y[8765] = -50.0;

    let dd = RebinDescriptor::new(0.0, 100.0, 100, false).unwrap();
    let out = min_max_series(&x, &y, &dd);
    assert!(out.len() <= 200);
    assert!(out.contains(&(12.34, 50.0)));
    assert!(out.contains(&(87.65, -50.0)));
    assert!(out.windows(2).all(|w| w[0].0 <= w[1].0), "output stays in x order");
}
