use das2_graph::data_types::{DasAxis, Orientation};
use das2_graph::scales::ChartScale;
use das2_graph::units::Units;

#[test]
fn test_axis_pan() {
    let mut axis = DasAxis::horizontal(100.0, 200.0, Units::SECONDS);
    axis.pan(50.0);
    assert_eq!(axis.min, 150.0);
    assert_eq!(axis.max, 250.0);
    assert_eq!(axis.span(), 100.0);
}

#[test]
fn test_axis_zoom_center() {
    let mut axis = DasAxis::horizontal(100.0, 200.0, Units::SECONDS);
    // Centre 150, half the span.
    axis.zoom_at(150.0, 0.5, 0.5);
    assert_eq!(axis.min, 125.0);
    assert_eq!(axis.max, 175.0);
}

#[test]
fn test_axis_zoom_log() {
    let mut axis = DasAxis::vertical(1.0, 1e4, Units::HERTZ);
    axis.set_log(true).unwrap();
    axis.zoom_at(100.0, 0.5, 0.5);
    assert!((axis.min - 10.0).abs() < 1e-9);
    assert!((axis.max - 1000.0).abs() < 1e-9);
}

#[test]
fn test_axis_clamp_preserves_span() {
    let mut axis = DasAxis::horizontal(100.0, 200.0, Units::SECONDS);
    axis.min_limit = Some(50.0);
    axis.max_limit = Some(250.0);

    axis.pan(-60.0); // [40, 140]
    axis.clamp();
    assert_eq!(axis.min, 50.0);
    assert_eq!(axis.max, 150.0);

    axis.pan(150.0); // [200, 300]
    axis.clamp();
    assert_eq!(axis.max, 250.0);
    assert_eq!(axis.min, 150.0);
}

#[test]
fn test_axis_clamped_bounds_after_wide_zoom() {
    let mut axis = DasAxis::horizontal(100.0, 200.0, Units::SECONDS);
    axis.min_limit = Some(0.0);
    axis.max_limit = Some(300.0);
    axis.zoom_at(150.0, 0.5, 4.0);
    axis.clamp();
    // The virtual range survives; only the drawn range is clamped.
    assert_eq!((axis.min, axis.max), (-50.0, 350.0));
    assert_eq!(axis.clamped_bounds(), (0.0, 300.0));
}

#[test]
fn test_axis_scan() {
    let mut axis = DasAxis::horizontal(0.0, 10.0, Units::SECONDS);
    axis.scan_next();
    assert_eq!((axis.min, axis.max), (10.0, 20.0));
    axis.scan_previous();
    axis.scan_previous();
    assert_eq!((axis.min, axis.max), (-10.0, 0.0));

    let mut log = DasAxis::vertical(1.0, 10.0, Units::HERTZ);
    log.set_log(true).unwrap();
    log.scan_next();
    assert!((log.min - 10.0).abs() < 1e-9 && (log.max - 100.0).abs() < 1e-9);
}

#[test]
fn test_axis_rejects_bad_ranges() {
    let mut axis = DasAxis::horizontal(0.0, 10.0, Units::SECONDS);
    assert!(axis.set_range(5.0, 5.0).is_err());
    assert!(axis.set_log(true).is_err());
    axis.set_range(1.0, 100.0).unwrap();
    axis.set_log(true).unwrap();
    assert!(axis.set_range(-1.0, 100.0).is_err());
}

#[test]
fn test_memento_equality_and_resolution() {
    let axis = DasAxis::horizontal(0.0, 100.0, Units::SECONDS);
    let a = axis.memento(0.0, 400.0);
    let b = axis.memento(0.0, 400.0);
    assert_eq!(a, b);
    assert_ne!(a, axis.memento(0.0, 401.0));
    assert_eq!(a.resolution(), Some(0.25));
    assert_eq!(a.orientation, Orientation::Horizontal);

    let mut log = DasAxis::vertical(1.0, 1000.0, Units::HERTZ);
    log.set_log(true).unwrap();
    let m = log.memento(0.0, 300.0);
    assert!((m.resolution().unwrap() - 0.01).abs() < 1e-12);
}

#[test]
fn test_vertical_memento_scale_points_up() {
    let axis = DasAxis::vertical(0.0, 10.0, Units::DIMENSIONLESS);
    let scale = axis.memento(100.0, 300.0).scale();
    assert_eq!(scale.map(0.0), 300.0);
    assert_eq!(scale.map(10.0), 100.0);
}

#[test]
fn test_axis_ticks_cached_until_domain_moves() {
    let mut axis = DasAxis::horizontal(0.0, 100.0, Units::DIMENSIONLESS);
    let first = axis.ticks(5).to_vec();
    assert!((2..=5).contains(&first.len()), "{first:?}");
    assert!(first.iter().all(|t| (0.0..=100.0).contains(t)));
    assert_eq!(axis.ticks(5), first.as_slice());
    axis.pan(10.0);
    let moved = axis.ticks(5).to_vec();
    assert!(moved.iter().all(|t| (10.0..=110.0).contains(t)), "{moved:?}");
}

#[test]
fn test_chart_scale_formatting() {
    let scale = ChartScale::new_linear((0.0, 1.0), (0.0, 100.0));
    assert_eq!(scale.format_tick(0.000123, &Units::DIMENSIONLESS), "0.0001");
    assert_eq!(scale.format_tick(123.456, &Units::DIMENSIONLESS), "123.46");
    assert_eq!(scale.format_tick(1234.56, &Units::DIMENSIONLESS), "1235");

    // An hour of t1970 formats as wall-clock time.
    let time = ChartScale::new_linear((0.0, 3600.0), (0.0, 100.0));
    assert_eq!(time.format_tick(1800.0, &Units::T1970), "00:30");

    // us2000 zero is the start of 2000.
    let us = ChartScale::new_linear((0.0, 3.0e7), (0.0, 100.0));
    assert_eq!(us.format_tick(0.0, &Units::US2000), "00:00:00");
}
