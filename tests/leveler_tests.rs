use das2_graph::config::LevelerConfig;
use das2_graph::layout::{Boundary, Extent, Geometry, LayoutArena, Leveler, NodeId};
use proptest::prelude::*;

const EPS: f64 = 1e-9;

fn setup(margin: f64) -> (LayoutArena, Leveler) {
    let mut arena = LayoutArena::new(400.0, 1000.0, 12.0);
    let bounding = arena.add_row(Geometry::normalized(0.0, 1.0));
    let config = LevelerConfig {
        inter_margin: margin,
        min_child_fraction: 0.02,
    };
    let leveler = Leveler::new(&arena, bounding, &config).unwrap();
    (arena, leveler)
}

fn assert_tiled(leveler: &Leveler) {
    let nodes: Vec<NodeId> = leveler.children().collect();
    if nodes.is_empty() {
        return;
    }
    let (first_min, _) = leveler.bounds(nodes[0]).unwrap();
    let (_, last_max) = leveler.bounds(*nodes.last().unwrap()).unwrap();
    assert!(first_min.abs() < EPS);
    assert!((last_max - 1.0).abs() < EPS);
    for pair in nodes.windows(2) {
        let (_, prev_max) = leveler.bounds(pair[0]).unwrap();
        let (next_min, _) = leveler.bounds(pair[1]).unwrap();
        assert!(
            (next_min - (prev_max + leveler.inter_margin())).abs() < EPS,
            "gap between {prev_max} and {next_min}"
        );
    }
    for node in nodes {
        let (min, max) = leveler.bounds(node).unwrap();
        assert!(min < max);
        assert!(leveler.weight(node).unwrap() > 0.0);
    }
}

#[test]
fn test_equal_weights_split_evenly() {
    let (mut arena, mut leveler) = setup(0.0);
    let a = leveler.add_child(&mut arena, 0.0, 1.0).unwrap();
    let b = leveler.add_child(&mut arena, 1.0, 1.0).unwrap();

    assert_eq!(leveler.bounds(a), Some((0.0, 0.5)));
    assert_eq!(leveler.bounds(b), Some((0.5, 1.0)));
    assert_eq!(arena.extent(a).unwrap(), Extent::new(0.0, 500.0));
    assert_eq!(arena.extent(b).unwrap(), Extent::new(500.0, 1000.0));
    assert_tiled(&leveler);
}

#[test]
fn test_drag_max_redistributes_above() {
    let (mut arena, mut leveler) = setup(0.0);
    let a = leveler.add_child(&mut arena, 0.0, 1.0).unwrap();
    let b = leveler.add_child(&mut arena, 1.0, 1.0).unwrap();

    leveler
        .set_child_boundary(&mut arena, a, Boundary::Max(0.3))
        .unwrap();
    let (_, a_max) = leveler.bounds(a).unwrap();
    let (b_min, _) = leveler.bounds(b).unwrap();
    assert!((a_max - 0.3).abs() < EPS);
    assert!((b_min - 0.3).abs() < EPS);
    assert!((leveler.weight(a).unwrap() - 0.3).abs() < EPS);
    assert!((leveler.weight(b).unwrap() - 0.7).abs() < EPS);
    assert_tiled(&leveler);
}

#[test]
fn test_drag_min_keeps_weight_ratio_below() {
    let (mut arena, mut leveler) = setup(0.0);
    let a = leveler.add_child(&mut arena, 0.0, 1.0).unwrap();
    let b = leveler.add_child(&mut arena, 1.0, 3.0).unwrap();
    let c = leveler.add_child(&mut arena, 1.0, 4.0).unwrap();

    leveler
        .set_child_boundary(&mut arena, c, Boundary::Min(0.8))
        .unwrap();
    // a and b share [0, 0.8] at 1:3.
    let (_, a_max) = leveler.bounds(a).unwrap();
    let (b_min, b_max) = leveler.bounds(b).unwrap();
    assert!((a_max - 0.2).abs() < EPS);
    assert!((b_min - 0.2).abs() < EPS);
    assert!((b_max - 0.8).abs() < EPS);
    assert_tiled(&leveler);
}

#[test]
fn test_margin_invariant_holds() {
    let (mut arena, mut leveler) = setup(0.05);
    let a = leveler.add_child(&mut arena, 0.0, 1.0).unwrap();
    let _b = leveler.add_child(&mut arena, 1.0, 2.0).unwrap();
    let _c = leveler.add_child(&mut arena, 1.0, 1.0).unwrap();
    assert_tiled(&leveler);

    leveler
        .set_child_boundary(&mut arena, a, Boundary::Max(0.6))
        .unwrap();
    assert_tiled(&leveler);
}

#[test]
fn test_single_child_spans_parent_and_ignores_drags() {
    let (mut arena, mut leveler) = setup(0.1);
    let only = leveler.add_child(&mut arena, 0.5, 2.0).unwrap();
    assert_eq!(leveler.bounds(only), Some((0.0, 1.0)));
    leveler
        .set_child_boundary(&mut arena, only, Boundary::Max(0.4))
        .unwrap();
    assert_eq!(leveler.bounds(only), Some((0.0, 1.0)));
}

#[test]
fn test_empty_leveler() {
    let (_arena, leveler) = setup(0.0);
    assert!(leveler.is_empty());
    assert_eq!(leveler.integrate_weight(0), 0.0);
}

#[test]
fn test_drag_past_neighbour_is_clamped() {
    let (mut arena, mut leveler) = setup(0.0);
    let a = leveler.add_child(&mut arena, 0.0, 1.0).unwrap();
    let b = leveler.add_child(&mut arena, 1.0, 1.0).unwrap();

    leveler
        .set_child_boundary(&mut arena, a, Boundary::Max(5.0))
        .unwrap();
    let (b_min, b_max) = leveler.bounds(b).unwrap();
    assert!(b_max - b_min >= 0.02 - EPS);
    assert_tiled(&leveler);
}

#[test]
fn test_light_neighbour_keeps_minimum_width() {
    let (mut arena, mut leveler) = setup(0.0);
    let a = leveler.add_child(&mut arena, 0.0, 1.0).unwrap();
    let b = leveler.add_child(&mut arena, 1.0, 9.0).unwrap();
    let c = leveler.add_child(&mut arena, 1.0, 1.0).unwrap();

    leveler
        .set_child_boundary(&mut arena, a, Boundary::Max(1.0))
        .unwrap();
    for node in [a, b, c] {
        let (min, max) = leveler.bounds(node).unwrap();
        assert!(max - min >= 0.02 - EPS, "{node:?} is {} wide", max - min);
    }
    // The lightest child above holds a tenth of the share, so the drag stops at 0.8.
    assert!((leveler.bounds(a).unwrap().1 - 0.8).abs() < EPS);
    assert_tiled(&leveler);

    leveler
        .set_child_boundary(&mut arena, c, Boundary::Min(0.0))
        .unwrap();
    for node in [a, b, c] {
        let (min, max) = leveler.bounds(node).unwrap();
        assert!(max - min >= 0.02 - EPS, "{node:?} is {} wide", max - min);
    }
    assert_tiled(&leveler);
}

#[test]
fn test_add_child_position_picks_slot() {
    let (mut arena, mut leveler) = setup(0.0);
    let bottom = leveler.add_child(&mut arena, 0.0, 1.0).unwrap();
    let top = leveler.add_child(&mut arena, 1.0, 1.0).unwrap();
    let middle = leveler.add_child(&mut arena, 0.5, 1.0).unwrap();
    let order: Vec<NodeId> = leveler.children().collect();
    assert_eq!(order, vec![bottom, middle, top]);
}

#[test]
fn test_remove_child_relayouts() {
    let (mut arena, mut leveler) = setup(0.0);
    let a = leveler.add_child(&mut arena, 0.0, 1.0).unwrap();
    let b = leveler.add_child(&mut arena, 1.0, 1.0).unwrap();
    leveler.remove_child(&mut arena, a).unwrap();
    assert_eq!(leveler.bounds(b), Some((0.0, 1.0)));
    assert!(!arena.contains(a));
}

#[test]
fn test_non_positive_weight_rejected() {
    let (mut arena, mut leveler) = setup(0.0);
    assert!(leveler.add_child(&mut arena, 0.0, 0.0).is_err());
    assert!(leveler.add_child(&mut arena, 0.0, -1.0).is_err());
    assert!(leveler.add_child(&mut arena, 0.0, f64::NAN).is_err());
}

#[derive(Clone, Debug)]
enum Op {
    Add { position: f64, weight: f64 },
    DragMax { child: usize, to: f64 },
    DragMin { child: usize, to: f64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0.0f64..1.0, 0.1f64..10.0).prop_map(|(position, weight)| Op::Add { position, weight }),
        (0usize..8, -0.5f64..1.5).prop_map(|(child, to)| Op::DragMax { child, to }),
        (0usize..8, -0.5f64..1.5).prop_map(|(child, to)| Op::DragMin { child, to }),
    ]
}

proptest! {
    #[test]
    fn prop_leveler_invariants(
        margin in 0.0f64..0.05,
        ops in proptest::collection::vec(op_strategy(), 1..40),
    ) {
        let (mut arena, mut leveler) = setup(margin);
        for op in ops {
            let nodes: Vec<NodeId> = leveler.children().collect();
            match op {
                Op::Add { position, weight } => {
                    if leveler.len() < 8 {
                        leveler.add_child(&mut arena, position, weight).unwrap();
                    }
                }
                Op::DragMax { child, to } if !nodes.is_empty() => {
                    let node = nodes[child % nodes.len()];
                    leveler.set_child_boundary(&mut arena, node, Boundary::Max(to)).unwrap();
                }
                Op::DragMin { child, to } if !nodes.is_empty() => {
                    let node = nodes[child % nodes.len()];
                    leveler.set_child_boundary(&mut arena, node, Boundary::Min(to)).unwrap();
                }
                _ => {}
            }
            assert_tiled(&leveler);
        }
    }
}
