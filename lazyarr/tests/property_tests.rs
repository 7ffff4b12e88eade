// Property-based tests for layout and operator invariants.
//
// Three categories:
// 1. Layout bijections: enumerate_indices / flatten_rowwise / from_rowwise
// 2. Extract: full-range idempotence and agreement between the recorded
//    row-major index and the concrete value
// 3. Replace and reshape: recorded indices agree with concrete results
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use lazyarr::graph::{Graph, OpParams};
use lazyarr::indexing::{extract, replace};
use lazyarr::layout::{enumerate_indices, flatten_rowwise, from_rowwise, NdArray};
use lazyarr::reshape::set_dim;
use lazyarr::shape::{Order, Shape};
use lazyarr::subscript::Subscript;
use proptest::prelude::*;

// ── Generators ──────────────────────────────────────────────────────────────

/// Shapes of rank 2..=4 with small positive extents.
fn arb_shape() -> impl Strategy<Value = Shape> {
    prop::collection::vec(1usize..5, 2..=4).prop_map(|dims| Shape::new(dims))
}

/// A shape plus one non-empty ascending position list per dimension.
fn arb_selection() -> impl Strategy<Value = (Shape, Vec<Vec<i64>>)> {
    arb_shape().prop_flat_map(|shape| {
        let per_dim: Vec<_> = shape
            .dims()
            .iter()
            .map(|&extent| {
                prop::collection::btree_set(1..=extent as i64, 1..=extent)
                    .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            })
            .collect();
        (Just(shape), per_dim)
    })
}

fn rowmajor(array: &NdArray<f64>) -> Vec<f64> {
    flatten_rowwise(array)
}

// ── Layout ──────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 200,
        .. ProptestConfig::default()
    })]

    #[test]
    fn enumerate_indices_is_a_rank_permutation(shape in arb_shape()) {
        let ranks = enumerate_indices(&shape);
        let mut seen = vec![false; shape.len()];
        for (p, &rank) in ranks.data().iter().enumerate() {
            prop_assert!(!seen[rank]);
            seen[rank] = true;
            let idx = shape.unravel(p, Order::ColumnMajor);
            prop_assert_eq!(rank, shape.offset(&idx, Order::RowMajor));
        }
        prop_assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn flatten_rowwise_round_trips(shape in arb_shape()) {
        let a = NdArray::sequence(shape.clone());
        let back = from_rowwise(shape, &flatten_rowwise(&a)).unwrap();
        prop_assert_eq!(back, a);
    }
}

// ── Extract / replace / reshape ─────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 50,
        max_shrink_iters: 100,
        .. ProptestConfig::default()
    })]

    #[test]
    fn full_range_extract_is_idempotent(shape in arb_shape()) {
        let mut g = Graph::new();
        let x = g.data(NdArray::sequence(shape.clone()));
        let subs: Vec<Subscript> = shape
            .dims()
            .iter()
            .map(|&d| Subscript::range(1, d as i64))
            .collect();
        let y = extract(&mut g, x, &subs).unwrap();
        prop_assert_eq!(g.shape(y).unwrap(), &shape);
        prop_assert_eq!(g.value(y).unwrap(), g.value(x).unwrap());
    }

    #[test]
    fn extract_index_gathers_concrete_value((shape, positions) in arb_selection()) {
        let mut g = Graph::new();
        let source = NdArray::sequence(shape.clone());
        let x = g.data(source.clone());
        let subs: Vec<Subscript> = positions.into_iter().map(Subscript::Positions).collect();
        let y = extract(&mut g, x, &subs).unwrap();

        let node = g.node(y).unwrap();
        let OpParams::Extract { n, index, dims_out } = &node.params else {
            panic!("expected extract params");
        };
        prop_assert_eq!(*n, shape.len());
        prop_assert_eq!(dims_out, &node.shape);

        // Gathering the row-major source with the recorded index reproduces
        // the row-major concrete result.
        let src = rowmajor(&source);
        let gathered: Vec<f64> = index.iter().map(|&i| src[i]).collect();
        let result = g.value(y).unwrap().as_concrete().unwrap();
        prop_assert_eq!(gathered, rowmajor(result));
    }

    #[test]
    fn replace_index_scatters_concrete_value((shape, positions) in arb_selection()) {
        let mut g = Graph::new();
        let source = NdArray::sequence(shape.clone());
        let x = g.data(source.clone());
        let subs: Vec<Subscript> = positions.into_iter().map(Subscript::Positions).collect();
        let slots: usize = subs
            .iter()
            .map(|s| match s {
                Subscript::Positions(p) => p.len(),
                _ => unreachable!(),
            })
            .product();
        let replacement: Vec<f64> = (0..slots).map(|k| -(k as f64) - 1.0).collect();
        let y = replace(&mut g, x, &subs, replacement.clone()).unwrap();

        let OpParams::Replace { index, .. } = &g.node(y).unwrap().params else {
            panic!("expected replace params");
        };
        let mut scattered = rowmajor(&source);
        for (&i, &v) in index.iter().zip(&replacement) {
            scattered[i] = v;
        }
        let result = g.value(y).unwrap().as_concrete().unwrap();
        prop_assert_eq!(scattered, rowmajor(result));
    }

    #[test]
    fn reshape_preserves_column_major_data(shape in arb_shape()) {
        let mut g = Graph::new();
        let x = g.data(NdArray::sequence(shape.clone()));
        let len = shape.len() as f64;
        let y = set_dim(&mut g, x, Some(&[1.0, len])).unwrap();
        let result = g.value(y).unwrap().as_concrete().unwrap();
        let expected = NdArray::sequence(shape.clone());
        prop_assert_eq!(result.data(), expected.data());

        let OpParams::Reshape { index, .. } = &g.node(y).unwrap().params else {
            panic!("expected reshape params");
        };
        let src = rowmajor(&NdArray::sequence(shape));
        let gathered: Vec<f64> = index.iter().map(|&i| src[i]).collect();
        prop_assert_eq!(gathered, rowmajor(result));
    }
}
