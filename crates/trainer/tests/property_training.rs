use gbtrain_trainer::{
    compute_gradients, Dataset, GbdtTrainer, GradientPair, NodeStats, Partitioner, SortedFeatureIndex,
    SplitCandidate, SplitNodes, SquaredError, TrainingParams, TreeGrower,
};
use proptest::prelude::*;

// Property-based tests for tree growth and boosting
// Small integer feature values force plenty of ties

fn arbitrary_dataset() -> impl Strategy<Value = Dataset> {
    (1usize..4, 2usize..40)
        .prop_flat_map(|(features, rows)| {
            (
                prop::collection::vec(prop::collection::vec(0u8..6, features), rows),
                prop::collection::vec(-40i32..40, rows),
            )
        })
        .prop_map(|(matrix, labels)| {
            let features = matrix
                .into_iter()
                .map(|row| row.into_iter().map(f64::from).collect())
                .collect();
            let labels = labels.into_iter().map(|y| f64::from(y) / 4.0).collect();
            Dataset::new(features, labels).unwrap()
        })
}

fn arbitrary_params() -> impl Strategy<Value = TrainingParams> {
    (1usize..4, 1usize..5, 0.0f64..3.0, 0.0f64..2.0, 0.1f64..=1.0).prop_map(
        |(max_trees, max_depth, lambda, gamma, learning_rate)| TrainingParams {
            max_trees,
            max_depth,
            lambda,
            gamma,
            learning_rate,
        },
    )
}

fn pairs_at_zero(dataset: &Dataset) -> Vec<GradientPair> {
    compute_gradients(&SquaredError, &vec![0.0; dataset.len()], &dataset.labels).unwrap()
}

proptest! {
    #[test]
    fn partitioning_is_lossless_and_keeps_order(
        dataset in arbitrary_dataset(),
        feature_seed in any::<usize>(),
        threshold in -0.5f64..6.5,
    ) {
        let feature = feature_seed % dataset.feature_count;
        let n = dataset.len();
        let mut index = SortedFeatureIndex::build(&dataset);
        let mut assignment = vec![0; n];
        let split = SplitCandidate {
            gain: 1.0,
            threshold,
            feature,
            left: NodeStats::default(),
            left_count: 0,
        };
        let nodes = SplitNodes { parent: 0, left: 1, right: 2 };

        let mid = Partitioner::new(&dataset)
            .partition(&mut index, &mut assignment, 0..n, &split, nodes)
            .unwrap();

        let expected_left = (0..n).filter(|&i| dataset.value(i, feature) <= threshold).count();
        prop_assert_eq!(mid, expected_left);

        for f in 0..dataset.feature_count {
            let column = index.column(f);
            let mut ids = column.to_vec();
            ids.sort_unstable();
            prop_assert_eq!(ids, (0..n).collect::<Vec<_>>());

            for (range, owner) in [(0..mid, nodes.left), (mid..n, nodes.right)] {
                let part = &column[range];
                let owned = part.iter().all(|&i| assignment[i] == owner);
                prop_assert!(owned);
                let ordered = part.windows(2).all(|w| {
                    let (a, b) = (dataset.value(w[0], f), dataset.value(w[1], f));
                    a < b || (a == b && w[0] < w[1])
                });
                prop_assert!(ordered);
            }
        }
    }
}

proptest! {
    #[test]
    fn grown_trees_are_well_formed(
        dataset in arbitrary_dataset(),
        params in arbitrary_params(),
    ) {
        let index = SortedFeatureIndex::build(&dataset);
        let pairs = pairs_at_zero(&dataset);
        let grown = TreeGrower::new(&dataset, &index, &params)
            .unwrap()
            .grow(&pairs, params.learning_rate)
            .unwrap();
        let tree = &grown.tree;

        prop_assert_eq!(tree.validate(), Ok(()));
        prop_assert!(tree.depth() as usize <= params.max_depth);
        prop_assert!(tree.nodes.len() < 2usize.pow(params.max_depth as u32 + 1));

        for node in &tree.nodes {
            if let Some((left, right)) = node.children() {
                let l = tree.nodes[left as usize].summary;
                let r = tree.nodes[right as usize].summary;
                prop_assert!((l.sum_gradients + r.sum_gradients - node.summary.sum_gradients).abs() < 1e-9);
                prop_assert!((l.sum_hessians + r.sum_hessians - node.summary.sum_hessians).abs() < 1e-9);
                prop_assert_eq!(l.instances + r.instances, node.summary.instances);
            }
        }

        // The recorded leaf of every instance is where inference lands
        for (instance, row) in dataset.features.iter().enumerate() {
            prop_assert_eq!(tree.leaf_for(row), Some(grown.leaf_of[instance] as usize));
        }
    }
}

proptest! {
    #[test]
    fn gradients_are_idempotent(
        predictions in prop::collection::vec(-100.0f64..100.0, 1..50),
        seed in any::<u64>(),
    ) {
        let labels: Vec<f64> = predictions
            .iter()
            .enumerate()
            .map(|(i, p)| p + ((seed >> (i % 60)) & 7) as f64 - 3.0)
            .collect();
        let before = predictions.clone();

        let first = compute_gradients(&SquaredError, &predictions, &labels).unwrap();
        let second = compute_gradients(&SquaredError, &predictions, &labels).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&predictions, &before);
        prop_assert!(first.iter().all(|pair| pair.hessian == 1.0));
    }
}

proptest! {
    #[test]
    fn boosting_never_increases_training_error(
        dataset in arbitrary_dataset(),
        params in arbitrary_params(),
    ) {
        let outcome = GbdtTrainer::new(params.clone()).unwrap().train(&dataset).unwrap();

        prop_assert_eq!(outcome.ensemble.num_trees(), params.max_trees);
        prop_assert_eq!(outcome.history.len(), params.max_trees);

        let mut previous = gbtrain_trainer::mean_squared_error(&vec![0.0; dataset.len()], &dataset.labels);
        for round in &outcome.history {
            prop_assert!(round.train_mse <= previous + 1e-9);
            previous = round.train_mse;
        }

        for (row, &buffered) in dataset.features.iter().zip(&outcome.predictions) {
            prop_assert!((outcome.ensemble.predict(row) - buffered).abs() < 1e-9);
        }
    }
}
