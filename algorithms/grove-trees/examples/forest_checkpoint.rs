// File: examples/forest_checkpoint.rs

use grove::{Dataset, Estimator, Model};
use grove_trees::{DecisionTree, DecisionTreeClassifier, RandomForest, RandomForestClassifier};
use ndarray::{array, Array1};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. A small dataset with five distinct labels
    let train = Dataset::from_rows(
        vec![
            vec![0., 0.],
            vec![1., 1.],
            vec![2., 1.],
            vec![1., 5.],
            vec![3., 2.],
        ],
        vec![0usize, 1, 2, 3, 7],
    )?
    .with_feature_names(vec!["x", "y"]);
    let queries = array![[0.2, 0.1], [1.1, 4.0], [2.9, 2.2]];

    // 2. Single-tree baseline
    let mut tree: DecisionTreeClassifier<f64, usize> = Estimator::new(DecisionTree::params());
    tree.fit(&train)?;
    let tree_preds: Array1<usize> = tree.predict(&queries)?;
    println!("Single-tree predictions: {}", tree_preds);

    // 3. Random Forest, fitted on all cores
    let mut forest: RandomForestClassifier<f64, usize> =
        Estimator::new(RandomForest::params().n_estimators(50).parallel(true));
    forest.fit(&train)?;
    let forest_preds: Array1<usize> = forest.predict(&queries)?;
    println!("Random-forest predictions: {}", forest_preds);

    // 4. Persist and restore the forest
    let checkpoint = forest.to_checkpoint_string()?;
    println!("Checkpoint size: {} bytes", checkpoint.len());

    let mut restored: RandomForestClassifier<f64, usize> = Estimator::new(RandomForest::params());
    restored.from_checkpoint_str(&checkpoint)?;
    let restored_preds: Array1<usize> = restored.predict(&queries)?;
    assert_eq!(restored_preds, forest_preds);
    println!("Restored forest agrees with the original");

    // 5. Print the single tree
    if let Some(fitted) = tree.fitted() {
        println!("{}", fitted.export_to_tikz().complete(false));
    }

    Ok(())
}
