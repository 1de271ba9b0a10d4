use serde::{Deserialize, Serialize};

/// The metric used to determine the feature by which a node is split
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitQuality {
    /// Measures the degree of probability of a randomly chosen point in the subtree being misclassified, defined as
    /// one minus the sum over all labels of the squared probability of encountering that label.
    /// The Gini index of a split is given by the size-weighted sum of the indexes of its two subtrees.
    Gini,
    /// Measures the entropy of a subtree, defined as the sum over all labels of the probability of encountering that label in the
    /// subtree times its logarithm in base two, with negative sign. The entropy of the root minus the weighted sum of the entropy
    /// of its two subtrees defines the "information gain" obtained by applying the split.
    Entropy,
}

impl SplitQuality {
    /// Impurity of a subset given the number of samples of every class
    pub fn impurity(self, class_counts: &[usize]) -> f64 {
        match self {
            SplitQuality::Gini => gini_impurity(class_counts),
            SplitQuality::Entropy => entropy(class_counts),
        }
    }

    /// Cost of partitioning a subset into `left` and `right`, lower is better
    ///
    /// Every side contributes its impurity weighted by its share of the samples. An empty side
    /// contributes nothing.
    pub fn split_score(self, left: &[usize], right: &[usize]) -> f64 {
        let n_left = left.iter().sum::<usize>() as f64;
        let n_right = right.iter().sum::<usize>() as f64;
        let total = n_left + n_right;

        if total == 0.0 {
            return 0.0;
        }

        (n_left / total) * self.impurity(left) + (n_right / total) * self.impurity(right)
    }
}

/// Given the class frequencies calculates the gini impurity of the subset.
pub fn gini_impurity(class_counts: &[usize]) -> f64 {
    let n_samples = class_counts.iter().sum::<usize>() as f64;
    if n_samples == 0.0 {
        return 0.0;
    }

    let purity = class_counts
        .iter()
        .map(|&x| x as f64 / n_samples)
        .map(|x| x * x)
        .sum::<f64>();

    1.0 - purity
}

/// Given the class frequencies calculates the entropy of the subset.
pub fn entropy(class_counts: &[usize]) -> f64 {
    let n_samples = class_counts.iter().sum::<usize>() as f64;
    if n_samples == 0.0 {
        return 0.0;
    }

    class_counts
        .iter()
        .map(|&x| x as f64 / n_samples)
        .map(|x| if x > 0.0 { -x * x.log2() } else { 0.0 })
        .sum()
}
