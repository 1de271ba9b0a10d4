use super::{DecisionTree, NodeIndex, TreeNode};
use grove::{Float, Label};
use std::fmt;

/// Struct to print a fitted decision tree in LaTex using tikz and forest.
///
/// ### Usage
///
/// ```rust
/// use grove::prelude::*;
/// use grove_trees::DecisionTree;
/// use ndarray::array;
///
/// let dataset = Dataset::new(array![[1., 20.], [2., 21.], [3., 22.]], array![0usize, 0, 1])
///     .with_feature_names(vec!["length", "width"]);
/// // Fit the tree
/// let tree = DecisionTree::params().fit(&dataset)?;
/// // Export to tikz
/// let tikz = tree.export_to_tikz().with_legend();
/// let latex_tree = tikz.to_string();
/// // Now you can write latex_tree to the preferred destination
/// assert!(latex_tree.contains("length"));
/// # Result::Ok(())
/// ```
pub struct Tikz<'a, F, L> {
    legend: bool,
    max_classes: usize,
    complete: bool,
    tree: &'a DecisionTree<F, L>,
}

impl<'a, F: Float, L: Label> Tikz<'a, F, L> {
    pub fn new(tree: &'a DecisionTree<F, L>) -> Self {
        Tikz {
            legend: false,
            max_classes: 4,
            complete: true,
            tree,
        }
    }

    fn format_node(&self, idx: NodeIndex, depth: usize) -> String {
        let indent = vec![""; depth + 1].join("\t");

        match self.tree.node(idx) {
            TreeNode::Leaf {
                prediction,
                class_distribution,
                ..
            } => {
                let mut classes = class_distribution
                    .iter()
                    .take(self.max_classes)
                    .map(|(label, count)| format!("{:?}: {}", label, count))
                    .collect::<Vec<_>>();
                if class_distribution.len() > self.max_classes {
                    classes.push("...".into());
                }

                format!(
                    "{}[Label: {:?} \\\\ {}]",
                    indent,
                    prediction,
                    classes.join(", ")
                )
            }
            TreeNode::Split {
                feature_idx,
                threshold,
                impurity_decrease,
                left,
                right,
                ..
            } => {
                let feature = if self.legend {
                    format!("$x_{{{}}}$", feature_idx)
                } else {
                    self.feature_name(*feature_idx)
                };
                let mut out = format!(
                    "{}[{} $ \\leq {:.2}$ \\\\ Imp. ${:.2}$",
                    indent, feature, threshold, impurity_decrease
                );
                for child in &[*left, *right] {
                    out.push('\n');
                    out.push_str(&self.format_node(*child, depth + 1));
                }
                out.push(']');

                out
            }
        }
    }

    fn feature_name(&self, feature_idx: usize) -> String {
        self.tree
            .feature_names()
            .get(feature_idx)
            .cloned()
            .unwrap_or_else(|| format!("Val(${}$)", feature_idx))
    }

    fn legend(&self) -> String {
        let entries = self
            .tree
            .features()
            .into_iter()
            .map(|idx| format!("$x_{{{}}}$ & {} \\\\", idx, self.feature_name(idx)))
            .collect::<Vec<_>>();

        format!(
            "\n\\begin{{tabular}}{{ll}}\nFeature & Name \\\\\n\\hline\n{}\n\\end{{tabular}}\n",
            entries.join("\n")
        )
    }

    /// Whether a complete Tex document should be generated
    pub fn complete(mut self, complete: bool) -> Self {
        self.complete = complete;

        self
    }

    /// Add a legend to the generated tree
    pub fn with_legend(mut self) -> Self {
        self.legend = true;

        self
    }

    /// The maximal number of classes printed in each node
    pub fn max_classes(mut self, max_classes: usize) -> Self {
        self.max_classes = max_classes;

        self
    }
}

const PREAMBLE: &str = r#"
\documentclass[margin=10pt]{standalone}
\usepackage{tikz,forest}
\usetikzlibrary{arrows.meta}

\forestset{
default preamble={
before typesetting nodes={
  !r.replace by={[, coordinate, append]}
},
where n children=0{
  tier=word,
}{
  %diamond, aspect=2,
},
where level=0{}{
  if n=1{
    edge label={node[pos=.2, above] {Y}},
  }{
    edge label={node[pos=.2, above] {N}},
  }
},
for tree={
  edge+={thick, -Latex},
  s sep'+=2cm,
  draw,
  thick,
  edge path'={ (!u) -| (.parent)},
  align=center,
}
}
}

\begin{document}"#;

impl<'a, F: Float, L: Label> fmt::Display for Tikz<'a, F, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        if self.complete {
            out.push_str(PREAMBLE);
        }

        out.push_str("\n\\begin{forest}\n");
        out.push_str(&self.format_node(NodeIndex::root(), 0));
        out.push_str("\n\\end{forest}\n");

        if self.legend {
            out.push_str(&self.legend());
        }
        if self.complete {
            out.push_str("\\end{document}");
        }

        write!(f, "{}", out)
    }
}
