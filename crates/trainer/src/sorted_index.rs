//! Per-feature sorted instance order
//!
//! Column `f` lists every instance id ordered by its value of feature `f`
//! (ties in ascending id order). A tree node owns the same position range in
//! every column; the partitioner keeps each range sorted as nodes split.

use rayon::prelude::*;
use std::ops::Range;

use crate::dataset::Dataset;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortedFeatureIndex {
    columns: Vec<Vec<usize>>,
}

impl SortedFeatureIndex {
    /// Sort every feature once
    pub fn build(dataset: &Dataset) -> Self {
        let columns = (0..dataset.feature_count)
            .into_par_iter()
            .map(|feature| {
                let mut column: Vec<usize> = (0..dataset.len()).collect();
                // Stable, so equal values keep ascending instance order.
                column.sort_by(|&a, &b| {
                    dataset
                        .value(a, feature)
                        .total_cmp(&dataset.value(b, feature))
                });
                column
            })
            .collect();

        Self { columns }
    }

    pub fn feature_count(&self) -> usize {
        self.columns.len()
    }

    pub fn instance_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column(&self, feature: usize) -> &[usize] {
        &self.columns[feature]
    }

    /// Instances at `range` of one column
    pub fn range(&self, feature: usize, range: Range<usize>) -> &[usize] {
        &self.columns[feature][range]
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Vec<usize>] {
        &mut self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_are_sorted_permutations() {
        let dataset = Dataset::new(
            vec![
                vec![3.0, 1.0],
                vec![1.0, 1.0],
                vec![2.0, -5.0],
                vec![1.0, 0.0],
            ],
            vec![0.0; 4],
        )
        .unwrap();

        let index = SortedFeatureIndex::build(&dataset);
        assert_eq!(index.feature_count(), 2);
        assert_eq!(index.instance_count(), 4);

        // Ties keep ascending instance order
        assert_eq!(index.column(0), &[1, 3, 2, 0]);
        assert_eq!(index.column(1), &[2, 3, 0, 1]);
        assert_eq!(index.range(1, 1..3), &[3, 0]);
    }
}
