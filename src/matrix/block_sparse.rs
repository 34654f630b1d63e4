use crate::matrix::DiisMatrix;
use hashbrown::HashMap;
use ndarray::prelude::*;
use std::ops::Range;

/// Blocked sparse matrix. The rows and columns are partitioned into blocks (e.g. the orbitals
/// of one atom) and only the non-zero blocks are stored as dense arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSparseMatrix {
    /// Number of rows of each block row
    row_block_sizes: Vec<usize>,
    /// Number of columns of each block column
    col_block_sizes: Vec<usize>,
    /// Stored blocks, indexed by (block row, block column)
    blocks: HashMap<(usize, usize), Array2<f64>>,
}

impl BlockSparseMatrix {
    /// Empty matrix (no stored blocks) with the given block partitioning.
    pub fn new(row_block_sizes: Vec<usize>, col_block_sizes: Vec<usize>) -> Self {
        BlockSparseMatrix {
            row_block_sizes,
            col_block_sizes,
            blocks: HashMap::new(),
        }
    }

    pub fn n_block_rows(&self) -> usize {
        self.row_block_sizes.len()
    }

    pub fn n_block_cols(&self) -> usize {
        self.col_block_sizes.len()
    }

    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Stores a block. The shape of the block has to match the partitioning.
    pub fn put_block(&mut self, row: usize, col: usize, block: Array2<f64>) {
        assert_eq!(
            block.dim(),
            (self.row_block_sizes[row], self.col_block_sizes[col]),
            "BlockSparseMatrix: block ({}, {}) has the wrong shape",
            row,
            col
        );
        self.blocks.insert((row, col), block);
    }

    pub fn block(&self, row: usize, col: usize) -> Option<ArrayView2<f64>> {
        self.blocks.get(&(row, col)).map(|b| b.view())
    }

    fn offsets(sizes: &[usize], index: usize) -> Range<usize> {
        let start: usize = sizes[..index].iter().sum();
        start..start + sizes[index]
    }

    /// Full matrix including the zero blocks.
    pub fn to_dense(&self) -> Array2<f64> {
        let n_rows: usize = self.row_block_sizes.iter().sum();
        let n_cols: usize = self.col_block_sizes.iter().sum();
        let mut dense: Array2<f64> = Array2::zeros([n_rows, n_cols]);
        for ((row, col), block) in self.blocks.iter() {
            let rows = Self::offsets(&self.row_block_sizes, *row);
            let cols = Self::offsets(&self.col_block_sizes, *col);
            dense.slice_mut(s![rows, cols]).assign(block);
        }
        dense
    }
}

impl DiisMatrix for BlockSparseMatrix {
    fn create_like(template: &Self) -> Self {
        let blocks: HashMap<(usize, usize), Array2<f64>> = template
            .blocks
            .iter()
            .map(|(key, block)| (*key, Array2::zeros(block.raw_dim())))
            .collect();
        BlockSparseMatrix {
            row_block_sizes: template.row_block_sizes.clone(),
            col_block_sizes: template.col_block_sizes.clone(),
            blocks,
        }
    }

    fn copy_from(&mut self, src: &Self) {
        self.row_block_sizes.clone_from(&src.row_block_sizes);
        self.col_block_sizes.clone_from(&src.col_block_sizes);
        self.blocks.clone_from(&src.blocks);
    }

    fn add_scaled(&mut self, src: &Self, alpha: f64, beta: f64) {
        if alpha != 1.0 {
            self.blocks.values_mut().for_each(|block| *block *= alpha);
        }
        for (key, block) in src.blocks.iter() {
            match self.blocks.get_mut(key) {
                Some(target) => target.scaled_add(beta, block),
                None => {
                    self.blocks.insert(*key, block * beta);
                }
            }
        }
    }

    fn dot_product(&self, other: &Self) -> f64 {
        // blocks that are missing on either side are zero
        self.blocks
            .iter()
            .filter_map(|(key, block)| other.blocks.get(key).map(|b| (block * b).sum()))
            .sum()
    }

    fn set(&mut self, value: f64) {
        self.blocks.values_mut().for_each(|block| block.fill(value));
    }

    fn is_compatible(&self, other: &Self) -> bool {
        self.row_block_sizes == other.row_block_sizes
            && self.col_block_sizes == other.col_block_sizes
    }
}
