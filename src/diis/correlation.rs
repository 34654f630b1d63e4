use ndarray::prelude::*;

/// Bordered DIIS matrix B, [Pulay:1980:393], Eqn. 6, LHS.
///
/// Row and column 0 hold the Lagrange constraint (-1 on the border, 0 in the corner), the
/// entries (i+1, j+1) hold the overlap of the errors stored in history slots i and j.
/// The matrix only grows, the side length is always the history length + 1.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    b: Array2<f64>,
}

impl CorrelationMatrix {
    /// 1x1 zero block that corresponds to an empty history.
    pub fn new() -> Self {
        CorrelationMatrix {
            b: Array2::zeros([1, 1]),
        }
    }

    pub fn side(&self) -> usize {
        self.b.nrows()
    }

    pub fn view(&self) -> ArrayView2<f64> {
        self.b.view()
    }

    /// Enlarges the matrix to `side` x `side`. The old matrix is kept in the upper left
    /// corner and the new rows and columns are zero.
    pub fn grow(&mut self, side: usize) {
        let old: usize = self.side();
        if side <= old {
            return;
        }
        let mut b: Array2<f64> = Array2::zeros([side, side]);
        b.slice_mut(s![..old, ..old]).assign(&self.b);
        self.b = b;
    }

    /// Sets the constraint entries for the history slot `slot` (0-based).
    pub fn set_border(&mut self, slot: usize) {
        self.b[[0, slot + 1]] = -1.0;
        self.b[[slot + 1, 0]] = -1.0;
    }

    /// Stores the overlap between the errors of the history slots `i` and `j` (0-based).
    pub fn set_overlap(&mut self, i: usize, j: usize, value: f64) {
        self.b[[i + 1, j + 1]] = value;
        self.b[[j + 1, i + 1]] = value;
    }
}

impl Default for CorrelationMatrix {
    fn default() -> Self {
        CorrelationMatrix::new()
    }
}
