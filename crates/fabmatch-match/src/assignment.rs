//! Minimum-cost bipartite assignment (Kuhn–Munkres).
//!
//! Dense O(n²·m) shortest-augmenting-path formulation with row and column
//! potentials. Rectangular problems are solved on the orientation with no
//! more rows than columns, so every row of the smaller side is assigned.

/// Stored in place of NaN or infinite costs so the solver always terminates.
pub const NON_FINITE_COST: f64 = 1e12;

/// Row-major cost matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// Build a matrix by evaluating `cost(row, col)` for every cell.
    ///
    /// Non-finite results are replaced with [`NON_FINITE_COST`].
    pub fn from_fn(rows: usize, cols: usize, mut cost: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let value = cost(row, col);
                data.push(if value.is_finite() { value } else { NON_FINITE_COST });
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.rows).map(move |row| self.get(row, col))
    }

    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |row, col| self.get(col, row))
    }

    /// Sum of the costs of the given `(row, col)` pairs.
    pub fn total(&self, pairs: &[(usize, usize)]) -> f64 {
        pairs.iter().map(|&(row, col)| self.get(row, col)).sum()
    }
}

/// Solve the assignment problem, returning `(row, col)` pairs sorted by row.
///
/// Exactly `min(rows, cols)` pairs are returned and their total cost is
/// minimal over all such matchings.
pub fn solve(costs: &CostMatrix) -> Vec<(usize, usize)> {
    if costs.is_empty() {
        return Vec::new();
    }
    if costs.rows > costs.cols {
        let mut pairs: Vec<_> = solve(&costs.transpose())
            .into_iter()
            .map(|(row, col)| (col, row))
            .collect();
        pairs.sort_unstable();
        return pairs;
    }

    let n = costs.rows;
    let m = costs.cols;

    // 1-based; index 0 is the virtual source column.
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; m + 1];
    let mut assigned_row = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for row in 1..=n {
        assigned_row[0] = row;
        let mut col0 = 0usize;
        let mut min_slack = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[col0] = true;
            let row0 = assigned_row[col0];
            let mut delta = f64::INFINITY;
            let mut col1 = 0usize;

            for col in 1..=m {
                if used[col] {
                    continue;
                }
                let slack = costs.get(row0 - 1, col - 1) - u[row0] - v[col];
                if slack < min_slack[col] {
                    min_slack[col] = slack;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }

            debug_assert!(col1 != 0, "no free column; costs must be finite");

            for col in 0..=m {
                if used[col] {
                    u[assigned_row[col]] += delta;
                    v[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            col0 = col1;
            if assigned_row[col0] == 0 {
                break;
            }
        }

        // Flip the augmenting path back to the source.
        loop {
            let col1 = way[col0];
            assigned_row[col0] = assigned_row[col1];
            col0 = col1;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut pairs: Vec<_> = (1..=m)
        .filter(|&col| assigned_row[col] != 0)
        .map(|col| (assigned_row[col] - 1, col - 1))
        .collect();
    pairs.sort_unstable();
    pairs
}

/// Whether another cell in the chosen cell's row or column is within
/// `tolerance` of the chosen cost.
pub fn is_ambiguous(costs: &CostMatrix, row: usize, col: usize, tolerance: f64) -> bool {
    let chosen = costs.get(row, col);
    let near = |cost: f64| (cost - chosen).abs() < tolerance;

    let row_rival = costs
        .row(row)
        .iter()
        .enumerate()
        .any(|(c, &cost)| c != col && near(cost));
    let col_rival = costs
        .column(col)
        .enumerate()
        .any(|(r, cost)| r != row && near(cost));

    row_rival || col_rival
}
