//! Rectangular linear assignment solver.
//!
//! Shortest augmenting path method for the rectangular assignment problem
//! (Jonker-Volgenant family), following the formulation in
//! D. F. Crouse, "On implementing 2D rectangular assignment algorithms",
//! IEEE TAES 52(4), 2016. One augmenting path is grown per source row
//! with a Dijkstra-like relaxation over reduced costs, then dual
//! variables are updated and the matching is flipped along the path.
//!
//! `O(n^3)` in the smaller matrix dimension.

use ndarray::{Array2, ArrayView2};

use crate::tracker::error::TrackError;

/// Optimal matching between the rows and columns of a cost matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct LapSolution {
    /// Column matched to each row, `None` when the row is unmatched.
    pub row_to_col: Vec<Option<usize>>,
    /// Row matched to each column, `None` when the column is unmatched.
    pub col_to_row: Vec<Option<usize>>,
    /// Sum of the input costs of every matched pair.
    pub cost: f64,
}

impl LapSolution {
    fn unmatched(n_rows: usize, n_cols: usize) -> Self {
        Self {
            row_to_col: vec![None; n_rows],
            col_to_row: vec![None; n_cols],
            cost: 0.0,
        }
    }

    /// Matched `(row, col)` pairs in row order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.row_to_col
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|col| (row, col)))
    }
}

/// Find a minimum (or maximum) cost matching of a rectangular cost matrix.
///
/// Every row is matched when `rows <= cols`, every column otherwise.
/// `+inf` entries mark forbidden pairs. NaN and `-inf` entries are
/// rejected with [`TrackError::InvalidCostMatrix`]; a matrix whose
/// forbidden pairs leave no complete matching gives
/// [`TrackError::InfeasibleCostMatrix`].
pub fn solve(cost: ArrayView2<f64>, maximize: bool) -> Result<LapSolution, TrackError> {
    let (n_rows, n_cols) = cost.dim();
    if n_rows == 0 || n_cols == 0 {
        return Ok(LapSolution::unmatched(n_rows, n_cols));
    }

    // tall matrices are solved transposed so rows are the smaller side
    let transpose = n_cols < n_rows;
    let mut work = if transpose {
        cost.t().to_owned()
    } else {
        cost.to_owned()
    };
    if maximize {
        work.mapv_inplace(|c| -c);
    }

    if work.iter().any(|c| c.is_nan() || *c == f64::NEG_INFINITY) {
        return Err(TrackError::InvalidCostMatrix);
    }
    let min = work.iter().copied().fold(f64::INFINITY, f64::min);
    if min == f64::INFINITY {
        // every pair is forbidden
        return Err(TrackError::InfeasibleCostMatrix);
    }
    work.mapv_inplace(|c| c - min);

    let col4row = shortest_augmenting_paths(&work)?;

    let mut solution = LapSolution::unmatched(n_rows, n_cols);
    for (src, &dst) in col4row.iter().enumerate() {
        let (row, col) = if transpose { (dst, src) } else { (src, dst) };
        solution.row_to_col[row] = Some(col);
        solution.col_to_row[col] = Some(row);
        solution.cost += cost[[row, col]];
    }
    Ok(solution)
}

/// Solve a gated assignment by padding the matrix with dummy rows and columns.
///
/// An `n x m` matrix becomes `(n + m) x (n + m)`. Dummy entries cost
/// `cost_limit / 2` (or `max(cost) + 1` without a limit) and the
/// dummy-to-dummy block costs 0, so a real pair is only kept when it is
/// cheaper than sending both of its ends to dummies. Rows and columns
/// assigned to dummies are reported as unmatched.
pub fn solve_extended(
    cost: ArrayView2<f64>,
    cost_limit: Option<f64>,
) -> Result<LapSolution, TrackError> {
    let (n_rows, n_cols) = cost.dim();
    if n_rows == 0 || n_cols == 0 {
        return Ok(LapSolution::unmatched(n_rows, n_cols));
    }

    let filler = match cost_limit {
        Some(limit) => limit / 2.0,
        None => cost.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 1.0,
    };

    let n = n_rows + n_cols;
    let extended = Array2::from_shape_fn((n, n), |(i, j)| match (i < n_rows, j < n_cols) {
        (true, true) => cost[[i, j]],
        (false, false) => 0.0,
        _ => filler,
    });

    let full = solve(extended.view(), false)?;

    let mut solution = LapSolution::unmatched(n_rows, n_cols);
    for (row, col) in full.pairs() {
        if row < n_rows && col < n_cols {
            solution.row_to_col[row] = Some(col);
            solution.col_to_row[col] = Some(row);
            solution.cost += cost[[row, col]];
        }
    }
    Ok(solution)
}

/// Core of the solver on a non-negative `nr x nc` matrix with `nr <= nc`.
///
/// Returns the column assigned to each row.
fn shortest_augmenting_paths(cost: &Array2<f64>) -> Result<Vec<usize>, TrackError> {
    let (nr, nc) = cost.dim();

    let mut u = vec![0.0; nr];
    let mut v = vec![0.0; nc];
    let mut shortest_path_costs = vec![f64::INFINITY; nc];
    let mut path = vec![usize::MAX; nc];
    let mut col4row: Vec<Option<usize>> = vec![None; nr];
    let mut row4col: Vec<Option<usize>> = vec![None; nc];
    let mut visited_rows = vec![false; nr];
    let mut visited_cols = vec![false; nc];

    for cur_row in 0..nr {
        visited_rows.fill(false);
        visited_cols.fill(false);
        shortest_path_costs.fill(f64::INFINITY);

        // columns are scanned in reverse so a constant matrix yields the identity
        let mut remaining: Vec<usize> = (0..nc).rev().collect();
        let mut min_val = 0.0;
        let mut i = cur_row;

        let sink = loop {
            visited_rows[i] = true;
            let mut index = None;
            let mut lowest = f64::INFINITY;

            for (it, &j) in remaining.iter().enumerate() {
                let reduced = min_val + cost[[i, j]] - u[i] - v[j];
                if reduced < shortest_path_costs[j] {
                    path[j] = i;
                    shortest_path_costs[j] = reduced;
                }
                // on ties prefer a free column, it ends the path
                if shortest_path_costs[j] < lowest
                    || (shortest_path_costs[j] == lowest && row4col[j].is_none())
                {
                    lowest = shortest_path_costs[j];
                    index = Some(it);
                }
            }

            min_val = lowest;
            let index = match index {
                Some(index) if min_val.is_finite() => index,
                _ => return Err(TrackError::InfeasibleCostMatrix),
            };

            let j = remaining.swap_remove(index);
            visited_cols[j] = true;
            match row4col[j] {
                None => break j,
                Some(row) => i = row,
            }
        };

        // update dual variables
        u[cur_row] += min_val;
        for row in 0..nr {
            if visited_rows[row] && row != cur_row {
                if let Some(col) = col4row[row] {
                    u[row] += min_val - shortest_path_costs[col];
                }
            }
        }
        for col in 0..nc {
            if visited_cols[col] {
                v[col] -= min_val - shortest_path_costs[col];
            }
        }

        // augment the previous solution along the path
        let mut j = sink;
        loop {
            let row = path[j];
            row4col[j] = Some(row);
            let previous = col4row[row].replace(j);
            if row == cur_row {
                break;
            }
            j = previous.ok_or(TrackError::InfeasibleCostMatrix)?;
        }
    }

    col4row
        .into_iter()
        .map(|col| col.ok_or(TrackError::InfeasibleCostMatrix))
        .collect()
}
