use super::assignment::{AssignmentBackend, AssignmentProblem, BackendError};

/// Combinatorial backend: Kuhn-Munkres with row/column potentials.
///
/// Rows are bands, columns are the slots plus one dummy column per band, so
/// every band can stay unassigned at zero cost. A candidacy costs minus its
/// weight; every other cell costs zero and is dropped from the matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hungarian;

const INF: i64 = i64::MAX / 4;

impl AssignmentBackend for Hungarian {
    fn name(&self) -> &'static str {
        "hungarian"
    }

    fn solve(&self, problem: &AssignmentProblem) -> Result<Vec<usize>, BackendError> {
        let n = problem.bands.len();
        if n == 0 || problem.edges.is_empty() {
            return Ok(Vec::new());
        }
        let m = problem.slots.len() + n;

        // cost[row][col], 1-based with a zero row/column for the sentinel
        let mut cost = vec![vec![0i64; m + 1]; n + 1];
        let mut edge_at = vec![vec![None; problem.slots.len()]; n];
        for (e, edge) in problem.edges.iter().enumerate() {
            let cell = &mut cost[edge.band + 1][edge.slot + 1];
            let c = -i64::from(edge.weight);
            if c < *cell {
                *cell = c;
                edge_at[edge.band][edge.slot] = Some(e);
            }
        }

        let col_of_row = min_cost_assignment(&cost, n, m);

        let mut matching = Vec::new();
        for (band, col) in col_of_row.into_iter().enumerate() {
            if col < problem.slots.len() {
                if let Some(e) = edge_at[band][col] {
                    matching.push(e);
                }
            }
        }
        Ok(matching)
    }
}

/// Minimum cost assignment of `n` rows into `m >= n` columns. `cost` is
/// 1-based. Returns the 0-based column of each 0-based row.
fn min_cost_assignment(cost: &[Vec<i64>], n: usize, m: usize) -> Vec<usize> {
    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; m + 1];
    // p[j]: row matched to column j, way[j]: previous column on the path
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0;
        let mut minv = vec![INF; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = INF;
            let mut j1 = 0;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let cur = cost[i0][j] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut col_of_row = vec![0usize; n];
    for j in 1..=m {
        if p[j] != 0 {
            col_of_row[p[j] - 1] = j - 1;
        }
    }
    col_of_row
}
