//! Rectangular linear assignment (Hungarian method, shortest augmenting
//! path form). Used when a pool is too large to enumerate.

/// Finite stand-in for weights that are not numbers, so the augmenting loop
/// always finds a column.
const PENALTY: f64 = 1e18;

/// Assigns every row of `weights` to a distinct column, maximising the sum of
/// chosen weights. Requires `rows <= cols`; returns the column per row.
pub fn maximize(weights: &[Vec<f64>]) -> Vec<usize> {
    let rows = weights.len();
    if rows == 0 {
        return Vec::new();
    }
    let cols = weights[0].len();
    assert!(rows <= cols, "assignment needs at least as many columns as rows");

    let cost = |i: usize, j: usize| -> f64 {
        let w = weights[i][j];
        if w.is_finite() {
            -w
        } else {
            PENALTY
        }
    };

    // 1-based potentials; column 0 is the virtual source.
    let mut u = vec![0.0; rows + 1];
    let mut v = vec![0.0; cols + 1];
    let mut owner = vec![0usize; cols + 1];
    let mut way = vec![0usize; cols + 1];

    for i in 1..=rows {
        owner[0] = i;
        let mut j0 = 0;
        let mut min_v = vec![f64::INFINITY; cols + 1];
        let mut used = vec![false; cols + 1];

        loop {
            used[j0] = true;
            let i0 = owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;

            for j in 1..=cols {
                if used[j] {
                    continue;
                }
                let reduced = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if reduced < min_v[j] {
                    min_v[j] = reduced;
                    way[j] = j0;
                }
                if min_v[j] < delta {
                    delta = min_v[j];
                    j1 = j;
                }
            }

            for j in 0..=cols {
                if used[j] {
                    u[owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_v[j] -= delta;
                }
            }

            j0 = j1;
            if owner[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            owner[j0] = owner[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; rows];
    for j in 1..=cols {
        if owner[j] != 0 {
            assignment[owner[j] - 1] = j - 1;
        }
    }
    assignment
}
