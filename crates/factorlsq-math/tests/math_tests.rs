//! Integration tests for factorlsq-math.

use factorlsq_math::assembly::AugmentedMatrix;
use factorlsq_math::faer_solver::{FaerLdltSolver, FaerQrSolver};
use factorlsq_math::ordering::{self, OrderingPolicy, Permutation};
use factorlsq_math::sparse::{CscMatrix, SparseEntry, SparseSolver};
use factorlsq_types::LsqError;

fn entries(raw: &[(usize, usize, f64)]) -> Vec<SparseEntry> {
    raw.iter().copied().map(SparseEntry::from).collect()
}

/// A 6×3 overdetermined system with a banded pattern, plus rhs column 3.
fn banded_system() -> Vec<SparseEntry> {
    entries(&[
        (0, 0, 2.0),
        (0, 3, 1.0),
        (1, 0, -1.0),
        (1, 1, 3.0),
        (1, 3, 2.0),
        (2, 1, 1.0),
        (2, 2, -2.0),
        (2, 3, 0.5),
        (3, 2, 4.0),
        (3, 3, 3.0),
        (4, 0, 1.0),
        (4, 2, 1.0),
        (4, 3, -1.0),
        (5, 1, 2.0),
        (5, 3, 1.5),
    ])
}

fn assert_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() < tol, "component {i}: {x} vs {y}");
    }
}

/// Arrow pattern with the hub in column 0: row 0 is `e₀`, row `i` is
/// `e₀ + eᵢ`. Eliminating the hub first fills the whole factor; eliminating
/// it last adds no fill.
fn hub_first_arrow(n: usize) -> CscMatrix {
    let mut triplets = vec![(0, 0, 1.0)];
    for i in 1..n {
        triplets.push((i, 0, 1.0));
        triplets.push((i, i, 2.0));
    }
    CscMatrix::from_triplets(n, n, &triplets).unwrap()
}

fn hub_last(n: usize) -> Permutation {
    Permutation::from_forward((1..n).chain(std::iter::once(0)).collect()).unwrap()
}

// ─── CSC Tests ────────────────────────────────────────────────

#[test]
fn empty_csc() {
    let m = CscMatrix::new(3, 2);
    assert_eq!(m.nnz(), 0);
    assert_eq!((m.nrows(), m.ncols()), (3, 2));
    assert!(m.col_rows(1).is_empty());
}

#[test]
fn csc_from_triplets_sorts_rows() {
    let m = CscMatrix::from_triplets(3, 1, &[(2, 0, 3.0), (0, 0, 1.0), (1, 0, 2.0)]).unwrap();
    assert_eq!(m.col_rows(0), &[0, 1, 2]);
    assert_eq!(m.col_values(0), &[1.0, 2.0, 3.0]);
}

#[test]
fn csc_from_triplets_sums_duplicates() {
    let m = CscMatrix::from_triplets(2, 2, &[(1, 1, 2.0), (0, 0, 1.0), (1, 1, 0.5)]).unwrap();
    assert_eq!(m.nnz(), 2);
    assert_eq!(m.get(1, 1), 2.5);
}

#[test]
fn csc_out_of_range_rejected() {
    let err = CscMatrix::from_triplets(2, 2, &[(2, 0, 1.0)]).unwrap_err();
    assert!(matches!(err, LsqError::MalformedEntry { row: 2, col: 0, .. }));
}

#[test]
fn csc_transpose_and_gram() {
    // A = [[1, 2], [0, 3]]
    let a = CscMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0)]).unwrap();
    let at = a.transpose().unwrap();
    assert_eq!(at.get(1, 0), 2.0);
    assert_eq!(at.get(0, 1), 0.0);

    // AᵀA = [[1, 2], [2, 13]]
    let g = a.gram().unwrap();
    assert_eq!(g.to_dense(), vec![vec![1.0, 2.0], vec![2.0, 13.0]]);
}

#[test]
fn csc_mul_vec_dimension_checked() {
    let a = CscMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, 2.0)]).unwrap();
    assert_eq!(a.mul_vec(&[3.0, 4.0]).unwrap(), vec![3.0, 8.0]);
    assert!(matches!(
        a.mul_vec(&[1.0]),
        Err(LsqError::DimensionMismatch { expected: 2, actual: 1 })
    ));
}

// ─── Assembly Tests ───────────────────────────────────────────

#[test]
fn assembly_sums_duplicates() {
    let ab = AugmentedMatrix::assemble(&entries(&[(0, 0, 2.0), (0, 0, 3.0)])).unwrap();
    assert_eq!(ab.get(0, 0), 5.0);
    assert_eq!(ab.nnz(), 1);
}

#[test]
fn assembly_shape_from_max_indices() {
    let ab = AugmentedMatrix::assemble(&entries(&[(4, 1, 1.0), (0, 2, 1.0)])).unwrap();
    assert_eq!(ab.shape(), (5, 3));
    assert_eq!(ab.a_cols(), 2);
    assert_eq!(ab.a_rows(), 5);
}

#[test]
fn assembly_is_order_invariant() {
    let forward = banded_system();
    let mut reversed = forward.clone();
    reversed.reverse();
    let a = AugmentedMatrix::assemble(&forward).unwrap();
    let b = AugmentedMatrix::assemble(&reversed).unwrap();
    assert_eq!(a, b);
}

#[test]
fn assembly_empty_is_degenerate() {
    let ab = AugmentedMatrix::assemble(&[]).unwrap();
    assert_eq!(ab.shape(), (1, 1));
    assert_eq!(ab.nnz(), 0);
    assert!(ab.is_empty());
    assert!(matches!(ab.split(), Err(LsqError::EmptySystem)));
}

#[test]
fn assembly_rejects_non_finite() {
    let err = AugmentedMatrix::assemble(&entries(&[(0, 0, f64::NAN)])).unwrap_err();
    assert!(matches!(err, LsqError::MalformedEntry { .. }));
    let err = AugmentedMatrix::assemble(&entries(&[(0, 0, f64::INFINITY)])).unwrap_err();
    assert!(matches!(err, LsqError::MalformedEntry { .. }));
}

#[test]
fn assembly_rejects_index_overflow() {
    let err = AugmentedMatrix::assemble(&[SparseEntry::new(usize::MAX, 0, 1.0)]).unwrap_err();
    assert!(matches!(err, LsqError::MalformedEntry { row: usize::MAX, col: 0, .. }));
    let err = AugmentedMatrix::assemble(&[SparseEntry::new(0, usize::MAX - 1, 1.0)]).unwrap_err();
    assert!(matches!(err, LsqError::MalformedEntry { row: 0, .. }));
}

#[test]
fn assembly_split_single_variable() {
    // [1·x = 2], [1·x = 4]
    let ab = AugmentedMatrix::assemble(&entries(&[
        (0, 0, 1.0),
        (0, 1, 2.0),
        (1, 0, 1.0),
        (1, 1, 4.0),
    ]))
    .unwrap();
    let (a, b) = ab.split().unwrap();
    assert_eq!(a.to_dense(), vec![vec![1.0], vec![1.0]]);
    assert_eq!(b, vec![2.0, 4.0]);
    assert_eq!(a.gram().unwrap().to_dense(), vec![vec![2.0]]);
    assert_eq!(a.transpose_mul_vec(&b).unwrap(), vec![6.0]);
}

// ─── Ordering Tests ───────────────────────────────────────────

#[test]
fn policy_tokens_are_case_sensitive() {
    for policy in OrderingPolicy::ALL {
        assert_eq!(policy.as_str().parse::<OrderingPolicy>().unwrap(), policy);
    }
    assert!(matches!(
        "colamd".parse::<OrderingPolicy>(),
        Err(LsqError::UnsupportedOrdering(t)) if t == "colamd"
    ));
    assert!(matches!(
        ordering::resolve_token("BOGUS"),
        Err(LsqError::UnsupportedOrdering(_))
    ));
}

#[test]
fn default_policy_is_colamd() {
    assert_eq!(OrderingPolicy::default(), OrderingPolicy::Colamd);
}

#[test]
fn orderings_produce_valid_permutations() {
    let (a, _) = AugmentedMatrix::assemble(&banded_system()).unwrap().split().unwrap();
    for policy in OrderingPolicy::ALL {
        let algorithm = match ordering::resolve(policy) {
            Ok(algorithm) => algorithm,
            Err(LsqError::OrderingUnavailable(_)) => continue,
            Err(e) => panic!("{policy}: {e}"),
        };
        assert_eq!(algorithm.policy(), policy);
        let p = algorithm.column_permutation(&a).unwrap();
        assert_eq!(p.len(), a.ncols());
        let mut seen = p.fwd().to_vec();
        seen.sort_unstable();
        assert_eq!(seen, (0..a.ncols()).collect::<Vec<_>>(), "{policy}");
    }
}

#[test]
fn natural_ordering_is_identity() {
    let (a, _) = AugmentedMatrix::assemble(&banded_system()).unwrap().split().unwrap();
    let p = ordering::resolve(OrderingPolicy::Natural)
        .unwrap()
        .column_permutation(&a)
        .unwrap();
    assert!(p.is_identity());
}

#[cfg(not(feature = "metis"))]
#[test]
fn metis_unavailable_without_feature() {
    assert!(matches!(
        ordering::resolve(OrderingPolicy::Metis),
        Err(LsqError::OrderingUnavailable(_))
    ));
}

// ─── FaerLdltSolver Tests ─────────────────────────────────────

#[test]
fn ldlt_identity_solve() {
    let matrix = CscMatrix::from_triplets(3, 3, &[(0, 0, 1.0), (1, 1, 1.0), (2, 2, 1.0)]).unwrap();
    let mut solver = FaerLdltSolver::new();
    assert!(!solver.is_factorized());

    solver.factorize(&matrix, &Permutation::identity(3)).unwrap();
    assert!(solver.is_factorized());

    let rhs = [3.0, 7.0, -2.0];
    let sol = solver.solve(&rhs).unwrap();
    assert_close(&sol, &rhs, 1e-12);
}

#[test]
fn ldlt_spd_with_custom_ordering() {
    //   [4 1 0]       [1]
    //   [1 3 1] * x = [2]
    //   [0 1 2]       [3]
    let triplets = [
        (0, 0, 4.0),
        (0, 1, 1.0),
        (1, 0, 1.0),
        (1, 1, 3.0),
        (1, 2, 1.0),
        (2, 1, 1.0),
        (2, 2, 2.0),
    ];
    let matrix = CscMatrix::from_triplets(3, 3, &triplets).unwrap();
    let rhs = [1.0, 2.0, 3.0];

    let mut natural = FaerLdltSolver::new();
    natural.factorize(&matrix, &Permutation::identity(3)).unwrap();
    let x_nat = natural.solve(&rhs).unwrap();

    let mut reordered = FaerLdltSolver::new();
    reordered
        .factorize(&matrix, &Permutation::from_forward(vec![2, 0, 1]).unwrap())
        .unwrap();
    let x_perm = reordered.solve(&rhs).unwrap();

    let residual: Vec<f64> = matrix
        .mul_vec(&x_nat)
        .unwrap()
        .iter()
        .zip(&rhs)
        .map(|(ax, b)| ax - b)
        .collect();
    assert_close(&residual, &[0.0; 3], 1e-12);
    assert_close(&x_nat, &x_perm, 1e-12);
}

#[test]
fn ldlt_factorize_then_multi_solve() {
    let matrix = CscMatrix::from_triplets(3, 3, &[(0, 0, 2.0), (1, 1, 3.0), (2, 2, 5.0)]).unwrap();
    let mut solver = FaerLdltSolver::new();
    solver.factorize(&matrix, &Permutation::identity(3)).unwrap();

    assert_close(&solver.solve(&[4.0, 9.0, 25.0]).unwrap(), &[2.0, 3.0, 5.0], 1e-12);
    assert_close(&solver.solve(&[1.0, 1.0, 1.0]).unwrap(), &[0.5, 1.0 / 3.0, 0.2], 1e-12);
}

#[test]
fn ldlt_large_laplacian() {
    let n = 100;
    let mut triplets = Vec::new();
    for i in 0..n {
        triplets.push((i, i, 2.1));
        if i > 0 {
            triplets.push((i, i - 1, -1.0));
        }
        if i < n - 1 {
            triplets.push((i, i + 1, -1.0));
        }
    }
    let matrix = CscMatrix::from_triplets(n, n, &triplets).unwrap();
    let mut solver = FaerLdltSolver::new();
    solver.factorize(&matrix, &Permutation::identity(n)).unwrap();

    let rhs = vec![1.0; n];
    let sol = solver.solve(&rhs).unwrap();
    let ax = matrix.mul_vec(&sol).unwrap();
    let max_residual = ax
        .iter()
        .zip(&rhs)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f64, f64::max);
    assert!(max_residual < 1e-10, "max residual = {max_residual}");
}

#[test]
fn ldlt_singular_fails() {
    // Column 1 of A is empty, so AᵀA has a zero pivot.
    let a = CscMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 0, 1.0)]).unwrap();
    let n = a.gram().unwrap();
    let mut solver = FaerLdltSolver::new();
    let result = solver
        .factorize(&n, &Permutation::identity(2))
        .and_then(|_| solver.solve(&[1.0, 0.0]));
    assert!(matches!(
        result,
        Err(LsqError::Factorization(_) | LsqError::NonFiniteSolution { .. })
    ));
}

#[test]
fn ldlt_fill_follows_requested_ordering() {
    let n = 40;
    let gram = hub_first_arrow(n).gram().unwrap();

    let mut natural = FaerLdltSolver::new();
    natural.factorize(&gram, &Permutation::identity(n)).unwrap();
    let mut reordered = FaerLdltSolver::new();
    reordered.factorize(&gram, &hub_last(n)).unwrap();

    assert!(
        natural.factor_len() > reordered.factor_len(),
        "natural {} vs hub-last {}",
        natural.factor_len(),
        reordered.factor_len()
    );
    let rhs = vec![1.0; n];
    assert_close(&natural.solve(&rhs).unwrap(), &reordered.solve(&rhs).unwrap(), 1e-9);
}

#[test]
fn ldlt_solve_before_factorize_fails() {
    let solver = FaerLdltSolver::new();
    assert!(solver.solve(&[1.0; 3]).is_err());
}

#[test]
fn ldlt_non_square_fails() {
    let matrix = CscMatrix::from_triplets(2, 3, &[(0, 0, 1.0)]).unwrap();
    let mut solver = FaerLdltSolver::new();
    assert!(solver.factorize(&matrix, &Permutation::identity(3)).is_err());
}

#[test]
fn ldlt_empty_matrix_fails() {
    let mut solver = FaerLdltSolver::new();
    assert!(matches!(
        solver.factorize(&CscMatrix::new(0, 0), &Permutation::identity(0)),
        Err(LsqError::EmptySystem)
    ));
}

// ─── FaerQrSolver Tests ───────────────────────────────────────

#[test]
fn qr_single_variable_least_squares() {
    let a = CscMatrix::from_triplets(2, 1, &[(0, 0, 1.0), (1, 0, 1.0)]).unwrap();
    let mut solver = FaerQrSolver::new();
    solver.factorize(&a, &Permutation::identity(1)).unwrap();
    assert_close(&solver.solve(&[2.0, 4.0]).unwrap(), &[3.0], 1e-12);
}

#[test]
fn qr_matches_ldlt_on_normal_equations() {
    let (a, b) = AugmentedMatrix::assemble(&banded_system()).unwrap().split().unwrap();
    let n = a.ncols();
    let p = Permutation::from_forward(vec![1, 2, 0]).unwrap();

    let mut qr = FaerQrSolver::new();
    qr.factorize(&a, &p).unwrap();
    let x_qr = qr.solve(&b).unwrap();

    let mut ldlt = FaerLdltSolver::new();
    ldlt.factorize(&a.gram().unwrap(), &Permutation::identity(n)).unwrap();
    let x_chol = ldlt.solve(&a.transpose_mul_vec(&b).unwrap()).unwrap();

    assert_close(&x_qr, &x_chol, 1e-8);
}

#[test]
fn qr_eliminates_in_requested_order() {
    let n = 40;
    let a = hub_first_arrow(n);
    let b: Vec<f64> = (0..n).map(|i| i as f64 + 1.0).collect();

    let mut natural = FaerQrSolver::new();
    natural.factorize(&a, &Permutation::identity(n)).unwrap();
    assert!(natural.column_order().unwrap().is_identity());

    let order = hub_last(n);
    let mut reordered = FaerQrSolver::new();
    reordered.factorize(&a, &order).unwrap();
    assert_eq!(reordered.column_order(), Some(&order));

    // Hub first fills R completely; hub last leaves it at two entries per column
    assert!(
        natural.factor_len() > reordered.factor_len(),
        "natural {} vs hub-last {}",
        natural.factor_len(),
        reordered.factor_len()
    );
    assert_close(&natural.solve(&b).unwrap(), &reordered.solve(&b).unwrap(), 1e-9);
}

#[test]
fn qr_fill_reducing_orderings_beat_natural_on_arrow() {
    let n = 40;
    let a = hub_first_arrow(n);
    let mut natural = FaerQrSolver::new();
    natural.factorize(&a, &Permutation::identity(n)).unwrap();

    let amd = ordering::resolve(OrderingPolicy::Amd)
        .unwrap()
        .column_permutation(&a)
        .unwrap();
    let mut ordered = FaerQrSolver::new();
    ordered.factorize(&a, &amd).unwrap();
    assert!(ordered.factor_len() < natural.factor_len());
}

#[test]
fn qr_solve_before_factorize_fails() {
    let solver = FaerQrSolver::new();
    assert!(solver.column_order().is_none());
    assert_eq!(solver.factor_len(), 0);
    assert!(matches!(solver.solve(&[1.0]), Err(LsqError::Factorization(_))));
}

#[test]
fn qr_underdetermined_rejected() {
    let a = CscMatrix::from_triplets(1, 2, &[(0, 0, 1.0), (0, 1, 1.0)]).unwrap();
    let mut solver = FaerQrSolver::new();
    assert!(matches!(
        solver.factorize(&a, &Permutation::identity(2)),
        Err(LsqError::Underdetermined { rows: 1, cols: 2 })
    ));
}

#[test]
fn qr_rhs_length_checked() {
    let a = CscMatrix::from_triplets(2, 1, &[(0, 0, 1.0), (1, 0, 1.0)]).unwrap();
    let mut solver = FaerQrSolver::new();
    solver.factorize(&a, &Permutation::identity(1)).unwrap();
    assert!(matches!(
        solver.solve(&[1.0]),
        Err(LsqError::DimensionMismatch { expected: 2, actual: 1 })
    ));
}
