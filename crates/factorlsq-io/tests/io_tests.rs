//! Integration tests for factorlsq-io.

use factorlsq_io::contract::{BlockSpec, FactorSpec, ProblemFile, SolutionFile};
use factorlsq_io::validator::validate_problem;
use factorlsq_math::ordering::OrderingPolicy;
use factorlsq_solver::{solve, SolveMethod, SolverConfig};
use factorlsq_types::{Key, LsqError};

const TWO_MEASUREMENTS: &str = r#"{
  "factors": [
    { "blocks": [{ "key": 0, "rows": [[1.0]] }], "rhs": [2.0] },
    { "blocks": [{ "key": 0, "rows": [[1.0]] }], "rhs": [4.0] }
  ]
}"#;

fn block(key: u64, rows: Vec<Vec<f64>>) -> BlockSpec {
    BlockSpec { key: Key(key), rows }
}

fn make_valid_problem() -> ProblemFile {
    ProblemFile {
        factors: vec![
            FactorSpec {
                blocks: vec![block(1, vec![vec![1.0, 0.0], vec![0.0, 1.0]])],
                rhs: vec![0.0, 0.0],
            },
            FactorSpec {
                blocks: vec![
                    block(1, vec![vec![-1.0, 0.0], vec![0.0, -1.0]]),
                    block(2, vec![vec![1.0, 0.0], vec![0.0, 1.0]]),
                ],
                rhs: vec![1.0, 2.0],
            },
        ],
        solver: None,
    }
}

// ─── Contract Tests ───────────────────────────────────────────

#[test]
fn parse_problem_json() {
    let problem = ProblemFile::from_json_str(TWO_MEASUREMENTS).unwrap();
    assert_eq!(problem.factors.len(), 2);
    assert_eq!(problem.factors[1].rhs, vec![4.0]);
    assert!(problem.solver.is_none());
}

#[test]
fn problem_with_embedded_solver_settings() {
    let json = r#"{
      "factors": [{ "blocks": [{ "key": 3, "rows": [[2.0]] }], "rhs": [4.0] }],
      "solver": { "method": "qr", "ordering": "AMD" }
    }"#;
    let problem = ProblemFile::from_json_str(json).unwrap();
    let solver = problem.solver.unwrap();
    assert_eq!(solver.method, SolveMethod::Qr);
    assert_eq!(solver.ordering, OrderingPolicy::Amd);
    assert!(solver.compute_residual);
}

#[test]
fn malformed_json_is_serialization_error() {
    assert!(matches!(
        ProblemFile::from_json_str("{ \"factors\": 3 }"),
        Err(LsqError::Serialization(_))
    ));
}

#[test]
fn problem_to_graph_and_back() {
    let problem = make_valid_problem();
    let graph = problem.to_graph().unwrap();
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.rows(), 4);
    assert_eq!(ProblemFile::from(&graph), problem);
}

#[test]
fn to_graph_reports_factor_index() {
    let mut problem = make_valid_problem();
    problem.factors[1].rhs.pop();
    match problem.to_graph() {
        Err(LsqError::InvalidProblem(msg)) => assert!(msg.starts_with("factor 1"), "{msg}"),
        other => panic!("expected InvalidProblem, got {other:?}"),
    }
}

#[test]
fn solution_file_from_report() {
    let graph = ProblemFile::from_json_str(TWO_MEASUREMENTS).unwrap().to_graph().unwrap();
    let report = solve(&graph, &SolverConfig::robust()).unwrap();
    let solution = SolutionFile::from(report);

    assert_eq!(solution.diagnostics.method, SolveMethod::Qr);
    assert_eq!(solution.diagnostics.rows, 2);
    assert_eq!(solution.diagnostics.cols, 1);
    assert!(solution.diagnostics.factor_nnz > 0);
    assert!((solution.values.get(Key(0)).unwrap()[0] - 3.0).abs() < 1e-12);

    let json = solution.to_json_string().unwrap();
    assert!(json.contains("\"0\""));
    let recovered = SolutionFile::from_json_str(&json).unwrap();
    assert_eq!(recovered, solution);
}

// ─── Validator Tests ──────────────────────────────────────────

#[test]
fn valid_problem_passes() {
    assert!(validate_problem(&make_valid_problem()).is_ok());
    assert!(validate_problem(&ProblemFile::from_json_str(TWO_MEASUREMENTS).unwrap()).is_ok());
}

#[test]
fn row_count_mismatch_rejected() {
    let mut problem = make_valid_problem();
    problem.factors[0].rhs = vec![0.0];
    assert!(matches!(validate_problem(&problem), Err(LsqError::InvalidProblem(_))));
}

#[test]
fn ragged_block_rejected() {
    let mut problem = make_valid_problem();
    problem.factors[0].blocks[0].rows[1] = vec![0.0];
    assert!(validate_problem(&problem).is_err());
}

#[test]
fn non_finite_values_rejected() {
    let mut problem = make_valid_problem();
    problem.factors[1].rhs[0] = f64::NAN;
    assert!(validate_problem(&problem).is_err());

    let mut problem = make_valid_problem();
    problem.factors[0].blocks[0].rows[0][0] = f64::INFINITY;
    assert!(validate_problem(&problem).is_err());
}

#[test]
fn inconsistent_dimension_rejected() {
    let mut problem = make_valid_problem();
    problem.factors.push(FactorSpec {
        blocks: vec![block(2, vec![vec![1.0, 0.0, 0.0]])],
        rhs: vec![1.0],
    });
    match validate_problem(&problem) {
        Err(LsqError::InvalidProblem(msg)) => assert!(msg.contains("factor 2"), "{msg}"),
        other => panic!("expected InvalidProblem, got {other:?}"),
    }
}

#[test]
fn duplicate_key_in_factor_rejected() {
    let mut problem = make_valid_problem();
    problem.factors[0].blocks.push(block(1, vec![vec![1.0, 0.0], vec![0.0, 1.0]]));
    assert!(validate_problem(&problem).is_err());
}

#[test]
fn empty_factor_rejected() {
    let mut problem = make_valid_problem();
    problem.factors[0].blocks.clear();
    assert!(validate_problem(&problem).is_err());
}

#[test]
fn embedded_metis_follows_build() {
    let mut problem = make_valid_problem();
    problem.solver = Some(SolverConfig {
        ordering: OrderingPolicy::Metis,
        ..SolverConfig::default()
    });
    assert_eq!(validate_problem(&problem).is_ok(), cfg!(feature = "metis"));
}
