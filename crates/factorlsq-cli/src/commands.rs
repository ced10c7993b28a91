//! CLI command implementations.

use factorlsq_io::contract::{ProblemFile, SolutionFile};
use factorlsq_io::validator::{validate_config, validate_problem};
use factorlsq_solver::graph::LinearSystem;
use factorlsq_solver::{solve_with_telemetry, SolveMethod, SolverConfig};
use factorlsq_telemetry::{EventBus, EventKind, TracingSink, VecSink};

/// Arguments of `factorlsq solve`.
pub struct SolveArgs<'a> {
    pub problem: &'a str,
    pub method: Option<&'a str>,
    pub ordering: Option<&'a str>,
    pub config: Option<&'a str>,
    pub output: Option<&'a str>,
    pub events: bool,
}

/// Resolves settings: defaults, then the problem file, then `--config`,
/// then individual flags.
fn resolve_config(args: &SolveArgs<'_>, problem: &ProblemFile) -> Result<SolverConfig, Box<dyn std::error::Error>> {
    let mut config = problem.solver.clone().unwrap_or_default();
    if let Some(path) = args.config {
        config.overlay_toml_file(path)?;
    }
    if let Some(method) = args.method {
        config.method = method.parse::<SolveMethod>()?;
    }
    if let Some(token) = args.ordering {
        config.ordering = token.parse()?;
    }
    validate_config(&config)?;
    Ok(config)
}

/// Solve a problem file.
pub fn solve(args: &SolveArgs<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let problem = ProblemFile::from_json_file(args.problem)?;
    validate_problem(&problem)?;
    let config = resolve_config(args, &problem)?;
    let graph = problem.to_graph()?;

    let mut bus = EventBus::new();
    let sink = VecSink::new();
    bus.add_sink(Box::new(sink.clone()));
    bus.add_sink(Box::new(TracingSink::new(tracing::Level::DEBUG)));

    let result = solve_with_telemetry(&graph, &config, &bus);
    bus.finalize();

    if args.events {
        eprintln!("Solve events");
        eprintln!("────────────");
        for event in sink.events() {
            eprintln!("  [{}] {}", event.sequence, describe(&event.kind));
        }
        eprintln!();
    }

    let solution = SolutionFile::from(result?);
    match args.output {
        Some(path) => {
            solution.write_json_file(path)?;
            eprintln!(
                "Solved {} variables ({} / {}), written to: {path}",
                solution.values.len(),
                config.method,
                config.ordering
            );
        }
        None => println!("{}", solution.to_json_string()?),
    }
    Ok(())
}

fn describe(kind: &EventKind) -> String {
    match kind {
        EventKind::Assembled { rows, cols, nnz, elapsed } => {
            format!("assembled {rows}×{cols} [A|b], nnz {nnz} ({:.3}ms)", elapsed * 1e3)
        }
        EventKind::OrderingComputed { policy, elapsed } => {
            format!("ordering {policy} ({:.3}ms)", elapsed * 1e3)
        }
        EventKind::Factorized {
            method,
            factor_nnz,
            elapsed,
        } => {
            format!("factorized by {method}, factor nnz {factor_nnz} ({:.3}ms)", elapsed * 1e3)
        }
        EventKind::Solved {
            unknowns,
            residual_norm,
            elapsed,
        } => match residual_norm {
            Some(r) => format!("solved {unknowns} unknowns, ‖Ax−b‖ = {r:.6e} ({:.3}ms)", elapsed * 1e3),
            None => format!("solved {unknowns} unknowns ({:.3}ms)", elapsed * 1e3),
        },
        EventKind::Failed { phase, message } => format!("FAILED in {phase}: {message}"),
        EventKind::Custom { label, payload } => format!("{label}: {payload}"),
    }
}

/// Inspect a problem file.
pub fn inspect(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("factorlsq Problem Inspector");
    println!("───────────────────────────");
    println!();

    let problem = ProblemFile::from_json_file(path)?;
    validate_problem(&problem)?;
    let graph = problem.to_graph()?;
    let ab = graph.augmented_matrix()?;
    let dims = graph.key_dim_map();

    let (rows, cols) = ab.shape();
    println!("Factors:      {}", graph.len());
    println!("Variables:    {}", dims.len());
    println!("[A|b] shape:  {rows} × {cols}");
    println!("A shape:      {} × {}", ab.a_rows(), ab.a_cols());
    println!("nnz [A|b]:    {}", ab.nnz());
    if ab.a_rows() > 0 && ab.a_cols() > 0 {
        let density = ab.nnz() as f64 / (rows * cols) as f64;
        println!("Density:      {:.2}%", density * 100.0);
    }
    if ab.a_rows() < ab.a_cols() {
        println!("Note:         underdetermined; QR will refuse this system");
    }
    if let Some(config) = &problem.solver {
        println!("Solver:       {} / {}", config.method, config.ordering);
    }

    println!();
    println!("Key          Dim   Offset");
    let offsets = dims.offsets();
    for (key, dim) in dims.iter() {
        let offset = offsets.get(&key).copied().unwrap_or_default();
        println!("{:<12} {dim:<5} {offset}", key.raw());
    }
    Ok(())
}

/// Validate a solver config or problem file.
pub fn validate(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("factorlsq Validator");
    println!("───────────────────");
    println!();

    if path.ends_with(".toml") {
        println!("Validating config: {path}");
        let config = SolverConfig::from_toml_file(path)?;
        match validate_config(&config) {
            Ok(()) => println!("✅ Config is valid ({} / {}).", config.method, config.ordering),
            Err(e) => println!("❌ Config validation failed: {e}"),
        }
    } else if path.ends_with(".json") {
        println!("Validating problem: {path}");
        let problem = ProblemFile::from_json_file(path)?;
        match validate_problem(&problem) {
            Ok(()) => {
                let rows: usize = problem.factors.iter().map(|f| f.rhs.len()).sum();
                println!("✅ Problem is valid ({} factors, {rows} rows).", problem.factors.len());
            }
            Err(e) => println!("❌ Problem validation failed: {e}"),
        }
    } else {
        println!("Unsupported file format. Use .toml (config) or .json (problem).");
    }

    Ok(())
}
