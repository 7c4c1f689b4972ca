//! `good_lp` backend.
//!
//! Translates an [`LpProblem`] into a `good_lp` model and solves it with the
//! selected solver. Clarabel is compiled in by default; HiGHS is behind the
//! `solver-highs` feature.

use std::time::Instant;

use good_lp::{
    Constraint as GlpConstraint, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable as GlpVariable, constraint, variable,
};
use tracing::{debug, info, warn};

use crate::error::{LpError, LpResult};
use crate::problem::{LpProblem, Sense};
use crate::solve::{LpSolver, SolveOptions, SolveOutcome, SolveStatus, SolverChoice};

#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl GoodLpSolver {
    pub fn new() -> Self {
        Self
    }
}

struct Translated {
    vars: ProblemVariables,
    handles: Vec<GlpVariable>,
    objective: Expression,
    rows: Vec<GlpConstraint>,
}

fn translate(problem: &LpProblem) -> Translated {
    let mut vars = ProblemVariables::new();
    let mut handles = Vec::with_capacity(problem.num_vars());
    let mut rows = Vec::with_capacity(problem.num_constraints());

    for v in problem.variables() {
        if v.is_pinned() {
            let handle = vars.add(variable());
            rows.push(constraint!(handle == v.lower));
            handles.push(handle);
            continue;
        }
        let mut def = variable();
        if v.lower.is_finite() {
            def = def.min(v.lower);
        }
        if v.upper.is_finite() {
            def = def.max(v.upper);
        }
        handles.push(vars.add(def));
    }

    let objective = problem
        .objective()
        .iter()
        .zip(&handles)
        .filter(|(c, _)| **c != 0.0)
        .fold(Expression::from(0.0), |acc, (c, h)| acc + *c * *h);

    for row in problem.constraints() {
        let lhs = row
            .terms
            .iter()
            .fold(Expression::from(0.0), |acc, (v, c)| acc + *c * handles[v.idx()]);
        let rhs = row.rhs;
        rows.push(match row.sense {
            Sense::Le => constraint!(lhs <= rhs),
            Sense::Ge => constraint!(lhs >= rhs),
            Sense::Eq => constraint!(lhs == rhs),
        });
    }

    Translated {
        vars,
        handles,
        objective,
        rows,
    }
}

fn with_rows<M: SolverModel>(mut model: M, rows: Vec<GlpConstraint>) -> M {
    for row in rows {
        model = model.with(row);
    }
    model
}

#[cfg(feature = "solver-highs")]
fn run<M>(
    model: M,
    rows: Vec<GlpConstraint>,
    handles: &[GlpVariable],
) -> Result<Vec<f64>, ResolutionError>
where
    M: SolverModel<Error = ResolutionError>,
{
    let solution = with_rows(model, rows).solve()?;
    Ok(handles.iter().map(|h| solution.value(*h)).collect())
}

#[cfg(feature = "solver-clarabel")]
fn apply_clarabel_settings(
    settings: &mut clarabel::solver::DefaultSettingsBuilder<f64>,
    options: &SolveOptions,
) {
    settings.verbose(options.verbose);
    if let Some(limit) = options.time_limit_s {
        settings.time_limit(limit);
    }
}

/// good_lp hands back dual-infeasible clarabel runs as solutions; those are
/// unbounded primals and carry no meaningful values.
#[cfg(feature = "solver-clarabel")]
fn solve_clarabel(t: Translated, options: &SolveOptions) -> Result<Vec<f64>, ResolutionError> {
    use ::clarabel::solver::SolverStatus;
    use good_lp::solvers::clarabel::clarabel;

    let mut model = t.vars.minimise(t.objective).using(clarabel);
    apply_clarabel_settings(model.settings(), options);
    let solution = with_rows(model, t.rows).solve()?;
    match solution.inner().status {
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            Err(ResolutionError::Unbounded)
        }
        _ => Ok(t.handles.iter().map(|h| solution.value(*h)).collect()),
    }
}

#[cfg(feature = "solver-highs")]
fn solve_highs(t: Translated, options: &SolveOptions) -> Result<Vec<f64>, ResolutionError> {
    use good_lp::solvers::highs::highs;

    let mut model = t
        .vars
        .minimise(t.objective)
        .using(highs)
        .set_verbose(options.verbose);
    if let Some(limit) = options.time_limit_s {
        model = model.set_time_limit(limit);
    }
    run(model, t.rows, &t.handles)
}

#[allow(unused_variables)]
fn dispatch(
    choice: SolverChoice,
    t: Translated,
    options: &SolveOptions,
) -> LpResult<Result<Vec<f64>, ResolutionError>> {
    match choice {
        #[cfg(feature = "solver-clarabel")]
        SolverChoice::Clarabel => Ok(solve_clarabel(t, options)),
        #[cfg(feature = "solver-highs")]
        SolverChoice::Highs => Ok(solve_highs(t, options)),
        #[allow(unreachable_patterns)]
        other => Err(LpError::SolverUnavailable {
            solver: other.to_string(),
        }),
    }
}

fn is_time_limit(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("time limit") || message.contains("maxtime") || message.contains("timeout")
}

/// Map a resolution failure to a status, or to an error for real failures.
fn classify(err: ResolutionError) -> LpResult<SolveStatus> {
    match err {
        ResolutionError::Infeasible => Ok(SolveStatus::Infeasible),
        ResolutionError::Unbounded => Ok(SolveStatus::Unbounded),
        ResolutionError::Other(msg) if is_time_limit(msg) => Ok(SolveStatus::TimedOut),
        ResolutionError::Str(msg) if is_time_limit(&msg) => Ok(SolveStatus::TimedOut),
        other => Err(LpError::Backend(other.to_string())),
    }
}

impl LpSolver for GoodLpSolver {
    fn name(&self, options: &SolveOptions) -> String {
        format!("good_lp/{}", options.solver)
    }

    fn solve(&self, problem: &LpProblem, options: &SolveOptions) -> LpResult<SolveOutcome> {
        let solver = self.name(options);
        if !options.solver.is_available() {
            return Err(LpError::SolverUnavailable {
                solver: options.solver.to_string(),
            });
        }
        if problem.num_vars() == 0 {
            debug!("empty problem is trivially optimal");
            return Ok(SolveOutcome {
                status: SolveStatus::Optimal,
                values: Vec::new(),
                objective: Some(0.0),
                solve_time_s: 0.0,
                solver,
            });
        }

        let stats = problem.stats();
        info!(
            solver = %solver,
            variables = stats.variables,
            constraints = stats.constraints,
            nonzeros = stats.nonzeros,
            "Solving LP"
        );

        let start = Instant::now();
        let result = dispatch(options.solver, translate(problem), options)?;
        let solve_time_s = start.elapsed().as_secs_f64();

        match result {
            Ok(values) => {
                let objective = problem.objective_value(&values);
                info!(objective, solve_time_s, "LP solved to optimality");
                Ok(SolveOutcome {
                    status: SolveStatus::Optimal,
                    values,
                    objective: Some(objective),
                    solve_time_s,
                    solver,
                })
            }
            Err(err) => {
                let status = classify(err)?;
                warn!(%status, solve_time_s, "LP has no optimal solution");
                Ok(SolveOutcome::without_solution(status, solver, solve_time_s))
            }
        }
    }
}
