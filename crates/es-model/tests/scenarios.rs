//! End-to-end compile and solve scenarios.

use es_core::{Tolerances, nearly_equal};
use es_graph::{FlowSpec, Graph, GraphBuilder, Investment, Profile, StorageParams, TimeHorizon};
use es_model::{CompileOptions, Model, ModelError, SolvedModel};
use es_solver::{
    GoodLpSolver, LpProblem, LpResult, LpSolver, SolveOptions, SolveOutcome, SolveStatus,
    parse_lp,
};

const TOL: f64 = 1e-5;

fn close(a: f64, b: f64) -> bool {
    nearly_equal(a, b, Tolerances::solver())
}

fn solve(graph: &Graph, options: &CompileOptions, check: impl FnOnce(&SolvedModel<'_>)) {
    let model = Model::compile(graph, options).unwrap();
    let solved = model
        .solve(&GoodLpSolver::new(), &SolveOptions::default())
        .unwrap();
    check(&solved);
}

fn single_bus() -> Graph {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source("source", vec![(el, FlowSpec::new().nominal_value(3.0))])
        .unwrap();
    b.add_sink(
        "demand",
        vec![(el, FlowSpec::new().nominal_value(1.0).fixed(Profile::Constant(2.11)))],
    )
    .unwrap();
    b.build(TimeHorizon::uniform(1)).unwrap()
}

#[test]
fn single_bus_meets_fixed_demand() {
    let graph = single_bus();
    solve(&graph, &CompileOptions::default(), |solved| {
        assert_eq!(solved.status(), SolveStatus::Optimal);
        let source = solved.values_for("source").unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(source[0].label(), "source->el");
        assert!(close(source[0].values[0].1, 2.11));
        assert_eq!(source[0].values[0].0, 0);
        assert!(close(solved.objective().unwrap(), 0.0));
    });
}

#[test]
fn lossy_converter_scales_upstream_flow() {
    let mut b = GraphBuilder::new();
    let up = b.add_bus("up").unwrap();
    let down = b.add_bus("down").unwrap();
    b.add_source("supply", vec![(up, FlowSpec::new().variable_cost(1.0))])
        .unwrap();
    b.add_converter(
        "line",
        vec![(up, FlowSpec::new())],
        vec![(down, FlowSpec::new())],
        vec![(up, 1.0), (down, 0.9)],
    )
    .unwrap();
    b.add_sink(
        "demand",
        vec![(down, FlowSpec::new().nominal_value(1.0).fixed(10.0))],
    )
    .unwrap();
    let graph = b.build(TimeHorizon::uniform(1)).unwrap();

    solve(&graph, &CompileOptions::default(), |solved| {
        let supply = solved.values_for("supply").unwrap();
        assert!(close(supply[0].values[0].1, 10.0 / 0.9));
        assert!(close(solved.objective().unwrap(), 10.0 / 0.9));
    });
}

#[test]
fn flow_without_capacity_is_unbounded_above() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source("grid", vec![(el, FlowSpec::new())]).unwrap();
    b.add_sink("excess", vec![(el, FlowSpec::new())]).unwrap();
    let graph = b.build(TimeHorizon::uniform(2)).unwrap();

    let model = Model::compile(&graph, &CompileOptions::default()).unwrap();
    let grid = graph.flows_of("grid").unwrap()[0];
    for t in 0..2 {
        let var = model.problem().variable(model.vars().flow(grid, t)).unwrap();
        assert_eq!(var.lower, 0.0);
        assert_eq!(var.upper, f64::INFINITY);
    }
}

#[test]
fn investment_never_exceeds_maximum() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source(
        "pv",
        vec![(
            el,
            FlowSpec::new().investment(Investment::new(1.0).maximum(5.0).existing(2.0)),
        )],
    )
    .unwrap();
    b.add_source("backup", vec![(el, FlowSpec::new().variable_cost(100.0))])
        .unwrap();
    b.add_sink(
        "demand",
        vec![(el, FlowSpec::new().nominal_value(1.0).fixed(10.0))],
    )
    .unwrap();
    let graph = b.build(TimeHorizon::uniform(1)).unwrap();

    solve(&graph, &CompileOptions::default(), |solved| {
        let invest = solved.invested_capacity("pv").unwrap();
        assert_eq!(invest.len(), 1);
        assert_eq!(invest[0].owner, "pv->el");
        assert!(invest[0].added <= 5.0 + TOL);
        assert!(close(invest[0].added, 5.0));
        assert!(close(invest[0].total(), 7.0));

        let pv = solved.values_for("pv").unwrap();
        assert!(pv[0].values[0].1 <= invest[0].total() + TOL);
        let backup = solved.values_for("backup").unwrap();
        assert!(close(backup[0].values[0].1, 3.0));
        assert!(close(solved.objective().unwrap(), 5.0 + 300.0));
    });
}

#[test]
fn invalid_investment_bounds_fail_compile() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source(
        "pv",
        vec![(el, FlowSpec::new().investment(Investment::new(1.0).maximum(-1.0)))],
    )
    .unwrap();
    let graph = b.build(TimeHorizon::uniform(1)).unwrap();
    let err = Model::compile(&graph, &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::InvalidInvestmentBounds { ref owner, .. } if owner == "pv->el"));
}

fn storage_system() -> Graph {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source(
        "cheap",
        vec![(
            el,
            FlowSpec::new()
                .nominal_value(10.0)
                .max_profile(vec![1.0, 1.0, 1.0, 0.0])
                .variable_cost(1.0),
        )],
    )
    .unwrap();
    b.add_source("expensive", vec![(el, FlowSpec::new().variable_cost(100.0))])
        .unwrap();
    b.add_sink(
        "demand",
        vec![(el, FlowSpec::new().nominal_value(1.0).fixed(vec![2.0, 2.0, 2.0, 5.0]))],
    )
    .unwrap();
    b.add_storage(
        "battery",
        (el, FlowSpec::new()),
        (el, FlowSpec::new()),
        StorageParams::with_capacity(8.0)
            .initial_level(1.0)
            .loss_rate(0.05)
            .efficiencies(0.9, 0.9),
    )
    .unwrap();
    b.build(TimeHorizon::uniform(4)).unwrap()
}

#[test]
fn storage_level_follows_recurrence() {
    let graph = storage_system();
    solve(&graph, &CompileOptions::default(), |solved| {
        assert_eq!(solved.status(), SolveStatus::Optimal);
        let level = solved.storage_levels("battery").unwrap();
        let flows = solved.values_for("battery").unwrap();
        assert_eq!(flows[0].label(), "el->battery");
        assert_eq!(flows[1].label(), "battery->el");
        let charge: Vec<f64> = flows[0].values.iter().map(|(_, v)| *v).collect();
        let discharge: Vec<f64> = flows[1].values.iter().map(|(_, v)| *v).collect();

        assert!(close(level[0], 1.0));
        for t in 1..4 {
            let expected = level[t - 1] * 0.95 + charge[t] * 0.9 - discharge[t] / 0.9;
            assert!(close(level[t], expected), "t={t}: {} vs {expected}", level[t]);
            assert!(level[t] >= -TOL && level[t] <= 8.0 + TOL);
        }
        // The storage bridges the step without cheap supply.
        assert!(discharge[3] > 1.0);
    });
}

#[test]
fn buses_balance_and_fixed_flows_are_exact() {
    let graph = storage_system();
    solve(&graph, &CompileOptions::default(), |solved| {
        let el = solved.values_for("el").unwrap();
        let bus = graph.labels().bus("el").unwrap();
        let inflows = graph.bus_flows(bus).inflows.len();
        for t in 0..4 {
            let supply: f64 = el[..inflows].iter().map(|s| s.values[t].1).sum();
            let use_: f64 = el[inflows..].iter().map(|s| s.values[t].1).sum();
            assert!(close(supply, use_), "t={t}: {supply} != {use_}");
        }

        let demand = solved.values_for("demand").unwrap();
        for (t, expected) in [2.0, 2.0, 2.0, 5.0].into_iter().enumerate() {
            assert!(close(demand[0].values[t].1, expected));
        }
    });
}

#[test]
fn balanced_storage_returns_to_initial_level() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source(
        "pv",
        vec![(el, FlowSpec::new().nominal_value(6.0).max_profile(vec![0.0, 1.0, 0.0]))],
    )
    .unwrap();
    b.add_sink(
        "demand",
        vec![(el, FlowSpec::new().nominal_value(1.0).fixed(vec![0.0, 1.0, 1.0]))],
    )
    .unwrap();
    b.add_sink("excess", vec![(el, FlowSpec::new())]).unwrap();
    b.add_storage(
        "tank",
        (el, FlowSpec::new()),
        (el, FlowSpec::new()),
        StorageParams::with_capacity(10.0).initial_level(2.0).balanced(true),
    )
    .unwrap();
    let graph = b.build(TimeHorizon::uniform(3)).unwrap();

    solve(&graph, &CompileOptions::default(), |solved| {
        let level = solved.storage_levels("tank").unwrap();
        assert!(close(level[0], 2.0));
        assert!(close(level[2], 2.0));
    });
}

#[test]
fn weighting_scales_variable_costs() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source("grid", vec![(el, FlowSpec::new().variable_cost(2.0))])
        .unwrap();
    b.add_sink(
        "demand",
        vec![(el, FlowSpec::new().nominal_value(1.0).fixed(vec![1.0, 2.0]))],
    )
    .unwrap();
    let graph = b.build(TimeHorizon::uniform(2)).unwrap();

    solve(&graph, &CompileOptions::default(), |solved| {
        assert!(close(solved.objective().unwrap(), 6.0));
    });
    solve(&graph, &CompileOptions::with_weighting(vec![1.0, 3.0]), |solved| {
        assert!(close(solved.objective().unwrap(), 14.0));
    });

    let err = Model::compile(&graph, &CompileOptions::with_weighting(vec![1.0])).unwrap_err();
    assert!(matches!(err, ModelError::WeightingLength { expected: 2, actual: 1 }));
    let err = Model::compile(&graph, &CompileOptions::with_weighting(vec![1.0, f64::NAN]))
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidWeighting { timestep: 1, .. }));
}

#[test]
fn negative_cost_without_capacity_is_unbounded() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source("grid", vec![(el, FlowSpec::new())]).unwrap();
    b.add_sink("export", vec![(el, FlowSpec::new().variable_cost(-5.0))])
        .unwrap();
    let graph = b.build(TimeHorizon::uniform(1)).unwrap();

    solve(&graph, &CompileOptions::default(), |solved| {
        assert_eq!(solved.status(), SolveStatus::Unbounded);
        assert!(solved.objective().is_none());
        assert!(matches!(
            solved.values_for("export"),
            Err(ModelError::NoSolution { status: SolveStatus::Unbounded })
        ));
    });
}

#[test]
fn infeasible_system_reports_status() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source("small", vec![(el, FlowSpec::new().nominal_value(3.0))])
        .unwrap();
    b.add_sink(
        "demand",
        vec![(el, FlowSpec::new().nominal_value(1.0).fixed(5.0))],
    )
    .unwrap();
    let graph = b.build(TimeHorizon::uniform(1)).unwrap();

    solve(&graph, &CompileOptions::default(), |solved| {
        assert_eq!(solved.status(), SolveStatus::Infeasible);
        assert!(solved.objective().is_none());
        assert!(matches!(
            solved.values_for("small"),
            Err(ModelError::NoSolution { status: SolveStatus::Infeasible })
        ));
        assert_eq!(solved.meta().status, SolveStatus::Infeasible);
    });
}

struct Fixed(f64);

impl LpSolver for Fixed {
    fn name(&self, _: &SolveOptions) -> String {
        "fixed".to_string()
    }

    fn solve(&self, problem: &LpProblem, _: &SolveOptions) -> LpResult<SolveOutcome> {
        let values = vec![self.0; problem.num_vars()];
        Ok(SolveOutcome {
            status: SolveStatus::Optimal,
            objective: Some(problem.objective_value(&values)),
            values,
            solve_time_s: 0.0,
            solver: self.name(&SolveOptions::default()),
        })
    }
}

#[test]
fn extraction_reads_solver_values_by_label() {
    let graph = storage_system();
    let model = Model::compile(&graph, &CompileOptions::default()).unwrap();
    let solved = model.solve(&Fixed(0.5), &SolveOptions::default()).unwrap();

    let el = solved.values_for("el").unwrap();
    assert_eq!(el.len(), 5);
    assert!(el.iter().all(|s| s.values.len() == 4));
    assert!(el.iter().flat_map(|s| &s.values).all(|(_, v)| *v == 0.5));
    assert_eq!(solved.storage_levels("battery").unwrap(), vec![0.5; 4]);
    assert!(matches!(
        solved.storage_levels("demand"),
        Err(ModelError::NotAStorage { .. })
    ));
    assert!(solved.values_for("nowhere").is_err());

    let meta = solved.meta();
    assert_eq!(meta.solver, "fixed");
    assert_eq!(meta.stats.timesteps, 4);
    assert_eq!(meta.stats.storages, 1);
    assert_eq!(meta.stats.variables, model.problem().num_vars());
}

#[test]
fn exported_lp_parses_back() {
    let graph = storage_system();
    let model = Model::compile(&graph, &CompileOptions::default()).unwrap();
    let text = model.lp_string();
    assert!(text.contains("balance(el,0):"));
    assert!(text.contains("storage_balance(battery,1):"));

    let parsed = parse_lp(&text).unwrap();
    assert_eq!(parsed.num_vars(), model.problem().num_vars());
    assert_eq!(parsed.num_constraints(), model.problem().num_constraints());
    assert_eq!(parsed.objective(), model.problem().objective());
}

#[test]
fn bus_without_flows_is_skipped() {
    let mut b = GraphBuilder::new();
    b.add_bus("unused").unwrap();
    let el = b.add_bus("el").unwrap();
    b.add_source("grid", vec![(el, FlowSpec::new())]).unwrap();
    b.add_sink("demand", vec![(el, FlowSpec::new().nominal_value(1.0).fixed(1.0))])
        .unwrap();
    let graph = b.build(TimeHorizon::uniform(3)).unwrap();

    let model = Model::compile(&graph, &CompileOptions::default()).unwrap();
    assert_eq!(model.stats().constraints, 3);
    assert!(!model.lp_string().contains("balance(unused"));
}
