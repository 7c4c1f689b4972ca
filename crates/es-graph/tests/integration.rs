//! Integration tests for es-graph.

use es_graph::{
    EntityRef, FlowSpec, GraphBuilder, GraphError, Investment, NodeKind, Profile,
    StorageParams, TimeHorizon,
};

/// gas -> [pp_gas] -> el -> demand, plus a storage on el.
fn small_system() -> GraphBuilder {
    let mut b = GraphBuilder::new();
    let gas = b.add_bus("bgas").unwrap();
    let el = b.add_bus("bel").unwrap();
    b.add_source("rgas", vec![(gas, FlowSpec::new())]).unwrap();
    b.add_converter(
        "pp_gas",
        vec![(gas, FlowSpec::new())],
        vec![(el, FlowSpec::new().nominal_value(10e10).variable_cost(50.0))],
        vec![(gas, 1.0), (el, 0.58)],
    )
    .unwrap();
    b.add_sink(
        "demand",
        vec![(el, FlowSpec::new().nominal_value(1.0).fixed(vec![2.0, 3.0, 1.5]))],
    )
    .unwrap();
    b.add_storage(
        "storage",
        (el, FlowSpec::new()),
        (el, FlowSpec::new()),
        StorageParams::with_capacity(5.0).loss_rate(0.01),
    )
    .unwrap();
    b
}

#[test]
fn build_small_system() {
    let graph = small_system().build(TimeHorizon::uniform(3)).unwrap();

    assert_eq!(graph.buses().len(), 2);
    assert_eq!(graph.nodes().len(), 4);
    assert_eq!(graph.flows().len(), 6);
    assert_eq!(graph.horizon().len(), 3);

    let el = graph.labels().bus("bel").unwrap();
    let flows = graph.bus_flows(el);
    // pp_gas output and storage discharge feed el
    assert_eq!(flows.inflows.len(), 2);
    // demand and storage charge draw from el
    assert_eq!(flows.outflows.len(), 2);

    assert_eq!(graph.storages().count(), 1);
}

#[test]
fn label_lookup_for_nodes_and_buses() {
    let graph = small_system().build(TimeHorizon::uniform(3)).unwrap();

    let pp = match graph.labels().resolve("pp_gas").unwrap() {
        EntityRef::Node(id) => graph.node(id).unwrap(),
        EntityRef::Bus(_) => panic!("expected node"),
    };
    assert!(matches!(pp.kind, NodeKind::Converter { .. }));

    let pp_flows = graph.flows_of("pp_gas").unwrap();
    let labels: Vec<String> = pp_flows.iter().map(|f| graph.flow_label(*f)).collect();
    assert_eq!(labels, vec!["bgas->pp_gas", "pp_gas->bel"]);

    let bus_flows = graph.flows_of("bel").unwrap();
    assert_eq!(bus_flows.len(), 4);

    assert!(matches!(
        graph.flows_of("nope"),
        Err(GraphError::UnknownLabel { .. })
    ));
}

#[test]
fn profile_length_mismatch() {
    let err = small_system().build(TimeHorizon::uniform(4)).unwrap_err();
    assert_eq!(
        err,
        GraphError::ProfileLength {
            flow: "bel->demand".into(),
            expected: 4,
            actual: 3
        }
    );
}

#[test]
fn constant_profile_fits_any_horizon() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source("grid", vec![(el, FlowSpec::new())]).unwrap();
    b.add_sink(
        "demand",
        vec![(el, FlowSpec::new().nominal_value(1.0).fixed(Profile::Constant(2.11)))],
    )
    .unwrap();
    let graph = b.build(TimeHorizon::uniform(16)).unwrap();
    assert_eq!(graph.horizon().len(), 16);
}

#[test]
fn fixed_flow_without_capacity_is_ambiguous() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source("grid", vec![(el, FlowSpec::new())]).unwrap();
    b.add_sink("demand", vec![(el, FlowSpec::new().fixed(vec![1.0]))])
        .unwrap();
    let err = b.build(TimeHorizon::uniform(1)).unwrap_err();
    assert!(matches!(err, GraphError::AmbiguousCapacity { ref owner, .. } if owner == "el->demand"));
}

#[test]
fn nominal_value_and_investment_is_ambiguous() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source(
        "pv",
        vec![(
            el,
            FlowSpec::new()
                .nominal_value(5.0)
                .investment(Investment::new(100.0)),
        )],
    )
    .unwrap();
    let err = b.build(TimeHorizon::uniform(1)).unwrap_err();
    assert!(matches!(err, GraphError::AmbiguousCapacity { .. }));
}

#[test]
fn fixed_without_profile_is_invalid() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    let mut spec = FlowSpec::new().nominal_value(1.0);
    spec.fixed = true;
    b.add_sink("demand", vec![(el, spec)]).unwrap();
    let err = b.build(TimeHorizon::uniform(1)).unwrap_err();
    assert!(matches!(err, GraphError::InvalidValue { .. }));
}

#[test]
fn negative_profile_value_rejected() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source(
        "wind",
        vec![(el, FlowSpec::new().nominal_value(1.0).max_profile(vec![0.5, -0.1]))],
    )
    .unwrap();
    let err = b.build(TimeHorizon::uniform(2)).unwrap_err();
    assert!(matches!(err, GraphError::InvalidValue { value, .. } if value == -0.1));
}

#[test]
fn non_finite_cost_and_negative_nominal_name_the_flow() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source("grid", vec![(el, FlowSpec::new().variable_cost(f64::NAN))])
        .unwrap();
    let err = b.build(TimeHorizon::uniform(1)).unwrap_err();
    match err {
        GraphError::InvalidValue { what, reason, .. } => {
            assert!(what.contains("variable cost"), "{what}");
            assert!(what.contains("grid"), "{what}");
            assert_eq!(reason, "not finite");
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source("grid", vec![(el, FlowSpec::new().nominal_value(-2.0))])
        .unwrap();
    let err = b.build(TimeHorizon::uniform(1)).unwrap_err();
    assert!(matches!(
        err,
        GraphError::InvalidValue { value, reason: "negative", .. } if value == -2.0
    ));
}

#[test]
fn converter_factor_keys_must_match_buses() {
    let mut b = GraphBuilder::new();
    let gas = b.add_bus("gas").unwrap();
    let el = b.add_bus("el").unwrap();
    let heat = b.add_bus("heat").unwrap();
    b.add_converter(
        "chp",
        vec![(gas, FlowSpec::new())],
        vec![(el, FlowSpec::new()), (heat, FlowSpec::new())],
        vec![(gas, 1.0), (el, 0.3)],
    )
    .unwrap();
    let err = b.build(TimeHorizon::uniform(1)).unwrap_err();
    assert!(matches!(err, GraphError::ConversionFactors { ref converter, .. } if converter == "chp"));
}

#[test]
fn converter_factor_must_be_positive() {
    let mut b = GraphBuilder::new();
    let gas = b.add_bus("gas").unwrap();
    let el = b.add_bus("el").unwrap();
    b.add_converter(
        "pp",
        vec![(gas, FlowSpec::new())],
        vec![(el, FlowSpec::new())],
        vec![(gas, 1.0), (el, 0.0)],
    )
    .unwrap();
    assert!(matches!(
        b.build(TimeHorizon::uniform(1)),
        Err(GraphError::ConversionFactors { .. })
    ));
}

#[test]
fn converter_needs_input_and_output() {
    let mut b = GraphBuilder::new();
    let gas = b.add_bus("gas").unwrap();
    b.add_converter("pp", vec![(gas, FlowSpec::new())], vec![], vec![(gas, 1.0)])
        .unwrap();
    assert!(matches!(
        b.build(TimeHorizon::uniform(1)),
        Err(GraphError::InvalidTopology { .. })
    ));
}

#[test]
fn source_without_outputs_rejected() {
    let mut b = GraphBuilder::new();
    b.add_source("lonely", vec![]).unwrap();
    assert!(matches!(
        b.build(TimeHorizon::uniform(1)),
        Err(GraphError::InvalidTopology { .. })
    ));
}

#[test]
fn storage_validation() {
    let cases = [
        StorageParams {
            nominal_capacity: None,
            ..StorageParams::with_capacity(1.0)
        },
        StorageParams::with_capacity(1.0).loss_rate(1.5),
        StorageParams::with_capacity(1.0).efficiencies(0.0, 1.0),
        StorageParams::with_capacity(1.0).initial_level(2.0),
        StorageParams {
            investment: Some(Investment::new(1.0)),
            ..StorageParams::with_capacity(1.0)
        },
    ];
    for params in cases {
        let mut b = GraphBuilder::new();
        let el = b.add_bus("el").unwrap();
        b.add_storage("st", (el, FlowSpec::new()), (el, FlowSpec::new()), params)
            .unwrap();
        assert!(b.build(TimeHorizon::uniform(2)).is_err());
    }
}

#[test]
fn investable_storage_accepted() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_storage(
        "battery",
        (el, FlowSpec::new()),
        (el, FlowSpec::new()),
        StorageParams::investable(Investment::new(80.0).maximum(100.0)).efficiencies(0.95, 0.95),
    )
    .unwrap();
    let graph = b.build(TimeHorizon::uniform(2)).unwrap();
    let (node, params) = graph.storages().next().unwrap();
    assert_eq!(node.label, "battery");
    assert!(params.investment.is_some());
}

#[test]
fn repeated_flow_on_same_bus_rejected() {
    let mut b = GraphBuilder::new();
    let el = b.add_bus("el").unwrap();
    b.add_source("pv", vec![(el, FlowSpec::new()), (el, FlowSpec::new())])
        .unwrap();
    assert!(matches!(
        b.build(TimeHorizon::uniform(1)),
        Err(GraphError::InvalidTopology { .. })
    ));
}
