use std::path::PathBuf;

use es_app::{AppError, build_graph, list_systems, load_project, system_compile, validate_project};
use es_graph::Profile;
use es_project::schema::ProfileDef;

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/projects/basic.yaml")
}

#[test]
fn demo_project_validates() {
    let path = demo_path();
    let project = load_project(&path).unwrap();
    validate_project(&path, &project).unwrap();

    let summaries = list_systems(&project);
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[1].node_count, 6);
    assert_eq!(summaries[1].flow_count, 8);
    assert_eq!(summaries[1].storage_count, 1);
}

#[test]
fn csv_columns_are_inlined() {
    let path = demo_path();
    let project = load_project(&path).unwrap();
    let resolved = system_compile::resolve_profiles(&project.systems[1], &path).unwrap();
    assert_eq!(
        resolved.sources[1].outputs[0].profile,
        Some(ProfileDef::Series(vec![0.20, 0.65, 0.90, 0.35]))
    );
    assert_eq!(
        resolved.sinks[0].inputs[0].profile,
        Some(ProfileDef::Series(vec![0.50, 0.70, 1.00, 0.60]))
    );
}

#[test]
fn graph_mirrors_system() {
    let path = demo_path();
    let project = load_project(&path).unwrap();
    let graph = build_graph(&project.systems[1], &path).unwrap();
    assert_eq!(graph.horizon().len(), 4);
    assert_eq!(graph.buses().len(), 2);
    assert_eq!(graph.nodes().len(), 6);
    assert_eq!(graph.flows().len(), 8);

    let plant = graph
        .nodes()
        .iter()
        .find(|n| n.label == "GAS_POWERPLANT")
        .unwrap();
    let gas = graph.labels().bus("GAS").unwrap();
    let el = graph.labels().bus("ELECTRICITY").unwrap();
    assert_eq!(plant.conversion_factor(gas), Some(1.0));
    assert_eq!(plant.conversion_factor(el), Some(0.58));

    let wind_flow = graph
        .flows()
        .iter()
        .find(|f| graph.flow_endpoints(f).0 == "WIND")
        .unwrap();
    assert_eq!(
        wind_flow.spec.profile,
        Some(Profile::Series(vec![0.20, 0.65, 0.90, 0.35]))
    );
}

#[test]
fn missing_csv_column_fails_validation() {
    let path = demo_path();
    let mut project = load_project(&path).unwrap();
    project.systems[1].sources[1].outputs[0].profile = Some(ProfileDef::Column {
        file: "profiles.csv".to_string(),
        column: "solar".to_string(),
    });
    let err = validate_project(&path, &project).unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("solar")));
}

#[test]
fn physical_errors_surface_from_graph() {
    let path = demo_path();
    let mut project = load_project(&path).unwrap();
    project.systems[1].storages[0].nominal_capacity = None;
    let err = build_graph(&project.systems[1], &path).unwrap_err();
    assert!(matches!(err, AppError::Graph(_)));
}
