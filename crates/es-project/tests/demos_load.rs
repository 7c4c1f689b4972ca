use std::path::PathBuf;

use es_project::{ProfileDef, load_project, load_yaml};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos/projects")
        .join(name)
}

#[test]
fn basic_demo_loads() {
    let project = load_yaml(&demo("basic.yaml")).unwrap();
    assert_eq!(project.version, es_project::LATEST_VERSION);
    assert_eq!(project.systems.len(), 2);

    let single = &project.systems[0];
    assert_eq!(single.id, "single_step");
    assert_eq!(single.horizon.timesteps, 1);
    assert_eq!(single.horizon.step_hours, 1.0);
    assert!(single.horizon.start.is_some());
    assert_eq!(single.converters[0].conversion_factors["GAS"], 1.1101);
    assert_eq!(
        single.sinks[0].inputs[0].profile,
        Some(ProfileDef::Constant(2.1101))
    );
}

#[test]
fn csv_profiles_and_storage_parse() {
    let project = load_project(&demo("basic.yaml")).unwrap();
    let system = &project.systems[1];
    let wind = &system.sources[1].outputs[0];
    assert!(matches!(
        &wind.profile,
        Some(ProfileDef::Column { file, column }) if file == "profiles.csv" && column == "wind"
    ));
    assert_eq!(wind.investment.as_ref().map(|i| i.existing), Some(2.0));

    let battery = &system.storages[0];
    assert_eq!(battery.nominal_capacity, Some(4.0));
    assert!(battery.balanced);
    assert_eq!(battery.input.bus, "ELECTRICITY");
}

#[test]
fn unknown_extension_rejected() {
    let err = load_project(&demo("profiles.csv")).unwrap_err();
    assert!(matches!(err, es_project::ProjectError::UnknownFormat { .. }));
}
