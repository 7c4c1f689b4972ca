//! Schema migration framework.

use crate::ProjectError;
use crate::schema::Project;

pub const LATEST_VERSION: u32 = 2;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        1 => migrate_v1_to_v2(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 1 called converters `transformers`.
fn migrate_v1_to_v2(mut project: Project) -> Result<Project, ProjectError> {
    for system in &mut project.systems {
        let legacy = std::mem::take(&mut system.transformers);
        system.converters.extend(legacy);
    }
    project.version = 2;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConverterDef, FlowDef, HorizonDef, SystemDef};

    fn system() -> SystemDef {
        SystemDef {
            id: "s1".to_string(),
            name: "Legacy".to_string(),
            horizon: HorizonDef {
                timesteps: 2,
                start: None,
                step_hours: 1.0,
                durations: None,
            },
            objective_weighting: None,
            buses: vec![],
            sources: vec![],
            sinks: vec![],
            converters: vec![],
            storages: vec![],
            transformers: vec![ConverterDef {
                label: "pp".to_string(),
                inputs: vec![FlowDef::to_bus("gas")],
                outputs: vec![FlowDef::to_bus("el")],
                conversion_factors: Default::default(),
            }],
        }
    }

    #[test]
    fn migrate_latest_is_noop() {
        let project = Project {
            version: LATEST_VERSION,
            name: "test".to_string(),
            systems: vec![],
        };
        let migrated = migrate_to_latest(project.clone()).unwrap();
        assert_eq!(migrated, project);
    }

    #[test]
    fn transformers_become_converters() {
        let project = Project {
            version: 1,
            name: "old".to_string(),
            systems: vec![system()],
        };
        let migrated = migrate_to_latest(project).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        let system = &migrated.systems[0];
        assert!(system.transformers.is_empty());
        assert_eq!(system.converters.len(), 1);
        assert_eq!(system.converters[0].label, "pp");
    }

    #[test]
    fn version_zero_has_no_path() {
        let project = Project {
            version: 0,
            name: "ancient".to_string(),
            systems: vec![],
        };
        assert!(matches!(
            migrate_to_latest(project),
            Err(ProjectError::Migration { .. })
        ));
    }
}
