//! Translation of project systems into graphs.
//!
//! Profiles that reference CSV columns are read relative to the project file
//! and inlined before the graph is built, so the resolved system is a
//! self-contained description of the run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use es_core::BusId;
use es_graph::{FlowSpec, Graph, GraphBuilder, Investment, Profile, StorageParams, TimeHorizon};
use es_model::CompileOptions;
use es_project::schema::{FlowDef, HorizonDef, InvestmentDef, ProfileDef, SystemDef};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Directory that CSV profile paths are relative to.
pub fn base_dir(project_path: &Path) -> &Path {
    project_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Parsed CSV files, keyed by path.
#[derive(Default)]
struct CsvTables {
    tables: HashMap<PathBuf, (Vec<String>, Vec<csv::StringRecord>)>,
}

impl CsvTables {
    fn column(&mut self, path: &Path, column: &str, timesteps: usize) -> AppResult<Vec<f64>> {
        let profile_err = |message: String| AppError::Profile {
            path: path.to_path_buf(),
            message,
        };

        if !self.tables.contains_key(path) {
            let mut reader = csv::Reader::from_path(path).map_err(|e| profile_err(e.to_string()))?;
            let headers: Vec<String> = reader
                .headers()
                .map_err(|e| profile_err(e.to_string()))?
                .iter()
                .map(|h| h.trim().to_string())
                .collect();
            let rows = reader
                .records()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| profile_err(e.to_string()))?;
            self.tables.insert(path.to_path_buf(), (headers, rows));
        }
        let Some((headers, rows)) = self.tables.get(path) else {
            return Err(profile_err("table not loaded".to_string()));
        };

        let idx = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| profile_err(format!("no column '{}'", column)))?;
        if rows.len() < timesteps {
            return Err(profile_err(format!(
                "column '{}' has {} rows, horizon has {} timesteps",
                column,
                rows.len(),
                timesteps
            )));
        }

        rows.iter()
            .take(timesteps)
            .enumerate()
            .map(|(row, record)| {
                let cell = record.get(idx).unwrap_or("").trim();
                cell.parse::<f64>().map_err(|_| {
                    profile_err(format!("row {} of '{}' is not a number: '{}'", row, column, cell))
                })
            })
            .collect()
    }
}

fn for_each_flow_mut(
    system: &mut SystemDef,
    mut f: impl FnMut(&str, &mut FlowDef) -> AppResult<()>,
) -> AppResult<()> {
    for source in &mut system.sources {
        for flow in &mut source.outputs {
            f(&source.label, flow)?;
        }
    }
    for sink in &mut system.sinks {
        for flow in &mut sink.inputs {
            f(&sink.label, flow)?;
        }
    }
    for converter in &mut system.converters {
        for flow in converter.inputs.iter_mut().chain(converter.outputs.iter_mut()) {
            f(&converter.label, flow)?;
        }
    }
    for storage in &mut system.storages {
        f(&storage.label, &mut storage.input)?;
        f(&storage.label, &mut storage.output)?;
    }
    Ok(())
}

/// Copy of `system` with every CSV column profile replaced by its values.
pub fn resolve_profiles(system: &SystemDef, project_path: &Path) -> AppResult<SystemDef> {
    let base = base_dir(project_path);
    let timesteps = system.horizon.timesteps;
    let mut tables = CsvTables::default();
    let mut resolved = system.clone();

    for_each_flow_mut(&mut resolved, |node, flow| {
        let Some(ProfileDef::Column { file, column }) = &flow.profile else {
            return Ok(());
        };
        let path = base.join(file);
        debug!(node, bus = %flow.bus, path = %path.display(), column = %column, "Reading profile column");
        let values = tables.column(&path, column, timesteps)?;
        flow.profile = Some(ProfileDef::Series(values));
        Ok(())
    })?;

    Ok(resolved)
}

pub fn horizon(def: &HorizonDef) -> AppResult<TimeHorizon> {
    let horizon = match &def.durations {
        Some(durations) if durations.len() != def.timesteps => {
            return Err(AppError::InvalidInput(format!(
                "{} durations for {} timesteps",
                durations.len(),
                def.timesteps
            )));
        }
        Some(durations) => TimeHorizon::with_durations(durations.clone())?,
        None => TimeHorizon::uniform(def.timesteps),
    };
    Ok(match def.start {
        Some(start) => horizon.with_start(start, def.step_hours),
        None => horizon,
    })
}

fn investment(def: &InvestmentDef) -> Investment {
    Investment {
        ep_costs: def.ep_costs,
        maximum: def.maximum,
        existing: def.existing,
    }
}

fn flow_spec(owner: &str, def: &FlowDef) -> AppResult<FlowSpec> {
    let profile = match &def.profile {
        None => None,
        Some(ProfileDef::Constant(v)) => Some(Profile::Constant(*v)),
        Some(ProfileDef::Series(values)) => Some(Profile::Series(values.clone())),
        Some(ProfileDef::Column { file, column }) => {
            return Err(AppError::InvalidInput(format!(
                "profile {}:{} of '{}' was not resolved",
                file, column, owner
            )));
        }
    };
    Ok(FlowSpec {
        nominal_value: def.nominal_value,
        profile,
        fixed: def.fixed,
        variable_cost: def.variable_cost,
        investment: def.investment.as_ref().map(investment),
    })
}

fn flows(builder: &GraphBuilder, owner: &str, defs: &[FlowDef]) -> AppResult<Vec<(BusId, FlowSpec)>> {
    defs.iter()
        .map(|def| -> AppResult<(BusId, FlowSpec)> {
            Ok((builder.resolve_bus(&def.bus, owner)?, flow_spec(owner, def)?))
        })
        .collect()
}

/// Build the graph of a system whose profiles are already resolved.
///
/// Converter buses without an explicit factor get 1.0.
pub fn compile_system(system: &SystemDef) -> AppResult<Graph> {
    let mut builder = GraphBuilder::new();

    for bus in &system.buses {
        builder.add_bus(bus.label.as_str())?;
    }
    for source in &system.sources {
        let outputs = flows(&builder, &source.label, &source.outputs)?;
        builder.add_source(source.label.as_str(), outputs)?;
    }
    for sink in &system.sinks {
        let inputs = flows(&builder, &sink.label, &sink.inputs)?;
        builder.add_sink(sink.label.as_str(), inputs)?;
    }
    for converter in &system.converters {
        let inputs = flows(&builder, &converter.label, &converter.inputs)?;
        let outputs = flows(&builder, &converter.label, &converter.outputs)?;

        let mut factors: Vec<(BusId, f64)> = Vec::new();
        for def in converter.inputs.iter().chain(&converter.outputs) {
            let bus = builder.resolve_bus(&def.bus, &converter.label)?;
            if factors.iter().all(|(b, _)| *b != bus) {
                let factor = converter.conversion_factors.get(&def.bus).copied().unwrap_or(1.0);
                factors.push((bus, factor));
            }
        }
        builder.add_converter(converter.label.as_str(), inputs, outputs, factors)?;
    }
    for storage in &system.storages {
        let input = flows(&builder, &storage.label, std::slice::from_ref(&storage.input))?;
        let output = flows(&builder, &storage.label, std::slice::from_ref(&storage.output))?;
        let (Some(input), Some(output)) = (input.into_iter().next(), output.into_iter().next())
        else {
            return Err(AppError::InvalidInput(format!(
                "storage '{}' needs one input and one output",
                storage.label
            )));
        };

        let mut params = StorageParams::with_capacity(0.0)
            .initial_level(storage.initial_level)
            .loss_rate(storage.loss_rate)
            .efficiencies(storage.charge_efficiency, storage.discharge_efficiency)
            .balanced(storage.balanced);
        params.nominal_capacity = storage.nominal_capacity;
        params.investment = storage.investment.as_ref().map(investment);

        builder.add_storage(storage.label.as_str(), input, output, params)?;
    }

    Ok(builder.build(horizon(&system.horizon)?)?)
}

/// Resolve profiles and build the graph.
pub fn build_graph(system: &SystemDef, project_path: &Path) -> AppResult<Graph> {
    compile_system(&resolve_profiles(system, project_path)?)
}

pub fn compile_options(system: &SystemDef) -> CompileOptions {
    CompileOptions {
        objective_weighting: system.objective_weighting.clone(),
    }
}
