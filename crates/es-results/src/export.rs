//! CSV export of the flows attached to one bus or node.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::types::{RunData, RunManifest};
use crate::{ResultsError, ResultsResult};

/// One row per timestep: `timestep`, `timestamp` when the horizon has a
/// start, then one `from->to` column per flow attached to `label`.
pub fn write_node_csv<W: Write>(
    writer: W,
    manifest: &RunManifest,
    data: &RunData,
    label: &str,
) -> ResultsResult<()> {
    let flows = data.flows_of(label);
    if flows.is_empty() {
        return Err(ResultsError::UnknownLabel {
            run_id: manifest.run_id.clone(),
            label: label.to_string(),
        });
    }
    let horizon = &manifest.horizon;
    let with_time = horizon.start.is_some();

    let mut out = csv::Writer::from_writer(writer);
    let mut header = vec!["timestep".to_string()];
    if with_time {
        header.push("timestamp".to_string());
    }
    header.extend(flows.iter().map(|f| f.label()));
    out.write_record(&header)?;

    for t in 0..horizon.timesteps {
        let mut row = vec![t.to_string()];
        if with_time {
            row.push(
                horizon
                    .timestamp(t)
                    .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
            );
        }
        row.extend(
            flows
                .iter()
                .map(|f| f.value_at(t).map(|v| v.to_string()).unwrap_or_default()),
        );
        out.write_record(&row)?;
    }
    out.flush()?;
    Ok(())
}

pub fn export_node_csv(
    path: &Path,
    manifest: &RunManifest,
    data: &RunData,
    label: &str,
) -> ResultsResult<()> {
    let file = File::create(path)?;
    write_node_csv(file, manifest, data, label)
}
