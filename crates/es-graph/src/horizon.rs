//! Ordered, weighted sequence of timesteps.

use chrono::{Duration, NaiveDateTime};

use crate::error::{GraphError, GraphResult};

/// Time horizon over which balance and flow constraints are replicated.
///
/// Each timestep carries a duration weight (uniform 1.0 by default). An
/// optional start timestamp and step length give labels for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeHorizon {
    durations: Vec<f64>,
    start: Option<NaiveDateTime>,
    step_hours: f64,
}

impl TimeHorizon {
    /// `steps` timesteps of weight 1.0.
    pub fn uniform(steps: usize) -> Self {
        Self {
            durations: vec![1.0; steps],
            start: None,
            step_hours: 1.0,
        }
    }

    /// Hourly horizon starting at `start`.
    pub fn hourly(start: NaiveDateTime, steps: usize) -> Self {
        Self::uniform(steps).with_start(start, 1.0)
    }

    /// Explicit duration weights, e.g. representative slices of unequal length.
    pub fn with_durations(durations: Vec<f64>) -> GraphResult<Self> {
        for (t, &d) in durations.iter().enumerate() {
            if !d.is_finite() || d <= 0.0 {
                return Err(GraphError::invalid(
                    format!("duration of timestep {t}"),
                    d,
                    "must be finite and positive",
                ));
            }
        }
        Ok(Self {
            durations,
            start: None,
            step_hours: 1.0,
        })
    }

    pub fn with_start(mut self, start: NaiveDateTime, step_hours: f64) -> Self {
        self.start = Some(start);
        self.step_hours = step_hours;
        self
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    pub fn steps(&self) -> std::ops::Range<usize> {
        0..self.durations.len()
    }

    pub fn duration(&self, t: usize) -> f64 {
        self.durations[t]
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    /// Timestamp label of step `t`, if the horizon has a start.
    pub fn timestamp(&self, t: usize) -> Option<NaiveDateTime> {
        let start = self.start?;
        let offset_s = (self.step_hours * 3600.0 * t as f64).round() as i64;
        start.checked_add_signed(Duration::seconds(offset_s))
    }
}
