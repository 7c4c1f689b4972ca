//! In-memory linear program.

use std::collections::HashMap;

use es_core::{Id, RowId, VarId};
use serde::{Deserialize, Serialize};

use crate::error::{LpError, LpResult};

/// A decision variable with (possibly infinite) bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

impl Variable {
    pub fn is_free(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }

    pub fn is_pinned(&self) -> bool {
        self.lower == self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    pub fn symbol(self) -> &'static str {
        match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        }
    }
}

/// A linear row `sum(coef * var) <sense> rhs`. Terms hold each variable once.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub terms: Vec<(VarId, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// Left-hand side evaluated at `values`.
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|(v, c)| c * values[v.idx()]).sum()
    }

    /// Amount by which `values` violate this row (0 when satisfied).
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.activity(values);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }
}

/// Size of a problem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemStats {
    pub variables: usize,
    pub constraints: usize,
    pub nonzeros: usize,
}

/// Minimisation LP: variables, rows and a linear objective.
#[derive(Debug, Clone, Default)]
pub struct LpProblem {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    /// Dense objective coefficients, one per variable.
    objective: Vec<f64>,
    var_names: HashMap<String, VarId>,
    row_names: HashMap<String, RowId>,
}

impl LpProblem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a variable. Bounds may be infinite but not NaN, and `lower <= upper`.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
    ) -> LpResult<VarId> {
        let name = name.into();
        if lower.is_nan()
            || upper.is_nan()
            || lower > upper
            || lower == f64::INFINITY
            || upper == f64::NEG_INFINITY
        {
            return Err(LpError::InvalidBounds { name, lower, upper });
        }
        if self.var_names.contains_key(&name) {
            return Err(LpError::DuplicateName {
                kind: "variable",
                name,
            });
        }
        let id = Id::from_usize(self.variables.len());
        self.var_names.insert(name.clone(), id);
        self.variables.push(Variable { name, lower, upper });
        self.objective.push(0.0);
        Ok(id)
    }

    /// Add a row. Repeated variables in `terms` are merged and zero
    /// coefficients dropped.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: impl IntoIterator<Item = (VarId, f64)>,
        sense: Sense,
        rhs: f64,
    ) -> LpResult<RowId> {
        let name = name.into();
        if !rhs.is_finite() {
            return Err(LpError::NonFinite {
                what: format!("right-hand side of '{name}'"),
                value: rhs,
            });
        }
        if self.row_names.contains_key(&name) {
            return Err(LpError::DuplicateName {
                kind: "constraint",
                name,
            });
        }

        let mut merged: Vec<(VarId, f64)> = Vec::new();
        let mut slot: HashMap<VarId, usize> = HashMap::new();
        for (var, coef) in terms {
            if var.idx() >= self.variables.len() {
                return Err(LpError::UnknownVariable {
                    row: name,
                    index: var.index(),
                });
            }
            if !coef.is_finite() {
                return Err(LpError::NonFinite {
                    what: format!("coefficient of '{}' in '{name}'", self.variables[var.idx()].name),
                    value: coef,
                });
            }
            match slot.get(&var) {
                Some(&i) => merged[i].1 += coef,
                None => {
                    slot.insert(var, merged.len());
                    merged.push((var, coef));
                }
            }
        }
        merged.retain(|(_, c)| *c != 0.0);

        let id = Id::from_usize(self.constraints.len());
        self.row_names.insert(name.clone(), id);
        self.constraints.push(Constraint {
            name,
            terms: merged,
            sense,
            rhs,
        });
        Ok(id)
    }

    /// Add `coef` to the objective coefficient of `var`.
    pub fn add_objective_term(&mut self, var: VarId, coef: f64) -> LpResult<()> {
        if !coef.is_finite() {
            return Err(LpError::NonFinite {
                what: "objective coefficient".to_string(),
                value: coef,
            });
        }
        match self.objective.get_mut(var.idx()) {
            Some(c) => {
                *c += coef;
                Ok(())
            }
            None => Err(LpError::UnknownVariable {
                row: "objective".to_string(),
                index: var.index(),
            }),
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.idx())
    }

    pub fn variable_by_name(&self, name: &str) -> Option<VarId> {
        self.var_names.get(name).copied()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint_by_name(&self, name: &str) -> Option<&Constraint> {
        self.row_names.get(name).map(|id| &self.constraints[id.idx()])
    }

    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn objective_coef(&self, var: VarId) -> f64 {
        self.objective.get(var.idx()).copied().unwrap_or(0.0)
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.constraints.is_empty()
    }

    pub fn stats(&self) -> ProblemStats {
        ProblemStats {
            variables: self.variables.len(),
            constraints: self.constraints.len(),
            nonzeros: self.constraints.iter().map(|c| c.terms.len()).sum(),
        }
    }

    /// Objective evaluated at `values`.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Largest row or bound violation of `values`.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let rows = self
            .constraints
            .iter()
            .map(|c| c.violation(values))
            .fold(0.0, f64::max);
        let bounds = self
            .variables
            .iter()
            .zip(values)
            .map(|(v, x)| (v.lower - x).max(x - v.upper).max(0.0))
            .fold(0.0, f64::max);
        rows.max(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_and_bounds() {
        let mut lp = LpProblem::new("t");
        let x = lp.add_variable("x", 0.0, f64::INFINITY).unwrap();
        let y = lp.add_variable("y", f64::NEG_INFINITY, f64::INFINITY).unwrap();
        let z = lp.add_variable("z", 2.0, 2.0).unwrap();
        assert_eq!(lp.num_vars(), 3);
        assert!(lp.variable(y).unwrap().is_free());
        assert!(lp.variable(z).unwrap().is_pinned());
        assert!(!lp.variable(x).unwrap().is_free());
        assert_eq!(lp.variable_by_name("z"), Some(z));
    }

    #[test]
    fn invalid_bounds_rejected() {
        let mut lp = LpProblem::new("t");
        assert!(matches!(
            lp.add_variable("x", 1.0, 0.0),
            Err(LpError::InvalidBounds { .. })
        ));
        assert!(lp.add_variable("y", f64::NAN, 1.0).is_err());
        lp.add_variable("z", 0.0, 1.0).unwrap();
        assert!(matches!(
            lp.add_variable("z", 0.0, 1.0),
            Err(LpError::DuplicateName { .. })
        ));
    }

    #[test]
    fn terms_are_merged() {
        let mut lp = LpProblem::new("t");
        let x = lp.add_variable("x", 0.0, 10.0).unwrap();
        let y = lp.add_variable("y", 0.0, 10.0).unwrap();
        lp.add_constraint("c", [(x, 1.0), (y, 2.0), (x, 0.5), (y, -2.0)], Sense::Le, 4.0)
            .unwrap();
        let c = lp.constraint_by_name("c").unwrap();
        assert_eq!(c.terms, vec![(x, 1.5)]);
        assert_eq!(lp.stats().nonzeros, 1);
    }

    #[test]
    fn unknown_variable_in_row() {
        let mut lp = LpProblem::new("t");
        let err = lp
            .add_constraint("c", [(Id::from_index(3), 1.0)], Sense::Eq, 0.0)
            .unwrap_err();
        assert!(matches!(err, LpError::UnknownVariable { index: 3, .. }));
    }

    #[test]
    fn objective_and_violation() {
        let mut lp = LpProblem::new("t");
        let x = lp.add_variable("x", 0.0, 10.0).unwrap();
        let y = lp.add_variable("y", 0.0, 10.0).unwrap();
        lp.add_objective_term(x, 2.0).unwrap();
        lp.add_objective_term(y, 3.0).unwrap();
        lp.add_objective_term(x, 1.0).unwrap();
        lp.add_constraint("sum", [(x, 1.0), (y, 1.0)], Sense::Ge, 5.0)
            .unwrap();

        assert_eq!(lp.objective_coef(x), 3.0);
        assert_eq!(lp.objective_value(&[1.0, 2.0]), 9.0);
        assert_eq!(lp.max_violation(&[1.0, 2.0]), 2.0);
        assert_eq!(lp.max_violation(&[5.0, 0.0]), 0.0);
        assert_eq!(lp.max_violation(&[11.0, 0.0]), 1.0);
    }
}
