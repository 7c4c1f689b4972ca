//! CPLEX LP text format.
//!
//! The writer emits every variable with an explicit bound so that a parsed
//! file reproduces the variable order of the written problem. The parser
//! understands what the writer produces plus the common spellings of the
//! section keywords and bound forms; integer sections are rejected.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use es_core::VarId;

use crate::error::{LpError, LpResult};
use crate::problem::{LpProblem, Sense, Variable};

const TERMS_PER_LINE: usize = 8;

/// Map `name` onto the LP-format name alphabet.
pub fn sanitize_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "_.(),;!#$%&/?@|~{}".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut chars = out.chars();
    let needs_prefix = match chars.next() {
        None => true,
        Some(c) if c.is_ascii_digit() || c == '.' => true,
        Some('e' | 'E') => chars.next().is_none_or(|c| c.is_ascii_digit()),
        Some(_) => false,
    };
    if needs_prefix {
        out.insert(0, '_');
    }
    out
}

/// Sanitised names, made unique by suffixing collisions.
fn unique_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .map(|name| {
            let base = sanitize_name(name);
            let mut candidate = base.clone();
            let mut n = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{base}_{n}");
                n += 1;
            }
            candidate
        })
        .collect()
}

fn write_terms<W: Write>(
    out: &mut W,
    terms: impl Iterator<Item = (VarId, f64)>,
    var_names: &[String],
) -> std::io::Result<()> {
    for (i, (var, coef)) in terms.enumerate() {
        if i > 0 && i % TERMS_PER_LINE == 0 {
            write!(out, "\n   ")?;
        }
        write!(out, " {coef:+} {}", var_names[var.idx()])?;
    }
    Ok(())
}

fn write_bound<W: Write>(out: &mut W, name: &str, var: &Variable) -> std::io::Result<()> {
    if var.is_free() {
        writeln!(out, " {name} free")
    } else if var.is_pinned() {
        writeln!(out, " {name} = {}", var.lower)
    } else {
        writeln!(out, " {:+} <= {name} <= {:+}", var.lower, var.upper)
    }
}

/// Write `problem` in CPLEX LP format.
pub fn write_lp<W: Write>(problem: &LpProblem, out: &mut W) -> LpResult<()> {
    let var_names = unique_names(problem.variables().iter().map(|v| v.name.as_str()));
    let row_names = unique_names(problem.constraints().iter().map(|c| c.name.as_str()));

    writeln!(out, "\\ Problem: {}", problem.name())?;
    writeln!(out, "min")?;
    write!(out, " obj:")?;
    let objective = problem
        .objective()
        .iter()
        .enumerate()
        .filter(|(_, c)| **c != 0.0)
        .map(|(i, c)| (VarId::from_usize(i), *c));
    write_terms(out, objective, &var_names)?;
    writeln!(out)?;

    writeln!(out, "s.t.")?;
    for (row, name) in problem.constraints().iter().zip(&row_names) {
        write!(out, " {name}:")?;
        if row.terms.is_empty() && !var_names.is_empty() {
            write!(out, " +0 {}", var_names[0])?;
        }
        write_terms(out, row.terms.iter().copied(), &var_names)?;
        writeln!(out, " {} {}", row.sense.symbol(), row.rhs)?;
    }

    writeln!(out, "bounds")?;
    for (var, name) in problem.variables().iter().zip(&var_names) {
        write_bound(out, name, var)?;
    }
    writeln!(out, "end")?;
    Ok(())
}

pub fn write_lp_string(problem: &LpProblem) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_lp(problem, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn write_lp_file(problem: &LpProblem, path: impl AsRef<Path>) -> LpResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_lp(problem, &mut out)?;
    out.flush()?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Objective,
    Constraints,
    Bounds,
    End,
}

fn section_keyword(line: &str) -> Option<Section> {
    match line.to_ascii_lowercase().as_str() {
        "min" | "minimize" | "minimise" | "minimum" => Some(Section::Objective),
        "s.t." | "st" | "st." | "subject to" | "such that" => Some(Section::Constraints),
        "bounds" | "bound" => Some(Section::Bounds),
        "end" => Some(Section::End),
        _ => None,
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> LpError {
    LpError::Parse {
        line,
        message: message.into(),
    }
}

/// Numeric token, including signed infinities.
fn as_number(tok: &str) -> Option<f64> {
    let first = tok.chars().next()?;
    if first.is_ascii_digit() || "+-.".contains(first) {
        return tok.parse().ok();
    }
    match tok.to_ascii_lowercase().as_str() {
        "inf" | "infinity" => Some(f64::INFINITY),
        _ => None,
    }
}

fn as_sense(tok: &str) -> Option<Sense> {
    match tok {
        "<=" | "=<" | "<" => Some(Sense::Le),
        ">=" | "=>" | ">" => Some(Sense::Ge),
        "=" => Some(Sense::Eq),
        _ => None,
    }
}

/// Whitespace tokens tagged with their line number.
struct Tokens {
    items: Vec<(usize, String)>,
    pos: usize,
}

impl Tokens {
    fn peek(&self) -> Option<&str> {
        self.items.get(self.pos).map(|(_, t)| t.as_str())
    }

    fn next(&mut self) -> Option<(usize, String)> {
        let item = self.items.get(self.pos).cloned();
        self.pos += 1;
        item
    }

    fn line(&self) -> usize {
        self.items
            .get(self.pos.min(self.items.len().saturating_sub(1)))
            .map_or(0, |(l, _)| *l)
    }

    /// Linear terms up to (not including) a sense token or a row label.
    fn terms(&mut self) -> LpResult<Vec<(String, f64)>> {
        let mut terms = Vec::new();
        let mut sign = 1.0;
        let mut coef: Option<f64> = None;
        while let Some(tok) = self.peek() {
            if as_sense(tok).is_some() || (tok.ends_with(':') && coef.is_none()) {
                break;
            }
            let (line, tok) = self.next().unwrap_or_default();
            match tok.as_str() {
                "+" => {}
                "-" => sign = -sign,
                _ => match (as_number(&tok), coef) {
                    (Some(v), None) => coef = Some(sign * v),
                    (Some(_), Some(_)) => {
                        return Err(parse_error(line, format!("unexpected number '{tok}'")));
                    }
                    (None, c) => {
                        terms.push((tok, c.unwrap_or(sign)));
                        sign = 1.0;
                        coef = None;
                    }
                },
            }
        }
        if coef.is_some() {
            return Err(parse_error(self.line(), "constant terms are not supported"));
        }
        Ok(terms)
    }
}

#[derive(Default)]
struct BoundSpec {
    lower: Option<f64>,
    upper: Option<f64>,
}

fn parse_bound(
    line: usize,
    text: &str,
    bounds: &mut HashMap<String, BoundSpec>,
    order: &mut Vec<String>,
) -> LpResult<()> {
    let toks: Vec<&str> = text.split_whitespace().collect();
    let num = |tok: &str| {
        as_number(tok)
            .ok_or_else(|| parse_error(line, format!("expected a number, found '{tok}'")))
    };
    let (name, lower, upper) = match toks.as_slice() {
        [name, free] if free.eq_ignore_ascii_case("free") => {
            (*name, Some(f64::NEG_INFINITY), Some(f64::INFINITY))
        }
        [name, "=", v] => {
            let v = num(*v)?;
            (*name, Some(v), Some(v))
        }
        [l, "<=", name, "<=", u] => (*name, Some(num(*l)?), Some(num(*u)?)),
        [l, "<=", name] if as_number(*l).is_some() => (*name, Some(num(*l)?), None),
        [name, "<=", u] => (*name, None, Some(num(*u)?)),
        [name, ">=", l] => (*name, Some(num(*l)?), None),
        _ => return Err(parse_error(line, format!("unrecognised bound '{text}'"))),
    };
    let entry = bounds.entry(name.to_string()).or_insert_with(|| {
        order.push(name.to_string());
        BoundSpec::default()
    });
    if lower.is_some() {
        entry.lower = lower;
    }
    if upper.is_some() {
        entry.upper = upper;
    }
    Ok(())
}

/// Parse CPLEX LP text into a problem.
pub fn parse_lp(text: &str) -> LpResult<LpProblem> {
    let mut name = String::from("lp");
    let mut section = Section::Preamble;
    let mut objective = Tokens { items: Vec::new(), pos: 0 };
    let mut rows = Tokens { items: Vec::new(), pos: 0 };
    let mut bounds: HashMap<String, BoundSpec> = HashMap::new();
    let mut bound_order: Vec<String> = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        if let Some(rest) = raw.trim().strip_prefix("\\ Problem:") {
            name = rest.trim().to_string();
            continue;
        }
        let line = raw.split('\\').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if let Some(next) = section_keyword(line) {
            section = next;
            continue;
        }
        match line.to_ascii_lowercase().as_str() {
            "max" | "maximize" | "maximise" | "maximum" => {
                return Err(parse_error(line_no, "maximisation is not supported"));
            }
            "general" | "generals" | "gen" | "binary" | "binaries" | "bin" => {
                return Err(parse_error(line_no, "integer sections are not supported"));
            }
            _ => {}
        }
        let tokens = line.split_whitespace().map(|t| (line_no, t.to_string()));
        match section {
            Section::Objective => objective.items.extend(tokens),
            Section::Constraints => rows.items.extend(tokens),
            Section::Bounds => parse_bound(line_no, line, &mut bounds, &mut bound_order)?,
            Section::Preamble => {
                return Err(parse_error(line_no, "content before objective section"));
            }
            Section::End => return Err(parse_error(line_no, "content after 'end'")),
        }
    }

    // Objective: optional label then terms.
    if objective.peek().is_some_and(|t| t.ends_with(':')) {
        objective.next();
    }
    let objective_terms = objective.terms()?;
    if let Some((line, tok)) = objective.next() {
        return Err(parse_error(line, format!("unexpected '{tok}' in objective")));
    }

    let mut parsed_rows = Vec::new();
    while rows.peek().is_some() {
        let label = if rows.peek().is_some_and(|t| t.ends_with(':')) {
            rows.next()
                .map(|(_, t)| t.trim_end_matches(':').to_string())
        } else {
            None
        };
        let label = label.unwrap_or_else(|| format!("r_{}", parsed_rows.len() + 1));
        let terms = rows.terms()?;
        let line = rows.line();
        let sense = rows
            .next()
            .and_then(|(_, t)| as_sense(&t))
            .ok_or_else(|| parse_error(line, format!("row '{label}' has no sense")))?;
        let rhs = rows
            .next()
            .and_then(|(_, t)| as_number(&t))
            .ok_or_else(|| parse_error(line, format!("row '{label}' has no right-hand side")))?;
        parsed_rows.push((label, terms, sense, rhs));
    }

    // Variable order: bounds section first, then first appearance.
    let mut order = bound_order;
    let mut known: HashSet<String> = order.iter().cloned().collect();
    let appearances = objective_terms
        .iter()
        .chain(parsed_rows.iter().flat_map(|(_, terms, _, _)| terms.iter()))
        .map(|(n, _)| n);
    for n in appearances {
        if known.insert(n.clone()) {
            order.push(n.clone());
        }
    }

    let mut problem = LpProblem::new(name);
    let mut ids = HashMap::new();
    for var in &order {
        let spec = bounds.get(var);
        let lower = spec.and_then(|b| b.lower).unwrap_or(0.0);
        let upper = spec.and_then(|b| b.upper).unwrap_or(f64::INFINITY);
        ids.insert(var.clone(), problem.add_variable(var.clone(), lower, upper)?);
    }
    for (var, coef) in &objective_terms {
        problem.add_objective_term(ids[var], *coef)?;
    }
    for (label, terms, sense, rhs) in parsed_rows {
        let terms: Vec<(VarId, f64)> = terms.iter().map(|(n, c)| (ids[n], *c)).collect();
        problem.add_constraint(label, terms, sense, rhs)?;
    }
    Ok(problem)
}
