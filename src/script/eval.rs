use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Map, Value};

use super::parser::{CompareOp, Condition, Pipeline, Program, Source, Stage};
use super::ScriptError;

static NULL: Value = Value::Null;

/// Variable bindings a program runs against.
#[derive(Debug, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn run(&mut self, program: &Program) -> Result<(), ScriptError> {
        for statement in &program.statements {
            let value = self.pipeline(&statement.pipeline)?;
            self.vars.insert(statement.target.clone(), value);
        }
        Ok(())
    }

    fn pipeline(&self, pipeline: &Pipeline) -> Result<Value, ScriptError> {
        let mut value = match &pipeline.source {
            Source::Variable(name) => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| ScriptError::UnknownVariable(name.clone()))?,
            Source::Literal(value) => value.clone(),
        };

        for stage in &pipeline.stages {
            value = apply(stage, value)?;
        }

        Ok(value)
    }
}

fn apply(stage: &Stage, input: Value) -> Result<Value, ScriptError> {
    let rows = match input {
        Value::Array(rows) => rows,
        other => {
            return Err(ScriptError::Stage {
                stage: stage.name(),
                message: format!("expected a list, got {}", type_name(&other)),
            })
        }
    };

    let output = match stage {
        Stage::Where(condition) => Value::Array(
            rows.into_iter()
                .filter(|row| satisfies(condition, row))
                .collect(),
        ),
        Stage::Select(fields) => Value::Array(
            rows.iter()
                .map(|row| {
                    let object: Map<String, Value> = fields
                        .iter()
                        .map(|f| (f.clone(), field(row, f).clone()))
                        .collect();
                    Value::Object(object)
                })
                .collect(),
        ),
        Stage::Pluck(name) => Value::Array(rows.iter().map(|row| field(row, name).clone()).collect()),
        Stage::Sort { field: name, descending } => {
            let mut rows = rows;
            rows.sort_by(|a, b| {
                let ordering = sort_order(field(a, name), field(b, name));
                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
            Value::Array(rows)
        }
        Stage::Limit(n) => Value::Array(rows.into_iter().take(*n).collect()),
        Stage::Count => Value::from(rows.len()),
        Stage::First => rows.into_iter().next().unwrap_or(Value::Null),
        Stage::Distinct(name) => {
            let mut seen: Vec<Value> = Vec::new();
            for row in &rows {
                let value = field(row, name);
                if !seen.iter().any(|s| values_equal(s, value)) {
                    seen.push(value.clone());
                }
            }
            Value::Array(seen)
        }
        Stage::CountBy(name) => {
            let mut counts: Vec<(String, u64)> = Vec::new();
            for row in &rows {
                let key = key_string(field(row, name));
                match counts.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((key, 1)),
                }
            }
            Value::Object(counts.into_iter().map(|(k, n)| (k, Value::from(n))).collect())
        }
        Stage::Sum(name) => {
            let numbers = numeric_values(stage, &rows, name)?;
            let exact = numbers
                .iter()
                .try_fold(0i64, |total, n| n.as_i64().and_then(|v| total.checked_add(v)));
            match exact {
                Some(total) => Value::from(total),
                None => Value::from(numbers.iter().filter_map(|n| n.as_f64()).sum::<f64>()),
            }
        }
        Stage::Avg(name) => {
            let numbers = numeric_values(stage, &rows, name)?;
            if numbers.is_empty() {
                Value::Null
            } else {
                let total: f64 = numbers.iter().filter_map(|n| n.as_f64()).sum();
                Value::from(total / numbers.len() as f64)
            }
        }
        Stage::Min(name) | Stage::Max(name) => {
            let present = rows.iter().map(|row| field(row, name)).filter(|v| !v.is_null());
            let best = if matches!(stage, Stage::Min(_)) {
                present.min_by(|a, b| sort_order(a, b))
            } else {
                present.max_by(|a, b| sort_order(a, b))
            };
            best.cloned().unwrap_or(Value::Null)
        }
    };

    Ok(output)
}

fn field<'a>(row: &'a Value, name: &str) -> &'a Value {
    row.get(name).unwrap_or(&NULL)
}

fn numeric_values<'a>(
    stage: &Stage,
    rows: &'a [Value],
    name: &str,
) -> Result<Vec<&'a serde_json::Number>, ScriptError> {
    let mut numbers = Vec::new();
    for row in rows {
        match field(row, name) {
            Value::Null => {}
            Value::Number(n) => numbers.push(n),
            other => {
                return Err(ScriptError::Stage {
                    stage: stage.name(),
                    message: format!("field '{}' holds a non-numeric value {}", name, other),
                })
            }
        }
    }
    Ok(numbers)
}

fn satisfies(condition: &Condition, row: &Value) -> bool {
    match condition {
        Condition::Compare { field: name, op, value } => compare(*op, field(row, name), value),
        Condition::Not(inner) => !satisfies(inner, row),
        Condition::And(terms) => terms.iter().all(|term| satisfies(term, row)),
        Condition::Or(terms) => terms.iter().any(|term| satisfies(term, row)),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::Ne => !values_equal(left, right),
        CompareOp::Lt => ordered(left, right) == Some(Ordering::Less),
        CompareOp::Le => matches!(ordered(left, right), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => ordered(left, right) == Some(Ordering::Greater),
        CompareOp::Ge => matches!(ordered(left, right), Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::Contains => match (left, right) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            (Value::Array(items), needle) => items.iter().any(|item| values_equal(item, needle)),
            _ => false,
        },
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// Ordering between two values of the same comparable kind.
fn ordered(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total order used by `sort`, `min` and `max`: numbers, strings, booleans,
/// everything else, then nulls.
fn sort_order(left: &Value, right: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Number(_) => 0,
            Value::String(_) => 1,
            Value::Bool(_) => 2,
            Value::Array(_) | Value::Object(_) => 3,
            Value::Null => 4,
        }
    }

    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => ordered(left, right).unwrap_or_else(|| rank(left).cmp(&rank(right))),
    }
}

fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
