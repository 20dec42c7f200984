use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{
    error::{Error, Result},
    remote::resolve_parameters,
    source::{SourceReader, SourceRef},
};

/// Variables handed to the template. Later writes win.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariableSet(BTreeMap<String, Value>);

impl VariableSet {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn merge(&mut self, object: Map<String, Value>) {
        self.0.extend(object);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignedValue {
    /// Used as is. `@@value` arrives here as `@value`.
    Literal(String),
    /// `@REF`, read from a local file, S3 or SSM.
    Indirect(SourceRef),
}

/// A `NAME=VALUE` pair from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: AssignedValue,
}

impl Assignment {
    pub fn parse(assignment: &str) -> Result<Self> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| Error::InvalidAssignment(assignment.to_string()))?;
        if name.is_empty() {
            return Err(Error::InvalidAssignment(assignment.to_string()));
        }

        let value = match value.strip_prefix('@') {
            Some(escaped) if escaped.starts_with('@') => AssignedValue::Literal(escaped.to_string()),
            Some(reference) => AssignedValue::Indirect(SourceRef::parse(reference)?),
            None => AssignedValue::Literal(value.to_string()),
        };

        Ok(Assignment {
            name: name.to_string(),
            value,
        })
    }
}

/// Every input of one run, classified before anything is read.
#[derive(Debug)]
pub struct Collector {
    template: SourceRef,
    variable_files: Vec<SourceRef>,
    assignments: Vec<Assignment>,
}

impl Collector {
    pub fn new(template_from: &str, variables_from: &[String], vars: &[String]) -> Result<Self> {
        Ok(Collector {
            template: SourceRef::parse(template_from)?,
            variable_files: variables_from
                .iter()
                .map(|reference| SourceRef::parse(reference))
                .collect::<Result<_>>()?,
            assignments: vars
                .iter()
                .map(|assignment| Assignment::parse(assignment))
                .collect::<Result<_>>()?,
        })
    }

    /// Whether any input lives in S3 or SSM.
    pub fn needs_remote(&self) -> bool {
        self.template.is_remote()
            || self.variable_files.iter().any(SourceRef::is_remote)
            || self.assignments.iter().any(|assignment| {
                matches!(&assignment.value, AssignedValue::Indirect(source) if source.is_remote())
            })
    }

    /// Reads the template and builds the variables: files in order, then
    /// assignments in order. SSM assignments are fetched together at the end.
    pub fn collect(&self, reader: &SourceReader) -> Result<(String, VariableSet)> {
        let template = reader.read(&self.template)?;
        let mut variables = VariableSet::default();

        for source in &self.variable_files {
            log::debug!("Reading variables from {}", source);
            let text = reader.read(source)?;
            let value: Value = serde_json::from_str(&text).map_err(|e| Error::InvalidJson {
                path: source.to_string(),
                source: e,
            })?;
            match value {
                Value::Object(object) => variables.merge(object),
                _ => return Err(Error::VariablesNotObject(source.to_string())),
            }
        }

        let mut pending: BTreeMap<String, String> = BTreeMap::new();
        for assignment in &self.assignments {
            let value = match &assignment.value {
                AssignedValue::Literal(value) => value.clone(),
                AssignedValue::Indirect(SourceRef::Ssm(parameter)) => {
                    pending.insert(assignment.name.clone(), parameter.clone());
                    continue;
                }
                AssignedValue::Indirect(source) => {
                    log::debug!("Reading {} from {}", assignment.name, source);
                    reader.read(source)?
                }
            };
            // a later assignment overrides a pending lookup of the same name
            pending.remove(&assignment.name);
            variables.insert(assignment.name.clone(), value);
        }

        if !pending.is_empty() {
            log::debug!("Fetching {} parameter(s) from SSM", pending.len());
            for (name, value) in resolve_parameters(reader.parameters()?, &pending)? {
                variables.insert(name, value);
            }
        }

        Ok((template, variables))
    }
}
