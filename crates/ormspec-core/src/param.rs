//! Query-parameter objects.
//!
//! A query parameter is a record whose populated fields become predicate
//! nodes. Each field carries a [`FieldDescriptor`] naming the operators it is
//! annotated with, an optional join path and an ignore flag. Three providers
//! implement [`QueryParam`]:
//!
//! - a caller type implementing the trait directly,
//! - the dynamic [`QueryParams`] builder,
//! - any `serde::Serialize` record bound to a [`ParamSchema`] through
//!   [`Reflected`].

use ormspec_proto::{JoinKind, Value};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::Error;
use crate::operator::Operator;

/// Static description of one query-parameter field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, also the default target attribute.
    pub name: String,
    /// Operators applied to the field. Empty means a single default equality.
    #[serde(default)]
    pub operators: Vec<Operator>,
    /// Join path key the field is evaluated against.
    #[serde(default)]
    pub join_path: Option<String>,
    /// Never produce a predicate for this field.
    #[serde(default)]
    pub ignored: bool,
}

impl FieldDescriptor {
    /// Create a descriptor with default equality.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operators: Vec::new(),
            join_path: None,
            ignored: false,
        }
    }

    /// Add an operator.
    pub fn operator(mut self, operator: impl Into<Operator>) -> Self {
        self.operators.push(operator.into());
        self
    }

    /// Evaluate the field against a join path.
    pub fn join_path(mut self, path: impl Into<String>) -> Self {
        self.join_path = Some(path.into());
        self
    }

    /// Mark the field as ignored.
    pub fn ignore(mut self) -> Self {
        self.ignored = true;
        self
    }
}

/// One populated query-parameter field.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamField {
    /// Field description.
    pub descriptor: FieldDescriptor,
    /// Runtime value.
    pub value: Value,
}

impl ParamField {
    /// Create a field with default equality.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            descriptor: FieldDescriptor::new(name),
            value: value.into(),
        }
    }

    /// Create a field from a descriptor.
    pub fn with_descriptor(descriptor: FieldDescriptor, value: impl Into<Value>) -> Self {
        Self {
            descriptor,
            value: value.into(),
        }
    }

    /// Add an operator.
    pub fn operator(mut self, operator: impl Into<Operator>) -> Self {
        self.descriptor = self.descriptor.operator(operator);
        self
    }

    /// Evaluate the field against a join path.
    pub fn join_path(mut self, path: impl Into<String>) -> Self {
        self.descriptor = self.descriptor.join_path(path);
        self
    }

    /// Mark the field as ignored.
    pub fn ignore(mut self) -> Self {
        self.descriptor = self.descriptor.ignore();
        self
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// A type-level join declaration.
///
/// Dotted attributes (`sClass.teacher`) join each segment in turn; the path
/// key is the full attribute string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinDeclaration {
    /// Relation attribute path from the root entity.
    pub attribute: String,
    /// Join kind.
    #[serde(default)]
    pub kind: JoinKind,
}

impl JoinDeclaration {
    /// Declare a left join.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            kind: JoinKind::Left,
        }
    }

    /// Declare an inner join.
    pub fn inner(attribute: impl Into<String>) -> Self {
        Self::new(attribute).kind(JoinKind::Inner)
    }

    /// Set the join kind.
    pub fn kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A query-parameter object.
pub trait QueryParam {
    /// Joins declared on the parameter type.
    fn joins(&self) -> Vec<JoinDeclaration> {
        Vec::new()
    }

    /// Fields in declaration order with their runtime values.
    fn fields(&self) -> Result<Vec<ParamField>, Error>;
}

impl<P: QueryParam + ?Sized> QueryParam for &P {
    fn joins(&self) -> Vec<JoinDeclaration> {
        (**self).joins()
    }

    fn fields(&self) -> Result<Vec<ParamField>, Error> {
        (**self).fields()
    }
}

/// A query parameter built at runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    joins: Vec<JoinDeclaration>,
    fields: Vec<ParamField>,
}

impl QueryParams {
    /// Create an empty parameter object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a join.
    pub fn join(mut self, join: JoinDeclaration) -> Self {
        self.joins.push(join);
        self
    }

    /// Append a field.
    pub fn field(mut self, field: ParamField) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a field with default equality.
    pub fn eq(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(ParamField::new(name, value))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl QueryParam for QueryParams {
    fn joins(&self) -> Vec<JoinDeclaration> {
        self.joins.clone()
    }

    fn fields(&self) -> Result<Vec<ParamField>, Error> {
        Ok(self.fields.clone())
    }
}

/// Declarations for a serializable parameter type.
///
/// Fields missing from the schema get a default descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSchema {
    /// Type-level joins.
    #[serde(default)]
    pub joins: Vec<JoinDeclaration>,
    /// Field descriptors, matched to record fields by name.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl ParamSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a join.
    pub fn join(mut self, join: JoinDeclaration) -> Self {
        self.joins.push(join);
        self
    }

    /// Describe a field. A previous descriptor with the same name is replaced.
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.retain(|d| d.name != descriptor.name);
        self.fields.push(descriptor);
        self
    }

    /// Get the descriptor for a field, or the default one.
    pub fn descriptor(&self, name: &str) -> FieldDescriptor {
        self.fields
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .unwrap_or_else(|| FieldDescriptor::new(name))
    }

    /// Parse a schema from JSON.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::InvalidData(e.to_string()))
    }

    /// Bind a record to this schema.
    pub fn bind<'a, T: Serialize>(&'a self, record: &'a T) -> Reflected<'a, T> {
        Reflected {
            schema: self,
            record,
        }
    }
}

/// A serializable record read through its [`ParamSchema`].
#[derive(Debug, Clone, Copy)]
pub struct Reflected<'a, T> {
    schema: &'a ParamSchema,
    record: &'a T,
}

impl<T: Serialize> QueryParam for Reflected<'_, T> {
    fn joins(&self) -> Vec<JoinDeclaration> {
        self.schema.joins.clone()
    }

    fn fields(&self) -> Result<Vec<ParamField>, Error> {
        let json = serde_json::to_value(self.record).map_err(|e| Error::FieldAccess {
            field: std::any::type_name::<T>().to_string(),
            reason: e.to_string(),
        })?;

        let Json::Object(map) = json else {
            return Err(Error::FieldAccess {
                field: std::any::type_name::<T>().to_string(),
                reason: "query parameter must serialize to a struct or map".to_string(),
            });
        };

        map.into_iter()
            .map(|(name, json)| {
                let value = json_to_value(&name, json)?;
                Ok(ParamField::with_descriptor(self.schema.descriptor(&name), value))
            })
            .collect()
    }
}

fn field_error(field: &str, reason: impl Into<String>) -> Error {
    Error::FieldAccess {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Convert a serialized field to a runtime value.
fn json_to_value(field: &str, json: Json) -> Result<Value, Error> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i32::try_from(i).map(Value::Int32).unwrap_or(Value::Int64(i)))
            } else if n.is_u64() {
                Err(field_error(field, format!("integer {} out of range", n)))
            } else {
                n.as_f64()
                    .map(Value::Float64)
                    .ok_or_else(|| field_error(field, format!("unsupported number {}", n)))
            }
        }
        Json::String(s) => Ok(Value::String(s)),
        Json::Array(items) => json_array_to_value(field, items),
        Json::Object(_) => Err(field_error(field, "nested objects are not supported")),
    }
}

fn json_array_to_value(field: &str, items: Vec<Json>) -> Result<Value, Error> {
    if items.is_empty() {
        return Ok(Value::StringArray(Vec::new()));
    }

    let values = items
        .into_iter()
        .map(|item| match item {
            Json::Array(_) | Json::Object(_) | Json::Null => {
                Err(field_error(field, "collection elements must be scalars"))
            }
            other => json_to_value(field, other),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mixed = || field_error(field, "collection elements must share one type");

    match &values[0] {
        Value::Bool(_) => values
            .iter()
            .map(|v| v.as_bool())
            .collect::<Option<Vec<_>>>()
            .map(Value::BoolArray)
            .ok_or_else(mixed),
        Value::String(_) => values
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(Value::StringArray)
            .ok_or_else(mixed),
        Value::Int32(_) | Value::Int64(_) | Value::Float64(_) => {
            if values.iter().all(|v| matches!(v, Value::Int32(_))) {
                Ok(Value::Int32Array(values.iter().filter_map(Value::as_i32).collect()))
            } else if values.iter().all(|v| matches!(v, Value::Int32(_) | Value::Int64(_))) {
                Ok(Value::Int64Array(values.iter().filter_map(Value::as_i64).collect()))
            } else if values
                .iter()
                .all(|v| matches!(v, Value::Int32(_) | Value::Int64(_) | Value::Float64(_)))
            {
                let widened = values
                    .iter()
                    .filter_map(|v| match v {
                        Value::Int32(i) => Some(f64::from(*i)),
                        Value::Int64(i) => Some(*i as f64),
                        other => other.as_f64(),
                    })
                    .collect();
                Ok(Value::Float64Array(widened))
            } else {
                Err(mixed())
            }
        }
        _ => Err(mixed()),
    }
}
