//! Allow-list of queryable fields for one entity type.
//!
//! A [`FieldSchema`] is built once at service composition time and shared read-only
//! (usually behind an `Arc`) by every request. Lookups are case-insensitive and
//! always hand back the canonical field name, so criteria trees never carry
//! caller spelling.

use std::collections::HashMap;

use crate::criteria::Criteria;
use crate::error::{Error, Result};
use crate::filter::FilterOp;
use crate::value::{FieldKind, Value};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub operators: Vec<FilterOp>,
    pub sortable: bool,
    pub searchable: bool,
    pub variants: Vec<String>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            operators: FilterOp::defaults_for(kind).to_vec(),
            sortable: false,
            searchable: false,
            variants: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn uuid() -> Self {
        Self::new(FieldKind::Uuid)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Bool)
    }

    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variants: variants.into_iter().map(Into::into).collect(),
            ..Self::new(FieldKind::Enum)
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Replace the default operator set for the kind.
    pub fn operators(mut self, ops: &[FilterOp]) -> Self {
        self.operators = ops.to_vec();
        self
    }

    pub fn allows(&self, op: FilterOp) -> bool {
        self.operators.contains(&op)
    }

    pub fn parse_value(
        &self,
        raw: &str,
    ) -> std::result::Result<Value, crate::value::ValueParseError> {
        self.kind.parse_value(raw, &self.variants)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FieldRef<'a> {
    pub name: &'a str,
    pub spec: &'a FieldSpec,
}

#[derive(Clone, Debug)]
struct FieldDef {
    name: String,
    spec: FieldSpec,
}

#[derive(Clone, Debug)]
pub struct FieldSchema {
    entity: String,
    fields: Vec<FieldDef>,
    index: HashMap<String, usize>,
    tiebreaker: usize,
}

impl FieldSchema {
    pub fn builder(entity: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            entity: entity.into(),
            fields: Vec::new(),
            tiebreaker: None,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, name: &str) -> Option<FieldRef<'_>> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| self.field_at(i))
    }

    fn field_at(&self, i: usize) -> FieldRef<'_> {
        let def = &self.fields[i];
        FieldRef {
            name: &def.name,
            spec: &def.spec,
        }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = FieldRef<'_>> {
        (0..self.fields.len()).map(move |i| self.field_at(i))
    }

    pub fn searchable_fields(&self) -> impl Iterator<Item = FieldRef<'_>> {
        self.fields().filter(|f| f.spec.searchable)
    }

    /// Unique field appended to every sort.
    pub fn tiebreaker(&self) -> FieldRef<'_> {
        self.field_at(self.tiebreaker)
    }

    /// Check a hand-built tree (e.g. a scope constraint) against the schema:
    /// every field must exist and every value must have the field's kind.
    pub fn validate(&self, criteria: &Criteria) -> Result<()> {
        let check_value = |field: FieldRef<'_>, v: &Value| {
            let kind_ok = v.kind() == field.spec.kind;
            let variant_ok = match v {
                Value::Enum(s) => field.spec.variants.iter().any(|x| x == s),
                _ => true,
            };
            if kind_ok && variant_ok {
                Ok(())
            } else {
                Err(Error::InvalidFilterValue {
                    field: field.name.to_string(),
                    value: v.render(),
                    expected: field.spec.kind,
                })
            }
        };

        match criteria {
            Criteria::Empty => Ok(()),
            Criteria::And(children) | Criteria::Or(children) => {
                children.iter().try_for_each(|c| self.validate(c))
            }
            leaf => {
                let name = leaf.field().unwrap_or_default();
                let field = self
                    .get(name)
                    .ok_or_else(|| Error::InvalidFilterField(name.to_string()))?;
                match leaf {
                    Criteria::Equals(_, v)
                    | Criteria::NotEquals(_, v)
                    | Criteria::Compare(_, _, v) => check_value(field, v),
                    Criteria::In(_, vs) | Criteria::NotIn(_, vs) => {
                        vs.iter().try_for_each(|v| check_value(field, v))
                    }
                    Criteria::Like(_, p) if field.spec.kind != FieldKind::String => {
                        Err(Error::InvalidFilterValue {
                            field: field.name.to_string(),
                            value: p.pattern.clone(),
                            expected: field.spec.kind,
                        })
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

pub struct SchemaBuilder {
    entity: String,
    fields: Vec<FieldDef>,
    tiebreaker: Option<String>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            spec,
        });
        self
    }

    pub fn tiebreaker(mut self, name: impl Into<String>) -> Self {
        self.tiebreaker = Some(name.into());
        self
    }

    pub fn build(self) -> Result<FieldSchema> {
        let mut index = HashMap::with_capacity(self.fields.len());
        for (i, def) in self.fields.iter().enumerate() {
            if def.name.trim().is_empty() {
                return Err(Error::Schema(format!("{}: empty field name", self.entity)));
            }
            if index.insert(def.name.to_lowercase(), i).is_some() {
                return Err(Error::Schema(format!(
                    "{}: duplicate field {}",
                    self.entity, def.name
                )));
            }
            if def.spec.searchable && def.spec.kind != FieldKind::String {
                return Err(Error::Schema(format!(
                    "{}: searchable field {} must be a string",
                    self.entity, def.name
                )));
            }
            if def.spec.kind != FieldKind::String {
                if let Some(op) = def
                    .spec
                    .operators
                    .iter()
                    .find(|op| matches!(op, FilterOp::Like | FilterOp::ILike))
                {
                    return Err(Error::Schema(format!(
                        "{}: operator {} needs a string field, {} is not",
                        self.entity,
                        op.token(),
                        def.name
                    )));
                }
            }
            if def.spec.kind == FieldKind::Enum && def.spec.variants.is_empty() {
                return Err(Error::Schema(format!(
                    "{}: enum field {} declares no variants",
                    self.entity, def.name
                )));
            }
        }

        let tb_name = self
            .tiebreaker
            .ok_or_else(|| Error::Schema(format!("{}: no tie-breaker field", self.entity)))?;
        let tiebreaker = *index.get(&tb_name.to_lowercase()).ok_or_else(|| {
            Error::Schema(format!("{}: unknown tie-breaker {}", self.entity, tb_name))
        })?;
        if !self.fields[tiebreaker].spec.sortable {
            return Err(Error::Schema(format!(
                "{}: tie-breaker {} must be sortable",
                self.entity, tb_name
            )));
        }

        Ok(FieldSchema {
            entity: self.entity,
            fields: self.fields,
            index,
            tiebreaker,
        })
    }
}
