use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::scenario::function::{FunctionHandle, FunctionRef};
use crate::domain::utils::id::ScopeId;
use crate::error::{Error, Result};

/// Named placeholder declared on a scenario, valued when the scenario is instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub description: String,
    pub default: Option<Value>,
}

impl Argument {
    /// An argument without default must be bound by whoever instantiates the scenario.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Named literal fixed at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub value: Value,
}

/// Reference to an [`Argument`] of one particular scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgumentRef {
    scope: ScopeId,
    name: String,
}

impl ArgumentRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Token the orchestrator substitutes at instantiation time.
    pub fn placeholder(&self) -> String {
        format!("${}", self.name)
    }
}

/// Reference to a [`Constant`] of one particular scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstantRef {
    scope: ScopeId,
    name: String,
}

impl ConstantRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

/// Arguments and constants of one scenario.
///
/// Names are unique across both kinds: an argument and a constant may not share a name.
#[derive(Debug, Clone)]
pub struct ParameterTable {
    scope: ScopeId,
    owner: String,
    arguments: Vec<Argument>,
    constants: Vec<Constant>,
}

impl ParameterTable {
    pub fn new(scope: ScopeId, owner: impl Into<String>) -> Self {
        Self { scope, owner: owner.into(), arguments: Vec::new(), constants: Vec::new() }
    }

    pub fn add_argument(&mut self, name: &str, description: &str, default: Option<Value>) -> Result<ArgumentRef> {
        self.ensure_unused(name)?;
        self.arguments.push(Argument { name: name.to_string(), description: description.to_string(), default });
        Ok(ArgumentRef { scope: self.scope, name: name.to_string() })
    }

    pub fn add_constant(&mut self, name: &str, value: Value) -> Result<ConstantRef> {
        self.ensure_unused(name)?;
        self.constants.push(Constant { name: name.to_string(), value });
        Ok(ConstantRef { scope: self.scope, name: name.to_string() })
    }

    /// Fails with `DuplicateName` if `name` is taken by an argument or a constant.
    pub fn ensure_unused(&self, name: &str) -> Result<()> {
        let existing = if self.argument(name).is_some() {
            Some("an argument")
        } else if self.constant(name).is_some() {
            Some("a constant")
        } else {
            None
        };

        match existing {
            Some(existing) => Err(Error::DuplicateName { scenario: self.owner.clone(), name: name.to_string(), existing }),
            None => Ok(()),
        }
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub fn constant(&self, name: &str) -> Option<&Constant> {
        self.constants.iter().find(|c| c.name == name)
    }

    pub fn required_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().filter(|a| a.is_required())
    }

    /// Handle to an already declared argument, e.g. to reuse it in a helper.
    pub fn argument_ref(&self, name: &str) -> Option<ArgumentRef> {
        self.argument(name).map(|a| ArgumentRef { scope: self.scope, name: a.name.clone() })
    }

    pub fn constant_ref(&self, name: &str) -> Option<ConstantRef> {
        self.constant(name).map(|c| ConstantRef { scope: self.scope, name: c.name.clone() })
    }

    pub(crate) fn rescope(&mut self, scope: ScopeId) {
        self.scope = scope;
    }

    pub fn resolves_argument(&self, argument: &ArgumentRef) -> bool {
        argument.scope == self.scope && self.argument(&argument.name).is_some()
    }

    pub fn constant_value(&self, constant: &ConstantRef) -> Option<&Value> {
        if constant.scope != self.scope {
            return None;
        }
        self.constant(&constant.name).map(|c| &c.value)
    }

    /// Re-checks name uniqueness over the whole table.
    pub fn check_unique_names(&self) -> Result<()> {
        let mut seen: BTreeMap<&str, &'static str> = BTreeMap::new();
        let names = self
            .arguments
            .iter()
            .map(|a| (a.name.as_str(), "an argument"))
            .chain(self.constants.iter().map(|c| (c.name.as_str(), "a constant")));

        for (name, kind) in names {
            if let Some(existing) = seen.insert(name, kind) {
                return Err(Error::DuplicateName { scenario: self.owner.clone(), name: name.to_string(), existing });
            }
        }
        Ok(())
    }
}

/// A value placed in a payload: a literal, or a reference resolved at serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Literal(Value),
    Argument(ArgumentRef),
    Constant(ConstantRef),
    /// Identifies a job instance, e.g. the jobs a post-processing job reads.
    Function(FunctionRef),
    List(Vec<ParameterValue>),
    Map(BTreeMap<String, ParameterValue>),
}

/// Borrowed view of a reference found inside a [`ParameterValue`] tree.
#[derive(Debug, Clone, Copy)]
pub enum ValueReference<'a> {
    Argument(&'a ArgumentRef),
    Constant(&'a ConstantRef),
    Function(&'a FunctionRef),
}

impl ParameterValue {
    /// Builds a `Map` from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<ParameterValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        ParameterValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<ParameterValue>,
        I: IntoIterator<Item = V>,
    {
        ParameterValue::List(items.into_iter().map(Into::into).collect())
    }

    /// All references in this value, depth first.
    pub fn references(&self) -> Vec<ValueReference<'_>> {
        let mut found = Vec::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, found: &mut Vec<ValueReference<'a>>) {
        match self {
            ParameterValue::Literal(_) => {}
            ParameterValue::Argument(argument) => found.push(ValueReference::Argument(argument)),
            ParameterValue::Constant(constant) => found.push(ValueReference::Constant(constant)),
            ParameterValue::Function(function) => found.push(ValueReference::Function(function)),
            ParameterValue::List(items) => items.iter().for_each(|item| item.collect_references(found)),
            ParameterValue::Map(entries) => entries.values().for_each(|value| value.collect_references(found)),
        }
    }

    /// Re-points the references minted in scope `from` to scope `to`.
    pub(crate) fn rescope(&mut self, from: ScopeId, to: ScopeId) {
        match self {
            ParameterValue::Literal(_) => {}
            ParameterValue::Argument(argument) => {
                if argument.scope == from {
                    argument.scope = to;
                }
            }
            ParameterValue::Constant(constant) => {
                if constant.scope == from {
                    constant.scope = to;
                }
            }
            ParameterValue::Function(function) => function.rescope(from, to),
            ParameterValue::List(items) => items.iter_mut().for_each(|item| item.rescope(from, to)),
            ParameterValue::Map(entries) => entries.values_mut().for_each(|value| value.rescope(from, to)),
        }
    }

    /// Looks up `key` when this value is a map.
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        match self {
            ParameterValue::Map(entries) => entries.get(key),
            _ => None,
        }
    }
}

impl From<Value> for ParameterValue {
    fn from(value: Value) -> Self {
        ParameterValue::Literal(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Literal(Value::from(value))
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Literal(Value::from(value))
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Literal(Value::from(value))
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Literal(Value::from(value))
    }
}

macro_rules! integer_literal {
    ($($t:ty),*) => {
        $(impl From<$t> for ParameterValue {
            fn from(value: $t) -> Self {
                ParameterValue::Literal(Value::from(value))
            }
        })*
    };
}

integer_literal!(i32, i64, u16, u32, u64);

impl From<ArgumentRef> for ParameterValue {
    fn from(value: ArgumentRef) -> Self {
        ParameterValue::Argument(value)
    }
}

impl From<&ArgumentRef> for ParameterValue {
    fn from(value: &ArgumentRef) -> Self {
        ParameterValue::Argument(value.clone())
    }
}

impl From<ConstantRef> for ParameterValue {
    fn from(value: ConstantRef) -> Self {
        ParameterValue::Constant(value)
    }
}

impl From<&ConstantRef> for ParameterValue {
    fn from(value: &ConstantRef) -> Self {
        ParameterValue::Constant(value.clone())
    }
}

impl From<FunctionRef> for ParameterValue {
    fn from(value: FunctionRef) -> Self {
        ParameterValue::Function(value)
    }
}

impl From<FunctionHandle> for ParameterValue {
    fn from(value: FunctionHandle) -> Self {
        ParameterValue::Function(value.into())
    }
}

impl From<Vec<ParameterValue>> for ParameterValue {
    fn from(value: Vec<ParameterValue>) -> Self {
        ParameterValue::List(value)
    }
}

impl From<BTreeMap<String, ParameterValue>> for ParameterValue {
    fn from(value: BTreeMap<String, ParameterValue>) -> Self {
        ParameterValue::Map(value)
    }
}
