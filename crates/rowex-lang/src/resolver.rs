use std::cell::{Cell, RefCell};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::context::{Category, Resolver, VariableInfo};
use crate::eval::error::EvalError;
use crate::types::ExpressionType;
use crate::value::Value;

fn unknown(name: &str) -> EvalError {
    EvalError::UnknownVariable(CompactString::new(name))
}

fn mismatch(name: &str, ty: ExpressionType) -> EvalError {
    EvalError::Internal(format!("variable `{}` is not of type {}", name, ty))
}

/// A fixed, typed constant such as `pi`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    name: CompactString,
    ty: ExpressionType,
    value: Value,
}

impl Constant {
    pub fn double(name: &str, value: f64) -> Self {
        Self {
            name: CompactString::new(name),
            ty: ExpressionType::Double,
            value: Value::Number(value),
        }
    }

    pub fn integer(name: &str, value: i64) -> Self {
        Self {
            name: CompactString::new(name),
            ty: ExpressionType::Integer,
            value: Value::Number(value as f64),
        }
    }

    pub fn string(name: &str, value: &str) -> Self {
        Self {
            name: CompactString::new(name),
            ty: ExpressionType::String,
            value: Value::String(Some(value.to_string())),
        }
    }

    pub fn boolean(name: &str, value: bool) -> Self {
        Self {
            name: CompactString::new(name),
            ty: ExpressionType::Boolean,
            value: Value::Boolean(Some(value)),
        }
    }
}

/// Resolves a fixed list of named constants, in declaration order. All of its
/// names are session constants, so references to them fold at build time.
#[derive(Debug, Clone, Default)]
pub struct SimpleConstantResolver {
    constants: Vec<Constant>,
}

impl SimpleConstantResolver {
    pub fn new(constants: Vec<Constant>) -> Self {
        Self { constants }
    }

    /// The constants every default context starts with.
    pub fn standard() -> Self {
        Self::new(vec![
            Constant::double("e", std::f64::consts::E),
            Constant::double("pi", std::f64::consts::PI),
            Constant::double("INFINITY", f64::INFINITY),
            Constant::double("NaN", f64::NAN),
        ])
    }

    fn find(&self, name: &str) -> Option<&Constant> {
        self.constants.iter().find(|c| c.name == name)
    }
}

impl Resolver for SimpleConstantResolver {
    fn variables(&self) -> Vec<VariableInfo> {
        self.constants
            .iter()
            .map(|c| VariableInfo {
                name: c.name.clone(),
                ty: c.ty,
                category: Category::Constant,
            })
            .collect()
    }

    fn variable_type(&self, name: &str) -> Option<ExpressionType> {
        self.find(name).map(|c| c.ty)
    }

    fn is_session_constant(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn double(&self, name: &str) -> Result<f64, EvalError> {
        match self.find(name) {
            Some(Constant {
                value: Value::Number(v),
                ..
            }) => Ok(*v),
            Some(c) => Err(mismatch(name, c.ty)),
            None => Err(unknown(name)),
        }
    }

    fn boolean(&self, name: &str) -> Result<Option<bool>, EvalError> {
        match self.find(name) {
            Some(Constant {
                value: Value::Boolean(v),
                ..
            }) => Ok(*v),
            Some(c) => Err(mismatch(name, c.ty)),
            None => Err(unknown(name)),
        }
    }

    fn string(&self, name: &str) -> Result<Option<String>, EvalError> {
        match self.find(name) {
            Some(Constant {
                value: Value::String(v),
                ..
            }) => Ok(v.clone()),
            Some(c) => Err(mismatch(name, c.ty)),
            None => Err(unknown(name)),
        }
    }
}

/// A mutable bag of string-valued scope entries, addressed as `%{name}`.
/// Values may change between evaluations, so references never fold.
#[derive(Debug, Default)]
pub struct MacroResolver {
    values: RefCell<FxHashMap<CompactString, String>>,
}

impl MacroResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(CompactString::new(name), value.to_string());
    }

    pub fn remove(&self, name: &str) {
        self.values.borrow_mut().remove(name);
    }
}

impl Resolver for MacroResolver {
    fn variables(&self) -> Vec<VariableInfo> {
        self.values
            .borrow()
            .keys()
            .map(|name| VariableInfo {
                name: name.clone(),
                ty: ExpressionType::String,
                category: Category::Scope,
            })
            .collect()
    }

    fn variable_type(&self, name: &str) -> Option<ExpressionType> {
        self.values
            .borrow()
            .contains_key(name)
            .then_some(ExpressionType::String)
    }

    fn string(&self, name: &str) -> Result<Option<String>, EvalError> {
        match self.values.borrow().get(name) {
            Some(v) => Ok(Some(v.clone())),
            None => Err(EvalError::UnknownMacro(CompactString::new(name))),
        }
    }
}

/// Column storage for [`TableRowResolver`]. Numeric columns share the `f64`
/// carrier with NaN as the missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<f64>),
    Double(Vec<f64>),
    String(Vec<Option<String>>),
    Boolean(Vec<Option<bool>>),
    Instant(Vec<Option<DateTime<Utc>>>),
}

impl ColumnData {
    fn ty(&self) -> ExpressionType {
        match self {
            ColumnData::Integer(_) => ExpressionType::Integer,
            ColumnData::Double(_) => ExpressionType::Double,
            ColumnData::String(_) => ExpressionType::String,
            ColumnData::Boolean(_) => ExpressionType::Boolean,
            ColumnData::Instant(_) => ExpressionType::Instant,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    name: CompactString,
    data: ColumnData,
}

impl TableColumn {
    pub fn new(name: &str, data: ColumnData) -> Self {
        Self {
            name: CompactString::new(name),
            data,
        }
    }

    pub fn integer(name: &str, values: Vec<f64>) -> Self {
        Self::new(name, ColumnData::Integer(values))
    }

    pub fn double(name: &str, values: Vec<f64>) -> Self {
        Self::new(name, ColumnData::Double(values))
    }

    pub fn string(name: &str, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::String(values))
    }

    pub fn boolean(name: &str, values: Vec<Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values))
    }

    pub fn instant(name: &str, values: Vec<Option<DateTime<Utc>>>) -> Self {
        Self::new(name, ColumnData::Instant(values))
    }
}

/// Resolves column names against a table, reading from the current row
/// cursor. Reading past the end of a column yields the missing value, so an
/// expression built once can be driven over any number of rows via
/// [`TableRowResolver::set_row`].
#[derive(Debug, Default)]
pub struct TableRowResolver {
    columns: Vec<TableColumn>,
    row: Cell<usize>,
}

impl TableRowResolver {
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            row: Cell::new(0),
        }
    }

    pub fn set_row(&self, row: usize) {
        self.row.set(row);
    }

    pub fn row(&self) -> usize {
        self.row.get()
    }

    fn find(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl Resolver for TableRowResolver {
    fn variables(&self) -> Vec<VariableInfo> {
        self.columns
            .iter()
            .map(|c| VariableInfo {
                name: c.name.clone(),
                ty: c.data.ty(),
                category: Category::Dynamic,
            })
            .collect()
    }

    fn variable_type(&self, name: &str) -> Option<ExpressionType> {
        self.find(name).map(|c| c.data.ty())
    }

    fn double(&self, name: &str) -> Result<f64, EvalError> {
        match self.find(name) {
            Some(TableColumn {
                data: ColumnData::Integer(values) | ColumnData::Double(values),
                ..
            }) => Ok(values.get(self.row.get()).copied().unwrap_or(f64::NAN)),
            Some(c) => Err(mismatch(name, c.data.ty())),
            None => Err(unknown(name)),
        }
    }

    fn boolean(&self, name: &str) -> Result<Option<bool>, EvalError> {
        match self.find(name) {
            Some(TableColumn {
                data: ColumnData::Boolean(values),
                ..
            }) => Ok(values.get(self.row.get()).copied().flatten()),
            Some(c) => Err(mismatch(name, c.data.ty())),
            None => Err(unknown(name)),
        }
    }

    fn string(&self, name: &str) -> Result<Option<String>, EvalError> {
        match self.find(name) {
            Some(TableColumn {
                data: ColumnData::String(values),
                ..
            }) => Ok(values.get(self.row.get()).cloned().flatten()),
            Some(c) => Err(mismatch(name, c.data.ty())),
            None => Err(unknown(name)),
        }
    }

    fn instant(&self, name: &str) -> Result<Option<DateTime<Utc>>, EvalError> {
        match self.find(name) {
            Some(TableColumn {
                data: ColumnData::Instant(values),
                ..
            }) => Ok(values.get(self.row.get()).copied().flatten()),
            Some(c) => Err(mismatch(name, c.data.ty())),
            None => Err(unknown(name)),
        }
    }
}
