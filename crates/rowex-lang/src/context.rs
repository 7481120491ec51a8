use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use chrono::{DateTime, NaiveTime, Utc};
use compact_str::CompactString;
use rustc_hash::FxHashSet;

use crate::eval::error::EvalError;
use crate::functions::{Function, FunctionRegistry};
use crate::resolver::SimpleConstantResolver;
use crate::types::ExpressionType;
use crate::value::{StringList, StringSet};

/// Which namespace a resolver serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Named constants, addressed as bare identifiers.
    Constant,
    /// Scope values, addressed as `%{name}` or `#{name}`.
    Scope,
    /// Per-row data, addressed as bare identifiers or `[name]`.
    Dynamic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: CompactString,
    pub ty: ExpressionType,
    pub category: Category,
}

/// A source of named values. Implementors advertise their names and types and
/// hand out values through the typed getters; a getter is only called after
/// [`Resolver::variable_type`] reported a matching type for the name.
pub trait Resolver {
    fn variables(&self) -> Vec<VariableInfo>;

    fn variable_type(&self, name: &str) -> Option<ExpressionType>;

    /// Session constants never change for the lifetime of the context, so
    /// references to them may be folded at build time.
    fn is_session_constant(&self, _name: &str) -> bool {
        false
    }

    fn double(&self, name: &str) -> Result<f64, EvalError> {
        Err(EvalError::UnknownVariable(CompactString::new(name)))
    }

    fn boolean(&self, name: &str) -> Result<Option<bool>, EvalError> {
        Err(EvalError::UnknownVariable(CompactString::new(name)))
    }

    fn string(&self, name: &str) -> Result<Option<String>, EvalError> {
        Err(EvalError::UnknownVariable(CompactString::new(name)))
    }

    fn instant(&self, name: &str) -> Result<Option<DateTime<Utc>>, EvalError> {
        Err(EvalError::UnknownVariable(CompactString::new(name)))
    }

    fn local_time(&self, name: &str) -> Result<Option<NaiveTime>, EvalError> {
        Err(EvalError::UnknownVariable(CompactString::new(name)))
    }

    fn string_set(&self, name: &str) -> Result<Option<StringSet>, EvalError> {
        Err(EvalError::UnknownVariable(CompactString::new(name)))
    }

    fn string_list(&self, name: &str) -> Result<Option<StringList>, EvalError> {
        Err(EvalError::UnknownVariable(CompactString::new(name)))
    }
}

/// The function registry plus the resolvers an expression is built against.
///
/// Bare identifiers resolve against the constant resolvers first, then the
/// dynamic ones, each list in declaration order; the first resolver that
/// knows the name wins.
pub struct ExpressionContext {
    registry: FunctionRegistry,
    constant_resolvers: Vec<Rc<dyn Resolver>>,
    dynamic_resolvers: Vec<Rc<dyn Resolver>>,
    scope_resolvers: Vec<Rc<dyn Resolver>>,
    scope_constant_resolvers: Vec<Rc<dyn Resolver>>,
}

impl ExpressionContext {
    pub fn new(registry: FunctionRegistry) -> Self {
        Self {
            registry,
            constant_resolvers: Vec::new(),
            dynamic_resolvers: Vec::new(),
            scope_resolvers: Vec::new(),
            scope_constant_resolvers: Vec::new(),
        }
    }

    pub fn add_constant_resolver(&mut self, resolver: Rc<dyn Resolver>) -> &mut Self {
        self.constant_resolvers.push(resolver);
        self
    }

    pub fn add_dynamic_resolver(&mut self, resolver: Rc<dyn Resolver>) -> &mut Self {
        self.dynamic_resolvers.push(resolver);
        self
    }

    pub fn add_scope_resolver(&mut self, resolver: Rc<dyn Resolver>) -> &mut Self {
        self.scope_resolvers.push(resolver);
        self
    }

    pub fn add_scope_constant_resolver(&mut self, resolver: Rc<dyn Resolver>) -> &mut Self {
        self.scope_constant_resolvers.push(resolver);
        self
    }

    pub fn function(&self, name: &str) -> Option<Rc<Function>> {
        self.registry.get(name)
    }

    pub fn resolve_variable(&self, name: &str) -> Option<(Rc<dyn Resolver>, ExpressionType)> {
        resolve(
            self.constant_resolvers
                .iter()
                .chain(self.dynamic_resolvers.iter()),
            name,
        )
    }

    pub fn resolve_scope(&self, name: &str) -> Option<(Rc<dyn Resolver>, ExpressionType)> {
        resolve(self.scope_resolvers.iter(), name)
    }

    pub fn resolve_scope_constant(&self, name: &str) -> Option<(Rc<dyn Resolver>, ExpressionType)> {
        resolve(self.scope_constant_resolvers.iter(), name)
    }

    /// Every visible variable, shadowed names elided per category.
    pub fn all_variables(&self) -> Vec<VariableInfo> {
        let mut seen: FxHashSet<(Category, CompactString)> = FxHashSet::default();
        let mut out = Vec::new();

        let lists = [
            &self.constant_resolvers,
            &self.dynamic_resolvers,
            &self.scope_resolvers,
            &self.scope_constant_resolvers,
        ];
        for resolvers in lists {
            for resolver in resolvers {
                for info in resolver.variables() {
                    if seen.insert((info.category, info.name.clone())) {
                        out.push(info);
                    }
                }
            }
        }
        out
    }
}

fn resolve<'a>(
    resolvers: impl Iterator<Item = &'a Rc<dyn Resolver>>,
    name: &str,
) -> Option<(Rc<dyn Resolver>, ExpressionType)> {
    let mut resolvers = resolvers;
    resolvers.find_map(|r| r.variable_type(name).map(|ty| (Rc::clone(r), ty)))
}

impl Default for ExpressionContext {
    fn default() -> Self {
        let mut context = Self::new(FunctionRegistry::standard());
        context.add_constant_resolver(Rc::new(SimpleConstantResolver::standard()));
        context
    }
}

impl Debug for ExpressionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionContext")
            .field("functions", &self.registry.len())
            .field("constant_resolvers", &self.constant_resolvers.len())
            .field("dynamic_resolvers", &self.dynamic_resolvers.len())
            .field("scope_resolvers", &self.scope_resolvers.len())
            .field(
                "scope_constant_resolvers",
                &self.scope_constant_resolvers.len(),
            )
            .finish()
    }
}
