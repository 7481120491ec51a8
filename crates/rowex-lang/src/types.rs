use std::fmt::{self, Display, Formatter};

/// The closed set of types an expression or subexpression can have.
///
/// `Integer` and `Double` share `f64` as their runtime carrier; `Integer` is a
/// static tag only. `f64::NAN` is the missing marker for numeric values, all
/// other carriers use `Option` with `None` as the missing marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionType {
    Integer,
    Double,
    String,
    Boolean,
    Instant,
    LocalTime,
    StringSet,
    StringList,
}

impl ExpressionType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ExpressionType::Integer | ExpressionType::Double)
    }

    /// The name used in type-error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            ExpressionType::Integer => "integer",
            ExpressionType::Double => "real",
            ExpressionType::String => "nominal",
            ExpressionType::Boolean => "boolean",
            ExpressionType::Instant => "date-time",
            ExpressionType::LocalTime => "time",
            ExpressionType::StringSet => "text-set",
            ExpressionType::StringList => "text-list",
        }
    }
}

impl Display for ExpressionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
