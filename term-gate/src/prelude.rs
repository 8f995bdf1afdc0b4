//! Prelude for commonly used types and traits in term-gate.

pub use crate::checks::{
    where_eq, where_not, where_op, CheckSpec, DbChecker, GroupingMode, InMemoryChecker, Rule,
    SqlChecker,
};
pub use crate::core::{
    validate, Message, MessageContext, Schema, ValidateOptions, ValidationConfig,
    ValidationContext, ValidationErrors,
};
pub use crate::error::{Result, TermError};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::logging::LogConfig;
pub use crate::validators::{
    ArrayValidator, BoolValidator, EnumValidator, FileValidator, LiteralValidator,
    NumberValidator, ObjectValidator, OptionalValidator, StringValidator, UnionValidator,
    Validator,
};
pub use crate::DataObject;
