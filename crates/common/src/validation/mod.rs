// Validation Module - contract validation framework
use std::fmt;

mod contract;
mod path;
mod validators;

pub use contract::{Contract, FieldSpec, FieldType, Openness, Presence};
pub use path::{render_path, PathSegment};
pub use validators::{Bound, CollectionValidator, FieldValidator, RangeValidator};

/// Type alias for validation results
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Machine-readable category of a field violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCode {
    /// Required field absent
    Missing,
    /// Value has the wrong JSON type
    InvalidType,
    /// Number below its lower bound
    TooSmall,
    /// Number above its upper bound
    TooBig,
    /// Array shorter than its minimum length
    TooShort,
    /// Key not declared by a closed contract
    UnknownField,
    /// Value outside an enumerated set of literals
    InvalidLiteral,
}

impl IssueCode {
    /// Stable snake_case identifier
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::InvalidType => "invalid_type",
            Self::TooSmall => "too_small",
            Self::TooBig => "too_big",
            Self::TooShort => "too_short",
            Self::UnknownField => "unrecognized_keys",
            Self::InvalidLiteral => "invalid_literal",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation error with detailed field-level errors, in discovery order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Create a new validation error
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Create with a single top-level field error
    pub fn field(field: impl Into<String>, code: IssueCode, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.errors.push(FieldError::new(vec![PathSegment::Key(field.into())], code, message));
        err
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Get errors for a specific rendered path
    pub fn field_errors(&self, field: &str) -> Vec<&FieldError> {
        self.errors.iter().filter(|e| e.field == field).collect()
    }

    /// Merge another validation error into this one
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "Validation error with no specific field errors")?;
        } else if self.errors.len() == 1 {
            write!(f, "Validation failed: {}: {}", self.errors[0].field, self.errors[0].message)?;
        } else {
            write!(f, "Validation failed with {} errors: ", self.errors.len())?;
            for (i, error) in self.errors.iter().enumerate() {
                if i > 0 {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", error.field, error.message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Individual field error
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// Structured location
    pub path: Vec<PathSegment>,
    /// Location rendered as `a.b[0].c`
    pub field: String,
    pub message: String,
    pub code: IssueCode,
}

impl FieldError {
    /// Create a new field error
    pub fn new(path: Vec<PathSegment>, code: IssueCode, message: impl Into<String>) -> Self {
        let field = render_path(&path);
        Self { path, field, message: message.into(), code }
    }

    /// Whether this reports an absent required field
    pub fn is_missing(&self) -> bool {
        self.code == IssueCode::Missing
    }
}

/// Validation context for tracking the current location
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub path: Vec<PathSegment>,
}

impl ValidationContext {
    /// Create a new validation context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add path segment for nested validation
    pub fn push_path(&mut self, segment: impl Into<PathSegment>) {
        self.path.push(segment.into());
    }

    /// Remove last path segment
    pub fn pop_path(&mut self) {
        self.path.pop();
    }

    /// Get current path as string
    pub fn current_path(&self) -> String {
        render_path(&self.path)
    }
}

/// Collects field errors while walking a document
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationError,
    context: ValidationContext,
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with context
    pub fn with_context(context: ValidationContext) -> Self {
        Self { errors: ValidationError::new(), context }
    }

    /// Record an error at the current location
    pub fn add_error(&mut self, code: IssueCode, message: impl Into<String>) {
        self.errors.errors.push(FieldError::new(self.context.path.clone(), code, message));
    }

    /// Record an error on a child of the current location
    pub fn add_field_error(
        &mut self,
        field: impl Into<PathSegment>,
        code: IssueCode,
        message: impl Into<String>,
    ) {
        self.nested(field, |v| v.add_error(code, message));
    }

    /// Validate a value at the current location with a specific validator
    pub fn validate_field<T, V>(&mut self, value: &T, validator: &V, code: IssueCode) -> bool
    where
        V: FieldValidator<T> + ?Sized,
    {
        match validator.validate(value) {
            Ok(()) => true,
            Err(msg) => {
                self.add_error(code, msg);
                false
            }
        }
    }

    /// Run `f` one level deeper
    pub fn nested<F, R>(&mut self, segment: impl Into<PathSegment>, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.context.push_path(segment);
        let result = f(self);
        self.context.pop_path();
        result
    }

    /// Current location
    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    /// Check if validation has errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        self.errors.error_count()
    }

    /// Get errors without consuming validator
    pub fn errors(&self) -> &ValidationError {
        &self.errors
    }

    /// Finalize and return `value` if nothing was reported
    pub fn finish<T>(self, value: T) -> ValidationResult<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for validation::mod.
    use super::*;

    /// Validates `Validator::nested` path tracking.
    ///
    /// Assertions:
    /// - Errors reported inside nested scopes carry the full rendered path.
    /// - The path is restored after leaving each scope.
    #[test]
    fn test_nested_errors_carry_full_path() {
        let mut validator = Validator::new();
        validator.nested("indiv_info", |v| {
            v.nested(3, |v| v.add_field_error("y_pred", IssueCode::TooBig, "too big"));
        });
        validator.add_field_error("n_worlds", IssueCode::TooSmall, "too small");

        let err = validator.finish(()).unwrap_err();
        assert_eq!(err.errors[0].field, "indiv_info[3].y_pred");
        assert_eq!(err.errors[1].field, "n_worlds");
        assert!(err.field_errors("n_worlds")[0].code == IssueCode::TooSmall);
    }

    /// Validates `Validator::validate_field` with a range validator.
    ///
    /// Assertions:
    /// - A violating value is recorded with the given code.
    /// - A passing value leaves no error.
    #[test]
    fn test_validate_field_records_code() {
        let mut validator = Validator::new();
        let range = RangeValidator::exclusive(0.0, 1.0);

        assert!(validator.nested("signif_level", |v| v.validate_field(
            &0.01,
            &range,
            IssueCode::TooBig
        )));
        assert!(!validator.nested("signif_level", |v| v.validate_field(
            &1.5,
            &range,
            IssueCode::TooBig
        )));

        assert_eq!(validator.error_count(), 1);
        assert_eq!(validator.errors().errors[0].message, "Number must be less than 1");
    }

    #[test]
    fn test_display_lists_every_error() {
        let mut err = ValidationError::field("a", IssueCode::Missing, "Required");
        err.merge(ValidationError::field("b", IssueCode::InvalidType, "Expected number"));

        assert_eq!(
            err.to_string(),
            "Validation failed with 2 errors: a: Required; b: Expected number"
        );
    }
}
