//! Declarative object contracts over `serde_json::Value`.
//!
//! A [`Contract`] lists fields in declaration order. Validation walks the
//! input once, collects every violation with its full path, applies declared
//! defaults and returns the normalized object. Closed contracts reject keys
//! they do not declare; open contracts copy them through unchanged. Nested
//! contracts follow the openness of the outermost contract being validated.

use std::sync::Arc;

use serde_json::{Map, Number, Value};

use super::validators::{CollectionValidator, RangeValidator};
use super::{IssueCode, ValidationContext, ValidationResult, Validator};

/// Treatment of undeclared keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Openness {
    /// Undeclared keys are violations
    Closed,
    /// Undeclared keys are preserved
    Open,
}

/// What happens when a field is absent
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    /// Absent stays absent
    Optional,
    /// Absent is replaced by the value
    Defaulted(Value),
}

/// Accepted shape of a field value
#[derive(Debug, Clone)]
pub enum FieldType {
    Bool,
    Int(RangeValidator<i64>),
    Number(RangeValidator<f64>),
    String,
    Array { items: Box<FieldType>, length: CollectionValidator },
    Object(Arc<Contract>),
    /// String-keyed map with uniform values
    Record(Box<FieldType>),
    /// The inner type or `null`
    Nullable(Box<FieldType>),
    /// First alternative that accepts the value
    Union(Vec<FieldType>),
    /// Exactly one of the listed literals
    OneOf(Vec<Value>),
}

impl FieldType {
    /// Unbounded integer
    pub const fn int() -> Self {
        Self::Int(RangeValidator::empty())
    }

    /// Unbounded number
    pub const fn number() -> Self {
        Self::Number(RangeValidator::empty())
    }

    /// Array of `items`
    pub fn array(items: Self) -> Self {
        Self::Array { items: Box::new(items), length: CollectionValidator::new() }
    }

    /// Array of `items` with at least `min` elements
    pub fn non_empty_array(items: Self, min: usize) -> Self {
        Self::Array { items: Box::new(items), length: CollectionValidator::new().min_size(min) }
    }

    /// Nested object
    pub fn object(contract: &Arc<Contract>) -> Self {
        Self::Object(Arc::clone(contract))
    }

    /// Map from string keys to `values`
    pub fn record(values: Self) -> Self {
        Self::Record(Box::new(values))
    }

    /// Allow `null` in addition to this type
    pub fn nullable(self) -> Self {
        Self::Nullable(Box::new(self))
    }

    /// Any of `options`
    pub const fn union(options: Vec<Self>) -> Self {
        Self::Union(options)
    }

    /// One of the literal `values`
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    fn expected(&self) -> String {
        match self {
            Self::Bool => "boolean".into(),
            Self::Int(_) => "integer".into(),
            Self::Number(_) => "number".into(),
            Self::String => "string".into(),
            Self::Array { .. } => "array".into(),
            Self::Object(_) | Self::Record(_) => "object".into(),
            Self::Nullable(inner) => inner.expected(),
            Self::Union(options) => {
                options.iter().map(Self::expected).collect::<Vec<_>>().join(" | ")
            }
            Self::OneOf(literals) => {
                literals.iter().map(Value::to_string).collect::<Vec<_>>().join(" | ")
            }
        }
    }

    /// Check `value` at the validator's current location and return its
    /// normalized form.
    fn check(&self, value: &Value, openness: Openness, v: &mut Validator) -> Value {
        match (self, value) {
            (Self::Nullable(_), Value::Null) => Value::Null,
            (Self::Nullable(inner), _) => inner.check(value, openness, v),
            (Self::Union(options), _) => {
                for option in options {
                    let mut scratch = Validator::with_context(v.context().clone());
                    let checked = option.check(value, openness, &mut scratch);
                    if !scratch.has_errors() {
                        return checked;
                    }
                }
                v.add_error(
                    IssueCode::InvalidType,
                    format!("Expected {}, received {}", self.expected(), received(value)),
                );
                value.clone()
            }
            (Self::OneOf(literals), _) => {
                if !literals.contains(value) {
                    v.add_error(
                        IssueCode::InvalidLiteral,
                        format!("Invalid enum value. Expected {}, received {value}", self.expected()),
                    );
                }
                value.clone()
            }
            (Self::Bool, Value::Bool(_)) | (Self::String, Value::String(_)) => value.clone(),
            (Self::Int(range), Value::Number(n)) => check_int(n, range, v),
            (Self::Number(range), Value::Number(n)) => {
                let x = n.as_f64().unwrap_or(f64::NAN);
                check_range(x, range, v);
                value.clone()
            }
            (Self::Array { items, length }, Value::Array(elements)) => {
                v.validate_field(&elements.len(), length, IssueCode::TooShort);
                let normalized = elements
                    .iter()
                    .enumerate()
                    .map(|(i, element)| v.nested(i, |v| items.check(element, openness, v)))
                    .collect();
                Value::Array(normalized)
            }
            (Self::Object(contract), Value::Object(map)) => {
                Value::Object(contract.check_object(map, openness, v))
            }
            (Self::Record(values), Value::Object(map)) => {
                let normalized = map
                    .iter()
                    .map(|(key, entry)| {
                        let checked = v.nested(key.as_str(), |v| values.check(entry, openness, v));
                        (key.clone(), checked)
                    })
                    .collect();
                Value::Object(normalized)
            }
            _ => {
                v.add_error(
                    IssueCode::InvalidType,
                    format!("Expected {}, received {}", self.expected(), received(value)),
                );
                value.clone()
            }
        }
    }
}

fn received(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_range<T>(x: T, range: &RangeValidator<T>, v: &mut Validator)
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    let code = if range.below_lower(x) { IssueCode::TooSmall } else { IssueCode::TooBig };
    v.validate_field(&x, range, code);
}

fn check_int(n: &Number, range: &RangeValidator<i64>, v: &mut Validator) -> Value {
    if let Some(i) = n.as_i64() {
        check_range(i, range, v);
        return Value::from(i);
    }

    let x = n.as_f64().unwrap_or(f64::NAN);
    if !x.is_finite() || x.fract() != 0.0 {
        v.add_error(IssueCode::InvalidType, "Expected integer, received float");
        return Value::Number(n.clone());
    }
    if x < i64::MIN as f64 || x > i64::MAX as f64 {
        let code = if x < 0.0 { IssueCode::TooSmall } else { IssueCode::TooBig };
        v.add_error(code, "Number must be a safe integer");
        return Value::Number(n.clone());
    }

    // 1.0 is an integer
    let i = x as i64;
    check_range(i, range, v);
    Value::from(i)
}

/// One declared field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    pub presence: Presence,
}

impl FieldSpec {
    /// Field that must be present
    pub fn required(name: impl Into<String>, ty: FieldType) -> Self {
        Self { name: name.into(), ty, presence: Presence::Required }
    }

    /// Field that may be absent
    pub fn optional(name: impl Into<String>, ty: FieldType) -> Self {
        Self { name: name.into(), ty, presence: Presence::Optional }
    }

    /// Field filled with `default` when absent
    pub fn defaulted(name: impl Into<String>, ty: FieldType, default: impl Into<Value>) -> Self {
        Self { name: name.into(), ty, presence: Presence::Defaulted(default.into()) }
    }
}

/// Named object schema
#[derive(Debug, Clone)]
pub struct Contract {
    name: String,
    openness: Openness,
    fields: Vec<FieldSpec>,
}

impl Contract {
    /// Closed contract for outbound data
    pub fn request(name: impl Into<String>) -> Self {
        Self { name: name.into(), openness: Openness::Closed, fields: Vec::new() }
    }

    /// Open contract for inbound data
    pub fn response(name: impl Into<String>) -> Self {
        Self { name: name.into(), openness: Openness::Open, fields: Vec::new() }
    }

    /// Append a field
    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Append every field of `other`, in order
    #[must_use]
    pub fn extend(mut self, other: &Self) -> Self {
        self.fields.extend(other.fields.iter().cloned());
        self
    }

    /// Finish building
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn openness(&self) -> Openness {
        self.openness
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a declared field
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared defaults, keyed by field name
    pub fn defaults(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|f| match &f.presence {
                Presence::Defaulted(value) => Some((f.name.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    /// Validate `value` and return the normalized object.
    ///
    /// # Errors
    /// Returns every violation found, in declaration order, depth-first.
    pub fn validate(&self, value: &Value) -> ValidationResult<Map<String, Value>> {
        let mut validator = Validator::with_context(ValidationContext::new());
        let normalized = match value {
            Value::Object(map) => self.check_object(map, self.openness, &mut validator),
            other => {
                validator.add_error(
                    IssueCode::InvalidType,
                    format!("Expected object, received {}", received(other)),
                );
                Map::new()
            }
        };
        validator.finish(normalized)
    }

    fn check_object(
        &self,
        map: &Map<String, Value>,
        openness: Openness,
        v: &mut Validator,
    ) -> Map<String, Value> {
        let mut out = Map::new();

        for spec in &self.fields {
            match (map.get(&spec.name), &spec.presence) {
                (Some(value), _) => {
                    let checked = v.nested(spec.name.as_str(), |v| spec.ty.check(value, openness, v));
                    out.insert(spec.name.clone(), checked);
                }
                (None, Presence::Required) => {
                    v.add_field_error(spec.name.as_str(), IssueCode::Missing, "Required");
                }
                (None, Presence::Optional) => {}
                (None, Presence::Defaulted(default)) => {
                    out.insert(spec.name.clone(), default.clone());
                }
            }
        }

        for (key, value) in map {
            if self.get(key).is_some() {
                continue;
            }
            match openness {
                Openness::Closed => {
                    v.add_field_error(
                        key.as_str(),
                        IssueCode::UnknownField,
                        format!("Unrecognized key: '{key}'"),
                    );
                }
                Openness::Open => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for validation::contract.
    use serde_json::json;

    use super::*;

    fn point() -> Arc<Contract> {
        Contract::request("Point")
            .field(FieldSpec::required("y_pred", FieldType::Int(RangeValidator::new(0, 1))))
            .field(FieldSpec::optional("lat", FieldType::number().nullable()))
            .shared()
    }

    fn request() -> Contract {
        Contract::request("Request")
            .field(FieldSpec::required(
                "points",
                FieldType::non_empty_array(FieldType::object(&point()), 1),
            ))
            .field(FieldSpec::optional("regions", FieldType::array(FieldType::number())))
            .field(FieldSpec::defaulted(
                "signif_level",
                FieldType::Number(RangeValidator::exclusive(0.0, 1.0)),
                0.005,
            ))
            .field(FieldSpec::defaulted("equal_opp", FieldType::Bool, true))
    }

    /// Validates default injection on an otherwise minimal object.
    ///
    /// Assertions:
    /// - Defaulted fields are filled.
    /// - Optional fields without defaults stay absent.
    #[test]
    fn test_defaults_applied_and_optionals_left_absent() {
        let out = request().validate(&json!({ "points": [{ "y_pred": 1 }] })).unwrap();

        assert_eq!(out["signif_level"], json!(0.005));
        assert_eq!(out["equal_opp"], json!(true));
        assert!(!out.contains_key("regions"));
        assert!(!out["points"][0].as_object().unwrap().contains_key("lat"));
    }

    /// Validates that every violation is collected.
    ///
    /// Assertions:
    /// - Bounds, types and unknown keys are each reported with their path.
    /// - Order follows declaration order, depth-first, unknown keys last.
    #[test]
    fn test_collects_every_violation_in_order() {
        let err = request()
            .validate(&json!({
                "points": [{ "y_pred": 2 }, { "y_pred": 1.5, "lat": "north" }],
                "signif_level": 1.5,
                "colour": "red"
            }))
            .unwrap_err();

        let fields: Vec<&str> = err.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["points[0].y_pred", "points[1].y_pred", "points[1].lat", "signif_level", "colour"]
        );
        assert_eq!(err.errors[0].code, IssueCode::TooBig);
        assert_eq!(err.errors[1].message, "Expected integer, received float");
        assert_eq!(err.errors[2].message, "Expected number, received string");
        assert_eq!(err.errors[3].message, "Number must be less than 1");
        assert_eq!(err.errors[4].code, IssueCode::UnknownField);
    }

    #[test]
    fn test_missing_required_field() {
        let err = request().validate(&json!({})).unwrap_err();

        assert_eq!(err.error_count(), 1);
        assert_eq!(err.errors[0].field, "points");
        assert!(err.errors[0].is_missing());
    }

    #[test]
    fn test_empty_array_below_minimum() {
        let err = request().validate(&json!({ "points": [] })).unwrap_err();

        assert_eq!(err.errors[0].field, "points");
        assert_eq!(err.errors[0].code, IssueCode::TooShort);
        assert_eq!(err.errors[0].message, "Array must contain at least 1 element(s)");
    }

    #[test]
    fn test_null_only_for_nullable_fields() {
        let ok = request().validate(&json!({ "points": [{ "y_pred": 0, "lat": null }] })).unwrap();
        assert_eq!(ok["points"][0]["lat"], Value::Null);

        let err = request()
            .validate(&json!({ "points": [{ "y_pred": 0 }], "equal_opp": null }))
            .unwrap_err();
        assert_eq!(err.errors[0].field, "equal_opp");
        assert_eq!(err.errors[0].message, "Expected boolean, received null");
    }

    #[test]
    fn test_integral_float_accepted_as_integer() {
        let out = request().validate(&json!({ "points": [{ "y_pred": 1.0 }] })).unwrap();
        assert_eq!(out["points"][0]["y_pred"], json!(1));
    }

    /// Validates open contracts and inherited openness.
    ///
    /// Assertions:
    /// - Unknown keys survive at the top level and inside nested contracts
    ///   reached from an open contract.
    #[test]
    fn test_open_contract_preserves_unknown_keys_at_every_depth() {
        let entry = Contract::request("Entry")
            .field(FieldSpec::required("idx", FieldType::int()))
            .shared();
        let response = Contract::response("Response")
            .field(FieldSpec::required("stats", FieldType::array(FieldType::object(&entry))));

        let out = response
            .validate(&json!({ "stats": [{ "idx": 0, "note": "x" }], "runtime_ms": 12 }))
            .unwrap();

        assert_eq!(out["runtime_ms"], json!(12));
        assert_eq!(out["stats"][0]["note"], json!("x"));
    }

    #[test]
    fn test_record_values_checked() {
        let matrix = Contract::response("Matrix").field(FieldSpec::required(
            "pearson",
            FieldType::record(FieldType::record(FieldType::number())),
        ));

        assert!(matrix.validate(&json!({ "pearson": { "a": { "a": 1.0, "b": 0.2 } } })).is_ok());
        let err = matrix.validate(&json!({ "pearson": { "a": { "b": "x" } } })).unwrap_err();
        assert_eq!(err.errors[0].field, "pearson.a.b");
    }

    #[test]
    fn test_union_accepts_any_alternative() {
        let issue = Contract::response("Issue").field(FieldSpec::required(
            "loc",
            FieldType::array(FieldType::union(vec![FieldType::String, FieldType::int()])),
        ));

        assert!(issue.validate(&json!({ "loc": ["body", "indiv_info", 0] })).is_ok());
        let err = issue.validate(&json!({ "loc": ["body", true] })).unwrap_err();
        assert_eq!(err.errors[0].field, "loc[1]");
        assert_eq!(err.errors[0].message, "Expected string | integer, received boolean");
    }

    #[test]
    fn test_one_of_accepts_only_listed_literals() {
        let options = Contract::request("Options").field(FieldSpec::defaulted(
            "method",
            FieldType::one_of(["pearson", "spearman"]),
            "pearson",
        ));

        assert_eq!(options.validate(&json!({})).unwrap()["method"], json!("pearson"));
        assert!(options.validate(&json!({ "method": "spearman" })).is_ok());

        let err = options.validate(&json!({ "method": "kendall" })).unwrap_err();
        assert_eq!(err.errors[0].field, "method");
        assert_eq!(err.errors[0].code, IssueCode::InvalidLiteral);
        assert_eq!(
            err.errors[0].message,
            r#"Invalid enum value. Expected "pearson" | "spearman", received "kendall""#
        );
    }

    #[test]
    fn test_one_of_rejects_other_types() {
        let label = Contract::request("Label")
            .field(FieldSpec::required("y_true", FieldType::one_of([0, 1]).nullable()));

        assert!(label.validate(&json!({ "y_true": null })).is_ok());
        let err = label.validate(&json!({ "y_true": "1" })).unwrap_err();
        assert_eq!(err.errors[0].message, r#"Invalid enum value. Expected 0 | 1, received "1""#);
    }

    #[test]
    fn test_non_object_root_rejected() {
        let err = request().validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.errors[0].field, "");
        assert_eq!(err.errors[0].message, "Expected object, received array");
    }

    #[test]
    fn test_defaults_listing() {
        let defaults = request().defaults();
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults["equal_opp"], json!(true));
    }
}
