// Field Validators - Reusable validation components
use std::fmt::Display;

/// Trait for field validators
pub trait FieldValidator<T> {
    /// Validate a field value
    fn validate(&self, value: &T) -> Result<(), String>;
}

/// One end of a numeric range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound<T> {
    pub value: T,
    pub inclusive: bool,
}

/// Range validator for numeric types with inclusive or exclusive ends
#[derive(Debug, Clone, PartialEq)]
pub struct RangeValidator<T> {
    min: Option<Bound<T>>,
    max: Option<Bound<T>>,
}

impl<T> Default for RangeValidator<T>
where
    T: PartialOrd + Display + Copy,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> RangeValidator<T>
where
    T: PartialOrd + Display + Copy,
{
    /// Create a new range validator with no constraints
    pub const fn empty() -> Self {
        Self { min: None, max: None }
    }

    /// Closed interval `[min, max]`
    pub fn new(min: T, max: T) -> Self {
        Self::empty().min(min).max(max)
    }

    /// Open interval `(min, max)`
    pub fn exclusive(min: T, max: T) -> Self {
        Self::empty().gt(min).lt(max)
    }

    /// Value must be `>= min`
    pub fn min(mut self, min: T) -> Self {
        self.min = Some(Bound { value: min, inclusive: true });
        self
    }

    /// Value must be `> min`
    pub fn gt(mut self, min: T) -> Self {
        self.min = Some(Bound { value: min, inclusive: false });
        self
    }

    /// Value must be `<= max`
    pub fn max(mut self, max: T) -> Self {
        self.max = Some(Bound { value: max, inclusive: true });
        self
    }

    /// Value must be `< max`
    pub fn lt(mut self, max: T) -> Self {
        self.max = Some(Bound { value: max, inclusive: false });
        self
    }

    /// Lower bound, if any
    pub const fn lower(&self) -> Option<&Bound<T>> {
        self.min.as_ref()
    }

    /// Upper bound, if any
    pub const fn upper(&self) -> Option<&Bound<T>> {
        self.max.as_ref()
    }

    /// Whether `value` lies inside the range
    pub fn contains(&self, value: T) -> bool {
        self.validate(&value).is_ok()
    }

    /// Whether `value` violates the lower bound
    pub fn below_lower(&self, value: T) -> bool {
        self.min.as_ref().is_some_and(|min| {
            if min.inclusive {
                value < min.value
            } else {
                value <= min.value
            }
        })
    }

    /// Whether `value` violates the upper bound
    pub fn above_upper(&self, value: T) -> bool {
        self.max.as_ref().is_some_and(|max| {
            if max.inclusive {
                value > max.value
            } else {
                value >= max.value
            }
        })
    }
}

impl<T> FieldValidator<T> for RangeValidator<T>
where
    T: PartialOrd + Display + Copy,
{
    fn validate(&self, value: &T) -> Result<(), String> {
        if let Some(min) = self.min.as_ref().filter(|_| self.below_lower(*value)) {
            return Err(if min.inclusive {
                format!("Number must be greater than or equal to {}", min.value)
            } else {
                format!("Number must be greater than {}", min.value)
            });
        }

        if let Some(max) = self.max.as_ref().filter(|_| self.above_upper(*value)) {
            return Err(if max.inclusive {
                format!("Number must be less than or equal to {}", max.value)
            } else {
                format!("Number must be less than {}", max.value)
            });
        }

        Ok(())
    }
}

/// Collection size validator (checks a length)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionValidator {
    min_size: Option<usize>,
}

impl CollectionValidator {
    /// Create a new collection validator
    pub const fn new() -> Self {
        Self { min_size: None }
    }

    /// Set minimum size
    pub const fn min_size(mut self, min: usize) -> Self {
        self.min_size = Some(min);
        self
    }
}

impl FieldValidator<usize> for CollectionValidator {
    fn validate(&self, len: &usize) -> Result<(), String> {
        match self.min_size {
            Some(min) if *len < min => Err(format!("Array must contain at least {min} element(s)")),
            _ => Ok(()),
        }
    }
}
