use crate::entities::payment_available::PaymentMethodType;
use crate::error::{AppError, AppResult};

/// Form-style truthiness: blank strings and zero count as "not provided"
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Truthy for i32 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for i64 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for PaymentMethodType {
    fn is_truthy(&self) -> bool {
        true
    }
}

/// Collects every missing required field so one 400 names them all
#[derive(Debug, Default)]
pub struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    /// Returns the value, or records `name` and hands back a placeholder
    /// that is never used because `finish` fails.
    pub fn take<T: Truthy + Default>(&mut self, name: &'static str, value: Option<T>) -> T {
        match value {
            Some(v) if v.is_truthy() => v,
            _ => {
                self.missing.push(name);
                T::default()
            }
        }
    }

    pub fn finish(self) -> AppResult<()> {
        if self.missing.is_empty() {
            return Ok(());
        }
        Err(AppError::Validation(format!(
            "Missing required fields: {}",
            self.missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_zero_are_missing() {
        let mut required = Required::default();
        assert_eq!(required.take("name", Some("  ".to_string())), "");
        assert_eq!(required.take("amount", Some(0i64)), 0);
        assert_eq!(required.take("bookingId", None::<i32>), 0);
        assert_eq!(required.take("adults", Some(2i32)), 2);

        let err = required.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: name, amount, bookingId"
        );
    }

    #[test]
    fn test_all_present_passes() {
        let mut required = Required::default();
        required.take("email", Some("siti@example.com".to_string()));
        assert!(required.finish().is_ok());
    }
}
