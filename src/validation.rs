//! Request field predicates.
//!
//! Every predicate is total: absent, null and empty inputs simply fail the
//! check. They test shape only; range rules (years, password policy, role
//! numbers) belong to the handler that owns the field.

use serde_json::Value;
use std::borrow::Cow;

/// A request field that can be checked: a JSON body value, a path segment, or
/// an optional query parameter.
pub trait Candidate {
    /// String form of the value, or `None` when absent/null
    fn text(&self) -> Option<Cow<'_, str>>;

    /// True when the value is natively a string
    fn is_string(&self) -> bool;

    /// True when the value is natively a number
    fn is_number(&self) -> bool;
}

impl Candidate for Value {
    fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    fn is_string(&self) -> bool {
        Value::is_string(self)
    }

    fn is_number(&self) -> bool {
        Value::is_number(self)
    }
}

impl Candidate for str {
    fn text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }

    fn is_string(&self) -> bool {
        true
    }

    fn is_number(&self) -> bool {
        false
    }
}

impl Candidate for String {
    fn text(&self) -> Option<Cow<'_, str>> {
        self.as_str().text()
    }

    fn is_string(&self) -> bool {
        true
    }

    fn is_number(&self) -> bool {
        false
    }
}

impl<T: Candidate> Candidate for Option<T> {
    fn text(&self) -> Option<Cow<'_, str>> {
        self.as_ref().and_then(Candidate::text)
    }

    fn is_string(&self) -> bool {
        self.as_ref().is_some_and(Candidate::is_string)
    }

    fn is_number(&self) -> bool {
        self.as_ref().is_some_and(Candidate::is_number)
    }
}

impl<T: Candidate + ?Sized> Candidate for &T {
    fn text(&self) -> Option<Cow<'_, str>> {
        (**self).text()
    }

    fn is_string(&self) -> bool {
        (**self).is_string()
    }

    fn is_number(&self) -> bool {
        (**self).is_number()
    }
}

/// True iff the value is a string with at least one character
pub fn is_string_provided<C: Candidate + ?Sized>(candidate: &C) -> bool {
    candidate.is_string() && candidate.text().is_some_and(|s| !s.is_empty())
}

/// True iff the value is a number, or a non-empty value whose string form
/// parses to a finite number
pub fn is_number_provided<C: Candidate + ?Sized>(candidate: &C) -> bool {
    if candidate.is_number() {
        return true;
    }
    candidate.text().is_some_and(|s| {
        let s = s.trim();
        !s.is_empty() && s.parse::<f64>().is_ok_and(f64::is_finite)
    })
}

/// True iff the value's string form is exactly 13 ASCII digits
pub fn valid_isbn13<C: Candidate + ?Sized>(candidate: &C) -> bool {
    candidate
        .text()
        .is_some_and(|s| s.len() == 13 && all_digits(&s))
}

/// True iff the value's string form is a non-negative integer (digits only)
pub fn valid_rating_or_year<C: Candidate + ?Sized>(candidate: &C) -> bool {
    candidate.text().is_some_and(|s| all_digits(&s))
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Normalized ISBN-13 string when the value is valid
pub fn isbn13<C: Candidate + ?Sized>(candidate: &C) -> Option<String> {
    if valid_isbn13(candidate) {
        candidate.text().map(Cow::into_owned)
    } else {
        None
    }
}

/// Non-negative count or year that fits the store's INT columns
pub fn non_negative_int<C: Candidate + ?Sized>(candidate: &C) -> Option<i32> {
    if !valid_rating_or_year(candidate) {
        return None;
    }
    candidate.text().and_then(|s| s.parse::<i32>().ok())
}

/// Signed integer (e.g. a rating delta); rejects decimals and non-numbers
pub fn signed_int<C: Candidate + ?Sized>(candidate: &C) -> Option<i32> {
    if !is_number_provided(candidate) {
        return None;
    }
    candidate.text().and_then(|s| s.trim().parse::<i32>().ok())
}

/// Borrow the string content when the value is a provided string
pub fn provided_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// Minimum password length accepted at registration and password change
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum phone length (digits and separators) accepted at registration
pub const MIN_PHONE_LENGTH: usize = 10;

/// Roles are numbered 1 (lowest) through 5 (admin)
pub const ROLE_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone.chars().count() >= MIN_PHONE_LENGTH
}

pub fn is_valid_role(role: i32) -> bool {
    ROLE_RANGE.contains(&role)
}
