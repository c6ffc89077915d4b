//! Input validation for request fields.
//!
//! Format checks return a [`ValidationError`] so handlers can collect them
//! into a [`MultiError`](crate::envelope::MultiError); character-class checks
//! return `bool`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Why a field was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid url format")]
    BadFormatUrl,
    #[error("invalid email format")]
    BadFormatEmail,
    #[error("invalid phone format")]
    BadFormatPhoneNumber,
    #[error("value is too long")]
    TooLong,
}

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}-]+@(?:[a-zA-Z0-9\x{00A0}-\x{D7FF}](?:[a-zA-Z0-9\x{00A0}-\x{D7FF}_~.-]*[a-zA-Z0-9\x{00A0}-\x{D7FF}])?\.)+[a-zA-Z\x{00A0}-\x{D7FF}](?:[a-zA-Z0-9\x{00A0}-\x{D7FF}_~-]*[a-zA-Z\x{00A0}-\x{D7FF}])?\.?$",
    )
    .expect("email pattern compiles")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:ftp|sftp|tcp|udp|wss?|https?)://)?(?:\S+(?::\S*)?@)?(?:(?:[0-9]{1,3}\.){3}[0-9]{1,3}|\[[0-9a-fA-F:.]+\]|(?:[a-zA-Z0-9\x{00a1}-\x{ffff}](?:[a-zA-Z0-9\x{00a1}-\x{ffff}_-]*[a-zA-Z0-9\x{00a1}-\x{ffff}])?\.)*[a-zA-Z0-9\x{00a1}-\x{ffff}](?:[a-zA-Z0-9\x{00a1}-\x{ffff}_-]*[a-zA-Z0-9\x{00a1}-\x{ffff}])?)\.?(?::[0-9]{1,5})?(?:[/?#]\S*)?$",
    )
    .expect("url pattern compiles")
});

static AREA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[0-9]{1,5}$").expect("area pattern compiles"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5,}$").expect("phone pattern compiles"));

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    EMAIL.is_match(email).then_some(()).ok_or(ValidationError::BadFormatEmail)
}

pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    URL.is_match(url).then_some(()).ok_or(ValidationError::BadFormatUrl)
}

/// Digits only, at least five of them.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    PHONE.is_match(phone).then_some(()).ok_or(ValidationError::BadFormatPhoneNumber)
}

/// International prefix such as `+62`.
pub fn validate_phone_area_number(area: &str) -> Result<(), ValidationError> {
    AREA.is_match(area).then_some(()).ok_or(ValidationError::BadFormatPhoneNumber)
}

/// At most `limit` characters.
pub fn validate_max_input(input: &str, limit: usize) -> Result<(), ValidationError> {
    if input.chars().count() > limit {
        return Err(ValidationError::TooLong);
    }
    Ok(())
}

pub fn is_uppercase(c: char) -> bool {
    c.is_ascii_uppercase()
}

pub fn is_lowercase(c: char) -> bool {
    c.is_ascii_lowercase()
}

pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Printable ASCII punctuation, including space.
pub fn is_allowed_symbol(c: char) -> bool {
    matches!(c, ' '..='/' | ':'..='@' | '['..='`' | '{'..='~')
}

fn is_letter(c: char) -> bool {
    is_uppercase(c) || is_lowercase(c)
}

/// Character classes present in a string.
#[derive(Default)]
struct Classes {
    letter: bool,
    digit: bool,
    space: bool,
    other: bool,
}

fn classify(s: &str, allow_space: bool) -> Classes {
    let mut classes = Classes::default();
    for c in s.chars() {
        if is_letter(c) {
            classes.letter = true;
        } else if is_digit(c) {
            classes.digit = true;
        } else if allow_space && c == ' ' {
            classes.space = true;
        } else {
            classes.other = true;
        }
    }
    classes
}

/// ASCII digits only, at least one.
pub fn is_numeric(s: &str) -> bool {
    let c = classify(s, false);
    !c.other && !c.letter && c.digit
}

/// ASCII letters only, at least one.
pub fn is_alphabet(s: &str) -> bool {
    let c = classify(s, false);
    !c.other && !c.digit && c.letter
}

/// ASCII letters and spaces only, at least one of either.
pub fn is_alphabet_with_space(s: &str) -> bool {
    let c = classify(s, true);
    !c.other && !c.digit && (c.letter || c.space)
}

/// ASCII letters and digits only. With `must`, both a letter and a digit
/// are required.
pub fn is_alphanumeric(s: &str, must: bool) -> bool {
    let c = classify(s, false);
    if c.other {
        return false;
    }
    if must { c.letter && c.digit } else { c.letter || c.digit }
}

/// ASCII letters, digits and spaces only. With `must`, a letter, a digit
/// and a space are all required.
pub fn is_alphanumeric_with_space(s: &str, must: bool) -> bool {
    let c = classify(s, true);
    if c.other {
        return false;
    }
    if must { c.letter && c.digit && c.space } else { c.letter || c.digit || c.space }
}

/// Letters, digits and printable ASCII punctuation only.
pub fn is_latin_only(s: &str) -> bool {
    s.chars().all(|c| is_letter(c) || is_digit(c) || is_allowed_symbol(c))
}
