//! Password masking for bodies that end up in traces and logs.
//!
//! Two passes, both idempotent and both no-ops on content they do not
//! recognise:
//!
//! - [`mask_json_password`] rewrites a `{"email", "password"}` JSON login
//!   payload with the password replaced.
//! - [`mask_password`] rewrites `&`-joined form tokens carrying one of the
//!   password keys.
//!
//! [`redact_body`] runs the structured pass on raw bytes, then the form
//! pass on the resulting text. Nothing here touches the bytes that go to
//! the downstream handler; callers redact a copy.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Literal written in place of a masked value.
pub const MASK: &str = "xxxxx";

/// Form keys whose values are masked, in match order. The first key found
/// in a token names its replacement.
const FORM_KEYS: [&str; 3] = ["password", "newPassword", "rePassword"];

#[derive(Deserialize, Serialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Masks the password of a JSON login payload.
///
/// The body must decode as an object with non-empty `email` and `password`
/// string fields; it is then re-encoded as exactly those two fields. Any
/// other input is returned unchanged, byte for byte.
pub fn mask_json_password(body: &[u8]) -> Cow<'_, [u8]> {
    let Ok(mut creds) = serde_json::from_slice::<Credentials>(body) else {
        return Cow::Borrowed(body);
    };
    if creds.email.is_empty() || creds.password.is_empty() {
        return Cow::Borrowed(body);
    }
    creds.password = MASK.to_owned();
    match serde_json::to_vec(&creds) {
        Ok(masked) => Cow::Owned(masked),
        Err(_) => Cow::Borrowed(body),
    }
}

/// Masks password tokens of an `&`-joined form string.
///
/// Each token containing `password=`, `newPassword=` or `rePassword=` is
/// replaced whole by `<key>=xxxxx`. Other tokens and the token order are
/// kept.
pub fn mask_password(s: &str) -> String {
    s.split('&').map(mask_token).collect::<Vec<_>>().join("&")
}

fn mask_token(token: &str) -> Cow<'_, str> {
    let matched = FORM_KEYS
        .iter()
        .find(|key| token.contains(&format!("{key}=")));
    match matched {
        Some(key) => Cow::Owned(format!("{key}={MASK}")),
        None => Cow::Borrowed(token),
    }
}

/// Redacted text copy of a request body.
///
/// Non-UTF-8 bytes are replaced with U+FFFD in the copy.
pub fn redact_body(body: &[u8]) -> String {
    let structured = mask_json_password(body);
    mask_password(&String::from_utf8_lossy(&structured))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_password_is_masked_in_place() {
        assert_eq!(
            mask_password("user=alice&password=abc&next=/home"),
            "user=alice&password=xxxxx&next=/home",
        );
    }

    #[test]
    fn every_form_key_is_masked() {
        assert_eq!(
            mask_password("newPassword=n3w&rePassword=n3w&otp=1234"),
            "newPassword=xxxxx&rePassword=xxxxx&otp=1234",
        );
    }

    #[test]
    fn password_key_wins_over_the_others() {
        assert_eq!(mask_password("x=password=1rePassword=2&y=3"), "password=xxxxx&y=3");
        assert_eq!(mask_password("newPassword=a;rePassword=b"), "newPassword=xxxxx");
    }

    #[test]
    fn whole_token_is_replaced() {
        assert_eq!(mask_password("old_password=abc"), "password=xxxxx");
    }

    #[test]
    fn unrelated_text_passes_through() {
        assert_eq!(mask_password("hello world"), "hello world");
        assert_eq!(mask_password(""), "");
        assert_eq!(mask_password("a=1&&b=2"), "a=1&&b=2");
    }

    #[test]
    fn json_login_password_is_masked() {
        let masked = mask_json_password(br#"{"email":"a@b.com","password":"hunter2"}"#);
        assert_eq!(&masked[..], br#"{"email":"a@b.com","password":"xxxxx"}"#);
    }

    #[test]
    fn json_without_credentials_is_untouched() {
        let body = br#"{"foo":"bar"}"#;
        assert!(matches!(mask_json_password(body), Cow::Borrowed(b) if b == body));

        let spaced = br#"{ "email": "a@b.com" }"#;
        assert_eq!(&mask_json_password(spaced)[..], &spaced[..]);
    }

    #[test]
    fn malformed_json_is_untouched() {
        let body = br#"{"email":"a@b.com","password":"#;
        assert_eq!(&mask_json_password(body)[..], &body[..]);
    }

    #[test]
    fn passes_are_idempotent() {
        let form = "user=alice&password=abc&rePassword=abc";
        let once = mask_password(form);
        assert_eq!(mask_password(&once), once);

        let json = br#"{"email":"a@b.com","password":"hunter2"}"#;
        let once = mask_json_password(json).into_owned();
        assert_eq!(mask_json_password(&once).into_owned(), once);
    }

    #[test]
    fn redact_body_composes_both_passes() {
        assert_eq!(
            redact_body(br#"{"email":"a@b.com","password":"hunter2"}"#),
            r#"{"email":"a@b.com","password":"xxxxx"}"#,
        );
        assert_eq!(redact_body(b"password=abc&x=1"), "password=xxxxx&x=1");
        assert_eq!(redact_body(b""), "");
    }
}
