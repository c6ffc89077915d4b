//! Disposable email domains.
//!
//! The lookup set is built on first use. Callers racing the first lookup
//! block until it is built, then share it.

use std::collections::HashSet;
use std::sync::OnceLock;

/// Known throwaway mailbox providers.
pub const DISPOSABLE_DOMAINS: &[&str] = &[
    "0-mail.com",
    "10minutemail.com",
    "10minutemail.net",
    "20minutemail.com",
    "33mail.com",
    "anonbox.net",
    "discard.email",
    "dispostable.com",
    "dropmail.me",
    "emailondeck.com",
    "fakeinbox.com",
    "getairmail.com",
    "getnada.com",
    "guerrillamail.biz",
    "guerrillamail.com",
    "guerrillamail.de",
    "guerrillamail.net",
    "guerrillamail.org",
    "guerrillamailblock.com",
    "harakirimail.com",
    "incognitomail.org",
    "jetable.org",
    "mailcatch.com",
    "maildrop.cc",
    "mailinator.com",
    "mailinator.net",
    "mailnesia.com",
    "mintemail.com",
    "mohmal.com",
    "mytemp.email",
    "mytrashmail.com",
    "sharklasers.com",
    "spam4.me",
    "spambox.us",
    "spamgourmet.com",
    "tempail.com",
    "temp-mail.org",
    "tempmail.net",
    "tempmailo.com",
    "tempr.email",
    "throwawaymail.com",
    "trashmail.com",
    "trashmail.de",
    "trashmail.net",
    "yopmail.com",
    "yopmail.fr",
    "yopmail.net",
];

static DOMAINS: OnceLock<HashSet<&'static str>> = OnceLock::new();

fn domains() -> &'static HashSet<&'static str> {
    DOMAINS.get_or_init(|| DISPOSABLE_DOMAINS.iter().copied().collect())
}

/// True when `domain` is a known disposable provider. Surrounding
/// whitespace and case are ignored.
pub fn is_disabled_domain(domain: &str) -> bool {
    domains().contains(domain.trim().to_lowercase().as_str())
}

/// True when the part after the first `@` is a disposable domain. Input
/// without `@` is never disabled.
pub fn is_disabled_email(email: &str) -> bool {
    email.split_once('@').is_some_and(|(_, domain)| is_disabled_domain(domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_lookup_normalizes_input() {
        assert!(is_disabled_domain("mailinator.com"));
        assert!(is_disabled_domain("  Mailinator.COM \n"));
        assert!(!is_disabled_domain("example.com"));
        assert!(!is_disabled_domain(""));
    }

    #[test]
    fn email_uses_the_domain_part() {
        assert!(is_disabled_email("someone@yopmail.com"));
        assert!(!is_disabled_email("someone@example.com"));
        assert!(!is_disabled_email("yopmail.com"));
    }

    #[test]
    fn concurrent_first_use_sees_one_set() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| is_disabled_domain("trashmail.com")))
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
