//! `Set-Cookie` rendering.
//!
//! # Responsibilities
//! - Validate cookie names and values
//! - Convert `maxAge` duration strings into absolute expiry timestamps
//! - Render attributes in a fixed order
//! - Hand out distinct header keys so several cookies share one header map
//!
//! # Design Decisions
//! - Duration grammar is `{integer}{unit}` with unit one of `s`, `m`, `h`, `d`
//! - `SameSite=None` always implies `Secure`
//! - Header keys are case variants of `Set-Cookie`; the single-value header
//!   map of proxy-integration responses cannot repeat a key

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Canonical cookie header name, always tried first.
pub const SET_COOKIE: &str = "Set-Cookie";

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SameSite::Lax => write!(f, "Lax"),
            SameSite::Strict => write!(f, "Strict"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Optional cookie attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    /// Lifetime such as `"30s"`, `"15m"`, `"2h"` or `"7d"`.
    pub max_age: Option<String>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn max_age(mut self, max_age: impl Into<String>) -> Self {
        self.max_age = Some(max_age.into());
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// Parse a `{integer}{unit}` duration.
pub fn parse_duration(input: &str) -> Result<Duration, ValidationError> {
    let invalid = || ValidationError::InvalidDuration(input.to_owned());

    let trimmed = input.trim();
    let unit = trimmed.chars().last().ok_or_else(invalid)?;
    let multiplier: i64 = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return Err(invalid()),
    };

    let amount: i64 = trimmed[..trimmed.len() - unit.len_utf8()]
        .trim()
        .parse()
        .map_err(|_| invalid())?;
    if amount < 0 {
        return Err(invalid());
    }

    amount
        .checked_mul(multiplier)
        .and_then(Duration::try_seconds)
        .ok_or_else(invalid)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?={}".contains(c))
}

fn is_valid_value(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_graphic() && !matches!(c, ';' | ',' | '"' | '\\'))
}

/// Render a `Set-Cookie` header value relative to `now`.
pub fn render(
    name: &str,
    value: &str,
    options: &CookieOptions,
    now: DateTime<Utc>,
) -> Result<String, ValidationError> {
    if !is_valid_name(name) || !is_valid_value(value) {
        return Err(ValidationError::InvalidCookie);
    }

    let mut cookie = format!("{}={}", name, value);

    if let Some(path) = &options.path {
        cookie.push_str(&format!("; Path={}", path));
    }

    if let Some(domain) = &options.domain {
        cookie.push_str(&format!("; Domain={}", domain));
    }

    if let Some(max_age) = &options.max_age {
        let expires = now
            .checked_add_signed(parse_duration(max_age)?)
            .ok_or_else(|| ValidationError::InvalidDuration(max_age.clone()))?;
        cookie.push_str(&format!("; Expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT")));
    }

    if options.http_only {
        cookie.push_str("; HttpOnly");
    }

    if options.secure || options.same_site == Some(SameSite::None) {
        cookie.push_str("; Secure");
    }

    if let Some(same_site) = options.same_site {
        cookie.push_str(&format!("; SameSite={}", same_site));
    }

    Ok(cookie)
}

/// Candidate header keys for cookies, canonical spelling first.
pub fn header_slots() -> impl Iterator<Item = String> {
    let base: Vec<char> = "set-cookie".chars().collect();
    let letters: Vec<usize> = base
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .collect();

    let variants = (0u32..1 << letters.len()).map(move |mask| {
        let mut chars = base.clone();
        for (bit, &idx) in letters.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                chars[idx] = chars[idx].to_ascii_uppercase();
            }
        }
        chars.into_iter().collect::<String>()
    });

    std::iter::once(SET_COOKIE.to_string()).chain(variants.filter(|v| v != SET_COOKIE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_duration("2h").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration(" 7d ").unwrap(), Duration::days(7));
    }

    #[test]
    fn test_parse_duration_rejects_other_grammars() {
        for input in ["", "h", "2", "2w", "1.5h", "-1h", "two hours", "2 hours"] {
            assert!(parse_duration(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_render_plain_cookie() {
        let cookie = render("id", "abcd-1234", &CookieOptions::new(), fixed_now()).unwrap();
        assert_eq!(cookie, "id=abcd-1234");
    }

    #[test]
    fn test_render_all_attributes() {
        let options = CookieOptions::new()
            .path("/")
            .domain("example.com")
            .max_age("2h")
            .http_only()
            .secure()
            .same_site(SameSite::Lax);
        let cookie = render("id5", "abcd-1234", &options, fixed_now()).unwrap();
        assert_eq!(
            cookie,
            "id5=abcd-1234; Path=/; Domain=example.com; Expires=Mon, 19 Oct 2026 10:00:00 GMT; HttpOnly; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn test_same_site_none_forces_secure() {
        let options = CookieOptions::new().same_site(SameSite::None);
        let cookie = render("sid", "x", &options, fixed_now()).unwrap();
        assert_eq!(cookie, "sid=x; Secure; SameSite=None");
    }

    #[test]
    fn test_render_rejects_bad_tokens() {
        let options = CookieOptions::new();
        assert_eq!(render("", "x", &options, fixed_now()), Err(ValidationError::InvalidCookie));
        assert_eq!(render("a b", "x", &options, fixed_now()), Err(ValidationError::InvalidCookie));
        assert_eq!(render("a", "x;y", &options, fixed_now()), Err(ValidationError::InvalidCookie));
        assert!(matches!(
            render("a", "x", &options.max_age("soon"), fixed_now()),
            Err(ValidationError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_header_slots_are_distinct_case_variants() {
        let slots: Vec<String> = header_slots().collect();
        assert_eq!(slots[0], SET_COOKIE);
        assert_eq!(slots.len(), 512);

        let unique: HashSet<&String> = slots.iter().collect();
        assert_eq!(unique.len(), slots.len());
        assert!(slots.iter().all(|s| s.eq_ignore_ascii_case(SET_COOKIE)));
    }
}
