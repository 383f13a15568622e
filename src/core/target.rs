use crate::domain::model::Target;
use crate::utils::error::{ProbeError, Result};
use std::str::FromStr;

const SCHEMES: [&str; 2] = ["https://", "http://"];

/// Reduces user input to a bare host: scheme and everything from the first `/` are dropped.
///
/// The output never contains `/` and is trimmed, so normalizing it again is a no-op.
pub fn normalize(raw: &str) -> Result<Target> {
    let trimmed = raw.trim();

    let without_scheme = SCHEMES
        .iter()
        .find_map(|scheme| strip_prefix_ignore_case(trimmed, scheme))
        .unwrap_or(trimmed);

    let host = match without_scheme.find('/') {
        Some(pos) => &without_scheme[..pos],
        None => without_scheme,
    }
    .trim();

    if host.is_empty() {
        return Err(ProbeError::InvalidTarget {
            input: raw.to_string(),
        });
    }

    Ok(Target::from_normalized(host.to_string()))
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}

impl FromStr for Target {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        normalize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scheme_and_path() {
        assert_eq!(normalize("https://example.com/admin?x=1").unwrap().as_str(), "example.com");
        assert_eq!(normalize("http://example.com").unwrap().as_str(), "example.com");
        assert_eq!(normalize("  example.com/  ").unwrap().as_str(), "example.com");
        assert_eq!(normalize("HTTPS://Example.com/").unwrap().as_str(), "Example.com");
    }

    #[test]
    fn test_keeps_port_and_subdomain() {
        assert_eq!(
            normalize("https://api.example.com:8443/v1").unwrap().as_str(),
            "api.example.com:8443"
        );
    }

    #[test]
    fn test_empty_and_scheme_only_inputs_fail() {
        for input in ["", "   ", "https://", "http://", "http:///path", "/only/path"] {
            assert!(
                matches!(normalize(input), Err(ProbeError::InvalidTarget { .. })),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "example.com",
            "https://example.com/a/b",
            " http://sub.example.com:80/ ",
            "https://http://nested.example",
            "ftp://example.com",
            "example.com?q=1",
            "  spaced host  /x",
        ];
        for input in inputs {
            let once = normalize(input).unwrap();
            let twice = normalize(once.as_str()).unwrap();
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_parse_via_from_str() {
        let target: Target = "https://example.com/".parse().unwrap();
        assert_eq!(target.to_string(), "example.com");
        assert!("https://".parse::<Target>().is_err());
    }
}
