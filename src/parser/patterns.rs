use fancy_regex::{Captures, Regex};
use std::sync::LazyLock;

/// Pattern name assigned when nothing else matches.
pub const FALLBACK: &str = "fallback";

// The battery below is ordered most-specific-first; the first entry whose
// expression matches the start of the line wins. All matching is
// case-insensitive and trailing unmatched text is allowed.

// Value-sample format: domain IP epoch severity value
static CUSTOM_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<source>\S+)\s+(?P<ip>\S+)\s+(?P<timestamp>\d+)\s+(?P<severity>\w+)\s+(?P<value>\d+)",
    )
    .expect("valid regex literal")
});

// ISO-ish timestamp, optionally bracketed severity, optional source
static STANDARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<timestamp>\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}(?:\.\d+)?)\s*\[?(?P<severity>\w+)\]?\s*(?P<source>\w+)?:?\s*(?P<message>.*)",
    )
    .expect("valid regex literal")
});

// Apache/Nginx error-log style with timezone offset
static APACHE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<timestamp>\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2}\s+[+-]\d{4})\s+\[(?P<severity>\w+)\]\s+(?P<message>.*)",
    )
    .expect("valid regex literal")
});

// Classic syslog: month-name day time source severity: message
static SYSLOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<timestamp>\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(?P<source>\w+)\s+(?P<severity>\w+):\s+(?P<message>.*)",
    )
    .expect("valid regex literal")
});

// Java application logs with comma-delimited milliseconds
static JAVA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<timestamp>\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2},\d{3})\s+(?P<severity>\w+)\s+\[(?P<source>[^\]]+)\]\s+(?P<message>.*)",
    )
    .expect("valid regex literal")
});

// Bare severity token, optionally bracketed
static SIMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\[?(?P<severity>ERROR|WARN|WARNING|INFO|DEBUG|TRACE|FATAL|CRITICAL)\]?\s*(?P<message>.*)",
    )
    .expect("valid regex literal")
});

// Safety net: everything is the message
static FALLBACK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?P<message>.*)").expect("valid regex literal"));

/// Field values captured by one pattern, before normalization.
#[derive(Debug, Default)]
pub struct RawEntry {
    pub timestamp: Option<String>,
    pub severity: Option<String>,
    pub source: Option<String>,
    pub message: Option<String>,
}

/// One entry of the battery: a compiled expression plus the extraction
/// that maps its captures onto record fields.
struct Pattern {
    name: &'static str,
    regex: &'static LazyLock<Regex>,
    extract: fn(&Captures<'_>) -> RawEntry,
}

static PATTERNS: [Pattern; 7] = [
    Pattern {
        name: "custom_domain",
        regex: &CUSTOM_DOMAIN,
        extract: extract_custom_domain,
    },
    Pattern {
        name: "standard",
        regex: &STANDARD,
        extract: extract_fields,
    },
    Pattern {
        name: "apache",
        regex: &APACHE,
        extract: extract_fields,
    },
    Pattern {
        name: "syslog",
        regex: &SYSLOG,
        extract: extract_fields,
    },
    Pattern {
        name: "java",
        regex: &JAVA,
        extract: extract_fields,
    },
    Pattern {
        name: "simple",
        regex: &SIMPLE,
        extract: extract_fields,
    },
    Pattern {
        name: FALLBACK,
        regex: &FALLBACK_PATTERN,
        extract: extract_fields,
    },
];

fn group(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name).map(|m| m.as_str().to_string())
}

fn extract_fields(caps: &Captures<'_>) -> RawEntry {
    RawEntry {
        timestamp: group(caps, "timestamp"),
        severity: group(caps, "severity"),
        source: group(caps, "source"),
        message: group(caps, "message"),
    }
}

fn extract_custom_domain(caps: &Captures<'_>) -> RawEntry {
    let mut entry = extract_fields(caps);
    // This format has no free-text part; synthesize one from the raw
    // captures so downstream text analysis has material to work with.
    let message = format!(
        "{} {} {} {}",
        entry.source.as_deref().unwrap_or("unknown"),
        group(caps, "ip").as_deref().unwrap_or("unknown"),
        entry.severity.as_deref().unwrap_or("INFO"),
        group(caps, "value").as_deref().unwrap_or("unknown"),
    );
    entry.message = Some(message);
    entry
}

/// Run the battery against a trimmed line. Returns the captured fields and
/// the name of the winning pattern. The fallback entry matches anything, so
/// a result is always produced.
#[must_use]
pub fn match_line(line: &str) -> (RawEntry, &'static str) {
    for pattern in &PATTERNS {
        if let Ok(Some(caps)) = pattern.regex.captures(line) {
            return ((pattern.extract)(&caps), pattern.name);
        }
    }

    // Unreachable as long as the fallback expression compiles; degrade to a
    // bare message entry regardless.
    (
        RawEntry {
            message: Some(line.to_string()),
            ..RawEntry::default()
        },
        FALLBACK,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_domain_synthesizes_message() {
        let (entry, name) = match_line("example.com 192.168.1.1 1700000000 suspicious 1234");
        assert_eq!(name, "custom_domain");
        assert_eq!(entry.timestamp.as_deref(), Some("1700000000"));
        assert_eq!(entry.severity.as_deref(), Some("suspicious"));
        assert_eq!(entry.source.as_deref(), Some("example.com"));
        assert_eq!(
            entry.message.as_deref(),
            Some("example.com 192.168.1.1 suspicious 1234")
        );
    }

    #[test]
    fn test_standard_with_bracketed_severity() {
        let (entry, name) = match_line("2023-01-01 12:00:00 [ERROR] database: Connection failed");
        assert_eq!(name, "standard");
        assert_eq!(entry.timestamp.as_deref(), Some("2023-01-01 12:00:00"));
        assert_eq!(entry.severity.as_deref(), Some("ERROR"));
        assert_eq!(entry.source.as_deref(), Some("database"));
        assert_eq!(entry.message.as_deref(), Some("Connection failed"));
    }

    #[test]
    fn test_standard_with_fractional_seconds() {
        let (entry, name) = match_line("2023-01-01 12:00:00.500 INFO auth: login ok");
        assert_eq!(name, "standard");
        assert_eq!(entry.timestamp.as_deref(), Some("2023-01-01 12:00:00.500"));
    }

    #[test]
    fn test_apache_format() {
        let (entry, name) = match_line("10/Oct/2023:13:55:36 +0000 [error] client denied");
        assert_eq!(name, "apache");
        assert_eq!(entry.timestamp.as_deref(), Some("10/Oct/2023:13:55:36 +0000"));
        assert_eq!(entry.severity.as_deref(), Some("error"));
        assert_eq!(entry.message.as_deref(), Some("client denied"));
    }

    #[test]
    fn test_syslog_format() {
        let (entry, name) = match_line("Jan 15 08:30:00 sshd error: Failed password for root");
        assert_eq!(name, "syslog");
        assert_eq!(entry.timestamp.as_deref(), Some("Jan 15 08:30:00"));
        assert_eq!(entry.source.as_deref(), Some("sshd"));
        assert_eq!(entry.severity.as_deref(), Some("error"));
        assert_eq!(entry.message.as_deref(), Some("Failed password for root"));
    }

    #[test]
    fn test_java_format() {
        let (entry, name) =
            match_line("2023-01-01 12:00:00,123 ERROR [com.example.Service] NPE caught");
        assert_eq!(name, "java");
        assert_eq!(entry.timestamp.as_deref(), Some("2023-01-01 12:00:00,123"));
        assert_eq!(entry.source.as_deref(), Some("com.example.Service"));
        assert_eq!(entry.message.as_deref(), Some("NPE caught"));
    }

    #[test]
    fn test_simple_bare_severity() {
        let (entry, name) = match_line("[WARN] disk usage high");
        assert_eq!(name, "simple");
        assert_eq!(entry.severity.as_deref(), Some("WARN"));
        assert_eq!(entry.message.as_deref(), Some("disk usage high"));
    }

    #[test]
    fn test_simple_alternation_prefers_first_variant() {
        // WARN is listed before WARNING, so the shorter token wins and the
        // remainder stays in the message.
        let (entry, name) = match_line("WARNING: disk usage high");
        assert_eq!(name, "simple");
        assert_eq!(entry.severity.as_deref(), Some("WARN"));
        assert_eq!(entry.message.as_deref(), Some("ING: disk usage high"));
    }

    #[test]
    fn test_battery_order_custom_domain_first() {
        // Matches both custom_domain and standard; the earlier entry wins.
        let (_, name) = match_line("2023-01-01 12:00:00 1700000000 ERROR 42");
        assert_eq!(name, "custom_domain");
    }

    #[test]
    fn test_fallback_catches_gibberish() {
        let (entry, name) = match_line("###???***");
        assert_eq!(name, FALLBACK);
        assert_eq!(entry.message.as_deref(), Some("###???***"));
        assert!(entry.timestamp.is_none());
        assert!(entry.severity.is_none());
        assert!(entry.source.is_none());
    }
}
