//! Log sanitization for clinical data.
//!
//! Patient attributes must not reach log sinks. Callers never log inputs
//! directly, but formatted `Debug` output, error chains and third-party
//! messages can still carry them. This module redacts, from formatted log
//! lines:
//! - clinical `field=value` / `field: value` pairs (form attributes)
//! - raw numeric feature vectors
//! - UUIDs and e-mail addresses
//!
//! Input size is capped (see `CARDIORISK_SANITIZE_MAX_BYTES`).

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

/// Default cap on bytes sanitized per call (16 KiB).
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Patterns {
    set: RegexSet,
    rules: Vec<Rule>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    static LIMIT: OnceLock<usize> = OnceLock::new();
    *LIMIT.get_or_init(|| {
        std::env::var("CARDIORISK_SANITIZE_MAX_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
    })
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Form attributes, both `Debug` (`age: 40`) and tracing field (`age=40`) styles.
            (
                r#"(?i)\b(age|resting_?bp|cholesterol|fasting_?bs|max_?hr|oldpeak|sex|chest_?pain(?:_?type)?|resting_?ecg|exercise_?angina|st_?slope)\b(\s*[:=]\s*)"?[A-Za-z0-9.+-]+"?"#,
                "${1}${2}[REDACTED]",
            ),
            // Feature vectors (four or more numbers in brackets)
            (
                r"\[\s*-?\d+(?:\.\d+)?(?:e-?\d+)?(?:\s*,\s*-?\d+(?:\.\d+)?(?:e-?\d+)?){3,}\s*\]",
                "[REDACTED-VECTOR]",
            ),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        Patterns { set, rules }
    })
}

/// Redact clinical values and identifiers from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        result = rule
            .regex
            .replace_all(&result, rule.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted log
/// line before it reaches the underlying sink.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M: Clone> Clone for SanitizingMakeWriter<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A single line longer than twice the cap is flushed early instead of buffered.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_redacts_debug_style_fields() {
        let input = "input: PatientInput { age: 54, resting_bp: 140, cholesterol: 239, \
                     sex: Female, st_slope: Flat }";
        let sanitized = sanitize(input);
        assert!(!sanitized.contains("54"));
        assert!(!sanitized.contains("239"));
        assert!(!sanitized.contains("Female"));
        assert!(sanitized.contains("age: [REDACTED]"));
        assert!(sanitized.contains("st_slope: [REDACTED]"));
    }

    #[test]
    fn test_redacts_tracing_style_fields() {
        let sanitized = sanitize("aligned row Oldpeak=1.5 MaxHR=172 ChestPainType=\"ASY\"");
        assert_eq!(
            sanitized,
            "aligned row Oldpeak=[REDACTED] MaxHR=[REDACTED] ChestPainType=[REDACTED]"
        );
    }

    #[test]
    fn test_redacts_feature_vectors() {
        let sanitized = sanitize("scaled [0.12, -1.5, 3e-2, 1.0, 0.0] done");
        assert_eq!(sanitized, "scaled [REDACTED-VECTOR] done");

        // Short lists (e.g. shapes) are left alone.
        assert_eq!(sanitize("shape [1, 20]"), "shape [1, 20]");
    }

    #[test]
    fn test_leaves_ordinary_text() {
        let line = "Loaded artifacts (columns=20, scaler_width=20, classifier=knn, verified=true)";
        assert_eq!(sanitize(line), line);
        assert_eq!(sanitize("Stage: 2 of usage: 3"), "Stage: 2 of usage: 3");
    }

    #[test]
    fn test_redacts_identifiers() {
        assert_eq!(
            sanitize("id 550e8400-e29b-41d4-a716-446655440000"),
            "id [REDACTED-UUID]"
        );
        let sanitized = sanitize("contact patient@hospital.com");
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_truncates_large_inputs() {
        let sanitized = sanitize_with_limit("age=40 then a long tail", 10);
        assert_eq!(sanitized, "age=[REDACTED] the [TRUNCATED]");
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut out = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut out);
            writer.write_all(b"first age=").expect("write");
            writer.write_all(b"61 done\nsecond line\n").expect("write");
            writer.flush().expect("flush");
        }
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "first age=[REDACTED] done\nsecond line\n");
    }
}
