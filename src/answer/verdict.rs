//! Two-stage parsing of the generative model's structured output.
//!
//! The model is asked for `{"answer": ..., "confidence": 0-100}` but that
//! format is best-effort. The first stage attempts a structured decode
//! (tolerating markdown code fences); the second degrades to the raw text with
//! zero confidence. Nothing raises past this boundary.

use serde::Deserialize;

/// The model's self-reported answer and confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Answer text (raw model output when parsing degraded).
    pub answer: String,
    /// Self-reported confidence, 0-100 (0 when parsing degraded).
    pub confidence: f32,
    /// Whether the structured decode succeeded.
    pub structured: bool,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    answer: String,
    #[serde(default)]
    confidence: f32,
}

/// Parse the model's output into a verdict, degrading instead of failing.
pub fn parse_verdict(raw: &str) -> Verdict {
    let candidate = strip_code_fence(raw.trim());

    match serde_json::from_str::<RawVerdict>(candidate) {
        Ok(parsed) => Verdict {
            answer: parsed.answer.trim().to_string(),
            confidence: parsed.confidence.clamp(0.0, 100.0),
            structured: true,
        },
        Err(_) => Verdict {
            answer: raw.trim().to_string(),
            confidence: 0.0,
            structured: false,
        },
    }
}

/// Strip a surrounding markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.split_once('\n').map(|(_, body)| body) else {
        return text;
    };
    body.rsplit_once("```").map_or(text, |(inner, _)| inner.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_json() {
        let verdict = parse_verdict(r#"{"answer": "Paris", "confidence": 87}"#);
        assert!(verdict.structured);
        assert_eq!(verdict.answer, "Paris");
        assert_eq!(verdict.confidence, 87.0);
    }

    #[test]
    fn test_fenced_json() {
        let verdict = parse_verdict("```json\n{\"answer\": \"Paris\", \"confidence\": 42}\n```");
        assert!(verdict.structured);
        assert_eq!(verdict.answer, "Paris");
        assert_eq!(verdict.confidence, 42.0);
    }

    #[test]
    fn test_non_json_degrades_to_raw_text() {
        let raw = "The capital of France is Paris, of course.";
        let verdict = parse_verdict(raw);
        assert!(!verdict.structured);
        assert_eq!(verdict.answer, raw);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_missing_confidence_defaults_to_zero() {
        let verdict = parse_verdict(r#"{"answer": "Paris"}"#);
        assert!(verdict.structured);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_out_of_range_confidence_is_clamped() {
        let verdict = parse_verdict(r#"{"answer": "Paris", "confidence": 250}"#);
        assert_eq!(verdict.confidence, 100.0);

        let verdict = parse_verdict(r#"{"answer": "Paris", "confidence": -5}"#);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_trailing_commentary_degrades() {
        // The reference model sometimes appends a reason after the JSON;
        // that is not valid JSON and takes the degraded path
        let raw = r#"{"answer": "Paris", "confidence": 87} (high overlap)"#;
        let verdict = parse_verdict(raw);
        assert!(!verdict.structured);
        assert_eq!(verdict.answer, raw);
    }
}
