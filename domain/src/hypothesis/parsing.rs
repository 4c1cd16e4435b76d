//! Extraction of a [`Hypothesis`] from free-form model output.

use super::entities::Hypothesis;
use crate::core::error::DomainError;
use serde_json::{Map, Value};

/// Parse the first JSON object found in `text` into a validated hypothesis.
///
/// Accepts ` ```json ` fenced blocks, bare fences, or an object embedded in
/// prose. Flat aliases (`q_min`/`q_max`, `t_min_s`/`t_max_s`,
/// `temperature_min_k`/`temperature_max_k`) are folded into spans.
pub fn parse_hypothesis_json(text: &str) -> Result<Hypothesis, DomainError> {
    let json = extract_json_object(text).ok_or_else(|| {
        DomainError::InvalidHypothesis("no JSON object found in response".into())
    })?;

    let mut value: Value = serde_json::from_str(json)
        .map_err(|e| DomainError::InvalidHypothesis(format!("malformed JSON: {e}")))?;

    // Some models wrap the object: {"hypothesis": {...}}
    if let Some(inner) = value.get("hypothesis")
        && inner.is_object()
    {
        value = inner.clone();
    }

    if let Value::Object(map) = &mut value {
        fold_flat_span(map, "q_range", &["q_min", "qmin"], &["q_max", "qmax"]);
        fold_flat_span(
            map,
            "timescale",
            &["t_min_s", "t_min", "tau_min_s"],
            &["t_max_s", "t_max", "tau_max_s"],
        );
        fold_flat_span(
            map,
            "temperature_k",
            &["temperature_min_k", "t_min_k"],
            &["temperature_max_k", "t_max_k"],
        );
        if !map.contains_key("sample")
            && let Some(material) = map.remove("material")
        {
            let mut sample = Map::new();
            sample.insert("material".into(), material);
            if let Some(class) = map.remove("sample_class") {
                sample.insert("class".into(), class);
            }
            map.insert("sample".into(), Value::Object(sample));
        }
    }

    let hypothesis: Hypothesis = serde_json::from_value(value)
        .map_err(|e| DomainError::InvalidHypothesis(format!("unexpected JSON shape: {e}")))?;
    let hypothesis = hypothesis.normalized();
    hypothesis.validate()?;
    Ok(hypothesis)
}

fn fold_flat_span(map: &mut Map<String, Value>, key: &str, min_keys: &[&str], max_keys: &[&str]) {
    if map.contains_key(key) {
        return;
    }
    let min = min_keys.iter().find_map(|k| map.get(*k).cloned());
    let max = max_keys.iter().find_map(|k| map.get(*k).cloned());
    if let (Some(min), Some(max)) = (min, max) {
        for k in min_keys.iter().chain(max_keys) {
            map.remove(*k);
        }
        map.insert(key.to_string(), Value::Array(vec![min, max]));
    }
}

/// Locate the first balanced JSON object in `text`.
///
/// Fenced blocks win over inline braces. String literals are skipped while
/// matching braces, so `"}"` inside a value does not end the object.
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(block) = fenced_block(text)
        && let Some(obj) = balanced_object(block)
    {
        return Some(obj);
    }
    balanced_object(text)
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip the info string (json, JSON, ...)
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypothesis::entities::{Geometry, SampleClass};
    use crate::hypothesis::span::Span;

    const CANONICAL: &str = r#"{
  "title": "Glass aging in Pd-based metallic glass",
  "statement": "Relaxation time grows with waiting time below Tg.",
  "geometry": "waxs",
  "q_range": [2.6, 2.9],
  "timescale": [10.0, 3000.0],
  "temperature_k": [500, 560],
  "environment": "furnace",
  "sample": {"material": "Pd43Cu27Ni10P20", "class": "glass"}
}"#;

    #[test]
    fn test_parse_fenced_block() {
        let text = format!("Here is the draft:\n```json\n{CANONICAL}\n```\nLet me know.");
        let h = parse_hypothesis_json(&text).unwrap();
        assert_eq!(h.geometry, Geometry::Waxs);
        assert_eq!(h.sample.class, SampleClass::Glass);
        assert_eq!(h.id, "glass-aging-in-pd-based-metallic-glass");
    }

    #[test]
    fn test_parse_inline_object_in_prose() {
        let text = format!("Sure. {CANONICAL} Hope this helps.");
        let h = parse_hypothesis_json(&text).unwrap();
        assert_eq!(h.timescale, Span { min: 10.0, max: 3000.0 });
    }

    #[test]
    fn test_parse_flat_aliases() {
        let text = r#"{"title": "t", "statement": "s", "q_min": 0.001, "q_max": 0.01,
            "t_min_s": 0.1, "t_max_s": 100, "material": "latex", "sample_class": "colloid"}"#;
        let h = parse_hypothesis_json(text).unwrap();
        assert_eq!(h.q_range, Span { min: 0.001, max: 0.01 });
        assert_eq!(h.timescale, Span { min: 0.1, max: 100.0 });
        assert_eq!(h.sample.class, SampleClass::Colloid);
    }

    #[test]
    fn test_parse_wrapped_object() {
        let text = format!(r#"{{"hypothesis": {CANONICAL}}}"#);
        assert!(parse_hypothesis_json(&text).is_ok());
    }

    #[test]
    fn test_braces_inside_strings() {
        let text = r#"noise {"title": "a } tricky {", "statement": "s", "q_range": [0.01, 0.1],
            "timescale": [1, 2], "sample": {"material": "m"}} trailing }"#;
        let h = parse_hypothesis_json(text).unwrap();
        assert_eq!(h.title, "a } tricky {");
    }

    #[test]
    fn test_no_json() {
        let err = parse_hypothesis_json("I cannot do that.").unwrap_err();
        assert!(err.to_string().contains("no JSON object"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let text = r#"{"title": "t", "statement": "s", "q_range": [0.1, 0.01],
            "timescale": [1, 2], "sample": {"material": "m"}}"#;
        let err = parse_hypothesis_json(text).unwrap_err();
        assert!(err.to_string().contains("q_range"));
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(extract_json_object("{\"a\": 1"), None);
        assert_eq!(extract_json_object("x {\"a\": {}} y"), Some("{\"a\": {}}"));
    }
}
