//! Forgiving field readers for stored documents.
//!
//! Anything missing, null, non-numeric, non-finite or negative reads as 0 and
//! flags follow truthiness. Malformed data degrades to a zero contribution
//! instead of failing the read.

use serde_json::Value;

/// Read a non-negative number from a JSON value.
pub fn number(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => return number_from_cell(s),
        _ => 0.0,
    };
    sanitize(raw)
}

/// Read a non-negative whole count from a JSON value. Fractions are dropped.
pub fn count(value: Option<&Value>) -> u32 {
    to_count(number(value))
}

/// JSON truthiness: `true`, non-zero numbers, non-empty strings, arrays and
/// objects. Missing and null are false.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Read a number out of a text cell. Accepts a decimal comma.
pub fn number_from_cell(cell: &str) -> f64 {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let parsed = trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
        .unwrap_or(0.0);
    sanitize(parsed)
}

pub fn count_from_cell(cell: &str) -> u32 {
    to_count(number_from_cell(cell))
}

/// Read a flag out of a text cell; `default` applies to an empty cell.
pub fn flag_from_cell(cell: &str, default: bool) -> bool {
    match cell.trim().to_lowercase().as_str() {
        "" => default,
        "true" | "1" | "yes" | "y" => true,
        _ => false,
    }
}

fn sanitize(raw: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        0.0
    }
}

fn to_count(n: f64) -> u32 {
    if n >= u32::MAX as f64 {
        u32::MAX
    } else {
        n.trunc() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_coercion() {
        assert_eq!(number(Some(&json!(12.5))), 12.5);
        assert_eq!(number(Some(&json!("3"))), 3.0);
        assert_eq!(number(Some(&json!("2,5"))), 2.5);
        assert_eq!(number(Some(&json!("abc"))), 0.0);
        assert_eq!(number(Some(&json!(null))), 0.0);
        assert_eq!(number(Some(&json!(true))), 0.0);
        assert_eq!(number(Some(&json!([1]))), 0.0);
        assert_eq!(number(Some(&json!(-4))), 0.0);
        assert_eq!(number(None), 0.0);
    }

    #[test]
    fn test_count_drops_fractions() {
        assert_eq!(count(Some(&json!(2.9))), 2);
        assert_eq!(count(Some(&json!("7"))), 7);
        assert_eq!(count(Some(&json!({"a": 1}))), 0);
    }

    #[test]
    fn test_truthiness() {
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!(1))));
        assert!(truthy(Some(&json!("x"))));
        assert!(!truthy(Some(&json!(false))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(Some(&json!(null))));
        assert!(!truthy(None));
    }

    #[test]
    fn test_cells() {
        assert_eq!(number_from_cell(" 1.5 "), 1.5);
        assert_eq!(number_from_cell("NaN"), 0.0);
        assert_eq!(number_from_cell("inf"), 0.0);
        assert_eq!(count_from_cell(""), 0);
        assert!(flag_from_cell("TRUE", false));
        assert!(flag_from_cell("", true));
        assert!(!flag_from_cell("no", true));
        assert!(!flag_from_cell("false", true));
    }
}
