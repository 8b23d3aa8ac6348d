use std::fmt;

use crate::error::RankError;

/// Which mark field an edit targets. Each field carries its own bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Ut,
    Final,
    Additional,
}

impl MarkKind {
    pub const MIN: u32 = 0;

    pub fn max(self) -> u32 {
        match self {
            MarkKind::Ut => 20,
            MarkKind::Final => 80,
            MarkKind::Additional => 100,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarkKind::Ut => "UT",
            MarkKind::Final => "Final",
            MarkKind::Additional => "Additional",
        }
    }
}

impl fmt::Display for MarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkKind::Additional => f.write_str("Additional subject"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// The two components of a main-subject mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainPart {
    Ut,
    Final,
}

impl MainPart {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ut" => Some(MainPart::Ut),
            "final" => Some(MainPart::Final),
            _ => None,
        }
    }

    pub fn kind(self) -> MarkKind {
        match self {
            MainPart::Ut => MarkKind::Ut,
            MainPart::Final => MarkKind::Final,
        }
    }
}

pub fn validate_mark(kind: MarkKind, value: i64) -> Result<u32, RankError> {
    let max = kind.max();
    if value < MarkKind::MIN as i64 || value > max as i64 {
        return Err(RankError::Range {
            kind,
            value,
            min: MarkKind::MIN,
            max,
        });
    }
    Ok(value as u32)
}

/// Turns whatever the number input sent into a candidate mark.
///
/// Missing, blank and non-numeric input reads as 0, the same way the entry
/// form treats a cleared field. Fractional numbers are rejected.
pub fn coerce_mark_input(
    kind: MarkKind,
    raw: Option<&serde_json::Value>,
) -> Result<i64, RankError> {
    use serde_json::Value;

    let n = match raw {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            n.as_f64().unwrap_or(0.0)
        }
        Some(Value::String(s)) => {
            let t = s.trim();
            if let Ok(i) = t.parse::<i64>() {
                return Ok(i);
            }
            match t.parse::<f64>() {
                Ok(v) => v,
                Err(_) => return Ok(0),
            }
        }
        Some(_) => return Ok(0),
    };

    if !n.is_finite() {
        return Ok(0);
    }
    if n.fract() != 0.0 {
        return Err(RankError::InvalidMark { kind, value: n });
    }
    Ok(n as i64)
}

/// Upper bound of a half-yearly or final exam score.
pub const TERM_MARK_MAX: f64 = 1000.0;

/// Exam scores are clamped into range rather than rejected. NaN reads as 0.
pub fn clamp_term_mark(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, TERM_MARK_MAX)
}

pub fn coerce_term_mark(raw: Option<&serde_json::Value>) -> f64 {
    use serde_json::Value;

    let n = match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    clamp_term_mark(n)
}
