//! CVSS v3.x base score calculation.
//!
//! osv-scanner reports severities as vector strings such as
//! `CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H`. This computes the base
//! score those vectors describe so they can be mapped like plain numbers.

use std::collections::HashMap;

/// Parses a score that is either a number or a CVSS v3 vector.
///
/// Returns `None` for anything else, including v2 and v4 vectors.
pub fn parse_score(score: &str) -> Option<f64> {
    let score = score.trim();
    if let Ok(value) = score.parse::<f64>() {
        return Some(value);
    }
    base_score(score)
}

/// Computes the base score of a `CVSS:3.0` or `CVSS:3.1` vector.
pub fn base_score(vector: &str) -> Option<f64> {
    let mut parts = vector.split('/');
    let version = parts.next()?;
    if version != "CVSS:3.0" && version != "CVSS:3.1" {
        return None;
    }

    let metrics: HashMap<&str, &str> = parts.filter_map(|part| part.split_once(':')).collect();

    let scope_changed = match *metrics.get("S")? {
        "U" => false,
        "C" => true,
        _ => return None,
    };

    let attack_vector = match *metrics.get("AV")? {
        "N" => 0.85,
        "A" => 0.62,
        "L" => 0.55,
        "P" => 0.2,
        _ => return None,
    };
    let attack_complexity = match *metrics.get("AC")? {
        "L" => 0.77,
        "H" => 0.44,
        _ => return None,
    };
    let privileges_required = match (*metrics.get("PR")?, scope_changed) {
        ("N", _) => 0.85,
        ("L", false) => 0.62,
        ("L", true) => 0.68,
        ("H", false) => 0.27,
        ("H", true) => 0.5,
        _ => return None,
    };
    let user_interaction = match *metrics.get("UI")? {
        "N" => 0.85,
        "R" => 0.62,
        _ => return None,
    };

    let confidentiality = impact_weight(metrics.get("C")?)?;
    let integrity = impact_weight(metrics.get("I")?)?;
    let availability = impact_weight(metrics.get("A")?)?;

    let iss = 1.0 - (1.0 - confidentiality) * (1.0 - integrity) * (1.0 - availability);
    let impact = if scope_changed {
        7.52 * (iss - 0.029) - 3.25 * (iss - 0.02).powi(15)
    } else {
        6.42 * iss
    };

    if impact <= 0.0 {
        return Some(0.0);
    }

    let exploitability =
        8.22 * attack_vector * attack_complexity * privileges_required * user_interaction;

    let score = if scope_changed {
        round_up((1.08 * (impact + exploitability)).min(10.0))
    } else {
        round_up((impact + exploitability).min(10.0))
    };

    Some(score)
}

fn impact_weight(value: &str) -> Option<f64> {
    match value {
        "H" => Some(0.56),
        "L" => Some(0.22),
        "N" => Some(0.0),
        _ => None,
    }
}

/// Rounds up to one decimal place, avoiding floating point artefacts.
fn round_up(value: f64) -> f64 {
    let int_input = (value * 100_000.0).round() as i64;
    if int_input % 10_000 == 0 {
        int_input as f64 / 100_000.0
    } else {
        ((int_input / 10_000) + 1) as f64 / 10.0
    }
}
