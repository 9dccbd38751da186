// SPDX-License-Identifier: GPL-3.0-or-later

//! Header name registry and the public `check_header`/`check_headers`
//! entry points, including the DeliveredAlternative sibling-header
//! cross-check.

use crate::sand::diagnostic::Diagnostic;
use crate::sand::messages::MessageClass;
use crate::sand::parser::check_syntax;

const EXPECTED_WARNING: &str = "214 Transformation Applied";

/// Check a single SAND header value against its message-class grammar and
/// post-checks. `name` is matched case-insensitively.
pub fn check_header(name: &str, value: &str) -> Vec<String> {
    let lowered = name.to_ascii_lowercase();
    let Some(class) = MessageClass::from_header_name(&lowered) else {
        return vec![Diagnostic::UnknownHeaderName.to_string()];
    };
    check_message(class, value)
        .into_iter()
        .map(|d| d.to_string())
        .collect()
}

fn check_message(class: MessageClass, value: &str) -> Vec<Diagnostic> {
    let trimmed = value.trim();
    let (object, mut diagnostics) = check_syntax(&class.grammar(), trimmed);
    if let Some(obj) = &object {
        class.post_check(obj, &mut diagnostics);
    }
    diagnostics
}

/// Check every SAND-relevant header in `headers`, in the order given.
/// Produces one report entry per header whose lower-cased name begins
/// with `sand-` or is otherwise a known SAND header.
pub fn check_headers(headers: &[(String, String)]) -> Vec<(String, Vec<String>)> {
    let mut reports = Vec::new();

    for (name, value) in headers {
        let lowered = name.to_ascii_lowercase();
        if !MessageClass::looks_like_sand_header(&lowered) {
            continue;
        }

        let Some(class) = MessageClass::from_header_name(&lowered) else {
            reports.push((name.clone(), vec![Diagnostic::UnknownHeaderName.to_string()]));
            continue;
        };

        let mut diagnostics = check_message(class, value);

        if class == MessageClass::DeliveredAlternative {
            let trimmed = value.trim();
            let (object, _) = check_syntax(&class.grammar(), trimmed);
            check_delivered_alternative_siblings(object.as_ref().and_then(|o| o.attr("contentLocation")), headers, &mut diagnostics);
        }

        reports.push((
            name.clone(),
            diagnostics.into_iter().map(|d| d.to_string()).collect(),
        ));
    }

    reports
}

fn find_header_values<'a>(headers: &'a [(String, String)], target: &str) -> Vec<&'a str> {
    headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case(target))
        .map(|(_, value)| value.as_str())
        .collect()
}

fn vary_is_acceptable(value: &str) -> bool {
    value
        .split(',')
        .map(str::trim)
        .any(|item| item == "*" || item.eq_ignore_ascii_case("sand-acceptedalternatives"))
}

/// Cross-check the sibling `Warning`, `Content-Location`, and `Vary`
/// headers required alongside a `SAND-DeliveredAlternative` header.
fn check_delivered_alternative_siblings(
    content_location_attr: Option<&str>,
    headers: &[(String, String)],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let warnings = find_header_values(headers, "Warning");
    let content_locations = find_header_values(headers, "Content-Location");
    let varies = find_header_values(headers, "Vary");

    if warnings.is_empty() {
        diagnostics.push(Diagnostic::MissingSiblingHeader { header: "Warning" });
    } else {
        // A mismatched Warning is tolerated only until the expected one
        // shows up among possibly-repeated Warning headers.
        let found_expected = warnings.iter().any(|w| w.trim() == EXPECTED_WARNING);
        if !found_expected {
            diagnostics.push(Diagnostic::WarningMismatch {
                found: warnings[0].trim().to_string(),
            });
        }
    }

    if content_locations.is_empty() {
        diagnostics.push(Diagnostic::MissingSiblingHeader {
            header: "Content-Location",
        });
    } else {
        let header_value = content_locations[0].trim();
        if let Some(attr) = content_location_attr {
            let unquoted = attr.trim_matches('"');
            if unquoted != header_value {
                diagnostics.push(Diagnostic::ContentLocationMismatch {
                    attr: unquoted.to_string(),
                    header: header_value.to_string(),
                });
            }
        }
    }

    if varies.is_empty() {
        diagnostics.push(Diagnostic::MissingSiblingHeader { header: "Vary" });
    } else if !varies.iter().any(|v| vary_is_acceptable(v)) {
        diagnostics.push(Diagnostic::VaryMismatch {
            found: varies[0].trim().to_string(),
        });
    }
}
