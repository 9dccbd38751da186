// SPDX-License-Identifier: GPL-3.0-or-later

//! The closed diagnostic vocabulary produced while checking a SAND header.
//!
//! Every condition the generic parser, the message schemas and the
//! post-checks can raise is a variant of [Diagnostic]. The public surface
//! stays string-valued (conformance reports are `Vec<String>`), but every
//! diagnostic is a typed, matchable value before it is rendered — the same
//! shape as the teacher crate's `ValidationError` behind its
//! `Vec<ValidationError>`-returning `Validate` trait.

use thiserror::Error;

/// Marker returned instead of a [Diagnostic] when a condition is fatal:
/// the diagnostic describing *why* has already been pushed onto the
/// current [crate::sand::parser::ParseContext]; this type only carries the
/// unwind signal through `?`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fatal;

/// One diagnosed condition, fatal or not. `#[error(...)]` renders the
/// exact wording surfaced in a conformance report.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("Only one list is allowed{suffix}.")]
    DuplicateList { suffix: String },

    #[error("Unexpected sand-list found{suffix}. Stopping parsing.")]
    UnexpectedList { suffix: String },

    #[error("Unmatched '[' to close sand-list{suffix}.")]
    UnmatchedListOpen { suffix: String },

    #[error("Unexpected '[' found (and no closing ']'){suffix}.")]
    UnexpectedListOpen { suffix: String },

    #[error("Expecting '=' for sand-attribute{suffix}.")]
    MissingEquals { suffix: String },

    #[error("sand-attribute name should be alphabetic{suffix}.")]
    NameNotAlphabetic { suffix: String },

    #[error("no space allowed around sand-attribute name{suffix}.")]
    NameHasSpace { suffix: String },

    #[error("Empty value for sand-attribute after '='{suffix}.")]
    EmptyValue { suffix: String },

    #[error("Unexpected sand-attribute name '{name}'{suffix}. Stopping parsing.")]
    UnexpectedAttrName { name: String, suffix: String },

    #[error("sand-attribute {name} should occur only once{suffix}.")]
    DuplicateAttr { name: String, suffix: String },

    #[error("Expecting ',', found '{found}'{suffix}. Stopping parsing.")]
    ExpectingComma { found: String, suffix: String },

    #[error("Mandatory sand-list is missing{suffix}.")]
    MissingMandatoryList { suffix: String },

    #[error("Mandatory sand-attribute '{name}' is missing{suffix}.")]
    MissingMandatoryAttr { name: String, suffix: String },

    #[error("Empty element at end of sand-list.")]
    EmptyTrailingListElement,

    #[error("Expecting ';' or ']', found '{found}'. Stopping parsing.")]
    ExpectingSemiOrClose { found: String },

    #[error("Wrong or missing {type_name} specification.")]
    WrongValueType { type_name: &'static str },

    #[error("Inconsistent byte range: {left} is greater than {right}.")]
    InconsistentByteRange { left: u64, right: u64 },

    #[error("Enveloppe attributes (senderId, generationTime) should appear first.")]
    EnveloppeNotFirst,

    #[error("Common attributes (messageId, validityTime) should appear first.")]
    CommonNotFirst,

    #[error("At least one request must be specified.")]
    EmptyAnticipatedRequestsList,

    #[error("At least one operation point must be specified.")]
    EmptySharedResourceAllocationList,

    #[error("At least one alternative must be specified.")]
    EmptyAlternativesList,

    #[error("Attribute weight is mandatory for strategy {strategy}.")]
    WeightMandatoryForStrategy { strategy: String },

    #[error("Optional attributes are not consistent through the list of operationPoints.")]
    InconsistentOptionalAttributes,

    #[error("Only one of supportedMessage or messageSetUri should be specified.")]
    SupportedMessageSetUriBothPresent,

    #[error("At least one of supportedMessage or messageSetUri must be specified.")]
    SupportedMessageSetUriMissing,

    #[error("supportedMessage should not include reserved code 0.")]
    ReservedCodeZero,

    #[error("supportedMessage must include code 12 (ClientCapabilities).")]
    MissingCode12,

    #[error("messageSetUri '{uri}' is not a known urn.")]
    UnknownMessageSetUri { uri: String },

    #[error("At least one of minBandwidth or maxBandwidth should be specified.")]
    BandwidthBoundsMissing,

    #[error("The value of maxBandwidth should be greater or equal than minBandwidth.")]
    BandwidthBoundsInverted,

    #[error("Header name not supported by this version of conformance server.")]
    UnknownHeaderName,

    #[error("Mandatory {header} header missing for SAND-DeliveredAlternative.")]
    MissingSiblingHeader { header: &'static str },

    #[error(
        "Warning header '{found}' does not match the expected '214 Transformation Applied'."
    )]
    WarningMismatch { found: String },

    #[error(
        "contentLocation attribute '{attr}' is not consistent with Content-Location header '{header}'."
    )]
    ContentLocationMismatch { attr: String, header: String },

    #[error("Vary header '{found}' does not include '*' or 'sand-acceptedalternatives'.")]
    VaryMismatch { found: String },
}

/// Positional suffix appended to diagnostics raised while parsing an item
/// nested inside a sand-list, e.g. `" for object at position 2"`.
pub fn position_suffix(item_number: Option<usize>) -> String {
    match item_number {
        Some(n) => format!(" for object at position {n}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_suffix() {
        assert_eq!(position_suffix(None), "");
        assert_eq!(position_suffix(Some(2)), " for object at position 2");
    }

    #[test]
    fn test_rendering_matches_expected_wording() {
        let d = Diagnostic::MissingMandatoryAttr {
            name: "targetTime".into(),
            suffix: String::new(),
        };
        assert_eq!(
            d.to_string(),
            "Mandatory sand-attribute 'targetTime' is missing."
        );

        let d = Diagnostic::WrongValueType { type_name: "INT" };
        assert_eq!(d.to_string(), "Wrong or missing INT specification.");

        let d = Diagnostic::ReservedCodeZero;
        assert_eq!(
            d.to_string(),
            "supportedMessage should not include reserved code 0."
        );

        let d = Diagnostic::MissingCode12;
        assert_eq!(
            d.to_string(),
            "supportedMessage must include code 12 (ClientCapabilities)."
        );
    }
}
