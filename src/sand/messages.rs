// SPDX-License-Identifier: GPL-3.0-or-later

//! SAND message classes: one grammar plus one post-check routine per
//! message type, layered on top of the generic parser.

use std::collections::HashSet;

use crate::config::config;
use crate::sand::diagnostic::Diagnostic;
use crate::sand::grammar::{self, Grammar};
use crate::sand::tree::SandObject;

/// The set of SAND message classes this checker understands, keyed by
/// their lower-cased header name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum MessageClass {
    AnticipatedRequests,
    SharedResourceAllocation,
    AcceptedAlternatives,
    AbsoluteDeadline,
    MaxRTT,
    NextAlternatives,
    ClientCapabilities,
    DeliveredAlternative,
    BwInformation,
}

impl MessageClass {
    /// Look up the message class for a lower-cased SAND header name.
    pub(crate) fn from_header_name(name: &str) -> Option<Self> {
        match name {
            "sand-anticipatedrequests" => Some(MessageClass::AnticipatedRequests),
            "sand-sharedresourceallocation" => Some(MessageClass::SharedResourceAllocation),
            "sand-acceptedalternatives" => Some(MessageClass::AcceptedAlternatives),
            "sand-absolutedeadline" => Some(MessageClass::AbsoluteDeadline),
            "sand-maxrtt" => Some(MessageClass::MaxRTT),
            "sand-nextalternatives" => Some(MessageClass::NextAlternatives),
            "sand-clientcapabilities" => Some(MessageClass::ClientCapabilities),
            "sand-deliveredalternative" => Some(MessageClass::DeliveredAlternative),
            "sand-bwinformation" => Some(MessageClass::BwInformation),
            _ => None,
        }
    }

    /// `true` iff `name` is handled by this checker, independent of the
    /// exact header name match performed by [MessageClass::from_header_name]
    /// (used by `check_headers` to decide whether an unrecognised
    /// `sand-`-prefixed header still deserves a report entry).
    pub(crate) fn looks_like_sand_header(name: &str) -> bool {
        name.starts_with("sand-")
    }

    pub(crate) fn grammar(self) -> Grammar {
        match self {
            MessageClass::AnticipatedRequests => grammar::anticipated_requests(),
            MessageClass::SharedResourceAllocation => grammar::shared_resource_allocation(),
            MessageClass::AcceptedAlternatives => grammar::accepted_alternatives(),
            MessageClass::AbsoluteDeadline => grammar::absolute_deadline(),
            MessageClass::MaxRTT => grammar::max_rtt(),
            MessageClass::NextAlternatives => grammar::next_alternatives(),
            MessageClass::ClientCapabilities => grammar::client_capabilities(),
            MessageClass::DeliveredAlternative => grammar::delivered_alternative(),
            MessageClass::BwInformation => grammar::bw_information(),
        }
    }

    /// Message-specific semantic checks, run only when the generic parse
    /// produced an object. All diagnostics here are non-fatal.
    pub(crate) fn post_check(self, obj: &SandObject, diagnostics: &mut Vec<Diagnostic>) {
        match self {
            MessageClass::AnticipatedRequests => {
                if obj.list().is_none_or(|l| l.is_empty()) {
                    diagnostics.push(Diagnostic::EmptyAnticipatedRequestsList);
                }
            }
            MessageClass::SharedResourceAllocation => {
                check_shared_resource_allocation(obj, diagnostics);
            }
            MessageClass::AcceptedAlternatives | MessageClass::NextAlternatives => {
                if obj.list().is_none_or(|l| l.is_empty()) {
                    diagnostics.push(Diagnostic::EmptyAlternativesList);
                }
            }
            MessageClass::AbsoluteDeadline | MessageClass::MaxRTT => {
                // No additional post-checks beyond the generic parse.
            }
            MessageClass::ClientCapabilities => {
                check_client_capabilities(obj, diagnostics);
            }
            MessageClass::DeliveredAlternative => {
                // No additional post-checks beyond the generic parse; the
                // sibling-header contract is handled by the dispatcher.
            }
            MessageClass::BwInformation => {
                check_bw_information(obj, diagnostics);
            }
        }
    }
}

const WEIGHT_REQUIRING_STRATEGIES: [&str; 3] = [
    r#""urn:mpeg:dash:sand:allocation:premium-privileged:2016""#,
    r#""urn:mpeg:dash:sand:allocation:everybody-served:2016""#,
    r#""urn:mpeg:dash:sand:allocation:weighted:2016""#,
];

fn check_shared_resource_allocation(obj: &SandObject, diagnostics: &mut Vec<Diagnostic>) {
    let list_empty = obj.list().is_none_or(|l| l.is_empty());
    if list_empty {
        diagnostics.push(Diagnostic::EmptySharedResourceAllocationList);
    }

    let cfg = config();

    if cfg.weight_present_if_strategy_requires {
        if let Some(strategy) = obj.attr("allocationStrategy") {
            if WEIGHT_REQUIRING_STRATEGIES.contains(&strategy) && !obj.has_attr("weight") {
                diagnostics.push(Diagnostic::WeightMandatoryForStrategy {
                    strategy: strategy.to_string(),
                });
            }
        }
    }

    if cfg.operation_points_consistent_attribute_list && !list_empty {
        let list_grammar = grammar::shared_resource_allocation()
            .list
            .expect("SharedResourceAllocation always declares a list grammar");
        let items = obj.list().expect("checked non-empty above").items();
        let first_present: HashSet<&str> = items[0].attrs.keys().map(String::as_str).collect();
        let first_optional = list_grammar.optional_attrs_present(&first_present);
        for item in &items[1..] {
            let present: HashSet<&str> = item.attrs.keys().map(String::as_str).collect();
            let optional = list_grammar.optional_attrs_present(&present);
            if optional != first_optional {
                diagnostics.push(Diagnostic::InconsistentOptionalAttributes);
                break;
            }
        }
    }
}

/// The one registered message-set URN and the codes it implies.
const ALL_MESSAGE_SET_URN: &str = r#""urn:mpeg:dash:sand:messageset:all:2016""#;

fn check_client_capabilities(obj: &SandObject, diagnostics: &mut Vec<Diagnostic>) {
    let supported = obj.attr("supportedMessage");
    let message_set_uri = obj.attr("messageSetUri");

    if supported.is_none() && message_set_uri.is_none() {
        diagnostics.push(Diagnostic::SupportedMessageSetUriMissing);
        return;
    }
    if supported.is_some() && message_set_uri.is_some() {
        diagnostics.push(Diagnostic::SupportedMessageSetUriBothPresent);
    }

    let mut codes: HashSet<String> = HashSet::new();

    if let Some(list_literal) = supported {
        let inner = list_literal
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or("");
        if !inner.is_empty() {
            for code in inner.split(',') {
                codes.insert(code.to_string());
            }
        }
        if codes.contains("0") {
            diagnostics.push(Diagnostic::ReservedCodeZero);
        }
    }

    if let Some(uri) = message_set_uri {
        if uri == ALL_MESSAGE_SET_URN {
            codes.extend((1..=21).map(|n| n.to_string()));
        } else {
            diagnostics.push(Diagnostic::UnknownMessageSetUri {
                uri: uri.to_string(),
            });
            // Assume code 12 was supplied, so an unknown message-set URN
            // doesn't also trigger the "missing code 12" diagnostic below.
            codes.insert("12".to_string());
        }
    }

    if !codes.contains("12") {
        diagnostics.push(Diagnostic::MissingCode12);
    }
}

fn check_bw_information(obj: &SandObject, diagnostics: &mut Vec<Diagnostic>) {
    let min = obj.attr("minBandwidth");
    let max = obj.attr("maxBandwidth");

    if min.is_none() && max.is_none() {
        diagnostics.push(Diagnostic::BandwidthBoundsMissing);
        return;
    }

    if let (Some(min), Some(max)) = (min, max) {
        if let (Ok(min), Ok(max)) = (min.parse::<u64>(), max.parse::<u64>()) {
            if max < min {
                diagnostics.push(Diagnostic::BandwidthBoundsInverted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sand::parser::check_syntax;

    #[test]
    fn test_header_name_lookup() {
        assert_eq!(
            MessageClass::from_header_name("sand-maxrtt"),
            Some(MessageClass::MaxRTT)
        );
        assert_eq!(
            MessageClass::from_header_name("sand-bwinformation"),
            Some(MessageClass::BwInformation)
        );
        assert_eq!(MessageClass::from_header_name("sand-unsupported"), None);
    }

    #[test]
    fn test_client_capabilities_conformant_single_code() {
        let (obj, mut errs) = check_syntax(&MessageClass::ClientCapabilities.grammar(), "supportedMessage=[12]");
        let obj = obj.unwrap();
        MessageClass::ClientCapabilities.post_check(&obj, &mut errs);
        assert!(errs.is_empty());
    }

    #[test]
    fn test_client_capabilities_rejects_code_zero() {
        let (obj, mut errs) =
            check_syntax(&MessageClass::ClientCapabilities.grammar(), "supportedMessage=[0,12]");
        let obj = obj.unwrap();
        MessageClass::ClientCapabilities.post_check(&obj, &mut errs);
        assert!(errs
            .iter()
            .any(|e| e.to_string().contains("should not include reserved code 0")));
    }

    #[test]
    fn test_client_capabilities_requires_code_12() {
        let (obj, mut errs) =
            check_syntax(&MessageClass::ClientCapabilities.grammar(), "supportedMessage=[1,2]");
        let obj = obj.unwrap();
        MessageClass::ClientCapabilities.post_check(&obj, &mut errs);
        assert!(errs
            .iter()
            .any(|e| e.to_string().contains("must include code 12")));
    }

    #[test]
    fn test_anticipated_requests_post_check_empty_list() {
        let g = MessageClass::AnticipatedRequests.grammar();
        let (obj, mut errs) = check_syntax(
            &g,
            r#"[sourceUrl="http://x/y",targetTime=20160601T120000Z]"#,
        );
        let obj = obj.unwrap();
        MessageClass::AnticipatedRequests.post_check(&obj, &mut errs);
        assert!(errs.is_empty());
    }

    #[test]
    fn test_bw_information_conformant() {
        let (obj, mut errs) =
            check_syntax(&MessageClass::BwInformation.grammar(), "minBandwidth=100,maxBandwidth=200");
        let obj = obj.unwrap();
        MessageClass::BwInformation.post_check(&obj, &mut errs);
        assert!(errs.is_empty());
    }

    #[test]
    fn test_bw_information_requires_at_least_one_bound() {
        let (obj, mut errs) = check_syntax(&MessageClass::BwInformation.grammar(), "senderId=\"me\"");
        let obj = obj.unwrap();
        MessageClass::BwInformation.post_check(&obj, &mut errs);
        assert!(errs
            .iter()
            .any(|e| e.to_string().contains("At least one of minBandwidth or maxBandwidth")));
    }

    #[test]
    fn test_bw_information_rejects_inverted_bounds() {
        let (obj, mut errs) =
            check_syntax(&MessageClass::BwInformation.grammar(), "minBandwidth=200,maxBandwidth=100");
        let obj = obj.unwrap();
        MessageClass::BwInformation.post_check(&obj, &mut errs);
        assert!(errs
            .iter()
            .any(|e| e.to_string().contains("maxBandwidth should be greater or equal than minBandwidth")));
    }
}
