// SPDX-License-Identifier: GPL-3.0-or-later

//! Grammar descriptors for sand-objects.
//!
//! A [Grammar] replaces the reference implementation's dictionary keyed by
//! attribute name plus a `MANDATORY` sentinel entry with an explicit record:
//! the nested-list mandatory bit gets its own field instead of a magic
//! `"list"` string living inside the mandatory set.

use crate::sand::types::AtomicType;
use std::collections::{HashMap, HashSet};

/// Syntax description for one level of sand-object (top-level message, or
/// one item of a nested sand-list).
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    /// Names of attributes that MUST appear at this level.
    pub mandatory_attrs: HashSet<&'static str>,
    /// Allowed attribute names mapped to their expected atomic type.
    pub attrs: HashMap<&'static str, AtomicType>,
    /// Grammar for the items of this level's nested sand-list, if one is
    /// allowed here.
    pub list: Option<Box<Grammar>>,
    /// `true` iff the nested list itself is mandatory at this level.
    pub list_mandatory: bool,
}

impl Grammar {
    fn with_attrs(attrs: &[(&'static str, AtomicType)]) -> Self {
        Grammar {
            attrs: attrs.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn mandatory(mut self, names: &[&'static str]) -> Self {
        self.mandatory_attrs = names.iter().copied().collect();
        self
    }

    fn with_list(mut self, list: Grammar) -> Self {
        self.list = Some(Box::new(list));
        self
    }

    fn list_is_mandatory(mut self) -> Self {
        self.list_mandatory = true;
        self
    }

    /// The attribute names that are allowed at this level but not
    /// mandatory, and that are present on `present`. Used by the
    /// `SharedResourceAllocation` "consistent optional attributes" check.
    pub fn optional_attrs_present(&self, present: &HashSet<&str>) -> HashSet<&'static str> {
        self.attrs
            .keys()
            .copied()
            .filter(|name| !self.mandatory_attrs.contains(name) && present.contains(name))
            .collect()
    }
}

/// `senderId: QUOTEDSTRING`, `generationTime: DATETIME` — both optional,
/// but when present must precede common and message-specific attributes.
pub fn enveloppe_attrs() -> HashMap<&'static str, AtomicType> {
    [
        ("senderId", AtomicType::QuotedString),
        ("generationTime", AtomicType::DateTime),
    ]
    .into_iter()
    .collect()
}

/// `messageId: INT`, `validityTime: DATETIME` — both optional, but when
/// present must precede message-specific attributes (and follow enveloppe
/// attributes, which §4.7's single-phase state machine also permits
/// interleaved with common attributes).
pub fn common_attrs() -> HashMap<&'static str, AtomicType> {
    [
        ("messageId", AtomicType::Int),
        ("validityTime", AtomicType::DateTime),
    ]
    .into_iter()
    .collect()
}

/// `true` iff `name` is one of the two enveloppe attribute names.
pub fn is_enveloppe_attr(name: &str) -> bool {
    matches!(name, "senderId" | "generationTime")
}

/// `true` iff `name` is one of the two common attribute names.
pub fn is_common_attr(name: &str) -> bool {
    matches!(name, "messageId" | "validityTime")
}

/// Merge the enveloppe and common attribute maps into a message-specific
/// top-level grammar. `MANDATORY` becomes the union of all three sets (the
/// enveloppe/common contributions are always empty, per §3, but the merge
/// is written generically rather than special-cased).
fn with_envelope_and_common(mut message: Grammar) -> Grammar {
    for (name, ty) in enveloppe_attrs() {
        message.attrs.entry(name).or_insert(ty);
    }
    for (name, ty) in common_attrs() {
        message.attrs.entry(name).or_insert(ty);
    }
    message
}

fn anticipated_requests_list_grammar() -> Grammar {
    Grammar::with_attrs(&[
        ("sourceUrl", AtomicType::QuotedUri),
        ("targetTime", AtomicType::DateTime),
        ("range", AtomicType::ByteRange),
    ])
    .mandatory(&["sourceUrl", "targetTime"])
}

fn shared_resource_allocation_list_grammar() -> Grammar {
    Grammar::with_attrs(&[
        ("bandwidth", AtomicType::Int),
        ("quality", AtomicType::Int),
        ("minBufferTime", AtomicType::Int),
    ])
    .mandatory(&["bandwidth"])
}

/// Shared by AcceptedAlternatives and NextAlternatives.
fn alternatives_list_grammar() -> Grammar {
    Grammar::with_attrs(&[
        ("sourceUrl", AtomicType::QuotedUri),
        ("range", AtomicType::ByteRange),
        ("bandwidth", AtomicType::Int),
        ("deliveryScope", AtomicType::Int),
    ])
    .mandatory(&["sourceUrl"])
}

/// Top-level grammar for the `SAND-AnticipatedRequests` message, with
/// enveloppe/common attributes merged in.
pub fn anticipated_requests() -> Grammar {
    with_envelope_and_common(
        Grammar::default()
            .with_list(anticipated_requests_list_grammar())
            .list_is_mandatory(),
    )
}

/// Top-level grammar for the `SAND-SharedResourceAllocation` message.
pub fn shared_resource_allocation() -> Grammar {
    with_envelope_and_common(
        Grammar::with_attrs(&[
            ("weight", AtomicType::Int),
            ("allocationStrategy", AtomicType::QuotedUrn),
            ("mpdUrl", AtomicType::QuotedUri),
        ])
        .with_list(shared_resource_allocation_list_grammar())
        .list_is_mandatory(),
    )
}

/// Top-level grammar for the `SAND-AcceptedAlternatives` message.
pub fn accepted_alternatives() -> Grammar {
    with_envelope_and_common(
        Grammar::default()
            .with_list(alternatives_list_grammar())
            .list_is_mandatory(),
    )
}

/// Top-level grammar for the `SAND-AbsoluteDeadline` message.
pub fn absolute_deadline() -> Grammar {
    with_envelope_and_common(
        Grammar::with_attrs(&[("deadline", AtomicType::DateTime)]).mandatory(&["deadline"]),
    )
}

/// Top-level grammar for the `SAND-MaxRTT` message.
pub fn max_rtt() -> Grammar {
    with_envelope_and_common(
        Grammar::with_attrs(&[("maxRTT", AtomicType::Int)]).mandatory(&["maxRTT"]),
    )
}

/// Top-level grammar for the `SAND-NextAlternatives` message.
pub fn next_alternatives() -> Grammar {
    with_envelope_and_common(
        Grammar::default()
            .with_list(alternatives_list_grammar())
            .list_is_mandatory(),
    )
}

/// Top-level grammar for the `SAND-ClientCapabilities` message.
pub fn client_capabilities() -> Grammar {
    with_envelope_and_common(Grammar::with_attrs(&[
        ("supportedMessage", AtomicType::List),
        ("messageSetUri", AtomicType::QuotedUrn),
    ]))
}

/// Top-level grammar for the `SAND-DeliveredAlternative` message.
pub fn delivered_alternative() -> Grammar {
    with_envelope_and_common(
        Grammar::with_attrs(&[
            ("initialUrl", AtomicType::QuotedUri),
            ("contentLocation", AtomicType::QuotedUri),
        ])
        .mandatory(&["contentLocation"]),
    )
}

/// Top-level grammar for the `SAND-BwInformation` message.
pub fn bw_information() -> Grammar {
    with_envelope_and_common(Grammar::with_attrs(&[
        ("minBandwidth", AtomicType::Int),
        ("maxBandwidth", AtomicType::Int),
    ]))
}
