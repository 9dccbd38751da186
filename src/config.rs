// SPDX-License-Identifier: GPL-3.0-or-later

use dotenvy::var;
use std::sync::OnceLock;

static CONFIG: OnceLock<Config> = OnceLock::new();

/// This checker's process-wide configuration Singleton.
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

/// The optional extended semantic checks a caller may turn on. Both
/// default to off, matching strict MPEG conformance: a header is accepted
/// as long as it satisfies the mandatory grammar, and these two additional
/// constraints are only enforced when explicitly requested.
#[derive(Debug)]
pub struct Config {
    /// Require `weight` whenever `allocationStrategy` names a strategy
    /// that depends on it. Env var `SAND_WEIGHT_PRESENT_IF_STRATEGY_REQUIRES`.
    pub(crate) weight_present_if_strategy_requires: bool,
    /// Require every item of a `SAND-SharedResourceAllocation` list to
    /// expose the same set of optional attributes. Env var
    /// `SAND_OPERATION_POINTS_CONSISTENT_ATTRIBUTE_LIST`.
    pub(crate) operation_points_consistent_attribute_list: bool,
}

fn flag(name: &str) -> bool {
    var(name)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weight_present_if_strategy_requires: flag(
                "SAND_WEIGHT_PRESENT_IF_STRATEGY_REQUIRES",
            ),
            operation_points_consistent_attribute_list: flag(
                "SAND_OPERATION_POINTS_CONSISTENT_ATTRIBUTE_LIST",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_defaults_to_false_when_unset() {
        assert!(!flag("SAND_CONFIG_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_default_config_has_both_extended_checks_off() {
        let cfg = Config::default();
        assert!(!cfg.weight_present_if_strategy_requires);
        assert!(!cfg.operation_points_consistent_attribute_list);
    }
}
