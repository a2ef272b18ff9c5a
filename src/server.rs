//! Server-side component: breakpoint filters and page-lifecycle injections.
//!
//! [`BreakpointOverride`] registers four filters that replace the theme's
//! breakpoint values at their source, and three `<style>` injections placed so
//! the override declarations follow the theme's own (head-early sets the
//! custom properties, head-late and footer re-declare after everything else).
//! Every callback reads the store on invocation, so each page render sees the
//! pair persisted at that moment.

use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::generator;
use crate::hooks::HookRegistry;
use crate::store::ThresholdStore;
use crate::{BreakpointPair, OverrideConfig};

pub const TABLET_BREAKPOINT_FILTER: &str = "kadence_blocks_tablet_breakpoint";
pub const MOBILE_BREAKPOINT_FILTER: &str = "kadence_blocks_mobile_breakpoint";
pub const DEFAULT_BREAKPOINTS_FILTER: &str = "kadence_blocks_default_breakpoints";
pub const SCREEN_SIZES_FILTER: &str = "kadence_screen_sizes";

/// All four filters, in registration order
pub const FILTERS: [&str; 4] = [
    TABLET_BREAKPOINT_FILTER,
    MOBILE_BREAKPOINT_FILTER,
    DEFAULT_BREAKPOINTS_FILTER,
    SCREEN_SIZES_FILTER,
];

/// Late enough to win over the theme's own filters
pub const FILTER_PRIORITY: i32 = 999;

pub const HEAD_ACTION: &str = "wp_head";
pub const FOOTER_ACTION: &str = "wp_footer";

/// Where in the rendered page an override block is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionPoint {
    HeadEarly,
    HeadLate,
    Footer,
}

impl InjectionPoint {
    pub const ALL: [InjectionPoint; 3] = [
        InjectionPoint::HeadEarly,
        InjectionPoint::HeadLate,
        InjectionPoint::Footer,
    ];

    pub fn action(self) -> &'static str {
        match self {
            InjectionPoint::HeadEarly | InjectionPoint::HeadLate => HEAD_ACTION,
            InjectionPoint::Footer => FOOTER_ACTION,
        }
    }

    pub fn priority(self) -> i32 {
        match self {
            InjectionPoint::HeadEarly => 1,
            InjectionPoint::HeadLate | InjectionPoint::Footer => 9999,
        }
    }

    pub fn element_id(self) -> &'static str {
        match self {
            InjectionPoint::HeadEarly => "breakpoint-override-early",
            InjectionPoint::HeadLate => "breakpoint-override-late",
            InjectionPoint::Footer => "breakpoint-override-footer",
        }
    }

    pub fn css(self, pair: BreakpointPair) -> String {
        match self {
            InjectionPoint::HeadEarly => generator::early_css(pair),
            InjectionPoint::HeadLate => generator::late_css(pair),
            InjectionPoint::Footer => generator::footer_css(pair),
        }
    }

    /// `<style>` element emitted at this point
    pub fn markup(self, pair: BreakpointPair) -> String {
        generator::style_element(self.element_id(), &self.css(pair))
    }
}

/// Overwrite the `tablet`/`mobile` entries of a breakpoint map.
///
/// Only keys already present are replaced; anything that is not a map is
/// returned as-is.
pub fn filter_breakpoint_map(value: Value, pair: BreakpointPair) -> Value {
    match value {
        Value::Object(mut map) => {
            if map.contains_key("tablet") {
                map.insert("tablet".to_string(), Value::from(pair.tablet));
            }
            if map.contains_key("mobile") {
                map.insert("mobile".to_string(), Value::from(pair.mobile));
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// The server half, bound to one threshold store
pub struct BreakpointOverride {
    store: Arc<ThresholdStore>,
    config: OverrideConfig,
}

impl BreakpointOverride {
    pub fn new(store: Arc<ThresholdStore>, config: OverrideConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<ThresholdStore> {
        &self.store
    }

    pub fn config(&self) -> &OverrideConfig {
        &self.config
    }

    /// Pair in effect for the current render
    pub fn breakpoints(&self) -> BreakpointPair {
        self.store.get()
    }

    /// Register the filters, and the injections unless rendering the admin area
    pub fn register(&self, registry: &mut HookRegistry) {
        let store = Arc::clone(&self.store);
        registry.add_filter(TABLET_BREAKPOINT_FILTER, FILTER_PRIORITY, move |_| {
            Value::from(store.get().tablet)
        });

        let store = Arc::clone(&self.store);
        registry.add_filter(MOBILE_BREAKPOINT_FILTER, FILTER_PRIORITY, move |_| {
            Value::from(store.get().mobile)
        });

        for name in [DEFAULT_BREAKPOINTS_FILTER, SCREEN_SIZES_FILTER] {
            let store = Arc::clone(&self.store);
            registry.add_filter(name, FILTER_PRIORITY, move |v| {
                filter_breakpoint_map(v, store.get())
            });
        }

        if self.config.is_admin {
            debug!("admin request, skipping front-end style injection");
            return;
        }

        for point in InjectionPoint::ALL {
            let store = Arc::clone(&self.store);
            registry.add_action(point.action(), point.priority(), move || {
                point.markup(store.get())
            });
        }
        debug!("registered {} filters and {} injections", FILTERS.len(), InjectionPoint::ALL.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BreakpointInput;
    use serde_json::json;

    fn plugin(is_admin: bool) -> (Arc<ThresholdStore>, HookRegistry) {
        let store = Arc::new(ThresholdStore::in_memory());
        store.set(&BreakpointInput::new(900, 600)).unwrap();
        let config = OverrideConfig { is_admin, ..Default::default() };
        let mut registry = HookRegistry::new();
        BreakpointOverride::new(Arc::clone(&store), config).register(&mut registry);
        (store, registry)
    }

    #[test]
    fn scalar_filters_return_configured_values() {
        let (_, reg) = plugin(false);
        assert_eq!(reg.apply_filters(TABLET_BREAKPOINT_FILTER, json!(1024)), json!(900));
        assert_eq!(reg.apply_filters(MOBILE_BREAKPOINT_FILTER, json!(767)), json!(600));
    }

    #[test]
    fn map_filters_only_touch_present_keys() {
        let (_, reg) = plugin(false);
        let out = reg.apply_filters(DEFAULT_BREAKPOINTS_FILTER, json!({ "desktop": 1440, "tablet": 1024 }));
        assert_eq!(out, json!({ "desktop": 1440, "tablet": 900 }));
        let out = reg.apply_filters(SCREEN_SIZES_FILTER, json!({ "mobile": 767 }));
        assert_eq!(out, json!({ "mobile": 600 }));
        assert_eq!(reg.apply_filters(SCREEN_SIZES_FILTER, json!("n/a")), json!("n/a"));
    }

    #[test]
    fn injections_follow_store_updates() {
        let (store, reg) = plugin(false);
        assert!(reg.do_action(HEAD_ACTION).contains("--kb-tablet-break: 900px"));
        store.set(&BreakpointInput::new(1100, 700)).unwrap();
        let head = reg.do_action(HEAD_ACTION);
        assert!(head.contains("--kb-tablet-break: 1100px"));
        assert!(head.contains("@media (max-width: 700px)"));
    }

    #[test]
    fn admin_requests_get_filters_but_no_injections() {
        let (_, reg) = plugin(true);
        assert!(reg.has_filter(TABLET_BREAKPOINT_FILTER));
        assert!(!reg.has_action(HEAD_ACTION));
        assert!(!reg.has_action(FOOTER_ACTION));
    }

    #[test]
    fn injection_points_are_ordered() {
        let (_, reg) = plugin(false);
        let head = reg.do_action(HEAD_ACTION);
        let early = head.find("id=\"breakpoint-override-early\"").unwrap();
        let late = head.find("id=\"breakpoint-override-late\"").unwrap();
        assert!(early < late);
        assert!(reg.do_action(FOOTER_ACTION).contains("id=\"breakpoint-override-footer\""));
    }
}
