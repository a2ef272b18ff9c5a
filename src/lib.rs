//! Breakpoint Override
//!
//! Overrides the hardcoded responsive breakpoints (tablet/mobile pixel widths)
//! baked into a page-builder theme's compiled styles, without rebuilding the
//! theme's assets.
//!
//! # Features
//!
//! - **Text rewriting**: swaps the theme's `max-width`/`min-width` literals in
//!   inline style text for the configured thresholds ([`rewriter`])
//! - **CSS generation**: custom-property and visibility media-query blocks that
//!   encode the configured thresholds ([`generator`])
//! - **Server hooks**: breakpoint filters and three page-lifecycle injections
//!   registered into a host [`hooks::HookRegistry`] ([`server`])
//! - **Browser passes**: idempotent rewrite passes over a document's style
//!   elements, driven by load and insertion events ([`scheduler`], [`observer`])
//!
//! # Example
//!
//! ```
//! use breakpoint_override::{rewriter, BreakpointPair, ORIGINAL_BREAKPOINTS};
//!
//! let to = BreakpointPair::new(900, 600);
//! let out = rewriter::rewrite("@media (max-width: 1024px){.a{color:red}}", ORIGINAL_BREAKPOINTS, to);
//! assert_eq!(out.text, "@media (max-width: 900px){.a{color:red}}");
//! assert!(out.changed);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod generator;
pub mod rewriter;
pub mod store;

// Host-platform side: extension points, the registered callbacks, settings page
pub mod admin;
pub mod hooks;
pub mod server;

// Browser side: style documents, trigger policy and the event-driven worker
pub mod document;
pub mod observer;
pub mod scheduler;

pub use generator::generate;
pub use rewriter::{rewrite, Rewrite, Rewriter};
pub use store::{sanitize, BreakpointInput, ThresholdStore};

/// Crate version, stamped into generated CSS headers
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A pair of responsive width thresholds in pixels.
///
/// A valid pair has both values at least 1 and `mobile < tablet`. Values
/// coming from user input go through [`store::sanitize`], which is the only
/// place that invariant is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BreakpointPair {
    /// Upper bound of the tablet range
    pub tablet: u32,
    /// Upper bound of the mobile range
    pub mobile: u32,
}

impl BreakpointPair {
    pub const fn new(tablet: u32, mobile: u32) -> Self {
        Self { tablet, mobile }
    }

    /// Whether the pair satisfies `tablet >= 1`, `mobile >= 1`, `mobile < tablet`
    pub fn is_valid(&self) -> bool {
        self.tablet >= 1 && self.mobile >= 1 && self.mobile < self.tablet
    }

    /// First width of the desktop range
    pub fn desktop_min(&self) -> u32 {
        self.tablet.saturating_add(1)
    }

    /// First width of the tablet range
    pub fn tablet_min(&self) -> u32 {
        self.mobile.saturating_add(1)
    }
}

impl Default for BreakpointPair {
    fn default() -> Self {
        DEFAULT_BREAKPOINTS
    }
}

impl std::fmt::Display for BreakpointPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tablet {}px, mobile {}px", self.tablet, self.mobile)
    }
}

/// The literals the theme compiles into its styles
pub const ORIGINAL_BREAKPOINTS: BreakpointPair = BreakpointPair::new(1024, 767);

/// Thresholds used when nothing has been configured
pub const DEFAULT_BREAKPOINTS: BreakpointPair = ORIGINAL_BREAKPOINTS;

/// Runtime configuration shared by the server and browser halves.
///
/// The defaults match the theme's shipped breakpoints and the timings the
/// browser passes rely on:
/// - `load_delay` gives late-running scripts time to insert their styles
/// - `insert_delay` lets a freshly inserted style node receive its text
///
/// # Examples
///
/// ```
/// let cfg = breakpoint_override::OverrideConfig::default();
/// assert_eq!(cfg.original.tablet, 1024);
/// assert_eq!(cfg.script_style_id, "breakpoint-override-js");
/// ```
#[derive(Debug, Clone)]
pub struct OverrideConfig {
    /// Breakpoints the rewriter searches for
    pub original: BreakpointPair,
    /// Delay before the pass that follows the window load event
    pub load_delay: Duration,
    /// Delay before the pass that follows a style node insertion
    pub insert_delay: Duration,
    /// Element id of the injected browser-side override block
    pub script_style_id: String,
    /// Rendering the administration area (front-end injections are skipped)
    pub is_admin: bool,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            original: ORIGINAL_BREAKPOINTS,
            load_delay: Duration::from_millis(100),
            insert_delay: Duration::from_millis(10),
            script_style_id: "breakpoint-override-js".to_string(),
            is_admin: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OverrideConfig::default();
        assert_eq!(config.original, BreakpointPair::new(1024, 767));
        assert_eq!(config.load_delay, Duration::from_millis(100));
        assert_eq!(config.insert_delay, Duration::from_millis(10));
        assert!(!config.is_admin);
    }

    #[test]
    fn test_pair_ranges() {
        let pair = BreakpointPair::new(900, 600);
        assert!(pair.is_valid());
        assert_eq!(pair.desktop_min(), 901);
        assert_eq!(pair.tablet_min(), 601);
        assert!(!BreakpointPair::new(600, 600).is_valid());
        assert!(!BreakpointPair::new(0, 0).is_valid());
    }

    #[test]
    fn test_pair_saturates_at_max() {
        let pair = BreakpointPair::new(u32::MAX, u32::MAX - 1);
        assert_eq!(pair.desktop_min(), u32::MAX);
    }
}
