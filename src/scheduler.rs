//! When the browser-side pass runs, and what one pass does.
//!
//! Styles reach a page at uncoordinated times: compiled into the initial
//! markup, rendered inline at runtime, or inserted later by lazily loaded
//! content. A pass is therefore run
//!
//! - once the document content is parseable,
//! - after the window load event, following a short delay,
//! - after every style node inserted under the head, following a shorter delay.
//!
//! A pass rewrites every style element and makes sure exactly one override
//! block (identified by a fixed id) is present. Override blocks, whether
//! emitted by the server or by a previous pass, are never rewritten. Each
//! node remembers the text a pass left in it, and only new or changed text is
//! rewritten again, so a pass whose own writes cause further notifications
//! settles after one extra no-op pass even when a target value equals one of
//! the original literals.

use std::time::Duration;

use log::{debug, info};

use crate::document::{StyleDocument, StyleNode};
use crate::generator;
use crate::rewriter::Rewriter;
use crate::server::InjectionPoint;
use crate::{BreakpointPair, OverrideConfig};

/// Notifications delivered by the document's event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Document content is fully parsed
    ContentLoaded,
    /// All page resources finished loading
    Load,
    /// A node was inserted under the head
    NodeInserted { node_name: String },
}

impl DocumentEvent {
    pub fn style_inserted() -> Self {
        DocumentEvent::NodeInserted { node_name: "STYLE".to_string() }
    }
}

/// Document readiness when the scheduler is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// What a pass did to the override block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Injection {
    Created,
    Updated,
    #[default]
    Unchanged,
}

/// Outcome of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Style elements whose text changed
    pub modified: usize,
    /// Declarations replaced across all elements
    pub replacements: usize,
    pub injection: Injection,
}

/// Trigger policy and pass logic for one breakpoint pair
#[derive(Debug, Clone)]
pub struct Scheduler {
    rewriter: Rewriter,
    script_css: String,
    config: OverrideConfig,
}

impl Scheduler {
    pub fn new(pair: BreakpointPair, config: OverrideConfig) -> Self {
        Self {
            rewriter: Rewriter::new(config.original, pair),
            script_css: generator::script_css(pair),
            config,
        }
    }

    pub fn rewriter(&self) -> &Rewriter {
        &self.rewriter
    }

    /// Whether a pass should run immediately when attaching
    pub fn run_on_attach(&self, ready: ReadyState) -> bool {
        ready != ReadyState::Loading
    }

    /// Delay before the pass requested by `event`, or `None` if it is not a trigger
    pub fn delay_for(&self, event: &DocumentEvent) -> Option<Duration> {
        match event {
            DocumentEvent::ContentLoaded => Some(Duration::ZERO),
            DocumentEvent::Load => Some(self.config.load_delay),
            DocumentEvent::NodeInserted { node_name } if node_name.eq_ignore_ascii_case("style") => {
                Some(self.config.insert_delay)
            }
            DocumentEvent::NodeInserted { .. } => None,
        }
    }

    /// Whether `id` names one of the override blocks, ours or the server's
    pub fn is_override_block(&self, id: &str) -> bool {
        id == self.config.script_style_id || InjectionPoint::ALL.iter().any(|p| p.element_id() == id)
    }

    /// Rewrite every style element and ensure the override block is present
    pub fn run_pass<D: StyleDocument + ?Sized>(&self, doc: &mut D) -> PassReport {
        let own_id = self.config.script_style_id.as_str();
        let mut report = PassReport::default();

        for node in doc.styles_mut() {
            if node.id.as_deref().is_some_and(|id| self.is_override_block(id)) {
                continue;
            }
            if node.rewritten.as_deref() == Some(node.text.as_str()) {
                continue;
            }
            let out = self.rewriter.apply(&node.text);
            if out.changed {
                report.replacements += out.replacements;
                let text = out.into_owned();
                node.text = text;
                report.modified += 1;
            }
            node.rewritten = Some(node.text.clone());
        }

        report.injection = match doc.find_style(own_id) {
            None => {
                doc.append_style(StyleNode::with_id(own_id, self.script_css.clone()));
                Injection::Created
            }
            Some(idx) => {
                let node = &mut doc.styles_mut()[idx];
                if node.text == self.script_css {
                    Injection::Unchanged
                } else {
                    node.text = self.script_css.clone();
                    Injection::Updated
                }
            }
        };

        let from = self.rewriter.from();
        let to = self.rewriter.to();
        if report.modified > 0 {
            info!("modified {} style elements ({} declarations)", report.modified, report.replacements);
            info!("tablet: {}px -> {}px, mobile: {}px -> {}px", from.tablet, to.tablet, from.mobile, to.mobile);
        } else {
            debug!("pass made no changes, override block {:?}", report.injection);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StyleSheetDocument;

    fn scheduler() -> Scheduler {
        Scheduler::new(BreakpointPair::new(900, 600), OverrideConfig::default())
    }

    #[test]
    fn delays_per_trigger() {
        let s = scheduler();
        assert_eq!(s.delay_for(&DocumentEvent::ContentLoaded), Some(Duration::ZERO));
        assert_eq!(s.delay_for(&DocumentEvent::Load), Some(Duration::from_millis(100)));
        assert_eq!(s.delay_for(&DocumentEvent::style_inserted()), Some(Duration::from_millis(10)));
        assert_eq!(
            s.delay_for(&DocumentEvent::NodeInserted { node_name: "style".into() }),
            Some(Duration::from_millis(10))
        );
        assert_eq!(s.delay_for(&DocumentEvent::NodeInserted { node_name: "SCRIPT".into() }), None);
    }

    #[test]
    fn attach_runs_unless_loading() {
        let s = scheduler();
        assert!(!s.run_on_attach(ReadyState::Loading));
        assert!(s.run_on_attach(ReadyState::Interactive));
        assert!(s.run_on_attach(ReadyState::Complete));
    }

    #[test]
    fn pass_rewrites_and_injects_once() {
        let s = scheduler();
        let mut doc = StyleSheetDocument::from_styles(["@media (max-width: 1024px){}", ".x{}"]);

        let first = s.run_pass(&mut doc);
        assert_eq!(first.modified, 1);
        assert_eq!(first.injection, Injection::Created);
        assert_eq!(doc.styles()[0].text, "@media (max-width: 900px){}");

        let second = s.run_pass(&mut doc);
        assert_eq!(second, PassReport::default());
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn repeated_passes_do_not_shift_twice() {
        // The tablet target is the original mobile literal
        let s = Scheduler::new(BreakpointPair::new(767, 500), OverrideConfig::default());
        let mut doc = StyleSheetDocument::from_styles(["@media (max-width: 1024px){.a{}}"]);

        assert_eq!(s.run_pass(&mut doc).modified, 1);
        assert_eq!(doc.styles()[0].text, "@media (max-width: 767px){.a{}}");

        let again = s.run_pass(&mut doc);
        assert_eq!(again.modified, 0);
        assert_eq!(doc.styles()[0].text, "@media (max-width: 767px){.a{}}");
    }

    #[test]
    fn replaced_source_text_is_rewritten_again() {
        let s = scheduler();
        let mut doc = StyleSheetDocument::from_styles(["@media (max-width: 1024px){}"]);
        s.run_pass(&mut doc);

        doc.styles_mut()[0].text = "@media (min-width: 768px){}".to_string();
        assert_eq!(s.run_pass(&mut doc).modified, 1);
        assert_eq!(doc.styles()[0].text, "@media (min-width: 601px){}");
    }

    #[test]
    fn server_override_blocks_are_left_alone() {
        let pair = BreakpointPair::new(767, 500);
        let s = Scheduler::new(pair, OverrideConfig::default());
        let mut doc = StyleSheetDocument::new();
        for point in InjectionPoint::ALL {
            doc.append_style(StyleNode::with_id(point.element_id(), point.css(pair)));
        }
        let before = doc.clone();

        let report = s.run_pass(&mut doc);
        assert_eq!(report.modified, 0);
        for (node, original) in doc.styles().iter().zip(before.styles()) {
            assert_eq!(node.text, original.text);
        }
        assert!(doc.styles()[1].text.contains("@media (max-width: 767px) and (min-width: 501px)"));
        assert!(s.is_override_block("breakpoint-override-footer"));
        assert!(!s.is_override_block("kadence-global-inline-css"));
    }

    #[test]
    fn stale_override_block_is_refreshed() {
        let mut doc = StyleSheetDocument::new();
        scheduler().run_pass(&mut doc);
        let other = Scheduler::new(BreakpointPair::new(1100, 700), OverrideConfig::default());
        let report = other.run_pass(&mut doc);
        assert_eq!(report.injection, Injection::Updated);
        assert_eq!(doc.len(), 1);
        assert!(doc.styles()[0].text.contains("(max-width: 700px)"));
    }
}
