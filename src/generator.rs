//! CSS generation for a breakpoint pair.
//!
//! Every function here is a pure, total mapping from a valid
//! [`BreakpointPair`] to CSS text. The blocks are emitted at different points
//! of the page lifecycle (see [`crate::server`]) and by the browser pass (see
//! [`crate::scheduler`]), so each is available on its own as well as through
//! the combined [`generate`].

use crate::{BreakpointPair, VERSION};

/// Class prefixes of the two marker vocabularies (blocks plugin and theme).
/// Every visibility rule matches both.
const MARKER_PREFIXES: [&str; 2] = ["kb", "kt"];

/// Which rules a visibility block carries for each range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only `hide-*` markers
    HideOnly,
    /// `hide-*` markers plus `show-*` markers forced to display
    HideAndShow,
}

/// Responsive range targeted by a visibility rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Desktop,
    Tablet,
    Mobile,
}

impl Range {
    pub fn name(self) -> &'static str {
        match self {
            Range::Desktop => "desktop",
            Range::Tablet => "tablet",
            Range::Mobile => "mobile",
        }
    }

    /// Media condition selecting this range for `pair`
    pub fn media_condition(self, pair: BreakpointPair) -> String {
        match self {
            Range::Desktop => format!("(min-width: {}px)", pair.desktop_min()),
            Range::Tablet => format!(
                "(max-width: {}px) and (min-width: {}px)",
                pair.tablet,
                pair.tablet_min()
            ),
            Range::Mobile => format!("(max-width: {}px)", pair.mobile),
        }
    }
}

/// Selector list matching `action` markers (`hide`/`show`) for `range` in both vocabularies
pub fn marker_selector(action: &str, range: Range) -> String {
    MARKER_PREFIXES
        .iter()
        .map(|prefix| format!(".{}-{}-{}", prefix, action, range.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Version and threshold comment opening the combined and early blocks
pub fn header(pair: BreakpointPair) -> String {
    format!(
        "/* Breakpoint Override v{} */\n/* Tablet: {}px | Mobile: {}px */\n\n",
        VERSION, pair.tablet, pair.mobile
    )
}

/// `:root` block shadowing the theme's breakpoint custom properties
pub fn custom_properties(pair: BreakpointPair) -> String {
    let t = pair.tablet;
    let m = pair.mobile;
    let props = [
        ("--global-kb-editor-full-width", t),
        ("--global-kb-editor-tablet-width", t),
        ("--global-kb-tablet-width", t),
        ("--global-kb-mobile-width", m),
        ("--kb-tablet-break", t),
        ("--kb-mobile-break", m),
    ];
    root_block(&props)
}

fn root_block(props: &[(&str, u32)]) -> String {
    let mut css = String::from(":root {\n");
    for (name, px) in props {
        css.push_str(&format!("  {}: {}px !important;\n", name, px));
    }
    css.push_str("}\n");
    css
}

/// The three mutually exclusive visibility media rules
pub fn visibility_rules(pair: BreakpointPair, visibility: Visibility) -> String {
    let mut css = String::new();
    for range in [Range::Desktop, Range::Tablet, Range::Mobile] {
        css.push_str(&format!("@media {} {{\n", range.media_condition(pair)));
        css.push_str(&format!(
            "  {} {{ display: none !important; }}\n",
            marker_selector("hide", range)
        ));
        // Desktop has no show markers
        if visibility == Visibility::HideAndShow && range != Range::Desktop {
            css.push_str(&format!(
                "  {} {{ display: block !important; }}\n",
                marker_selector("show", range)
            ));
        }
        css.push_str("}\n");
    }
    css
}

/// Complete override: header, custom properties and the late visibility rules
pub fn generate(pair: BreakpointPair) -> String {
    let mut css = header(pair);
    css.push_str(&custom_properties(pair));
    css.push('\n');
    css.push_str(&visibility_rules(pair, Visibility::HideAndShow));
    css
}

/// Head-early block: custom properties only
pub fn early_css(pair: BreakpointPair) -> String {
    let mut css = header(pair);
    css.push_str(&custom_properties(pair));
    css
}

/// Head-late block: visibility rules re-declared at the configured widths
pub fn late_css(pair: BreakpointPair) -> String {
    let mut css = String::from("/* Breakpoint Override - Late CSS */\n");
    css.push_str(&visibility_rules(pair, Visibility::HideAndShow));
    css
}

/// Footer block: width properties again, for styles emitted after the head
pub fn footer_css(pair: BreakpointPair) -> String {
    let mut css = String::from("/* Breakpoint Override - Footer CSS */\n");
    css.push_str(&root_block(&[
        ("--global-kb-tablet-width", pair.tablet),
        ("--global-kb-mobile-width", pair.mobile),
    ]));
    css
}

/// Block the browser pass injects for styles it cannot rewrite in place
pub fn script_css(pair: BreakpointPair) -> String {
    let mut css = String::from("/* Breakpoint Override - Injected Styles */\n");
    css.push_str(&visibility_rules(pair, Visibility::HideOnly));
    css
}

/// Wrap `css` in a `<style>` element with the given id
pub fn style_element(id: &str, css: &str) -> String {
    format!("\n<style id=\"{}\">\n{}</style>\n", id, css)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_selector_covers_both_vocabularies() {
        assert_eq!(
            marker_selector("hide", Range::Mobile),
            ".kb-hide-mobile, .kt-hide-mobile"
        );
    }

    #[test]
    fn ranges_do_not_overlap() {
        let pair = BreakpointPair::new(900, 600);
        assert_eq!(Range::Desktop.media_condition(pair), "(min-width: 901px)");
        assert_eq!(
            Range::Tablet.media_condition(pair),
            "(max-width: 900px) and (min-width: 601px)"
        );
        assert_eq!(Range::Mobile.media_condition(pair), "(max-width: 600px)");
    }

    #[test]
    fn custom_properties_are_important() {
        let css = custom_properties(BreakpointPair::new(900, 600));
        assert!(css.starts_with(":root {"));
        assert_eq!(css.matches("!important").count(), 6);
        assert!(css.contains("--kb-mobile-break: 600px !important;"));
        assert!(css.contains("--global-kb-editor-full-width: 900px !important;"));
    }

    #[test]
    fn script_css_omits_show_markers() {
        let css = script_css(BreakpointPair::new(900, 600));
        assert!(css.contains(".kb-hide-tablet, .kt-hide-tablet"));
        assert!(!css.contains("show"));
    }

    #[test]
    fn late_css_forces_show_markers() {
        let css = late_css(BreakpointPair::new(900, 600));
        assert!(css.contains(".kb-show-tablet, .kt-show-tablet { display: block !important; }"));
        assert!(css.contains(".kb-show-mobile, .kt-show-mobile { display: block !important; }"));
        assert!(!css.contains("show-desktop"));
    }

    #[test]
    fn generate_repeats_each_threshold() {
        let css = generate(BreakpointPair::new(900, 600));
        assert!(css.matches("900px").count() >= 2);
        assert!(css.matches("600px").count() >= 2);
        assert!(!css.contains("1024"));
        assert!(!css.contains("767"));
    }

    #[test]
    fn style_element_wraps_css() {
        assert_eq!(
            style_element("x", "a{}\n"),
            "\n<style id=\"x\">\na{}\n</style>\n"
        );
    }
}
