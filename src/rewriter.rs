//! Breakpoint literal substitution over CSS text.
//!
//! Four declaration shapes are recognised, case-insensitively and with any
//! horizontal whitespace around the colon:
//!
//! | declaration | searched value | replacement |
//! |---|---|---|
//! | `max-width` | `from.tablet` | `to.tablet` |
//! | `min-width` | `from.tablet + 1` | `to.tablet + 1` |
//! | `max-width` | `from.mobile` | `to.mobile` |
//! | `min-width` | `from.mobile + 1` | `to.mobile + 1` |
//!
//! All four are applied in a single scan, so a value produced by one
//! substitution is never fed to another in the same pass. Only the original
//! literals are searched, written without leading zeros.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::BreakpointPair;

static WIDTH_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // No leading zeros: the value must be written exactly as the literal
    Regex::new(r"(?i)\b(max|min)-width[ \t]*:[ \t]*([1-9][0-9]*)px").unwrap()
});

/// Outcome of one rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite<'a> {
    /// Rewritten text (borrowed when nothing changed)
    pub text: Cow<'a, str>,
    /// At least one declaration received a different value
    pub changed: bool,
    /// Number of declarations whose text was replaced
    pub replacements: usize,
}

impl Rewrite<'_> {
    pub fn into_owned(self) -> String {
        self.text.into_owned()
    }
}

/// Substitution table for one `from -> to` mapping, reusable across passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewriter {
    from: BreakpointPair,
    to: BreakpointPair,
}

impl Rewriter {
    pub fn new(from: BreakpointPair, to: BreakpointPair) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> BreakpointPair {
        self.from
    }

    pub fn to(&self) -> BreakpointPair {
        self.to
    }

    /// Replacement value for a `max-width`/`min-width` literal, if it is one we target
    fn target(&self, is_max: bool, value: u64) -> Option<u64> {
        let (from, to) = (self.from, self.to);
        if is_max {
            if value == u64::from(from.tablet) {
                return Some(u64::from(to.tablet));
            }
            if value == u64::from(from.mobile) {
                return Some(u64::from(to.mobile));
            }
        } else {
            if value == u64::from(from.tablet) + 1 {
                return Some(u64::from(to.tablet) + 1);
            }
            if value == u64::from(from.mobile) + 1 {
                return Some(u64::from(to.mobile) + 1);
            }
        }
        None
    }

    /// Rewrite every targeted declaration in `css`
    pub fn apply<'a>(&self, css: &'a str) -> Rewrite<'a> {
        let mut replacements = 0usize;
        let replaced = WIDTH_DECL_RE.replace_all(css, |caps: &Captures| {
            let whole = &caps[0];
            let is_max = caps[1].eq_ignore_ascii_case("max");
            let target = caps[2]
                .parse::<u64>()
                .ok()
                .and_then(|value| self.target(is_max, value));
            match target {
                Some(px) => {
                    let property = if is_max { "max-width" } else { "min-width" };
                    let out = format!("{}: {}px", property, px);
                    if out != whole {
                        replacements += 1;
                    }
                    out
                }
                None => whole.to_string(),
            }
        });

        if replacements == 0 {
            return Rewrite {
                text: Cow::Borrowed(css),
                changed: false,
                replacements: 0,
            };
        }
        Rewrite {
            text: Cow::Owned(replaced.into_owned()),
            changed: true,
            replacements,
        }
    }
}

/// Rewrite the `from` breakpoint literals in `original` to the `to` thresholds
pub fn rewrite(original: &str, from: BreakpointPair, to: BreakpointPair) -> Rewrite<'_> {
    Rewriter::new(from, to).apply(original)
}
