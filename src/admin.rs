//! Settings page: two numeric inputs that round-trip through the threshold store.

use log::info;

use crate::generator;
use crate::server::{FILTERS, MOBILE_BREAKPOINT_FILTER, TABLET_BREAKPOINT_FILTER};
use crate::store::{BreakpointInput, ThresholdStore, OPTION_NAME};
use crate::{BreakpointPair, Error, Result};

/// Page slug under the host's settings menu
pub const SETTINGS_PAGE_SLUG: &str = "breakpoint-override";

pub const PAGE_TITLE: &str = "Breakpoint Override";

/// Confirmation shown after a successful save
pub const SAVED_NOTICE: &str = "Breakpoints saved successfully. Please clear your cache!";

/// Accepted input range of both fields
pub const INPUT_MIN: u32 = 1;
pub const INPUT_MAX: u32 = 9999;

const SECTION_DESCRIPTION: [&str; 4] = [
    "Set custom breakpoint values for the theme. These values override the default breakpoints on the frontend.",
    "<strong>How it works:</strong> the theme's filter hooks change breakpoints at the source, with CSS overrides as fallback.",
    "<strong>Note:</strong> the block editor preview may still use the original breakpoints. Clear any caches after saving.",
    "Theme defaults: Tablet = 1024px, Mobile = 767px",
];

const TROUBLESHOOTING: [&str; 4] = [
    "Clear all caches (browser, plugin caches, server caches)",
    "If using a CDN, purge the CDN cache",
    "Check if another plugin or theme is also modifying breakpoints",
    "Inspect the page source to verify the CSS is being injected",
];

/// Capabilities of the user requesting the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub manage_options: bool,
}

impl Capabilities {
    pub fn administrator() -> Self {
        Self { manage_options: true }
    }

    fn require_manage_options(self) -> Result<()> {
        if self.manage_options {
            Ok(())
        } else {
            Err(Error::PermissionDenied("manage_options capability required".into()))
        }
    }
}

/// Form field name for a record key, e.g. `breakpoint_override[tablet]`
pub fn field_name(key: &str) -> String {
    format!("{}[{}]", OPTION_NAME, key)
}

/// Extract the breakpoint fields from decoded form pairs; unknown fields are ignored
pub fn parse_form<K, V>(fields: &[(K, V)]) -> BreakpointInput
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let tablet_field = field_name("tablet");
    let mobile_field = field_name("mobile");
    let mut input = BreakpointInput::default();
    for (k, v) in fields {
        if k.as_ref() == tablet_field {
            input.tablet = Some(v.as_ref().to_string());
        } else if k.as_ref() == mobile_field {
            input.mobile = Some(v.as_ref().to_string());
        }
    }
    input
}

/// Store a submitted form; returns the pair actually persisted
pub fn handle_submission<K, V>(
    store: &ThresholdStore,
    caps: Capabilities,
    fields: &[(K, V)],
) -> Result<BreakpointPair>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    caps.require_manage_options()?;
    let pair = store.set(&parse_form(fields))?;
    info!("settings saved from admin page: {}", pair);
    Ok(pair)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn number_field(key: &str, label: &str, value: u32, description: &str) -> String {
    format!(
        concat!(
            "<tr><th scope=\"row\"><label for=\"{id}\">{label}</label></th><td>",
            "<input type=\"number\" id=\"{id}\" name=\"{name}\" value=\"{value}\" min=\"{min}\" max=\"{max}\" class=\"small-text\" /> px",
            "<p class=\"description\">{description}</p></td></tr>\n"
        ),
        id = escape_html(&format!("bo-{}", key)),
        label = escape_html(label),
        name = escape_html(&field_name(key)),
        value = value,
        min = INPUT_MIN,
        max = INPUT_MAX,
        description = escape_html(description),
    )
}

/// Render the settings page for the current pair.
///
/// `settings_updated` is set when the page is shown right after a save.
pub fn render_settings_page(
    store: &ThresholdStore,
    caps: Capabilities,
    settings_updated: bool,
) -> Result<String> {
    caps.require_manage_options()?;
    let pair = store.get();

    let mut html = String::from("<div class=\"wrap\">\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(PAGE_TITLE)));
    if settings_updated {
        html.push_str(&format!(
            "<div class=\"notice notice-success is-dismissible\"><p>{}</p></div>\n",
            escape_html(SAVED_NOTICE)
        ));
    }

    html.push_str("<form action=\"options.php\" method=\"post\">\n");
    for line in SECTION_DESCRIPTION {
        html.push_str(&format!("<p>{}</p>\n", line));
    }
    html.push_str("<table class=\"form-table\">\n");
    html.push_str(&number_field(
        "tablet",
        "Tablet Breakpoint (px)",
        pair.tablet,
        "Widths at or below this value use the tablet layout. Theme default: 1024",
    ));
    html.push_str(&number_field(
        "mobile",
        "Mobile Breakpoint (px)",
        pair.mobile,
        "Widths at or below this value use the mobile layout. Theme default: 767",
    ));
    html.push_str("</table>\n<p class=\"submit\"><input type=\"submit\" class=\"button button-primary\" value=\"Save Breakpoints\" /></p>\n</form>\n");

    html.push_str("<hr />\n<h2>Active Filters</h2>\n<ul>\n");
    for name in FILTERS {
        let value = match name {
            TABLET_BREAKPOINT_FILTER => Some(pair.tablet),
            MOBILE_BREAKPOINT_FILTER => Some(pair.mobile),
            _ => None,
        };
        match value {
            Some(px) => html.push_str(&format!("<li><code>{}</code> &rarr; {}px</li>\n", escape_html(name), px)),
            None => html.push_str(&format!("<li><code>{}</code></li>\n", escape_html(name))),
        }
    }
    html.push_str("</ul>\n<h2>Current Ranges</h2>\n<ul>\n");
    html.push_str(&format!("<li>Desktop: {}px and wider</li>\n", pair.desktop_min()));
    html.push_str(&format!("<li>Tablet: {}px to {}px</li>\n", pair.tablet_min(), pair.tablet));
    html.push_str(&format!("<li>Mobile: {}px and narrower</li>\n", pair.mobile));
    html.push_str("</ul>\n");

    html.push_str("<hr />\n<h2>CSS Output Preview</h2>\n<p>This fallback CSS is also injected into the frontend:</p>\n");
    html.push_str(&format!("<pre class=\"breakpoint-override-preview\">{}</pre>\n", escape_html(&generator::early_css(pair))));

    html.push_str("<hr />\n<h2>Troubleshooting</h2>\n<ol>\n");
    for step in TROUBLESHOOTING {
        html.push_str(&format!("<li>{}</li>\n", escape_html(step)));
    }
    html.push_str("</ol>\n</div>\n");
    Ok(html)
}

/// Link to the settings page for the host's plugin list
pub fn settings_link(admin_url: &str) -> String {
    format!(
        "<a href=\"{}\">Settings</a>",
        escape_html(&format!(
            "{}/options-general.php?page={}",
            admin_url.trim_end_matches('/'),
            SETTINGS_PAGE_SLUG
        ))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_shows_current_values_and_range_limits() {
        let store = ThresholdStore::in_memory();
        store.set(&BreakpointInput::new(900, 600)).unwrap();
        let html = render_settings_page(&store, Capabilities::administrator(), false).unwrap();
        assert!(html.contains("name=\"breakpoint_override[tablet]\" value=\"900\" min=\"1\" max=\"9999\""));
        assert!(html.contains("name=\"breakpoint_override[mobile]\" value=\"600\""));
        assert!(html.contains("Tablet: 601px to 900px"));
        assert!(!html.contains(SAVED_NOTICE));
    }

    #[test]
    fn page_shows_filter_values_and_css_preview() {
        let store = ThresholdStore::in_memory();
        store.set(&BreakpointInput::new(900, 600)).unwrap();
        let html = render_settings_page(&store, Capabilities::administrator(), false).unwrap();

        assert!(html.contains("<code>kadence_blocks_tablet_breakpoint</code> &rarr; 900px"));
        assert!(html.contains("<code>kadence_blocks_mobile_breakpoint</code> &rarr; 600px"));
        assert!(html.contains("<li><code>kadence_screen_sizes</code></li>"));

        let preview = generator::early_css(BreakpointPair::new(900, 600));
        assert!(html.contains(&format!("<pre class=\"breakpoint-override-preview\">{}</pre>", escape_html(&preview))));
        assert!(html.contains("--global-kb-tablet-width: 900px !important;"));
        assert!(html.contains("If using a CDN, purge the CDN cache"));
        assert!(html.contains("Theme defaults: Tablet = 1024px, Mobile = 767px"));
    }

    #[test]
    fn notice_after_save() {
        let store = ThresholdStore::in_memory();
        let html = render_settings_page(&store, Capabilities::administrator(), true).unwrap();
        assert!(html.contains(SAVED_NOTICE));
    }

    #[test]
    fn submission_is_sanitized() {
        let store = ThresholdStore::in_memory();
        let fields = [
            ("breakpoint_override[tablet]", "500"),
            ("breakpoint_override[mobile]", "900"),
            ("_wpnonce", "abc"),
        ];
        let pair = handle_submission(&store, Capabilities::administrator(), &fields).unwrap();
        assert_eq!(pair, BreakpointPair::new(500, 499));
        assert_eq!(store.get(), pair);
    }

    #[test]
    fn requires_manage_options() {
        let store = ThresholdStore::in_memory();
        let fields: [(&str, &str); 0] = [];
        assert!(matches!(
            handle_submission(&store, Capabilities::default(), &fields),
            Err(Error::PermissionDenied(_))
        ));
        assert!(render_settings_page(&store, Capabilities::default(), false).is_err());
    }

    #[test]
    fn settings_link_points_at_page() {
        assert_eq!(
            settings_link("https://example.com/wp-admin/"),
            "<a href=\"https://example.com/wp-admin/options-general.php?page=breakpoint-override\">Settings</a>"
        );
    }
}
