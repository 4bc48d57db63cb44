use std::collections::BTreeMap;

use tracing::{error, warn};

use crate::format::{html_escape, now_string};

/// In-memory stand-in for the control panel DOM.
///
/// Elements are addressed by the fixed identifiers the server-side layout
/// uses (`beacon`, `msglist`, `cnt_*`, `tbody_<port>`). The set of elements
/// is created once by the application shell; writes to unknown identifiers
/// are logged and dropped.
#[derive(Debug)]
pub struct Panel {
    elements: BTreeMap<String, Element>,
}

#[derive(Debug, Default, Clone)]
struct Element {
    html: String,
    error: bool,
}

impl Panel {
    /// Create the panel with one result table per port of interest.
    pub fn new(ports: &[u16]) -> Self {
        let mut elements = BTreeMap::new();
        for id in ["beacon", "msglist", "cnt_gen", "cnt_scan", "cnt_xfr"] {
            elements.insert(id.to_string(), Element::default());
        }
        for port in ports {
            elements.insert(format!("tbody_{port}"), Element::default());
        }
        Self { elements }
    }

    /// Replace an element's content. Idempotent for equal input.
    pub fn set_html(&mut self, id: &str, html: impl Into<String>) {
        match self.elements.get_mut(id) {
            Some(el) => el.html = html.into(),
            None => warn!(id, "panel element not found"),
        }
    }

    /// Append to an element's content. Rows are never removed or reordered.
    pub fn append_html(&mut self, id: &str, html: &str) {
        match self.elements.get_mut(id) {
            Some(el) => el.html.push_str(html),
            None => warn!(id, "panel element not found"),
        }
    }

    /// Set or clear the error styling flag on an element.
    pub fn set_error(&mut self, id: &str, error: bool) {
        match self.elements.get_mut(id) {
            Some(el) => el.error = error,
            None => warn!(id, "panel element not found"),
        }
    }

    pub fn html_of(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|el| el.html.as_str())
    }

    pub fn has_error(&self, id: &str) -> bool {
        self.elements.get(id).map(|el| el.error).unwrap_or(false)
    }

    /// Append one row (local timestamp + escaped message) to the message log.
    /// The log grows without bound; there is no eviction.
    pub fn append_msg(&mut self, msg: &str) {
        let row = format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            now_string(),
            html_escape(msg)
        );
        self.append_html("msglist", &row);
    }

    /// Plain-text dump of the whole panel for the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (id, el) in &self.elements {
            let marker = if el.error { " [error]" } else { "" };
            out.push_str(&format!("#{id}{marker}\n"));
            if el.html.is_empty() {
                out.push_str("  (empty)\n");
            } else {
                for row in el.html.split_inclusive("</tr>") {
                    out.push_str("  ");
                    out.push_str(row.trim());
                    out.push('\n');
                }
            }
        }
        out
    }
}

/// Failure/notice surface for the operator.
///
/// The terminal implementation stands in for the original blocking alert
/// box; tests swap in a recording implementation, so poller and control
/// logic never depend on the notification mechanism.
pub trait Notifier: Send + Sync {
    /// Show a message to the operator immediately.
    fn alert(&self, msg: &str);

    /// Log a failure and alert with a composed diagnostic.
    fn report_failure(&self, context: &str, detail: &str) {
        error!(context, detail, "request failed");
        self.alert(&format!("{context}: {detail}"));
    }
}

/// Notifier that writes to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermNotifier;

impl Notifier for TermNotifier {
    fn alert(&self, msg: &str) {
        eprintln!("*** {msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_html_overwrites_in_place() {
        let mut panel = Panel::new(&[]);
        panel.set_html("cnt_gen", "3");
        panel.set_html("cnt_gen", "7");
        assert_eq!(panel.html_of("cnt_gen"), Some("7"));
    }

    #[test]
    fn append_is_ordered_and_never_replaces() {
        let mut panel = Panel::new(&[80]);
        panel.append_html("tbody_80", "<tr><td>a</td></tr>");
        panel.append_html("tbody_80", "<tr><td>b</td></tr>");
        assert_eq!(
            panel.html_of("tbody_80"),
            Some("<tr><td>a</td></tr><tr><td>b</td></tr>")
        );
    }

    #[test]
    fn unknown_element_is_dropped_without_panic() {
        let mut panel = Panel::new(&[]);
        panel.set_html("tbody_9999", "<tr></tr>");
        panel.append_html("tbody_9999", "<tr></tr>");
        panel.set_error("tbody_9999", true);
        assert_eq!(panel.html_of("tbody_9999"), None);
        assert!(!panel.has_error("tbody_9999"));
    }

    #[test]
    fn error_flag_toggles() {
        let mut panel = Panel::new(&[]);
        assert!(!panel.has_error("beacon"));
        panel.set_error("beacon", true);
        assert!(panel.has_error("beacon"));
        panel.set_error("beacon", false);
        assert!(!panel.has_error("beacon"));
    }

    #[test]
    fn append_msg_escapes_markup() {
        let mut panel = Panel::new(&[]);
        panel.append_msg("<script>alert('x')</script>");
        let log = panel.html_of("msglist").unwrap();
        assert!(log.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(!log.contains("<script>"));
    }

    #[test]
    fn append_msg_grows_without_bound() {
        let mut panel = Panel::new(&[]);
        panel.append_msg("first");
        panel.append_msg("second");
        let log = panel.html_of("msglist").unwrap();
        let first = log.find("first").unwrap();
        let second = log.find("second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn render_marks_error_elements() {
        let mut panel = Panel::new(&[22]);
        panel.set_html("beacon", "Server is not responding");
        panel.set_error("beacon", true);
        let dump = panel.render();
        assert!(dump.contains("#beacon [error]"));
        assert!(dump.contains("Server is not responding"));
        assert!(dump.contains("#tbody_22"));
    }
}
