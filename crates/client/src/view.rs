//! Presentation view models. Pure functions of snapshots and input; no I/O.

use bhvr_core::{ApiResponse, BeaverId, BeaverName};
use bhvr_events::CollectionSnapshot;

/// Which page is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Intro,
    Manager,
}

impl Screen {
    pub fn toggle(self) -> Self {
        match self {
            Screen::Intro => Screen::Manager,
            Screen::Manager => Screen::Intro,
        }
    }
}

/// The "Enter a beaver name" input.
#[derive(Debug, Default, Clone)]
pub struct BeaverForm {
    input: String,
}

impl BeaverForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// On submit: a name when the input is not blank (the input is then
    /// cleared), otherwise `None` and the input is left as is.
    pub fn submit(&mut self) -> Option<BeaverName> {
        let name = BeaverName::parse(self.input.as_str()).ok()?;
        self.input.clear();
        Some(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaverRow {
    pub id: BeaverId,
    pub name: String,
    pub color: String,
}

/// Beaver manager page derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerView {
    /// Nothing is rendered while loading.
    Loading,
    Error(String),
    List(Vec<BeaverRow>),
}

impl ManagerView {
    pub fn from_snapshot(snapshot: &CollectionSnapshot) -> Self {
        match snapshot {
            CollectionSnapshot::Loading => ManagerView::Loading,
            CollectionSnapshot::Error(msg) => ManagerView::Error(msg.clone()),
            CollectionSnapshot::Ready(records) => ManagerView::List(
                records
                    .iter()
                    .map(|b| BeaverRow {
                        id: b.id(),
                        name: b.name().to_string(),
                        color: b.color().to_string(),
                    })
                    .collect(),
            ),
        }
    }

    pub fn rows(&self) -> &[BeaverRow] {
        match self {
            ManagerView::List(rows) => rows,
            _ => &[],
        }
    }

    /// Count shown in the action bar.
    pub fn total(&self) -> usize {
        self.rows().len()
    }

    /// Everything "Delete All Beavers" should remove.
    pub fn ids(&self) -> Vec<BeaverId> {
        self.rows().iter().map(|r| r.id).collect()
    }

    /// Plain-text rendering, one line per row plus the action bar.
    pub fn render_text(&self) -> Vec<String> {
        match self {
            ManagerView::Loading => Vec::new(),
            ManagerView::Error(msg) => vec![format!("Error: {msg}")],
            ManagerView::List(rows) => {
                let mut lines: Vec<String> = rows
                    .iter()
                    .map(|r| format!("({}) {}", r.color, r.name))
                    .collect();
                lines.push(format!("Total beavers: {}", rows.len()));
                lines
            }
        }
    }
}

/// Text shown under the "Call API" button.
pub fn render_api_response(resp: &ApiResponse) -> String {
    format!("Message: {}\nSuccess: {}", resp.message, resp.success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhvr_core::{Beaver, BeaverName, FixedColorPicker};
    use chrono::Utc;

    fn beaver(name: &str) -> Beaver {
        Beaver::create(BeaverName::parse(name).unwrap(), &FixedColorPicker(7), Utc::now())
    }

    #[test]
    fn form_rejects_blank_input_and_keeps_it() {
        let mut form = BeaverForm::new();
        form.set_input("   ");
        assert!(form.submit().is_none());
        assert_eq!(form.input(), "   ");
    }

    #[test]
    fn form_accepts_name_and_clears() {
        let mut form = BeaverForm::new();
        form.set_input("Rocky");
        assert_eq!(form.submit().unwrap().as_str(), "Rocky");
        assert_eq!(form.input(), "");
    }

    #[test]
    fn list_view_counts_and_renders_rows() {
        let snap = CollectionSnapshot::ready(vec![beaver("Bob"), beaver("Alice")]);
        let view = ManagerView::from_snapshot(&snap);

        assert_eq!(view.total(), 2);
        assert_eq!(view.ids(), snap.ids());
        let lines = view.render_text();
        assert_eq!(lines.last().unwrap(), "Total beavers: 2");
        assert!(lines[0].starts_with("(#BC8F8F) "));
    }

    #[test]
    fn error_view_renders_message() {
        let view = ManagerView::from_snapshot(&CollectionSnapshot::Error("offline".into()));
        assert_eq!(view.render_text(), vec!["Error: offline".to_string()]);
        assert_eq!(view.total(), 0);
    }

    #[test]
    fn loading_renders_nothing() {
        let view = ManagerView::from_snapshot(&CollectionSnapshot::Loading);
        assert!(view.render_text().is_empty());
    }

    #[test]
    fn screen_toggles() {
        assert_eq!(Screen::default().toggle(), Screen::Manager);
        assert_eq!(Screen::Manager.toggle(), Screen::Intro);
    }

    #[test]
    fn api_response_text() {
        let text = render_api_response(&ApiResponse::ok("Hello BHVR!"));
        assert_eq!(text, "Message: Hello BHVR!\nSuccess: true");
    }
}
