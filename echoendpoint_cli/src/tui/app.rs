//! TUI application state and key handling

use crate::inbox::{Command, DetailView, NoticeKind, ViewSink};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use echoendpoint_common::{RequestId, RequestSummary};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Notices kept on screen at once
pub const MAX_NOTICES: usize = 4;

/// How long a notice stays visible
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Lines scrolled by PgUp/PgDn in the detail pane
const DETAIL_PAGE: u16 = 10;

/// What the detail pane shows
#[derive(Debug, Clone, PartialEq)]
pub enum DetailPane {
    Empty,
    Loading,
    Ready(DetailView),
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
    pub shown_at: Instant,
}

/// Result of a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Command(Command),
    Quit,
}

/// TUI application state.
///
/// Mirrors what the inbox renders into it plus purely visual state (cursor
/// row, scroll, raw toggle, pending confirmation).
pub struct TuiApp {
    pub webhook_url: String,
    pub version: String,
    pub rows: VecDeque<RequestSummary>,
    pub count: usize,
    pub active: Option<RequestId>,
    pub detail: DetailPane,
    pub notices: VecDeque<Notice>,
    pub highlighted: usize,
    pub detail_scroll: u16,
    pub show_raw_body: bool,
    pub confirm_clear: bool,
}

impl TuiApp {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            version: env!("CARGO_PKG_VERSION").to_string(),
            rows: VecDeque::new(),
            count: 0,
            active: None,
            detail: DetailPane::Empty,
            notices: VecDeque::with_capacity(MAX_NOTICES),
            highlighted: 0,
            detail_scroll: 0,
            show_raw_body: false,
            confirm_clear: false,
        }
    }

    /// Handle key events
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
            return KeyAction::Quit;
        }

        if self.confirm_clear {
            self.confirm_clear = false;
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Command(Command::ClearAll),
                _ => KeyAction::None,
            };
        }

        match key.code {
            KeyCode::Char('q') => return KeyAction::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.highlighted = self.highlighted.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.highlighted < self.rows.len().saturating_sub(1) {
                    self.highlighted += 1;
                }
            }
            KeyCode::Home => self.highlighted = 0,
            KeyCode::End => self.highlighted = self.rows.len().saturating_sub(1),
            KeyCode::Enter => {
                if let Some(row) = self.rows.get(self.highlighted) {
                    return KeyAction::Command(Command::Select(row.id.clone()));
                }
            }
            KeyCode::Esc => return KeyAction::Command(Command::Deselect),
            KeyCode::Char('m') => return KeyAction::Command(Command::LoadMore),
            KeyCode::Char('r') => self.show_raw_body = !self.show_raw_body,
            KeyCode::Char('x') => self.confirm_clear = true,
            KeyCode::PageUp => {
                self.detail_scroll = self.detail_scroll.saturating_sub(DETAIL_PAGE);
            }
            KeyCode::PageDown => {
                self.detail_scroll = self.detail_scroll.saturating_add(DETAIL_PAGE);
            }
            _ => {}
        }
        KeyAction::None
    }

    /// Drop notices older than [`NOTICE_TTL`]
    pub fn expire_notices(&mut self, now: Instant) {
        self.notices
            .retain(|n| now.saturating_duration_since(n.shown_at) < NOTICE_TTL);
    }
}

impl ViewSink for TuiApp {
    fn render_list_appended(&mut self, item: &RequestSummary) {
        self.rows.push_back(item.clone());
    }

    fn render_list_prepended(&mut self, item: &RequestSummary) {
        let had_rows = !self.rows.is_empty();
        self.rows.push_front(item.clone());
        // keep the cursor on the same request
        if had_rows {
            self.highlighted += 1;
        }
    }

    fn render_list_cleared(&mut self) {
        self.rows.clear();
        self.highlighted = 0;
    }

    fn render_count(&mut self, count: usize) {
        self.count = count;
    }

    fn render_active(&mut self, id: Option<&RequestId>) {
        self.active = id.cloned();
    }

    fn render_detail(&mut self, detail: &DetailView) {
        self.detail = DetailPane::Ready(detail.clone());
        self.detail_scroll = 0;
    }

    fn render_detail_loading(&mut self) {
        self.detail = DetailPane::Loading;
        self.detail_scroll = 0;
    }

    fn render_detail_empty(&mut self) {
        self.detail = DetailPane::Empty;
        self.detail_scroll = 0;
    }

    fn notify(&mut self, kind: NoticeKind, title: &str, message: &str) {
        self.notices.push_back(Notice {
            kind,
            title: title.to_string(),
            message: message.to_string(),
            shown_at: Instant::now(),
        });
        while self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{detail, summary};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with_rows(n: i64) -> TuiApp {
        let mut app = TuiApp::new("http://127.0.0.1:8000/wh/tok".to_string());
        for id in 1..=n {
            app.render_list_appended(&summary(id));
        }
        app
    }

    #[test]
    fn test_navigation_and_select() {
        let mut app = app_with_rows(3);
        assert_eq!(app.handle_key(key(KeyCode::Down)), KeyAction::None);
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.highlighted, 2);

        app.handle_key(key(KeyCode::Char('k')));
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            KeyAction::Command(Command::Select(RequestId::Number(2)))
        );
        assert_eq!(
            app.handle_key(key(KeyCode::Esc)),
            KeyAction::Command(Command::Deselect)
        );
    }

    #[test]
    fn test_enter_on_empty_list_does_nothing() {
        let mut app = app_with_rows(0);
        assert_eq!(app.handle_key(key(KeyCode::Enter)), KeyAction::None);
    }

    #[test]
    fn test_clear_needs_confirmation() {
        let mut app = app_with_rows(2);
        assert_eq!(app.handle_key(key(KeyCode::Char('x'))), KeyAction::None);
        assert!(app.confirm_clear);
        assert_eq!(app.handle_key(key(KeyCode::Char('n'))), KeyAction::None);
        assert!(!app.confirm_clear);

        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(
            app.handle_key(key(KeyCode::Char('y'))),
            KeyAction::Command(Command::ClearAll)
        );
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with_rows(1);
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), KeyAction::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        app.confirm_clear = true;
        assert_eq!(app.handle_key(ctrl_c), KeyAction::Quit);
    }

    #[test]
    fn test_prepend_keeps_highlighted_request() {
        let mut app = app_with_rows(3);
        app.highlighted = 1;
        app.render_list_prepended(&summary(4));
        assert_eq!(app.rows[app.highlighted].id, RequestId::Number(2));

        let mut empty = app_with_rows(0);
        empty.render_list_prepended(&summary(1));
        assert_eq!(empty.highlighted, 0);
    }

    #[test]
    fn test_detail_resets_scroll_and_raw_toggle() {
        let mut app = app_with_rows(1);
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.detail_scroll, DETAIL_PAGE);
        app.handle_key(key(KeyCode::Char('r')));
        assert!(app.show_raw_body);

        app.render_detail(&DetailView::derive(&detail(1)));
        assert_eq!(app.detail_scroll, 0);
        assert!(matches!(app.detail, DetailPane::Ready(_)));
    }

    #[test]
    fn test_notices_are_capped_and_expire() {
        let mut app = app_with_rows(0);
        for i in 0..6 {
            app.notify(NoticeKind::Info, "Loaded", &format!("{}", i));
        }
        assert_eq!(app.notices.len(), MAX_NOTICES);
        assert_eq!(app.notices.front().map(|n| n.message.as_str()), Some("2"));

        app.expire_notices(Instant::now());
        assert_eq!(app.notices.len(), MAX_NOTICES);
        app.expire_notices(Instant::now() + NOTICE_TTL + Duration::from_millis(1));
        assert!(app.notices.is_empty());
    }
}
