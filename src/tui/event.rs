//! 事件处理模块

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use crate::notification::NotificationView;
use crate::tui::{App, Command, View};

/// TUI 事件
#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    Tick,
}

/// 轮询事件
pub fn poll_event(timeout: Duration) -> Result<Option<TuiEvent>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(Some(TuiEvent::Key(key)));
            }
        }
        return Ok(None);
    }
    Ok(Some(TuiEvent::Tick))
}

/// 处理按键事件，返回需要执行的 Store 操作
pub fn handle_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return None;
    }

    if app.popover_open {
        handle_popover_key(app, key)
    } else {
        match app.view {
            View::Home => handle_home_key(app, key),
            View::AllNotifications => handle_list_key(app, key),
        }
    }
}

fn handle_home_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('n') | KeyCode::Enter => app.open_popover(),
        KeyCode::Char('R') => return Some(Command::Refresh),
        _ => {}
    }
    None
}

fn handle_popover_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc | KeyCode::Char('n') => app.apply_effects(&NotificationView::close()),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Char('r') => return app.mark_selected(),
        KeyCode::Char('R') => return Some(Command::Refresh),
        // 空列表时不显示“查看全部”
        KeyCode::Char('a') if !app.state.feed().is_empty() => {
            app.apply_effects(&NotificationView::view_all())
        }
        _ => {}
    }
    None
}

fn handle_list_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc => app.view = View::Home,
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Char('r') => return app.mark_selected(),
        KeyCode::Char('R') => return Some(Command::Refresh),
        _ => {}
    }
    None
}
