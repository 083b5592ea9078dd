//! TUI 渲染模块

use chrono::Utc;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::notification::{EntryView, NotificationView};
use crate::tui::{App, View};

/// 弹出层宽度
const POPOVER_WIDTH: u16 = 60;
/// 弹出层高度
const POPOVER_HEIGHT: u16 = 18;

/// 渲染主界面
pub fn render(app: &mut App, frame: &mut Frame) {
    let view = NotificationView::build(&app.state, Utc::now());
    let area = frame.area();

    // 垂直分割: 状态栏 | 主区域 | 底部栏
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_status_bar(&view, frame, vertical[0]);

    match app.view {
        View::Home => {
            let hint = Paragraph::new("Press [n] to open notifications")
                .block(Block::default().borders(Borders::ALL).title(" Home "));
            frame.render_widget(hint, vertical[1]);
        }
        View::AllNotifications => {
            render_notification_panel(app, &view, frame, vertical[1], " All Notifications ", false);
        }
    }

    if app.popover_open {
        let popover = popover_area(vertical[1]);
        frame.render_widget(Clear, popover);
        render_notification_panel(app, &view, frame, popover, " Notifications ", true);
    }

    let help = if app.popover_open {
        " [j/k] 移动  [r] 标记已读  [R] 刷新  [a] 查看全部  [Esc] 关闭  [q] quit "
    } else {
        match app.view {
            View::Home => " [n] 通知  [R] 刷新  [q] quit ",
            View::AllNotifications => " [j/k] 移动  [r] 标记已读  [R] 刷新  [Esc] 返回  [q] quit ",
        }
    };
    let help_bar = Paragraph::new(help).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(help_bar, vertical[2]);
}

/// 状态栏（角标只在有未读时显示）
fn render_status_bar(view: &NotificationView, frame: &mut Frame, area: Rect) {
    let status = match view.badge {
        Some(count) => format!(" Notifications │ 🔔 {} unread", count),
        None => " Notifications".to_string(),
    };
    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::Blue).fg(Color::White));
    frame.render_widget(status_bar, area);
}

/// 右上角弹出层区域
fn popover_area(area: Rect) -> Rect {
    let width = POPOVER_WIDTH.min(area.width);
    let height = POPOVER_HEIGHT.min(area.height);
    Rect {
        x: area.x + area.width - width,
        y: area.y,
        width,
        height,
    }
}

/// 通知面板：错误横幅 | 加载提示 | 列表或空状态 | 查看全部
fn render_notification_panel(
    app: &App,
    view: &NotificationView,
    frame: &mut Frame,
    area: Rect,
    title: &str,
    is_popover: bool,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let footer_height = u16::from(is_popover && view.show_view_all);
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(u16::from(view.error_banner.is_some())),
            Constraint::Length(u16::from(view.loading)),
            Constraint::Min(1),
            Constraint::Length(footer_height),
        ])
        .split(inner);

    if let Some(ref error) = view.error_banner {
        let banner = Paragraph::new(format!("⚠ {}", error))
            .style(Style::default().fg(Color::White).bg(Color::Red));
        frame.render_widget(banner, sections[0]);
    }

    if view.loading {
        let loading = Paragraph::new("Loading…").style(Style::default().fg(Color::Yellow));
        frame.render_widget(loading, sections[1]);
    }

    if let Some(empty) = view.empty_state {
        let empty = Paragraph::new(empty)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, sections[2]);
    } else {
        let items: Vec<ListItem> = view.entries.iter().map(entry_item).collect();
        let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray));
        let mut list_state = ListState::default().with_selected(
            (!view.entries.is_empty()).then_some(app.selected),
        );
        frame.render_stateful_widget(list, sections[2], &mut list_state);
    }

    if footer_height > 0 {
        let footer = Paragraph::new("[a] View all notifications")
            .alignment(Alignment::Right)
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(footer, sections[3]);
    }
}

fn entry_item(entry: &EntryView) -> ListItem<'static> {
    let mut header = format!("{} {}  · {}", entry.icon.symbol(), entry.title, entry.age);
    if entry.can_mark_read {
        header.push_str("  [r] mark read");
    }
    let text = format!("{}\n   {}", header, entry.message);

    let style = if entry.is_read {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    ListItem::new(text).style(style)
}
