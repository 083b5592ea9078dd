//! TUI 应用状态和主循环

use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::debug;

use crate::notification::{NotificationState, NotificationStore, Route, ViewEffect};
use crate::tui::{handle_key, poll_event, render, Command, TuiEvent, View};

pub type AppResult<T> = Result<T>;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// 事件轮询超时
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// TUI 应用状态
pub struct App {
    /// 是否退出
    pub should_quit: bool,
    /// 当前页面
    pub view: View,
    /// 通知弹出层是否打开
    pub popover_open: bool,
    /// 选中的通知下标（feed 顺序）
    pub selected: usize,
    /// 最近一次 Store 快照
    pub state: NotificationState,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            view: View::Home,
            popover_open: false,
            selected: 0,
            state: NotificationState::default(),
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// 同步 Store 状态
    pub fn sync(&mut self, state: &NotificationState) {
        self.state = state.clone();
        let len = self.state.feed().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// 列表是否处于可交互状态
    pub fn list_active(&self) -> bool {
        self.popover_open || self.view == View::AllNotifications
    }

    pub fn open_popover(&mut self) {
        self.popover_open = true;
        self.selected = 0;
    }

    pub fn next(&mut self) {
        let len = self.state.feed().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn prev(&mut self) {
        let len = self.state.feed().len();
        if len > 0 {
            self.selected = if self.selected == 0 { len - 1 } else { self.selected - 1 };
        }
    }

    /// 选中条目的标记已读命令（已读条目没有该操作）
    pub fn mark_selected(&self) -> Option<Command> {
        self.state
            .feed()
            .get(self.selected)
            .filter(|n| !n.is_read)
            .map(|n| Command::MarkRead(n.id))
    }

    /// 按顺序执行视图副作用
    pub fn apply_effects(&mut self, effects: &[ViewEffect]) {
        for effect in effects {
            match effect {
                ViewEffect::Navigate(Route::AllNotifications) => {
                    self.view = View::AllNotifications;
                }
                ViewEffect::Close => {
                    self.popover_open = false;
                }
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// 初始化终端
pub fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

/// 恢复终端
pub fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// 在后台执行 Store 操作，不阻塞渲染
fn dispatch(store: &Arc<NotificationStore>, command: Command) {
    debug!(?command, "dispatching command");
    let store = Arc::clone(store);
    tokio::spawn(async move {
        match command {
            Command::MarkRead(id) => store.mark_as_read(id).await,
            Command::Refresh => store.fetch().await,
        }
    });
}

/// 主循环，退出时定时刷新随句柄一起取消
pub async fn run(
    terminal: &mut Tui,
    app: &mut App,
    store: Arc<NotificationStore>,
    refresh_every: Duration,
) -> AppResult<()> {
    let _refresh = store.spawn_refresh(refresh_every);
    let mut updates = store.subscribe();
    app.sync(&updates.borrow_and_update());

    while !app.should_quit {
        if updates.has_changed().unwrap_or(false) {
            let state = updates.borrow_and_update().clone();
            app.sync(&state);
        }

        terminal.draw(|frame| render(app, frame))?;

        let event = tokio::task::spawn_blocking(|| poll_event(POLL_TIMEOUT)).await??;
        if let Some(TuiEvent::Key(key)) = event {
            if let Some(command) = handle_key(app, key) {
                dispatch(&store, command);
            }
        }
    }

    Ok(())
}
