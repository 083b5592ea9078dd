//! 通知 Store - 通知列表、未读数、加载/错误状态的唯一数据源
//!
//! 状态保存在 `watch::Sender` 中，所有修改通过 `send_modify` 完成并广播给订阅方
//! （角标、弹出层、完整列表共用一份状态）。锁从不跨越 await。
//!
//! - `fetch`：按请求序号应用响应，过期响应丢弃；失败保留旧列表
//! - `mark_as_read`：乐观更新，按 id 记录可回滚命令，失败时只回滚该条

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::error::StoreError;
use super::model::UserNotification;
use super::service::NotificationService;

/// 最小刷新间隔
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// 进行中的标记已读命令（记录标记前的状态，用于回滚）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReadCommand {
    previous_is_read: bool,
}

/// Store 可观察状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    feed: Vec<UserNotification>,
    unread_count: usize,
    loading: bool,
    error: Option<StoreError>,
    pending_fetches: usize,
    /// 已发出的最大请求序号
    issued_seq: u64,
    /// 已落地（成功或失败）的最大请求序号
    landed_seq: u64,
    pending_reads: HashMap<i64, ReadCommand>,
    /// 后端已确认的已读：id -> 确认时已发出的最大请求序号
    confirmed_reads: HashMap<i64, u64>,
}

impl NotificationState {
    /// 以给定列表构造状态（未读数按列表计算）
    pub fn from_feed(feed: Vec<UserNotification>) -> Self {
        let mut state = Self::default();
        state.replace_feed(feed, 0);
        state
    }

    #[cfg(test)]
    pub(crate) fn with_loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_error(mut self, error: StoreError) -> Self {
        self.error = Some(error);
        self
    }

    /// 通知列表（后端顺序）
    pub fn feed(&self) -> &[UserNotification] {
        &self.feed
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&StoreError> {
        self.error.as_ref()
    }

    pub fn get(&self, id: i64) -> Option<&UserNotification> {
        self.feed.iter().find(|n| n.id == id)
    }

    /// 该 id 是否有未完成的标记请求
    pub fn is_read_pending(&self, id: i64) -> bool {
        self.pending_reads.contains_key(&id)
    }

    /// 整体替换列表并重新计算未读数
    ///
    /// 仍在进行中的乐观标记保持已读；后端已确认已读的条目不再需要回滚。
    /// 确认之前发出的请求可能带回旧的未读状态，这些条目保持已读；
    /// 确认之后发出的请求以后端为准。
    fn replace_feed(&mut self, mut feed: Vec<UserNotification>, seq: u64) {
        self.confirmed_reads.retain(|_, confirmed_at| seq <= *confirmed_at);

        for entry in feed.iter_mut() {
            if let Some(cmd) = self.pending_reads.get_mut(&entry.id) {
                if entry.is_read {
                    cmd.previous_is_read = true;
                }
                entry.is_read = true;
            } else if self.confirmed_reads.contains_key(&entry.id) {
                entry.is_read = true;
            }
        }
        self.unread_count = feed.iter().filter(|n| !n.is_read).count();
        self.feed = feed;
        self.check_unread_invariant();
    }

    /// 登记新请求，返回其序号
    fn begin_fetch(&mut self) -> u64 {
        self.issued_seq += 1;
        self.pending_fetches += 1;
        self.loading = true;
        self.issued_seq
    }

    fn end_fetch(&mut self) {
        self.pending_fetches = self.pending_fetches.saturating_sub(1);
        self.loading = self.pending_fetches > 0;
    }

    /// 应用 fetch 结果，返回是否被采纳
    fn finish_fetch(
        &mut self,
        seq: u64,
        result: Result<Vec<UserNotification>, String>,
    ) -> bool {
        self.end_fetch();

        if seq < self.landed_seq {
            debug!(seq, landed = self.landed_seq, "discarding stale fetch response");
            return false;
        }
        self.landed_seq = seq;

        match result {
            Ok(feed) => {
                self.replace_feed(feed, seq);
                self.error = None;
            }
            Err(message) => {
                self.error = Some(StoreError::Fetch(message));
            }
        }
        true
    }

    /// 乐观标记已读，返回是否发生变化
    fn begin_read(&mut self, id: i64) -> bool {
        if self.pending_reads.contains_key(&id) {
            return false;
        }
        let Some(entry) = self.feed.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        if entry.is_read {
            return false;
        }

        self.pending_reads.insert(
            id,
            ReadCommand {
                previous_is_read: entry.is_read,
            },
        );
        entry.is_read = true;
        self.unread_count -= 1;
        self.check_unread_invariant();
        true
    }

    fn confirm_read(&mut self, id: i64) {
        if self.pending_reads.remove(&id).is_some() {
            self.confirmed_reads.insert(id, self.issued_seq);
        }
    }

    /// 撤销单条乐观标记，其余条目不受影响
    fn revert_read(&mut self, id: i64) {
        if let Some(cmd) = self.pending_reads.remove(&id) {
            if let Some(entry) = self.feed.iter_mut().find(|n| n.id == id) {
                if entry.is_read && !cmd.previous_is_read {
                    entry.is_read = false;
                    self.unread_count += 1;
                }
            }
        }
        self.check_unread_invariant();
    }

    /// 后端失败：回滚并记录错误
    fn rollback_read(&mut self, id: i64, message: String) {
        self.revert_read(id);
        self.error = Some(StoreError::Mutation { id, message });
    }

    fn check_unread_invariant(&self) {
        debug_assert_eq!(
            self.unread_count,
            self.feed.iter().filter(|n| !n.is_read).count(),
            "unread_count out of sync with feed"
        );
    }
}

/// future 被取消（drop）时执行收尾，避免状态停留在进行中
struct CancelGuard<'a, F: FnOnce(&mut NotificationState)> {
    state: &'a watch::Sender<NotificationState>,
    on_cancel: Option<F>,
}

impl<'a, F: FnOnce(&mut NotificationState)> CancelGuard<'a, F> {
    fn new(state: &'a watch::Sender<NotificationState>, on_cancel: F) -> Self {
        Self {
            state,
            on_cancel: Some(on_cancel),
        }
    }

    fn disarm(mut self) {
        self.on_cancel = None;
    }
}

impl<F: FnOnce(&mut NotificationState)> Drop for CancelGuard<'_, F> {
    fn drop(&mut self) {
        if let Some(on_cancel) = self.on_cancel.take() {
            self.state.send_modify(on_cancel);
        }
    }
}

/// 通知 Store
pub struct NotificationStore {
    service: Arc<dyn NotificationService>,
    state: watch::Sender<NotificationState>,
}

impl NotificationStore {
    pub fn new(service: Arc<dyn NotificationService>) -> Self {
        let (state, _) = watch::channel(NotificationState::default());
        Self {
            service,
            state,
        }
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.state.subscribe()
    }

    /// 当前状态快照
    pub fn snapshot(&self) -> NotificationState {
        self.state.borrow().clone()
    }

    /// 拉取通知列表
    pub async fn fetch(&self) {
        let mut seq = 0;
        self.state.send_modify(|s| seq = s.begin_fetch());
        let guard = CancelGuard::new(&self.state, NotificationState::end_fetch);

        let result = self.service.list_notifications().await;
        guard.disarm();

        let result = result.map_err(|e| {
            warn!(seq, error = %e, "failed to fetch notifications");
            e.to_string()
        });
        let ok = result.is_ok();

        let mut applied = false;
        self.state.send_modify(|s| applied = s.finish_fetch(seq, result));

        if applied && ok {
            let state = self.state.borrow();
            info!(seq, total = state.feed.len(), unread = state.unread_count, "notifications refreshed");
        }
    }

    /// 标记已读（乐观更新，失败回滚）
    ///
    /// 不在列表中、已读或已有进行中的请求时为 no-op。
    pub async fn mark_as_read(&self, id: i64) {
        if !self.state.send_if_modified(|s| s.begin_read(id)) {
            debug!(id, "mark as read skipped");
            return;
        }
        // 请求被取消时结果未知，按失败撤销（不记录错误）
        let guard = CancelGuard::new(&self.state, move |s: &mut NotificationState| {
            s.revert_read(id)
        });

        let result = self.service.mark_as_read(id).await;
        guard.disarm();

        match result {
            Ok(()) => {
                debug!(id, "notification marked as read");
                self.state.send_modify(|s| s.confirm_read(id));
            }
            Err(e) => {
                warn!(id, error = %e, "mark as read failed, rolling back");
                self.state.send_modify(|s| s.rollback_read(id, e.to_string()));
            }
        }
    }

    /// 定时刷新，返回的句柄 drop 时自动取消
    pub fn spawn_refresh(self: &Arc<Self>, every: Duration) -> RefreshHandle {
        let every = every.max(MIN_REFRESH_INTERVAL);
        let store = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.fetch().await;
            }
        });
        debug!(interval_secs = every.as_secs(), "notification refresh started");
        RefreshHandle { task }
    }
}

/// 定时刷新句柄
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
