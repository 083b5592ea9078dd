//! NotificationStore 行为测试
//!
//! 使用可编排的内存后端控制每个请求的返回时机：
//! - 乐观更新与回滚
//! - 幂等标记
//! - 过期 fetch 响应丢弃
//! - 取消后的收尾（标记撤销、刷新停止）
//! - 多订阅方共享状态

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

use notification_center::notification::{
    NotificationContent, NotificationService, NotificationState, NotificationStore, ServiceError,
    StoreError, UserNotification,
};

type FeedReply = Result<Vec<UserNotification>, ServiceError>;
type ReadReply = Result<(), ServiceError>;

/// 请求开始的信号
#[derive(Debug, PartialEq)]
enum Started {
    Fetch,
    Read(i64),
}

/// 可编排的后端：每个请求等待测试通过 oneshot 给出结果
struct ScriptedService {
    fetches: Mutex<VecDeque<oneshot::Receiver<FeedReply>>>,
    reads: Mutex<HashMap<i64, VecDeque<oneshot::Receiver<ReadReply>>>>,
    read_calls: Mutex<Vec<i64>>,
    started: mpsc::UnboundedSender<Started>,
}

impl ScriptedService {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Started>) {
        let (started, started_rx) = mpsc::unbounded_channel();
        let service = Arc::new(Self {
            fetches: Mutex::new(VecDeque::new()),
            reads: Mutex::new(HashMap::new()),
            read_calls: Mutex::new(Vec::new()),
            started,
        });
        (service, started_rx)
    }

    fn expect_fetch(&self) -> oneshot::Sender<FeedReply> {
        let (tx, rx) = oneshot::channel();
        self.fetches.lock().unwrap().push_back(rx);
        tx
    }

    fn expect_read(&self, id: i64) -> oneshot::Sender<ReadReply> {
        let (tx, rx) = oneshot::channel();
        self.reads.lock().unwrap().entry(id).or_default().push_back(rx);
        tx
    }

    fn read_calls(&self) -> Vec<i64> {
        self.read_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationService for ScriptedService {
    async fn list_notifications(&self) -> Result<Vec<UserNotification>, ServiceError> {
        let rx = self.fetches.lock().unwrap().pop_front();
        let _ = self.started.send(Started::Fetch);
        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ServiceError::Network("reply dropped".to_string()))),
            None => Err(ServiceError::Network("unexpected fetch".to_string())),
        }
    }

    async fn mark_as_read(&self, id: i64) -> Result<(), ServiceError> {
        self.read_calls.lock().unwrap().push(id);
        let rx = self.reads.lock().unwrap().get_mut(&id).and_then(|q| q.pop_front());
        let _ = self.started.send(Started::Read(id));
        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ServiceError::Network("reply dropped".to_string()))),
            None => Err(ServiceError::Network("unexpected mark".to_string())),
        }
    }
}

fn entry(id: i64, is_read: bool) -> UserNotification {
    UserNotification::new(
        id,
        NotificationContent::IssueRegression {
            issue_title: format!("Issue {}", id),
            project_name: None,
        },
        Utc::now(),
    )
    .with_read(is_read)
}

fn ids(state: &NotificationState) -> Vec<i64> {
    state.feed().iter().map(|n| n.id).collect()
}

fn assert_unread_consistent(state: &NotificationState) {
    let unread = state.feed().iter().filter(|n| !n.is_read).count();
    assert_eq!(state.unread_count(), unread);
}

/// 用给定列表完成一次 fetch
async fn seeded_store(
    service: &Arc<ScriptedService>,
    feed: Vec<UserNotification>,
) -> Arc<NotificationStore> {
    let store = Arc::new(NotificationStore::new(service.clone()));
    service.expect_fetch().send(Ok(feed)).unwrap();
    store.fetch().await;
    store
}

#[tokio::test]
async fn test_fetch_success_counts_unread() {
    let (service, _started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(1, false), entry(2, true), entry(3, false)]).await;

    let state = store.snapshot();
    assert_eq!(ids(&state), vec![1, 2, 3]);
    assert_eq!(state.unread_count(), 2);
    assert!(!state.loading());
    assert!(state.error().is_none());
}

#[tokio::test]
async fn test_feed_order_is_preserved() {
    let (service, _started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(30, true), entry(10, false), entry(20, true)]).await;

    assert_eq!(ids(&store.snapshot()), vec![30, 10, 20]);
}

#[tokio::test]
async fn test_mark_as_read_success() {
    let (service, _started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(1, false), entry(2, true), entry(3, false)]).await;

    service.expect_read(1).send(Ok(())).unwrap();
    store.mark_as_read(1).await;

    let state = store.snapshot();
    assert_eq!(state.unread_count(), 1);
    assert!(state.get(1).unwrap().is_read);
    assert!(!state.is_read_pending(1));
    assert!(state.error().is_none());
    assert_unread_consistent(&state);
}

#[tokio::test]
async fn test_mark_as_read_is_optimistic_then_rolls_back() {
    let (service, mut started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(4, true), entry(5, false)]).await;
    assert_eq!(started.recv().await, Some(Started::Fetch));
    let before = store.snapshot().unread_count();

    let reply = service.expect_read(5);
    let task = {
        let store = store.clone();
        tokio::spawn(async move { store.mark_as_read(5).await })
    };
    assert_eq!(started.recv().await, Some(Started::Read(5)));

    // 后端确认前已经是已读
    let optimistic = store.snapshot();
    assert!(optimistic.get(5).unwrap().is_read);
    assert_eq!(optimistic.unread_count(), before - 1);
    assert!(!optimistic.loading());

    reply
        .send(Err(ServiceError::Status {
            status: 500,
            message: "internal".to_string(),
        }))
        .unwrap();
    task.await.unwrap();

    let state = store.snapshot();
    assert!(!state.get(5).unwrap().is_read);
    assert!(state.get(4).unwrap().is_read);
    assert_eq!(state.unread_count(), before);
    assert!(matches!(state.error(), Some(StoreError::Mutation { id: 5, .. })));
    assert_unread_consistent(&state);
}

#[tokio::test]
async fn test_mark_as_read_twice_is_idempotent() {
    let (service, _started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(1, false), entry(2, false)]).await;

    service.expect_read(1).send(Ok(())).unwrap();
    store.mark_as_read(1).await;
    let after_first = store.snapshot();

    store.mark_as_read(1).await;
    let after_second = store.snapshot();

    assert_eq!(after_first, after_second);
    assert_eq!(after_second.unread_count(), 1);
    assert_eq!(service.read_calls(), vec![1]);
}

#[tokio::test]
async fn test_mark_as_read_unknown_id_is_noop() {
    let (service, _started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(1, false)]).await;
    let before = store.snapshot();

    store.mark_as_read(99).await;

    assert_eq!(store.snapshot(), before);
    assert!(service.read_calls().is_empty());
}

#[tokio::test]
async fn test_concurrent_marks_are_isolated() {
    let (service, mut started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(1, false), entry(2, false), entry(3, false)]).await;
    assert_eq!(started.recv().await, Some(Started::Fetch));

    let reply1 = service.expect_read(1);
    let reply2 = service.expect_read(2);

    let task1 = {
        let store = store.clone();
        tokio::spawn(async move { store.mark_as_read(1).await })
    };
    assert_eq!(started.recv().await, Some(Started::Read(1)));
    let task2 = {
        let store = store.clone();
        tokio::spawn(async move { store.mark_as_read(2).await })
    };
    assert_eq!(started.recv().await, Some(Started::Read(2)));
    assert_eq!(store.snapshot().unread_count(), 1);

    // 1 失败，2 成功
    reply1
        .send(Err(ServiceError::Network("connection reset".to_string())))
        .unwrap();
    task1.await.unwrap();

    let mid = store.snapshot();
    assert!(!mid.get(1).unwrap().is_read);
    assert!(mid.get(2).unwrap().is_read);
    assert!(mid.is_read_pending(2));
    assert_eq!(mid.unread_count(), 2);

    reply2.send(Ok(())).unwrap();
    task2.await.unwrap();

    let state = store.snapshot();
    assert!(!state.get(1).unwrap().is_read);
    assert!(state.get(2).unwrap().is_read);
    assert!(!state.get(3).unwrap().is_read);
    assert_eq!(state.unread_count(), 2);
    assert_unread_consistent(&state);
}

#[tokio::test]
async fn test_fetch_failure_retains_feed() {
    let (service, _started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(1, false), entry(2, false), entry(3, true)]).await;

    service
        .expect_fetch()
        .send(Err(ServiceError::Network("timed out".to_string())))
        .unwrap();
    store.fetch().await;

    let state = store.snapshot();
    assert_eq!(ids(&state), vec![1, 2, 3]);
    assert_eq!(state.unread_count(), 2);
    assert!(!state.loading());
    assert_eq!(
        state.error(),
        Some(&StoreError::Fetch("network error: timed out".to_string()))
    );

    // 下一次成功清除错误
    service.expect_fetch().send(Ok(vec![entry(7, false)])).unwrap();
    store.fetch().await;
    let state = store.snapshot();
    assert!(state.error().is_none());
    assert_eq!(ids(&state), vec![7]);
}

#[tokio::test]
async fn test_loading_only_while_fetch_outstanding() {
    let (service, mut started) = ScriptedService::new();
    let store = Arc::new(NotificationStore::new(service.clone()));
    assert!(!store.snapshot().loading());

    let reply = service.expect_fetch();
    let task = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch().await })
    };
    assert_eq!(started.recv().await, Some(Started::Fetch));
    assert!(store.snapshot().loading());

    reply.send(Ok(vec![entry(1, false)])).unwrap();
    task.await.unwrap();
    assert!(!store.snapshot().loading());
}

#[tokio::test]
async fn test_stale_fetch_response_is_discarded() {
    let (service, mut started) = ScriptedService::new();
    let store = Arc::new(NotificationStore::new(service.clone()));

    let older = service.expect_fetch();
    let newer = service.expect_fetch();

    let task1 = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch().await })
    };
    assert_eq!(started.recv().await, Some(Started::Fetch));
    let task2 = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch().await })
    };
    assert_eq!(started.recv().await, Some(Started::Fetch));

    newer.send(Ok(vec![entry(10, false), entry(11, true)])).unwrap();
    task2.await.unwrap();
    assert!(store.snapshot().loading());

    older.send(Ok(vec![entry(1, false)])).unwrap();
    task1.await.unwrap();

    let state = store.snapshot();
    assert_eq!(ids(&state), vec![10, 11]);
    assert_eq!(state.unread_count(), 1);
    assert!(!state.loading());
}

#[tokio::test]
async fn test_stale_fetch_failure_is_discarded() {
    let (service, mut started) = ScriptedService::new();
    let store = Arc::new(NotificationStore::new(service.clone()));

    let older = service.expect_fetch();
    let newer = service.expect_fetch();

    let task1 = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch().await })
    };
    assert_eq!(started.recv().await, Some(Started::Fetch));
    let task2 = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch().await })
    };
    assert_eq!(started.recv().await, Some(Started::Fetch));

    newer.send(Ok(vec![entry(10, false)])).unwrap();
    task2.await.unwrap();
    older.send(Err(ServiceError::Network("late".to_string()))).unwrap();
    task1.await.unwrap();

    let state = store.snapshot();
    assert!(state.error().is_none());
    assert_eq!(ids(&state), vec![10]);
}

#[tokio::test]
async fn test_subscribers_see_same_state() {
    let (service, _started) = ScriptedService::new();
    let store = Arc::new(NotificationStore::new(service.clone()));
    let mut badge = store.subscribe();
    let mut popover = store.subscribe();

    service
        .expect_fetch()
        .send(Ok(vec![entry(1, false), entry(2, false)]))
        .unwrap();
    store.fetch().await;
    service.expect_read(2).send(Ok(())).unwrap();
    store.mark_as_read(2).await;

    assert!(badge.has_changed().unwrap());
    assert!(popover.has_changed().unwrap());
    let badge_count = badge.borrow_and_update().unread_count();
    let popover_count = popover.borrow_and_update().unread_count();
    assert_eq!(badge_count, 1);
    assert_eq!(popover_count, 1);
}

#[tokio::test]
async fn test_older_success_after_newer_failure_is_discarded() {
    let (service, mut started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(1, false), entry(2, true)]).await;
    assert_eq!(started.recv().await, Some(Started::Fetch));

    let older = service.expect_fetch();
    let newer = service.expect_fetch();

    let task1 = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch().await })
    };
    assert_eq!(started.recv().await, Some(Started::Fetch));
    let task2 = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch().await })
    };
    assert_eq!(started.recv().await, Some(Started::Fetch));

    newer
        .send(Err(ServiceError::Network("timed out".to_string())))
        .unwrap();
    task2.await.unwrap();
    older.send(Ok(vec![entry(9, false)])).unwrap();
    task1.await.unwrap();

    let state = store.snapshot();
    assert_eq!(ids(&state), vec![1, 2]);
    assert_eq!(state.unread_count(), 1);
    assert!(state.error().unwrap().is_fetch());
    assert!(!state.loading());
}

#[tokio::test]
async fn test_confirmed_read_survives_fetch_issued_before_confirm() {
    let (service, mut started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(5, false), entry(6, false)]).await;
    assert_eq!(started.recv().await, Some(Started::Fetch));

    // 标记之前发出的 fetch，后端还没看到标记
    let in_flight = service.expect_fetch();
    let task = {
        let store = store.clone();
        tokio::spawn(async move { store.fetch().await })
    };
    assert_eq!(started.recv().await, Some(Started::Fetch));

    service.expect_read(5).send(Ok(())).unwrap();
    store.mark_as_read(5).await;
    assert_eq!(started.recv().await, Some(Started::Read(5)));
    assert_eq!(store.snapshot().unread_count(), 1);

    in_flight.send(Ok(vec![entry(5, false), entry(6, false)])).unwrap();
    task.await.unwrap();

    let state = store.snapshot();
    assert!(state.get(5).unwrap().is_read);
    assert!(!state.get(6).unwrap().is_read);
    assert_eq!(state.unread_count(), 1);
    assert_unread_consistent(&state);

    // 确认之后发出的 fetch 以后端为准
    service
        .expect_fetch()
        .send(Ok(vec![entry(5, false), entry(6, false)]))
        .unwrap();
    store.fetch().await;
    let state = store.snapshot();
    assert!(!state.get(5).unwrap().is_read);
    assert_eq!(state.unread_count(), 2);
    assert_unread_consistent(&state);
}

#[tokio::test]
async fn test_cancelled_mark_reverts_entry() {
    let (service, mut started) = ScriptedService::new();
    let store = seeded_store(&service, vec![entry(1, false), entry(2, false)]).await;
    assert_eq!(started.recv().await, Some(Started::Fetch));

    let _reply = service.expect_read(1);
    let task = {
        let store = store.clone();
        tokio::spawn(async move { store.mark_as_read(1).await })
    };
    assert_eq!(started.recv().await, Some(Started::Read(1)));
    assert_eq!(store.snapshot().unread_count(), 1);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    let state = store.snapshot();
    assert!(!state.get(1).unwrap().is_read);
    assert!(!state.is_read_pending(1));
    assert_eq!(state.unread_count(), 2);
    assert!(state.error().is_none());
    assert_unread_consistent(&state);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_cancel_ends_inflight_fetch() {
    let (service, mut started) = ScriptedService::new();
    let store = Arc::new(NotificationStore::new(service.clone()));
    let mut updates = store.subscribe();

    service.expect_fetch().send(Ok(vec![entry(1, false)])).unwrap();
    let hanging = service.expect_fetch();
    let handle = store.spawn_refresh(Duration::from_secs(60));

    // interval 的第一次 tick 立即触发
    assert_eq!(started.recv().await, Some(Started::Fetch));
    while store.snapshot().loading() {
        updates.changed().await.unwrap();
    }
    assert_eq!(store.snapshot().unread_count(), 1);

    // 第二次 tick 的 fetch 一直挂起
    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(started.recv().await, Some(Started::Fetch));
    assert!(store.snapshot().loading());

    handle.cancel();
    tokio::time::timeout(Duration::from_secs(1), async {
        while store.snapshot().loading() {
            updates.changed().await.unwrap();
        }
    })
    .await
    .expect("in-flight fetch was not cancelled");
    assert!(hanging.is_closed());

    // 之后不再有 tick
    tokio::time::advance(Duration::from_secs(600)).await;
    tokio::task::yield_now().await;
    assert!(started.try_recv().is_err());

    let state = store.snapshot();
    assert!(!state.loading());
    assert_eq!(ids(&state), vec![1]);
    assert!(state.error().is_none());
}
