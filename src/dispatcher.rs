//! 动作派发 — 在后台查询包数据源，把状态变化以事件形式送回主循环

use crate::package_manager::{Package, PackageSource};
use crate::state::UiStateStore;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RefreshList,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::RefreshList => "refresh-list",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEventKind {
    Started(Action),
    Loaded(Vec<Package>),
    Failed(String),
    /// 本次派发结束（对应 loading=false），任何退出路径都会发送
    Finished,
}

/// 一次派发产生的事件，`seq` 按派发先后单调递增
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchEvent {
    pub seq: u64,
    pub kind: DispatchEventKind,
}

/// 在途标记，drop 时发送 `Finished`
///
/// 成功、失败、panic、被取消都会走到 drop。
struct InFlight {
    seq: u64,
    tx: mpsc::UnboundedSender<DispatchEvent>,
    count: Arc<AtomicUsize>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        // 先入队再减计数，in_flight() 为 0 时 `Finished` 一定已在通道里
        let _ = self.tx.send(DispatchEvent {
            seq: self.seq,
            kind: DispatchEventKind::Finished,
        });
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 单次派发的句柄
#[derive(Debug)]
pub struct DispatchHandle {
    seq: u64,
    abort: AbortHandle,
}

impl DispatchHandle {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// 在挂起点取消查询；已取消的派发只会再发送 `Finished`
    pub fn cancel(&self) {
        self.abort.abort();
    }
}

pub struct ActionDispatcher {
    source: Arc<dyn PackageSource>,
    tx: mpsc::UnboundedSender<DispatchEvent>,
    next_seq: u64,
    in_flight: Arc<AtomicUsize>,
    tasks: Vec<DispatchHandle>,
}

impl ActionDispatcher {
    pub fn new(source: Arc<dyn PackageSource>, tx: mpsc::UnboundedSender<DispatchEvent>) -> Self {
        Self {
            source,
            tx,
            next_seq: 1,
            in_flight: Arc::new(AtomicUsize::new(0)),
            tasks: Vec::new(),
        }
    }

    /// 派发一个动作，任何时候都可以调用，包括上一次派发尚未结束时
    ///
    /// `Started` 在返回前已经进入通道，因此同一通道上各派发的
    /// `Started` 顺序与调用顺序一致。
    pub fn dispatch(&mut self, action: Action) -> DispatchHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.retain(|t| !t.abort.is_finished());

        log::info!("派发 #{} {} (数据源: {})", seq, action.name(), self.source.name());
        let _ = self.tx.send(DispatchEvent {
            seq,
            kind: DispatchEventKind::Started(action),
        });

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight {
            seq,
            tx: self.tx.clone(),
            count: Arc::clone(&self.in_flight),
        };
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            let _guard = guard;
            match action {
                Action::RefreshList => {
                    let kind = match source.fetch_installed_packages().await {
                        Ok(packages) => {
                            log::info!("派发 #{} 完成，共 {} 个包", seq, packages.len());
                            DispatchEventKind::Loaded(packages)
                        }
                        Err(e) => {
                            log::warn!("派发 #{} 失败: {}", seq, e);
                            DispatchEventKind::Failed(e.to_string())
                        }
                    };
                    let _ = tx.send(DispatchEvent { seq, kind });
                }
            }
        });

        self.tasks.push(DispatchHandle {
            seq,
            abort: task.abort_handle(),
        });
        DispatchHandle {
            seq,
            abort: task.abort_handle(),
        }
    }

    /// 尚未发送 `Finished` 的派发数量
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn cancel_all(&mut self) {
        for task in self.tasks.drain(..) {
            if !task.abort.is_finished() {
                log::debug!("取消派发 #{}", task.seq);
                task.cancel();
            }
        }
    }
}

impl Drop for ActionDispatcher {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// 并发派发的结果如何合并
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// 只采用最近一次发起的派发结果，较早发起但较晚完成的结果被丢弃
    #[default]
    LatestInitiated,
    /// 按完成顺序依次写入，最后完成的覆盖之前的结果
    LastCompletion,
}

/// 把派发事件写入 [`UiStateStore`]
#[derive(Debug, Default)]
pub struct StateReducer {
    policy: OverlapPolicy,
    latest_seq: u64,
}

impl StateReducer {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            policy,
            latest_seq: 0,
        }
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// 应用一个事件，返回状态是否被写入
    pub fn apply(&mut self, store: &mut UiStateStore, event: DispatchEvent) -> bool {
        let DispatchEvent { seq, kind } = event;
        match kind {
            DispatchEventKind::Started(_) => {
                self.latest_seq = self.latest_seq.max(seq);
                store.start_loading();
                true
            }
            DispatchEventKind::Loaded(packages) => {
                if self.is_stale(seq) {
                    log::debug!("丢弃过期结果 #{}（最新 #{}）", seq, self.latest_seq);
                    return false;
                }
                store.set_packages(packages);
                true
            }
            DispatchEventKind::Failed(message) => {
                if self.is_stale(seq) {
                    log::debug!("丢弃过期错误 #{}（最新 #{}）", seq, self.latest_seq);
                    return false;
                }
                store.set_error(Some(message));
                true
            }
            DispatchEventKind::Finished => {
                if self.is_stale(seq) {
                    return false;
                }
                store.set_loading(false);
                true
            }
        }
    }

    fn is_stale(&self, seq: u64) -> bool {
        self.policy == OverlapPolicy::LatestInitiated && seq < self.latest_seq
    }
}
