use crate::package_manager::Package;
use chrono::{DateTime, Local};

/// 界面可见的全部状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    /// 当前包列表，顺序与数据源一致
    pub packages: Vec<Package>,
    /// 是否有派发正在进行
    pub is_loading: bool,
    /// 最近一次派发失败的消息，下一次派发开始时清除
    pub error_message: Option<String>,
    pub is_dark_mode: bool,
    /// 最近一次成功刷新的时间
    pub last_refreshed: Option<DateTime<Local>>,
}

impl UiState {
    /// 加载期间刷新与主题切换都不可用
    pub fn can_refresh(&self) -> bool {
        !self.is_loading
    }
}

/// 订阅句柄，用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Observer = Box<dyn FnMut(&UiState)>;

/// 单一所有者的状态容器
///
/// 每次写入都会在返回前按写入顺序同步通知所有观察者。
/// 写入需要 `&mut self`，由持有者（主循环）保证单写者。
/// 观察者拿到的是只读快照，不能在回调中写回状态。
pub struct UiStateStore {
    state: UiState,
    observers: Vec<(u64, Observer)>,
    next_id: u64,
}

impl Default for UiStateStore {
    fn default() -> Self {
        Self::new(UiState::default())
    }
}

impl UiStateStore {
    pub fn new(initial: UiState) -> Self {
        Self {
            state: initial,
            observers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn snapshot(&self) -> UiState {
        self.state.clone()
    }

    /// 整体替换包列表，同时记录刷新时间
    pub fn set_packages(&mut self, packages: Vec<Package>) {
        self.state.packages = packages;
        self.state.last_refreshed = Some(Local::now());
        self.notify();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.state.is_loading = loading;
        self.notify();
    }

    pub fn set_error(&mut self, message: Option<String>) {
        self.state.error_message = message;
        self.notify();
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.state.is_dark_mode = dark;
        self.notify();
    }

    pub fn toggle_dark_mode(&mut self) {
        let dark = !self.state.is_dark_mode;
        self.set_dark_mode(dark);
    }

    /// 开始派发：清除错误并进入加载状态，只通知一次
    pub fn start_loading(&mut self) {
        self.state.error_message = None;
        self.state.is_loading = true;
        self.notify();
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&UiState) + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        Subscription(id)
    }

    /// 取消订阅；重复取消不报错，返回 false
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(id, _)| *id != subscription.0);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn notify(&mut self) {
        let state = &self.state;
        for (_, observer) in self.observers.iter_mut() {
            observer(state);
        }
    }
}
