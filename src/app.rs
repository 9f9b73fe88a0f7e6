use crate::config::Config;
use crate::dispatcher::{Action, ActionDispatcher, DispatchEvent, StateReducer};
use crate::package_manager::PackageSource;
use crate::state::UiStateStore;
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// 标准输入上的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Refresh,
    ToggleTheme,
    Quit,
    Unknown(String),
}

impl HostCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let cmd = line.trim();
        if cmd.is_empty() {
            return None;
        }
        Some(match cmd {
            "r" | "refresh" => HostCommand::Refresh,
            "t" | "theme" => HostCommand::ToggleTheme,
            "q" | "quit" => HostCommand::Quit,
            other => HostCommand::Unknown(other.to_string()),
        })
    }
}

/// 处理一条命令，返回是否继续运行
///
/// 加载期间刷新和主题切换都被忽略，与按钮禁用的行为一致。
pub fn handle_command(
    cmd: HostCommand,
    store: &mut UiStateStore,
    dispatcher: &mut ActionDispatcher,
) -> bool {
    match cmd {
        HostCommand::Refresh if store.state().can_refresh() => {
            dispatcher.dispatch(Action::RefreshList);
        }
        HostCommand::ToggleTheme if store.state().can_refresh() => {
            store.toggle_dark_mode();
        }
        ignored @ (HostCommand::Refresh | HostCommand::ToggleTheme) => {
            log::info!("正在加载，忽略命令 {:?}", ignored);
        }
        HostCommand::Quit => return false,
        HostCommand::Unknown(other) => {
            eprintln!("未知命令: {}（r 刷新 / t 切换主题 / q 退出）", other);
        }
    }
    true
}

pub async fn run(
    config: &Config,
    source: Arc<dyn PackageSource>,
    store: &mut UiStateStore,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<DispatchEvent>();
    let mut dispatcher = ActionDispatcher::new(source, tx);
    let mut reducer = StateReducer::new(config.overlap_policy);

    // 启动时先刷新一次
    dispatcher.dispatch(Action::RefreshList);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                reducer.apply(store, event);
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        if let Some(cmd) = HostCommand::parse(&line) {
                            if !handle_command(cmd, store, &mut dispatcher) {
                                break;
                            }
                        }
                    }
                    None => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("收到 Ctrl+C，退出");
                break;
            }
        }

        // 标准输入关闭后，等在途派发全部结束再退出
        if !stdin_open && dispatcher.in_flight() == 0 {
            while let Ok(event) = rx.try_recv() {
                reducer.apply(store, event);
            }
            break;
        }
    }

    // drop 时取消仍在途的查询
    drop(dispatcher);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_manager::testing::{pkg, StaticSource};

    #[test]
    fn parses_commands() {
        assert_eq!(HostCommand::parse(" r \n"), Some(HostCommand::Refresh));
        assert_eq!(HostCommand::parse("theme"), Some(HostCommand::ToggleTheme));
        assert_eq!(HostCommand::parse("q"), Some(HostCommand::Quit));
        assert_eq!(
            HostCommand::parse("x"),
            Some(HostCommand::Unknown("x".to_string()))
        );
        assert_eq!(HostCommand::parse("   "), None);
    }

    #[tokio::test]
    async fn refresh_and_theme_are_ignored_while_loading() {
        let source = Arc::new(StaticSource::ok(vec![pkg("curl", "8.4.0")]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut dispatcher =
            ActionDispatcher::new(Arc::clone(&source) as Arc<dyn PackageSource>, tx);
        let mut reducer = StateReducer::default();
        let mut store = UiStateStore::default();

        assert!(handle_command(HostCommand::Refresh, &mut store, &mut dispatcher));
        let started = rx.recv().await.unwrap();
        reducer.apply(&mut store, started);
        assert!(store.state().is_loading);

        assert!(handle_command(HostCommand::Refresh, &mut store, &mut dispatcher));
        assert!(handle_command(HostCommand::ToggleTheme, &mut store, &mut dispatcher));
        assert!(!store.state().is_dark_mode);

        while let Some(event) = rx.recv().await {
            let finished = event.kind == crate::dispatcher::DispatchEventKind::Finished;
            reducer.apply(&mut store, event);
            if finished {
                break;
            }
        }
        assert_eq!(source.calls(), 1);
        assert_eq!(store.state().packages, vec![pkg("curl", "8.4.0")]);

        assert!(handle_command(HostCommand::ToggleTheme, &mut store, &mut dispatcher));
        assert!(store.state().is_dark_mode);
        assert!(!handle_command(HostCommand::Quit, &mut store, &mut dispatcher));
    }
}
