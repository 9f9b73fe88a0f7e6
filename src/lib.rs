//! 包列表刷新核心：后台查询包数据源的动作派发，加上可订阅的界面状态。

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod package_manager;
pub mod render;
pub mod state;
