//! 纯文本视图，只用于终端里观察状态

use crate::state::UiState;
use std::fmt::Write;

pub fn render_text(state: &UiState) -> String {
    let mut out = String::new();
    let theme = if state.is_dark_mode { "dark" } else { "light" };
    let _ = writeln!(out, "Package Manager [{}]", theme);

    if let Some(err) = &state.error_message {
        let _ = writeln!(out, "! {}", err);
    }

    if state.is_loading {
        out.push_str("Loading...");
        return out;
    }

    let width = state
        .packages
        .iter()
        .map(|p| p.name().chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    let _ = writeln!(out, "{:<width$}  Version", "Name", width = width);
    let _ = writeln!(out, "{}", "-".repeat(width + 9));
    for pkg in &state.packages {
        let _ = writeln!(out, "{:<width$}  {}", pkg.name(), pkg.version(), width = width);
    }

    let _ = write!(out, "{} 个包", state.packages.len());
    if let Some(at) = state.last_refreshed {
        let _ = write!(out, "，刷新于 {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_manager::testing::pkg;

    #[test]
    fn loading_hides_table() {
        let state = UiState {
            packages: vec![pkg("curl", "8.4.0")],
            is_loading: true,
            ..Default::default()
        };
        let text = render_text(&state);
        assert!(text.contains("Loading..."));
        assert!(!text.contains("curl"));
    }

    #[test]
    fn table_lists_packages_in_order_with_error_above() {
        let state = UiState {
            packages: vec![pkg("curl", "8.4.0"), pkg("jq", "1.7")],
            error_message: Some("包管理器不可用".into()),
            is_dark_mode: true,
            ..Default::default()
        };
        let text = render_text(&state);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Package Manager [dark]");
        assert_eq!(lines[1], "! 包管理器不可用");
        assert_eq!(lines[4], "curl  8.4.0");
        assert_eq!(lines[5], "jq    1.7");
        assert_eq!(lines[6], "2 个包");
    }
}
