//! `pacman -Q` 输出解析

use super::types::{Package, SourceError};
use std::collections::HashSet;

/// 去掉单行中的 ANSI 转义序列和控制字符
///
/// paru/yay 在某些配置下即使输出到管道也会带颜色。
pub fn strip_terminal_codes(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    // CSI 序列以字母结尾
                    for next in chars.by_ref() {
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            c if c.is_control() && c != '\t' => {}
            _ => result.push(c),
        }
    }

    result
}

/// 解析 `pacman -Q` / `-Qe` 的输出
///
/// 每个非空行必须恰好是 `名称 版本` 两个字段，顺序与输出一致。
/// 任意一行格式不符即整体失败，行号从 1 开始。
pub fn parse_query_output(output: &str) -> Result<Vec<Package>, SourceError> {
    let mut packages = Vec::new();

    for (idx, raw) in output.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_terminal_codes(raw);
        let mut fields = line.split_whitespace();

        match (fields.next(), fields.next(), fields.next()) {
            (None, _, _) => continue,
            (Some(name), Some(version), None) => {
                let pkg = Package::new(name, version).map_err(|_| SourceError::Malformed {
                    line: line_no,
                    reason: "包名为空".to_string(),
                })?;
                packages.push(pkg);
            }
            (Some(name), None, _) => {
                return Err(SourceError::Malformed {
                    line: line_no,
                    reason: format!("{} 缺少版本号", name),
                });
            }
            (Some(_), Some(_), Some(_)) => {
                return Err(SourceError::Malformed {
                    line: line_no,
                    reason: format!("字段过多: {}", line.trim()),
                });
            }
        }
    }

    Ok(packages)
}

/// 按包名去重，保留第一次出现的条目
pub fn dedup_by_name(packages: Vec<Package>) -> Vec<Package> {
    let mut seen = HashSet::new();
    packages
        .into_iter()
        .filter(|pkg| seen.insert(pkg.name().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(packages: &[Package]) -> Vec<&str> {
        packages.iter().map(|p| p.name()).collect()
    }

    #[test]
    fn parses_in_source_order() {
        let packages = parse_query_output("curl 8.4.0-1\njq 1.7-1\nbash 5.2.021-1\n").unwrap();
        assert_eq!(names(&packages), vec!["curl", "jq", "bash"]);
        assert_eq!(packages[1].version(), "1.7-1");
    }

    #[test]
    fn skips_blank_lines_and_crlf() {
        let packages = parse_query_output("\ncurl 8.4.0\r\n   \njq 1.7\n").unwrap();
        assert_eq!(names(&packages), vec!["curl", "jq"]);
    }

    #[test]
    fn empty_output_is_an_empty_list() {
        assert!(parse_query_output("").unwrap().is_empty());
    }

    #[test]
    fn strips_color_codes() {
        let packages = parse_query_output("\x1b[1mcurl\x1b[0m \x1b[32m8.4.0\x1b[0m\n").unwrap();
        assert_eq!(packages[0].name(), "curl");
        assert_eq!(packages[0].version(), "8.4.0");
    }

    #[test]
    fn missing_version_reports_line_number() {
        let err = parse_query_output("curl 8.4.0\njq\n").unwrap_err();
        match err {
            SourceError::Malformed { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("jq"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn extra_fields_are_malformed() {
        let err = parse_query_output("error: database not found here\n").unwrap_err();
        assert!(matches!(err, SourceError::Malformed { line: 1, .. }));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let packages = parse_query_output("curl 8.4.0\njq 1.7\ncurl 8.5.0\n").unwrap();
        let deduped = dedup_by_name(packages);
        assert_eq!(names(&deduped), vec!["curl", "jq"]);
        assert_eq!(deduped[0].version(), "8.4.0");
    }
}
