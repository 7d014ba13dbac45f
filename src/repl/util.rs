//! REPL 内部ユーティリティ

use std::path::PathBuf;

use crate::config::home_dir;

/// 行が `name` 単独、または `name` + 空白 + 引数であれば引数部分（空白除去済み）を返す。
///
/// `.load` は `.load x` に一致するが `.loader` には一致しない。
pub(crate) fn command_args<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    if rest.is_empty() {
        return Some("");
    }
    if rest.starts_with(char::is_whitespace) {
        return Some(rest.trim());
    }
    None
}

/// 先頭の `~` をホームディレクトリへ展開する。
pub(crate) fn expand_user(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
