// パス: src/history.rs
// 役割: 入力履歴の保持・永続化と `!N` 参照の解決
// 意図: 行編集ファシリティから独立した履歴を持ち、呼び出し結果を決定的にする
// 関連ファイル: src/repl/pipeline.rs, src/repl/line_editor.rs, src/repl/printer.rs
//! 履歴ログと履歴呼び出し（`!N`）。

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::alias::persist_atomically;
use crate::errors::{ReplError, ReplResult};

/// 既定の保持件数。
pub const DEFAULT_HISTORY_LENGTH: usize = 1000;

/// 入力履歴の保持と永続化を司る構造体。呼び出し番号は 1 始まり。
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: Vec<String>,
    max_entries: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_LENGTH)
    }
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 上限件数を指定して空の履歴を作る（0 は 1 として扱う）。
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// 新しい入力を追加し、空行と直前の重複をスキップする。
    /// 追加した場合は `true` を返す。
    pub fn push(&mut self, entry: &str) -> bool {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return false;
        }
        if self.entries.last().map(|s| s.as_str()) == Some(trimmed) {
            return false;
        }
        if self.entries.len() >= self.max_entries {
            let overflow = self.entries.len() + 1 - self.max_entries;
            self.entries.drain(..overflow);
        }
        self.entries.push(trimmed.to_string());
        true
    }

    /// 1 始まりの番号でエントリを参照する。
    pub fn get(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|idx| self.entries.get(idx))
            .map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// 履歴ファイルを読み込み、既存の内容の後ろへ追加する。
    pub fn load(&mut self, path: &Path) -> ReplResult<()> {
        let content = fs::read_to_string(path).map_err(|e| ReplError::open_failure(path, e))?;
        for line in content.lines() {
            self.push(line);
        }
        info!(path = %path.display(), entries = self.len(), "loaded history file");
        Ok(())
    }

    /// 現在の履歴を 1 行 1 エントリで書き出す。
    pub fn save(&self, path: &Path) -> ReplResult<()> {
        persist_atomically(path, |out| {
            use std::io::Write;
            for entry in &self.entries {
                writeln!(out, "{}", entry)?;
            }
            Ok(())
        })?;
        info!(path = %path.display(), entries = self.len(), "saved history");
        Ok(())
    }
}

/// 行全体が呼び出し参照（空白を含まない `!...`）かどうか。
pub fn is_recall_reference(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('!') && !line.contains(char::is_whitespace)
}

/// `!N` 形式の行を履歴中のテキストへ解決する。
///
/// 呼び出し参照でなければ `Ok(None)`。解決結果がさらに参照である場合は
/// 履歴件数を上限として辿る。
///
/// # Examples
/// ```
/// use replkit::history::{resolve, HistoryLog};
///
/// let mut history = HistoryLog::new();
/// history.push("first");
/// history.push("second");
/// assert_eq!(resolve("!2", &history).unwrap().as_deref(), Some("second"));
/// assert_eq!(resolve("not a recall", &history).unwrap(), None);
/// assert!(resolve("!3", &history).is_err());
/// ```
pub fn resolve(line: &str, history: &HistoryLog) -> ReplResult<Option<String>> {
    if !is_recall_reference(line) {
        return Ok(None);
    }
    let mut current = line.trim();
    let mut hops = 0;
    while is_recall_reference(current) {
        if hops > history.len() {
            warn!(reference = %line.trim(), "history recall chain does not terminate");
            return Err(recall_error(current, history));
        }
        let digits = &current[1..];
        let entry = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            digits.parse::<usize>().ok().and_then(|n| history.get(n))
        } else {
            None
        };
        current = match entry {
            Some(text) => text,
            None => return Err(recall_error(current, history)),
        };
        hops += 1;
    }
    Ok(Some(current.to_string()))
}

fn recall_error(reference: &str, history: &HistoryLog) -> ReplError {
    ReplError::HistoryRecall {
        reference: reference.to_string(),
        len: history.len(),
    }
}
