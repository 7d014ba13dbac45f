// パス: src/errors.rs
// 役割: REPL エンジン全体で共有するエラー型の定義
// 意図: 1 行単位の失敗とファイル単位の失敗を同じ語彙で扱えるようにする
// 関連ファイル: src/repl/pipeline.rs, src/repl/loader.rs, src/alias.rs
//! エラー型の定義（共通フォーマット: \[CODE\] メッセージ）。

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// インタプリタが返す不透明なエラー。
pub type InterpreterError = Box<dyn std::error::Error + Send + Sync>;

/// REPL の各段（履歴呼び出し・メタコマンド・エイリアス展開・評価）で発生しうるエラー。
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("[ALS001] invalid alias name: '{0}' (must be '@' followed by an identifier)")]
    InvalidAliasName(String),
    #[error("[ALS002] alias expression cannot be empty: '@{0}'")]
    EmptyExpansion(String),
    #[error("[ALS003] malformed alias definition: '{0}' (expected @name = expression)")]
    MalformedAlias(String),
    #[error("[ALS004] unknown alias: '@{0}'")]
    UnknownAlias(String),
    #[error("[HIS001] no command at {reference} (history has {len} entries; use !N with N >= 1)")]
    HistoryRecall { reference: String, len: usize },
    #[error("[FIL001] no startup file was loaded, nothing to reload")]
    NoStartupFile,
    #[error("[FIL002] file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("[FIL003] cannot read {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("[FIL004] {} is already being loaded", .0.display())]
    RecursiveLoad(PathBuf),
    #[error("[CMD001] usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Interpreter(InterpreterError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ReplError {
    /// 診断コードを取り出す（インタプリタ由来と I/O は固有コードを持たない）。
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ReplError::InvalidAliasName(_) => Some("ALS001"),
            ReplError::EmptyExpansion(_) => Some("ALS002"),
            ReplError::MalformedAlias(_) => Some("ALS003"),
            ReplError::UnknownAlias(_) => Some("ALS004"),
            ReplError::HistoryRecall { .. } => Some("HIS001"),
            ReplError::NoStartupFile => Some("FIL001"),
            ReplError::FileNotFound(_) => Some("FIL002"),
            ReplError::FileAccess { .. } => Some("FIL003"),
            ReplError::RecursiveLoad(_) => Some("FIL004"),
            ReplError::Usage(_) => Some("CMD001"),
            ReplError::Interpreter(_) | ReplError::Io(_) => None,
        }
    }

    /// ファイルを開く段階の I/O エラーをパス付きの分類へ写像する。
    pub fn open_failure(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        if err.kind() == io::ErrorKind::NotFound {
            ReplError::FileNotFound(path)
        } else {
            ReplError::FileAccess { path, source: err }
        }
    }
}

/// REPL 操作の結果型。
pub type ReplResult<T> = Result<T, ReplError>;

/// ファイル中の特定行で起きた失敗（`path:line` で帰属させる）。
#[derive(Debug)]
pub struct LineError {
    pub path: PathBuf,
    /// 1-origin の物理行番号（コメント・空行も数える）。
    pub line: usize,
    pub error: ReplError,
}

impl Display for LineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.path.display(), self.line, self.error)
    }
}

impl std::error::Error for LineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
