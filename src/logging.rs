// パス: src/logging.rs
// 役割: バイナリ用の tracing サブスクライバ初期化
// 意図: 端末出力を汚さないよう、診断ログはファイルへだけ書く
// 関連ファイル: src/cli.rs, src/config.rs
//! ログ出力の設定。ライブラリ自身はサブスクライバを登録しない。

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// ログ初期化の失敗。
#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("[LOG001] cannot open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("[LOG002] invalid log level '{0}'")]
    Level(String),
    #[error("[LOG003] a global logger is already installed")]
    AlreadyInstalled,
}

/// `DEBUG` や `warning` のような表記を `EnvFilter` の書式へ揃える。
fn normalize_level(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}

/// `RUST_LOG` があればそれを、なければ `level` を使うフィルタを組み立てる。
fn build_filter(level: &str) -> Result<EnvFilter, LogInitError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(normalize_level(level)).map_err(|_| LogInitError::Level(level.to_string()))
}

/// `path` へ追記するサブスクライバをグローバルに登録する。
pub fn init(path: &Path, level: &str) -> Result<(), LogInitError> {
    let filter = build_filter(level)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| LogInitError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogInitError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|_| LogInitError::AlreadyInstalled)
}
