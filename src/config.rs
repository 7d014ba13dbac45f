// パス: src/config.rs
// 役割: セッション構成値と永続ファイルの既定パスを定義する
// 意図: CLI とライブラリ利用者が同じ構成経路でセッションを組み立てられるようにする
// 関連ファイル: src/cli.rs, src/repl/cmd.rs, src/history.rs
//! セッション構成。

use std::env;
use std::path::PathBuf;

use crate::history::DEFAULT_HISTORY_LENGTH;

pub const DEFAULT_PROMPT: &str = ">>> ";
pub const DEFAULT_WELCOME: &str = "Welcome to the REPL!";

const HISTORY_ENV: &str = "REPLKIT_HISTORY_FILE";
const ALIAS_ENV: &str = "REPLKIT_ALIAS_FILE";
const LOG_ENV: &str = "REPLKIT_LOG_FILE";

/// REPL セッションの構成値。
///
/// `Default` はファイルへの永続化を行わない（パスがすべて `None`）。
#[derive(Debug, Clone)]
pub struct ReplConfig {
    pub prompt: String,
    pub welcome: String,
    pub history_file: Option<PathBuf>,
    pub alias_file: Option<PathBuf>,
    pub history_length: usize,
    /// 起動時に実行するファイル（`.reload` の対象）。
    pub startup_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            welcome: DEFAULT_WELCOME.to_string(),
            history_file: None,
            alias_file: None,
            history_length: DEFAULT_HISTORY_LENGTH,
            startup_file: None,
        }
    }
}

impl ReplConfig {
    /// 履歴・エイリアスを既定の場所へ永続化する構成。
    pub fn persistent() -> Self {
        Self {
            history_file: default_history_path(),
            alias_file: default_alias_path(),
            ..Self::default()
        }
    }
}

/// 履歴ファイルの保存場所を環境変数とユーザーのホームから決定する。
pub fn default_history_path() -> Option<PathBuf> {
    env_or_home(HISTORY_ENV, ".replkit_history")
}

pub fn default_alias_path() -> Option<PathBuf> {
    env_or_home(ALIAS_ENV, ".replkit_aliases")
}

pub fn default_log_path() -> Option<PathBuf> {
    env_or_home(LOG_ENV, ".replkit.log")
}

fn env_or_home(var: &str, file_name: &str) -> Option<PathBuf> {
    if let Some(path) = env::var_os(var) {
        return Some(PathBuf::from(path));
    }
    home_dir().map(|home| home.join(file_name))
}

pub(crate) fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
