// パス: src/lib.rs
// 役割: Crate root of the replkit REPL engine (aliases, history recall, meta-commands, batch files)
// 意図: Let host programs embed the engine by supplying only an Interpreter
// 関連ファイル: src/repl/mod.rs, src/errors.rs, src/interpreter.rs
//! replkit ルートモジュール
//!
//! 目的:
//! - 任意のインタプリタを差し込める汎用 REPL エンジンを提供する。
//! - 履歴呼び出し（`!N`）・エイリアス（`@name`）・メタコマンド・バッチファイルを備える。
//!
//! 方針:
//! - コメント/ドキュメントは日本語、識別子は英語。
//! - セッション状態はすべて `ReplSession` が所有し、グローバル状態は持たない。
//! - ログは `tracing` で出し、サブスクライバの登録はバイナリ側に任せる。
//!
//! # Examples
//! ```
//! use replkit::{ReplConfig, ReplSession};
//! use std::io::Write;
//!
//! let interp = |line: &str, out: &mut dyn Write| -> Result<(), replkit::InterpreterError> {
//!     writeln!(out, "= {}", line.len())?;
//!     Ok(())
//! };
//! let mut session = ReplSession::new(ReplConfig::default(), interp)
//!     .with_output(std::io::sink(), std::io::sink());
//! session.process_line(".alias @greet = hello world").unwrap();
//! session.process_line("@greet").unwrap();
//! assert_eq!(session.history().get(2), Some("hello world"));
//! ```

pub mod alias;
pub mod cli;
pub mod complete;
pub mod config;
pub mod errors;
pub mod expand;
pub mod history;
pub mod interpreter;
pub mod logging;
pub mod repl;

pub use crate::alias::AliasStore;
pub use crate::config::ReplConfig;
pub use crate::errors::{InterpreterError, LineError, ReplError, ReplResult};
pub use crate::history::HistoryLog;
pub use crate::interpreter::{EchoInterpreter, Interpreter};
pub use crate::repl::{CommandSet, Flow, FnCommand, MetaCommand, ReplSession};
