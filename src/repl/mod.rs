// パス: src/repl/mod.rs
// 役割: Facade over the REPL session, meta-commands, batch loader and line editor
// 意図: Expose ReplSession and the command surface while keeping the per-line pipeline private
// 関連ファイル: src/repl/cmd.rs, src/repl/loader.rs, src/bin/replkit.rs
//! 対話環境を構成するモジュール群をまとめたファサード。
//!
//! 入力・行処理・メタコマンド・表示を役割ごとに分け、外部には最小限の API のみを公開する。
//! - `cmd`: セッション状態とメインループ
//! - `commands`: メタコマンドの契約と組み込みコマンド
//! - `loader`: バッチファイルの実行
//! - `line_editor`: 端末の行編集と補完
//! - `printer`: ユーザー向けの表示ロジック
//! - `util`: REPL 内部の軽量ユーティリティ

pub mod cmd;
pub mod commands;
pub mod line_editor;
pub mod loader;
mod pipeline;
mod printer;
pub(crate) mod util;

pub use cmd::{LineSource, ReplSession};
pub use commands::{CommandSet, Flow, FnCommand, MetaCommand};
pub use line_editor::{LineContext, LineEditor, ReadResult};
pub use loader::{FsIo, LoadReport, ReplIo};
