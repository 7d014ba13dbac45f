// パス: src/repl/printer.rs
// 役割: ヘルプ・履歴・エイリアス一覧の表示ロジック
// 意図: メタコマンド間で表示形式を統一し、任意のライターへ描画できるようにする
// 関連ファイル: src/repl/commands.rs, src/history.rs, src/alias.rs
//! REPL で用いる表示ロジックを集約したモジュール。

use std::io::{self, Write};

use crate::alias::{AliasStore, SIGIL};
use crate::history::HistoryLog;

use super::commands::CommandSet;

/// 端末のクリア（画面消去 + カーソルを左上へ）。
pub(crate) const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const USAGE_WIDTH: usize = 22;

/// メタコマンド一覧を登録順に描画する。
pub(crate) fn render_help<W: Write + ?Sized>(out: &mut W, commands: &CommandSet) -> io::Result<()> {
    writeln!(out, "REPL meta-commands:")?;
    for cmd in commands.iter() {
        writeln!(
            out,
            "  {:<width$}{}",
            cmd.usage(),
            cmd.description(),
            width = USAGE_WIDTH
        )?;
    }
    writeln!(
        out,
        "  {:<width$}{}",
        "!N",
        "Recall command at position N",
        width = USAGE_WIDTH
    )
}

/// 履歴を 1 始まりの番号付きで描画する。
pub(crate) fn write_history<W: Write + ?Sized>(out: &mut W, history: &HistoryLog) -> io::Result<()> {
    for (idx, entry) in history.iter().enumerate() {
        writeln!(out, "{}: {}", idx + 1, entry)?;
    }
    Ok(())
}

/// エイリアスを定義順に描画する。
pub(crate) fn write_aliases<W: Write + ?Sized>(out: &mut W, aliases: &AliasStore) -> io::Result<()> {
    if aliases.is_empty() {
        return writeln!(out, "No aliases defined.");
    }
    for (name, expansion) in aliases.list() {
        writeln!(out, "{}{} = {}", SIGIL, name, expansion)?;
    }
    Ok(())
}
