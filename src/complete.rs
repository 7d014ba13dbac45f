// パス: src/complete.rs
// 役割: 現在のセッション状態から補完候補を導出する
// 意図: 行編集ファシリティに依存しない純粋な候補計算として切り出す
// 関連ファイル: src/repl/line_editor.rs, src/repl/commands.rs, src/alias.rs
//! 補完候補の計算（副作用なし）。

use std::collections::BTreeSet;

use crate::alias::{AliasStore, SIGIL};
use crate::history::HistoryLog;
use crate::interpreter::Interpreter;
use crate::repl::commands::CommandSet;

/// インタプリタのキーワード・メタコマンド名・エイリアス名・履歴中の語を束ねる。
pub struct Completer<'a> {
    interpreter: &'a dyn Interpreter,
    commands: &'a CommandSet,
    aliases: &'a AliasStore,
    history: &'a HistoryLog,
}

impl<'a> Completer<'a> {
    pub fn new(
        interpreter: &'a dyn Interpreter,
        commands: &'a CommandSet,
        aliases: &'a AliasStore,
        history: &'a HistoryLog,
    ) -> Self {
        Self {
            interpreter,
            commands,
            aliases,
            history,
        }
    }

    /// 重複を除いた全候補を辞書順で返す。
    pub fn candidates(&self) -> BTreeSet<String> {
        let mut words = self.interpreter.keywords();
        words.extend(self.commands.names().into_iter().map(String::from));
        words.extend(
            self.aliases
                .list()
                .map(|(name, _)| format!("{}{}", SIGIL, name)),
        );
        for entry in self.history.iter() {
            words.extend(entry.split_whitespace().map(String::from));
        }
        words
    }

    /// 接頭辞に一致する候補を辞書順で返す。
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        self.candidates()
            .into_iter()
            .filter(|w| w.starts_with(prefix))
            .collect()
    }
}
