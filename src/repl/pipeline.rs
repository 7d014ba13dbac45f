// パス: src/repl/pipeline.rs
// 役割: 1 行の入力を履歴呼び出し→メタコマンド→エイリアス展開→評価の順に処理する
// 意図: 対話ループとファイルローダが同じ経路を通るよう、行処理を 1 か所にまとめる
// 関連ファイル: src/repl/cmd.rs, src/repl/loader.rs, src/expand.rs, src/history.rs

use std::io::Write;

use tracing::{debug, trace};

use crate::errors::{ReplError, ReplResult};
use crate::expand::expand;
use crate::history;

use super::cmd::ReplSession;
use super::commands::Flow;

impl ReplSession {
    /// 1 行を処理する。空行は何もしない。
    ///
    /// 履歴には解決後の形で記録する（メタコマンドはそのまま、評価行は展開後）。
    /// 展開に失敗した行は入力どおりに記録してからエラーを返す。
    pub fn process_line(&mut self, line: &str) -> ReplResult<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        let resolved = match history::resolve(line, self.history())? {
            Some(recalled) => {
                writeln!(self.out, "# {}", recalled)?;
                debug!(reference = %line, recalled = %recalled, "history recall");
                recalled
            }
            None => line.to_string(),
        };
        if let Some(result) = self.dispatch(&resolved) {
            return result;
        }
        let expanded = match expand(&resolved, self.aliases()) {
            Ok(expanded) => expanded,
            Err(e) => {
                self.history_mut().push(&resolved);
                return Err(e);
            }
        };
        self.history_mut().push(&expanded);
        if expanded != resolved {
            trace!(input = %resolved, expanded = %expanded, "aliases expanded");
        }
        self.interpreter
            .eval(&expanded, &mut *self.out)
            .map_err(ReplError::Interpreter)?;
        Ok(Flow::Continue)
    }

    /// メタコマンドとして処理できればその結果を返す。一致しなければ `None`。
    pub fn dispatch(&mut self, line: &str) -> Option<ReplResult<Flow>> {
        let command = self.commands().find(line)?;
        self.history_mut().push(line);
        debug!(command = %command.usage(), "meta-command");
        Some(command.execute(line, self))
    }
}
