// パス: src/repl/line_editor.rs
// 役割: 端末の行編集ファシリティ（rustyline）を REPL の入力源として包む
// 意図: 履歴と補完の正本はセッション側に置き、編集器には読み取り時点の写しを渡す
// 関連ファイル: src/repl/cmd.rs, src/complete.rs, src/history.rs
use std::collections::BTreeSet;
use std::io;

use rustyline::completion::{Completer as RlCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, EditMode, Editor, Helper};

use crate::complete::Completer;
use crate::history::HistoryLog;

use super::cmd::LineSource;

/// 行入力が返す 3 種類の結果を表す列挙体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    Line(String),
    Eof,
    Interrupted,
}

/// 1 行読み取る間だけ入力源へ貸し出すセッション状態。
pub struct LineContext<'a> {
    pub history: &'a HistoryLog,
    pub completer: Completer<'a>,
}

/// 補完対象の語の開始位置（空白区切りのみ。`@` や `.` は語の一部）。
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(char::is_whitespace)
        .map_or(0, |i| i + 1)
}

/// カーソル位置の語に一致する候補を返す。
fn complete_word(candidates: &BTreeSet<String>, line: &str, pos: usize) -> (usize, Vec<Pair>) {
    let start = word_start(line, pos);
    let prefix = &line[start..pos];
    let pairs = candidates
        .iter()
        .filter(|w| w.starts_with(prefix))
        .map(|w| Pair {
            display: w.clone(),
            replacement: w.clone(),
        })
        .collect();
    (start, pairs)
}

/// 読み取り開始時点の候補集合を保持する rustyline 用ヘルパ。
#[derive(Default)]
struct ReplHelper {
    candidates: BTreeSet<String>,
}

impl RlCompleter for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        Ok(complete_word(&self.candidates, line, pos))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}

/// 履歴付きの行編集を提供するラインエディタ。
pub struct LineEditor {
    editor: Editor<ReplHelper, DefaultHistory>,
}

impl LineEditor {
    pub fn new() -> io::Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();
        let mut editor = Editor::with_config(config).map_err(into_io)?;
        editor.set_helper(Some(ReplHelper::default()));
        Ok(Self { editor })
    }

    /// セッションの履歴と補完候補を編集器へ写す。
    fn sync(&mut self, ctx: &LineContext<'_>) -> Result<(), ReadlineError> {
        if let Some(helper) = self.editor.helper_mut() {
            helper.candidates = ctx.completer.candidates();
        }
        self.editor.clear_history()?;
        for entry in ctx.history.iter() {
            self.editor.add_history_entry(entry)?;
        }
        Ok(())
    }
}

impl LineSource for LineEditor {
    fn read_line(&mut self, prompt: &str, ctx: &LineContext<'_>) -> io::Result<ReadResult> {
        self.sync(ctx).map_err(into_io)?;
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(err) => Err(into_io(err)),
        }
    }
}

fn into_io(err: ReadlineError) -> io::Error {
    match err {
        ReadlineError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}
