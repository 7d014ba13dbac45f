// パス: src/repl/cmd.rs
// 役割: REPL セッション状態の保持と対話ループの駆動
// 意図: 入力取得・行処理・永続化を 1 つのセッションオブジェクトに閉じ込め、テストで差し替え可能にする
// 関連ファイル: src/repl/pipeline.rs, src/repl/commands.rs, src/repl/loader.rs, src/repl/line_editor.rs
//! REPL のセッション管理と対話ループ。
//!
//! セッションはプロンプト・ウェルカム文・インタプリタ・メタコマンド列・エイリアス・履歴・
//! 起動ファイルをまとめて所有する。グローバル状態は持たないため、テストでは複数の
//! セッションを同時に扱える。

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{info, warn};

use crate::alias::AliasStore;
use crate::complete::Completer;
use crate::config::ReplConfig;
use crate::errors::{LineError, ReplError, ReplResult};
use crate::history::HistoryLog;
use crate::interpreter::Interpreter;

use super::commands::{CommandSet, Flow, MetaCommand};
use super::line_editor::{LineContext, LineEditor, ReadResult};
use super::loader::{FsIo, ReplIo};

/// 対話ループへ 1 行ずつ入力を供給する相手（端末・スクリプトなど）。
pub trait LineSource {
    fn read_line(&mut self, prompt: &str, ctx: &LineContext<'_>) -> io::Result<ReadResult>;
}

/// REPL の全状態をまとめて保持するセッション。
pub struct ReplSession {
    prompt: String,
    welcome: String,
    aliases: AliasStore,
    history: HistoryLog,
    startup_file: Option<PathBuf>,
    history_file: Option<PathBuf>,
    alias_file: Option<PathBuf>,
    pub(crate) interpreter: Box<dyn Interpreter>,
    commands: CommandSet,
    pub(crate) io: Box<dyn ReplIo>,
    pub(crate) out: Box<dyn Write>,
    pub(crate) err: Box<dyn Write>,
    /// 読み込み中のファイルとそのエラー表示設定（入れ子の `.load` 用）。
    pub(crate) loading: Vec<(PathBuf, bool)>,
    /// 入れ子の読み込みで起きた行エラー。外側のファイルの報告へ合流させる。
    pub(crate) nested_errors: Vec<LineError>,
}

impl ReplSession {
    /// 構成とインタプリタからセッションを構築する（ファイルには触れない）。
    pub fn new(config: ReplConfig, interpreter: impl Interpreter + 'static) -> Self {
        Self {
            prompt: config.prompt,
            welcome: config.welcome,
            aliases: AliasStore::new(),
            history: HistoryLog::with_capacity(config.history_length),
            startup_file: config.startup_file,
            history_file: config.history_file,
            alias_file: config.alias_file,
            interpreter: Box::new(interpreter),
            commands: CommandSet::builtin(),
            io: Box::new(FsIo),
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
            loading: Vec::new(),
            nested_errors: Vec::new(),
        }
    }

    /// 出力先を差し替える。
    pub fn with_output(mut self, out: impl Write + 'static, err: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self.err = Box::new(err);
        self
    }

    /// バッチファイルの読み込み元を差し替える。
    pub fn with_io(mut self, io: impl ReplIo + 'static) -> Self {
        self.io = Box::new(io);
        self
    }

    /// メタコマンド列を丸ごと差し替える。
    pub fn with_commands(mut self, commands: CommandSet) -> Self {
        self.commands = commands;
        self
    }

    /// ホストのメタコマンドを組み込みより優先して登録する。
    pub fn add_command(&mut self, command: impl MetaCommand + 'static) {
        self.commands.insert_host(Rc::new(command));
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn welcome(&self) -> &str {
        &self.welcome
    }

    pub fn aliases(&self) -> &AliasStore {
        &self.aliases
    }

    pub fn aliases_mut(&mut self) -> &mut AliasStore {
        &mut self.aliases
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryLog {
        &mut self.history
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    pub fn startup_file(&self) -> Option<&Path> {
        self.startup_file.as_deref()
    }

    pub fn set_startup_file(&mut self, path: impl Into<PathBuf>) {
        self.startup_file = Some(path.into());
    }

    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    pub fn err(&mut self) -> &mut dyn Write {
        &mut *self.err
    }

    pub(crate) fn history_and_out(&mut self) -> (&HistoryLog, &mut dyn Write) {
        (&self.history, &mut *self.out)
    }

    pub(crate) fn aliases_and_out(&mut self) -> (&AliasStore, &mut dyn Write) {
        (&self.aliases, &mut *self.out)
    }

    /// 現在の状態から補完器を作る。
    pub fn completer(&self) -> Completer<'_> {
        Completer::new(&*self.interpreter, &self.commands, &self.aliases, &self.history)
    }

    /// 永続化された履歴とエイリアスを読み込む。存在しないファイルは警告のみ。
    pub fn open(&mut self) -> io::Result<()> {
        if let Some(path) = self.history_file.clone() {
            match self.history.load(&path) {
                Ok(()) => {}
                Err(ReplError::FileNotFound(_)) => {
                    warn!(path = %path.display(), "history file not found")
                }
                Err(e) => self.report(&e)?,
            }
        }
        if let Some(path) = self.alias_file.clone() {
            match self.aliases.load(&path) {
                Ok(failures) => {
                    for failure in failures {
                        writeln!(self.err, "Error in aliases file {}", failure)?;
                    }
                }
                Err(ReplError::FileNotFound(_)) => {
                    warn!(path = %path.display(), "aliases file not found")
                }
                Err(e) => self.report(&e)?,
            }
        }
        Ok(())
    }

    /// 起動ファイルがあれば実行する。行ごとのエラーは表示せず記録のみ。
    pub fn run_startup(&mut self) -> ReplResult<Flow> {
        match self.startup_file.clone() {
            Some(path) => self.run_file(&path, false),
            None => Ok(Flow::Continue),
        }
    }

    /// 履歴とエイリアスを保存する。失敗は報告するが中断はしない。
    pub fn persist(&mut self) {
        if let Some(path) = self.history_file.clone() {
            if let Err(e) = self.history.save(&path) {
                let _ = self.report(&e);
            }
        }
        if let Some(path) = self.alias_file.clone() {
            if let Err(e) = self.aliases.save(&path) {
                let _ = self.report(&e);
            }
        }
        let _ = self.out.flush();
    }

    /// エラーを利用者向けに表示する。
    pub fn report(&mut self, err: &ReplError) -> io::Result<()> {
        warn!(error = %err, "REPL command failed");
        writeln!(self.err, "Error: {}", err)?;
        self.err.flush()
    }

    /// 端末の行エディタで対話ループを実行する。
    pub fn run(&mut self) -> io::Result<()> {
        let mut editor = LineEditor::new()?;
        self.run_with(&mut editor)
    }

    /// 任意の入力源で対話ループを実行し、終了時（エラー時を含む）に状態を保存する。
    pub fn run_with(&mut self, source: &mut dyn LineSource) -> io::Result<()> {
        info!(prompt = %self.prompt, "REPL session started");
        let result = self.drive(source);
        self.persist();
        info!(history = self.history.len(), aliases = self.aliases.len(), "REPL session ended");
        result
    }

    fn drive(&mut self, source: &mut dyn LineSource) -> io::Result<()> {
        if !self.welcome.is_empty() {
            writeln!(self.out, "{}", self.welcome)?;
        }
        let mut interrupted = false;
        loop {
            self.out.flush()?;
            let read = {
                let ctx = LineContext {
                    history: &self.history,
                    completer: self.completer(),
                };
                source.read_line(&self.prompt, &ctx)
            };
            match read {
                Ok(ReadResult::Line(line)) => {
                    interrupted = false;
                    match self.process_line(&line) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Exit) => break,
                        Err(e) => self.report(&e)?,
                    }
                }
                // 2 回続けて割り込まれたら終了する。
                Ok(ReadResult::Interrupted) if interrupted => {
                    writeln!(self.out, "\nBye!")?;
                    break;
                }
                Ok(ReadResult::Interrupted) => {
                    interrupted = true;
                    writeln!(self.out, "\nUse .exit, .quit or Ctrl-D to leave.")?;
                }
                Ok(ReadResult::Eof) => {
                    writeln!(self.out, "\nBye!")?;
                    break;
                }
                Err(e) => {
                    writeln!(self.err, "input error: {}", e)?;
                    break;
                }
            }
        }
        self.out.flush()
    }
}
