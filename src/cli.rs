// パス: src/cli.rs
// 役割: コマンドライン引数の解釈と REPL の起動手順
// 意図: ホストはインタプリタを渡すだけで、既定の CLI 付き REPL を得られるようにする
// 関連ファイル: src/bin/replkit.rs, src/config.rs, src/logging.rs, src/repl/cmd.rs
//! CLI エントリポイント。

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use crate::config::{
    default_alias_path, default_history_path, default_log_path, ReplConfig, DEFAULT_PROMPT,
    DEFAULT_WELCOME,
};
use crate::history::DEFAULT_HISTORY_LENGTH;
use crate::interpreter::Interpreter;
use crate::logging;
use crate::repl::util::expand_user;
use crate::repl::{Flow, ReplSession};

/// 汎用 REPL の引数。
#[derive(Parser, Debug, Clone)]
#[command(name = "replkit", version, about = "Generic REPL with history, aliases and batch files")]
pub struct Args {
    /// Prompt text
    #[arg(long, default_value = DEFAULT_PROMPT)]
    pub prompt: String,
    /// Welcome message
    #[arg(long, default_value = DEFAULT_WELCOME)]
    pub hello: String,
    /// Path to the history file
    #[arg(long, value_name = "PATH")]
    pub history: Option<String>,
    /// Path to the aliases file
    #[arg(long, value_name = "PATH")]
    pub alias: Option<String>,
    /// Path to the log file
    #[arg(long, value_name = "PATH")]
    pub log: Option<String>,
    /// Logging level (DEBUG, INFO, WARNING...)
    #[arg(long, default_value = "debug")]
    pub loglevel: String,
    /// Command to execute before entering the REPL
    #[arg(long, value_name = "LINE")]
    pub run: Option<String>,
    /// File containing commands to execute at startup
    #[arg(long, value_name = "PATH")]
    pub file: Option<String>,
    /// Maximum number of history entries kept
    #[arg(long, default_value_t = DEFAULT_HISTORY_LENGTH)]
    pub history_length: usize,
}

impl Args {
    /// 引数からセッション構成を組み立てる（`~` は展開する）。
    pub fn config(&self) -> ReplConfig {
        ReplConfig {
            prompt: self.prompt.clone(),
            welcome: self.hello.clone(),
            history_file: path_or(self.history.as_deref(), default_history_path),
            alias_file: path_or(self.alias.as_deref(), default_alias_path),
            history_length: self.history_length,
            startup_file: self.file.as_deref().map(expand_user),
        }
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        path_or(self.log.as_deref(), default_log_path)
    }
}

fn path_or(arg: Option<&str>, fallback: fn() -> Option<PathBuf>) -> Option<PathBuf> {
    arg.map(expand_user).or_else(fallback)
}

/// 対話ループに入る前の準備を行う。
///
/// 履歴とエイリアスを読み込み、起動ファイル、`--run` の 1 行の順に実行する。
/// どちらかが終了を要求した場合は `Flow::Exit` を返す。
pub fn bootstrap(session: &mut ReplSession, run: Option<&str>) -> io::Result<Flow> {
    session.open()?;
    match session.run_startup() {
        Ok(Flow::Exit) => return Ok(Flow::Exit),
        Ok(Flow::Continue) => {}
        Err(e) => session.report(&e)?,
    }
    if let Some(line) = run {
        match session.process_line(line) {
            Ok(Flow::Exit) => return Ok(Flow::Exit),
            Ok(Flow::Continue) => {}
            Err(e) => session.report(&e)?,
        }
    }
    Ok(Flow::Continue)
}

/// 引数を解釈し、`interpreter` を使って REPL を最後まで実行する。
pub fn repl<I, T>(interpreter: I, argv: impl IntoIterator<Item = T>) -> ExitCode
where
    I: Interpreter + 'static,
    T: Into<OsString> + Clone,
{
    let args = match Args::try_parse_from(argv) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    if let Some(path) = args.log_path() {
        if let Err(e) = logging::init(&path, &args.loglevel) {
            eprintln!("warning: {}", e);
        }
    }
    info!(?args, "starting replkit");

    let mut session = ReplSession::new(args.config(), interpreter);
    let outcome = match bootstrap(&mut session, args.run.as_deref()) {
        Ok(Flow::Exit) => {
            session.persist();
            Ok(())
        }
        Ok(Flow::Continue) => session.run(),
        Err(e) => {
            session.persist();
            Err(e)
        }
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
