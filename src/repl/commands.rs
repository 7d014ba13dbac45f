// パス: src/repl/commands.rs
// 役割: メタコマンドの能力契約・組み込みコマンド・ディスパッチ順序を定義する
// 意図: 述語と動作の組を順序付きリストで持ち、最初に一致したものだけを実行する
// 関連ファイル: src/repl/cmd.rs, src/repl/pipeline.rs, src/repl/printer.rs, src/repl/loader.rs
//! メタコマンド（`.exit`, `.help`, `.load` など）。
//!
//! ホストが追加したコマンドは組み込みより先に照合される。そのため組み込みと同じ名前で
//! 登録すれば上書きできる。

use std::fmt;
use std::io::Write;
use std::rc::Rc;

use tracing::debug;

use crate::alias::{is_valid_name, parse_definition, SIGIL};
use crate::errors::{ReplError, ReplResult};
use crate::expand::expand;

use super::cmd::ReplSession;
use super::printer::{render_help, write_aliases, write_history, CLEAR_SCREEN};
use super::util::{command_args, expand_user};

/// コマンド実行後にループを続けるかどうか。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// メタコマンドの能力契約。
pub trait MetaCommand {
    /// ヘルプに表示する書式（例: `.load <file>`）。
    fn usage(&self) -> &str;
    fn description(&self) -> &str;
    /// 補完に使うコマンド名。
    fn names(&self) -> Vec<&str>;
    fn matches(&self, line: &str) -> bool;
    fn execute(&self, line: &str, session: &mut ReplSession) -> ReplResult<Flow>;
}

/// 照合順序を保ったメタコマンドの列。
#[derive(Clone, Default)]
pub struct CommandSet {
    commands: Vec<Rc<dyn MetaCommand>>,
    host_len: usize,
}

impl fmt::Debug for CommandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.commands.iter().map(|c| c.usage().to_string()))
            .finish()
    }
}

impl CommandSet {
    /// 空のリスト（組み込みなし）。
    pub fn empty() -> Self {
        Self::default()
    }

    /// 組み込みコマンドを既定の順序で並べる。
    pub fn builtin() -> Self {
        Self::from_commands(vec![
            Rc::new(ExitCommand) as Rc<dyn MetaCommand>,
            Rc::new(HelpCommand),
            Rc::new(HistoryCommand),
            Rc::new(ClearCommand),
            Rc::new(ReloadCommand),
            Rc::new(LoadCommand),
            Rc::new(AliasCommand),
            Rc::new(UnaliasCommand),
        ])
    }

    /// 与えた順序そのままで照合するリストを作る。
    pub fn from_commands(commands: Vec<Rc<dyn MetaCommand>>) -> Self {
        Self {
            commands,
            host_len: 0,
        }
    }

    /// 末尾へ追加する（既存のどれにも一致しない行だけを受け取る）。
    pub fn push(&mut self, command: Rc<dyn MetaCommand>) {
        self.commands.push(command);
    }

    /// ホストのコマンドとして、組み込みより前・既存のホストコマンドより後に挿入する。
    pub fn insert_host(&mut self, command: Rc<dyn MetaCommand>) {
        self.commands.insert(self.host_len, command);
        self.host_len += 1;
    }

    /// 最初に一致したコマンドを返す。
    pub fn find(&self, line: &str) -> Option<Rc<dyn MetaCommand>> {
        self.commands.iter().find(|c| c.matches(line)).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn MetaCommand> {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().flat_map(|c| c.names()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// クロージャで動作を与えるホスト向けコマンド。
///
/// `name` 単独、または `name` の後に空白と引数が続く行に一致し、ハンドラには引数部分が渡る。
pub struct FnCommand<F> {
    name: String,
    usage: String,
    description: String,
    handler: F,
}

impl<F> FnCommand<F>
where
    F: Fn(&str, &mut ReplSession) -> ReplResult<Flow>,
{
    pub fn new(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self {
        let name = name.into();
        Self {
            usage: name.clone(),
            name,
            description: description.into(),
            handler,
        }
    }

    /// ヘルプ上の書式を差し替える。
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }
}

impl<F> MetaCommand for FnCommand<F>
where
    F: Fn(&str, &mut ReplSession) -> ReplResult<Flow>,
{
    fn usage(&self) -> &str {
        &self.usage
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn names(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn matches(&self, line: &str) -> bool {
        command_args(line, &self.name).is_some()
    }

    fn execute(&self, line: &str, session: &mut ReplSession) -> ReplResult<Flow> {
        let args = command_args(line, &self.name).unwrap_or_default();
        (self.handler)(args, session)
    }
}

struct ExitCommand;

impl MetaCommand for ExitCommand {
    fn usage(&self) -> &str {
        ".exit, .quit"
    }

    fn description(&self) -> &str {
        "Exit the REPL"
    }

    fn names(&self) -> Vec<&str> {
        vec![".exit", ".quit"]
    }

    fn matches(&self, line: &str) -> bool {
        matches!(line, ".exit" | ".quit")
    }

    fn execute(&self, _line: &str, session: &mut ReplSession) -> ReplResult<Flow> {
        writeln!(session.out(), "Bye!")?;
        Ok(Flow::Exit)
    }
}

struct HelpCommand;

impl MetaCommand for HelpCommand {
    fn usage(&self) -> &str {
        ".help"
    }

    fn description(&self) -> &str {
        "Show this help message"
    }

    fn names(&self) -> Vec<&str> {
        vec![".help"]
    }

    fn matches(&self, line: &str) -> bool {
        line == ".help"
    }

    fn execute(&self, _line: &str, session: &mut ReplSession) -> ReplResult<Flow> {
        let commands = session.commands().clone();
        render_help(session.out(), &commands)?;
        Ok(Flow::Continue)
    }
}

struct HistoryCommand;

impl MetaCommand for HistoryCommand {
    fn usage(&self) -> &str {
        ".history"
    }

    fn description(&self) -> &str {
        "Show command history"
    }

    fn names(&self) -> Vec<&str> {
        vec![".history"]
    }

    fn matches(&self, line: &str) -> bool {
        line == ".history"
    }

    fn execute(&self, _line: &str, session: &mut ReplSession) -> ReplResult<Flow> {
        let (history, out) = session.history_and_out();
        write_history(out, history)?;
        Ok(Flow::Continue)
    }
}

struct ClearCommand;

impl MetaCommand for ClearCommand {
    fn usage(&self) -> &str {
        ".clear"
    }

    fn description(&self) -> &str {
        "Clear the screen"
    }

    fn names(&self) -> Vec<&str> {
        vec![".clear"]
    }

    fn matches(&self, line: &str) -> bool {
        line == ".clear"
    }

    fn execute(&self, _line: &str, session: &mut ReplSession) -> ReplResult<Flow> {
        let out = session.out();
        out.write_all(CLEAR_SCREEN.as_bytes())?;
        out.flush()?;
        Ok(Flow::Continue)
    }
}

struct ReloadCommand;

impl MetaCommand for ReloadCommand {
    fn usage(&self) -> &str {
        ".reload"
    }

    fn description(&self) -> &str {
        "Reload the startup file"
    }

    fn names(&self) -> Vec<&str> {
        vec![".reload"]
    }

    fn matches(&self, line: &str) -> bool {
        line == ".reload"
    }

    fn execute(&self, _line: &str, session: &mut ReplSession) -> ReplResult<Flow> {
        let path = session
            .startup_file()
            .map(|p| p.to_path_buf())
            .ok_or(ReplError::NoStartupFile)?;
        let echo = session.batch_echo();
        session.run_file(&path, echo)
    }
}

struct LoadCommand;

impl MetaCommand for LoadCommand {
    fn usage(&self) -> &str {
        ".load <file>"
    }

    fn description(&self) -> &str {
        "Load a batch file"
    }

    fn names(&self) -> Vec<&str> {
        vec![".load"]
    }

    fn matches(&self, line: &str) -> bool {
        command_args(line, ".load").is_some()
    }

    fn execute(&self, line: &str, session: &mut ReplSession) -> ReplResult<Flow> {
        let arg = command_args(line, ".load").unwrap_or_default();
        if arg.is_empty() {
            return Err(ReplError::Usage(".load <file>"));
        }
        let echo = session.batch_echo();
        session.run_file(&expand_user(arg), echo)
    }
}

struct AliasCommand;

impl MetaCommand for AliasCommand {
    fn usage(&self) -> &str {
        ".alias [@name = expr]"
    }

    fn description(&self) -> &str {
        "Define or list aliases"
    }

    fn names(&self) -> Vec<&str> {
        vec![".alias"]
    }

    fn matches(&self, line: &str) -> bool {
        command_args(line, ".alias").is_some()
    }

    fn execute(&self, line: &str, session: &mut ReplSession) -> ReplResult<Flow> {
        let body = command_args(line, ".alias").unwrap_or_default();
        if body.is_empty() {
            let (aliases, out) = session.aliases_and_out();
            write_aliases(out, aliases)?;
            return Ok(Flow::Continue);
        }
        if !body.contains('=') {
            return show_single(body, session);
        }
        let (name, expr) = parse_definition(body)?;
        // 本体は定義時点のストアで 1 段だけ展開してから格納する。
        let expanded = expand(&expr, session.aliases())?;
        match session.aliases_mut().define(&name, &expanded)? {
            Some(previous) => writeln!(
                session.out(),
                "Alias '{}{}' replaced (was: {}) -> now: {}",
                SIGIL,
                name,
                previous,
                expanded
            )?,
            None => writeln!(session.out(), "Alias added: {}{} = {}", SIGIL, name, expanded)?,
        }
        debug!(alias = %name, expansion = %expanded, "alias defined");
        Ok(Flow::Continue)
    }
}

/// `.alias @name` で単一の定義を表示する。
fn show_single(arg: &str, session: &mut ReplSession) -> ReplResult<Flow> {
    let name = arg
        .strip_prefix(SIGIL)
        .filter(|n| is_valid_name(n))
        .ok_or_else(|| ReplError::MalformedAlias(arg.to_string()))?;
    match session.aliases().get(name).map(str::to_string) {
        Some(expansion) => writeln!(session.out(), "{}{} = {}", SIGIL, name, expansion)?,
        None => writeln!(session.out(), "No such alias: {}{}", SIGIL, name)?,
    }
    Ok(Flow::Continue)
}

struct UnaliasCommand;

impl MetaCommand for UnaliasCommand {
    fn usage(&self) -> &str {
        ".unalias @name"
    }

    fn description(&self) -> &str {
        "Remove an alias"
    }

    fn names(&self) -> Vec<&str> {
        vec![".unalias"]
    }

    fn matches(&self, line: &str) -> bool {
        command_args(line, ".unalias").is_some()
    }

    fn execute(&self, line: &str, session: &mut ReplSession) -> ReplResult<Flow> {
        let arg = command_args(line, ".unalias").unwrap_or_default();
        if arg.is_empty() {
            return Err(ReplError::Usage(".unalias @name"));
        }
        let name = arg.strip_prefix(SIGIL).unwrap_or(arg);
        if session.aliases_mut().remove(name) {
            writeln!(session.out(), "Alias removed: {}{}", SIGIL, name)?;
        } else {
            writeln!(session.out(), "No such alias: {}{}", SIGIL, name)?;
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandSet, ExitCommand, Flow, FnCommand, HelpCommand, MetaCommand};
    use std::rc::Rc;

    #[test]
    /// 組み込みコマンドの照合が完全一致・引数付きを正しく区別するか確認する。
    fn builtin_matching_rules() {
        let set = CommandSet::builtin();
        let usage_of = |line: &str| set.find(line).map(|c| c.usage().to_string());
        assert_eq!(usage_of(".exit").as_deref(), Some(".exit, .quit"));
        assert_eq!(usage_of(".quit").as_deref(), Some(".exit, .quit"));
        assert_eq!(usage_of(".load a.txt").as_deref(), Some(".load <file>"));
        assert_eq!(usage_of(".load").as_deref(), Some(".load <file>"));
        assert_eq!(usage_of(".alias").as_deref(), Some(".alias [@name = expr]"));
        assert_eq!(usage_of(".alias @x = 1").as_deref(), Some(".alias [@name = expr]"));
        assert_eq!(usage_of(".unalias @x").as_deref(), Some(".unalias @name"));
        assert!(usage_of(".exit now").is_none());
        assert!(usage_of(".loader").is_none());
        assert!(usage_of(".aliases").is_none());
        assert!(usage_of(".foobar").is_none());
        assert!(usage_of("exit").is_none());
    }

    #[test]
    /// [.exit, .help, .alias] の順序でも定義行が .alias にだけ一致することを検証する。
    fn ordered_list_claims_exactly_one_strategy() {
        let set = CommandSet::builtin();
        let alias = set.find(".alias @x = y").unwrap();
        let custom = CommandSet::from_commands(vec![
            Rc::new(ExitCommand) as Rc<dyn MetaCommand>,
            Rc::new(HelpCommand),
            alias,
        ]);
        let claimed: Vec<_> = custom
            .iter()
            .filter(|c| c.matches(".alias @x = y"))
            .map(|c| c.usage().to_string())
            .collect();
        assert_eq!(claimed, vec![".alias [@name = expr]"]);
    }

    #[test]
    /// ホストコマンドが組み込みより前、登録順に並ぶことを確認する。
    fn host_commands_precede_builtins() {
        let mut set = CommandSet::builtin();
        set.insert_host(Rc::new(FnCommand::new(".help", "custom help", |_, _| {
            Ok(Flow::Continue)
        })));
        set.insert_host(Rc::new(FnCommand::new(".stats", "show stats", |_, _| {
            Ok(Flow::Continue)
        })));
        let usages: Vec<_> = set.iter().take(3).map(|c| c.description().to_string()).collect();
        assert_eq!(usages, vec!["custom help", "show stats", "Exit the REPL"]);
        assert_eq!(set.find(".help").unwrap().description(), "custom help");
        assert!(set.names().contains(&".stats"));
    }

    #[test]
    /// 末尾追加したコマンドは既存コマンドを上書きしないことを確認する。
    fn pushed_commands_do_not_override() {
        let mut set = CommandSet::builtin();
        set.push(Rc::new(FnCommand::new(".help", "late help", |_, _| {
            Ok(Flow::Continue)
        })));
        assert_eq!(set.find(".help").unwrap().description(), "Show this help message");
    }
}
