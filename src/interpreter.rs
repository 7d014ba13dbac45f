// パス: src/interpreter.rs
// 役割: ホストが差し込む行インタプリタの能力契約と既定実装
// 意図: 継承ではなくトレイトで eval / keywords の 2 能力だけを要求する
// 関連ファイル: src/repl/pipeline.rs, src/complete.rs, src/cli.rs
//! インタプリタの能力契約。

use std::collections::BTreeSet;
use std::io::Write;

use once_cell::sync::Lazy;

use crate::errors::InterpreterError;

/// REPL が評価を委譲する相手。
///
/// `eval` の出力先はセッションの標準出力で、エンジン側のメッセージと順序が揃う。
/// `keywords` は補完にのみ使われ、既定では空集合。
pub trait Interpreter {
    fn eval(&mut self, line: &str, out: &mut dyn Write) -> Result<(), InterpreterError>;

    fn keywords(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// クロージャもそのままインタプリタとして使える（キーワードなし）。
impl<F> Interpreter for F
where
    F: FnMut(&str, &mut dyn Write) -> Result<(), InterpreterError>,
{
    fn eval(&mut self, line: &str, out: &mut dyn Write) -> Result<(), InterpreterError> {
        self(line, out)
    }
}

static ECHO_KEYWORDS: Lazy<BTreeSet<String>> = Lazy::new(|| {
    ["print", "dup", "drop", "swap"]
        .into_iter()
        .map(String::from)
        .collect()
});

/// インタプリタが指定されなかったときに使う、入力をそのまま表示する実装。
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoInterpreter;

impl Interpreter for EchoInterpreter {
    fn eval(&mut self, line: &str, out: &mut dyn Write) -> Result<(), InterpreterError> {
        writeln!(out, "You typed: {}", line)?;
        Ok(())
    }

    fn keywords(&self) -> BTreeSet<String> {
        ECHO_KEYWORDS.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{EchoInterpreter, Interpreter};
    use crate::errors::InterpreterError;
    use std::io::Write;

    #[test]
    /// 既定インタプリタが入力を復唱し、固定のキーワードを持つことを確認する。
    fn echo_interpreter_repeats_input() {
        let mut interp = EchoInterpreter;
        let mut out = Vec::new();
        interp.eval("dup 1", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "You typed: dup 1\n");
        assert!(interp.keywords().contains("swap"));
        assert_eq!(interp.keywords().len(), 4);
    }

    #[test]
    /// クロージャがインタプリタとして振る舞い、キーワードは空になることを確認する。
    fn closures_are_interpreters() {
        let mut seen = Vec::new();
        {
            let mut interp = |line: &str, _out: &mut dyn Write| -> Result<(), InterpreterError> {
                seen.push(line.to_string());
                if line == "boom" {
                    return Err("exploded".into());
                }
                Ok(())
            };
            let mut sink = Vec::new();
            assert!(Interpreter::eval(&mut interp, "ok", &mut sink).is_ok());
            let err = Interpreter::eval(&mut interp, "boom", &mut sink).unwrap_err();
            assert_eq!(err.to_string(), "exploded");
            assert!(Interpreter::keywords(&interp).is_empty());
        }
        assert_eq!(seen, vec!["ok", "boom"]);
    }
}
