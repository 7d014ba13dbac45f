// パス: src/repl/loader.rs
// 役割: バッチファイルを 1 行ずつ REPL の行処理へ流し込む
// 意図: 対話入力と同じ経路で実行し、失敗は行番号付きで集めて残りの行を続行する
// 関連ファイル: src/repl/pipeline.rs, src/repl/commands.rs, src/errors.rs
//! バッチファイルのロード処理

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::{LineError, ReplError, ReplResult};

use super::cmd::ReplSession;
use super::commands::Flow;

/// ローダが使うファイル読み出しの抽象。
pub trait ReplIo {
    fn read_to_string(&self, path: &Path) -> ReplResult<String>;
}

/// ファイルシステムを直接読む既定実装。
#[derive(Debug, Default, Clone, Copy)]
pub struct FsIo;

impl ReplIo for FsIo {
    fn read_to_string(&self, path: &Path) -> ReplResult<String> {
        fs::read_to_string(path).map_err(|e| ReplError::open_failure(path, e))
    }
}

/// 1 ファイル分の実行結果。
#[derive(Debug)]
pub struct LoadReport {
    pub path: PathBuf,
    /// 成功した行数（空行とコメントは数えない）。
    pub executed: usize,
    pub errors: Vec<LineError>,
    /// ファイル中の `.exit` などでセッション終了が要求されたか。
    pub exit_requested: bool,
}

impl LoadReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            executed: 0,
            errors: Vec::new(),
            exit_requested: false,
        }
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loaded {} line(s) from {}",
            self.executed,
            self.path.display()
        )?;
        if !self.errors.is_empty() {
            write!(f, ", {} error(s)", self.errors.len())?;
        }
        Ok(())
    }
}

/// 循環検出用にパスを正規化する（解決できなければそのまま使う）。
fn load_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl ReplSession {
    /// ファイルの各行を実行する。
    ///
    /// ファイル自体が読めない場合や読み込み中のファイルを再度読もうとした場合のみ `Err`。
    /// 行ごとの失敗は `LoadReport::errors` に集める。`echo_errors` が真なら失敗行と集計も表示する。
    pub fn load_file(&mut self, path: &Path, echo_errors: bool) -> ReplResult<LoadReport> {
        let key = load_key(path);
        if self.loading.iter().any(|(active, _)| *active == key) {
            return Err(ReplError::RecursiveLoad(path.to_path_buf()));
        }
        let source = self.io.read_to_string(path)?;
        self.loading.push((key, echo_errors));
        let report = self.run_source(path, &source, echo_errors);
        self.loading.pop();
        let report = report?;
        info!(
            path = %path.display(),
            executed = report.executed,
            errors = report.errors.len(),
            "batch file loaded"
        );
        if echo_errors {
            writeln!(self.out, "{}", report)?;
        }
        Ok(report)
    }

    /// `load_file` を実行し、終了要求の有無だけを返す。
    ///
    /// 別のファイルの読み込み中に呼ばれた場合、行エラーは外側の報告へ引き継ぐ。
    pub fn run_file(&mut self, path: &Path, echo_errors: bool) -> ReplResult<Flow> {
        let report = self.load_file(path, echo_errors)?;
        if !self.loading.is_empty() {
            self.nested_errors.extend(report.errors);
        }
        Ok(if report.exit_requested {
            Flow::Exit
        } else {
            Flow::Continue
        })
    }

    /// メタコマンドから読み込む際のエラー表示設定。
    ///
    /// 対話入力からなら表示し、ファイル中の `.load` なら外側の設定を引き継ぐ。
    pub(crate) fn batch_echo(&self) -> bool {
        self.loading.last().map_or(true, |(_, echo)| *echo)
    }

    fn run_source(
        &mut self,
        path: &Path,
        source: &str,
        echo_errors: bool,
    ) -> ReplResult<LoadReport> {
        let mut report = LoadReport::new(path);
        for (idx, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let outcome = self.process_line(line);
            report.errors.append(&mut self.nested_errors);
            match outcome {
                Ok(Flow::Continue) => report.executed += 1,
                Ok(Flow::Exit) => {
                    report.executed += 1;
                    report.exit_requested = true;
                    break;
                }
                Err(error) => {
                    let failure = LineError {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        error,
                    };
                    warn!(error = %failure, "batch line failed");
                    if echo_errors {
                        writeln!(self.err, "Error in {}", failure)?;
                    }
                    report.errors.push(failure);
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadReport, ReplIo};
    use crate::config::ReplConfig;
    use crate::errors::{ReplError, ReplResult};
    use crate::interpreter::EchoInterpreter;
    use crate::repl::cmd::ReplSession;
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};

    /// メモリ上のファイル表。
    struct MemIo(HashMap<PathBuf, String>);

    impl ReplIo for MemIo {
        fn read_to_string(&self, path: &Path) -> ReplResult<String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| ReplError::FileNotFound(path.to_path_buf()))
        }
    }

    fn session(files: &[(&str, &str)]) -> ReplSession {
        let table = files
            .iter()
            .map(|(p, s)| (PathBuf::from(p), s.to_string()))
            .collect();
        ReplSession::new(ReplConfig::default(), EchoInterpreter)
            .with_output(io::sink(), io::sink())
            .with_io(MemIo(table))
    }

    #[test]
    /// コメント・空行を飛ばし、失敗行を物理行番号付きで集めることを確認する。
    fn collects_line_errors_and_continues() {
        let mut s = session(&[(
            "batch.txt",
            "# setup\n.alias @a = 1\n\nprint @a\n.alias junk\nprint 2\n",
        )]);
        let report = s.load_file(Path::new("batch.txt"), false).unwrap();
        assert_eq!(report.executed, 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].line, 5);
        assert!(matches!(report.errors[0].error, ReplError::MalformedAlias(_)));
        assert!(!report.exit_requested);
        assert_eq!(
            report.to_string(),
            "Loaded 3 line(s) from batch.txt, 1 error(s)"
        );
    }

    #[test]
    /// `.exit` で残りの行を実行せずに終了要求を返すことを確認する。
    fn exit_stops_the_file() {
        let mut s = session(&[("stop.txt", "one\n.exit\ntwo\n")]);
        let report = s.load_file(Path::new("stop.txt"), true).unwrap();
        assert!(report.exit_requested);
        assert_eq!(report.executed, 2);
        assert_eq!(s.history().iter().collect::<Vec<_>>(), vec!["one", ".exit"]);
    }

    #[test]
    /// 自分自身を読み込むファイルが循環として行エラーになることを検証する。
    fn recursive_load_is_rejected() {
        let mut s = session(&[("self.txt", ".load self.txt\nok\n")]);
        let report = s.load_file(Path::new("self.txt"), false).unwrap();
        assert_eq!(report.executed, 1);
        assert!(matches!(
            report.errors[0].error,
            ReplError::RecursiveLoad(ref p) if p == Path::new("self.txt")
        ));
        assert!(s.loading.is_empty());
    }

    #[test]
    /// 入れ子の読み込みが外側の表示設定を引き継ぎ、行エラーを外側へ合流させることを検証する。
    fn nested_load_inherits_echo_and_merges_errors() {
        let mut s = session(&[
            ("outer.txt", "first\n.load inner.txt\nlast\n"),
            ("inner.txt", "@missing\nfine\n"),
        ]);
        assert!(s.batch_echo());
        let report = s.load_file(Path::new("outer.txt"), false).unwrap();
        assert_eq!(report.executed, 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, PathBuf::from("inner.txt"));
        assert_eq!(report.errors[0].line, 1);
        assert!(s.nested_errors.is_empty());
    }

    #[test]
    /// 存在しないファイルはファイル単位のエラーになることを確認する。
    fn missing_file_is_an_error() {
        let mut s = session(&[]);
        assert!(matches!(
            s.load_file(Path::new("nope.txt"), true),
            Err(ReplError::FileNotFound(_))
        ));
    }

    #[test]
    /// 成功のみのレポートはエラー件数を表示しないことを確認する。
    fn summary_without_errors() {
        let report = LoadReport::new(Path::new("a.txt"));
        assert_eq!(report.to_string(), "Loaded 0 line(s) from a.txt");
    }
}
