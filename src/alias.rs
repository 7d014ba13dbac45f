// パス: src/alias.rs
// 役割: エイリアス名と展開テキストの対応を保持し、ファイルへ永続化する
// 意図: 定義・削除・列挙・保存を 1 か所に集約し、名前の検証規則を統一する
// 関連ファイル: src/expand.rs, src/repl/commands.rs, src/repl/cmd.rs
//! エイリアスストア。
//!
//! 名前はシジル `@` を含まない形で保持する（`@x` の定義は `x` として格納）。
//! 検索はハッシュで、一覧表示は定義順で行う。保存は名前順で決定的に書き出す。

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::{LineError, ReplError, ReplResult};
use crate::expand::expand;

/// エイリアス参照の前置記号。
pub const SIGIL: char = '@';

/// 単一のエイリアス定義。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub expansion: String,
}

/// `^[A-Za-z_][A-Za-z0-9_]*$` を満たすかを判定する。
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `@name = expr` 形式の本体を名前と式へ分解する。
///
/// 名前はシジル必須、式は前後の空白を除いたもの。式が空かどうかの検査は
/// [`AliasStore::define`] に任せる。
pub fn parse_definition(body: &str) -> ReplResult<(String, String)> {
    let Some((lhs, rhs)) = body.split_once('=') else {
        return Err(ReplError::MalformedAlias(body.trim().to_string()));
    };
    let lhs = lhs.trim();
    let name = lhs
        .strip_prefix(SIGIL)
        .filter(|n| is_valid_name(n))
        .ok_or_else(|| ReplError::InvalidAliasName(lhs.to_string()))?;
    Ok((name.to_string(), rhs.trim().to_string()))
}

/// セッションが排他的に所有するエイリアスの集合。
#[derive(Debug, Clone, Default)]
pub struct AliasStore {
    entries: Vec<Alias>,
    index: HashMap<String, usize>,
}

impl AliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// エイリアスを定義（または再定義）し、直前の展開テキストを返す。
    pub fn define(&mut self, name: &str, expansion: &str) -> ReplResult<Option<String>> {
        if !is_valid_name(name) {
            return Err(ReplError::InvalidAliasName(name.to_string()));
        }
        let expansion = expansion.trim();
        if expansion.is_empty() {
            return Err(ReplError::EmptyExpansion(name.to_string()));
        }
        if let Some(&idx) = self.index.get(name) {
            let previous = std::mem::replace(&mut self.entries[idx].expansion, expansion.to_string());
            return Ok(Some(previous));
        }
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(Alias {
            name: name.to_string(),
            expansion: expansion.to_string(),
        });
        Ok(None)
    }

    /// 定義を削除し、存在していたかどうかを返す。
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(idx) = self.index.remove(name) else {
            return false;
        };
        self.entries.remove(idx);
        // 後続要素の位置を詰め直す。
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&idx| self.entries[idx].expansion.as_str())
    }

    /// 定義順に `(name, expansion)` を列挙する。
    pub fn list(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|a| (a.name.as_str(), a.expansion.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 永続化されたテキストを取り込み、行ごとの失敗を返す。
    ///
    /// `@name = expr` 行の式は書かれたとおりに登録する（保存内容をそのまま復元する）。
    /// 旧形式の `.alias @name = expr` 行だけは、対話入力と同じく取り込み済みの
    /// エイリアスで展開してから登録する。
    pub fn load_str(&mut self, src: &str, origin: &Path) -> Vec<LineError> {
        let mut failures = Vec::new();
        for (idx, raw) in src.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let outcome = match line.strip_prefix(".alias") {
                Some(body) => parse_definition(body).and_then(|(name, expr)| {
                    let expanded = expand(&expr, self)?;
                    self.define(&name, &expanded)
                }),
                None => parse_definition(line).and_then(|(name, expr)| self.define(&name, &expr)),
            };
            if let Err(error) = outcome {
                warn!(path = %origin.display(), line = idx + 1, %error, "skipping alias definition");
                failures.push(LineError {
                    path: origin.to_path_buf(),
                    line: idx + 1,
                    error,
                });
            }
        }
        failures
    }

    /// ファイルからエイリアスを読み込む。開けない場合のみ全体が失敗する。
    pub fn load(&mut self, path: &Path) -> ReplResult<Vec<LineError>> {
        let src = fs::read_to_string(path).map_err(|e| ReplError::open_failure(path, e))?;
        let failures = self.load_str(&src, path);
        info!(path = %path.display(), count = self.len(), "loaded aliases file");
        Ok(failures)
    }

    /// 名前順の `@name = expr` 行として書き出す。
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let mut sorted: Vec<&Alias> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        for alias in sorted {
            writeln!(out, "{}{} = {}", SIGIL, alias.name, alias.expansion)?;
        }
        Ok(())
    }

    /// 同じディレクトリの一時ファイルへ書いてから置き換える。
    pub fn save(&self, path: &Path) -> ReplResult<()> {
        persist_atomically(path, |out| self.write_to(out))?;
        info!(path = %path.display(), count = self.len(), "saved aliases");
        Ok(())
    }
}

/// 一時ファイルへの書き込みが完了してから目的のパスへ差し替える。
/// 途中で失敗した場合、一時ファイルはドロップ時に削除される。
pub(crate) fn persist_atomically<F>(path: &Path, write: F) -> ReplResult<()>
where
    F: FnOnce(&mut BufWriter<&fs::File>) -> std::io::Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir)?;
    let tmp = tempfile::NamedTempFile::new_in(&dir)?;
    {
        let mut out = BufWriter::new(tmp.as_file());
        write(&mut out)?;
        out.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ReplError::Io(e.error))?;
    debug!(path = %path.display(), "persisted file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{is_valid_name, parse_definition, AliasStore};
    use crate::errors::ReplError;
    use std::path::Path;

    #[test]
    /// 識別子規則に沿った名前だけが受理されることを確認する。
    fn name_grammar() {
        for ok in ["x", "_x", "and", "A1", "snake_case_9"] {
            assert!(is_valid_name(ok), "{ok}");
        }
        for bad in ["", "1x", "a-b", "@x", "a b", "é"] {
            assert!(!is_valid_name(bad), "{bad}");
        }
    }

    #[test]
    /// 定義文の分解が空白やシジル欠落に対して期待通り振る舞うか検証する。
    fn parse_definition_forms() {
        assert_eq!(
            parse_definition(" @x = a or b ").unwrap(),
            ("x".to_string(), "a or b".to_string())
        );
        assert_eq!(
            parse_definition("@y=1=1").unwrap(),
            ("y".to_string(), "1=1".to_string())
        );
        assert!(matches!(
            parse_definition("x = 1"),
            Err(ReplError::InvalidAliasName(n)) if n == "x"
        ));
        assert!(matches!(
            parse_definition("@1x = 1"),
            Err(ReplError::InvalidAliasName(_))
        ));
        assert!(matches!(
            parse_definition("@x"),
            Err(ReplError::MalformedAlias(_))
        ));
    }

    #[test]
    /// 再定義が直前の値を返し、定義順が保たれることを確認する。
    fn define_replace_and_order() {
        let mut store = AliasStore::new();
        assert_eq!(store.define("b", "B").unwrap(), None);
        assert_eq!(store.define("a", "A").unwrap(), None);
        assert_eq!(store.define("b", "B2").unwrap(), Some("B".to_string()));
        let listed: Vec<_> = store.list().collect();
        assert_eq!(listed, vec![("b", "B2"), ("a", "A")]);
    }

    #[test]
    /// 空の式と不正な名前が拒否されることを確かめる。
    fn define_rejects_bad_input() {
        let mut store = AliasStore::new();
        assert!(matches!(
            store.define("x", "   "),
            Err(ReplError::EmptyExpansion(n)) if n == "x"
        ));
        assert!(matches!(
            store.define("9", "v"),
            Err(ReplError::InvalidAliasName(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    /// 削除後も残りの要素の検索が壊れないことを検証する。
    fn remove_keeps_index_consistent() {
        let mut store = AliasStore::new();
        store.define("a", "1").unwrap();
        store.define("b", "2").unwrap();
        store.define("c", "3").unwrap();
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert_eq!(store.get("b"), Some("2"));
        assert_eq!(store.get("c"), Some("3"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    /// 読み込みが不正行だけを飛ばし、旧形式の行だけを展開することを確認する。
    fn load_str_skips_bad_lines_and_expands_legacy_lines() {
        let src = "# comment\n\n@t = True\n.alias @nt = not @t\nbogus line\n@u = @missing\n.alias @v = @missing\n";
        let mut store = AliasStore::new();
        let failures = store.load_str(src, Path::new("aliases"));
        assert_eq!(store.get("t"), Some("True"));
        assert_eq!(store.get("nt"), Some("not True"));
        assert_eq!(store.get("u"), Some("@missing"));
        assert_eq!(store.get("v"), None);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].line, 5);
        assert_eq!(failures[1].line, 7);
        assert!(matches!(failures[1].error, ReplError::UnknownAlias(ref n) if n == "missing"));
    }

    #[test]
    /// 書き出しが名前順の `@name = expr` 形式になることを確認する。
    fn write_to_is_sorted() {
        let mut store = AliasStore::new();
        store.define("z", "last").unwrap();
        store.define("a", "first").unwrap();
        let mut buf = Vec::new();
        store.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "@a = first\n@z = last\n");
    }
}
