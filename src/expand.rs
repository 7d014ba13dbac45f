// パス: src/expand.rs
// 役割: 入力行中の `@name` 参照をエイリアスストアの内容で置き換える
// 意図: 長い識別子の一部を誤って置換しない安全な字句分割を提供する
// 関連ファイル: src/alias.rs, src/repl/pipeline.rs, src/repl/commands.rs
//! エイリアス展開。
//!
//! - 参照は `@` に続く識別子文字の最長一致としてのみ認識する（`@and` は `@andromede` に一致しない）。
//! - 引用符で囲まれた区間（`"..."` / `'...'`）は不透明として扱う。
//! - 置換は元の行に対する 1 パスのみ。置換で持ち込まれたテキストは再展開しない。
//! - 未定義の参照が 1 つでもあれば、置換を一切行わずに失敗する。

use crate::alias::{is_valid_name, AliasStore, SIGIL};
use crate::errors::{ReplError, ReplResult};

/// 行内で見つかったエイリアス参照（バイト範囲はシジルを含む）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasRef<'a> {
    pub start: usize,
    pub end: usize,
    pub name: &'a str,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// 行を走査し、左から順にエイリアス参照を取り出す。
///
/// 識別子文字の連なりが ASCII の名前規則を満たさない場合（`@1x`, `@andré` など）は
/// 参照として扱わず、そのまま残す。
pub fn alias_refs(line: &str) -> Vec<AliasRef<'_>> {
    let mut refs = Vec::new();
    let mut pos = 0;
    while let Some(c) = line[pos..].chars().next() {
        match c {
            '"' | '\'' => {
                // 閉じ引用符が無ければ通常の文字として扱う。
                pos += match line[pos + 1..].find(c) {
                    Some(close) => close + 2,
                    None => 1,
                };
            }
            SIGIL => {
                let rest = &line[pos + 1..];
                let len = rest.find(|ch: char| !is_word_char(ch)).unwrap_or(rest.len());
                let word = &rest[..len];
                if is_valid_name(word) {
                    refs.push(AliasRef {
                        start: pos,
                        end: pos + 1 + len,
                        name: word,
                    });
                }
                pos += 1 + len;
            }
            _ => pos += c.len_utf8(),
        }
    }
    refs
}

/// 行内の全参照を展開した新しい文字列を返す。
///
/// # Examples
/// ```
/// use replkit::alias::AliasStore;
/// use replkit::expand::expand;
///
/// let mut store = AliasStore::new();
/// store.define("and", "&&").unwrap();
/// assert_eq!(expand("a @and b", &store).unwrap(), "a && b");
/// assert!(expand("@andromede", &store).is_err());
/// ```
pub fn expand(line: &str, store: &AliasStore) -> ReplResult<String> {
    let refs = alias_refs(line);
    if refs.is_empty() {
        return Ok(line.to_string());
    }
    // 副作用の前にすべて解決しておく。
    let resolved = refs
        .iter()
        .map(|r| {
            store
                .get(r.name)
                .map(|text| (r, text))
                .ok_or_else(|| ReplError::UnknownAlias(r.name.to_string()))
        })
        .collect::<ReplResult<Vec<_>>>()?;

    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for (r, text) in resolved {
        out.push_str(&line[cursor..r.start]);
        out.push_str(text);
        cursor = r.end;
    }
    out.push_str(&line[cursor..]);
    Ok(out)
}
