// パス: tests/repl_loop.rs
// 役割: 対話ループ全体（挨拶・割り込み・EOF・永続化）を台本入力で検証する
// 意図: 端末なしでループの終了経路と保存処理を確認する
// 関連ファイル: src/repl/cmd.rs, src/cli.rs
#[path = "test_support.rs"]
mod support;

use std::fs;

use replkit::cli::bootstrap;
use replkit::repl::ReadResult;
use replkit::{Flow, ReplConfig};
use support::{Harness, RecordingInterpreter, ScriptedSource};

fn persistent(dir: &std::path::Path) -> ReplConfig {
    ReplConfig {
        history_file: Some(dir.join("history")),
        alias_file: Some(dir.join("aliases")),
        ..ReplConfig::default()
    }
}

#[test]
/// 挨拶・エラー表示・`.exit` による終了を一通り確認する。
fn loop_reports_errors_and_continues() {
    let mut h = Harness::new();
    let mut src = ScriptedSource::lines(&["", "@nope", "!9", "hello", ".exit", "never"]);
    h.session.run_with(&mut src).unwrap();
    assert_eq!(h.out.text(), "Welcome to the REPL!\n=> hello\nBye!\n");
    assert_eq!(
        h.err.text(),
        "Error: [ALS004] unknown alias: '@nope'\n\
         Error: [HIS001] no command at !9 (history has 1 entries; use !N with N >= 1)\n"
    );
    assert_eq!(h.interp.lines(), vec!["hello"]);
}

#[test]
/// 割り込みでは終了せず、EOF で保存してから終わることを確認する。
fn eof_flushes_history_and_aliases() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = Harness::with(persistent(dir.path()), RecordingInterpreter::default());
    let mut src = ScriptedSource::events(vec![
        ReadResult::Line(".alias @b = beta".into()),
        ReadResult::Interrupted,
        ReadResult::Line("say @b".into()),
        ReadResult::Eof,
    ]);
    h.session.run_with(&mut src).unwrap();
    assert!(h
        .out
        .text()
        .contains("\nUse .exit, .quit or Ctrl-D to leave.\n"));
    assert!(h.out.text().ends_with("\nBye!\n"));
    assert_eq!(
        fs::read_to_string(dir.path().join("history")).unwrap(),
        ".alias @b = beta\nsay beta\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("aliases")).unwrap(),
        "@b = beta\n"
    );
}

#[test]
/// 前回のセッションで保存した履歴とエイリアスが次のセッションで使えることを検証する。
fn state_survives_between_sessions() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut h = Harness::with(persistent(dir.path()), RecordingInterpreter::default());
        let mut src = ScriptedSource::lines(&[".alias @g = greet", "@g you", ".quit"]);
        h.session.run_with(&mut src).unwrap();
    }
    let mut h = Harness::with(persistent(dir.path()), RecordingInterpreter::default());
    h.session.open().unwrap();
    let mut src = ScriptedSource::lines(&["!2", "@g me"]);
    h.session.run_with(&mut src).unwrap();
    assert_eq!(h.interp.lines(), vec!["greet you", "greet me"]);
}

#[test]
/// 起動ファイル（エラー非表示）と `--run` の 1 行が対話前に実行されることを確認する。
fn bootstrap_runs_startup_file_then_run_line() {
    let dir = tempfile::tempdir().unwrap();
    let init = dir.path().join("init.txt");
    fs::write(&init, ".alias @v = value\nbad @missing\n").unwrap();
    let cfg = ReplConfig {
        startup_file: Some(init),
        ..ReplConfig::default()
    };
    let mut h = Harness::with(cfg, RecordingInterpreter::default());
    let flow = bootstrap(&mut h.session, Some("show @v")).unwrap();
    assert_eq!(flow, Flow::Continue);
    assert_eq!(h.interp.lines(), vec!["show value"]);
    assert!(h.err.text().is_empty());

    assert_eq!(bootstrap(&mut h.session, Some(".exit")).unwrap(), Flow::Exit);
}

#[test]
/// 読み取りごとに補完器が最新の状態を反映することを確認する。
fn completion_is_refreshed_per_read() {
    let mut h = Harness::new();
    let mut src = ScriptedSource::lines(&[".alias @zed = z", ".alias @zoo = o"]).completing("@z");
    h.session.run_with(&mut src).unwrap();
    assert_eq!(
        src.completions,
        vec![vec![], vec!["@zed".to_string()], vec!["@zed".into(), "@zoo".into()]]
    );
}

#[test]
/// 続けて 2 回割り込まれるとループが終了し、間に入力があれば数え直すことを確認する。
fn double_interrupt_ends_the_loop() {
    let mut h = Harness::new();
    let mut src = ScriptedSource::events(vec![
        ReadResult::Interrupted,
        ReadResult::Line("x".into()),
        ReadResult::Interrupted,
        ReadResult::Interrupted,
        ReadResult::Line("never".into()),
    ]);
    h.session.run_with(&mut src).unwrap();
    assert_eq!(h.interp.lines(), vec!["x"]);
    assert_eq!(h.out.text().matches("Use .exit, .quit or Ctrl-D").count(), 2);
    assert!(h.out.text().ends_with("\nBye!\n"));
}
