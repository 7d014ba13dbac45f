// パス: src/bin/replkit.rs
// 役割: Binary entrypoint that launches the REPL with the echo interpreter
// 意図: Offer a CLI executable for trying the engine without a host language
// 関連ファイル: src/cli.rs, src/interpreter.rs, src/lib.rs
use std::process::ExitCode;

use replkit::interpreter::EchoInterpreter;

fn main() -> ExitCode {
    replkit::cli::repl(EchoInterpreter, std::env::args_os())
}
