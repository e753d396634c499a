// ABOUTME: Ambient CLI (§10): runs a script file non-interactively, or falls
// into a line-at-a-time REPL evaluating bare expressions against one Engine.

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::process::ExitCode;
use wisp::config::{CliArgs, EngineConfig, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use wisp::{Engine, Script};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config = EngineConfig::from(&args);
    let engine = Engine::new(config);

    match &args.script {
        Some(path) => run_script(&engine, path),
        None => {
            run_repl(&engine);
            ExitCode::SUCCESS
        }
    }
}

/// Script mode: load and run one file, printing nothing on success (a
/// script communicates through `return`, not stdout) and the script error
/// to stderr on failure (§7's `errorlineno`/`errortext` contract).
fn run_script(engine: &Engine, path: &str) -> ExitCode {
    let src = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cannot read script file {path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let script = match Script::load(engine.config(), &src) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    match script.run(engine) {
        Ok(result) => {
            println!("{result}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// REPL mode: each line is evaluated as a bare expression against the same
/// `Engine`, so variable assignments carry over between lines the way a
/// script's top-level frame would.
fn run_repl(engine: &Engine) {
    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");

    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl: DefaultEditor = match DefaultEditor::with_config(rl_config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("failed to initialize REPL: {e}");
            return;
        }
    };

    let history_file = ".wisp_history";
    let _ = rl.load_history(history_file);

    loop {
        match rl.readline("wisp> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                let result = engine.eval(line);
                println!("=> {result}");
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\ngoodbye");
                break;
            }
            Err(e) => {
                eprintln!("error: {e}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
}
