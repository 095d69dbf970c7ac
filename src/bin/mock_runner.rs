//! Mock native test runner for integration testing
//!
//! Implements the runner side of the wire protocol: list mode prints a
//! concatenation of test-tree documents, run mode prints a concatenation of
//! lifecycle events. Extra modes simulate the failure cases the adapter has
//! to survive (empty output, truncation, garbage, a hanging runner).

use std::io::Write;
use std::time::Duration;

use serde_json::{json, Value};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = args.first().map(String::as_str).unwrap_or("");

    match mode {
        "list" => list(),
        "empty-list" => {}
        "truncated-list" => print!(r#"{{"name":"Math","file":"math.c","#),
        "chatty-malformed-list" => chatty_malformed_list(),
        "run" => run(&args[1..]),
        "exit-code" => {
            let code = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(0);
            std::process::exit(code);
        }
        "hang" => hang(),
        "malformed-run" => malformed_run(),
        other => {
            eprintln!("mock_runner: unknown mode '{other}'");
            std::process::exit(64);
        }
    }
}

fn emit(value: &Value) {
    // No separator between values; flushed one at a time so chunk
    // boundaries land mid-stream for the reader
    print!("{value}");
    std::io::stdout().flush().ok();
}

fn list() {
    emit(&json!({
        "name": "Math",
        "file": "math.c",
        "line": 3,
        "children": [
            {"name": "t_add", "file": "math.c", "line": 5},
            {"name": "t_div", "file": "math.c", "line": 12},
        ],
    }));
    emit(&json!({"name": "t_alone", "file": "solo.c", "line": 2}));
}

/// Garbage followed by far more output than a pipe buffers; a reader that
/// stops consuming without killing this process waits on it forever
fn chatty_malformed_list() {
    print!("garbage");
    let filler = "x".repeat(8192);
    for _ in 0..256 {
        print!("{filler}");
    }
    std::io::stdout().flush().ok();
}

fn wants(ids: &[String], name: &str, suite: &str) -> bool {
    ids.is_empty() || ids.iter().any(|id| id == name || id == suite)
}

fn run(ids: &[String]) {
    let mut failed = 0;

    let in_suite: Vec<&str> = ["t_add", "t_div"]
        .into_iter()
        .filter(|name| wants(ids, name, "Math"))
        .collect();

    if !in_suite.is_empty() {
        emit(&json!({"hook": "SUITE_ENTER", "suiteName": "Math", "nb": in_suite.len()}));
        for name in &in_suite {
            let fail = i32::from(*name == "t_div");
            emit(&json!({"hook": "CASE_ENTER", "testName": name}));
            if fail != 0 {
                failed += 1;
                emit(&json!({
                    "hook": "FAILURE",
                    "file": "math.c",
                    "line": 14,
                    "type": "ASSERT",
                    "test": name,
                    "msg": "division by zero",
                }));
            }
            emit(&json!({"hook": "CASE_LEAVE", "testName": name, "fail": fail}));
        }
        emit(&json!({
            "hook": "SUITE_LEAVE",
            "suiteName": "Math",
            "nb": in_suite.len(),
            "fail": failed,
        }));
    }

    if wants(ids, "t_alone", "") {
        emit(&json!({"hook": "CASE_ENTER", "testName": "t_alone"}));
        emit(&json!({"hook": "CASE_LEAVE", "testName": "t_alone", "fail": 0}));
    }

    std::process::exit(if failed > 0 { 1 } else { 0 });
}

fn hang() {
    emit(&json!({"hook": "SUITE_ENTER", "suiteName": "Math", "nb": 2}));
    emit(&json!({"hook": "CASE_ENTER", "testName": "t_add"}));
    std::thread::sleep(Duration::from_secs(30));
}

fn malformed_run() {
    emit(&json!({"hook": "CASE_ENTER", "testName": "t_add"}));
    print!("this is not json");
    std::io::stdout().flush().ok();
    std::process::exit(1);
}
