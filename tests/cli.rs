use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("constitution-gpt").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: constitution-gpt <COMMAND>"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("--help"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_start_help() {
    let mut cmd = Command::cargo_bin("constitution-gpt").unwrap();
    cmd.arg("start")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: constitution-gpt start"))
        .stdout(predicate::str::contains("--host <HOST>"))
        .stdout(predicate::str::contains("--port <PORT>"))
        .stdout(predicate::str::contains("--templates <TEMPLATES>"))
        .stdout(predicate::str::contains("--reply-delay-ms <REPLY_DELAY_MS>"))
        .stdout(predicate::str::contains("--answer-timeout-ms <ANSWER_TIMEOUT_MS>"));
}

#[test]
fn test_cli_chat_help() {
    let mut cmd = Command::cargo_bin("constitution-gpt").unwrap();
    cmd.arg("chat")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: constitution-gpt chat"))
        .stdout(predicate::str::contains("--composer-columns <COMPOSER_COLUMNS>"));
}

#[test]
fn test_cli_no_command() {
    // clap exits with non-zero status when no command is given
    let mut cmd = Command::cargo_bin("constitution-gpt").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: constitution-gpt <COMMAND>"));
}

#[test]
fn test_cli_chat_answers_from_stdin() {
    let mut cmd = Command::cargo_bin("constitution-gpt").unwrap();
    cmd.args(["chat", "--reply-delay-ms", "0"])
        .write_stdin("How is the President elected?\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Try asking:"))
        .stdout(predicate::str::contains("Analyzing constitution..."))
        .stdout(predicate::str::contains(
            "This is a simulated response to: \"How is the President elected?\"",
        ));
}

#[test]
fn test_cli_chat_picks_suggestion_by_number() {
    let mut cmd = Command::cargo_bin("constitution-gpt").unwrap();
    cmd.args(["chat", "--reply-delay-ms", "0"])
        .write_stdin("2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("> What are the fundamental rights of citizens?"))
        .stdout(predicate::str::contains(
            "This is a simulated response to: \"What are the fundamental rights of citizens?\"",
        ));
}
