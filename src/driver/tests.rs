// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::cli::{DriverConfig, InputSpec};
use super::{parse_command, run_with_config, run_with_stdin, Command};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn config_for(dir: &Path, inputs: &[&str]) -> DriverConfig {
    DriverConfig {
        inputs: inputs
            .iter()
            .map(|name| InputSpec::File(dir.join(name)))
            .collect(),
        outfile: Some(dir.join("out.asm")),
        ..DriverConfig::default()
    }
}

fn output(dir: &Path) -> String {
    fs::read_to_string(dir.join("out.asm")).unwrap()
}

#[test]
fn parses_include_and_c_line() {
    assert_eq!(
        parse_command(b"  include \"lib.inc\"\n"),
        Some(Command::Include("lib.inc".to_string()))
    );
    assert_eq!(
        parse_command(b"INCLUDE 'x.asm'\n"),
        Some(Command::Include("x.asm".to_string()))
    );
    assert_eq!(parse_command(b"include lib.inc\n"), None);
    assert_eq!(parse_command(b"c_line 42\n"), Some(Command::CLine(42, None)));
    assert_eq!(
        parse_command(b"C_LINE 7, \"main.c\"\n"),
        Some(Command::CLine(7, Some("main.c".to_string())))
    );
    assert_eq!(parse_command(b"c_line x\n"), Some(Command::BadCLine));
    assert_eq!(parse_command(b"c_line 99999999999\n"), Some(Command::BadCLine));
    assert_eq!(parse_command(b"included\n"), None);
}

#[test]
fn writes_statements_to_outfile() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.asm"),
        "#define LOAD(r, v) ld r, v\nstart: LOAD(a, 1) : ret\nSIZE EQU 4\n",
    )
    .unwrap();

    let report = run_with_config(&config_for(dir.path(), &["main.asm"])).unwrap();
    assert!(!report.has_errors());
    assert_eq!(report.statements(), 3);
    assert_eq!(output(dir.path()), "start: ld a, 1 \n ret\ndefc SIZE = 4\n");
}

#[test]
fn follows_includes_through_search_path() {
    let dir = tempfile::tempdir().unwrap();
    let inc = dir.path().join("inc");
    fs::create_dir(&inc).unwrap();
    fs::write(inc.join("defs.inc"), "#define VAL 7\nnop\n").unwrap();
    fs::write(
        dir.path().join("main.asm"),
        "include \"defs.inc\"\nld a, VAL\n",
    )
    .unwrap();

    let mut config = config_for(dir.path(), &["main.asm"]);
    config.include_path = vec![inc];
    let report = run_with_config(&config).unwrap();
    assert!(!report.has_errors(), "{:?}", report.diagnostics());
    assert_eq!(output(dir.path()), "nop\nld a, 7\n");
}

#[test]
fn recursive_include_is_reported_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("main.asm");
    fs::write(
        &main,
        format!("nop\ninclude \"{}\"\nret\n", main.display()),
    )
    .unwrap();

    let report = run_with_config(&config_for(dir.path(), &["main.asm"])).unwrap();
    let codes: Vec<_> = report.diagnostics().iter().map(|d| d.code()).collect();
    assert_eq!(codes, vec!["include-recursion"]);
    assert_eq!(report.diagnostics()[0].locations().get(crate::core::LocationKind::Asm).line_num, 2);
    assert_eq!(output(dir.path()), "nop\nret\n");
}

#[test]
fn missing_include_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.asm"), "include \"gone.inc\"\nnop\n").unwrap();

    let report = run_with_config(&config_for(dir.path(), &["main.asm"])).unwrap();
    assert_eq!(report.diagnostics().len(), 1);
    assert_eq!(report.diagnostics()[0].code(), "cannot-open");
    assert_eq!(output(dir.path()), "nop\n");
}

#[test]
fn c_line_changes_diagnostic_location() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.asm"),
        "c_line 12, \"prog.c\"\n#define A 1\n#define A 2\n",
    )
    .unwrap();

    let report = run_with_config(&config_for(dir.path(), &["main.asm"])).unwrap();
    let rendered = report.diagnostics()[0].to_string();
    assert!(rendered.starts_with("Error at 'prog.c' line 12, '"), "{rendered}");
    assert!(rendered.ends_with("main.asm' line 3: macro 'A' redefined"), "{rendered}");
}

#[test]
fn each_input_starts_with_fresh_macros() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.asm"), "#define X 1\nX\n").unwrap();
    fs::write(dir.path().join("b.asm"), "X\nY\n").unwrap();

    let mut config = config_for(dir.path(), &["a.asm", "b.asm"]);
    config.defines = vec![("Y".to_string(), "2".to_string())];
    let report = run_with_config(&config).unwrap();
    assert!(!report.has_errors());
    assert_eq!(output(dir.path()), "1\nX\n2\n");
}

#[test]
fn error_file_is_appended_or_removed() {
    let dir = tempfile::tempdir().unwrap();
    let errors = dir.path().join("main.err");
    fs::write(dir.path().join("main.asm"), "#defcont nop\n").unwrap();

    let mut config = config_for(dir.path(), &["main.asm"]);
    config.error_file = Some(errors.clone());
    fs::write(&errors, "earlier\n").unwrap();
    run_with_config(&config).unwrap();
    let text = fs::read_to_string(&errors).unwrap();
    assert!(text.starts_with("earlier\nError at '"), "{text}");
    assert!(text.ends_with("main.asm' line 1: #defcont without #define\n"), "{text}");

    fs::write(dir.path().join("main.asm"), "nop\n").unwrap();
    fs::remove_file(&errors).unwrap();
    run_with_config(&config).unwrap();
    assert!(!errors.exists());
}

#[test]
fn listing_file_is_written() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.asm"), "nop\n").unwrap();
    let listing: PathBuf = dir.path().join("main.lis");

    let mut config = config_for(dir.path(), &["main.asm"]);
    config.listing = Some(listing.clone());
    run_with_config(&config).unwrap();
    let text = fs::read_to_string(&listing).unwrap();
    assert!(text.contains(";\tnop\n"), "{text}");
    assert!(text.contains("\tLINE 1, \""), "{text}");
    assert!(text.ends_with("\n\tnop\n"), "{text}");
}

#[test]
fn unreadable_input_is_a_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_with_config(&config_for(dir.path(), &["missing.asm"])).unwrap();
    assert_eq!(report.diagnostics().len(), 1);
    assert_eq!(report.diagnostics()[0].code(), "cannot-open");
    assert_eq!(output(dir.path()), "");
}

#[test]
fn out_of_range_c_line_is_a_syntax_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.asm"), "c_line 99999999999\nnop\n").unwrap();

    let report = run_with_config(&config_for(dir.path(), &["main.asm"])).unwrap();
    let codes: Vec<_> = report.diagnostics().iter().map(|d| d.code()).collect();
    assert_eq!(codes, vec!["syntax"]);
    assert_eq!(output(dir.path()), "nop\n");
}

#[test]
fn dash_reads_standard_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = DriverConfig {
        inputs: vec![InputSpec::Stdin],
        outfile: Some(dir.path().join("out.asm")),
        ..DriverConfig::default()
    };
    let mut stdin = io::Cursor::new(b"#define A 3\r\nld a, A\r#undef A B\n".to_vec());

    let report = run_with_stdin(&config, &mut stdin).unwrap();
    assert_eq!(report.statements(), 1);
    assert_eq!(output(dir.path()), "ld a, 3\n");
    assert_eq!(
        report.diagnostics()[0].to_string(),
        "Error at '<stdin>' line 3: syntax error"
    );
}

#[test]
fn output_keeps_non_utf8_bytes() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.asm"),
        b"#define GREET defm \"h\xE9\"\nGREET\ndefm \"\xFF\"\n",
    )
    .unwrap();

    let report = run_with_config(&config_for(dir.path(), &["main.asm"])).unwrap();
    assert!(!report.has_errors());
    assert_eq!(
        fs::read(dir.path().join("out.asm")).unwrap(),
        b"defm \"h\xE9\"\ndefm \"\xFF\"\n"
    );
}
