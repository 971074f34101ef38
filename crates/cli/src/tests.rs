use super::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

fn run_cli(args: &[&OsStr]) -> (i32, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut argv: Vec<OsString> = vec![OsString::from("fswalk")];
    argv.extend(args.iter().map(|arg| arg.to_os_string()));
    let code = run(argv, &mut stdout, &mut stderr);
    (
        code,
        String::from_utf8(stdout).expect("utf8 stdout"),
        String::from_utf8(stderr).expect("utf8 stderr"),
    )
}

fn sample_tree() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir(temp.path().join("a")).expect("mkdir a");
    fs::create_dir(temp.path().join("b")).expect("mkdir b");
    fs::write(temp.path().join("f.txt"), b"f").expect("write f");
    fs::write(temp.path().join("a/x.txt"), b"x").expect("write x");
    temp
}

fn relative_lines(root: &Path, stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(|line| {
            Path::new(line)
                .strip_prefix(root)
                .expect("below root")
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

#[test]
fn lists_every_entry_as_a_line() {
    let temp = sample_tree();
    let (code, stdout, stderr) = run_cli(&[temp.path().as_os_str()]);
    assert_eq!(code, EXIT_SUCCESS, "stderr: {stderr}");
    assert_eq!(
        relative_lines(temp.path(), &stdout),
        set(&["a", "b", "f.txt", "a/x.txt"])
    );
    assert!(stderr.is_empty());
}

#[test]
fn exclude_prunes_named_subtrees() {
    let temp = sample_tree();
    let (code, stdout, _) = run_cli(&[
        OsStr::new("--exclude"),
        OsStr::new("a"),
        temp.path().as_os_str(),
    ]);
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(relative_lines(temp.path(), &stdout), set(&["b", "f.txt"]));
}

#[test]
fn max_depth_limits_output() {
    let temp = sample_tree();
    let (code, stdout, _) = run_cli(&[
        OsStr::new("--max-depth=0"),
        temp.path().as_os_str(),
    ]);
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(
        relative_lines(temp.path(), &stdout),
        set(&["a", "b", "f.txt"])
    );
}

#[test]
fn json_lines_describe_each_entry() {
    let temp = sample_tree();
    let (code, stdout, _) = run_cli(&[OsStr::new("--json"), temp.path().as_os_str()]);
    assert_eq!(code, EXIT_SUCCESS);

    let records: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(records.len(), 4);
    let x = records
        .iter()
        .find(|record| record["name"] == "x.txt")
        .expect("x.txt record");
    assert_eq!(x["depth"], 1);
    assert_eq!(x["kind"], "file");
    assert_eq!(x["len"], 1);
    let a = records
        .iter()
        .find(|record| record["name"] == "a")
        .expect("a record");
    assert_eq!(a["kind"], "dir");
    assert_eq!(a["depth"], 0);
}

#[test]
fn null_terminated_output() {
    let temp = sample_tree();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(
        [OsStr::new("fswalk"), OsStr::new("-0"), temp.path().as_os_str()],
        &mut stdout,
        &mut stderr,
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(stdout.iter().filter(|byte| **byte == 0).count(), 4);
    assert!(!stdout.contains(&b'\n'));
}

#[test]
fn stats_summary_goes_to_stderr() {
    let temp = sample_tree();
    let (code, _, stderr) = run_cli(&[OsStr::new("--stats"), temp.path().as_os_str()]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(stderr.contains("Number of entries: 4"));
    assert!(stderr.contains("Directories listed: 3"));
}

#[test]
fn missing_root_is_a_partial_result() {
    let temp = tempfile::tempdir().expect("tempdir");
    let missing = temp.path().join("missing");
    let (code, stdout, stderr) = run_cli(&[missing.as_os_str()]);
    assert_eq!(code, EXIT_PARTIAL);
    assert!(stdout.is_empty());
    assert!(stderr.contains("failed to read directory"));
}

#[test]
fn zero_concurrency_is_a_usage_error() {
    let temp = sample_tree();
    let (code, stdout, stderr) = run_cli(&[
        OsStr::new("-j"),
        OsStr::new("0"),
        temp.path().as_os_str(),
    ]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stdout.is_empty());
    assert!(stderr.contains("max_concurrency"));
}

#[test]
fn unknown_debug_flag_is_a_usage_error() {
    let (code, _, stderr) = run_cli(&[OsStr::new("--debug=bogus")]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stderr.contains("unknown debug flag: bogus"));
}

#[test]
fn non_file_urls_are_rejected() {
    let (code, _, stderr) = run_cli(&[OsStr::new("file-like-but-not-url")]);
    assert_eq!(code, EXIT_PARTIAL, "plain relative path that does not exist");
    assert!(stderr.contains("failed to read directory"));

    let (code, _, stderr) = run_cli(&[OsStr::new("file://remote-host/tree")]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stderr.contains("file URL"));
}

#[cfg(unix)]
#[test]
fn file_url_roots_are_walked() {
    let temp = sample_tree();
    let url = Url::from_directory_path(temp.path()).expect("file url");
    let (code, stdout, _) = run_cli(&[OsStr::new(url.as_str())]);
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(stdout.lines().count(), 4);
}

#[test]
fn help_goes_to_stdout() {
    let (code, stdout, stderr) = run_cli(&[OsStr::new("--help")]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(stdout.contains("--max-concurrency"));
    assert!(stdout.contains("--backlog-threshold"));
    assert!(stderr.is_empty());
}

#[test]
fn unknown_option_is_a_usage_error() {
    let (code, stdout, stderr) = run_cli(&[OsStr::new("--frobnicate")]);
    assert_eq!(code, EXIT_USAGE);
    assert!(stdout.is_empty());
    assert!(stderr.contains("--frobnicate"));
}

#[test]
fn exit_codes_are_clamped() {
    assert_eq!(exit_code_from(-5), std::process::ExitCode::from(0));
    assert_eq!(exit_code_from(23), std::process::ExitCode::from(23));
    assert_eq!(exit_code_from(1000), std::process::ExitCode::from(255));
}

#[test]
fn options_follow_parsed_flags() {
    let parsed = parse_args(["fswalk", "-P", "-j", "3", "--backlog-threshold", "7"]).unwrap();
    let rendered = format!("{:?}", options_from(&parsed));
    assert!(rendered.contains("max_concurrency: Some(3)"));
    assert!(rendered.contains("backlog_threshold: Some(7)"));
    assert!(rendered.contains("follow_symlinks: Some(false)"));
    assert!(rendered.contains("max_depth: None"));
    assert!(rendered.contains("visit: None"));
}

#[test]
fn max_depth_is_a_walk_option_not_a_filter() {
    let parsed = parse_args(["fswalk", "--max-depth", "2"]).unwrap();
    let rendered = format!("{:?}", options_from(&parsed));
    assert!(rendered.contains("max_depth: Some(2)"));
    assert!(rendered.contains("visit: None"));
}

#[test]
fn max_depth_stops_listing_at_the_limit() {
    let temp = sample_tree();
    let (code, _, stderr) = run_cli(&[
        OsStr::new("--max-depth=0"),
        OsStr::new("--stats"),
        temp.path().as_os_str(),
    ]);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(stderr.contains("Number of entries: 3"));
    assert!(stderr.contains("Directories listed: 1"));
}
