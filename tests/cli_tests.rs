use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn csv_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn tablediff() -> Command {
    Command::cargo_bin("tablediff").unwrap()
}

const LHS: &str = "id,name,amount\n1,alpha,10.0\n2,beta,20.0\n3,gamma,30.0\n";
const RHS: &str = "id,name,amount\n1,alpha,10.0\n2,beta,20.5\n4,delta,40.0\n";

#[test]
fn test_identical_files_exit_zero() {
    let lhs = csv_file(LHS);
    let rhs = csv_file(LHS);
    tablediff()
        .args(["-k", "id", "--stable-output"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No differences found."))
        .stdout(predicate::str::contains("started:").not());
}

#[test]
fn test_differences_exit_one() {
    let lhs = csv_file(LHS);
    let rhs = csv_file(RHS);
    tablediff()
        .args(["-k", "id", "--stable-output"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("amount: 20.0 → 20.5"))
        .stdout(predicate::str::contains("only in lhs"))
        .stdout(predicate::str::contains("only in rhs"))
        .stdout(predicate::str::contains("Summary: 2 row diffs, 1 column diffs, 3 total"));
}

#[test]
fn test_tolerance_hides_small_changes() {
    let lhs = csv_file(LHS);
    let rhs = csv_file(RHS);
    tablediff()
        .args(["-k", "id", "--stable-output", "--summary", "--tolerance", "amount=0.5"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Summary: 2 row diffs, 0 column diffs, 2 total"));
}

#[test]
fn test_row_kind_only() {
    let lhs = csv_file(LHS);
    let rhs = csv_file(RHS);
    tablediff()
        .args(["-k", "id", "--kind", "row", "--summary", "--stable-output"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("2 row diffs, 0 column diffs"));
}

#[test]
fn test_json_lines_output() {
    let lhs = csv_file(LHS);
    let rhs = csv_file(RHS);
    let output = tablediff()
        .args(["-k", "id", "-f", "json"])
        .arg(lhs.path())
        .arg(rhs.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["type"], "column");
    assert_eq!(lines[0]["column"], "amount");
    assert_eq!(lines[0]["row_step"], 2);
    assert_eq!(lines[1]["type"], "row");
    assert_eq!(lines[1]["side"], "left");
    assert_eq!(lines[2]["side"], "right");
    assert_eq!(lines[3]["type"], "summary");
    assert_eq!(lines[3]["diffs"], 3);
}

#[test]
fn test_max_diffs_limits_output() {
    let lhs = csv_file(LHS);
    let rhs = csv_file(RHS);
    tablediff()
        .args(["-k", "id", "--max-diffs", "1", "--summary", "--stable-output"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("1 total"));
}

#[test]
fn test_unknown_key_is_an_error() {
    let lhs = csv_file(LHS);
    let rhs = csv_file(RHS);
    tablediff()
        .args(["-k", "missing"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_unsorted_input_is_an_error() {
    let lhs = csv_file("id,v\n2,a\n1,b\n");
    let rhs = csv_file("id,v\n1,b\n2,a\n");
    tablediff()
        .args(["-k", "id"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("sorted").or(predicate::str::contains("order")));
}

#[test]
fn test_row_number_alignment_without_key() {
    let lhs = csv_file("a,b\nx,1\ny,2\n");
    let rhs = csv_file("a,b\nx,1\ny,3\nz,4\n");
    tablediff()
        .args(["--stable-output", "--summary"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("1 row diffs, 1 column diffs"));
}

#[test]
fn test_bad_tolerance_argument() {
    let lhs = csv_file(LHS);
    let rhs = csv_file(RHS);
    tablediff()
        .args(["--tolerance", "amount"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(2);
}

#[test]
fn test_out_of_range_time_tolerance() {
    let lhs = csv_file(LHS);
    let rhs = csv_file(RHS);
    tablediff()
        .args(["-k", "id", "--time-tolerance", "updated=99999999999999y"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_cells_differing_only_in_spelling_are_reported() {
    let lhs = csv_file("id,code,flag\n1,007,TRUE\n2,1.0,null\n");
    let rhs = csv_file("id,code,flag\n1,7,true\n2,1,\n");
    tablediff()
        .args(["-k", "id", "--stable-output", "--summary"])
        .arg(lhs.path())
        .arg(rhs.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("0 row diffs, 4 column diffs"));
}
