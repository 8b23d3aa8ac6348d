use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rankd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rankd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn main_mark_edit_keeps_total_in_step() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(&mut stdin, &mut reader, "1", "students.add", json!({}));

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.setMain",
        json!({ "student": 0, "subject": 0, "part": "UT", "value": 17 }),
    );
    let r = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "marks.setMain",
        json!({ "student": 0, "subject": 0, "part": "Final", "value": 66 }),
    );
    let s = &r["roster"]["students"][0];
    assert_eq!(
        s["marks"][0],
        json!({ "subject": "English Language", "UT": 17, "Final": 66, "Total": 83 })
    );
    assert_eq!(s["totalMarks"], json!(83));
    assert_eq!(s["percentage"], json!("8.30"));
}

#[test]
fn out_of_range_edit_is_rejected_and_nothing_changes() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(&mut stdin, &mut reader, "1", "students.add", json!({}));
    let before = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.setMain",
        json!({ "student": 0, "subject": 1, "part": "UT", "value": 12 }),
    );

    let raw = request(
        &mut stdin,
        &mut reader,
        "3",
        "marks.setMain",
        json!({ "student": 0, "subject": 1, "part": "UT", "value": 25 }),
    );
    assert_eq!(error_code(&raw), "mark_out_of_range");
    assert_eq!(
        raw["error"]["details"],
        json!({ "kind": "UT", "value": 25, "min": 0, "max": 20 })
    );
    assert_eq!(
        raw["error"]["message"],
        json!("UT marks should be between 0 and 20")
    );

    let raw = request(
        &mut stdin,
        &mut reader,
        "4",
        "marks.setMain",
        json!({ "student": 0, "subject": 1, "part": "Final", "value": 81 }),
    );
    assert_eq!(error_code(&raw), "mark_out_of_range");

    let raw = request(
        &mut stdin,
        &mut reader,
        "5",
        "marks.setAdditional",
        json!({ "student": 0, "subject": 0, "value": 101 }),
    );
    assert_eq!(error_code(&raw), "mark_out_of_range");
    assert_eq!(raw["error"]["details"]["max"], json!(100));

    let after = request_ok(&mut stdin, &mut reader, "6", "roster.get", json!({}));
    assert_eq!(after["roster"], before["roster"]);
    assert_eq!(after["roster"]["students"][0]["marks"][1]["Total"], json!(12));
    assert_eq!(after["roster"]["students"][0]["totalMarks"], json!(12));
}

#[test]
fn blank_input_clears_the_field() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(&mut stdin, &mut reader, "1", "students.add", json!({}));
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.setAdditional",
        json!({ "student": 0, "subject": 3, "value": "88" }),
    );
    let r = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "marks.setAdditional",
        json!({ "student": 0, "subject": 3, "value": "" }),
    );
    assert_eq!(r["roster"]["students"][0]["additionalMarks"][3], json!(0));
    assert_eq!(r["roster"]["students"][0]["totalMarks"], json!(0));
}

#[test]
fn fractional_marks_and_bad_parts_are_rejected() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(&mut stdin, &mut reader, "1", "students.add", json!({}));

    let raw = request(
        &mut stdin,
        &mut reader,
        "2",
        "marks.setMain",
        json!({ "student": 0, "subject": 0, "part": "Final", "value": 40.5 }),
    );
    assert_eq!(error_code(&raw), "invalid_mark");

    let raw = request(
        &mut stdin,
        &mut reader,
        "3",
        "marks.setMain",
        json!({ "student": 0, "subject": 0, "part": "Total", "value": 40 }),
    );
    assert_eq!(error_code(&raw), "bad_params");

    let raw = request(
        &mut stdin,
        &mut reader,
        "4",
        "marks.setMain",
        json!({ "student": 3, "subject": 0, "part": "UT", "value": 4 }),
    );
    assert_eq!(error_code(&raw), "bad_params");
}
