mod test_support;

use serde_json::json;
use test_support::{error_code, id_at, open_as_admin, request_as, request_ok_as, spawn_sidecar, temp_dir};

fn student_keys(listing: &serde_json::Value) -> Vec<(String, String, String, Option<String>)> {
    let mut keys: Vec<_> = listing
        .get("students")
        .and_then(|v| v.as_array())
        .expect("students")
        .iter()
        .map(|s| {
            let text = |k: &str| s.get(k).and_then(|v| v.as_str()).unwrap_or_default().to_string();
            (
                text("regNo"),
                text("name"),
                text("className"),
                s.get("section").and_then(|v| v.as_str()).map(str::to_string),
            )
        })
        .collect();
    keys.sort();
    keys
}

#[test]
fn students_csv_moves_between_workspaces() {
    let source = temp_dir("resultsd-transfer-src");
    let target = temp_dir("resultsd-transfer-dst");
    let csv_path = source.join("exports").join("students.csv");

    let exported_keys;
    {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        let admin = open_as_admin(&mut stdin, &mut reader, &source);
        let s = Some(admin.as_str());
        let a = id_at(&request_ok_as(&mut stdin, &mut reader, s, "1", "classes.create", json!({ "name": "10", "section": "A" })), "/class/id");
        let b = id_at(&request_ok_as(&mut stdin, &mut reader, s, "2", "classes.create", json!({ "name": "9" })), "/class/id");
        let _ = request_ok_as(&mut stdin, &mut reader, s, "3", "students.create", json!({ "regNo": "R1", "name": "Asha, K", "email": "asha@example.com", "classId": a, "password": "pw" }));
        let _ = request_ok_as(&mut stdin, &mut reader, s, "4", "students.create", json!({ "regNo": "R2", "name": "Ben", "classId": b, "password": "pw" }));

        let exported = request_ok_as(&mut stdin, &mut reader, s, "5", "transfer.exportStudents", json!({ "outPath": csv_path.to_string_lossy() }));
        assert_eq!(id_at(&exported, "/rowsExported"), 2);
        let text = exported.get("csv").and_then(|v| v.as_str()).expect("csv");
        assert_eq!(
            text,
            "reg_no,name,email,class_name,section\r\nR1,\"Asha, K\",asha@example.com,10,A\r\nR2,Ben,,9,\r\n"
        );
        assert_eq!(std::fs::read_to_string(&csv_path).expect("csv file"), text);

        let listing = request_ok_as(&mut stdin, &mut reader, s, "6", "students.list", json!({}));
        exported_keys = student_keys(&listing);
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let admin = open_as_admin(&mut stdin, &mut reader, &target);
    let s = Some(admin.as_str());
    let imported = request_ok_as(&mut stdin, &mut reader, s, "1", "transfer.importStudents", json!({ "inPath": csv_path.to_string_lossy() }));
    assert_eq!(id_at(&imported, "/created"), 2);
    assert_eq!(id_at(&imported, "/skipped"), 0);
    assert_eq!(id_at(&imported, "/classesCreated"), 2);

    let listing = request_ok_as(&mut stdin, &mut reader, s, "2", "students.list", json!({}));
    assert_eq!(student_keys(&listing), exported_keys);

    let again = request_ok_as(&mut stdin, &mut reader, s, "3", "transfer.importStudents", json!({ "inPath": csv_path.to_string_lossy() }));
    assert_eq!(id_at(&again, "/created"), 0);
    assert_eq!(id_at(&again, "/skipped"), 2);

    // Imported students sign in with the default password.
    let _ = request_ok_as(&mut stdin, &mut reader, None, "4", "auth.studentLogin", json!({ "regNo": "R2", "password": "Pass@123" }));
}

#[test]
fn results_import_skips_rows_it_cannot_place() {
    let workspace = temp_dir("resultsd-transfer-results");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let admin = open_as_admin(&mut stdin, &mut reader, &workspace);
    let s = Some(admin.as_str());

    let class_id = id_at(&request_ok_as(&mut stdin, &mut reader, s, "1", "classes.create", json!({ "name": "10" })), "/class/id");
    let other_id = id_at(&request_ok_as(&mut stdin, &mut reader, s, "2", "classes.create", json!({ "name": "11" })), "/class/id");
    let _ = request_ok_as(&mut stdin, &mut reader, s, "3", "subjects.create", json!({ "name": "Math", "classId": class_id }));
    let _ = request_ok_as(&mut stdin, &mut reader, s, "4", "subjects.create", json!({ "name": "Science", "classId": class_id }));
    let student = id_at(&request_ok_as(&mut stdin, &mut reader, s, "5", "students.create", json!({ "regNo": "R1", "name": "Asha", "classId": class_id, "password": "pw" })), "/student/id");
    let _ = request_ok_as(&mut stdin, &mut reader, s, "6", "students.create", json!({ "regNo": "R9", "name": "Elsewhere", "classId": other_id, "password": "pw" }));

    let csv = "reg_no,subject,marks,max_marks\n\
               R1,Math,45,50\n\
               R1,Science,,\n\
               R9,Math,10,50\n\
               R1,Art,10,50\n\
               R1,Math,abc,50\n\
               R1,Math,-5,50\n";
    let summary = request_ok_as(&mut stdin, &mut reader, s, "7", "transfer.importResults", json!({ "classId": class_id, "csv": csv }));
    assert_eq!(id_at(&summary, "/processed"), 2);
    assert_eq!(id_at(&summary, "/skipped"), 4);

    let listed = request_ok_as(&mut stdin, &mut reader, s, "8", "results.list", json!({ "studentId": student }));
    assert_eq!(id_at(&listed, "/results/0/marks"), 45);
    assert_eq!(id_at(&listed, "/results/1/marks"), 0);
    assert_eq!(id_at(&listed, "/results/1/maxMarks"), 100);

    let exported = request_ok_as(&mut stdin, &mut reader, s, "9", "transfer.exportResults", json!({ "classId": class_id }));
    assert_eq!(
        exported.get("csv").and_then(|v| v.as_str()),
        Some("reg_no,subject,marks,max_marks\r\nR1,Math,45,50\r\nR1,Science,0,100\r\n")
    );

    let missing_column = request_as(&mut stdin, &mut reader, s, "10", "transfer.importResults", json!({ "classId": class_id, "csv": "reg_no,marks\nR1,4\n" }));
    assert_eq!(error_code(&missing_column), "bad_params");
    let no_input = request_as(&mut stdin, &mut reader, s, "11", "transfer.importStudents", json!({}));
    assert_eq!(error_code(&no_input), "bad_params");
}

#[test]
fn results_import_keeps_bonus_marks() {
    let workspace = temp_dir("resultsd-transfer-bonus");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let admin = open_as_admin(&mut stdin, &mut reader, &workspace);
    let s = Some(admin.as_str());

    let class_id = id_at(&request_ok_as(&mut stdin, &mut reader, s, "1", "classes.create", json!({ "name": "10" })), "/class/id");
    let _ = request_ok_as(&mut stdin, &mut reader, s, "2", "subjects.create", json!({ "name": "Math", "classId": class_id }));
    let student = id_at(&request_ok_as(&mut stdin, &mut reader, s, "3", "students.create", json!({ "regNo": "R1", "name": "Asha", "classId": class_id, "password": "pw" })), "/student/id");

    let summary = request_ok_as(&mut stdin, &mut reader, s, "4", "transfer.importResults", json!({ "classId": class_id, "csv": "reg_no,subject,marks,max_marks\nR1,Math,105,100\n" }));
    assert_eq!(id_at(&summary, "/processed"), 1);
    assert_eq!(id_at(&summary, "/skipped"), 0);

    let listed = request_ok_as(&mut stdin, &mut reader, s, "5", "results.list", json!({ "studentId": student }));
    assert_eq!(id_at(&listed, "/results/0/marks"), 105);
    assert_eq!(id_at(&listed, "/results/0/maxMarks"), 100);
}
