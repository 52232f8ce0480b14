use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fhir_codes::CodeSource;
use fhir_core::{
    FileResult, FileStatus, IdStrategy, RunMode, RunObserver, Scheduler, SchedulerConfig,
    SchedulerState,
};
use serde_json::{Value, json};
use tempfile::TempDir;

const CODES: &str = "E119    Type 2 diabetes mellitus without complications\n";

struct Fixture {
    _root: TempDir,
    input: std::path::PathBuf,
    output: std::path::PathBuf,
    attachments: std::path::PathBuf,
    codes: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let root = TempDir::new().expect("tempdir");
    let input = root.path().join("in");
    let output = root.path().join("out");
    let attachments = root.path().join("attachments");
    fs::create_dir_all(&input).expect("input dir");
    fs::create_dir_all(&attachments).expect("attachments dir");
    let codes = root.path().join("codes.txt");
    fs::write(&codes, CODES).expect("codes");
    Fixture {
        input,
        output,
        attachments,
        codes,
        _root: root,
    }
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_vec_pretty(value).expect("json")).expect("write input");
}

fn config(fixture: &Fixture) -> SchedulerConfig {
    let mut config = SchedulerConfig::new(&fixture.input, &fixture.output);
    config.concurrency = 2;
    config.codes = Some(CodeSource::Text(fixture.codes.clone()));
    config
}

fn read_bundle(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).expect("bundle file")).expect("bundle json")
}

fn jane() -> Value {
    json!({
        "patient_tempus_id": "TL-0001",
        "mrn": "MRN-1",
        "demographics": [{"first_name": "Jane", "family_name": "Doe", "gender_name": "female"}],
        "diagnoses": [{"diagnosis_code": "E11.9", "diagnosis_name": "Type 2 diabetes"}],
        "labs": [{"lab_type_name": "Glucose", "lab_value_quantity": "101"}]
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bundles_good_files_and_reports_bad_ones() {
    let fixture = fixture();
    write_json(&fixture.input.join("jane.json"), &jane());
    write_json(
        &fixture.input.join("no-demographics.json"),
        &json!({"diagnoses": [{"diagnosis_code": "C50.9"}]}),
    );
    fs::write(fixture.input.join("broken.json"), "{ not json").expect("write broken");

    let mut scheduler = Scheduler::new(config(&fixture));
    let summary = scheduler.run().await.expect("run");

    let files: Vec<&str> = summary.files.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(files, ["broken.json", "jane.json", "no-demographics.json"]);
    assert_eq!(summary.succeeded().count(), 1);
    assert_eq!(summary.failed().count(), 2);
    assert!(summary.has_failures());
    assert_eq!(summary.codes_loaded, 1);

    let FileStatus::Failed { error } = &summary.files[2].status else {
        panic!("missing demographics fails the file");
    };
    assert!(error.contains("no demographics data found"));

    let bundle = read_bundle(&fixture.output.join("jane-bundle.json"));
    assert!(!fixture.output.join("broken-bundle.json").exists());
    assert_eq!(bundle["resourceType"], "Bundle");
    assert_eq!(bundle["type"], "transaction");

    let entries = bundle["entry"].as_array().expect("entries");
    assert_eq!(entries.len(), 4);
    let patient = &entries[0];
    assert_eq!(patient["resource"]["resourceType"], "Patient");
    assert_eq!(
        patient["resource"]["name"][0],
        json!({"family": "Doe", "given": ["Jane"]})
    );
    let subject = patient["fullUrl"].as_str().expect("patient fullUrl");
    for entry in &entries[1..] {
        assert_eq!(entry["resource"]["subject"]["reference"], subject);
        assert_eq!(entry["request"]["method"], "POST");
        assert_eq!(entry["request"]["url"], entry["resource"]["resourceType"]);
    }

    assert_eq!(
        entries[1]["resource"]["code"]["text"],
        "Type 2 diabetes mellitus without complications"
    );
    assert_eq!(entries[2]["resource"]["resourceType"], "Observation");
    assert_eq!(entries[3]["resource"]["resourceType"], "DiagnosticReport");
    assert_eq!(
        entries[3]["resource"]["result"][0]["reference"],
        entries[2]["fullUrl"]
    );

    let history = scheduler.history();
    assert_eq!(history.first(), Some(&SchedulerState::Idle));
    assert_eq!(history[1], SchedulerState::LoadingCache);
    assert_eq!(history[2], SchedulerState::Batching);
    assert!(history.contains(&SchedulerState::AwaitingBatch { batch: 2 }));
    assert_eq!(scheduler.state(), SchedulerState::Done);
}

#[tokio::test]
async fn deterministic_ids_rerun_identically() {
    let fixture = fixture();
    write_json(&fixture.input.join("jane.json"), &jane());
    let mut config = config(&fixture);
    config.worker.id_strategy = IdStrategy::Deterministic;

    Scheduler::new(config.clone()).run().await.expect("first run");
    let first = fs::read(fixture.output.join("jane-bundle.json")).expect("first bundle");
    Scheduler::new(config).run().await.expect("second run");
    let second = fs::read(fixture.output.join("jane-bundle.json")).expect("second bundle");
    assert_eq!(first, second);
}

fn large_extract() -> Value {
    let lab = json!({"lab_type_name": "Glucose", "lab_value_quantity": "101"});
    let mut extract = jane();
    extract["labs"] = Value::Array(vec![lab; 20_000]);
    extract
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_units_fail_with_a_timeout() {
    let fixture = fixture();
    write_json(&fixture.input.join("a.json"), &large_extract());
    write_json(&fixture.input.join("b.json"), &large_extract());
    let mut config = config(&fixture);
    config.unit_timeout = Some(Duration::ZERO);

    let summary = Scheduler::new(config).run().await.expect("run");
    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.failed().count(), 2);
    for result in &summary.files {
        let FileStatus::Failed { error } = &result.status else {
            panic!("{} should have timed out", result.file);
        };
        assert!(error.contains("timed out"), "unexpected error: {error}");
    }
    assert!(!fixture.output.join("a-bundle.json").exists());
}

#[tokio::test]
async fn unreachable_code_list_does_not_fail_the_run() {
    let fixture = fixture();
    write_json(&fixture.input.join("jane.json"), &jane());
    let mut config = config(&fixture);
    config.codes = Some(CodeSource::Text(fixture.input.join("missing-codes.txt")));

    let summary = Scheduler::new(config).run().await.expect("run");
    assert_eq!(summary.codes_loaded, 0);
    assert!(!summary.has_failures());

    let bundle = read_bundle(&fixture.output.join("jane-bundle.json"));
    assert_eq!(bundle["entry"][1]["resource"]["code"]["text"], "Type 2 diabetes");
}

#[tokio::test]
async fn attachments_mode_expands_demographics_and_attaches_files() {
    let fixture = fixture();
    let consolidated = fixture.attachments.join("..").join("demographics.json");
    write_json(
        &consolidated,
        &json!([[
            {"first_name": "Ann", "last_name": "Lee", "linkage_id": "P1"},
            {"first_name": "Bo", "last_name": "Kim", "linkage_id": "P2"}
        ]]),
    );
    let patient_dir = fixture.attachments.join("P1");
    fs::create_dir_all(&patient_dir).expect("patient dir");
    fs::write(patient_dir.join("D7_Pathology-report_20230501.pdf"), b"%PDF").expect("pdf");
    fs::write(patient_dir.join("D8_Scan.txt"), b"scan").expect("txt");

    let mut config = config(&fixture);
    config.mode = RunMode::Attachments;
    config.demographics_file = Some(consolidated);
    config.worker.attachments_dir = Some(fixture.attachments.clone());

    let summary = Scheduler::new(config).run().await.expect("run");
    assert!(fixture.input.join("P2.json").exists());
    assert_eq!(summary.files.len(), 1);
    assert_eq!(summary.files[0].file, "P1.json");
    assert_eq!(summary.files[0].attachments.attached, 2);

    let bundle = read_bundle(&fixture.output.join("P1-bundle.json"));
    let entries = bundle["entry"].as_array().expect("entries");
    let types: Vec<&str> = entries
        .iter()
        .filter_map(|entry| entry["resource"]["resourceType"].as_str())
        .collect();
    assert_eq!(
        types,
        ["Patient", "Binary", "DocumentReference", "Binary", "DocumentReference"]
    );

    let dated = &entries[2]["resource"];
    assert_eq!(dated["date"], "2023-05-01T00:00:00.000Z");
    assert_eq!(dated["category"][0]["text"], "Pathology report");
    assert_eq!(dated["content"][0]["attachment"]["contentType"], "application/pdf");
    assert_eq!(dated["content"][0]["attachment"]["url"], entries[1]["fullUrl"]);
    assert_eq!(entries[1]["resource"]["data"], "JVBERg==");

    let undated = &entries[4]["resource"];
    assert!(undated.get("date").is_none());
    assert!(undated["content"][0]["attachment"].get("creation").is_none());
    assert_eq!(undated["identifier"][0]["value"], "D8");
}

#[derive(Default)]
struct Counter {
    discovered: AtomicUsize,
    finished: AtomicUsize,
}

impl RunObserver for Counter {
    fn files_discovered(&self, total: usize) {
        self.discovered.store(total, Ordering::SeqCst);
    }

    fn file_finished(&self, _result: &FileResult) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn observer_sees_every_file() {
    let fixture = fixture();
    for name in ["a", "b", "c"] {
        write_json(
            &fixture.input.join(format!("{name}.json")),
            &json!({"demographics": [{"first_name": name}]}),
        );
    }
    let counter = Arc::new(Counter::default());
    let mut config = config(&fixture);
    config.codes = None;

    let summary = Scheduler::new(config)
        .with_observer(counter.clone())
        .run()
        .await
        .expect("run");
    assert_eq!(summary.succeeded().count(), 3);
    assert_eq!(counter.discovered.load(Ordering::SeqCst), 3);
    assert_eq!(counter.finished.load(Ordering::SeqCst), 3);
}
