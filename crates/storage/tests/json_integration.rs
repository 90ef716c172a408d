use alum_core::model::{
    AnswerOptions, QuestionMap, QuestionNumber, QuestionRange, RecordSettings, TestRecord,
    TestStore, TimeLimit, TimeUsed,
};
use alum_core::time::fixed_now;
use storage::repository::{StorageError, TestStoreRepository};
use storage::JsonFileRepository;

fn build_record(first: u32, answers: &[&str]) -> TestRecord {
    let count = u32::try_from(answers.len()).unwrap();
    let range = QuestionRange::new(QuestionNumber::new(first), count);
    let user_answers = range
        .iter()
        .zip(answers)
        .map(|(q, a)| (q, (!a.is_empty()).then(|| (*a).to_string())))
        .collect();
    TestRecord::from_persisted(
        RecordSettings {
            time_limit: TimeLimit::Minutes(2),
            range,
            options: AnswerOptions::default(),
        },
        user_answers,
        QuestionMap::filled(range, Some("A".into())),
        TimeUsed {
            total_secs: 9 * count,
            per_question: QuestionMap::filled(range, 9),
        },
        fixed_now().naive_utc(),
        String::new(),
    )
    .unwrap()
}

#[tokio::test]
async fn missing_file_is_created_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("data.json");

    let repo = JsonFileRepository::open(&path).await.expect("open");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    assert!(repo.read_store().await.unwrap().is_empty());
}

#[tokio::test]
async fn json_round_trip_preserves_order_and_format() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    let repo = JsonFileRepository::open(&path).await.unwrap();

    let mut store = TestStore::new();
    store.insert_new("zeta", build_record(1, &["A", ""])).unwrap();
    store.insert_new("alpha", build_record(11, &["B"])).unwrap();
    store.insert_new("mid", build_record(3, &["A", "A", "C"])).unwrap();
    repo.write_store(&store).await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("{\n  \"zeta\": {\n    \"batas_waktu\": 120,"));
    assert!(text.contains("\"tanggal_tes\": \"14/11/2023, 22:13:20\""));
    assert!(text.contains("\"2\": \"\""));

    let reopened = JsonFileRepository::open(&path).await.unwrap();
    let loaded = reopened.read_store().await.unwrap();
    assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    assert_eq!(loaded, store);
}

#[tokio::test]
async fn reorder_survives_rewrite() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    let repo = JsonFileRepository::open(&path).await.unwrap();

    let mut store = TestStore::new();
    for name in ["t1", "t2", "t3"] {
        store.insert_new(name, build_record(1, &["A"])).unwrap();
    }
    store.move_entry(2, 0).unwrap();
    store.rename("t1", "first").unwrap();
    repo.write_store(&store).await.unwrap();

    let loaded = repo.read_store().await.unwrap();
    assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["t3", "first", "t2"]);
}

#[tokio::test]
async fn malformed_document_is_a_serialization_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    std::fs::write(&path, "{\"broken\": {\"batas_waktu\": 0}}").unwrap();

    let repo = JsonFileRepository::open(&path).await.unwrap();
    let err = repo.read_store().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}
