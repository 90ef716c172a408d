use std::collections::HashSet;

use alum_core::model::{
    AnswerOptions, MAX_FIRST_QUESTION, MAX_QUESTIONS, QuestionMap, QuestionNumber, QuestionRange,
    RecordSettings, TIMESTAMP_FORMAT, TestRecord, TestStore, TimeLimit, TimeUsed,
};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// On-disk shape of one saved test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PersistedRecord {
    /// Seconds; 0 means untimed.
    pub batas_waktu: u32,
    pub nomor_pertama: u32,
    pub jumlah_soal: u32,
    pub opsi_soal: Vec<String>,
    pub jawaban_tes: IndexMap<String, String>,
    pub kunci_jawaban: IndexMap<String, String>,
    pub waktu_yang_digunakan: PersistedTimeUsed,
    pub tanggal_tes: String,
    #[serde(default)]
    pub catatan_tes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PersistedTimeUsed {
    pub total: u32,
    pub per_soal: IndexMap<String, u32>,
}

pub(crate) type PersistedStore = IndexMap<String, PersistedRecord>;

fn labels_to_persisted(map: &QuestionMap<Option<String>>) -> IndexMap<String, String> {
    map.iter()
        .map(|(q, label)| (q.to_string(), label.clone().unwrap_or_default()))
        .collect()
}

/// Parse the question-number keys of one persisted map. Two spellings of the same
/// number (`"1"` and `"01"`) are rejected.
fn keyed_from_persisted<T>(
    field: &'static str,
    raw: IndexMap<String, T>,
) -> Result<QuestionMap<T>, StorageError> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .map(|(key, value)| {
            let question = parse_question(field, &key)?;
            if !seen.insert(question) {
                return Err(StorageError::Serialization(format!(
                    "{field}: question {question} is listed twice"
                )));
            }
            Ok((question, value))
        })
        .collect()
}

fn labels_from_persisted(
    field: &'static str,
    raw: IndexMap<String, String>,
) -> Result<QuestionMap<Option<String>>, StorageError> {
    Ok(keyed_from_persisted(field, raw)?
        .into_iter()
        .map(|(question, label)| (question, (!label.is_empty()).then_some(label)))
        .collect())
}

fn parse_question(field: &'static str, raw: &str) -> Result<QuestionNumber, StorageError> {
    raw.parse::<QuestionNumber>()
        .map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

pub(crate) fn record_to_persisted(record: &TestRecord) -> PersistedRecord {
    let settings = record.settings();
    let time_used = record.time_used();
    PersistedRecord {
        batas_waktu: settings.time_limit.as_secs(),
        nomor_pertama: settings.range.first().value(),
        jumlah_soal: settings.range.len(),
        opsi_soal: settings.options.labels().to_vec(),
        jawaban_tes: labels_to_persisted(record.user_answers()),
        kunci_jawaban: labels_to_persisted(record.answer_key()),
        waktu_yang_digunakan: PersistedTimeUsed {
            total: time_used.total_secs,
            per_soal: time_used
                .per_question
                .iter()
                .map(|(q, secs)| (q.to_string(), *secs))
                .collect(),
        },
        tanggal_tes: record.taken_at_text(),
        catatan_tes: record.note().to_owned(),
    }
}

pub(crate) fn record_from_persisted(raw: PersistedRecord) -> Result<TestRecord, StorageError> {
    if !(1..=MAX_QUESTIONS).contains(&raw.jumlah_soal) {
        return Err(StorageError::Serialization(format!(
            "jumlah_soal must be between 1 and {MAX_QUESTIONS}, got {}",
            raw.jumlah_soal
        )));
    }
    if !(1..=MAX_FIRST_QUESTION).contains(&raw.nomor_pertama) {
        return Err(StorageError::Serialization(format!(
            "nomor_pertama must be between 1 and {MAX_FIRST_QUESTION}, got {}",
            raw.nomor_pertama
        )));
    }
    let time_limit = TimeLimit::from_secs(raw.batas_waktu).ok_or_else(|| {
        StorageError::Serialization(format!(
            "batas_waktu must be whole minutes, got {} seconds",
            raw.batas_waktu
        ))
    })?;
    let range = QuestionRange::new(QuestionNumber::new(raw.nomor_pertama), raw.jumlah_soal);
    let settings = RecordSettings {
        time_limit,
        range,
        options: AnswerOptions::new(raw.opsi_soal).map_err(ser)?,
    };

    let user_answers = labels_from_persisted("jawaban_tes", raw.jawaban_tes)?;
    let answer_key = labels_from_persisted("kunci_jawaban", raw.kunci_jawaban)?;
    let per_question = keyed_from_persisted("per_soal", raw.waktu_yang_digunakan.per_soal)?;

    let taken_at =
        NaiveDateTime::parse_from_str(&raw.tanggal_tes, TIMESTAMP_FORMAT).map_err(|e| {
            StorageError::Serialization(format!("tanggal_tes {:?}: {e}", raw.tanggal_tes))
        })?;

    TestRecord::from_persisted(
        settings,
        user_answers,
        answer_key,
        TimeUsed {
            total_secs: raw.waktu_yang_digunakan.total,
            per_question,
        },
        taken_at,
        raw.catatan_tes,
    )
    .map_err(ser)
}

pub(crate) fn store_to_persisted(store: &TestStore) -> PersistedStore {
    store
        .iter()
        .map(|(name, record)| (name.to_owned(), record_to_persisted(record)))
        .collect()
}

pub(crate) fn store_from_persisted(raw: PersistedStore) -> Result<TestStore, StorageError> {
    raw.into_iter()
        .map(|(name, record)| {
            let record = record_from_persisted(record)
                .map_err(|e| StorageError::Serialization(format!("test {name:?}: {e}")))?;
            Ok((name, record))
        })
        .collect()
}
