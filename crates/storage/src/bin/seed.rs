use std::fmt;

use alum_core::model::{
    AnswerOptions, MAX_QUESTIONS, MAX_TIME_LIMIT_MINUTES, QuestionMap, QuestionNumber, QuestionRange,
    RecordSettings, TestRecord, TimeLimit, TimeUsed,
};
use chrono::{DateTime, Duration, Local, NaiveDateTime};
use rand::Rng;
use rand::seq::IndexedRandom;
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    store_path: String,
    tests: u32,
    questions: u32,
    options: usize,
    now: Option<NaiveDateTime>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidStore { raw: String },
    InvalidTests { raw: String },
    InvalidQuestions { raw: String },
    InvalidOptions { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidStore { raw } => write!(f, "invalid --store value: {raw}"),
            ArgsError::InvalidTests { raw } => write!(f, "invalid --tests value: {raw}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidOptions { raw } => write!(f, "invalid --options value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut store_path = std::env::var("ALUM_STORE").unwrap_or_else(|_| "data.json".into());
        let mut tests = 3;
        let mut questions = 10;
        let mut options = 5;
        let mut now = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--store" => {
                    let value = require_value(&mut args, "--store")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidStore { raw: value });
                    }
                    store_path = value;
                }
                "--tests" => {
                    let value = require_value(&mut args, "--tests")?;
                    tests = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidTests { raw: value.clone() })?;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| (1..=MAX_QUESTIONS).contains(n))
                        .ok_or_else(|| ArgsError::InvalidQuestions { raw: value.clone() })?;
                }
                "--options" => {
                    let value = require_value(&mut args, "--options")?;
                    options = value
                        .parse::<usize>()
                        .map_err(|_| ArgsError::InvalidOptions { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .naive_local();
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            store_path,
            tests,
            questions,
            options,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --store <path>            JSON store to append to (default: data.json)");
    eprintln!("  --tests <n>               Number of sample results to add (default: 3)");
    eprintln!("  --questions <n>           Questions per result, 1-999 (default: 10)");
    eprintln!("  --options <n>             Answer options per question (default: 5)");
    eprintln!("  --now <rfc3339>           Fixed timestamp for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  ALUM_STORE");
}

fn two_minutes_per_question(questions: u32) -> TimeLimit {
    TimeLimit::from_minutes(questions.saturating_mul(2).min(MAX_TIME_LIMIT_MINUTES))
}

fn sample_record(
    rng: &mut impl Rng,
    questions: u32,
    options: &AnswerOptions,
    taken_at: NaiveDateTime,
) -> Result<TestRecord, Box<dyn std::error::Error>> {
    let range = QuestionRange::new(QuestionNumber::new(1), questions);
    let time_limit = if rng.random_bool(0.5) {
        two_minutes_per_question(questions)
    } else {
        TimeLimit::Untimed
    };

    let mut pick = |skip_chance: f64| -> Option<String> {
        if rng.random_bool(skip_chance) {
            None
        } else {
            options.labels().choose(&mut *rng).cloned()
        }
    };
    let user_answers: QuestionMap<Option<String>> = range.iter().map(|q| (q, pick(0.1))).collect();
    let answer_key: QuestionMap<Option<String>> = range.iter().map(|q| (q, pick(0.2))).collect();
    let per_question: QuestionMap<u32> = range
        .iter()
        .map(|q| (q, rng.random_range(5..=120)))
        .collect();
    let total_secs = per_question.values().sum();

    let record = TestRecord::from_persisted(
        RecordSettings {
            time_limit,
            range,
            options: options.clone(),
        },
        user_answers,
        answer_key,
        TimeUsed {
            total_secs,
            per_question,
        },
        taken_at,
        String::new(),
    )?;
    Ok(record)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::json_file(&args.store_path).await?;
    let now = args.now.unwrap_or_else(|| Local::now().naive_local());
    let options = AnswerOptions::first_n(args.options)?;
    let mut rng = rand::rng();

    let mut store = storage.tests.read_store().await?;
    for i in 0..args.tests {
        let taken_at = now - Duration::days(i64::from(i));
        let record = sample_record(&mut rng, args.questions, &options, taken_at)?;
        let name = store.unique_default_name(&record.taken_at_text());
        store.insert_new(&name, record)?;
    }
    storage.tests.write_store(&store).await?;

    println!(
        "Seeded {} sample results into {} ({} tests total)",
        args.tests,
        args.store_path,
        store.len()
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_time_limit_is_capped() {
        assert_eq!(two_minutes_per_question(10), TimeLimit::Minutes(20));
        assert_eq!(
            two_minutes_per_question(MAX_QUESTIONS),
            TimeLimit::Minutes(MAX_TIME_LIMIT_MINUTES)
        );
        assert_eq!(
            two_minutes_per_question(u32::MAX),
            TimeLimit::Minutes(MAX_TIME_LIMIT_MINUTES)
        );
    }
}
