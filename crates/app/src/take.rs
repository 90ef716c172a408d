//! Interactive test-taking loop on stdin/stdout.

use std::io::Write as _;
use std::time::Duration;

use alum_core::model::{AnswerKeySheet, QuestionNumber, SessionEvent, StoreError, TestSettingsDraft};
use services::{AppServices, FinishedTest, SessionError, SessionLoopService, SessionService};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{Instant, interval_at};

use crate::render;

type Input = Lines<BufReader<Stdin>>;
type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

const TICK: Duration = Duration::from_secs(1);

const HELP: &str = "\
Perintah:
  <label>        pilih jawaban untuk soal ini (mis. A)
  n / >          soal berikutnya
  p / <          soal sebelumnya
  g <nomor>      pindah ke soal
  r              tandai / hapus tanda ragu-ragu
  selesai        selesaikan tes
  batal          batalkan tes tanpa menyimpan
  ?              bantuan";

/// One line typed during a test.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Answer(String),
    Next,
    Previous,
    GoTo(QuestionNumber),
    Doubt,
    Finish,
    Quit,
    Help,
    Unknown(String),
}

/// Find the option `raw` refers to, preferring an exact match.
fn match_option(raw: &str, options: &[String]) -> Option<String> {
    let raw = raw.trim();
    options
        .iter()
        .find(|o| o.as_str() == raw)
        .or_else(|| options.iter().find(|o| o.eq_ignore_ascii_case(raw)))
        .cloned()
}

fn parse_command(line: &str, options: &[String]) -> Command {
    let line = line.trim();
    if let Some(label) = options.iter().find(|o| o.as_str() == line) {
        return Command::Answer(label.clone());
    }
    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default().to_lowercase();
    match head.as_str() {
        "n" | ">" | "next" => Command::Next,
        "p" | "<" | "prev" => Command::Previous,
        "g" | "go" => match words.next().map(str::parse::<QuestionNumber>) {
            Some(Ok(q)) => Command::GoTo(q),
            _ => Command::Unknown(line.to_owned()),
        },
        "r" | "ragu" => Command::Doubt,
        "selesai" | "finish" => Command::Finish,
        "batal" | "quit" => Command::Quit,
        "?" | "help" => Command::Help,
        _ => match_option(line, options).map_or_else(|| Command::Unknown(line.to_owned()), Command::Answer),
    }
}

fn prompt(text: &str) -> AppResult<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{text}")?;
    stdout.flush()?;
    Ok(())
}

/// Rewrite the status line in place so running timers stay visible between inputs.
fn redraw_status(session: &SessionService) -> AppResult<()> {
    let view = session.view();
    if !render::shows_timers(&view) {
        return Ok(());
    }
    prompt(&format!("\r\x1b[2K{}", render::status_line(&view)))
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "ya" | "yes")
}

fn join_numbers(questions: &[QuestionNumber]) -> String {
    questions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run a whole attempt: questions, answer key, then saving under a name.
pub(crate) async fn take_test(
    app: &AppServices,
    draft: TestSettingsDraft,
    name: Option<String>,
) -> AppResult<()> {
    let loop_svc = app.session_loop();
    let mut session = loop_svc.start(draft)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    println!();
    print!("{}", render::session_screen(&session.view()));

    let Some(finished) = run_session(&mut session, &mut lines).await? else {
        println!("Tes dibatalkan.");
        return Ok(());
    };

    let sheet = enter_answer_key(finished.answer_key_sheet(), &mut lines).await?;
    save(&loop_svc, finished, sheet, name, &mut lines).await
}

async fn run_session(
    session: &mut SessionService,
    lines: &mut Input,
) -> AppResult<Option<FinishedTest>> {
    let mut overall = interval_at(Instant::now() + TICK, TICK);
    let mut per_question = interval_at(Instant::now() + TICK, TICK);
    let mut confirming_finish = false;

    loop {
        tokio::select! {
            _ = overall.tick() => {
                let events = session.tick();
                if events.iter().any(|e| matches!(e, SessionEvent::Finished(_))) {
                    println!();
                    println!("Waktu habis!");
                    return Ok(session.finished().cloned());
                }
                redraw_status(session)?;
            }
            _ = per_question.tick() => {
                session.question_tick();
                redraw_status(session)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    session.cancel()?;
                    return Ok(None);
                };

                if confirming_finish {
                    confirming_finish = false;
                    if is_yes(&line) {
                        return Ok(Some(session.finish(false)?));
                    }
                    print!("{}", render::session_screen(&session.view()));
                    continue;
                }

                let view = session.view();
                let events = match parse_command(&line, &view.options) {
                    Command::Answer(label) => session.select_answer(view.question, &label),
                    Command::Next => session.next(),
                    Command::Previous => session.previous(),
                    Command::GoTo(q) => session.go_to(q),
                    Command::Doubt if view.show_doubt_buttons => {
                        let events = session.toggle_doubt(view.question);
                        if events.is_empty() {
                            println!("Jawab soal ini dulu sebelum menandai ragu-ragu.");
                        }
                        events
                    }
                    Command::Finish => {
                        let unanswered = session.session().unanswered();
                        if unanswered.is_empty() {
                            return Ok(Some(session.finish(false)?));
                        }
                        println!(
                            "Masih ada soal yang belum dijawab: {}. Selesaikan tes? (y/n)",
                            join_numbers(&unanswered)
                        );
                        confirming_finish = true;
                        continue;
                    }
                    Command::Quit => {
                        session.cancel()?;
                        return Ok(None);
                    }
                    Command::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    Command::Doubt | Command::Unknown(_) => {
                        println!("Perintah tidak dikenal: {:?} (ketik ? untuk bantuan)", line.trim());
                        continue;
                    }
                };

                if events
                    .iter()
                    .any(|e| matches!(e, SessionEvent::QuestionNavigated { .. }))
                {
                    per_question.reset();
                }
                print!("{}", render::session_screen(&session.view()));
            }
        }
    }
}

async fn enter_answer_key(mut sheet: AnswerKeySheet, lines: &mut Input) -> AppResult<AnswerKeySheet> {
    println!();
    println!(
        "Masukkan kunci jawaban ({}). Kosongkan untuk melewati soal.",
        sheet.options()
    );

    for question in sheet.unset() {
        loop {
            prompt(&format!("Kunci soal {question}: "))?;
            let Some(line) = lines.next_line().await? else {
                return Ok(sheet);
            };
            if line.trim().is_empty() {
                break;
            }
            let Some(label) = match_option(&line, sheet.options().labels()) else {
                println!("Pilihan {:?} tidak ada.", line.trim());
                continue;
            };
            match sheet.choose(question, &label) {
                Ok(_) => break,
                Err(err) => println!("{err}"),
            }
        }
    }

    let unset = sheet.unset();
    if !unset.is_empty() {
        println!(
            "Soal tanpa kunci ({}) dihitung belum ditentukan.",
            join_numbers(&unset)
        );
    }
    Ok(sheet)
}

async fn save(
    loop_svc: &SessionLoopService,
    finished: FinishedTest,
    sheet: AnswerKeySheet,
    name: Option<String>,
    lines: &mut Input,
) -> AppResult<()> {
    let mut name = match name {
        Some(name) => Some(name),
        None => {
            prompt("Nama tes (kosong = tanggal tes): ")?;
            lines.next_line().await?
        }
    };

    loop {
        match loop_svc
            .save_result(finished.clone(), sheet.clone(), name.as_deref())
            .await
        {
            Ok(saved) => {
                println!("Tersimpan sebagai {:?}.", saved.name);
                println!("{}", render::counts_line(saved.counts));
                return Ok(());
            }
            Err(SessionError::Store(StoreError::NameTaken(taken))) => {
                prompt(&format!("Nama {taken:?} sudah dipakai. Nama lain: "))?;
                name = lines.next_line().await?;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        ["A", "B", "C", "N"].iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn labels_win_over_shortcuts() {
        assert_eq!(parse_command("N", &options()), Command::Answer("N".into()));
        assert_eq!(parse_command("n", &options()), Command::Next);
        assert_eq!(parse_command(" b ", &options()), Command::Answer("B".into()));
    }

    #[test]
    fn navigation_commands() {
        assert_eq!(
            parse_command("g 12", &options()),
            Command::GoTo(QuestionNumber::new(12))
        );
        assert_eq!(parse_command("<", &options()), Command::Previous);
        assert_eq!(parse_command("selesai", &options()), Command::Finish);
        assert_eq!(
            parse_command("g x", &options()),
            Command::Unknown("g x".into())
        );
        assert_eq!(parse_command("zzz", &options()), Command::Unknown("zzz".into()));
    }

    #[test]
    fn option_matching_prefers_exact_case() {
        let opts = vec!["a".to_string(), "A".to_string()];
        assert_eq!(match_option("A", &opts), Some("A".into()));
        assert_eq!(match_option("x", &opts), None);
    }
}
