//! Terminal text for sessions, reviews and the saved-test list.

use std::fmt::Write as _;

use alum_core::model::{ReviewRow, ScoreCounts, TimeLimit, Verdict};
use chrono::{Datelike, NaiveDateTime, Weekday};
use services::{SessionView, TestListItem, TestReview};

const NONE_TEXT: &str = "tidak ada";

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// `MM:SS`; minutes keep growing past 99.
pub fn clock_text(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `"<m> menit <s> detik"`.
pub fn duration_text(secs: u32) -> String {
    format!("{} menit {} detik", secs / 60, secs % 60)
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Senin",
        Weekday::Tue => "Selasa",
        Weekday::Wed => "Rabu",
        Weekday::Thu => "Kamis",
        Weekday::Fri => "Jumat",
        Weekday::Sat => "Sabtu",
        Weekday::Sun => "Minggu",
    }
}

/// Indonesian long date, e.g. `Senin, 5 Februari 2024`.
pub fn long_date(at: NaiveDateTime) -> String {
    let month = MONTHS
        .get(at.month0() as usize)
        .copied()
        .unwrap_or_default();
    format!(
        "{}, {} {} {}",
        day_name(at.weekday()),
        at.day(),
        month,
        at.year()
    )
}

pub fn time_limit_text(limit: TimeLimit) -> String {
    if limit.is_untimed() {
        NONE_TEXT.to_owned()
    } else {
        duration_text(limit.as_secs())
    }
}

pub fn answer_text(answer: Option<&str>) -> &str {
    answer.filter(|a| !a.is_empty()).unwrap_or(NONE_TEXT)
}

fn verdict_mark(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Correct => "✓",
        Verdict::Incorrect => "✗",
        Verdict::Undetermined => "?",
    }
}

pub fn counts_line(counts: ScoreCounts) -> String {
    format!(
        "Benar: {}   Salah: {}   Belum ditentukan: {}",
        counts.correct, counts.incorrect, counts.undetermined
    )
}

/// First line of the question screen: position, progress and the visible timers.
pub fn status_line(view: &SessionView) -> String {
    let mut status = format!(
        "Soal {}  ({} / {} terjawab",
        view.question, view.progress.answered, view.progress.total
    );
    if view.show_doubt_buttons {
        let _ = write!(status, ", {} ragu", view.progress.doubted);
    }
    status.push(')');
    if view.show_total_time {
        let label = if view.is_countdown() { "Sisa" } else { "Waktu" };
        let _ = write!(status, "   {label} {}", clock_text(view.overall.display_secs()));
    }
    if view.show_question_time {
        let _ = write!(status, "   Soal ini {}", clock_text(view.question_secs));
    }
    status
}

/// Whether the status line changes on a timer tick.
pub fn shows_timers(view: &SessionView) -> bool {
    view.show_total_time || view.show_question_time
}

/// Question screen shown after every accepted input.
pub fn session_screen(view: &SessionView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", status_line(view));

    let options: Vec<String> = view
        .options
        .iter()
        .map(|label| {
            if view.answer.as_deref() == Some(label.as_str()) {
                format!("[{label}]")
            } else {
                format!(" {label} ")
            }
        })
        .collect();
    let _ = writeln!(out, "  {}", options.join(" "));
    if view.doubted {
        let _ = writeln!(out, "  (ragu-ragu)");
    }

    let grid: Vec<String> = view
        .grid
        .iter()
        .map(|(q, answered, doubted)| {
            let mark = match (*answered, *doubted) {
                (_, true) => "?",
                (true, false) => "*",
                (false, false) => "",
            };
            format!("{q}{mark}")
        })
        .collect();
    let _ = writeln!(out, "  {}", grid.join(" "));
    out
}

/// Review header plus the result table in the requested order.
pub fn review_report(review: &TestReview, rows: &[&ReviewRow]) -> String {
    let record = &review.record;
    let mut out = String::new();
    let _ = writeln!(out, "{}", review.name);
    let _ = writeln!(out, "Tanggal tes     : {}", long_date(record.taken_at()));
    let _ = writeln!(
        out,
        "Batas waktu     : {}",
        time_limit_text(record.settings().time_limit)
    );
    let _ = writeln!(out, "Jumlah soal     : {}", record.range().len());
    let _ = writeln!(out, "Nomor soal      : {}", record.range());
    let _ = writeln!(out, "Opsi jawaban    : {}", record.settings().options);
    let _ = writeln!(
        out,
        "Waktu digunakan : {}",
        duration_text(record.time_used().total_secs)
    );
    let _ = writeln!(out, "{}", counts_line(review.sheet.counts()));
    if !record.note().is_empty() {
        let _ = writeln!(out, "Catatan         : {}", record.note());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{:>5}  {:<10} {:<10} {:<3} {}", "No", "Jawaban", "Kunci", "", "Waktu");
    for row in rows {
        let _ = writeln!(
            out,
            "{:>5}  {:<10} {:<10} {:<3} {}",
            row.question.value(),
            answer_text(row.answer.as_deref()),
            answer_text(row.key.as_deref()),
            verdict_mark(row.verdict),
            clock_text(row.seconds)
        );
    }
    out
}

pub fn list_report(items: &[TestListItem]) -> String {
    if items.is_empty() {
        return "Belum ada tes tersimpan.\n".to_owned();
    }
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {}  |  soal {}  |  {}  |  B {} S {} ? {}",
            index + 1,
            item.name,
            item.range,
            long_date(item.taken_at),
            item.counts.correct,
            item.counts.incorrect,
            item.counts.undetermined
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alum_core::model::{DisplaySettings, TestSettingsDraft};
    use alum_core::time::fixed_clock;
    use chrono::NaiveDate;
    use services::AppServices;

    fn countdown_view(show_total_time: bool) -> SessionView {
        let app = AppServices::in_memory(fixed_clock());
        let mut session = app
            .session_loop()
            .start(TestSettingsDraft {
                time_limit_minutes: 1,
                question_count: 2,
                display: DisplaySettings {
                    show_total_time,
                    ..DisplaySettings::default()
                },
                ..TestSettingsDraft::default()
            })
            .unwrap();
        session.tick();
        session.view()
    }

    #[test]
    fn status_line_follows_the_countdown() {
        let view = countdown_view(true);
        assert!(shows_timers(&view));
        assert!(status_line(&view).ends_with("Sisa 00:59"));
        assert!(session_screen(&view).starts_with(&status_line(&view)));

        let hidden = countdown_view(false);
        assert!(!shows_timers(&hidden));
        assert!(!status_line(&hidden).contains("Sisa"));
    }

    #[test]
    fn clock_and_duration() {
        assert_eq!(clock_text(0), "00:00");
        assert_eq!(clock_text(75), "01:15");
        assert_eq!(clock_text(6_000), "100:00");
        assert_eq!(duration_text(125), "2 menit 5 detik");
    }

    #[test]
    fn indonesian_long_date() {
        let at = NaiveDate::from_ymd_opt(2024, 2, 5)
            .unwrap()
            .and_hms_opt(9, 8, 7)
            .unwrap();
        assert_eq!(long_date(at), "Senin, 5 Februari 2024");
    }

    #[test]
    fn empty_values_read_as_none() {
        assert_eq!(time_limit_text(TimeLimit::Untimed), "tidak ada");
        assert_eq!(time_limit_text(TimeLimit::Minutes(2)), "2 menit 0 detik");
        assert_eq!(answer_text(None), "tidak ada");
        assert_eq!(answer_text(Some("")), "tidak ada");
        assert_eq!(answer_text(Some("C")), "C");
    }
}
