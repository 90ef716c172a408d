use std::fmt;

use alum_core::model::{DragGesture, QuestionNumber, SortBy, TestSettingsDraft};
use log::debug;
use services::{AppServices, Clock};

mod render;
mod take;

const DEFAULT_STORE: &str = "data.json";
const DEFAULT_ITEM_HEIGHT: f64 = 48.0;

#[derive(Debug, PartialEq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArg { name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidStore { raw: String },
    InvalidSort { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidStore { raw } => write!(f, "invalid --store value: {raw:?}"),
            ArgsError::InvalidSort { raw } => {
                write!(f, "invalid --sort value (nomor, ketepatan, waktu): {raw}")
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

fn require_arg(
    args: &mut impl Iterator<Item = String>,
    name: &'static str,
) -> Result<String, ArgsError> {
    match args.next() {
        Some(arg) if arg.starts_with("--") => Err(ArgsError::UnknownArg(arg)),
        Some(arg) => Ok(arg),
        None => Err(ArgsError::MissingArg { name }),
    }
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

/// A 1-based list position as typed, converted to an index.
fn parse_position(raw: String, name: &'static str) -> Result<usize, ArgsError> {
    let position: usize = parse_number(raw.clone(), name)?;
    position
        .checked_sub(1)
        .ok_or(ArgsError::InvalidNumber { flag: name, raw })
}

fn no_more_args(args: &mut impl Iterator<Item = String>) -> Result<(), ArgsError> {
    match args.next() {
        Some(arg) => Err(ArgsError::UnknownArg(arg)),
        None => Ok(()),
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Take {
        draft: TestSettingsDraft,
        name: Option<String>,
    },
    List,
    Show {
        name: String,
        sort_by: SortBy,
        ascending: bool,
    },
    Rename {
        old: String,
        new: String,
    },
    Note {
        name: String,
        text: String,
    },
    Key {
        name: String,
        question: QuestionNumber,
        label: Option<String>,
    },
    Renumber {
        name: String,
        first: QuestionNumber,
    },
    Move {
        from: usize,
        to: usize,
    },
    Drag(DragGesture),
    Delete {
        name: String,
    },
    Help,
}

#[derive(Debug, PartialEq)]
struct Args {
    store_path: String,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>, env_store: Option<String>) -> Result<Self, ArgsError> {
        let mut store_path = env_store
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE.into());

        // --store may appear anywhere; everything else belongs to the subcommand.
        let mut rest = Vec::with_capacity(argv.len());
        let mut iter = argv.into_iter();
        while let Some(arg) = iter.next() {
            if arg == "--store" {
                let value = require_value(&mut iter, "--store")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidStore { raw: value });
                }
                store_path = value;
            } else {
                rest.push(arg);
            }
        }

        let mut args = rest.into_iter();
        let command = match args.next().as_deref() {
            None | Some("--help" | "-h" | "help") => Command::Help,
            Some("take") => parse_take(&mut args)?,
            Some("list") => {
                no_more_args(&mut args)?;
                Command::List
            }
            Some("show") => parse_show(&mut args)?,
            Some("rename") => {
                let old = require_arg(&mut args, "name")?;
                let new = require_arg(&mut args, "new-name")?;
                no_more_args(&mut args)?;
                Command::Rename { old, new }
            }
            Some("note") => {
                let name = require_arg(&mut args, "name")?;
                let text = args.collect::<Vec<_>>().join(" ");
                Command::Note { name, text }
            }
            Some("key") => {
                let name = require_arg(&mut args, "name")?;
                let question = parse_number(require_arg(&mut args, "question")?, "<question>")?;
                let label = args.next();
                no_more_args(&mut args)?;
                Command::Key {
                    name,
                    question,
                    label,
                }
            }
            Some("renumber") => {
                let name = require_arg(&mut args, "name")?;
                let first = parse_number(require_arg(&mut args, "first")?, "<first>")?;
                no_more_args(&mut args)?;
                Command::Renumber { name, first }
            }
            Some("move") => {
                let from = parse_position(require_arg(&mut args, "from")?, "<from>")?;
                let to = parse_position(require_arg(&mut args, "to")?, "<to>")?;
                no_more_args(&mut args)?;
                Command::Move { from, to }
            }
            Some("drag") => parse_drag(&mut args)?,
            Some("delete") => {
                let name = require_arg(&mut args, "name")?;
                no_more_args(&mut args)?;
                Command::Delete { name }
            }
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };

        Ok(Self {
            store_path,
            command,
        })
    }
}

fn parse_take(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let mut draft = TestSettingsDraft::default();
    let mut name = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--time" => {
                draft.time_limit_minutes = parse_number(require_value(args, "--time")?, "--time")?;
            }
            "--first" => {
                draft.first_question = parse_number(require_value(args, "--first")?, "--first")?;
            }
            "--count" => {
                draft.question_count = parse_number(require_value(args, "--count")?, "--count")?;
            }
            "--options" => {
                draft.option_count =
                    parse_number(require_value(args, "--options")?, "--options")?;
            }
            "--labels" => {
                let value = require_value(args, "--labels")?;
                draft.options = Some(value.split(',').map(|l| l.trim().to_owned()).collect());
            }
            "--show-total-time" => draft.display.show_total_time = true,
            "--show-question-time" => draft.display.show_question_time = true,
            "--no-doubt" => draft.display.show_doubt_buttons = false,
            "--auto-advance" => draft.display.auto_advance = true,
            "--name" => name = Some(require_value(args, "--name")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(Command::Take { draft, name })
}

fn parse_show(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let name = require_arg(args, "name")?;
    let mut sort_by = SortBy::Number;
    let mut ascending = true;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sort" => {
                let value = require_value(args, "--sort")?;
                sort_by = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidSort { raw: value.clone() })?;
            }
            "--desc" => ascending = false,
            "--asc" => ascending = true,
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(Command::Show {
        name,
        sort_by,
        ascending,
    })
}

fn parse_drag(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let prev_index = parse_position(require_arg(args, "from")?, "<from>")?;
    let mut pointer_y = None;
    let mut item_height = DEFAULT_ITEM_HEIGHT;
    let mut margin_px = 0.0;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--y" => pointer_y = Some(parse_number(require_value(args, "--y")?, "--y")?),
            "--height" => item_height = parse_number(require_value(args, "--height")?, "--height")?,
            "--margin" => margin_px = parse_number(require_value(args, "--margin")?, "--margin")?,
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(Command::Drag(DragGesture {
        item_height,
        pointer_y: pointer_y.ok_or(ArgsError::MissingValue { flag: "--y" })?,
        margin_px,
        prev_index,
    }))
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  alum [--store <path>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  take [--time <min>] [--first <n>] [--count <n>] [--options <n> | --labels A,B,C]");
    eprintln!("       [--show-total-time] [--show-question-time] [--no-doubt] [--auto-advance]");
    eprintln!("       [--name <name>]");
    eprintln!("  list");
    eprintln!("  show <name> [--sort nomor|ketepatan|waktu] [--desc]");
    eprintln!("  rename <name> <new-name>");
    eprintln!("  note <name> <text...>");
    eprintln!("  key <name> <question> [label]      (no label clears the key)");
    eprintln!("  renumber <name> <first-question>");
    eprintln!("  move <from> <to>                   (1-based positions)");
    eprintln!("  drag <from> --y <px> [--height <px>] [--margin <px>]");
    eprintln!("  delete <name>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --store {DEFAULT_STORE}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ALUM_STORE, RUST_LOG");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = Args::parse(argv, std::env::var("ALUM_STORE").ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    debug!("opening store {}", args.store_path);
    let app = AppServices::new_json(&args.store_path, Clock::default_clock()).await?;

    match args.command {
        Command::Help => {}
        Command::Take { draft, name } => take::take_test(&app, draft, name).await?,
        Command::List => {
            let items = app.library().list().await?;
            print!("{}", render::list_report(&items));
        }
        Command::Show {
            name,
            sort_by,
            ascending,
        } => {
            let review = app.review().open(&name).await?;
            let rows = review.rows(sort_by, ascending);
            print!("{}", render::review_report(&review, &rows));
        }
        Command::Rename { old, new } => {
            let renamed = app.library().rename(&old, &new).await?;
            println!("{old:?} -> {renamed:?}");
        }
        Command::Note { name, text } => {
            app.review().set_note(&name, &text).await?;
            println!("Catatan {name:?} disimpan.");
        }
        Command::Key {
            name,
            question,
            label,
        } => {
            let mut review = app.review().open(&name).await?;
            let verdict = app
                .review()
                .set_answer_key(&mut review, question, label.as_deref())
                .await?;
            println!("Soal {question}: {verdict}");
            println!("{}", render::counts_line(review.sheet.counts()));
        }
        Command::Renumber { name, first } => {
            if app.review().change_first_question(&name, first).await? {
                println!("Nomor soal {name:?} sekarang dimulai dari {first}.");
            } else {
                println!("Nomor soal {name:?} sudah dimulai dari {first}.");
            }
        }
        Command::Move { from, to } => {
            app.library().move_test(from, to).await?;
            print!("{}", render::list_report(&app.library().list().await?));
        }
        Command::Drag(gesture) => {
            let to = app.library().drag_test(&gesture).await?;
            debug!("drag from {} landed on {to}", gesture.prev_index);
            print!("{}", render::list_report(&app.library().list().await?));
        }
        Command::Delete { name } => {
            app.library().delete(&name).await?;
            println!("{name:?} dihapus.");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(|s| (*s).to_string()).collect(), None)
    }

    #[test]
    fn store_flag_anywhere_and_env_default() {
        let args = parse(&["list", "--store", "x.json"]).unwrap();
        assert_eq!(args.store_path, "x.json");
        assert_eq!(args.command, Command::List);

        let args = Args::parse(vec!["list".into()], Some("env.json".into())).unwrap();
        assert_eq!(args.store_path, "env.json");
        assert_eq!(parse(&[]).unwrap().store_path, DEFAULT_STORE);
    }

    #[test]
    fn take_flags_fill_the_draft() {
        let args = parse(&[
            "take",
            "--time",
            "90",
            "--first",
            "21",
            "--count",
            "20",
            "--labels",
            "A, B,C",
            "--no-doubt",
        ])
        .unwrap();
        let Command::Take { draft, name } = args.command else {
            panic!("expected take");
        };
        assert_eq!(draft.time_limit_minutes, 90);
        assert_eq!(draft.first_question, 21);
        assert_eq!(draft.question_count, 20);
        assert_eq!(draft.options, Some(vec!["A".into(), "B".into(), "C".into()]));
        assert!(!draft.display.show_doubt_buttons);
        assert_eq!(name, None);
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(
            parse(&["move", "3", "1"]).unwrap().command,
            Command::Move { from: 2, to: 0 }
        );
        assert!(matches!(
            parse(&["move", "0", "1"]),
            Err(ArgsError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn show_and_key() {
        assert_eq!(
            parse(&["show", "TO 1", "--sort", "waktu", "--desc"])
                .unwrap()
                .command,
            Command::Show {
                name: "TO 1".into(),
                sort_by: SortBy::Time,
                ascending: false,
            }
        );
        assert!(matches!(
            parse(&["show", "TO 1", "--sort", "abc"]),
            Err(ArgsError::InvalidSort { .. })
        ));
        assert_eq!(
            parse(&["key", "TO 1", "4"]).unwrap().command,
            Command::Key {
                name: "TO 1".into(),
                question: QuestionNumber::new(4),
                label: None,
            }
        );
    }

    #[test]
    fn drag_needs_a_pointer() {
        assert_eq!(
            parse(&["drag", "3", "--y", "10"]).unwrap().command,
            Command::Drag(DragGesture {
                item_height: DEFAULT_ITEM_HEIGHT,
                pointer_y: 10.0,
                margin_px: 0.0,
                prev_index: 2,
            })
        );
        assert_eq!(
            parse(&["drag", "3"]),
            Err(ArgsError::MissingValue { flag: "--y" })
        );
    }

    #[test]
    fn unknown_input_is_rejected() {
        assert_eq!(
            parse(&["frobnicate"]),
            Err(ArgsError::UnknownCommand("frobnicate".into()))
        );
        assert_eq!(
            parse(&["list", "extra"]),
            Err(ArgsError::UnknownArg("extra".into()))
        );
    }
}
