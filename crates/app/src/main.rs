use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{OptionId, SessionSummary};
use quiz_core::{Clock, QuizSession};
use quiz_services::{DeadlineTimer, QuizLoopService, QuizPack, SessionPlanner};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingPack,
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingPack => write!(f, "no quiz pack given (use --pack or QUIZ_PACK)"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz --pack <file.json> [--round-time <secs>] [--pass <n>] [--max <n>] [--shuffle]");
    eprintln!();
    eprintln!("Answer by typing the number of an option. Ctrl-D quits.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_PACK, QUIZ_ROUND_TIME, QUIZ_LOG (tracing filter, overridden by RUST_LOG)");
}

struct Args {
    pack: PathBuf,
    round_time_secs: Option<u32>,
    pass_threshold: Option<usize>,
    max_questions: Option<usize>,
    shuffle: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut pack = std::env::var("QUIZ_PACK").ok().map(PathBuf::from);
        let mut round_time_secs = match std::env::var("QUIZ_ROUND_TIME") {
            Ok(raw) => Some(parse_number(raw, "QUIZ_ROUND_TIME")?),
            Err(_) => None,
        };
        let mut pass_threshold = None;
        let mut max_questions = None;
        let mut shuffle = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--pack" => pack = Some(PathBuf::from(require_value(args, "--pack")?)),
                "--round-time" => {
                    let value = require_value(args, "--round-time")?;
                    round_time_secs = Some(parse_number(value, "--round-time")?);
                }
                "--pass" => {
                    let value = require_value(args, "--pass")?;
                    pass_threshold = Some(parse_number(value, "--pass")?);
                }
                "--max" => {
                    let value = require_value(args, "--max")?;
                    max_questions = Some(parse_number(value, "--max")?);
                }
                "--shuffle" => shuffle = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            pack: pack.ok_or(ArgsError::MissingPack)?,
            round_time_secs,
            pass_threshold,
            max_questions,
            shuffle,
        })
    }

    fn planner(&self) -> SessionPlanner {
        let planner = SessionPlanner::new()
            .with_shuffle_questions(self.shuffle)
            .with_shuffle_options(self.shuffle);
        match self.max_questions {
            Some(max) => planner.with_max_questions(max),
            None => planner,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("QUIZ_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render_question(session: &QuizSession, clock: &Clock) {
    let Some(question) = session.current_question() else {
        return;
    };
    let progress = session.progress();
    println!();
    println!(
        "Question {}/{}  (score {})",
        session.current_index() + 1,
        progress.total,
        progress.score
    );
    println!("{}", question.prompt());
    for (n, option) in question.options().iter().enumerate() {
        match option.icon() {
            Some(icon) => println!("  {}. {icon} {}", n + 1, option.label()),
            None => println!("  {}. {}", n + 1, option.label()),
        }
    }
    if let Some(deadline) = session.deadline() {
        println!("  ({}s to answer)", deadline.remaining(clock.now()).num_seconds());
    }
}

/// Maps a typed line to the option it selects, by 1-based position.
fn pick_option(session: &QuizSession, line: &str) -> Option<OptionId> {
    let question = session.current_question()?;
    let n: usize = line.trim().parse().ok()?;
    question
        .options()
        .get(n.checked_sub(1)?)
        .map(|option| option.id().clone())
}

fn print_summary(summary: &SessionSummary) {
    println!();
    println!(
        "Finished: {}/{} correct ({} timed out)",
        summary.correct(),
        summary.total(),
        summary.timed_out()
    );
    match summary.outcome().is_pass() {
        Some(true) => println!("Passed!"),
        Some(false) => println!("Not quite. Try again!"),
        None => {}
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        print_usage();
        e
    })?;

    tracing::debug!(pack = %args.pack.display(), shuffle = args.shuffle, "starting quiz host");
    let mut pack = QuizPack::load(&args.pack)?;
    if args.round_time_secs.is_some() {
        pack.quiz.round_time_secs = args.round_time_secs;
    }
    if args.pass_threshold.is_some() {
        pack.quiz.pass_threshold = args.pass_threshold;
    }
    println!("{} ({} questions)", pack.title, pack.question_count());
    let config = pack.into_config()?;

    let clock = Clock::system();
    let service = QuizLoopService::new(clock).with_planner(args.planner());
    let mut session = service.start_session(config)?;
    let (mut timer, mut deadlines) = DeadlineTimer::new(clock);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut shown = None;
    while !session.is_complete() {
        if shown != Some(session.current_index()) {
            render_question(&session, &clock);
            shown = Some(session.current_index());
        }
        timer.sync(session.deadline());

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    println!("Bye!");
                    return Ok(());
                };
                let Some(option) = pick_option(&session, &line) else {
                    let count = session.current_question().map_or(0, |q| q.options().len());
                    println!("Type a number from 1 to {count}.");
                    continue;
                };
                let result = service.answer_current(&mut session, &option)?;
                match result.choice {
                    Some(choice) if choice.is_correct() => println!("Correct!"),
                    Some(_) => println!("Not this time."),
                    None => {}
                }
            }
            Some(elapsed) = deadlines.recv() => {
                let result = service.expire_current(&mut session, elapsed.deadline)?;
                if result.choice.is_some() {
                    println!("Time's up!");
                }
            }
        }
    }
    timer.cancel();

    print_summary(&session.summary()?);
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
