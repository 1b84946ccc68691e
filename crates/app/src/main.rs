use std::fmt;

use course_core::model::{
    Course, CourseId, Question, QuestionId, Quiz, Section, SectionId, UserProgression,
    XpPeriod, XpSnapshot,
};
use remote::{InMemoryBackend, Remote};
use services::{AnswerResult, AppServices, Clock, ProgressionConfig, XpChart};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPeriod { raw: String },
    InvalidLimit { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPeriod { raw } => write!(f, "invalid --period value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- status");
    eprintln!("  cargo run -p app -- chart [--period daily|weekly|monthly] [--limit <n>]");
    eprintln!("  cargo run -p app -- demo  [--period daily|weekly|monthly]");
    eprintln!();
    eprintln!("Environment (status, chart):");
    eprintln!("  LEARN_API_BASE_URL (required), LEARN_API_TOKEN, LEARN_API_TIMEOUT_SECS,");
    eprintln!("  LEARN_PROGRESSION_REFRESH_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    Chart,
    Demo,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "status" => Some(Self::Status),
            "chart" => Some(Self::Chart),
            "demo" => Some(Self::Demo),
            _ => None,
        }
    }
}

struct Args {
    period: XpPeriod,
    limit: Option<usize>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut period = XpPeriod::Daily;
        let mut limit = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--period" => {
                    let value = require_value(args, "--period")?;
                    period = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPeriod { raw: value.clone() })?;
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    let parsed: usize = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                    limit = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { period, limit })
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so stdout only carries the report.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_progression(progression: &UserProgression) {
    println!(
        "Level {}  |  {} XP total  |  {}/{} XP into level ({:.0}%)",
        progression.level,
        progression.total_xp,
        progression.current_level_xp,
        progression.total_xp_for_next_level,
        progression.level_progress
    );
}

fn print_chart(chart: &XpChart) {
    const BAR_WIDTH: u64 = 30;
    let max = chart.max_xp().max(1);
    println!("XP history ({})", chart.period);
    if chart.fallback {
        println!("  (history unavailable, showing an empty chart)");
    }
    for bucket in &chart.buckets {
        let filled = usize::try_from(bucket.xp * BAR_WIDTH / max).unwrap_or(0);
        println!(
            "  {:<8} {}  {:>7}  {}",
            bucket.label,
            bucket.iso_date(),
            bucket.xp,
            "#".repeat(filled)
        );
    }
}

async fn run_status() -> Result<(), Box<dyn std::error::Error>> {
    let services = AppServices::from_env(Clock::default_clock())?;
    let tracker = services.tracker();
    let refreshed = tracker.refresh().await;
    services.dispose();
    refreshed?;
    print_progression(&tracker.snapshot());
    Ok(())
}

async fn run_chart(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let services = AppServices::from_env(Clock::default_clock())?;
    let history = services.xp_history();
    let chart = match args.limit {
        Some(limit) => history.chart(args.period, limit).await,
        None => history.default_chart(args.period).await,
    };
    services.dispose();
    print_chart(&chart);
    Ok(())
}

fn demo_course() -> Result<Course, Box<dyn std::error::Error>> {
    let options = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
    let quiz = Quiz::new(vec![
        Question::new(
            QuestionId::new("q1"),
            "Which keyword moves a closure's captures?",
            options(&["ref", "move", "static"]),
            1,
        )?,
        Question::new(
            QuestionId::new("q2"),
            "What does `?` do on an Err?",
            options(&["panics", "returns early", "ignores it"]),
            1,
        )?,
    ]);
    Ok(Course::new(
        CourseId::new("demo"),
        "Demo course",
        vec![
            Section::new(SectionId::new("basics"), "Basics").with_quiz(quiz),
            Section::new(SectionId::new("reading"), "Further reading"),
        ],
    ))
}

/// Offline walk-through against the in-memory backend.
async fn run_demo(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::default_clock();
    let course = demo_course()?;
    let mut backend = InMemoryBackend::new(clock)
        .with_total_xp(380)
        .with_snapshots(vec![XpSnapshot::new(clock.today(), 380)]);
    for section in course.sections() {
        backend = backend.with_section(section.clone());
    }

    let services = AppServices::new(
        Remote::in_memory(backend),
        clock,
        ProgressionConfig::default(),
    );
    services.start();
    let tracker = services.tracker();
    tracker.refresh().await?;
    print_progression(&tracker.snapshot());

    let coordinator = services.coordinator();
    coordinator.register_course(&course);

    let runner = services.quiz_runner(course.id().clone(), &course.sections()[0])?;
    runner.start()?;
    for answer in [1, 1] {
        runner.select_option(answer)?;
        if let AnswerResult::Completed(outcome) = runner.submit_answer().await? {
            info!(xp = outcome.xp_earned, "quiz section completed");
        }
    }

    let reading = &course.sections()[1];
    let outcome = coordinator
        .complete(course.id(), reading.id(), reading.xp_reward())
        .await?;
    if outcome.course_completed {
        println!("Course \"{}\" completed", course.title());
    }
    if let Some(level) = tracker.acknowledge_level_up() {
        println!("Level up! Now level {level}");
    }
    print_progression(&tracker.snapshot());

    let chart = match args.limit {
        Some(limit) => services.xp_history().chart(args.period, limit).await,
        None => services.xp_history().default_chart(args.period).await,
    };
    print_chart(&chart);
    services.dispose();
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Status,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Status,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();
    match cmd {
        Command::Status => run_status().await,
        Command::Chart => run_chart(&args).await,
        Command::Demo => run_demo(&args).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
