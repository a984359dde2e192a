// src/main.rs

use assessment_engine::error::EngineResult;
use assessment_engine::models::{StudyBudget, SubmittedAnswer};
use assessment_engine::pedagogy::{self, QuizRequest};
use assessment_engine::pool::{JsonFilePool, ProviderChain};
use assessment_engine::repository;
use assessment_engine::store::{ProfileStore, SqliteStore};
use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Adaptive quiz selection, grading and study planning
#[derive(Parser, Debug)]
#[command(name = "assessment-engine")]
#[command(about = "Select quizzes, grade attempts and plan study sessions from a student's mastery profile")]
struct Cli {
    /// SQLite database holding profiles, quizzes, attempts and plans
    #[arg(long, env = "ASSESSMENT_DB", default_value = "assessment.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Select a quiz from one or more question pool files
    Select {
        #[arg(long)]
        student: String,

        /// Subject the quiz is recorded under
        #[arg(long)]
        subject: String,

        /// Topics to draw questions from (comma separated, default: any)
        #[arg(long, value_delimiter = ',')]
        topics: Vec<String>,

        /// JSON question pools, consulted in the order given
        #[arg(long = "pool", required = true)]
        pools: Vec<PathBuf>,

        #[arg(long, default_value_t = 10)]
        total: usize,

        /// easy,medium,hard fractions (default: adapted to the profile)
        #[arg(long, value_parser = parse_mix)]
        mix: Option<[f64; 3]>,

        /// Pad a short quiz with repeated questions
        #[arg(long)]
        pad: bool,
    },

    /// Grade a submission (JSON array of answers) and update the profile
    Submit {
        #[arg(long)]
        student: String,

        #[arg(long)]
        quiz: String,

        #[arg(long)]
        answers: PathBuf,
    },

    /// Regenerate the study plan from the current profile
    Plan {
        #[arg(long)]
        student: String,

        #[arg(long, default_value_t = 8)]
        hours: u32,

        #[arg(long, default_value_t = 40)]
        block_minutes: u32,

        #[arg(long, default_value_t = 2)]
        weeks: u32,

        /// Plan from a neutral profile over these topics if the student has no history
        #[arg(long, value_delimiter = ',')]
        bootstrap_topics: Vec<String>,
    },

    /// Show a student's profile and attempt history
    Profile {
        #[arg(long)]
        student: String,
    },
}

fn parse_mix(s: &str) -> Result<[f64; 3], String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{}': {}", p, e)))
        .collect::<Result<Vec<f64>, String>>()?;
    parts
        .try_into()
        .map_err(|p: Vec<f64>| format!("expected 3 fractions, got {}", p.len()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectOutput<'a> {
    quiz: &'a assessment_engine::models::Quiz,
    requested: usize,
    pool_exhausted: bool,
    padded: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileOutput<'a> {
    profile: &'a assessment_engine::models::PerformanceProfile,
    overall_growth: f64,
    attempts: &'a [assessment_engine::models::QuizAttempt],
}

fn print_json(value: &impl Serialize) -> EngineResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> EngineResult<()> {
    let store = SqliteStore::open(&cli.db)?;

    match cli.command {
        Command::Select {
            student,
            subject,
            topics,
            pools,
            total,
            mix,
            pad,
        } => {
            let providers = pools
                .into_iter()
                .fold(ProviderChain::new(), |chain, path| {
                    chain.with(JsonFilePool::new(path))
                });
            let request = QuizRequest {
                student_id: student,
                subject,
                topics,
                total,
                mix,
                pad_short_quiz: pad,
            };
            let selection = pedagogy::prepare_quiz(&store, &providers, &request)?;
            print_json(&SelectOutput {
                quiz: &selection.quiz,
                requested: selection.requested,
                pool_exhausted: selection.is_exhausted(),
                padded: selection.padded,
            })
        }
        Command::Submit {
            student,
            quiz,
            answers,
        } => {
            let answers: Vec<SubmittedAnswer> =
                serde_json::from_str(&fs::read_to_string(answers)?)?;
            let outcome = pedagogy::submit_attempt(&store, &student, &quiz, &answers)?;
            print_json(&outcome.attempt)
        }
        Command::Plan {
            student,
            hours,
            block_minutes,
            weeks,
            bootstrap_topics,
        } => {
            let budget = StudyBudget {
                hours_per_week: hours,
                block_minutes,
                horizon_weeks: weeks,
            };
            let plan = pedagogy::regenerate_plan(&store, &student, budget, &bootstrap_topics)?;
            print_json(&plan)
        }
        Command::Profile { student } => {
            let profile = store.load(&student)?;
            let attempts = store.with_conn(|conn| repository::list_attempts(conn, &student))?;
            print_json(&ProfileOutput {
                profile: &profile,
                overall_growth: profile.overall_growth(),
                attempts: &attempts,
            })
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Starting assessment engine ({:?})", cli.command);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
