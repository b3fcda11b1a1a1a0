// src/cli.rs
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "Home dashboard for your workouts and daily goals", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatusCli {
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct CompletionFlag {
    /// Mark the goal as done
    #[arg(long)]
    pub done: bool,
    /// Mark the goal as not done
    #[arg(long)]
    pub undone: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the home dashboard
    Home,
    /// Show the dashboard and keep it open; type '<goal id> done|undone' to toggle goals, 'q' to quit
    Watch,
    /// Create or edit the signed-in profile
    Profile {
        /// Profile to create or switch to
        #[arg(long)]
        id: Option<String>,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<i64>,
        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,
        /// Profile picture URL
        #[arg(long, conflicts_with = "clear_image")]
        image: Option<String>,
        #[arg(long)]
        clear_image: bool,
        /// Daily step goal
        #[arg(long, conflicts_with = "clear_steps")]
        steps: Option<i64>,
        #[arg(long)]
        clear_steps: bool,
        /// Daily calorie goal
        #[arg(long, conflicts_with = "clear_calories")]
        calories: Option<i64>,
        #[arg(long)]
        clear_calories: bool,
        /// Weekly workout count goal
        #[arg(long, conflicts_with = "clear_workouts")]
        workouts: Option<i64>,
        #[arg(long)]
        clear_workouts: bool,
    },
    /// Record a workout session
    AddSession {
        /// Name of the workout (e.g., "Morning Run")
        #[arg(short, long)]
        name: String,
        /// Start time (YYYY-MM-DD HH:MM, local). Defaults to now.
        #[arg(long, value_parser = parse_local_datetime)]
        start: Option<DateTime<Local>>,
        /// Duration in minutes
        #[arg(short, long, default_value_t = 0, conflicts_with = "seconds")]
        minutes: i64,
        /// Duration in seconds
        #[arg(long)]
        seconds: Option<i64>,
        #[arg(long, value_enum, default_value_t = SessionStatusCli::Completed)]
        status: SessionStatusCli,
        #[arg(long, default_value_t = 0)]
        steps: i64,
        #[arg(long, default_value_t = 0)]
        calories: i64,
        /// Distance in km
        #[arg(long, default_value_t = 0.0)]
        distance: f64,
    },
    /// Add a goal to a day's checklist
    AddGoal {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Day of the goal (YYYY-MM-DD). Defaults to today.
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Mark a goal done or not done
    ToggleGoal {
        id: i64,
        #[command(flatten)]
        state: CompletionFlag,
    },
    /// List the stored goals of a day
    ListGoals {
        /// Day to list (YYYY-MM-DD). Defaults to today.
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Set the step goal used for the weekly target when the profile has none
    SetDefaultStepGoal { steps: i64 },
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion scripts
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

fn parse_local_datetime(s: &str) -> Result<DateTime<Local>, String> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .map_err(|e| format!("Invalid time '{s}' (expected YYYY-MM-DD HH:MM): {e}"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("'{s}' does not exist in the local time zone"))
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
