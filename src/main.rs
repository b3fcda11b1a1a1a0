// src/main.rs
mod cli; // Keep cli module for parsing args
mod terminal;

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use std::io::{stdin, stdout, BufRead};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use fit_home_lib::{
    AddSessionParams, AppService, HomeScreen, ProfileUpdate, SessionStatus, SystemClock,
};
use terminal::TerminalView;

const RENDER_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> Result<()> {
    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args();

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();

        eprintln!("Generating completion script for {}...", shell);
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    // Initialize the application service (loads config, connects to DB)
    let mut service = AppService::initialize().context("Failed to initialize application service")?;
    init_tracing(&service.config.log_filter);

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        cli::Commands::Home => {
            let mut view = TerminalView::new(service.config.header_color());
            if !service.presenter().render(&mut view, &Local::now()) {
                bail!("Dashboard could not be rendered. Is a profile signed in? See 'profile --help'.");
            }
        }
        cli::Commands::Watch => run_watch(&service)?,
        cli::Commands::Profile {
            id, name, age, weight,
            image, clear_image,
            steps, clear_steps,
            calories, clear_calories,
            workouts, clear_workouts,
        } => {
            let update = ProfileUpdate {
                user_id: id,
                display_name: name,
                profile_image_url: optional_update(image, clear_image),
                daily_step_goal: optional_update(steps, clear_steps),
                daily_calorie_goal: optional_update(calories, clear_calories),
                weekly_workout_goal: optional_update(workouts, clear_workouts),
                age,
                weight_kg: weight,
            };
            let user = service.update_profile(update)?;
            print_profile(&service, &user);
        }
        cli::Commands::AddSession {
            name, start, minutes, seconds, status, steps, calories, distance,
        } => {
            let start_time = start.unwrap_or_else(Local::now).with_timezone(&Utc);
            let id = service.add_session(AddSessionParams {
                workout_name: name.clone(),
                start_time,
                duration_seconds: seconds.unwrap_or(minutes * 60),
                status: cli_status_to_db_status(status),
                steps,
                calories_burned: calories,
                distance_km: distance,
            })?;
            println!("Successfully added session '{}' ID: {}", name.trim(), id);
        }
        cli::Commands::AddGoal { title, description, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let id = service.add_goal(date, &title, &description)?;
            println!("Successfully added goal '{}' for {} ID: {}", title.trim(), date, id);
        }
        cli::Commands::ToggleGoal { id, state } => {
            let goal = service.toggle_goal(id, state.done)?;
            let verb = if goal.is_completed { "done" } else { "not done" };
            println!("Goal '{}' (ID {}) marked {}.", goal.title, goal.goal_id, verb);
        }
        cli::Commands::ListGoals { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let goals = service.list_goals(date)?;
            if goals.is_empty() {
                println!("No goals for {date}.");
            } else {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["ID", "Title", "Description", "Done", "Completed at"].map(|h| {
                        Cell::new(h)
                            .fg(service.config.header_color())
                            .add_attribute(Attribute::Bold)
                    }));
                for goal in goals {
                    table.add_row(vec![
                        goal.goal_id.to_string(),
                        goal.title,
                        goal.description,
                        if goal.is_completed { "✓" } else { "○" }.to_string(),
                        goal.completed_at
                            .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default(),
                    ]);
                }
                println!("{table}");
            }
        }
        cli::Commands::SetDefaultStepGoal { steps } => {
            service.set_default_daily_step_goal(steps)?;
            println!("Default daily step goal set to {steps}.");
        }
        cli::Commands::DbPath => {
            println!("Database file is located at: {:?}", service.get_db_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn optional_update<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn cli_status_to_db_status(status: cli::SessionStatusCli) -> SessionStatus {
    match status {
        cli::SessionStatusCli::InProgress => SessionStatus::InProgress,
        cli::SessionStatusCli::Completed => SessionStatus::Completed,
        cli::SessionStatusCli::Cancelled => SessionStatus::Cancelled,
    }
}

fn print_profile(service: &AppService, user: &fit_home_lib::UserProfile) {
    let goal = |g: Option<i64>| g.map_or_else(|| "-".to_string(), fit_home_lib::format::thousands);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Field", "Value"].map(|h| {
            Cell::new(h)
                .fg(service.config.header_color())
                .add_attribute(Attribute::Bold)
        }));
    table.add_row(vec!["ID".to_string(), user.user_id.clone()]);
    table.add_row(vec!["Name".to_string(), user.display_name.clone()]);
    table.add_row(vec!["Age".to_string(), user.age.to_string()]);
    table.add_row(vec!["Weight (kg)".to_string(), format!("{:.1}", user.weight_kg)]);
    table.add_row(vec!["Daily steps".to_string(), goal(user.daily_step_goal)]);
    table.add_row(vec!["Daily calories".to_string(), goal(user.daily_calorie_goal)]);
    table.add_row(vec!["Weekly workouts".to_string(), goal(user.weekly_workout_goal)]);
    println!("Profile '{}' saved and signed in.\n{table}", user.user_id);
}

/// Keeps one screen open and feeds it goal toggles read from stdin.
fn run_watch(service: &AppService) -> Result<()> {
    let view = TerminalView::new(service.config.header_color());
    let mut screen = HomeScreen::open(service.presenter(), view, SystemClock)?;
    if !screen.wait_for_render(RENDER_TIMEOUT) {
        eprintln!("Nothing to show yet. Is a profile signed in?");
    }

    println!("\nCommands: '<goal id> done', '<goal id> undone', 'q' to quit.");
    for line in stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("q" | "quit"), _) => break,
            (Some(id), Some(state @ ("done" | "undone"))) => {
                let Ok(id) = id.parse::<i64>() else {
                    eprintln!("'{id}' is not a goal ID.");
                    continue;
                };
                match screen.toggle_goal(id, state == "done") {
                    Ok(()) => {
                        screen.wait_for_render(RENDER_TIMEOUT);
                    }
                    Err(e) => eprintln!("Error: {e:#}"),
                }
            }
            (None, _) => {
                screen.pump();
            }
            _ => eprintln!("Unknown input. Use '<goal id> done|undone' or 'q'."),
        }
    }
    screen.close();
    Ok(())
}
