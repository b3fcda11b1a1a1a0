// src/terminal.rs
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use fit_home_lib::format;
use fit_home_lib::presenter::{
    GoalList, Header, HomeView, ProgressRings, Ring, TodayActivity, WeekCheckmarks, WeeklyChart,
    WeeklyTarget,
};
use fit_home_lib::ProfileImage;

const BAR_WIDTH: usize = 30;

/// Prints every widget update to stdout as it arrives.
pub struct TerminalView {
    header_color: Color,
}

impl TerminalView {
    pub fn new(header_color: Color) -> Self {
        Self { header_color }
    }

    fn table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(headers.iter().map(|h| {
                Cell::new(h)
                    .fg(self.header_color)
                    .add_attribute(Attribute::Bold)
            }));
        table
    }
}

fn bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn ring_row(table: &mut Table, label: &str, ring: &Ring) {
    table.add_row(vec![
        Cell::new(label),
        Cell::new(format!("{}{}", ring.value_text, ring.goal_text)),
        Cell::new(bar(ring.fraction)),
    ]);
}

impl HomeView for TerminalView {
    fn show_header(&mut self, header: &Header) {
        println!();
        let badge = if header.show_badge { "  (!) complete your profile" } else { "" };
        println!("Hello, {}{}", header.greeting, badge);
        if let ProfileImage::Url(url) = &header.image {
            println!("Picture: {url}");
        }
    }

    fn show_today(&mut self, today: &TodayActivity) {
        let mut table = self.table(&["Steps", "Calories", "Active min", "Distance"]);
        table.add_row(vec![
            &today.steps_text,
            &today.calories_text,
            &today.active_minutes_text,
            &today.distance_text,
        ]);
        println!("Today\n{table}");
    }

    fn show_progress_rings(&mut self, rings: &ProgressRings) {
        if rings.steps.is_none() && rings.calories.is_none() {
            return;
        }
        let mut table = self.table(&["Daily goal", "Progress", ""]);
        if let Some(ring) = &rings.steps {
            ring_row(&mut table, "Steps", ring);
        }
        if let Some(ring) = &rings.calories {
            ring_row(&mut table, "Calories", ring);
        }
        println!("{table}");
    }

    fn show_weekly_target(&mut self, target: &WeeklyTarget) {
        println!(
            "Weekly target: {} [{}] {}",
            target.summary_text,
            bar(f64::from(target.progress.percent) / 100.0),
            target.percent_text
        );
    }

    fn show_checkmarks(&mut self, checkmarks: &WeekCheckmarks) {
        let headers: Vec<String> = checkmarks.days.iter().map(|d| d.weekday.to_string()).collect();
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let mut table = self.table(&header_refs);
        table.add_row(checkmarks.days.iter().map(|day| {
            let cell = Cell::new(day.symbol());
            if day.complete {
                cell.fg(Color::Green).add_attribute(Attribute::Bold)
            } else {
                cell.add_attribute(Attribute::Dim)
            }
        }));
        println!("{table}");
    }

    fn show_goals(&mut self, goals: &GoalList) {
        if goals.is_empty() {
            println!("No goals for {}. Add one with 'add-goal'.", goals.date);
            return;
        }
        let mut table = self.table(&["ID", "Goal", "Details", ""]);
        for entry in &goals.entries {
            let id = entry
                .stored_id()
                .map_or_else(|| "-".to_string(), |id| id.to_string());
            let status = if entry.is_completed() {
                Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold)
            } else {
                Cell::new("○").add_attribute(Attribute::Dim)
            };
            table.add_row(vec![
                Cell::new(id),
                Cell::new(entry.title()),
                Cell::new(entry.description()),
                status,
            ]);
        }
        println!("Goals for {}\n{table}", goals.date);
    }

    fn show_chart(&mut self, chart: &WeeklyChart) {
        let max = chart.bars.iter().map(|b| b.steps).max().unwrap_or(0);
        println!("Steps this week");
        for bar_data in &chart.bars {
            let fraction = if max > 0 { bar_data.steps as f64 / max as f64 } else { 0.0 };
            println!(
                "  {:<4}{} {}",
                bar_data.label,
                bar(fraction),
                format::thousands(bar_data.steps)
            );
        }
    }
}
