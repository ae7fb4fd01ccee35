use clap::ValueEnum;
use serde::Serialize;
use wisdom21::dto::{CategoryCountDto, DisplayDto, ExposureResultDto, RolloverResultDto};
use wisdom21::models::{CycleState, Wisdom, CYCLE_DAYS, DAILY_TARGET};
use wisdom21::scheduler::CycleSummary;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
    /// Waybar-compatible JSON output
    Waybar,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs or counts)
    pub quiet: bool,
}

/// Prints a value as JSON, pretty for `--format json` and compact for waybar
fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render JSON: {}", e),
    }
}

/// Shortens text to at most `max` characters for table cells
fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

/// Short progress description, e.g. "day 3/21, 5/21 today"
fn progress(wisdom: &Wisdom) -> String {
    match wisdom.get_state() {
        CycleState::Active => format!(
            "day {}/{}, {}/{} today",
            wisdom.get_current_day(),
            CYCLE_DAYS,
            wisdom.get_exposures_today(),
            DAILY_TARGET
        ),
        state => state.to_string(),
    }
}

/// Prints a list of wisdom in the specified format
pub fn print_wisdom_list(wisdom: &[Wisdom], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if wisdom.is_empty() {
                if !config.quiet {
                    println!("No wisdom found.");
                }
                return;
            }
            if config.quiet {
                for w in wisdom {
                    println!("{}", w.get_id());
                }
                return;
            }
            let max_id = wisdom.iter().map(|w| w.get_id().len()).max().unwrap_or(2);
            let max_category = wisdom.iter().map(|w| w.get_category().chars().count()).max().unwrap_or(8).max(8);
            println!(
                "{:<id_w$}  {:<cat_w$}  {:<22}  {:1}  TEXT",
                "ID",
                "CATEGORY",
                "PROGRESS",
                "*",
                id_w = max_id,
                cat_w = max_category,
            );
            for w in wisdom {
                let favorite = if w.is_favorite() { "*" } else { " " };
                println!(
                    "{:<id_w$}  {:<cat_w$}  {:<22}  {:1}  {}",
                    w.get_id(),
                    w.get_category(),
                    progress(w),
                    favorite,
                    truncate(&w.get_text(), 60),
                    id_w = max_id,
                    cat_w = max_category,
                );
            }
        }
        OutputFormat::Json => print_json(wisdom, true),
        OutputFormat::Waybar => print_json(wisdom, false),
    }
}

/// Prints a single wisdom in the specified format
pub fn print_wisdom(wisdom: &Wisdom, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", wisdom.get_id());
                return;
            }
            println!("ID:        {}", wisdom.get_id());
            println!("Text:      {}", wisdom.get_text());
            if let Some(source) = wisdom.get_source() {
                println!("Source:    {}", source);
            }
            println!("Category:  {}", wisdom.get_category());
            println!("Favorite:  {}", if wisdom.is_favorite() { "yes" } else { "no" });
            println!("State:     {}", progress(wisdom));
            println!("Total:     {} exposures", wisdom.get_exposures_total());
            if let Some(start) = wisdom.get_start_date() {
                println!("Started:   {}", start.format("%Y-%m-%d %H:%M"));
            }
            if let Some(completed) = wisdom.get_date_completed() {
                println!("Completed: {}", completed.format("%Y-%m-%d %H:%M"));
            }
            println!("Created:   {}", wisdom.get_date_created().format("%Y-%m-%d %H:%M"));
        }
        OutputFormat::Json => print_json(wisdom, true),
        OutputFormat::Waybar => print_json(wisdom, false),
    }
}

/// Prints the result of recording an exposure
pub fn print_exposure(result: &ExposureResultDto, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", result.wisdom.get_exposures_today());
                return;
            }
            if result.recorded {
                println!("Recorded exposure: {}", progress(&result.wisdom));
            } else {
                println!("Not recorded, wisdom is {}", result.wisdom.get_state());
            }
        }
        OutputFormat::Json => print_json(result, true),
        OutputFormat::Waybar => print_json(result, false),
    }
}

/// Prints the wisdom chosen for display
///
/// Waybar output: `{"text": "<wisdom>", "tooltip": "<source> (day 3/21, 5/21 today)", "class": "wisdom"}`
/// Nothing to show: `{"text": "", "tooltip": "...", "class": "done"}` or `"class": "empty"`
pub fn print_display(display: &DisplayDto, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => match display.wisdom {
            Some(ref wisdom) => {
                if config.quiet {
                    println!("{}", wisdom.get_text());
                    return;
                }
                println!("{}", wisdom.get_text());
                if let Some(source) = wisdom.get_source() {
                    println!("  - {}", source);
                }
                println!("({})", progress(wisdom));
            }
            None => {
                if !config.quiet {
                    if display.daily_target_met {
                        println!("All active wisdom has been shown {} times today.", DAILY_TARGET);
                    } else {
                        println!("No active wisdom.");
                    }
                }
            }
        },
        OutputFormat::Json => print_json(display, true),
        OutputFormat::Waybar => print_waybar_display(display),
    }
}

/// Prints waybar-compatible JSON for the displayed wisdom
fn print_waybar_display(display: &DisplayDto) {
    let (text, tooltip, class) = match display.wisdom {
        Some(ref wisdom) => {
            let tooltip = match wisdom.get_source() {
                Some(source) => format!("{} ({})", source, progress(wisdom)),
                None => progress(wisdom),
            };
            (wisdom.get_text(), tooltip, "wisdom")
        }
        None if display.daily_target_met => (
            String::new(),
            format!("Daily target of {} met", DAILY_TARGET),
            "done",
        ),
        None => (String::new(), "No active wisdom".to_string(), "empty"),
    };
    print_json(
        &serde_json::json!({
            "text": text,
            "tooltip": tooltip,
            "class": class,
        }),
        false,
    );
}

/// Prints the outcome of a rollover
pub fn print_rollover(result: &RolloverResultDto, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            let outcome = &result.outcome;
            if config.quiet {
                println!("{}", outcome.advanced + outcome.completed);
                return;
            }
            if outcome.skipped {
                println!("Rollover for {} was already applied.", outcome.day);
                return;
            }
            println!(
                "Rolled over {}: {} advanced, {} completed",
                outcome.day, outcome.advanced, outcome.completed
            );
            for wisdom in &result.activated {
                println!("Activated from queue: {} {}", wisdom.get_id(), truncate(&wisdom.get_text(), 60));
            }
        }
        OutputFormat::Json => print_json(result, true),
        OutputFormat::Waybar => print_json(result, false),
    }
}

/// Prints the per-state counts
///
/// Waybar output: `{"text": "12", "tooltip": "...", "class": "pending"}` where the
/// text is the number of exposures still needed today.
pub fn print_summary(summary: &CycleSummary, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", summary.remaining_today);
                return;
            }
            println!("Queued:          {}", summary.queued);
            println!("Active:          {}", summary.active);
            println!("Completed:       {}", summary.completed);
            println!("Shown today:     {}", summary.exposures_today);
            println!("Remaining today: {}", summary.remaining_today);
        }
        OutputFormat::Json => print_json(summary, true),
        OutputFormat::Waybar => {
            let class = if summary.active == 0 {
                "empty"
            } else if summary.remaining_today == 0 {
                "done"
            } else {
                "pending"
            };
            let tooltip = format!(
                "{} active, {} queued, {} completed\n{} shown today, {} to go",
                summary.active,
                summary.queued,
                summary.completed,
                summary.exposures_today,
                summary.remaining_today
            );
            print_json(
                &serde_json::json!({
                    "text": summary.remaining_today.to_string(),
                    "tooltip": tooltip,
                    "class": class,
                }),
                false,
            );
        }
    }
}

/// Prints the categories with their counts
pub fn print_categories(categories: &[CategoryCountDto], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if categories.is_empty() {
                if !config.quiet {
                    println!("No categories found.");
                }
                return;
            }
            if config.quiet {
                for category in categories {
                    println!("{}", category.name);
                }
                return;
            }
            let max_name = categories.iter().map(|c| c.name.chars().count()).max().unwrap_or(4).max(4);
            println!(
                "{:<name_w$}  {:>6}  {:>6}  {:>9}  {:>5}",
                "NAME",
                "QUEUED",
                "ACTIVE",
                "COMPLETED",
                "TOTAL",
                name_w = max_name,
            );
            for category in categories {
                println!(
                    "{:<name_w$}  {:>6}  {:>6}  {:>9}  {:>5}",
                    category.name,
                    category.queued,
                    category.active,
                    category.completed,
                    category.total,
                    name_w = max_name,
                );
            }
        }
        OutputFormat::Json => print_json(categories, true),
        OutputFormat::Waybar => print_json(categories, false),
    }
}

/// Prints a simple success message (for operations that don't return data)
pub fn print_success(message: &str, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if !config.quiet {
                println!("{}", message);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({"status": "ok", "message": message}), true),
        OutputFormat::Waybar => print_json(&serde_json::json!({"status": "ok", "message": message}), false),
    }
}
