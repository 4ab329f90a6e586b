mod config;
mod domain;
mod planners;
mod storage;
mod ui;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::config::load_config;
use crate::domain::{
	CoverageIndex, Day, Priority, day_stats, format_minutes, slot_times,
};
use crate::planners::{recent_planner_dirs, remember_planner_dir, resolve_planner_dir};
use crate::storage::{date_key, load_day, save_day, saved_days};
use crate::ui::{run_dashboard, slot_label};

#[derive(Debug, Parser)]
#[command(name = "slotplan", about = "Terminal day planner on half-hour slots")]
struct Cli {
	#[arg(long)]
	dir: Option<PathBuf>,
	#[arg(long)]
	day: Option<String>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Dashboard,
	AddTask {
		#[arg(long)]
		title: String,
		#[arg(long)]
		start: String,
		#[arg(long)]
		end: String,
		#[arg(long, default_value = "")]
		description: String,
		#[arg(long, default_value = "normal")]
		priority: String,
		#[arg(long)]
		color: Option<String>,
	},
	AddNote {
		#[arg(long)]
		title: String,
		#[arg(long)]
		time: String,
		#[arg(long, default_value = "normal")]
		priority: String,
	},
	RemoveTask {
		#[arg(long)]
		id: String,
	},
	RemoveNote {
		#[arg(long)]
		id: String,
	},
	Show,
	Stats,
	Days,
	Planners {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	if let Some(Command::Planners { limit }) = &cli.command {
		print_recent_planners(*limit)?;
		return Ok(());
	}

	let planner_dir = resolve_planner_dir(cli.dir)?;
	if let Err(err) = remember_planner_dir(&planner_dir) {
		eprintln!("warning: failed to store recent planner: {err}");
	}
	let selected_day = parse_day(cli.day.as_deref())?;

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init => {
			fs::create_dir_all(&planner_dir)?;
			println!("initialized planner at {}", planner_dir.display());
		}
		Command::Dashboard => {
			run_dashboard(&planner_dir, selected_day)?;
		}
		Command::AddTask {
			title,
			start,
			end,
			description,
			priority,
			color,
		} => {
			let priority = parse_priority(&priority)?;
			let color = color.unwrap_or_else(|| load_config(&planner_dir).default_task_color);
			let mut day = Day::new(load_day(&planner_dir, selected_day)?);
			let task_id = day.add_task(title, description, &start, &end, priority, color)?;
			save_day(&planner_dir, selected_day, day.record())?;
			println!("created task {task_id}");
		}
		Command::AddNote {
			title,
			time,
			priority,
		} => {
			let priority = parse_priority(&priority)?;
			let mut day = Day::new(load_day(&planner_dir, selected_day)?);
			let note_id = day.add_note(title, &time, priority)?;
			save_day(&planner_dir, selected_day, day.record())?;
			println!("created note {note_id}");
		}
		Command::RemoveTask { id } => {
			let mut day = Day::new(load_day(&planner_dir, selected_day)?);
			day.remove_task(&id)?;
			save_day(&planner_dir, selected_day, day.record())?;
			println!("removed task {id}");
		}
		Command::RemoveNote { id } => {
			let mut day = Day::new(load_day(&planner_dir, selected_day)?);
			day.remove_note(&id)?;
			save_day(&planner_dir, selected_day, day.record())?;
			println!("removed note {id}");
		}
		Command::Show => {
			let day = Day::new(load_day(&planner_dir, selected_day)?);
			print_schedule(&planner_dir, selected_day, &day);
		}
		Command::Stats => {
			let day = Day::new(load_day(&planner_dir, selected_day)?);
			print_stats(selected_day, &day);
		}
		Command::Days => {
			print_saved_days(&planner_dir)?;
		}
		Command::Planners { .. } => {}
	}

	Ok(())
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	if let Some(raw) = input {
		Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?)
	} else {
		Ok(Local::now().date_naive())
	}
}

fn parse_priority(input: &str) -> Result<Priority, Box<dyn Error>> {
	Priority::from_key(input).ok_or_else(|| {
		format!("unknown priority '{input}', expected urgent, high, normal, or low").into()
	})
}

fn print_recent_planners(limit: usize) -> Result<(), Box<dyn Error>> {
	let rows = recent_planner_dirs(limit)?;
	if rows.is_empty() {
		println!("no recent planners");
		return Ok(());
	}

	for (index, path) in rows.iter().enumerate() {
		println!("{:>2}. {}", index + 1, path.display());
	}

	Ok(())
}

fn print_schedule(planner_dir: &Path, selected_day: NaiveDate, day: &Day) {
	let config = load_config(planner_dir);
	let coverage = CoverageIndex::build(day.tasks());

	println!("schedule for {}", date_key(selected_day));
	for (slot, time) in slot_times().iter().enumerate() {
		let mut entries = Vec::new();
		for task_id in coverage.tasks_in_slot(slot) {
			if let Some(task) = day.task(task_id) {
				entries.push(format!("[{}] {}", task.priority.key(), task.short_title()));
			}
		}
		for note in day.notes_in_slot(slot) {
			entries.push(format!("note[{}] {}", note.priority.key(), note.title));
		}

		println!("{:>8} | {}", slot_label(config.clock, time), entries.join(" | "));
	}
}

fn print_stats(selected_day: NaiveDate, day: &Day) {
	let stats = day_stats(day.tasks());

	println!("statistics for {}", date_key(selected_day));
	println!(
		"scheduled {} | free {}",
		format_minutes(stats.scheduled_minutes),
		format_minutes(stats.free_minutes)
	);

	println!("\nby priority:");
	for (priority, minutes) in &stats.by_priority {
		println!("{:>8} | {}", priority.label(), format_minutes(*minutes));
	}

	if stats.durations.is_empty() {
		return;
	}

	println!("\ndurations:");
	for entry in &stats.durations {
		let (title, window) = day
			.task(&entry.task_id)
			.map(|task| (task.short_title(), format!("{}-{}", task.start, task.end)))
			.unwrap_or_else(|| ("Unknown task".to_string(), String::new()));
		println!(
			"{:>6} | {} | {} | {}",
			format_minutes(entry.minutes),
			entry.task_id,
			window,
			title
		);
	}
}

fn print_saved_days(planner_dir: &Path) -> Result<(), Box<dyn Error>> {
	let days = saved_days(planner_dir)?;
	if days.is_empty() {
		println!("no saved days");
		return Ok(());
	}

	for day in days {
		println!("{}", date_key(day));
	}

	Ok(())
}
