use std::collections::HashSet;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, Local, NaiveDate, Timelike};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::config::{ClockFormat, Config, load_config};
use crate::domain::{
	CoverageIndex, Day, DayRecord, DayStats, Priority, SLOTS_PER_DAY, clamp_to_slot, day_stats,
	format_minutes, slot_of_minutes, slot_time, to_12_hour,
};
use crate::planners::{recent_planner_dirs, remember_planner_dir};
use crate::storage::{load_day, save_day, saved_days};

const TERMINAL_COLORS: [&str; 16] = [
	"black",
	"red",
	"green",
	"yellow",
	"blue",
	"magenta",
	"cyan",
	"gray",
	"dark_gray",
	"light_red",
	"light_green",
	"light_yellow",
	"light_blue",
	"light_magenta",
	"light_cyan",
	"white",
];
const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);

pub fn run_dashboard(planner_dir: &Path, initial_day: NaiveDate) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, planner_dir.to_path_buf(), initial_day);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	mut planner_dir: PathBuf,
	initial_day: NaiveDate,
) -> Result<(), Box<dyn Error>> {
	let mut config = load_config(&planner_dir);
	let mut day = Day::new(load_day(&planner_dir, initial_day)?);
	let mut app = App::new(initial_day, config.day_start_slot());
	let mut cached: Option<(ViewKey, ViewModel)> = None;

	loop {
		let now = Local::now();
		let clock_slot = if app.selected_day == now.date_naive() {
			Some(slot_of_minutes(now.hour() * 60 + now.minute()))
		} else {
			None
		};

		// Coverage and statistics are pure functions of the task list, so the
		// view is only rebuilt when the day version (or display state) moves.
		let key = ViewKey {
			version: day.version(),
			day: app.selected_day,
			filter: app.filter,
			clock_slot,
		};
		if cached.as_ref().map(|(cached_key, _)| cached_key != &key).unwrap_or(true) {
			let view = build_view(&day, &planner_dir, &config, app.filter, clock_slot);
			cached = Some((key, view));
		}
		let view = cached.as_ref().map(|(_, view)| view.clone()).expect("view was just built");

		terminal.draw(|frame| draw_dashboard(frame, &app, &view))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, &config),
					InputMode::Select(_) => handle_select_key(
						&mut app,
						key.code,
						&mut day,
						&mut planner_dir,
						&mut config,
					),
					InputMode::Normal => {
						handle_normal_key(&mut app, key.code, &mut day, &mut planner_dir, &view)
					}
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(12), Constraint::Length(4)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
		.split(layout[0]);

	let left = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(11), Constraint::Min(8)])
		.split(body[0]);

	render_calendar_panel(frame, left[0], app, &view.calendar_active_days);
	render_stats_panel(frame, left[1], &view.stats);
	render_slots_panel(frame, body[1], app, view);
	render_footer(frame, layout[1], app);

	if let InputMode::Select(select) = &app.mode {
		render_select_popup(frame, select);
	}
}

fn render_calendar_panel(
	frame: &mut Frame,
	area: Rect,
	app: &App,
	active_days: &HashSet<NaiveDate>,
) {
	let month = app.calendar_month;
	let selected_day = app.selected_day;
	let mut lines = Vec::new();
	lines.push(Line::from(format!("{} {}", month.format("%B"), month.year())));
	lines.push(Line::from("Mo Tu We Th Fr Sa Su"));

	let first_weekday = month.weekday().number_from_monday() as usize - 1;
	let days_in_month = days_in_month(month.year(), month.month());
	let mut day_counter = 1u32;
	for week in 0..6 {
		let mut spans = Vec::new();
		for weekday_index in 0..7 {
			let before_first = week == 0 && weekday_index < first_weekday;
			let after_last = day_counter > days_in_month;
			if before_first || after_last {
				spans.push(Span::raw("   "));
				continue;
			}

			let date = NaiveDate::from_ymd_opt(month.year(), month.month(), day_counter)
				.expect("calendar day must be valid");
			let mut style = Style::default();
			if date == selected_day {
				style = style.fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD);
			} else if active_days.contains(&date) {
				style = style.fg(Color::LightYellow).add_modifier(Modifier::BOLD);
			}

			spans.push(Span::styled(format!("{:>2} ", day_counter), style));
			day_counter += 1;
		}
		lines.push(Line::from(spans));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title("Calendar")
		.border_style(border_style(app.focus == FocusPane::Calendar));
	let calendar = Paragraph::new(lines).block(block);
	frame.render_widget(calendar, area);
}

fn render_stats_panel(frame: &mut Frame, area: Rect, stats: &StatsView) {
	let mut lines = Vec::new();
	lines.push(Line::from(format!("Scheduled: {}", format_minutes(stats.scheduled_minutes))));
	lines.push(Line::from(format!("Free:      {}", format_minutes(stats.free_minutes))));
	lines.push(Line::from(""));
	lines.push(Line::from("By Priority"));

	let max_minutes = stats
		.by_priority
		.iter()
		.map(|row| row.minutes)
		.max()
		.unwrap_or(0)
		.max(1);
	for row in &stats.by_priority {
		let width = ((row.minutes as f64 / max_minutes as f64) * 16.0).round() as usize;
		let bar = "=".repeat(width.max(1));
		lines.push(Line::from(vec![
			Span::styled(format!("{:>6}", row.label), row.style),
			Span::raw(format!(" {:>5} ", format_minutes(row.minutes))),
			Span::raw(if row.minutes == 0 { String::new() } else { bar }),
		]));
	}

	lines.push(Line::from(""));
	lines.push(Line::from("Durations"));
	if stats.durations.is_empty() {
		lines.push(Line::from("(no tasks)"));
	} else {
		for row in stats.durations.iter().take(8) {
			lines.push(Line::from(vec![
				Span::raw(format!("{:>5} ", format_minutes(row.minutes))),
				Span::styled(row.title.clone(), row.style),
			]));
		}
	}

	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Day Stats"));
	frame.render_widget(panel, area);
}

fn render_slots_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = view
		.slot_rows
		.iter()
		.map(|row| ListItem::new(render_slot_row_line(row)))
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	state.select(Some(app.slot_index.min(SLOTS_PER_DAY - 1)));

	let filter_text = match app.filter {
		Some(priority) => format!(" | filter: {}", priority.label()),
		None => String::new(),
	};
	let title = format!(
		"{} | scheduled {}{}",
		app.selected_day.format("%A, %d %B %Y"),
		format_minutes(view.stats.scheduled_minutes),
		filter_text
	);

	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(title)
				.border_style(border_style(app.focus == FocusPane::Slots)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_slot_row_line(row: &SlotRow) -> Line<'static> {
	let label_style = if row.is_now {
		Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(Color::DarkGray)
	};

	let mut spans = vec![
		Span::styled(format!("{:>8} ", row.label), label_style),
		Span::styled(
			if row.tasks.is_empty() { "  . " } else { "  # " },
			Style::default().fg(Color::DarkGray),
		),
	];

	for (index, task) in row.tasks.iter().enumerate() {
		if index > 0 {
			spans.push(Span::raw(" | "));
		}
		spans.push(Span::styled(task.title.clone(), task.style));
	}

	for note in &row.notes {
		spans.push(Span::raw(" * "));
		spans.push(Span::styled(note.title.clone(), note.style));
	}

	Line::from(spans)
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("Tab pane | arrows/hjkl navigate | n/N month | q quit"),
			Line::from("t new task | m new note | d delete (slot) | f filter priority | g switch planner"),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 55, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let current = if select.options.is_empty() {
		0
	} else {
		select.selected.saturating_add(1)
	};
	let total = select.options.len();
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(format!("{} ({current}/{total})", select.title)),
		)
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	day: &mut Day,
	planner_dir: &mut PathBuf,
	view: &ViewModel,
) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Tab | KeyCode::BackTab => {
			app.focus = app.focus.toggle();
			false
		}
		KeyCode::Up | KeyCode::Char('k') => {
			match app.focus {
				FocusPane::Calendar => shift_selected_day(app, day, planner_dir, -7),
				FocusPane::Slots => app.move_slot_selection(-1),
			}
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			match app.focus {
				FocusPane::Calendar => shift_selected_day(app, day, planner_dir, 7),
				FocusPane::Slots => app.move_slot_selection(1),
			}
			false
		}
		KeyCode::Left | KeyCode::Char('h') => {
			match app.focus {
				FocusPane::Calendar => shift_selected_day(app, day, planner_dir, -1),
				FocusPane::Slots => app.move_slot_selection(-2),
			}
			false
		}
		KeyCode::Right | KeyCode::Char('l') => {
			match app.focus {
				FocusPane::Calendar => shift_selected_day(app, day, planner_dir, 1),
				FocusPane::Slots => app.move_slot_selection(2),
			}
			false
		}
		KeyCode::Char('n') => {
			shift_selected_month(app, day, planner_dir, 1);
			false
		}
		KeyCode::Char('N') => {
			shift_selected_month(app, day, planner_dir, -1);
			false
		}
		KeyCode::Char('f') => {
			app.filter = cycle_filter(app.filter);
			app.status = match app.filter {
				Some(priority) => format!("Showing {} only", priority.label()),
				None => "Showing all priorities".to_string(),
			};
			false
		}
		KeyCode::Char('t') => {
			app.mode = InputMode::Prompt(PromptState::with_input(
				"Task start (HH:MM)",
				PromptKind::AddTaskStart,
				slot_time(app.slot_index),
			));
			false
		}
		KeyCode::Char('m') => {
			app.mode = InputMode::Prompt(PromptState::with_input(
				"Note time (HH:MM)",
				PromptKind::AddNoteTime,
				slot_time(app.slot_index),
			));
			false
		}
		KeyCode::Char('d') => {
			if app.focus != FocusPane::Slots {
				app.status = "Focus the day grid to delete an entry".to_string();
				return false;
			}

			let Some(row) = view.slot_rows.get(app.slot_index) else {
				app.status = "No selected slot".to_string();
				return false;
			};
			if row.tasks.is_empty() && row.notes.is_empty() {
				app.status = "Nothing in this slot to delete".to_string();
				return false;
			}

			app.mode = InputMode::Select(build_delete_entity_select(row));
			false
		}
		KeyCode::Char('g') => {
			match build_planner_switch_select(planner_dir.as_path()) {
				Ok(select) => app.mode = InputMode::Select(select),
				Err(err) => app.status = err,
			}
			false
		}
		_ => false,
	}
}

fn handle_prompt_key(app: &mut App, code: KeyCode, config: &Config) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Select(_) => return false,
			};

			match submit_prompt(prompt.clone(), config) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => app.mode = InputMode::Prompt(next_prompt),
				Ok(PromptOutcome::Select(select)) => app.mode = InputMode::Select(select),
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(
	app: &mut App,
	code: KeyCode,
	day: &mut Day,
	planner_dir: &mut PathBuf,
	config: &mut Config,
) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			match submit_select(select.clone(), app, day, planner_dir, config) {
				Ok(SelectOutcome::NextSelect(next_select)) => app.mode = InputMode::Select(next_select),
				Ok(SelectOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt(prompt: PromptState, config: &Config) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::AddTaskStart => {
			let start = required_time(&prompt.input)?;
			Ok(PromptOutcome::NextPrompt(PromptState::with_input(
				"Task end (HH:MM)",
				PromptKind::AddTaskEnd { start: start.clone() },
				start,
			)))
		}
		PromptKind::AddTaskEnd { start } => {
			let end = required_time(&prompt.input)?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Task title",
				PromptKind::AddTaskTitle { start, end },
			)))
		}
		PromptKind::AddTaskTitle { start, end } => {
			let title = required_text(&prompt.input, "task title")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Task description (optional)",
				PromptKind::AddTaskDescription { start, end, title },
			)))
		}
		PromptKind::AddTaskDescription { start, end, title } => {
			let description = optional_text(&prompt.input).unwrap_or_default();
			Ok(PromptOutcome::Select(build_task_priority_select(
				config,
				start,
				end,
				title,
				description,
			)))
		}
		PromptKind::AddNoteTime => {
			let time = required_time(&prompt.input)?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Note title",
				PromptKind::AddNoteTitle { time },
			)))
		}
		PromptKind::AddNoteTitle { time } => {
			let title = required_text(&prompt.input, "note title")?;
			Ok(PromptOutcome::Select(build_note_priority_select(config, time, title)))
		}
	}
}

fn submit_select(
	select: SelectState,
	app: &mut App,
	day: &mut Day,
	planner_dir: &mut PathBuf,
	config: &mut Config,
) -> Result<SelectOutcome, String> {
	let selected_value = select
		.selected_option()
		.map(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;
	let selected_label = select
		.selected_option()
		.map(|option| option.label.clone())
		.unwrap_or_default();

	match select.kind {
		SelectKind::TaskPriority {
			start,
			end,
			title,
			description,
		} => {
			let priority = selected_value
				.as_deref()
				.and_then(Priority::from_key)
				.ok_or_else(|| "selected priority is missing".to_string())?;
			Ok(SelectOutcome::NextSelect(build_task_color_select(
				config,
				start,
				end,
				title,
				description,
				priority,
			)))
		}
		SelectKind::TaskColor {
			start,
			end,
			title,
			description,
			priority,
		} => {
			let color = selected_value.unwrap_or_else(|| config.default_task_color.clone());
			let created_title = title.clone();
			day.add_task(title, description, &start, &end, priority, color)
				.map_err(|err| err.to_string())?;
			persist(planner_dir.as_path(), app.selected_day, day)?;
			Ok(SelectOutcome::Done(format!("created task: {created_title}")))
		}
		SelectKind::NotePriority { time, title } => {
			let priority = selected_value
				.as_deref()
				.and_then(Priority::from_key)
				.ok_or_else(|| "selected priority is missing".to_string())?;
			let created_title = title.clone();
			day.add_note(title, &time, priority)
				.map_err(|err| err.to_string())?;
			persist(planner_dir.as_path(), app.selected_day, day)?;
			Ok(SelectOutcome::Done(format!("created note: {created_title}")))
		}
		SelectKind::DeleteEntity => {
			let value = selected_value.ok_or_else(|| "selected entry is missing".to_string())?;
			Ok(SelectOutcome::NextSelect(build_delete_confirm_select(
				value,
				selected_label,
			)))
		}
		SelectKind::DeleteConfirm { value, label } => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?;
			if action != "delete" {
				return Ok(SelectOutcome::Done("Delete cancelled".to_string()));
			}

			if let Some(task_id) = value.strip_prefix("task:") {
				day.remove_task(task_id)?;
			} else if let Some(note_id) = value.strip_prefix("note:") {
				day.remove_note(note_id)?;
			} else {
				return Err(format!("unknown entry kind: {value}"));
			}
			persist(planner_dir.as_path(), app.selected_day, day)?;
			Ok(SelectOutcome::Done(format!("deleted: {label}")))
		}
		SelectKind::PlannerSwitch => {
			let selected_path = selected_value
				.map(PathBuf::from)
				.ok_or_else(|| "selected planner path is missing".to_string())?;
			switch_planner(app, day, planner_dir, config, selected_path).map(SelectOutcome::Done)
		}
	}
}

fn build_task_priority_select(
	config: &Config,
	start: String,
	end: String,
	title: String,
	description: String,
) -> SelectState {
	SelectState::new(
		"Select task priority",
		SelectKind::TaskPriority {
			start,
			end,
			title,
			description,
		},
		priority_options(config),
	)
}

fn build_note_priority_select(config: &Config, time: String, title: String) -> SelectState {
	SelectState::new(
		"Select note priority",
		SelectKind::NotePriority { time, title },
		priority_options(config),
	)
}

fn priority_options(config: &Config) -> Vec<SelectOption> {
	Priority::ALL
		.into_iter()
		.map(|priority| {
			SelectOption::new(
				priority.label(),
				Some(priority.key().to_string()),
				priority_style(config, priority),
			)
		})
		.collect()
}

fn build_task_color_select(
	config: &Config,
	start: String,
	end: String,
	title: String,
	description: String,
	priority: Priority,
) -> SelectState {
	let mut options = vec![SelectOption::new(
		format!("Default ({})", config.default_task_color),
		None,
		style_from_color_name(Some(&config.default_task_color)),
	)];
	for color in TERMINAL_COLORS {
		let swatch = "████████████████".to_string();
		options.push(SelectOption::new(
			swatch,
			Some(color.to_string()),
			style_from_color_name(Some(color)),
		));
	}

	SelectState::new(
		"Select task color",
		SelectKind::TaskColor {
			start,
			end,
			title,
			description,
			priority,
		},
		options,
	)
}

fn build_delete_entity_select(row: &SlotRow) -> SelectState {
	let mut options = Vec::new();
	for task in &row.tasks {
		options.push(SelectOption::new(
			format!("task: {}", task.title),
			Some(format!("task:{}", task.task_id)),
			task.style,
		));
	}
	for note in &row.notes {
		options.push(SelectOption::new(
			format!("note: {}", note.title),
			Some(format!("note:{}", note.note_id)),
			note.style,
		));
	}

	SelectState::new(
		format!("Delete from {}", row.label),
		SelectKind::DeleteEntity,
		options,
	)
}

fn build_delete_confirm_select(value: String, label: String) -> SelectState {
	let options = vec![
		SelectOption::new(
			"Delete",
			Some("delete".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(
		format!("Delete? {label}"),
		SelectKind::DeleteConfirm { value, label },
		options,
	);
	// Default to cancel to prevent accidental deletions.
	select.selected = 1;
	select
}

fn build_planner_switch_select(current_dir: &Path) -> Result<SelectState, String> {
	let mut paths = recent_planner_dirs(100)
		.map_err(|err| format!("failed to load recent planners: {err}"))?;
	let current_dir = current_dir.to_path_buf();
	if !paths.iter().any(|path| path == &current_dir) {
		paths.insert(0, current_dir.clone());
	}

	let current_value = current_dir.display().to_string();
	let options = paths
		.into_iter()
		.map(|path| {
			let value = path.display().to_string();
			let is_current = value == current_value;
			let mut label = value.clone();
			if is_current {
				label = format!("* {label}");
			}

			let style = if is_current {
				Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
			} else {
				Style::default()
			};

			SelectOption::new(label, Some(value), style)
		})
		.collect::<Vec<_>>();

	let mut select = SelectState::new("Switch planner", SelectKind::PlannerSwitch, options);
	select.selected = select
		.options
		.iter()
		.position(|option| option.value.as_deref() == Some(current_value.as_str()))
		.unwrap_or(0);
	Ok(select)
}

fn build_view(
	day: &Day,
	planner_dir: &Path,
	config: &Config,
	filter: Option<Priority>,
	clock_slot: Option<usize>,
) -> ViewModel {
	let coverage = CoverageIndex::build(day.tasks());
	let stats = day_stats(day.tasks());
	let calendar_active_days = saved_days(planner_dir)
		.unwrap_or_default()
		.into_iter()
		.collect::<HashSet<_>>();

	let slot_rows = (0..SLOTS_PER_DAY)
		.map(|slot| {
			// The filter narrows what is displayed; aggregation above never
			// sees it.
			let tasks = coverage
				.tasks_in_slot(slot)
				.iter()
				.filter_map(|task_id| day.task(task_id))
				.filter(|task| filter.is_none_or(|wanted| task.priority == wanted))
				.map(|task| SlotTaskRef {
					task_id: task.id.clone(),
					title: task.short_title(),
					style: style_from_color_name(Some(&task.color)),
				})
				.collect::<Vec<_>>();
			let notes = day
				.notes_in_slot(slot)
				.into_iter()
				.filter(|note| filter.is_none_or(|wanted| note.priority == wanted))
				.map(|note| SlotNoteRef {
					note_id: note.id.clone(),
					title: note.title.clone(),
					style: priority_style(config, note.priority),
				})
				.collect::<Vec<_>>();

			SlotRow {
				label: slot_label(config.clock, slot_time(slot)),
				is_now: clock_slot == Some(slot),
				tasks,
				notes,
			}
		})
		.collect::<Vec<_>>();

	let stats = build_stats_view(day, config, &stats);

	ViewModel {
		calendar_active_days,
		slot_rows,
		stats,
	}
}

fn build_stats_view(day: &Day, config: &Config, stats: &DayStats) -> StatsView {
	let by_priority = stats
		.by_priority
		.iter()
		.map(|(priority, minutes)| PriorityRow {
			label: priority.label(),
			minutes: *minutes,
			style: priority_style(config, *priority),
		})
		.collect::<Vec<_>>();

	let durations = stats
		.durations
		.iter()
		.map(|entry| {
			let (title, style) = day
				.task(&entry.task_id)
				.map(|task| (task.short_title(), style_from_color_name(Some(&task.color))))
				.unwrap_or_else(|| ("Unknown task".to_string(), Style::default()));
			DurationRow {
				minutes: entry.minutes,
				title,
				style,
			}
		})
		.collect::<Vec<_>>();

	StatsView {
		scheduled_minutes: stats.scheduled_minutes,
		free_minutes: stats.free_minutes,
		by_priority,
		durations,
	}
}

fn shift_selected_day(app: &mut App, day: &mut Day, planner_dir: &Path, delta_days: i64) {
	app.selected_day += Duration::days(delta_days);
	app.calendar_month = first_day_of_month(app.selected_day);
	reload_day(app, day, planner_dir);
}

fn shift_selected_month(app: &mut App, day: &mut Day, planner_dir: &Path, delta_months: i32) {
	app.selected_day = shift_month(app.selected_day, delta_months);
	app.calendar_month = first_day_of_month(app.selected_day);
	reload_day(app, day, planner_dir);
}

fn reload_day(app: &mut App, day: &mut Day, planner_dir: &Path) {
	// Mutations persist immediately, so the in-memory day can be discarded.
	match load_day(planner_dir, app.selected_day) {
		Ok(record) => *day = Day::new(record),
		Err(err) => {
			*day = Day::new(DayRecord::default());
			app.status = format!("error: {err}");
		}
	}
}

fn switch_planner(
	app: &mut App,
	day: &mut Day,
	planner_dir: &mut PathBuf,
	config: &mut Config,
	next_dir: PathBuf,
) -> Result<String, String> {
	if &next_dir == planner_dir {
		return Ok(format!("already using planner: {}", planner_dir.display()));
	}

	let record = load_day(&next_dir, app.selected_day).map_err(|err| err.to_string())?;
	*day = Day::new(record);
	*planner_dir = next_dir;
	*config = load_config(planner_dir);

	match remember_planner_dir(planner_dir.as_path()) {
		Ok(()) => Ok(format!("switched planner: {}", planner_dir.display())),
		Err(err) => Ok(format!(
			"switched planner: {} (warning: failed to store recents: {err})",
			planner_dir.display()
		)),
	}
}

fn persist(planner_dir: &Path, selected_day: NaiveDate, day: &Day) -> Result<(), String> {
	save_day(planner_dir, selected_day, day.record()).map_err(|err| err.to_string())
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn optional_text(input: &str) -> Option<String> {
	let value = input.trim();
	if value.is_empty() {
		None
	} else {
		Some(value.to_string())
	}
}

fn required_time(input: &str) -> Result<String, String> {
	let value = required_text(input, "time")?;
	clamp_to_slot(&value).map_err(|err| err.to_string())?;
	Ok(value)
}

fn cycle_filter(filter: Option<Priority>) -> Option<Priority> {
	match filter {
		None => Some(Priority::Urgent),
		Some(Priority::Urgent) => Some(Priority::High),
		Some(Priority::High) => Some(Priority::Normal),
		Some(Priority::Normal) => Some(Priority::Low),
		Some(Priority::Low) => None,
	}
}

pub fn slot_label(clock: ClockFormat, time: &str) -> String {
	match clock {
		ClockFormat::Hour24 => time.to_string(),
		ClockFormat::Hour12 => to_12_hour(time).unwrap_or_else(|_| time.to_string()),
	}
}

fn priority_style(config: &Config, priority: Priority) -> Style {
	style_from_color_name(Some(config.priority_colors.for_priority(priority)))
}

fn style_from_color_name(color_name: Option<&str>) -> Style {
	color_name
		.and_then(color_from_name)
		.map(|color| Style::default().fg(color))
		.unwrap_or_default()
}

fn color_from_name(color_name: &str) -> Option<Color> {
	match color_name {
		"black" => Some(Color::Black),
		"red" => Some(Color::Red),
		"green" => Some(Color::Green),
		"yellow" => Some(Color::Yellow),
		"blue" => Some(Color::Blue),
		"magenta" => Some(Color::Magenta),
		"cyan" => Some(Color::Cyan),
		"gray" => Some(Color::Gray),
		"dark_gray" => Some(Color::DarkGray),
		"light_red" => Some(Color::LightRed),
		"light_green" => Some(Color::LightGreen),
		"light_yellow" => Some(Color::LightYellow),
		"light_blue" => Some(Color::LightBlue),
		"light_magenta" => Some(Color::LightMagenta),
		"light_cyan" => Some(Color::LightCyan),
		"white" => Some(Color::White),
		_ => None,
	}
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

fn days_in_month(year: i32, month: u32) -> u32 {
	let first_of_next = if month == 12 {
		NaiveDate::from_ymd_opt(year + 1, 1, 1).expect("next year date should be valid")
	} else {
		NaiveDate::from_ymd_opt(year, month + 1, 1).expect("next month date should be valid")
	};
	(first_of_next - Duration::days(1)).day()
}

fn first_day_of_month(day: NaiveDate) -> NaiveDate {
	NaiveDate::from_ymd_opt(day.year(), day.month(), 1).expect("first day of month must be valid")
}

fn shift_month(day: NaiveDate, delta: i32) -> NaiveDate {
	let mut year = day.year();
	let mut month = day.month() as i32 + delta;
	while month > 12 {
		year += 1;
		month -= 12;
	}
	while month < 1 {
		year -= 1;
		month += 12;
	}
	let month_u32 = month as u32;
	let max_day = days_in_month(year, month_u32);
	let target_day = day.day().min(max_day);
	NaiveDate::from_ymd_opt(year, month_u32, target_day).expect("shifted month date must be valid")
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Select(SelectState),
	Done(String),
}

#[derive(Debug, Clone)]
enum SelectOutcome {
	NextSelect(SelectState),
	Done(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}

	fn with_input(title: impl Into<String>, kind: PromptKind, input: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			input: input.into(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	AddTaskStart,
	AddTaskEnd {
		start: String,
	},
	AddTaskTitle {
		start: String,
		end: String,
	},
	AddTaskDescription {
		start: String,
		end: String,
		title: String,
	},
	AddNoteTime,
	AddNoteTitle {
		time: String,
	},
}

#[derive(Debug, Clone)]
enum SelectKind {
	TaskPriority {
		start: String,
		end: String,
		title: String,
		description: String,
	},
	TaskColor {
		start: String,
		end: String,
		title: String,
		description: String,
		priority: Priority,
	},
	NotePriority {
		time: String,
		title: String,
	},
	DeleteEntity,
	DeleteConfirm {
		value: String,
		label: String,
	},
	PlannerSwitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusPane {
	Calendar,
	Slots,
}

impl FocusPane {
	fn toggle(self) -> Self {
		match self {
			FocusPane::Calendar => FocusPane::Slots,
			FocusPane::Slots => FocusPane::Calendar,
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct App {
	focus: FocusPane,
	selected_day: NaiveDate,
	calendar_month: NaiveDate,
	slot_index: usize,
	filter: Option<Priority>,
	mode: InputMode,
	status: String,
}

impl App {
	fn new(initial_day: NaiveDate, initial_slot: usize) -> Self {
		Self {
			focus: FocusPane::Slots,
			selected_day: initial_day,
			calendar_month: first_day_of_month(initial_day),
			slot_index: initial_slot.min(SLOTS_PER_DAY - 1),
			filter: None,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}

	fn move_slot_selection(&mut self, delta: i32) {
		if delta > 0 {
			self.slot_index = (self.slot_index + delta as usize).min(SLOTS_PER_DAY - 1);
		} else {
			self.slot_index = self.slot_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewKey {
	version: u64,
	day: NaiveDate,
	filter: Option<Priority>,
	clock_slot: Option<usize>,
}

#[derive(Clone)]
struct ViewModel {
	calendar_active_days: HashSet<NaiveDate>,
	slot_rows: Vec<SlotRow>,
	stats: StatsView,
}

#[derive(Clone)]
struct SlotRow {
	label: String,
	is_now: bool,
	tasks: Vec<SlotTaskRef>,
	notes: Vec<SlotNoteRef>,
}

#[derive(Clone)]
struct SlotTaskRef {
	task_id: String,
	title: String,
	style: Style,
}

#[derive(Clone)]
struct SlotNoteRef {
	note_id: String,
	title: String,
	style: Style,
}

#[derive(Clone)]
struct StatsView {
	scheduled_minutes: u32,
	free_minutes: u32,
	by_priority: Vec<PriorityRow>,
	durations: Vec<DurationRow>,
}

#[derive(Clone)]
struct PriorityRow {
	label: &'static str,
	minutes: u32,
	style: Style,
}

#[derive(Clone)]
struct DurationRow {
	minutes: u32,
	title: String,
	style: Style,
}
