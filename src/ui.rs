use std::collections::HashSet;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};
use rugby_tracker::clock::{format_mm_ss, period_label};
use rugby_tracker::model::PlayerId;
use rugby_tracker::MatchStatus;
use tui_big_text::{BigText, PixelSize};

use crate::app::{App, Focus, Mode};

const RECENT_EVENTS: usize = 8;

pub fn ui(f: &mut Frame, app: &mut App) {
    let size = f.area();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(size);

    draw_sidebar(f, app, chunks[0]);
    draw_main_panel(f, app, chunks[1]);

    if matches!(app.mode, Mode::RecordStat { .. } | Mode::OpponentScore) {
        draw_picker(f, app, size);
    }
}

fn highlight() -> Style {
    Style::default()
        .add_modifier(Modifier::BOLD)
        .bg(Color::DarkGray)
        .fg(Color::White)
}

fn draw_sidebar(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(17), Constraint::Min(3)].as_ref())
        .split(area);

    let field: Vec<ListItem> = app
        .field()
        .iter()
        .map(|entry| {
            let marker = if entry.is_starter { " " } else { "*" };
            ListItem::new(format!(
                "{:>2}{} {:<18} {}",
                entry.shirt_number,
                marker,
                app.player_name(entry.player_id),
                entry.position_label
            ))
        })
        .collect();

    let field_title = if app.focus == Focus::Field { " ON FIELD ◀ " } else { " ON FIELD " };
    let field_list = List::new(field)
        .block(Block::default().title(field_title).borders(Borders::ALL))
        .highlight_style(highlight());
    f.render_stateful_widget(field_list, chunks[0], &mut app.field_state);

    let bench: Vec<ListItem> = app
        .session
        .bench_players()
        .iter()
        .map(|p| {
            let position = p.preferred_position.as_deref().unwrap_or("-");
            ListItem::new(format!("    {:<18} {}", p.full_name(), position))
        })
        .collect();

    let bench_title = match (app.focus, app.mode) {
        (_, Mode::Substitute { .. }) => " BENCH: pick replacement ".to_string(),
        (Focus::Bench, _) => " BENCH ◀ ".to_string(),
        _ => " BENCH ".to_string(),
    };
    let bench_list = List::new(bench)
        .block(Block::default().title(bench_title).borders(Borders::ALL))
        .highlight_style(highlight());
    f.render_stateful_widget(bench_list, chunks[1], &mut app.bench_state);
}

fn draw_main_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(8), // Scoreboard
                Constraint::Min(6),    // Player stats
                Constraint::Length(3), // Team totals
                Constraint::Length(RECENT_EVENTS as u16 + 2),
                Constraint::Length(3), // Status bar
            ]
            .as_ref(),
        )
        .split(inner_area);

    draw_scoreboard(f, app, chunks[0]);
    draw_player_table(f, app, chunks[1]);
    draw_team_totals(f, app, chunks[2]);
    draw_recent_events(f, app, chunks[3]);
    draw_status_bar(f, app, chunks[4]);
}

fn draw_big_or_plain(f: &mut Frame, area: Rect, text: String) {
    if area.width < 25 || area.height < 4 {
        let p = Paragraph::new(text)
            .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        f.render_widget(p, area);
    } else {
        let big = BigText::builder()
            .pixel_size(PixelSize::Quadrant)
            .style(Style::default().fg(Color::White))
            .lines(vec![text.into()])
            .alignment(Alignment::Center)
            .build();
        f.render_widget(big, area);
    }
}

fn draw_scoreboard(f: &mut Frame, app: &App, area: Rect) {
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(40), // Club
                Constraint::Percentage(20), // Clock
                Constraint::Percentage(40), // Opponent
            ]
            .as_ref(),
        )
        .split(area);

    let session = &app.session;
    for (chunk, name, score, color) in [
        (header_chunks[0], session.team().abbreviation.clone(), session.score(), Color::Blue),
        (header_chunks[2], opponent_abbreviation(session.opponent()), session.opponent_score(), Color::Red),
    ] {
        f.render_widget(Block::default().bg(color), chunk);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(4)].as_ref())
            .split(chunk);
        let label = Paragraph::new(name)
            .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        f.render_widget(label, rows[1]);
        draw_big_or_plain(f, rows[2], score.to_string());
    }

    let clock = session.clock();
    let clock_color = if clock.is_running() { Color::Red } else { Color::Gray };
    let state = match session.status() {
        MatchStatus::NotStarted => "Pre",
        MatchStatus::InProgress if clock.is_period_expired() => "Break",
        MatchStatus::InProgress => "Live",
        MatchStatus::Completed => "Final",
        MatchStatus::Abandoned => "Abandoned",
    };
    let mid_text = vec![
        Line::from(""),
        Line::from(Span::styled("VS", Style::default().add_modifier(Modifier::ITALIC))),
        Line::from(""),
        Line::from(Span::styled(
            clock.display(),
            Style::default().fg(clock_color).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("{} / {}", clock.period_label(), clock.total_periods())),
        Line::from(state),
    ];
    let mid_p = Paragraph::new(mid_text).alignment(Alignment::Center);
    f.render_widget(mid_p, header_chunks[1]);
}

fn opponent_abbreviation(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

fn draw_player_table(f: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let period_view;
    let view = if app.show_period {
        period_view = session.period_totals(session.clock().current_period());
        &period_view
    } else {
        session.totals()
    };

    let on_field: HashSet<PlayerId> = app.field().iter().map(|e| e.player_id).collect();
    let rows: Vec<Row> = session
        .players()
        .iter()
        .filter(|p| on_field.contains(&p.id) || view.player(p.id).is_some() || session.time_on_field(p.id) > 0)
        .map(|p| {
            let top = view
                .top_stat(p.id)
                .map(|(name, value)| format!("{name} {value}"))
                .unwrap_or_default();
            let totals = view
                .player(p.id)
                .map(|t| {
                    t.iter()
                        .map(|(name, value)| format!("{name}: {value}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            Row::new(vec![
                Cell::from(p.full_name()),
                Cell::from(format_mm_ss(session.time_on_field(p.id))),
                Cell::from(top),
                Cell::from(totals),
            ])
        })
        .collect();

    let title = if app.show_period {
        format!(" PLAYER STATS ({}) ", session.clock().period_label())
    } else {
        " PLAYER STATS (match) ".to_string()
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(7),
            Constraint::Length(18),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Player", "Time", "Top", "Totals"])
            .style(Style::default().add_modifier(Modifier::UNDERLINED)),
    )
    .block(Block::default().title(title).borders(Borders::TOP));
    f.render_widget(table, area);
}

fn draw_team_totals(f: &mut Frame, app: &App, area: Rect) {
    let totals = app.session.team_totals();
    let text = if totals.is_empty() {
        "No stats recorded".to_string()
    } else {
        totals
            .iter()
            .map(|(name, value)| format!("{name} {value}"))
            .collect::<Vec<_>>()
            .join("  |  ")
    };
    let p = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().title(" TEAM ").borders(Borders::TOP));
    f.render_widget(p, area);
}

fn draw_recent_events(f: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let total_periods = session.clock().total_periods();
    let events: Vec<_> = session.events().collect();
    let items: Vec<ListItem> = events
        .iter()
        .rev()
        .take(RECENT_EVENTS)
        .map(|e| {
            ListItem::new(format!(
                "{}  {}  {:<20} {} x{}",
                format_mm_ss(e.elapsed_seconds),
                period_label(e.period, total_periods),
                app.player_name(e.player_id),
                e.stat_type_name,
                e.value
            ))
        })
        .collect();
    let list = List::new(items).block(Block::default().title(" LAST EVENTS ").borders(Borders::TOP));
    f.render_widget(list, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut content = vec![];
    match &app.notice {
        Some(notice) if notice.is_error => content.push(Span::styled(
            format!(" {} ", notice.text),
            Style::default().bg(Color::Red).fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Some(notice) => content.push(Span::styled(
            format!(" {} ", notice.text),
            Style::default().bg(Color::White).fg(Color::Black),
        )),
        None => {}
    }

    let help = match app.mode {
        Mode::Normal => "  [space] clock  [n] next period  [s] sub  [r] stat  [o] opp. score  [p] period  [tab] focus  [F] full time  [A] abandon  [q] quit",
        Mode::Substitute { .. } => "  [j/k] choose  [enter] confirm  [esc] cancel",
        Mode::RecordStat { .. } => "  [j/k] choose  [1-9] value  [enter] record  [esc] cancel",
        Mode::OpponentScore => "  [j/k] choose  [enter] record  [esc] cancel",
    };
    content.push(Span::styled(help, Style::default().fg(Color::Cyan)));

    let status_bar = Paragraph::new(Line::from(content))
        .block(Block::default().borders(Borders::TOP | Borders::BOTTOM));
    f.render_widget(status_bar, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_picker(f: &mut Frame, app: &mut App, area: Rect) {
    let items = app.picker_items();
    let title = match app.mode {
        Mode::RecordStat { player_id, value } => {
            format!(" {} (value {value}) ", app.player_name(player_id))
        }
        _ => format!(" {} scored ", app.session.opponent()),
    };

    let popup = centered(area, 40, items.len() as u16 + 2);
    f.render_widget(Clear, popup);
    let list = List::new(items.into_iter().map(ListItem::new).collect::<Vec<_>>())
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(highlight());
    f.render_stateful_widget(list, popup, &mut app.picker_state);
}
