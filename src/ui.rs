use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::assets::display_name;
use crate::engine::bounce::BlockArt;
use crate::engine::collision::ObjectKind;
use crate::engine::modal::MediaKind;
use crate::engine::movement::Direction as Move;
use crate::engine::viewport::{background_offset, sprite_anchor, to_column, viewport_position};
use crate::input::Control;
use crate::world::{EventKind, Facing};
use crate::{App, MenuOption, Screen};

const SKYLINE: &[char] = &[
    ' ', '▂', '▃', '▅', '▂', ' ', '▇', '▆', '▃', ' ', '▂', '▅', '▇', '▃', '▂', ' ', ' ', '▃', '▆',
    '▅', '▂', ' ',
];
const GROUND: &[char] = &['▀', '▀', '▀', '▄', '▀', '▀'];

const JUMP_LIFT: u16 = 3;
const BLOCK_ROWS_ABOVE_GROUND: u16 = 6;

pub fn draw(f: &mut Frame, app: &mut App) {
    app.last_area = f.area();
    match app.screen {
        Screen::Title => draw_title_screen(f, app),
        Screen::Playing => draw_game(f, app),
    }
}

fn draw_game(f: &mut Frame, app: &mut App) {
    // Active level missing: draw nothing.
    let Some(level) = app.engine.level().cloned() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(12),
            Constraint::Length(3),
        ])
        .split(f.area());

    // HUD: level, mission, blocks left
    let hud = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(45),
            Constraint::Percentage(25),
        ])
        .split(chunks[0]);

    let level_box = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("LEVEL {}", level.id),
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            level.name.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(level.year.clone(), Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(level_box, hud[0]);

    let mission = Paragraph::new(vec![
        Line::from(Span::styled("MISSION:", Style::default().fg(Color::Gray))),
        Line::from(level.mission.clone()),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(mission, hud[1]);

    let total = app.engine.total();
    let left = total - app.engine.found().min(total);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" BLOCKS "))
        .gauge_style(Style::default().fg(Color::Yellow).bg(Color::Black))
        .ratio(app.engine.completion().clamp(0.0, 1.0) as f64)
        .label(format!("{}/{} LEFT", left, total));
    f.render_widget(gauge, hud[2]);

    // Scene
    let background = app.assets.label(&level.background);
    let scene_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", background))
        .border_style(Style::default().fg(Color::DarkGray));
    let scene = scene_block.inner(chunks[1]);
    f.render_widget(scene_block, chunks[1]);
    draw_scene(f.buffer_mut(), scene, app, &level);

    // Controls
    if app.use_touch {
        draw_touch_buttons(f, app, chunks[2]);
    } else {
        let help = Paragraph::new("←/→ or A/D move  •  ↑/W jump  •  q quit")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP));
        f.render_widget(help, chunks[2]);
    }

    // Overlays, bottom to top
    if app.engine.progress().level_complete() {
        draw_level_complete(f, app.engine.is_last_level());
    }
    if app.engine.progress().game_complete() && !app.engine.modal().visible() {
        draw_game_complete(f);
    }
    if app.engine.modal().visible() {
        draw_event_modal(f, app);
    }
}

/// Writes `text` at a column/row relative to `area`, clipping at its edges.
fn put(buf: &mut Buffer, area: Rect, col: i32, row: i32, text: &str, style: Style) {
    if row < 0 || row >= area.height as i32 || col >= area.width as i32 {
        return;
    }
    let skip = (-col).max(0) as usize;
    let start = col.max(0) as u16;
    let visible: String = text.chars().skip(skip).collect();
    buf.set_stringn(
        area.x + start,
        area.y + row as u16,
        visible,
        (area.width - start) as usize,
        style,
    );
}

fn strip(pattern: &[char], offset: usize, width: u16) -> String {
    (0..width as usize)
        .map(|i| pattern[(i + offset) % pattern.len()])
        .collect()
}

fn draw_scene(buf: &mut Buffer, area: Rect, app: &mut App, level: &crate::world::Level) {
    if area.height < BLOCK_ROWS_ABOVE_GROUND + 2 || area.width == 0 {
        return;
    }
    let character = app.engine.character().clone();
    let pos = character.world_position;
    let ground = area.height as i32 - 1;
    let feet = ground - 1;

    // Background scrolls 1:1 with the character.
    let offset = (background_offset(pos) / 100.0 * area.width as f32) as usize;
    let sky = Style::default().fg(Color::Rgb(70, 90, 130));
    put(buf, area, 0, 1, &strip(SKYLINE, offset, area.width), sky);
    put(buf, area, 0, 2, &strip(SKYLINE, offset + 7, area.width), sky);
    put(
        buf,
        area,
        0,
        ground,
        &strip(GROUND, offset, area.width),
        Style::default().fg(Color::Rgb(101, 67, 33)),
    );

    // Blocks
    let block_row = ground - BLOCK_ROWS_ABOVE_GROUND as i32;
    for (index, block) in level.blocks.iter().enumerate() {
        let Some(col) = to_column(viewport_position(block.position, pos), area.width) else {
            continue;
        };
        let triggered = app.engine.is_triggered(ObjectKind::Block, index);
        let lift = i32::from(app.engine.bounces().phase(index).is_some());
        let (art, style) = match app.engine.bounces().art(index, triggered) {
            BlockArt::Unhit => (
                "[?]",
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            BlockArt::Hit => ("[#]", Style::default().fg(Color::Rgb(180, 90, 40))),
        };
        put(buf, area, col as i32 - 1, block_row - lift, art, style);
    }

    // NPCs
    for (index, npc) in level.npcs.iter().enumerate() {
        let Some(col) = to_column(viewport_position(npc.position, pos), area.width) else {
            continue;
        };
        let col = col as i32;
        let rows = npc.size.rows() as i32;
        let initial = display_name(&npc.sprite)
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?');
        let head = match npc.facing {
            Facing::Left => format!("<{}", initial),
            Facing::Right => format!("{}>", initial),
        };
        let style = Style::default().fg(Color::Cyan);
        put(buf, area, col, feet - rows + 1, &head, style);
        for r in 1..rows {
            put(buf, area, col, feet - rows + 1 + r, "||", style);
        }

        let top = feet - rows;
        let label = app.assets.label(&npc.sprite);
        if label.starts_with('[') {
            put(buf, area, col - 1, top, &label, Style::default().fg(Color::DarkGray));
        }
        if npc.event.is_some() && !app.engine.is_triggered(ObjectKind::Npc, index) {
            put(
                buf,
                area,
                col,
                top - 1,
                "!",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            );
        }
    }

    // Character
    let anchor = sprite_anchor(pos, app.engine.config().sprite_anchor_max);
    if let Some(col) = to_column(anchor, area.width) {
        let col = col as i32 - 1;
        let lift = if character.airborne { JUMP_LIFT as i32 } else { 0 };
        let (head, body) = match (character.airborne, character.facing) {
            (true, _) => ("\\o/", " | "),
            (false, Facing::Right) => (" o ", " |>"),
            (false, Facing::Left) => (" o ", "<| "),
        };
        let style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        put(buf, area, col, feet - 1 - lift, head, style);
        put(buf, area, col, feet - lift, body, style);
    }
}

fn draw_touch_buttons(f: &mut Frame, app: &mut App, area: Rect) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let buttons = [
        (Control::Move(Move::Left), "◀", cells[0]),
        (Control::Jump, "▲", cells[1]),
        (Control::Move(Move::Right), "▶", cells[2]),
    ];
    for (control, glyph, rect) in buttons {
        let held = app.touch.held() == Some(control);
        let style = if held {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        let button = Paragraph::new(glyph)
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(button, rect);
    }
    app.touch
        .set_buttons(buttons.iter().map(|(c, _, r)| (*c, *r)).collect());
}

pub fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}

/// Event modal frame and the media panel inside it.
pub fn modal_rects(area: Rect) -> (Rect, Rect) {
    let modal = centered(area, 70, 70);
    let inner = Block::default().borders(Borders::ALL).inner(modal);
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(5), Constraint::Length(1)])
        .split(inner);
    (modal, parts[1])
}

pub fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

fn draw_event_modal(f: &mut Frame, app: &mut App) {
    let Some(event) = app.engine.modal().current().cloned() else {
        return;
    };
    let (modal, media_area) = modal_rects(f.area());
    let pending = app.engine.modal().pending();

    let kind = match event.kind {
        EventKind::Text => " STORY ",
        EventKind::Image => " PHOTOS ",
        EventKind::Video => " VIDEO ",
    };
    let title = if pending > 0 {
        format!("{}(+{} more) ", kind, pending)
    } else {
        kind.to_string()
    };
    let frame = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().fg(Color::Black).bg(Color::White));
    let inner = frame.inner(modal);
    f.render_widget(Clear, modal);
    f.render_widget(frame, modal);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(5), Constraint::Length(1)])
        .split(inner);

    let content = Paragraph::new(event.content.clone().unwrap_or_default())
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Black).bg(Color::White));
    f.render_widget(content, parts[0]);

    // Copy out what we need before borrowing the asset cache mutably.
    let media = app
        .engine
        .modal()
        .current_media()
        .map(|m| (m.reference.to_string(), m.kind, m.index, m.count));
    if let Some((reference, kind, index, count)) = media {
        let label = app.assets.label(&reference);
        let counter = if count > 1 {
            format!(" {}/{} · click or SPACE for next ", index + 1, count)
        } else {
            String::new()
        };
        let body = match kind {
            MediaKind::Image => vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("🖼  {}", label),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
            ],
            MediaKind::Video => vec![
                Line::from(Span::styled(
                    format!("▶ {}", label),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from("[ ◀◀ ]  [ ▶ PLAY ]  [ ❚❚ ]  [ ▶▶ ]   00:00"),
            ],
        };
        let panel = Paragraph::new(body)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(counter))
            .style(Style::default().fg(Color::Black).bg(Color::Rgb(230, 230, 230)));
        f.render_widget(panel, media_area);
    }

    let close = Paragraph::new("ENTER TO CLOSE")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray).bg(Color::White));
    f.render_widget(close, parts[2]);
}

fn draw_level_complete(f: &mut Frame, last: bool) {
    let area = centered(f.area(), 50, 30);
    let next = if last { "GAME COMPLETE!" } else { "ENTER TO CONTINUE" };
    let popup = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "LEVEL COMPLETE!",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(next),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
    .style(Style::default().fg(Color::Black).bg(Color::White));
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn draw_game_complete(f: &mut Frame) {
    let area = centered(f.area(), 60, 50);
    let popup = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "YOU WIN!",
            Style::default().add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        )),
        Line::from(""),
        Line::from("CONGRATULATIONS"),
        Line::from(""),
        Line::from("JOURNEY COMPLETED"),
        Line::from(""),
        Line::from(Span::styled(
            "ENTER: title screen",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
    .style(Style::default().fg(Color::Black).bg(Color::Yellow));
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn draw_title_screen(f: &mut Frame, app: &App) {
    let area = f.area();

    let title_art = r#"
    ╔══════════════════════════════════════════════════════════╗
    ║                                                          ║
    ║     █▀█ █ ▀▄▀ █▀▀ █       █ █▀█ █ █ █▀█ █▄ █ █▀▀ █▄█     ║
    ║     █▀▀ █ █ █ ██▄ █▄▄   █▄█ █▄█ █▄█ █▀▄ █ ▀█ ██▄  █      ║
    ║                                                          ║
    ║              "A life, one level at a time"               ║
    ║                                                          ║
    ╚══════════════════════════════════════════════════════════╝
"#;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(area);

    let title = Paragraph::new(title_art)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let selected = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let normal = Style::default().fg(Color::White);
    let style_for = |option: MenuOption| {
        if app.menu_selection == option {
            selected
        } else {
            normal
        }
    };

    if app.engine.resume_level() > 0 {
        let label = format!("  CONTINUE (LEVEL {})  ", app.engine.resume_level() + 1);
        let item = Paragraph::new(label)
            .style(style_for(MenuOption::Continue))
            .alignment(Alignment::Center);
        f.render_widget(item, chunks[1]);
    }

    let new_game = Paragraph::new("  NEW GAME  ")
        .style(style_for(MenuOption::NewGame))
        .alignment(Alignment::Center);
    f.render_widget(new_game, chunks[2]);

    let quit = Paragraph::new("  QUIT  ")
        .style(style_for(MenuOption::Quit))
        .alignment(Alignment::Center);
    f.render_widget(quit, chunks[3]);

    let help = Paragraph::new("↑/↓ to select  •  ENTER to confirm  •  q to quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[4]);
}
