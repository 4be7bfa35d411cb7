//! Control sources. Both produce the same press/release stream so the
//! engine never learns where an input came from.

use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use ratatui::layout::Rect;

use crate::engine::movement::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Move(Direction),
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Press(Control),
    Release(Control),
}

pub trait InputSource {
    /// Turns one terminal event into control events; `now` is time since
    /// the app started.
    fn translate(&mut self, event: &Event, now: Duration) -> Vec<ControlEvent>;

    /// Releases synthesised by timeouts.
    fn expire(&mut self, _now: Duration) -> Vec<ControlEvent> {
        Vec::new()
    }

    /// Drops held state, e.g. when an overlay takes the input.
    fn reset(&mut self);
}

pub fn control_for_key(key: &KeyEvent) -> Option<Control> {
    match key.code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(Control::Move(Direction::Left))
        }
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(Control::Move(Direction::Right))
        }
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Control::Jump),
        _ => None,
    }
}

/// Arrow keys and WASD.
///
/// Terminals that report key releases map straight through. Elsewhere a
/// held direction is released once no repeat has arrived for
/// `hold_timeout`.
#[derive(Debug)]
pub struct KeyboardSource {
    reports_release: bool,
    hold_timeout: Duration,
    held: Vec<(Direction, Duration)>,
}

impl KeyboardSource {
    pub fn new(reports_release: bool, hold_timeout: Duration) -> Self {
        KeyboardSource {
            reports_release,
            hold_timeout,
            held: Vec::new(),
        }
    }
}

impl InputSource for KeyboardSource {
    fn translate(&mut self, event: &Event, now: Duration) -> Vec<ControlEvent> {
        let Event::Key(key) = event else {
            return Vec::new();
        };
        let Some(control) = control_for_key(key) else {
            return Vec::new();
        };

        match key.kind {
            KeyEventKind::Release => {
                if let Control::Move(dir) = control {
                    self.held.retain(|(d, _)| *d != dir);
                }
                vec![ControlEvent::Release(control)]
            }
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if let Control::Move(dir) = control {
                    if !self.reports_release {
                        self.held.retain(|(d, _)| *d != dir);
                        self.held.push((dir, now));
                    }
                }
                vec![ControlEvent::Press(control)]
            }
        }
    }

    fn expire(&mut self, now: Duration) -> Vec<ControlEvent> {
        let timeout = self.hold_timeout;
        let mut released = Vec::new();
        self.held.retain(|(dir, seen)| {
            let alive = now.saturating_sub(*seen) < timeout;
            if !alive {
                released.push(ControlEvent::Release(Control::Move(*dir)));
            }
            alive
        });
        released
    }

    fn reset(&mut self) {
        self.held.clear();
    }
}

/// On-screen ◀ ▲ ▶ buttons driven by mouse or touch press/release.
#[derive(Debug, Default)]
pub struct TouchSource {
    buttons: Vec<(Control, Rect)>,
    held: Option<Control>,
}

impl TouchSource {
    /// Updates button hit areas after each draw.
    pub fn set_buttons(&mut self, buttons: Vec<(Control, Rect)>) {
        self.buttons = buttons;
    }

    pub fn held(&self) -> Option<Control> {
        self.held
    }

    fn hit(&self, column: u16, row: u16) -> Option<Control> {
        self.buttons
            .iter()
            .find(|(_, r)| {
                column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
            })
            .map(|(control, _)| *control)
    }
}

impl InputSource for TouchSource {
    fn translate(&mut self, event: &Event, _now: Duration) -> Vec<ControlEvent> {
        let Event::Mouse(mouse) = event else {
            return Vec::new();
        };
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(control) = self.hit(mouse.column, mouse.row) else {
                    return Vec::new();
                };
                let mut out = Vec::new();
                if let Some(previous) = self.held.take() {
                    out.push(ControlEvent::Release(previous));
                }
                self.held = Some(control);
                out.push(ControlEvent::Press(control));
                out
            }
            MouseEventKind::Up(MouseButton::Left) => self
                .held
                .take()
                .map(|control| vec![ControlEvent::Release(control)])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.held = None;
    }
}
