//! Card rendering — the terminal counterpart of the original four-card
//! screen.
//!
//! ┌ resmon ─ cycle #42 ──────────────────────────┐
//! │  RAM   ████████░░░░░░░░░░░░░░   6.0/8.0GB    │
//! ├──────────────────────────────────────────────┤
//! │  CPU   ████░░░░░░░░░░░░░░░░░░   37.5%        │
//! ├──────────────────────────────────────────────┤
//! │  GPU (render loop)              60 FPS       │
//! ├──────────────────────────────────────────────┤
//! │  NPU                            0.0%         │
//! ├──────────────────────────────────────────────┤
//! │  q: quit   p: pause   +/-: redraw pacing     │
//! └──────────────────────────────────────────────┘

use ratatui::{prelude::*, widgets::*};

use resmon_core::{CpuSnapshot, FrameRateSnapshot, MemorySnapshot};

/// Everything one frame needs, captured by the app in a single lock.
pub struct View {
    pub memory: Option<MemorySnapshot>,
    pub memory_stale: bool,
    pub cpu: CpuSnapshot,
    pub fps: FrameRateSnapshot,
    pub cycles: u64,
    pub paused: bool,
    pub refresh_secs: f64,
}

pub fn draw(f: &mut Frame, view: &View) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(12),   // cards
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], view);
    draw_cards(f, rows[1], view);
    draw_keys(f, rows[2]);
}

fn draw_title(f: &mut Frame, area: Rect, view: &View) {
    let state = if view.paused { "  ⏸ paused" } else { "" };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" resmon ", Style::default().bold().fg(Color::Cyan)),
            Span::styled(
                format!(
                    " cycle #{}  redraw {:.2}s{state} ",
                    view.cycles, view.refresh_secs
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    f.render_widget(block, area);
}

fn draw_cards(f: &mut Frame, area: Rect, view: &View) {
    let cards = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    draw_memory_card(f, cards[0], view);
    draw_cpu_card(f, cards[1], view);
    draw_fps_card(f, cards[2], view);
    draw_npu_card(f, cards[3]);
}

fn draw_memory_card(f: &mut Frame, area: Rect, view: &View) {
    let title = if view.memory_stale {
        " RAM (stale) "
    } else {
        " RAM "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(if view.memory_stale {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        });

    match view.memory {
        Some(mem) => {
            let gauge = Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(Color::Cyan))
                .ratio(memory_ratio(&mem))
                .label(mem.to_string());
            f.render_widget(gauge, area);
        }
        None => {
            let p = Paragraph::new("waiting for first sample…")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(p, area);
        }
    }
}

fn draw_cpu_card(f: &mut Frame, area: Rect, view: &View) {
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" CPU "))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(percent_ratio(view.cpu.percent_busy))
        .label(view.cpu.to_string());
    f.render_widget(gauge, area);
}

fn draw_fps_card(f: &mut Frame, area: Rect, view: &View) {
    let p = Paragraph::new(view.fps.to_string())
        .style(Style::default().bold())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" GPU (render loop) "),
        );
    f.render_widget(p, area);
}

fn draw_npu_card(f: &mut Frame, area: Rect) {
    // Placeholder card, as in the original screen: nothing feeds it yet.
    let p = Paragraph::new("0.0%")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" NPU "));
    f.render_widget(p, area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(" q: quit   p: pause   +/-: redraw pacing")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

/// Used/total as a gauge ratio in [0, 1].
fn memory_ratio(mem: &MemorySnapshot) -> f64 {
    if mem.total_bytes == 0 {
        return 0.0;
    }
    (mem.used_bytes as f64 / mem.total_bytes as f64).clamp(0.0, 1.0)
}

/// Percent as a gauge ratio in [0, 1].
fn percent_ratio(percent: f64) -> f64 {
    (percent / 100.0).clamp(0.0, 1.0)
}
