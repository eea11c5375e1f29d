//! TUI application state and sampling threads.
//!
//! Memory and CPU sampling run on background pollers so the CPU sampler's
//! blocking measurement window never freezes the draw loop. The draw loop
//! itself is the render surface: every completed draw counts one frame
//! toward the FPS card. Pollers stop when the app tears down — their
//! lifetime is the dashboard session's lifetime.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use resmon_core::{
    CpuSnapshot, DEFAULT_SAMPLE_PERIOD, FrameRateCounter, MemorySampler, MemorySnapshot, Poller,
};

use super::ui::View;

/// Latest published snapshots, shared between pollers and the draw loop.
#[derive(Default)]
struct SharedState {
    memory: Option<MemorySnapshot>,
    /// Last memory read failed; the card shows the last-known-good value.
    memory_stale: bool,
    cpu: CpuSnapshot,
    /// Completed CPU sampling windows.
    cycles: u64,
}

pub struct App {
    shared: Arc<Mutex<SharedState>>,
    paused: Arc<AtomicBool>,
    fps: Arc<FrameRateCounter>,
    refresh: Duration,
    spin_iterations: u64,
    running: bool,
    pollers: Vec<Poller>,
}

impl App {
    pub fn new(refresh_secs: f64, spin_iterations: u64) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SharedState::default())),
            paused: Arc::new(AtomicBool::new(false)),
            fps: Arc::new(FrameRateCounter::new()),
            refresh: Duration::from_secs_f64(refresh_secs.clamp(0.05, 2.0)),
            spin_iterations,
            running: true,
            pollers: Vec::new(),
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        self.start_pollers()?;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook that restores terminal before printing the panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error.
        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        // Session teardown stops the sampling threads.
        for poller in self.pollers.drain(..) {
            poller.stop();
        }

        result
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        while self.running {
            let view = self.view();
            terminal.draw(|f| super::ui::draw(f, &view))?;
            self.fps.on_frame_rendered();

            if event::poll(self.refresh)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('p') => {
                let was = self.paused.load(Ordering::Relaxed);
                self.paused.store(!was, Ordering::Relaxed);
            }
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char(']') => {
                let secs = (self.refresh.as_secs_f64() / 2.0).max(0.05);
                self.refresh = Duration::from_secs_f64(secs);
            }
            KeyCode::Char('-') | KeyCode::Char('[') => {
                let secs = (self.refresh.as_secs_f64() * 2.0).min(2.0);
                self.refresh = Duration::from_secs_f64(secs);
            }
            _ => {}
        }
    }

    fn start_pollers(&mut self) -> io::Result<()> {
        let shared = Arc::clone(&self.shared);
        let paused = Arc::clone(&self.paused);
        let mut memory = MemorySampler::new();
        let mem_poller = Poller::spawn("memory-sampler", DEFAULT_SAMPLE_PERIOD, move || {
            if paused.load(Ordering::Relaxed) {
                return;
            }
            let result = memory.sample();
            let mut s = match shared.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            match result {
                Ok(snap) => {
                    s.memory = Some(snap);
                    s.memory_stale = false;
                }
                Err(e) => {
                    log::warn!("memory sample skipped: {e}");
                    s.memory_stale = true;
                }
            }
        })?;

        let shared = Arc::clone(&self.shared);
        let paused = Arc::clone(&self.paused);
        let mut cpu = crate::commands::make_cpu_sampler(self.spin_iterations);
        let cpu_poller = Poller::spawn("cpu-sampler", DEFAULT_SAMPLE_PERIOD, move || {
            if paused.load(Ordering::Relaxed) {
                return;
            }
            let snap = cpu.sample();
            let mut s = match shared.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            s.cpu = snap;
            s.cycles += 1;
        })?;

        self.pollers.push(mem_poller);
        self.pollers.push(cpu_poller);
        Ok(())
    }

    /// Capture everything one frame needs in a single lock.
    fn view(&self) -> View {
        let s = match self.shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        View {
            memory: s.memory,
            memory_stale: s.memory_stale,
            cpu: s.cpu,
            fps: self.fps.snapshot(),
            cycles: s.cycles,
            paused: self.paused.load(Ordering::Relaxed),
            refresh_secs: self.refresh.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_rate_is_clamped() {
        let fast = App::new(0.0001, 1);
        assert_eq!(fast.refresh, Duration::from_secs_f64(0.05));

        let slow = App::new(60.0, 1);
        assert_eq!(slow.refresh, Duration::from_secs_f64(2.0));
    }

    #[test]
    fn view_starts_empty_and_unpaused() {
        let app = App::new(0.5, 1);
        let view = app.view();
        assert!(view.memory.is_none());
        assert_eq!(view.cpu.percent_busy, 0.0);
        assert_eq!(view.fps.frames_per_second, 0);
        assert_eq!(view.cycles, 0);
        assert!(!view.paused);
    }

    #[test]
    fn pause_key_toggles() {
        let mut app = App::new(0.5, 1);
        app.handle_key(KeyCode::Char('p'));
        assert!(app.paused.load(Ordering::Relaxed));
        app.handle_key(KeyCode::Char('p'));
        assert!(!app.paused.load(Ordering::Relaxed));
    }

    #[test]
    fn quit_keys_stop_the_loop() {
        let mut app = App::new(0.5, 1);
        assert!(app.running);
        app.handle_key(KeyCode::Char('q'));
        assert!(!app.running);

        let mut app = App::new(0.5, 1);
        app.handle_key(KeyCode::Esc);
        assert!(!app.running);
    }

    #[test]
    fn refresh_keys_stay_within_bounds() {
        let mut app = App::new(0.1, 1);
        for _ in 0..10 {
            app.handle_key(KeyCode::Char('+'));
        }
        assert!(app.refresh >= Duration::from_secs_f64(0.05));

        for _ in 0..10 {
            app.handle_key(KeyCode::Char('-'));
        }
        assert!(app.refresh <= Duration::from_secs_f64(2.0));
    }
}
