pub fn run(refresh: f64, spin_iterations: u64) {
    let mut app = crate::tui::app::App::new(refresh, spin_iterations);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
