//! Line-oriented periodic sampling to stdout (pipe-friendly).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use resmon_core::{CpuSnapshot, MemorySampler, MemorySnapshot};

pub fn run(interval_ms: u64, count: u64, spin_iterations: u64) {
    let mut memory = MemorySampler::new();
    let mut cpu = super::make_cpu_sampler(spin_iterations);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        log::warn!("no Ctrl-C handler, watch stops only via --count: {e}");
    }

    let interval = Duration::from_millis(interval_ms.max(1));
    let mut printed = 0u64;

    while running.load(Ordering::SeqCst) {
        // A failed memory read keeps the last-known-good value on screen.
        let mem = match memory.sample() {
            Ok(snap) => Some(snap),
            Err(_) => memory.last(),
        };
        let cpu_snap = cpu.sample();

        println!("{}", format_line(mem, cpu_snap));

        printed += 1;
        if count != 0 && printed >= count {
            break;
        }
        std::thread::sleep(interval);
    }
}

fn format_line(mem: Option<MemorySnapshot>, cpu: CpuSnapshot) -> String {
    let ram = match mem {
        Some(m) => m.to_string(),
        None => "unavailable".to_string(),
    };
    format!("ram {ram}  cpu {cpu}")
}
