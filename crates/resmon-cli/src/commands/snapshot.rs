//! One-shot sample of every metric.

use resmon_core::MemorySampler;

pub fn run(json: bool, spin_iterations: u64) {
    let mut memory = MemorySampler::new();
    let mut cpu = super::make_cpu_sampler(spin_iterations);

    let mem = memory.sample();
    let cpu_snap = cpu.sample();

    if json {
        let out = serde_json::json!({
            "memory": mem.as_ref().ok(),
            "memory_error": mem.as_ref().err().map(|e| e.to_string()),
            "cpu": cpu_snap,
            "npu": serde_json::Value::Null,
        });
        match serde_json::to_string_pretty(&out) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Failed to serialize snapshot: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    match mem {
        Ok(m) => println!("RAM  {m}"),
        Err(e) => println!("RAM  unavailable ({e})"),
    }
    println!("CPU  {cpu_snap}");
    println!("NPU  0.0% (not wired)");
}
