//! Memory sampler — total/used bytes from ambient OS memory info.
//!
//! Linux reads `/proc/meminfo` (`used = MemTotal - MemAvailable`). macOS
//! asks `sysctl` for the physical total and approximates availability from
//! `vm_stat` page counts (free + inactive + speculative). Anything else
//! reports `UnavailableMetric` every tick and the caller keeps whatever it
//! last saw.

#[cfg(target_os = "macos")]
use std::io::Read;
#[cfg(target_os = "macos")]
use std::process::Stdio;
#[cfg(target_os = "macos")]
use std::time::{Duration, Instant};

use crate::error::SampleError;
use crate::snapshot::MemorySnapshot;

/// Samples current used/total memory on demand.
pub struct MemorySampler {
    last: Option<MemorySnapshot>,
}

impl MemorySampler {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Read current used/total memory.
    ///
    /// On failure the error is returned and the previous snapshot stays
    /// available via [`last`](Self::last); callers render the last-known-good
    /// value and retry on the next tick.
    pub fn sample(&mut self) -> Result<MemorySnapshot, SampleError> {
        let snap = read_memory()?;
        self.last = Some(snap);
        Ok(snap)
    }

    /// Last successfully sampled snapshot, if any tick has succeeded.
    pub fn last(&self) -> Option<MemorySnapshot> {
        self.last
    }
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
fn read_memory() -> Result<MemorySnapshot, SampleError> {
    let contents = std::fs::read_to_string("/proc/meminfo")
        .map_err(|e| SampleError::unavailable(format!("/proc/meminfo: {e}")))?;
    parse_meminfo(&contents).ok_or_else(|| SampleError::unavailable("malformed /proc/meminfo"))
}

#[cfg(target_os = "macos")]
fn read_memory() -> Result<MemorySnapshot, SampleError> {
    let total = run_command("sysctl", &["-n", "hw.memsize"])
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| SampleError::unavailable("sysctl hw.memsize"))?;
    let vm = run_command("vm_stat", &[]).ok_or_else(|| SampleError::unavailable("vm_stat"))?;
    let available =
        parse_vm_stat_available(&vm).ok_or_else(|| SampleError::unavailable("malformed vm_stat output"))?;

    Ok(MemorySnapshot {
        used_bytes: total.saturating_sub(available),
        total_bytes: total,
    })
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn read_memory() -> Result<MemorySnapshot, SampleError> {
    Err(SampleError::unavailable(
        "no memory-info source on this platform",
    ))
}

/// Parse `MemTotal`/`MemAvailable` (kB lines) out of `/proc/meminfo` text.
///
/// Returns `None` when either line is missing, non-numeric, or available
/// exceeds total — malformed readings must not produce a snapshot that
/// violates `used <= total`.
#[cfg(any(target_os = "linux", test))]
fn parse_meminfo(contents: &str) -> Option<MemorySnapshot> {
    let mut total_kb = None;
    let mut available_kb = None;

    for line in contents.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok());
        match key {
            "MemTotal" => total_kb = value,
            "MemAvailable" => available_kb = value,
            _ => {}
        }
        if total_kb.is_some() && available_kb.is_some() {
            break;
        }
    }

    let total = total_kb?.checked_mul(1024)?;
    let available = available_kb?.checked_mul(1024)?;
    if available > total {
        return None;
    }
    Some(MemorySnapshot {
        used_bytes: total - available,
        total_bytes: total,
    })
}

/// Sum free + inactive + speculative pages from `vm_stat` output, in bytes.
///
/// The page size is taken from the header line when present, 4096 otherwise.
#[cfg(any(target_os = "macos", test))]
fn parse_vm_stat_available(output: &str) -> Option<u64> {
    let mut page_size = 4096u64;
    let mut pages = 0u64;
    let mut matched = false;

    for line in output.lines() {
        if line.contains("page size of") {
            if let Some(ps) = line
                .split("page size of")
                .nth(1)
                .and_then(|s| s.split_whitespace().next())
                .and_then(|s| s.parse::<u64>().ok())
            {
                page_size = ps;
            }
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let counted = matches!(
            key.trim(),
            "Pages free" | "Pages inactive" | "Pages speculative"
        );
        if !counted {
            continue;
        }
        // vm_stat prints counts with a trailing period.
        let cleaned = value.replace('.', "");
        let n = cleaned.split_whitespace().next()?.parse::<u64>().ok()?;
        pages = pages.checked_add(n)?;
        matched = true;
    }

    if !matched {
        return None;
    }
    pages.checked_mul(page_size)
}

/// Run a subprocess and return its trimmed stdout, with a timeout so a
/// wedged utility cannot stall the sampling tick.
#[cfg(target_os = "macos")]
fn run_command(cmd: &str, args: &[&str]) -> Option<String> {
    const COMMAND_TIMEOUT: Duration = Duration::from_millis(400);

    let mut child = std::process::Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    return None;
                }
                let mut out = Vec::new();
                if let Some(mut stdout) = child.stdout.take() {
                    let _ = stdout.read_to_end(&mut out);
                }
                let s = String::from_utf8_lossy(&out).trim().to_string();
                return if s.is_empty() { None } else { Some(s) };
            }
            Ok(None) => {
                if start.elapsed() >= COMMAND_TIMEOUT {
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(_) => return None,
        }
    }
}
