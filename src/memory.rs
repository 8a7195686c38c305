use sysinfo::{ProcessExt, System, SystemExt};

/// Resident memory of the current process in bytes, 0 when unavailable.
pub fn resident_memory() -> u64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0;
    };
    let mut system = System::new();
    system.refresh_process(pid);
    system.process(pid).map(|p| p.memory()).unwrap_or(0)
}
