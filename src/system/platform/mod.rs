//! Per-OS readings that sysinfo does not expose.

use crate::model::{CoreTicks, PowerReading};

pub trait PlatformExtensions {
    fn os_code_name() -> Option<String>;
    /// Cumulative tick counters keyed by logical core index.
    fn core_ticks() -> Option<Vec<(u32, CoreTicks)>>;
    fn core_max_frequency_hz(core: u32) -> Option<u64>;
    fn power_source() -> Option<PowerReading>;
    fn process_thread_count(pid: u32) -> Option<u32>;
    fn service_count() -> Option<u32>;
}

#[cfg(any(target_os = "macos", test))]
mod darwin;
#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn os_code_name() -> Option<String> {
    platform_impl::Platform::os_code_name()
}

pub fn core_ticks() -> Option<Vec<(u32, CoreTicks)>> {
    platform_impl::Platform::core_ticks()
}

pub fn core_max_frequency_hz(core: u32) -> Option<u64> {
    platform_impl::Platform::core_max_frequency_hz(core)
}

pub fn power_source() -> Option<PowerReading> {
    platform_impl::Platform::power_source()
}

pub fn process_thread_count(pid: u32) -> Option<u32> {
    platform_impl::Platform::process_thread_count(pid)
}

pub fn service_count() -> Option<u32> {
    platform_impl::Platform::service_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_do_not_panic() {
        let pid = std::process::id();
        let _ = os_code_name();
        let _ = core_ticks();
        let _ = core_max_frequency_hz(0);
        let _ = power_source();
        let _ = process_thread_count(pid);
        let _ = service_count();
    }
}
