use super::PlatformExtensions;
use crate::model::{CoreTicks, PowerReading};

use windows_sys::Win32::System::Power::{GetSystemPowerStatus, SYSTEM_POWER_STATUS};

pub struct Platform;

// BatteryFlag bits
const BATTERY_CHARGING: u8 = 8;
const NO_SYSTEM_BATTERY: u8 = 128;
const UNKNOWN_STATUS: u8 = 255;

impl PlatformExtensions for Platform {
    fn os_code_name() -> Option<String> {
        None
    }

    fn core_ticks() -> Option<Vec<(u32, CoreTicks)>> {
        None
    }

    fn core_max_frequency_hz(_core: u32) -> Option<u64> {
        None
    }

    fn power_source() -> Option<PowerReading> {
        let status = unsafe {
            let mut status = std::mem::zeroed::<SYSTEM_POWER_STATUS>();
            if GetSystemPowerStatus(&mut status) == 0 {
                return None;
            }
            status
        };
        if status.BatteryFlag == UNKNOWN_STATUS
            || status.BatteryFlag & NO_SYSTEM_BATTERY != 0
            || status.BatteryLifePercent == UNKNOWN_STATUS
        {
            return None;
        }
        let remaining_seconds = if status.BatteryLifeTime == u32::MAX {
            -1.0
        } else {
            f64::from(status.BatteryLifeTime)
        };
        Some(PowerReading {
            remaining_capacity: f64::from(status.BatteryLifePercent) / 100.0,
            remaining_seconds,
            temperature_c: 0.0,
            charging: status.BatteryFlag & BATTERY_CHARGING != 0,
        })
    }

    fn process_thread_count(_pid: u32) -> Option<u32> {
        None
    }

    fn service_count() -> Option<u32> {
        None
    }
}
