use std::ffi::CStr;
use std::process::Command;

use super::PlatformExtensions;
use super::darwin;
use crate::model::{CoreTicks, PowerReading};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn os_code_name() -> Option<String> {
        let version = sysctl_string(c"kern.osproductversion")?;
        darwin::code_name(&version).map(str::to_string)
    }

    #[allow(deprecated)]
    fn core_ticks() -> Option<Vec<(u32, CoreTicks)>> {
        let mut cpu_count: libc::natural_t = 0;
        let mut info: libc::processor_info_array_t = std::ptr::null_mut();
        let mut info_count: libc::mach_msg_type_number_t = 0;

        let rc = unsafe {
            libc::host_processor_info(
                libc::mach_host_self(),
                libc::PROCESSOR_CPU_LOAD_INFO,
                &mut cpu_count,
                &mut info,
                &mut info_count,
            )
        };
        if rc != libc::KERN_SUCCESS || info.is_null() {
            return None;
        }

        let states = unsafe { std::slice::from_raw_parts(info, info_count as usize) };
        let ticks = darwin::load_info_ticks(states);
        unsafe {
            libc::vm_deallocate(
                libc::mach_task_self(),
                info as libc::vm_address_t,
                info_count as libc::vm_size_t * std::mem::size_of::<libc::integer_t>(),
            );
        }
        Some(ticks)
    }

    fn core_max_frequency_hz(_core: u32) -> Option<u64> {
        // Not reported on Apple Silicon; Intel Macs expose one value for all cores
        let mut value: u64 = 0;
        let mut len = std::mem::size_of::<u64>();
        let rc = unsafe {
            libc::sysctlbyname(
                c"hw.cpufrequency_max".as_ptr(),
                &mut value as *mut u64 as *mut libc::c_void,
                &mut len,
                std::ptr::null_mut(),
                0,
            )
        };
        if rc == 0 && value > 0 { Some(value) } else { None }
    }

    fn power_source() -> Option<PowerReading> {
        let output = Command::new("pmset").args(["-g", "batt"]).output().ok()?;
        if !output.status.success() {
            return None;
        }
        darwin::parse_pmset_battery(&String::from_utf8_lossy(&output.stdout))
    }

    fn process_thread_count(pid: u32) -> Option<u32> {
        use libproc::libproc::proc_pid::pidinfo;
        use libproc::libproc::task_info::TaskInfo;

        let info = pidinfo::<TaskInfo>(pid as i32, 0).ok()?;
        u32::try_from(info.pti_threadnum).ok()
    }

    fn service_count() -> Option<u32> {
        None
    }
}

fn sysctl_string(name: &CStr) -> Option<String> {
    let mut buf = [0u8; 64];
    let mut len = buf.len();
    let rc = unsafe {
        libc::sysctlbyname(
            name.as_ptr(),
            buf.as_mut_ptr() as *mut libc::c_void,
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        return None;
    }
    let value = CStr::from_bytes_until_nul(&buf[..len.min(buf.len())]).ok()?;
    Some(value.to_string_lossy().into_owned())
}
