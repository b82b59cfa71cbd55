//! Host implementations of the delay and CPU thermometer ports

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use meridian_hal::{CpuThermometer, DelayUs};

/// Delay backed by `thread::sleep`
///
/// Sleeps overshoot by tens of microseconds, which the step driver
/// tolerates; the inter-step delay is at least 200 µs anyway.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl DelayUs for ThreadDelay {
    fn delay_us(&mut self, us: u32) {
        thread::sleep(Duration::from_micros(us as u64));
    }
}

/// Kernel thermal zone reader
#[derive(Debug, Clone)]
pub struct SysfsThermometer {
    path: PathBuf,
}

impl SysfsThermometer {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CpuThermometer for SysfsThermometer {
    type Error = io::Error;

    fn read_millicelsius(&mut self) -> Result<i32, io::Error> {
        let contents = fs::read_to_string(&self.path)?;
        contents
            .trim()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
