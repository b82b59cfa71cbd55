//! Scripted I2C bus and output lines for driver tests

use heapless::Vec;
use meridian_hal::{I2cBus, OutputPin, PwmOutput, SpiBus};

/// I2C bus that answers from tables
pub struct MockBus {
    /// Addresses that acknowledge
    pub present: Vec<u8, 8>,
    /// Fail every transaction while set
    pub failing: bool,
    /// Plain writes, address and payload
    pub writes: Vec<(u8, Vec<u8, 4>), 64>,
    /// SMBus words: address, command, value
    pub words: Vec<(u8, u8, u16), 8>,
    /// Plain read payloads per address
    pub reads: Vec<(u8, Vec<u8, 8>), 8>,
}

impl MockBus {
    pub fn new(present: &[u8]) -> Self {
        Self {
            present: Vec::from_slice(present).unwrap(),
            failing: false,
            writes: Vec::new(),
            words: Vec::new(),
            reads: Vec::new(),
        }
    }

    pub fn set_word(&mut self, address: u8, command: u8, value: u16) {
        self.words.retain(|(a, c, _)| !(*a == address && *c == command));
        self.words.push((address, command, value)).unwrap();
    }

    pub fn set_read(&mut self, address: u8, data: &[u8]) {
        self.reads.retain(|(a, _)| *a != address);
        self.reads
            .push((address, Vec::from_slice(data).unwrap()))
            .unwrap();
    }

    pub fn wrote(&self, address: u8, data: &[u8]) -> bool {
        self.writes
            .iter()
            .any(|(a, payload)| *a == address && &payload[..] == data)
    }

    fn check(&self, address: u8) -> Result<(), ()> {
        if self.failing || !self.present.contains(&address) {
            Err(())
        } else {
            Ok(())
        }
    }
}

impl I2cBus for MockBus {
    type Error = ();

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), ()> {
        self.check(address)?;
        let _ = self
            .writes
            .push((address, Vec::from_slice(data).unwrap_or_default()));
        Ok(())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), ()> {
        self.check(address)?;
        let (_, data) = self.reads.iter().find(|(a, _)| *a == address).ok_or(())?;
        buf.copy_from_slice(&data[..buf.len()]);
        Ok(())
    }

    fn write_read(&mut self, address: u8, write: &[u8], buf: &mut [u8]) -> Result<(), ()> {
        self.check(address)?;
        let (_, _, value) = self
            .words
            .iter()
            .find(|(a, c, _)| *a == address && *c == write[0])
            .ok_or(())?;
        buf.copy_from_slice(&value.to_le_bytes()[..buf.len()]);
        Ok(())
    }
}

/// Output line that remembers its level
#[derive(Default)]
pub struct MockPin {
    pub high: bool,
    pub writes: u32,
    pub broken: bool,
}

impl OutputPin for MockPin {
    type Error = ();

    fn set_high(&mut self) -> Result<(), ()> {
        self.set(true)
    }

    fn set_low(&mut self) -> Result<(), ()> {
        self.set(false)
    }
}

impl MockPin {
    fn set(&mut self, high: bool) -> Result<(), ()> {
        if self.broken {
            return Err(());
        }
        self.high = high;
        self.writes += 1;
        Ok(())
    }
}

/// PWM line that remembers its waveform
#[derive(Default)]
pub struct MockPwm {
    pub frequency_hz: u32,
    pub duty: u8,
    pub broken: bool,
}

impl PwmOutput for MockPwm {
    type Error = ();

    fn set_pwm(&mut self, frequency_hz: u32, duty_percent: u8) -> Result<(), ()> {
        if self.broken {
            return Err(());
        }
        self.frequency_hz = frequency_hz;
        self.duty = duty_percent.min(100);
        Ok(())
    }
}

/// SPI device that keeps the last frame
#[derive(Default)]
pub struct MockSpi {
    pub last: [u8; 2],
    pub frames: u32,
}

impl SpiBus for MockSpi {
    type Error = ();

    fn write(&mut self, data: &[u8]) -> Result<(), ()> {
        self.last.copy_from_slice(&data[..2]);
        self.frames += 1;
        Ok(())
    }
}
