//! In-memory board for controller tests

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use meridian_core::traits::{PublishSink, Reading, Status};
use meridian_hal::{
    CpuThermometer, DelayUs, I2cBus, OutputPin, PositionStore, PwmOutput, SpiBus, StoreError,
};

use crate::board::{Board, BoardPorts, SharedSink};

/// Everything the mock ports wrote
#[derive(Debug, Default)]
pub struct Lines {
    pub levels: HashMap<&'static str, bool>,
    /// Direction line level at every rising step edge
    pub steps: Vec<bool>,
    pub pwm: HashMap<&'static str, (u32, u8)>,
    pub spi: Vec<[u8; 2]>,
}

impl Lines {
    pub fn level(&self, name: &str) -> Option<bool> {
        self.levels.get(name).copied()
    }

    pub fn duty(&self, name: &str) -> Option<u8> {
        self.pwm.get(name).map(|(_, duty)| *duty)
    }
}

pub type SharedLines = Arc<Mutex<Lines>>;

pub struct MockPin {
    name: &'static str,
    lines: SharedLines,
}

impl OutputPin for MockPin {
    type Error = ();

    fn set_high(&mut self) -> Result<(), ()> {
        let mut lines = self.lines.lock();
        if self.name == "step" {
            let direction = lines.level("dir").unwrap_or(false);
            lines.steps.push(direction);
        }
        lines.levels.insert(self.name, true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), ()> {
        self.lines.lock().levels.insert(self.name, false);
        Ok(())
    }
}

pub struct MockPwm {
    name: &'static str,
    lines: SharedLines,
}

impl PwmOutput for MockPwm {
    type Error = ();

    fn set_pwm(&mut self, frequency_hz: u32, duty_percent: u8) -> Result<(), ()> {
        self.lines
            .lock()
            .pwm
            .insert(self.name, (frequency_hz, duty_percent));
        Ok(())
    }
}

pub struct MockSpi {
    lines: SharedLines,
}

impl SpiBus for MockSpi {
    type Error = ();

    fn write(&mut self, data: &[u8]) -> Result<(), ()> {
        if let [a, b] = data {
            self.lines.lock().spi.push([*a, *b]);
        }
        Ok(())
    }
}

/// I2C bus with SMBus words for the devices that are present
#[derive(Default)]
pub struct MockI2c {
    pub words: Arc<Mutex<HashMap<(u8, u8), u16>>>,
}

impl I2cBus for MockI2c {
    type Error = ();

    fn write(&mut self, _address: u8, _data: &[u8]) -> Result<(), ()> {
        Err(())
    }

    fn read(&mut self, _address: u8, _buf: &mut [u8]) -> Result<(), ()> {
        Err(())
    }

    fn write_read(&mut self, address: u8, write: &[u8], buf: &mut [u8]) -> Result<(), ()> {
        let command = *write.first().ok_or(())?;
        let value = *self.words.lock().get(&(address, command)).ok_or(())?;
        let bytes = value.to_le_bytes();
        let n = buf.len().min(2);
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(())
    }
}

/// Delay that only sleeps for inter-step gaps when `real` is set
pub struct MockDelay {
    pub real: bool,
}

impl DelayUs for MockDelay {
    fn delay_us(&mut self, us: u32) {
        if self.real {
            thread::sleep(Duration::from_micros(us as u64));
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    pub saved: Arc<Mutex<Option<i32>>>,
}

impl PositionStore for MemoryStore {
    fn load(&mut self) -> Result<i32, StoreError> {
        self.saved.lock().ok_or(StoreError::NotFound)
    }

    fn save(&mut self, position: i32) -> Result<(), StoreError> {
        *self.saved.lock() = Some(position);
        Ok(())
    }
}

pub struct MockThermometer {
    pub millicelsius: Option<i32>,
}

impl CpuThermometer for MockThermometer {
    type Error = ();

    fn read_millicelsius(&mut self) -> Result<i32, ()> {
        self.millicelsius.ok_or(())
    }
}

pub struct MockBoard;

impl Board for MockBoard {
    type Pin = MockPin;
    type Pwm = MockPwm;
    type I2c = MockI2c;
    type Spi = MockSpi;
    type Delay = MockDelay;
    type Store = MemoryStore;
    type Thermometer = MockThermometer;
}

/// Handles into a mock board after its ports are handed out
pub struct MockHandles {
    pub lines: SharedLines,
    pub store: MemoryStore,
    pub words: Arc<Mutex<HashMap<(u8, u8), u16>>>,
}

impl MockBoard {
    pub fn ports(real_delay: bool) -> (BoardPorts<MockBoard>, MockHandles) {
        let lines = SharedLines::default();
        let pin = |name| MockPin {
            name,
            lines: Arc::clone(&lines),
        };
        let pwm = |name| MockPwm {
            name,
            lines: Arc::clone(&lines),
        };
        let store = MemoryStore::default();
        let i2c = MockI2c::default();
        let handles = MockHandles {
            lines: Arc::clone(&lines),
            store: store.clone(),
            words: Arc::clone(&i2c.words),
        };

        let ports = BoardPorts {
            i2c,
            dac: MockSpi {
                lines: Arc::clone(&lines),
            },
            delay: MockDelay { real: real_delay },
            store,
            thermometer: MockThermometer {
                millicelsius: Some(45_000),
            },
            step: pin("step"),
            direction: pin("dir"),
            mode: [pin("m0"), pin("m1"), pin("m2")],
            reset: pin("reset"),
            enable: pin("enable"),
            decay: pin("decay"),
            motor_pwm: pwm("motor"),
            fan: pwm("fan"),
            relays: [pin("relay0"), pin("relay1")],
            pwm_outputs: [pwm("pwm0"), pwm("pwm1")],
        };
        (ports, handles)
    }
}

/// Sink that keeps every publication
#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<(Reading, Status)>>,
}

impl RecordingSink {
    pub fn shared() -> (Arc<RecordingSink>, SharedSink) {
        let sink = Arc::new(RecordingSink::default());
        let shared: SharedSink = sink.clone();
        (sink, shared)
    }

    pub fn all(&self) -> Vec<(Reading, Status)> {
        self.published.lock().clone()
    }

    pub fn positions(&self) -> Vec<(i32, Status)> {
        self.all()
            .into_iter()
            .filter_map(|(reading, status)| match reading {
                Reading::FocuserPosition(position) => Some((position, status)),
                _ => None,
            })
            .collect()
    }

    /// Last publication under a property name
    pub fn last(&self, name: &str) -> Option<(Reading, Status)> {
        self.all()
            .into_iter()
            .rev()
            .find(|(reading, _)| reading.name() == name)
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }
}

impl PublishSink for RecordingSink {
    fn publish(&self, reading: Reading, status: Status) {
        self.published.lock().push((reading, status));
    }
}
