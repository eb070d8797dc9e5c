//! Recording fakes for host tests: control-line and bus activity lands in
//! one shared, ordered event log so tests can assert on the exact wire
//! protocol.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{ErrorKind, ErrorType, SpiBus};

use crate::transport::DmaTransfer;

/// Everything observable on the wire, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Chip-select; `true` = asserted (line low).
    Cs(bool),
    /// Data/command; `true` = data mode (line high).
    Dc(bool),
    Write(Vec<u8>),
    DmaStart(Vec<u8>),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct CsPin(pub Log);

impl embedded_hal::digital::ErrorType for CsPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for CsPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().push(Event::Cs(true));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().push(Event::Cs(false));
        Ok(())
    }
}

pub struct DcPin(pub Log);

impl embedded_hal::digital::ErrorType for DcPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for DcPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().push(Event::Dc(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().push(Event::Dc(true));
        Ok(())
    }
}

/// Reset/backlight stand-in; level changes are not interesting to record.
pub struct StubPin;

impl embedded_hal::digital::ErrorType for StubPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for StubPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Debug, Default)]
pub struct DmaState {
    pub in_flight: bool,
    pub polls_until_done: u32,
}

/// SPI bus fake. Blocking writes append to the log; the DMA path completes
/// after `polls_until_done` completion queries (use `u32::MAX` for a stuck
/// transfer).
pub struct FakeBus {
    log: Log,
    polls_preset: u32,
    pub dma: Rc<RefCell<DmaState>>,
}

impl FakeBus {
    pub fn new(log: Log, polls_until_done: u32) -> Self {
        Self {
            log,
            polls_preset: polls_until_done,
            dma: Rc::new(RefCell::new(DmaState::default())),
        }
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl SpiBus<u8> for FakeBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Event::Write(words.to_vec()));
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        read.fill(0);
        self.log.borrow_mut().push(Event::Write(write.to_vec()));
        Ok(())
    }

    fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl DmaTransfer for FakeBus {
    fn start_transfer(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Event::DmaStart(bytes.to_vec()));
        let mut dma = self.dma.borrow_mut();
        dma.in_flight = true;
        dma.polls_until_done = self.polls_preset;
        Ok(())
    }

    fn transfer_done(&mut self) -> Result<bool, Self::Error> {
        let mut dma = self.dma.borrow_mut();
        if !dma.in_flight {
            return Ok(true);
        }
        if dma.polls_until_done == 0 {
            dma.in_flight = false;
            Ok(true)
        } else {
            dma.polls_until_done -= 1;
            Ok(false)
        }
    }
}

/// Bytes streamed in data mode after the last `memory_write` opcode, i.e.
/// the pixel payload of the most recent windowed write.
pub fn frame_stream(log: &Log, memory_write: u8) -> Vec<u8> {
    let events = log.borrow();
    let mut data_mode = false;
    let mut collecting = false;
    let mut out = Vec::new();
    for event in events.iter() {
        match event {
            Event::Dc(data) => data_mode = *data,
            Event::Cs(_) => {}
            Event::Write(bytes) => {
                if !data_mode {
                    if bytes[..] == [memory_write] {
                        collecting = true;
                        out.clear();
                    } else {
                        collecting = false;
                    }
                } else if collecting {
                    out.extend_from_slice(bytes);
                }
            }
            Event::DmaStart(bytes) => {
                if data_mode && collecting {
                    out.extend_from_slice(bytes);
                }
            }
        }
    }
    out
}
