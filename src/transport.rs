//! Command/data-gated bus transport.
//!
//! Every logical exchange with the panel is one atomic bracket: assert
//! chip-select, set the data/command line, clock the bytes out, flush the
//! bus, deassert chip-select. Brackets never interleave; the DMA path is
//! the one deliberate exception, holding the bracket open from
//! [`SpiTransport::begin_dma`] until [`SpiTransport::dma_done`] observes
//! completion.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::Error;

/// Non-blocking bulk-write extension for SPI buses whose HAL can hand a
/// write to a DMA engine and report completion later.
///
/// Contract: [`start_transfer`](Self::start_transfer) must not block on
/// the transfer itself, and the bytes handed over must stay valid and
/// untouched until [`transfer_done`](Self::transfer_done) reports `true`.
/// The caller owns that guarantee; [`crate::FrameBuffer`] enforces it by
/// refusing to recycle a buffer with a transfer unresolved.
pub trait DmaTransfer: embedded_hal::spi::ErrorType {
    /// Begin a non-blocking write of `bytes`.
    fn start_transfer(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Poll the write started by [`start_transfer`](Self::start_transfer).
    /// With nothing in flight this reports `true`.
    fn transfer_done(&mut self) -> Result<bool, Self::Error>;
}

/// Gates a shared SPI channel with chip-select (active low) and
/// data/command (command = low, data = high) lines.
pub struct SpiTransport<SPI, CS, DC> {
    spi: SPI,
    cs: CS,
    dc: DC,
}

impl<SPI, CS, DC, E> SpiTransport<SPI, CS, DC>
where
    SPI: SpiBus<u8, Error = E>,
    CS: OutputPin<Error = Infallible>,
    DC: OutputPin<Error = Infallible>,
{
    pub fn new(spi: SPI, cs: CS, dc: DC) -> Self {
        Self { spi, cs, dc }
    }

    /// Send one command opcode followed by its parameter bytes, all in a
    /// single bracket. Parameters go out in data mode, per the ST77xx
    /// command protocol.
    pub fn command(&mut self, opcode: u8, params: &[u8]) -> Result<(), Error<E>> {
        self.cs.set_low().map_err(Error::Pin)?;
        let res = self.command_unbracketed(opcode, params);
        self.cs.set_high().map_err(Error::Pin)?;
        res
    }

    fn command_unbracketed(&mut self, opcode: u8, params: &[u8]) -> Result<(), Error<E>> {
        self.dc.set_low().map_err(Error::Pin)?;
        self.spi.write(&[opcode]).map_err(Error::Comm)?;
        if !params.is_empty() {
            self.dc.set_high().map_err(Error::Pin)?;
            self.spi.write(params).map_err(Error::Comm)?;
        }
        self.spi.flush().map_err(Error::Comm)
    }

    /// Blocking data-mode bracket.
    pub fn data(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.cs.set_low().map_err(Error::Pin)?;
        let res = self.data_unbracketed(bytes);
        self.cs.set_high().map_err(Error::Pin)?;
        res
    }

    fn data_unbracketed(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.dc.set_high().map_err(Error::Pin)?;
        self.spi.write(bytes).map_err(Error::Comm)?;
        self.spi.flush().map_err(Error::Comm)
    }

    /// Force the bracket closed without waiting for an in-flight transfer.
    /// Also puts the line in its idle state before the first exchange.
    pub fn release(&mut self) -> Result<(), Error<E>> {
        self.cs.set_high().map_err(Error::Pin)
    }
}

impl<SPI, CS, DC, E> SpiTransport<SPI, CS, DC>
where
    SPI: SpiBus<u8, Error = E> + DmaTransfer,
    CS: OutputPin<Error = Infallible>,
    DC: OutputPin<Error = Infallible>,
{
    /// Open a data bracket and hand `bytes` to the bus DMA engine.
    /// Chip-select stays asserted until [`dma_done`](Self::dma_done)
    /// observes completion or [`release`](Self::release) gives up on it.
    pub fn begin_dma(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.cs.set_low().map_err(Error::Pin)?;
        self.dc.set_high().map_err(Error::Pin)?;
        match self.spi.start_transfer(bytes) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.cs.set_high().map_err(Error::Pin)?;
                Err(Error::Comm(e))
            }
        }
    }

    /// Completion query for the bracket opened by
    /// [`begin_dma`](Self::begin_dma). Closes the bracket once the
    /// transfer has finished (or failed).
    pub fn dma_done(&mut self) -> Result<bool, Error<E>> {
        match self.spi.transfer_done() {
            Ok(true) => {
                self.cs.set_high().map_err(Error::Pin)?;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                self.cs.set_high().map_err(Error::Pin)?;
                Err(Error::Comm(e))
            }
        }
    }
}
