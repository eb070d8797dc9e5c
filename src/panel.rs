//! Panel driver: encodes a controller profile on top of the bus transport.
//!
//! Lifecycle: constructed cold, [`Panel::init`] drives hardware reset and
//! the profile's vendor init table and leaves the panel ready; afterwards
//! the driver alternates between ready and one in-flight DMA presentation,
//! tracked by [`TransferState`].

use core::convert::Infallible;

use embedded_graphics_core::pixelcolor::Rgb565;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::profile::PanelProfile;
use crate::transport::{DmaTransfer, SpiTransport};
use crate::{Error, Rotation, wire_bytes};

/// Pixels per pre-built batch when streaming solid fills.
const FILL_BATCH_PIXELS: usize = 32;

/// State of the non-blocking presentation path. At most one transfer is
/// in flight; a second start is rejected, never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    Idle,
    InFlight,
    Complete,
    TimedOut,
}

impl TransferState {
    fn in_flight(self) -> bool {
        matches!(self, TransferState::InFlight)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Rotation applied at the end of [`Panel::init`].
    pub rotation: Rotation,
    /// Budget for [`Panel::wait_transfer`], in milliseconds.
    pub dma_timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rotation: Rotation::Deg90,
            dma_timeout_ms: 100,
        }
    }
}

/// One panel behind one transport. Construct as many as there are panels;
/// there is no global instance.
pub struct Panel<SPI, CS, DC, RST, BL> {
    transport: SpiTransport<SPI, CS, DC>,
    rst: RST,
    bl: BL,
    profile: &'static PanelProfile,
    config: Config,
    rotation: Rotation,
    width: u16,
    height: u16,
    initialized: bool,
    transfer: TransferState,
}

fn rotated_size(profile: &PanelProfile, rotation: Rotation) -> (u16, u16) {
    if rotation.swaps_axes() {
        (profile.height, profile.width)
    } else {
        (profile.width, profile.height)
    }
}

impl<SPI, CS, DC, RST, BL, E> Panel<SPI, CS, DC, RST, BL>
where
    SPI: SpiBus<u8, Error = E>,
    CS: OutputPin<Error = Infallible>,
    DC: OutputPin<Error = Infallible>,
    RST: OutputPin<Error = Infallible>,
    BL: OutputPin<Error = Infallible>,
{
    pub fn new(
        profile: &'static PanelProfile,
        transport: SpiTransport<SPI, CS, DC>,
        rst: RST,
        bl: BL,
        config: Config,
    ) -> Self {
        let (width, height) = rotated_size(profile, config.rotation);
        Self {
            transport,
            rst,
            bl,
            profile,
            config,
            rotation: config.rotation,
            width,
            height,
            initialized: false,
            transfer: TransferState::Idle,
        }
    }

    /// Bring the panel up: hardware reset, vendor init table, configured
    /// rotation, display on, backlight on.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        self.transport.release()?;
        self.hardware_reset(delay)?;

        for step in self.profile.init_sequence {
            self.transport.command(step.opcode, step.params)?;
            if step.delay_ms > 0 {
                delay.delay_ms(step.delay_ms);
            }
        }

        self.initialized = true;
        self.set_rotation(self.config.rotation)?;
        self.display_on(delay)?;
        self.set_backlight(true)?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "panel {=str} ready, {=u16}x{=u16}",
            self.profile.name,
            self.width,
            self.height
        );
        Ok(())
    }

    fn hardware_reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        self.rst.set_high().map_err(Error::Pin)?;
        delay.delay_ms(10);
        self.rst.set_low().map_err(Error::Pin)?;
        delay.delay_ms(10);
        self.rst.set_high().map_err(Error::Pin)?;
        delay.delay_ms(120);
        Ok(())
    }

    /// Reorient the panel. Effective width/height swap for the landscape
    /// rotations; repeated calls with the same rotation are idempotent.
    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Error<E>> {
        if !self.initialized {
            return Err(Error::NotReady);
        }
        let madctl = self.profile.madctl[rotation.index()] | self.profile.color_order;
        self.transport
            .command(self.profile.commands.memory_access, &[madctl])?;
        self.rotation = rotation;
        (self.width, self.height) = rotated_size(self.profile, rotation);
        Ok(())
    }

    /// Prime the region the next data stream will fill and switch the
    /// panel into memory-write mode. Coordinates are trusted to lie inside
    /// the current effective geometry; a data call must follow before any
    /// other command.
    pub fn set_address_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Error<E>> {
        let commands = &self.profile.commands;
        let (x0, x1) = (x0 + self.profile.offset_x, x1 + self.profile.offset_x);
        let (y0, y1) = (y0 + self.profile.offset_y, y1 + self.profile.offset_y);
        self.transport.command(
            commands.column_address,
            &[(x0 >> 8) as u8, x0 as u8, (x1 >> 8) as u8, x1 as u8],
        )?;
        self.transport.command(
            commands.row_address,
            &[(y0 >> 8) as u8, y0 as u8, (y1 >> 8) as u8, y1 as u8],
        )?;
        self.transport.command(commands.memory_write, &[])
    }

    /// Stream raw, already wire-ordered bytes in data mode. The caller
    /// must have primed the window immediately before.
    pub fn write_pixels(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.transport.data(bytes)
    }

    /// Single-pixel write: window set plus one two-byte stream. Correct but
    /// expensive; meant for sparse use.
    pub fn draw_pixel(&mut self, x: u16, y: u16, color: Rgb565) -> Result<(), Error<E>> {
        if x >= self.width || y >= self.height {
            return Ok(());
        }
        self.set_address_window(x, y, x, y)?;
        self.transport.data(&wire_bytes(color))
    }

    /// Fill a rectangle, clipped against the effective geometry. Runs
    /// longer than 32 pixels go out as pre-built batches to amortize the
    /// per-transfer overhead.
    pub fn fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, color: Rgb565) -> Result<(), Error<E>> {
        if x >= self.width || y >= self.height {
            return Ok(());
        }
        let w = w.min(self.width - x);
        let h = h.min(self.height - y);
        if w == 0 || h == 0 {
            return Ok(());
        }

        self.set_address_window(x, y, x + w - 1, y + h - 1)?;

        let bytes = wire_bytes(color);
        let mut pixels = u32::from(w) * u32::from(h);

        if pixels > FILL_BATCH_PIXELS as u32 {
            let mut batch = [0u8; FILL_BATCH_PIXELS * 2];
            for pixel in batch.chunks_exact_mut(2) {
                pixel.copy_from_slice(&bytes);
            }
            while pixels >= FILL_BATCH_PIXELS as u32 {
                self.transport.data(&batch)?;
                pixels -= FILL_BATCH_PIXELS as u32;
            }
        }
        for _ in 0..pixels {
            self.transport.data(&bytes)?;
        }
        Ok(())
    }

    pub fn fill_screen(&mut self, color: Rgb565) -> Result<(), Error<E>> {
        self.fill_rect(0, 0, self.width, self.height, color)
    }

    pub fn display_on(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        self.transport
            .command(self.profile.commands.display_on, &[])?;
        delay.delay_ms(self.profile.display_on_delay_ms);
        Ok(())
    }

    pub fn display_off(&mut self) -> Result<(), Error<E>> {
        self.transport.command(self.profile.commands.display_off, &[])
    }

    /// Backlight enable line; active high.
    pub fn set_backlight(&mut self, on: bool) -> Result<(), Error<E>> {
        if on {
            self.bl.set_high().map_err(Error::Pin)
        } else {
            self.bl.set_low().map_err(Error::Pin)
        }
    }

    /// Blocking full-frame presentation: full-screen window, then the
    /// whole buffer in one data stream.
    pub fn send_framebuffer(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        if self.transfer.in_flight() {
            return Err(Error::Busy);
        }
        let required = self.frame_len();
        if bytes.len() != required {
            return Err(Error::BufferSize {
                required,
                provided: bytes.len(),
            });
        }
        self.set_address_window(0, 0, self.width - 1, self.height - 1)?;
        self.transport.data(bytes)
    }

    fn frame_len(&self) -> usize {
        usize::from(self.width) * usize::from(self.height) * 2
    }

    /// Effective width under the current rotation.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Effective height under the current rotation.
    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn transfer_state(&self) -> TransferState {
        self.transfer
    }

    pub fn profile(&self) -> &'static PanelProfile {
        self.profile
    }
}

impl<SPI, CS, DC, RST, BL, E> Panel<SPI, CS, DC, RST, BL>
where
    SPI: SpiBus<u8, Error = E> + DmaTransfer,
    CS: OutputPin<Error = Infallible>,
    DC: OutputPin<Error = Infallible>,
    RST: OutputPin<Error = Infallible>,
    BL: OutputPin<Error = Infallible>,
{
    /// Start a non-blocking full-frame presentation. Rejected with
    /// [`Error::Busy`], without side effects, while a previous transfer is
    /// unresolved; retry after [`is_transfer_complete`](Self::is_transfer_complete).
    ///
    /// `bytes` must stay untouched until completion is observed.
    pub fn send_framebuffer_dma(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        if self.transfer.in_flight() {
            return Err(Error::Busy);
        }
        let required = self.frame_len();
        if bytes.len() != required {
            return Err(Error::BufferSize {
                required,
                provided: bytes.len(),
            });
        }
        self.set_address_window(0, 0, self.width - 1, self.height - 1)?;
        self.transport.begin_dma(bytes)?;
        self.transfer = TransferState::InFlight;
        Ok(())
    }

    /// Completion query. `true` means no transfer is unresolved; once a
    /// transfer has been observed complete the call stays `true` until the
    /// next start. On completion the bus selection is released.
    pub fn is_transfer_complete(&mut self) -> Result<bool, Error<E>> {
        if !self.transfer.in_flight() {
            return Ok(true);
        }
        match self.transport.dma_done() {
            Ok(true) => {
                self.transfer = TransferState::Complete;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                // The transport already closed the bracket.
                self.transfer = TransferState::Complete;
                Err(e)
            }
        }
    }

    /// Bounded wait for the in-flight transfer, polling once per
    /// millisecond. A completion flag stuck past the configured budget
    /// releases the bus selection and reports
    /// [`Error::TransferTimeout`] instead of hanging the loop.
    pub fn wait_transfer(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        if !self.transfer.in_flight() {
            return Ok(());
        }
        for _ in 0..self.config.dma_timeout_ms {
            if self.is_transfer_complete()? {
                return Ok(());
            }
            delay.delay_ms(1);
        }
        self.transport.release()?;
        self.transfer = TransferState::TimedOut;
        Err(Error::TransferTimeout)
    }
}
