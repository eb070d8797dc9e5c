//! Double-buffered RGB565 framebuffer.
//!
//! Pixels are stored pre-converted to wire byte order (most significant
//! byte first), so presenting is a straight byte copy with no per-pixel
//! transform at send time. Draw calls mutate the back buffer; a swap
//! exchanges the front/back roles in O(1); presenting streams the front
//! buffer through the panel driver.

use core::convert::Infallible;

use embedded_graphics_core::pixelcolor::Rgb565;
use embedded_graphics_core::prelude::RgbColor;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::panel::Panel;
use crate::transport::DmaTransfer;
use crate::{Error, wire_bytes};

/// Color both buffers start from.
const CLEAR_COLOR: Rgb565 = Rgb565::BLACK;

/// Two caller-provided pixel buffers and the role tag telling which one is
/// being drawn into. Buffers live for the whole run; nothing here
/// allocates.
pub struct FrameBuffer<'b> {
    buffers: [&'b mut [u8]; 2],
    back: usize,
    width: u16,
    height: u16,
    presenting: bool,
}

impl<'b> FrameBuffer<'b> {
    /// Wrap two buffers sized for the panel's effective geometry. Each
    /// must hold exactly `width * height * 2` bytes.
    pub fn new(
        width: u16,
        height: u16,
        front: &'b mut [u8],
        back: &'b mut [u8],
    ) -> Result<Self, Error> {
        let required = usize::from(width) * usize::from(height) * 2;
        if front.len() != required {
            return Err(Error::BufferSize {
                required,
                provided: front.len(),
            });
        }
        if back.len() != required {
            return Err(Error::BufferSize {
                required,
                provided: back.len(),
            });
        }
        Ok(Self {
            buffers: [front, back],
            back: 1,
            width,
            height,
            presenting: false,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// The buffer last handed to the panel (or about to be).
    pub fn front(&self) -> &[u8] {
        &self.buffers[self.back ^ 1][..]
    }

    /// Overwrite every back-buffer pixel with `color`.
    pub fn fill(&mut self, color: Rgb565) {
        let bytes = wire_bytes(color);
        for pixel in self.buffers[self.back].chunks_exact_mut(2) {
            pixel.copy_from_slice(&bytes);
        }
    }

    /// Write one back-buffer pixel. Out-of-bounds writes are dropped, not
    /// reported.
    pub fn set_pixel(&mut self, x: u16, y: u16, color: Rgb565) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (usize::from(y) * usize::from(self.width) + usize::from(x)) * 2;
        self.buffers[self.back][idx..idx + 2].copy_from_slice(&wire_bytes(color));
    }

    /// Horizontal span starting at (x, y), clamped to the row.
    pub fn draw_hline(&mut self, x: u16, y: u16, len: u16, color: Rgb565) {
        if x >= self.width || y >= self.height {
            return;
        }
        let len = usize::from(len.min(self.width - x));
        let bytes = wire_bytes(color);
        let start = (usize::from(y) * usize::from(self.width) + usize::from(x)) * 2;
        for pixel in self.buffers[self.back][start..start + len * 2].chunks_exact_mut(2) {
            pixel.copy_from_slice(&bytes);
        }
    }

    /// Exchange the front/back role tags. O(1), never copies pixels.
    /// Refused while the front buffer is referenced by an unresolved
    /// transfer — the buffer handed to DMA only becomes drawable again
    /// once [`poll_presented`](Self::poll_presented) observes completion.
    pub fn swap(&mut self) -> Result<(), Error> {
        if self.presenting {
            return Err(Error::Busy);
        }
        self.back ^= 1;
        Ok(())
    }

    /// Clear both buffers to the default color and present once,
    /// establishing a known on-panel state.
    pub fn init<SPI, CS, DC, RST, BL, E>(
        &mut self,
        panel: &mut Panel<SPI, CS, DC, RST, BL>,
    ) -> Result<(), Error<E>>
    where
        SPI: SpiBus<u8, Error = E>,
        CS: OutputPin<Error = Infallible>,
        DC: OutputPin<Error = Infallible>,
        RST: OutputPin<Error = Infallible>,
        BL: OutputPin<Error = Infallible>,
    {
        let bytes = wire_bytes(CLEAR_COLOR);
        for buffer in &mut self.buffers {
            for pixel in buffer.chunks_exact_mut(2) {
                pixel.copy_from_slice(&bytes);
            }
        }
        self.presenting = false;
        panel.send_framebuffer(self.front())
    }

    /// Blocking presentation of the front buffer: full-screen window, then
    /// `width * height * 2` bytes straight from memory.
    pub fn present<SPI, CS, DC, RST, BL, E>(
        &mut self,
        panel: &mut Panel<SPI, CS, DC, RST, BL>,
    ) -> Result<(), Error<E>>
    where
        SPI: SpiBus<u8, Error = E>,
        CS: OutputPin<Error = Infallible>,
        DC: OutputPin<Error = Infallible>,
        RST: OutputPin<Error = Infallible>,
        BL: OutputPin<Error = Infallible>,
    {
        if self.presenting {
            return Err(Error::Busy);
        }
        panel.send_framebuffer(self.front())
    }

    /// Non-blocking presentation of the front buffer. Until completion is
    /// observed the front buffer belongs to the transfer: [`swap`](Self::swap)
    /// and further presentations are refused.
    pub fn present_dma<SPI, CS, DC, RST, BL, E>(
        &mut self,
        panel: &mut Panel<SPI, CS, DC, RST, BL>,
    ) -> Result<(), Error<E>>
    where
        SPI: SpiBus<u8, Error = E> + DmaTransfer,
        CS: OutputPin<Error = Infallible>,
        DC: OutputPin<Error = Infallible>,
        RST: OutputPin<Error = Infallible>,
        BL: OutputPin<Error = Infallible>,
    {
        if self.presenting {
            return Err(Error::Busy);
        }
        panel.send_framebuffer_dma(self.front())?;
        self.presenting = true;
        Ok(())
    }

    /// Completion query for [`present_dma`](Self::present_dma). Reports
    /// `true` once no presentation is unresolved and releases the front
    /// buffer for swapping.
    pub fn poll_presented<SPI, CS, DC, RST, BL, E>(
        &mut self,
        panel: &mut Panel<SPI, CS, DC, RST, BL>,
    ) -> Result<bool, Error<E>>
    where
        SPI: SpiBus<u8, Error = E> + DmaTransfer,
        CS: OutputPin<Error = Infallible>,
        DC: OutputPin<Error = Infallible>,
        RST: OutputPin<Error = Infallible>,
        BL: OutputPin<Error = Infallible>,
    {
        if !self.presenting {
            return Ok(true);
        }
        match panel.is_transfer_complete() {
            Ok(true) => {
                self.presenting = false;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                self.presenting = false;
                Err(e)
            }
        }
    }

    /// Bounded blocking wait for an outstanding [`present_dma`](Self::present_dma).
    /// Resolves the presentation either way: completed, or timed out with
    /// the bus released.
    pub fn wait_presented<SPI, CS, DC, RST, BL, E>(
        &mut self,
        panel: &mut Panel<SPI, CS, DC, RST, BL>,
        delay: &mut impl DelayNs,
    ) -> Result<(), Error<E>>
    where
        SPI: SpiBus<u8, Error = E> + DmaTransfer,
        CS: OutputPin<Error = Infallible>,
        DC: OutputPin<Error = Infallible>,
        RST: OutputPin<Error = Infallible>,
        BL: OutputPin<Error = Infallible>,
    {
        if !self.presenting {
            return Ok(());
        }
        let res = panel.wait_transfer(delay);
        self.presenting = false;
        res
    }
}
