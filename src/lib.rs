#![no_std]

//! Double-buffered display pipeline for ST77xx-family TFT panels.
//!
//! Three layers, leaves first: [`SpiTransport`] gates the shared SPI
//! channel with the chip-select and data/command lines, [`Panel`] encodes
//! a controller profile (reset, vendor init, rotation, windowed writes,
//! DMA presentation) on top of it, and [`FrameBuffer`] composites RGB565
//! pixels in memory and streams them through the panel. Profiles for the
//! ST7796S (full pipeline) and ST7735S (minimal bring-up) ship in
//! [`profile`].

#[cfg(test)]
extern crate std;

use core::convert::Infallible;

use embedded_graphics_core::pixelcolor::Rgb565;
use embedded_graphics_core::pixelcolor::raw::RawU16;
use embedded_graphics_core::prelude::RawData;

pub mod framebuffer;
pub mod panel;
pub mod profile;
pub mod transport;

#[cfg(test)]
pub(crate) mod testutil;

pub use framebuffer::FrameBuffer;
pub use panel::{Config, Panel, TransferState};
pub use profile::{CommandSet, InitCommand, PanelProfile, ST7735S, ST7796S};
pub use transport::{DmaTransfer, SpiTransport};

/// Panel orientation. The two landscape rotations swap the effective
/// width/height relative to the native portrait geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Index into a profile's orientation table.
    pub const fn index(self) -> usize {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    /// Whether effective width/height are swapped against the native
    /// portrait geometry.
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E = ()> {
    /// Communication error
    Comm(E),
    /// Pin setting error
    Pin(Infallible),
    /// Operation needs an initialized panel
    NotReady,
    /// A transfer is still unresolved; the request is rejected, not queued
    Busy,
    /// An in-flight transfer exceeded the configured wait budget
    TransferTimeout,
    /// A pixel buffer does not match the panel geometry
    BufferSize { required: usize, provided: usize },
}

/// Wire encoding of one pixel: RGB565, most significant byte first.
pub(crate) fn wire_bytes(color: Rgb565) -> [u8; 2] {
    RawU16::from(color).into_inner().to_be_bytes()
}
