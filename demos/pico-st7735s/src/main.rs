//! Draw/swap/present loop on a 160x128 ST7735S panel wired to a Raspberry
//! Pi Pico over SPI0.
//!
//! Wiring:
//! - GPIO18 SCK, GPIO19 MOSI (SPI0)
//! - GPIO20 CS, GPIO22 D/C, GPIO26 RESET, GPIO17 backlight

#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use panic_probe as _;

use embedded_graphics_core::pixelcolor::{Rgb565, RgbColor};
use hal::clocks::init_clocks_and_plls;
use hal::fugit::RateExtU32;
use hal::{Sio, Watchdog, pac};
use rp2040_hal as hal;
use static_cell::StaticCell;

use st77xx_framebuffer::{Config, FrameBuffer, Panel, Rotation, SpiTransport, profile};

#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

const XTAL_FREQ_HZ: u32 = 12_000_000;

const WIDTH: u16 = 160;
const HEIGHT: u16 = 128;
const FRAME_BYTES: usize = WIDTH as usize * HEIGHT as usize * 2;

static FRONT: StaticCell<[u8; FRAME_BYTES]> = StaticCell::new();
static BACK: StaticCell<[u8; FRAME_BYTES]> = StaticCell::new();

#[hal::entry]
fn main() -> ! {
    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let sio = Sio::new(pac.SIO);

    let clocks = init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    let mut timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let sclk = pins.gpio18.into_function::<hal::gpio::FunctionSpi>();
    let mosi = pins.gpio19.into_function::<hal::gpio::FunctionSpi>();
    let spi = hal::spi::Spi::<_, _, _, 8>::new(pac.SPI0, (mosi, sclk)).init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        62_500_000u32.Hz(),
        embedded_hal::spi::MODE_0,
    );

    let cs = pins.gpio20.into_push_pull_output();
    let dc = pins.gpio22.into_push_pull_output();
    let rst = pins.gpio26.into_push_pull_output();
    let bl = pins.gpio17.into_push_pull_output();

    let transport = SpiTransport::new(spi, cs, dc);
    let mut panel = Panel::new(
        &profile::ST7735S,
        transport,
        rst,
        bl,
        Config {
            rotation: Rotation::Deg90,
            ..Config::default()
        },
    );
    panel.init(&mut timer).unwrap();
    info!("panel up: {}x{}", panel.width(), panel.height());

    let front = FRONT.init([0; FRAME_BYTES]);
    let back = BACK.init([0; FRAME_BYTES]);
    let mut fb = FrameBuffer::new(panel.width(), panel.height(), front, back).unwrap();
    fb.init(&mut panel).unwrap();

    let colors = [
        Rgb565::RED,
        Rgb565::GREEN,
        Rgb565::BLUE,
        Rgb565::WHITE,
        Rgb565::BLACK,
    ];

    let mut frame: u16 = 0;
    loop {
        let color = colors[(frame / 64) as usize % colors.len()];
        fb.fill(color);
        // Scanning line, so a stuck frame is obvious at a glance.
        fb.draw_hline(0, frame % HEIGHT, WIDTH, Rgb565::YELLOW);
        fb.swap().unwrap();
        fb.present(&mut panel).unwrap();
        frame = frame.wrapping_add(1);
    }
}
