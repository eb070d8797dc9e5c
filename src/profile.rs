//! Panel family profiles.
//!
//! A [`PanelProfile`] carries everything controller-specific — native
//! geometry, command opcodes, the vendor init table and the orientation
//! mapping — so one driver serves the whole family. Init tables and
//! orientation bytes come from the panel datasheets; treat them as binary
//! contracts, not values to re-derive.

/// One step of a vendor init table: a command opcode, its parameter bytes
/// and a settle delay issued after the command completes (0 for none).
#[derive(Debug, Clone, Copy)]
pub struct InitCommand {
    pub opcode: u8,
    pub params: &'static [u8],
    pub delay_ms: u32,
}

/// Opcodes the driver issues outside the init table. The shipped profiles
/// all follow the MIPI DCS assignments, but the values stay profile data.
#[derive(Debug, Clone, Copy)]
pub struct CommandSet {
    /// Column address set (start/end of the window's x range).
    pub column_address: u8,
    /// Row address set (start/end of the window's y range).
    pub row_address: u8,
    /// Begin memory write; the panel consumes data until the next command.
    pub memory_write: u8,
    /// Memory access control (orientation byte).
    pub memory_access: u8,
    pub display_on: u8,
    pub display_off: u8,
}

impl CommandSet {
    /// Standard MIPI DCS assignment shared by the ST77xx family.
    pub const DCS: Self = Self {
        column_address: 0x2A,
        row_address: 0x2B,
        memory_write: 0x2C,
        memory_access: 0x36,
        display_on: 0x29,
        display_off: 0x28,
    };
}

/// Memory access control bits, names per the ST77xx datasheets.
pub const MADCTL_MY: u8 = 0x80; // row address order
pub const MADCTL_MX: u8 = 0x40; // column address order
pub const MADCTL_MV: u8 = 0x20; // row/column exchange
pub const MADCTL_BGR: u8 = 0x08; // BGR subpixel order

/// Capability set for one panel family, selected once at construction.
#[derive(Debug)]
pub struct PanelProfile {
    pub name: &'static str,
    /// Native portrait width in pixels.
    pub width: u16,
    /// Native portrait height in pixels.
    pub height: u16,
    /// Fixed offset of the visible area inside controller memory.
    pub offset_x: u16,
    pub offset_y: u16,
    pub commands: CommandSet,
    pub init_sequence: &'static [InitCommand],
    /// Orientation byte per rotation, indexed by [`crate::Rotation`],
    /// without the color-order bit.
    pub madctl: [u8; 4],
    /// Color-order bit ORed into every orientation byte.
    pub color_order: u8,
    /// Settle delay after display-on.
    pub display_on_delay_ms: u32,
}

/// ST7796S, 320x480 IPS. Full pipeline profile.
pub const ST7796S: PanelProfile = PanelProfile {
    name: "ST7796S",
    width: 320,
    height: 480,
    offset_x: 0,
    offset_y: 0,
    commands: CommandSet::DCS,
    init_sequence: &[
        // Sleep out
        InitCommand { opcode: 0x11, params: &[], delay_ms: 120 },
        // Command set control: unlock extension command 2 part I/II
        InitCommand { opcode: 0xF0, params: &[0xC3], delay_ms: 0 },
        InitCommand { opcode: 0xF0, params: &[0x96], delay_ms: 0 },
        // Memory access control
        InitCommand { opcode: 0x36, params: &[MADCTL_BGR], delay_ms: 0 },
        // Pixel format: 16-bit RGB565
        InitCommand { opcode: 0x3A, params: &[0x55], delay_ms: 0 },
        // Interface mode control
        InitCommand { opcode: 0xB0, params: &[0x80], delay_ms: 0 },
        // Display function control
        InitCommand { opcode: 0xB6, params: &[0x00, 0x02], delay_ms: 0 },
        // Display output ctrl adjust
        InitCommand {
            opcode: 0xE8,
            params: &[0x40, 0x8A, 0x00, 0x00, 0x29, 0x19, 0xA5, 0x33],
            delay_ms: 0,
        },
        // Power control 2 and 3
        InitCommand { opcode: 0xC1, params: &[0x06], delay_ms: 0 },
        InitCommand { opcode: 0xC2, params: &[0xA7], delay_ms: 0 },
        // VCOM control
        InitCommand { opcode: 0xC5, params: &[0x18], delay_ms: 120 },
        // Positive gamma control
        InitCommand {
            opcode: 0xE0,
            params: &[
                0xF0, 0x09, 0x0B, 0x06, 0x04, 0x15, 0x2F, 0x54, 0x42, 0x3C, 0x17, 0x14, 0x18,
                0x1B,
            ],
            delay_ms: 0,
        },
        // Negative gamma control
        InitCommand {
            opcode: 0xE1,
            params: &[
                0xE0, 0x09, 0x0B, 0x06, 0x04, 0x03, 0x2B, 0x43, 0x42, 0x3B, 0x16, 0x14, 0x17,
                0x1B,
            ],
            delay_ms: 120,
        },
        // Command set control: lock extension command 2 part I/II
        InitCommand { opcode: 0xF0, params: &[0x3C], delay_ms: 0 },
        InitCommand { opcode: 0xF0, params: &[0x69], delay_ms: 120 },
        // Tearing effect line on
        InitCommand { opcode: 0x35, params: &[0x00], delay_ms: 0 },
        // Normal display mode on
        InitCommand { opcode: 0x13, params: &[], delay_ms: 10 },
    ],
    madctl: [MADCTL_MX, MADCTL_MV, MADCTL_MY, MADCTL_MV | MADCTL_MX | MADCTL_MY],
    color_order: MADCTL_BGR,
    display_on_delay_ms: 120,
};

/// ST7735S, 128x160. Minimal bring-up profile: vendor table reduced to the
/// commands needed to get pixels on glass.
pub const ST7735S: PanelProfile = PanelProfile {
    name: "ST7735S",
    width: 128,
    height: 160,
    offset_x: 0,
    offset_y: 0,
    commands: CommandSet::DCS,
    init_sequence: &[
        // Software reset
        InitCommand { opcode: 0x01, params: &[], delay_ms: 150 },
        // Sleep out
        InitCommand { opcode: 0x11, params: &[], delay_ms: 120 },
        // Pixel format: 16-bit RGB565
        InitCommand { opcode: 0x3A, params: &[0x05], delay_ms: 10 },
        // Normal display mode on
        InitCommand { opcode: 0x13, params: &[], delay_ms: 10 },
    ],
    madctl: [0x00, MADCTL_MX | MADCTL_MV, MADCTL_MX | MADCTL_MY, MADCTL_MY | MADCTL_MV],
    color_order: 0x00,
    display_on_delay_ms: 100,
};
