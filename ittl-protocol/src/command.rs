//! Command codes and the payload length catalog
//!
//! The wire format carries no length field: the receiver must know from
//! the command byte alone how many payload bytes follow. This module is
//! that lookup.

/// Bus endpoint that sends a given command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endpoint {
    Camera,
    Flash,
}

impl Endpoint {
    /// The endpoint on the other side of the hotshoe
    pub fn peer(self) -> Self {
        match self {
            Endpoint::Camera => Endpoint::Flash,
            Endpoint::Flash => Endpoint::Camera,
        }
    }
}

// Command codes
pub const CMD_FLASH_SETTING: u8 = 0xA0;
pub const CMD_INIT_0: u8 = 0xA1;
pub const CMD_INIT_2: u8 = 0xA2;
pub const CMD_CAM_SETTING: u8 = 0xB0;
pub const CMD_INIT_1: u8 = 0xB1;
pub const CMD_POSTFLASH: u8 = 0xC0;
pub const CMD_AF_ILLUMINATION: u8 = 0xD0;
pub const CMD_RED_EYE_REDUCTION: u8 = 0xD1;
pub const CMD_MODELLING_LIGHT: u8 = 0xD5;
pub const CMD_PREFLASH_1: u8 = 0xD7;
pub const CMD_PREFLASH_2: u8 = 0xD8;

/// Largest payload of any catalogued command (Init_2)
pub const MAX_PAYLOAD_SIZE: usize = 45;

/// Commands known to the catalog
///
/// Postflash_1 and Postflash_2 share code 0xC0 and are one entry here; the
/// frame parser tells them apart by sequence position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// First frame after power-on or flash detection
    Init0,
    /// Second init frame
    Init1,
    /// Third init frame
    Init2,
    /// Flash status and settings
    FlashSetting,
    /// Camera exposure settings
    CamSetting,
    /// Sent by the flash after firing (two variants, see [`PayloadLength::Sequence`])
    Postflash,
    /// AF assist light control
    AfIllumination,
    /// Red-eye reduction control
    RedEyeReduction,
    /// Modelling light trigger
    ModellingLight,
    /// Metering preflash
    Preflash1,
    /// Second preflash when the first was too weak
    Preflash2,
}

/// Payload length of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadLength {
    /// Always this many bytes
    Fixed(u8),
    /// Depends on the frame's position in a run of same-code frames
    Sequence { first: u8, second: u8 },
}

/// Position of a frame within a run of frames sharing one code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencePosition {
    #[default]
    First,
    Second,
}

impl PayloadLength {
    /// Resolve to a byte count for the given sequence position
    pub fn resolve(self, position: SequencePosition) -> usize {
        match (self, position) {
            (PayloadLength::Fixed(n), _) => n as usize,
            (PayloadLength::Sequence { first, .. }, SequencePosition::First) => first as usize,
            (PayloadLength::Sequence { second, .. }, SequencePosition::Second) => second as usize,
        }
    }

    /// Whether a payload of `len` bytes is valid for this entry
    pub fn accepts(self, len: usize) -> bool {
        match self {
            PayloadLength::Fixed(n) => len == n as usize,
            PayloadLength::Sequence { first, second } => {
                len == first as usize || len == second as usize
            }
        }
    }

    /// Whether the length cannot be known from the code alone
    pub fn is_ambiguous(self) -> bool {
        matches!(self, PayloadLength::Sequence { .. })
    }
}

/// One catalog row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub command: Command,
    pub code: u8,
    pub length: PayloadLength,
    pub sender: Endpoint,
}

/// Number of catalog entries
pub const COMMAND_COUNT: usize = 11;

/// The command catalog, read-only
pub static CATALOG: [CatalogEntry; COMMAND_COUNT] = [
    entry(Command::Init0, CMD_INIT_0, PayloadLength::Fixed(17), Endpoint::Flash),
    entry(Command::Init1, CMD_INIT_1, PayloadLength::Fixed(9), Endpoint::Camera),
    entry(Command::Init2, CMD_INIT_2, PayloadLength::Fixed(45), Endpoint::Flash),
    entry(Command::FlashSetting, CMD_FLASH_SETTING, PayloadLength::Fixed(17), Endpoint::Flash),
    entry(Command::CamSetting, CMD_CAM_SETTING, PayloadLength::Fixed(14), Endpoint::Camera),
    entry(
        Command::Postflash,
        CMD_POSTFLASH,
        PayloadLength::Sequence { first: 1, second: 2 },
        Endpoint::Flash,
    ),
    entry(Command::AfIllumination, CMD_AF_ILLUMINATION, PayloadLength::Fixed(2), Endpoint::Camera),
    entry(Command::RedEyeReduction, CMD_RED_EYE_REDUCTION, PayloadLength::Fixed(1), Endpoint::Camera),
    entry(Command::ModellingLight, CMD_MODELLING_LIGHT, PayloadLength::Fixed(1), Endpoint::Camera),
    entry(Command::Preflash1, CMD_PREFLASH_1, PayloadLength::Fixed(1), Endpoint::Camera),
    entry(Command::Preflash2, CMD_PREFLASH_2, PayloadLength::Fixed(1), Endpoint::Camera),
];

const fn entry(command: Command, code: u8, length: PayloadLength, sender: Endpoint) -> CatalogEntry {
    CatalogEntry {
        command,
        code,
        length,
        sender,
    }
}

impl Command {
    /// Look up a command by its wire code
    pub fn from_byte(code: u8) -> Option<Self> {
        CATALOG.iter().find(|e| e.code == code).map(|e| e.command)
    }

    fn entry(self) -> &'static CatalogEntry {
        // Every variant has exactly one row, in declaration order
        &CATALOG[self as usize]
    }

    /// Wire code of this command
    pub fn code(self) -> u8 {
        self.entry().code
    }

    /// Payload length of this command
    pub fn payload_length(self) -> PayloadLength {
        self.entry().length
    }

    /// Which endpoint sends this command
    pub fn sender(self) -> Endpoint {
        self.entry().sender
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command.code()
    }
}
