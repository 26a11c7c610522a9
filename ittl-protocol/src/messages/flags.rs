//! Bit-packed flag bytes
//!
//! Each flag byte unpacks into a struct of eight named booleans, bit 0
//! first. Bits documented as constant are still carried as fields so that
//! `to_byte(from_byte(b)) == b` for every byte; their documented values are
//! exposed as `CONSTANT_MASK` / `CONSTANT_VALUE` for anomaly checks.

macro_rules! flag_byte {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$fmeta:meta])* $bit:literal => $field:ident,)*
        }
        constant: mask = $mask:literal, value = $value:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name {
            $($(#[$fmeta])* pub $field: bool,)*
        }

        impl $name {
            /// Bits documented as constant
            pub const CONSTANT_MASK: u8 = $mask;
            /// Documented value of the constant bits
            pub const CONSTANT_VALUE: u8 = $value;

            pub fn from_byte(byte: u8) -> Self {
                Self {
                    $($field: byte & (1 << $bit) != 0,)*
                }
            }

            pub fn to_byte(self) -> u8 {
                let mut byte = 0u8;
                $(if self.$field {
                    byte |= 1 << $bit;
                })*
                byte
            }

            /// Whether the constant bits hold their documented values
            pub fn constants_hold(self) -> bool {
                self.to_byte() & Self::CONSTANT_MASK == Self::CONSTANT_VALUE
            }

            /// A value with every constant bit at its documented level
            pub fn documented() -> Self {
                Self::from_byte(Self::CONSTANT_VALUE)
            }
        }
    };
}

flag_byte! {
    /// Flash status byte of Flash_Setting
    FlashStatus {
        /// Ready light on
        0 => ready_light,
        /// Display illumination on
        1 => display,
        /// Reflector tilted or not facing forward
        2 => reflector_tilted,
        /// Ready light flashing
        3 => ready_flashing,
        /// Wide-angle diffuser pulled out
        4 => diffuser,
        /// Soft box attached
        5 => soft_box,
        /// Always 0
        6 => reserved_6,
        /// Always 0
        7 => reserved_7,
    }
    constant: mask = 0xC0, value = 0x00
}

flag_byte! {
    /// Flash activity byte of Flash_Setting
    FlashActivity {
        /// Set for 1s after a button press, 5s after insufficient power
        0 => button,
        /// Always 0
        1 => reserved_1,
        /// Always 1
        2 => reserved_2,
        /// Flash in mode A
        3 => mode_a_0,
        /// AF assist light on
        4 => af_assist,
        /// Always 0
        5 => reserved_5,
        /// Flash in mode A
        6 => mode_a_1,
        /// Always 0
        7 => reserved_7,
    }
    constant: mask = 0xA6, value = 0x04
}

flag_byte! {
    /// Camera configuration byte of Cam_Setting
    CameraConfig {
        /// Sync on second curtain
        0 => rear_curtain_sync,
        /// Red-eye reduction enabled
        1 => red_eye,
        /// Camera display on
        2 => display,
        /// Always 0
        3 => reserved_3,
        /// FP (high-speed sync) required
        4 => fp_required,
        /// FP available
        5 => fp_available,
        /// TTL available
        6 => ttl_available,
        /// Always 0
        7 => reserved_7,
    }
    constant: mask = 0x88, value = 0x00
}
