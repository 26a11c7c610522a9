//! Scaled physical quantities
//!
//! Most exposure-related bytes encode a value on a logarithmic scale:
//! `value = scale * 2^((x + offset) / steps)` with `steps` codes per stop.
//! Each quantity keeps its raw byte so that decode followed by encode is
//! exact, and offers `value()` / `from_value()` for the physical reading.
//!
//! `core` has no `powf`, so powers of two are built from the exponent bits
//! of an `f32` and a table of 24th-root-of-two fractions.

/// 2^(r/24) for r in 0..24
const FRACTIONAL_POW2: [f32; 24] = [
    1.000000000,
    1.029302237,
    1.059463094,
    1.090507733,
    1.122462048,
    1.155352697,
    1.189207115,
    1.224053543,
    1.259921050,
    1.296839555,
    1.334839854,
    1.373953647,
    1.414213562,
    1.455653183,
    1.498307077,
    1.542210825,
    1.587401052,
    1.633915453,
    1.681792831,
    1.731073122,
    1.781797436,
    1.834008086,
    1.887748625,
    1.943063882,
];

/// 2^(55.4/24), the fractional offset of the focal length scale
const FOCAL_LENGTH_BASE_MM: f32 = 4.953_105_4;

/// 2^n for integer n within the normal f32 range
fn pow2i(n: i32) -> f32 {
    let n = n.clamp(-126, 127);
    f32::from_bits(((n + 127) as u32) << 23)
}

/// 2^(numerator / steps), `steps` one of 6, 12 or 24
fn pow2_ratio(numerator: i32, steps: i32) -> f32 {
    debug_assert!(24 % steps == 0);
    let whole = numerator.div_euclid(steps);
    let rest = numerator.rem_euclid(steps);
    pow2i(whole) * FRACTIONAL_POW2[(rest * (24 / steps)) as usize]
}

/// Raw code whose decoded value is nearest to `value` on a log scale
///
/// `decode` must be strictly monotonic over 0..=255. The boundary between
/// neighbouring codes is their geometric mean, compared squared to stay
/// clear of square roots. Values outside the range clamp to 0 or 255, and
/// so do zero, negative and NaN inputs (to the smallest decoded value).
fn nearest_code(value: f32, decode: impl Fn(u8) -> f32) -> u8 {
    let increasing = decode(1) > decode(0);
    if value.is_nan() || value <= 0.0 {
        return if increasing { 0 } else { u8::MAX };
    }
    let mut code = 0u8;
    while code < u8::MAX {
        let boundary_sq = decode(code) * decode(code + 1);
        let past = if increasing {
            value * value > boundary_sq
        } else {
            value * value < boundary_sq
        };
        if !past {
            break;
        }
        code += 1;
    }
    code
}

macro_rules! raw_quantity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name(pub u8);

        impl $name {
            /// Raw wire byte
            pub fn raw(self) -> u8 {
                self.0
            }
        }

        impl From<u8> for $name {
            fn from(raw: u8) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.0
            }
        }
    };
}

raw_quantity!(
    /// Flash output as a fraction of full power: `2^(-x/6)`
    FlashPower
);

impl FlashPower {
    pub const FULL: FlashPower = FlashPower(0);

    /// Fraction of full power, 1.0 = full
    pub fn fraction(self) -> f32 {
        pow2_ratio(-(self.0 as i32), 6)
    }

    /// Output relative to full power in EV (always <= 0)
    pub fn ev(self) -> f32 {
        -(self.0 as f32) / 6.0
    }

    pub fn from_fraction(fraction: f32) -> Self {
        Self(nearest_code(fraction, |x| Self(x).fraction()))
    }
}

raw_quantity!(
    /// Sensitivity: `ISO = 100 * 2^((x-30)/6)`
    Iso
);

impl Iso {
    pub fn value(self) -> f32 {
        100.0 * pow2_ratio(self.0 as i32 - 30, 6)
    }

    pub fn from_value(iso: f32) -> Self {
        Self(nearest_code(iso, |x| Self(x).value()))
    }
}

raw_quantity!(
    /// Shutter time: `t = 2^(-x/6)` seconds, raw 128 means bulb
    ExposureTime
);

impl ExposureTime {
    /// Raw value reserved for bulb mode
    pub const BULB_RAW: u8 = 128;
    pub const BULB: ExposureTime = ExposureTime(Self::BULB_RAW);

    pub fn is_bulb(self) -> bool {
        self.0 == Self::BULB_RAW
    }

    /// Shutter time in seconds, `None` in bulb mode
    pub fn seconds(self) -> Option<f32> {
        if self.is_bulb() {
            None
        } else {
            Some(Self::formula(self.0))
        }
    }

    fn formula(x: u8) -> f32 {
        pow2_ratio(-(x as i32), 6)
    }

    /// Nearest timed code; never yields the bulb code
    pub fn from_seconds(seconds: f32) -> Self {
        let code = nearest_code(seconds, Self::formula);
        if code != Self::BULB_RAW {
            return Self(code);
        }
        // Snap to the closer timed neighbour
        let shorter = Self::formula(Self::BULB_RAW + 1);
        let longer = Self::formula(Self::BULB_RAW - 1);
        if seconds * seconds < shorter * longer {
            Self(Self::BULB_RAW + 1)
        } else {
            Self(Self::BULB_RAW - 1)
        }
    }
}

raw_quantity!(
    /// Aperture: `f = 2^(x/12)`
    FStop
);

impl FStop {
    pub fn value(self) -> f32 {
        pow2_ratio(self.0 as i32, 12)
    }

    pub fn from_value(f_number: f32) -> Self {
        Self(nearest_code(f_number, |x| Self(x).value()))
    }
}

raw_quantity!(
    /// Lens focal length: `f = 2^((x+55.4)/24)` mm
    FocalLength
);

impl FocalLength {
    pub fn millimetres(self) -> f32 {
        FOCAL_LENGTH_BASE_MM * pow2_ratio(self.0 as i32, 24)
    }

    pub fn from_millimetres(mm: f32) -> Self {
        Self(nearest_code(mm, |x| Self(x).millimetres()))
    }
}

raw_quantity!(
    /// Focus distance: `d = 2^((x-80)/6)` m
    FocusDistance
);

impl FocusDistance {
    pub fn metres(self) -> f32 {
        pow2_ratio(self.0 as i32 - 80, 6)
    }

    pub fn from_metres(metres: f32) -> Self {
        Self(nearest_code(metres, |x| Self(x).metres()))
    }
}

raw_quantity!(
    /// Flash exposure compensation: `EV = -x/6`, x a signed byte
    FlashCompensation
);

impl FlashCompensation {
    pub fn ev(self) -> f32 {
        -(self.0 as i8 as f32) / 6.0
    }

    /// Nearest code, saturating at the signed byte range
    pub fn from_ev(ev: f32) -> Self {
        let steps = -ev * 6.0;
        // Round half away from zero without `f32::round`
        let rounded = if steps >= 0.0 { steps + 0.5 } else { steps - 0.5 };
        let clamped = rounded.clamp(i8::MIN as f32, i8::MAX as f32) as i8;
        Self(clamped as u8)
    }
}
