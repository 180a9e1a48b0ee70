// 1.0: all the primitives live here. nothing in the engine works without these types.
// account ids, fixed-point amounts, prices, ratios, timestamps. each is a newtype so the
// compiler catches a price passed where an amount belongs.

use alloy_primitives::Address;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 10^18. every amount and price is an integer scaled by this.
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// LTV thresholds are whole percentages.
pub const PERCENT_DENOMINATOR: u8 = 100;

const WAD_DIGITS: usize = 18;

// opaque 20-byte account identifier. protocol custody accounts use the reserved
// low range, see `AccountId::protocol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Address);

impl AccountId {
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    // reserved ids: 0x00..00NN
    pub const fn protocol(tag: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = tag;
        Self(Address::new(bytes))
    }

    /// Deterministic user id for tests and simulations.
    pub const fn from_seed(seed: u8) -> Self {
        Self(Address::new([seed; 20]))
    }

    pub fn address(&self) -> Address {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.1: token amount, 18 fractional digits. never negative by construction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole tokens, e.g. `from_units(100)` is 100.0 tokens.
    pub fn from_units(units: u128) -> Option<Self> {
        units.checked_mul(WAD).map(Self)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(&self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_sub(&self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Display-path conversion. saturates at `Decimal::MAX` rather than failing.
    pub fn to_decimal(&self) -> Decimal {
        wad_to_decimal(self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_wad(f, self.0)
    }
}

// 1.2: stablecoin per one gold-token, 18 fractional digits. must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(u128);

impl Price {
    #[must_use]
    pub fn new(raw: u128) -> Option<Self> {
        if raw > 0 {
            Some(Self(raw))
        } else {
            None
        }
    }

    #[must_use]
    pub fn from_units(units: u128) -> Option<Self> {
        units.checked_mul(WAD).and_then(Self::new)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn to_decimal(&self) -> Decimal {
        wad_to_decimal(self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_wad(f, self.0)
    }
}

// 1.3: basis points. 100 bps = 1%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bps(u32);

impl Bps {
    pub const ZERO: Bps = Bps(0);

    pub const fn new(bps: u32) -> Self {
        Self(bps)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }

    // 30 bps -> 9970, the share the user keeps
    pub fn complement(&self) -> u32 {
        BPS_DENOMINATOR.saturating_sub(self.0)
    }

    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }
}

impl fmt::Display for Bps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

// 1.4: whole percentage, 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Percent(u8);

impl Percent {
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        if value <= PERCENT_DENOMINATOR {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Clamps anything above 100 down to 100.
    pub const fn saturating(value: u8) -> Self {
        if value > PERCENT_DENOMINATOR {
            Self(PERCENT_DENOMINATOR)
        } else {
            Self(value)
        }
    }

    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// 1.5: millisecond timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn elapsed_millis(&self, later: &Timestamp) -> i64 {
        (later.0 - self.0).max(0)
    }
}

// 1.6: the two assets the engine moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// IDRX, the stablecoin.
    Stable,
    /// EMASX, one token per gram of gold.
    Gold,
}

impl Asset {
    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Stable => "IDRX",
            Asset::Gold => "EMASX",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    StableToGold,
    GoldToStable,
}

impl SwapDirection {
    pub fn input(&self) -> Asset {
        match self {
            SwapDirection::StableToGold => Asset::Stable,
            SwapDirection::GoldToStable => Asset::Gold,
        }
    }

    pub fn output(&self) -> Asset {
        match self {
            SwapDirection::StableToGold => Asset::Gold,
            SwapDirection::GoldToStable => Asset::Stable,
        }
    }

    pub fn reverse(&self) -> Self {
        match self {
            SwapDirection::StableToGold => SwapDirection::GoldToStable,
            SwapDirection::GoldToStable => SwapDirection::StableToGold,
        }
    }
}

fn wad_to_decimal(raw: u128) -> Decimal {
    let whole = raw / WAD;
    let frac = raw % WAD;
    match Decimal::from_u128(whole) {
        // frac < 10^18 always fits the 96-bit mantissa
        Some(w) => w + Decimal::from_i128_with_scale(frac as i128, WAD_DIGITS as u32),
        None => Decimal::MAX,
    }
}

fn write_wad(f: &mut fmt::Formatter<'_>, raw: u128) -> fmt::Result {
    let whole = raw / WAD;
    let frac = raw % WAD;
    if frac == 0 {
        return write!(f, "{whole}");
    }
    let digits = format!("{frac:0width$}", width = WAD_DIGITS);
    write!(f, "{whole}.{}", digits.trim_end_matches('0'))
}
