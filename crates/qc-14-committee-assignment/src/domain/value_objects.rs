//! # Domain Value Objects
//!
//! Immutable value types for committee assignment: serialized BLS keys,
//! the fixed-point stake decimal, and validator status/counters.

use super::errors::{Address, ShardId};
use primitive_types::{U256, U512};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{hex::Hex, serde_as};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// BLS public key
// =============================================================================

/// BLS key parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BlsKeyError {
    /// Input is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Input has the wrong byte length.
    #[error("expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Supplied length
        got: usize,
    },

    /// Bytes do not decode to a valid BLS12-381 G1 point.
    #[error("invalid curve point: {0}")]
    InvalidPoint(String),
}

/// Serialized BLS12-381 public key (48-byte compressed G1 point).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlsPublicKey(#[serde_as(as = "Hex")] pub [u8; 48]);

impl BlsPublicKey {
    /// Serialized length in bytes.
    pub const LEN: usize = 48;

    /// Wrap raw bytes, checking only the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BlsKeyError> {
        let array: [u8; 48] = bytes.try_into().map_err(|_| BlsKeyError::InvalidLength {
            expected: Self::LEN,
            got: bytes.len(),
        })?;
        Ok(Self(array))
    }

    /// Parse a hex string (optional `0x` prefix) and validate the point.
    pub fn from_hex(s: &str) -> Result<Self, BlsKeyError> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| BlsKeyError::InvalidHex(e.to_string()))?;
        let key = Self::from_slice(&bytes)?;
        key.validate()?;
        Ok(key)
    }

    /// Check that the bytes decode to a valid, non-identity public key in
    /// the prime-order subgroup.
    pub fn validate(&self) -> Result<(), BlsKeyError> {
        blst::min_pk::PublicKey::key_validate(&self.0)
            .map(|_| ())
            .map_err(|e| BlsKeyError::InvalidPoint(format!("{:?}", e)))
    }

    /// Shard bucket of this key: the big-endian integer value of the
    /// serialized bytes modulo `shard_count`.
    ///
    /// Depends only on the canonical encoding, so every node agrees.
    pub fn shard_bucket(&self, shard_count: u32) -> ShardId {
        if shard_count == 0 {
            return 0;
        }
        let modulus = u64::from(shard_count);
        let rem = self
            .0
            .iter()
            .fold(0u64, |acc, byte| ((acc << 8) | u64::from(*byte)) % modulus);
        rem as ShardId
    }

    /// Lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsPublicKey({})", self.to_hex())
    }
}

impl fmt::Display for BlsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Parse a `0x`-prefixed or bare 20-byte hex address.
pub fn parse_address(s: &str) -> Result<Address, String> {
    let raw = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(raw).map_err(|e| e.to_string())?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("expected 20 bytes, got {}", bytes.len()))
}

// =============================================================================
// Fixed-point decimal
// =============================================================================

/// Number of fractional decimal digits carried by [`Dec`].
pub const DEC_PRECISION: usize = 18;

/// Non-negative fixed-point decimal with 18 fractional digits.
///
/// All arithmetic is integer arithmetic on the scaled value, so results
/// are identical on every platform. Products and quotients use a 512-bit
/// intermediate and truncate toward zero; results that would not fit in
/// 256 bits saturate.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(U256);

fn scale() -> U256 {
    U256::exp10(DEC_PRECISION)
}

fn narrow(value: U512) -> U256 {
    U256::try_from(value).unwrap_or(U256::MAX)
}

impl Dec {
    /// Zero.
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// One.
    pub fn one() -> Self {
        Self(scale())
    }

    /// Whole number.
    pub fn from_int(value: u64) -> Self {
        Self(U256::from(value) * scale())
    }

    /// Whole number from an arbitrary-precision integer.
    pub fn from_u256(value: U256) -> Self {
        Self(value.saturating_mul(scale()))
    }

    /// `value * 10^-prec`, e.g. `with_prec(15, 2)` is `0.15`.
    ///
    /// `prec` above 18 is clamped to 18.
    pub fn with_prec(value: u64, prec: usize) -> Self {
        let prec = prec.min(DEC_PRECISION);
        Self(U256::from(value) * U256::exp10(DEC_PRECISION - prec))
    }

    /// Build from the scaled representation.
    pub fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Scaled representation (value * 10^18).
    pub fn raw(&self) -> U256 {
        self.0
    }

    /// Check for zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Division; `None` when dividing by zero.
    pub fn quo(self, other: Dec) -> Option<Dec> {
        if other.is_zero() {
            return None;
        }
        let numerator = self.0.full_mul(scale());
        Some(Self(narrow(numerator / U512::from(other.0))))
    }

    /// Division by an integer; `None` when dividing by zero.
    pub fn quo_int(self, divisor: u64) -> Option<Dec> {
        if divisor == 0 {
            return None;
        }
        Some(Self(self.0 / U256::from(divisor)))
    }

    /// Integer part, truncated.
    pub fn truncate(&self) -> U256 {
        self.0 / scale()
    }

    /// Absolute difference.
    pub fn abs_diff(self, other: Dec) -> Dec {
        if self >= other {
            self - other
        } else {
            other - self
        }
    }
}

impl Add for Dec {
    type Output = Dec;

    fn add(self, other: Dec) -> Dec {
        Dec(self.0.saturating_add(other.0))
    }
}

/// Saturates at zero.
impl Sub for Dec {
    type Output = Dec;

    fn sub(self, other: Dec) -> Dec {
        Dec(self.0.saturating_sub(other.0))
    }
}

impl Mul for Dec {
    type Output = Dec;

    fn mul(self, other: Dec) -> Dec {
        Dec(narrow(self.0.full_mul(other.0) / U512::from(scale())))
    }
}

impl Sum for Dec {
    fn sum<I: Iterator<Item = Dec>>(iter: I) -> Dec {
        iter.fold(Dec::zero(), Add::add)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let integer = self.0 / scale();
        let fraction = (self.0 % scale()).low_u64();
        write!(f, "{}.{:0width$}", integer, fraction, width = DEC_PRECISION)
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({})", self)
    }
}

/// Decimal parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseDecError {
    /// Empty or malformed input.
    #[error("invalid decimal: {0}")]
    Invalid(String),

    /// More than 18 fractional digits.
    #[error("too many fractional digits: {0}")]
    TooPrecise(usize),
}

impl FromStr for Dec {
    type Err = ParseDecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty() || !all_digits(int_part) || !all_digits(frac_part) {
            return Err(ParseDecError::Invalid(s.to_string()));
        }
        if frac_part.len() > DEC_PRECISION {
            return Err(ParseDecError::TooPrecise(frac_part.len()));
        }
        let integer = U256::from_dec_str(int_part)
            .map_err(|_| ParseDecError::Invalid(s.to_string()))?;
        let mut fraction = U256::zero();
        if !frac_part.is_empty() {
            fraction = U256::from_dec_str(frac_part)
                .map_err(|_| ParseDecError::Invalid(s.to_string()))?
                * U256::exp10(DEC_PRECISION - frac_part.len());
        }
        let scaled = integer
            .checked_mul(scale())
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(|| ParseDecError::Invalid(s.to_string()))?;
        Ok(Dec(scaled))
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// Validator status and counters
// =============================================================================

/// Validator status as recorded in staking state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValidatorStatus {
    /// Eligible to take part in the auction.
    #[default]
    Active,
    /// Voluntarily or automatically deactivated.
    Inactive,
    /// Permanently removed after slashing.
    Banned,
}

/// Delegation of stake to a validator.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Delegator address.
    #[serde_as(as = "Hex")]
    pub delegator: Address,
    /// Delegated amount.
    pub amount: U256,
}

impl Delegation {
    /// Create a new delegation.
    pub fn new(delegator: Address, amount: U256) -> Self {
        Self { delegator, amount }
    }
}

/// Block signing counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SigningCounters {
    /// Blocks the validator was expected to sign.
    pub num_blocks_to_sign: u64,
    /// Blocks the validator actually signed.
    pub num_blocks_signed: u64,
}

impl SigningCounters {
    /// Create counters.
    pub fn new(num_blocks_to_sign: u64, num_blocks_signed: u64) -> Self {
        Self {
            num_blocks_to_sign,
            num_blocks_signed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_with_last_byte(b: u8) -> BlsPublicKey {
        let mut bytes = [0u8; 48];
        bytes[47] = b;
        BlsPublicKey(bytes)
    }

    #[test]
    fn test_shard_bucket_small_values() {
        assert_eq!(key_with_last_byte(6).shard_bucket(4), 2);
        assert_eq!(key_with_last_byte(7).shard_bucket(4), 3);
        assert_eq!(key_with_last_byte(8).shard_bucket(4), 0);
    }

    #[test]
    fn test_shard_bucket_uses_all_bytes() {
        // 0x0100 = 256, 256 mod 3 = 1
        let mut bytes = [0u8; 48];
        bytes[46] = 1;
        assert_eq!(BlsPublicKey(bytes).shard_bucket(3), 1);

        // value = 2^(8*47) ; 2^376 mod 5: 2^4 = 1 mod 5, 376 = 4*94 -> 1
        let mut high = [0u8; 48];
        high[0] = 1;
        assert_eq!(BlsPublicKey(high).shard_bucket(5), 1);
    }

    #[test]
    fn test_shard_bucket_zero_count() {
        assert_eq!(key_with_last_byte(9).shard_bucket(0), 0);
    }

    #[test]
    fn test_from_slice_wrong_length() {
        let err = BlsPublicKey::from_slice(&[0u8; 47]).unwrap_err();
        assert_eq!(
            err,
            BlsKeyError::InvalidLength {
                expected: 48,
                got: 47
            }
        );
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(matches!(
            BlsPublicKey::from_hex("zz"),
            Err(BlsKeyError::InvalidHex(_))
        ));
        assert!(matches!(
            BlsPublicKey::from_hex(&"00".repeat(48)),
            Err(BlsKeyError::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_from_hex_accepts_generated_key() {
        let sk = blst::min_pk::SecretKey::key_gen(&[7u8; 32], &[]).unwrap();
        let encoded = format!("0x{}", hex::encode(sk.sk_to_pk().to_bytes()));
        let key = BlsPublicKey::from_hex(&encoded).unwrap();
        assert_eq!(key.0, sk.sk_to_pk().to_bytes());
    }

    #[test]
    fn test_parse_address() {
        let addr = parse_address(&format!("0x{}", "11".repeat(20))).unwrap();
        assert_eq!(addr, [0x11; 20]);
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("nothex").is_err());
    }

    #[test]
    fn test_dec_display_and_parse() {
        let d: Dec = "1.5".parse().unwrap();
        assert_eq!(d.to_string(), "1.500000000000000000");
        assert_eq!(Dec::with_prec(15, 2).to_string(), "0.150000000000000000");
        assert_eq!("42".parse::<Dec>().unwrap(), Dec::from_int(42));
        assert!("1.2.3".parse::<Dec>().is_err());
        assert!(".5".parse::<Dec>().is_err());
        assert!(matches!(
            "0.0000000000000000001".parse::<Dec>(),
            Err(ParseDecError::TooPrecise(19))
        ));
    }

    #[test]
    fn test_dec_arithmetic() {
        let a = Dec::from_int(10);
        let b = Dec::from_int(4);
        assert_eq!(a + b, Dec::from_int(14));
        assert_eq!(a - b, Dec::from_int(6));
        assert_eq!(b - a, Dec::zero());
        assert_eq!(a * b, Dec::from_int(40));
        assert_eq!(a.quo(b).unwrap(), "2.5".parse().unwrap());
        assert_eq!(a.quo_int(4).unwrap(), "2.5".parse().unwrap());
        assert!(a.quo(Dec::zero()).is_none());
        assert!(a.quo_int(0).is_none());
    }

    #[test]
    fn test_dec_division_truncates() {
        let third = Dec::one().quo(Dec::from_int(3)).unwrap();
        assert_eq!(third.to_string(), "0.333333333333333333");
        assert_eq!(Dec::from_int(7).quo_int(2).unwrap().truncate(), U256::from(3));
    }

    #[test]
    fn test_dec_large_values_do_not_overflow() {
        // 10^28 atto-denominated stake, scaled by 10^18 internally.
        let big = Dec::from_u256(U256::exp10(28));
        let ratio = big.quo(big + big).unwrap();
        assert_eq!(ratio, "0.5".parse().unwrap());
        assert_eq!((big * Dec::with_prec(115, 2)).truncate(), U256::exp10(26) * 115);
    }

    #[test]
    fn test_dec_serde_as_string() {
        let d = Dec::with_prec(35, 2);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"0.350000000000000000\"");
        let back: Dec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
