//! Unbounded integer amounts and their human-readable rendering.
//!
//! Every quantity, price, rate and decimal scale handled by the engines is
//! a [`BigUint`]. Multiply/divide chains are evaluated on unbounded
//! integers so truncation only happens where a division is written.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use rust_decimal::Decimal;

/// `10^exp` as an unbounded integer.
pub fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

/// Number of decimal places represented by a `10^d` scale, if `scale` is
/// an exact power of ten.
pub fn decimal_places(scale: &BigUint) -> Option<u32> {
    if scale.is_zero() {
        return None;
    }
    let ten = BigUint::from(10u32);
    let mut rest = scale.clone();
    let mut places = 0u32;
    while (&rest % &ten).is_zero() {
        rest /= &ten;
        places += 1;
    }
    if rest == BigUint::from(1u32) {
        Some(places)
    } else {
        None
    }
}

/// Render `amount` (in smallest units) as a decimal number of whole tokens.
///
/// Uses [`Decimal`] when the value fits its 96-bit mantissa and falls back
/// to exact integer formatting otherwise.
pub fn to_display(amount: &BigUint, scale: &BigUint) -> String {
    let Some(places) = decimal_places(scale) else {
        return amount.to_string();
    };
    if places <= 28 {
        if let Some(mantissa) = amount.to_i128() {
            if let Ok(value) = Decimal::try_from_i128_with_scale(mantissa, places) {
                return value.normalize().to_string();
            }
        }
    }
    let whole = amount / scale;
    let frac = amount % scale;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = places as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Serde adapter writing a [`BigUint`] as a base-10 string.
pub mod as_decimal_str {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigUint::parse_bytes(s.trim().as_bytes(), 10)
            .ok_or_else(|| de::Error::custom(format!("invalid unsigned integer: {s}")))
    }
}

/// Serde adapter for optional [`BigUint`] values.
pub mod opt_as_decimal_str {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<BigUint>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_str_radix(10)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigUint>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            None => Ok(None),
            Some(s) => BigUint::parse_bytes(s.trim().as_bytes(), 10)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid unsigned integer: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0), BigUint::from(1u32));
        assert_eq!(pow10(18), BigUint::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places(&pow10(18)), Some(18));
        assert_eq!(decimal_places(&BigUint::from(1u32)), Some(0));
        assert_eq!(decimal_places(&BigUint::from(150u32)), None);
        assert_eq!(decimal_places(&BigUint::zero()), None);
    }

    #[test]
    fn test_display_fits_decimal() {
        let amount = BigUint::from(1_500_000_000_000_000_000u64);
        assert_eq!(to_display(&amount, &pow10(18)), dec!(1.5).to_string());
    }

    #[test]
    fn test_display_beyond_decimal_range() {
        // 10^40 + 25 * 10^16 with 18 places
        let amount = pow10(40) + BigUint::from(25u32) * pow10(16);
        assert_eq!(to_display(&amount, &pow10(18)), "10000000000000000000000.25");
    }

    #[test]
    fn test_display_non_power_of_ten_scale() {
        let amount = BigUint::from(42u32);
        assert_eq!(to_display(&amount, &BigUint::from(7u32)), "42");
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Wrapper {
        #[serde(with = "as_decimal_str")]
        value: BigUint,
        #[serde(with = "opt_as_decimal_str", default)]
        maybe: Option<BigUint>,
    }

    #[test]
    fn test_serde_decimal_strings() {
        let w = Wrapper {
            value: pow10(30),
            maybe: None,
        };
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(
            json,
            r#"{"value":"1000000000000000000000000000000","maybe":null}"#
        );
        let back: Wrapper = serde_json::from_str(r#"{"value":"12","maybe":"3"}"#).unwrap();
        assert_eq!(back.value, BigUint::from(12u32));
        assert_eq!(back.maybe, Some(BigUint::from(3u32)));
    }

    #[test]
    fn test_serde_rejects_negative() {
        let result: Result<Wrapper, _> = serde_json::from_str(r#"{"value":"-1"}"#);
        assert!(result.is_err());
    }
}
