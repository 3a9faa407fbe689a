//! Exact rational arithmetic.
//!
//! Prices are carried as `numer / denom` over [`BigInt`] through every
//! multiplication, inversion and power of ten. Rounding happens exactly once,
//! in [`Ratio::to_decimal`], at [`WORKING_PRECISION`] significant digits.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::{One, Signed, Zero};
use std::ops::Mul;

use super::conversion::big_pow10;

/// Significant decimal digits kept when a ratio is rendered as a decimal.
pub const WORKING_PRECISION: u64 = 80;

/// Largest decimal exponent accepted from an upstream price string.
pub const MAX_DECIMAL_SCALE: u32 = 400;

/// An exact fraction with a strictly positive denominator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ratio {
    numer: BigInt,
    denom: BigInt,
}

impl Ratio {
    /// Build `numer / denom`. Returns `None` when `denom` is zero.
    pub fn new(numer: BigInt, denom: BigInt) -> Option<Self> {
        if denom.is_zero() {
            return None;
        }
        // Keep the sign on the numerator
        if denom.sign() == Sign::Minus {
            Some(Self {
                numer: -numer,
                denom: -denom,
            })
        } else {
            Some(Self {
                numer,
                denom,
            })
        }
    }

    /// Caller guarantees `denom > 0`.
    pub(super) fn from_parts(numer: BigInt, denom: BigInt) -> Self {
        debug_assert!(denom.is_positive());
        Self {
            numer,
            denom,
        }
    }

    pub fn from_integer(value: BigInt) -> Self {
        Self {
            numer: value,
            denom: BigInt::one(),
        }
    }

    /// Exact conversion of a decimal: `digits * 10^-scale`.
    ///
    /// Returns `None` when the exponent exceeds [`MAX_DECIMAL_SCALE`].
    pub fn from_decimal(value: &BigDecimal) -> Option<Self> {
        let (digits, scale) = value.as_bigint_and_exponent();
        if scale.unsigned_abs() > MAX_DECIMAL_SCALE as u64 {
            return None;
        }
        let exp = u32::try_from(scale.unsigned_abs()).ok()?;
        if scale >= 0 {
            Some(Self {
                numer: digits,
                denom: big_pow10(exp),
            })
        } else {
            Some(Self::from_integer(digits * big_pow10(exp)))
        }
    }

    /// `10^exp`, for positive and negative exponents.
    pub fn pow10(exp: i32) -> Self {
        if exp >= 0 {
            Self::from_integer(big_pow10(exp as u32))
        } else {
            Self {
                numer: BigInt::one(),
                denom: big_pow10(exp.unsigned_abs()),
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.numer.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.numer.is_positive()
    }

    pub fn numer(&self) -> &BigInt {
        &self.numer
    }

    pub fn denom(&self) -> &BigInt {
        &self.denom
    }

    /// `1 / self`. Returns `None` for zero.
    pub fn recip(&self) -> Option<Self> {
        Self::new(self.denom.clone(), self.numer.clone())
    }

    /// `self / other`. Returns `None` when `other` is zero.
    pub fn checked_div(&self, other: &Ratio) -> Option<Self> {
        Self::new(&self.numer * &other.denom, &self.denom * &other.numer)
    }

    /// Render as a decimal rounded half-up to [`WORKING_PRECISION`]
    /// significant digits.
    ///
    /// The quotient is computed in integers at exactly that many digits, so
    /// this is the only rounding step.
    pub fn to_decimal(&self) -> BigDecimal {
        if self.numer.is_zero() {
            return BigDecimal::zero();
        }
        let numer = self.numer.abs();
        let limit = big_pow10(WORKING_PRECISION as u32);

        // log10(numer / denom) lies in [exp - 1, exp + 1)
        let mut exp = digit_count(&numer) - digit_count(&self.denom);
        loop {
            let scale = WORKING_PRECISION as i64 - exp;
            let (scaled_numer, scaled_denom) = if scale >= 0 {
                (&numer * big_pow10(scale as u32), self.denom.clone())
            } else {
                (numer.clone(), &self.denom * big_pow10(scale.unsigned_abs() as u32))
            };

            let quotient = &scaled_numer / &scaled_denom;
            if quotient >= limit {
                exp += 1;
                continue;
            }
            let remainder = &scaled_numer % &scaled_denom;
            let quotient = if &remainder + &remainder >= scaled_denom {
                quotient + BigInt::one()
            } else {
                quotient
            };
            let quotient = if self.numer.is_negative() {
                -quotient
            } else {
                quotient
            };
            return BigDecimal::new(quotient, scale).normalized();
        }
    }
}

fn digit_count(value: &BigInt) -> i64 {
    value.magnitude().to_str_radix(10).len() as i64
}

impl Mul for &Ratio {
    type Output = Ratio;

    fn mul(self, rhs: &Ratio) -> Ratio {
        Ratio {
            numer: &self.numer * &rhs.numer,
            denom: &self.denom * &rhs.denom,
        }
    }
}

impl Mul for Ratio {
    type Output = Ratio;

    fn mul(self, rhs: Ratio) -> Ratio {
        &self * &rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_zero_denominator_rejected() {
        assert!(Ratio::new(BigInt::from(1), BigInt::zero()).is_none());
        assert!(Ratio::from_integer(BigInt::zero()).recip().is_none());
        let one = Ratio::from_integer(BigInt::one());
        let zero = Ratio::from_integer(BigInt::zero());
        assert!(one.checked_div(&zero).is_none());
    }

    #[test]
    fn test_negative_denominator_moves_sign() {
        let r = Ratio::new(BigInt::from(3), BigInt::from(-4)).unwrap();
        assert_eq!(r.numer(), &BigInt::from(-3));
        assert_eq!(r.denom(), &BigInt::from(4));
    }

    #[test]
    fn test_from_decimal_is_exact() {
        let d = BigDecimal::from_str("12.345").unwrap();
        let r = Ratio::from_decimal(&d).unwrap();
        assert_eq!(r.numer(), &BigInt::from(12345));
        assert_eq!(r.denom(), &BigInt::from(1000));

        let d = BigDecimal::from_str("5e3").unwrap();
        let r = Ratio::from_decimal(&d).unwrap();
        assert_eq!(r.to_decimal(), BigDecimal::from(5000));
    }

    #[test]
    fn test_from_decimal_rejects_extreme_exponents() {
        // Would wrap to 10^-1 if the exponent were truncated to 32 bits
        let d = BigDecimal::from_str("1e-4294967297").unwrap();
        assert!(Ratio::from_decimal(&d).is_none());

        let d = BigDecimal::from_str("1e-3000000000").unwrap();
        assert!(Ratio::from_decimal(&d).is_none());

        let d = BigDecimal::from_str("1e3000000000").unwrap();
        assert!(Ratio::from_decimal(&d).is_none());

        let d = BigDecimal::from_str("1e-400").unwrap();
        assert!(Ratio::from_decimal(&d).is_some());
    }

    #[test]
    fn test_pow10_negative() {
        assert_eq!(Ratio::pow10(-12).to_decimal(), BigDecimal::from_str("0.000000000001").unwrap());
        assert_eq!(Ratio::pow10(3).to_decimal(), BigDecimal::from(1000));
    }

    #[test]
    fn test_to_decimal_rounds_to_working_precision() {
        let third = Ratio::new(BigInt::from(1), BigInt::from(3)).unwrap();
        let rendered = third.to_decimal().to_plain_string();
        // "0." followed by exactly 80 threes
        assert_eq!(rendered.len(), 2 + WORKING_PRECISION as usize);
        assert!(rendered[2..].chars().all(|c| c == '3'));
    }

    #[test]
    fn test_to_decimal_rounds_once() {
        // 101 digits: 80 kept, then 4, nineteen 9s, 6. Rounding to 100 digits
        // first would make a tie at digit 81 and round the 80th digit up.
        let numer = BigInt::from_str(&format!(
            "1{}14{}6",
            "0".repeat(78),
            "9".repeat(19)
        ))
        .unwrap();
        let r = Ratio::new(numer, big_pow10(101)).unwrap();
        assert_eq!(
            r.to_decimal().to_plain_string(),
            format!("0.1{}1", "0".repeat(78))
        );
    }

    #[test]
    fn test_to_decimal_rounds_half_up_and_keeps_sign() {
        let two_thirds = Ratio::new(BigInt::from(-2), BigInt::from(3)).unwrap();
        let rendered = two_thirds.to_decimal().to_plain_string();
        assert_eq!(rendered, format!("-0.{}7", "6".repeat(79)));

        let large = Ratio::new(BigInt::from(10).pow(90) * BigInt::from(7), BigInt::from(2)).unwrap();
        assert_eq!(large.to_decimal(), BigDecimal::from_str("3.5e90").unwrap());
    }

    #[test]
    fn test_recip_of_product_is_exact() {
        let a = Ratio::new(BigInt::from(7), BigInt::from(9)).unwrap();
        let b = Ratio::pow10(-5);
        let product = &a * &b;
        let back = product.recip().unwrap() * product.clone();
        assert_eq!(back.to_decimal(), BigDecimal::from(1));
    }
}
