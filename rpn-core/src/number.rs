//! `Number`: decimal floating point over dashu
//!
//! Values carry at least `DEFAULT_PRECISION` significant digits. Exact
//! rational factors (RBig) can be applied without leaving decimal land,
//! which keeps unit conversions like `12 inch -> foot` exact.

use dashu_float::ops::{Abs, SquareRoot};
use dashu_float::DBig;
use dashu_int::{IBig, UBig};
use dashu_ratio::RBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumberError {
    #[error("invalid number format: {0}")]
    ParseError(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("domain error: {0}")]
    DomainError(String),

    #[error("overflow: result too large")]
    Overflow,
}

/// Significant decimal digits carried by default
pub const DEFAULT_PRECISION: u32 = 50;

const DIGITS: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

const PI_DIGITS: &str = "3.14159265358979323846264338327950288419716939937510582097494459230781640628620899862803482534211706798214808651328230664709384460955058223172535940812848111745028410270193852110555964462294895493038196442881097566593344612847564823378678316527120190914564856692346034861045432664821339360726024914127372458700660631558817488152092096282925409171536436789259036001133053054882046652138414695194151160943305727036575959195309218611738193261179310511854807446237996274956735188575272489122793818301194912";

#[derive(Debug, Clone)]
pub struct Number {
    inner: DBig,
}

/// Pi to `digits` significant digits, at most the length of the literal
fn pi_to(digits: usize) -> DBig {
    let text = PI_DIGITS.get(..digits + 1).unwrap_or(PI_DIGITS);
    match text.parse::<DBig>() {
        Ok(pi) => pi.with_precision(digits).value(),
        Err(_) => DBig::from_parts(IBig::from(314_159_265_358_979_323_u64), -17),
    }
}

/// Sum of a Taylor series in `x^2` whose terms alternate in sign. `first`
/// is the leading term and `step(k)` the divisor taking term k-1 to term
/// k. Stops once a term drops below `10^-guard`.
fn alternating_series(x: &DBig, first: DBig, guard: usize, step: impl Fn(i64) -> i64) -> DBig {
    let x_squared = x * x;
    let epsilon = DBig::from_parts(IBig::ONE, -(guard as isize));
    let mut sum = first.clone();
    let mut term = first;
    for k in 1..=(4 * guard as i64) {
        term = -(term * &x_squared) / DBig::from(step(k));
        sum = &sum + &term;
        if Abs::abs(term.clone()) < epsilon {
            break;
        }
    }
    sum
}

fn domain(message: &str) -> NumberError {
    NumberError::DomainError(message.to_string())
}

impl Number {
    fn wrap(value: DBig) -> Self {
        Self { inner: value.with_precision(DEFAULT_PRECISION as usize).value() }
    }

    /// Copy of the inner value widened to `precision` digits
    fn widened(&self, precision: u32) -> DBig {
        self.inner.clone().with_precision(precision as usize).value()
    }

    /// Decimal text: `123`, `-42`, `3.14`, `1/3`, `1.5e10`, `602214076e15`
    pub fn from_str(s: &str) -> Result<Self, NumberError> {
        let text = s.trim();
        let invalid = || NumberError::ParseError(text.to_string());
        let decimal = |part: &str| part.trim().parse::<DBig>().map_err(|_| invalid());
        let has_exponent = text.contains(['e', 'E']);

        if !has_exponent && !text.contains('.') {
            if let Some((num, den)) = text.split_once('/') {
                let (num, den) = (Self::wrap(decimal(num)?), Self::wrap(decimal(den)?));
                return num.checked_div(&den);
            }
        }

        // DBig only takes an exponent after a fractional mantissa
        if has_exponent && !text.contains('.') {
            let lower = text.to_ascii_lowercase();
            if let Some((mantissa, exponent)) = lower.split_once('e') {
                let mantissa: IBig = mantissa.parse().map_err(|_| invalid())?;
                let exponent: isize = exponent.parse().map_err(|_| invalid())?;
                return Ok(Self::wrap(DBig::from_parts(mantissa, exponent)));
            }
        }

        decimal(text).map(Self::wrap)
    }

    /// Parse digits in an arbitrary radix (2..=36), with an optional sign
    /// and fractional part: "ff", "-101.1", "z.z"
    pub fn from_str_radix(s: &str, radix: u32) -> Result<Self, NumberError> {
        if !(2..=36).contains(&radix) {
            return Err(NumberError::DomainError(format!("unsupported radix {}", radix)));
        }
        if radix == 10 {
            return Self::from_str(s);
        }

        let s = s.trim().to_lowercase();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(&s)),
        };
        let (integer, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if integer.is_empty() && fraction.is_empty() {
            return Err(NumberError::ParseError(s.clone()));
        }

        let digit_value = |c: char| -> Result<u32, NumberError> {
            DIGITS.find(c)
                .map(|d| d as u32)
                .filter(|&d| d < radix)
                .ok_or_else(|| NumberError::ParseError(format!("'{}' is not a base {} digit", c, radix)))
        };

        let mut result = IBig::ZERO;
        for c in integer.chars() {
            result = result * IBig::from(radix) + IBig::from(digit_value(c)?);
        }
        let mut value = Self::from_ibig(result);

        if !fraction.is_empty() {
            let mut numerator = IBig::ZERO;
            for c in fraction.chars() {
                numerator = numerator * IBig::from(radix) + IBig::from(digit_value(c)?);
            }
            let denominator = IBig::from(UBig::from(radix).pow(fraction.len()));
            let fraction_value = Self::from_ibig(numerator).checked_div(&Self::from_ibig(denominator))?;
            value = value.add(&fraction_value);
        }

        Ok(if negative { value.neg() } else { value })
    }

    pub fn from_i64(n: i64) -> Self {
        Self::wrap(DBig::from(n))
    }

    pub fn from_ibig(n: IBig) -> Self {
        Self::wrap(DBig::from(n))
    }

    /// `num / den`; a zero denominator yields zero
    pub fn from_ratio(num: i64, den: i64) -> Self {
        Self::from_i64(num)
            .checked_div(&Self::from_i64(den))
            .unwrap_or_else(|_| Self::from_i64(0))
    }

    /// Create from an exact rational, rounded to working precision
    pub fn from_rational(r: &RBig) -> Self {
        Self::from_i64(1).scale(r)
    }

    // ========== Predicates ==========

    pub fn is_zero(&self) -> bool {
        self.inner == DBig::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.inner < DBig::ZERO
    }

    pub fn is_integer(&self) -> bool {
        self.inner.clone().floor() == self.inner
    }

    // ========== Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        Self { inner: &self.inner + &other.inner }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self { inner: &self.inner - &other.inner }
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self { inner: &self.inner * &other.inner }
    }

    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        match other.is_zero() {
            true => Err(NumberError::DivisionByZero),
            false => Ok(Self { inner: &self.inner / &other.inner }),
        }
    }

    pub fn neg(&self) -> Self {
        Self { inner: -self.inner.clone() }
    }

    /// Multiply by an exact rational: `self * num / den`.
    ///
    /// The numerator is applied first so that `12 * (1/12)` comes out as
    /// exactly 1 instead of 0.999...
    pub fn scale(&self, factor: &RBig) -> Self {
        let num = Self::from_ibig(factor.numerator().clone());
        let den = Self::from_ibig(IBig::from(factor.denominator().clone()));
        let product = self.mul(&num);
        // A reduced RBig never has a zero denominator.
        product.checked_div(&den).unwrap_or(product)
    }

    /// Remainder with the sign of the divisor: `a - b * floor(a / b)`
    pub fn modulo(&self, other: &Self) -> Result<Self, NumberError> {
        let quotient = self.checked_div(other)?.floor();
        Ok(self.sub(&other.mul(&quotient)))
    }

    /// Exact integer power. A negative power of zero divides by zero.
    pub fn pow(&self, exp: i32) -> Result<Self, NumberError> {
        let one = Self::from_i64(1);
        if exp == 0 {
            return Ok(one);
        }
        if exp < 0 && self.is_zero() {
            return Err(NumberError::DivisionByZero);
        }

        // square and multiply
        let mut remaining = exp.unsigned_abs();
        let mut base = self.clone();
        let mut result = one.clone();
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result.mul(&base);
            }
            base = base.mul(&base);
            remaining >>= 1;
        }

        match exp < 0 {
            true => one.checked_div(&result),
            false => Ok(result),
        }
    }

    /// `self ^ exp` for any real exponent, computed as `exp(y ln x)` unless
    /// the exponent is an integer that fits an `i32`
    pub fn pow_real(&self, exp: &Self, precision: u32) -> Result<Self, NumberError> {
        if exp.is_zero() {
            return Ok(Self::from_i64(1));
        }
        if self.is_zero() {
            return match exp.is_negative() {
                true => Err(NumberError::DivisionByZero),
                false => Ok(self.clone()),
            };
        }
        if let Some(small) = exp.to_i64().and_then(|e| i32::try_from(e).ok()) {
            return self.pow(small);
        }
        if self.is_negative() {
            return Err(domain("fractional power of a negative number"));
        }
        let exponent = &self.widened(precision).ln() * &exp.inner;
        Ok(Self { inner: exponent.exp() })
    }

    // ========== Roots, logarithms and trigonometry ==========

    pub fn sqrt(&self, precision: u32) -> Result<Self, NumberError> {
        if self.is_negative() {
            return Err(domain("square root of negative number"));
        }
        if self.is_zero() {
            return Ok(self.clone());
        }
        Ok(Self { inner: self.widened(precision).sqrt() })
    }

    /// k-th root. Odd roots of negative numbers are real; exact integer
    /// roots are returned exactly.
    pub fn nth_root(&self, k: i64, precision: u32) -> Result<Self, NumberError> {
        if k == 0 {
            return Err(NumberError::DomainError("zeroth root".to_string()));
        }
        if k < 0 {
            return Self::from_i64(1).checked_div(&self.nth_root(-k, precision)?);
        }
        if k == 1 || self.is_zero() {
            return Ok(self.clone());
        }
        if self.is_negative() && k % 2 == 0 {
            return Err(domain("even root of negative number"));
        }
        if k == 2 {
            return self.sqrt(precision);
        }

        let magnitude = self.abs();
        let ln_x = magnitude.ln(precision)?;
        let root = ln_x.checked_div(&Self::from_i64(k))?.exp(precision);

        // Snap to an exact integer when it really is one
        let candidate = root.round();
        let k32 = i32::try_from(k).map_err(|_| NumberError::Overflow)?;
        let root = if candidate.pow(k32)? == magnitude { candidate } else { root };

        Ok(if self.is_negative() { root.neg() } else { root })
    }

    pub fn ln(&self, precision: u32) -> Result<Self, NumberError> {
        if self.is_zero() || self.is_negative() {
            return Err(domain("logarithm of non-positive number"));
        }
        Ok(Self { inner: self.widened(precision).ln() })
    }

    pub fn log10(&self, precision: u32) -> Result<Self, NumberError> {
        self.ln(precision)?.checked_div(&Self::from_i64(10).ln(precision)?)
    }

    pub fn exp(&self, precision: u32) -> Self {
        Self { inner: self.widened(precision).exp() }
    }

    /// Working digits for an angle: the requested precision plus room for
    /// the integer part that range reduction cancels out
    fn angle_guard(&self, precision: u32) -> usize {
        let integer_digits = self.abs().floor().to_ibig().map_or(0, |n| n.to_string().len());
        precision as usize + integer_digits + 10
    }

    /// The same angle folded into [-pi, pi]
    fn reduce_angle(&self, guard: usize) -> DBig {
        let x = self.inner.clone().with_precision(guard).value();
        let pi = pi_to(guard);
        let two_pi = &pi + &pi;
        let turns = (&x / &two_pi).floor();
        let reduced = x - turns * &two_pi;
        if reduced > pi { reduced - two_pi } else { reduced }
    }

    pub fn sin(&self, precision: u32) -> Self {
        let guard = self.angle_guard(precision);
        let x = self.reduce_angle(guard);
        let sum = alternating_series(&x, x.clone(), guard, |k| (2 * k) * (2 * k + 1));
        Self { inner: sum.with_precision(precision as usize).value() }
    }

    pub fn cos(&self, precision: u32) -> Self {
        let guard = self.angle_guard(precision);
        let x = self.reduce_angle(guard);
        let one = DBig::ONE.with_precision(guard).value();
        let sum = alternating_series(&x, one, guard, |k| (2 * k - 1) * (2 * k));
        Self { inner: sum.with_precision(precision as usize).value() }
    }

    pub fn tan(&self, precision: u32) -> Result<Self, NumberError> {
        let cosine = self.cos(precision);
        if cosine.is_zero() {
            return Err(domain("tan undefined at odd multiples of pi/2"));
        }
        self.sin(precision).checked_div(&cosine)
    }

    // ========== Constants ==========

    /// Golden ratio (1 + sqrt 5) / 2
    pub fn phi(precision: u32) -> Self {
        let sqrt5 = Self::from_i64(5).sqrt(precision + 10).unwrap_or(Self::from_i64(2));
        Self::from_i64(1).add(&sqrt5)
            .checked_div(&Self::from_i64(2))
            .unwrap_or(Self::from_ratio(161803, 100000))
    }

    /// Pi truncated from a 500-digit literal
    pub fn pi(precision: u32) -> Self {
        let digits = PI_DIGITS.get(..precision as usize + 2).unwrap_or(PI_DIGITS);
        Self::from_str(digits).unwrap_or_else(|_| Self::from_ratio(355, 113))
    }

    pub fn e(precision: u32) -> Self {
        Self::from_i64(1).exp(precision)
    }

    // ========== Rounding and conversion ==========

    pub fn abs(&self) -> Self {
        Self { inner: Abs::abs(self.inner.clone()) }
    }

    pub fn floor(&self) -> Self {
        Self { inner: self.inner.clone().floor() }
    }

    pub fn ceil(&self) -> Self {
        Self { inner: self.inner.clone().ceil() }
    }

    /// Round half away from zero
    pub fn round(&self) -> Self {
        let rounded = self.abs().add(&Self::from_ratio(1, 2)).floor();
        if self.is_negative() { rounded.neg() } else { rounded }
    }

    /// The exact integer, or `None` when there is a fractional part
    pub fn to_ibig(&self) -> Option<IBig> {
        if !self.is_integer() {
            return None;
        }
        let (significand, exponent) = self.inner.clone().into_repr().into_parts();
        let scale = IBig::from(UBig::from(10u8).pow(exponent.unsigned_abs()));
        Some(if exponent >= 0 { significand * scale } else { significand / scale })
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.to_ibig().and_then(|n| i64::try_from(n).ok())
    }

    /// Nearest `f64`, `None` outside its range
    pub fn to_f64(&self) -> Option<f64> {
        self.inner.to_string()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
    }
}

impl fmt::Display for Number {
    /// Plain decimal notation without trailing fractional zeros
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.inner.to_string();
        let plain_fraction = rendered.contains('.') && !rendered.contains(['e', 'E']);
        match plain_fraction {
            true => f.write_str(rendered.trim_end_matches('0').trim_end_matches('.')),
            false => f.write_str(&rendered),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_str(&text).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.partial_cmp(&other.inner).unwrap_or(Ordering::Equal)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Self::from_i64(n)
    }
}
