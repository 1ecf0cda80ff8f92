use core::cmp::Ordering;
use core::fmt;
use core::ops::{
    Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Div,
    DivAssign, Mul, MulAssign, Neg, Not, Rem, RemAssign, Shl, ShlAssign, Shr, ShrAssign, Sub,
    SubAssign,
};
use core::str::FromStr;

use alloc::vec::Vec;

/// A signed arbitrary-precision integer.
///
/// The magnitude is a little-endian sequence of base-2^32 digits with no
/// trailing zero digit; zero is the empty sequence and is never negative.
/// Division truncates toward zero and the remainder takes the dividend's
/// sign, like the primitive integer types. The bitwise operators and the
/// shifts act on the number's infinite two's-complement bit pattern.
///
/// # Examples
///
/// ```
/// use socow::BigInt;
///
/// let a: BigInt = "123456789012345678901234567890".parse().unwrap();
/// let b = &a + &BigInt::from(1);
/// assert_eq!(b.to_string(), "123456789012345678901234567891");
///
/// let (q, r) = b.div_rem(&BigInt::from(1_000_000_007u32));
/// assert_eq!(&q * &BigInt::from(1_000_000_007u32) + &r, b);
/// ```
#[derive(Clone, Default)]
pub struct BigInt {
    digits: Vec<u32>,
    negative: bool,
}

/// Powers of ten up to the largest that fits a base digit.
const POW10: [u32; 10] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
];

/// Nine decimal digits per chunk when converting to and from base 10.
const CHUNK_LEN: usize = 9;

fn trim_mag(digits: &mut Vec<u32>) {
    while digits.last() == Some(&0) {
        digits.pop();
    }
}

fn cmp_magnitude(a: &[u32], b: &[u32]) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.iter().rev().cmp(b.iter().rev()))
}

/// `dst += rhs` on magnitudes.
fn add_mag_assign(dst: &mut Vec<u32>, rhs: &[u32]) {
    if dst.len() < rhs.len() {
        dst.resize(rhs.len(), 0);
    }
    let mut carry = 0u64;
    for (i, d) in dst.iter_mut().enumerate() {
        carry += *d as u64;
        if let Some(&r) = rhs.get(i) {
            carry += r as u64;
        }
        *d = carry as u32;
        carry >>= 32;
    }
    if carry != 0 {
        dst.push(carry as u32);
    }
}

/// `dst -= rhs` on magnitudes; requires `|dst| >= |rhs|`.
fn sub_mag_assign(dst: &mut Vec<u32>, rhs: &[u32]) {
    debug_assert!(cmp_magnitude(dst, rhs) != Ordering::Less);
    let mut borrow = 0u64;
    for (i, d) in dst.iter_mut().enumerate() {
        let r = rhs.get(i).copied().unwrap_or(0) as u64;
        let diff = (*d as u64).wrapping_sub(r).wrapping_sub(borrow);
        borrow = (diff >> 32) & 1;
        *d = diff as u32;
    }
    trim_mag(dst);
}

/// `digits *= m`; trims.
fn mul_small(digits: &mut Vec<u32>, m: u32) {
    let mut carry = 0u64;
    for d in digits.iter_mut() {
        carry += *d as u64 * m as u64;
        *d = carry as u32;
        carry >>= 32;
    }
    if carry != 0 {
        digits.push(carry as u32);
    }
    trim_mag(digits);
}

/// `digits /= d`, returning the remainder; trims. `d != 0`.
fn div_small(digits: &mut Vec<u32>, d: u32) -> u32 {
    debug_assert!(d != 0);
    let mut rem = 0u64;
    for digit in digits.iter_mut().rev() {
        rem = (rem << 32) | *digit as u64;
        *digit = (rem / d as u64) as u32;
        rem %= d as u64;
    }
    trim_mag(digits);
    rem as u32
}

/// `digits += v` on magnitudes.
fn add_small(digits: &mut Vec<u32>, v: u32) {
    let mut carry = v as u64;
    for d in digits.iter_mut() {
        carry += *d as u64;
        *d = carry as u32;
        carry >>= 32;
        if carry == 0 {
            return;
        }
    }
    if carry != 0 {
        digits.push(carry as u32);
    }
}

/// `digits -= v` on magnitudes; requires `|digits| >= v`. Trims.
fn sub_small(digits: &mut Vec<u32>, v: u32) {
    let mut borrow = v as u64;
    for d in digits.iter_mut() {
        let diff = (*d as u64).wrapping_sub(borrow);
        borrow = (diff >> 32) & 1;
        *d = diff as u32;
        if borrow == 0 {
            break;
        }
    }
    debug_assert_eq!(borrow, 0);
    trim_mag(digits);
}

/// One digit of a number's two's-complement image. Non-negative numbers
/// pass through; for negatives the digit is complemented and the running
/// `carry` (seeded with 1) implements the `+ 1`.
fn twos_complement(negative: bool, digit: u32, carry: &mut u32) -> u32 {
    if !negative {
        digit
    } else {
        let res = *carry as u64 + (!digit) as u64;
        *carry = (res >> 32) as u32;
        res as u32
    }
}

impl BigInt {
    /// Constructs zero.
    #[inline]
    pub const fn new() -> Self {
        Self {
            digits: Vec::new(),
            negative: false,
        }
    }

    /// Returns `true` if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Returns `true` if the value is strictly below zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Flips the sign in place. Zero stays zero.
    pub fn negate(&mut self) {
        if !self.digits.is_empty() {
            self.negative = !self.negative;
        }
    }

    /// Restores the representation invariant after digit surgery: no
    /// trailing zero digit, and zero carries no sign.
    fn trim(&mut self) {
        trim_mag(&mut self.digits);
        if self.digits.is_empty() {
            self.negative = false;
        }
    }

    fn from_magnitude(low: u64, negative: bool) -> Self {
        let mut value = Self::new();
        if low != 0 {
            value.digits.push(low as u32);
            if low >> 32 != 0 {
                value.digits.push((low >> 32) as u32);
            }
            value.negative = negative;
        }
        value
    }

    fn add_ref(&mut self, rhs: &BigInt) {
        if self.negative == rhs.negative {
            add_mag_assign(&mut self.digits, &rhs.digits);
            return;
        }
        match cmp_magnitude(&self.digits, &rhs.digits) {
            Ordering::Equal => {
                self.digits.clear();
                self.negative = false;
            }
            Ordering::Greater => {
                sub_mag_assign(&mut self.digits, &rhs.digits);
                self.trim();
            }
            Ordering::Less => {
                let mut mag = rhs.digits.clone();
                sub_mag_assign(&mut mag, &self.digits);
                self.digits = mag;
                self.negative = rhs.negative;
                self.trim();
            }
        }
    }

    fn sub_ref(&mut self, rhs: &BigInt) {
        // a - b == -(-a + b)
        self.negate();
        self.add_ref(rhs);
        self.negate();
    }

    fn mul_ref(&mut self, rhs: &BigInt) {
        let negative = self.negative != rhs.negative;
        let a = &self.digits;
        let b = &rhs.digits;
        let mut res = alloc::vec![0u32; a.len() + b.len()];
        for (i, &ad) in a.iter().enumerate() {
            let mut carry = 0u64;
            for (j, &bd) in b.iter().enumerate() {
                let cur = ad as u64 * bd as u64 + res[i + j] as u64 + carry;
                res[i + j] = cur as u32;
                carry = cur >> 32;
            }
            res[i + b.len()] = carry as u32;
        }
        self.digits = res;
        self.negative = negative;
        self.trim();
    }

    fn bitwise_assign(&mut self, rhs: &BigInt, op: impl Fn(u32, u32) -> u32) {
        let res_negative = op(self.negative as u32, rhs.negative as u32) & 1 == 1;
        let (a_negative, b_negative) = (self.negative, rhs.negative);
        let len = self.digits.len().max(rhs.digits.len());
        self.digits.resize(len, 0);

        // Independent carries implement "+ 1" of the two's complement for
        // each negative operand and once more for a negative result.
        let (mut a_carry, mut b_carry, mut res_carry) = (1u32, 1u32, 1u32);
        for (i, d) in self.digits.iter_mut().enumerate() {
            let a_digit = twos_complement(a_negative, *d, &mut a_carry);
            let b_digit = twos_complement(
                b_negative,
                rhs.digits.get(i).copied().unwrap_or(0),
                &mut b_carry,
            );
            *d = twos_complement(res_negative, op(a_digit, b_digit), &mut res_carry);
        }
        self.negative = res_negative;
        self.trim();
    }

    /// Adds one in place; cheaper than a full addition.
    pub fn increment(&mut self) {
        if !self.negative {
            add_small(&mut self.digits, 1);
        } else {
            sub_small(&mut self.digits, 1);
            self.trim();
        }
    }

    /// Subtracts one in place.
    pub fn decrement(&mut self) {
        if self.is_zero() {
            self.negative = true;
            self.digits.push(1);
        } else {
            self.negate();
            self.increment();
            self.negate();
        }
    }

    /// Truncated division: quotient rounded toward zero, remainder with the
    /// dividend's sign, `q * rhs + r == self`.
    ///
    /// Returns `None` when `rhs` is zero.
    pub fn checked_div_rem(&self, rhs: &BigInt) -> Option<(BigInt, BigInt)> {
        if rhs.is_zero() {
            return None;
        }
        if self.digits.len() < rhs.digits.len() {
            return Some((BigInt::new(), self.clone()));
        }

        let quot_negative = self.negative != rhs.negative;
        let rem_negative = self.negative;

        // Normalize so the divisor's top digit has its high bit set; the
        // quotient-digit estimate below is then off by at most two.
        let shift = rhs.digits[rhs.digits.len() - 1].leading_zeros();
        let mut a = BigInt {
            digits: self.digits.clone(),
            negative: false,
        };
        let mut divisor = BigInt {
            digits: rhs.digits.clone(),
            negative: false,
        };
        if shift > 0 {
            mul_small(&mut a.digits, 1 << shift);
            mul_small(&mut divisor.digits, 1 << shift);
        }

        let m = a.digits.len() - divisor.digits.len();
        let mut quotient = alloc::vec![0u32; m + 1];

        // Align the divisor with the dividend's top digits; each round of
        // the loop below drops one low zero to step it back down.
        let mut zeros = alloc::vec![0u32; m];
        zeros.append(&mut divisor.digits);
        divisor.digits = zeros;

        if cmp_magnitude(&a.digits, &divisor.digits) != Ordering::Less {
            quotient[m] = 1;
            sub_mag_assign(&mut a.digits, &divisor.digits);
            a.trim();
        }

        for index in (0..m).rev() {
            divisor.digits.remove(0);
            let a_len = a.digits.len();
            let d_len = divisor.digits.len();
            if a_len < d_len {
                continue;
            }
            let top = divisor.digits[d_len - 1] as u64;
            let estimate = if a_len == d_len {
                a.digits[a_len - 1] as u64 / top
            } else {
                (((a.digits[a_len - 1] as u64) << 32) | a.digits[a_len - 2] as u64) / top
            };
            let mut q_digit = estimate.min(u32::MAX as u64) as u32;
            if q_digit == 0 {
                continue;
            }
            let mut step = divisor.clone();
            mul_small(&mut step.digits, q_digit);
            a.sub_ref(&step);
            while a.is_negative() {
                q_digit -= 1;
                a.add_ref(&divisor);
            }
            quotient[index] = q_digit;
        }

        let mut rem = a;
        if shift > 0 {
            div_small(&mut rem.digits, 1 << shift);
        }
        rem.trim();
        rem.negative = rem_negative && !rem.digits.is_empty();

        let mut quot = BigInt {
            digits: quotient,
            negative: false,
        };
        quot.trim();
        quot.negative = quot_negative && !quot.digits.is_empty();
        Some((quot, rem))
    }

    /// Truncated division; see [`checked_div_rem`](BigInt::checked_div_rem).
    ///
    /// # Panics
    /// Panics if `rhs` is zero.
    pub fn div_rem(&self, rhs: &BigInt) -> (BigInt, BigInt) {
        match self.checked_div_rem(rhs) {
            Some(pair) => pair,
            None => panic!("division by zero in `BigInt`"),
        }
    }
}

impl PartialEq for BigInt {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.negative == other.negative && self.digits == other.digits
    }
}

impl Eq for BigInt {}

impl PartialOrd for BigInt {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (negative, _) => {
                let mag = cmp_magnitude(&self.digits, &other.digits);
                if negative {
                    mag.reverse()
                } else {
                    mag
                }
            }
        }
    }
}

impl core::hash::Hash for BigInt {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.negative.hash(state);
        self.digits.hash(state);
    }
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for BigInt {
            #[inline]
            fn from(value: $t) -> Self {
                Self::from_magnitude(value as u64, false)
            }
        }
    )*};
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for BigInt {
            #[inline]
            fn from(value: $t) -> Self {
                Self::from_magnitude(value.unsigned_abs() as u64, value < 0)
            }
        }
    )*};
}

impl_from_unsigned!(u8, u16, u32, u64, usize);
impl_from_signed!(i8, i16, i32, i64, isize);

/// The error returned when parsing a [`BigInt`] from a decimal string
/// fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBigIntError {
    empty: bool,
}

impl fmt::Display for ParseBigIntError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.empty {
            f.write_str("cannot parse integer from empty string")
        } else {
            f.write_str("invalid digit found in string")
        }
    }
}

impl core::error::Error for ParseBigIntError {}

impl FromStr for BigInt {
    type Err = ParseBigIntError;

    /// Parses an optionally `-`-prefixed decimal string, nine digits per
    /// multiply-and-add round.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let (negative, digits) = match bytes.first() {
            Some(b'-') => (true, &bytes[1..]),
            _ => (false, bytes),
        };
        if digits.is_empty() {
            return Err(ParseBigIntError { empty: true });
        }

        let mut value = BigInt::new();
        for chunk in digits.chunks(CHUNK_LEN) {
            let mut part = 0u32;
            for &b in chunk {
                if !b.is_ascii_digit() {
                    return Err(ParseBigIntError { empty: false });
                }
                part = part * 10 + (b - b'0') as u32;
            }
            mul_small(&mut value.digits, POW10[chunk.len()]);
            add_small(&mut value.digits, part);
        }
        value.trim();
        value.negative = negative && !value.digits.is_empty();
        Ok(value)
    }
}

impl fmt::Display for BigInt {
    /// Decimal form, produced nine digits at a time by repeated division
    /// with `10^9`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut mag = self.digits.clone();
        let mut chunks: Vec<u32> = Vec::new();
        while !mag.is_empty() {
            chunks.push(div_small(&mut mag, POW10[CHUNK_LEN]));
        }
        if self.negative {
            f.write_str("-")?;
        }
        let mut iter = chunks.iter().rev();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for chunk in iter {
            write!(f, "{:09}", chunk)?;
        }
        Ok(())
    }
}

impl fmt::Debug for BigInt {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl AddAssign<&BigInt> for BigInt {
    #[inline]
    fn add_assign(&mut self, rhs: &BigInt) {
        self.add_ref(rhs);
    }
}

impl SubAssign<&BigInt> for BigInt {
    #[inline]
    fn sub_assign(&mut self, rhs: &BigInt) {
        self.sub_ref(rhs);
    }
}

impl MulAssign<&BigInt> for BigInt {
    #[inline]
    fn mul_assign(&mut self, rhs: &BigInt) {
        self.mul_ref(rhs);
    }
}

impl DivAssign<&BigInt> for BigInt {
    #[inline]
    fn div_assign(&mut self, rhs: &BigInt) {
        *self = self.div_rem(rhs).0;
    }
}

impl RemAssign<&BigInt> for BigInt {
    #[inline]
    fn rem_assign(&mut self, rhs: &BigInt) {
        *self = self.div_rem(rhs).1;
    }
}

impl BitAndAssign<&BigInt> for BigInt {
    #[inline]
    fn bitand_assign(&mut self, rhs: &BigInt) {
        self.bitwise_assign(rhs, |a, b| a & b);
    }
}

impl BitOrAssign<&BigInt> for BigInt {
    #[inline]
    fn bitor_assign(&mut self, rhs: &BigInt) {
        self.bitwise_assign(rhs, |a, b| a | b);
    }
}

impl BitXorAssign<&BigInt> for BigInt {
    #[inline]
    fn bitxor_assign(&mut self, rhs: &BigInt) {
        self.bitwise_assign(rhs, |a, b| a ^ b);
    }
}

impl ShlAssign<u32> for BigInt {
    /// Left shift of the two's-complement bit pattern: whole digits are
    /// prepended, the fractional part is a small multiply.
    fn shl_assign(&mut self, rhs: u32) {
        let whole = (rhs / 32) as usize;
        if whole > 0 && !self.digits.is_empty() {
            let mut shifted = alloc::vec![0u32; whole];
            shifted.append(&mut self.digits);
            self.digits = shifted;
        }
        mul_small(&mut self.digits, 1 << (rhs % 32));
        self.trim();
    }
}

impl ShrAssign<u32> for BigInt {
    /// Arithmetic right shift: rounds toward negative infinity, so the
    /// magnitude of a negative number gains one after the digit divide.
    fn shr_assign(&mut self, rhs: u32) {
        let whole = (rhs / 32) as usize;
        if whole > self.digits.len() {
            self.digits.clear();
            self.negative = false;
            return;
        }
        self.digits.drain(..whole);
        div_small(&mut self.digits, 1 << (rhs % 32));
        self.trim();
        if self.negative {
            add_small(&mut self.digits, 1);
        }
    }
}

macro_rules! forward_binop {
    ($imp:ident, $method:ident, $assign:ident, $assign_method:ident) => {
        impl $assign for BigInt {
            #[inline]
            fn $assign_method(&mut self, rhs: BigInt) {
                $assign::$assign_method(self, &rhs);
            }
        }

        impl $imp<&BigInt> for BigInt {
            type Output = BigInt;
            #[inline]
            fn $method(mut self, rhs: &BigInt) -> BigInt {
                $assign::$assign_method(&mut self, rhs);
                self
            }
        }

        impl $imp for BigInt {
            type Output = BigInt;
            #[inline]
            fn $method(mut self, rhs: BigInt) -> BigInt {
                $assign::$assign_method(&mut self, &rhs);
                self
            }
        }

        impl $imp<&BigInt> for &BigInt {
            type Output = BigInt;
            #[inline]
            fn $method(self, rhs: &BigInt) -> BigInt {
                let mut lhs = self.clone();
                $assign::$assign_method(&mut lhs, rhs);
                lhs
            }
        }

        impl $imp<BigInt> for &BigInt {
            type Output = BigInt;
            #[inline]
            fn $method(self, rhs: BigInt) -> BigInt {
                let mut lhs = self.clone();
                $assign::$assign_method(&mut lhs, &rhs);
                lhs
            }
        }
    };
}

forward_binop!(Add, add, AddAssign, add_assign);
forward_binop!(Sub, sub, SubAssign, sub_assign);
forward_binop!(Mul, mul, MulAssign, mul_assign);
forward_binop!(Div, div, DivAssign, div_assign);
forward_binop!(Rem, rem, RemAssign, rem_assign);
forward_binop!(BitAnd, bitand, BitAndAssign, bitand_assign);
forward_binop!(BitOr, bitor, BitOrAssign, bitor_assign);
forward_binop!(BitXor, bitxor, BitXorAssign, bitxor_assign);

impl Shl<u32> for BigInt {
    type Output = BigInt;
    #[inline]
    fn shl(mut self, rhs: u32) -> BigInt {
        self <<= rhs;
        self
    }
}

impl Shl<u32> for &BigInt {
    type Output = BigInt;
    #[inline]
    fn shl(self, rhs: u32) -> BigInt {
        self.clone() << rhs
    }
}

impl Shr<u32> for BigInt {
    type Output = BigInt;
    #[inline]
    fn shr(mut self, rhs: u32) -> BigInt {
        self >>= rhs;
        self
    }
}

impl Shr<u32> for &BigInt {
    type Output = BigInt;
    #[inline]
    fn shr(self, rhs: u32) -> BigInt {
        self.clone() >> rhs
    }
}

impl Neg for BigInt {
    type Output = BigInt;
    #[inline]
    fn neg(mut self) -> BigInt {
        self.negate();
        self
    }
}

impl Neg for &BigInt {
    type Output = BigInt;
    #[inline]
    fn neg(self) -> BigInt {
        -self.clone()
    }
}

impl Not for BigInt {
    type Output = BigInt;

    /// Two's-complement negation minus one: `!a == -a - 1`.
    fn not(mut self) -> BigInt {
        self.negate();
        self.decrement();
        self
    }
}

impl Not for &BigInt {
    type Output = BigInt;
    #[inline]
    fn not(self) -> BigInt {
        !self.clone()
    }
}
