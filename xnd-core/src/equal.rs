//! Equality : `strict_equal` distinguishes NaN payloads and
//! +0.0/-0.0 the way `==` on the underlying bit pattern would; `equal` is
//! the "numerically sensible" variant where NaN never equals anything
//! (including itself) and +0.0 == -0.0, matching ordinary float comparison.

use crate::error::Result;
use crate::value::HostValue;
use crate::view::View;

impl View {
    pub fn equal(&self, other: &View) -> Result<bool> {
        Ok(values_equal(&self.to_host_value()?, &other.to_host_value()?, false))
    }

    pub fn strict_equal(&self, other: &View) -> Result<bool> {
        Ok(values_equal(&self.to_host_value()?, &other.to_host_value()?, true))
    }
}

fn values_equal(a: &HostValue, b: &HostValue, strict: bool) -> bool {
    use HostValue::*;
    match (a, b) {
        (Missing, Missing) => true,
        (Bool(x), Bool(y)) => x == y,
        (Int(x), Int(y)) => x == y,
        (Float(x), Float(y)) => float_eq(*x, *y, strict),
        (Complex(xr, xi), Complex(yr, yi)) => float_eq(*xr, *yr, strict) && float_eq(*xi, *yi, strict),
        (Str(x), Str(y)) => x == y,
        (Bytes(x), Bytes(y)) => x == y,
        (List(x), Tuple(y)) | (Tuple(x), List(y)) => {
            // Only used internally; list/tuple mismatch is a type error in
            // practice, handled earlier by the caller's static types.
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b, strict))
        }
        (List(x), List(y)) | (Tuple(x), Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b, strict))
        }
        (Record(x), Record(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.iter().any(|(k2, v2)| k == k2 && values_equal(v, v2, strict)))
        }
        _ => false,
    }
}

fn float_eq(x: f64, y: f64, strict: bool) -> bool {
    if strict {
        x.to_bits() == y.to_bits()
    } else if x.is_nan() || y.is_nan() {
        false
    } else {
        x == y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_equal_distinguishes_nan_payloads_and_signed_zero() {
        assert!(!float_eq(0.0, -0.0, true));
        assert!(float_eq(0.0, -0.0, false));
        assert!(float_eq(f64::NAN, f64::NAN, true));
        assert!(!float_eq(f64::NAN, f64::NAN, false));
    }
}
