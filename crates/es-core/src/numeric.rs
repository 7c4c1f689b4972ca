use crate::EsError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    /// Looser tolerance for values coming back from an interior-point solver.
    pub fn solver() -> Self {
        Self {
            abs: 1e-5,
            rel: 1e-5,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, EsError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EsError::NonFinite { what, value: v })
    }
}

/// Finite and `>= 0`.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, EsError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(EsError::Negative { what, value: v });
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_non_negative_rejects_negative() {
        assert!(ensure_non_negative(0.0, "zero").is_ok());
        assert!(matches!(
            ensure_non_negative(-1.0, "neg"),
            Err(EsError::Negative { .. })
        ));
        assert!(matches!(
            ensure_non_negative(Real::INFINITY, "inf"),
            Err(EsError::NonFinite { .. })
        ));
    }

    proptest! {
        #[test]
        fn nearly_equal_is_symmetric(a in -1e9f64..1e9, b in -1e9f64..1e9) {
            let tol = Tolerances::solver();
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
        }

        #[test]
        fn nearly_equal_is_reflexive(a in -1e12f64..1e12) {
            prop_assert!(nearly_equal(a, a, Tolerances::default()));
        }
    }
}
