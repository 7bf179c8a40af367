//! Area-membership predicate and the bounded comparison it is built from.
//!
//! Circuits have no control flow, so "is `(x, y)` inside rectangle `R`" has to
//! be a boolean *signal* computed for every grid point unconditionally. The
//! predicate is four `≤` comparisons joined with boolean AND; all four sides
//! are inclusive, so a single-pixel rectangle matches exactly one point.
//!
//! ## Comparison
//! Coordinates are small signed integers, `|v| < 2^COORD_BITS`. For such `a`
//! and `b` the shifted difference
//!
//! ```text
//! d = b − a + 2^(COORD_BITS+1)        ∈ [1, 2^(COORD_BITS+2))
//! ```
//!
//! is decomposed into `COORD_BITS + 2` witness bits; bit `COORD_BITS + 1` is
//! set iff `a ≤ b`. Inputs outside the range make the decomposition
//! unsatisfiable, so callers range-check untrusted coordinates first with
//! [`enforce_coordinate`].

#![forbid(unsafe_code)]

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{
    alloc::AllocVar,
    boolean::Boolean,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
    R1CSVar,
};
use ark_relations::r1cs::SynthesisError;

use crate::F;

/// Bit width of an unsigned coordinate; signed values stay below `2^COORD_BITS`
/// in magnitude.
pub const COORD_BITS: usize = 8;

/// A point in circuit space.
#[derive(Clone, Debug)]
pub struct Location {
    /// Column.
    pub x: FpVar<F>,
    /// Row.
    pub y: FpVar<F>,
}

impl Location {
    /// Point from two variables.
    pub fn new(x: FpVar<F>, y: FpVar<F>) -> Self {
        Self { x, y }
    }

    /// Point with constant coordinates.
    pub fn constant(x: u64, y: u64) -> Self {
        Self { x: FpVar::constant(F::from(x)), y: FpVar::constant(F::from(y)) }
    }
}

/// Inclusive rectangle `top_left ..= bottom_right`.
#[derive(Clone, Debug)]
pub struct SquareArea {
    /// `(x0, y0)`.
    pub top_left: Location,
    /// `(x1, y1)`.
    pub bottom_right: Location,
}

impl SquareArea {
    /// Rectangle from its two corners.
    pub fn new(top_left: Location, bottom_right: Location) -> Self {
        Self { top_left, bottom_right }
    }
}

/// Interpret a (small) field element as a signed integer.
fn small_signed(v: F) -> i64 {
    let big = v.into_bigint();
    if big.num_bits() <= 63 {
        big.as_ref()[0] as i64
    } else {
        -((-v).into_bigint().as_ref()[0] as i64)
    }
}

/// Little-endian decomposition of `v` into `n_bits` boolean witnesses,
/// enforcing that they recompose to `v`.
fn decompose(v: &FpVar<F>, n_bits: usize) -> Result<Vec<Boolean<F>>, SynthesisError> {
    let cs = v.cs();
    let bits = (0..n_bits)
        .map(|i| Boolean::new_witness(cs.clone(), || Ok(v.value()?.into_bigint().get_bit(i))))
        .collect::<Result<Vec<_>, _>>()?;
    Boolean::le_bits_to_fp_var(&bits)?.enforce_equal(v)?;
    Ok(bits)
}

/// Enforce `0 ≤ v < 2^COORD_BITS`.
pub fn enforce_coordinate(v: &FpVar<F>) -> Result<(), SynthesisError> {
    if let FpVar::Constant(c) = v {
        return if c.into_bigint().num_bits() as usize <= COORD_BITS {
            Ok(())
        } else {
            Err(SynthesisError::Unsatisfiable)
        };
    }
    decompose(v, COORD_BITS).map(|_| ())
}

/// `a ≤ b` for small signed coordinates.
pub fn is_le(a: &FpVar<F>, b: &FpVar<F>) -> Result<Boolean<F>, SynthesisError> {
    if let (FpVar::Constant(a), FpVar::Constant(b)) = (a, b) {
        return Ok(Boolean::constant(small_signed(*a) <= small_signed(*b)));
    }
    let offset = FpVar::constant(F::from(1u64 << (COORD_BITS + 1)));
    let d = b - a + offset;
    let mut bits = decompose(&d, COORD_BITS + 2)?;
    bits.pop().ok_or(SynthesisError::Unsatisfiable)
}

/// True iff `top_left.x ≤ x ≤ bottom_right.x` and `top_left.y ≤ y ≤ bottom_right.y`.
pub fn in_area(x: &FpVar<F>, y: &FpVar<F>, area: &SquareArea) -> Result<Boolean<F>, SynthesisError> {
    let in_x = is_le(&area.top_left.x, x)?.and(&is_le(x, &area.bottom_right.x)?)?;
    let in_y = is_le(&area.top_left.y, y)?.and(&is_le(y, &area.bottom_right.y)?)?;
    in_x.and(&in_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};

    fn witness(cs: &ConstraintSystemRef<F>, v: i64) -> FpVar<F> {
        let f = if v < 0 { -F::from((-v) as u64) } else { F::from(v as u64) };
        FpVar::new_witness(cs.clone(), || Ok(f)).unwrap()
    }

    fn rect(cs: &ConstraintSystemRef<F>, x0: i64, y0: i64, x1: i64, y1: i64) -> SquareArea {
        SquareArea::new(
            Location::new(witness(cs, x0), witness(cs, y0)),
            Location::new(witness(cs, x1), witness(cs, y1)),
        )
    }

    fn member(x: i64, y: i64, r: (i64, i64, i64, i64)) -> bool {
        let cs = ConstraintSystem::<F>::new_ref();
        let area = rect(&cs, r.0, r.1, r.2, r.3);
        let out = in_area(&witness(&cs, x), &witness(&cs, y), &area).unwrap();
        assert!(cs.is_satisfied().unwrap());
        out.value().unwrap()
    }

    #[test]
    fn rectangle_membership_is_inclusive() {
        let r = (2, 2, 5, 5);
        assert!(member(3, 3, r));
        assert!(member(2, 2, r));
        assert!(member(5, 5, r));
        assert!(member(2, 5, r));
        assert!(!member(1, 1, r));
        assert!(!member(6, 6, r));
        assert!(!member(3, 6, r));
        assert!(!member(6, 3, r));
    }

    #[test]
    fn single_pixel_rectangle_matches_one_point() {
        let r = (7, 4, 7, 4);
        let mut hits = 0;
        for y in 0..16 {
            for x in 0..16 {
                if member(x, y, r) {
                    hits += 1;
                    assert_eq!((x, y), (7, 4));
                }
            }
        }
        assert_eq!(hits, 1);
    }

    #[test]
    fn comparison_handles_negative_coordinates() {
        let cs = ConstraintSystem::<F>::new_ref();
        let zero = witness(&cs, 0);
        let neg = witness(&cs, -3);
        let big = witness(&cs, 15);
        assert!(!is_le(&zero, &neg).unwrap().value().unwrap());
        assert!(is_le(&neg, &zero).unwrap().value().unwrap());
        assert!(is_le(&neg, &big).unwrap().value().unwrap());
        assert!(is_le(&big, &big).unwrap().value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn constant_operands_fold() {
        let a = FpVar::constant(F::from(4u64));
        let b = FpVar::constant(F::from(9u64));
        assert_eq!(is_le(&a, &b).unwrap(), Boolean::TRUE);
        assert_eq!(is_le(&b, &a).unwrap(), Boolean::FALSE);
    }

    #[test]
    fn coordinate_range_check_rejects_large_values() {
        let cs = ConstraintSystem::<F>::new_ref();
        let ok = witness(&cs, 255);
        enforce_coordinate(&ok).unwrap();
        assert!(cs.is_satisfied().unwrap());

        let cs = ConstraintSystem::<F>::new_ref();
        let bad = witness(&cs, 256);
        enforce_coordinate(&bad).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
