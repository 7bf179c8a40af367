//! Schnorr signatures over `ark-ed-on-bn254`, natively and in-circuit.
//!
//! The curve's base field is the proof system's scalar field `F`, so public
//! keys and nonces are two native field elements each inside the circuit.
//!
//! ```text
//! sign(sk, m):   k = H_nonce(sk, digest(m)),  R = k·G
//!                e = Poseidon(R.x, R.y, A.x, A.y, digest(m))
//!                s = k + e·sk   (mod r)
//! verify:        [8]·(s·G) == [8]·(R + e·A)
//! ```
//!
//! The nonce is derived with BLAKE3 from the secret and the digest, so signing
//! needs no RNG and the same message always yields the same signature.
//! Verification is cofactored on both sides; natively it also rejects points
//! off the curve or outside the prime-order subgroup, and the gadget enforces
//! the curve equation for both public points.

#![forbid(unsafe_code)]

use std::fmt;

use ark_ec::{twisted_edwards::TECurveConfig, AffineRepr, CurveGroup, Group};
use ark_ed_on_bn254::{constraints::EdwardsVar, EdwardsAffine, EdwardsConfig, EdwardsProjective, Fr as EdFr};
use ark_ff::{BigInteger, PrimeField, UniformRand, Zero};
use ark_r1cs_std::{
    alloc::AllocVar, eq::EqGadget, fields::fp::FpVar, fields::FieldVar, groups::CurveVar, ToBitsGadget,
};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use rand::{CryptoRng, RngCore};

use crate::{hash, F};

const NONCE_DST: &str = "photoproof.schnorr.nonce.v1";

/// Secret signing key. Never serialized; `Debug` redacts it.
#[derive(Clone)]
pub struct SignerSecret {
    scalar: EdFr,
}

impl fmt::Debug for SignerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerSecret").field("public_key", &self.public_key()).finish()
    }
}

/// Public verification key `A = sk·G`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(pub EdwardsAffine);

/// Signature `(R, s)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Nonce commitment `R = k·G`.
    pub r: EdwardsAffine,
    /// Response `s = k + e·sk`.
    pub s: EdFr,
}

/// Reduce a base-field element to a curve scalar.
fn to_scalar(e: F) -> EdFr {
    EdFr::from_le_bytes_mod_order(&e.into_bigint().to_bytes_le())
}

/// Embed a curve scalar into the base field (`r < p`, so this is exact).
pub(crate) fn scalar_to_field(s: EdFr) -> F {
    F::from_le_bytes_mod_order(&s.into_bigint().to_bytes_le())
}

fn challenge(r: &EdwardsAffine, pk: &EdwardsAffine, digest: F) -> F {
    hash::hash_fields(&[r.x, r.y, pk.x, pk.y, digest])
}

impl SignerSecret {
    /// Fresh keypair.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let scalar = EdFr::rand(rng);
            if !scalar.is_zero() {
                return Self { scalar };
            }
        }
    }

    /// `sk·G`.
    pub fn public_key(&self) -> PublicKey {
        PublicKey((EdwardsProjective::generator() * self.scalar).into_affine())
    }

    /// Sign a field-encoded message.
    pub fn sign(&self, message: &[F]) -> Signature {
        self.sign_digest(hash::hash_fields(message))
    }

    pub(crate) fn sign_digest(&self, digest: F) -> Signature {
        let mut h = blake3::Hasher::new_derive_key(NONCE_DST);
        h.update(&self.scalar.into_bigint().to_bytes_le());
        h.update(&digest.into_bigint().to_bytes_le());
        let mut wide = [0u8; 64];
        h.finalize_xof().fill(&mut wide);
        let k = EdFr::from_le_bytes_mod_order(&wide);

        let r = (EdwardsProjective::generator() * k).into_affine();
        let e = challenge(&r, &self.public_key().0, digest);
        Signature { r, s: k + to_scalar(e) * self.scalar }
    }
}

fn well_formed(p: &EdwardsAffine) -> bool {
    p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve()
}

impl PublicKey {
    /// Verify `signature` over a field-encoded message.
    pub fn verify(&self, message: &[F], signature: &Signature) -> bool {
        self.verify_digest(hash::hash_fields(message), signature)
    }

    pub(crate) fn verify_digest(&self, digest: F, signature: &Signature) -> bool {
        if !well_formed(&self.0) || !well_formed(&signature.r) {
            return false;
        }
        let e = challenge(&signature.r, &self.0, digest);
        let lhs = EdwardsProjective::generator().mul_bigint(signature.s.into_bigint());
        let rhs = signature.r.into_group() + self.0.into_group().mul_bigint(e.into_bigint());
        let mut diff = lhs - rhs;
        for _ in 0..3 {
            diff.double_in_place();
        }
        diff.is_zero()
    }

    /// `(x, y)` as public-input field elements.
    pub fn to_field_elements(&self) -> [F; 2] {
        [self.0.x, self.0.y]
    }

    /// Rebuild from coordinates; `None` unless the point is a valid key.
    pub fn from_coordinates(x: F, y: F) -> Option<Self> {
        let p = EdwardsAffine::new_unchecked(x, y);
        well_formed(&p).then_some(PublicKey(p))
    }
}

impl Signature {
    /// `(R.x, R.y, s)` as public-input field elements.
    pub fn to_field_elements(&self) -> [F; 3] {
        [self.r.x, self.r.y, scalar_to_field(self.s)]
    }
}

// ----------------------------------------------------------------------------
// Gadget
// ----------------------------------------------------------------------------

/// Allocate a curve point from public coordinates, enforcing the curve
/// equation `a·x² + y² = 1 + d·x²·y²`.
fn point_input(cs: ConstraintSystemRef<F>, p: &EdwardsAffine) -> Result<EdwardsVar, SynthesisError> {
    let (px, py) = (p.x, p.y);
    let x = FpVar::new_input(cs.clone(), || Ok(px))?;
    let y = FpVar::new_input(cs, || Ok(py))?;
    let x2 = x.square()?;
    let y2 = y.square()?;
    let a = FpVar::constant(EdwardsConfig::COEFF_A);
    let d = FpVar::constant(EdwardsConfig::COEFF_D);
    let lhs = &a * &x2 + &y2;
    let rhs = FpVar::one() + &d * &x2 * &y2;
    lhs.enforce_equal(&rhs)?;
    Ok(EdwardsVar::new(x, y))
}

/// Public key as a circuit input.
#[derive(Clone)]
pub struct PublicKeyVar(pub EdwardsVar);

impl PublicKeyVar {
    /// Allocate `(A.x, A.y)` as public inputs.
    pub fn new_input(cs: ConstraintSystemRef<F>, pk: &PublicKey) -> Result<Self, SynthesisError> {
        Ok(Self(point_input(cs, &pk.0)?))
    }
}

/// Signature as circuit inputs (`R.x`, `R.y`, `s`).
#[derive(Clone)]
pub struct SignatureVar {
    /// Nonce commitment.
    pub r: EdwardsVar,
    /// Response, embedded in `F`.
    pub s: FpVar<F>,
}

impl SignatureVar {
    /// Allocate `(R.x, R.y, s)` as public inputs.
    pub fn new_input(cs: ConstraintSystemRef<F>, sig: &Signature) -> Result<Self, SynthesisError> {
        let r = point_input(cs.clone(), &sig.r)?;
        let s_val = scalar_to_field(sig.s);
        let s = FpVar::new_input(cs, || Ok(s_val))?;
        Ok(Self { r, s })
    }
}

/// Enforce that `sig` is a valid signature over `digest` under `pk`.
pub fn enforce_signature(
    cs: ConstraintSystemRef<F>,
    pk: &PublicKeyVar,
    sig: &SignatureVar,
    digest: &FpVar<F>,
) -> Result<(), SynthesisError> {
    let e = hash::hash_fields_var(
        cs,
        &[sig.r.x.clone(), sig.r.y.clone(), pk.0.x.clone(), pk.0.y.clone(), digest.clone()],
    )?;

    let g = EdwardsVar::constant(EdwardsProjective::generator());
    let s_bits = sig.s.to_bits_le()?;
    let lhs = g.scalar_mul_le(s_bits.iter())?;

    let e_bits = e.to_bits_le()?;
    let rhs = sig.r.clone() + pk.0.scalar_mul_le(e_bits.iter())?;

    let lhs8 = lhs.double()?.double()?.double()?;
    let rhs8 = rhs.double()?.double()?.double()?;
    lhs8.enforce_equal(&rhs8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;
    use rand::{rngs::StdRng, SeedableRng};

    fn message(seed: u64) -> Vec<F> {
        (0..5).map(|i| F::from(seed * 10 + i)).collect()
    }

    #[test]
    fn sign_then_verify() {
        let mut rng = StdRng::seed_from_u64(1);
        let sk = SignerSecret::generate(&mut rng);
        let pk = sk.public_key();
        let sig = sk.sign(&message(1));
        assert!(pk.verify(&message(1), &sig));
        assert!(!pk.verify(&message(2), &sig));
    }

    #[test]
    fn signing_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(2);
        let sk = SignerSecret::generate(&mut rng);
        assert_eq!(sk.sign(&message(3)), sk.sign(&message(3)));
        assert_ne!(sk.sign(&message(3)), sk.sign(&message(4)));
    }

    #[test]
    fn rejects_foreign_key_and_tampered_scalar() {
        let mut rng = StdRng::seed_from_u64(3);
        let sk = SignerSecret::generate(&mut rng);
        let other = SignerSecret::generate(&mut rng).public_key();
        let mut sig = sk.sign(&message(5));
        assert!(!other.verify(&message(5), &sig));
        sig.s += EdFr::from(1u64);
        assert!(!sk.public_key().verify(&message(5), &sig));
    }

    #[test]
    fn key_coordinates_roundtrip_and_reject_garbage() {
        let mut rng = StdRng::seed_from_u64(4);
        let pk = SignerSecret::generate(&mut rng).public_key();
        let [x, y] = pk.to_field_elements();
        assert_eq!(PublicKey::from_coordinates(x, y), Some(pk));
        assert_eq!(PublicKey::from_coordinates(x + F::from(1u64), y), None);
    }

    fn gadget_accepts(pk: &PublicKey, sig: &Signature, digest: F) -> bool {
        let cs = ConstraintSystem::<F>::new_ref();
        let pk_var = PublicKeyVar::new_input(cs.clone(), pk).unwrap();
        let sig_var = SignatureVar::new_input(cs.clone(), sig).unwrap();
        let d = FpVar::new_witness(cs.clone(), || Ok(digest)).unwrap();
        enforce_signature(cs.clone(), &pk_var, &sig_var, &d).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn gadget_agrees_with_native_verifier() {
        let mut rng = StdRng::seed_from_u64(5);
        let sk = SignerSecret::generate(&mut rng);
        let pk = sk.public_key();
        let digest = hash::hash_fields(&message(6));
        let sig = sk.sign_digest(digest);

        assert!(pk.verify_digest(digest, &sig));
        assert!(gadget_accepts(&pk, &sig, digest));
        assert!(!gadget_accepts(&pk, &sig, digest + F::from(1u64)));

        let other = SignerSecret::generate(&mut rng).public_key();
        assert!(!gadget_accepts(&other, &sig, digest));
    }
}
