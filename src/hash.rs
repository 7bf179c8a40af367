//! Poseidon hashing, natively and in-circuit.
//!
//! Both sides use one parameter set and one absorb schedule:
//!
//! ```text
//! absorb(len as F) ; absorb(x_0) ; … ; absorb(x_{len-1}) ; squeeze 1
//! ```
//!
//! The length prefix keeps inputs of different lengths from colliding.
//! Parameters: rate 2, capacity 1, α = 5, 8 full and 57 partial rounds, round
//! constants and MDS matrix from the Grain LFSR.

#![forbid(unsafe_code)]

use std::sync::OnceLock;

use ark_crypto_primitives::sponge::{
    constraints::CryptographicSpongeVar,
    poseidon::{constraints::PoseidonSpongeVar, find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use ark_ff::PrimeField;
use ark_r1cs_std::fields::{fp::FpVar, FieldVar};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::F;

const RATE: usize = 2;
const CAPACITY: usize = 1;
const ALPHA: u64 = 5;
const FULL_ROUNDS: usize = 8;
const PARTIAL_ROUNDS: usize = 57;

/// Shared Poseidon parameters (derived once).
pub fn poseidon_config() -> &'static PoseidonConfig<F> {
    static CONFIG: OnceLock<PoseidonConfig<F>> = OnceLock::new();
    CONFIG.get_or_init(|| {
        let (ark, mds) = find_poseidon_ark_and_mds::<F>(
            F::MODULUS_BIT_SIZE as u64,
            RATE,
            FULL_ROUNDS as u64,
            PARTIAL_ROUNDS as u64,
            0,
        );
        PoseidonConfig::new(FULL_ROUNDS, PARTIAL_ROUNDS, ALPHA, mds, ark, RATE, CAPACITY)
    })
}

/// Hash a sequence of field elements.
pub fn hash_fields(inputs: &[F]) -> F {
    let mut sponge = PoseidonSponge::<F>::new(poseidon_config());
    sponge.absorb(&F::from(inputs.len() as u64));
    for x in inputs {
        sponge.absorb(x);
    }
    sponge.squeeze_field_elements::<F>(1)[0]
}

/// In-circuit twin of [`hash_fields`].
pub fn hash_fields_var(
    cs: ConstraintSystemRef<F>,
    inputs: &[FpVar<F>],
) -> Result<FpVar<F>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::<F>::new(cs, poseidon_config());
    sponge.absorb(&FpVar::constant(F::from(inputs.len() as u64)))?;
    for x in inputs {
        sponge.absorb(x)?;
    }
    let mut out = sponge.squeeze_field_elements(1)?;
    out.pop().ok_or(SynthesisError::Unsatisfiable)
}
