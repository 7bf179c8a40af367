//! Crate root: public surface, core aliases, and protocol-wide invariants
//!
//! `photoproof` is a proof-carrying-data chain for image provenance. A camera
//! signs a capture; every later edit (identity or rectangular crop) is proved
//! in zero knowledge to be a permissible transformation of a signed image,
//! without revealing the pixels.
//!
//! ```text
//! Image ─► generate_chain ─► keys
//!   │
//!   └► sign_capture ─► Proof::Signature ─► Prover(Identity) ─► Proof::Circuit
//!                                            ─► Prover(Crop) ─► … ─► verify
//! ```
//!
//! ## Invariants
//!
//! - **Field & curve.** The scalar field is `ark_bn254::Fr` (`F` in this
//!   crate) and proofs are Groth16 over BN254. Plain signatures are Schnorr on
//!   `ark-ed-on-bn254`, whose base field is `F`, so keys and signatures are
//!   native circuit values. We **forbid unsafe** throughout the crate.
//!
//! - **Fixed grid.** Images are `N × N` (`N = 16`) RGB grids plus metadata.
//!   Circuits traverse the full grid unconditionally; nothing is resized.
//!
//! - **Canonical encoding.** An image has one byte encoding and one field
//!   encoding (its *message*); the signature signs the Poseidon digest of the
//!   message, natively and in-circuit.
//!
//! - **Public statement.** Every circuit proof exposes exactly
//!   `[A.x, A.y, R.x, R.y, s, output_digest]`; pixels are always private.
//!
//! - **Explicit keys.** Key material is passed into every prover and verifier
//!   call. There is no global state beyond derived hash parameters, so
//!   independent chains run concurrently.
//!
//! Every failure is a typed error ([`PcdError`] and the per-module enums);
//! verification failures are negative results ([`VerifyFailure`]), not faults.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

/// Poseidon hashing (native and gadget).
pub mod hash;
/// Fixed-size RGB image, metadata and canonical encoding.
pub mod image;
/// Transformation descriptors and parameter validation.
pub mod transformation;
/// Area-membership predicate and bounded comparisons.
pub mod area;
/// Schnorr signatures (native and gadget).
pub mod signature;
/// Identity and Crop compliance circuits.
pub mod compliance;
/// Groth16 compile/setup/prove/verify layer.
pub mod backend;
/// One-time key generation per compliance class.
pub mod generator;
/// Inductive proof step and the proof state machine.
pub mod prover;
/// Proof verification.
pub mod verifier;
/// Capturing device and editor helpers.
pub mod camera;
/// Runtime configuration.
pub mod config;

// ============================================================================
// Canonical aliases and root-level re-exports
// ============================================================================

/// Scalar field used across the crate.
pub type F = ark_bn254::Fr;

/// Pairing engine for Groth16.
pub type Curve = ark_bn254::Bn254;

/// Side length of the pixel grid.
pub const N: usize = 16;

pub use backend::{CompileError, ProveError, PublicWitness, SetupError};
pub use camera::{edit_crop, SecureCamera};
pub use compliance::WitnessError;
pub use config::{PcdConfig, PcdConfigBuilder};
pub use generator::{generate, generate_chain, GeneratedKeys, PcdProvingKeys, PcdVerifyingKeys};
pub use image::{Image, ImageError, RgbPixel};
pub use prover::{sign_capture, CircuitProof, Proof, Prover, SignatureProof};
pub use signature::{PublicKey, Signature, SignerSecret};
pub use transformation::{ComplianceClass, CropParams, ParamError, Transformation};
pub use verifier::{verify, verify_detailed, VerifyFailure};

/// Any failure of a generator or prover call.
#[derive(Debug, thiserror::Error)]
pub enum PcdError {
    /// Invalid transformation parameters.
    #[error(transparent)]
    Param(#[from] ParamError),
    /// Image encoding failed.
    #[error(transparent)]
    Image(#[from] ImageError),
    /// Witness inconsistent with the circuit.
    #[error(transparent)]
    Witness(#[from] WitnessError),
    /// Circuit compilation failed.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// Key generation failed.
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// Proving failed.
    #[error(transparent)]
    Prove(#[from] ProveError),
    /// The proof handed to the prover did not verify.
    #[error("incoming proof rejected: {0}")]
    Rejected(#[from] VerifyFailure),
}

/// Shared fixtures. Groth16 setup is the slow part, so the chain keys are
/// derived once per test binary.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::OnceLock;

    use rand::{rngs::StdRng, SeedableRng};

    use crate::{generate_chain, Image, PcdProvingKeys, PcdVerifyingKeys, SignerSecret};

    type Chain = (PcdProvingKeys, PcdVerifyingKeys, SignerSecret);

    pub(crate) fn chain() -> &'static Chain {
        static CHAIN: OnceLock<Chain> = OnceLock::new();
        CHAIN.get_or_init(|| {
            let mut rng = StdRng::seed_from_u64(0x7068_6f74_6f);
            generate_chain(&Image::all_white(), &mut rng).expect("chain setup")
        })
    }
}
