//! Verifier: accept or reject a proof-so-far.
//!
//! Dispatches on the proof state:
//!
//! - **Signature**: the signer must be the device key and the signature must
//!   verify over the image's message.
//! - **Circuit**, in order:
//!   1. the public witness decodes to a well-formed statement;
//!   2. its `output_digest` is the digest of the carried image;
//!   3. the carried (key, signature) pair verifies over the carried image;
//!   4. Identity proofs must commit to, and carry, the device key;
//!   5. Groth16 verification under the verifying key of the proof's class.
//!
//! [`verify`] collapses the outcome to a bool and logs the failure point;
//! [`verify_detailed`] returns it.
//!
//! ## Limitation
//! Verification is a single Groth16 check plus a signature check, so a crop
//! proof only attests to its own step. Nothing links a crop statement's
//! public key to the device key: anyone holding the crop proving key can sign
//! an arbitrary image with their own key and obtain an accepted crop proof.
//! Only base-case signatures and Identity proofs are pinned to
//! [`PcdVerifyingKeys::device_key`].

#![forbid(unsafe_code)]

use tracing::{info, warn};

use crate::{
    backend,
    compliance::PublicStatement,
    generator::PcdVerifyingKeys,
    prover::{CircuitProof, Proof, SignatureProof},
    transformation::ComplianceClass,
};

/// Why a proof was rejected. A negative outcome, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyFailure {
    /// A signature does not verify over the carried image.
    #[error("signature invalid")]
    SignatureInvalid,
    /// Groth16 verification returned false.
    #[error("{class} proof invalid")]
    ProofInvalid {
        /// Class whose verifying key was used.
        class: ComplianceClass,
    },
    /// The statement's output digest is not the carried image's digest.
    #[error("proof does not attest to the carried image")]
    ImageMismatch,
    /// A key that must be the device key is not.
    #[error("signer is not the trusted device key")]
    UntrustedKey,
    /// The public witness or image could not be decoded.
    #[error("malformed proof: {0}")]
    Malformed(String),
    /// The Groth16 verifier itself failed.
    #[error("backend error during verification: {0}")]
    Backend(String),
}

fn verify_signature(keys: &PcdVerifyingKeys, p: &SignatureProof) -> Result<(), VerifyFailure> {
    if p.public_key != keys.device_key {
        return Err(VerifyFailure::UntrustedKey);
    }
    let message = p.image.message().map_err(|e| VerifyFailure::Malformed(e.to_string()))?;
    if !p.public_key.verify(&message, &p.signature) {
        return Err(VerifyFailure::SignatureInvalid);
    }
    Ok(())
}

/// Full check of an inductive proof.
pub fn verify_circuit(keys: &PcdVerifyingKeys, p: &CircuitProof) -> Result<(), VerifyFailure> {
    let statement = PublicStatement::from_public_inputs(&p.public_witness.0)
        .map_err(|e| VerifyFailure::Malformed(e.to_string()))?;

    let message = p.image.message().map_err(|e| VerifyFailure::Malformed(e.to_string()))?;
    if statement.output_digest != crate::hash::hash_fields(&message) {
        return Err(VerifyFailure::ImageMismatch);
    }
    if !p.public_key.verify(&message, &p.signature) {
        return Err(VerifyFailure::SignatureInvalid);
    }
    if p.class == ComplianceClass::Identity
        && (statement.public_key != keys.device_key || p.public_key != keys.device_key)
    {
        return Err(VerifyFailure::UntrustedKey);
    }

    let vk = keys.for_class(p.class);
    match backend::verify_proof(vk.groth16(), &p.public_witness, &p.proof) {
        Ok(true) => Ok(()),
        Ok(false) => Err(VerifyFailure::ProofInvalid { class: p.class }),
        Err(e) => Err(VerifyFailure::Backend(e.to_string())),
    }
}

/// Verify and report the failure point.
pub fn verify_detailed(keys: &PcdVerifyingKeys, proof: &Proof) -> Result<(), VerifyFailure> {
    match proof {
        Proof::Signature(p) => verify_signature(keys, p),
        Proof::Circuit(p) => verify_circuit(keys, p),
    }
}

/// `true` iff the proof verifies; failures are logged at `warn`.
pub fn verify(keys: &PcdVerifyingKeys, proof: &Proof) -> bool {
    let kind = proof.class().map_or("signature", |c| c.as_str());
    match verify_detailed(keys, proof) {
        Ok(()) => {
            info!("verified {} proof", kind);
            true
        }
        Err(failure) => {
            warn!("rejected {} proof: {}", kind, failure);
            false
        }
    }
}
