//! Prover: the inductive step of the chain.
//!
//! A [`Proof`] is in exactly one of two states:
//!
//! - [`Proof::Signature`] (*Unproven*): an image, its plain signature and the
//!   signer's public key, as produced at capture time.
//! - [`Proof::Circuit`] (*Proven*): a Groth16 proof with its public witness,
//!   the image it attests to, and a (public key, signature) pair over that
//!   image that the next step consumes.
//!
//! ## Transitions
//! ```text
//! Unproven --Identity--> Proven(identity proof, same image)
//! Unproven --Crop(p)---> Proven(identity) --Crop(p)--> Proven(crop proof)
//! Proven   --T--------->  verify incoming proof
//!                         image' = T(image)
//!                         crop proof: sig over image verifies ∧ image' = crop(image, p)
//!                         sign image' with a fresh ephemeral key
//! ```
//!
//! Identity applied to a Proven state is the crop to the image's current
//! extent, which leaves a chain image unchanged. Parameters are validated
//! before any circuit is built, and each transition depends only on its
//! inputs and the keys passed to [`Prover::new`].
//!
//! Proofs are not recursive: a crop proof shows that its output is a crop of
//! *some* image signed under the key in its statement, and the prover checks
//! the incoming proof before extending the chain. Whoever holds the crop
//! proving key can therefore start a crop chain from an image they signed
//! themselves; only Identity proofs and base-case signatures are tied to the
//! device key.

#![forbid(unsafe_code)]

use rand::{CryptoRng, RngCore};
use tracing::{debug, info};

use crate::{
    backend::{self, Groth16Proof, PublicWitness},
    compliance::{ComplianceCircuit, CropCircuit, IdentityCircuit},
    config::PcdConfig,
    generator::PcdProvingKeys,
    image::{Image, ImageError},
    signature::{PublicKey, Signature, SignerSecret},
    transformation::{ComplianceClass, CropParams, Transformation},
    verifier::{self, VerifyFailure},
    PcdError,
};

/// Base case: an image under a plain signature.
#[derive(Clone, Debug, PartialEq)]
pub struct SignatureProof {
    /// The captured image.
    pub image: Image,
    /// Device signature over the image's message.
    pub signature: Signature,
    /// Key of the signer.
    pub public_key: PublicKey,
}

/// Inductive case: a circuit proof over an image.
#[derive(Clone, Debug, PartialEq)]
pub struct CircuitProof {
    /// Circuit the proof was produced under.
    pub class: ComplianceClass,
    /// The Groth16 proof.
    pub proof: Groth16Proof,
    /// Public inputs the proof verifies against.
    pub public_witness: PublicWitness,
    /// Image the proof attests to.
    pub image: Image,
    /// Key the carried signature verifies under (the device key after the
    /// bootstrap, an ephemeral key after each crop).
    pub public_key: PublicKey,
    /// Signature over `image`, consumed by the next step.
    pub signature: Signature,
}

/// A proof-so-far.
#[derive(Clone, Debug, PartialEq)]
pub enum Proof {
    /// Unproven: a signed capture.
    Signature(SignatureProof),
    /// Proven: the output of at least one prover step.
    Circuit(CircuitProof),
}

impl Proof {
    /// Image the proof is about.
    pub fn image(&self) -> &Image {
        match self {
            Proof::Signature(p) => &p.image,
            Proof::Circuit(p) => &p.image,
        }
    }

    /// Class of the circuit proof, `None` for the base case.
    pub fn class(&self) -> Option<ComplianceClass> {
        match self {
            Proof::Signature(_) => None,
            Proof::Circuit(p) => Some(p.class),
        }
    }

    /// `true` for the inductive case.
    pub fn is_proven(&self) -> bool {
        matches!(self, Proof::Circuit(_))
    }
}

/// Sign a fresh capture, producing the Unproven state.
pub fn sign_capture(image: Image, signer: &SignerSecret) -> Result<Proof, ImageError> {
    let signature = signer.sign(&image.message()?);
    Ok(Proof::Signature(SignatureProof { image, signature, public_key: signer.public_key() }))
}

/// Applies transformations under a fixed set of chain keys.
#[derive(Clone, Debug)]
pub struct Prover<'k> {
    keys: &'k PcdProvingKeys,
    config: PcdConfig,
}

impl<'k> Prover<'k> {
    /// Prover with the default configuration.
    pub fn new(keys: &'k PcdProvingKeys) -> Self {
        Self::with_config(keys, PcdConfig::default())
    }

    /// Prover with an explicit configuration.
    pub fn with_config(keys: &'k PcdProvingKeys, config: PcdConfig) -> Self {
        Self { keys, config }
    }

    /// `applyTransformation(proof_so_far, transformation) → proof_next`.
    pub fn apply_transformation<R: RngCore + CryptoRng>(
        &self,
        proof: &Proof,
        transformation: &Transformation,
        rng: &mut R,
    ) -> Result<Proof, PcdError> {
        transformation.validate_for(proof.image())?;
        match proof {
            Proof::Signature(base) => {
                let proven = self.bootstrap(base, rng)?;
                match transformation {
                    Transformation::Identity => Ok(Proof::Circuit(proven)),
                    Transformation::Crop(_) => self.step(&proven, transformation, rng),
                }
            }
            Proof::Circuit(prev) => {
                self.check_incoming(prev)?;
                self.step(prev, transformation, rng)
            }
        }
    }

    /// Base case: turn a device signature into an Identity proof.
    pub fn bootstrap<R: RngCore + CryptoRng>(
        &self,
        base: &SignatureProof,
        rng: &mut R,
    ) -> Result<CircuitProof, PcdError> {
        let device_key = self.keys.verifying_keys().device_key;
        if base.public_key != device_key {
            return Err(VerifyFailure::UntrustedKey.into());
        }
        if !base.public_key.verify(&base.image.message()?, &base.signature) {
            return Err(VerifyFailure::SignatureInvalid.into());
        }

        let circuit = IdentityCircuit::new(base.public_key, base.signature, &base.image)?;
        let (proof, public_witness) = backend::prove(
            &self.keys.identity.groth16,
            ComplianceCircuit::Identity(circuit),
            self.config.check_witness,
            rng,
        )?;
        info!("bootstrapped capture into an identity proof");
        Ok(CircuitProof {
            class: ComplianceClass::Identity,
            proof,
            public_witness,
            image: base.image.clone(),
            public_key: base.public_key,
            signature: base.signature,
        })
    }

    /// Prove a crop step with an explicit post-image. `prev` is verified
    /// first; a `cropped_in` that is not the crop of `prev.image` fails with
    /// [`crate::ProveError::Unsatisfied`] when witness checking is on.
    pub fn prove_crop_step<R: RngCore + CryptoRng>(
        &self,
        prev: &CircuitProof,
        cropped_in: &Image,
        params: CropParams,
        rng: &mut R,
    ) -> Result<Proof, PcdError> {
        params.validate_for(&prev.image)?;
        self.check_incoming(prev)?;
        self.crop_proof(prev, cropped_in.clone(), params, rng)
    }

    fn check_incoming(&self, prev: &CircuitProof) -> Result<(), PcdError> {
        verifier::verify_circuit(self.keys.verifying_keys(), prev)?;
        debug!("incoming {} proof verified", prev.class);
        Ok(())
    }

    fn step<R: RngCore + CryptoRng>(
        &self,
        prev: &CircuitProof,
        transformation: &Transformation,
        rng: &mut R,
    ) -> Result<Proof, PcdError> {
        let params = transformation.crop_params(&prev.image);
        self.crop_proof(prev, prev.image.cropped(&params), params, rng)
    }

    fn crop_proof<R: RngCore + CryptoRng>(
        &self,
        prev: &CircuitProof,
        next: Image,
        params: CropParams,
        rng: &mut R,
    ) -> Result<Proof, PcdError> {
        let circuit = CropCircuit::new(prev.public_key, prev.signature, &prev.image, &next, params)?;
        let (proof, public_witness) = backend::prove(
            &self.keys.crop.groth16,
            ComplianceCircuit::Crop(circuit),
            self.config.check_witness,
            rng,
        )?;

        let ephemeral = SignerSecret::generate(rng);
        let signature = ephemeral.sign(&next.message()?);
        let public_key = ephemeral.public_key();
        drop(ephemeral);

        info!("proved crop step {}", params);
        Ok(Proof::Circuit(CircuitProof {
            class: ComplianceClass::Crop,
            proof,
            public_witness,
            image: next,
            public_key,
            signature,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{image::RgbPixel, test_support, ParamError, ProveError};
    use rand::{rngs::StdRng, SeedableRng};

    fn capture() -> Proof {
        let (_, _, signer) = test_support::chain();
        sign_capture(Image::all_white(), signer).unwrap()
    }

    fn proven(rng: &mut StdRng) -> CircuitProof {
        let (pk, _, _) = test_support::chain();
        match Prover::new(pk).apply_transformation(&capture(), &Transformation::Identity, rng).unwrap() {
            Proof::Circuit(p) => p,
            Proof::Signature(_) => panic!("bootstrap must yield a circuit proof"),
        }
    }

    #[test]
    fn bootstrap_keeps_image_and_device_key() {
        let mut rng = StdRng::seed_from_u64(20);
        let (_, vk, _) = test_support::chain();
        let p = proven(&mut rng);
        assert_eq!(p.class, ComplianceClass::Identity);
        assert_eq!(p.image, Image::all_white());
        assert_eq!(p.public_key, vk.device_key);
        assert_eq!(p.public_witness.0[5], Image::all_white().digest().unwrap());
    }

    #[test]
    fn crop_from_unproven_bootstraps_first() {
        let mut rng = StdRng::seed_from_u64(21);
        let (pk, _, _) = test_support::chain();
        let t = Transformation::crop(3, 3, 6, 6).unwrap();
        let next = Prover::new(pk).apply_transformation(&capture(), &t, &mut rng).unwrap();
        assert_eq!(next.class(), Some(ComplianceClass::Crop));
        assert_eq!(next.image().extent(), (4, 4));
        assert_eq!(next.image().pixel(3, 3), RgbPixel::WHITE);
        assert_eq!(next.image().pixel(4, 3), RgbPixel::BLACK);
    }

    #[test]
    fn bad_parameters_fail_before_any_proof() {
        let mut rng = StdRng::seed_from_u64(22);
        let (pk, _, _) = test_support::chain();
        let prover = Prover::new(pk);
        let inverted = Transformation::Crop(CropParams::new(6, 3, 3, 6));
        let err = prover.apply_transformation(&capture(), &inverted, &mut rng).unwrap_err();
        assert!(matches!(err, PcdError::Param(ParamError::Inverted { .. })));

        let oob = Transformation::Crop(CropParams::new(0, 0, 16, 2));
        let err = prover.apply_transformation(&capture(), &oob, &mut rng).unwrap_err();
        assert!(matches!(err, PcdError::Param(ParamError::OutOfRange { .. })));
    }

    #[test]
    fn corrupted_post_image_is_rejected() {
        let mut rng = StdRng::seed_from_u64(23);
        let (pk, _, _) = test_support::chain();
        let prev = proven(&mut rng);
        let params = CropParams::new(3, 3, 6, 6);
        let mut claimed = prev.image.cropped(&params);
        claimed.set_pixel(1, 1, RgbPixel::new(200, 0, 0));

        let err = Prover::new(pk).prove_crop_step(&prev, &claimed, params, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            PcdError::Prove(ProveError::Unsatisfied { class: ComplianceClass::Crop, .. })
        ));
    }

    #[test]
    fn rewritten_metadata_is_rejected() {
        let mut rng = StdRng::seed_from_u64(27);
        let (pk, _, _) = test_support::chain();
        let prev = proven(&mut rng);
        let params = CropParams::new(3, 3, 6, 6);
        let mut claimed = prev.image.cropped(&params);
        claimed.set_metadata("Author", "Mallory");
        claimed.set_metadata("width", 16i64);
        claimed.set_metadata("height", 16i64);

        let err = Prover::new(pk).prove_crop_step(&prev, &claimed, params, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            PcdError::Prove(ProveError::Unsatisfied { class: ComplianceClass::Crop, .. })
        ));
    }

    #[test]
    fn foreign_capture_is_refused() {
        let mut rng = StdRng::seed_from_u64(24);
        let (pk, _, _) = test_support::chain();
        let stranger = SignerSecret::generate(&mut rng);
        let forged = sign_capture(Image::all_white(), &stranger).unwrap();
        let err = Prover::new(pk).apply_transformation(&forged, &Transformation::Identity, &mut rng).unwrap_err();
        assert!(matches!(err, PcdError::Rejected(VerifyFailure::UntrustedKey)));
    }

    #[test]
    fn tampered_incoming_proof_stops_the_chain() {
        let mut rng = StdRng::seed_from_u64(25);
        let (pk, _, _) = test_support::chain();
        let mut prev = proven(&mut rng);
        prev.image.set_pixel(0, 0, RgbPixel::BLACK);
        let t = Transformation::crop(0, 0, 7, 7).unwrap();
        let err = Prover::new(pk).apply_transformation(&Proof::Circuit(prev), &t, &mut rng).unwrap_err();
        assert!(matches!(err, PcdError::Rejected(VerifyFailure::ImageMismatch)));
    }

    #[test]
    fn identity_on_a_proven_state_keeps_the_image() {
        let mut rng = StdRng::seed_from_u64(26);
        let (pk, _, _) = test_support::chain();
        let prover = Prover::new(pk);
        let first = prover
            .apply_transformation(&capture(), &Transformation::crop(2, 2, 9, 5).unwrap(), &mut rng)
            .unwrap();
        let second = prover.apply_transformation(&first, &Transformation::Identity, &mut rng).unwrap();
        assert_eq!(second.image(), first.image());
        assert_eq!(second.class(), Some(ComplianceClass::Crop));
    }
}
