//! A capturing device and an editor.
//!
//! [`SecureCamera`] holds the device signer and the chain keys. It runs the
//! generator once at construction, signs every capture with the device key
//! and can bootstrap a capture straight into the proof chain. The signer
//! never leaves the camera; only verifying keys are handed out.

#![forbid(unsafe_code)]

use rand::{CryptoRng, RngCore};
use tracing::info;

use crate::{
    config::PcdConfig,
    generator::{generate_chain, PcdProvingKeys, PcdVerifyingKeys},
    image::Image,
    prover::{sign_capture, Proof, Prover},
    signature::SignerSecret,
    transformation::Transformation,
    PcdError,
};

/// Simulated trusted camera.
#[derive(Debug)]
pub struct SecureCamera {
    signer: SignerSecret,
    proving_keys: PcdProvingKeys,
    verifying_keys: PcdVerifyingKeys,
    config: PcdConfig,
}

impl SecureCamera {
    /// Run the generator over a reference capture and keep the keys.
    pub fn new(config: PcdConfig) -> Result<Self, PcdError> {
        let mut rng = config.rng();
        let (proving_keys, verifying_keys, signer) = generate_chain(&Self::take_picture(), &mut rng)?;
        info!(
            "camera ready: identity vk={}, crop vk={}",
            verifying_keys.identity.fingerprint(),
            verifying_keys.crop.fingerprint()
        );
        Ok(Self { signer, proving_keys, verifying_keys, config })
    }

    /// Simulated sensor read-out.
    pub fn take_picture() -> Image {
        Image::all_white()
    }

    /// Public verification material for this camera's chain.
    pub fn verifying_keys(&self) -> &PcdVerifyingKeys {
        &self.verifying_keys
    }

    /// Proving keys for editors downstream of this camera.
    pub fn proving_keys(&self) -> &PcdProvingKeys {
        &self.proving_keys
    }

    /// Sign `image` with the device key (Unproven).
    pub fn capture(&self, image: Image) -> Result<Proof, PcdError> {
        Ok(sign_capture(image, &self.signer)?)
    }

    /// Sign and bootstrap `image` into an Identity proof (Proven).
    pub fn capture_proven<R: RngCore + CryptoRng>(&self, image: Image, rng: &mut R) -> Result<Proof, PcdError> {
        let unproven = self.capture(image)?;
        Prover::with_config(&self.proving_keys, self.config).apply_transformation(
            &unproven,
            &Transformation::Identity,
            rng,
        )
    }
}

/// Editor crop: apply `Crop(x0, y0, x1, y1)` to `proof`.
pub fn edit_crop<R: RngCore + CryptoRng>(
    keys: &PcdProvingKeys,
    config: PcdConfig,
    proof: &Proof,
    (x0, y0, x1, y1): (i64, i64, i64, i64),
    rng: &mut R,
) -> Result<Proof, PcdError> {
    let crop = Transformation::crop(x0, y0, x1, y1)?;
    Prover::with_config(keys, config).apply_transformation(proof, &crop, rng)
}
