//! Generator: one-time key material for a compliance class.
//!
//! ```text
//! generate(image, T):  signer ← fresh keypair
//!                      sig    ← sign(signer, message(image))
//!                      C      ← circuit(class(T), pk, sig, image)
//!                      shape  ← compile(C)
//!                      pk, vk ← groth16_setup(C)
//! ```
//!
//! Groth16 keys are circuit specific, so a chain needs one pair per class.
//! [`generate_chain`] derives both under a single device signer and returns
//! them as [`PcdProvingKeys`] / [`PcdVerifyingKeys`]. Crop keys are derived
//! from the full-bounds rectangle; the circuit's shape does not depend on the
//! rectangle, so they serve every crop.

#![forbid(unsafe_code)]

use rand::{CryptoRng, RngCore};
use tracing::{debug, info};

use crate::{
    backend::{self, CircuitShape, Groth16ProvingKey, Groth16VerifyingKey, SetupError},
    compliance::{ComplianceCircuit, CropCircuit, IdentityCircuit, WitnessError},
    image::Image,
    signature::{PublicKey, SignerSecret},
    transformation::{ComplianceClass, CropParams, Transformation},
};

/// Groth16 proving key bound to one compliance class.
#[derive(Clone, Debug)]
pub struct ProvingKey {
    /// Class the key proves.
    pub class: ComplianceClass,
    /// Size of the compiled circuit.
    pub shape: CircuitShape,
    pub(crate) groth16: Groth16ProvingKey,
}

/// Groth16 verifying key bound to one compliance class.
#[derive(Clone, Debug)]
pub struct VerifyingKey {
    /// Class the key verifies.
    pub class: ComplianceClass,
    pub(crate) groth16: Groth16VerifyingKey,
    fingerprint: String,
}

impl VerifyingKey {
    fn new(class: ComplianceClass, groth16: Groth16VerifyingKey) -> Result<Self, SetupError> {
        let fingerprint = backend::fingerprint(&groth16)?;
        Ok(Self { class, groth16, fingerprint })
    }

    /// BLAKE3 of the compressed key, hex.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The underlying Groth16 key.
    pub fn groth16(&self) -> &Groth16VerifyingKey {
        &self.groth16
    }
}

/// Output of [`generate`].
#[derive(Debug)]
pub struct GeneratedKeys {
    /// Proving key for the requested class.
    pub proving_key: ProvingKey,
    /// Matching verifying key.
    pub verifying_key: VerifyingKey,
    /// Signer the reference image was signed with.
    pub signer: SignerSecret,
}

/// Compliance circuit for `transformation`'s class, witnessed with `image`.
/// Identity keeps the full grid.
fn circuit_for(
    transformation: &Transformation,
    public_key: PublicKey,
    image: &Image,
    signer: &SignerSecret,
) -> Result<ComplianceCircuit, SetupError> {
    transformation.validate_for(image)?;
    let signature = signer.sign(&image.message().map_err(WitnessError::from)?);
    Ok(match transformation {
        Transformation::Identity => {
            ComplianceCircuit::Identity(IdentityCircuit::new(public_key, signature, image)?)
        }
        Transformation::Crop(params) => {
            let cropped = image.cropped(params);
            ComplianceCircuit::Crop(CropCircuit::new(public_key, signature, image, &cropped, *params)?)
        }
    })
}

/// Derive keys for `transformation`'s class under an existing signer.
pub fn generate_with_signer<R: RngCore + CryptoRng>(
    image: &Image,
    transformation: &Transformation,
    signer: &SignerSecret,
    rng: &mut R,
) -> Result<(ProvingKey, VerifyingKey), SetupError> {
    let class = transformation.class();
    let circuit = circuit_for(transformation, signer.public_key(), image, signer)?;

    let shape = backend::compile(circuit.clone())?;
    debug!(
        "compiled {} circuit: constraints={}, public_inputs={}, witnesses={}",
        class, shape.constraints, shape.public_inputs, shape.witnesses
    );

    let (pk, vk) = backend::setup(circuit, rng)?;
    let verifying_key = VerifyingKey::new(class, vk)?;
    info!(
        "generated {} keys: constraints={}, vk={}",
        class,
        shape.constraints,
        verifying_key.fingerprint()
    );
    Ok((ProvingKey { class, shape, groth16: pk }, verifying_key))
}

/// One-time setup for `transformation`'s class with a fresh signer.
pub fn generate<R: RngCore + CryptoRng>(
    image: &Image,
    transformation: &Transformation,
    rng: &mut R,
) -> Result<GeneratedKeys, SetupError> {
    let signer = SignerSecret::generate(rng);
    let (proving_key, verifying_key) = generate_with_signer(image, transformation, &signer, rng)?;
    Ok(GeneratedKeys { proving_key, verifying_key, signer })
}

/// Proving keys for both classes plus the matching verifying keys.
#[derive(Clone, Debug)]
pub struct PcdProvingKeys {
    /// Identity proving key.
    pub identity: ProvingKey,
    /// Crop proving key.
    pub crop: ProvingKey,
    verifying: PcdVerifyingKeys,
}

impl PcdProvingKeys {
    /// Proving key for `class`.
    pub fn for_class(&self, class: ComplianceClass) -> &ProvingKey {
        match class {
            ComplianceClass::Identity => &self.identity,
            ComplianceClass::Crop => &self.crop,
        }
    }

    /// Verifying keys of the same chain.
    pub fn verifying_keys(&self) -> &PcdVerifyingKeys {
        &self.verifying
    }
}

/// Public verification material for a chain.
#[derive(Clone, Debug)]
pub struct PcdVerifyingKeys {
    /// Identity verifying key.
    pub identity: VerifyingKey,
    /// Crop verifying key.
    pub crop: VerifyingKey,
    /// Key of the capturing device; base-case signatures and Identity proofs
    /// must be under it.
    pub device_key: PublicKey,
}

impl PcdVerifyingKeys {
    /// Verifying key for `class`.
    pub fn for_class(&self, class: ComplianceClass) -> &VerifyingKey {
        match class {
            ComplianceClass::Identity => &self.identity,
            ComplianceClass::Crop => &self.crop,
        }
    }
}

/// Keys for a whole chain under one device signer.
pub fn generate_chain<R: RngCore + CryptoRng>(
    image: &Image,
    rng: &mut R,
) -> Result<(PcdProvingKeys, PcdVerifyingKeys, SignerSecret), SetupError> {
    let signer = SignerSecret::generate(rng);
    let (identity_pk, identity_vk) =
        generate_with_signer(image, &Transformation::Identity, &signer, rng)?;
    let (crop_pk, crop_vk) =
        generate_with_signer(image, &Transformation::Crop(CropParams::full()), &signer, rng)?;

    let verifying = PcdVerifyingKeys { identity: identity_vk, crop: crop_vk, device_key: signer.public_key() };
    let proving = PcdProvingKeys { identity: identity_pk, crop: crop_pk, verifying: verifying.clone() };
    Ok((proving, verifying, signer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compliance::PUBLIC_INPUTS, test_support};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn chain_keys_are_bound_to_their_class() {
        let (pk, vk, signer) = test_support::chain();
        assert_eq!(pk.identity.class, ComplianceClass::Identity);
        assert_eq!(pk.crop.class, ComplianceClass::Crop);
        assert_eq!(vk.for_class(ComplianceClass::Crop).class, ComplianceClass::Crop);
        assert_eq!(vk.device_key, signer.public_key());
        assert_eq!(pk.verifying_keys().device_key, vk.device_key);
        assert_ne!(vk.identity.fingerprint(), vk.crop.fingerprint());
        assert_eq!(pk.identity.shape.public_inputs, PUBLIC_INPUTS);
        assert_eq!(pk.crop.shape.public_inputs, PUBLIC_INPUTS);
    }

    #[test]
    fn generate_rejects_bad_crop_before_setup() {
        let mut img = Image::all_white();
        img.crop_in_place(&CropParams::new(0, 0, 3, 3));
        let t = Transformation::Crop(CropParams::new(0, 0, 8, 8));
        let err = generate(&img, &t, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, SetupError::Params(_)));
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let (_, vk, _) = test_support::chain();
        let fp = vk.identity.fingerprint();
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(backend::fingerprint(vk.identity.groth16()).unwrap(), fp);
    }
}
