//! Thin Groth16 layer over arkworks: compile, setup, prove, verify.
//!
//! Everything proof-system specific lives here so the generator, prover and
//! verifier deal only in compliance circuits and public statements.
//!
//! ## Satisfiability
//! Groth16 proving does not notice an unsatisfied constraint system; it
//! simply emits a proof that will not verify. [`prove`] therefore synthesizes
//! the circuit with concrete values first (unless disabled through
//! [`crate::PcdConfig::check_witness`]) and reports the first failing
//! constraint as [`ProveError::Unsatisfied`].

#![forbid(unsafe_code)]

use ark_groth16::Groth16;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisError, SynthesisMode,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use ark_snark::SNARK;
use rand::{CryptoRng, RngCore};
use serde::Serialize;

use crate::{
    compliance::{ComplianceCircuit, WitnessError},
    Curve, F,
};

/// Groth16 proving key over [`Curve`].
pub type Groth16ProvingKey = ark_groth16::ProvingKey<Curve>;
/// Groth16 verifying key over [`Curve`].
pub type Groth16VerifyingKey = ark_groth16::VerifyingKey<Curve>;
/// Groth16 proof over [`Curve`].
pub type Groth16Proof = ark_groth16::Proof<Curve>;

/// Circuit compilation failed.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The circuit returned an error while generating constraints.
    #[error("constraint synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// Key generation failed.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The reference transformation is invalid for the reference image.
    #[error("transformation rejected: {0}")]
    Params(#[from] crate::transformation::ParamError),
    /// See [`CompileError`].
    #[error("circuit compilation failed: {0}")]
    Compile(#[from] CompileError),
    /// The reference circuit could not be built.
    #[error("witness construction failed: {0}")]
    Witness(#[from] WitnessError),
    /// Groth16 parameter generation failed.
    #[error("groth16 setup failed: {0}")]
    Backend(SynthesisError),
    /// The verifying key could not be fingerprinted.
    #[error("key serialization failed: {0}")]
    Serialization(#[from] SerializationError),
}

/// Proof generation failed.
#[derive(Debug, thiserror::Error)]
pub enum ProveError {
    /// The witness violates a constraint; no proof was attempted.
    #[error("witness does not satisfy the {class} circuit (first failing constraint: {constraint})")]
    Unsatisfied {
        /// Circuit that rejected the witness.
        class: crate::ComplianceClass,
        /// Namespace path of the first failing constraint.
        constraint: String,
    },
    /// Synthesis or the Groth16 prover failed.
    #[error("groth16 proving failed: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// Size of a compiled circuit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CircuitShape {
    /// R1CS constraints.
    pub constraints: usize,
    /// Public inputs, not counting the constant-one variable.
    pub public_inputs: usize,
    /// Private witness variables.
    pub witnesses: usize,
}

/// Compile a circuit to R1CS without assigning values and report its shape.
pub fn compile<C: ConstraintSynthesizer<F>>(circuit: C) -> Result<CircuitShape, CompileError> {
    let cs = ConstraintSystem::<F>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Setup);
    circuit.generate_constraints(cs.clone())?;
    cs.finalize();
    Ok(CircuitShape {
        constraints: cs.num_constraints(),
        public_inputs: cs.num_instance_variables().saturating_sub(1),
        witnesses: cs.num_witness_variables(),
    })
}

/// Circuit-specific Groth16 setup.
pub fn setup<C, R>(
    circuit: C,
    rng: &mut R,
) -> Result<(Groth16ProvingKey, Groth16VerifyingKey), SetupError>
where
    C: ConstraintSynthesizer<F>,
    R: RngCore + CryptoRng,
{
    Groth16::<Curve>::circuit_specific_setup(circuit, rng).map_err(SetupError::Backend)
}

/// Synthesize with values and check every constraint.
pub fn check_satisfied(circuit: ComplianceCircuit) -> Result<(), ProveError> {
    let class = circuit.class();
    let cs = ConstraintSystem::<F>::new_ref();
    circuit.generate_constraints(cs.clone())?;
    if cs.is_satisfied()? {
        return Ok(());
    }
    let constraint = cs.which_is_unsatisfied()?.unwrap_or_else(|| "<unnamed>".to_owned());
    Err(ProveError::Unsatisfied { class, constraint })
}

/// Prove `circuit` under `pk`. Returns the proof and its public witness.
pub fn prove<R: RngCore + CryptoRng>(
    pk: &Groth16ProvingKey,
    circuit: ComplianceCircuit,
    check_witness: bool,
    rng: &mut R,
) -> Result<(Groth16Proof, PublicWitness), ProveError> {
    let public = PublicWitness(circuit.statement().to_public_inputs());
    if check_witness {
        check_satisfied(circuit.clone())?;
    }
    let proof = Groth16::<Curve>::prove(pk, circuit, rng)?;
    Ok((proof, public))
}

/// Groth16 verification of `proof` against `public`.
pub fn verify_proof(
    vk: &Groth16VerifyingKey,
    public: &PublicWitness,
    proof: &Groth16Proof,
) -> Result<bool, SynthesisError> {
    if public.0.len() + 1 != vk.gamma_abc_g1.len() {
        return Ok(false);
    }
    Groth16::<Curve>::verify(vk, &public.0, proof)
}

/// BLAKE3 fingerprint (hex) of a verifying key's compressed encoding.
pub fn fingerprint(vk: &Groth16VerifyingKey) -> Result<String, SerializationError> {
    let mut bytes = Vec::new();
    vk.serialize_compressed(&mut bytes)?;
    Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
}

/// Public inputs a proof was produced against.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct PublicWitness(pub Vec<F>);

impl PublicWitness {
    /// Compressed canonical encoding (length-prefixed).
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        let mut out = Vec::new();
        self.serialize_compressed(&mut out)?;
        Ok(out)
    }

    /// Inverse of [`PublicWitness::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerializationError> {
        Self::deserialize_compressed(bytes)
    }
}
