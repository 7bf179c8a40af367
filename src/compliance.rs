//! Compliance predicates: the Identity and Crop circuits.
//!
//! Both circuits expose the same public statement, allocated in this order:
//!
//! ```text
//! [ A.x, A.y, R.x, R.y, s, output_digest ]
//! ```
//!
//! `(A, (R, s))` is a public key and a signature over the *input* image;
//! `output_digest` is the Poseidon digest of the image the step outputs. Pixel
//! values are private witnesses in both circuits.
//!
//! - **Identity**: the private message hashes to `output_digest` and the
//!   signature verifies over that digest.
//! - **Crop**: for every grid point `(x, y)`, unconditionally, the circuit
//!   computes crop-area membership, the translated destination
//!   `(x − x0, y − y0)`, and whether that destination lies in the grid; the
//!   pixel is kept iff both hold, otherwise black. Kept values are routed to
//!   their destination with one-hot translation selectors, the claimed
//!   `cropped_in` image must match pixel by pixel, and the signature must
//!   verify over the input image. The rectangle must fit the input's extent.
//!   The output message reuses the input's metadata entries and takes its
//!   extent from the rectangle, `(x1 − x0 + 1, y1 − y0 + 1)`; it must hash to
//!   `output_digest`, so a post-image with rewritten metadata has no proof.

#![forbid(unsafe_code)]

use ark_ed_on_bn254::Fr as EdFr;
use ark_ff::PrimeField;
use ark_r1cs_std::{
    alloc::AllocVar,
    boolean::Boolean,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
    select::CondSelectGadget,
    uint8::UInt8,
    ToBitsGadget,
};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::{
    area::{enforce_coordinate, in_area, is_le, Location, SquareArea},
    hash,
    image::{Image, ImageError, LIMB_BYTES, MESSAGE_LEN, METADATA_FIELDS},
    signature::{enforce_signature, PublicKey, PublicKeyVar, Signature, SignatureVar},
    transformation::{ComplianceClass, CropParams, ParamError},
    F, N,
};

/// Number of public inputs both circuits allocate.
pub const PUBLIC_INPUTS: usize = 6;

/// Witness data inconsistent with the circuit shape.
#[derive(Debug, thiserror::Error)]
pub enum WitnessError {
    /// Crop rectangle outside the grid or inverted.
    #[error("crop parameters rejected: {0}")]
    Params(#[from] ParamError),
    /// The image could not be encoded.
    #[error("image encoding failed: {0}")]
    Image(#[from] ImageError),
    /// A message of the wrong length.
    #[error("message has {got} elements, circuit expects {expected}")]
    MessageLength {
        /// [`MESSAGE_LEN`].
        expected: usize,
        /// Length supplied.
        got: usize,
    },
    /// A public-input vector of the wrong length.
    #[error("public statement has {got} inputs, circuit expects {expected}")]
    StatementLength {
        /// [`PUBLIC_INPUTS`].
        expected: usize,
        /// Length supplied.
        got: usize,
    },
    /// A point or scalar in the public inputs that is not a valid key or
    /// signature component.
    #[error("public statement carries an invalid {0}")]
    StatementPoint(&'static str),
}

/// Public part of a compliance statement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PublicStatement {
    /// Key the input image is signed under.
    pub public_key: PublicKey,
    /// Signature over the input image.
    pub signature: Signature,
    /// Poseidon digest of the output image's message.
    pub output_digest: F,
}

impl PublicStatement {
    /// Public inputs in allocation order.
    pub fn to_public_inputs(&self) -> Vec<F> {
        let mut out = Vec::with_capacity(PUBLIC_INPUTS);
        out.extend_from_slice(&self.public_key.to_field_elements());
        out.extend_from_slice(&self.signature.to_field_elements());
        out.push(self.output_digest);
        out
    }

    /// Decode public inputs, rejecting points off the curve and out-of-range
    /// scalars.
    pub fn from_public_inputs(inputs: &[F]) -> Result<Self, WitnessError> {
        if inputs.len() != PUBLIC_INPUTS {
            return Err(WitnessError::StatementLength { expected: PUBLIC_INPUTS, got: inputs.len() });
        }
        let public_key = PublicKey::from_coordinates(inputs[0], inputs[1])
            .ok_or(WitnessError::StatementPoint("public key"))?;
        let r = PublicKey::from_coordinates(inputs[2], inputs[3])
            .ok_or(WitnessError::StatementPoint("signature nonce"))?
            .0;
        let s = EdFr::from_bigint(inputs[4].into_bigint())
            .ok_or(WitnessError::StatementPoint("signature scalar"))?;
        Ok(Self { public_key, signature: Signature { r, s }, output_digest: inputs[5] })
    }
}

/// Allocate the public statement (shared by both circuits).
fn statement_inputs(
    cs: ConstraintSystemRef<F>,
    st: &PublicStatement,
) -> Result<(PublicKeyVar, SignatureVar, FpVar<F>), SynthesisError> {
    let pk = PublicKeyVar::new_input(cs.clone(), &st.public_key)?;
    let sig = SignatureVar::new_input(cs.clone(), &st.signature)?;
    let digest = st.output_digest;
    let out = FpVar::new_input(cs, || Ok(digest))?;
    Ok((pk, sig, out))
}

// ----------------------------------------------------------------------------
// Image gadget
// ----------------------------------------------------------------------------

/// One pixel in circuit space.
#[derive(Clone, Debug)]
pub struct PixelVar {
    /// Red channel.
    pub r: FpVar<F>,
    /// Green channel.
    pub g: FpVar<F>,
    /// Blue channel.
    pub b: FpVar<F>,
}

impl PixelVar {
    /// Constant black; costs no constraints.
    pub fn black() -> Self {
        Self { r: FpVar::zero(), g: FpVar::zero(), b: FpVar::zero() }
    }

    fn channels(&self) -> [&FpVar<F>; 3] {
        [&self.r, &self.g, &self.b]
    }

    /// `cond ? yes : no`, channel by channel.
    pub fn select(cond: &Boolean<F>, yes: &Self, no: &Self) -> Result<Self, SynthesisError> {
        Ok(Self {
            r: FpVar::conditionally_select(cond, &yes.r, &no.r)?,
            g: FpVar::conditionally_select(cond, &yes.g, &no.g)?,
            b: FpVar::conditionally_select(cond, &yes.b, &no.b)?,
        })
    }
}

/// An `N × N` image of private pixels, `pixels[y][x]`.
#[derive(Clone, Debug)]
pub struct ImageVar {
    /// Grid of pixel variables.
    pub pixels: Vec<Vec<PixelVar>>,
}

impl ImageVar {
    /// Allocate pixels as witnesses. With `range_check`, every channel is
    /// constrained to 8 bits so the packed message is injective.
    pub fn new_witness(
        cs: ConstraintSystemRef<F>,
        image: &Image,
        range_check: bool,
    ) -> Result<Self, SynthesisError> {
        let mut pixels = Vec::with_capacity(N);
        for row in image.pixels() {
            let mut out_row = Vec::with_capacity(N);
            for px in row {
                let [r, g, b] = px.channels().map(|c| {
                    if range_check {
                        let byte = UInt8::new_witness(cs.clone(), || Ok(c))?;
                        Boolean::le_bits_to_fp_var(&byte.to_bits_le()?)
                    } else {
                        FpVar::new_witness(cs.clone(), || Ok(F::from(c)))
                    }
                });
                out_row.push(PixelVar { r: r?, g: g?, b: b? });
            }
            pixels.push(out_row);
        }
        Ok(Self { pixels })
    }

    /// Field-encoded message: pixel limbs (little-endian, [`LIMB_BYTES`]
    /// channels each) followed by `metadata`.
    pub fn message(&self, metadata: &MetadataVar) -> Vec<FpVar<F>> {
        let channels: Vec<&FpVar<F>> =
            self.pixels.iter().flatten().flat_map(|px| px.channels()).collect();
        let mut msg: Vec<FpVar<F>> = channels
            .chunks(LIMB_BYTES)
            .map(|chunk| {
                let mut acc = FpVar::zero();
                let mut weight = F::from(1u64);
                for c in chunk {
                    acc += *c * FpVar::constant(weight);
                    weight *= F::from(256u64);
                }
                acc
            })
            .collect();
        msg.extend(metadata.fields());
        msg
    }

    /// Pixel-wise equality.
    pub fn enforce_equal(&self, other: &Self) -> Result<(), SynthesisError> {
        for (row_a, row_b) in self.pixels.iter().zip(&other.pixels) {
            for (a, b) in row_a.iter().zip(row_b) {
                a.r.enforce_equal(&b.r)?;
                a.g.enforce_equal(&b.g)?;
                a.b.enforce_equal(&b.b)?;
            }
        }
        Ok(())
    }
}

/// Message tail in circuit space: the metadata entries element and the
/// extent.
#[derive(Clone, Debug)]
pub struct MetadataVar {
    /// BLAKE3-derived element of the free-form entries.
    pub entries: FpVar<F>,
    /// Logical width.
    pub width: FpVar<F>,
    /// Logical height.
    pub height: FpVar<F>,
}

impl MetadataVar {
    /// Allocate `[entries, width, height]` as witnesses.
    pub fn new_witness(
        cs: ConstraintSystemRef<F>,
        fields: [F; METADATA_FIELDS],
    ) -> Result<Self, SynthesisError> {
        let [entries, width, height] =
            fields.map(|v| FpVar::new_witness(cs.clone(), || Ok(v)));
        Ok(Self { entries: entries?, width: width?, height: height? })
    }

    fn fields(&self) -> [FpVar<F>; METADATA_FIELDS] {
        [self.entries.clone(), self.width.clone(), self.height.clone()]
    }
}

// ----------------------------------------------------------------------------
// Identity
// ----------------------------------------------------------------------------

/// "The image was signed as-is."
#[derive(Clone, Debug)]
pub struct IdentityCircuit {
    /// Public part.
    pub statement: PublicStatement,
    /// Private: the signed image's message.
    pub message: Vec<F>,
}

impl IdentityCircuit {
    /// Build from a signed image. The output digest is the image's own digest.
    pub fn new(public_key: PublicKey, signature: Signature, image: &Image) -> Result<Self, WitnessError> {
        Self::from_message(public_key, signature, image.message()?)
    }

    /// Build from an already encoded message of [`MESSAGE_LEN`] elements.
    pub fn from_message(
        public_key: PublicKey,
        signature: Signature,
        message: Vec<F>,
    ) -> Result<Self, WitnessError> {
        if message.len() != MESSAGE_LEN {
            return Err(WitnessError::MessageLength { expected: MESSAGE_LEN, got: message.len() });
        }
        let output_digest = hash::hash_fields(&message);
        Ok(Self { statement: PublicStatement { public_key, signature, output_digest }, message })
    }
}

impl ConstraintSynthesizer<F> for IdentityCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        if self.message.len() != MESSAGE_LEN {
            return Err(SynthesisError::Unsatisfiable);
        }
        let (pk, sig, out) = statement_inputs(cs.clone(), &self.statement)?;
        let msg = self
            .message
            .iter()
            .map(|m| FpVar::new_witness(cs.clone(), || Ok(*m)))
            .collect::<Result<Vec<_>, _>>()?;

        let digest = hash::hash_fields_var(cs.clone(), &msg)?;
        digest.enforce_equal(&out)?;
        enforce_signature(cs, &pk, &sig, &digest)
    }
}

// ----------------------------------------------------------------------------
// Crop
// ----------------------------------------------------------------------------

/// "`cropped_in` is the crop-and-translate of a validly signed image."
#[derive(Clone, Debug)]
pub struct CropCircuit {
    /// Public part.
    pub statement: PublicStatement,
    /// Private: pre-transform image.
    pub image: Image,
    /// Private: claimed post-transform image.
    pub cropped_in: Image,
    /// Private: rectangle.
    pub params: CropParams,
    /// Private: grid size the rectangle is checked against.
    pub n: usize,
    image_metadata: [F; METADATA_FIELDS],
}

impl CropCircuit {
    /// Build from a signed pre-image and the claimed post-image. The claim is
    /// not checked here; a wrong `cropped_in` makes the circuit unsatisfiable.
    pub fn new(
        public_key: PublicKey,
        signature: Signature,
        image: &Image,
        cropped_in: &Image,
        params: CropParams,
    ) -> Result<Self, WitnessError> {
        params.validate()?;
        Ok(Self {
            statement: PublicStatement { public_key, signature, output_digest: cropped_in.digest()? },
            image: image.clone(),
            cropped_in: cropped_in.clone(),
            params,
            n: N,
            image_metadata: image.metadata_fields()?,
        })
    }
}

/// `out[u] = Σ_d sel[d] · line[u + d]`; with one-hot `sel` this shifts `line`
/// left by the selected offset and fills with zero.
fn shift_left(sel: &[FpVar<F>], line: &[FpVar<F>]) -> Vec<FpVar<F>> {
    (0..line.len())
        .map(|u| {
            let mut acc = FpVar::zero();
            for (d, s) in sel.iter().enumerate().take(line.len() - u) {
                acc += s * &line[u + d];
            }
            acc
        })
        .collect()
}

/// One-hot indicators `[v == 0], …, [v == N−1]`.
fn one_hot(v: &FpVar<F>) -> Result<Vec<FpVar<F>>, SynthesisError> {
    (0..N)
        .map(|d| Ok(FpVar::from(v.is_eq(&FpVar::constant(F::from(d as u64)))?)))
        .collect()
}

/// Crop and translate `src` in circuit. `n` is the grid-size witness.
pub fn crop_image(
    src: &ImageVar,
    rect: &SquareArea,
    n: &FpVar<F>,
) -> Result<ImageVar, SynthesisError> {
    let black = PixelVar::black();
    let n_minus_one = n - FpVar::one();
    let bounds = SquareArea::new(Location::constant(0, 0), Location::new(n_minus_one.clone(), n_minus_one));
    let (x0, y0) = (&rect.top_left.x, &rect.top_left.y);

    // Masked source values, one per grid point.
    let mut kept = Vec::with_capacity(N);
    for y in 0..N {
        let mut row = Vec::with_capacity(N);
        for x in 0..N {
            let xv = FpVar::constant(F::from(x as u64));
            let yv = FpVar::constant(F::from(y as u64));
            let in_crop = in_area(&xv, &yv, rect)?;
            let dst_x = &xv - x0;
            let dst_y = &yv - y0;
            let in_bounds = in_area(&dst_x, &dst_y, &bounds)?;
            row.push(PixelVar::select(&in_crop.and(&in_bounds)?, &src.pixels[y][x], &black)?);
        }
        kept.push(row);
    }

    // Translate: rows by x0, then columns by y0.
    let sel_x = one_hot(x0)?;
    let sel_y = one_hot(y0)?;
    let channel = |px: &PixelVar, c: usize| px.channels()[c].clone();

    let mut shifted = vec![vec![[FpVar::zero(), FpVar::zero(), FpVar::zero()]; N]; N];
    for c in 0..3 {
        let rows: Vec<Vec<FpVar<F>>> = kept
            .iter()
            .map(|row| shift_left(&sel_x, &row.iter().map(|px| channel(px, c)).collect::<Vec<_>>()))
            .collect();
        for u in 0..N {
            let column: Vec<FpVar<F>> = rows.iter().map(|row| row[u].clone()).collect();
            for (v, value) in shift_left(&sel_y, &column).into_iter().enumerate() {
                shifted[v][u][c] = value;
            }
        }
    }

    let pixels = shifted
        .into_iter()
        .map(|row| row.into_iter().map(|[r, g, b]| PixelVar { r, g, b }).collect())
        .collect();
    Ok(ImageVar { pixels })
}

impl ConstraintSynthesizer<F> for CropCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let (pk, sig, out) = statement_inputs(cs.clone(), &self.statement)?;

        let witness = |v: usize| FpVar::new_witness(cs.clone(), || Ok(F::from(v as u64)));
        let n = witness(self.n)?;
        let p = self.params;
        let (x0, y0, x1, y1) = (witness(p.x0)?, witness(p.y0)?, witness(p.x1)?, witness(p.y1)?);

        // 0 ≤ x0 ≤ x1 ≤ n−1, 0 ≤ y0 ≤ y1 ≤ n−1, n == N.
        n.enforce_equal(&FpVar::constant(F::from(N as u64)))?;
        for v in [&x0, &y0, &x1, &y1] {
            enforce_coordinate(v)?;
        }
        let n_minus_one = &n - FpVar::one();
        is_le(&x0, &x1)?.enforce_equal(&Boolean::TRUE)?;
        is_le(&y0, &y1)?.enforce_equal(&Boolean::TRUE)?;
        is_le(&x1, &n_minus_one)?.enforce_equal(&Boolean::TRUE)?;
        is_le(&y1, &n_minus_one)?.enforce_equal(&Boolean::TRUE)?;

        // The rectangle fits the signed extent; the output extent is its size.
        let image_meta = MetadataVar::new_witness(cs.clone(), self.image_metadata)?;
        is_le(&x1, &(&image_meta.width - FpVar::one()))?.enforce_equal(&Boolean::TRUE)?;
        is_le(&y1, &(&image_meta.height - FpVar::one()))?.enforce_equal(&Boolean::TRUE)?;
        let cropped_meta = MetadataVar {
            entries: image_meta.entries.clone(),
            width: &x1 - &x0 + FpVar::one(),
            height: &y1 - &y0 + FpVar::one(),
        };

        let rect = SquareArea::new(Location::new(x0, y0), Location::new(x1, y1));

        let image = ImageVar::new_witness(cs.clone(), &self.image, true)?;
        let cropped_in = ImageVar::new_witness(cs.clone(), &self.cropped_in, false)?;

        let cropped_out = crop_image(&image, &rect, &n)?;
        cropped_in.enforce_equal(&cropped_out)?;

        let digest_in = hash::hash_fields_var(cs.clone(), &image.message(&image_meta))?;
        enforce_signature(cs.clone(), &pk, &sig, &digest_in)?;

        let digest_out = hash::hash_fields_var(cs, &cropped_in.message(&cropped_meta))?;
        digest_out.enforce_equal(&out)
    }
}

// ----------------------------------------------------------------------------
// Dispatch
// ----------------------------------------------------------------------------

/// Either compliance circuit.
#[derive(Clone, Debug)]
pub enum ComplianceCircuit {
    /// See [`IdentityCircuit`].
    Identity(IdentityCircuit),
    /// See [`CropCircuit`].
    Crop(CropCircuit),
}

impl ComplianceCircuit {
    /// Compliance class this circuit proves.
    pub fn class(&self) -> ComplianceClass {
        match self {
            ComplianceCircuit::Identity(_) => ComplianceClass::Identity,
            ComplianceCircuit::Crop(_) => ComplianceClass::Crop,
        }
    }

    /// Public statement the proof will be verified against.
    pub fn statement(&self) -> &PublicStatement {
        match self {
            ComplianceCircuit::Identity(c) => &c.statement,
            ComplianceCircuit::Crop(c) => &c.statement,
        }
    }
}

impl ConstraintSynthesizer<F> for ComplianceCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        match self {
            ComplianceCircuit::Identity(c) => c.generate_constraints(cs),
            ComplianceCircuit::Crop(c) => c.generate_constraints(cs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{image::RgbPixel, signature::SignerSecret};
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;
    use rand::{rngs::StdRng, SeedableRng};

    fn gradient() -> Image {
        Image::from_fn(|x, y| RgbPixel::new((x * 16 + y) as u8, (y * 3) as u8, (x + 100) as u8))
    }

    fn signed(image: &Image, seed: u64) -> (PublicKey, Signature) {
        let sk = SignerSecret::generate(&mut StdRng::seed_from_u64(seed));
        (sk.public_key(), sk.sign(&image.message().unwrap()))
    }

    fn satisfied(circuit: impl ConstraintSynthesizer<F>) -> bool {
        let cs = ConstraintSystem::<F>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn in_circuit_crop_matches_native_crop() {
        let img = gradient();
        let params = CropParams::new(2, 5, 9, 11);
        let expected = img.cropped(&params);

        let cs = ConstraintSystem::<F>::new_ref();
        let src = ImageVar::new_witness(cs.clone(), &img, true).unwrap();
        let c = |v: usize| FpVar::new_witness(cs.clone(), || Ok(F::from(v as u64))).unwrap();
        let rect = SquareArea::new(Location::new(c(2), c(5)), Location::new(c(9), c(11)));
        let out = crop_image(&src, &rect, &c(N)).unwrap();
        assert!(cs.is_satisfied().unwrap());

        for y in 0..N {
            for x in 0..N {
                let px = expected.pixel(x as i64, y as i64);
                let got = &out.pixels[y][x];
                assert_eq!(got.r.value().unwrap(), F::from(px.r), "r at ({x},{y})");
                assert_eq!(got.g.value().unwrap(), F::from(px.g), "g at ({x},{y})");
                assert_eq!(got.b.value().unwrap(), F::from(px.b), "b at ({x},{y})");
            }
        }
    }

    #[test]
    fn message_gadget_matches_native_encoding() {
        let img = gradient();
        let cs = ConstraintSystem::<F>::new_ref();
        let var = ImageVar::new_witness(cs.clone(), &img, true).unwrap();
        let meta = MetadataVar::new_witness(cs.clone(), img.metadata_fields().unwrap()).unwrap();
        let msg = var.message(&meta);
        let native = img.message().unwrap();
        assert_eq!(msg.len(), native.len());
        for (a, b) in msg.iter().zip(&native) {
            assert_eq!(a.value().unwrap(), *b);
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn identity_circuit_accepts_signed_image() {
        let img = gradient();
        let (pk, sig) = signed(&img, 7);
        assert!(satisfied(IdentityCircuit::new(pk, sig, &img).unwrap()));
    }

    #[test]
    fn identity_circuit_rejects_other_image() {
        let img = gradient();
        let (pk, sig) = signed(&img, 7);
        let mut other = img.clone();
        other.set_pixel(0, 0, RgbPixel::BLACK);
        assert!(!satisfied(IdentityCircuit::new(pk, sig, &other).unwrap()));
    }

    #[test]
    fn crop_circuit_accepts_honest_witness() {
        let img = gradient();
        let (pk, sig) = signed(&img, 8);
        let params = CropParams::new(3, 3, 6, 6);
        let circuit = CropCircuit::new(pk, sig, &img, &img.cropped(&params), params).unwrap();
        assert!(satisfied(circuit));
    }

    #[test]
    fn crop_circuit_rejects_corrupted_pixel() {
        let img = gradient();
        let (pk, sig) = signed(&img, 8);
        let params = CropParams::new(3, 3, 6, 6);
        let mut claimed = img.cropped(&params);
        claimed.set_pixel(1, 2, RgbPixel::new(1, 2, 3));
        let circuit = CropCircuit::new(pk, sig, &img, &claimed, params).unwrap();
        assert!(!satisfied(circuit));
    }

    #[test]
    fn crop_circuit_rejects_rewritten_metadata() {
        let img = gradient();
        let (pk, sig) = signed(&img, 8);
        let params = CropParams::new(3, 3, 6, 6);

        let mut renamed = img.cropped(&params);
        renamed.set_metadata("Author", "Mallory");
        assert!(!satisfied(CropCircuit::new(pk, sig, &img, &renamed, params).unwrap()));

        let mut regrown = img.cropped(&params);
        regrown.set_metadata("width", N);
        regrown.set_metadata("height", N);
        assert!(!satisfied(CropCircuit::new(pk, sig, &img, &regrown, params).unwrap()));
    }

    #[test]
    fn crop_circuit_rejects_rectangle_beyond_signed_extent() {
        let img = gradient().cropped(&CropParams::new(0, 0, 7, 3));
        let (pk, sig) = signed(&img, 14);
        let params = CropParams::new(0, 0, 3, 4);
        let circuit = CropCircuit::new(pk, sig, &img, &img.cropped(&params), params).unwrap();
        assert!(!satisfied(circuit));

        let inside = CropParams::new(1, 0, 7, 3);
        assert!(satisfied(CropCircuit::new(pk, sig, &img, &img.cropped(&inside), inside).unwrap()));
    }

    #[test]
    fn crop_circuit_rejects_transposed_translation() {
        // Translating y by the x offset (or vice versa) must not satisfy.
        let img = gradient();
        let (pk, sig) = signed(&img, 9);
        let params = CropParams::new(1, 6, 8, 12);
        let swapped = img.cropped(&CropParams::new(6, 1, 13, 7));
        let circuit = CropCircuit::new(pk, sig, &img, &swapped, params).unwrap();
        assert!(!satisfied(circuit));
    }

    #[test]
    fn crop_circuit_rejects_unsigned_image() {
        let img = gradient();
        let (pk, sig) = signed(&Image::all_white(), 10);
        let params = CropParams::new(0, 0, 4, 4);
        let circuit = CropCircuit::new(pk, sig, &img, &img.cropped(&params), params).unwrap();
        assert!(!satisfied(circuit));
    }

    #[test]
    fn full_bounds_crop_circuit_accepts_unchanged_image() {
        let img = gradient();
        let (pk, sig) = signed(&img, 11);
        let circuit = CropCircuit::new(pk, sig, &img, &img, CropParams::full()).unwrap();
        assert_eq!(circuit.statement.output_digest, img.digest().unwrap());
        assert!(satisfied(circuit));
    }

    #[test]
    fn invalid_params_are_witness_errors() {
        let img = gradient();
        let (pk, sig) = signed(&img, 12);
        let err = CropCircuit::new(pk, sig, &img, &img, CropParams::new(5, 0, 2, 3)).unwrap_err();
        assert!(matches!(err, WitnessError::Params(ParamError::Inverted { .. })));
    }

    #[test]
    fn statement_roundtrips_through_public_inputs() {
        let img = gradient();
        let (pk, sig) = signed(&img, 13);
        let st = IdentityCircuit::new(pk, sig, &img).unwrap().statement;
        let inputs = st.to_public_inputs();
        assert_eq!(inputs.len(), PUBLIC_INPUTS);
        assert_eq!(PublicStatement::from_public_inputs(&inputs).unwrap(), st);
        assert!(PublicStatement::from_public_inputs(&inputs[..5]).is_err());
    }

    #[test]
    fn identity_message_length_is_checked() {
        let img = gradient();
        let (pk, sig) = signed(&img, 15);
        let mut msg = img.message().unwrap();
        msg.pop();
        let err = IdentityCircuit::from_message(pk, sig, msg).unwrap_err();
        assert!(matches!(err, WitnessError::MessageLength { expected: MESSAGE_LEN, got } if got == MESSAGE_LEN - 1));
    }
}
