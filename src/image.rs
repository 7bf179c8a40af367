//! Image model: a fixed `N × N` RGB grid plus an open metadata map.
//!
//! The grid never changes size. Out-of-bounds reads return a black pixel and
//! out-of-bounds writes are ignored, so callers can address the grid with
//! signed coordinates without special casing the edges.
//!
//! ## Canonical encoding
//! An image has exactly one byte encoding ([`Image::canonical_bytes`]):
//!
//! ```text
//! pixel section    : for y in 0..N, for x in 0..N: r, g, b   (3·N² bytes)
//! metadata section : JSON of the metadata map, keys sorted
//! ```
//!
//! The signed *message* is derived from the same two sections:
//!
//! ```text
//! [ pixel limbs (PIXEL_LIMBS) | entries | width | height ]
//! ```
//!
//! The pixel section is packed little-endian into [`LIMB_BYTES`]-byte limbs,
//! one field element each. The free-form metadata entries collapse to a single
//! BLAKE3-derived element. `width` and `height` are reserved keys: they are
//! typed fields of the image and enter the message as plain integers, so the
//! Crop circuit can derive the output extent from the rectangle and carry the
//! entries element over unchanged.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

use crate::{hash, transformation::CropParams, F, N};

/// Bytes packed into one message limb (10 pixels; 240 bits < |F|).
pub const LIMB_BYTES: usize = 30;

/// Number of pixel limbs in a message.
pub const PIXEL_LIMBS: usize = (3 * N * N + LIMB_BYTES - 1) / LIMB_BYTES;

/// Metadata elements at the tail of a message: entries, width, height.
pub const METADATA_FIELDS: usize = 3;

/// Total message length in field elements.
pub const MESSAGE_LEN: usize = PIXEL_LIMBS + METADATA_FIELDS;

/// Reserved metadata key holding the logical width.
pub const WIDTH_KEY: &str = "width";

/// Reserved metadata key holding the logical height.
pub const HEIGHT_KEY: &str = "height";

const METADATA_DST: &str = "photoproof.metadata.v1";

/// One RGB pixel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbPixel {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl RgbPixel {
    /// `(0, 0, 0)`, also the value of every out-of-bounds read.
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
    /// `(255, 255, 255)`.
    pub const WHITE: Self = Self { r: 255, g: 255, b: 255 };

    /// Pixel from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `[r, g, b]`.
    #[inline]
    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Scalar metadata value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// `true` / `false`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// UTF-8 text.
    Text(String),
}

impl MetadataValue {
    /// The integer payload, if this is an [`MetadataValue::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<usize> for MetadataValue {
    fn from(v: usize) -> Self {
        MetadataValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Text(v.to_owned())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Text(v)
    }
}

/// Errors produced while encoding an image.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The metadata map could not be serialized.
    #[error("metadata encoding failed: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// An `N × N` RGB image with metadata. Pixels are stored row-major
/// (`pixels[y][x]`). The logical extent `(width, height)` is kept apart from
/// the free-form entries and always lies in `1..=N`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pixels: [[RgbPixel; N]; N],
    width: usize,
    height: usize,
    metadata: BTreeMap<String, MetadataValue>,
}

impl Default for Image {
    fn default() -> Self {
        Self::new()
    }
}

impl Image {
    /// All-black full-grid image with no metadata entries.
    pub fn new() -> Self {
        Self { pixels: [[RgbPixel::BLACK; N]; N], width: N, height: N, metadata: BTreeMap::new() }
    }

    /// All-white capture with the default metadata set.
    pub fn all_white() -> Self {
        let mut img = Self::new();
        for row in img.pixels.iter_mut() {
            row.fill(RgbPixel::WHITE);
        }
        img.set_metadata("Author", "John Doe");
        img.set_metadata("N", N);
        img
    }

    /// Build a full-grid image from a pixel function `f(x, y)`.
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> RgbPixel) -> Self {
        let mut img = Self::new();
        for y in 0..N {
            for x in 0..N {
                img.pixels[y][x] = f(x, y);
            }
        }
        img
    }

    #[inline]
    fn in_grid(x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < N && (y as usize) < N
    }

    /// Pixel at `(x, y)`; black outside the grid.
    pub fn pixel(&self, x: i64, y: i64) -> RgbPixel {
        if Self::in_grid(x, y) {
            self.pixels[y as usize][x as usize]
        } else {
            RgbPixel::BLACK
        }
    }

    /// Set the pixel at `(x, y)`. Writes outside the grid are ignored.
    pub fn set_pixel(&mut self, x: i64, y: i64, color: RgbPixel) {
        if Self::in_grid(x, y) {
            self.pixels[y as usize][x as usize] = color;
        }
    }

    /// The whole grid, `pixels[y][x]`.
    pub fn pixels(&self) -> &[[RgbPixel; N]; N] {
        &self.pixels
    }

    /// Free-form entries (everything except `width` and `height`).
    pub fn metadata(&self) -> &BTreeMap<String, MetadataValue> {
        &self.metadata
    }

    /// Set a metadata entry. The reserved `width`/`height` keys update the
    /// extent instead; they take integers (clamped to `1..=N`) and ignore any
    /// other value.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        let key = key.into();
        let value = value.into();
        let clamp = |v: i64| v.clamp(1, N as i64) as usize;
        match key.as_str() {
            WIDTH_KEY => {
                if let Some(v) = value.as_int() {
                    self.width = clamp(v);
                }
            }
            HEIGHT_KEY => {
                if let Some(v) = value.as_int() {
                    self.height = clamp(v);
                }
            }
            _ => {
                self.metadata.insert(key, value);
            }
        }
    }

    /// Current logical extent `(width, height)`.
    pub fn extent(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Crop to the inclusive rectangle in `params` and move it to the top-left
    /// corner; every other pixel becomes black. The extent becomes the crop
    /// size and the other entries are kept. `params` must already be validated
    /// against this image (see [`CropParams::validate_for`]).
    pub fn crop_in_place(&mut self, params: &CropParams) {
        let src = self.clone();
        let (w, h) = (params.width(), params.height());
        for (v, row) in self.pixels.iter_mut().enumerate() {
            for (u, px) in row.iter_mut().enumerate() {
                *px = if u < w && v < h {
                    src.pixel((params.x0 + u) as i64, (params.y0 + v) as i64)
                } else {
                    RgbPixel::BLACK
                };
            }
        }
        self.width = w.clamp(1, N);
        self.height = h.clamp(1, N);
    }

    /// Crop a copy of this image.
    pub fn cropped(&self, params: &CropParams) -> Self {
        let mut out = self.clone();
        out.crop_in_place(params);
        out
    }

    /// Pixel section of the canonical encoding.
    pub fn pixel_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 * N * N);
        for row in &self.pixels {
            for px in row {
                out.extend_from_slice(&px.channels());
            }
        }
        out
    }

    /// Metadata section of the canonical encoding: sorted-key JSON of the
    /// entries together with `width` and `height`.
    pub fn metadata_bytes(&self) -> Result<Vec<u8>, ImageError> {
        let mut all = self.metadata.clone();
        all.insert(WIDTH_KEY.to_owned(), self.width.into());
        all.insert(HEIGHT_KEY.to_owned(), self.height.into());
        Ok(serde_json::to_vec(&all)?)
    }

    /// Canonical byte encoding: pixel section followed by metadata section.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ImageError> {
        let mut out = self.pixel_bytes();
        out.extend_from_slice(&self.metadata_bytes()?);
        Ok(out)
    }

    /// Field element standing in for the free-form entries.
    pub fn metadata_element(&self) -> Result<F, ImageError> {
        let mut h = blake3::Hasher::new_derive_key(METADATA_DST);
        h.update(&serde_json::to_vec(&self.metadata)?);
        Ok(F::from_le_bytes_mod_order(h.finalize().as_bytes()))
    }

    /// Message tail: `[entries, width, height]`.
    pub fn metadata_fields(&self) -> Result<[F; METADATA_FIELDS], ImageError> {
        Ok([self.metadata_element()?, F::from(self.width as u64), F::from(self.height as u64)])
    }

    /// Message signed for this image: packed pixel limbs, then the metadata
    /// fields. Always [`MESSAGE_LEN`] elements long.
    pub fn message(&self) -> Result<Vec<F>, ImageError> {
        let mut msg: Vec<F> =
            self.pixel_bytes().chunks(LIMB_BYTES).map(F::from_le_bytes_mod_order).collect();
        msg.extend_from_slice(&self.metadata_fields()?);
        Ok(msg)
    }

    /// Poseidon digest of [`Image::message`].
    pub fn digest(&self) -> Result<F, ImageError> {
        Ok(hash::hash_fields(&self.message()?))
    }
}
