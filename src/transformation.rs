//! Transformation descriptors and parameter validation.
//!
//! A [`Transformation`] is what a holder asks the prover to apply. Parameters
//! are validated here, before any circuit is built; the compliance circuits
//! re-check the same bounds in-circuit.

#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{image::Image, N};

/// Inclusive crop rectangle `(x0, y0)–(x1, y1)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropParams {
    /// Left column.
    pub x0: usize,
    /// Top row.
    pub y0: usize,
    /// Right column (inclusive).
    pub x1: usize,
    /// Bottom row (inclusive).
    pub y1: usize,
}

/// Rejected transformation parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// A bound below zero.
    #[error("crop bound {name}={value} is negative")]
    Negative {
        /// Bound name (`x0`, `y0`, `x1`, `y1`).
        name: &'static str,
        /// Value supplied.
        value: i64,
    },
    /// A bound at or past the grid or image extent.
    #[error("crop bound {name}={value} is outside the {limit}-pixel extent")]
    OutOfRange {
        /// Bound name.
        name: &'static str,
        /// Value supplied.
        value: usize,
        /// Extent on that axis.
        limit: usize,
    },
    /// Lower bound greater than the upper bound on one axis.
    #[error("crop rectangle is inverted: {lo_name}={lo} > {hi_name}={hi}")]
    Inverted {
        /// `x0` or `y0`.
        lo_name: &'static str,
        /// Lower bound.
        lo: usize,
        /// `x1` or `y1`.
        hi_name: &'static str,
        /// Upper bound.
        hi: usize,
    },
}

impl CropParams {
    /// Unvalidated rectangle.
    pub const fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// The rectangle covering the whole grid; cropping to it is the identity.
    pub const fn full() -> Self {
        Self::new(0, 0, N - 1, N - 1)
    }

    /// The rectangle covering `image`'s current extent; cropping a chain
    /// image to it leaves the image unchanged.
    pub fn covering(image: &Image) -> Self {
        let (w, h) = image.extent();
        Self::new(0, 0, w.saturating_sub(1), h.saturating_sub(1))
    }

    /// Build from signed bounds, rejecting negatives and validating against
    /// the grid.
    pub fn try_from_signed(x0: i64, y0: i64, x1: i64, y1: i64) -> Result<Self, ParamError> {
        let conv = |name: &'static str, value: i64| {
            usize::try_from(value).map_err(|_| ParamError::Negative { name, value })
        };
        let p = Self::new(conv("x0", x0)?, conv("y0", y0)?, conv("x1", x1)?, conv("y1", y1)?);
        p.validate()?;
        Ok(p)
    }

    /// Columns kept.
    #[inline]
    pub fn width(&self) -> usize {
        (self.x1 + 1).saturating_sub(self.x0)
    }

    /// Rows kept.
    #[inline]
    pub fn height(&self) -> usize {
        (self.y1 + 1).saturating_sub(self.y0)
    }

    /// `0 ≤ x0 ≤ x1 < N` and `0 ≤ y0 ≤ y1 < N`.
    pub fn validate(&self) -> Result<(), ParamError> {
        self.validate_within(N, N)
    }

    /// Validate against an image's current extent (a cropped image cannot be
    /// cropped beyond what is left of it).
    pub fn validate_for(&self, image: &Image) -> Result<(), ParamError> {
        let (w, h) = image.extent();
        self.validate_within(w, h)
    }

    fn validate_within(&self, width: usize, height: usize) -> Result<(), ParamError> {
        for (name, value, limit) in
            [("x0", self.x0, width), ("x1", self.x1, width), ("y0", self.y0, height), ("y1", self.y1, height)]
        {
            if value >= limit {
                return Err(ParamError::OutOfRange { name, value, limit });
            }
        }
        if self.x0 > self.x1 {
            return Err(ParamError::Inverted { lo_name: "x0", lo: self.x0, hi_name: "x1", hi: self.x1 });
        }
        if self.y0 > self.y1 {
            return Err(ParamError::Inverted { lo_name: "y0", lo: self.y0, hi_name: "y1", hi: self.y1 });
        }
        Ok(())
    }
}

impl fmt::Display for CropParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})-({},{})", self.x0, self.y0, self.x1, self.y1)
    }
}

/// Which compliance predicate a proof was produced under.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceClass {
    /// The image is passed through unchanged.
    Identity,
    /// The image is cropped to a rectangle.
    Crop,
}

impl ComplianceClass {
    /// Lower-case name, as used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceClass::Identity => "identity",
            ComplianceClass::Crop => "crop",
        }
    }
}

impl fmt::Display for ComplianceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A permissible transformation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transformation {
    /// Keep the image as is.
    Identity,
    /// Keep the rectangle and move it to the top-left corner.
    Crop(CropParams),
}

impl Transformation {
    /// Validated crop from signed bounds.
    pub fn crop(x0: i64, y0: i64, x1: i64, y1: i64) -> Result<Self, ParamError> {
        Ok(Transformation::Crop(CropParams::try_from_signed(x0, y0, x1, y1)?))
    }

    /// Compliance class proving this transformation.
    pub fn class(&self) -> ComplianceClass {
        match self {
            Transformation::Identity => ComplianceClass::Identity,
            Transformation::Crop(_) => ComplianceClass::Crop,
        }
    }

    /// Rectangle this transformation keeps in `image`. Identity keeps the
    /// image's whole extent.
    pub fn crop_params(&self, image: &Image) -> CropParams {
        match self {
            Transformation::Identity => CropParams::covering(image),
            Transformation::Crop(p) => *p,
        }
    }

    /// Check the parameters against `image`; Identity is always valid.
    pub fn validate_for(&self, image: &Image) -> Result<(), ParamError> {
        match self {
            Transformation::Identity => Ok(()),
            Transformation::Crop(p) => {
                p.validate()?;
                p.validate_for(image)
            }
        }
    }

    /// Apply to a copy of `image`.
    pub fn apply(&self, image: &Image) -> Result<Image, ParamError> {
        self.validate_for(image)?;
        Ok(match self {
            Transformation::Identity => image.clone(),
            Transformation::Crop(p) => image.cropped(p),
        })
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformation::Identity => f.write_str("identity"),
            Transformation::Crop(p) => write!(f, "crop{p}"),
        }
    }
}
