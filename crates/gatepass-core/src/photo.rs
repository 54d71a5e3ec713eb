//! Photo Payload Guard.
//!
//! A purely syntactic check on an embedded-image data string: the literal
//! `data:image/` prefix and a length ceiling. The image is never decoded. The
//! ceiling is advisory; the backend enforces its own hard limit.

use std::fmt;

use serde::Serialize;

use crate::{Error, Result};

/// Prefix every accepted photo payload starts with.
pub const DATA_IMAGE_PREFIX: &str = "data:image/";

/// Default advisory ceiling: 1 MiB of base64 text.
pub const DEFAULT_PHOTO_CEILING: usize = 1_048_576;

/// A non-blocking finding about an accepted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhotoWarning {
  PayloadTooLarge { len: usize, ceiling: usize },
}

impl fmt::Display for PhotoWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::PayloadTooLarge { len, ceiling } => write!(
        f,
        "photo payload is {len} characters, above the {ceiling} character \
         ceiling"
      ),
    }
  }
}

/// What the guard found in an accepted payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhotoCheck {
  /// Media subtype declared after the prefix (`jpeg`, `png`, ...).
  pub subtype:  Option<String>,
  pub warnings: Vec<PhotoWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoGuard {
  ceiling: usize,
}

impl Default for PhotoGuard {
  fn default() -> Self { Self { ceiling: DEFAULT_PHOTO_CEILING } }
}

impl PhotoGuard {
  pub fn with_ceiling(ceiling: usize) -> Self { Self { ceiling } }

  pub fn ceiling(&self) -> usize { self.ceiling }

  /// Check an optional payload. Absence is valid.
  pub fn check(&self, photo: Option<&str>) -> Result<PhotoCheck> {
    let Some(photo) = photo else {
      return Ok(PhotoCheck::default());
    };

    let Some(rest) = photo.strip_prefix(DATA_IMAGE_PREFIX) else {
      return Err(Error::InvalidPhotoFormat);
    };

    let subtype = rest
      .split([';', ','])
      .next()
      .filter(|s| !s.is_empty())
      .map(str::to_owned);

    let mut warnings = Vec::new();
    let len = photo.chars().count();
    if len > self.ceiling {
      tracing::warn!(len, ceiling = self.ceiling, "photo payload above ceiling");
      warnings.push(PhotoWarning::PayloadTooLarge { len, ceiling: self.ceiling });
    }

    Ok(PhotoCheck { subtype, warnings })
  }
}
