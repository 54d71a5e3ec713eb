//! Camera capture state machine.
//!
//! Acquiring a camera walks a fixed cascade of facing constraints (rear, then
//! front, then whatever the device offers) before giving up. The machine is
//! pure: the caller performs the media request and feeds the outcome back as
//! a [`CaptureEvent`].
//!
//! ```text
//!  Idle ──Start──▶ Requesting ──Granted──▶ Streaming ──Capture──▶ Reviewing
//!   ▲                │   ▲                    ▲                    │    │
//!   │        Failed  │   │ Failed (fallback)  └──────Retake────────┘    │
//!   │                ▼   │                                              │
//!   └──Reset──── Error ◀─┘                                   Confirm ───┘
//! ```

use std::fmt;

use thiserror::Error;

use crate::photo::{PhotoGuard, PhotoWarning};

/// The camera constraint a request is made with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Facing {
  /// Rear camera; preferred for photographing a visitor at the gate.
  Environment,
  /// Front camera.
  User,
  /// No facing constraint at all.
  Any,
}

/// Constraints tried in order until one is granted.
pub const FALLBACK_CASCADE: [Facing; 3] =
  [Facing::Environment, Facing::User, Facing::Any];

impl Facing {
  /// The constraint to try after this one fails, if any.
  pub fn fallback(self) -> Option<Facing> {
    let i = FALLBACK_CASCADE.iter().position(|f| *f == self)?;
    FALLBACK_CASCADE.get(i + 1).copied()
  }
}

/// Why acquiring or using the camera failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CameraFailure {
  #[error("camera permission denied")]
  PermissionDenied,
  #[error("no camera matches the requested constraint")]
  ConstraintUnsatisfied,
  #[error("no camera device found")]
  NoDevice,
  #[error("camera is in use by another application")]
  DeviceBusy,
  #[error("camera access is not supported here")]
  Unsupported,
  #[error("captured frame is not an embeddable image")]
  InvalidPhoto,
}

impl CameraFailure {
  /// Whether a different constraint might succeed where this one failed.
  pub fn falls_back(self) -> bool {
    matches!(
      self,
      Self::ConstraintUnsatisfied | Self::NoDevice | Self::DeviceBusy
    )
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
  Idle,
  Requesting { facing: Facing },
  Streaming { facing: Facing },
  Reviewing {
    facing:   Facing,
    photo:    String,
    warnings: Vec<PhotoWarning>,
  },
  Error { reason: CameraFailure },
}

impl CaptureState {
  fn name(&self) -> &'static str {
    match self {
      Self::Idle => "idle",
      Self::Requesting { .. } => "requesting",
      Self::Streaming { .. } => "streaming",
      Self::Reviewing { .. } => "reviewing",
      Self::Error { .. } => "error",
    }
  }
}

impl fmt::Display for CaptureState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
  Start,
  Granted,
  Failed(CameraFailure),
  /// A frame was grabbed as an embedded-image data string.
  Capture(String),
  Retake,
  Confirm,
  Reset,
}

impl CaptureEvent {
  fn name(&self) -> &'static str {
    match self {
      Self::Start => "start",
      Self::Granted => "granted",
      Self::Failed(_) => "failed",
      Self::Capture(_) => "capture",
      Self::Retake => "retake",
      Self::Confirm => "confirm",
      Self::Reset => "reset",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{event} is not valid while {state}")]
pub struct InvalidTransition {
  pub state: &'static str,
  pub event: &'static str,
}

/// A camera session for one visitor photo.
#[derive(Debug, Clone)]
pub struct CaptureSession {
  state: CaptureState,
  guard: PhotoGuard,
}

impl Default for CaptureSession {
  fn default() -> Self { Self::new(PhotoGuard::default()) }
}

impl CaptureSession {
  pub fn new(guard: PhotoGuard) -> Self {
    Self { state: CaptureState::Idle, guard }
  }

  pub fn state(&self) -> &CaptureState { &self.state }

  /// Apply `event`. Returns the accepted photo when a review is confirmed.
  ///
  /// An invalid event leaves the state unchanged.
  pub fn handle(
    &mut self,
    event: CaptureEvent,
  ) -> Result<Option<String>, InvalidTransition> {
    use CaptureEvent as E;
    use CaptureState as S;

    let current = std::mem::replace(&mut self.state, S::Idle);
    let (next, confirmed) = match (current, event) {
      (_, E::Reset) => (S::Idle, None),

      (S::Idle | S::Error { .. }, E::Start) => {
        (S::Requesting { facing: FALLBACK_CASCADE[0] }, None)
      }

      (S::Requesting { facing }, E::Granted) => (S::Streaming { facing }, None),

      (S::Requesting { facing }, E::Failed(reason)) => {
        match facing.fallback().filter(|_| reason.falls_back()) {
          Some(next) => {
            tracing::debug!(%facing, %next, %reason, "camera constraint failed, falling back");
            (S::Requesting { facing: next }, None)
          }
          None => (S::Error { reason }, None),
        }
      }

      (S::Streaming { .. }, E::Failed(reason)) => (S::Error { reason }, None),

      (S::Streaming { facing }, E::Capture(photo)) => {
        match self.guard.check(Some(&photo)) {
          Ok(check) => (
            S::Reviewing { facing, photo, warnings: check.warnings },
            None,
          ),
          Err(_) => (S::Error { reason: CameraFailure::InvalidPhoto }, None),
        }
      }

      (S::Reviewing { facing, .. }, E::Retake) => (S::Streaming { facing }, None),

      (S::Reviewing { photo, .. }, E::Confirm) => (S::Idle, Some(photo)),

      (current, event) => {
        let err = InvalidTransition { state: current.name(), event: event.name() };
        self.state = current;
        return Err(err);
      }
    };

    if let S::Error { reason } = &next {
      tracing::warn!(%reason, "camera capture failed");
    }
    self.state = next;
    Ok(confirmed)
  }
}
