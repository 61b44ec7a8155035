//! Animation and transition hints attached to build results.
//!
//! Components describe animations declaratively; the container decides how to
//! run them. Hints are collected per phase: `Initial` for nodes whose scope is
//! new in a build, `Change` for nodes whose scope was carried over, and
//! `Final` for views the mount coordinator removes.
//!
//! Animations of one phase can be grouped: a parallel group starts every
//! member together, a sequence starts each member when the previous one ends.

use std::fmt;
use std::time::Duration;

use crate::component::AttributeValue;
use crate::scope::ScopePath;

/// Duration the container uses when an animation leaves it unset.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationPhase {
    Initial,
    Change,
    Final,
}

/// Pacing of an animation over its duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimingFunction {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Parallel,
    Sequence,
}

/// What an animation drives.
#[derive(Clone, Debug, PartialEq)]
pub enum AnimationTarget {
    Property {
        key_path: &'static str,
        /// Start value for initial animations, end value for final ones.
        value: Option<AttributeValue>,
    },
    Group {
        kind: GroupKind,
        members: Vec<Animation>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnimationError {
    /// A group was built without members.
    EmptyGroup,
    /// Group members belong to different phases.
    MixedPhases {
        expected: AnimationPhase,
        found: AnimationPhase,
    },
}

impl fmt::Display for AnimationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimationError::EmptyGroup => f.write_str("animation group has no members"),
            AnimationError::MixedPhases { expected, found } => write!(
                f,
                "grouped animations must share a phase: expected {expected:?}, found {found:?}"
            ),
        }
    }
}

impl std::error::Error for AnimationError {}

#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    pub target: AnimationTarget,
    pub phase: AnimationPhase,
    /// `None` lets the container pick its default duration. Sequences ignore
    /// it and take the sum of their members.
    pub duration: Option<Duration>,
    pub delay: Duration,
    pub function: TimingFunction,
}

impl Animation {
    fn with_phase(key_path: &'static str, phase: AnimationPhase, value: Option<AttributeValue>) -> Self {
        Self {
            target: AnimationTarget::Property { key_path, value },
            phase,
            duration: None,
            delay: Duration::ZERO,
            function: TimingFunction::Linear,
        }
    }

    /// Animates `key_path` from `from` to its mounted value.
    pub fn initial(key_path: &'static str, from: impl Into<AttributeValue>) -> Self {
        Self::with_phase(key_path, AnimationPhase::Initial, Some(from.into()))
    }

    /// Animates `key_path` between its previous and new mounted values.
    pub fn change(key_path: &'static str) -> Self {
        Self::with_phase(key_path, AnimationPhase::Change, None)
    }

    /// Animates `key_path` towards `to` before the view is removed.
    pub fn to_final(key_path: &'static str, to: impl Into<AttributeValue>) -> Self {
        Self::with_phase(key_path, AnimationPhase::Final, Some(to.into()))
    }

    /// Runs `members` together. Fails unless they share one phase.
    pub fn parallel(members: impl IntoIterator<Item = Animation>) -> Result<Self, AnimationError> {
        Self::group(GroupKind::Parallel, members.into_iter().collect())
    }

    /// Runs `members` one after another. Fails unless they share one phase.
    pub fn sequence(members: impl IntoIterator<Item = Animation>) -> Result<Self, AnimationError> {
        Self::group(GroupKind::Sequence, members.into_iter().collect())
    }

    fn group(kind: GroupKind, members: Vec<Animation>) -> Result<Self, AnimationError> {
        let phase = members.first().ok_or(AnimationError::EmptyGroup)?.phase;
        if let Some(other) = members.iter().find(|member| member.phase != phase) {
            return Err(AnimationError::MixedPhases {
                expected: phase,
                found: other.phase,
            });
        }
        Ok(Self {
            target: AnimationTarget::Group { kind, members },
            phase,
            duration: None,
            delay: Duration::ZERO,
            function: TimingFunction::Linear,
        })
    }

    /// Key path of a property animation; `None` for groups.
    pub fn key_path(&self) -> Option<&'static str> {
        match &self.target {
            AnimationTarget::Property { key_path, .. } => Some(*key_path),
            AnimationTarget::Group { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&AttributeValue> {
        match &self.target {
            AnimationTarget::Property { value, .. } => value.as_ref(),
            AnimationTarget::Group { .. } => None,
        }
    }

    pub fn members(&self) -> &[Animation] {
        match &self.target {
            AnimationTarget::Group { members, .. } => members,
            AnimationTarget::Property { .. } => &[],
        }
    }

    /// Time from the start of the animation, delay excluded, until it ends.
    pub fn total_duration(&self) -> Duration {
        match &self.target {
            AnimationTarget::Property { .. } => self.duration.unwrap_or(DEFAULT_DURATION),
            AnimationTarget::Group {
                kind: GroupKind::Parallel,
                members,
            } => self.duration.unwrap_or_else(|| {
                members
                    .iter()
                    .map(|member| member.delay + member.total_duration())
                    .max()
                    .unwrap_or(Duration::ZERO)
            }),
            AnimationTarget::Group {
                kind: GroupKind::Sequence,
                members,
            } => members.iter().map(Animation::total_duration).sum(),
        }
    }

    /// Start of each member relative to the start of the group.
    pub fn member_offsets(&self) -> Vec<Duration> {
        match &self.target {
            AnimationTarget::Property { .. } => Vec::new(),
            AnimationTarget::Group {
                kind: GroupKind::Parallel,
                members,
            } => members.iter().map(|member| member.delay).collect(),
            AnimationTarget::Group {
                kind: GroupKind::Sequence,
                members,
            } => {
                let mut begin = Duration::ZERO;
                members
                    .iter()
                    .map(|member| {
                        let offset = begin;
                        begin += member.total_duration();
                        offset
                    })
                    .collect()
            }
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Ease-in pacing, optionally setting the duration as well.
    pub fn ease_in(mut self, duration: Option<Duration>) -> Self {
        self.function = TimingFunction::EaseIn;
        if duration.is_some() {
            self.duration = duration;
        }
        self
    }

    pub fn ease_out(mut self, duration: Option<Duration>) -> Self {
        self.function = TimingFunction::EaseOut;
        if duration.is_some() {
            self.duration = duration;
        }
        self
    }
}

pub mod key_path {
    pub const OPACITY: &str = "opacity";
    pub const POSITION: &str = "position";
    pub const TRANSLATION_X: &str = "transform.translation.x";
    pub const TRANSLATION_Y: &str = "transform.translation.y";
    pub const SCALE: &str = "transform.scale";
    pub const SCALE_X: &str = "transform.scale.x";
    pub const SCALE_Y: &str = "transform.scale.y";
    pub const ROTATION: &str = "transform.rotation";
    pub const BACKGROUND_COLOR: &str = "backgroundColor";
    pub const BORDER_COLOR: &str = "borderColor";
}

macro_rules! presets {
    ($($from:ident, $to:ident, $key:ident, $ty:ty;)*) => {
        impl Animation {
            $(
                pub fn $from(from: $ty) -> Self {
                    Self::initial(key_path::$key, from)
                }

                pub fn $to(to: $ty) -> Self {
                    Self::to_final(key_path::$key, to)
                }
            )*
        }
    };
}

presets! {
    alpha_from, alpha_to, OPACITY, f32;
    translation_x_from, translation_x_to, TRANSLATION_X, f32;
    translation_y_from, translation_y_to, TRANSLATION_Y, f32;
    scale_from, scale_to, SCALE, f32;
    scale_x_from, scale_x_to, SCALE_X, f32;
    scale_y_from, scale_y_to, SCALE_Y, f32;
    rotation_from, rotation_to, ROTATION, f32;
    background_color_from, background_color_to, BACKGROUND_COLOR, &str;
    border_color_from, border_color_to, BORDER_COLOR, &str;
}

impl Animation {
    pub fn alpha() -> Self {
        Self::change(key_path::OPACITY)
    }

    pub fn position() -> Self {
        Self::change(key_path::POSITION)
    }

    pub fn background_color() -> Self {
        Self::change(key_path::BACKGROUND_COLOR)
    }

    pub fn border_color() -> Self {
        Self::change(key_path::BORDER_COLOR)
    }
}

/// An animation bound to the node that requested it.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationHint {
    pub path: ScopePath,
    pub animation: Animation,
}
