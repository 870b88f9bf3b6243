use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::animation::channel::AnimationChannel;
use crate::animation::clip_state::AnimationClipState;
use crate::errors::Result;

static NEXT_CLIP_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an [`AnimationClip`], used to key per-manager state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(u64);

impl ClipId {
    fn next() -> Self {
        Self(NEXT_CLIP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Deserialize)]
struct RawAnimationClip {
    name: String,
    channels: Vec<AnimationChannel>,
}

impl From<RawAnimationClip> for AnimationClip {
    fn from(raw: RawAnimationClip) -> Self {
        AnimationClip::new(raw.name, raw.channels)
    }
}

/// A named set of channels forming one animation ("walk", "run"...).
///
/// Clips are immutable during playback and are usually shared behind an
/// `Arc` by every manager that plays them. Playback state lives in
/// [`AnimationClipState`], never in the clip.
#[derive(Debug, Serialize, Deserialize)]
#[serde(from = "RawAnimationClip")]
pub struct AnimationClip {
    #[serde(skip_serializing)]
    id: ClipId,
    name: String,
    channels: Vec<AnimationChannel>,
    #[serde(skip_serializing)]
    max_time: f64,
}

impl Clone for AnimationClip {
    /// The copy is a distinct clip with its own identity.
    fn clone(&self) -> Self {
        Self::new(self.name.clone(), self.channels.clone())
    }
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: impl Into<String>, channels: Vec<AnimationChannel>) -> Self {
        let mut clip = Self {
            id: ClipId::next(),
            name: name.into(),
            channels,
            max_time: 0.0,
        };
        clip.update_max_time_index();
        clip
    }

    #[must_use]
    pub fn id(&self) -> ClipId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn channels(&self) -> &[AnimationChannel] {
        &self.channels
    }

    /// Samples every channel at `clip_time` into `state`.
    pub fn update(&self, clip_time: f64, state: &mut AnimationClipState) {
        for channel in &self.channels {
            let value = state.apply_to(channel);
            channel.update_sample(clip_time, value);
        }
    }

    pub fn add_channel(&mut self, channel: impl Into<AnimationChannel>) {
        self.channels.push(channel.into());
        self.update_max_time_index();
    }

    #[must_use]
    pub fn find_channel_by_name(&self, name: &str) -> Option<&AnimationChannel> {
        self.channels.iter().find(|c| c.name() == name)
    }

    /// Removes the first channel called `name`.
    pub fn remove_channel(&mut self, name: &str) -> Option<AnimationChannel> {
        let index = self.channels.iter().position(|c| c.name() == name)?;
        let channel = self.channels.remove(index);
        self.update_max_time_index();
        Some(channel)
    }

    /// Largest final sample time over all channels, 0 for an empty clip.
    #[must_use]
    pub fn max_time_index(&self) -> f64 {
        self.max_time
    }

    fn update_max_time_index(&mut self) {
        self.max_time = self
            .channels
            .iter()
            .map(AnimationChannel::max_time)
            .fold(0.0_f64, f64::max);
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl std::fmt::Display for AnimationClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AnimationClip '{}' [channel count={}, max time={}]",
            self.name,
            self.channels.len(),
            self.max_time
        )
    }
}
