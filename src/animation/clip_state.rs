use rustc_hash::FxHashMap;

use crate::animation::channel::AnimationChannel;
use crate::animation::values::{ChannelValue, TransformData, TriggerData};

/// How many times a clip instance plays before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LoopCount {
    /// `Finite(0)` and `Finite(1)` both play once, clamp and finish.
    Finite(u32),
    Infinite,
}

impl Default for LoopCount {
    fn default() -> Self {
        LoopCount::Finite(0)
    }
}

/// Handle returned when registering a listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Notified when a clip instance runs past its last sample.
pub trait AnimationListener {
    fn animation_finished(&mut self);
}

impl<F: FnMut()> AnimationListener for F {
    fn animation_finished(&mut self) {
        self();
    }
}

/// Playback state of one clip as driven by one manager.
pub struct AnimationClipState {
    active: bool,
    loop_count: LoopCount,
    time_scale: f64,
    start_time: f64,
    channel_data: FxHashMap<String, ChannelValue>,
    listeners: Vec<(ListenerId, Box<dyn AnimationListener>)>,
    next_listener_id: u64,
}

impl Default for AnimationClipState {
    fn default() -> Self {
        Self {
            active: true,
            loop_count: LoopCount::default(),
            time_scale: 1.0,
            start_time: 0.0,
            channel_data: FxHashMap::default(),
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }
}

impl std::fmt::Debug for AnimationClipState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationClipState")
            .field("active", &self.active)
            .field("loop_count", &self.loop_count)
            .field("time_scale", &self.time_scale)
            .field("start_time", &self.start_time)
            .field("channels", &self.channel_data.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl AnimationClipState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[must_use]
    pub fn loop_count(&self) -> LoopCount {
        self.loop_count
    }

    pub fn set_loop_count(&mut self, loop_count: LoopCount) {
        self.loop_count = loop_count;
    }

    #[must_use]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f64) {
        self.time_scale = time_scale;
    }

    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn set_start_time(&mut self, start_time: f64) {
        self.start_time = start_time;
    }

    // ========================================================================
    // Channel data
    // ========================================================================

    /// The value `channel` writes into, created on first access.
    pub fn apply_to(&mut self, channel: &AnimationChannel) -> &mut ChannelValue {
        // The key is only allocated on first insert.
        if !self.channel_data.contains_key(channel.name()) {
            self.channel_data
                .insert(channel.name().to_owned(), channel.create_state_data_object());
        }
        self.channel_data
            .get_mut(channel.name())
            .unwrap_or_else(|| unreachable!("entry inserted above"))
    }

    #[must_use]
    pub fn channel_data(&self) -> &FxHashMap<String, ChannelValue> {
        &self.channel_data
    }

    pub fn channel_data_mut(&mut self) -> &mut FxHashMap<String, ChannelValue> {
        &mut self.channel_data
    }

    #[must_use]
    pub fn transform_data(&self, channel_name: &str) -> Option<&TransformData> {
        self.channel_data.get(channel_name)?.as_transform()
    }

    #[must_use]
    pub fn trigger_data(&self, channel_name: &str) -> Option<&TriggerData> {
        self.channel_data.get(channel_name)?.as_trigger()
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    pub fn add_animation_listener(
        &mut self,
        listener: impl AnimationListener + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove_animation_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Notifies listeners in registration order. Does not deactivate.
    pub fn fire_animation_finished(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener.animation_finished();
        }
    }
}
