use std::sync::{Arc, Weak};

use rustc_hash::FxHashMap;

use crate::animation::blend_tree::{BlendNode, BlendTreeApplier};
use crate::animation::clip::{AnimationClip, ClipId};
use crate::animation::clip_state::{AnimationClipState, LoopCount};
use crate::errors::{Result, SinewError};
use crate::settings::ClipPlayback;
use crate::skeleton::SkeletonPose;
use crate::utils::time::Clock;

struct ClipStateEntry {
    clip: Weak<AnimationClip>,
    state: AnimationClipState,
}

/// Per-manager playback state of every clip it has touched, keyed by clip.
///
/// Entries are created on first access and removed explicitly, either one at
/// a time or by reclaiming the states of clips that are no longer alive.
#[derive(Default)]
pub struct ClipStates {
    entries: FxHashMap<ClipId, ClipStateEntry>,
}

impl ClipStates {
    #[must_use]
    pub fn get(&self, clip: ClipId) -> Option<&AnimationClipState> {
        self.entries.get(&clip).map(|e| &e.state)
    }

    pub fn get_mut(&mut self, clip: ClipId) -> Option<&mut AnimationClipState> {
        self.entries.get_mut(&clip).map(|e| &mut e.state)
    }

    /// Fetches the state for `clip`, creating it with `start_time` if absent.
    pub fn get_or_insert(
        &mut self,
        clip: &Arc<AnimationClip>,
        start_time: f64,
    ) -> &mut AnimationClipState {
        &mut self
            .entries
            .entry(clip.id())
            .or_insert_with(|| {
                let mut state = AnimationClipState::new();
                state.set_start_time(start_time);
                ClipStateEntry {
                    clip: Arc::downgrade(clip),
                    state,
                }
            })
            .state
    }

    pub fn remove(&mut self, clip: ClipId) -> Option<AnimationClipState> {
        self.entries.remove(&clip).map(|e| e.state)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops states whose clip has been dropped everywhere.
    pub fn reclaim_orphaned(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.clip.strong_count() > 0);
        before - self.entries.len()
    }

    fn active_clips(&self) -> impl Iterator<Item = Arc<AnimationClip>> + '_ {
        self.entries
            .values()
            .filter(|e| e.state.is_active())
            .filter_map(|e| e.clip.upgrade())
    }
}

/// Drives the clips applied to one skeleton pose against a shared clock.
///
/// Each [`update`](Self::update) advances every active clip, then runs the
/// blend tree applier once to resolve the clip outputs into the pose.
pub struct AnimationManager {
    clock: Arc<dyn Clock>,
    pose: SkeletonPose,
    clips: Vec<Arc<AnimationClip>>,
    clip_states: ClipStates,
    blend_root: Option<BlendNode>,
    applier: Option<Box<dyn BlendTreeApplier>>,
}

impl AnimationManager {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, pose: SkeletonPose) -> Self {
        Self {
            clock,
            pose,
            clips: Vec::new(),
            clip_states: ClipStates::default(),
            blend_root: None,
            applier: None,
        }
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    #[must_use]
    pub fn pose(&self) -> &SkeletonPose {
        &self.pose
    }

    pub fn pose_mut(&mut self) -> &mut SkeletonPose {
        &mut self.pose
    }

    // ========================================================================
    // Update loop
    // ========================================================================

    /// Advances all active clips to the clock's current time and applies the
    /// blend tree to the pose.
    ///
    /// Fails without touching any state when no applier is set.
    pub fn update(&mut self) -> Result<()> {
        let Some(applier) = self.applier.as_mut() else {
            return Err(SinewError::MissingCollaborator("blend tree applier"));
        };

        let global_time = self.clock.now_seconds();

        for clip in &self.clips {
            let state = self.clip_states.get_or_insert(clip, global_time);
            if !state.is_active() {
                continue;
            }

            let max_time = clip.max_time_index();
            if max_time <= 0.0 {
                continue;
            }

            let mut clock_time = state.time_scale() * (global_time - state.start_time());

            let wrap = match state.loop_count() {
                LoopCount::Infinite => true,
                LoopCount::Finite(n) => n > 1 && max_time * f64::from(n) <= clock_time,
            };
            if wrap {
                clock_time %= max_time;
            }

            if clock_time > max_time {
                clock_time = max_time;
                log::debug!("Clip '{}' finished at {global_time:.3}s", clip.name());
                state.set_active(false);
                state.fire_animation_finished();
            }

            clip.update(clock_time, state);
        }

        applier.apply_to(&mut self.pose, self.blend_root.as_ref(), &mut self.clip_states);
        Ok(())
    }

    // ========================================================================
    // Clip states
    // ========================================================================

    /// The state of `clip` for this manager, created (starting now) on first use.
    pub fn clip_state(&mut self, clip: &Arc<AnimationClip>) -> &mut AnimationClipState {
        let now = self.clock.now_seconds();
        self.clip_states.get_or_insert(clip, now)
    }

    /// The state of `clip` if it already exists.
    #[must_use]
    pub fn find_clip_state(&self, clip: &AnimationClip) -> Option<&AnimationClipState> {
        self.clip_states.get(clip.id())
    }

    #[must_use]
    pub fn clip_states(&self) -> &ClipStates {
        &self.clip_states
    }

    /// Restarts `clip` from its beginning, whatever its previous state.
    pub fn reset_clip(&mut self, clip: &Arc<AnimationClip>) {
        let now = self.clock.now_seconds();
        let state = self.clip_states.get_or_insert(clip, now);
        state.set_start_time(now);
        state.set_active(true);
    }

    /// Applies playback settings to `clip`'s state.
    pub fn configure_clip(&mut self, clip: &Arc<AnimationClip>, playback: &ClipPlayback) {
        let state = self.clip_state(clip);
        state.set_loop_count(playback.loop_count);
        state.set_time_scale(playback.time_scale);
    }

    /// Clears `store` and fills it with the clips whose state is active.
    pub fn active_clips<'a>(
        &self,
        store: &'a mut Vec<Arc<AnimationClip>>,
    ) -> &'a mut Vec<Arc<AnimationClip>> {
        store.clear();
        store.extend(self.clip_states.active_clips());
        store
    }

    /// Drops the states of clips that no longer exist anywhere.
    pub fn reclaim_orphaned_states(&mut self) -> usize {
        let reclaimed = self.clip_states.reclaim_orphaned();
        if reclaimed > 0 {
            log::debug!("Reclaimed {reclaimed} orphaned clip state(s)");
        }
        reclaimed
    }

    // ========================================================================
    // Clips & blend tree
    // ========================================================================

    pub fn add_clip(&mut self, clip: Arc<AnimationClip>) {
        self.clips.push(clip);
    }

    /// Removes `clip` from the update list and drops its state.
    pub fn remove_clip(&mut self, clip: &AnimationClip) -> bool {
        let Some(index) = self.clips.iter().position(|c| c.id() == clip.id()) else {
            return false;
        };
        self.clips.remove(index);
        self.clip_states.remove(clip.id());
        true
    }

    #[must_use]
    pub fn clips(&self) -> &[Arc<AnimationClip>] {
        &self.clips
    }

    pub fn set_applier(&mut self, applier: impl BlendTreeApplier + 'static) {
        self.applier = Some(Box::new(applier));
    }

    pub fn applier_mut(&mut self) -> Option<&mut (dyn BlendTreeApplier + 'static)> {
        self.applier.as_deref_mut()
    }

    pub fn set_blend_root(&mut self, root: BlendNode) {
        self.blend_root = Some(root);
    }

    #[must_use]
    pub fn blend_root(&self) -> Option<&BlendNode> {
        self.blend_root.as_ref()
    }

    pub fn blend_root_mut(&mut self) -> Option<&mut BlendNode> {
        self.blend_root.as_mut()
    }
}
