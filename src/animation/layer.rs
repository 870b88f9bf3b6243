//! Animation Layers
//!
//! An [`AnimationLayer`] is a small state machine over blend trees. Each
//! [`SteadyState`] owns a blend tree root and a set of keyword
//! [`Transition`]s; an optional end transition runs once every clip of the
//! state has finished. A transition with a fade time cross-fades from the
//! current state to its target through a [`BinaryLerpSource`] whose weight
//! follows the manager's clock.
//!
//! The layer never applies anything itself. Call [`AnimationLayer::update`]
//! before [`AnimationManager::update`]; it installs the blend root the manager
//! then resolves in its single apply step.
//!
//! ```rust,ignore
//! let mut layer = AnimationLayer::new("base");
//! let mut idle = SteadyState::new("idle", ClipSource::new(idle_clip).into());
//! idle.add_transition("walk", Transition::fade("walk", 0.3, BlendType::SCurve3));
//! layer.add_steady_state(idle);
//! layer.add_steady_state(SteadyState::new("walk", ClipSource::new(walk_clip).into()));
//! layer.set_current_state("idle", &mut manager)?;
//!
//! // on input
//! layer.do_transition("walk", &mut manager)?;
//!
//! // every frame
//! layer.update(&mut manager)?;
//! manager.update()?;
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::animation::blend_tree::{BinaryLerpSource, BlendNode};
use crate::animation::clip::AnimationClip;
use crate::animation::manager::AnimationManager;
use crate::errors::{Result, SinewError};

// ============================================================================
// Transitions
// ============================================================================

/// Shape of the weight curve over a fade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlendType {
    #[default]
    Linear,
    /// `3t² - 2t³`
    SCurve3,
    /// `6t⁵ - 15t⁴ + 10t³`
    SCurve5,
}

impl BlendType {
    /// Maps fade progress in `[0, 1]` to the weight of the target state.
    #[must_use]
    pub fn weight(self, progress: f64) -> f64 {
        let t = progress.clamp(0.0, 1.0);
        match self {
            BlendType::Linear => t,
            BlendType::SCurve3 => t * t * (3.0 - 2.0 * t),
            BlendType::SCurve5 => t * t * t * (t * (6.0 * t - 15.0) + 10.0),
        }
    }
}

/// A move to the steady state named `target_state`.
///
/// With `fade_time <= 0` the target takes over at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub target_state: String,
    pub fade_time: f64,
    pub blend_type: BlendType,
}

impl Transition {
    #[must_use]
    pub fn fade(target_state: impl Into<String>, fade_time: f64, blend_type: BlendType) -> Self {
        Self {
            target_state: target_state.into(),
            fade_time,
            blend_type,
        }
    }

    #[must_use]
    pub fn immediate(target_state: impl Into<String>) -> Self {
        Self::fade(target_state, 0.0, BlendType::Linear)
    }
}

// ============================================================================
// States
// ============================================================================

/// A named state playing one blend tree.
#[derive(Debug, Clone)]
pub struct SteadyState {
    name: String,
    source: BlendNode,
    transitions: FxHashMap<String, Transition>,
    end_transition: Option<Transition>,
}

impl SteadyState {
    #[must_use]
    pub fn new(name: impl Into<String>, source: BlendNode) -> Self {
        Self {
            name: name.into(),
            source,
            transitions: FxHashMap::default(),
            end_transition: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source(&self) -> &BlendNode {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut BlendNode {
        &mut self.source
    }

    /// Registers `transition` under `keyword`, returning the one it replaces.
    pub fn add_transition(
        &mut self,
        keyword: impl Into<String>,
        transition: Transition,
    ) -> Option<Transition> {
        self.transitions.insert(keyword.into(), transition)
    }

    pub fn remove_transition(&mut self, keyword: &str) -> Option<Transition> {
        self.transitions.remove(keyword)
    }

    #[must_use]
    pub fn transition(&self, keyword: &str) -> Option<&Transition> {
        self.transitions.get(keyword)
    }

    #[must_use]
    pub fn end_transition(&self) -> Option<&Transition> {
        self.end_transition.as_ref()
    }

    pub fn set_end_transition(&mut self, transition: Option<Transition>) {
        self.end_transition = transition;
    }
}

/// A cross-fade in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Fade {
    pub from: String,
    pub to: String,
    pub start_time: f64,
    pub fade_time: f64,
    pub blend_type: BlendType,
}

impl Fade {
    /// Weight of `to` at `global_time`.
    #[must_use]
    pub fn weight(&self, global_time: f64) -> f64 {
        self.blend_type.weight(self.progress(global_time))
    }

    fn progress(&self, global_time: f64) -> f64 {
        ((global_time - self.start_time) / self.fade_time).clamp(0.0, 1.0)
    }
}

/// What a layer is currently playing.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LayerState {
    /// Nothing; the last installed blend root stays on the manager.
    #[default]
    Idle,
    Steady(String),
    Fading(Fade),
}

// ============================================================================
// Layer
// ============================================================================

/// State machine selecting the blend tree root of an [`AnimationManager`].
#[derive(Debug, Clone, Default)]
pub struct AnimationLayer {
    name: String,
    states: FxHashMap<String, SteadyState>,
    current: LayerState,
}

impl AnimationLayer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `state`, returning a previous state of the same name.
    pub fn add_steady_state(&mut self, state: SteadyState) -> Option<SteadyState> {
        self.states.insert(state.name.clone(), state)
    }

    #[must_use]
    pub fn steady_state(&self, name: &str) -> Option<&SteadyState> {
        self.states.get(name)
    }

    pub fn steady_state_mut(&mut self, name: &str) -> Option<&mut SteadyState> {
        self.states.get_mut(name)
    }

    #[must_use]
    pub fn current_state(&self) -> &LayerState {
        &self.current
    }

    /// Jumps straight to state `name`, restarting its clips.
    pub fn set_current_state(&mut self, name: &str, manager: &mut AnimationManager) -> Result<()> {
        let state = self.find_state(name)?;
        start_clips(state.source(), manager);
        manager.set_blend_root(state.source.clone());
        self.current = LayerState::Steady(name.to_owned());
        Ok(())
    }

    /// Follows the transition registered under `keyword` on the current state.
    ///
    /// During a fade the keyword is looked up on the fade's target. Returns
    /// `Ok(false)` when there is no such transition.
    pub fn do_transition(&mut self, keyword: &str, manager: &mut AnimationManager) -> Result<bool> {
        let transition = match &self.current {
            LayerState::Idle => None,
            LayerState::Steady(name) | LayerState::Fading(Fade { to: name, .. }) => {
                self.find_state(name)?.transition(keyword).cloned()
            }
        };
        let Some(transition) = transition else {
            return Ok(false);
        };
        self.begin(&transition, manager)?;
        Ok(true)
    }

    /// Advances fades and end transitions, then installs the blend root for
    /// this frame.
    pub fn update(&mut self, manager: &mut AnimationManager) -> Result<()> {
        let now = manager.clock().now_seconds();

        match &self.current {
            LayerState::Idle => return Ok(()),
            LayerState::Steady(name) => {
                let state = self.find_state(name)?;
                if !state.source.is_active(manager.clip_states()) {
                    match state.end_transition.clone() {
                        Some(transition) => self.begin(&transition, manager)?,
                        None => {
                            log::debug!("Layer '{}': state '{name}' ended", self.name);
                            self.current = LayerState::Idle;
                            return Ok(());
                        }
                    }
                }
            }
            LayerState::Fading(fade) => {
                if fade.progress(now) >= 1.0 {
                    let to = fade.to.clone();
                    log::debug!("Layer '{}': faded into '{to}'", self.name);
                    self.current = LayerState::Steady(to);
                }
            }
        }

        let root = self.blend_root(now)?;
        manager.set_blend_root(root);
        Ok(())
    }

    fn begin(&mut self, transition: &Transition, manager: &mut AnimationManager) -> Result<()> {
        let target = self.find_state(&transition.target_state)?;
        start_clips(target.source(), manager);

        let from = match &self.current {
            LayerState::Steady(name) => Some(name.clone()),
            LayerState::Fading(fade) => Some(fade.to.clone()),
            LayerState::Idle => None,
        };
        self.current = match from {
            Some(from) if transition.fade_time > 0.0 && from != transition.target_state => {
                LayerState::Fading(Fade {
                    from,
                    to: transition.target_state.clone(),
                    start_time: manager.clock().now_seconds(),
                    fade_time: transition.fade_time,
                    blend_type: transition.blend_type,
                })
            }
            _ => LayerState::Steady(transition.target_state.clone()),
        };
        log::debug!(
            "Layer '{}': transition to '{}'",
            self.name,
            transition.target_state
        );
        Ok(())
    }

    fn blend_root(&self, global_time: f64) -> Result<BlendNode> {
        match &self.current {
            LayerState::Idle => Err(SinewError::invalid(format!(
                "layer '{}' has no current state",
                self.name
            ))),
            LayerState::Steady(name) => Ok(self.find_state(name)?.source.clone()),
            LayerState::Fading(fade) => Ok(BinaryLerpSource::new(
                self.find_state(&fade.from)?.source.clone(),
                self.find_state(&fade.to)?.source.clone(),
                fade.weight(global_time),
            )
            .into()),
        }
    }

    fn find_state(&self, name: &str) -> Result<&SteadyState> {
        self.states.get(name).ok_or_else(|| {
            SinewError::invalid(format!("layer '{}' has no state '{name}'", self.name))
        })
    }
}

/// Registers the clips of `source` with `manager` and restarts them now.
fn start_clips(source: &BlendNode, manager: &mut AnimationManager) {
    let mut clips: Vec<Arc<AnimationClip>> = Vec::new();
    source.collect_clips(&mut clips);
    for clip in &clips {
        if !manager.clips().iter().any(|c| c.id() == clip.id()) {
            manager.add_clip(clip.clone());
        }
        manager.reset_clip(clip);
    }
}
