//! Frame-index sprite animation.
//!
//! An `Animation` walks a fixed list of sprite-sheet frame indices at a fixed
//! per-frame duration. Elapsed time is carried over between frames (the
//! duration is subtracted, not reset) so playback speed stays correct when the
//! tick rate varies.
//!
//! State machine: stopped -> playing -> (looping: stays playing, wraps to 0)
//! or (one-shot: pinned on the last frame, playing = false).

use serde::Deserialize;

/// Serializable description of a clip, as it appears in sheet tables and
/// config files.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AnimationDef {
    pub frames: Vec<usize>,
    pub frame_duration: f32,
    #[serde(default)]
    pub looping: bool,
}

impl AnimationDef {
    pub fn new(frames: &[usize], frame_duration: f32, looping: bool) -> Self {
        Self {
            frames: frames.to_vec(),
            frame_duration,
            looping,
        }
    }

    /// Contiguous run of `count` frames starting at `first`.
    pub fn range(first: usize, count: usize, frame_duration: f32, looping: bool) -> Self {
        Self {
            frames: (first..first + count).collect(),
            frame_duration,
            looping,
        }
    }

    pub fn validate(&self, name: &str) -> Result<(), String> {
        if self.frames.is_empty() {
            return Err(format!("Animation '{name}' has no frames"));
        }
        if !(self.frame_duration > 0.0) {
            return Err(format!(
                "Animation '{name}' has non-positive frame_duration {}",
                self.frame_duration
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<usize>,
    frame_duration: f32,
    looping: bool,
    current_frame: usize,
    timer: f32,
    playing: bool,
}

impl Animation {
    /// An empty frame list is replaced by a single frame 0 so every read has
    /// something to return.
    pub fn new(frames: Vec<usize>, frame_duration: f32, looping: bool) -> Self {
        let frames = if frames.is_empty() { vec![0] } else { frames };
        Self {
            frames,
            frame_duration,
            looping,
            current_frame: 0,
            timer: 0.0,
            playing: false,
        }
    }

    pub fn from_def(def: &AnimationDef) -> Self {
        Self::new(def.frames.clone(), def.frame_duration, def.looping)
    }

    pub fn play(&mut self) {
        self.current_frame = 0;
        self.timer = 0.0;
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn update(&mut self, dt: f32) {
        if !self.playing || self.frame_duration <= 0.0 {
            return;
        }
        self.timer += dt;
        while self.timer >= self.frame_duration {
            self.timer -= self.frame_duration;
            self.current_frame += 1;

            if self.current_frame >= self.frames.len() {
                if self.looping {
                    self.current_frame = 0;
                } else {
                    self.current_frame = self.frames.len() - 1;
                    self.timer = 0.0;
                    self.playing = false;
                    break;
                }
            }
        }
    }

    /// Sprite-sheet frame index for the current position.
    pub fn current_frame_index(&self) -> usize {
        let clamped = self.current_frame.min(self.frames.len() - 1);
        self.frames[clamped]
    }

    /// Position inside `frames` (not the sheet index).
    pub fn current_frame(&self) -> usize {
        self.current_frame.min(self.frames.len() - 1)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_finished(&self) -> bool {
        !self.looping && !self.playing && self.current_frame + 1 >= self.frames.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn total_duration(&self) -> f32 {
        self.frame_duration * self.frames.len() as f32
    }
}
