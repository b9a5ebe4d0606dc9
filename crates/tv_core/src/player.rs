//! Persistent player statistics shared by every scene.
//!
//! `Game` owns the only copy. Scenes read it as a value and write back a
//! `PlayerDataPatch`, which is merged field by field. The merge does not clamp:
//! callers build their patch from the helpers below (`damaged`, `healed`, ...),
//! which keep `hp <= max_hp` and `mana <= max_mana`.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerData {
    pub hp: f32,
    pub max_hp: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub strength: f32,
    pub toxicity: f32,
    pub endurance: f32,
}

impl Default for PlayerData {
    fn default() -> Self {
        Self {
            hp: 100.0,
            max_hp: 100.0,
            mana: 50.0,
            max_mana: 50.0,
            strength: 10.0,
            toxicity: 0.0,
            endurance: 10.0,
        }
    }
}

impl PlayerData {
    pub fn is_valid(&self) -> bool {
        let fields = [
            self.hp,
            self.max_hp,
            self.mana,
            self.max_mana,
            self.strength,
            self.toxicity,
            self.endurance,
        ];
        fields.iter().all(|v| v.is_finite() && *v >= 0.0)
            && self.hp <= self.max_hp
            && self.mana <= self.max_mana
    }

    /// Force every field into range.
    pub fn clamped(self) -> Self {
        let non_neg = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let max_hp = non_neg(self.max_hp);
        let max_mana = non_neg(self.max_mana);
        Self {
            hp: non_neg(self.hp).min(max_hp),
            max_hp,
            mana: non_neg(self.mana).min(max_mana),
            max_mana,
            strength: non_neg(self.strength),
            toxicity: non_neg(self.toxicity),
            endurance: non_neg(self.endurance),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn mana_fraction(&self) -> f32 {
        if self.max_mana > 0.0 {
            (self.mana / self.max_mana).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Patch that takes `amount` HP, floored at zero.
    pub fn damaged(&self, amount: f32) -> PlayerDataPatch {
        PlayerDataPatch {
            hp: Some((self.hp - amount.max(0.0)).max(0.0)),
            ..Default::default()
        }
    }

    /// Patch that restores `amount` HP, capped at `max_hp`.
    pub fn healed(&self, amount: f32) -> PlayerDataPatch {
        PlayerDataPatch {
            hp: Some((self.hp + amount.max(0.0)).min(self.max_hp)),
            ..Default::default()
        }
    }

    /// `None` when there is not enough mana.
    pub fn with_mana_spent(&self, cost: f32) -> Option<PlayerDataPatch> {
        if self.mana < cost {
            return None;
        }
        Some(PlayerDataPatch {
            mana: Some((self.mana - cost).max(0.0)),
            ..Default::default()
        })
    }

    pub fn with_mana_regen(&self, amount: f32) -> PlayerDataPatch {
        PlayerDataPatch {
            mana: Some((self.mana + amount.max(0.0)).min(self.max_mana)),
            ..Default::default()
        }
    }
}

/// Partial record merged by `SceneContext::set_player_data`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerDataPatch {
    pub hp: Option<f32>,
    pub max_hp: Option<f32>,
    pub mana: Option<f32>,
    pub max_mana: Option<f32>,
    pub strength: Option<f32>,
    pub toxicity: Option<f32>,
    pub endurance: Option<f32>,
}

impl PlayerDataPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow merge: every `Some` field overwrites.
    pub fn apply_to(&self, data: &mut PlayerData) {
        if let Some(v) = self.hp {
            data.hp = v;
        }
        if let Some(v) = self.max_hp {
            data.max_hp = v;
        }
        if let Some(v) = self.mana {
            data.mana = v;
        }
        if let Some(v) = self.max_mana {
            data.max_mana = v;
        }
        if let Some(v) = self.strength {
            data.strength = v;
        }
        if let Some(v) = self.toxicity {
            data.toxicity = v;
        }
        if let Some(v) = self.endurance {
            data.endurance = v;
        }
    }

    /// Field-wise union; `other` wins where both are set.
    pub fn merge(self, other: PlayerDataPatch) -> PlayerDataPatch {
        PlayerDataPatch {
            hp: other.hp.or(self.hp),
            max_hp: other.max_hp.or(self.max_hp),
            mana: other.mana.or(self.mana),
            max_mana: other.max_mana.or(self.max_mana),
            strength: other.strength.or(self.strength),
            toxicity: other.toxicity.or(self.toxicity),
            endurance: other.endurance.or(self.endurance),
        }
    }
}
