//! HP/mana bars fed by `Game` and drawn by the overlay.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tv_core::HudSink;

#[derive(Debug, Clone, PartialEq)]
pub struct HudBar {
    /// 0..=100
    pub percent: f32,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct HudState {
    bars: BTreeMap<String, HudBar>,
}

impl HudState {
    pub fn set(&mut self, id: &str, percent: f32, text: &str) {
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        match self.bars.get_mut(id) {
            Some(bar) => {
                bar.percent = percent;
                if bar.text != text {
                    bar.text = text.to_string();
                }
            }
            None => {
                self.bars.insert(
                    id.to_string(),
                    HudBar {
                        percent,
                        text: text.to_string(),
                    },
                );
            }
        }
    }

    pub fn bar(&self, id: &str) -> Option<&HudBar> {
        self.bars.get(id)
    }

    pub fn bars(&self) -> impl Iterator<Item = (&str, &HudBar)> {
        self.bars.iter().map(|(id, bar)| (id.as_str(), bar))
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Handle given to `Game` as its `HudSink`; the host keeps a clone to read
/// the bars back when drawing the overlay.
#[derive(Debug, Clone, Default)]
pub struct SharedHud(Rc<RefCell<HudState>>);

impl SharedHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bar(&self, id: &str) -> Option<HudBar> {
        self.0.borrow().bar(id).cloned()
    }

    pub fn snapshot(&self) -> Vec<(String, HudBar)> {
        self.0
            .borrow()
            .bars()
            .map(|(id, bar)| (id.to_string(), bar.clone()))
            .collect()
    }
}

impl HudSink for SharedHud {
    fn set_bar(&mut self, id: &str, percent: f32, text: &str) {
        self.0.borrow_mut().set(id, percent, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tv_core::{Game, PlayerData, HP_BAR, MANA_BAR};

    #[test]
    fn percent_is_clamped() {
        let mut hud = SharedHud::new();
        hud.set_bar(HP_BAR, 140.0, "x");
        assert_eq!(hud.bar(HP_BAR).map(|b| b.percent), Some(100.0));
        hud.set_bar(HP_BAR, f32::NAN, "x");
        assert_eq!(hud.bar(HP_BAR).map(|b| b.percent), Some(0.0));
    }

    #[test]
    fn clones_share_state() {
        let hud = SharedHud::new();
        let mut sink = hud.clone();
        sink.set_bar(MANA_BAR, 50.0, "25/50");
        assert_eq!(
            hud.bar(MANA_BAR),
            Some(HudBar {
                percent: 50.0,
                text: "25/50".to_string()
            })
        );
    }

    #[test]
    fn game_reports_player_bars() {
        let hud = SharedHud::new();
        let player = PlayerData {
            hp: 50.0,
            ..PlayerData::default()
        };
        let mut game = Game::new(player, Vec::new(), Box::new(hud.clone()));
        game.begin();
        game.set_player_data(tv_core::PlayerDataPatch {
            mana: Some(25.0),
            ..Default::default()
        });
        let bars = hud.snapshot();
        let ids: Vec<&str> = bars.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec![HP_BAR, MANA_BAR]);
        assert_eq!(hud.bar(HP_BAR).map(|b| b.text), Some("50/100".to_string()));
        assert_eq!(hud.bar(MANA_BAR).map(|b| b.percent), Some(50.0));
    }
}
