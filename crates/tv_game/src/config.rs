//! Tunables for every scene, loaded once at startup from JSON.
//!
//! Every field has a serde default, so a partial file only overrides what it
//! names and a missing file means "all defaults". The defaults below are the
//! single source of numeric truth for the game.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tv_core::{PlayerData, Rect};
use tv_platform::PlatformConfig;

pub const CONFIG_PATH: &str = "assets/config/game.json";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerData,
    pub cinematic: CinematicConfig,
    pub combat: CombatConfig,
    pub riddle: RiddleConfig,
    pub boss: BossConfig,
    pub race: RaceConfig,
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CinematicConfig {
    pub fade: f32,
    pub walk_speed: f32,
    pub player_size: f32,
    pub walk_frame_duration: f32,
}

impl Default for CinematicConfig {
    fn default() -> Self {
        Self {
            fade: 1.0,
            walk_speed: 60.0,
            player_size: 64.0,
            walk_frame_duration: 0.08,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Weak,
    Normal,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EnemyStats {
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    pub weak: EnemyStats,
    pub normal: EnemyStats,
    pub strong: EnemyStats,
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            weak: EnemyStats {
                hp: 20.0,
                speed: 60.0,
                damage: 5.0,
                size: 32.0,
            },
            normal: EnemyStats {
                hp: 40.0,
                speed: 80.0,
                damage: 8.0,
                size: 40.0,
            },
            strong: EnemyStats {
                hp: 80.0,
                speed: 50.0,
                damage: 15.0,
                size: 48.0,
            },
        }
    }
}

impl EnemyTable {
    pub fn stats(&self, kind: EnemyKind) -> EnemyStats {
        match kind {
            EnemyKind::Weak => self.weak,
            EnemyKind::Normal => self.normal,
            EnemyKind::Strong => self.strong,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    pub strength: f32,
    pub endurance: f32,
    pub endurance_max_hp: f32,
    pub toxicity: f32,
    pub toxicity_max_mana: f32,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            strength: 5.0,
            endurance: 5.0,
            endurance_max_hp: 10.0,
            toxicity: 5.0,
            toxicity_max_mana: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// `[x, y, width, height]` of the walkable area.
    pub arena: [f32; 4],
    pub spawn_radius: f32,
    pub wave_countdown: f32,
    pub completion_linger: f32,
    pub player_speed: f32,
    pub player_size: f32,
    pub melee_radius: f32,
    pub attack_frame_duration: f32,
    /// Position within the attack clip at which the swing connects.
    pub attack_hit_frame: usize,
    pub special_cost: f32,
    pub special_cooldown: f32,
    pub special_radius: f32,
    pub enemy_attack_range: f32,
    pub enemy_attack_cooldown: f32,
    pub mana_regen: f32,
    pub enemies: EnemyTable,
    pub upgrades: UpgradeConfig,
    pub waves: Vec<Vec<EnemyKind>>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        use EnemyKind::{Normal, Strong, Weak};
        Self {
            arena: [50.0, 50.0, 700.0, 500.0],
            spawn_radius: 200.0,
            wave_countdown: 2.0,
            completion_linger: 2.0,
            player_speed: 200.0,
            player_size: 48.0,
            melee_radius: 60.0,
            attack_frame_duration: 0.08,
            attack_hit_frame: 2,
            special_cost: 20.0,
            special_cooldown: 3.0,
            special_radius: 120.0,
            enemy_attack_range: 40.0,
            enemy_attack_cooldown: 1.0,
            mana_regen: 5.0,
            enemies: EnemyTable::default(),
            upgrades: UpgradeConfig::default(),
            waves: vec![
                vec![Weak, Weak, Weak],
                vec![Weak, Weak, Weak, Normal, Normal],
                vec![Normal, Normal, Strong, Strong],
            ],
        }
    }
}

impl CombatConfig {
    pub fn arena_rect(&self) -> Rect {
        let [x, y, w, h] = self.arena;
        Rect::new(x, y, w, h)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RiddleConfig {
    pub transition: f32,
    pub speaker: String,
    pub intro_lines: Vec<String>,
    pub question: String,
    pub choices: Vec<String>,
    pub answer: usize,
    pub correct_line: String,
    pub incorrect_line: String,
}

impl Default for RiddleConfig {
    fn default() -> Self {
        Self {
            transition: 1.0,
            speaker: "Gatekeeper".to_string(),
            intro_lines: vec![
                "Halt, traveller. None pass the thorn gate unasked.".to_string(),
                "Answer truly and the path opens. Answer falsely and it closes forever."
                    .to_string(),
            ],
            question: "The more you take, the more you leave behind. What am I?".to_string(),
            choices: vec![
                "A shadow".to_string(),
                "Footsteps".to_string(),
                "Time".to_string(),
                "A debt".to_string(),
            ],
            answer: 1,
            correct_line: "Correct. The gate is yours.".to_string(),
            incorrect_line: "Wrong. The thorns close around you.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BossResponse {
    pub text: String,
    pub boss_damage: f32,
    pub player_damage: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BossTurn {
    pub boss_line: String,
    pub responses: Vec<BossResponse>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub name: String,
    pub resolve: f32,
    pub intro_lines: Vec<String>,
    pub victory_lines: Vec<String>,
    pub defeat_lines: Vec<String>,
    pub turns: Vec<BossTurn>,
    pub player_speed: f32,
    pub player_size: f32,
    pub attack_frame_duration: f32,
    /// `[x, y, width, height]` of the exit portal in free roam.
    pub portal: [f32; 4],
    pub race_transition: f32,
}

fn response(text: &str, boss_damage: f32, player_damage: f32) -> BossResponse {
    BossResponse {
        text: text.to_string(),
        boss_damage,
        player_damage,
    }
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            name: "The Warden".to_string(),
            resolve: 100.0,
            intro_lines: vec![
                "So the gate let you through.".to_string(),
                "Then let us see whether words cut deeper than thorns.".to_string(),
            ],
            victory_lines: vec![
                "Enough. Your will outlasts mine.".to_string(),
                "Go. The road beyond is yours to run.".to_string(),
            ],
            defeat_lines: vec!["You falter. The Veil keeps you.".to_string()],
            turns: vec![
                BossTurn {
                    boss_line: "Why should the forest let you leave?".to_string(),
                    responses: vec![
                        response("Because I earned it.", 25.0, 5.0),
                        response("Because you cannot stop me.", 10.0, 20.0),
                        response("It shouldn't.", 0.0, 10.0),
                    ],
                },
                BossTurn {
                    boss_line: "Everyone who came before you failed.".to_string(),
                    responses: vec![
                        response("Then I will be the first.", 30.0, 5.0),
                        response("Maybe I will too.", 5.0, 15.0),
                    ],
                },
                BossTurn {
                    boss_line: "What is left of you when the thorns take everything?".to_string(),
                    responses: vec![
                        response("My choice to keep walking.", 35.0, 0.0),
                        response("Nothing.", 0.0, 25.0),
                        response("Anger.", 15.0, 15.0),
                    ],
                },
            ],
            player_speed: 180.0,
            player_size: 48.0,
            attack_frame_duration: 0.08,
            portal: [700.0, 260.0, 60.0, 80.0],
            race_transition: 1.5,
        }
    }
}

impl BossConfig {
    pub fn portal_rect(&self) -> Rect {
        let [x, y, w, h] = self.portal;
        Rect::new(x, y, w, h)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub countdown: f32,
    pub duration: f32,
    /// Vertical centre of each lane.
    pub lanes: Vec<f32>,
    pub player_x: f32,
    pub player_size: f32,
    pub attack_frame_duration: f32,
    pub lane_smoothing: f32,
    pub obstacle_size: f32,
    pub base_speed: f32,
    pub speed_growth: f32,
    pub spawn_interval_min: f32,
    pub spawn_interval_max: f32,
    pub confetti_count: usize,
    pub gravity: f32,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            countdown: 3.0,
            duration: 30.0,
            lanes: vec![250.0, 350.0, 450.0],
            player_x: 120.0,
            player_size: 40.0,
            attack_frame_duration: 0.08,
            lane_smoothing: 12.0,
            obstacle_size: 40.0,
            base_speed: 260.0,
            speed_growth: 8.0,
            spawn_interval_min: 0.7,
            spawn_interval_max: 1.5,
            confetti_count: 120,
            gravity: 300.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        let platform = PlatformConfig::default();
        Self {
            title: platform.title,
            width: platform.width,
            height: platform.height,
        }
    }
}

impl GameConfig {
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.window.title.clone(),
            width: self.window.width,
            height: self.window.height,
            ..PlatformConfig::default()
        }
    }
}

pub fn load_config_from_path(config_path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(config_path)
        .map_err(|e| format!("Failed to read config file {}: {e}", config_path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", config_path.display()))?;
    validate_config(&config).map_err(|e| format!("Invalid config {}: {e}", config_path.display()))?;
    Ok(config)
}

/// Load the config, falling back to defaults. A missing file is normal; any
/// other failure is logged.
pub fn load_config_or_default(config_path: &Path) -> GameConfig {
    if !config_path.exists() {
        log::info!("No config at {}, using defaults", config_path.display());
        return GameConfig::default();
    }
    match load_config_from_path(config_path) {
        Ok(config) => {
            log::info!("Loaded config from {}", config_path.display());
            config
        }
        Err(err) => {
            log::warn!("{err}; using defaults");
            GameConfig::default()
        }
    }
}

pub fn validate_config(config: &GameConfig) -> Result<(), String> {
    let p = &config.player;
    if !p.is_valid() {
        return Err(format!(
            "player stats must be non-negative with hp <= max_hp and mana <= max_mana, got {p:?}"
        ));
    }

    let c = &config.combat;
    if c.waves.is_empty() {
        return Err("combat.waves is empty".to_string());
    }
    if let Some(i) = c.waves.iter().position(Vec::is_empty) {
        return Err(format!("combat.waves[{i}] has no enemies"));
    }
    let [_, _, arena_w, arena_h] = c.arena;
    for (name, value) in [
        ("combat.arena width", arena_w),
        ("combat.arena height", arena_h),
        ("combat.spawn_radius", c.spawn_radius),
        ("combat.melee_radius", c.melee_radius),
        ("combat.special_radius", c.special_radius),
        ("combat.attack_frame_duration", c.attack_frame_duration),
        ("combat.player_size", c.player_size),
        ("combat.enemy_attack_range", c.enemy_attack_range),
        ("cinematic.fade", config.cinematic.fade),
        ("cinematic.player_size", config.cinematic.player_size),
        ("cinematic.walk_frame_duration", config.cinematic.walk_frame_duration),
        ("riddle.transition", config.riddle.transition),
        ("boss.resolve", config.boss.resolve),
        ("boss.race_transition", config.boss.race_transition),
        ("boss.player_size", config.boss.player_size),
        ("boss.attack_frame_duration", config.boss.attack_frame_duration),
        ("race.countdown", config.race.countdown),
        ("race.duration", config.race.duration),
        ("race.spawn_interval_min", config.race.spawn_interval_min),
        ("race.player_size", config.race.player_size),
        ("race.attack_frame_duration", config.race.attack_frame_duration),
    ] {
        if !(value > 0.0) {
            return Err(format!("{name} must be positive, got {value}"));
        }
    }
    if c.attack_hit_frame >= ATTACK_FRAME_COUNT {
        return Err(format!(
            "combat.attack_hit_frame {} is outside the {ATTACK_FRAME_COUNT}-frame attack",
            c.attack_hit_frame
        ));
    }

    let r = &config.riddle;
    if r.choices.is_empty() || r.choices.len() > 4 {
        return Err(format!(
            "riddle.choices must have 1 to 4 entries, got {}",
            r.choices.len()
        ));
    }
    if r.answer >= r.choices.len() {
        return Err(format!(
            "riddle.answer {} is out of range for {} choices",
            r.answer,
            r.choices.len()
        ));
    }

    let b = &config.boss;
    if b.turns.is_empty() {
        return Err("boss.turns is empty".to_string());
    }
    for (i, turn) in b.turns.iter().enumerate() {
        if !(2..=3).contains(&turn.responses.len()) {
            return Err(format!(
                "boss.turns[{i}] must have 2 or 3 responses, got {}",
                turn.responses.len()
            ));
        }
    }

    let race = &config.race;
    if race.lanes.len() != 3 {
        return Err(format!("race.lanes must have 3 entries, got {}", race.lanes.len()));
    }
    if race.spawn_interval_max < race.spawn_interval_min {
        return Err(format!(
            "race.spawn_interval_max {} is below spawn_interval_min {}",
            race.spawn_interval_max, race.spawn_interval_min
        ));
    }
    Ok(())
}

/// Frames in the player's attack clip.
pub const ATTACK_FRAME_COUNT: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tv_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_config_file(path: &Path, body: &str) {
        fs::write(path, body).expect("failed to write temp config file");
    }

    #[test]
    fn defaults_are_valid() {
        validate_config(&GameConfig::default()).expect("defaults should validate");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = temp_file_path("partial");
        write_config_file(
            &path,
            r#"{ "combat": { "melee_radius": 75.0 }, "player": { "strength": 12.0 } }"#,
        );
        let config = load_config_from_path(&path).expect("partial config should load");
        assert_eq!(config.combat.melee_radius, 75.0);
        assert_eq!(config.combat.waves.len(), 3);
        assert_eq!(config.player.strength, 12.0);
        assert_eq!(config.player.max_hp, 100.0);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn wave_kinds_parse_snake_case() {
        let path = temp_file_path("waves");
        write_config_file(&path, r#"{ "combat": { "waves": [["weak", "strong"]] } }"#);
        let config = load_config_from_path(&path).expect("wave table should load");
        assert_eq!(
            config.combat.waves,
            vec![vec![EnemyKind::Weak, EnemyKind::Strong]]
        );

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_empty_wave_table() {
        let path = temp_file_path("no_waves");
        write_config_file(&path, r#"{ "combat": { "waves": [] } }"#);
        let err = load_config_from_path(&path).expect_err("empty waves should fail");
        assert!(err.contains("combat.waves is empty"));
        assert!(err.contains(&path.display().to_string()));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_riddle_answer_out_of_range() {
        let mut config = GameConfig::default();
        config.riddle.answer = 4;
        let err = validate_config(&config).expect_err("answer 4 of 4 should fail");
        assert!(err.contains("riddle.answer"));
    }

    #[test]
    fn rejects_initial_hp_above_max() {
        let mut config = GameConfig::default();
        config.player.hp = 150.0;
        let err = validate_config(&config).expect_err("hp above max should fail");
        assert!(err.contains("hp <= max_hp"));
    }

    #[test]
    fn rejects_non_positive_radius() {
        let mut config = GameConfig::default();
        config.combat.special_radius = 0.0;
        let err = validate_config(&config).expect_err("zero radius should fail");
        assert!(err.contains("combat.special_radius must be positive"));
    }

    #[test]
    fn hero_tunables_load_per_scene() {
        let path = temp_file_path("hero");
        write_config_file(
            &path,
            r#"{ "cinematic": { "fade": 0.5 }, "boss": { "player_size": 56.0 } }"#,
        );
        let config = load_config_from_path(&path).expect("hero tunables should load");
        assert_eq!(config.cinematic.fade, 0.5);
        assert_eq!(config.cinematic.player_size, 64.0);
        assert_eq!(config.boss.player_size, 56.0);
        assert_eq!(config.race.attack_frame_duration, 0.08);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_zero_fade() {
        let mut config = GameConfig::default();
        config.cinematic.fade = 0.0;
        let err = validate_config(&config).expect_err("zero fade should fail");
        assert!(err.contains("cinematic.fade must be positive"));
    }

    #[test]
    fn malformed_json_reports_path() {
        let path = temp_file_path("malformed");
        write_config_file(&path, "{ not json");
        let err = load_config_from_path(&path).expect_err("malformed json should fail");
        assert!(err.starts_with("Failed to parse config JSON"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_file_path("missing");
        let config = load_config_or_default(&path);
        assert_eq!(config.combat.spawn_radius, 200.0);
    }

    #[test]
    fn platform_config_uses_window_section() {
        let mut config = GameConfig::default();
        config.window.title = "Test".to_string();
        assert_eq!(config.platform_config().title, "Test");
    }
}
