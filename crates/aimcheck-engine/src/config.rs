use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use aimcheck_core::clock::{CLOCK_TICK_MS, DEFAULT_DURATION_SECS, DEFAULT_WARNING_SECS};

use crate::hit::DEFAULT_HIT_RADIUS;
use crate::scoring::{HIT_REWARD, KILL_BONUS};

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "AIMCHECK_CONFIG";
/// Fallback config path relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/aimcheck.toml";

/// The three challenge variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    /// Shoot moving gallery targets until enough are down.
    #[default]
    Gallery,
    /// Steer a crosshair and shoot a circling bot until its health runs out.
    Bot,
    /// Click numbered tiles in ascending order.
    Sequence,
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChallengeKind::Gallery => "gallery",
            ChallengeKind::Bot => "bot",
            ChallengeKind::Sequence => "sequence",
        })
    }
}

impl FromStr for ChallengeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gallery" => Ok(ChallengeKind::Gallery),
            "bot" => Ok(ChallengeKind::Bot),
            "sequence" => Ok(ChallengeKind::Sequence),
            other => Err(ConfigError::UnknownKind(other.to_string())),
        }
    }
}

/// When the challenge counts as won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WinCondition {
    /// `required` entities hit.
    HitCount { required: u32 },
    /// Every spawnable bot destroyed (`spawner.max_total` of them).
    TargetDestroyed,
    /// All `sequence.length` tiles clicked in order.
    SequenceComplete,
}

/// What a wrong action (missed shot, out-of-order click) does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailurePolicy {
    /// No effect.
    Ignore,
    /// Lock input, then after `delay_ms` drop progress to zero and begin a
    /// fresh round: new tiles for the sequence kind, an emptied pool and a
    /// refilled spawn allowance otherwise. Score and clock are untouched.
    ResetRound { delay_ms: u64 },
}

/// How an action is matched against entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Nearest fresh entity strictly within `hit_radius` of the shot.
    Proximity { hit_radius: f32 },
    /// Clicked tile number must equal the expected step.
    Sequence,
}

/// Entity pool management.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Hard cap on entities present at once.
    pub max_concurrent: usize,
    /// Replenish when a removal leaves fewer than this many entities.
    pub low_water: usize,
    /// Cap on entities spawned over a whole session (0 = unlimited).
    pub max_total: u32,
    /// Delay from start to the first spawn.
    pub initial_delay_ms: u64,
    /// Period of background spawn attempts (0 = none).
    pub spawn_interval_ms: u64,
    /// Delay before a replenishment spawn.
    pub respawn_delay_ms: u64,
    /// Unhit entities are removed after this long (0 = never).
    pub lifetime_ms: u64,
    /// Hit entities leave the pool after this long (0 = stay until the round
    /// ends).
    pub hit_removal_delay_ms: u64,
    /// Spawn positions keep this distance from the motion bounds.
    pub edge_margin: f32,
    /// Gallery target speed range, units/s.
    pub speed_min: f32,
    pub speed_max: f32,
    pub entity_radius: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            low_water: 2,
            max_total: 0,
            initial_delay_ms: 100,
            spawn_interval_ms: 2000,
            respawn_delay_ms: 500,
            lifetime_ms: 5000,
            hit_removal_delay_ms: 300,
            edge_margin: 50.0,
            speed_min: 60.0,
            speed_max: 180.0,
            entity_radius: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub hit_reward: u32,
    /// Extra points for destroying a bot.
    pub kill_bonus: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            hit_reward: HIT_REWARD,
            kill_bonus: KILL_BONUS,
        }
    }
}

/// Bot variant tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub health: u32,
    pub damage: u32,
    /// Bot speed along its heading, units/s.
    pub speed: f32,
    /// Heading change, rad/s.
    pub angular_rate: f32,
    /// Crosshair speed while movement keys are held, units/s.
    pub player_speed: f32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            health: 100,
            damage: 20,
            speed: 120.0,
            angular_rate: 1.5,
            player_speed: 320.0,
        }
    }
}

/// Ordered-click variant tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Tiles per round, numbered 1..=length.
    pub length: u8,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self { length: 5 }
    }
}

/// Complete description of one challenge kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub kind: ChallengeKind,
    pub duration_secs: u32,
    pub warning_secs: u32,
    pub clock_tick_ms: u64,
    /// Motion bounds are the viewport shrunk by this much on every side.
    pub motion_inset: f32,
    pub win_condition: WinCondition,
    pub failure_policy: FailurePolicy,
    pub resolution: ResolutionPolicy,
    pub spawner: SpawnerConfig,
    pub scoring: ScoringConfig,
    pub bot: BotConfig,
    pub sequence: SequenceConfig,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self::gallery()
    }
}

impl ChallengeConfig {
    /// Five gallery targets in thirty seconds.
    pub fn gallery() -> Self {
        Self {
            kind: ChallengeKind::Gallery,
            duration_secs: DEFAULT_DURATION_SECS,
            warning_secs: DEFAULT_WARNING_SECS,
            clock_tick_ms: CLOCK_TICK_MS,
            motion_inset: 90.0,
            win_condition: WinCondition::HitCount { required: 5 },
            failure_policy: FailurePolicy::Ignore,
            resolution: ResolutionPolicy::Proximity {
                hit_radius: DEFAULT_HIT_RADIUS,
            },
            spawner: SpawnerConfig::default(),
            scoring: ScoringConfig::default(),
            bot: BotConfig::default(),
            sequence: SequenceConfig::default(),
        }
    }

    /// One circling bot that must be shot down.
    pub fn bot() -> Self {
        Self {
            kind: ChallengeKind::Bot,
            win_condition: WinCondition::TargetDestroyed,
            spawner: SpawnerConfig {
                max_concurrent: 1,
                low_water: 0,
                max_total: 1,
                initial_delay_ms: 0,
                spawn_interval_ms: 0,
                lifetime_ms: 0,
                hit_removal_delay_ms: 0,
                entity_radius: 45.0,
                ..SpawnerConfig::default()
            },
            ..Self::gallery()
        }
    }

    /// Click 1..=5 in order; a wrong click restarts the round after a second.
    pub fn sequence() -> Self {
        let sequence = SequenceConfig::default();
        Self {
            kind: ChallengeKind::Sequence,
            win_condition: WinCondition::SequenceComplete,
            failure_policy: FailurePolicy::ResetRound { delay_ms: 1000 },
            resolution: ResolutionPolicy::Sequence,
            spawner: SpawnerConfig {
                max_concurrent: usize::from(sequence.length),
                low_water: 0,
                max_total: 0,
                initial_delay_ms: 0,
                spawn_interval_ms: 0,
                lifetime_ms: 0,
                hit_removal_delay_ms: 0,
                entity_radius: 35.0,
                ..SpawnerConfig::default()
            },
            sequence,
            ..Self::gallery()
        }
    }

    pub fn for_kind(kind: ChallengeKind) -> Self {
        match kind {
            ChallengeKind::Gallery => Self::gallery(),
            ChallengeKind::Bot => Self::bot(),
            ChallengeKind::Sequence => Self::sequence(),
        }
    }

    /// Entities that must be credited to win.
    pub fn targets_required(&self) -> u32 {
        match self.win_condition {
            WinCondition::HitCount { required } => required,
            WinCondition::TargetDestroyed => self.spawner.max_total.max(1),
            WinCondition::SequenceComplete => u32::from(self.sequence.length),
        }
    }

    /// Parse a TOML document. Missing fields take the preset values of the
    /// document's `kind` (gallery when absent).
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let table: toml::Table =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let kind = match table.get("kind").and_then(|v| v.as_str()) {
            Some(s) => s.parse()?,
            None => ChallengeKind::default(),
        };
        let preset = toml::Value::try_from(Self::for_kind(kind))
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        let toml::Value::Table(mut merged) = preset else {
            return Err(ConfigError::Parse("preset is not a table".to_string()));
        };
        merge_tables(&mut merged, table);
        let config: Self = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$AIMCHECK_CONFIG`, then `config/aimcheck.toml`, falling back
    /// to the gallery preset when neither yields a valid config.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
            && let Some(config) = Self::load_file(&path)
        {
            return config;
        }
        Self::load_file(DEFAULT_CONFIG_PATH).unwrap_or_default()
    }

    fn load_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match Self::from_toml_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Failed to load {path}: {e}, using defaults");
                None
            },
        }
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.duration_secs == 0 {
            return invalid("duration_secs must be at least 1");
        }
        if self.clock_tick_ms == 0 {
            return invalid("clock_tick_ms must be positive");
        }
        if self.targets_required() == 0 {
            return invalid("win condition requires at least one target");
        }
        if self.spawner.max_concurrent == 0 {
            return invalid("spawner.max_concurrent must be at least 1");
        }
        if self.spawner.low_water > self.spawner.max_concurrent {
            return invalid("spawner.low_water cannot exceed spawner.max_concurrent");
        }
        let s = &self.spawner;
        if !(s.speed_min.is_finite() && s.speed_max.is_finite())
            || s.speed_min < 0.0
            || s.speed_min > s.speed_max
        {
            return invalid("spawner speed range must satisfy 0 <= speed_min <= speed_max");
        }
        if !s.entity_radius.is_finite() || s.entity_radius <= 0.0 {
            return invalid("spawner.entity_radius must be positive");
        }
        if !self.motion_inset.is_finite() || !s.edge_margin.is_finite() {
            return invalid("motion_inset and spawner.edge_margin must be finite");
        }
        match self.resolution {
            ResolutionPolicy::Proximity { hit_radius } => {
                if !hit_radius.is_finite() || hit_radius <= 0.0 {
                    return invalid("hit_radius must be positive");
                }
                if self.win_condition == WinCondition::SequenceComplete {
                    return invalid("sequence win condition needs sequence resolution");
                }
            },
            ResolutionPolicy::Sequence => {
                if self.sequence.length == 0 {
                    return invalid("sequence.length must be at least 1");
                }
                if usize::from(self.sequence.length) > s.max_concurrent {
                    return invalid("sequence.length cannot exceed spawner.max_concurrent");
                }
            },
        }
        let tiles = self.kind == ChallengeKind::Sequence;
        if tiles != matches!(self.resolution, ResolutionPolicy::Sequence) {
            return invalid("sequence kind and sequence resolution go together");
        }
        if !tiles {
            // The cap counts hit entities still waiting for removal, so the
            // pool must be able to keep producing fresh ones.
            let required = self.targets_required();
            if s.max_total > 0 && required > s.max_total {
                return invalid("win condition needs more entities than spawner.max_total");
            }
            if s.hit_removal_delay_ms == 0 && required as usize > s.max_concurrent {
                return invalid(
                    "hit entities stay when spawner.hit_removal_delay_ms is 0, \
                     so the win condition cannot exceed spawner.max_concurrent",
                );
            }
            if s.spawn_interval_ms == 0 && s.low_water == 0 && required > 1 {
                return invalid(
                    "with spawner.spawn_interval_ms and spawner.low_water both 0 only \
                     one entity spawns per round",
                );
            }
        }
        if self.kind == ChallengeKind::Bot && self.bot.damage == 0 {
            return invalid("bot.damage must be positive");
        }
        Ok(())
    }
}

/// Overlay `patch` onto `base`, recursing into nested tables. A tagged policy
/// table (one carrying `type`) replaces the preset's table outright.
fn merge_tables(base: &mut toml::Table, patch: toml::Table) {
    for (key, value) in patch {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming))
                if !incoming.contains_key("type") =>
            {
                merge_tables(existing, incoming);
            },
            (_, value) => {
                base.insert(key, value);
            },
        }
    }
}

/// Configuration failures. Game operations never fail; only loading and
/// validating a configuration can.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    UnknownKind(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(m) => write!(f, "config parse error: {m}"),
            Self::UnknownKind(k) => write!(f, "unknown challenge kind: {k}"),
            Self::Invalid(m) => write!(f, "invalid config: {m}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        for kind in [
            ChallengeKind::Gallery,
            ChallengeKind::Bot,
            ChallengeKind::Sequence,
        ] {
            let cfg = ChallengeConfig::for_kind(kind);
            assert_eq!(cfg.kind, kind);
            cfg.validate().unwrap();
        }
    }

    #[test]
    fn targets_required_per_kind() {
        assert_eq!(ChallengeConfig::gallery().targets_required(), 5);
        assert_eq!(ChallengeConfig::bot().targets_required(), 1);
        assert_eq!(ChallengeConfig::sequence().targets_required(), 5);
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Gallery".parse::<ChallengeKind>(), Ok(ChallengeKind::Gallery));
        assert_eq!("SEQUENCE".parse::<ChallengeKind>(), Ok(ChallengeKind::Sequence));
        assert!(matches!(
            "duck".parse::<ChallengeKind>(),
            Err(ConfigError::UnknownKind(_))
        ));
    }

    #[test]
    fn toml_overrides_preset_fields() {
        let cfg = ChallengeConfig::from_toml_str(
            r#"
            kind = "bot"
            duration_secs = 45

            [bot]
            health = 60
            "#,
        )
        .unwrap();
        assert_eq!(cfg.kind, ChallengeKind::Bot);
        assert_eq!(cfg.duration_secs, 45);
        assert_eq!(cfg.bot.health, 60);
        // Untouched fields keep the bot preset, not the gallery one
        assert_eq!(cfg.bot.damage, 20);
        assert_eq!(cfg.spawner.max_total, 1);
        assert_eq!(cfg.win_condition, WinCondition::TargetDestroyed);
    }

    #[test]
    fn toml_policy_surface() {
        let cfg = ChallengeConfig::from_toml_str(
            r#"
            [win_condition]
            type = "hit_count"
            required = 8

            [failure_policy]
            type = "reset_round"
            delay_ms = 750

            [resolution]
            type = "proximity"
            hit_radius = 45.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.targets_required(), 8);
        assert_eq!(cfg.failure_policy, FailurePolicy::ResetRound { delay_ms: 750 });
        assert_eq!(cfg.resolution, ResolutionPolicy::Proximity { hit_radius: 45.0 });
    }

    #[test]
    fn shipped_config_parses() {
        let cfg =
            ChallengeConfig::from_toml_str(include_str!("../../../config/aimcheck.toml")).unwrap();
        assert_eq!(cfg.kind, ChallengeKind::Gallery);
        assert_eq!(cfg.targets_required(), 5);
        assert_eq!(cfg.spawner.max_concurrent, 3);
    }

    #[test]
    fn empty_toml_is_gallery() {
        let cfg = ChallengeConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.kind, ChallengeKind::Gallery);
        assert_eq!(cfg.targets_required(), 5);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = ChallengeConfig::from_toml_str("duration_secs = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = ChallengeConfig::gallery();
        cfg.win_condition = WinCondition::HitCount { required: 0 };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = ChallengeConfig::gallery();
        cfg.spawner.low_water = 4;
        assert!(cfg.validate().is_err());

        let mut cfg = ChallengeConfig::gallery();
        cfg.spawner.speed_min = 200.0;
        assert!(cfg.validate().is_err());

        let mut cfg = ChallengeConfig::gallery();
        cfg.resolution = ResolutionPolicy::Proximity { hit_radius: 0.0 };
        assert!(cfg.validate().is_err());

        let mut cfg = ChallengeConfig::sequence();
        cfg.sequence.length = 9;
        assert!(cfg.validate().is_err());

        let mut cfg = ChallengeConfig::gallery();
        cfg.resolution = ResolutionPolicy::Sequence;
        cfg.win_condition = WinCondition::SequenceComplete;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validation_rejects_unwinnable_spawning() {
        // Hit targets that never leave would fill the pool of three
        let mut cfg = ChallengeConfig::gallery();
        cfg.spawner.hit_removal_delay_ms = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        cfg.win_condition = WinCondition::HitCount { required: 3 };
        cfg.validate().unwrap();

        // A second bot would never be spawned
        let mut cfg = ChallengeConfig::bot();
        cfg.spawner.max_total = 2;
        assert!(cfg.validate().is_err());
        cfg.spawner.max_concurrent = 2;
        assert!(cfg.validate().is_err());
        cfg.spawner.low_water = 1;
        cfg.spawner.hit_removal_delay_ms = 300;
        cfg.validate().unwrap();

        let mut cfg = ChallengeConfig::gallery();
        cfg.spawner.max_total = 4;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn reset_round_is_accepted_for_proximity_kinds() {
        for mut cfg in [ChallengeConfig::gallery(), ChallengeConfig::bot()] {
            cfg.failure_policy = FailurePolicy::ResetRound { delay_ms: 1000 };
            cfg.validate().unwrap();
        }
    }

    #[test]
    fn error_display() {
        let err = ConfigError::Invalid("x".to_string());
        assert_eq!(err.to_string(), "invalid config: x");
    }
}
