use std::env;

use once_cell::sync::OnceCell;

/// Every constant the power model uses. `Default` is the production tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerConfig {
    pub unrated_baseline: f64,
    pub baseline_scale: f64,
    pub attack_weight: f64,
    pub win_weight: f64,
    pub draw_weight: f64,
    pub recent_window: usize,
    pub form_min_games: usize,
    pub form_weight: f64,
    pub form_cap: f64,
    pub pro_bonus: f64,
    pub amateur_bonus: f64,
    pub college_bonus: f64,
    /// `(min games, factor)`, largest threshold first.
    pub reliability_tiers: [(usize, f64); 3],
    pub reliability_floor: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            unrated_baseline: 50.0,
            baseline_scale: 10.0,
            attack_weight: 50.0,
            win_weight: 150.0,
            draw_weight: 30.0,
            recent_window: 10,
            form_min_games: 3,
            form_weight: 30.0,
            form_cap: 50.0,
            pro_bonus: 200.0,
            amateur_bonus: 120.0,
            college_bonus: 70.0,
            reliability_tiers: [(20, 1.0), (10, 0.95), (5, 0.85)],
            reliability_floor: 0.70,
        }
    }
}

impl PowerConfig {
    /// Defaults, with the form knobs overridable through `KICKABOUT_*` variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_parse::<usize>("KICKABOUT_FORM_WINDOW") {
            cfg.recent_window = v.max(1);
        }
        if let Some(v) = env_parse::<usize>("KICKABOUT_FORM_MIN_GAMES") {
            cfg.form_min_games = v.max(1);
        }
        if let Some(v) = env_parse::<f64>("KICKABOUT_FORM_WEIGHT") {
            cfg.form_weight = v;
        }
        if let Some(v) = env_parse::<f64>("KICKABOUT_FORM_CAP") {
            cfg.form_cap = v.abs();
        }
        cfg
    }

    /// Scale applied to the performance delta for a given sample size.
    pub fn reliability(&self, games: usize) -> f64 {
        self.reliability_tiers
            .iter()
            .find(|(min_games, _)| games >= *min_games)
            .map(|(_, factor)| *factor)
            .unwrap_or(self.reliability_floor)
    }
}

pub fn global_config() -> &'static PowerConfig {
    static CONFIG: OnceCell<PowerConfig> = OnceCell::new();
    CONFIG.get_or_init(PowerConfig::from_env)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.trim().parse::<T>().ok())
}
