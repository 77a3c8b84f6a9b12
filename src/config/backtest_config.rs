use crate::engine::BacktestConfig;
use crate::metrics::DEFAULT_MIN_YEAR;
use anyhow::{anyhow, Context};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

//named window pair tuned for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPreset {
    pub short_window: usize,
    pub long_window: usize,
}

//presets found by earlier sweeps
pub fn default_window_presets() -> IndexMap<String, WindowPreset> {
    let mut presets = IndexMap::new();
    presets.insert(
        "FNGU".to_string(),
        WindowPreset {
            short_window: 3,
            long_window: 16,
        },
    );
    presets.insert(
        "NRGU".to_string(),
        WindowPreset {
            short_window: 3,
            long_window: 30,
        },
    );
    presets
}

//complete run configuration as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfiguration {
    //data
    pub data_path: PathBuf,

    //preset windows override `backtest.short_window` / `backtest.long_window`
    pub preset: Option<String>,
    pub backtest: BacktestConfig,

    //annual report year cursor
    pub min_year: i32,

    //optimizer grid bound (exclusive)
    pub max_window: usize,

    //optional output path
    pub output_trace_csv: Option<PathBuf>,

    pub window_presets: IndexMap<String, WindowPreset>,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            data_path: PathBuf::from("data.csv"),
            preset: None,
            backtest: BacktestConfig::default(),
            min_year: DEFAULT_MIN_YEAR,
            max_window: 60,
            output_trace_csv: None,
            window_presets: default_window_presets(),
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    //symbol lookup ignores case
    pub fn find_preset(&self, name: &str) -> Option<WindowPreset> {
        self.window_presets
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, preset)| *preset)
    }

    //the backtest settings with the selected preset applied
    pub fn resolved_backtest(&self) -> anyhow::Result<BacktestConfig> {
        match &self.preset {
            None => Ok(self.backtest.clone()),
            Some(name) => {
                let preset = self
                    .find_preset(name)
                    .ok_or_else(|| anyhow!("Unknown window preset: {}", name))?;
                Ok(self
                    .backtest
                    .with_windows(preset.short_window, preset.long_window))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn defaults_carry_known_presets() {
        let config = BacktestConfiguration::default();
        let names: Vec<&str> = config.window_presets.keys().map(String::as_str).collect();

        assert_eq!(names, vec!["FNGU", "NRGU"]);
        assert_eq!(config.min_year, 2000);
        assert_eq!(config.max_window, 60);
        assert_eq!(config.backtest, BacktestConfig::default());
    }

    #[test]
    fn preset_lookup_ignores_case() {
        let config = BacktestConfiguration::default();

        assert_eq!(
            config.find_preset("fngu"),
            Some(WindowPreset {
                short_window: 3,
                long_window: 16
            })
        );
        assert_eq!(config.find_preset("SPY"), None);
    }

    #[test]
    fn resolved_backtest_applies_preset() {
        let config = BacktestConfiguration {
            preset: Some("FNGU".to_string()),
            ..BacktestConfiguration::default()
        };
        let backtest = config.resolved_backtest().unwrap();

        assert_eq!((backtest.short_window, backtest.long_window), (3, 16));
        assert_eq!(backtest.initial_budget, dec!(5000));
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let config = BacktestConfiguration {
            preset: Some("QQQ".to_string()),
            ..BacktestConfiguration::default()
        };
        assert!(config.resolved_backtest().is_err());
    }

    #[test]
    fn json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BacktestConfiguration::default();
        config.data_path = PathBuf::from("nrgu.csv");
        config.backtest.stop_factor = dec!(0.98);
        config.output_trace_csv = Some(PathBuf::from("trace.csv"));

        config.to_json_file(&path).unwrap();
        let loaded = BacktestConfiguration::from_json_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"data_path": "fngu.csv", "backtest": {"start_date": "2021-01-01"}}"#,
        )
        .unwrap();

        let loaded = BacktestConfiguration::from_json_file(&path).unwrap();

        assert_eq!(loaded.data_path, PathBuf::from("fngu.csv"));
        assert_eq!(
            loaded.backtest.start_date,
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
        );
        assert_eq!(loaded.backtest.long_window, 30);
        assert_eq!(loaded.window_presets.len(), 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = BacktestConfiguration::from_json_file(Path::new("/nonexistent/cfg.json"))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("cfg.json"));
    }
}
