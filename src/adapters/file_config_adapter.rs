//! INI file configuration adapter.

use crate::domain::error::StratlabError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StratlabError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| StratlabError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn section_entries(&self, section: &str) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[backtest]
initial_capital = 25000
risk_frequency = 1h

[strategy]
name = bollinger
num_std = 2.5
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("backtest", "risk_frequency"),
            Some("1h".to_string())
        );
        assert_eq!(
            adapter.get_string("strategy", "name"),
            Some("bollinger".to_string())
        );
        assert_eq!(
            adapter.get_string("strategy", "num_std"),
            Some("2.5".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn values_are_trimmed_raw_strings() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital =   not_a_number  \n").unwrap();
        assert_eq!(
            adapter.get_string("backtest", "initial_capital"),
            Some("not_a_number".to_string())
        );
    }

    #[test]
    fn section_names_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Strategy]\nName = macd\n").unwrap();
        assert_eq!(adapter.get_string("strategy", "name"), Some("macd".to_string()));
        assert_eq!(
            adapter.section_entries("STRATEGY"),
            vec![("name".to_string(), "macd".to_string())]
        );
    }

    #[test]
    fn section_entries_sorted_by_key() {
        let adapter = FileConfigAdapter::from_string(
            "[strategy]\nname = rsi\nwindow = 10\nrsi_low = 25\n",
        )
        .unwrap();
        assert_eq!(
            adapter.section_entries("strategy"),
            vec![
                ("name".to_string(), "rsi".to_string()),
                ("rsi_low".to_string(), "25".to_string()),
                ("window".to_string(), "10".to_string()),
            ]
        );
        assert!(adapter.section_entries("optimize").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[optimize]\nshort_range = 5, 10\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("optimize", "short_range"),
            Some("5, 10".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(StratlabError::ConfigParse { .. })));
    }
}
