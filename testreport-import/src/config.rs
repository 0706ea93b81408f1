// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{ConfigParseError, ConfigParseErrorKind, MethodMapLoadError};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};
use testreport_xml::{Dialect, MethodFileMap};
use tracing::warn;

/// Trait for handling config warnings.
///
/// This trait allows for different warning handling strategies, such as
/// logging warnings (the default behavior) or collecting them for testing
/// purposes.
pub trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Default implementation of [`ConfigWarnings`] that logs warnings using the
/// tracing crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.extend(unknown.iter().map(String::as_str));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push_str("\n  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

/// A language whose test reports are imported.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Language {
    key: String,
    name: String,
}

impl Language {
    /// Creates a new language.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }

    /// C#.
    pub fn csharp() -> Self {
        Self::new("cs", "C#")
    }

    /// Visual Basic .NET.
    pub fn vbnet() -> Self {
        Self::new("vbnet", "VB.NET")
    }

    /// Creates a language from its key, naming it after the key unless the key
    /// is a well-known one.
    pub fn from_key(key: &str) -> Self {
        match key {
            "cs" => Self::csharp(),
            "vbnet" => Self::vbnet(),
            other => Self::new(other, other),
        }
    }

    /// The short identifier used in configuration.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The human-readable name, used in warnings.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Report path patterns configured for a language, per dialect.
///
/// A pattern is either a plain path or a glob, resolved relative to the
/// import base directory.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LanguageReports {
    xunit: Vec<String>,
    nunit: Vec<String>,
    vstest: Vec<String>,
}

impl LanguageReports {
    /// Creates an empty set of report paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a report path pattern for `dialect`.
    pub fn add(&mut self, dialect: Dialect, pattern: impl Into<String>) -> &mut Self {
        self.patterns_mut(dialect).push(pattern.into());
        self
    }

    /// Returns the patterns configured for `dialect`.
    pub fn patterns(&self, dialect: Dialect) -> &[String] {
        match dialect {
            Dialect::XUnit => &self.xunit,
            Dialect::NUnit => &self.nunit,
            Dialect::VsTest => &self.vstest,
        }
    }

    fn patterns_mut(&mut self, dialect: Dialect) -> &mut Vec<String> {
        match dialect {
            Dialect::XUnit => &mut self.xunit,
            Dialect::NUnit => &mut self.nunit,
            Dialect::VsTest => &mut self.vstest,
        }
    }

    /// Iterates over every configured pattern along with its dialect.
    pub fn iter(&self) -> impl Iterator<Item = (Dialect, &str)> + '_ {
        Dialect::ALL.into_iter().flat_map(move |dialect| {
            self.patterns(dialect)
                .iter()
                .map(move |pattern| (dialect, pattern.as_str()))
        })
    }

    /// Returns true if no report path is configured.
    pub fn is_empty(&self) -> bool {
        self.xunit.is_empty() && self.nunit.is_empty() && self.vstest.is_empty()
    }
}

/// A language together with its configured reports.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LanguageConfig {
    language: Language,
    reports: LanguageReports,
}

impl LanguageConfig {
    /// Creates a new language config.
    pub fn new(language: Language, reports: LanguageReports) -> Self {
        Self { language, reports }
    }

    /// The language.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// The reports configured for the language.
    pub fn reports(&self) -> &LanguageReports {
        &self.reports
    }
}

/// Import configuration, read from a TOML file.
///
/// ```toml
/// [import]
/// base-dir = "."
///
/// [language.cs]
/// xunit-report-paths = ["**/TestResults/*.xml"]
/// vstest-report-paths = ["**/*.trx"]
/// ```
#[derive(Clone, Debug)]
pub struct ImportConfig {
    base_dir: Utf8PathBuf,
    languages: BTreeMap<String, LanguageConfig>,
}

impl ImportConfig {
    /// The default location of the config file, relative to the directory
    /// being analyzed.
    pub const CONFIG_PATH: &'static str = ".config/testreport.toml";

    /// Reads the config from `config_file`.
    ///
    /// A relative `base-dir` is resolved against the directory containing the
    /// config file.
    pub fn from_file(
        config_file: &Utf8Path,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let source = File::new(config_file.as_str(), FileFormat::Toml);
        Self::build(config_file, Config::builder().add_source(source), warnings)
    }

    /// Parses the config from `contents`, as if it had been read from
    /// `config_file`.
    pub fn from_str(
        config_file: &Utf8Path,
        contents: &str,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let source = File::from_str(contents, FileFormat::Toml);
        Self::build(config_file, Config::builder().add_source(source), warnings)
    }

    fn build(
        config_file: &Utf8Path,
        builder: ConfigBuilder<DefaultState>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config, unknown) = build_and_deserialize_config(builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;
        if !unknown.is_empty() {
            warnings.unknown_config_keys(config_file, &unknown);
        }

        let config_dir = match config_file.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        let base_dir = match config.import.base_dir {
            Some(base_dir) => config_dir.join(base_dir),
            None => config_dir.to_owned(),
        };

        let mut languages = BTreeMap::new();
        for (key, language) in config.language {
            if key.is_empty() {
                return Err(ConfigParseError::new(
                    config_file,
                    ConfigParseErrorKind::EmptyLanguageKey,
                ));
            }
            let name = match language.name {
                Some(name) => name,
                None => Language::from_key(&key).name,
            };
            let reports = LanguageReports {
                xunit: language.xunit_report_paths,
                nunit: language.nunit_report_paths,
                vstest: language.vstest_report_paths,
            };
            let language = LanguageConfig::new(Language::new(key.clone(), name), reports);
            languages.insert(key, language);
        }

        Ok(Self {
            base_dir,
            languages,
        })
    }

    /// The directory report path patterns are resolved against.
    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// Iterates over the configured languages, in key order.
    pub fn languages(&self) -> impl Iterator<Item = &LanguageConfig> + '_ {
        self.languages.values()
    }

    /// Returns the config for the language with the given key.
    pub fn language(&self, key: &str) -> Option<&LanguageConfig> {
        self.languages.get(key)
    }
}

fn build_and_deserialize_config(
    builder: ConfigBuilder<DefaultState>,
) -> Result<(ImportConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
    let config = builder
        .build()
        .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

    let mut ignored = BTreeSet::new();
    let mut cb = |path: serde_ignored::Path| {
        ignored.insert(path.to_string());
    };
    let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
    let config: ImportConfigDeserialize =
        serde_path_to_error::deserialize(ignored_de).map_err(|error| {
            // The key is already part of the path; drop it from the config error.
            let path = error.path().clone();
            let error = match error.into_inner() {
                ConfigError::At { error, .. } => *error,
                other => other,
            };
            ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                path, error,
            )))
        })?;

    Ok((config, ignored))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ImportConfigDeserialize {
    #[serde(default)]
    import: ImportSectionDeserialize,
    #[serde(default)]
    language: BTreeMap<String, LanguageDeserialize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ImportSectionDeserialize {
    #[serde(default)]
    base_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct LanguageDeserialize {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    xunit_report_paths: Vec<String>,
    #[serde(default)]
    nunit_report_paths: Vec<String>,
    #[serde(default)]
    vstest_report_paths: Vec<String>,
}

/// Reads a method-file map from a JSON object of fully-qualified method names
/// to source file paths.
pub fn load_method_file_map(path: &Utf8Path) -> Result<MethodFileMap, MethodMapLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|err| MethodMapLoadError::Read {
        path: path.to_owned(),
        err,
    })?;
    serde_json::from_str(&contents).map_err(|err| MethodMapLoadError::Parse {
        path: path.to_owned(),
        err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use maplit::btreeset;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct RecordingWarnings {
        unknown: Vec<(Utf8PathBuf, BTreeSet<String>)>,
    }

    impl ConfigWarnings for RecordingWarnings {
        fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
            self.unknown.push((config_file.to_owned(), unknown.clone()));
        }
    }

    #[test]
    fn parses_languages_and_reports() {
        let mut warnings = RecordingWarnings::default();
        let config = ImportConfig::from_str(
            Utf8Path::new("/work/.config/testreport.toml"),
            indoc! {r#"
                [import]
                base-dir = ".."

                [language.cs]
                xunit-report-paths = ["TestResults/xunit.xml", "**/xunit-*.xml"]
                vstest-report-paths = ["**/*.trx"]

                [language.vbnet]
                name = "Visual Basic"
                nunit-report-paths = ["nunit.xml"]

                [language.fs]
                xunit-report-paths = ["fs.xml"]
            "#},
            &mut warnings,
        )
        .expect("config parses");

        assert!(warnings.unknown.is_empty());
        assert_eq!(config.base_dir(), "/work/.config/..");

        let keys: Vec<_> = config
            .languages()
            .map(|language| (language.language().key(), language.language().name()))
            .collect();
        assert_eq!(
            keys,
            [("cs", "C#"), ("fs", "fs"), ("vbnet", "Visual Basic")]
        );

        let cs = config.language("cs").expect("cs is configured");
        assert_eq!(
            cs.reports().iter().collect::<Vec<_>>(),
            [
                (Dialect::XUnit, "TestResults/xunit.xml"),
                (Dialect::XUnit, "**/xunit-*.xml"),
                (Dialect::VsTest, "**/*.trx"),
            ]
        );
        assert_eq!(
            config
                .language("fs")
                .expect("fs is configured")
                .reports()
                .patterns(Dialect::XUnit),
            ["fs.xml"]
        );
        assert!(config.language("vb").is_none());
    }

    #[test]
    fn base_dir_defaults_to_config_dir() {
        let config = ImportConfig::from_str(
            Utf8Path::new("testreport.toml"),
            "",
            &mut RecordingWarnings::default(),
        )
        .expect("empty config parses");
        assert_eq!(config.base_dir(), ".");
        assert_eq!(config.languages().count(), 0);
    }

    #[test]
    fn unknown_keys_are_reported() {
        let mut warnings = RecordingWarnings::default();
        ImportConfig::from_str(
            Utf8Path::new("testreport.toml"),
            indoc! {r#"
                [language.cs]
                xunit-report-path = ["typo.xml"]

                [reporting]
                verbose = true
            "#},
            &mut warnings,
        )
        .expect("config parses");

        assert_eq!(
            warnings.unknown,
            [(
                Utf8PathBuf::from("testreport.toml"),
                btreeset! {
                    "language.cs.xunit-report-path".to_owned(),
                    "reporting".to_owned(),
                }
            )]
        );
    }

    #[test]
    fn wrong_type_names_the_key() {
        let err = ImportConfig::from_str(
            Utf8Path::new("testreport.toml"),
            indoc! {r#"
                [language.cs]
                xunit-report-paths = "not-a-list.xml"
            "#},
            &mut RecordingWarnings::default(),
        )
        .expect_err("string is not a list");

        assert_eq!(err.config_file(), "testreport.toml");
        match err.kind() {
            ConfigParseErrorKind::DeserializeError(err) => {
                assert_eq!(err.path().to_string(), "language.cs.xunit-report-paths");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_build_error() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let err = ImportConfig::from_file(
            &dir.path().join("missing.toml"),
            &mut RecordingWarnings::default(),
        )
        .expect_err("missing file fails");
        assert!(matches!(err.kind(), ConfigParseErrorKind::BuildError(_)));
    }

    #[test]
    fn method_file_map_from_file() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let path = dir.path().join("methods.json");
        std::fs::write(&path, r#"{"My.Tests.Ns.A.B": "src/A.cs"}"#).expect("wrote method map");

        let map = load_method_file_map(&path).expect("method map loads");
        assert_eq!(map.get("My.Tests.Ns.A.B"), Some(Utf8Path::new("src/A.cs")));

        std::fs::write(&path, "[]").expect("wrote method map");
        assert!(matches!(
            load_method_file_map(&path),
            Err(MethodMapLoadError::Parse { .. })
        ));
    }
}
