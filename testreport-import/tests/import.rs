// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::{Result, WrapErr};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;
use testreport_import::{
    DefaultConfigWarnings, ImportConfig, ImportOutcome, InMemoryMeasureStore, MeasureKey, Metric,
    ReportAggregator, UniqueWarnings, UnitTestResultsImporter, load_method_file_map,
};

fn write(dir: &Utf8TempDir, path: &str, contents: &str) -> Result<()> {
    let path = dir.path().join(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).wrap_err_with(|| format!("creating {parent}"))?;
    }
    fs::write(&path, contents).wrap_err_with(|| format!("writing {path}"))
}

fn project_workspace() -> Result<Utf8TempDir> {
    let dir = Utf8TempDir::new()?;
    write(
        &dir,
        ".config/testreport.toml",
        indoc! {r#"
            [import]
            base-dir = ".."

            [language.cs]
            xunit-report-paths = ["TestResults/**/*.xml"]
            vstest-report-paths = ["TestResults/*.trx"]

            [language.vbnet]
            nunit-report-paths = ["vb/nunit.xml"]
        "#},
    )?;
    write(
        &dir,
        "methods.json",
        r#"{
            "My.Tests.Ns.CalcTests.Add": "src/CalcTests.cs",
            "My.Tests.Ns.CalcTests.Divide": "src/CalcTests.cs",
            "My.Tests.Ns.CalcTests.Pending": "src/CalcTests.cs",
            "My.Tests.Ns.TrxTests.Run": "src/TrxTests.cs"
        }"#,
    )?;
    write(
        &dir,
        "TestResults/run1/xunit.xml",
        indoc! {r#"
            <assemblies>
              <assembly name="Tests/My.Tests.dll">
                <collection>
                  <test name="Ns.CalcTests.Add" result="Pass" time="0.5" />
                  <test name="Ns.CalcTests.Divide(divisor: 0)" result="Fail" />
                  <test name="Ns.CalcTests.Pending" result="Skip" time="0.001" />
                </collection>
              </assembly>
            </assemblies>
        "#},
    )?;
    write(
        &dir,
        "TestResults/results.trx",
        indoc! {r#"
            <TestRun xmlns="http://microsoft.com/schemas/VisualStudio/TeamTest/2010">
              <Results>
                <UnitTestResult testId="1" outcome="Failed" duration="00:00:00.0400000" />
              </Results>
              <TestDefinitions>
                <UnitTest id="1">
                  <TestMethod codeBase="bin/My.Tests.dll" className="Ns.TrxTests" name="Run" />
                </UnitTest>
              </TestDefinitions>
            </TestRun>
        "#},
    )?;
    Ok(dir)
}

#[test]
fn imports_configured_reports() -> Result<()> {
    let dir = project_workspace()?;
    let config = ImportConfig::from_file(
        &dir.path().join(ImportConfig::CONFIG_PATH),
        &mut DefaultConfigWarnings,
    )?;
    let method_file_map = load_method_file_map(&dir.path().join("methods.json"))?;
    let cs = config.language("cs").expect("cs is configured");

    let mut store = InMemoryMeasureStore::new();
    let mut warnings = UniqueWarnings::new();
    let aggregator = ReportAggregator::new(cs.reports(), config.base_dir(), &method_file_map);
    let outcome = UnitTestResultsImporter::new(aggregator, cs.language().clone(), &mut warnings)
        .execute(&mut store, "my-app");

    assert_eq!(outcome, ImportOutcome::Imported { files: 2 });
    assert!(warnings.is_empty());

    let calc = MeasureKey::File("src/CalcTests.cs".into());
    assert_eq!(
        store.measures_for(&calc).collect::<Vec<_>>(),
        [
            (Metric::Tests, 3),
            (Metric::SkippedTests, 1),
            (Metric::TestFailures, 1),
            (Metric::TestErrors, 0),
            (Metric::TestExecutionTime, 501),
        ]
    );
    let project = MeasureKey::Project("my-app".to_owned());
    assert_eq!(store.get(&project, Metric::Tests), Some(4));
    assert_eq!(store.get(&project, Metric::TestFailures), Some(2));
    assert_eq!(store.get(&project, Metric::TestExecutionTime), Some(541));
    Ok(())
}

#[test]
fn broken_report_does_not_block_other_languages() -> Result<()> {
    let dir = project_workspace()?;
    write(&dir, "vb/nunit.xml", "<test-run><test-case name=\"Broken\" /></test-run>")?;

    let config = ImportConfig::from_file(
        &dir.path().join(ImportConfig::CONFIG_PATH),
        &mut DefaultConfigWarnings,
    )?;
    let method_file_map = load_method_file_map(&dir.path().join("methods.json"))?;

    let mut store = InMemoryMeasureStore::new();
    let mut warnings = UniqueWarnings::new();
    let outcomes: Vec<_> = config
        .languages()
        .map(|language| {
            let aggregator =
                ReportAggregator::new(language.reports(), config.base_dir(), &method_file_map);
            let outcome =
                UnitTestResultsImporter::new(aggregator, language.language().clone(), &mut warnings)
                    .execute(&mut store, "my-app");
            (language.language().key().to_owned(), outcome)
        })
        .collect();

    assert_eq!(
        outcomes,
        [
            ("cs".to_owned(), ImportOutcome::Imported { files: 2 }),
            ("vbnet".to_owned(), ImportOutcome::Failed),
        ]
    );
    assert_eq!(
        warnings.iter().collect::<Vec<_>>(),
        ["Could not import unit test report for 'VB.NET'. Please check the logs for more details."]
    );
    assert_eq!(
        store.get(&MeasureKey::Project("my-app".to_owned()), Metric::Tests),
        Some(4)
    );
    Ok(())
}

#[test]
fn language_without_reports_is_skipped() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let config = ImportConfig::from_str(
        &dir.path().join("testreport.toml"),
        "[language.cs]\n",
        &mut DefaultConfigWarnings,
    )?;
    let reports = config
        .language("cs")
        .map(|language| language.reports().clone())
        .unwrap_or_default();

    let method_file_map = Default::default();
    let mut store = InMemoryMeasureStore::new();
    let outcome = UnitTestResultsImporter::new(
        ReportAggregator::new(&reports, Utf8Path::new("."), &method_file_map),
        testreport_import::Language::csharp(),
        UniqueWarnings::new(),
    )
    .execute(&mut store, "my-app");

    assert_eq!(outcome, ImportOutcome::Skipped);
    assert!(store.is_empty());
    Ok(())
}
