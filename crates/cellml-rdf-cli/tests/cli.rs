use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MODEL: &str = r##"<?xml version="1.0"?>
<model xmlns="http://www.cellml.org/cellml/1.0#"
       xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" name="m">
  <units name="u"/>
  <rdf:RDF>
    <rdf:Description rdf:about="#ref1"/>
  </rdf:RDF>
  <component name="c"/>
</model>
"##;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn rdf_extractor() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("rdf-extractor")?)
}

fn write_model(dir: &TempDir, contents: &str) -> std::io::Result<PathBuf> {
    let path = dir.path().join("model.cellml");
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn prints_cleaned_model_and_writes_rdf() -> TestResult {
    let dir = TempDir::new()?;
    let model = write_model(&dir, MODEL)?;

    rdf_extractor()?
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("<units name=\"u\"/>"))
        .stdout(predicate::str::contains("<component name=\"c\"/>"))
        .stdout(predicate::str::contains("rdf:RDF>").not());

    let rdf = fs::read_to_string(dir.path().join("model.cellml.rdf"))?;
    let expected = format!("rdf:about=\"{}#ref1\"", model.display());
    assert!(rdf.contains(&expected), "{rdf}");
    // input untouched without the overwrite argument
    assert_eq!(fs::read_to_string(&model)?, MODEL);
    Ok(())
}

#[test]
fn overwrites_input_when_asked() -> TestResult {
    let dir = TempDir::new()?;
    let model = write_model(&dir, MODEL)?;

    rdf_extractor()?
        .arg(&model)
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let cleaned = fs::read_to_string(&model)?;
    assert!(!cleaned.contains("rdf:RDF>"));
    assert!(cleaned.contains("<component name=\"c\"/>"));
    Ok(())
}

#[test]
fn overwrite_flag_may_look_like_an_option() -> TestResult {
    let dir = TempDir::new()?;
    let model = write_model(&dir, MODEL)?;

    rdf_extractor()?
        .arg(&model)
        .arg("-y")
        .arg("ignored")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let cleaned = fs::read_to_string(&model)?;
    assert!(!cleaned.contains("rdf:RDF>"));
    assert!(dir.path().join("model.cellml.rdf").exists());
    Ok(())
}

#[test]
fn model_without_metadata_gets_empty_rdf() -> TestResult {
    let dir = TempDir::new()?;
    let model = write_model(&dir, "<model xmlns=\"http://www.cellml.org/cellml/1.1#\"/>")?;

    rdf_extractor()?.arg(&model).assert().success();

    let rdf = fs::read_to_string(dir.path().join("model.cellml.rdf"))?;
    assert!(rdf.contains(
        "<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"/>"
    ));
    Ok(())
}

#[test]
fn missing_argument_is_usage_error() -> TestResult {
    rdf_extractor()?
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
    Ok(())
}

#[test]
fn help_exits_zero() -> TestResult {
    rdf_extractor()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rdf-extractor"));
    Ok(())
}

#[test]
fn missing_file_is_processing_failure() -> TestResult {
    let dir = TempDir::new()?;
    let missing = dir.path().join("absent.cellml");

    rdf_extractor()?
        .arg(&missing)
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("absent.cellml"));
    assert!(!dir.path().join("absent.cellml.rdf").exists());
    Ok(())
}

#[test]
fn malformed_model_leaves_existing_rdf_alone() -> TestResult {
    let dir = TempDir::new()?;
    let model = write_model(&dir, "<model><unclosed></model>")?;
    let rdf_path = dir.path().join("model.cellml.rdf");
    fs::write(&rdf_path, "previous")?;

    rdf_extractor()?.arg(&model).assert().code(2);

    assert_eq!(fs::read_to_string(&rdf_path)?, "previous");
    Ok(())
}
