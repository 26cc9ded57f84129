// CLI integration tests for the packaging flow.
use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use zip::ZipArchive;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_jarpack");
    Command::new(exe)
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"\xca\xfe\xba\xbe").expect("write class file");
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn jar_entries(jar_path: &Path) -> Vec<String> {
    let mut archive = ZipArchive::new(fs::File::open(jar_path).expect("open jar")).expect("zip");
    (0..archive.len())
        .map(|index| archive.by_index(index).expect("entry").name().to_string())
        .collect()
}

fn jar_manifest(jar_path: &Path) -> String {
    let mut archive = ZipArchive::new(fs::File::open(jar_path).expect("open jar")).expect("zip");
    let mut text = String::new();
    archive
        .by_name("META-INF/MANIFEST.MF")
        .expect("manifest entry")
        .read_to_string(&mut text)
        .expect("manifest text");
    text
}

#[test]
fn packs_companions_and_tags_manifest() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bin-plugin");
    let output = temp.path().join("dist").join("plugins");
    fs::create_dir_all(&input).expect("mkdir");
    touch(&input, "TestPlugin.class");
    touch(&input, "TestObject.class");

    let run = cmd()
        .args([
            "--input-dir",
            input.to_str().unwrap(),
            "--output-dir",
            output.to_str().unwrap(),
        ])
        .output()
        .expect("run");
    assert!(run.status.success());

    let stdout = String::from_utf8_lossy(&run.stdout);
    assert!(stdout.contains("Making"));
    assert!(stdout.contains("Test.jar"));
    assert!(stdout.contains("Packed 1 plugin."));

    let jar = output.join("Test.jar");
    assert_eq!(
        jar_entries(&jar),
        vec![
            "META-INF/",
            "META-INF/MANIFEST.MF",
            "TestObject.class",
            "TestPlugin.class"
        ]
    );
    let manifest = jar_manifest(&jar);
    assert_eq!(manifest.matches("Plugin-Class:").count(), 1);
    assert!(manifest.contains("Plugin-Class: TestPlugin\r\n"));
}

#[test]
fn distinct_prefixes_produce_one_jar_each() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bin-plugin");
    let output = temp.path().join("out");
    fs::create_dir_all(&input).expect("mkdir");
    for name in ["AlphaPlugin.class", "BetaPlugin.class", "GammaPlugin.class"] {
        touch(&input, name);
    }

    let run = cmd()
        .args([
            "--input-dir",
            input.to_str().unwrap(),
            "--output-dir",
            output.to_str().unwrap(),
        ])
        .output()
        .expect("run");
    assert!(run.status.success());

    let mut jars: Vec<String> = fs::read_dir(&output)
        .expect("read output dir")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    jars.sort();
    assert_eq!(jars, vec!["Alpha.jar", "Beta.jar", "Gamma.jar"]);
    assert!(jar_manifest(&output.join("Beta.jar")).contains("Plugin-Class: BetaPlugin\r\n"));
}

#[test]
fn no_input_files_exits_with_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bin-plugin");
    let output = temp.path().join("dist").join("plugins");
    fs::create_dir_all(&input).expect("mkdir");
    touch(&input, "Helper.class");

    let run = cmd()
        .args([
            "--input-dir",
            input.to_str().unwrap(),
            "--output-dir",
            output.to_str().unwrap(),
        ])
        .output()
        .expect("run");
    assert_eq!(run.status.code().unwrap(), 3);

    let err_json = parse_json(String::from_utf8_lossy(&run.stderr).trim());
    let error = err_json.get("error").expect("error envelope");
    assert_eq!(error.get("kind").unwrap().as_str().unwrap(), "NotFound");
    assert!(
        error
            .get("hint")
            .unwrap()
            .as_str()
            .unwrap()
            .contains("Compile the plugins first")
    );

    let archives = fs::read_dir(&output).expect("read output dir").count();
    assert_eq!(archives, 0);
}

#[test]
fn default_conventions_work_from_working_directory() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bin-plugin");
    fs::create_dir_all(&input).expect("mkdir");
    touch(&input, "TestPlugin.class");

    let run = cmd()
        .current_dir(temp.path())
        .output()
        .expect("run");
    assert!(run.status.success());
    assert!(temp.path().join("dist").is_dir());
    assert!(temp.path().join("dist").join("plugins").join("Test.jar").is_file());

    // Nothing else lands in the working directory, in particular no
    // temporary manifest fragment.
    let mut top_level: Vec<String> = fs::read_dir(temp.path())
        .expect("read cwd")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    top_level.sort();
    assert_eq!(top_level, vec!["bin-plugin", "dist"]);
}

#[test]
fn rerun_is_idempotent_for_entries_and_manifest() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bin-plugin");
    let output = temp.path().join("dist").join("plugins");
    fs::create_dir_all(&input).expect("mkdir");
    touch(&input, "TestPlugin.class");
    touch(&input, "TestObject.class");

    let args = [
        "--input-dir".to_string(),
        input.to_str().unwrap().to_string(),
        "--output-dir".to_string(),
        output.to_str().unwrap().to_string(),
    ];
    let first = cmd().args(&args).output().expect("first run");
    assert!(first.status.success());
    let jar = output.join("Test.jar");
    let first_entries = jar_entries(&jar);
    let first_manifest = jar_manifest(&jar);

    let second = cmd().args(&args).output().expect("second run");
    assert!(second.status.success());
    assert_eq!(jar_entries(&jar), first_entries);
    assert_eq!(jar_manifest(&jar), first_manifest);
}

#[test]
fn failed_unit_is_reported_and_run_continues() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bin-plugin");
    let output = temp.path().join("dist").join("plugins");
    fs::create_dir_all(&input).expect("mkdir");
    touch(&input, "GoodPlugin.class");
    touch(&input, "BadPlugin.class");
    // A directory squatting on Bad.jar makes that unit fail to archive.
    fs::create_dir_all(output.join("Bad.jar")).expect("mkdir");

    let run = cmd()
        .args([
            "--input-dir",
            input.to_str().unwrap(),
            "--output-dir",
            output.to_str().unwrap(),
        ])
        .output()
        .expect("run");
    assert_eq!(run.status.code().unwrap(), 4);

    let stdout = String::from_utf8_lossy(&run.stdout);
    assert!(stdout.contains("Packed 1 plugin, 1 failed."));
    let stderr = String::from_utf8_lossy(&run.stderr);
    assert!(stderr.contains("failed:"));
    assert!(stderr.contains("Bad.jar"));
    assert!(output.join("Good.jar").is_file());
}

#[test]
fn json_report_covers_all_units() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("bin-plugin");
    let output = temp.path().join("dist").join("plugins");
    fs::create_dir_all(&input).expect("mkdir");
    touch(&input, "TestPlugin.class");
    touch(&input, "TestObject.class");
    touch(&input, "OtherPlugin.class");

    let run = cmd()
        .args([
            "--json",
            "--input-dir",
            input.to_str().unwrap(),
            "--output-dir",
            output.to_str().unwrap(),
        ])
        .output()
        .expect("run");
    assert!(run.status.success());

    let report = parse_json(String::from_utf8_lossy(&run.stdout).trim());
    assert_eq!(report.get("packed").unwrap().as_u64().unwrap(), 2);
    assert_eq!(report.get("failed").unwrap().as_u64().unwrap(), 0);
    let units = report.get("units").unwrap().as_array().expect("units");
    assert_eq!(units.len(), 2);
    let test_unit = units
        .iter()
        .find(|unit| unit.get("plugin").unwrap() == "Test")
        .expect("Test unit");
    assert_eq!(
        test_unit.get("plugin_class").unwrap().as_str().unwrap(),
        "TestPlugin"
    );
    assert_eq!(
        test_unit.get("entries").unwrap().as_array().unwrap().len(),
        2
    );
    assert!(test_unit.get("failure").is_none());

    // JSON mode keeps stdout machine-readable: no progress lines.
    let stdout = String::from_utf8_lossy(&run.stdout);
    assert!(!stdout.contains("Making"));
}

#[test]
fn usage_exit_code() {
    let run = cmd().arg("--no-such-flag").output().expect("run");
    assert_eq!(run.status.code().unwrap(), 2);
}
