use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const SECTORS: [&str; 4] = ["Farm", "Fert", "Mill", "Power"];

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn sector_header() -> String {
    let regions = vec!["R1"; SECTORS.len()].join("\t");
    format!(
        "region\t\t{regions}\nsector\t\t{}\nregion\tsector{}\n",
        SECTORS.join("\t"),
        "\t".repeat(SECTORS.len())
    )
}

/// One region, four sectors, one year of EXIOBASE-shaped input.
fn write_year(root: &Path, year: i32) {
    let iot = root.join(format!("EXIOBASE/IOT_txt/pxp/IOT_{year}_pxp"));
    let a_rows = [
        [0.05, 0.1, 0.2, 0.0],
        [0.1, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.05, 0.0],
        [0.1, 0.2, 0.1, 0.05],
    ];
    let mut a = sector_header();
    for (s, row) in SECTORS.iter().zip(a_rows) {
        let values: Vec<String> = row.iter().map(f64::to_string).collect();
        a.push_str(&format!("R1\t{s}\t{}\n", values.join("\t")));
    }
    write(&iot.join("A.txt"), &a);

    let mut y = String::from(
        "region\t\tR1\tR1\ncategory\t\tFinal consumption expenditure by households\tExports: Total (fob)\nregion\tsector\t\t\n",
    );
    for s in SECTORS {
        y.push_str(&format!("R1\t{s}\t5\t100\n"));
    }
    write(&iot.join("Y.txt"), &y);

    let mut x = String::from("region\tsector\tindout\n");
    for s in SECTORS {
        x.push_str(&format!("R1\t{s}\t20\n"));
    }
    write(&iot.join("x.txt"), &x);

    let mut f = sector_header().replacen("region\tsector\t", "IEA_product\tflow\t", 1);
    f.push_str("Coal\tEnergy use\t1\t8\t2\t40\n");
    f.push_str("Natural gas\tEnergy use\t2\t30\t1\t10\n");
    write(
        &root.join(format!(
            "EXIOBASE/Extensions/energy/pxp/IOT_{year}_pxp/net_energy_use.tsv"
        )),
        &f,
    );
}

fn write_config(root: &Path) -> std::path::PathBuf {
    let path = root.join("eroi.toml");
    let text = format!(
        r#"data_path = "{}"
years = [2010, 2011]
workers = 2
scenario = "include-fertiliser-in-chain"

[sectors]
agriculture = ["Farm"]
fertiliser = ["Fert"]
processed = ["Mill"]
"#,
        root.display()
    );
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn config_init_writes_loadable_defaults() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("eroi.toml");
    Command::cargo_bin("eroi")
        .unwrap()
        .args(["config", "init", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("include-fertiliser-in-chain"));
    assert!(text.contains("N-fertiliser"));

    Command::cargo_bin("eroi")
        .unwrap()
        .args(["config", "check", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("data_path"));

    // refuses to overwrite
    Command::cargo_bin("eroi")
        .unwrap()
        .args(["config", "init", path.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn upstream_single_year_writes_target_perspectives() {
    let tmp = tempdir().unwrap();
    write_year(tmp.path(), 2010);
    let config = write_config(tmp.path());

    Command::cargo_bin("eroi")
        .unwrap()
        .args([
            "--log-level",
            "warn",
            "upstream",
            "--config",
            config.to_str().unwrap(),
            "--year",
            "2010",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("upstream 1 -> 1/0 ok/fail"));

    let out = tmp
        .path()
        .join("interim/upstream_energy_use/unallocated/2010/target_perspective");
    assert!(out.join("primary_crops_product_incl_fertiliser.tsv").exists());
    assert!(out.join("processed_food_product_incl_fertiliser.tsv").exists());
    assert!(tmp
        .path()
        .join("interim/batch/upstream/batch_manifest.json")
        .exists());
}

#[test]
fn upstream_reports_missing_years_as_failure() {
    let tmp = tempdir().unwrap();
    write_year(tmp.path(), 2010);
    let config = write_config(tmp.path());

    Command::cargo_bin("eroi")
        .unwrap()
        .args(["upstream", "--config", config.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("upstream:2011 failed"));
    // the good year still completed
    assert!(tmp
        .path()
        .join("interim/upstream_energy_use/unallocated/2010/target_perspective/primary_crops_product_incl_fertiliser.tsv")
        .exists());
}

#[test]
fn invalid_sector_lists_fail_before_any_work() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("eroi.toml");
    fs::write(
        &path,
        "data_path = \"nowhere\"\n[sectors]\nagriculture = [\"Farm\"]\nfertiliser = [\"Farm\"]\nprocessed = [\"Mill\"]\n",
    )
    .unwrap();
    Command::cargo_bin("eroi")
        .unwrap()
        .args(["upstream", "--config", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Farm"));
}
