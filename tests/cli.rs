//! End-to-end checks of the covstat binary on small on-disk tracks.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn genome_file() -> NamedTempFile {
    let mut genome = NamedTempFile::new().unwrap();
    writeln!(genome, "chr1\t100").unwrap();
    writeln!(genome, "chr2\t40").unwrap();
    genome.flush().unwrap();
    genome
}

fn track_file(lines: &[&str]) -> NamedTempFile {
    let mut track = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(track, "{}", line).unwrap();
    }
    track.flush().unwrap();
    track
}

fn covstat(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_covstat"))
        .args(args)
        .output()
        .expect("Failed to run covstat")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_stat_mean_every_chromosome() {
    let genome = genome_file();
    let track = track_file(&["chr1\t0\t50\t4", "chr2\t0\t40\t1"]);

    let output = covstat(&[
        "stat",
        "-i",
        track.path().to_str().unwrap(),
        "-g",
        genome.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_lines(&output), vec!["chr1\t0\t100\t2.0", "chr2\t0\t40\t1.0"]);
}

#[test]
fn test_stat_percentile_with_region_file() {
    let genome = genome_file();
    let track = track_file(&["chr1\t0\t10\t1", "chr1\t10\t20\t5", "chr1\t20\t30\t9"]);
    let mut regions = NamedTempFile::new().unwrap();
    writeln!(regions, "# regions").unwrap();
    writeln!(regions, "chr1\t0\t30\tfirst").unwrap();
    writeln!(regions, "chr1\t10\t30").unwrap();
    regions.flush().unwrap();

    let output = covstat(&[
        "stat",
        "-i",
        track.path().to_str().unwrap(),
        "-g",
        genome.path().to_str().unwrap(),
        "-r",
        regions.path().to_str().unwrap(),
        "-s",
        "percentile=50",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_lines(&output), vec!["chr1\t0\t30\t5", "chr1\t10\t30\t9"]);
}

#[test]
fn test_stat_perc_cov_and_hist() {
    let genome = genome_file();
    let track = track_file(&["chr2\t0\t10\t3", "chr2\t10\t20\t1"]);
    let track_path = track.path().to_str().unwrap();
    let genome_path = genome.path().to_str().unwrap();

    let output = covstat(&["stat", "-i", track_path, "-g", genome_path, "-s", "perc_cov=1,2", "chr2"]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["chr2\t0\t40\t0.5\t0.25"]);

    let output = covstat(&[
        "stat", "-i", track_path, "-g", genome_path, "-s", "hist", "--max-bin", "3", "chr2",
    ]);
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec!["<0\t0\t0.0", "0\t20\t0.5", "1\t10\t0.25", "2\t0\t0.0", ">=3\t10\t0.25"]
    );
}

#[test]
fn test_resample_bins() {
    let genome = genome_file();
    let track = track_file(&["chr2\t0\t20\t2", "chr2\t20\t40\t6"]);

    let output = covstat(&[
        "resample",
        "-i",
        track.path().to_str().unwrap(),
        "-g",
        genome.path().to_str().unwrap(),
        "--bin-size",
        "15",
        "chr2",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_lines(&output),
        vec!["chr2\t0\t15\t2.0", "chr2\t15\t30\t4.666666666666667", "chr2\t30\t40\t6.0"]
    );
}

#[test]
fn test_view_two_tracks() {
    let genome = genome_file();
    let a = track_file(&["chr1\t0\t3\t1"]);
    let b = track_file(&["chr1\t1\t2\t8"]);

    let output = covstat(&[
        "view",
        "-i",
        a.path().to_str().unwrap(),
        "-i",
        b.path().to_str().unwrap(),
        "-g",
        genome.path().to_str().unwrap(),
        "chr1:0-4",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_lines(&output),
        vec!["chr1\t0\t1\t0", "chr1\t1\t1\t8", "chr1\t2\t1\t0", "chr1\t3\t0\t0"]
    );
}

#[test]
fn test_errors_exit_nonzero() {
    let genome = genome_file();
    let track = track_file(&["chr1\t0\t10\t1"]);
    let track_path = track.path().to_str().unwrap();
    let genome_path = genome.path().to_str().unwrap();

    let output = covstat(&["stat", "-i", track_path, "-g", genome_path, "chrUn"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("chrUn"));

    let output = covstat(&["resample", "-i", track_path, "-g", genome_path, "-b", "10", "-m", "max"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unsupported aggregation method"));

    let bad = track_file(&["chr1\t0\tten\t1"]);
    let output = covstat(&["stat", "-i", bad.path().to_str().unwrap(), "-g", genome_path]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 1"));
}
