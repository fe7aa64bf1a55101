use std::fs;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

use data_encoding::HEXLOWER;
use rand::Rng;
use simple_logger::SimpleLogger;

pub fn setup() {
    let _ = SimpleLogger::new().with_level(log::LevelFilter::Warn).init();
    let results_dir_path = PathBuf::from_str("./target/results/").unwrap();

    if !results_dir_path.exists() {
        fs::create_dir_all(&results_dir_path).unwrap_or_else(|_|
            panic!("Failed to create results directory: {:?}", results_dir_path)
        );
    }
}

#[allow(dead_code)]
pub fn read_lines(path: &PathBuf) -> Result<Vec<String>, anyhow::Error> {
    let reader = BufReader::new(File::open(path)?);
    let lines = reader.lines().map(|x| x.unwrap()).collect();
    Ok(lines)
}

#[allow(dead_code)]
pub fn write_lines(path: &PathBuf, lines: &[String]) -> Result<(), anyhow::Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

#[allow(dead_code)]
pub fn temp_file_name(dir: &str) -> PathBuf {
    let mut result = PathBuf::from(dir);
    let name = HEXLOWER.encode(&rand::random::<[u8; 16]>());
    result.push(name);
    result
}

/// A fresh empty directory for intermediate runs
#[allow(dead_code)]
pub fn temp_dir(dir: &str) -> PathBuf {
    let path = temp_file_name(dir);
    fs::create_dir_all(&path).unwrap();
    path
}

#[allow(dead_code)]
pub fn is_empty_dir(path: &PathBuf) -> Result<bool, anyhow::Error> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Tab separated records: a sequence number, a key with many duplicates and a payload
#[allow(dead_code)]
pub fn random_records(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| format!("{}\tkey-{:04}\t{}", i, rng.gen_range(0..500), HEXLOWER.encode(&rand::random::<[u8; 4]>())))
        .collect()
}

/// Column `column_index` of a tab separated line
#[allow(dead_code)]
pub fn column(line: &str, column_index: usize) -> &str {
    line.split('\t').nth(column_index).unwrap()
}
