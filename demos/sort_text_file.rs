use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Error;
use column_merge_sort::delimiter::Delimiter;
use column_merge_sort::sort::Sort;
use simple_logger::SimpleLogger;

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn create_input(path: &Path, lines: usize) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    for i in 0..lines {
        writeln!(writer, "{}\tname-{:05}\t{}", i, (i * 7919) % lines, i % 97)?;
    }
    writer.flush()?;
    Ok(())
}

fn sort_by_name(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    let mut sort = Sort::new(input_path.to_path_buf(), output_path.to_path_buf());
    sort.with_column(1);
    // small chunks to exercise the merge
    sort.with_chunk_lines(1_000);
    let stats = sort.sort()?;
    log::info!(
        "{} records, {} runs, phase 1: {:?}, phase 2: {:?}",
        stats.records(),
        stats.runs(),
        stats.phase1(),
        stats.phase2()
    );
    Ok(())
}

fn sort_by_last_column(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    let mut sort = Sort::new(input_path.to_path_buf(), output_path.to_path_buf());
    sort.with_delimiter(Delimiter::pattern(r"\t")?);
    sort.with_column(2);
    sort.with_chunk_lines(10_000);
    sort.sort()?;
    Ok(())
}

// cargo run -r --example sort_text_file
pub fn main() -> Result<(), Error> {
    SimpleLogger::new().init()?;
    let input_path = PathBuf::from("./target/input-100000.dat");
    let by_name_path = PathBuf::from("./target/by-name-100000.dat");
    let by_last_path = PathBuf::from("./target/by-last-100000.dat");

    create_input(&input_path, 100_000)?;
    sort_by_name(&input_path, &by_name_path)?;
    sort_by_last_column(&input_path, &by_last_path)?;

    let mut check = Sort::new(by_name_path.clone(), PathBuf::new());
    check.with_column(1);
    log::info!("{} sorted: {}", by_name_path.display(), check.check()?);
    Ok(())
}
