use std::fs;
use std::path::PathBuf;

use column_merge_sort::error::SortError;
use column_merge_sort::sort::Sort;

mod common;

#[test]
fn test_check_sorted() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = common::temp_file_name("./target/results/");
    let sorted_path = common::temp_file_name("./target/results/");
    common::write_lines(&input_path, &common::random_records(1_000))?;

    let mut sort = Sort::new(input_path.clone(), sorted_path.clone());
    sort.with_column(1);
    sort.with_chunk_lines(100);
    sort.sort()?;

    let mut check = Sort::new(sorted_path.clone(), PathBuf::new());
    check.with_column(1);
    assert_eq!(check.check()?, true);
    fs::remove_file(input_path)?;
    fs::remove_file(sorted_path)?;
    Ok(())
}

#[test]
fn test_check_not_sorted() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = common::temp_file_name("./target/results/");
    fs::write(&input_path, "1\ta\n2\tc\n3\tb\n")?;

    let mut check = Sort::new(input_path.clone(), PathBuf::from("unused"));
    check.with_column(1);
    assert_eq!(check.check()?, false);

    // sorted by the first column
    let check = Sort::new(input_path.clone(), PathBuf::from("unused"));
    assert_eq!(check.check()?, true);
    fs::remove_file(input_path)?;
    Ok(())
}

#[test]
fn test_check_malformed() -> Result<(), anyhow::Error> {
    common::setup();
    let input_path = common::temp_file_name("./target/results/");
    fs::write(&input_path, "1\ta\n2\n")?;

    let mut check = Sort::new(input_path.clone(), PathBuf::from("unused"));
    check.with_column(1);
    let error = check.check().unwrap_err();
    assert!(matches!(error.downcast_ref::<SortError>(), Some(SortError::MalformedRecord { line_number: 2, .. })));
    fs::remove_file(input_path)?;
    Ok(())
}
