use fpm_fs::{NormalizedPath, io};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("configs/applied_abc.json"));

    io::write_atomic(&path, b"{}").unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "{}");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("test.txt");
    fs::write(&file_path, "original").unwrap();

    let path = NormalizedPath::new(&file_path);
    io::write_atomic(&path, b"updated").unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("index.json"));

    io::write_atomic(&path, b"one").unwrap();
    io::write_atomic(&path, b"two").unwrap();

    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["index.json".to_string()]);
}

#[test]
fn test_read_text_nonexistent_file_reports_path() {
    let path = NormalizedPath::new("/nonexistent/file.txt");
    let err = io::read_text(&path).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/file.txt"));
}

#[test]
fn test_read_bytes_round_trips_non_utf8() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("blob.bin"));
    io::write_atomic(&path, &[0xff, 0xfe, 0x00]).unwrap();

    assert_eq!(io::read_bytes(&path).unwrap(), vec![0xff, 0xfe, 0x00]);
    assert!(io::read_text(&path).is_err());
}

#[test]
fn test_write_atomic_failure_removes_temp_file() {
    let temp = TempDir::new().unwrap();
    // A non-empty directory at the target path makes the final rename fail
    let target = temp.path().join("time.cc");
    fs::create_dir_all(target.join("occupied")).unwrap();

    let result = io::write_atomic(&NormalizedPath::new(&target), b"int tz = 9;\n");

    assert!(result.is_err());
    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["time.cc".to_string()]);
    assert!(target.is_dir());
}
