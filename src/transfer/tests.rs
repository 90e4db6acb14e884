use super::*;
use crate::driver::{CameraDriver, DeviceHandle, SimOp, SimulatedDriver};
use crate::error::TetherError;
use crate::status;
use crate::types::AssetLocator;
use std::io::{Read, SeekFrom};
use std::sync::Arc;
use tempfile::TempDir;

const ASSET_SIZE: usize = 10_000;

fn asset_bytes() -> Vec<u8> {
    (0..ASSET_SIZE).map(|i| (i % 256) as u8).collect()
}

fn asset_locator() -> AssetLocator {
    AssetLocator::new("/DCIM/100TEST", "IMG_0001.JPG")
}

fn open_device() -> (Arc<SimulatedDriver>, DeviceHandle) {
    let driver = Arc::new(
        SimulatedDriver::builder()
            .image("/DCIM/100TEST", "IMG_0001.JPG", asset_bytes(), 640, 480)
            .build(),
    );
    let handle = driver.init().unwrap();
    (driver, handle)
}

#[test]
fn test_buffered_read_larger_than_remaining() {
    let (driver, handle) = open_device();
    let mut reader = BufferedReader::open(driver.as_ref(), handle, &asset_locator()).unwrap();
    assert_eq!(reader.full_size(), ASSET_SIZE as u64);

    let mut head = vec![0u8; 4_000];
    let outcome = reader.read_chunk(&mut head).unwrap();
    assert_eq!(outcome, ReadOutcome::data(4_000));

    let mut rest = vec![0u8; 8_000];
    let outcome = reader.read_chunk(&mut rest).unwrap();
    assert_eq!(outcome.bytes, 6_000);
    assert!(outcome.end_of_stream);
    assert_eq!(&rest[..6_000], &asset_bytes()[4_000..]);

    let outcome = reader.read_chunk(&mut rest).unwrap();
    assert_eq!(outcome, ReadOutcome::last(0));
}

#[test]
fn test_buffered_exact_read_signals_end_in_same_call() {
    let mut reader = BufferedReader::from_bytes(None, vec![1, 2, 3, 4]);
    let mut buf = [0u8; 4];
    let outcome = reader.read_chunk(&mut buf).unwrap();
    assert_eq!(outcome, ReadOutcome::last(4));
    assert_eq!(buf, [1, 2, 3, 4]);
}

#[test]
fn test_buffered_empty_asset() {
    let mut reader = BufferedReader::from_bytes(None, Vec::new());
    let mut buf = [0u8; 16];
    assert_eq!(reader.read_chunk(&mut buf).unwrap(), ReadOutcome::last(0));
}

#[test]
fn test_buffered_read_after_close_fails() {
    let (driver, handle) = open_device();
    let mut reader = BufferedReader::open(driver.as_ref(), handle, &asset_locator()).unwrap();

    reader.close();
    reader.close();
    assert!(reader.is_closed());

    let mut buf = [0u8; 16];
    assert!(matches!(
        reader.read_chunk(&mut buf),
        Err(TetherError::Closed(_))
    ));
    assert!(reader.data().is_err());

    let err = reader.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
}

#[test]
fn test_buffered_io_read_to_end() {
    let (driver, handle) = open_device();
    let mut reader = BufferedReader::open(driver.as_ref(), handle, &asset_locator()).unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, asset_bytes());
}

#[test]
fn test_buffered_open_missing_file() {
    let (driver, handle) = open_device();
    let err = BufferedReader::open(driver.as_ref(), handle, &AssetLocator::new("/DCIM", "nope.jpg"))
        .unwrap_err();
    assert_eq!(err.device_code(), Some(status::ERROR_FILE_NOT_FOUND));
}

#[test]
fn test_chunked_reads_concatenate_to_asset() {
    let (driver, handle) = open_device();
    let mut reader = ChunkedReader::new(driver.clone(), handle, asset_locator());

    let mut collected = Vec::new();
    for len in [1_000usize, 3_333, 4_000, 1_667] {
        let mut buf = vec![0u8; len];
        let outcome = reader.read_chunk(&mut buf).unwrap();
        assert_eq!(outcome.bytes, len);
        collected.extend_from_slice(&buf[..outcome.bytes]);
    }
    assert_eq!(collected, asset_bytes());

    let mut buf = vec![0u8; 512];
    assert_eq!(reader.read_chunk(&mut buf).unwrap(), ReadOutcome::last(0));
}

#[test]
fn test_chunked_short_read_delivers_data_and_ends() {
    let (driver, handle) = open_device();
    let mut reader = ChunkedReader::new(driver.clone(), handle, asset_locator());
    reader.seek(SeekFrom::Start(9_900)).unwrap();

    let mut buf = vec![0u8; 256];
    let outcome = reader.read_chunk(&mut buf).unwrap();
    assert_eq!(outcome, ReadOutcome::last(100));
    assert_eq!(&buf[..100], &asset_bytes()[9_900..]);

    assert_eq!(reader.read_chunk(&mut buf).unwrap(), ReadOutcome::last(0));
}

#[test]
fn test_chunked_seek_modes() {
    let (driver, handle) = open_device();
    let mut reader = ChunkedReader::new(driver.clone(), handle, asset_locator());

    assert_eq!(reader.seek(SeekFrom::Start(5)).unwrap(), 5);
    assert_eq!(reader.seek(SeekFrom::Current(10)).unwrap(), 15);
    assert_eq!(reader.seek(SeekFrom::Current(-5)).unwrap(), 10);

    let mut buf = [0u8; 4];
    reader.read_chunk(&mut buf).unwrap();
    assert_eq!(buf, [10, 11, 12, 13]);
    assert_eq!(reader.offset(), 14);

    assert!(matches!(
        reader.seek(SeekFrom::End(0)),
        Err(TetherError::Unsupported(_))
    ));
    assert_eq!(reader.offset(), 14);
}

#[test]
fn test_chunked_negative_seek_leaves_cursor() {
    let (driver, handle) = open_device();
    let mut reader = ChunkedReader::new(driver.clone(), handle, asset_locator());
    reader.seek(SeekFrom::Start(5)).unwrap();

    match reader.seek(SeekFrom::Current(-10)) {
        Err(TetherError::InvalidOffset(offset)) => assert_eq!(offset, -5),
        other => panic!("Expected InvalidOffset, got {:?}", other),
    }
    assert_eq!(reader.offset(), 5);
}

#[test]
fn test_chunked_seek_clears_end_of_stream() {
    let (driver, handle) = open_device();
    let mut reader = ChunkedReader::new(driver.clone(), handle, asset_locator());
    let mut everything = Vec::new();
    reader.read_to_end(&mut everything).unwrap();
    assert_eq!(everything.len(), ASSET_SIZE);

    reader.seek(SeekFrom::Start(0)).unwrap();
    let mut buf = [0u8; 3];
    assert_eq!(reader.read_chunk(&mut buf).unwrap(), ReadOutcome::data(3));
    assert_eq!(buf, [0, 1, 2]);
}

#[test]
fn test_chunked_device_error_propagated_verbatim() {
    let (driver, handle) = open_device();
    let mut reader = ChunkedReader::new(driver.clone(), handle, asset_locator());
    driver.fail_on(SimOp::FileRead, status::ERROR_IO_READ);

    let mut buf = [0u8; 32];
    match reader.read_chunk(&mut buf) {
        Err(TetherError::Device(err)) => {
            assert_eq!(err.code(), status::ERROR_IO_READ);
            assert_eq!(err.message(), "Error reading from the port");
        }
        other => panic!("Expected device error, got {:?}", other),
    }
    assert_eq!(reader.offset(), 0);
}

#[test]
fn test_chunked_closed_reader() {
    let (driver, handle) = open_device();
    let mut reader = ChunkedReader::new(driver.clone(), handle, asset_locator());
    reader.close();
    reader.close();

    let mut buf = [0u8; 8];
    assert!(matches!(
        reader.read_chunk(&mut buf),
        Err(TetherError::Closed(_))
    ));
    assert!(matches!(
        reader.seek(SeekFrom::Start(0)),
        Err(TetherError::Closed(_))
    ));
}

#[test]
fn test_download_to_file() {
    let (driver, handle) = open_device();
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("IMG_0001.JPG");

    let written = download_to_file(driver.as_ref(), handle, &asset_locator(), &target).unwrap();
    assert_eq!(written, ASSET_SIZE as u64);
    assert_eq!(std::fs::read(&target).unwrap(), asset_bytes());
}

#[test]
fn test_failed_file_creation_still_closes_reader() {
    let (driver, handle) = open_device();
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("missing").join("IMG_0001.JPG");

    let mut reader = BufferedReader::open(driver.as_ref(), handle, &asset_locator()).unwrap();
    let result = reader.save_to_file(&target);

    assert!(matches!(result, Err(TetherError::Io(_))));
    assert!(reader.is_closed());
}

#[test]
fn test_copy_chunked_to_file() {
    let (driver, handle) = open_device();
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("chunked.jpg");

    let mut reader = ChunkedReader::new(driver.clone(), handle, asset_locator());
    let written = copy_to_file(&mut reader, &target, 4_096).unwrap();

    assert_eq!(written, ASSET_SIZE as u64);
    assert!(reader.is_closed());
    assert_eq!(std::fs::read(&target).unwrap(), asset_bytes());
}
