use super::*;
use crate::status;
use crate::types::{AssetLocator, CaptureKind};
use crate::widget::{WidgetSpec, WidgetTree, WidgetValue};

fn sample_driver() -> SimulatedDriver {
    SimulatedDriver::builder()
        .folder("/a/b")
        .folder("/a/c")
        .file("/a", "one.jpg", vec![1; 100])
        .file("/a", "two.jpg", vec![2; 10])
        .image("/a/b", "three.jpg", vec![3; 50], 320, 200)
        .capture_folder("/a/c")
        .build()
}

#[test]
fn test_init_twice_reports_lock() {
    let driver = sample_driver();
    let handle = driver.init().unwrap();
    assert!(driver.is_open());

    let err = driver.init().unwrap_err();
    assert_eq!(err.code(), status::ERROR_IO_LOCK);

    driver.exit(handle).unwrap();
    assert!(!driver.is_open());
    assert_eq!(driver.exit(handle).unwrap_err().code(), status::ERROR_BAD_PARAMETERS);

    let reopened = driver.init().unwrap();
    assert_ne!(reopened, handle);
}

#[test]
fn test_calls_on_stale_handle_rejected() {
    let driver = sample_driver();
    let handle = driver.init().unwrap();
    driver.exit(handle).unwrap();

    let err = driver.abilities(handle).unwrap_err();
    assert_eq!(err.code(), status::ERROR_BAD_PARAMETERS);
}

#[test]
fn test_listing_in_device_order() {
    let driver = sample_driver();
    let handle = driver.init().unwrap();

    let folders: Vec<String> = driver
        .list_folders(handle, "/a")
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(folders, vec!["b", "c"]);

    let root: Vec<String> = driver
        .list_folders(handle, "/")
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(root, vec!["a"]);

    let files: Vec<String> = driver
        .list_files(handle, "/a/")
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(files, vec!["one.jpg", "two.jpg"]);

    let err = driver.list_files(handle, "/missing").unwrap_err();
    assert_eq!(err.code(), status::ERROR_DIRECTORY_NOT_FOUND);
}

#[test]
fn test_populate_copies_device_tree() {
    let mut template = WidgetTree::new("Bench");
    let root = template.root();
    let section = template
        .add_child(root, WidgetSpec::section("main", "Main"))
        .unwrap();
    template
        .add_child(section, WidgetSpec::radio("iso", "ISO", "200"))
        .unwrap();
    template
        .add_child(section, WidgetSpec::text("serial", "Serial", "X1").readonly())
        .unwrap();

    let driver = SimulatedDriver::builder().config(template).build();
    let handle = driver.init().unwrap();

    let mut tree = WidgetTree::new("");
    driver.populate_config(handle, &mut tree).unwrap();

    assert_eq!(tree.len(), 4);
    assert_eq!(tree.widget(tree.root()).unwrap().label(), "Bench");
    let iso = tree.lookup("/main/iso").unwrap();
    assert_eq!(tree.value(iso).unwrap(), WidgetValue::from("200"));
    let serial = tree.widget(tree.lookup("main/serial").unwrap()).unwrap();
    assert!(serial.readonly());
}

#[test]
fn test_apply_replaces_device_tree() {
    let driver = sample_driver();
    let handle = driver.init().unwrap();

    let mut tree = WidgetTree::new("");
    driver.populate_config(handle, &mut tree).unwrap();
    let iso = tree.lookup("/imgsettings/iso").unwrap();
    tree.set_value(iso, "400".into()).unwrap();

    driver.apply_config(handle, &tree).unwrap();
    assert_eq!(driver.apply_count(), 1);
    assert_eq!(
        driver.config_value("/imgsettings/iso"),
        Some(WidgetValue::from("400"))
    );

    tree.release();
    let err = driver.apply_config(handle, &tree).unwrap_err();
    assert_eq!(err.code(), status::ERROR_BAD_PARAMETERS);
    assert_eq!(driver.apply_count(), 1);
}

#[test]
fn test_injected_failures() {
    let driver = sample_driver();
    let handle = driver.init().unwrap();

    driver.fail_on(SimOp::Capture, status::ERROR_CAMERA_BUSY);
    let err = driver.capture(handle, CaptureKind::Image).unwrap_err();
    assert_eq!(err.code(), status::ERROR_CAMERA_BUSY);
    assert_eq!(err.message(), "I/O in progress");
    assert_eq!(driver.capture_count(), 0);

    driver.clear_failure(SimOp::Capture);
    let locator = driver.capture(handle, CaptureKind::Image).unwrap();
    assert_eq!(locator.folder, "/a/c");
    assert_eq!(locator.name, "IMG_0001.JPG");
    assert!(driver.has_file(&locator));
    assert_eq!(driver.capture_count(), 1);
}

#[test]
fn test_file_read_short_counts() {
    let driver = sample_driver();
    let handle = driver.init().unwrap();
    let locator = AssetLocator::new("/a", "one.jpg");

    let mut buf = [0u8; 64];
    assert_eq!(driver.file_read(handle, &locator, 0, &mut buf).unwrap(), 64);
    assert_eq!(driver.file_read(handle, &locator, 64, &mut buf).unwrap(), 36);
    assert_eq!(driver.file_read(handle, &locator, 100, &mut buf).unwrap(), 0);
    assert_eq!(driver.file_read(handle, &locator, 5_000, &mut buf).unwrap(), 0);
}

#[test]
fn test_file_info_and_delete() {
    let driver = sample_driver();
    let handle = driver.init().unwrap();

    let image = AssetLocator::new("/a/b/", "three.jpg");
    let info = driver.file_info(handle, &image).unwrap();
    assert_eq!(info.size, 50);
    assert_eq!((info.width, info.height), (320, 200));

    let plain = driver.file_info(handle, &AssetLocator::new("/a", "two.jpg")).unwrap();
    assert_eq!((plain.width, plain.height), (0, 0));

    driver.file_delete(handle, &image).unwrap();
    assert!(!driver.has_file(&image));
    let err = driver.file_delete(handle, &image).unwrap_err();
    assert_eq!(err.code(), status::ERROR_FILE_NOT_FOUND);
}

#[test]
fn test_cancel_without_wait_is_ignored() {
    let driver = sample_driver();
    let handle = driver.init().unwrap();
    driver.cancel(handle);

    let event = driver
        .wait_for_event(handle, std::time::Duration::from_millis(10))
        .unwrap();
    assert_eq!(event.kind, crate::events::EventKind::Timeout);
}

#[test]
fn test_trigger_capture_queues_file_added() {
    let driver = sample_driver();
    let handle = driver.init().unwrap();
    driver.trigger_capture(handle).unwrap();

    let event = driver
        .wait_for_event(handle, std::time::Duration::from_millis(10))
        .unwrap();
    let locator = event.locator().unwrap();
    assert_eq!(locator.folder, "/a/c");
    assert!(driver.has_file(&locator));
}

#[test]
fn test_populate_into_released_tree_fails() {
    let driver = sample_driver();
    let handle = driver.init().unwrap();

    let mut tree = WidgetTree::new("");
    tree.release();
    let err = driver.populate_config(handle, &mut tree).unwrap_err();
    assert_eq!(err.code(), status::ERROR_BAD_PARAMETERS);
}
