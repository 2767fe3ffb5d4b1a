use bytes::Bytes;

use crate::config::{DriveConfig, LocalDriveConfig, MemoryDriveConfig};
use crate::drive::memory::MemoryDrive;
use crate::drive::{build_drive, validate_name, Drive, DriveError};

#[test]
fn name_validation() {
	assert!(validate_name("01hq3v.png").is_ok());

	for name in ["", ".env", "../secret", "a/b.png", "a\\b.png"] {
		assert!(
			matches!(validate_name(name), Err(DriveError::InvalidName(_))),
			"{name} accepted"
		);
	}
}

#[tokio::test]
async fn memory_drive_round_trip() {
	let drive = MemoryDrive::new(&MemoryDriveConfig::default());

	drive
		.write("logo.png", Bytes::from_static(b"png"))
		.await
		.expect("failed to write");
	assert_eq!(drive.read("logo.png").await.expect("failed to read"), "png");

	drive.delete("logo.png").await.expect("failed to delete");
	assert!(matches!(drive.read("logo.png").await, Err(DriveError::NotFound)));
	assert!(matches!(drive.delete("logo.png").await, Err(DriveError::NotFound)));
}

#[tokio::test]
async fn memory_drive_capacity() {
	let drive = MemoryDrive::new(&MemoryDriveConfig { capacity: Some(8) });

	drive
		.write("a.png", Bytes::from_static(b"12345"))
		.await
		.expect("failed to write");
	assert!(matches!(
		drive.write("b.png", Bytes::from_static(b"1234")).await,
		Err(DriveError::Memory(_))
	));

	// replacing a file frees its old size first
	drive
		.write("a.png", Bytes::from_static(b"12345678"))
		.await
		.expect("failed to overwrite");

	drive.delete("a.png").await.expect("failed to delete");
	drive
		.write("b.png", Bytes::from_static(b"1234"))
		.await
		.expect("failed to write after delete");
}

#[tokio::test]
async fn local_drive_round_trip() {
	let dir = tempfile::tempdir().expect("failed to create temp dir");
	let root = dir.path().join("uploads");

	let drive = build_drive(&DriveConfig::Local(LocalDriveConfig { path: root.clone() }))
		.await
		.expect("failed to build drive");
	assert!(root.is_dir());
	assert!(drive.healthy().await);

	drive
		.write("logo.gif", Bytes::from_static(b"GIF89a"))
		.await
		.expect("failed to write");
	assert!(root.join("logo.gif").is_file());
	assert_eq!(drive.read("logo.gif").await.expect("failed to read"), "GIF89a");

	drive.delete("logo.gif").await.expect("failed to delete");
	assert!(matches!(drive.read("logo.gif").await, Err(DriveError::NotFound)));
	assert!(matches!(drive.read("../etc/passwd").await, Err(DriveError::InvalidName(_))));
}
