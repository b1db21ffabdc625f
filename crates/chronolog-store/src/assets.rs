//! Deterministic placement of event assets.

use std::path::{Path, PathBuf};

use chronolog_fs::ExistingFile;
use chronolog_types::Event;

/// A binary file queued for copying alongside an event.
///
/// The store does not own the source file; it copies the bytes into the
/// asset tree and leaves the original untouched.
#[derive(Debug, Clone)]
pub struct Asset {
    /// The event this asset belongs to.
    pub event: Event,
    /// Proof-carrying handle to the source file.
    pub file: ExistingFile,
}

/// Compute the target path for an asset:
/// `<assets_root>/<YYYY-MM>/<DD>/<event id>/<source basename>`.
///
/// Date segments are derived from the event date in UTC, zero-padded. The
/// basename is preserved byte for byte; two assets sharing an
/// `(event id, basename)` pair collide, which is the caller's mistake and is
/// not defended against here.
pub fn asset_target(assets_root: &Path, event: &Event, file: &ExistingFile) -> PathBuf {
    assets_root
        .join(event.date.format("%Y-%m").to_string())
        .join(event.date.format("%d").to_string())
        .join(event.id.identifier())
        .join(file.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chronolog_fs::Capabilities;
    use chronolog_types::{Creator, EventId};

    async fn checked(dir: &Path, name: &str) -> ExistingFile {
        let caps = Capabilities::local();
        let path = dir.join(name);
        caps.writer.write(&path, "x").await.unwrap();
        caps.checker.check_file(&path).await.unwrap().unwrap()
    }

    fn event_on(y: i32, m: u32, d: u32) -> Event {
        Event {
            id: EventId::new("a1").unwrap(),
            date: Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap(),
            original: String::new(),
            input: String::new(),
            kind: "photo".to_string(),
            description: String::new(),
            modifiers: Default::default(),
            creator: Creator::current("chronolog", "0.1.0"),
        }
    }

    #[tokio::test]
    async fn segments_are_zero_padded_utc() {
        let dir = tempfile::tempdir().unwrap();
        let file = checked(dir.path(), "asset.txt").await;

        let target = asset_target(Path::new("/srv/assets"), &event_on(2025, 5, 3), &file);
        assert_eq!(target, PathBuf::from("/srv/assets/2025-05/03/a1/asset.txt"));
    }

    #[tokio::test]
    async fn basename_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let file = checked(dir.path(), "IMG 2025.05.13.jpeg").await;

        let target = asset_target(Path::new("/srv/assets"), &event_on(2025, 12, 31), &file);
        assert_eq!(
            target,
            PathBuf::from("/srv/assets/2025-12/31/a1/IMG 2025.05.13.jpeg")
        );
    }
}
