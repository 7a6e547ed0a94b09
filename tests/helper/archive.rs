//! Release archives built in memory

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

/// A release zip whose scripts append to `hooks.log` in the installation root.
///
/// `base_folder` wraps every entry in a top-level directory the way GitHub
/// zipballs do.
pub fn release_archive(
    repository_url: &str,
    package: &str,
    version: &str,
    base_folder: Option<&str>,
) -> Vec<u8> {
    let manifest = serde_json::json!({
        "url": repository_url,
        "package": package,
        "version": version,
        "scripts": {
            "before": [format!("echo before {} >> hooks.log", version)],
            "after": [format!("echo after {} >> hooks.log", version)],
        }
    });

    let prefix = base_folder.map(|f| format!("{}/", f)).unwrap_or_default();
    let entries = [
        (format!("{}updater.json", prefix), manifest.to_string()),
        (format!("{}VERSION", prefix), version.to_string()),
        (
            format!("{}src/app.php", prefix),
            format!("<?php return '{}';", version),
        ),
    ];

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
