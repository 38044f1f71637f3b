use crate::db::DB_FILE_NAME;
use anyhow::{anyhow, bail, Context};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_ENTRY: &str = "db/results.sqlite3";
pub const BUNDLE_FORMAT: &str = "resultsd-workspace-v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub format: String,
    pub app_version: String,
    pub exported_at: String,
    pub db_sha256: String,
    pub db_bytes: u64,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Snapshot the open database into a zip bundle at `out_path`.
pub fn export_bundle(conn: &Connection, out_path: &Path) -> anyhow::Result<Manifest> {
    // VACUUM INTO gives a consistent copy even while the connection is in use.
    let snapshot =
        std::env::temp_dir().join(format!("resultsd-snapshot-{}.sqlite3", Uuid::new_v4()));
    conn.execute("VACUUM INTO ?", [snapshot.to_string_lossy().to_string()])
        .context("failed to snapshot database")?;
    let db_bytes = std::fs::read(&snapshot);
    let _ = std::fs::remove_file(&snapshot);
    let db_bytes = db_bytes.context("failed to read database snapshot")?;

    let manifest = Manifest {
        format: BUNDLE_FORMAT.to_string(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at: chrono::Utc::now().to_rfc3339(),
        db_sha256: sha256_hex(&db_bytes),
        db_bytes: db_bytes.len() as u64,
    };

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let out_file = File::create(out_path)
        .with_context(|| format!("failed to create bundle {}", out_path.display()))?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MANIFEST_ENTRY, opts)?;
    zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;
    zip.start_file(DB_ENTRY, opts)?;
    zip.write_all(&db_bytes)?;
    zip.finish().context("failed to finalize bundle")?;

    Ok(manifest)
}

/// Unpack a bundle into `workspace`, replacing its database. The digest in the
/// manifest must match the database entry.
pub fn restore_bundle(bundle_path: &Path, workspace: &Path) -> anyhow::Result<Manifest> {
    let f = File::open(bundle_path)
        .with_context(|| format!("failed to open bundle {}", bundle_path.display()))?;
    let mut archive = ZipArchive::new(f).context("bundle is not a zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .map_err(|_| anyhow!("bundle has no {MANIFEST_ENTRY}"))?
        .read_to_string(&mut manifest_text)?;
    let manifest: Manifest =
        serde_json::from_str(&manifest_text).context("bundle manifest is malformed")?;
    if manifest.format != BUNDLE_FORMAT {
        bail!("unsupported bundle format: {}", manifest.format);
    }

    let mut db_bytes = Vec::new();
    archive
        .by_name(DB_ENTRY)
        .map_err(|_| anyhow!("bundle has no {DB_ENTRY}"))?
        .read_to_end(&mut db_bytes)?;
    if sha256_hex(&db_bytes) != manifest.db_sha256 {
        bail!("database checksum mismatch");
    }

    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create directory {}", workspace.display()))?;
    std::fs::write(workspace.join(DB_FILE_NAME), &db_bytes)
        .context("failed to write restored database")?;
    Ok(manifest)
}
