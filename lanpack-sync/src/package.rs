//! The package container: a zip archive holding one manifest entry plus the
//! binary payloads its records refer to.
//!
//! Payloads are hashed with SHA-256 as they stream through, on the way in
//! (export) and on the way out (import), so a digest mismatch is caught
//! before anything lands in its final location.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};

use lanpack_model::{MANIFEST_ENTRY, Manifest, RecordKind, read_manifest, write_manifest};
use sha2::{Digest, Sha256};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::SyncError;

const CHUNK_SIZE: usize = 64 * 1024; // 64 KB

/// Archive entry path for a payload of `kind`, or `None` if the kind has no payload.
pub fn payload_entry(kind: RecordKind, name: &str) -> Option<String> {
    kind.payload_prefix().map(|prefix| format!("{prefix}/{name}"))
}

/// Reject names that would escape their storage directory.
pub fn check_file_name(name: &str) -> Result<&str, SyncError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(SyncError::InvalidRecord(format!(
            "'{name}' is not a plain file name"
        )));
    }
    Ok(name)
}

/// Where a payload's bytes come from during export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    File(PathBuf),
    Text(String),
}

/// A payload to copy into the package under `entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub entry: String,
    pub source: PayloadSource,
}

// ── Writing ─────────────────────────────────────────────────────────────────

pub struct PackageWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> PackageWriter<W> {
    pub fn new(out: W) -> Self {
        // Fixed timestamps keep repeated exports comparable.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());
        Self {
            zip: ZipWriter::new(out),
            options,
        }
    }

    /// Copy a payload into the package and return its hex SHA-256.
    ///
    /// A source file is opened before the entry is started, so a missing
    /// file never leaves an empty entry behind.
    pub fn write_payload(&mut self, payload: &Payload) -> Result<String, SyncError> {
        match &payload.source {
            PayloadSource::File(path) => {
                let file = File::open(path).map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => {
                        SyncError::MissingPayload(path.display().to_string())
                    }
                    _ => SyncError::Io(e),
                })?;
                self.zip.start_file(payload.entry.as_str(), self.options)?;
                let copied = copy_hashed(&mut BufReader::new(file), &mut self.zip);
                self.finish_entry(copied)
            }
            PayloadSource::Text(text) => {
                self.zip.start_file(payload.entry.as_str(), self.options)?;
                let copied = copy_hashed(&mut text.as_bytes(), &mut self.zip);
                self.finish_entry(copied)
            }
        }
    }

    /// Drop a half-written entry so a failed copy leaves nothing behind.
    fn finish_entry(&mut self, copied: std::io::Result<(u64, String)>) -> Result<String, SyncError> {
        match copied {
            Ok((_, digest)) => Ok(digest),
            Err(e) => {
                let _ = self.zip.abort_file();
                Err(e.into())
            }
        }
    }

    pub fn write_manifest(&mut self, manifest: &Manifest) -> Result<(), SyncError> {
        let yaml = write_manifest(manifest)?;
        self.zip.start_file(MANIFEST_ENTRY, self.options)?;
        self.zip.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Write the central directory and hand back the underlying stream.
    pub fn finish(self) -> Result<W, SyncError> {
        Ok(self.zip.finish()?)
    }
}

// ── Reading ─────────────────────────────────────────────────────────────────

pub struct PackageReader {
    zip: ZipArchive<BufReader<File>>,
    path: PathBuf,
}

impl PackageReader {
    pub fn open(path: &Path) -> Result<Self, SyncError> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(BufReader::new(file))?;
        Ok(Self {
            zip,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_names(&self) -> Vec<String> {
        self.zip.file_names().map(str::to_string).collect()
    }

    /// Read and kind-detect the manifest entry.
    pub fn read_manifest(&mut self) -> Result<Manifest, SyncError> {
        let mut entry = match self.zip.by_name(MANIFEST_ENTRY) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(SyncError::UnknownManifest(format!(
                    "package has no {MANIFEST_ENTRY} entry"
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let mut text = String::new();
        entry.read_to_string(&mut text)?;
        Ok(read_manifest(&text)?)
    }

    /// Extract `entry` to `dir/file_name`, verifying its digest.
    ///
    /// Bytes go to a temporary sibling first and are renamed into place only
    /// after the digest matches. Returns the number of bytes written.
    pub fn extract_file(
        &mut self,
        entry: &str,
        expected_sha256: &str,
        dir: &Path,
        file_name: &str,
    ) -> Result<u64, SyncError> {
        let file_name = check_file_name(file_name)?;
        let target = dir.join(file_name);
        let partial = dir.join(format!(".{file_name}.partial"));

        let mut source = open_entry(&mut self.zip, entry)?;
        let result = (|| {
            let mut out = File::create(&partial)?;
            let (size, digest) = copy_hashed(&mut source, &mut out)?;
            out.sync_all()?;
            verify_digest(entry, expected_sha256, &digest)?;
            Ok::<u64, SyncError>(size)
        })();

        match result {
            Ok(size) => {
                fs::rename(&partial, &target)?;
                Ok(size)
            }
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e)
            }
        }
    }

    /// Read a UTF-8 text payload, verifying its digest.
    pub fn read_text(&mut self, entry: &str, expected_sha256: &str) -> Result<String, SyncError> {
        let mut source = open_entry(&mut self.zip, entry)?;
        let mut bytes = Vec::new();
        let (_, digest) = copy_hashed(&mut source, &mut bytes)?;
        verify_digest(entry, expected_sha256, &digest)?;
        String::from_utf8(bytes)
            .map_err(|_| SyncError::InvalidRecord(format!("{entry} is not valid UTF-8")))
    }
}

fn open_entry<'z>(
    zip: &'z mut ZipArchive<BufReader<File>>,
    entry: &str,
) -> Result<impl Read + 'z, SyncError> {
    match zip.by_name(entry) {
        Ok(file) => Ok(file),
        Err(ZipError::FileNotFound) => Err(SyncError::MissingPayload(format!(
            "{entry} is not in the package"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// An empty expected digest means the record carries none; nothing to check.
fn verify_digest(entry: &str, expected: &str, actual: &str) -> Result<(), SyncError> {
    if expected.is_empty() || expected.eq_ignore_ascii_case(actual) {
        Ok(())
    } else {
        Err(SyncError::CorruptPayload {
            entry: entry.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

/// Copy `reader` to `writer` in chunks, returning the byte count and hex SHA-256.
fn copy_hashed<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
) -> std::io::Result<(u64, String)> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }

    Ok((total, format!("{:x}", hasher.finalize())))
}
