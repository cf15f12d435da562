use crate::error::Result;
use crate::wallet::KeyPair;
use log::info;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const KEY_FILE: &str = "client_key.json";

#[cfg(unix)]
const KEY_FILE_MODE: u32 = 0o600;

/// Client key pair persisted as JSON so the CLI keeps one identity
/// across invocations.
pub struct KeyStore;

impl KeyStore {
    pub fn load(path: &Path) -> Result<Option<KeyPair>> {
        if !path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(path)?);
        let keys = serde_json::from_reader(reader)?;
        Ok(Some(keys))
    }

    /// Write the key pair as JSON. The file holds the private exponent, so on
    /// Unix it is readable and writable by the owner only.
    pub fn save(path: &Path, keys: &KeyPair) -> Result<()> {
        let mut options = OpenOptions::new();
        options.create(true).truncate(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(KEY_FILE_MODE);
            // mode() only applies when the file is created
            if path.exists() {
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(KEY_FILE_MODE))?;
            }
        }
        let file = options.open(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, keys)?;
        writer.flush()?;
        Ok(())
    }

    /// Load the key pair at `path`, or generate and store a fresh one
    pub fn load_or_generate(path: &Path, bits: u64, certainty: u32) -> Result<KeyPair> {
        if let Some(keys) = Self::load(path)? {
            return Ok(keys);
        }
        info!("Generating a {bits}-bit key pair");
        let keys = KeyPair::generate(bits, certainty)?;
        Self::save(path, &keys)?;
        info!("Stored new key pair for identity {} in {}", keys.identity(), path.display());
        Ok(keys)
    }
}
