use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::config::Config;
use crate::engine::ledger::{LedgerStore, MistakeCounts};
use crate::store::schema::{
    EXPORT_VERSION, ExportData, MISTAKES_FILE, WORD_LISTS_FILE, WordListMap,
};

#[derive(Clone, Debug)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spelldrill");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Missing file reads as the default; an unreadable one is an error so
    /// the caller can decide whether to start over.
    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.file_path(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Write to a temp file, fsync, then rename over the target so a crash
    /// never leaves a half-written file behind.
    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn load_word_lists(&self) -> Result<WordListMap> {
        self.load(WORD_LISTS_FILE)
    }

    pub fn save_word_lists(&self, lists: &WordListMap) -> Result<()> {
        self.save(WORD_LISTS_FILE, lists)
    }

    pub fn remove_word_lists(&self) -> Result<()> {
        let path = self.file_path(WORD_LISTS_FILE);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn export_all(&self, config: &Config) -> Result<ExportData> {
        Ok(ExportData {
            spelldrill_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            config: config.clone(),
            mistakes: self.load(MISTAKES_FILE)?,
            word_lists: self.load_word_lists()?,
        })
    }

    /// Transactional import: every file is staged to `.tmp` first, then
    /// committed with the originals parked as `.bak` until all renames
    /// succeed. Any failure restores what was there before.
    pub fn import_all(&self, data: &ExportData) -> Result<()> {
        if data.spelldrill_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.spelldrill_export_version,
                EXPORT_VERSION
            );
        }

        let files: Vec<(&str, String)> = vec![
            (MISTAKES_FILE, serde_json::to_string_pretty(&data.mistakes)?),
            (WORD_LISTS_FILE, serde_json::to_string_pretty(&data.word_lists)?),
        ];

        let mut staged: Vec<PathBuf> = Vec::new();
        for (name, json) in &files {
            let tmp_path = self.file_path(name).with_extension("json.tmp");
            let written = (|| -> Result<()> {
                let mut file = fs::File::create(&tmp_path)?;
                file.write_all(json.as_bytes())?;
                file.sync_all()?;
                Ok(())
            })();
            if let Err(e) = written {
                remove_all(&staged);
                bail!("Import failed during staging: {e}");
            }
            staged.push(tmp_path);
        }

        // (final, bak, had_original) for rollback
        let mut committed: Vec<(PathBuf, PathBuf, bool)> = Vec::new();
        for (i, (name, _)) in files.iter().enumerate() {
            let final_path = self.file_path(name);
            let bak_path = final_path.with_extension("json.bak");
            let had_original = final_path.exists();

            if had_original {
                if let Err(e) = fs::rename(&final_path, &bak_path) {
                    rollback(&committed);
                    remove_all(&staged);
                    bail!("Import failed during commit (backup): {e}");
                }
            }

            if let Err(e) = fs::rename(&staged[i], &final_path) {
                if had_original {
                    let _ = fs::rename(&bak_path, &final_path);
                }
                rollback(&committed);
                remove_all(&staged[i..]);
                bail!("Import failed during commit (rename): {e}");
            }

            committed.push((final_path, bak_path, had_original));
        }

        for (_, bak_path, had_original) in &committed {
            if *had_original {
                let _ = fs::remove_file(bak_path);
            }
        }
        Ok(())
    }

    /// Remove `.bak` files left by an interrupted import. Returns true if
    /// any were found.
    pub fn check_interrupted_import(&self) -> bool {
        let mut found = false;
        for name in [MISTAKES_FILE, WORD_LISTS_FILE] {
            let bak_path = self.file_path(name).with_extension("json.bak");
            if bak_path.exists() {
                found = true;
                let _ = fs::remove_file(&bak_path);
            }
        }
        found
    }
}

fn rollback(committed: &[(PathBuf, PathBuf, bool)]) {
    for (final_path, bak_path, had_original) in committed {
        if *had_original {
            let _ = fs::rename(bak_path, final_path);
        } else {
            let _ = fs::remove_file(final_path);
        }
    }
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

impl LedgerStore for JsonStore {
    fn load_mistakes(&self) -> Result<MistakeCounts> {
        self.load(MISTAKES_FILE)
    }

    fn save_mistakes(&self, counts: &MistakeCounts) -> Result<()> {
        self.save(MISTAKES_FILE, counts)
    }
}
