use anyhow::Context;
use csv::{ReaderBuilder, WriterBuilder};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Report d'équité entre deux runs : `(nom, precount)`.
pub trait PrecountStore {
    /// Charge les reports ; un support absent vaut une liste vide.
    fn load(&self) -> anyhow::Result<Vec<(String, i64)>>;
    /// Sauvegarde de manière atomique.
    fn save(&self, precounts: &[(String, i64)]) -> anyhow::Result<()>;
}

/// Fichier CSV sans en-tête, une ligne `nom,precount` par personne.
pub struct CsvPrecountStore {
    path: PathBuf,
}

impl CsvPrecountStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PrecountStore for CsvPrecountStore {
    fn load(&self) -> anyhow::Result<Vec<(String, i64)>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let mut out = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            let name = rec.get(0).context("missing name")?.trim();
            let raw = rec.get(1).context("missing precount")?.trim();
            let precount: i64 = raw
                .parse()
                .with_context(|| format!("invalid precount for {name}: {raw}"))?;
            out.push((name.to_string(), precount));
        }
        Ok(out)
    }

    fn save(&self, precounts: &[(String, i64)]) -> anyhow::Result<()> {
        let mut data = Vec::new();
        {
            let mut w = WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut data);
            let mut buf = itoa::Buffer::new();
            for (name, precount) in precounts {
                w.write_record([name.as_str(), buf.format(*precount)])?;
            }
            w.flush()?;
        }
        write_atomic(&self.path, &data)
    }
}

/// Écrit `data` dans `path` via un fichier temporaire renommé.
pub fn write_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("atomic rename to {}", path.display()))?;
    Ok(())
}
