// Envault — .env serialization and restricted file writes
//
// The serializer is a pure function from ordered (name, value) pairs to
// file text. The write path moves values straight from the store to disk;
// nothing that passes through here ever ends up in a response payload,
// only the outcome counts and the missing-name list do.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::store::{SecretStore, StoreError};

#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("Path must be absolute")]
    RelativePath,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of an env-write: how many distinct secrets were written, and
/// which requested names were not found. Never carries values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvWriteOutcome {
    pub written: usize,
    pub missing: Vec<String>,
}

/// Render ordered (name, value) pairs as `.env` file text.
///
/// A value containing a space, double quote, single quote, or newline is
/// emitted as `NAME="…"` with interior double quotes escaped as `\"`;
/// anything else is emitted unquoted. The buffer is zeroized on drop since
/// it holds secret material.
pub fn render(entries: &[(&str, &str)]) -> Zeroizing<String> {
    let mut out = Zeroizing::new(String::new());
    for (name, value) in entries {
        if needs_quoting(value) {
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&value.replace('"', "\\\""));
            out.push_str("\"\n");
        } else {
            out.push_str(name);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
    }
    out
}

fn needs_quoting(value: &str) -> bool {
    value.contains(' ') || value.contains('"') || value.contains('\'') || value.contains('\n')
}

/// Write `content` to `path` as one buffered write, creating parent
/// directories as needed, with permissions restricted to owner read/write.
fn write_restricted(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;

    // The create mode is filtered by umask and ignored for existing files;
    // set the permissions explicitly so group/other access is always removed.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// Resolve `keys` against the store and write the found values to a `.env`
/// file at `path`.
///
/// The path must be absolute; a relative path fails before any store or
/// filesystem access. Output lines follow the order of `keys`, one line per
/// occurrence (a duplicated found key yields a duplicate line). `missing`
/// mirrors the input order and multiplicity of not-found keys; `written`
/// counts distinct found names.
pub fn write_env<S: SecretStore + ?Sized>(
    store: &S,
    keys: &[String],
    path: &str,
) -> Result<EnvWriteOutcome, EnvFileError> {
    let path = Path::new(path);
    if !path.is_absolute() {
        return Err(EnvFileError::RelativePath);
    }

    let mut values: HashMap<&str, Zeroizing<String>> = HashMap::new();
    for key in keys {
        if values.contains_key(key.as_str()) {
            continue;
        }
        if let Some(secret) = store.find_exact(key)? {
            values.insert(key.as_str(), secret.into_value());
        }
    }

    let missing: Vec<String> = keys
        .iter()
        .filter(|k| !values.contains_key(k.as_str()))
        .cloned()
        .collect();

    let entries: Vec<(&str, &str)> = keys
        .iter()
        .filter_map(|k| values.get(k.as_str()).map(|v| (k.as_str(), v.as_str())))
        .collect();

    let content = render(&entries);
    write_restricted(path, &content)?;

    tracing::info!(
        path = %path.display(),
        written = values.len(),
        missing = missing.len(),
        "Wrote .env file"
    );

    Ok(EnvWriteOutcome {
        written: values.len(),
        missing,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
