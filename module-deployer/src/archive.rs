//! Module archive inspection.
//!
//! A module archive is a zip file whose `META-INF/MANIFEST.MF` main section
//! declares a `Bundle-SymbolicName` header.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::trace;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::ArchiveError;

/// Location of the manifest inside an archive.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Header naming a module.
pub const SYMBOLIC_NAME: &str = "Bundle-SymbolicName";

/// Header marking a fragment and naming its host.
pub const FRAGMENT_HOST: &str = "Fragment-Host";

/// Main section of a jar manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    headers: Vec<(String, String)>,
}

impl Manifest {
    /// Parse the main section of a manifest.
    ///
    /// Continuation lines start with a single space. The main section ends
    /// at the first blank line.
    pub fn parse(content: &str) -> Self {
        let mut headers: Vec<(String, String)> = Vec::new();

        for line in content.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                break;
            }
            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some((_, value)) = headers.last_mut() {
                    value.push_str(continuation);
                }
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_string(), value.trim_start().to_string()));
            }
        }

        Self { headers }
    }

    /// Read the manifest of the archive at `path`.
    ///
    /// Returns `Ok(None)` for a valid archive without manifest.
    pub fn read_from(path: &Path) -> Result<Option<Self>, ArchiveError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut entry = match archive.by_name(MANIFEST_PATH) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        Ok(Some(Self::parse(&content)))
    }

    /// Value of a header. Header names are case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Module name, without directives.
    pub fn symbolic_name(&self) -> Option<&str> {
        self.get(SYMBOLIC_NAME).map(strip_directives)
    }

    /// Host of a fragment, without directives.
    pub fn fragment_host(&self) -> Option<&str> {
        self.get(FRAGMENT_HOST).map(strip_directives)
    }

    /// Whether the manifest describes a fragment.
    pub fn is_fragment(&self) -> bool {
        self.fragment_host().is_some()
    }
}

/// Whether the file at `path` is a module archive.
pub fn is_module_archive(path: &Path) -> bool {
    match Manifest::read_from(path) {
        Ok(Some(manifest)) => manifest.symbolic_name().is_some(),
        Ok(None) => false,
        Err(e) => {
            trace!("Cannot read {} as an archive: {e}", path.display());
            false
        }
    }
}

fn strip_directives(value: &str) -> &str {
    value.split(';').next().unwrap_or(value).trim()
}
