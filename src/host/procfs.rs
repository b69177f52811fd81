use anyhow::{Context, Result, bail};
use std::fs;
use std::ops::Range;
use std::path::PathBuf;

/// Reader for the few `/proc` files the explanations consult.
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    /// Open a procfs tree, defaulting to `/proc`.
    pub fn new(root: Option<String>) -> Result<Self> {
        let path = match root {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from("/proc"),
        };

        if !path.exists() {
            bail!("procfs path does not exist: {}", path.display());
        }

        Ok(Self { root: path })
    }

    /// The host's `/proc`, if mounted.
    pub fn system() -> Option<Self> {
        match Self::new(None) {
            Ok(procfs) => Some(procfs),
            Err(e) => {
                log::debug!("{e:#}");
                None
            }
        }
    }

    fn read(&self, rel: &str) -> Result<String> {
        let path = self.root.join(rel);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// The `CapEff` mask of this process.
    pub fn effective_capabilities(&self) -> Result<u64> {
        let content = self.read("self/status")?;
        for line in content.lines() {
            if let Some(hex) = line.strip_prefix("CapEff:") {
                return u64::from_str_radix(hex.trim(), 16)
                    .with_context(|| format!("Malformed CapEff line: {line}"));
            }
        }
        bail!("No CapEff line in {}", self.root.join("self/status").display())
    }

    /// Number of descriptors this process has open.
    pub fn open_fd_count(&self) -> Result<usize> {
        let dir = self.root.join("self/fd");
        let entries =
            fs::read_dir(&dir).with_context(|| format!("Failed to list {}", dir.display()))?;
        // the directory handle used for listing shows up in its own listing
        Ok(entries.count().saturating_sub(1))
    }

    /// System-wide (allocated, maximum) open file counts.
    pub fn file_nr(&self) -> Result<(u64, u64)> {
        let content = self.read("sys/fs/file-nr")?;
        let fields: Vec<u64> = content
            .split_whitespace()
            .map(|f| f.parse::<u64>())
            .collect::<std::result::Result<_, _>>()
            .context("Malformed file-nr")?;
        match fields.as_slice() {
            [allocated, _unused, max] => Ok((*allocated, *max)),
            _ => bail!("Expected three fields in file-nr, got {}", fields.len()),
        }
    }

    /// Address ranges of every readable mapping of this process.
    pub fn readable_mappings(&self) -> Result<Vec<Range<u64>>> {
        let content = self.read("self/maps")?;
        let mut ranges = Vec::new();

        for line in content.lines() {
            let mut fields = line.split_whitespace();
            let (Some(span), Some(perms)) = (fields.next(), fields.next()) else {
                continue;
            };
            if !perms.starts_with('r') {
                continue;
            }
            let Some((start, end)) = span.split_once('-') else {
                continue;
            };
            let start =
                u64::from_str_radix(start, 16).with_context(|| format!("Bad mapping: {line}"))?;
            let end = u64::from_str_radix(end, 16).with_context(|| format!("Bad mapping: {line}"))?;
            ranges.push(start..end);
        }

        Ok(ranges)
    }

    /// Where descriptor `fd` points, as the kernel names it.
    pub fn fd_path(&self, fd: i32) -> Option<PathBuf> {
        fs::read_link(self.root.join(format!("self/fd/{fd}"))).ok()
    }
}
