//! CLI commands for ERF archives and KEY files

use std::path::Path;

use crate::archive::{ErfArchive, KeyBifContainer, ResourceContainer};

/// Simple glob pattern matching (supports * and ?), ignoring ASCII case
fn matches_glob(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    matches_glob_from(&pattern, &text)
}

fn matches_glob_from(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|i| matches_glob_from(rest, &text[i..])),
        Some(('?', rest)) => !text.is_empty() && matches_glob_from(rest, &text[1..]),
        Some((c, rest)) => text
            .split_first()
            .is_some_and(|(t, tail)| t.eq_ignore_ascii_case(c) && matches_glob_from(rest, tail)),
    }
}

/// Format byte size for human-readable output
fn format_size(bytes: u32) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1}M", f64::from(bytes) / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}K", f64::from(bytes) / 1024.0)
    } else {
        format!("{bytes}")
    }
}

pub fn list_erf(source: &Path, filter: Option<&str>, count: bool) -> anyhow::Result<()> {
    let archive = ErfArchive::open(source)?;
    let matching: Vec<_> = archive
        .entries()
        .iter()
        .filter(|e| filter.is_none_or(|f| matches_glob(f, &e.key().to_string())))
        .collect();

    if count {
        println!("{}", matching.len());
        return Ok(());
    }

    println!(
        "{} {} ({} resources)",
        archive.erf_type().as_str(),
        String::from_utf8_lossy(archive.version().tag()),
        archive.len()
    );
    for entry in &matching {
        println!("  {:>8}  {}", format_size(entry.size), entry.key());
    }
    if filter.is_some() {
        println!("{} of {} resources match", matching.len(), archive.len());
    }
    Ok(())
}

pub fn extract_erf(source: &Path, destination: &Path) -> anyhow::Result<()> {
    let archive = ErfArchive::open(source)?;
    let written = archive.extract_all(destination)?;
    println!("Extracted {written} resources to {}", destination.display());
    Ok(())
}

pub fn list_key(source: &Path, filter: Option<&str>, bifs: bool) -> anyhow::Result<()> {
    let key = KeyBifContainer::open(source)?;
    if bifs {
        for (i, name) in key.bif_names().iter().enumerate() {
            println!("{i:>4}  {name}");
        }
        return Ok(());
    }

    let mut shown = 0usize;
    for resource in key.keys() {
        let name = resource.to_string();
        if filter.is_none_or(|f| matches_glob(f, &name)) {
            println!("  {name}");
            shown += 1;
        }
    }
    println!("{shown} of {} resources", key.len());
    Ok(())
}
