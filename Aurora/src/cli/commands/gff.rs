//! CLI commands for GFF documents

use std::path::{Path, PathBuf};

use crate::converter::{convert_json_to_gff, gff_to_json};
use crate::formats::gff::{parse_gff_bytes, serialize_gff};

pub fn dump(path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let doc = crate::formats::gff::read_gff(path)?;
    let json = gff_to_json(&doc)?;
    match output {
        Some(dest) => {
            std::fs::write(dest, json)?;
            println!("Wrote {}", dest.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Decode then re-encode each file and compare bytes.
pub fn verify(paths: &[PathBuf], quiet: bool) -> anyhow::Result<()> {
    let mut failed = 0usize;
    for path in paths {
        match verify_one(path) {
            Ok(None) => {
                if !quiet {
                    println!("OK        {}", path.display());
                }
            }
            Ok(Some(offset)) => {
                failed += 1;
                println!("MISMATCH  {} (first difference at byte {offset})", path.display());
            }
            Err(e) => {
                failed += 1;
                println!("ERROR     {}: {e}", path.display());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} files did not round-trip", paths.len());
    }
    if !quiet {
        println!("{} files round-trip byte for byte", paths.len());
    }
    Ok(())
}

/// Offset of the first differing byte, or `None` if identical.
fn verify_one(path: &Path) -> anyhow::Result<Option<usize>> {
    let original = std::fs::read(path)?;
    let encoded = serialize_gff(&parse_gff_bytes(&original)?)?;
    if encoded == original {
        return Ok(None);
    }
    let offset = original
        .iter()
        .zip(&encoded)
        .position(|(a, b)| a != b)
        .unwrap_or(original.len().min(encoded.len()));
    Ok(Some(offset))
}

pub fn from_json(source: &Path, destination: &Path) -> anyhow::Result<()> {
    convert_json_to_gff(source, destination)?;
    println!("Wrote {}", destination.display());
    Ok(())
}
