//! CLI commands for talk tables

use std::path::Path;

use anyhow::Context;

use crate::formats::tlk::{TalkTableSet, read_tlk};

fn parse_strref(text: &str) -> anyhow::Result<u32> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("invalid StrRef '{text}'"))
}

pub fn get(path: &Path, strrefs: &[String], custom: Option<&Path>) -> anyhow::Result<()> {
    let primary = read_tlk(path)?;
    let custom = custom.map(read_tlk).transpose()?;
    let tables = TalkTableSet::new(primary, custom);

    for text in strrefs {
        let str_ref = parse_strref(text)?;
        match tables.get(str_ref) {
            Some(entry) => {
                println!("{str_ref}: {}", entry.text.as_deref().unwrap_or(""));
                if let Some(sound) = &entry.sound {
                    println!("    sound: {sound} ({:.2}s)", entry.sound_length.unwrap_or(0.0));
                }
            }
            None => println!("{str_ref}: <not found>"),
        }
    }
    Ok(())
}

pub fn info(path: &Path) -> anyhow::Result<()> {
    let table = read_tlk(path)?;
    let with_text = table.entries.iter().filter(|e| e.text.is_some()).count();
    let with_sound = table.entries.iter().filter(|e| e.sound.is_some()).count();

    println!("Talk table: {}", path.display());
    match table.language() {
        Some(language) => println!("Language: {language:?} ({})", table.language_id),
        None => println!("Language: unknown ({})", table.language_id),
    }
    println!("Entries: {}", table.len());
    println!("With text: {with_text}");
    println!("With sound: {with_sound}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strref() {
        assert_eq!(parse_strref("42").unwrap(), 42);
        assert_eq!(parse_strref("0x01000005").unwrap(), 0x0100_0005);
        assert!(parse_strref("chicken").is_err());
    }
}
