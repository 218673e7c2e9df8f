//! Permissive INI reader for Conan metadata files.
//!
//! `conaninfo.txt` is INI-shaped but loose: sections hold `key=value`
//! pairs, `key=` with an empty value, or bare value lines with no `=`
//! at all (the recipe hash is stored as a bare key of its own
//! section). Nothing here ever fails to parse.

/// Parsed INI document with sections in file order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IniDoc {
    sections: Vec<IniSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IniSection {
    name: String,
    entries: Vec<(String, Option<String>)>,
}

impl IniDoc {
    pub fn parse(text: &str) -> Self {
        let mut sections: Vec<IniSection> = Vec::new();
        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                sections.push(IniSection {
                    name: name.trim().to_owned(),
                    entries: Vec::new(),
                });
                continue;
            }
            if sections.is_empty() {
                // entries before the first header land in an unnamed section
                sections.push(IniSection {
                    name: String::new(),
                    entries: Vec::new(),
                });
            }
            if let Some(section) = sections.last_mut() {
                match line.split_once('=') {
                    Some((key, value)) => section
                        .entries
                        .push((key.trim().to_owned(), Some(value.trim().to_owned()))),
                    None => section.entries.push((line.to_owned(), None)),
                }
            }
        }
        Self { sections }
    }

    /// Sections in file order with their entries; a valueless entry
    /// carries `None`.
    pub fn sections(&self) -> impl Iterator<Item = (&String, &[(String, Option<String>)])> {
        self.sections
            .iter()
            .map(|section| (&section.name, section.entries.as_slice()))
    }

    pub fn section(&self, name: &str) -> Option<&[(String, Option<String>)]> {
        self.sections
            .iter()
            .find(|section| section.name == name)
            .map(|section| section.entries.as_slice())
    }

    /// Value for `key` in `section`; a valueless key reads as `""`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONANINFO: &str = "\
[settings]
    arch=x86_64
    build_type=Release
    compiler=gcc
    compiler.version=9
    os=Linux

[requires]

[options]
    shared=False

[full_settings]
    arch=x86_64
    os=Linux

[full_requires]

[full_options]
    shared=False

[recipe_hash]
    75d0ac22ef58c7b06e9970dbcdbbcc62

[env]
";

    #[test]
    fn empty_input_parses_to_nothing() {
        assert!(IniDoc::parse("").is_empty());
        assert!(IniDoc::parse("\n\n  \n").is_empty());
    }

    #[test]
    fn conaninfo_sections_and_values() {
        let doc = IniDoc::parse(CONANINFO);
        assert_eq!(doc.sections().count(), 8);
        assert_eq!(doc.get("settings", "os"), Some("Linux"));
        assert_eq!(doc.get("options", "shared"), Some("False"));
        assert_eq!(doc.get("settings", "missing"), None);
        assert_eq!(doc.get("missing", "os"), None);
    }

    #[test]
    fn bare_keys_read_back_as_empty_strings() {
        let doc = IniDoc::parse(CONANINFO);
        let entries = doc.section("recipe_hash").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "75d0ac22ef58c7b06e9970dbcdbbcc62");
        assert_eq!(entries[0].1, None);
        assert_eq!(
            doc.get("recipe_hash", "75d0ac22ef58c7b06e9970dbcdbbcc62"),
            Some("")
        );
    }

    #[test]
    fn explicit_empty_values_are_kept() {
        let doc = IniDoc::parse("[requires]\nzlib=\n");
        assert_eq!(doc.get("requires", "zlib"), Some(""));
        assert_eq!(
            doc.section("requires").unwrap()[0].1,
            Some(String::new())
        );
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let doc = IniDoc::parse("; leading comment\n[settings]\n# another\n\nos=Linux\n");
        assert_eq!(doc.sections().count(), 1);
        assert_eq!(doc.get("settings", "os"), Some("Linux"));
    }

    #[test]
    fn entries_before_a_header_get_an_unnamed_section() {
        let doc = IniDoc::parse("stray\n[settings]\nos=Linux\n");
        assert_eq!(doc.section("").unwrap()[0].0, "stray");
    }
}
