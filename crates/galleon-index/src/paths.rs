//! Storage layout of a Conan repository.
//!
//! Everything under a package coordinate (`name/version/user/channel`)
//! hangs off numbered revision subdirectories:
//!
//! ```text
//! <pkg>/revisions.txt
//! <pkg>/<r>/export/<recipe file>
//! <pkg>/<r>/package/<hash>/revisions.txt
//! <pkg>/<r>/package/<hash>/<b>/<binary file>
//! ```
//!
//! The store is flat, so directory structure only exists as key
//! prefixes; [`next_segment`] and [`revision_of`] are the sole way it
//! is parsed back out.

/// Revisions index file name.
pub const INDEX_FILE: &str = "revisions.txt";

/// Package recipe (sources) subdir name.
pub const RECIPE_SUBDIR: &str = "export";

/// Package binaries subdir name.
pub const PACKAGE_SUBDIR: &str = "package";

/// Manifest file storing the list of package files with their hashes.
pub const MANIFEST_FILE: &str = "conanmanifest.txt";

/// Binary package information for the corresponding build configuration.
pub const INFO_FILE: &str = "conaninfo.txt";

/// Files a recipe revision must carry to be considered complete.
pub const RECIPE_FILES: [&str; 4] = [
    MANIFEST_FILE,
    "conan_export.tgz",
    "conanfile.py",
    "conan_sources.tgz",
];

/// Files a binary revision must carry to be considered complete.
pub const PACKAGE_FILES: [&str; 3] = [MANIFEST_FILE, INFO_FILE, "conan_package.tgz"];

/// The key segment directly below `base` in `key`, or the empty string
/// when `key` has nothing deeper than one segment under `base`.
pub fn next_segment<'a>(base: &str, key: &'a str) -> &'a str {
    let start = base.len() + 1;
    if key.len() <= start || !key.starts_with(base) || key.as_bytes()[base.len()] != b'/' {
        return "";
    }
    match key[start..].find('/') {
        Some(pos) => &key[start..start + pos],
        None => "",
    }
}

/// [`next_segment`] read as a decimal revision number; `-1` when the
/// segment is empty or not numeric.
pub fn revision_of(base: &str, key: &str) -> i64 {
    let segment = next_segment(base, key);
    if segment.is_empty() {
        return -1;
    }
    segment.parse().unwrap_or(-1)
}

pub fn recipe_index(pkg: &str) -> String {
    format!("{pkg}/{INDEX_FILE}")
}

pub fn recipe_file(pkg: &str, rev: i64, name: &str) -> String {
    format!("{pkg}/{rev}/{RECIPE_SUBDIR}/{name}")
}

pub fn packages_dir(pkg: &str, rev: i64) -> String {
    format!("{pkg}/{rev}/{PACKAGE_SUBDIR}")
}

pub fn binary_dir(pkg: &str, rev: i64, hash: &str) -> String {
    format!("{pkg}/{rev}/{PACKAGE_SUBDIR}/{hash}")
}

pub fn binary_index(pkg: &str, rev: i64, hash: &str) -> String {
    format!("{}/{INDEX_FILE}", binary_dir(pkg, rev, hash))
}

pub fn binary_file(dir: &str, rev: i64, name: &str) -> String {
    format!("{dir}/{rev}/{name}")
}
