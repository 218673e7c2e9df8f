use galleon::cli::{Command, GalleonArgs};
use std::fs;
use std::path::Path;

const ZLIB: &str = "zlib/1.2.11/_/_";
const ZLIB_HASH: &str = "6af9cc7cb931c5ad942174fd7838eb655717c709";

fn write_file(root: &Path, key: &str) {
    let path = root.join(key);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"abc").unwrap();
}

fn seed_fixture(root: &Path) {
    for file in [
        "conanmanifest.txt",
        "conan_export.tgz",
        "conanfile.py",
        "conan_sources.tgz",
    ] {
        write_file(root, &format!("{ZLIB}/0/export/{file}"));
    }
    for file in ["conanmanifest.txt", "conaninfo.txt", "conan_package.tgz"] {
        write_file(root, &format!("{ZLIB}/0/package/{ZLIB_HASH}/0/{file}"));
    }
}

fn read_revisions(root: &Path, key: &str) -> String {
    fs::read_to_string(root.join(key)).unwrap()
}

#[tokio::test]
async fn reindex_rebuilds_every_package_in_the_store() {
    let dir = tempfile::tempdir().unwrap();
    seed_fixture(dir.path());

    galleon::run(GalleonArgs {
        command: Command::Reindex {
            root: dir.path().to_path_buf(),
            package: None,
        },
    })
    .await
    .unwrap();

    let recipe = read_revisions(dir.path(), &format!("{ZLIB}/revisions.txt"));
    assert!(recipe.contains(r#""revision":"0""#), "{recipe}");
    let binary = read_revisions(
        dir.path(),
        &format!("{ZLIB}/0/package/{ZLIB_HASH}/revisions.txt"),
    );
    assert!(binary.contains(r#""revision":"0""#), "{binary}");
}

#[tokio::test]
async fn reindex_of_a_single_package_recreates_deleted_indexes() {
    let dir = tempfile::tempdir().unwrap();
    seed_fixture(dir.path());

    let run_single = || {
        galleon::run(GalleonArgs {
            command: Command::Reindex {
                root: dir.path().to_path_buf(),
                package: Some(ZLIB.to_owned()),
            },
        })
    };

    run_single().await.unwrap();
    fs::remove_file(dir.path().join(format!("{ZLIB}/revisions.txt"))).unwrap();

    run_single().await.unwrap();
    let recipe = read_revisions(dir.path(), &format!("{ZLIB}/revisions.txt"));
    assert!(recipe.contains(r#""revision":"0""#), "{recipe}");
}
