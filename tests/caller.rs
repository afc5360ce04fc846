use std::ops::Deref;
use std::path::{Path, PathBuf};

use scalarbridge::abi::{CChar, Int, Long, ScalarKind, ULong};
use scalarbridge::config::CONFIG_FILE_NAME;
use scalarbridge::error::LaunchError;
use scalarbridge::journal::{self, Observation};
use scalarbridge::loader::library_filename;
use scalarbridge::{Contract, Launch, Loader, LoaderConfig, OpaqueBlock, Scenario};

const CALLER: &str = env!("CARGO_BIN_EXE_sb-caller");

/// Temporary directory removed on drop.
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new(name: &str) -> Self {
        let dir =
            std::env::temp_dir().join(format!("scalarbridge-it-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Deref for ScratchDir {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

// cargo puts the cdylib next to the binaries, or only under deps/ when the
// library was built as a test dependency.
fn library_dirs() -> Vec<PathBuf> {
    let dir = Path::new(CALLER).parent().unwrap().to_path_buf();
    vec![dir.clone(), dir.join("deps")]
}

fn built_library_dirs() -> Vec<PathBuf> {
    let name = library_filename("scalarbridge");
    let dirs = library_dirs();
    assert!(
        dirs.iter().any(|dir| dir.join(&name).is_file()),
        "{} missing from {:?}",
        name,
        dirs
    );
    dirs
}

fn isolated_config(name: &str) -> ScratchDir {
    let dir = ScratchDir::new(name);
    std::fs::write(
        dir.join(CONFIG_FILE_NAME),
        r#"{ "library": "scalarbridge", "system_paths": false }"#,
    )
    .unwrap();
    dir
}

#[test]
fn startup_fails_when_search_path_omits_library() {
    let config = isolated_config("omit");
    let empty = ScratchDir::new("empty");
    let err = Launch::new(CALLER)
        .set_config(config.path())
        .add_search_path(empty.path())
        .run()
        .unwrap_err();

    match err {
        LaunchError::Exited { status, stderr, .. } => {
            assert_eq!(status.code(), Some(127));
            assert!(stderr.contains("not found"), "{}", stderr);
            assert!(stderr.contains(r#""system_paths":false"#), "{}", stderr);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn all_calls_run_when_search_path_includes_library() {
    let config = isolated_config("include");
    let before = ScratchDir::new("before");
    let mut launch = Launch::new(CALLER)
        .set_config(config.path())
        .add_search_path(before.path());
    for dir in built_library_dirs() {
        launch = launch.add_search_path(dir);
    }
    let output = launch.run().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<(&str, &str)> = stdout
        .lines()
        .filter_map(|line| line.split_once(' '))
        .collect();

    let kinds: Vec<&str> = lines.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(
        kinds,
        [
            "sb_pass_char",
            "sb_pass_wide_char",
            "sb_pass_short",
            "sb_pass_unsigned_short",
            "sb_pass_int",
            "sb_pass_unsigned_int",
            "sb_pass_long",
            "sb_pass_unsigned_long",
            "sb_pass_pointer",
        ]
    );

    // What the library reported receiving, not what the caller sent.
    let received: Vec<&str> = lines.iter().map(|(_, bits)| *bits).collect();
    assert_eq!(
        received[..8],
        [
            "0x41",
            "0x3b6",
            "0xff9c",
            "0x64",
            "0xfffffff6",
            "0xa",
            "0xfffffffffffffc18",
            "0x3e8",
        ]
    );
    assert_ne!(received[8], "0x0");
}

#[test]
fn built_library_binds_and_reports_what_it_received() {
    let mut config = LoaderConfig::new("scalarbridge").set_system_paths(false);
    for dir in built_library_dirs() {
        config = config.add_search_path(dir);
    }
    let library = Loader::new(config).load().unwrap();
    let contract = Contract::bind(&library).unwrap();

    let (result, seen) = journal::capture(|| contract.pass_int(-10));
    result.unwrap();
    assert_eq!(
        seen,
        [Observation {
            kind: ScalarKind::Int,
            bits: 0xffff_fff6
        }]
    );

    let (results, seen) = journal::capture(|| {
        [
            contract.pass_char(CChar::MIN),
            contract.pass_int(Int::MAX),
            contract.pass_long(Long::MIN),
            contract.pass_unsigned_long(ULong::MAX),
        ]
    });
    assert!(results.iter().all(Result::is_ok));
    let bits: Vec<u64> = seen.iter().map(|o| o.bits).collect();
    assert_eq!(
        bits,
        [
            CChar::MIN as u8 as u64,
            Int::MAX as u32 as u64,
            Long::MIN as u64,
            ULong::MAX,
        ]
    );

    let block = OpaqueBlock::allocate(1000).unwrap();
    let (result, seen) = journal::capture(|| contract.pass_pointer(block.as_opaque()));
    result.unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].bits, block.addr() as u64);

    let report = Scenario::example().run_observed(&contract).unwrap();
    assert_eq!(report.calls().len(), ScalarKind::ALL.len());
    for call in report.calls() {
        assert_eq!(call.received, Some(call.sent), "{}", call.kind);
    }
}
