#![cfg(unix)]

//! End-to-end sweep over a fake toolchain and a fake decompiler: the
//! interpreter stand-in copies the source text as "bytecode", the
//! decompiler stand-in echoes it back behind a three-line banner.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use pyc_regress::store::{self, ArtifactStore};
use pyc_regress::verdict::{self, CellVerdict, SourceCache, Tally};
use pyc_regress::versions::{VersionId, VersionMatrix};
use pyc_regress::{compile, decompile};
use tempfile::TempDir;

fn write_exec(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

struct Fixture {
    _root: TempDir,
    store: ArtifactStore,
    toolchains: compile::Toolchains,
    compile_log: PathBuf,
    decompile_log: PathBuf,
    decompiler: PathBuf,
    matrix: VersionMatrix,
}

impl Fixture {
    fn new(sources: &[(&str, &str)]) -> Self {
        let root = TempDir::new().unwrap();
        let store = ArtifactStore::new(root.path());
        store::ensure_dir(store.input_dir()).unwrap();
        for (name, text) in sources {
            fs::write(store.input_dir().join(name), text).unwrap();
        }

        let tool_dir = root.path().join("toolchains");
        store::ensure_dir(&tool_dir).unwrap();
        let compile_log = root.path().join("compile.log");
        // interpreter stand-in: record the call, drop the "bytecode"
        // beside the source the way old interpreters do
        for name in ["python3.9", "python3.10"] {
            write_exec(
                &tool_dir.join(name),
                &format!(
                    "#!/bin/sh\necho \"$3\" >> \"{}\"\ncp \"$3\" \"${{3%.py}}.pyc\"\n",
                    compile_log.display()
                ),
            );
        }

        let decompile_log = root.path().join("decompile.log");
        let decompiler = root.path().join("fake-pycdc");
        // banner plus payload echo; artifacts named *broken* crash
        write_exec(
            &decompiler,
            &format!(
                concat!(
                    "#!/bin/sh\n",
                    "echo \"$1\" >> \"{}\"\n",
                    "case \"$1\" in\n",
                    "*broken*) echo 'cannot decompile' >&2; exit 2;;\n",
                    "esac\n",
                    "printf '# banner one\\n# banner two\\n# banner three\\n'\n",
                    "cat \"$1\"\n"
                ),
                decompile_log.display()
            ),
        );

        let mut matrix = VersionMatrix::supported();
        matrix
            .restrict_to(&[VersionId::new(3, 9), VersionId::new(3, 10)])
            .unwrap();

        Fixture {
            store,
            toolchains: compile::Toolchains::new(tool_dir),
            compile_log,
            decompile_log,
            decompiler,
            matrix,
            _root: root,
        }
    }

    fn inputs(&self) -> Vec<PathBuf> {
        self.store.input_files("*").unwrap()
    }

    fn compile(&self) {
        compile::compile_all(&self.inputs(), &self.matrix, &self.store, &self.toolchains, 3)
            .unwrap();
    }

    fn decompile(&self) {
        decompile::decompile_all(&self.decompiler, "*", &self.matrix, &self.store, 3).unwrap();
    }

    fn log_lines(path: &Path) -> usize {
        fs::read_to_string(path)
            .map(|text| text.lines().count())
            .unwrap_or(0)
    }
}

#[test]
fn pipeline_judges_the_whole_matrix() {
    let fx = Fixture::new(&[("hello.py", "print('start')\n"), ("broken.py", "x = 1\n")]);
    fx.compile();
    fx.decompile();

    let order = fx.matrix.expand();
    let inputs = fx.inputs();
    let mut tally = Tally::new(&order, inputs.len());
    let mut cache = SourceCache::default();
    for version in &order {
        for source in &inputs {
            let stem = store::file_stem(source).unwrap();
            let decompiled = fx.store.decompiled_path(stem, *version);
            let judgement = verdict::classify(&mut cache, source, &decompiled).unwrap();
            let expected = if stem == "broken" {
                CellVerdict::FailedCrash
            } else {
                CellVerdict::Succeeded
            };
            assert_eq!(judgement.verdict, expected, "{stem} under {version}");
            tally.record(*version, judgement.verdict);
        }
    }
    for version in &order {
        assert_eq!(tally.successes(*version), 1);
    }

    // the crash payload carries the sentinel and the hex status
    let stored = fs::read_to_string(fx.store.decompiled_path("broken", order[0])).unwrap();
    assert!(stored.starts_with("#ERROR0\n"));
    assert!(stored.contains("Unexpected return code: 0x2"));
    assert!(stored.contains("cannot decompile"));
}

#[test]
fn compiled_artifacts_are_reused_on_the_second_run() {
    let fx = Fixture::new(&[("hello.py", "print('start')\n"), ("broken.py", "x = 1\n")]);
    fx.compile();
    assert_eq!(Fixture::log_lines(&fx.compile_log), 4); // 2 files × 2 versions

    fx.compile();
    assert_eq!(
        Fixture::log_lines(&fx.compile_log),
        4,
        "second sweep must not touch the toolchain"
    );
}

#[test]
fn decompilation_reruns_every_time() {
    let fx = Fixture::new(&[("hello.py", "print('start')\n")]);
    fx.compile();

    fx.decompile();
    assert_eq!(Fixture::log_lines(&fx.decompile_log), 2); // 1 file × 2 versions
    fx.decompile();
    assert_eq!(
        Fixture::log_lines(&fx.decompile_log),
        4,
        "the decompiler is the thing under test; never skip it"
    );
}
