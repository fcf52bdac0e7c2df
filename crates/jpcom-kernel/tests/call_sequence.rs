//! Exact engine call sequences, observed through a recording engine.
//!
//! The recorder performs just enough file I/O (derived block writes, deletes)
//! for the pipeline to run; everything else is logged and acknowledged.

use jpcom_engine::{
    AppendOptions, BlockId, DataEngine, DateVersion, DiagramHandle, EngineError, FileId,
    FileList, KnowledgeHandle, KnowledgeOptions,
};
use jpcom_kernel::{BridgeStatus, BuildRequest, EngineOp, JpcomError, build_jpcom};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "jpcom-kernel-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

struct RecordingEngine {
    output: PathBuf,
    fail_bridge: bool,
    knowledge_unusable: bool,
    next_handle: Cell<u64>,
    calls: RefCell<Vec<String>>,
}

impl RecordingEngine {
    fn new(output: &Path) -> Self {
        Self {
            output: output.to_path_buf(),
            fail_bridge: false,
            knowledge_unusable: false,
            next_handle: Cell::new(1),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn label(&self, path: &Path) -> String {
        if path == self.output {
            return "output".to_string();
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.ends_with(".copy") {
            "scratch".to_string()
        } else if name.starts_with("train_disp_line_ptn") {
            "derived".to_string()
        } else {
            name
        }
    }

    fn labels(&self, files: &FileList) -> String {
        files
            .paths()
            .map(|path| self.label(path))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn mint(&self) -> u64 {
        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        raw
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl DataEngine for RecordingEngine {
    fn initiate_diagram(&self, files: &FileList) -> Result<DiagramHandle, EngineError> {
        self.record(format!("initiate_diagram([{}])", self.labels(files)));
        Ok(DiagramHandle::from_raw(self.mint()))
    }

    fn terminate_diagram(&self, handle: DiagramHandle) -> Result<(), EngineError> {
        self.record(format!("terminate_diagram(#{})", handle.raw()));
        Ok(())
    }

    fn initiate_knowledge(
        &self,
        files: &FileList,
        diagram: &DiagramHandle,
        _options: KnowledgeOptions,
    ) -> Result<Option<KnowledgeHandle>, EngineError> {
        self.record(format!(
            "initiate_knowledge([{}], #{})",
            self.labels(files),
            diagram.raw()
        ));
        if self.knowledge_unusable {
            return Ok(None);
        }
        Ok(Some(KnowledgeHandle::from_raw(self.mint())))
    }

    fn terminate_knowledge(&self, handle: KnowledgeHandle) -> Result<(), EngineError> {
        self.record(format!("terminate_knowledge(#{})", handle.raw()));
        Ok(())
    }

    fn remove_block(&self, container: &Path, id: BlockId) -> Result<bool, EngineError> {
        self.record(format!("remove_block({id}, {})", self.label(container)));
        Ok(true)
    }

    fn append_block(
        &self,
        source: &Path,
        _options: AppendOptions,
        id: BlockId,
        container: &Path,
    ) -> Result<(), EngineError> {
        self.record(format!(
            "append_block({} -> {id}, {})",
            self.label(source),
            self.label(container)
        ));
        Ok(())
    }

    fn replace_file_id(&self, container: &Path, file_id: FileId) -> Result<(), EngineError> {
        self.record(format!(
            "replace_file_id({}, {file_id})",
            self.label(container)
        ));
        Ok(())
    }

    fn replace_date_version(
        &self,
        container: &Path,
        version: DateVersion,
    ) -> Result<(), EngineError> {
        self.record(format!(
            "replace_date_version({}, {version})",
            self.label(container)
        ));
        Ok(())
    }

    fn bridge_train_disp_line(&self, knowledge: &KnowledgeHandle) -> Result<(), EngineError> {
        self.record(format!("bridge_train_disp_line(#{})", knowledge.raw()));
        if self.fail_bridge {
            return Err(EngineError::BridgeInput("synthetic failure".to_string()));
        }
        Ok(())
    }

    fn write_train_disp_line_ptn(
        &self,
        knowledge: &KnowledgeHandle,
        path: &Path,
    ) -> Result<(), EngineError> {
        self.record(format!(
            "write_train_disp_line_ptn(#{}, {})",
            knowledge.raw(),
            self.label(path)
        ));
        fs::write(path, b"derived").map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn delete_file(&self, path: &Path) -> Result<bool, EngineError> {
        self.record(format!("delete_file({})", self.label(path)));
        Ok(fs::remove_file(path).is_ok())
    }
}

struct Fixture {
    _root: TempDirGuard,
    output: PathBuf,
    table: PathBuf,
    knb_dir: PathBuf,
    dia_dir: PathBuf,
}

impl Fixture {
    fn new(prefix: &str, table: &str) -> Self {
        let root = TempDirGuard::new(prefix);
        let base = root.path();
        let blocks = base.join("blocks");
        let knb_dir = base.join("knb");
        let dia_dir = base.join("data");
        for dir in [&blocks, &knb_dir, &dia_dir] {
            fs::create_dir_all(dir).expect("fixture dir should exist");
        }
        for name in ["master.bin", "pattern.bin", "other.bin"] {
            fs::write(blocks.join(name), name.as_bytes()).expect("block source should write");
        }
        fs::write(knb_dir.join("base.knb"), b"knb").expect("knb should write");
        fs::write(dia_dir.join("b.dat"), b"b").expect("diagram should write");
        fs::write(dia_dir.join("a.dat"), b"a").expect("diagram should write");

        let output = base.join("jpcom.knb");
        fs::write(&output, b"container").expect("output should write");
        let table_path = blocks.join("idtable.txt");
        fs::write(&table_path, table).expect("id table should write");

        Self {
            _root: root,
            output,
            table: table_path,
            knb_dir,
            dia_dir,
        }
    }

    fn request(&self) -> BuildRequest {
        let mut request = BuildRequest::new(&self.output);
        request.run_id = "run1".to_string();
        request.id_table = Some(self.table.clone());
        request.knb_dir = Some(self.knb_dir.clone());
        request.dia_dir = Some(self.dia_dir.clone());
        request.version = Some("20240401".to_string());
        request
    }
}

#[test]
fn bridging_runs_once_between_substitutions() {
    let fixture = Fixture::new(
        "sequence",
        "7,other.bin\n100,master.bin\n101,pattern.bin\n100,master.bin\n",
    );
    let engine = RecordingEngine::new(&fixture.output);

    let report = build_jpcom(&engine, &fixture.request()).expect("build should succeed");
    assert_eq!(report.bridge.status, BridgeStatus::Fired);
    assert_eq!(report.bridge.trigger_line, Some(3));
    assert_eq!(report.substituted_count(), 4);

    insta::assert_json_snapshot!(engine.calls(), @r###"
    [
      "remove_block(7, output)",
      "append_block(other.bin -> 7, output)",
      "remove_block(100, output)",
      "append_block(master.bin -> 100, output)",
      "remove_block(101, output)",
      "append_block(pattern.bin -> 101, output)",
      "remove_block(105, scratch)",
      "initiate_diagram([a.dat, b.dat])",
      "initiate_knowledge([base.knb, scratch], #1)",
      "bridge_train_disp_line(#2)",
      "delete_file(derived)",
      "write_train_disp_line_ptn(#2, derived)",
      "remove_block(105, output)",
      "append_block(derived -> 105, output)",
      "delete_file(derived)",
      "terminate_knowledge(#2)",
      "terminate_diagram(#1)",
      "delete_file(scratch)",
      "remove_block(100, output)",
      "append_block(master.bin -> 100, output)",
      "replace_file_id(output, 1/100)",
      "replace_date_version(output, 20240401)"
    ]
    "###);

    assert!(!fixture.request().scratch_path().exists());
    assert!(!fixture.request().derived_path().exists());
}

#[test]
fn missing_sources_are_skipped_without_engine_calls() {
    let fixture = Fixture::new("missing", "100,absent.bin\n101,pattern.bin\n");
    let engine = RecordingEngine::new(&fixture.output);
    let mut request = fixture.request();
    request.version = None;

    let report = build_jpcom(&engine, &request).expect("build should succeed");
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.bridge.status, BridgeStatus::NotTriggered);
    assert_eq!(report.date_version, None);

    insta::assert_json_snapshot!(engine.calls(), @r###"
    [
      "remove_block(101, output)",
      "append_block(pattern.bin -> 101, output)",
      "replace_file_id(output, 1/100)"
    ]
    "###);
}

#[test]
fn empty_diagram_directory_skips_bridging_after_scratch_prep() {
    let fixture = Fixture::new("no-dia", "100,master.bin\n101,pattern.bin\n");
    for name in ["a.dat", "b.dat"] {
        fs::remove_file(fixture.dia_dir.join(name)).expect("diagram should be removed");
    }
    let engine = RecordingEngine::new(&fixture.output);

    let report = build_jpcom(&engine, &fixture.request()).expect("build should succeed");
    assert_eq!(report.bridge.status, BridgeStatus::SkippedNoDiagramData);
    assert_eq!(report.bridge.derived_block, None);

    let calls = engine.calls();
    assert!(calls.contains(&"remove_block(105, scratch)".to_string()));
    assert!(calls.contains(&"delete_file(scratch)".to_string()));
    assert!(!calls.iter().any(|c| c.starts_with("initiate_")));
    assert!(!calls.contains(&"remove_block(105, output)".to_string()));
}

#[test]
fn unusable_knowledge_closes_the_diagram_session_and_skips_bridging() {
    let fixture = Fixture::new("no-knowledge", "100,master.bin\n101,pattern.bin\n");
    let mut engine = RecordingEngine::new(&fixture.output);
    engine.knowledge_unusable = true;

    let report = build_jpcom(&engine, &fixture.request()).expect("build should succeed");
    assert_eq!(report.bridge.status, BridgeStatus::SkippedNoKnowledgeData);
    assert_eq!(report.bridge.diagram_files, 2);
    assert_eq!(report.bridge.knowledge_files, 2);
    assert_eq!(report.bridge.derived_block, None);
    assert!(
        !engine
            .calls()
            .contains(&"remove_block(105, output)".to_string())
    );

    insta::assert_json_snapshot!(engine.calls(), @r###"
    [
      "remove_block(100, output)",
      "append_block(master.bin -> 100, output)",
      "remove_block(101, output)",
      "append_block(pattern.bin -> 101, output)",
      "remove_block(105, scratch)",
      "initiate_diagram([a.dat, b.dat])",
      "initiate_knowledge([base.knb, scratch], #1)",
      "terminate_diagram(#1)",
      "delete_file(scratch)",
      "replace_file_id(output, 1/100)",
      "replace_date_version(output, 20240401)"
    ]
    "###);
    assert!(!fixture.request().scratch_path().exists());
}

#[test]
fn bridge_failure_closes_open_sessions_and_cleans_up() {
    let fixture = Fixture::new("bridge-fail", "100,master.bin\n101,pattern.bin\n");
    let mut engine = RecordingEngine::new(&fixture.output);
    engine.fail_bridge = true;

    let err = build_jpcom(&engine, &fixture.request()).expect_err("bridge should fail");
    assert!(matches!(
        err,
        JpcomError::Engine {
            op: EngineOp::Bridge,
            ..
        }
    ));

    let calls = engine.calls();
    let tail: Vec<&str> = calls.iter().rev().take(4).rev().map(String::as_str).collect();
    assert_eq!(
        tail,
        vec![
            "terminate_knowledge(#2)",
            "terminate_diagram(#1)",
            "delete_file(scratch)",
            "delete_file(derived)",
        ]
    );
    assert!(!calls.iter().any(|c| c.starts_with("replace_")));
    assert!(!fixture.request().scratch_path().exists());
}

#[test]
fn missing_diagram_directory_is_a_configuration_error_only_when_bridging() {
    let fixture = Fixture::new("no-dia-config", "7,other.bin\n");
    let engine = RecordingEngine::new(&fixture.output);
    let mut request = fixture.request();
    request.dia_dir = None;
    request.knb_dir = None;
    build_jpcom(&engine, &request).expect("no bridging, no directories needed");

    let fixture = Fixture::new("no-dia-config-bridge", "100,master.bin\n101,pattern.bin\n");
    let engine = RecordingEngine::new(&fixture.output);
    let mut request = fixture.request();
    request.dia_dir = None;
    let err = build_jpcom(&engine, &request).expect_err("bridging needs diagram data");
    assert!(matches!(
        err,
        JpcomError::MissingDirectory {
            role: "diagram-data"
        }
    ));
}
