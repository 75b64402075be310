use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use synthforge_core::{CompileError, CompileOptions};
use synthforge_emit::{OUTPUT_DIRECTORIES, compile};

const PROTOTYPE: &str = r#"<generator_prototype>
  <parameters>
    <parameter key="sf" value="2"/>
  </parameters>
  <functions>
    <function key="pr_size" type="uniform_probability[I32]">
      <argument key="x_min" type="I32" value="1"/>
      <argument key="x_max" type="I32" value="50"/>
    </function>
  </functions>
  <record_sequences>
    <random_sequence key="part">
      <record_type>
        <field name="size" type="I32"/>
        <field name="name" type="String"/>
      </record_type>
      <output_format type="csv"/>
      <setter_chain>
        <setter key="set_size" type="field_setter">
          <argument key="field" ref="size"/>
          <argument key="value" type="random_value_provider[I32]">
            <argument key="probability" ref="pr_size"/>
          </argument>
        </setter>
        <setter key="set_name" type="field_setter">
          <argument key="field" ref="name"/>
          <argument key="value" type="const_value_provider[String]">
            <argument key="value" type="String" value="part"/>
          </argument>
        </setter>
      </setter_chain>
      <cardinality_estimator type="const_estimator">
        <argument key="cardinality" type="I64u" value="${%sf%*200}"/>
      </cardinality_estimator>
    </random_sequence>
  </record_sequences>
</generator_prototype>
"#;

fn hash_file(path: &Path) -> Result<String, std::io::Error> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("synthforge_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn options_in(dir: &Path, out: &str) -> CompileOptions {
    let spec_path = dir.join("prototype.xml");
    fs::write(&spec_path, PROTOTYPE).expect("write prototype");
    CompileOptions {
        specification_path: spec_path,
        target_namespace: "Parts".to_string(),
        output_base_path: dir.join(out),
    }
}

fn digests(root: &Path, files: &[String]) -> Vec<String> {
    files
        .iter()
        .map(|file| hash_file(&root.join(file)).expect("hash artifact"))
        .collect()
}

#[test]
fn compile_writes_the_output_tree() {
    let dir = scratch_dir("tree");
    let options = options_in(&dir, "cpp");

    let report = compile(&options).expect("compile succeeds");
    for sub in OUTPUT_DIRECTORIES {
        assert!(options.output_base_path.join(sub).is_dir(), "missing {sub}");
    }
    assert_eq!(report.base_written.len(), 7);
    assert_eq!(report.leaf_created.len(), 7);
    for file in report.base_written.iter().chain(&report.leaf_created) {
        assert!(options.output_base_path.join(file).is_file(), "missing {file}");
    }

    let generator = fs::read_to_string(
        options
            .output_base_path
            .join("generator/base/BasePartGenerator.h"),
    )
    .expect("read generator");
    assert!(generator.contains(
        "_cardinalityEstimator(static_cast<I64u>(config.parameter<I64u>(\"sf\")*200))"
    ));

    let leftovers: Vec<_> = fs::read_dir(options.output_base_path.join("record/base"))
        .expect("list record/base")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn repeated_compiles_are_byte_identical() {
    let dir = scratch_dir("determinism");
    let first_options = options_in(&dir, "first");
    let second_options = CompileOptions {
        output_base_path: dir.join("second"),
        ..first_options.clone()
    };

    let first = compile(&first_options).expect("first compile");
    let second = compile(&second_options).expect("second compile");
    assert_eq!(first, second);

    let files: Vec<String> = first
        .base_written
        .iter()
        .chain(&first.leaf_created)
        .cloned()
        .collect();
    assert_eq!(
        digests(&first_options.output_base_path, &files),
        digests(&second_options.output_base_path, &files)
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn recompiling_keeps_edited_leaf_files() {
    let dir = scratch_dir("leaf");
    let options = options_in(&dir, "cpp");
    compile(&options).expect("first compile");

    let leaf = options.output_base_path.join("runtime/setter/PartSetterChain.h");
    let base = options
        .output_base_path
        .join("runtime/setter/base/BasePartSetterChain.h");
    let edited = "// customised by hand\n";
    fs::write(&leaf, edited).expect("edit leaf");
    fs::write(&base, "// stale\n").expect("tamper base");

    let report = compile(&options).expect("second compile");
    assert_eq!(fs::read_to_string(&leaf).expect("read leaf"), edited);
    assert!(report
        .leaf_skipped
        .contains(&"runtime/setter/PartSetterChain.h".to_string()));
    assert!(report.leaf_created.is_empty());

    let regenerated = fs::read_to_string(&base).expect("read base");
    assert!(regenerated.contains("class BasePartSetterChain : public SetterChain<Part>"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn invalid_namespace_fails_before_anything_is_written() {
    let dir = scratch_dir("namespace");
    let options = CompileOptions {
        target_namespace: "Parts::".to_string(),
        ..options_in(&dir, "cpp")
    };

    let err = compile(&options).expect_err("namespace must be rejected");
    assert!(matches!(err, CompileError::Config(_)), "{err}");
    assert!(!options.output_base_path.exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_specification_is_an_io_error() {
    let dir = scratch_dir("missing");
    let options = CompileOptions {
        specification_path: dir.join("absent.xml"),
        target_namespace: "Parts".to_string(),
        output_base_path: dir.join("cpp"),
    };

    let err = compile(&options).expect_err("missing file must fail");
    assert!(matches!(err, CompileError::Io(_)), "{err}");

    fs::remove_dir_all(&dir).ok();
}
