//! End-to-end runs of the generator against temporary directories.

use std::fs;
use std::path::{Path, PathBuf};

use catalog::{Capabilities, DataType};
use generator::embed::find_embedded;
use generator::manifest::CatalogManifest;
use generator::{run, GeneratorConfig, GeneratorError, Mode, WriteOutcome};

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("shadergen-{}-{}", test, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("shaders")).unwrap();
    dir
}

fn config_in(dir: &Path) -> GeneratorConfig {
    let mut config = GeneratorConfig {
        input_dir: dir.join("shaders"),
        output_dir: dir.join("spv"),
        target_hpp: dir.join("gen/ggml-vulkan-shaders.hpp"),
        target_cpp: dir.join("gen/ggml-vulkan-shaders.cpp"),
        capabilities: Capabilities::none(),
        command_line: vec!["shadergen".to_string()],
        ..GeneratorConfig::default()
    };
    config.set_types(&[DataType::F32]);
    config
}

fn write_spv(config: &GeneratorConfig, name: &str, data: &[u8]) {
    fs::create_dir_all(&config.output_dir).unwrap();
    fs::write(config.output_dir.join(format!("{}.spv", name)), data).unwrap();
}

#[test]
fn test_embed_mode_embeds_present_artifacts() {
    let dir = scratch_dir("embed");
    let config = config_in(&dir);
    write_spv(&config, "norm_f32", &[0x03, 0x02, 0x23, 0x07, 0xff]);
    write_spv(&config, "add_f32_f32_f32", &(0u8..30).collect::<Vec<_>>());
    write_spv(&config, "sub_f32", &[]);

    let summary = run(&config).unwrap();
    assert_eq!(summary.embedded, 2);
    assert_eq!(summary.hpp, Some(WriteOutcome::Written));
    assert_eq!(summary.cmake, None);

    let hpp = fs::read_to_string(&config.target_hpp).unwrap();
    let cpp = fs::read_to_string(&config.target_cpp).unwrap();
    assert!(hpp.contains("extern const unsigned char norm_f32_data[5];"));
    assert!(hpp.contains("const uint64_t add_f32_f32_f32_len = 30;"));
    assert!(!hpp.contains("sub_f32_data["));
    assert!(!hpp.contains("rms_norm_f32_data["));
    assert!(cpp.starts_with("#include \"ggml-vulkan-shaders.hpp\""));
    assert_eq!(
        find_embedded(&cpp, "norm_f32"),
        Some(vec![0x03, 0x02, 0x23, 0x07, 0xff])
    );
    assert_eq!(
        find_embedded(&cpp, "add_f32_f32_f32"),
        Some((0u8..30).collect::<Vec<_>>())
    );
    assert!(cpp.contains("add_f32_f32_f32_data, nullptr"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_second_run_leaves_outputs_unchanged() {
    let dir = scratch_dir("idempotent");
    let config = config_in(&dir);
    write_spv(&config, "norm_f32", &[1, 2, 3]);

    let first = run(&config).unwrap();
    assert_eq!(first.cpp, Some(WriteOutcome::Written));
    let second = run(&config).unwrap();
    assert_eq!(second.hpp, Some(WriteOutcome::Unchanged));
    assert_eq!(second.cpp, Some(WriteOutcome::Unchanged));

    write_spv(&config, "norm_f32", &[1, 2, 4]);
    let third = run(&config).unwrap();
    assert_eq!(third.hpp, Some(WriteOutcome::Unchanged));
    assert_eq!(third.cpp, Some(WriteOutcome::Written));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_no_embed_requires_target_cmake() {
    let dir = scratch_dir("no-embed");
    let config = GeneratorConfig {
        no_embed: true,
        ..config_in(&dir)
    };
    match run(&config) {
        Err(GeneratorError::Config(msg)) => {
            assert_eq!(msg, "--no-embed requires --target-cmake to be specified")
        }
        other => panic!("expected a config error, got {:?}", other),
    }
    assert!(!config.target_hpp.exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_stub_mode_never_embeds_bytes() {
    let dir = scratch_dir("stubs");
    let config = GeneratorConfig {
        target_cmake: Some(dir.join("cmake/CMakeLists.txt")),
        no_embed: true,
        ..config_in(&dir)
    };
    assert_eq!(config.mode(), Mode::BuildGraphWithStubs);
    write_spv(&config, "norm_f32", &[9, 9, 9, 9]);

    let summary = run(&config).unwrap();
    assert_eq!(summary.embedded, 0);
    assert_eq!(summary.cmake, Some(WriteOutcome::Written));

    let hpp = fs::read_to_string(&config.target_hpp).unwrap();
    let cpp = fs::read_to_string(&config.target_cpp).unwrap();
    assert!(hpp.contains("#define GGML_VK_SHADER_DIR"));
    assert!(hpp.contains("inline constexpr char const * norm_f32_data = \"norm_f32.spv\";"));
    assert!(!hpp.contains("unsigned char"));
    assert!(!cpp.contains("0x9"));

    let cmake = fs::read_to_string(dir.join("cmake/CMakeLists.txt")).unwrap();
    assert!(cmake.contains("add_custom_target(vulkan-shaders ALL DEPENDS"));
    assert!(!cmake.contains("--target-hpp"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_build_graph_has_one_rule_per_job() {
    let dir = scratch_dir("cmake");
    let config = GeneratorConfig {
        target_cmake: Some(dir.join("nested/dir/CMakeLists.txt")),
        catalog_json: Some(dir.join("catalog.json")),
        debug_info: true,
        generator_exe: PathBuf::from("/bin/shadergen"),
        ..config_in(&dir)
    };

    let summary = run(&config).unwrap();
    assert!(config.output_dir.is_dir());
    assert_eq!(summary.hpp, None);
    assert!(!config.target_hpp.exists());

    let cmake = fs::read_to_string(dir.join("nested/dir/CMakeLists.txt")).unwrap();
    let rules = cmake
        .lines()
        .filter(|l| l.starts_with("compile_shader("))
        .count();
    assert_eq!(rules, summary.jobs);
    assert!(cmake.starts_with("# Generated with shadergen \n"));
    assert!(cmake.contains("\"/bin/shadergen\" --glslc"));
    assert!(cmake.contains("\"--types\" \"f32\" \"--debug-info\""));
    assert!(cmake.contains("\"-g\""));

    let json = fs::read_to_string(dir.join("catalog.json")).unwrap();
    let manifest = CatalogManifest::from_json(&json).unwrap();
    assert_eq!(manifest.jobs.len(), summary.jobs);
    assert_eq!(summary.manifest, Some(WriteOutcome::Written));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_input_dir_fails() {
    let dir = scratch_dir("missing-input");
    let config = GeneratorConfig {
        input_dir: dir.join("does-not-exist"),
        ..config_in(&dir)
    };
    assert!(matches!(
        run(&config),
        Err(GeneratorError::InputDirMissing(_))
    ));
    assert!(!config.output_dir.exists());

    let _ = fs::remove_dir_all(&dir);
}
