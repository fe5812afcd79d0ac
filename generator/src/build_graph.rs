//! CMake build graph for the shader compiler.
//!
//! Every catalog job becomes one `compile_shader(...)` call; the generated
//! function hands the compiler `-MD -MF <out>.d` and registers the depfile so
//! CMake tracks `#include`d headers. One aggregate target closes the file:
//! either all `.spv` outputs, or a second generator invocation that embeds
//! them.

use std::io;
use std::path::{Path, PathBuf};

use catalog::{Catalog, CompileJob};

use crate::writer::{write_if_changed, WriteOutcome};

/// Name of the aggregate target the parent project depends on.
pub const AGGREGATE_TARGET: &str = "vulkan-shaders";

/// One compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRule {
    pub name: String,
    pub compiler: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub flags: Vec<String>,
    pub depfile: PathBuf,
}

impl BuildRule {
    pub fn from_job(compiler: &Path, job: &CompileJob) -> Self {
        BuildRule {
            name: job.name.clone(),
            compiler: compiler.to_path_buf(),
            input: job.input_path.clone(),
            output: job.output_path.clone(),
            flags: job.flags(),
            depfile: job.depfile_path(),
        }
    }
}

/// One rule per job, in catalog order.
pub fn build_rules(compiler: &Path, catalog: &Catalog) -> Vec<BuildRule> {
    catalog
        .jobs()
        .map(|job| BuildRule::from_job(compiler, job))
        .collect()
}

/// Generator invocation that embeds the compiled shaders.
#[derive(Debug, Clone)]
pub struct EmbedInvocation {
    pub generator: PathBuf,
    pub glslc: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub target_hpp: PathBuf,
    pub target_cpp: PathBuf,
    /// Passed through so the second run builds the same catalog.
    pub extra_args: Vec<String>,
}

/// Quote `s` as a CMake argument.
pub fn cmake_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn quote_path(path: &Path) -> String {
    cmake_quote(&path.display().to_string())
}

/// Incrementally built `CMakeLists.txt`.
pub struct CMakeLists {
    out: String,
    outputs: Vec<PathBuf>,
}

impl CMakeLists {
    /// Header, project declaration and the `compile_shader` function.
    pub fn new(command_line: &[String], glslc: &Path) -> Self {
        let mut out = String::new();
        out.push_str("# Generated with ");
        for arg in command_line {
            out.push_str(arg);
            out.push(' ');
        }
        out.push_str("\n\n");
        out.push_str("cmake_minimum_required(VERSION 3.14)\n");
        out.push_str("project(ggml-vulkan-shaders)\n\n");
        out.push_str(&format!("set(GLSLC {})\n\n", quote_path(glslc)));
        out.push_str("function(compile_shader name in_file out_file flags)\n");
        out.push_str("  add_custom_command(\n");
        out.push_str("    OUTPUT ${out_file}\n");
        out.push_str(
            "    COMMAND ${GLSLC} ${flags} ${ARGN} -MD -MF ${out_file}.d ${in_file} -o ${out_file}\n",
        );
        out.push_str("    DEPENDS ${in_file}\n");
        out.push_str("    DEPFILE ${out_file}.d\n");
        out.push_str("    COMMENT \"Building Vulkan shader ${name}.spv\"\n");
        out.push_str("  )\n");
        out.push_str("endfunction()\n\n");
        CMakeLists {
            out,
            outputs: Vec::new(),
        }
    }

    pub fn add_rule(&mut self, rule: &BuildRule) {
        self.out.push_str(&format!(
            "compile_shader({} {} {} ",
            rule.name,
            quote_path(&rule.input),
            quote_path(&rule.output)
        ));
        for flag in &rule.flags {
            self.out.push_str(&cmake_quote(flag));
            self.out.push(' ');
        }
        self.out.push_str(")\n");
        self.outputs.push(rule.output.clone());
    }

    /// Aggregate target over every compiled shader.
    pub fn add_target_build_only(&mut self) {
        self.out
            .push_str(&format!("\nadd_custom_target({} ALL DEPENDS\n", AGGREGATE_TARGET));
        for output in &self.outputs {
            self.out.push_str(&format!("  {}\n", quote_path(output)));
        }
        self.out.push_str(")\n");
    }

    /// Embedding step over every compiled shader, plus an aggregate target
    /// over the two generated units.
    pub fn add_target_embed(&mut self, embed: &EmbedInvocation) {
        let hpp = quote_path(&embed.target_hpp);
        let cpp = quote_path(&embed.target_cpp);

        self.out.push_str("\nadd_custom_command(\n");
        self.out.push_str(&format!("  OUTPUT {} {}\n", hpp, cpp));
        self.out.push_str(&format!(
            "  COMMAND {} --glslc {} --input-dir {} --output-dir {} --target-hpp {} --target-cpp {}",
            quote_path(&embed.generator),
            quote_path(&embed.glslc),
            quote_path(&embed.input_dir),
            quote_path(&embed.output_dir),
            hpp,
            cpp
        ));
        for arg in &embed.extra_args {
            self.out.push(' ');
            self.out.push_str(&cmake_quote(arg));
        }
        self.out.push('\n');
        self.out.push_str("  DEPENDS\n");
        for output in &self.outputs {
            self.out.push_str(&format!("    {}\n", quote_path(output)));
        }
        self.out
            .push_str("  COMMENT \"Embedding Vulkan shaders into C++ source\"\n");
        self.out.push_str(")\n");

        self.out
            .push_str(&format!("\nadd_custom_target({} ALL DEPENDS\n", AGGREGATE_TARGET));
        self.out.push_str(&format!("  {}\n", hpp));
        self.out.push_str(&format!("  {}\n", cpp));
        self.out.push_str(")\n");
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn write(&self, path: &Path) -> io::Result<WriteOutcome> {
        write_if_changed(path, self.out.as_bytes())
    }
}

/// The complete build description for `catalog`. `embed` selects the
/// embedding aggregate over the build-only one.
pub fn render_cmake(
    command_line: &[String],
    glslc: &Path,
    catalog: &Catalog,
    embed: Option<&EmbedInvocation>,
) -> CMakeLists {
    let mut cmake = CMakeLists::new(command_line, glslc);
    for rule in build_rules(glslc, catalog) {
        cmake.add_rule(&rule);
    }
    match embed {
        Some(embed) => cmake.add_target_embed(embed),
        None => cmake.add_target_build_only(),
    }
    cmake
}
