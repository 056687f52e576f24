// Print the compiled layout of a uniform block described in TOML
//
// Usage: uniform_layout_report <block.toml>
//
// convention = "std140"
//
// [[uniform]]
// name = "x"
// type = "f32"
// value = 5.0
//
// [[uniform]]
// name = "y"
// type = "vec3<f32>"
// size = 2
// value = [1, 2, 3, 4, 5, 6]

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use uniform_sync::{
    SyncConfig, UniformBuffer, UniformDeclaration, UniformGroup, UniformSyncCompiler, UniformType,
    UniformValue,
};

#[derive(Debug, Deserialize)]
struct BlockFile {
    #[serde(flatten)]
    config: SyncConfig,
    #[serde(default, rename = "uniform")]
    uniforms: Vec<UniformEntry>,
}

#[derive(Debug, Deserialize)]
struct UniformEntry {
    name: String,
    #[serde(rename = "type")]
    ty: UniformType,
    #[serde(default = "default_size")]
    size: usize,
    value: UniformValue,
}

fn default_size() -> usize {
    1
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: uniform_layout_report <block.toml>");
    };

    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let block: BlockFile = toml::from_str(&text).with_context(|| format!("parsing {}", path))?;

    let mut group = UniformGroup::new();
    for uniform in block.uniforms {
        group.declare(UniformDeclaration::array(uniform.name, uniform.ty, uniform.size, uniform.value));
    }

    let compiler = UniformSyncCompiler::new(block.config);
    let (layout, compiled) = compiler.compile_declarations(group.declarations())?;

    println!("{}", layout.visualize());

    println!("=== Write plan ===");
    for entry in compiled.entries() {
        println!("  {:20} @ {:4} floats : {:?}", entry.name, entry.offset, entry.tier);
    }

    let mut buffer = UniformBuffer::for_layout(&layout);
    buffer.sync(&compiled, &group)?;

    println!("\n=== Buffer ({} floats) ===", buffer.len());
    for (row, chunk) in buffer.as_slice().chunks(4).enumerate() {
        println!("  {:4} | {:?}", row * 16, chunk);
    }

    Ok(())
}
