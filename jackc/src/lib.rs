//! Compiler for the Jack language, targeting the stack machine
//! of the Hack platform.
pub mod compile;
pub mod error;
pub mod lexer;
pub mod symbol;
pub mod token_stream;
pub mod tokens;
pub mod tree;
pub mod vm;

pub mod prelude {
    pub use super::{
        compile::Compiler,
        compile_class, compile_str, tokens_xml,
        error::{JackError, JackResult},
        CompilerConf, Output,
    };
}

use smol_str::SmolStr;
use std::io;

use compile::Compiler;
use error::JackResult;
use lexer::Lexer;
use tree::Leaf;

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compiler configuration.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompilerConf {
    /// Also serialise the parse tree as XML.
    pub emit_tree: bool,
}

/// Products of compiling one class.
#[derive(Debug)]
pub struct Output {
    pub class_name: SmolStr,
    /// Stack machine instructions, one per line.
    pub vm: String,
    pub xml: Option<String>,
}

/// Compile a single class to stack machine instructions.
pub fn compile_str(source: &str) -> JackResult<String> {
    compile_class(source, &CompilerConf::default()).map(|output| output.vm)
}

pub fn compile_class(source: &str, conf: &CompilerConf) -> JackResult<Output> {
    let compilation = Compiler::new(source, Vec::new())?.compile()?;

    let vm = String::from_utf8(compilation.out)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    let xml = if conf.emit_tree {
        Some(compilation.tree.to_xml()?)
    } else {
        None
    };

    Ok(Output {
        class_name: compilation.class_name,
        vm,
        xml,
    })
}

/// Tokenize a source file into the flat `<tokens>` XML stream, one
/// terminal per line.
pub fn tokens_xml(source: &str) -> JackResult<String> {
    let mut xml = String::from("<tokens>\n");
    for token in Lexer::new(source) {
        Leaf::from_token(&token?, source).write_xml(&mut xml, 0)?;
    }
    xml.push_str("</tokens>\n");
    Ok(xml)
}
