//! Contract compilation through the node

use crate::error::{Error, Result};
use crate::node::NodeClient;

/// Program version the AMM contract targets
pub const DEFAULT_PROGRAM_VERSION: u8 = 6;

const VERSION_PRAGMA: &str = "#pragma version";

/// Ensure `source` starts with a version pragma for `version`.
///
/// Sources without a pragma get one prepended. A pragma naming another
/// version is rejected rather than rewritten.
pub fn with_version_pragma(source: &str, version: u8) -> Result<String> {
    let first_line = source
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("//"));

    if let Some(declared) = first_line.and_then(|line| line.strip_prefix(VERSION_PRAGMA)) {
        let declared = declared.trim();
        return match declared.parse::<u8>() {
            Ok(v) if v == version => Ok(source.to_string()),
            _ => Err(Error::ProgramVersionMismatch {
                expected: version,
                found: declared.to_string(),
            }),
        };
    }

    Ok(format!("{VERSION_PRAGMA} {version}\n{source}"))
}

/// Compile program source to bytecode. Node errors propagate unchanged.
pub fn compile_program<C: NodeClient + ?Sized>(
    client: &C,
    source: &str,
    version: u8,
) -> Result<Vec<u8>> {
    let source = with_version_pragma(source, version)?;
    let bytecode = client.compile(&source)?;

    log::debug!("Compiled program: {} bytes", bytecode.len());
    Ok(bytecode)
}

/// Approval and clear-state bytecode of the AMM application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractPrograms {
    pub approval: Vec<u8>,
    pub clear: Vec<u8>,
}

impl ContractPrograms {
    pub fn compile<C: NodeClient + ?Sized>(
        client: &C,
        approval_source: &str,
        clear_source: &str,
        version: u8,
    ) -> Result<Self> {
        Ok(Self {
            approval: compile_program(client, approval_source, version)?,
            clear: compile_program(client, clear_source, version)?,
        })
    }
}
