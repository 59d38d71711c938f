use alloy::{hex, primitives::Bytes};
use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::error::ArtifactError;

// source file -> library name -> offsets
type LinkReferences = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    // Hardhat
    Hex(String),
    // Foundry
    Object {
        object: String,
        #[serde(default, rename = "linkReferences")]
        link_references: LinkReferences,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    source_name: Option<String>,
    #[serde(default)]
    abi: Value,
    bytecode: RawBytecode,
    #[serde(default)]
    link_references: LinkReferences,
}

/// A compiled contract, ready to be bound to a deployer.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: Option<String>,
    pub abi: Value,
    pub bytecode: Bytes,
}

impl Artifact {
    pub fn from_file(path: &Path, name: &str) -> Result<Self, ArtifactError> {
        let contents = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawArtifact =
            serde_json::from_str(&contents).map_err(|source| ArtifactError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_raw(raw, name)
    }

    fn from_raw(raw: RawArtifact, name: &str) -> Result<Self, ArtifactError> {
        let contract_name = raw.contract_name.unwrap_or_else(|| name.to_string());
        let (code, links) = match raw.bytecode {
            RawBytecode::Hex(code) => (code, raw.link_references),
            RawBytecode::Object {
                object,
                link_references,
            } => (object, link_references),
        };

        if code.contains("__") {
            let libraries = links
                .into_iter()
                .flat_map(|(source, libs)| {
                    libs.into_keys()
                        .map(move |lib| format!("{source}:{lib}"))
                        .collect::<Vec<_>>()
                })
                .collect();
            return Err(ArtifactError::UnlinkedLibraries {
                name: contract_name,
                libraries,
            });
        }

        let bytecode = hex::decode(code.trim()).map_err(|source| ArtifactError::InvalidBytecode {
            name: contract_name.clone(),
            source,
        })?;
        if bytecode.is_empty() {
            return Err(ArtifactError::AbstractContract(contract_name));
        }

        Ok(Self {
            contract_name,
            source_name: raw.source_name,
            abi: raw.abi,
            bytecode: bytecode.into(),
        })
    }

    pub fn has_constructor_inputs(&self) -> bool {
        self.abi
            .as_array()
            .into_iter()
            .flatten()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("constructor"))
            .any(|ctor| {
                ctor.get("inputs")
                    .and_then(Value::as_array)
                    .is_some_and(|inputs| !inputs.is_empty())
            })
    }

    /// Creation code: the bytecode followed by the ABI encoded constructor
    /// arguments.
    pub fn init_code(&self, constructor_args: &[u8]) -> Result<Bytes, ArtifactError> {
        match (self.has_constructor_inputs(), constructor_args.is_empty()) {
            (true, true) => Err(ArtifactError::MissingConstructorArgs(
                self.contract_name.clone(),
            )),
            (false, false) => Err(ArtifactError::UnexpectedConstructorArgs(
                self.contract_name.clone(),
            )),
            _ => {
                let mut code = self.bytecode.to_vec();
                code.extend_from_slice(constructor_args);
                Ok(code.into())
            }
        }
    }
}

/// Resolves contract names to artifacts below a compiler output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Accepts either a bare contract name or `path/to/Source.sol:Name`.
    pub fn find(&self, name: &str) -> Result<Artifact, ArtifactError> {
        if let Some((source, contract)) = name.rsplit_once(':') {
            let file_name = format!("{contract}.json");
            // Hardhat keeps the source path, Foundry only the source file name.
            let path = Some(self.root.join(source).join(&file_name))
                .filter(|path| path.is_file())
                .or_else(|| {
                    let source_file = Path::new(source).file_name()?;
                    Some(self.root.join(source_file).join(&file_name))
                        .filter(|path| path.is_file())
                })
                .ok_or_else(|| self.not_found(name))?;
            return Artifact::from_file(&path, contract);
        }
        let path = self.search(name)?;
        Artifact::from_file(&path, name)
    }

    fn search(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let file_name = format!("{name}.json");
        let mut found = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir).map_err(|source| ArtifactError::Io {
                path: dir.clone(),
                source,
            })?;
            for entry in entries {
                let entry = entry.map_err(|source| ArtifactError::Io {
                    path: dir.clone(),
                    source,
                })?;
                let file_type = entry.file_type().map_err(|source| ArtifactError::Io {
                    path: entry.path(),
                    source,
                })?;
                let path = entry.path();
                // Symlinked directories are not followed.
                if file_type.is_dir() {
                    if entry.file_name() != "build-info" {
                        pending.push(path);
                    }
                } else if entry.file_name().to_str() == Some(file_name.as_str()) {
                    found.push(path);
                }
            }
        }

        match found.len() {
            0 => Err(self.not_found(name)),
            1 => Ok(found.remove(0)),
            _ => {
                let mut candidates: Vec<String> = found
                    .iter()
                    .filter_map(|path| path.parent()?.strip_prefix(&self.root).ok())
                    .map(|source| format!("{}:{name}", source.display()))
                    .collect();
                candidates.sort();
                Err(ArtifactError::Ambiguous {
                    name: name.to_string(),
                    candidates,
                })
            }
        }
    }

    fn not_found(&self, name: &str) -> ArtifactError {
        ArtifactError::NotFound {
            name: name.to_string(),
            root: self.root.clone(),
        }
    }
}
