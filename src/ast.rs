//! Contract AST queries
//!
//! The compiler AST is a polymorphic tree; the tracer only cares about a
//! handful of node kinds. The tree is modeled as an internally tagged
//! enum over `nodeType` with a catch-all variant for everything else:
//! function definitions never nest below the kinds matched here, so the
//! ignored nodes are never traversed.

use alloy::primitives::keccak256;
use serde::Deserialize;
use std::str::FromStr;

/// AST node, discriminated by the compiler's `nodeType` tag
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum AstNode {
    SourceUnit(SourceUnitNode),
    ContractDefinition(ContractDefinitionNode),
    FunctionDefinition(FunctionDefinition),
    /// Any node kind the tracer does not inspect
    #[serde(other)]
    Other,
}

/// Root of a compilation unit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceUnitNode {
    #[serde(default)]
    pub nodes: Vec<AstNode>,
}

/// Contract, interface or library definition
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDefinitionNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<AstNode>,
}

/// Function definition with the attributes selector resolution needs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    #[serde(default)]
    pub name: String,
    pub visibility: Visibility,
    #[serde(default)]
    pub kind: FunctionKind,
    pub src: SourceSpan,
    #[serde(default)]
    pub parameters: ParameterList,
}

/// Function visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    External,
    Internal,
    Private,
}

/// Function kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    #[default]
    Function,
    Constructor,
    Fallback,
    Receive,
}

/// Ordered formal parameter list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParameterList {
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// One formal parameter
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub type_descriptions: TypeDescriptions,
}

/// Type metadata attached to parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptions {
    #[serde(default)]
    pub type_string: String,
}

/// Source span in `"start:length:file"` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct SourceSpan {
    pub start: usize,
    pub length: usize,
    pub file: i64,
}

impl FromStr for SourceSpan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let start = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| format!("invalid source span {s:?}"))?;
        let length = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| format!("invalid source span {s:?}"))?;
        let file = match parts.next() {
            None => 0,
            Some(p) => p.parse().map_err(|_| format!("invalid source span {s:?}"))?,
        };
        Ok(SourceSpan { start, length, file })
    }
}

impl TryFrom<String> for SourceSpan {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Dispatch key of a function
///
/// Normal functions hash to a 4-byte calldata selector. The fallback
/// handler answers the empty selector and the receive handler is a
/// distinguished sentinel picked for plain value transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionSelector {
    Hash([u8; 4]),
    Fallback,
    Receive,
}

impl AstNode {
    /// All function definitions reachable from this node.
    pub fn functions(&self) -> Vec<&FunctionDefinition> {
        let mut out = Vec::new();
        self.collect_functions(&mut out);
        out
    }

    /// Functions addressable from outside the contract: public and
    /// external functions plus the fallback and receive handlers.
    pub fn public_functions(&self) -> Vec<&FunctionDefinition> {
        self.functions()
            .into_iter()
            .filter(|f| match f.kind {
                FunctionKind::Fallback | FunctionKind::Receive => true,
                FunctionKind::Function => {
                    matches!(f.visibility, Visibility::Public | Visibility::External)
                }
                FunctionKind::Constructor => false,
            })
            .collect()
    }

    /// Functions addressable only through internal jumps.
    pub fn private_functions(&self) -> Vec<&FunctionDefinition> {
        self.functions()
            .into_iter()
            .filter(|f| {
                f.kind == FunctionKind::Function
                    && matches!(f.visibility, Visibility::Internal | Visibility::Private)
            })
            .collect()
    }

    fn collect_functions<'a>(&'a self, out: &mut Vec<&'a FunctionDefinition>) {
        match self {
            AstNode::SourceUnit(unit) => {
                for node in &unit.nodes {
                    node.collect_functions(out);
                }
            }
            AstNode::ContractDefinition(contract) => {
                for node in &contract.nodes {
                    node.collect_functions(out);
                }
            }
            AstNode::FunctionDefinition(func) => out.push(func),
            AstNode::Other => {}
        }
    }
}

impl FunctionDefinition {
    /// Canonical ABI signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self
            .parameters
            .parameters
            .iter()
            .map(|p| canonical_type(&p.type_descriptions.type_string))
            .collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// Dispatch selector derived from the canonical signature.
    pub fn selector(&self) -> FunctionSelector {
        match self.kind {
            FunctionKind::Fallback => FunctionSelector::Fallback,
            FunctionKind::Receive => FunctionSelector::Receive,
            _ => {
                let digest = keccak256(self.signature().as_bytes());
                FunctionSelector::Hash([digest[0], digest[1], digest[2], digest[3]])
            }
        }
    }
}

/// Canonical ABI form of an AST type string.
///
/// `uint`/`int` widen to their 256-bit forms, `address payable` and
/// contract types collapse to `address`, array suffixes are preserved.
pub fn canonical_type(type_string: &str) -> String {
    let type_string = type_string.trim();
    let (base, suffix) = match type_string.find('[') {
        Some(i) => (type_string[..i].trim(), &type_string[i..]),
        None => (type_string, ""),
    };

    let canonical = if base == "uint" {
        "uint256"
    } else if base == "int" {
        "int256"
    } else if base == "address payable" || base.starts_with("contract ") {
        "address"
    } else {
        base
    };

    format!("{canonical}{suffix}")
}
