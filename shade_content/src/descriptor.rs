//! Typed view of the `Graph.json` document that Shade writes next to every generated shader.
//!
//! Only the parts of the document that are needed to configure materials are decoded. Fields
//! that are missing fall back to their defaults and unknown fields are ignored, so that older
//! and newer versions of the document can be read. Only documents that are not valid JSON or
//! that contain values of the wrong type are rejected.

use serde::Deserialize;
use shade_shared::serde_json;

use crate::{AssetKey, Error, Result};

/// Ordered list of the nodes of a shader graph.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphDescriptor {
    pub nodes: Vec<Node>,
}

impl GraphDescriptor {
    /// Decodes the descriptor from the raw bytes of the document. `asset_key` is only used for error reporting.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shade_content::{descriptor::{GraphDescriptor, NodeKind}, AssetKey};
    /// let json = br#"{ "nodes": [ { "name": "Texture", "options": { "userLabel": "Base Color" } } ] }"#;
    /// let descriptor = GraphDescriptor::parse(&AssetKey::new("Foo/Graph.json"), json).unwrap();
    /// assert_eq!(descriptor.nodes[0].kind, NodeKind::Texture);
    /// ```
    pub fn parse(asset_key: &AssetKey, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|err| Error::MalformedDescriptor {
            path: asset_key.clone(),
            message: err.to_string(),
        })
    }
}

/// A single node of the graph. The kind is stored in the `name` field of the document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Node {
    #[serde(rename = "name")]
    pub kind: NodeKind,
    pub options: Option<Options>,
}

impl Node {
    /// Returns the label under which the node is exposed as a material property, if any.
    pub fn user_label(&self) -> Option<&str> {
        self.options.as_ref().and_then(Options::user_label)
    }
}

/// Category of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum NodeKind {
    Texture,
    Gradient,
    Bake,
    Tiler,
    /// Every node kind that doesn't produce an image. The name is kept for logging.
    Other(String),
    #[default]
    Unnamed,
}

impl NodeKind {
    /// Returns `true` for nodes that ultimately produce an image that the material has to sample.
    pub fn is_texture_like(&self) -> bool {
        match self {
            NodeKind::Texture | NodeKind::Gradient | NodeKind::Bake | NodeKind::Tiler => true,
            NodeKind::Other(_) | NodeKind::Unnamed => false,
        }
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Texture" => NodeKind::Texture,
            "Gradient" => NodeKind::Gradient,
            "Bake" => NodeKind::Bake,
            "Tiler" => NodeKind::Tiler,
            "" => NodeKind::Unnamed,
            _ => NodeKind::Other(value),
        }
    }
}

/// Options the user configured on a node in Shade.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub user_label: Option<String>,
    pub value: Option<String>,
    pub wrap_mode: Option<RequestedWrapMode>,
    pub filter_mode: Option<RequestedFilterMode>,
    pub is_normal_map: bool,
    pub generate_mipmaps: bool,
}

impl Options {
    /// Returns the label of the node. An empty label counts as no label.
    pub fn user_label(&self) -> Option<&str> {
        self.user_label.as_deref().filter(|label| !label.is_empty())
    }

    /// Returns the name of the image that backs the node: the explicit value if there is one, otherwise the label.
    pub fn texture_name(&self) -> Option<&str> {
        self.value
            .as_deref()
            .filter(|value| !value.is_empty())
            .or_else(|| self.user_label())
    }
}

/// Wrap mode as written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RequestedWrapMode {
    Repeat,
    Clamp,
    Mirror,
    Unrecognized(String),
}

impl From<String> for RequestedWrapMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "repeat" => RequestedWrapMode::Repeat,
            "clamp" => RequestedWrapMode::Clamp,
            "mirror" => RequestedWrapMode::Mirror,
            _ => RequestedWrapMode::Unrecognized(value),
        }
    }
}

/// Filter mode as written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RequestedFilterMode {
    Point,
    Linear,
    Unrecognized(String),
}

impl From<String> for RequestedFilterMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "point" => RequestedFilterMode::Point,
            "linear" => RequestedFilterMode::Linear,
            _ => RequestedFilterMode::Unrecognized(value),
        }
    }
}
