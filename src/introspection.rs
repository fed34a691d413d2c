//! GraphQL introspection: turns a raw `__schema` response into a browsable model.

use serde::Deserialize;
use serde_json::Value;

use crate::constants::SCHEMA_SUMMARY_LIMIT;
use crate::models::ResponseEnvelope;

/// Kinds kept from the schema. Scalars, enums and unions are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Object,
    Interface,
    InputObject,
}

impl TypeKind {
    pub fn from_introspection(kind: &str) -> Option<TypeKind> {
        match kind {
            "OBJECT" => Some(TypeKind::Object),
            "INTERFACE" => Some(TypeKind::Interface),
            "INPUT_OBJECT" => Some(TypeKind::InputObject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Object => "OBJECT",
            TypeKind::Interface => "INTERFACE",
            TypeKind::InputObject => "INPUT_OBJECT",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub type_repr: String,
    pub description: String,
    /// Rendered argument list, e.g. `id: ID!, first: Int`
    pub args: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeInfo {
    pub name: String,
    pub kind: TypeKind,
    pub description: String,
    pub fields: Vec<FieldInfo>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntrospectionResult {
    pub success: bool,
    pub status: String,
    pub details: String,
    pub types: Vec<TypeInfo>,
}

impl IntrospectionResult {
    fn failure(status: impl Into<String>, details: impl Into<String>) -> Self {
        IntrospectionResult {
            success: false,
            status: status.into(),
            details: details.into(),
            types: Vec::new(),
        }
    }
}

/// A `type` node of the introspection response, possibly wrapped.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TypeRef {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "ofType")]
    pub of_type: Option<Box<TypeRef>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawArg {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    type_ref: Option<TypeRef>,
}

#[derive(Debug, Default, Deserialize)]
struct RawField {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    args: Option<Vec<RawArg>>,
    #[serde(default, rename = "type")]
    type_ref: Option<TypeRef>,
}

#[derive(Debug, Default, Deserialize)]
struct RawType {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    fields: Option<Vec<RawField>>,
}

/// Interpret an introspection response.
///
/// Checks run in a fixed order: JSON parse, HTTP status, GraphQL `errors`,
/// presence of types, then the kind filter.
pub fn build_introspection_result(response: &ResponseEnvelope) -> IntrospectionResult {
    let payload: Value = match serde_json::from_str(&response.text) {
        Ok(value) => value,
        Err(e) => {
            return IntrospectionResult::failure(
                format!("Could not parse JSON: {}", e),
                response.text.clone(),
            )
        }
    };

    if response.status != 200 {
        return IntrospectionResult::failure(
            format!("HTTP {}", response.status),
            response.text.clone(),
        );
    }

    if let Some(errors) = payload.get("errors").filter(|e| is_truthy(e)) {
        let details = serde_json::to_string_pretty(errors).unwrap_or_else(|_| errors.to_string());
        return IntrospectionResult::failure("GraphQL errors", details);
    }

    let raw_types: Vec<RawType> = payload
        .get("data")
        .and_then(|d| d.get("__schema"))
        .and_then(|s| s.get("types"))
        .cloned()
        .and_then(|t| serde_json::from_value(t).ok())
        .unwrap_or_default();
    if raw_types.is_empty() {
        return IntrospectionResult::failure("No types returned from schema.", response.text.clone());
    }

    let types = collect_types(raw_types);
    if types.is_empty() {
        return IntrospectionResult::failure(
            "Schema loaded but no object/interface/input types.",
            response.text.clone(),
        );
    }

    let status = format!("Schema loaded: {} types.", types.len());
    let names: Vec<&str> = types
        .iter()
        .take(SCHEMA_SUMMARY_LIMIT)
        .map(|t| t.name.as_str())
        .collect();
    let details = format!("{}\n\n{}", status, names.join("\n"));
    IntrospectionResult {
        success: true,
        status,
        details,
        types,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Number(_) => true,
    }
}

fn collect_types(raw: Vec<RawType>) -> Vec<TypeInfo> {
    raw.into_iter()
        .filter_map(|t| {
            let name = t.name.filter(|n| !n.is_empty() && !n.starts_with("__"))?;
            let kind = t.kind.as_deref().and_then(TypeKind::from_introspection)?;
            Some(TypeInfo {
                name,
                kind,
                description: t.description.unwrap_or_default(),
                fields: collect_fields(t.fields.unwrap_or_default()),
            })
        })
        .collect()
}

fn collect_fields(raw: Vec<RawField>) -> Vec<FieldInfo> {
    raw.into_iter()
        .filter_map(|f| {
            let name = f.name.filter(|n| !n.is_empty())?;
            let args = f
                .args
                .unwrap_or_default()
                .iter()
                .filter_map(|arg| {
                    let arg_name = arg.name.as_deref().filter(|n| !n.is_empty())?;
                    Some(format!("{}: {}", arg_name, type_repr(arg.type_ref.as_ref())))
                })
                .collect::<Vec<_>>()
                .join(", ");
            Some(FieldInfo {
                name,
                type_repr: type_repr(f.type_ref.as_ref()),
                description: f.description.unwrap_or_default(),
                args,
            })
        })
        .collect()
}

/// Render a possibly wrapped type, e.g. `NON_NULL(LIST(String))` as `[String]!`.
pub fn type_repr(node: Option<&TypeRef>) -> String {
    let Some(node) = node else {
        return "Unknown".to_string();
    };
    if let Some(inner) = node.of_type.as_deref() {
        let inner = type_repr(Some(inner));
        return match node.kind.as_deref() {
            Some("NON_NULL") => format!("{}!", inner),
            Some("LIST") => format!("[{}]", inner),
            _ => inner,
        };
    }
    node.name
        .as_deref()
        .filter(|n| !n.is_empty())
        .or(node.kind.as_deref().filter(|k| !k.is_empty()))
        .unwrap_or("Unknown")
        .to_string()
}

/// Data attached to a schema tree node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeData {
    pub description: String,
    pub type_repr: String,
    pub args: String,
}

impl NodeData {
    /// Text for the details pane when the node is selected.
    pub fn details(&self, label: &str) -> String {
        let mut parts = Vec::new();
        if !self.type_repr.is_empty() {
            parts.push(format!("**Type**: {}", self.type_repr));
        }
        if !self.args.is_empty() {
            parts.push(format!("**Args**: {}", self.args));
        }
        if !self.description.is_empty() {
            parts.push(self.description.clone());
        }
        if parts.is_empty() {
            label.to_string()
        } else {
            parts.join("\n\n")
        }
    }
}

/// Anything that can take a labelled node and hand back a place for its children.
pub trait TreeSink {
    fn add_node(&mut self, label: String, data: NodeData) -> &mut dyn TreeSink;
}

/// Emit one parent per type and one child per field. Returns the number of parents.
pub fn add_types_to_tree(sink: &mut dyn TreeSink, types: &[TypeInfo]) -> usize {
    let mut added = 0;
    for type_info in types {
        let parent = sink.add_node(
            format!("{} ({})", type_info.name, type_info.kind.as_str().to_lowercase()),
            NodeData {
                description: type_info.description.clone(),
                ..NodeData::default()
            },
        );
        for field in &type_info.fields {
            parent.add_node(
                format!("{}: {}", field.name, field.type_repr),
                NodeData {
                    description: field.description.clone(),
                    type_repr: field.type_repr.clone(),
                    args: field.args.clone(),
                },
            );
        }
        added += 1;
    }
    added
}
