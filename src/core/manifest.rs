//! Purpose: Build `META-INF/MANIFEST.MF` content for plugin jars.
//! Exports: `Manifest`, attribute name constants, `MANIFEST_PATH`.
//! Role: In-memory manifest model; replaces the jar tool's fragment-merge step.
//! Invariants: Attribute names are matched case-insensitively; set replaces.
//! Invariants: Rendered lines are CRLF-terminated and at most 72 bytes long.

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const MANIFEST_VERSION_ATTR: &str = "Manifest-Version";
pub const PLUGIN_CLASS_ATTR: &str = "Plugin-Class";

const MAX_LINE_BYTES: usize = 72;

/// Main-section attributes of a jar manifest, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            attributes: vec![(MANIFEST_VERSION_ATTR.to_string(), "1.0".to_string())],
        }
    }

    pub fn for_plugin_class(class_name: &str) -> Self {
        let mut manifest = Self::new();
        manifest.set(PLUGIN_CLASS_ATTR, class_name);
        manifest
    }

    /// Sets a main attribute, replacing any existing value for the name.
    pub fn set(&mut self, name: &str, value: &str) {
        for (existing, existing_value) in &mut self.attributes {
            if existing.eq_ignore_ascii_case(name) {
                *existing_value = value.to_string();
                return;
            }
        }
        self.attributes.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Renders the main section: one wrapped `Name: value` header per
    /// attribute, terminated by an empty line.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, value) in &self.attributes {
            push_wrapped(&mut out, &format!("{name}: {value}"));
        }
        out.extend_from_slice(b"\r\n");
        out
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

// Continuation lines start with a single space that counts toward the limit.
fn push_wrapped(out: &mut Vec<u8>, header: &str) {
    let mut rest = header;
    let mut first = true;
    while !rest.is_empty() || first {
        let limit = if first {
            MAX_LINE_BYTES
        } else {
            MAX_LINE_BYTES - 1
        };
        let take = if rest.len() <= limit {
            rest.len()
        } else {
            let mut idx = limit;
            while !rest.is_char_boundary(idx) {
                idx -= 1;
            }
            idx
        };
        let (chunk, tail) = rest.split_at(take);
        if !first {
            out.push(b' ');
        }
        out.extend_from_slice(chunk.as_bytes());
        out.extend_from_slice(b"\r\n");
        rest = tail;
        first = false;
    }
}
