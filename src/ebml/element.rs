/// An EBML element id, as the full on-wire bit pattern (marker included).
pub type ElementId = u64;

/// Payload classification of a registered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Unknown,
    Master,
    UInt,
    Int,
    String,
    /// UTF-8 string. Read identically to `String`.
    Unicode,
    Binary,
    Float,
    Date,
}

/// Typed payload of a parsed element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    /// Byte range of the children; the payload itself is not read.
    Master { from: u64, to: u64 },
    UInt(u64),
    Int(i64),
    Float(f64),
    /// Nanoseconds relative to the Matroska epoch.
    Date(i64),
    String(String),
    Binary(Vec<u8>),
    /// Unregistered id; the payload was skipped.
    Unknown,
}

/// A single parsed element: registry identity plus typed payload.
#[derive(Clone, PartialEq)]
pub struct Element {
    pub id: ElementId,
    /// Registry name, or the `"Unknown"` sentinel.
    pub name: &'static str,
    /// Absolute position of the element header in the stream.
    pub pos: u64,
    pub value: ElementValue,
}

impl Element {
    /// Child range of a master element.
    pub fn master_range(&self) -> Option<(u64, u64)> {
        match self.value {
            ElementValue::Master { from, to } => Some((from, to)),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self.value {
            ElementValue::UInt(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            ElementValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            ElementValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match &self.value {
            ElementValue::Binary(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.pos)?;
        match &self.value {
            ElementValue::Master { from, to } => write!(f, " [{}..{}]", from, to),
            ElementValue::UInt(v) => write!(f, " = {}", v),
            ElementValue::Int(v) => write!(f, " = {}", v),
            ElementValue::Float(v) => write!(f, " = {}", v),
            ElementValue::Date(v) => write!(f, " = {}", v),
            ElementValue::String(v) => write!(f, " = {:?}", v),
            ElementValue::Binary(v) => write!(f, " ({} bytes)", v.len()),
            ElementValue::Unknown => Ok(()),
        }
    }
}
