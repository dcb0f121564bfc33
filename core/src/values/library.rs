use super::Value;

/// A named set of host-provided values, selected with `library.symbol`.
#[derive(Debug, Clone)]
pub struct Library {
    name: String,
    symbols: hashbrown::HashMap<String, Value>,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: hashbrown::HashMap::new(),
        }
    }

    /// Builder-style registration; a later symbol replaces an earlier one
    /// with the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.symbols.insert(name.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self, name: &str) -> Option<&Value> {
        self.symbols.get(name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }
}
