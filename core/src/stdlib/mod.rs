//! Weft Standard Library
//!
//! Built-in values live in an [`Environment`]: an ordered table whose
//! entry `i` is addressed by the reserved value id `-(i + 1)`. The
//! translator resolves free names against it and the evaluator reads it
//! without any scope lookup.
//!
//! - Prelude: `true`, `false`, `unit`, `print`, `println`, `if`, `struct`,
//!   `tuple`, `import`
//! - Math: the `math` library

use thiserror::Error;

use crate::bytecode::ValueId;
use crate::values::Value;

pub mod math;
pub mod prelude;

pub use math::build_math_package;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("built-in `{0}` is already defined")]
    DuplicateName(String),
}

#[derive(Debug, Clone)]
pub struct Environment {
    entries: Vec<(String, Value)>,
    index: hashbrown::HashMap<String, usize>,
    standard_len: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self::standard()
    }
}

impl Environment {
    /// An environment with no built-ins at all.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            index: hashbrown::HashMap::new(),
            standard_len: 0,
        }
    }

    /// The prelude plus the standard packages.
    pub fn standard() -> Self {
        let mut env = Self::empty();
        // Names below are distinct, so registration cannot fail.
        for (name, value) in prelude::values() {
            env.insert(name.to_string(), value);
        }
        env.insert("math".to_string(), Value::library(build_math_package()));
        env.standard_len = env.entries.len();
        env
    }

    fn insert(&mut self, name: String, value: Value) -> ValueId {
        let index = self.entries.len();
        self.index.insert(name.clone(), index);
        self.entries.push((name, value));
        Self::id_for(index)
    }

    fn id_for(index: usize) -> ValueId {
        -(index as ValueId) - 1
    }

    fn index_for(id: ValueId) -> Option<usize> {
        if id >= 0 {
            return None;
        }
        usize::try_from(-(id as i64) - 1).ok()
    }

    /// Add a host value after the existing entries.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<ValueId, EnvironmentError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(EnvironmentError::DuplicateName(name));
        }
        Ok(self.insert(name, value.into()))
    }

    pub fn id_of(&self, name: &str) -> Option<ValueId> {
        self.index.get(name).copied().map(Self::id_for)
    }

    pub fn get(&self, id: ValueId) -> Option<&Value> {
        self.entries.get(Self::index_for(id)?).map(|(_, value)| value)
    }

    pub fn name_of(&self, id: ValueId) -> Option<&str> {
        self.entries
            .get(Self::index_for(id)?)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether anything was registered beyond the standard table. Ids of
    /// such entries depend on the host, so bytecode referring to them is
    /// not portable between hosts.
    pub fn has_host_entries(&self) -> bool {
        self.entries.len() > self.standard_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_negative_and_dense() {
        let env = Environment::standard();
        assert_eq!(env.id_of("true"), Some(-1));
        for index in 0..env.len() {
            let id = -(index as ValueId) - 1;
            let name = env.name_of(id).unwrap();
            assert_eq!(env.id_of(name), Some(id));
            assert!(env.get(id).is_some());
        }
        assert_eq!(env.get(0), None);
        assert_eq!(env.get(-(env.len() as ValueId) - 1), None);
    }

    #[test]
    fn test_register_appends_and_rejects_duplicates() {
        let mut env = Environment::standard();
        let before = env.len();
        assert!(!env.has_host_entries());

        let id = env.register("answer", 42i64).unwrap();
        assert_eq!(id, -(before as ValueId) - 1);
        assert_eq!(env.get(id), Some(&Value::Int(42)));
        assert!(env.has_host_entries());

        assert_eq!(
            env.register("print", 1i64),
            Err(EnvironmentError::DuplicateName("print".to_string()))
        );
    }
}
