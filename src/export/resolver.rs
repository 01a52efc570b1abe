use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A reference to a host object as seen from the lowered code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    /// The object the compiled class is attached to (`this`, `transform`, `gameObject`).
    This,
    /// An object stored in a field of the compiled class.
    Field(String),
}

/// Maps host objects to the integer target ids used by pointer paths.
///
/// `None` is the not-found sentinel. Lowering records an unresolved diagnostic and leaves the
/// consuming socket disconnected, which validation then reports.
pub trait AddressResolver {
    fn resolve(&self, object: &ObjectRef) -> Option<u32>;
}

impl<F> AddressResolver for F
where
    F: Fn(&ObjectRef) -> Option<u32>,
{
    fn resolve(&self, object: &ObjectRef) -> Option<u32> {
        self(object)
    }
}

/// A fixed table of target ids, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StaticResolver {
    pub self_id: Option<u32>,
    pub objects: AHashMap<String, u32>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_self(mut self, id: u32) -> Self {
        self.self_id = Some(id);
        self
    }

    pub fn with_object(mut self, field: &str, id: u32) -> Self {
        self.objects.insert(field.to_string(), id);
        self
    }
}

impl AddressResolver for StaticResolver {
    fn resolve(&self, object: &ObjectRef) -> Option<u32> {
        match object {
            ObjectRef::This => self.self_id,
            ObjectRef::Field(name) => self.objects.get(name).copied(),
        }
    }
}
