use std::fmt;
use std::marker::PhantomData;

use uuid::Uuid;

/// Integer identifier tagged with the kind of thing it names.
///
/// The tag only exists at compile time, so a `FunctionId` can never be passed
/// where another kind of id is expected even though both are plain `u32`.
pub struct Id<T> {
    pub value: u32,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: u32) -> Self {
        Id { value, _marker: PhantomData }
    }
}

// Manual impls: derives would require the tag itself to implement them.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<Id<T>> for u32 {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.value
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {}", display_name, self.value)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct FunctionTag;

pub type FunctionId = Id<FunctionTag>;

/// Hands out function ids for one scenario: 0, 1, 2, ... never reused.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> FunctionId {
        let id = FunctionId::new(self.next);
        self.next += 1;
        id
    }
}

/// Identity of one scenario instance inside a build session.
///
/// Handles and parameter references carry the scope they were minted in so a
/// scenario can refuse references that belong to another scenario. The scope is
/// never serialized.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct ScopeId(Uuid);

impl ScopeId {
    pub fn new() -> Self {
        ScopeId(Uuid::new_v4())
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
