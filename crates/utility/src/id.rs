use std::{borrow::Cow, fmt, hash, marker::PhantomData, str::FromStr};

use schemars::{
    gen::SchemaGenerator,
    schema::{InstanceType, Schema, SchemaObject},
    JsonSchema,
};
use serde::{Deserialize, Serialize};

pub trait HasId {
    type IdType;
}

/// An id which remembers what it identifies, so a vehicle id can not be passed
/// where a stop id is expected.
pub struct Id<T: HasId>(T::IdType, PhantomData<T>);

impl<T: HasId> Id<T> {
    pub fn new(inner: T::IdType) -> Self {
        Self(inner, PhantomData)
    }
}

impl<T: HasId> Id<T>
where
    T::IdType: Clone,
{
    pub fn raw(&self) -> T::IdType {
        self.0.clone()
    }
}

pub trait IdWrapper<T: HasId>
where
    T::IdType: Clone,
{
    type ResultWrapper<R>;

    fn raw(self) -> Self::ResultWrapper<T::IdType>;
}

impl<T: HasId> IdWrapper<T> for Option<Id<T>>
where
    T::IdType: Clone,
{
    type ResultWrapper<R> = Option<R>;

    fn raw(self) -> Self::ResultWrapper<T::IdType> {
        self.map(|id| id.raw())
    }
}

impl<T: HasId> IdWrapper<T> for Option<&Id<T>>
where
    T::IdType: Clone,
{
    type ResultWrapper<R> = Option<R>;

    fn raw(self) -> Self::ResultWrapper<T::IdType> {
        self.map(|id| id.raw())
    }
}

impl<T: HasId> IdWrapper<T> for &[Id<T>]
where
    T::IdType: Clone,
{
    type ResultWrapper<R> = Vec<R>;

    fn raw(self) -> Self::ResultWrapper<T::IdType> {
        self.iter().map(|id| id.raw()).collect()
    }
}

impl<T: HasId> FromStr for Id<T>
where
    T::IdType: FromStr,
{
    type Err = <T::IdType as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Id::new)
    }
}

impl<T: HasId> Default for Id<T>
where
    T::IdType: Default,
{
    fn default() -> Self {
        Self(Default::default(), PhantomData)
    }
}

impl<T: HasId> fmt::Debug for Id<T>
where
    T::IdType: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.0).finish()
    }
}

impl<T: HasId> fmt::Display for Id<T>
where
    T::IdType: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: HasId> Clone for Id<T>
where
    T::IdType: Clone,
{
    fn clone(&self) -> Self {
        Self(self.0.clone(), PhantomData)
    }
}

impl<T: HasId> Copy for Id<T> where T::IdType: Copy {}

impl<T: HasId> hash::Hash for Id<T>
where
    T::IdType: hash::Hash,
{
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<T: HasId> PartialEq for Id<T>
where
    T::IdType: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl<T: HasId> Eq for Id<T> where T::IdType: Eq {}

impl<T: HasId> PartialOrd for Id<T>
where
    T::IdType: PartialOrd,
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl<T: HasId> Ord for Id<T>
where
    T::IdType: Ord,
{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<'de, T: HasId> Deserialize<'de> for Id<T>
where
    T::IdType: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        T::IdType::deserialize(deserializer).map(|id| Id::new(id))
    }
}

impl<T: HasId> Serialize for Id<T>
where
    T::IdType: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T: HasId + JsonSchema> JsonSchema for Id<T>
where
    T::IdType: Serialize,
{
    fn schema_name() -> String {
        // Exclude the module path to make the name in generated schemas clearer.
        format!("{}Id", T::schema_name())
    }

    fn schema_id() -> Cow<'static, str> {
        // Include the module, in case a type with the same name is in another module/crate
        Cow::Borrowed(concat!(module_path!(), "::Id"))
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::Integer.into()),
            format: Some("int32".to_owned()),
            ..Default::default()
        }
        .into()
    }
}
