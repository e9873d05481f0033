use std::fmt::Debug;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::entity::{Entity, Links, Reference};
use crate::error::TypeError;
use crate::key::{EntityType, Key};
use crate::specification::{Specification, Status};

/// A typed key that encodes into and decodes from a hierarchical [`Key`].
pub trait ModelKey: Clone + Debug + PartialEq + Eq + Hash + Send + Sync + 'static {
    const ENTITY_TYPE: EntityType;

    fn to_key(&self) -> Key;

    fn from_key(key: &Key) -> Result<Self, TypeError>;
}

/// A typed registry entity.
///
/// Implementors expose their key, specification and status, the non-key
/// [`Links`] they carry on the wire, and the structural rules specific to
/// their shape. Everything generic (conversion, validation, cascading) is
/// derived from this trait.
pub trait Model:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Key: ModelKey;

    const ENTITY_TYPE: EntityType = <Self::Key as ModelKey>::ENTITY_TYPE;

    fn key(&self) -> &Self::Key;

    fn specification(&self) -> &Specification;

    fn set_specification(&mut self, specification: Specification);

    fn status(&self) -> Option<&Status>;

    fn set_status(&mut self, status: Status);

    /// Non-key references carried on the wire.
    fn links(&self) -> Links {
        Links::new()
    }

    /// Rebuild the model from its wire parts.
    fn from_parts(
        key: Self::Key,
        specification: Specification,
        status: Option<Status>,
        links: &Links,
    ) -> Result<Self, TypeError>;

    /// References implied by the key shape rather than carried as links.
    fn derived_references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Keys that must exist for this entity to be valid: the key's direct
    /// parents, then every link, then the derived references.
    fn references(&self) -> Vec<Reference> {
        let key = self.key().to_key();
        let mut refs: Vec<Reference> = key
            .parents()
            .iter()
            .map(|p| Reference::new(format!("key.{}", p.entity_type()), p.clone()))
            .collect();
        for (field, keys) in self.links().iter() {
            refs.extend(keys.iter().map(|k| Reference::new(field, k.clone())));
        }
        refs.extend(self.derived_references());
        refs
    }

    /// Returns `true` if `parent` is one of this entity's direct references.
    fn depends_on(&self, parent: &Key) -> bool {
        self.references().iter().any(|r| r.key == *parent)
    }

    /// Shape rules beyond the generic structural checks, as `(field, reason)`.
    fn check_structure(&self) -> Result<(), (String, String)> {
        Ok(())
    }

    fn to_entity(&self) -> Entity {
        Entity {
            key: self.key().to_key(),
            specification: self.specification().clone(),
            links: self.links(),
            status: self.status().cloned(),
        }
    }

    fn from_entity(entity: &Entity) -> Result<Self, TypeError> {
        let key = Self::Key::from_key(&entity.key)?;
        Self::from_parts(
            key,
            entity.specification.clone(),
            entity.status.clone(),
            &entity.links,
        )
    }
}
