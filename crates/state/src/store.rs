//! Typed key/value store over the peer databag.

use tracing::{debug, warn};

use crate::bag::DataBag;
use crate::error::{Error, Result};
use crate::value::StateValue;

/// Keys the operator keeps in the shared state.
pub mod keys {
    /// Generated directory administrator password.
    pub const BIND_PASSWORD: &str = "bind_password";
    /// Directory base DN, mirrored from configuration.
    pub const BASE_DN: &str = "base_dn";
}

/// Locates the databag backing the shared state.
///
/// Returns `None` while the bag does not exist (no peer relation yet).
pub trait BagResolver {
    /// Resolve the bag for reading.
    fn resolve(&self) -> Option<&DataBag>;
}

/// A resolver that can also hand out the bag for writing.
pub trait BagResolverMut: BagResolver {
    /// Resolve the bag for writing.
    fn resolve_mut(&mut self) -> Option<&mut DataBag>;
}

impl BagResolver for Option<DataBag> {
    fn resolve(&self) -> Option<&DataBag> {
        self.as_ref()
    }
}

impl BagResolverMut for Option<DataBag> {
    fn resolve_mut(&mut self) -> Option<&mut DataBag> {
        self.as_mut()
    }
}

impl<R: BagResolver + ?Sized> BagResolver for &R {
    fn resolve(&self) -> Option<&DataBag> {
        (**self).resolve()
    }
}

impl<R: BagResolver + ?Sized> BagResolver for &mut R {
    fn resolve(&self) -> Option<&DataBag> {
        (**self).resolve()
    }
}

impl<R: BagResolverMut + ?Sized> BagResolverMut for &mut R {
    fn resolve_mut(&mut self) -> Option<&mut DataBag> {
        (**self).resolve_mut()
    }
}

/// Application state shared by every unit through the peer relation.
///
/// Reads go through whatever bag the resolver yields; before the peer
/// relation exists every read is absent and [`SharedState::is_ready`] is
/// false. Writes are reserved for the leader: a view built with
/// [`SharedState::read_only`] rejects them.
#[derive(Debug)]
pub struct SharedState<R> {
    resolver: R,
    writable: bool,
}

impl<R: BagResolver> SharedState<R> {
    /// Create a writable view (the leader's).
    pub const fn new(resolver: R) -> Self {
        Self {
            resolver,
            writable: true,
        }
    }

    /// Create a view that rejects writes (a follower's).
    pub const fn read_only(resolver: R) -> Self {
        Self {
            resolver,
            writable: false,
        }
    }

    /// Create the view appropriate for a unit's leadership.
    pub const fn for_unit(resolver: R, leader: bool) -> Self {
        Self {
            resolver,
            writable: leader,
        }
    }

    /// Whether the backing bag can currently be resolved.
    pub fn is_ready(&self) -> bool {
        self.resolver.resolve().is_some()
    }

    /// Whether this view may modify the state.
    pub const fn is_writable(&self) -> bool {
        self.writable
    }

    /// Read and decode the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored text is not valid encoded state.
    pub fn get(&self, key: &str) -> Result<Option<StateValue>> {
        self.resolver
            .resolve()
            .and_then(|bag| bag.get(key))
            .map(|raw| StateValue::decode(key, raw))
            .transpose()
    }

    /// Read a value that must be a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be decoded or is not a string.
    pub fn get_str(&self, key: &str) -> Result<Option<String>> {
        match self.get(key)? {
            None | Some(StateValue::Null) => Ok(None),
            Some(StateValue::Str(value)) => Ok(Some(value)),
            Some(other) => Err(Error::unexpected_type(key, "string", other.kind())),
        }
    }

    /// Generated administrator password, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value is not a string.
    pub fn bind_password(&self) -> Result<Option<String>> {
        self.get_str(keys::BIND_PASSWORD)
    }

    /// Directory base DN, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value is not a string.
    pub fn base_dn(&self) -> Result<Option<String>> {
        self.get_str(keys::BASE_DN)
    }

    /// Give back the resolver.
    pub fn into_inner(self) -> R {
        self.resolver
    }
}

impl<R: BagResolverMut> SharedState<R> {
    /// Encode and store `value` under `key`.
    ///
    /// Does nothing while the state is not ready.
    ///
    /// # Errors
    ///
    /// Returns an error if this view is read-only or the value cannot be
    /// encoded.
    pub fn set(&mut self, key: &str, value: impl Into<StateValue>) -> Result<()> {
        if !self.writable {
            return Err(Error::not_leader(key));
        }

        let encoded = value.into().encode(key)?;
        match self.resolver.resolve_mut() {
            Some(bag) => {
                debug!(key, "setting shared state");
                bag.insert(key, encoded);
            }
            None => warn!(key, "shared state not ready, dropping write"),
        }
        Ok(())
    }

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if this view is read-only.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        if !self.writable {
            return Err(Error::not_leader(key));
        }

        let removed = self
            .resolver
            .resolve_mut()
            .and_then(|bag| bag.remove(key));
        if removed.is_some() {
            debug!(key, "removed shared state");
        }
        Ok(())
    }

    /// Persist the administrator password.
    ///
    /// # Errors
    ///
    /// Returns an error if this view is read-only.
    pub fn set_bind_password(&mut self, password: &str) -> Result<()> {
        self.set(keys::BIND_PASSWORD, password)
    }

    /// Persist the directory base DN.
    ///
    /// # Errors
    ///
    /// Returns an error if this view is read-only.
    pub fn set_base_dn(&mut self, base_dn: &str) -> Result<()> {
        self.set(keys::BASE_DN, base_dn)
    }
}
