//! Saved delivery addresses.
//!
//! Each owner has at most one default address. Switching the default clears
//! the flag on the other addresses one update at a time before setting the
//! new one; there is no transaction around the sequence, so an interrupted
//! switch can leave zero or several defaults. The next successful switch
//! repairs that state.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::repos::{AddressFields, AddressesRepo, RepoError};
use crate::domain::catalog::{optional_text, require_text};
use crate::domain::entities::AddressRecord;
use crate::domain::error::DomainError;
use crate::domain::ids::RecordId;

#[derive(Debug, Error)]
pub enum AddressError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAddressCommand {
    pub label: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Clone)]
pub struct AddressService {
    repo: Arc<dyn AddressesRepo>,
}

impl AddressService {
    pub fn new(repo: Arc<dyn AddressesRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<AddressRecord>, AddressError> {
        let owner_id = require_text("owner_id", owner_id)?;
        Ok(self.repo.list_addresses(&owner_id).await?)
    }

    /// The first address of an owner always becomes the default.
    pub async fn create(
        &self,
        owner_id: &str,
        command: CreateAddressCommand,
    ) -> Result<AddressRecord, AddressError> {
        let owner_id = require_text("owner_id", owner_id)?;
        let fields = AddressFields {
            label: require_text("label", &command.label)?,
            line1: require_text("line1", &command.line1)?,
            line2: optional_text(command.line2.as_deref()),
            city: require_text("city", &command.city)?,
            postal_code: require_text("postal_code", &command.postal_code)?,
            phone: optional_text(command.phone.as_deref()),
        };

        let existing = self.repo.list_addresses(&owner_id).await?;
        let make_default = command.is_default || existing.is_empty();
        if make_default {
            self.clear_defaults(&owner_id, &existing, None).await?;
        }

        let address = self
            .repo
            .create_address(&owner_id, fields, make_default)
            .await?;
        info!(
            target = "quickcart::application::addresses",
            owner_id = %owner_id,
            address_id = %address.id,
            is_default = address.is_default,
            "Address created"
        );
        Ok(address)
    }

    pub async fn set_default(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<AddressRecord, AddressError> {
        let owner_id = require_text("owner_id", owner_id)?;
        let id = RecordId::parse(id).map_err(|err| DomainError::invalid_id("id", &err))?;
        let target = self
            .repo
            .find_address(&owner_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("address", id))?;

        let existing = self.repo.list_addresses(&owner_id).await?;
        self.clear_defaults(&owner_id, &existing, Some(id)).await?;

        if !target.is_default {
            self.repo.set_default_flag(id, true).await?;
        }

        Ok(AddressRecord {
            is_default: true,
            ..target
        })
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<(), AddressError> {
        let owner_id = require_text("owner_id", owner_id)?;
        let id = RecordId::parse(id).map_err(|err| DomainError::invalid_id("id", &err))?;
        self.repo
            .delete_address(&owner_id, id)
            .await
            .map_err(|err| match err {
                RepoError::NotFound => AddressError::Domain(DomainError::not_found("address", id)),
                other => AddressError::Repo(other),
            })
    }

    async fn clear_defaults(
        &self,
        owner_id: &str,
        addresses: &[AddressRecord],
        keep: Option<RecordId>,
    ) -> Result<(), AddressError> {
        let stale = addresses
            .iter()
            .filter(|address| address.is_default && Some(address.id) != keep);

        for (cleared, address) in stale.enumerate() {
            if let Err(err) = self.repo.set_default_flag(address.id, false).await {
                warn!(
                    target = "quickcart::application::addresses",
                    owner_id,
                    address_id = %address.id,
                    cleared,
                    error = %err,
                    "Default address switch interrupted; owner may have several defaults"
                );
                return Err(err.into());
            }
        }
        Ok(())
    }
}
