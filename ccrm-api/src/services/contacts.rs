//! Contacts subcollection of call centers and prospects

use super::ParentRef;
use ccrm_common::models::{apply_json_updates, Contact, NewContact};
use ccrm_common::{uuid_utils, DocumentStore, Error, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::info;

#[derive(Clone)]
pub struct ContactService {
    store: DocumentStore,
}

impl ContactService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub async fn list(&self, parent: &ParentRef) -> Result<Vec<Contact>> {
        parent.ensure_exists(&self.store).await?;
        self.store.list(&parent.contacts()).await
    }

    pub async fn create(&self, parent: &ParentRef, input: NewContact, now: DateTime<Utc>) -> Result<Contact> {
        parent.ensure_exists(&self.store).await?;
        let contact = input.into_contact(uuid_utils::generate(), now)?;
        self.store.create(&parent.contacts(), &contact.id, &contact).await?;
        info!(parent = %parent.id, contact = %contact.id, "Contact added");
        Ok(contact)
    }

    pub async fn update(
        &self,
        parent: &ParentRef,
        contact_id: &str,
        updates: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<Contact> {
        parent.ensure_exists(&self.store).await?;
        self.store
            .modify(&parent.contacts(), contact_id, |c: &mut Contact| {
                *c = apply_json_updates(c, updates)?;
                c.updated_at = now;
                Ok(())
            })
            .await
    }

    pub async fn delete(&self, parent: &ParentRef, contact_id: &str) -> Result<()> {
        parent.ensure_exists(&self.store).await?;
        let collection = parent.contacts();
        if self.store.delete(&collection, contact_id).await? {
            Ok(())
        } else {
            Err(Error::not_found(&collection, contact_id))
        }
    }
}
