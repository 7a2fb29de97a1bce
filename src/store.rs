//! Persistence collaborator for the progression engine
//!
//! [`CaseStore`] is the contract the core expects from whatever holds the
//! case data. [`SledCaseStore`] is the embedded reference implementation:
//! one flat keyspace with per-record-type prefixes, minicbor-encoded values
//! and batched multi-key writes so a command either fully lands or not at
//! all. Attachments are content-addressed by their sha256 digest.

use crate::action::RecoveryAction;
use crate::audience::Audience;
use crate::document::LegalDocument;
use crate::dossier::Dossier;
use crate::error::StoreError;
use sled::{Batch, Db};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

pub trait CaseStore {
    fn get_case(&self, dossier_id: &str) -> StoreResult<Option<Dossier>>;
    fn put_case(&self, dossier: &Dossier) -> StoreResult<()>;

    fn get_document(&self, document_id: &str) -> StoreResult<Option<LegalDocument>>;
    fn list_documents(&self, dossier_id: &str) -> StoreResult<Vec<LegalDocument>>;
    fn put_document(&self, document: &LegalDocument) -> StoreResult<()>;
    fn delete_document(&self, document_id: &str) -> StoreResult<bool>;

    fn get_action(&self, action_id: &str) -> StoreResult<Option<RecoveryAction>>;
    fn list_actions(&self, dossier_id: &str) -> StoreResult<Vec<RecoveryAction>>;
    fn put_action(&self, action: &RecoveryAction) -> StoreResult<()>;
    fn delete_action(&self, action_id: &str) -> StoreResult<bool>;

    fn list_audiences(&self, dossier_id: &str) -> StoreResult<Vec<Audience>>;
    fn put_audience(&self, audience: &Audience) -> StoreResult<()>;
    fn delete_audience(&self, audience_id: &str) -> StoreResult<bool>;

    fn put_attachment(&self, bytes: &[u8]) -> StoreResult<String>;
    fn get_attachment(&self, reference: &str) -> StoreResult<Option<Vec<u8>>>;
}

// key prefixes; record keys are "<prefix>/<dossier_id>/<record_id>" so a
// case's records sit under one scannable range, with "<ix>/<record_id>"
// entries for id-only lookups
const DOSSIER_PREFIX: &str = "dossier";
const DOCUMENT_PREFIX: &str = "doc";
const DOCUMENT_INDEX_PREFIX: &str = "docix";
const ACTION_PREFIX: &str = "act";
const ACTION_INDEX_PREFIX: &str = "actix";
const AUDIENCE_PREFIX: &str = "aud";
const AUDIENCE_INDEX_PREFIX: &str = "audix";
const ATTACHMENT_PREFIX: &str = "blob";

#[derive(Clone)]
pub struct SledCaseStore {
    instance: Arc<Db>,
}

fn encode<T: minicbor::Encode<()>>(record: &T) -> StoreResult<Vec<u8>> {
    minicbor::to_vec(record).map_err(|e| StoreError::Encode(e.to_string()))
}

fn decode<T: for<'b> minicbor::Decode<'b, ()>>(bytes: &[u8]) -> StoreResult<T> {
    minicbor::decode(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

impl SledCaseStore {
    pub fn new(instance: Arc<Db>) -> Self {
        Self { instance }
    }

    fn get_record<T: for<'b> minicbor::Decode<'b, ()>>(
        &self,
        index_prefix: &str,
        record_prefix: &str,
        record_id: &str,
    ) -> StoreResult<Option<T>> {
        let Some(owner) = self.instance.get(format!("{index_prefix}/{record_id}"))? else {
            return Ok(None);
        };
        let owner = String::from_utf8_lossy(&owner).into_owned();

        match self
            .instance
            .get(format!("{record_prefix}/{owner}/{record_id}"))?
        {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_records<T: for<'b> minicbor::Decode<'b, ()>>(
        &self,
        record_prefix: &str,
        dossier_id: &str,
    ) -> StoreResult<Vec<T>> {
        let mut records = Vec::new();
        for entry in self
            .instance
            .scan_prefix(format!("{record_prefix}/{dossier_id}/"))
        {
            let (_, bytes) = entry?;
            records.push(decode(&bytes)?);
        }
        Ok(records)
    }

    // record and index entry land in one batch
    fn put_record(
        &self,
        index_prefix: &str,
        record_prefix: &str,
        dossier_id: &str,
        record_id: &str,
        bytes: Vec<u8>,
    ) -> StoreResult<()> {
        let mut batch = Batch::default();
        batch.insert(
            format!("{record_prefix}/{dossier_id}/{record_id}").into_bytes(),
            bytes,
        );
        batch.insert(
            format!("{index_prefix}/{record_id}").into_bytes(),
            dossier_id.as_bytes(),
        );
        self.instance.apply_batch(batch)?;
        Ok(())
    }

    fn delete_record(
        &self,
        index_prefix: &str,
        record_prefix: &str,
        record_id: &str,
    ) -> StoreResult<bool> {
        let Some(owner) = self.instance.get(format!("{index_prefix}/{record_id}"))? else {
            return Ok(false);
        };
        let owner = String::from_utf8_lossy(&owner).into_owned();

        let mut batch = Batch::default();
        batch.remove(format!("{record_prefix}/{owner}/{record_id}").into_bytes());
        batch.remove(format!("{index_prefix}/{record_id}").into_bytes());
        self.instance.apply_batch(batch)?;
        Ok(true)
    }
}

impl CaseStore for SledCaseStore {
    fn get_case(&self, dossier_id: &str) -> StoreResult<Option<Dossier>> {
        match self.instance.get(format!("{DOSSIER_PREFIX}/{dossier_id}"))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_case(&self, dossier: &Dossier) -> StoreResult<()> {
        self.instance.insert(
            format!("{DOSSIER_PREFIX}/{}", dossier.id).into_bytes(),
            encode(dossier)?,
        )?;
        Ok(())
    }

    fn get_document(&self, document_id: &str) -> StoreResult<Option<LegalDocument>> {
        self.get_record(DOCUMENT_INDEX_PREFIX, DOCUMENT_PREFIX, document_id)
    }

    fn list_documents(&self, dossier_id: &str) -> StoreResult<Vec<LegalDocument>> {
        self.list_records(DOCUMENT_PREFIX, dossier_id)
    }

    fn put_document(&self, document: &LegalDocument) -> StoreResult<()> {
        self.put_record(
            DOCUMENT_INDEX_PREFIX,
            DOCUMENT_PREFIX,
            &document.dossier_id,
            &document.id,
            encode(document)?,
        )
    }

    fn delete_document(&self, document_id: &str) -> StoreResult<bool> {
        self.delete_record(DOCUMENT_INDEX_PREFIX, DOCUMENT_PREFIX, document_id)
    }

    fn get_action(&self, action_id: &str) -> StoreResult<Option<RecoveryAction>> {
        self.get_record(ACTION_INDEX_PREFIX, ACTION_PREFIX, action_id)
    }

    fn list_actions(&self, dossier_id: &str) -> StoreResult<Vec<RecoveryAction>> {
        self.list_records(ACTION_PREFIX, dossier_id)
    }

    fn put_action(&self, action: &RecoveryAction) -> StoreResult<()> {
        self.put_record(
            ACTION_INDEX_PREFIX,
            ACTION_PREFIX,
            &action.dossier_id,
            &action.id,
            encode(action)?,
        )
    }

    fn delete_action(&self, action_id: &str) -> StoreResult<bool> {
        self.delete_record(ACTION_INDEX_PREFIX, ACTION_PREFIX, action_id)
    }

    fn list_audiences(&self, dossier_id: &str) -> StoreResult<Vec<Audience>> {
        self.list_records(AUDIENCE_PREFIX, dossier_id)
    }

    fn put_audience(&self, audience: &Audience) -> StoreResult<()> {
        self.put_record(
            AUDIENCE_INDEX_PREFIX,
            AUDIENCE_PREFIX,
            &audience.dossier_id,
            &audience.id,
            encode(audience)?,
        )
    }

    fn delete_audience(&self, audience_id: &str) -> StoreResult<bool> {
        self.delete_record(AUDIENCE_INDEX_PREFIX, AUDIENCE_PREFIX, audience_id)
    }

    fn put_attachment(&self, bytes: &[u8]) -> StoreResult<String> {
        let digest = sha256::digest(bytes);
        self.instance
            .insert(format!("{ATTACHMENT_PREFIX}/{digest}").into_bytes(), bytes)?;
        Ok(digest)
    }

    fn get_attachment(&self, reference: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self
            .instance
            .get(format!("{ATTACHMENT_PREFIX}/{reference}"))?
            .map(|bytes| bytes.to_vec()))
    }
}
