//! Boundary normalization for remote case payloads
//!
//! The upstream intake system historically emitted the bailiff stage under
//! two key spellings, `etape_huissier` and `etapeHuissier`. Both are
//! accepted here and folded into the canonical [`Stage`] before anything
//! else sees the dossier; core logic never branches on raw key names.

use crate::dossier::{Departement, Dossier, DossierStatut};
use crate::error::WorkflowError;
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DossierPayload {
    pub id: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(alias = "montantCreance")]
    pub montant_creance: u64,
    #[serde(default, alias = "montantRecupere")]
    pub montant_recupere: u64,
    #[serde(default, alias = "dateCloture")]
    pub date_cloture: Option<DateTime<Utc>>,
    #[serde(default)]
    pub statut: Option<String>,
    #[serde(default)]
    pub huissier: Option<String>,
    #[serde(default, alias = "etapeHuissier")]
    pub etape_huissier: Option<String>,
    #[serde(default)]
    pub departement: Option<String>,
}

pub fn decode_dossier(payload: &[u8]) -> Result<Dossier, WorkflowError> {
    let payload: DossierPayload = serde_json::from_slice(payload)
        .map_err(|e| WorkflowError::Validation(format!("malformed dossier payload: {e}")))?;
    payload.try_into()
}

impl TryFrom<DossierPayload> for Dossier {
    type Error = WorkflowError;

    fn try_from(payload: DossierPayload) -> Result<Self, Self::Error> {
        if payload.id.trim().is_empty() {
            return Err(WorkflowError::Validation("dossier id".to_string()));
        }

        // absent stage means the dossier is fresh; a present but unknown
        // value is malformed data and must not be silently defaulted
        let etape = match payload.etape_huissier.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(Stage::from_wire(raw).ok_or_else(|| {
                WorkflowError::Validation(format!("unknown etape_huissier value: {raw}"))
            })?),
        };

        let statut = match payload.statut.as_deref() {
            None | Some("") => DossierStatut::EnCours,
            Some(raw) => DossierStatut::from_wire(raw)
                .ok_or_else(|| WorkflowError::Validation(format!("unknown statut value: {raw}")))?,
        };

        let departement = match payload.departement.as_deref() {
            None | Some("") => Departement::Juridique,
            Some(raw) => Departement::from_wire(raw).ok_or_else(|| {
                WorkflowError::Validation(format!("unknown departement value: {raw}"))
            })?,
        };

        Ok(Dossier {
            id: payload.id,
            reference: payload.reference.unwrap_or_default(),
            montant_creance: payload.montant_creance,
            montant_recupere: payload.montant_recupere,
            date_cloture: payload.date_cloture.map(Into::into),
            statut,
            huissier: payload.huissier.filter(|name| !name.trim().is_empty()),
            etape,
            departement,
        })
    }
}
