//! Recovery actions and cumulative amount reconciliation
//!
//! The action ledger is the single authoritative source for recovered
//! amounts; `Dossier::montant_recupere` is a projection recomputed from it
//! after every mutation.

use crate::dossier::{DossierStatut, TimeStamp};
use crate::utils;
use chrono::Utc;

/// The four seizure categories a huissier can record.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    #[n(0)]
    SaisieAttribution,
    #[n(1)]
    SaisieVente,
    #[n(2)]
    SaisieImmobiliere,
    #[n(3)]
    SaisieRemuneration,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct RecoveryAction {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub dossier_id: String,
    #[n(2)]
    pub action_type: ActionType,
    #[n(3)]
    pub montant_recupere: u64,
    // claim minus cumulative recovered at the time of the action, clamped to zero
    #[n(4)]
    pub montant_restant: u64,
    // advisory hint from the huissier, never applied to the dossier by the engine
    #[n(5)]
    pub etat_resultant: DossierStatut,
    #[n(6)]
    pub date_action: TimeStamp<Utc>,
    #[n(7)]
    pub attachment: Option<String>,
    #[n(8)]
    pub huissier_name: String,
}

impl ActionType {
    pub fn wire_name(&self) -> &'static str {
        match self {
            ActionType::SaisieAttribution => "SAISIE_ATTRIBUTION",
            ActionType::SaisieVente => "SAISIE_VENTE",
            ActionType::SaisieImmobiliere => "SAISIE_IMMOBILIERE",
            ActionType::SaisieRemuneration => "SAISIE_REMUNERATION",
        }
    }
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "SAISIE_ATTRIBUTION" => Some(ActionType::SaisieAttribution),
            "SAISIE_VENTE" => Some(ActionType::SaisieVente),
            "SAISIE_IMMOBILIERE" => Some(ActionType::SaisieImmobiliere),
            "SAISIE_REMUNERATION" => Some(ActionType::SaisieRemuneration),
            _ => None,
        }
    }
}

impl RecoveryAction {
    pub fn new(
        dossier_id: &str,
        action_type: ActionType,
        huissier_name: &str,
        montant_recupere: u64,
        montant_restant: u64,
        etat_resultant: DossierStatut,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            id: utils::new_action_id()?,
            dossier_id: dossier_id.to_string(),
            action_type,
            montant_recupere,
            montant_restant,
            etat_resultant,
            date_action: TimeStamp::new(),
            attachment: None,
            huissier_name: huissier_name.to_string(),
        })
    }
    pub fn set_attachment(mut self, reference: String) -> Self {
        self.attachment = Some(reference);
        self
    }
}

/// Sum of recovered amounts over the ledger, optionally excluding one action
/// (its own prior contribution is dropped while recomputing an edit).
pub fn cumulative_recovered(actions: &[RecoveryAction], excluding: Option<&str>) -> u64 {
    actions
        .iter()
        .filter(|action| excluding != Some(action.id.as_str()))
        .map(|action| action.montant_recupere)
        .sum()
}

/// Remaining claim after recovery, clamped to zero on over-recovery.
pub fn remaining_after(montant_creance: u64, cumulative: u64) -> u64 {
    montant_creance.saturating_sub(cumulative)
}
