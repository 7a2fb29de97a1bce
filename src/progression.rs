//! Per-request case context and progression predicates
//!
//! Everything a caller needs to decide "what can happen next" is loaded into
//! a [`CaseContext`] up front and the predicates below stay pure over it.
//! The UI uses them for affordances; the service re-checks the same logic
//! before every mutation.

use crate::action::{self, RecoveryAction};
use crate::audience::Audience;
use crate::document::LegalDocument;
use crate::dossier::Dossier;
use crate::stage::Stage;

#[derive(Debug, Clone)]
pub struct CaseContext {
    pub dossier: Dossier,
    pub documents: Vec<LegalDocument>,
    pub actions: Vec<RecoveryAction>,
    pub audiences: Vec<Audience>,
}

impl CaseContext {
    pub fn new(
        dossier: Dossier,
        documents: Vec<LegalDocument>,
        actions: Vec<RecoveryAction>,
        audiences: Vec<Audience>,
    ) -> Self {
        Self {
            dossier,
            documents,
            actions,
            audiences,
        }
    }

    pub fn can_create_document(&self) -> bool {
        !self.dossier.is_closed() && self.dossier.stage() == Stage::EnAttenteDocuments
    }

    pub fn can_create_action(&self) -> bool {
        !self.dossier.is_closed() && self.dossier.stage() == Stage::EnActions
    }

    pub fn can_create_audience(&self) -> bool {
        !self.dossier.is_closed() && self.dossier.stage() == Stage::EnAudiences
    }

    /// Completeness rule for "passer aux actions": at least one document on file.
    pub fn can_advance_to_actions(&self) -> bool {
        !self.documents.is_empty()
    }

    /// Completeness rule for "passer aux audiences": at least one recorded action.
    pub fn can_advance_to_audiences(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Finance handoff is stage-independent: one action or one audience on
    /// file is enough, whatever the current stage.
    pub fn can_hand_to_finance(&self) -> bool {
        !self.actions.is_empty() || !self.audiences.is_empty()
    }

    pub fn cumulative_recovered(&self) -> u64 {
        action::cumulative_recovered(&self.actions, None)
    }

    pub fn remaining(&self) -> u64 {
        action::remaining_after(self.dossier.montant_creance, self.cumulative_recovered())
    }
}
